//! Data models for the release pipeline
//!
//! Records are produced once by ingestion and treated as immutable for the
//! remainder of a run.

pub mod component;
pub mod edge;
pub mod fileview;
pub mod listing;
pub mod manifest;
pub mod provenance;

pub use component::{Component, ComponentTier};
pub use edge::IdentifierEdge;
pub use fileview::Fileview;
pub use listing::FileEntry;
pub use manifest::{ManifestRecord, ManifestSet};
pub use provenance::{ProvenanceRow, ProvenanceTable};

/// Manifest column names shared across components
pub mod columns {
    pub const COMPONENT: &str = "Component";
    pub const ENTITY_ID: &str = "entityId";
    pub const FILENAME: &str = "Filename";
    pub const FILE_FORMAT: &str = "File Format";
    pub const DATA_FILE_ID: &str = "HTAN Data File ID";
    pub const BIOSPECIMEN_ID: &str = "HTAN Biospecimen ID";
    pub const PARTICIPANT_ID: &str = "HTAN Participant ID";
    pub const PARENT_DATA_FILE_ID: &str = "HTAN Parent Data File ID";
    pub const PARENT_BIOSPECIMEN_ID: &str = "HTAN Parent Biospecimen ID";
    pub const PARENT_ID: &str = "HTAN Parent ID";
    pub const ADJACENT_BIOSPECIMEN_IDS: &str = "Adjacent Biospecimen IDs";
    pub const ACCESSORY_ENTITY_ID: &str = "Accessory Synapse ID";
    pub const CHANNEL_METADATA_FILENAME: &str = "Channel Metadata Filename";
    pub const MERFISH_POSITIONS_FILE: &str = "MERFISH Positions File";
    pub const MERFISH_CODEBOOK_FILE: &str = "MERFISH Codebook File";
    pub const MANIFEST_ID: &str = "Manifest_Id";
    pub const MANIFEST_VERSION: &str = "Manifest_Version";
    pub const CENTER: &str = "HTAN Center";
    pub const ID: &str = "Id";
    pub const UUID: &str = "Uuid";
}
