//! Collaborator services

pub mod children;
pub mod path_resolver;
pub mod storage_client;

pub use children::{CachedChildrenLookup, ChildEntry, ChildrenLookup, EntryKind, TableChildrenLookup};
pub use path_resolver::{is_direct_id, resolve_path, resolve_reference, Resolution};
pub use storage_client::{StorageClient, StorageClientError};
