//! Primary/parent identifier adjacency

use super::Component;

/// One (primary identifier, parent identifier) pair from a manifest record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentifierEdge {
    /// Single atomic identifier of the record (data file or biospecimen)
    pub primary_id: String,
    /// One parent token
    pub parent_id: String,
    /// Entity of the record the edge was drawn from
    pub entity_id: Option<String>,
    pub component: Component,
}
