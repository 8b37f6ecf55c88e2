//! Storage path resolution
//!
//! Walks a `/`-delimited path one segment at a time from a root container,
//! matching each segment by exact name among the current container's
//! children. Shared by channel file validation and release enrichment.

use super::children::ChildrenLookup;
use crate::error::ReleaseResult;
use once_cell::sync::Lazy;
use regex::Regex;

static DIRECT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^syn[0-9]{8}$").unwrap());

/// Outcome of resolving one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Entity id of the final segment
    Resolved(String),
    /// First segment with no matching child
    Missing { segment: String },
}

impl Resolution {
    pub fn id(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(id) => Some(id),
            Resolution::Missing { .. } => None,
        }
    }
}

/// Whether a reference is already a storage entity id
pub fn is_direct_id(reference: &str) -> bool {
    DIRECT_ID.is_match(reference)
}

/// Resolve `path` below `root_id`
///
/// Empty segments (leading, trailing or doubled slashes) are ignored. A path
/// with no segments at all is `Missing`, never the root container.
pub async fn resolve_path(
    root_id: &str,
    path: &str,
    lookup: &dyn ChildrenLookup,
) -> ReleaseResult<Resolution> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Ok(Resolution::Missing {
            segment: path.to_string(),
        });
    }

    let mut current = root_id.to_string();
    for segment in segments {
        let children = lookup.children(&current).await?;
        match children.into_iter().find(|c| c.name == segment) {
            Some(child) => current = child.id,
            None => {
                return Ok(Resolution::Missing {
                    segment: segment.to_string(),
                })
            }
        }
    }
    Ok(Resolution::Resolved(current))
}

/// Resolve a reference that may be a direct id or a path below `root_id`
///
/// Direct ids are accepted without consulting the lookup.
pub async fn resolve_reference(
    root_id: Option<&str>,
    reference: &str,
    lookup: &dyn ChildrenLookup,
) -> ReleaseResult<Resolution> {
    if is_direct_id(reference) {
        return Ok(Resolution::Resolved(reference.to_string()));
    }
    match root_id {
        Some(root) => resolve_path(root, reference, lookup).await,
        None => Ok(Resolution::Missing {
            segment: reference.split('/').find(|s| !s.is_empty()).unwrap_or(reference).to_string(),
        }),
    }
}
