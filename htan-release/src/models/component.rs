//! Schema components

use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema component a manifest conforms to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Component {
    Biospecimen,
    Demographics,
    ImagingLevel2,
    AccessoryManifest,
    /// Any other data-model component (e.g. "ScRNA-seqLevel1", "Diagnosis")
    Other(String),
}

/// Required-attribute tier of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentTier {
    /// Level 1 assay files and auxiliary files: missing columns are fatal
    Level1OrAuxiliary,
    /// Level 2/3/4 derived files: missing columns are warnings
    DerivedLevel,
    /// Clinical, biospecimen and other non-file components: unchecked
    Unchecked,
}

impl Component {
    pub fn as_str(&self) -> &str {
        match self {
            Component::Biospecimen => "Biospecimen",
            Component::Demographics => "Demographics",
            Component::ImagingLevel2 => "ImagingLevel2",
            Component::AccessoryManifest => "AccessoryManifest",
            Component::Other(name) => name,
        }
    }

    /// Accessory manifests describe folders, not files
    pub fn is_accessory(&self) -> bool {
        matches!(self, Component::AccessoryManifest)
    }

    pub fn tier(&self) -> ComponentTier {
        let name = self.as_str();
        if ["Level1", "Auxiliary"].iter().any(|t| name.contains(t)) {
            ComponentTier::Level1OrAuxiliary
        } else if ["Level2", "Level3", "Level4"].iter().any(|t| name.contains(t)) {
            ComponentTier::DerivedLevel
        } else {
            ComponentTier::Unchecked
        }
    }

    /// Imaging level 2 components carry no parent data file column
    pub fn exempt_from_parent_file(&self) -> bool {
        matches!(self.as_str(), "ImagingLevel2" | "SRRSImagingLevel2")
    }

    /// Whether the component name contains any of the given tokens
    pub fn matches_any(&self, tokens: &[String]) -> bool {
        tokens.iter().any(|t| self.as_str().contains(t.as_str()))
    }
}

impl From<&str> for Component {
    fn from(name: &str) -> Self {
        match name.trim() {
            "Biospecimen" => Component::Biospecimen,
            "Demographics" => Component::Demographics,
            "ImagingLevel2" => Component::ImagingLevel2,
            "AccessoryManifest" => Component::AccessoryManifest,
            other => Component::Other(other.to_string()),
        }
    }
}

impl From<String> for Component {
    fn from(name: String) -> Self {
        Component::from(name.as_str())
    }
}

impl From<Component> for String {
    fn from(component: Component) -> Self {
        component.as_str().to_string()
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_parse_to_variants() {
        assert_eq!(Component::from("Biospecimen"), Component::Biospecimen);
        assert_eq!(Component::from(" ImagingLevel2 "), Component::ImagingLevel2);
        assert_eq!(
            Component::from("ScRNA-seqLevel1"),
            Component::Other("ScRNA-seqLevel1".to_string())
        );
        assert_eq!(Component::from("AccessoryManifest").to_string(), "AccessoryManifest");
    }

    #[test]
    fn test_tiers() {
        assert_eq!(Component::from("BulkWESLevel1").tier(), ComponentTier::Level1OrAuxiliary);
        assert_eq!(Component::from("OtherAssayAuxiliary").tier(), ComponentTier::Level1OrAuxiliary);
        assert_eq!(Component::ImagingLevel2.tier(), ComponentTier::DerivedLevel);
        assert_eq!(Component::from("ScRNA-seqLevel4").tier(), ComponentTier::DerivedLevel);
        assert_eq!(Component::Biospecimen.tier(), ComponentTier::Unchecked);
    }

    #[test]
    fn test_parent_file_exemption() {
        assert!(Component::ImagingLevel2.exempt_from_parent_file());
        assert!(Component::from("SRRSImagingLevel2").exempt_from_parent_file());
        assert!(!Component::from("ScRNA-seqLevel2").exempt_from_parent_file());
    }
}
