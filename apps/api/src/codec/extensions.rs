use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::non_conforming::NonConformingData;
use crate::models::resume::{CleanResume, IconSettings, NamedSummary};

/// Schema version written by this exporter.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Versions the restore path accepts. Exact string match only.
pub const SUPPORTED_SCHEMA_VERSIONS: &[&str] = &[SCHEMA_VERSION];

/// Literal format tag stamped into backup metadata.
pub const BACKUP_FORMAT: &str = "extended";

/// Named sub-item arrays of one item, e.g. `{"highlights": [true, false]}`.
pub type SubItemFlags = BTreeMap<String, Vec<bool>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisibilityExtension {
    pub sections: BTreeMap<String, bool>,
    /// Section → one flag per item. Absent for empty sections.
    pub items: BTreeMap<String, Vec<bool>>,
    /// Section → item index → sub-item kind → one flag per sub-item.
    pub sub_items: BTreeMap<String, BTreeMap<usize, SubItemFlags>>,
}

impl VisibilityExtension {
    /// Item flag with out-of-range and missing entries resolved to visible.
    pub fn item(&self, section: &str, index: usize) -> bool {
        self.items
            .get(section)
            .and_then(|flags| flags.get(index))
            .copied()
            .unwrap_or(true)
    }

    /// Sub-item flag, same defaulting as [`Self::item`].
    pub fn sub_item(&self, section: &str, index: usize, kind: &str, sub_index: usize) -> bool {
        self.sub_items
            .get(section)
            .and_then(|by_index| by_index.get(&index))
            .and_then(|by_kind| by_kind.get(kind))
            .and_then(|flags| flags.get(sub_index))
            .copied()
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackupMetadata {
    pub exported_at: String,
    pub exported_by: String,
    pub schema_version: String,
    pub format: String,
    pub preserves_visibility: bool,
}

impl Default for BackupMetadata {
    fn default() -> Self {
        BackupMetadata {
            exported_at: String::new(),
            exported_by: String::new(),
            schema_version: SCHEMA_VERSION.to_string(),
            format: BACKUP_FORMAT.to_string(),
            preserves_visibility: true,
        }
    }
}

/// Editor-only state with no place in the clean payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorState {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub summaries: Vec<NamedSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_summary_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_settings: Option<IconSettings>,
}

impl EditorState {
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty() && self.active_summary_id.is_none() && self.icon_settings.is_none()
    }
}

/// The reserved `extensions` block of a backup document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Extensions {
    pub schema_version: String,
    pub visibility: VisibilityExtension,
    pub backup: BackupMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_conforming: Option<NonConformingData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<EditorState>,
}

/// Clean payload plus the `extensions` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedDocument {
    #[serde(flatten)]
    pub payload: CleanResume,
    pub extensions: Extensions,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_item_defaults_out_of_range() {
        let mut vis = VisibilityExtension::default();
        vis.items.insert("work".into(), vec![false]);
        assert!(!vis.item("work", 0));
        assert!(vis.item("work", 1));
        assert!(vis.item("education", 0));
    }

    #[test]
    fn test_sub_item_index_keys_are_strings_on_the_wire() {
        let mut vis = VisibilityExtension::default();
        vis.sub_items
            .entry("work".into())
            .or_default()
            .insert(2, BTreeMap::from([("highlights".to_string(), vec![true, false])]));
        let wire = serde_json::to_value(&vis).unwrap();
        assert_eq!(wire["subItems"]["work"]["2"]["highlights"], json!([true, false]));

        let back: VisibilityExtension = serde_json::from_value(wire).unwrap();
        assert!(!back.sub_item("work", 2, "highlights", 1));
        assert!(back.sub_item("work", 2, "highlights", 5));
        assert!(back.sub_item("work", 0, "highlights", 0));
    }
}
