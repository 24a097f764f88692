use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A value that failed type expectations and was replaced by a default.
/// Records written by the editor may omit `value` when it was undefined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvalidField {
    pub section: String,
    pub field: String,
    pub value: Value,
    pub reason: String,
}

/// Content kept aside for manual review. Carried through encode/decode untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NonConformingData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    pub invalid_fields: Vec<InvalidField>,
    pub parsing_errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_data: Option<Value>,
}

impl NonConformingData {
    pub fn is_empty(&self) -> bool {
        self.raw_text.is_none()
            && self.invalid_fields.is_empty()
            && self.parsing_errors.is_empty()
            && self.original_data.is_none()
    }
}
