use serde_json::Value;

use crate::models::non_conforming::{InvalidField, NonConformingData};

/// Accumulates everything that did not fit the canonical model.
/// Never drops a recorded value; only builds the review record.
#[derive(Debug, Default)]
pub struct Preserver {
    invalid_fields: Vec<InvalidField>,
    parsing_errors: Vec<String>,
    raw_text: Option<String>,
}

impl Preserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        section: &str,
        field: impl Into<String>,
        value: &Value,
        reason: impl Into<String>,
    ) {
        self.invalid_fields.push(InvalidField {
            section: section.to_string(),
            field: field.into(),
            value: value.clone(),
            reason: reason.into(),
        });
    }

    /// Records input that could not be parsed as structured data at all.
    pub fn record_parse_failure(&mut self, raw_text: &str, error: impl Into<String>) {
        self.raw_text = Some(raw_text.to_string());
        self.parsing_errors.push(error.into());
    }

    pub fn invalid_field_count(&self) -> usize {
        self.invalid_fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invalid_fields.is_empty() && self.parsing_errors.is_empty() && self.raw_text.is_none()
    }

    /// Builds the review record, appending to `carried` when the input already
    /// had one. `original` is kept when new invalid fields were recorded.
    pub fn finish(
        self,
        carried: Option<NonConformingData>,
        original: Option<&Value>,
    ) -> Option<NonConformingData> {
        if self.is_empty() {
            return carried;
        }

        let had_invalid_fields = !self.invalid_fields.is_empty();
        let mut data = carried.unwrap_or_default();
        data.invalid_fields.extend(self.invalid_fields);
        data.parsing_errors.extend(self.parsing_errors);
        if self.raw_text.is_some() {
            data.raw_text = self.raw_text;
        }
        if had_invalid_fields && data.original_data.is_none() {
            data.original_data = original.cloned();
        }
        Some(data)
    }
}

/// Appends `extra` to `base`, keeping `base`'s raw text and original data when set.
pub fn merge(
    base: Option<NonConformingData>,
    extra: Option<NonConformingData>,
) -> Option<NonConformingData> {
    match (base, extra) {
        (None, extra) => extra,
        (base, None) => base,
        (Some(mut base), Some(extra)) => {
            base.invalid_fields.extend(extra.invalid_fields);
            base.parsing_errors.extend(extra.parsing_errors);
            base.raw_text = base.raw_text.or(extra.raw_text);
            base.original_data = base.original_data.or(extra.original_data);
            Some(base)
        }
    }
}

/// JSON type name used in diagnostic reasons.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_preserver_keeps_carried_record() {
        let carried = NonConformingData {
            parsing_errors: vec!["older".to_string()],
            ..Default::default()
        };
        let out = Preserver::new().finish(Some(carried.clone()), Some(&json!({})));
        assert_eq!(out, Some(carried));
    }

    #[test]
    fn test_empty_preserver_without_carried_yields_none() {
        assert!(Preserver::new().finish(None, Some(&json!({"a": 1}))).is_none());
    }

    #[test]
    fn test_record_keeps_value_and_original() {
        let input = json!({"work": "oops"});
        let mut p = Preserver::new();
        p.record("work", "work", &json!("oops"), "expected array, got string");
        let data = p.finish(None, Some(&input)).unwrap();
        assert_eq!(data.invalid_fields.len(), 1);
        assert_eq!(data.invalid_fields[0].value, json!("oops"));
        assert_eq!(data.original_data, Some(input));
    }

    #[test]
    fn test_carried_original_is_not_replaced() {
        let carried = NonConformingData {
            original_data: Some(json!({"first": true})),
            ..Default::default()
        };
        let mut p = Preserver::new();
        p.record("basics", "name", &json!(3), "expected string, got number");
        let data = p.finish(Some(carried), Some(&json!({"second": true}))).unwrap();
        assert_eq!(data.original_data, Some(json!({"first": true})));
        assert_eq!(data.invalid_fields.len(), 1);
    }

    #[test]
    fn test_parse_failure_sets_raw_text() {
        let mut p = Preserver::new();
        p.record_parse_failure("{ nope", "expected value at line 1 column 3");
        let data = p.finish(None, None).unwrap();
        assert_eq!(data.raw_text.as_deref(), Some("{ nope"));
        assert_eq!(data.parsing_errors.len(), 1);
        assert!(data.original_data.is_none());
    }

    #[test]
    fn test_merge_appends() {
        let a = NonConformingData {
            parsing_errors: vec!["a".into()],
            ..Default::default()
        };
        let b = NonConformingData {
            parsing_errors: vec!["b".into()],
            raw_text: Some("raw".into()),
            ..Default::default()
        };
        let merged = merge(Some(a), Some(b)).unwrap();
        assert_eq!(merged.parsing_errors, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(merged.raw_text.as_deref(), Some("raw"));
    }
}
