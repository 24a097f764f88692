//! Import and export entry points.
//!
//! Input is a raw string from an external reader (upload, local storage).
//! Output is either a canonical model or a structured failure carrying
//! human-readable messages.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::decode::decode;
use crate::codec::encode::{to_clean, to_extended, EncodeOptions};
use crate::codec::extensions::{ExtendedDocument, Extensions};
use crate::codec::normalize::normalize;
use crate::codec::preserver::{merge, Preserver};
use crate::codec::schema::{classify, SchemaClassification};
use crate::models::resume::{CanonicalResume, CleanResume};

/// Which importer handled the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentFormat {
    /// Clean payload with a supported `extensions` block.
    Extended,
    /// Plain JSON Resume style payload (or editor state).
    JsonResume,
}

/// Counts surfaced to the user next to a pointer to the review area.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub invalid_fields: usize,
    pub parsing_errors: usize,
    pub has_raw_text: bool,
}

impl ReviewSummary {
    pub fn of(resume: &CanonicalResume) -> Self {
        match &resume.non_conforming_data {
            Some(data) => ReviewSummary {
                invalid_fields: data.invalid_fields.len(),
                parsing_errors: data.parsing_errors.len(),
                has_raw_text: data.raw_text.is_some(),
            },
            None => ReviewSummary::default(),
        }
    }

    pub fn needs_review(&self) -> bool {
        self.invalid_fields > 0 || self.parsing_errors > 0 || self.has_raw_text
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Imported {
    pub resume: CanonicalResume,
    pub format: DocumentFormat,
    pub warnings: Vec<String>,
    pub review: ReviewSummary,
}

#[derive(Debug, Error)]
pub enum ImportError {
    /// Not well-formed JSON. `fallback` is the default model holding the raw text.
    #[error("Could not parse input as JSON: {}", .errors.join("; "))]
    Parse {
        errors: Vec<String>,
        fallback: Box<CanonicalResume>,
    },

    #[error("Unsupported backup schema version '{version}'")]
    UnsupportedVersion {
        version: String,
        errors: Vec<String>,
    },

    #[error("Backup extensions are malformed: {}", .errors.join("; "))]
    InvalidExtension { errors: Vec<String> },

    /// Recognized but handled by another importer (e.g. HR-Open).
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
}

impl ImportError {
    /// Human-readable messages for the failure summary.
    pub fn errors(&self) -> Vec<String> {
        match self {
            ImportError::Parse { errors, .. }
            | ImportError::UnsupportedVersion { errors, .. }
            | ImportError::InvalidExtension { errors } => errors.clone(),
            ImportError::UnsupportedFormat(msg) => vec![msg.clone()],
        }
    }
}

/// Parses and imports a document of any supported shape.
pub fn import_text(raw: &str) -> Result<Imported, ImportError> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            let message = format!("Invalid JSON: {e}");
            warn!(error = %e, "import input is not valid JSON");
            return Err(ImportError::Parse {
                fallback: Box::new(parse_failure_fallback(raw, &message)),
                errors: vec![message],
            });
        }
    };
    import_value(&value)
}

/// Imports an already parsed document.
pub fn import_value(value: &Value) -> Result<Imported, ImportError> {
    let classification = classify(value);

    if classification.is_extended_format {
        return restore(value, classification);
    }

    if let Some(kind) = foreign_format(value) {
        info!(format = kind, "import routed away from resume importer");
        return Err(ImportError::UnsupportedFormat(format!(
            "{kind} documents need a different importer"
        )));
    }

    let resume = normalize(value);
    let review = ReviewSummary::of(&resume);
    info!(
        invalid_fields = review.invalid_fields,
        "imported plain resume payload"
    );
    Ok(Imported {
        resume,
        format: DocumentFormat::JsonResume,
        warnings: Vec::new(),
        review,
    })
}

/// Storage load path: never fails, falls back to an empty model that keeps
/// the unparsable text for review.
pub fn load_text(raw: &str) -> CanonicalResume {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => normalize(&value),
        Err(e) => {
            warn!(error = %e, "stored resume is not valid JSON");
            parse_failure_fallback(raw, &format!("Invalid JSON: {e}"))
        }
    }
}

pub fn export_clean(resume: &CanonicalResume) -> CleanResume {
    to_clean(resume)
}

pub fn export_backup(resume: &CanonicalResume, options: &EncodeOptions) -> ExtendedDocument {
    to_extended(resume, options)
}

pub fn export_clean_json(resume: &CanonicalResume) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&export_clean(resume))
}

pub fn export_backup_json(
    resume: &CanonicalResume,
    options: &EncodeOptions,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&export_backup(resume, options))
}

fn parse_failure_fallback(raw: &str, message: &str) -> CanonicalResume {
    let mut preserver = Preserver::new();
    preserver.record_parse_failure(raw, message);
    CanonicalResume {
        non_conforming_data: preserver.finish(None, None),
        ..Default::default()
    }
}

/// Validated restore: payload through the normalizer, visibility from the
/// extension, payload issues appended to the carried review record.
fn restore(value: &Value, classification: SchemaClassification) -> Result<Imported, ImportError> {
    if let (false, Some(version)) = (
        classification.is_supported,
        classification.schema_version.clone(),
    ) {
        warn!(%version, "rejected backup with unsupported schema version");
        return Err(ImportError::UnsupportedVersion {
            version,
            errors: classification.errors,
        });
    }
    if !classification.is_valid {
        warn!(errors = classification.errors.len(), "rejected malformed backup");
        return Err(ImportError::InvalidExtension {
            errors: classification.errors,
        });
    }

    let mut payload: Map<String, Value> = value.as_object().cloned().unwrap_or_default();
    let raw_extensions = payload.remove("extensions").unwrap_or(Value::Null);
    let extensions: Extensions = serde_json::from_value(raw_extensions).map_err(|e| {
        ImportError::InvalidExtension {
            errors: vec![format!("extensions could not be read: {e}")],
        }
    })?;

    let normalized = normalize(&Value::Object(payload));
    let clean = to_clean(&normalized);
    let mut resume = decode(&clean, &extensions);
    resume.non_conforming_data = merge(resume.non_conforming_data, normalized.non_conforming_data);

    let review = ReviewSummary::of(&resume);
    debug!(warnings = classification.warnings.len(), "restored backup");
    info!(
        schema_version = classification.schema_version.as_deref().unwrap_or_default(),
        "imported extended backup"
    );
    Ok(Imported {
        resume,
        format: DocumentFormat::Extended,
        warnings: classification.warnings,
        review,
    })
}

/// Recognizes documents meant for another importer.
fn foreign_format(value: &Value) -> Option<&'static str> {
    let root = value.as_object()?;
    if root.contains_key("basics") {
        return None;
    }
    let hr_open = ["candidate", "person", "employmentHistory", "educationHistory"]
        .iter()
        .any(|key| root.contains_key(*key));
    hr_open.then_some("HR-Open")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::codec::encode::encode_with;
    use crate::codec::sub_item::{is_visible, text};

    fn options() -> EncodeOptions {
        EncodeOptions {
            exported_at: "2026-01-02T03:04:05.000Z".into(),
            exported_by: "tests".into(),
        }
    }

    #[test]
    fn test_malformed_json_yields_fallback_with_raw_text() {
        let raw = "{ invalid json }";
        let err = import_text(raw).unwrap_err();
        assert!(!err.errors().is_empty());
        match err {
            ImportError::Parse { errors, fallback } => {
                assert!(errors[0].starts_with("Invalid JSON"));
                let data = fallback.non_conforming_data.unwrap();
                assert_eq!(data.raw_text.as_deref(), Some(raw));
                assert_eq!(data.parsing_errors, errors);
                assert!(fallback.work.is_empty());
            }
            other => panic!("expected parse failure, got {other:?}"),
        }
    }

    #[test]
    fn test_load_text_never_fails() {
        let resume = load_text("not json at all");
        assert_eq!(
            resume.non_conforming_data.unwrap().raw_text.as_deref(),
            Some("not json at all")
        );
        assert_eq!(load_text(r#"{"basics": {"name": "Ada"}}"#).basics.name, "Ada");
    }

    #[test]
    fn test_plain_payload_is_normalized() {
        let imported = import_text(r#"{"work": [{"name": "Acme", "highlights": ["x"]}]}"#).unwrap();
        assert_eq!(imported.format, DocumentFormat::JsonResume);
        assert!(imported.resume.work[0].visible);
        assert!(!imported.review.needs_review());
    }

    #[test]
    fn test_backup_round_trip_through_text() {
        let original = normalize(&json!({
            "work": [
                {"name": "A", "highlights": ["one", {"text": "two", "visible": false}]},
                {"name": "B", "visible": false}
            ],
            "sectionVisibility": {"volunteer": false},
            "summaries": [{"id": "s1", "name": "Main", "content": "Hi"}],
            "activeSummaryId": "s1"
        }));
        let text_doc = export_backup_json(&original, &options()).unwrap();
        let imported = import_text(&text_doc).unwrap();

        assert_eq!(imported.format, DocumentFormat::Extended);
        let resume = imported.resume;
        assert!(!resume.section_visibility.is_visible("volunteer"));
        assert!(resume.work[0].visible);
        assert!(!resume.work[1].visible);
        let highlights: Vec<(&str, bool)> = resume.work[0]
            .content
            .highlights
            .iter()
            .map(|h| (text(h), is_visible(h)))
            .collect();
        assert_eq!(highlights, vec![("one", true), ("two", false)]);
        assert_eq!(resume.active_summary_id.as_deref(), Some("s1"));
        assert_eq!(resume.summaries.len(), 1);
    }

    #[test]
    fn test_document_to_model_to_document() {
        let doc = json!({
            "basics": {"name": "Ada", "profiles": [{"network": "GitHub", "username": "ada", "url": ""}]},
            "work": [{"name": "A", "highlights": ["h1", "h2"]}, {"name": "B"}],
            "skills": [{"name": "Rust", "keywords": ["async"]}],
            "extensions": {
                "schemaVersion": "1.0.0",
                "visibility": {
                    "sections": {"work": true, "volunteer": false},
                    "items": {"work": [true, false]},
                    "subItems": {"work": {"0": {"highlights": [false]}}}
                },
                "backup": {
                    "exportedAt": "2026-01-02T03:04:05.000Z",
                    "exportedBy": "tests",
                    "schemaVersion": "1.0.0",
                    "format": "extended",
                    "preservesVisibility": true
                }
            }
        });
        let imported = import_value(&doc).unwrap();
        let (payload, ext) = encode_with(&imported.resume, &options());

        let restored_payload = serde_json::to_value(&payload).unwrap();
        assert_eq!(restored_payload["work"], filled_work(&doc["work"]));
        assert_eq!(restored_payload["basics"]["name"], json!("Ada"));
        assert_eq!(restored_payload["skills"][0]["keywords"], json!(["async"]));

        // Defaulted entries come back explicit; declared ones are unchanged.
        assert_eq!(ext.visibility.items["work"], vec![true, false]);
        assert_eq!(ext.visibility.items["profiles"], vec![true]);
        assert_eq!(ext.visibility.items["skills"], vec![true]);
        assert_eq!(ext.visibility.sub_items["work"][&0]["highlights"], vec![false, true]);
        assert!(!ext.visibility.sub_items["work"].contains_key(&1));
        assert_eq!(ext.visibility.sections["volunteer"], false);
        assert_eq!(ext.visibility.sections["work"], true);
    }

    #[test]
    fn test_unsupported_version_is_rejected_before_decoding() {
        let mut doc = serde_json::to_value(export_backup(&normalize(&json!({})), &options())).unwrap();
        doc["extensions"]["schemaVersion"] = json!("999.0.0");
        // A payload the normalizer would flag; nothing may be decoded or normalized.
        doc["work"] = json!("not an array");
        match import_value(&doc).unwrap_err() {
            ImportError::UnsupportedVersion { version, errors } => {
                assert_eq!(version, "999.0.0");
                assert!(!errors.is_empty());
            }
            other => panic!("expected unsupported version, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_extension_is_rejected() {
        let err = import_value(&json!({"extensions": {"schemaVersion": "1.0.0"}})).unwrap_err();
        assert!(matches!(err, ImportError::InvalidExtension { .. }));
        assert!(err.errors().len() >= 2);
    }

    #[test]
    fn test_hr_open_is_routed_away() {
        let err = import_value(&json!({"candidate": {"person": {"name": {"given": "Ada"}}}}))
            .unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_restore_merges_payload_issues() {
        let mut resume = normalize(&json!({"languages": "English"}));
        assert_eq!(ReviewSummary::of(&resume).invalid_fields, 1);
        resume.work.clear();
        let mut doc = serde_json::to_value(export_backup(&resume, &options())).unwrap();
        doc["interests"] = json!(42);

        let imported = import_value(&doc).unwrap();
        assert_eq!(imported.review.invalid_fields, 2);
        let data = imported.resume.non_conforming_data.unwrap();
        assert_eq!(data.invalid_fields[0].section, "languages");
        assert_eq!(data.invalid_fields[1].section, "interests");
    }

    #[test]
    fn test_clean_export_json_has_no_extensions() {
        let resume = normalize(&json!({"work": [{"name": "A", "visible": false}]}));
        let out: Value = serde_json::from_str(&export_clean_json(&resume).unwrap()).unwrap();
        assert!(out.get("extensions").is_none());
        assert!(out["work"][0].get("visible").is_none());
    }

    /// Clean form of a sparse `work` array: every JSON Resume field present,
    /// missing ones as empty strings or arrays.
    fn filled_work(sparse: &Value) -> Value {
        let entries = sparse.as_array().cloned().unwrap_or_default();
        Value::Array(
            entries
                .into_iter()
                .map(|entry| {
                    let mut filled = json!({
                        "name": "", "position": "", "url": "", "startDate": "",
                        "endDate": "", "summary": "", "location": "", "description": "",
                        "highlights": []
                    });
                    for (k, v) in entry.as_object().cloned().unwrap_or_default() {
                        filled[k] = v;
                    }
                    filled
                })
                .collect(),
        )
    }

    #[test]
    fn test_encoder_output_survives_exact_round_trip() {
        let resume = normalize(&json!({
            "$schema": "https://jsonresume.org/schema",
            "meta": {"version": "v1.0.0", "lastModified": "2026-01-01"},
            "basics": {"name": "Ada", "profiles": [{"network": "GitHub", "visible": false}]},
            "work": [
                {"name": "A", "highlights": ["one", {"text": "two", "visible": false}]},
                {"name": "B", "visible": false}
            ],
            "projects": [{"name": "P", "type": "app", "roles": ["lead"], "keywords": []}],
            "languages": "English",
            "sectionVisibility": {"volunteer": false, "legacy": true},
            "summaries": [{"id": "s1", "name": "Main", "content": "Hi"}],
            "activeSummaryId": "s1",
            "iconSettings": {"image": "", "offsetX": 1.5, "offsetY": 0, "size": 64}
        }));
        let document = serde_json::to_value(export_backup(&resume, &options())).unwrap();
        assert!(classify(&document).is_decodable());

        let imported = import_value(&document).unwrap();
        assert!(!imported.resume.work[1].visible);
        let again = serde_json::to_value(export_backup(&imported.resume, &options())).unwrap();
        assert_eq!(again, document);
        assert_eq!(again["$schema"], json!("https://jsonresume.org/schema"));
        assert_eq!(again["meta"]["version"], json!("v1.0.0"));
    }

    #[test]
    fn test_keys_outside_the_model_are_kept_for_review() {
        let mut doc = serde_json::to_value(export_backup(
            &normalize(&json!({"work": [{"name": "A", "highlights": ["h"]}]})),
            &options(),
        ))
        .unwrap();
        doc["hobbies"] = json!(["chess"]);
        doc["work"][0]["highlights"] = json!([{"text": "h", "id": "h-1"}]);

        let imported = import_value(&doc).unwrap();
        assert_eq!(imported.review.invalid_fields, 2);
        let data = imported.resume.non_conforming_data.unwrap();
        let original = data.original_data.unwrap();
        assert_eq!(original["hobbies"], json!(["chess"]));
        assert_eq!(original["work"][0]["highlights"][0]["id"], json!("h-1"));
        assert!(original.get("extensions").is_none());
    }

    #[test]
    fn test_decodable_classification_always_restores() {
        let base = serde_json::to_value(export_backup(
            &normalize(&json!({"work": [{"name": "A"}]})),
            &options(),
        ))
        .unwrap();
        let variants: [(&[&str], Value); 10] = [
            (&["nonConforming"], json!({
                "invalidFields": [{"section": "work", "field": "[0].name", "reason": "expected string"}]
            })),
            (&["backup", "exportedAt"], json!(1767323045000_u64)),
            (&["backup", "preservesVisibility"], json!("yes")),
            (&["backup", "format"], Value::Null),
            (&["nonConforming"], json!({"parsingErrors": [1]})),
            (&["editor"], json!({"summaries": [{"name": "x"}]})),
            (&["editor"], json!({"iconSettings": {"image": ""}})),
            (&["editor"], json!({"activeSummaryId": "s1"})),
            (&["visibility", "subItems"], Value::Null),
            (&["backup"], json!({})),
        ];

        for (path, replacement) in variants {
            let mut doc = base.clone();
            let mut target = &mut doc["extensions"];
            for key in path {
                target = &mut target[*key];
            }
            *target = replacement;
            let decodable = classify(&doc).is_decodable();
            let restored = import_value(&doc);
            assert_eq!(
                decodable,
                restored.is_ok(),
                "{path:?}: classify and restore disagree ({:?})",
                restored.err()
            );
        }
    }
}
