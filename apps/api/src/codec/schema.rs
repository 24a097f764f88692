//! Schema version validator for extended (backup) documents.
//!
//! Classification runs on the parsed JSON value before anything is decoded.
//! A document without an `extensions` block is simply not ours; that is a
//! routing signal, not a failure.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::codec::extensions::{Extensions, BACKUP_FORMAT, SUPPORTED_SCHEMA_VERSIONS};
use crate::codec::preserver::json_type;
use crate::models::resume::{Section, KNOWN_SECTIONS};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaClassification {
    pub is_extended_format: bool,
    pub is_valid: bool,
    pub is_supported: bool,
    pub schema_version: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SchemaClassification {
    /// Only these documents may be handed to the decoder.
    pub fn is_decodable(&self) -> bool {
        self.is_extended_format && self.is_valid && self.is_supported
    }
}

pub fn classify(candidate: &Value) -> SchemaClassification {
    let mut report = SchemaClassification::default();

    let Some(extensions) = candidate.as_object().and_then(|root| root.get("extensions")) else {
        return report;
    };
    report.is_extended_format = true;

    let Some(extensions) = extensions.as_object() else {
        report.errors.push(format!(
            "extensions must be an object, got {}",
            json_type(extensions)
        ));
        return report;
    };

    check_version(extensions, &mut report);
    check_visibility(candidate, extensions, &mut report);
    check_backup(extensions, &mut report);
    check_non_conforming(extensions, &mut report);
    check_editor(extensions, &mut report);

    // Anything the checks above accept must also be readable by the decoder.
    if report.errors.is_empty() {
        if let Err(e) = serde_json::from_value::<Extensions>(Value::Object(extensions.clone())) {
            report
                .errors
                .push(format!("extensions could not be read: {e}"));
        }
    }

    report.is_valid = report.errors.is_empty() && report.is_supported;
    report
}

fn check_version(extensions: &Map<String, Value>, report: &mut SchemaClassification) {
    match extensions.get("schemaVersion") {
        None => report
            .errors
            .push("extensions.schemaVersion is missing".to_string()),
        Some(Value::String(version)) => {
            report.schema_version = Some(version.clone());
            if SUPPORTED_SCHEMA_VERSIONS.contains(&version.as_str()) {
                report.is_supported = true;
            } else {
                report.errors.push(format!(
                    "Unsupported schema version '{}' (supported: {})",
                    version,
                    SUPPORTED_SCHEMA_VERSIONS.join(", ")
                ));
            }
        }
        Some(other) => report.errors.push(format!(
            "extensions.schemaVersion must be a string, got {}",
            json_type(other)
        )),
    }
}

fn check_visibility(
    candidate: &Value,
    extensions: &Map<String, Value>,
    report: &mut SchemaClassification,
) {
    let visibility = match extensions.get("visibility") {
        Some(Value::Object(visibility)) => visibility,
        Some(other) => {
            report.errors.push(format!(
                "extensions.visibility must be an object, got {}",
                json_type(other)
            ));
            return;
        }
        None => {
            report
                .errors
                .push("extensions.visibility is missing".to_string());
            return;
        }
    };

    match visibility.get("sections") {
        Some(Value::Object(sections)) => {
            for (section, flag) in sections {
                if !flag.is_boolean() {
                    report.errors.push(format!(
                        "visibility.sections.{section} must be a boolean, got {}",
                        json_type(flag)
                    ));
                }
            }
            for section in KNOWN_SECTIONS {
                if !sections.contains_key(*section) {
                    report.warnings.push(format!(
                        "visibility.sections.{section} is missing; it will default to visible"
                    ));
                }
            }
        }
        Some(other) => report.errors.push(format!(
            "visibility.sections must be an object, got {}",
            json_type(other)
        )),
        None => report
            .errors
            .push("visibility.sections is missing".to_string()),
    }

    match visibility.get("items") {
        Some(Value::Object(items)) => {
            for (section, flags) in items {
                let path = format!("visibility.items.{section}");
                if check_flags(&path, flags, report) {
                    check_alignment(candidate, section, &path, flags, report);
                }
            }
        }
        Some(other) => report.errors.push(format!(
            "visibility.items must be an object, got {}",
            json_type(other)
        )),
        None => report.errors.push("visibility.items is missing".to_string()),
    }

    match visibility.get("subItems") {
        None => {}
        Some(Value::Object(by_section)) => {
            for (section, by_index) in by_section {
                let Some(by_index) = by_index.as_object() else {
                    report.errors.push(format!(
                        "visibility.subItems.{section} must be an object, got {}",
                        json_type(by_index)
                    ));
                    continue;
                };
                for (index, by_kind) in by_index {
                    let path = format!("visibility.subItems.{section}.{index}");
                    if index.parse::<usize>().is_err() {
                        report
                            .errors
                            .push(format!("{path}: item index must be a non-negative integer"));
                        continue;
                    }
                    let Some(by_kind) = by_kind.as_object() else {
                        report.errors.push(format!(
                            "{path} must be an object, got {}",
                            json_type(by_kind)
                        ));
                        continue;
                    };
                    for (kind, flags) in by_kind {
                        check_flags(&format!("{path}.{kind}"), flags, report);
                    }
                }
            }
        }
        Some(other) => report.errors.push(format!(
            "visibility.subItems must be an object, got {}",
            json_type(other)
        )),
    }
}

/// `true` when `flags` is an array of booleans; records an error otherwise.
fn check_flags(path: &str, flags: &Value, report: &mut SchemaClassification) -> bool {
    match flags {
        Value::Array(values) if values.iter().all(Value::is_boolean) => true,
        Value::Array(_) => {
            report
                .errors
                .push(format!("{path} must contain only booleans"));
            false
        }
        other => {
            report.errors.push(format!(
                "{path} must be an array, got {}",
                json_type(other)
            ));
            false
        }
    }
}

fn check_alignment(
    candidate: &Value,
    section: &str,
    path: &str,
    flags: &Value,
    report: &mut SchemaClassification,
) {
    let content = if section == Section::Profiles.key() {
        candidate.pointer("/basics/profiles")
    } else {
        candidate.get(section)
    };
    let Some(content) = content else {
        report
            .warnings
            .push(format!("{path} has no matching content section"));
        return;
    };
    let (Some(content), Some(flags)) = (content.as_array(), flags.as_array()) else {
        return;
    };
    if content.len() != flags.len() {
        report.warnings.push(format!(
            "{path} has {} entries for {} items; missing entries default to visible",
            flags.len(),
            content.len()
        ));
    }
}

fn check_backup(extensions: &Map<String, Value>, report: &mut SchemaClassification) {
    let backup = match extensions.get("backup") {
        Some(Value::Object(backup)) => backup,
        Some(other) => {
            report.errors.push(format!(
                "extensions.backup must be an object, got {}",
                json_type(other)
            ));
            return;
        }
        None => {
            report.errors.push("extensions.backup is missing".to_string());
            return;
        }
    };

    for key in ["exportedAt", "exportedBy", "schemaVersion", "format"] {
        expect_string(backup, key, "backup", false, report);
    }
    match backup.get("preservesVisibility") {
        Some(Value::Bool(true)) => {}
        None | Some(Value::Bool(false)) => report
            .warnings
            .push("backup.preservesVisibility is not true".to_string()),
        Some(other) => report.errors.push(format!(
            "backup.preservesVisibility must be a boolean, got {}",
            json_type(other)
        )),
    }

    match backup.get("format") {
        Some(Value::String(format)) if format == BACKUP_FORMAT => {}
        Some(Value::String(other)) => report.warnings.push(format!(
            "backup.format is '{other}', expected '{BACKUP_FORMAT}'"
        )),
        Some(_) => {}
        None => report
            .warnings
            .push("backup.format is missing".to_string()),
    }
    if !backup.contains_key("exportedAt") {
        report
            .warnings
            .push("backup.exportedAt is missing".to_string());
    }
}

fn check_non_conforming(extensions: &Map<String, Value>, report: &mut SchemaClassification) {
    let record = match extensions.get("nonConforming") {
        None | Some(Value::Null) => return,
        Some(Value::Object(record)) => record,
        Some(other) => {
            report.errors.push(format!(
                "extensions.nonConforming must be an object, got {}",
                json_type(other)
            ));
            return;
        }
    };

    expect_string(record, "rawText", "nonConforming", true, report);
    let mut count = 0;

    if let Some(fields) = array_field(record, "invalidFields", "nonConforming", report) {
        count += fields.len();
        for (index, field) in fields.iter().enumerate() {
            let path = format!("nonConforming.invalidFields[{index}]");
            let Some(field) = field.as_object() else {
                report.errors.push(format!(
                    "{path} must be an object, got {}",
                    json_type(field)
                ));
                continue;
            };
            for key in ["section", "field", "reason"] {
                expect_string(field, key, &path, false, report);
            }
        }
    }
    if let Some(errors) = array_field(record, "parsingErrors", "nonConforming", report) {
        count += errors.len();
        if !errors.iter().all(Value::is_string) {
            report
                .errors
                .push("nonConforming.parsingErrors must contain only strings".to_string());
        }
    }

    if count > 0 {
        report.warnings.push(format!(
            "document carries {count} non-conforming entries for manual review"
        ));
    }
}

fn check_editor(extensions: &Map<String, Value>, report: &mut SchemaClassification) {
    let editor = match extensions.get("editor") {
        None | Some(Value::Null) => return,
        Some(Value::Object(editor)) => editor,
        Some(other) => {
            report.errors.push(format!(
                "extensions.editor must be an object, got {}",
                json_type(other)
            ));
            return;
        }
    };

    expect_string(editor, "activeSummaryId", "editor", true, report);

    if let Some(summaries) = array_field(editor, "summaries", "editor", report) {
        for (index, summary) in summaries.iter().enumerate() {
            let path = format!("editor.summaries[{index}]");
            let Some(summary) = summary.as_object() else {
                report.errors.push(format!(
                    "{path} must be an object, got {}",
                    json_type(summary)
                ));
                continue;
            };
            for key in ["id", "name", "content"] {
                require(summary, key, &path, report);
                expect_string(summary, key, &path, false, report);
            }
        }
    }

    match editor.get("iconSettings") {
        None | Some(Value::Null) => {}
        Some(Value::Object(icon)) => {
            let path = "editor.iconSettings";
            require(icon, "image", path, report);
            expect_string(icon, "image", path, false, report);
            for key in ["offsetX", "offsetY", "size"] {
                require(icon, key, path, report);
                if let Some(value) = icon.get(key).filter(|v| !v.is_number()) {
                    report.errors.push(format!(
                        "{path}.{key} must be a number, got {}",
                        json_type(value)
                    ));
                }
            }
        }
        Some(other) => report.errors.push(format!(
            "editor.iconSettings must be an object, got {}",
            json_type(other)
        )),
    }
}

/// Records an error when `key` is present but not a string.
fn expect_string(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    nullable: bool,
    report: &mut SchemaClassification,
) {
    match map.get(key) {
        None | Some(Value::String(_)) => {}
        Some(Value::Null) if nullable => {}
        Some(other) => report.errors.push(format!(
            "{path}.{key} must be a string, got {}",
            json_type(other)
        )),
    }
}

fn require(map: &Map<String, Value>, key: &str, path: &str, report: &mut SchemaClassification) {
    if !map.contains_key(key) {
        report.errors.push(format!("{path}.{key} is missing"));
    }
}

/// The array under `key`, if present; records an error for any other type.
fn array_field<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
    report: &mut SchemaClassification,
) -> Option<&'a Vec<Value>> {
    match map.get(key) {
        None => None,
        Some(Value::Array(values)) => Some(values),
        Some(other) => {
            report.errors.push(format!(
                "{path}.{key} must be an array, got {}",
                json_type(other)
            ));
            None
        }
    }
}
