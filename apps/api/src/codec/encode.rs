//! Visibility extraction encoder.
//!
//! Splits a canonical model into a clean payload (no visibility anywhere,
//! sub-items as plain text) and the index-aligned visibility extension.

use chrono::{SecondsFormat, Utc};

use crate::codec::extensions::{
    BackupMetadata, EditorState, ExtendedDocument, Extensions, SubItemFlags, VisibilityExtension,
    BACKUP_FORMAT, SCHEMA_VERSION,
};
use crate::codec::sub_item;
use crate::models::resume::{
    Basics, CanonicalResume, CleanResume, Item, MapSubItems, Section, SubItem,
};

/// Identity written into backups when the caller does not supply one.
pub const DEFAULT_EXPORTER: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Backup metadata inputs that vary per export.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub exported_at: String,
    pub exported_by: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            exported_by: DEFAULT_EXPORTER.to_string(),
        }
    }
}

pub fn encode(resume: &CanonicalResume) -> (CleanResume, Extensions) {
    encode_with(resume, &EncodeOptions::default())
}

pub fn encode_with(resume: &CanonicalResume, options: &EncodeOptions) -> (CleanResume, Extensions) {
    let mut visibility = VisibilityExtension {
        sections: resume.section_visibility.0.clone(),
        ..Default::default()
    };

    let payload = CleanResume {
        schema: resume.schema.clone(),
        meta: resume.meta.clone(),
        basics: Basics {
            name: resume.basics.name.clone(),
            label: resume.basics.label.clone(),
            image: resume.basics.image.clone(),
            email: resume.basics.email.clone(),
            phone: resume.basics.phone.clone(),
            url: resume.basics.url.clone(),
            summary: resume.basics.summary.clone(),
            location: resume.basics.location.clone(),
            profiles: encode_section(Section::Profiles, &resume.basics.profiles, &mut visibility),
        },
        work: encode_section(Section::Work, &resume.work, &mut visibility),
        volunteer: encode_section(Section::Volunteer, &resume.volunteer, &mut visibility),
        education: encode_section(Section::Education, &resume.education, &mut visibility),
        awards: encode_section(Section::Awards, &resume.awards, &mut visibility),
        certificates: encode_section(Section::Certificates, &resume.certificates, &mut visibility),
        publications: encode_section(Section::Publications, &resume.publications, &mut visibility),
        skills: encode_section(Section::Skills, &resume.skills, &mut visibility),
        languages: encode_section(Section::Languages, &resume.languages, &mut visibility),
        interests: encode_section(Section::Interests, &resume.interests, &mut visibility),
        references: encode_section(Section::References, &resume.references, &mut visibility),
        projects: encode_section(Section::Projects, &resume.projects, &mut visibility),
    };

    let editor = EditorState {
        summaries: resume.summaries.clone(),
        active_summary_id: resume.active_summary_id.clone(),
        icon_settings: resume.icon_settings.clone(),
    };

    let extensions = Extensions {
        schema_version: SCHEMA_VERSION.to_string(),
        visibility,
        backup: BackupMetadata {
            exported_at: options.exported_at.clone(),
            exported_by: options.exported_by.clone(),
            schema_version: SCHEMA_VERSION.to_string(),
            format: BACKUP_FORMAT.to_string(),
            preserves_visibility: true,
        },
        non_conforming: resume.non_conforming_data.clone(),
        editor: (!editor.is_empty()).then_some(editor),
    };

    (payload, extensions)
}

/// Standards export: the payload alone.
pub fn to_clean(resume: &CanonicalResume) -> CleanResume {
    encode(resume).0
}

/// Backup export: payload and extensions in one document.
pub fn to_extended(resume: &CanonicalResume, options: &EncodeOptions) -> ExtendedDocument {
    let (payload, extensions) = encode_with(resume, options);
    ExtendedDocument {
        payload,
        extensions,
    }
}

/// Strips one collection, recording item flags (omitted when empty) and
/// per-item sub-item flags (omitted for empty sub-collections).
fn encode_section<E>(
    section: Section,
    items: &[Item<E>],
    visibility: &mut VisibilityExtension,
) -> Vec<E::Mapped<String>>
where
    E: MapSubItems<SubItem>,
{
    let key = section.key();
    if !items.is_empty() {
        visibility
            .items
            .insert(key.to_string(), items.iter().map(|item| item.visible).collect());
    }

    let mut clean = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let mut flags = SubItemFlags::new();
        let entry = item.content.map_sub_items(|kind, subs| {
            if !subs.is_empty() {
                flags.insert(
                    kind.key().to_string(),
                    subs.iter().map(sub_item::is_visible).collect(),
                );
            }
            subs.iter().map(sub_item::to_plain).collect::<Vec<String>>()
        });
        if !flags.is_empty() {
            visibility
                .sub_items
                .entry(key.to_string())
                .or_default()
                .insert(index, flags);
        }
        clean.push(entry);
    }
    clean
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::codec::normalize::normalize;
    use crate::codec::sub_item::{plain, tagged};
    use crate::models::resume::WorkEntry;

    fn options() -> EncodeOptions {
        EncodeOptions {
            exported_at: "2026-01-02T03:04:05.000Z".to_string(),
            exported_by: "tests".to_string(),
        }
    }

    fn work(name: &str, highlights: Vec<SubItem>) -> WorkEntry<SubItem> {
        WorkEntry {
            name: name.to_string(),
            highlights,
            ..Default::default()
        }
    }

    fn contains_key(value: &Value, needle: &str) -> bool {
        match value {
            Value::Object(map) => map
                .iter()
                .any(|(k, v)| k == needle || contains_key(v, needle)),
            Value::Array(values) => values.iter().any(|v| contains_key(v, needle)),
            _ => false,
        }
    }

    #[test]
    fn test_payload_has_no_visibility_anywhere() {
        let resume = normalize(&json!({
            "basics": {"profiles": [{"network": "GitHub", "visible": false}]},
            "work": [{"name": "Acme", "visible": false, "highlights": [{"text": "x", "visible": false}]}],
            "projects": [{"name": "p", "roles": [{"text": "Lead"}], "keywords": ["k"]}]
        }));
        let (payload, _) = encode_with(&resume, &options());
        let wire = serde_json::to_value(&payload).unwrap();
        assert!(!contains_key(&wire, "visible"));
        assert_eq!(wire["work"][0]["highlights"], json!(["x"]));
        assert_eq!(wire["projects"][0]["roles"], json!(["Lead"]));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let mut resume = CanonicalResume::default();
        resume.work.push(Item::shown(work("Acme", vec![])));
        let (_, ext) = encode_with(&resume, &options());
        assert_eq!(ext.visibility.items.keys().collect::<Vec<_>>(), vec!["work"]);
        assert!(ext.visibility.sub_items.is_empty());
    }

    #[test]
    fn test_item_and_sub_item_flags() {
        let mut resume = CanonicalResume::default();
        resume.work.push(Item::shown(work("Acme", vec![])));
        resume.work.push(Item::new(
            work(
                "Globex",
                vec![tagged("A", true), tagged("B", false), plain("C")],
            ),
            false,
        ));
        let (_, ext) = encode_with(&resume, &options());
        assert_eq!(ext.visibility.items["work"], vec![true, false]);
        let by_index = &ext.visibility.sub_items["work"];
        assert!(!by_index.contains_key(&0));
        assert_eq!(by_index[&1]["highlights"], vec![true, false, true]);
    }

    #[test]
    fn test_alignment_follows_content_after_removal() {
        let mut resume = CanonicalResume::default();
        resume.work.push(Item::shown(work(
            "Acme",
            vec![tagged("A", true), tagged("B", false), tagged("C", true)],
        )));
        resume.work[0].content.highlights.remove(1);

        let (payload, ext) = encode_with(&resume, &options());
        assert_eq!(payload.work[0].highlights, vec!["A", "C"]);
        assert_eq!(ext.visibility.sub_items["work"][&0]["highlights"], vec![true, true]);
    }

    #[test]
    fn test_legacy_strings_encode_as_visible() {
        let resume = normalize(&json!({
            "skills": [{"name": "Languages", "keywords": ["Rust", "Go", " spaced "]}]
        }));
        let (payload, ext) = encode_with(&resume, &options());
        assert_eq!(payload.skills[0].keywords, vec!["Rust", "Go", " spaced "]);
        assert_eq!(
            ext.visibility.sub_items["skills"][&0]["keywords"],
            vec![true, true, true]
        );
    }

    #[test]
    fn test_sections_metadata_and_passthrough() {
        let mut resume = normalize(&json!({
            "sectionVisibility": {"volunteer": false},
            "languages": 5,
            "summaries": [{"id": "s1", "name": "Main", "content": "Hello"}]
        }));
        resume.active_summary_id = Some("s1".to_string());
        let (_, ext) = encode_with(&resume, &options());

        assert_eq!(ext.schema_version, SCHEMA_VERSION);
        assert_eq!(ext.visibility.sections, resume.section_visibility.0);
        assert_eq!(ext.visibility.sections["volunteer"], false);
        assert_eq!(ext.backup.format, "extended");
        assert!(ext.backup.preserves_visibility);
        assert_eq!(ext.backup.exported_by, "tests");
        assert_eq!(ext.non_conforming, resume.non_conforming_data);
        let editor = ext.editor.unwrap();
        assert_eq!(editor.summaries.len(), 1);
        assert_eq!(editor.active_summary_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_extended_document_shape() {
        let resume = normalize(&json!({"basics": {"name": "Ada"}}));
        let doc = to_extended(&resume, &options());
        let wire = serde_json::to_value(&doc).unwrap();
        assert_eq!(wire["basics"]["name"], json!("Ada"));
        assert_eq!(wire["extensions"]["schemaVersion"], json!("1.0.0"));
        assert_eq!(wire["extensions"]["backup"]["format"], json!("extended"));
        assert!(wire["extensions"].get("editor").is_none());
        assert!(wire["extensions"].get("nonConforming").is_none());
    }
}
