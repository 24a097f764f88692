//! Canonical model normalizer.
//!
//! Turns any JSON value (local storage, fetched templates, uploads) into a fully
//! populated [`CanonicalResume`]. Every mismatch is coerced to a safe default
//! and recorded through the [`Preserver`]; normalization itself never fails.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::codec::preserver::{json_type, Preserver};
use crate::codec::sub_item;
use crate::models::non_conforming::NonConformingData;
use crate::models::resume::{
    AwardEntry, Basics, CanonicalResume, CertificateEntry, EducationEntry, IconSettings,
    InterestEntry, Item, LanguageEntry, Location, NamedSummary, Profile, ProjectEntry,
    PublicationEntry, ReferenceEntry, Section, SectionVisibility, SkillEntry, SubItem,
    VolunteerEntry, WorkEntry,
};

const ROOT: &str = "root";

const TOP_LEVEL_KEYS: &[&str] = &[
    "$schema",
    "meta",
    "extensions",
    "basics",
    "work",
    "volunteer",
    "education",
    "awards",
    "certificates",
    "publications",
    "skills",
    "languages",
    "interests",
    "references",
    "projects",
    "sectionVisibility",
    "nonConformingData",
    "summaries",
    "activeSummaryId",
    "iconSettings",
];

const BASICS_KEYS: &[&str] = &[
    "name", "label", "image", "email", "phone", "url", "summary", "location", "profiles",
];
const LOCATION_KEYS: &[&str] = &["address", "postalCode", "city", "countryCode", "region"];
const PROFILE_KEYS: &[&str] = &["network", "username", "url"];
const WORK_KEYS: &[&str] = &[
    "name",
    "position",
    "url",
    "startDate",
    "endDate",
    "summary",
    "location",
    "description",
    "highlights",
];
const VOLUNTEER_KEYS: &[&str] = &[
    "organization",
    "position",
    "url",
    "startDate",
    "endDate",
    "summary",
    "highlights",
];
const EDUCATION_KEYS: &[&str] = &[
    "institution",
    "url",
    "area",
    "studyType",
    "startDate",
    "endDate",
    "score",
    "courses",
];
const AWARD_KEYS: &[&str] = &["title", "date", "awarder", "summary"];
const CERTIFICATE_KEYS: &[&str] = &["name", "date", "issuer", "url"];
const PUBLICATION_KEYS: &[&str] = &["name", "publisher", "releaseDate", "url", "summary"];
const SKILL_KEYS: &[&str] = &["name", "level", "keywords"];
const LANGUAGE_KEYS: &[&str] = &["language", "fluency"];
const INTEREST_KEYS: &[&str] = &["name", "keywords"];
const REFERENCE_KEYS: &[&str] = &["name", "reference"];
const PROJECT_KEYS: &[&str] = &[
    "name",
    "description",
    "startDate",
    "endDate",
    "url",
    "entity",
    "type",
    "highlights",
    "keywords",
    "roles",
];
const SUMMARY_KEYS: &[&str] = &["id", "name", "content"];
const ICON_KEYS: &[&str] = &["image", "offsetX", "offsetY", "size"];

/// Produces a fully populated canonical model from any JSON value.
pub fn normalize(raw: &Value) -> CanonicalResume {
    let mut preserver = Preserver::new();
    let mut resume = normalize_with(raw, &mut preserver);

    let carried = resume.non_conforming_data.take();
    let recorded = preserver.invalid_field_count();
    resume.non_conforming_data = preserver.finish(carried, Some(raw));

    if recorded > 0 {
        warn!(recorded, "normalization recorded non-conforming fields");
    } else {
        debug!("normalized resume without diagnostics");
    }
    resume
}

fn normalize_with(raw: &Value, preserver: &mut Preserver) -> CanonicalResume {
    let empty = Map::new();
    let root = match raw {
        Value::Object(map) => map,
        other => {
            preserver.record(
                ROOT,
                "",
                other,
                format!("expected object, got {}", json_type(other)),
            );
            &empty
        }
    };

    for (key, value) in root {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            preserver.record(ROOT, key.clone(), value, "unrecognized field");
        }
    }
    if let Some(extensions) = root.get("extensions") {
        preserver.record(
            ROOT,
            "extensions",
            extensions,
            "extension block is only applied when importing a backup",
        );
    }

    CanonicalResume {
        schema: optional_string(root.get("$schema"), "$schema", preserver),
        meta: coerce_object(preserver, ROOT, "meta", root.get("meta")).cloned(),
        basics: basics(root, preserver),
        work: collection(root, Section::Work, WORK_KEYS, preserver, |f| WorkEntry {
            name: f.string("name"),
            position: f.string("position"),
            url: f.string("url"),
            start_date: f.string("startDate"),
            end_date: f.string("endDate"),
            summary: f.string("summary"),
            location: f.string("location"),
            description: f.string("description"),
            highlights: f.sub_items("highlights"),
        }),
        volunteer: collection(root, Section::Volunteer, VOLUNTEER_KEYS, preserver, |f| {
            VolunteerEntry {
                organization: f.string("organization"),
                position: f.string("position"),
                url: f.string("url"),
                start_date: f.string("startDate"),
                end_date: f.string("endDate"),
                summary: f.string("summary"),
                highlights: f.sub_items("highlights"),
            }
        }),
        education: collection(root, Section::Education, EDUCATION_KEYS, preserver, |f| {
            EducationEntry {
                institution: f.string("institution"),
                url: f.string("url"),
                area: f.string("area"),
                study_type: f.string("studyType"),
                start_date: f.string("startDate"),
                end_date: f.string("endDate"),
                score: f.string("score"),
                courses: f.sub_items("courses"),
            }
        }),
        awards: collection(root, Section::Awards, AWARD_KEYS, preserver, |f| AwardEntry {
            title: f.string("title"),
            date: f.string("date"),
            awarder: f.string("awarder"),
            summary: f.string("summary"),
        }),
        certificates: collection(root, Section::Certificates, CERTIFICATE_KEYS, preserver, |f| {
            CertificateEntry {
                name: f.string("name"),
                date: f.string("date"),
                issuer: f.string("issuer"),
                url: f.string("url"),
            }
        }),
        publications: collection(root, Section::Publications, PUBLICATION_KEYS, preserver, |f| {
            PublicationEntry {
                name: f.string("name"),
                publisher: f.string("publisher"),
                release_date: f.string("releaseDate"),
                url: f.string("url"),
                summary: f.string("summary"),
            }
        }),
        skills: collection(root, Section::Skills, SKILL_KEYS, preserver, |f| SkillEntry {
            name: f.string("name"),
            level: f.string("level"),
            keywords: f.sub_items("keywords"),
        }),
        languages: collection(root, Section::Languages, LANGUAGE_KEYS, preserver, |f| {
            LanguageEntry {
                language: f.string("language"),
                fluency: f.string("fluency"),
            }
        }),
        interests: collection(root, Section::Interests, INTEREST_KEYS, preserver, |f| {
            InterestEntry {
                name: f.string("name"),
                keywords: f.sub_items("keywords"),
            }
        }),
        references: collection(root, Section::References, REFERENCE_KEYS, preserver, |f| {
            ReferenceEntry {
                name: f.string("name"),
                reference: f.string("reference"),
            }
        }),
        projects: collection(root, Section::Projects, PROJECT_KEYS, preserver, |f| {
            ProjectEntry {
                name: f.string("name"),
                description: f.string("description"),
                start_date: f.string("startDate"),
                end_date: f.string("endDate"),
                url: f.string("url"),
                entity: f.string("entity"),
                kind: f.string("type"),
                highlights: f.sub_items("highlights"),
                keywords: f.sub_items("keywords"),
                roles: f.sub_items("roles"),
            }
        }),
        section_visibility: section_visibility(root.get("sectionVisibility"), preserver),
        non_conforming_data: carried_non_conforming(root.get("nonConformingData"), preserver),
        summaries: summaries(root.get("summaries"), preserver),
        active_summary_id: optional_string(root.get("activeSummaryId"), "activeSummaryId", preserver),
        icon_settings: icon_settings(root.get("iconSettings"), preserver),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Safe coercions, one per primitive kind
// ────────────────────────────────────────────────────────────────────────────

/// Absent and null become `""` silently; scalars keep their string form but are
/// recorded; arrays and objects become `""` and are recorded.
fn coerce_string(
    preserver: &mut Preserver,
    section: &str,
    field: &str,
    value: Option<&Value>,
) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => {
            preserver.record(
                section,
                field,
                v,
                format!("expected string, got {}", json_type(v)),
            );
            v.to_string()
        }
        Some(v) => {
            preserver.record(
                section,
                field,
                v,
                format!("expected string, got {}", json_type(v)),
            );
            String::new()
        }
    }
}

fn coerce_array<'a>(
    preserver: &mut Preserver,
    section: &str,
    field: &str,
    value: Option<&'a Value>,
) -> &'a [Value] {
    match value {
        None | Some(Value::Null) => &[],
        Some(Value::Array(values)) => values,
        Some(v) => {
            preserver.record(
                section,
                field,
                v,
                format!("expected array, got {}", json_type(v)),
            );
            &[]
        }
    }
}

fn coerce_object<'a>(
    preserver: &mut Preserver,
    section: &str,
    field: &str,
    value: Option<&'a Value>,
) -> Option<&'a Map<String, Value>> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(v) => {
            preserver.record(
                section,
                field,
                v,
                format!("expected object, got {}", json_type(v)),
            );
            None
        }
    }
}

fn coerce_number(
    preserver: &mut Preserver,
    section: &str,
    field: &str,
    value: Option<&Value>,
) -> f64 {
    match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(v) => {
            let parsed = v.as_str().and_then(|s| s.trim().parse::<f64>().ok());
            preserver.record(
                section,
                field,
                v,
                format!("expected number, got {}", json_type(v)),
            );
            parsed.unwrap_or(0.0)
        }
    }
}

/// Only an explicit `false` hides; anything else that is not a boolean is
/// recorded and resolves to visible.
fn coerce_visible(
    preserver: &mut Preserver,
    section: &str,
    field: &str,
    value: Option<&Value>,
) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(visible)) => *visible,
        Some(v) => {
            preserver.record(
                section,
                field,
                v,
                format!("expected boolean, got {}", json_type(v)),
            );
            true
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field reader
// ────────────────────────────────────────────────────────────────────────────

/// Reads the fields of one JSON object, recording every mismatch under
/// `section` with a path such as `[2].highlights`.
struct Fields<'a, 'p> {
    section: &'static str,
    prefix: String,
    map: &'a Map<String, Value>,
    preserver: &'p mut Preserver,
}

impl<'a, 'p> Fields<'a, 'p> {
    fn new(
        section: &'static str,
        prefix: String,
        map: &'a Map<String, Value>,
        preserver: &'p mut Preserver,
    ) -> Self {
        Fields {
            section,
            prefix,
            map,
            preserver,
        }
    }

    fn path(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    fn string(&mut self, key: &str) -> String {
        let field = self.path(key);
        coerce_string(self.preserver, self.section, &field, self.map.get(key))
    }

    fn number(&mut self, key: &str) -> f64 {
        let field = self.path(key);
        coerce_number(self.preserver, self.section, &field, self.map.get(key))
    }

    fn object(&mut self, key: &str) -> Option<&'a Map<String, Value>> {
        let field = self.path(key);
        coerce_object(self.preserver, self.section, &field, self.map.get(key))
    }

    fn visible(&mut self) -> bool {
        let field = self.path("visible");
        coerce_visible(self.preserver, self.section, &field, self.map.get("visible"))
    }

    /// Highlights, keywords, roles or courses in either accepted form.
    fn sub_items(&mut self, key: &str) -> Vec<SubItem> {
        let field = self.path(key);
        let values = coerce_array(self.preserver, self.section, &field, self.map.get(key));
        let mut items = Vec::with_capacity(values.len());

        for (index, value) in values.iter().enumerate() {
            let item_field = format!("{field}[{index}]");
            match value {
                Value::String(text) => items.push(sub_item::plain(text.clone())),
                Value::Object(obj) => match obj.get("text") {
                    Some(Value::String(text)) => {
                        let visible = coerce_visible(
                            self.preserver,
                            self.section,
                            &format!("{item_field}.visible"),
                            obj.get("visible"),
                        );
                        items.push(sub_item::tagged(text.clone(), visible));
                        for (key, extra) in obj {
                            if key != "text" && key != "visible" {
                                self.preserver.record(
                                    self.section,
                                    format!("{item_field}.{key}"),
                                    extra,
                                    "unrecognized field",
                                );
                            }
                        }
                    }
                    _ => self.preserver.record(
                        self.section,
                        item_field,
                        value,
                        "expected string or object with text",
                    ),
                },
                Value::Number(_) | Value::Bool(_) => {
                    self.preserver.record(
                        self.section,
                        item_field,
                        value,
                        format!("expected string, got {}", json_type(value)),
                    );
                    items.push(sub_item::plain(value.to_string()));
                }
                _ => self.preserver.record(
                    self.section,
                    item_field,
                    value,
                    format!("expected string, got {}", json_type(value)),
                ),
            }
        }
        items
    }

    /// Records keys outside `known` (and the `visible` flag).
    fn finish(self, known: &[&str]) {
        for (key, value) in self.map {
            if key != "visible" && !known.contains(&key.as_str()) {
                let field = format!("{}{}", self.prefix, key);
                self.preserver
                    .record(self.section, field, value, "unrecognized field");
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

fn collection<T>(
    container: &Map<String, Value>,
    section: Section,
    known: &[&str],
    preserver: &mut Preserver,
    build: impl Fn(&mut Fields) -> T,
) -> Vec<Item<T>> {
    let key = section.key();
    let values = coerce_array(preserver, key, key, container.get(key));
    let mut items = Vec::with_capacity(values.len());

    for (index, value) in values.iter().enumerate() {
        let Some(map) = value.as_object() else {
            preserver.record(
                key,
                format!("[{index}]"),
                value,
                format!("expected object, got {}", json_type(value)),
            );
            continue;
        };
        let mut fields = Fields::new(key, format!("[{index}]."), map, preserver);
        let content = build(&mut fields);
        let visible = fields.visible();
        fields.finish(known);
        items.push(Item::new(content, visible));
    }
    items
}

fn basics(root: &Map<String, Value>, preserver: &mut Preserver) -> Basics<Item<Profile>> {
    let Some(map) = coerce_object(preserver, "basics", "basics", root.get("basics")) else {
        return Basics::default();
    };

    let mut fields = Fields::new("basics", String::new(), map, preserver);
    let name = fields.string("name");
    let label = fields.string("label");
    let image = fields.string("image");
    let email = fields.string("email");
    let phone = fields.string("phone");
    let url = fields.string("url");
    let summary = fields.string("summary");
    let location_map = fields.object("location");
    fields.finish(BASICS_KEYS);

    let location = match location_map {
        Some(location_map) => {
            let mut fields =
                Fields::new("basics", "location.".to_string(), location_map, preserver);
            let location = Location {
                address: fields.string("address"),
                postal_code: fields.string("postalCode"),
                city: fields.string("city"),
                country_code: fields.string("countryCode"),
                region: fields.string("region"),
            };
            fields.finish(LOCATION_KEYS);
            location
        }
        None => Location::default(),
    };

    let profiles = collection(map, Section::Profiles, PROFILE_KEYS, preserver, |f| Profile {
        network: f.string("network"),
        username: f.string("username"),
        url: f.string("url"),
    });

    Basics {
        name,
        label,
        image,
        email,
        phone,
        url,
        summary,
        location,
        profiles,
    }
}

/// Defaults overlaid by the input's booleans; legacy keys survive.
fn section_visibility(value: Option<&Value>, preserver: &mut Preserver) -> SectionVisibility {
    let Some(map) = coerce_object(preserver, "sectionVisibility", "sectionVisibility", value)
    else {
        return SectionVisibility::default();
    };

    let mut overrides = BTreeMap::new();
    for (section, flag) in map {
        match flag {
            Value::Bool(visible) => {
                overrides.insert(section.clone(), *visible);
            }
            other => preserver.record(
                "sectionVisibility",
                section.clone(),
                other,
                format!("expected boolean, got {}", json_type(other)),
            ),
        }
    }
    SectionVisibility::merged(&overrides)
}

fn carried_non_conforming(
    value: Option<&Value>,
    preserver: &mut Preserver,
) -> Option<NonConformingData> {
    let value = value.filter(|v| !v.is_null())?;
    match serde_json::from_value::<NonConformingData>(value.clone()) {
        Ok(data) if data.is_empty() => None,
        Ok(data) => Some(data),
        Err(e) => {
            preserver.record(
                "nonConformingData",
                "nonConformingData",
                value,
                format!("unreadable review record: {e}"),
            );
            None
        }
    }
}

fn summaries(value: Option<&Value>, preserver: &mut Preserver) -> Vec<NamedSummary> {
    let values = coerce_array(preserver, "summaries", "summaries", value);
    let mut summaries = Vec::with_capacity(values.len());

    for (index, value) in values.iter().enumerate() {
        let Some(map) = value.as_object() else {
            preserver.record(
                "summaries",
                format!("[{index}]"),
                value,
                format!("expected object, got {}", json_type(value)),
            );
            continue;
        };
        let mut fields = Fields::new("summaries", format!("[{index}]."), map, preserver);
        let mut id = fields.string("id");
        if id.is_empty() {
            id = Uuid::new_v4().to_string();
        }
        let summary = NamedSummary {
            id,
            name: fields.string("name"),
            content: fields.string("content"),
        };
        fields.finish(SUMMARY_KEYS);
        summaries.push(summary);
    }
    summaries
}

fn optional_string(value: Option<&Value>, field: &str, preserver: &mut Preserver) -> Option<String> {
    let value = value.filter(|v| !v.is_null())?;
    Some(coerce_string(preserver, ROOT, field, Some(value))).filter(|s| !s.is_empty())
}

fn icon_settings(value: Option<&Value>, preserver: &mut Preserver) -> Option<IconSettings> {
    let map = coerce_object(preserver, "iconSettings", "iconSettings", value)?;
    let mut fields = Fields::new("iconSettings", String::new(), map, preserver);
    let settings = IconSettings {
        image: fields.string("image"),
        offset_x: fields.number("offsetX"),
        offset_y: fields.number("offsetY"),
        size: fields.number("size"),
    };
    fields.finish(ICON_KEYS);
    Some(settings)
}
