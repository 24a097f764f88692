use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::non_conforming::NonConformingData;

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

/// Every section name that carries a section-level visibility toggle.
/// `summary` has a toggle but no item collection.
pub const KNOWN_SECTIONS: &[&str] = &[
    "summary",
    "profiles",
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
];

/// Collections that carry item-level visibility, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Profiles,
    Work,
    Volunteer,
    Education,
    Awards,
    Certificates,
    Publications,
    Skills,
    Languages,
    Interests,
    References,
    Projects,
}

impl Section {
    pub fn key(self) -> &'static str {
        match self {
            Section::Profiles => "profiles",
            Section::Work => "work",
            Section::Volunteer => "volunteer",
            Section::Education => "education",
            Section::Awards => "awards",
            Section::Certificates => "certificates",
            Section::Publications => "publications",
            Section::Skills => "skills",
            Section::Languages => "languages",
            Section::Interests => "interests",
            Section::References => "references",
            Section::Projects => "projects",
        }
    }
}

/// Names of the nested sub-item lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubItemKind {
    Highlights,
    Keywords,
    Roles,
    Courses,
}

impl SubItemKind {
    pub fn key(self) -> &'static str {
        match self {
            SubItemKind::Highlights => "highlights",
            SubItemKind::Keywords => "keywords",
            SubItemKind::Roles => "roles",
            SubItemKind::Courses => "courses",
        }
    }
}

/// Section-level visibility. Known sections are always present after
/// normalization; unknown legacy keys are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionVisibility(pub BTreeMap<String, bool>);

impl Default for SectionVisibility {
    fn default() -> Self {
        SectionVisibility(
            KNOWN_SECTIONS
                .iter()
                .map(|section| (section.to_string(), true))
                .collect(),
        )
    }
}

impl SectionVisibility {
    /// Defaults overlaid by `overrides`.
    pub fn merged(overrides: &BTreeMap<String, bool>) -> Self {
        let mut merged = Self::default();
        merged
            .0
            .extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));
        merged
    }

    pub fn is_visible(&self, section: &str) -> bool {
        self.0.get(section).copied().unwrap_or(true)
    }

    pub fn set(&mut self, section: &str, visible: bool) {
        self.0.insert(section.to_string(), visible);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sub-items and item pairing
// ────────────────────────────────────────────────────────────────────────────

/// A highlight, keyword, role or course. Legacy data stores plain strings,
/// the editor stores tagged objects. Only `codec::sub_item` matches on this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubItem {
    Plain(String),
    Tagged {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visible: Option<bool>,
    },
}

impl Default for SubItem {
    fn default() -> Self {
        SubItem::Plain(String::new())
    }
}

/// A collection entry paired with its visibility flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item<T> {
    #[serde(flatten)]
    pub content: T,
    pub visible: bool,
}

impl<T> Item<T> {
    pub fn new(content: T, visible: bool) -> Self {
        Item { content, visible }
    }

    pub fn shown(content: T) -> Self {
        Item::new(content, true)
    }
}

/// Rebuilds an entry with each of its sub-item lists mapped through `f`.
/// Entries without sub-item lists map to themselves.
pub trait MapSubItems<S> {
    type Mapped<T>;

    fn map_sub_items<T>(&self, f: impl FnMut(SubItemKind, &[S]) -> Vec<T>) -> Self::Mapped<T>;
}

macro_rules! impl_plain_entry {
    ($($entry:ty),* $(,)?) => {
        $(
            impl<S> MapSubItems<S> for $entry {
                type Mapped<T> = $entry;

                fn map_sub_items<T>(&self, _f: impl FnMut(SubItemKind, &[S]) -> Vec<T>) -> $entry {
                    self.clone()
                }
            }
        )*
    };
}

// ────────────────────────────────────────────────────────────────────────────
// Entries (JSON Resume shape). `S` is the sub-item representation:
// `SubItem` in the canonical model, `String` in the clean payload.
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub country_code: String,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub network: String,
    pub username: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Basics<P> {
    pub name: String,
    pub label: String,
    pub image: String,
    pub email: String,
    pub phone: String,
    pub url: String,
    pub summary: String,
    pub location: Location,
    pub profiles: Vec<P>,
}

impl<P> Default for Basics<P> {
    fn default() -> Self {
        Basics {
            name: String::new(),
            label: String::new(),
            image: String::new(),
            email: String::new(),
            phone: String::new(),
            url: String::new(),
            summary: String::new(),
            location: Location::default(),
            profiles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkEntry<S> {
    pub name: String,
    pub position: String,
    pub url: String,
    pub start_date: String,
    pub end_date: String,
    pub summary: String,
    pub location: String,
    pub description: String,
    pub highlights: Vec<S>,
}

impl<S> MapSubItems<S> for WorkEntry<S> {
    type Mapped<T> = WorkEntry<T>;

    fn map_sub_items<T>(&self, mut f: impl FnMut(SubItemKind, &[S]) -> Vec<T>) -> WorkEntry<T> {
        WorkEntry {
            name: self.name.clone(),
            position: self.position.clone(),
            url: self.url.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            summary: self.summary.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            highlights: f(SubItemKind::Highlights, &self.highlights),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerEntry<S> {
    pub organization: String,
    pub position: String,
    pub url: String,
    pub start_date: String,
    pub end_date: String,
    pub summary: String,
    pub highlights: Vec<S>,
}

impl<S> MapSubItems<S> for VolunteerEntry<S> {
    type Mapped<T> = VolunteerEntry<T>;

    fn map_sub_items<T>(
        &self,
        mut f: impl FnMut(SubItemKind, &[S]) -> Vec<T>,
    ) -> VolunteerEntry<T> {
        VolunteerEntry {
            organization: self.organization.clone(),
            position: self.position.clone(),
            url: self.url.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            summary: self.summary.clone(),
            highlights: f(SubItemKind::Highlights, &self.highlights),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry<S> {
    pub institution: String,
    pub url: String,
    pub area: String,
    pub study_type: String,
    pub start_date: String,
    pub end_date: String,
    pub score: String,
    pub courses: Vec<S>,
}

impl<S> MapSubItems<S> for EducationEntry<S> {
    type Mapped<T> = EducationEntry<T>;

    fn map_sub_items<T>(
        &self,
        mut f: impl FnMut(SubItemKind, &[S]) -> Vec<T>,
    ) -> EducationEntry<T> {
        EducationEntry {
            institution: self.institution.clone(),
            url: self.url.clone(),
            area: self.area.clone(),
            study_type: self.study_type.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            score: self.score.clone(),
            courses: f(SubItemKind::Courses, &self.courses),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwardEntry {
    pub title: String,
    pub date: String,
    pub awarder: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateEntry {
    pub name: String,
    pub date: String,
    pub issuer: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationEntry {
    pub name: String,
    pub publisher: String,
    pub release_date: String,
    pub url: String,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry<S> {
    pub name: String,
    pub level: String,
    pub keywords: Vec<S>,
}

impl<S> MapSubItems<S> for SkillEntry<S> {
    type Mapped<T> = SkillEntry<T>;

    fn map_sub_items<T>(&self, mut f: impl FnMut(SubItemKind, &[S]) -> Vec<T>) -> SkillEntry<T> {
        SkillEntry {
            name: self.name.clone(),
            level: self.level.clone(),
            keywords: f(SubItemKind::Keywords, &self.keywords),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub language: String,
    pub fluency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterestEntry<S> {
    pub name: String,
    pub keywords: Vec<S>,
}

impl<S> MapSubItems<S> for InterestEntry<S> {
    type Mapped<T> = InterestEntry<T>;

    fn map_sub_items<T>(
        &self,
        mut f: impl FnMut(SubItemKind, &[S]) -> Vec<T>,
    ) -> InterestEntry<T> {
        InterestEntry {
            name: self.name.clone(),
            keywords: f(SubItemKind::Keywords, &self.keywords),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub name: String,
    pub reference: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry<S> {
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub url: String,
    pub entity: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub highlights: Vec<S>,
    pub keywords: Vec<S>,
    pub roles: Vec<S>,
}

impl<S> MapSubItems<S> for ProjectEntry<S> {
    type Mapped<T> = ProjectEntry<T>;

    fn map_sub_items<T>(&self, mut f: impl FnMut(SubItemKind, &[S]) -> Vec<T>) -> ProjectEntry<T> {
        ProjectEntry {
            name: self.name.clone(),
            description: self.description.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            url: self.url.clone(),
            entity: self.entity.clone(),
            kind: self.kind.clone(),
            highlights: f(SubItemKind::Highlights, &self.highlights),
            keywords: f(SubItemKind::Keywords, &self.keywords),
            roles: f(SubItemKind::Roles, &self.roles),
        }
    }
}

impl_plain_entry!(
    Profile,
    AwardEntry,
    CertificateEntry,
    PublicationEntry,
    LanguageEntry,
    ReferenceEntry,
);

// ────────────────────────────────────────────────────────────────────────────
// Editor-only state
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSummary {
    pub id: String,
    pub name: String,
    pub content: String,
}

/// Photo placement inside the rendered header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconSettings {
    pub image: String,
    pub offset_x: f64,
    pub offset_y: f64,
    pub size: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Documents
// ────────────────────────────────────────────────────────────────────────────

/// The in-memory editing model with visibility inline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResume {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    pub basics: Basics<Item<Profile>>,
    pub work: Vec<Item<WorkEntry<SubItem>>>,
    pub volunteer: Vec<Item<VolunteerEntry<SubItem>>>,
    pub education: Vec<Item<EducationEntry<SubItem>>>,
    pub awards: Vec<Item<AwardEntry>>,
    pub certificates: Vec<Item<CertificateEntry>>,
    pub publications: Vec<Item<PublicationEntry>>,
    pub skills: Vec<Item<SkillEntry<SubItem>>>,
    pub languages: Vec<Item<LanguageEntry>>,
    pub interests: Vec<Item<InterestEntry<SubItem>>>,
    pub references: Vec<Item<ReferenceEntry>>,
    pub projects: Vec<Item<ProjectEntry<SubItem>>>,
    pub section_visibility: SectionVisibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_conforming_data: Option<NonConformingData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summaries: Vec<NamedSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_summary_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_settings: Option<IconSettings>,
}

/// The standards-compatible export: no visibility anywhere, sub-items as text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanResume {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    pub basics: Basics<Profile>,
    pub work: Vec<WorkEntry<String>>,
    pub volunteer: Vec<VolunteerEntry<String>>,
    pub education: Vec<EducationEntry<String>>,
    pub awards: Vec<AwardEntry>,
    pub certificates: Vec<CertificateEntry>,
    pub publications: Vec<PublicationEntry>,
    pub skills: Vec<SkillEntry<String>>,
    pub languages: Vec<LanguageEntry>,
    pub interests: Vec<InterestEntry<String>>,
    pub references: Vec<ReferenceEntry>,
    pub projects: Vec<ProjectEntry<String>>,
}
