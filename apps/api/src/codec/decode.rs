//! Visibility restoration decoder.
//!
//! Inverse of [`crate::codec::encode`]. Assumes the extension was classified
//! as valid and supported; anything missing or misaligned resolves to visible.

use crate::codec::extensions::{Extensions, VisibilityExtension};
use crate::codec::sub_item;
use crate::models::resume::{
    Basics, CanonicalResume, CleanResume, Item, MapSubItems, Section, SectionVisibility, SubItem,
};

pub fn decode(payload: &CleanResume, extensions: &Extensions) -> CanonicalResume {
    let visibility = &extensions.visibility;
    let editor = extensions.editor.clone().unwrap_or_default();

    CanonicalResume {
        schema: payload.schema.clone(),
        meta: payload.meta.clone(),
        basics: Basics {
            name: payload.basics.name.clone(),
            label: payload.basics.label.clone(),
            image: payload.basics.image.clone(),
            email: payload.basics.email.clone(),
            phone: payload.basics.phone.clone(),
            url: payload.basics.url.clone(),
            summary: payload.basics.summary.clone(),
            location: payload.basics.location.clone(),
            profiles: decode_section(Section::Profiles, &payload.basics.profiles, visibility),
        },
        work: decode_section(Section::Work, &payload.work, visibility),
        volunteer: decode_section(Section::Volunteer, &payload.volunteer, visibility),
        education: decode_section(Section::Education, &payload.education, visibility),
        awards: decode_section(Section::Awards, &payload.awards, visibility),
        certificates: decode_section(Section::Certificates, &payload.certificates, visibility),
        publications: decode_section(Section::Publications, &payload.publications, visibility),
        skills: decode_section(Section::Skills, &payload.skills, visibility),
        languages: decode_section(Section::Languages, &payload.languages, visibility),
        interests: decode_section(Section::Interests, &payload.interests, visibility),
        references: decode_section(Section::References, &payload.references, visibility),
        projects: decode_section(Section::Projects, &payload.projects, visibility),
        section_visibility: SectionVisibility::merged(&visibility.sections),
        non_conforming_data: extensions.non_conforming.clone(),
        summaries: editor.summaries,
        active_summary_id: editor.active_summary_id,
        icon_settings: editor.icon_settings,
    }
}

fn decode_section<C>(
    section: Section,
    entries: &[C],
    visibility: &VisibilityExtension,
) -> Vec<Item<C::Mapped<SubItem>>>
where
    C: MapSubItems<String>,
{
    let key = section.key();
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let content = entry.map_sub_items(|kind, texts| {
                texts
                    .iter()
                    .enumerate()
                    .map(|(sub_index, text)| {
                        let visible = visibility.sub_item(key, index, kind.key(), sub_index);
                        sub_item::tagged(text.clone(), visible)
                    })
                    .collect::<Vec<SubItem>>()
            });
            Item::new(content, visibility.item(key, index))
        })
        .collect()
}
