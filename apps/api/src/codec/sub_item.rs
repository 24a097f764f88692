//! Sub-item resolver.
//!
//! Highlights, keywords, roles and courses arrive either as bare strings
//! (legacy and imported data) or as `{ text, visible? }` objects (editor data).
//! Everything else in the crate reads them through these accessors.

use crate::models::resume::SubItem;

/// The display text, regardless of form.
pub fn text(item: &SubItem) -> &str {
    match item {
        SubItem::Plain(text) => text,
        SubItem::Tagged { text, .. } => text,
    }
}

/// `true` unless the item is tagged with an explicit `visible: false`.
pub fn is_visible(item: &SubItem) -> bool {
    match item {
        SubItem::Plain(_) => true,
        SubItem::Tagged { visible, .. } => *visible != Some(false),
    }
}

/// Canonical tagged form with the resolved visibility spelled out.
pub fn to_tagged(item: &SubItem) -> SubItem {
    tagged(text(item), is_visible(item))
}

/// Text only; visibility is dropped, never folded into the text.
pub fn to_plain(item: &SubItem) -> String {
    text(item).to_string()
}

pub fn tagged(text: impl Into<String>, visible: bool) -> SubItem {
    SubItem::Tagged {
        text: text.into(),
        visible: Some(visible),
    }
}

pub fn plain(text: impl Into<String>) -> SubItem {
    SubItem::Plain(text.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_string_is_visible() {
        let item = plain("Shipped the billing rewrite");
        assert_eq!(text(&item), "Shipped the billing rewrite");
        assert!(is_visible(&item));
    }

    #[test]
    fn test_tagged_without_flag_is_visible() {
        let item = SubItem::Tagged {
            text: "Rust".to_string(),
            visible: None,
        };
        assert!(is_visible(&item));
    }

    #[test]
    fn test_tagged_hidden() {
        let item = tagged("Perl", false);
        assert_eq!(text(&item), "Perl");
        assert!(!is_visible(&item));
    }

    #[test]
    fn test_to_tagged_preserves_text_and_visibility() {
        assert_eq!(to_tagged(&plain("  spaced  ")), tagged("  spaced  ", true));
        assert_eq!(to_tagged(&tagged("x", false)), tagged("x", false));
    }

    #[test]
    fn test_to_plain_drops_visibility() {
        assert_eq!(to_plain(&tagged("Kubernetes", false)), "Kubernetes");
        assert_eq!(to_plain(&plain("Kubernetes")), "Kubernetes");
    }

    #[test]
    fn test_serde_accepts_both_forms() {
        let items: Vec<SubItem> =
            serde_json::from_str(r#"["a", {"text": "b", "visible": false}, {"text": "c"}]"#)
                .unwrap();
        assert_eq!(items[0], plain("a"));
        assert!(!is_visible(&items[1]));
        assert!(is_visible(&items[2]));
    }
}
