use std::fmt;

use crate::page::document::{Document, Element, ElementId};

/// Semantic interaction hint shown by the custom cursor.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Affordance {
    #[default]
    Default,
    Pointer,
    Text,
    View,
}

impl fmt::Display for Affordance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::Pointer => "pointer",
            Self::Text => "text",
            Self::View => "view",
        })
    }
}

/// Markup opt-in attribute: `data-cursor="pointer"` or `data-cursor="view"`.
pub const CURSOR_ATTR: &str = "data-cursor";

/// Marker class for elements that pulse the outer ring while hovered.
pub const MAGNETIC_CLASS: &str = "magnetic";

/// Element predicate used by [`AFFORDANCE_RULES`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Matcher {
    Tag(&'static str),
    HasAttr(&'static str),
    AttrEq(&'static str, &'static str),
}

impl Matcher {
    pub fn matches(&self, el: &Element) -> bool {
        match *self {
            Self::Tag(tag) => el.tag.eq_ignore_ascii_case(tag),
            Self::HasAttr(name) => el.has_attr(name),
            Self::AttrEq(name, value) => el.attr_value(name) == Some(value),
        }
    }
}

/// Ordered matching table; the first matching rule wins.
pub const AFFORDANCE_RULES: &[(Matcher, Affordance)] = &[
    (Matcher::AttrEq(CURSOR_ATTR, "view"), Affordance::View),
    (Matcher::Tag("a"), Affordance::Pointer),
    (Matcher::Tag("button"), Affordance::Pointer),
    (Matcher::AttrEq(CURSOR_ATTR, "pointer"), Affordance::Pointer),
    (Matcher::Tag("input"), Affordance::Text),
    (Matcher::Tag("textarea"), Affordance::Text),
    (Matcher::HasAttr("contenteditable"), Affordance::Text),
];

/// Affordance of a single element, ignoring its ancestors.
pub fn resolve(el: &Element) -> Affordance {
    AFFORDANCE_RULES
        .iter()
        .find(|(m, _)| m.matches(el))
        .map(|(_, a)| *a)
        .unwrap_or_default()
}

/// Affordance of the closest element (starting at `id`) that yields a non-default one.
pub fn resolve_closest(doc: &Document, id: ElementId) -> Affordance {
    doc.self_and_ancestors(id)
        .filter_map(|a| doc.get(a))
        .map(resolve)
        .find(|a| *a != Affordance::Default)
        .unwrap_or_default()
}

pub fn is_magnetic(doc: &Document, id: ElementId) -> bool {
    doc.self_and_ancestors(id)
        .filter_map(|a| doc.get(a))
        .any(|el| el.has_class(MAGNETIC_CLASS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Rect;

    fn el(tag: &str) -> Element {
        Element::new(tag, Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn view_beats_pointer_beats_text() {
        assert_eq!(resolve(&el("a").attr(CURSOR_ATTR, "view")), Affordance::View);
        assert_eq!(
            resolve(&el("input").attr(CURSOR_ATTR, "pointer")),
            Affordance::Pointer
        );
        assert_eq!(resolve(&el("textarea")), Affordance::Text);
        assert_eq!(resolve(&el("div").attr("contenteditable", "")), Affordance::Text);
        assert_eq!(resolve(&el("div")), Affordance::Default);
        assert_eq!(resolve(&el("BUTTON")), Affordance::Pointer);
    }

    #[test]
    fn closest_tagged_ancestor_decides() {
        let mut doc = Document::new();
        let card = doc
            .append(None, el("div").attr(CURSOR_ATTR, "view").class(MAGNETIC_CLASS))
            .unwrap();
        let img = doc.append(Some(card), el("img")).unwrap();
        let link = doc.append(Some(card), el("a")).unwrap();
        assert_eq!(resolve_closest(&doc, img), Affordance::View);
        assert_eq!(resolve_closest(&doc, link), Affordance::Pointer);
        assert!(is_magnetic(&doc, img));
        assert_eq!(resolve_closest(&doc, ElementId(404)), Affordance::Default);
    }
}
