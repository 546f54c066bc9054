use std::collections::BTreeMap;

use crate::foundation::core::{Point, Rect};
use crate::foundation::error::{ShowreelError, ShowreelResult};

/// Handle to an element in a [`Document`]. Stable for the element's mounted lifetime.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ElementId(pub u32);

/// How an element's rectangle is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Positioning {
    /// Document space: moves with the page scroll.
    #[default]
    Flow,
    /// Viewport space: stays put while the page scrolls (loader, navigation).
    Fixed,
}

/// Class that removes an element (and its subtree) from pointer hit testing.
pub const POINTER_EVENTS_NONE: &str = "pointer-events-none";

/// Attribute used by section authors to label element handles inside a section.
pub const ROLE_ATTR: &str = "data-role";

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub tag: String,
    pub anchor: Option<String>,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub text: Option<String>,
    pub rect: Rect,
    pub positioning: Positioning,
}

impl Element {
    pub fn new(tag: impl Into<String>, rect: Rect) -> Self {
        Self {
            tag: tag.into(),
            anchor: None,
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            text: None,
            rect,
            positioning: Positioning::Flow,
        }
    }

    pub fn anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn role(self, role: impl Into<String>) -> Self {
        self.attr(ROLE_ATTR, role)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn fixed(mut self) -> Self {
        self.positioning = Positioning::Fixed;
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn role_name(&self) -> Option<&str> {
        self.attr_value(ROLE_ATTR)
    }
}

#[derive(Clone, Debug)]
struct Node {
    element: Element,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// In-memory element tree standing in for the page DOM.
///
/// Geometry is owned by the content collaborator; the orchestration layer only reads it
/// (plus [`Document::split_letters`], which mirrors the letter-splitting the reveal effects do).
#[derive(Clone, Debug, Default)]
pub struct Document {
    nodes: BTreeMap<ElementId, Node>,
    roots: Vec<ElementId>,
    next_id: u32,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `element` as the last child of `parent` (or as a new root).
    pub fn append(
        &mut self,
        parent: Option<ElementId>,
        element: Element,
    ) -> ShowreelResult<ElementId> {
        if let Some(p) = parent
            && !self.nodes.contains_key(&p)
        {
            return Err(ShowreelError::target_not_found(format!(
                "parent element {} is not mounted",
                p.0
            )));
        }

        let id = ElementId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.nodes.insert(
            id,
            Node {
                element,
                parent,
                children: Vec::new(),
            },
        );
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(node) => node.children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.nodes.get(&id).map(|n| &n.element)
    }

    /// Return `true` while `id` is mounted.
    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// `id` followed by its ancestors up to the root (CSS `closest` order).
    pub fn self_and_ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let start = self.contains(id).then_some(id);
        std::iter::successors(start, move |cur| self.parent(*cur))
    }

    /// Look up an element by its anchor (`#hero`).
    pub fn by_anchor(&self, anchor: &str) -> Option<ElementId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.element.anchor.as_deref() == Some(anchor))
            .map(|(id, _)| *id)
    }

    /// First descendant of `root` (document order) tagged with `data-role="{role}"`.
    pub fn find_role(&self, root: ElementId, role: &str) -> Option<ElementId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.get(*id).and_then(Element::role_name) == Some(role))
    }

    /// Every descendant of `root` tagged with `data-role="{role}"`, in document order.
    pub fn find_all_roles(&self, root: ElementId, role: &str) -> Vec<ElementId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.get(*id).and_then(Element::role_name) == Some(role))
            .collect()
    }

    /// Pre-order descendants of `root`, excluding `root`.
    pub fn descendants(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn set_rect(&mut self, id: ElementId, rect: Rect) -> ShowreelResult<()> {
        let node = self.nodes.get_mut(&id).ok_or_else(|| {
            ShowreelError::target_not_found(format!("element {} is not mounted", id.0))
        })?;
        node.element.rect = rect;
        Ok(())
    }

    /// Unmount `id` and its whole subtree. Returns the removed ids (empty if not mounted).
    pub fn remove(&mut self, id: ElementId) -> Vec<ElementId> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        match node.parent {
            Some(p) => {
                if let Some(parent) = self.nodes.get_mut(&p) {
                    parent.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }

        let mut removed = vec![id];
        removed.extend(self.descendants(id));
        for r in &removed {
            self.nodes.remove(r);
        }
        removed
    }

    /// Total scrollable height: the lowest edge of any flow element.
    pub fn height(&self) -> f64 {
        self.nodes
            .values()
            .filter(|n| n.element.positioning == Positioning::Flow)
            .map(|n| n.element.rect.y1)
            .fold(0.0, f64::max)
    }

    /// Deepest element under the viewport point `p` when the page is scrolled to `scroll_y`.
    ///
    /// Fixed elements sit above flow content; among equals the later element in document
    /// order wins (painted last). Subtrees marked [`POINTER_EVENTS_NONE`] are transparent.
    pub fn hit_test(&self, p: Point, scroll_y: f64) -> Option<ElementId> {
        let doc_p = Point::new(p.x, p.y + scroll_y);
        let mut best: Option<((bool, usize, usize), ElementId)> = None;
        let mut order = 0usize;
        let mut stack: Vec<(ElementId, usize)> = self.roots.iter().rev().map(|r| (*r, 0)).collect();

        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if node.element.has_class(POINTER_EVENTS_NONE) {
                continue;
            }
            order += 1;

            let fixed = node.element.positioning == Positioning::Fixed;
            let at = if fixed { p } else { doc_p };
            if node.element.rect.contains(at) {
                let key = (fixed, depth, order);
                if best.as_ref().is_none_or(|(k, _)| key > *k) {
                    best = Some((key, id));
                }
            }
            stack.extend(node.children.iter().rev().map(|c| (*c, depth + 1)));
        }

        best.map(|(_, id)| id)
    }

    /// Unmount every child subtree of `id`. Returns the removed ids.
    pub fn clear_children(&mut self, id: ElementId) -> Vec<ElementId> {
        let mut removed = Vec::new();
        for child in self.children(id).to_vec() {
            removed.extend(self.remove(child));
        }
        removed
    }

    /// Replace the children of `id` with one `span` per character of `text`.
    ///
    /// Spaces become non-breaking spaces so each letter keeps a box. The parent's rectangle is
    /// divided evenly between the letters.
    pub fn split_letters(&mut self, id: ElementId, text: &str) -> ShowreelResult<Vec<ElementId>> {
        let parent_rect = self
            .get(id)
            .map(|e| e.rect)
            .ok_or_else(|| ShowreelError::target_not_found(format!("element {}", id.0)))?;

        self.clear_children(id);

        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Ok(Vec::new());
        }
        let w = parent_rect.width() / chars.len() as f64;
        let mut out = Vec::with_capacity(chars.len());
        for (i, ch) in chars.into_iter().enumerate() {
            let ch = if ch == ' ' { '\u{a0}' } else { ch };
            let x0 = parent_rect.x0 + w * i as f64;
            let rect = Rect::new(x0, parent_rect.y0, x0 + w, parent_rect.y1);
            out.push(self.append(Some(id), Element::new("span", rect).text(ch.to_string()))?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (Document, ElementId, ElementId, ElementId) {
        let mut doc = Document::new();
        let section = doc
            .append(
                None,
                Element::new("section", Rect::new(0.0, 0.0, 1000.0, 800.0)).anchor("hero"),
            )
            .unwrap();
        let button = doc
            .append(
                Some(section),
                Element::new("button", Rect::new(100.0, 100.0, 300.0, 150.0)).role("cta"),
            )
            .unwrap();
        let nav = doc
            .append(
                None,
                Element::new("nav", Rect::new(0.0, 0.0, 1000.0, 60.0)).fixed(),
            )
            .unwrap();
        (doc, section, button, nav)
    }

    #[test]
    fn hit_test_prefers_deepest_then_fixed() {
        let (doc, section, button, nav) = page();
        assert_eq!(doc.hit_test(Point::new(150.0, 120.0), 0.0), Some(button));
        assert_eq!(doc.hit_test(Point::new(500.0, 500.0), 0.0), Some(section));
        assert_eq!(doc.hit_test(Point::new(150.0, 30.0), 0.0), Some(nav));
        // Scrolled by 100px, the viewport point (150, 20) sits over the button in document space,
        // but the fixed nav still covers it.
        assert_eq!(doc.hit_test(Point::new(150.0, 20.0), 100.0), Some(nav));
        assert_eq!(doc.hit_test(Point::new(150.0, 100.0), 0.0), Some(button));
        assert_eq!(doc.hit_test(Point::new(150.0, 100.0), 700.0), None);
    }

    #[test]
    fn pointer_events_none_is_transparent() {
        let mut doc = Document::new();
        let base = doc
            .append(None, Element::new("div", Rect::new(0.0, 0.0, 10.0, 10.0)))
            .unwrap();
        doc.append(
            None,
            Element::new("div", Rect::new(0.0, 0.0, 10.0, 10.0))
                .fixed()
                .class(POINTER_EVENTS_NONE),
        )
        .unwrap();
        assert_eq!(doc.hit_test(Point::new(5.0, 5.0), 0.0), Some(base));
    }

    #[test]
    fn remove_unmounts_subtree() {
        let (mut doc, section, button, _) = page();
        let removed = doc.remove(section);
        assert_eq!(removed, vec![section, button]);
        assert!(!doc.contains(button));
        assert!(doc.remove(section).is_empty());
        assert_eq!(doc.by_anchor("hero"), None);
    }

    #[test]
    fn split_letters_replaces_children() {
        let (mut doc, section, button, _) = page();
        let letters = doc.split_letters(section, "AB C").unwrap();
        assert_eq!(letters.len(), 4);
        assert!(!doc.contains(button));
        assert_eq!(doc.get(letters[2]).unwrap().text.as_deref(), Some("\u{a0}"));
        assert_eq!(doc.get(letters[1]).unwrap().rect.x0, 250.0);
        assert!(doc.split_letters(section, "").unwrap().is_empty());
        assert!(doc.children(section).is_empty());
    }

    #[test]
    fn clear_children_reports_whole_subtrees() {
        let (mut doc, section, button, _) = page();
        let letters = doc.split_letters(button, "OK").unwrap();
        let removed = doc.clear_children(section);
        assert!(removed.contains(&button));
        assert!(letters.iter().all(|l| removed.contains(l)));
        assert!(removed.iter().all(|r| !doc.contains(*r)));
        assert!(doc.clear_children(section).is_empty());
    }

    #[test]
    fn roles_and_anchors_resolve() {
        let (doc, section, button, _) = page();
        assert_eq!(doc.by_anchor("hero"), Some(section));
        assert_eq!(doc.find_role(section, "cta"), Some(button));
        assert_eq!(doc.find_role(section, "title"), None);
        assert_eq!(
            doc.self_and_ancestors(button).collect::<Vec<_>>(),
            vec![button, section]
        );
    }

    #[test]
    fn append_to_missing_parent_fails() {
        let mut doc = Document::new();
        let err = doc
            .append(Some(ElementId(42)), Element::new("div", Rect::ZERO))
            .unwrap_err();
        assert!(matches!(err, ShowreelError::TargetNotFound(_)));
    }
}
