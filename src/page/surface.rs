use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::page::document::ElementId;

/// Animatable visual properties.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Prop {
    Opacity,
    /// Horizontal translation in pixels.
    TranslateX,
    /// Vertical translation in pixels.
    TranslateY,
    /// Vertical translation as a percentage of the element's own height.
    TranslateYPercent,
    Scale,
    ScaleX,
    /// Rotation around the X axis, in degrees.
    RotateX,
    /// Rotation around the Y axis, in radians (the sphere widget's convention).
    RotateY,
    WidthPercent,
    /// Displayed numeric value of a counter.
    Count,
}

impl Prop {
    /// Value an element shows when nothing has written the property.
    pub fn resting(self) -> f64 {
        match self {
            Self::Opacity | Self::Scale | Self::ScaleX => 1.0,
            _ => 0.0,
        }
    }
}

/// Resolved style of one element: only explicitly written properties are stored.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Style(BTreeMap<Prop, f64>);

impl Style {
    pub fn get(&self, prop: Prop) -> f64 {
        self.0.get(&prop).copied().unwrap_or_else(|| prop.resting())
    }

    pub fn is_set(&self, prop: Prop) -> bool {
        self.0.contains_key(&prop)
    }

    fn set(&mut self, prop: Prop, value: f64) {
        self.0.insert(prop, value);
    }
}

/// Shared visual surface: the per-element style map every tween and binding writes into.
///
/// Cloning yields another handle to the same surface. Each element is written only by the
/// binding that owns it, so there is no arbitration between writers.
#[derive(Clone, Debug, Default)]
pub struct Surface(Rc<RefCell<BTreeMap<ElementId, Style>>>);

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, el: ElementId, prop: Prop) -> f64 {
        self.0
            .borrow()
            .get(&el)
            .map(|s| s.get(prop))
            .unwrap_or_else(|| prop.resting())
    }

    pub fn set(&self, el: ElementId, prop: Prop, value: f64) {
        self.0.borrow_mut().entry(el).or_default().set(prop, value);
    }

    pub fn style(&self, el: ElementId) -> Style {
        self.0.borrow().get(&el).cloned().unwrap_or_default()
    }

    /// Drop the styles of unmounted elements.
    pub fn forget(&self, els: &[ElementId]) {
        let mut map = self.0.borrow_mut();
        for el in els {
            map.remove(el);
        }
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<ElementId, Style> {
        self.0.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_properties_read_resting_values() {
        let s = Surface::new();
        let el = ElementId(3);
        assert_eq!(s.get(el, Prop::Opacity), 1.0);
        assert_eq!(s.get(el, Prop::TranslateY), 0.0);
        s.set(el, Prop::Opacity, 0.25);
        assert_eq!(s.get(el, Prop::Opacity), 0.25);
        assert!(s.style(el).is_set(Prop::Opacity));
        assert!(!s.style(el).is_set(Prop::Scale));
    }

    #[test]
    fn clones_share_state_and_forget_clears() {
        let a = Surface::new();
        let b = a.clone();
        a.set(ElementId(1), Prop::Scale, 1.5);
        assert_eq!(b.get(ElementId(1), Prop::Scale), 1.5);
        b.forget(&[ElementId(1)]);
        assert!(a.is_empty());
    }
}
