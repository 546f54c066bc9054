use crate::animation::ease::Ease;
use crate::animation::tween::Lerp;
use crate::cursor::affordance::{Affordance, is_magnetic, resolve_closest};
use crate::foundation::core::Point;
use crate::page::document::{Document, ElementId};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CursorOpts {
    /// Follow time of the outer ring.
    pub ring_follow_secs: f64,
    /// Follow time of the inner dot.
    pub dot_follow_secs: f64,
    pub follow_ease: Ease,
    /// Ring scale while a magnetic element is hovered.
    pub magnetic_scale: f64,
    pub magnetic_secs: f64,
}

impl Default for CursorOpts {
    fn default() -> Self {
        Self {
            ring_follow_secs: 0.5,
            dot_follow_secs: 0.1,
            follow_ease: Ease::OutCubic,
            magnetic_scale: 1.5,
            magnetic_secs: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    #[default]
    Mouse,
    Pen,
    Touch,
}

/// A value eased toward a target that can be moved at any time.
///
/// Retargeting restarts the ease from wherever the value currently is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Follower<T> {
    from: T,
    to: T,
    current: T,
    elapsed: f64,
    duration: f64,
    ease: Ease,
}

impl<T: Lerp + Copy> Follower<T> {
    pub fn new(at: T, duration: f64, ease: Ease) -> Self {
        Self {
            from: at,
            to: at,
            current: at,
            elapsed: duration,
            duration,
            ease,
        }
    }

    pub fn retarget(&mut self, to: T) {
        self.from = self.current;
        self.to = to;
        self.elapsed = 0.0;
        if self.duration <= 0.0 {
            self.current = to;
            self.elapsed = self.duration;
        }
    }

    pub fn tick(&mut self, dt: f64) {
        if self.is_settled() {
            return;
        }
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = self.ease.apply(self.elapsed / self.duration);
        self.current = T::lerp(&self.from, &self.to, t);
    }

    pub fn current(&self) -> T {
        self.current
    }

    pub fn target(&self) -> T {
        self.to
    }

    pub fn is_settled(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// What the pointer-driven state looks like right now.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct CursorState {
    pub position: Point,
    pub affordance: Affordance,
    pub magnetized: bool,
}

/// Everything the two on-screen indicators need for one frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct CursorFrame {
    pub ring: Point,
    pub dot: Point,
    pub ring_scale: f64,
    pub dot_opacity: f64,
    pub hovering: bool,
    pub label: Option<&'static str>,
    pub affordance: Affordance,
}

/// Custom cursor: raw pointer state plus the smoothed ring and dot.
///
/// Only fine pointers (mouse, pen) drive it. Touch input and devices without a fine pointer
/// leave it at [`Affordance::Default`], so taps are never intercepted.
#[derive(Clone, Debug)]
pub struct CursorMachine {
    opts: CursorOpts,
    fine_pointer: bool,
    state: CursorState,
    hovered: Option<ElementId>,
    ring: Follower<Point>,
    dot: Follower<Point>,
    scale: Follower<f64>,
}

impl CursorMachine {
    pub fn new(opts: CursorOpts) -> Self {
        let origin = Point::ORIGIN;
        Self {
            ring: Follower::new(origin, opts.ring_follow_secs, opts.follow_ease),
            dot: Follower::new(origin, opts.dot_follow_secs, opts.follow_ease),
            scale: Follower::new(1.0, opts.magnetic_secs, opts.follow_ease),
            opts,
            fine_pointer: true,
            state: CursorState::default(),
            hovered: None,
        }
    }

    /// Record whether the device has a fine pointer. Losing it resets to `Default`.
    pub fn set_fine_pointer(&mut self, fine: bool) {
        self.fine_pointer = fine;
        if !fine {
            self.pointer_leave();
        }
    }

    pub fn has_fine_pointer(&self) -> bool {
        self.fine_pointer
    }

    fn tracks(&self, kind: PointerKind) -> bool {
        self.fine_pointer && kind != PointerKind::Touch
    }

    /// Move the raw position and retarget both followers. Never changes the affordance.
    pub fn pointer_move(&mut self, kind: PointerKind, p: Point) {
        if !self.tracks(kind) || !(p.x.is_finite() && p.y.is_finite()) {
            return;
        }
        self.state.position = p;
        self.ring.retarget(p);
        self.dot.retarget(p);
    }

    /// Pointer entered an element with the given affordance. A `Default` target leaves the
    /// current affordance alone.
    pub fn pointer_enter(&mut self, kind: PointerKind, affordance: Affordance, magnetic: bool) {
        if !self.tracks(kind) {
            return;
        }
        if affordance != Affordance::Default {
            self.state.affordance = affordance;
        }
        self.set_magnetized(magnetic);
    }

    /// Pointer left the current target.
    pub fn pointer_leave(&mut self) {
        self.hovered = None;
        self.state.affordance = Affordance::Default;
        self.set_magnetized(false);
    }

    /// Feed the result of a hit test; emits leave/enter when the hovered element changes.
    pub fn hover(&mut self, doc: &Document, kind: PointerKind, hit: Option<ElementId>) {
        if !self.tracks(kind) || hit == self.hovered {
            return;
        }
        if self.hovered.is_some() {
            self.pointer_leave();
        }
        if let Some(id) = hit {
            self.pointer_enter(kind, resolve_closest(doc, id), is_magnetic(doc, id));
            self.hovered = Some(id);
        }
    }

    pub fn hovered(&self) -> Option<ElementId> {
        self.hovered
    }

    fn set_magnetized(&mut self, on: bool) {
        if on == self.state.magnetized {
            return;
        }
        self.state.magnetized = on;
        self.scale
            .retarget(if on { self.opts.magnetic_scale } else { 1.0 });
    }

    pub fn tick(&mut self, dt: f64) {
        if !(dt.is_finite() && dt >= 0.0) {
            return;
        }
        self.ring.tick(dt);
        self.dot.tick(dt);
        self.scale.tick(dt);
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn affordance(&self) -> Affordance {
        self.state.affordance
    }

    pub fn frame(&self) -> CursorFrame {
        let hovering = self.state.affordance != Affordance::Default;
        CursorFrame {
            ring: self.ring.current(),
            dot: self.dot.current(),
            ring_scale: self.scale.current(),
            dot_opacity: if hovering { 0.0 } else { 1.0 },
            hovering,
            label: (self.state.affordance == Affordance::View).then_some("VIEW"),
            affordance: self.state.affordance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::affordance::{CURSOR_ATTR, MAGNETIC_CLASS};
    use crate::foundation::core::Rect;
    use crate::page::document::Element;

    fn page() -> (Document, ElementId, ElementId, ElementId) {
        let mut doc = Document::new();
        let root = doc
            .append(None, Element::new("main", Rect::new(0.0, 0.0, 1000.0, 1000.0)))
            .unwrap();
        let cta = doc
            .append(
                Some(root),
                Element::new("button", Rect::new(0.0, 0.0, 100.0, 50.0)).class(MAGNETIC_CLASS),
            )
            .unwrap();
        let image = doc
            .append(
                Some(root),
                Element::new("a", Rect::new(0.0, 100.0, 100.0, 200.0)).attr(CURSOR_ATTR, "view"),
            )
            .unwrap();
        (doc, root, cta, image)
    }

    #[test]
    fn dot_catches_up_before_ring() {
        let mut m = CursorMachine::new(CursorOpts::default());
        m.pointer_move(PointerKind::Mouse, Point::new(100.0, 100.0));
        m.tick(0.1);
        assert_eq!(m.frame().dot, Point::new(100.0, 100.0));
        assert!(m.frame().ring.x < 100.0);
        m.tick(0.4);
        assert_eq!(m.frame().ring, Point::new(100.0, 100.0));
        assert_eq!(m.affordance(), Affordance::Default);
    }

    #[test]
    fn retarget_starts_from_current_position() {
        let mut f = Follower::new(0.0, 1.0, Ease::Linear);
        f.retarget(100.0);
        f.tick(0.5);
        f.retarget(0.0);
        assert_eq!(f.current(), 50.0);
        f.tick(0.5);
        assert_eq!(f.current(), 25.0);
        f.tick(10.0);
        assert!(f.is_settled());
        assert_eq!(f.current(), 0.0);
    }

    #[test]
    fn hover_resolves_view_and_shows_label() {
        let (doc, root, _, image) = page();
        let mut m = CursorMachine::new(CursorOpts::default());
        m.hover(&doc, PointerKind::Mouse, Some(image));
        let frame = m.frame();
        assert_eq!(frame.affordance, Affordance::View);
        assert_eq!(frame.label, Some("VIEW"));
        assert_eq!(frame.dot_opacity, 0.0);

        m.hover(&doc, PointerKind::Mouse, Some(root));
        assert_eq!(m.affordance(), Affordance::Default);
        assert_eq!(m.frame().label, None);
    }

    #[test]
    fn magnetic_pulse_scales_ring_and_settles_back() {
        let (doc, _, cta, _) = page();
        let mut m = CursorMachine::new(CursorOpts::default());
        m.hover(&doc, PointerKind::Mouse, Some(cta));
        assert!(m.state().magnetized);
        assert_eq!(m.affordance(), Affordance::Pointer);
        m.tick(0.3);
        assert_eq!(m.frame().ring_scale, 1.5);

        m.hover(&doc, PointerKind::Mouse, None);
        assert!(!m.state().magnetized);
        m.tick(0.3);
        assert_eq!(m.frame().ring_scale, 1.0);
    }

    #[test]
    fn touch_and_coarse_pointers_stay_default() {
        let (doc, _, cta, image) = page();
        let mut m = CursorMachine::new(CursorOpts::default());
        m.hover(&doc, PointerKind::Touch, Some(cta));
        m.pointer_move(PointerKind::Touch, Point::new(5.0, 5.0));
        assert_eq!(m.state(), CursorState::default());

        m.set_fine_pointer(false);
        m.hover(&doc, PointerKind::Mouse, Some(image));
        assert_eq!(m.affordance(), Affordance::Default);
    }
}
