use crate::foundation::core::ScrollDirection;
use crate::page::document::ElementId;
use crate::scroll::anchor::Anchor;

/// Identifier of a registered trigger, allocated in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(pub u64);

/// The region a trigger observes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerTarget {
    Element(ElementId),
    /// The whole scrollable page (region from 0 to the document height).
    Page,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TriggerSpec {
    pub target: TriggerTarget,
    pub start: Anchor,
    pub end: Anchor,
    /// Progress drives a property continuously instead of firing a one-shot tween.
    pub scrub: bool,
    /// Free-form name used in logs.
    pub label: String,
}

impl TriggerSpec {
    pub fn new(target: TriggerTarget) -> Self {
        Self {
            target,
            start: Anchor::default_start(),
            end: Anchor::default_end(),
            scrub: false,
            label: String::new(),
        }
    }

    pub fn element(id: ElementId) -> Self {
        Self::new(TriggerTarget::Element(id))
    }

    pub fn page() -> Self {
        Self::new(TriggerTarget::Page)
    }

    pub fn start(mut self, start: Anchor) -> Self {
        self.start = start;
        self
    }

    pub fn end(mut self, end: Anchor) -> Self {
        self.end = end;
        self
    }

    pub fn scrub(mut self) -> Self {
        self.scrub = true;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Which side of the `[start, end]` range the scroll position is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    Before,
    Active,
    After,
}

impl Zone {
    pub fn of(scroll_y: f64, start: f64, end: f64) -> Self {
        if scroll_y < start {
            Self::Before
        } else if scroll_y > end.max(start) {
            Self::After
        } else {
            Self::Active
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerEvent {
    Enter,
    Leave,
    EnterBack,
    LeaveBack,
    Update,
}

/// Events caused by moving from zone `from` to zone `to`, in firing order.
pub fn crossing(from: Zone, to: Zone) -> &'static [TriggerEvent] {
    use TriggerEvent::*;
    use Zone::*;
    match (from, to) {
        (Before, Active) => &[Enter],
        (Before, After) => &[Enter, Leave],
        (Active, After) => &[Leave],
        (Active, Before) => &[LeaveBack],
        (After, Active) => &[EnterBack],
        (After, Before) => &[EnterBack, LeaveBack],
        _ => &[],
    }
}

/// Clamped progress through `[start, end]`. Never NaN for finite inputs.
pub fn progress(scroll_y: f64, start: f64, end: f64) -> f64 {
    let span = end - start;
    if span <= 0.0 {
        return if scroll_y < start { 0.0 } else { 1.0 };
    }
    let p = (scroll_y - start) / span;
    if p.is_nan() {
        // infinite span
        return if scroll_y < start { 0.0 } else { 1.0 };
    }
    p.clamp(0.0, 1.0)
}

/// What a callback sees when it fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerSnapshot {
    pub id: TriggerId,
    pub progress: f64,
    pub direction: ScrollDirection,
    pub active: bool,
}

pub type TriggerFn = Box<dyn FnMut(&TriggerSnapshot)>;

/// Optional per-event callbacks. Missing callbacks are simply skipped.
#[derive(Default)]
pub struct TriggerCallbacks {
    pub on_enter: Option<TriggerFn>,
    pub on_leave: Option<TriggerFn>,
    pub on_enter_back: Option<TriggerFn>,
    pub on_leave_back: Option<TriggerFn>,
    pub on_update: Option<TriggerFn>,
}

impl TriggerCallbacks {
    pub fn on_enter(mut self, f: impl FnMut(&TriggerSnapshot) + 'static) -> Self {
        self.on_enter = Some(Box::new(f));
        self
    }

    pub fn on_leave(mut self, f: impl FnMut(&TriggerSnapshot) + 'static) -> Self {
        self.on_leave = Some(Box::new(f));
        self
    }

    pub fn on_enter_back(mut self, f: impl FnMut(&TriggerSnapshot) + 'static) -> Self {
        self.on_enter_back = Some(Box::new(f));
        self
    }

    pub fn on_leave_back(mut self, f: impl FnMut(&TriggerSnapshot) + 'static) -> Self {
        self.on_leave_back = Some(Box::new(f));
        self
    }

    pub fn on_update(mut self, f: impl FnMut(&TriggerSnapshot) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub(crate) fn slot(&mut self, event: TriggerEvent) -> Option<&mut TriggerFn> {
        match event {
            TriggerEvent::Enter => self.on_enter.as_mut(),
            TriggerEvent::Leave => self.on_leave.as_mut(),
            TriggerEvent::EnterBack => self.on_enter_back.as_mut(),
            TriggerEvent::LeaveBack => self.on_leave_back.as_mut(),
            TriggerEvent::Update => self.on_update.as_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped_and_finite() {
        assert_eq!(progress(-1e12, 0.0, 100.0), 0.0);
        assert_eq!(progress(1e12, 0.0, 100.0), 1.0);
        assert_eq!(progress(25.0, 0.0, 100.0), 0.25);
        assert_eq!(progress(f64::MAX, -f64::MAX, f64::MAX), 1.0);
    }

    #[test]
    fn degenerate_range_sticks_to_boundaries() {
        assert_eq!(progress(49.0, 50.0, 50.0), 0.0);
        assert_eq!(progress(50.0, 50.0, 50.0), 1.0);
        assert_eq!(progress(70.0, 50.0, 10.0), 1.0);
    }

    #[test]
    fn jumps_emit_both_events_in_order() {
        assert_eq!(
            crossing(Zone::Before, Zone::After),
            &[TriggerEvent::Enter, TriggerEvent::Leave]
        );
        assert_eq!(
            crossing(Zone::After, Zone::Before),
            &[TriggerEvent::EnterBack, TriggerEvent::LeaveBack]
        );
        assert!(crossing(Zone::Active, Zone::Active).is_empty());
    }

    #[test]
    fn zones_include_both_edges() {
        assert_eq!(Zone::of(10.0, 10.0, 20.0), Zone::Active);
        assert_eq!(Zone::of(20.0, 10.0, 20.0), Zone::Active);
        assert_eq!(Zone::of(20.1, 10.0, 20.0), Zone::After);
        assert_eq!(Zone::of(9.9, 10.0, 20.0), Zone::Before);
    }
}
