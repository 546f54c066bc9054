use std::cell::Cell;
use std::rc::Rc;

use crate::foundation::core::{Viewport, max_scroll};
use crate::page::document::Document;
use crate::scroll::anchor::{Anchor, Edge};
use crate::scroll::registry::{TriggerHandle, TriggerRegistry};
use crate::scroll::trigger::{TriggerCallbacks, TriggerSpec};
use crate::sections::tracker::{ActiveSection, SectionId, SectionTracker};

/// Offset past which the navigation bar switches to its scrolled style.
pub const SCROLLED_AFTER: f64 = 100.0;

/// Navigation bar state: active-section highlight, scrolled flag and page progress.
pub struct Navigation {
    tracker: SectionTracker,
    scrolled: Rc<Cell<bool>>,
    _scrolled_trigger: Option<TriggerHandle>,
}

impl Navigation {
    pub fn attach(registry: &TriggerRegistry, doc: &Document) -> Self {
        Self::attach_to(registry, doc, ActiveSection::default())
    }

    pub fn attach_to(registry: &TriggerRegistry, doc: &Document, active: ActiveSection) -> Self {
        let tracker = SectionTracker::attach_to(registry, doc, active);
        let scrolled = Rc::new(Cell::new(false));
        let s = scrolled.clone();
        let spec = TriggerSpec::page()
            .start(Anchor::Absolute(SCROLLED_AFTER))
            .end(Anchor::pair(Edge::Bottom, Edge::Bottom))
            .label("nav:scrolled");
        let handle = registry
            .register(
                doc,
                spec,
                TriggerCallbacks::default().on_update(move |snap| s.set(snap.progress > 0.0)),
            )
            .inspect_err(|err| tracing::warn!(%err, "scrolled indicator disabled"))
            .ok();
        Self {
            tracker,
            scrolled,
            _scrolled_trigger: handle,
        }
    }

    pub fn active_section(&self) -> SectionId {
        self.tracker.current()
    }

    pub fn active(&self) -> ActiveSection {
        self.tracker.active()
    }

    pub fn tracked(&self) -> &[SectionId] {
        self.tracker.tracked()
    }

    /// Drop one section's tracking trigger; the others keep their zones.
    pub fn untrack(&mut self, id: SectionId) -> bool {
        self.tracker.untrack(id)
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled.get()
    }
}

/// Fraction of the scrollable range already scrolled, for the progress indicator.
///
/// A page that fits in the viewport reports 0.
pub fn page_progress(scroll_y: f64, doc_height: f64, viewport: Viewport) -> f64 {
    let range = max_scroll(doc_height, viewport);
    if range <= 0.0 || !scroll_y.is_finite() {
        return 0.0;
    }
    (scroll_y / range).clamp(0.0, 1.0)
}
