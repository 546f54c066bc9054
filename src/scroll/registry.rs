use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::foundation::core::{Rect, ScrollDirection, Viewport};
use crate::foundation::error::{ShowreelError, ShowreelResult};
use crate::page::document::Document;
use crate::scroll::trigger::{
    TriggerCallbacks, TriggerEvent, TriggerId, TriggerSnapshot, TriggerSpec, TriggerTarget, Zone,
    crossing, progress,
};

struct Entry {
    spec: TriggerSpec,
    start: f64,
    end: f64,
    zone: Zone,
    progress: f64,
    callbacks: Rc<RefCell<TriggerCallbacks>>,
}

struct RegistryState {
    viewport: Viewport,
    scroll_y: f64,
    direction: ScrollDirection,
    next_id: u64,
    triggers: BTreeMap<TriggerId, Entry>,
    dispatching: bool,
}

type Fired = (TriggerId, TriggerEvent, TriggerSnapshot, Rc<RefCell<TriggerCallbacks>>);

/// The page-session set of live scroll observers.
///
/// Cloning yields another handle to the same registry; sections receive one at mount time.
/// Every registration returns a [`TriggerHandle`] that unregisters on drop.
#[derive(Clone)]
pub struct TriggerRegistry(Rc<RefCell<RegistryState>>);

/// Non-owning reference to a registry, for callbacks that need to unregister themselves.
#[derive(Clone, Default)]
pub struct WeakRegistry(Weak<RefCell<RegistryState>>);

impl WeakRegistry {
    pub fn upgrade(&self) -> Option<TriggerRegistry> {
        self.0.upgrade().map(TriggerRegistry)
    }
}

impl TriggerRegistry {
    pub fn new(viewport: Viewport) -> Self {
        Self(Rc::new(RefCell::new(RegistryState {
            viewport,
            scroll_y: 0.0,
            direction: ScrollDirection::Down,
            next_id: 0,
            triggers: BTreeMap::new(),
            dispatching: false,
        })))
    }

    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry(Rc::downgrade(&self.0))
    }

    /// Start observing `spec.target`.
    ///
    /// The target must be mounted in `doc`. The new trigger starts in the `Before` zone and
    /// fires on the next [`update`](Self::update) or [`sync`](Self::sync).
    pub fn register(
        &self,
        doc: &Document,
        spec: TriggerSpec,
        callbacks: TriggerCallbacks,
    ) -> ShowreelResult<TriggerHandle> {
        let Some(region) = region_of(doc, spec.target) else {
            tracing::warn!(label = %spec.label, trigger = ?spec.target, "trigger target not mounted");
            return Err(ShowreelError::target_not_found(format!(
                "{:?} ({})",
                spec.target, spec.label
            )));
        };

        let mut st = self.0.borrow_mut();
        let id = TriggerId(st.next_id);
        st.next_id += 1;
        let start = spec.start.threshold(region, st.viewport);
        let end = spec.end.threshold(region, st.viewport);
        tracing::debug!(id = id.0, label = %spec.label, start, end, "trigger registered");
        st.triggers.insert(
            id,
            Entry {
                spec,
                start,
                end,
                zone: Zone::Before,
                progress: 0.0,
                callbacks: Rc::new(RefCell::new(callbacks)),
            },
        );
        Ok(TriggerHandle {
            id,
            registry: self.downgrade(),
        })
    }

    /// Remove one trigger. Removing an unknown or already-removed id is a no-op.
    pub fn unregister(&self, id: TriggerId) -> bool {
        let removed = self.0.borrow_mut().triggers.remove(&id);
        // Dropped after the borrow ends: callbacks may own handles of their own.
        match removed {
            Some(entry) => {
                tracing::debug!(id = id.0, label = %entry.spec.label, "trigger unregistered");
                true
            }
            None => false,
        }
    }

    /// Remove every trigger (route change).
    pub fn unregister_all(&self) -> usize {
        let removed = std::mem::take(&mut self.0.borrow_mut().triggers);
        tracing::debug!(count = removed.len(), "all triggers unregistered");
        removed.len()
    }

    /// Scroll event: re-evaluate every trigger at `scroll_y`.
    pub fn update(&self, scroll_y: f64) {
        if !scroll_y.is_finite() {
            tracing::warn!(scroll_y, "ignoring non-finite scroll position");
            return;
        }
        let moving_up;
        {
            let mut st = self.0.borrow_mut();
            if st.dispatching {
                tracing::warn!("ignoring scroll update from inside a trigger callback");
                return;
            }
            moving_up = scroll_y < st.scroll_y;
            if scroll_y != st.scroll_y {
                st.direction = if scroll_y > st.scroll_y {
                    ScrollDirection::Down
                } else {
                    ScrollDirection::Up
                };
            }
            st.scroll_y = scroll_y;
        }
        self.evaluate(moving_up);
    }

    /// Re-evaluate at the current scroll position (after mounting new triggers).
    pub fn sync(&self) {
        self.evaluate(false);
    }

    /// Resize/refresh boundary: recompute every threshold against the current layout.
    #[tracing::instrument(skip(self, doc))]
    pub fn refresh(&self, doc: &Document, viewport: Viewport) {
        {
            let mut st = self.0.borrow_mut();
            st.viewport = viewport;
            for (id, entry) in st.triggers.iter_mut() {
                let Some(region) = region_of(doc, entry.spec.target) else {
                    tracing::warn!(id = id.0, label = %entry.spec.label, "dangling trigger kept stale thresholds");
                    continue;
                };
                entry.start = entry.spec.start.threshold(region, viewport);
                entry.end = entry.spec.end.threshold(region, viewport);
            }
        }
        self.evaluate(false);
    }

    pub fn progress(&self, id: TriggerId) -> Option<f64> {
        self.0.borrow().triggers.get(&id).map(|e| e.progress)
    }

    /// Cached `(start, end)` scroll thresholds.
    pub fn thresholds(&self, id: TriggerId) -> Option<(f64, f64)> {
        self.0.borrow().triggers.get(&id).map(|e| (e.start, e.end))
    }

    pub fn is_registered(&self, id: TriggerId) -> bool {
        self.0.borrow().triggers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().triggers.is_empty()
    }

    pub fn scroll_y(&self) -> f64 {
        self.0.borrow().scroll_y
    }

    pub fn viewport(&self) -> Viewport {
        self.0.borrow().viewport
    }

    /// Triggers whose target element is no longer mounted. Empty in a correct program.
    pub fn dangling(&self, doc: &Document) -> Vec<TriggerId> {
        self.0
            .borrow()
            .triggers
            .iter()
            .filter(|(_, e)| matches!(e.spec.target, TriggerTarget::Element(el) if !doc.contains(el)))
            .map(|(id, _)| *id)
            .collect()
    }

    fn evaluate(&self, upward: bool) {
        let fired = {
            let mut st = self.0.borrow_mut();
            if st.dispatching {
                tracing::warn!("ignoring trigger evaluation from inside a trigger callback");
                return;
            }
            st.dispatching = true;
            collect(&mut st, upward)
        };

        for (id, event, snapshot, callbacks) in fired {
            if !self.is_registered(id) {
                continue;
            }
            let Ok(mut callbacks) = callbacks.try_borrow_mut() else {
                continue;
            };
            if let Some(f) = callbacks.slot(event) {
                f(&snapshot);
            }
        }

        self.0.borrow_mut().dispatching = false;
    }
}

fn collect(st: &mut RegistryState, upward: bool) -> Vec<Fired> {
    let y = st.scroll_y;
    let direction = st.direction;
    let mut fired = Vec::new();
    // Crossing order: scrolling up meets later (lower) triggers first.
    let mut entries: Vec<_> = st.triggers.iter_mut().collect();
    if upward {
        entries.reverse();
    }
    for (id, entry) in entries {
        let zone = Zone::of(y, entry.start, entry.end);
        let p = progress(y, entry.start, entry.end);
        let snapshot = TriggerSnapshot {
            id: *id,
            progress: p,
            direction,
            active: zone == Zone::Active,
        };
        for event in crossing(entry.zone, zone) {
            fired.push((*id, *event, snapshot, entry.callbacks.clone()));
        }
        if p != entry.progress {
            fired.push((*id, TriggerEvent::Update, snapshot, entry.callbacks.clone()));
        }
        entry.zone = zone;
        entry.progress = p;
    }
    fired
}

fn region_of(doc: &Document, target: TriggerTarget) -> Option<Rect> {
    match target {
        TriggerTarget::Element(el) => doc.get(el).map(|e| e.rect),
        TriggerTarget::Page => Some(Rect::new(0.0, 0.0, 0.0, doc.height())),
    }
}

/// Scoped registration: dropping the handle unregisters the trigger.
pub struct TriggerHandle {
    id: TriggerId,
    registry: WeakRegistry,
}

impl TriggerHandle {
    pub fn id(&self) -> TriggerId {
        self.id
    }

    /// Unregister now.
    pub fn kill(self) {}
}

impl std::fmt::Debug for TriggerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TriggerHandle").field(&self.id).finish()
    }
}

impl Drop for TriggerHandle {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        // Already borrowed means the registry itself is tearing this entry down.
        let removed = match registry.0.try_borrow_mut() {
            Ok(mut st) => st.triggers.remove(&self.id),
            Err(_) => return,
        };
        if let Some(entry) = removed {
            tracing::debug!(id = self.id.0, label = %entry.spec.label, "trigger handle dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::document::{Element, ElementId};
    use std::cell::Cell;

    fn setup() -> (Document, ElementId, TriggerRegistry) {
        let mut doc = Document::new();
        let section = doc
            .append(None, Element::new("section", Rect::new(0.0, 1000.0, 1000.0, 1500.0)))
            .unwrap();
        let vp = Viewport::new(1000.0, 800.0).unwrap();
        (doc, section, TriggerRegistry::new(vp))
    }

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn logging(log: &Log) -> TriggerCallbacks {
        let (a, b, c, d) = (log.clone(), log.clone(), log.clone(), log.clone());
        TriggerCallbacks::default()
            .on_enter(move |_| a.borrow_mut().push("enter"))
            .on_leave(move |_| b.borrow_mut().push("leave"))
            .on_enter_back(move |_| c.borrow_mut().push("enter_back"))
            .on_leave_back(move |_| d.borrow_mut().push("leave_back"))
    }

    #[test]
    fn missing_target_is_target_not_found() {
        let (doc, _, reg) = setup();
        let err = reg
            .register(&doc, TriggerSpec::element(ElementId(99)), TriggerCallbacks::default())
            .unwrap_err();
        assert!(err.to_string().starts_with("target not found:"));
        assert!(reg.is_empty());
    }

    #[test]
    fn default_anchors_cover_full_traversal() {
        let (doc, section, reg) = setup();
        let h = reg
            .register(&doc, TriggerSpec::element(section), TriggerCallbacks::default())
            .unwrap();
        // top bottom = 1000 - 800, bottom top = 1500
        assert_eq!(reg.thresholds(h.id()), Some((200.0, 1500.0)));
        reg.update(850.0);
        assert_eq!(reg.progress(h.id()), Some(0.5));
    }

    #[test]
    fn enter_leave_sequence_in_both_directions() {
        let (doc, section, reg) = setup();
        let log: Log = Rc::default();
        let _h = reg
            .register(&doc, TriggerSpec::element(section), logging(&log))
            .unwrap();
        for y in [0.0, 300.0, 400.0, 1600.0, 1000.0, 100.0] {
            reg.update(y);
        }
        assert_eq!(*log.borrow(), vec!["enter", "leave", "enter_back", "leave_back"]);
    }

    #[test]
    fn jump_over_range_fires_both_events() {
        let (doc, section, reg) = setup();
        let log: Log = Rc::default();
        let _h = reg
            .register(&doc, TriggerSpec::element(section), logging(&log))
            .unwrap();
        reg.update(5000.0);
        reg.update(-50.0);
        assert_eq!(*log.borrow(), vec!["enter", "leave", "enter_back", "leave_back"]);
    }

    #[test]
    fn progress_stays_in_unit_range_under_extreme_deltas() {
        let (doc, section, reg) = setup();
        let seen: Rc<RefCell<Vec<f64>>> = Rc::default();
        let s = seen.clone();
        let h = reg
            .register(
                &doc,
                TriggerSpec::element(section).scrub(),
                TriggerCallbacks::default().on_update(move |snap| s.borrow_mut().push(snap.progress)),
            )
            .unwrap();
        for y in [1e15, -1e15, f64::MAX, -f64::MAX, f64::NAN, f64::INFINITY, 777.0] {
            reg.update(y);
            let p = reg.progress(h.id()).unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
        assert!(seen.borrow().iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(reg.scroll_y(), 777.0);
    }

    #[test]
    fn unregister_all_silences_every_trigger() {
        let (doc, section, reg) = setup();
        let calls = Rc::new(Cell::new(0u32));
        let mut handles = Vec::new();
        for _ in 0..3 {
            let c = calls.clone();
            let cbs = TriggerCallbacks::default()
                .on_enter(move |_| c.set(c.get() + 1))
                .on_update({
                    let c = calls.clone();
                    move |_| c.set(c.get() + 1)
                });
            handles.push(reg.register(&doc, TriggerSpec::element(section), cbs).unwrap());
        }
        assert_eq!(reg.unregister_all(), 3);
        for y in [0.0, 500.0, 1200.0, 3000.0, 0.0] {
            reg.update(y);
        }
        reg.sync();
        assert_eq!(calls.get(), 0);
        drop(handles);
        assert!(reg.is_empty());
    }

    #[test]
    fn unregister_is_idempotent_and_handles_clean_up() {
        let (doc, section, reg) = setup();
        let h = reg
            .register(&doc, TriggerSpec::element(section), TriggerCallbacks::default())
            .unwrap();
        let id = h.id();
        assert!(reg.unregister(id));
        assert!(!reg.unregister(id));
        drop(h);

        let h2 = reg
            .register(&doc, TriggerSpec::element(section), TriggerCallbacks::default())
            .unwrap();
        assert_eq!(reg.len(), 1);
        h2.kill();
        assert!(reg.is_empty());
    }

    #[test]
    fn callback_may_unregister_a_later_trigger() {
        let (doc, section, reg) = setup();
        let log: Log = Rc::default();
        let victim: Rc<Cell<Option<TriggerId>>> = Rc::default();
        let (r2, v2) = (reg.clone(), victim.clone());
        let _first = reg
            .register(
                &doc,
                TriggerSpec::element(section),
                TriggerCallbacks::default().on_enter(move |_| {
                    if let Some(id) = v2.take() {
                        r2.unregister(id);
                    }
                }),
            )
            .unwrap();
        let second = reg
            .register(&doc, TriggerSpec::element(section), logging(&log))
            .unwrap();
        victim.set(Some(second.id()));
        reg.update(400.0);
        assert!(log.borrow().is_empty());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn refresh_recomputes_thresholds_for_new_viewport() {
        let (doc, section, reg) = setup();
        let log: Log = Rc::default();
        let h = reg
            .register(
                &doc,
                TriggerSpec::element(section).start("top 80%".parse().unwrap()),
                logging(&log),
            )
            .unwrap();
        reg.update(300.0);
        // 1000 - 640 = 360: not yet
        assert!(log.borrow().is_empty());
        reg.refresh(&doc, Viewport::new(1000.0, 1000.0).unwrap());
        // 1000 - 800 = 200: now inside
        assert_eq!(reg.thresholds(h.id()).unwrap().0, 200.0);
        assert_eq!(*log.borrow(), vec!["enter"]);
    }

    #[test]
    fn removed_targets_show_up_as_dangling() {
        let (mut doc, section, reg) = setup();
        let _h = reg
            .register(&doc, TriggerSpec::element(section), TriggerCallbacks::default())
            .unwrap();
        assert!(reg.dangling(&doc).is_empty());
        doc.remove(section);
        assert_eq!(reg.dangling(&doc).len(), 1);
    }

    #[test]
    fn reentrant_update_is_ignored() {
        let (doc, section, reg) = setup();
        let r2 = reg.clone();
        let _h = reg
            .register(
                &doc,
                TriggerSpec::element(section),
                TriggerCallbacks::default().on_enter(move |_| r2.update(0.0)),
            )
            .unwrap();
        reg.update(400.0);
        assert_eq!(reg.scroll_y(), 400.0);
    }
}
