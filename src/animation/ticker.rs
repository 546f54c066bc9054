use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::animation::tween::{Lerp, Track, Tween, TweenPhase};
use crate::foundation::error::ShowreelResult;
use crate::page::document::ElementId;
use crate::page::surface::{Prop, Surface};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(pub u64);

/// Groups the tweens of one component so they can be cancelled together on teardown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Owner(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TweenTarget {
    Element(ElementId),
    /// No element: only progress and callbacks (counters, the intro progress value).
    Detached,
}

impl From<ElementId> for TweenTarget {
    fn from(el: ElementId) -> Self {
        Self::Element(el)
    }
}

/// Per-frame progress report handed to `on_update`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TweenUpdate {
    pub linear: f64,
    pub eased: f64,
    /// Value of the first track, if the tween has any.
    pub value: Option<f64>,
}

pub type UpdateFn = Box<dyn FnMut(TweenUpdate)>;
pub type CompleteFn = Box<dyn FnOnce()>;

#[derive(Default)]
pub struct TweenCallbacks {
    pub on_update: Option<UpdateFn>,
    pub on_complete: Option<CompleteFn>,
}

impl TweenCallbacks {
    pub fn on_update(mut self, f: impl FnMut(TweenUpdate) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

struct ActiveTween {
    owner: Owner,
    target: TweenTarget,
    tween: Tween,
    elapsed: f64,
    resolved_from: Option<Vec<f64>>,
    on_update: Option<UpdateFn>,
    on_complete: Option<CompleteFn>,
}

enum Fired {
    Update(TweenId, Owner, UpdateFn, TweenUpdate),
    Complete(TweenId, Owner, CompleteFn),
}

/// Cancellations made since the current dispatch pass started.
#[derive(Default)]
struct Killed {
    ids: Vec<TweenId>,
    owners: Vec<Owner>,
    all: bool,
}

impl Killed {
    fn contains(&self, id: TweenId, owner: Owner) -> bool {
        self.all || self.ids.contains(&id) || self.owners.contains(&owner)
    }
}

struct TickerState {
    surface: Surface,
    now: f64,
    next_id: u64,
    next_owner: u64,
    tweens: BTreeMap<TweenId, ActiveTween>,
    killed: Killed,
    ticking: bool,
}

/// The single per-frame scheduler driving every in-flight tween and delayed call.
///
/// Cloning yields another handle to the same scheduler. Callbacks run after the scheduler has
/// released its internal state, so they may start or kill tweens; a tween killed during the
/// dispatch pass receives no further callbacks.
#[derive(Clone)]
pub struct Ticker(Rc<RefCell<TickerState>>);

impl Ticker {
    pub fn new(surface: Surface) -> Self {
        Self(Rc::new(RefCell::new(TickerState {
            surface,
            now: 0.0,
            next_id: 0,
            next_owner: 0,
            tweens: BTreeMap::new(),
            killed: Killed::default(),
            ticking: false,
        })))
    }

    pub fn surface(&self) -> Surface {
        self.0.borrow().surface.clone()
    }

    /// Seconds advanced since the ticker was created.
    pub fn now(&self) -> f64 {
        self.0.borrow().now
    }

    /// Allocate a fresh owner group.
    pub fn owner(&self) -> Owner {
        let mut st = self.0.borrow_mut();
        let owner = Owner(st.next_owner);
        st.next_owner += 1;
        owner
    }

    pub fn start(&self, owner: Owner, target: TweenTarget, tween: Tween) -> ShowreelResult<TweenId> {
        self.start_with(owner, target, tween, TweenCallbacks::default())
    }

    pub fn start_with(
        &self,
        owner: Owner,
        target: TweenTarget,
        tween: Tween,
        callbacks: TweenCallbacks,
    ) -> ShowreelResult<TweenId> {
        tween.validate()?;
        let mut st = self.0.borrow_mut();
        let id = TweenId(st.next_id);
        st.next_id += 1;
        st.tweens.insert(
            id,
            ActiveTween {
                owner,
                target,
                tween,
                elapsed: 0.0,
                resolved_from: None,
                on_update: callbacks.on_update,
                on_complete: callbacks.on_complete,
            },
        );
        Ok(id)
    }

    /// Run `f` once `delay` seconds of ticks have elapsed.
    pub fn delayed_call(
        &self,
        owner: Owner,
        delay: f64,
        f: impl FnOnce() + 'static,
    ) -> ShowreelResult<TweenId> {
        self.start_with(
            owner,
            TweenTarget::Detached,
            Tween::idle(0.0).delay(delay),
            TweenCallbacks::default().on_complete(f),
        )
    }

    /// Write a property immediately (`gsap.set`).
    pub fn set(&self, el: ElementId, prop: Prop, value: f64) {
        self.surface().set(el, prop, value);
    }

    pub fn kill(&self, id: TweenId) -> bool {
        let mut st = self.0.borrow_mut();
        let removed = st.tweens.remove(&id).is_some();
        st.killed.ids.push(id);
        removed
    }

    /// Cancel every tween and delayed call of `owner`. Returns how many were in flight.
    pub fn kill_owner(&self, owner: Owner) -> usize {
        let mut st = self.0.borrow_mut();
        let ids: Vec<TweenId> = st
            .tweens
            .iter()
            .filter(|(_, t)| t.owner == owner)
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            st.tweens.remove(id);
        }
        st.killed.owners.push(owner);
        ids.len()
    }

    pub fn kill_all(&self) -> usize {
        let mut st = self.0.borrow_mut();
        let n = st.tweens.len();
        st.tweens.clear();
        st.killed.all = true;
        n
    }

    pub fn is_active(&self, id: TweenId) -> bool {
        self.0.borrow().tweens.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().tweens.is_empty()
    }

    pub fn owned_by(&self, owner: Owner) -> usize {
        self.0
            .borrow()
            .tweens
            .values()
            .filter(|t| t.owner == owner)
            .count()
    }

    /// Advance every in-flight tween by `dt` seconds.
    pub fn tick(&self, dt: f64) {
        if !(dt.is_finite() && dt >= 0.0) {
            tracing::warn!(dt, "ignoring invalid tick delta");
            return;
        }

        let fired = {
            let mut st = self.0.borrow_mut();
            if st.ticking {
                tracing::warn!("ignoring re-entrant tick from a tween callback");
                return;
            }
            st.ticking = true;
            st.killed = Killed::default();
            st.now += dt;
            advance(&mut st, dt)
        };

        for f in fired {
            match f {
                Fired::Update(id, owner, mut cb, update) => {
                    if self.was_killed(id, owner) {
                        continue;
                    }
                    cb(update);
                    if let Some(t) = self.0.borrow_mut().tweens.get_mut(&id)
                        && t.on_update.is_none()
                    {
                        t.on_update = Some(cb);
                    }
                }
                Fired::Complete(id, owner, cb) => {
                    if !self.was_killed(id, owner) {
                        cb();
                    }
                }
            }
        }

        self.0.borrow_mut().ticking = false;
    }

    fn was_killed(&self, id: TweenId, owner: Owner) -> bool {
        self.0.borrow().killed.contains(id, owner)
    }
}

fn advance(st: &mut TickerState, dt: f64) -> Vec<Fired> {
    let surface = st.surface.clone();
    let mut fired = Vec::new();
    let mut finished = Vec::new();

    for (id, t) in st.tweens.iter_mut() {
        t.elapsed += dt;
        let sample = t.tween.sample(t.elapsed);
        if sample.phase == TweenPhase::Pending {
            continue;
        }

        let from = t
            .resolved_from
            .get_or_insert_with(|| resolve_from(&surface, t.target, &t.tween.tracks));
        let mut first = None;
        for (track, from) in t.tween.tracks.iter().zip(from.iter()) {
            let v = <f64 as Lerp>::lerp(from, &track.to, sample.eased);
            if first.is_none() {
                first = Some(v);
            }
            if let TweenTarget::Element(el) = t.target {
                surface.set(el, track.prop, v);
            }
        }

        if let Some(cb) = t.on_update.take() {
            fired.push(Fired::Update(
                *id,
                t.owner,
                cb,
                TweenUpdate {
                    linear: sample.linear,
                    eased: sample.eased,
                    value: first,
                },
            ));
        }
        if sample.phase == TweenPhase::Done {
            finished.push(*id);
        }
    }

    for id in finished {
        if let Some(t) = st.tweens.remove(&id)
            && let Some(cb) = t.on_complete
        {
            fired.push(Fired::Complete(id, t.owner, cb));
        }
    }
    fired
}

fn resolve_from(surface: &Surface, target: TweenTarget, tracks: &[Track]) -> Vec<f64> {
    tracks
        .iter()
        .map(|track| match (track.from, target) {
            (Some(v), _) => v,
            (None, TweenTarget::Element(el)) => surface.get(el, track.prop),
            (None, TweenTarget::Detached) => track.prop.resting(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::ease::Ease;
    use std::cell::Cell;

    fn ticker() -> (Ticker, Surface) {
        let surface = Surface::new();
        (Ticker::new(surface.clone()), surface)
    }

    #[test]
    fn tick_writes_surface_and_completes_once() {
        let (ticker, surface) = ticker();
        let owner = ticker.owner();
        let el = ElementId(1);
        let done = Rc::new(Cell::new(0u32));
        let d = done.clone();
        ticker
            .start_with(
                owner,
                TweenTarget::Element(el),
                Tween::from_to(Prop::Opacity, 0.0, 1.0)
                    .duration(1.0)
                    .ease(Ease::Linear),
                TweenCallbacks::default().on_complete(move || d.set(d.get() + 1)),
            )
            .unwrap();

        ticker.tick(0.5);
        assert!((surface.get(el, Prop::Opacity) - 0.5).abs() < 1e-12);
        ticker.tick(0.6);
        assert_eq!(surface.get(el, Prop::Opacity), 1.0);
        ticker.tick(1.0);
        assert_eq!(done.get(), 1);
        assert!(ticker.is_empty());
    }

    #[test]
    fn from_resolves_to_current_value_when_started() {
        let (ticker, surface) = ticker();
        let el = ElementId(2);
        surface.set(el, Prop::TranslateY, 100.0);
        ticker
            .start(
                ticker.owner(),
                TweenTarget::Element(el),
                Tween::to(Prop::TranslateY, 0.0)
                    .duration(1.0)
                    .delay(0.5)
                    .ease(Ease::Linear),
            )
            .unwrap();
        ticker.tick(0.25);
        // Still delayed: untouched.
        assert_eq!(surface.get(el, Prop::TranslateY), 100.0);
        ticker.tick(0.75);
        assert!((surface.get(el, Prop::TranslateY) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn kill_owner_cancels_everything_it_started() {
        let (ticker, surface) = ticker();
        let a = ticker.owner();
        let b = ticker.owner();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        ticker.delayed_call(a, 1.0, move || f.set(true)).unwrap();
        ticker
            .start(a, TweenTarget::Element(ElementId(1)), Tween::to(Prop::Scale, 2.0))
            .unwrap();
        ticker
            .start(b, TweenTarget::Element(ElementId(2)), Tween::to(Prop::Scale, 2.0))
            .unwrap();

        assert_eq!(ticker.kill_owner(a), 2);
        ticker.tick(2.0);
        assert!(!fired.get());
        assert_eq!(surface.get(ElementId(1), Prop::Scale), 1.0);
        assert_eq!(surface.get(ElementId(2), Prop::Scale), 2.0);
    }

    #[test]
    fn callbacks_may_start_and_kill_tweens() {
        let (ticker, surface) = ticker();
        let owner = ticker.owner();
        let killer_slot: Rc<Cell<Option<TweenId>>> = Rc::new(Cell::new(None));

        // Lower id: its update is dispatched first in the frame and kills the victim before the
        // victim's already-collected update runs.
        let t2 = ticker.clone();
        let slot = killer_slot.clone();
        ticker
            .start_with(
                owner,
                TweenTarget::Detached,
                Tween::idle(1.0),
                TweenCallbacks::default().on_update(move |_| {
                    if let Some(victim) = slot.take() {
                        t2.kill(victim);
                        t2.start(
                            owner,
                            TweenTarget::Element(ElementId(7)),
                            Tween::from_to(Prop::Opacity, 0.0, 1.0).duration(0.0),
                        )
                        .unwrap();
                    }
                }),
            )
            .unwrap();
        let victim = ticker
            .start_with(
                owner,
                TweenTarget::Detached,
                Tween::idle(1.0),
                TweenCallbacks::default().on_update(|_| panic!("killed tween must stay quiet")),
            )
            .unwrap();
        killer_slot.set(Some(victim));

        ticker.tick(0.1);
        ticker.tick(0.1);
        assert_eq!(surface.get(ElementId(7), Prop::Opacity), 1.0);
        assert!(!ticker.is_active(victim));
    }

    #[test]
    fn completions_of_a_cancelled_owner_are_suppressed() {
        let (ticker, _) = ticker();
        let a = ticker.owner();
        let b = ticker.owner();
        let fired = Rc::new(Cell::new(false));
        let t2 = ticker.clone();
        ticker.delayed_call(a, 0.5, move || {
            t2.kill_owner(b);
        })
        .unwrap();
        let f = fired.clone();
        ticker.delayed_call(b, 0.5, move || f.set(true)).unwrap();
        ticker.tick(1.0);
        assert!(!fired.get());
    }

    #[test]
    fn detached_updates_report_values() {
        let (ticker, _) = ticker();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        ticker
            .start_with(
                ticker.owner(),
                TweenTarget::Detached,
                Tween::from_to(Prop::Count, 0.0, 150.0)
                    .duration(2.0)
                    .ease(Ease::Linear),
                TweenCallbacks::default().on_update(move |u| s.borrow_mut().push(u.value)),
            )
            .unwrap();
        ticker.tick(1.0);
        ticker.tick(1.0);
        assert_eq!(*seen.borrow(), vec![Some(75.0), Some(150.0)]);
    }

    #[test]
    fn invalid_deltas_are_ignored() {
        let (ticker, _) = ticker();
        ticker.tick(f64::NAN);
        ticker.tick(-1.0);
        assert_eq!(ticker.now(), 0.0);
    }
}
