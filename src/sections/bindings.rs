use std::cell::Cell;
use std::rc::Rc;

use crate::animation::ease::Ease;
use crate::animation::ticker::{Owner, Ticker, TweenCallbacks, TweenId, TweenTarget};
use crate::animation::timeline::Timeline;
use crate::animation::tween::{DEFAULT_DURATION, Lerp, Tween};
use crate::foundation::error::ShowreelResult;
use crate::page::document::{Document, ElementId};
use crate::page::surface::{Prop, Surface};
use crate::scroll::anchor::Anchor;
use crate::scroll::registry::{TriggerHandle, TriggerRegistry, WeakRegistry};
use crate::scroll::trigger::{TriggerCallbacks, TriggerId, TriggerSpec};

/// Elements animated together by a reveal: same properties, ordinal delay per target.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealGroup {
    pub targets: Vec<ElementId>,
    /// Applied immediately when the binding is declared.
    pub initial: Vec<(Prop, f64)>,
    /// Resting values animated to on entry.
    pub to: Vec<(Prop, f64)>,
    pub duration: f64,
    pub delay: f64,
    pub stagger: f64,
    pub ease: Ease,
}

impl RevealGroup {
    pub fn new(targets: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            initial: Vec::new(),
            to: Vec::new(),
            duration: DEFAULT_DURATION,
            delay: 0.0,
            stagger: 0.0,
            ease: Ease::OutQuad,
        }
    }

    /// Start `prop` at `from` and reveal it to `to`.
    pub fn prop(mut self, prop: Prop, from: f64, to: f64) -> Self {
        self.initial.push((prop, from));
        self.to.push((prop, to));
        self
    }

    pub fn duration(mut self, secs: f64) -> Self {
        self.duration = secs;
        self
    }

    pub fn delay(mut self, secs: f64) -> Self {
        self.delay = secs;
        self
    }

    pub fn stagger(mut self, secs: f64) -> Self {
        self.stagger = secs;
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Write the initial values of every target into `surface`.
    pub fn apply_initial(&self, surface: &Surface) {
        for el in &self.targets {
            for (prop, v) in &self.initial {
                surface.set(*el, *prop, *v);
            }
        }
    }

    fn tweens(&self) -> Option<Vec<(ElementId, Tween)>> {
        let ((first, first_to), rest) = self.to.split_first()?;
        let base = rest
            .iter()
            .fold(Tween::to(*first, *first_to), |t, (p, v)| t.and(*p, *v))
            .duration(self.duration)
            .ease(self.ease);
        Some(
            self.targets
                .iter()
                .enumerate()
                .map(|(i, el)| (*el, base.clone().delay(self.delay + i as f64 * self.stagger)))
                .collect(),
        )
    }
}

/// One-shot entry animation.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealSpec {
    pub trigger: ElementId,
    pub start: Anchor,
    pub end: Anchor,
    pub groups: Vec<RevealGroup>,
}

impl RevealSpec {
    pub fn new(trigger: ElementId, start: Anchor) -> Self {
        Self {
            trigger,
            start,
            end: Anchor::default_end(),
            groups: Vec::new(),
        }
    }

    pub fn end(mut self, end: Anchor) -> Self {
        self.end = end;
        self
    }

    pub fn group(mut self, group: RevealGroup) -> Self {
        self.groups.push(group);
        self
    }
}

/// A property driven continuously by trigger progress: `from + (to - from) * progress`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrubSpec {
    pub trigger: ElementId,
    pub start: Anchor,
    pub end: Anchor,
    pub target: ElementId,
    pub prop: Prop,
    pub from: f64,
    pub to: f64,
}

/// Numeric count-up started on first entry. The surface receives rounded values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CounterSpec {
    pub trigger: ElementId,
    pub start: Anchor,
    pub target: ElementId,
    pub to: f64,
    pub duration: f64,
    pub delay: f64,
    pub ease: Ease,
}

/// Value of a scrubbed property at `progress`; exact at 0 and 1.
pub fn scrub_value(from: f64, to: f64, progress: f64) -> f64 {
    <f64 as Lerp>::lerp(&from, &to, progress)
}

/// Every trigger and tween declared by one mounted section.
///
/// Dropping it unregisters all of its triggers, including reveals that never fired, and
/// cancels its in-flight tweens.
pub struct Bindings {
    label: String,
    owner: Owner,
    ticker: Ticker,
    registry: TriggerRegistry,
    handles: Vec<TriggerHandle>,
}

impl Bindings {
    pub fn new(label: impl Into<String>, ticker: &Ticker, registry: &TriggerRegistry) -> Self {
        Self {
            label: label.into(),
            owner: ticker.owner(),
            ticker: ticker.clone(),
            registry: registry.clone(),
            handles: Vec::new(),
        }
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn surface(&self) -> Surface {
        self.ticker.surface()
    }

    /// Triggers still registered (fired reveals remove themselves).
    pub fn live_triggers(&self) -> usize {
        self.handles
            .iter()
            .filter(|h| self.registry.is_registered(h.id()))
            .count()
    }

    /// Tweens of this section still in flight.
    pub fn live_tweens(&self) -> usize {
        self.ticker.owned_by(self.owner)
    }

    fn register_once(
        &mut self,
        doc: &Document,
        spec: TriggerSpec,
        mut on_first_enter: impl FnMut() + 'static,
    ) -> ShowreelResult<TriggerId> {
        let slot: Rc<Cell<Option<TriggerId>>> = Rc::default();
        let weak: WeakRegistry = self.registry.downgrade();
        let id_slot = slot.clone();
        let handle = self.registry.register(
            doc,
            spec,
            TriggerCallbacks::default().on_enter(move |_| {
                let Some(id) = id_slot.take() else {
                    return;
                };
                on_first_enter();
                if let Some(registry) = weak.upgrade() {
                    registry.unregister(id);
                }
            }),
        )?;
        let id = handle.id();
        slot.set(Some(id));
        self.handles.push(handle);
        Ok(id)
    }

    /// Apply the initial state now; run the groups on the first Enter.
    pub fn reveal(&mut self, doc: &Document, spec: RevealSpec) -> ShowreelResult<TriggerId> {
        let surface = self.ticker.surface();
        let mut tweens = Vec::new();
        for group in &spec.groups {
            group.apply_initial(&surface);
            tweens.extend(group.tweens().unwrap_or_default());
        }

        let ticker = self.ticker.clone();
        let owner = self.owner;
        let label = format!("{}:reveal", self.label);
        let trigger = TriggerSpec::element(spec.trigger)
            .start(spec.start)
            .end(spec.end)
            .label(label.clone());
        self.register_once(doc, trigger, move || {
            tracing::debug!(%label, tweens = tweens.len(), "reveal started");
            for (el, tween) in tweens.drain(..) {
                if let Err(err) = ticker.start(owner, TweenTarget::Element(el), tween) {
                    tracing::warn!(%err, %label, "reveal tween rejected");
                }
            }
        })
    }

    pub fn scrub(&mut self, doc: &Document, spec: ScrubSpec) -> ShowreelResult<TriggerId> {
        let surface = self.ticker.surface();
        let trigger = TriggerSpec::element(spec.trigger)
            .start(spec.start)
            .end(spec.end)
            .scrub()
            .label(format!("{}:scrub", self.label));
        let handle = self.registry.register(
            doc,
            trigger,
            TriggerCallbacks::default().on_update(move |snap| {
                surface.set(spec.target, spec.prop, scrub_value(spec.from, spec.to, snap.progress));
            }),
        )?;
        self.ticker.set(spec.target, spec.prop, spec.from);
        let id = handle.id();
        self.handles.push(handle);
        Ok(id)
    }

    pub fn counter(&mut self, doc: &Document, spec: CounterSpec) -> ShowreelResult<TriggerId> {
        self.ticker.set(spec.target, Prop::Count, 0.0);
        let ticker = self.ticker.clone();
        let owner = self.owner;
        let trigger = TriggerSpec::element(spec.trigger)
            .start(spec.start)
            .label(format!("{}:counter", self.label));
        self.register_once(doc, trigger, move || {
            let surface = ticker.surface();
            let tween = Tween::from_to(Prop::Count, 0.0, spec.to)
                .duration(spec.duration)
                .delay(spec.delay)
                .ease(spec.ease);
            let callbacks = TweenCallbacks::default().on_update(move |u| {
                if let Some(v) = u.value {
                    surface.set(spec.target, Prop::Count, v.round());
                }
            });
            if let Err(err) = ticker.start_with(owner, TweenTarget::Detached, tween, callbacks) {
                tracing::warn!(%err, "counter tween rejected");
            }
        })
    }

    /// Play a mount-time timeline (not scroll-bound) under this section's owner.
    pub fn play(&mut self, timeline: Timeline) -> ShowreelResult<Vec<TweenId>> {
        timeline.play(&self.ticker, self.owner)
    }

    /// Start a free-running tween (decorative loops) under this section's owner.
    pub fn spin(&mut self, target: ElementId, tween: Tween) -> ShowreelResult<TweenId> {
        self.ticker
            .start(self.owner, TweenTarget::Element(target), tween)
    }
}

impl Drop for Bindings {
    fn drop(&mut self) {
        let killed = self.ticker.kill_owner(self.owner);
        tracing::debug!(
            label = %self.label,
            killed,
            triggers = self.handles.len(),
            "bindings torn down"
        );
    }
}
