//! The page's section scenes: which elements each section animates, and how.
//!
//! Element handles are looked up by `data-role` inside each section root. A missing role only
//! disables the effect that needed it.

use std::f64::consts::TAU;

use crate::animation::ease::Ease;
use crate::animation::ticker::{Ticker, TweenTarget};
use crate::animation::timeline::{Position, Timeline};
use crate::animation::tween::Tween;
use crate::foundation::error::{ShowreelError, ShowreelResult};
use crate::page::document::{Document, ElementId};
use crate::page::surface::Prop;
use crate::scroll::anchor::{Anchor, Edge};
use crate::scroll::registry::TriggerRegistry;
use crate::sections::bindings::{Bindings, CounterSpec, RevealGroup, RevealSpec, ScrubSpec};
use crate::sections::tracker::SectionId;

/// Attribute holding a stat counter's final value.
pub const COUNT_ATTR: &str = "data-count";

const TITLE_OFFSET: f64 = 64.0;
const BLOCK_OFFSET: f64 = 32.0;

/// Build the bindings of section `id` against its mounted root.
#[tracing::instrument(skip(doc, ticker, registry))]
pub fn mount(
    id: SectionId,
    doc: &mut Document,
    ticker: &Ticker,
    registry: &TriggerRegistry,
) -> ShowreelResult<Bindings> {
    let root = doc
        .by_anchor(id.anchor())
        .ok_or_else(|| ShowreelError::target_not_found(format!("#{id}")))?;
    let mut b = Bindings::new(id.anchor(), ticker, registry);
    match id {
        SectionId::Hero => hero(doc, root, &mut b),
        SectionId::Projects => projects(doc, root, &mut b),
        SectionId::About => about(doc, root, &mut b),
        SectionId::Contact => contact(doc, root, &mut b),
        // Navigation target only; nothing animates.
        SectionId::Services => {}
    }
    tracing::debug!(triggers = b.live_triggers(), tweens = b.live_tweens(), "section mounted");
    Ok(b)
}

fn role(doc: &Document, root: ElementId, name: &str) -> Option<ElementId> {
    let found = doc.find_role(root, name);
    if found.is_none() {
        tracing::warn!(role = name, "element not found; effect skipped");
    }
    found
}

fn absorb<T>(what: &str, r: ShowreelResult<T>) {
    if let Err(err) = r {
        tracing::warn!(%err, what, "binding skipped");
    }
}

fn at(element: Edge, viewport: Edge) -> Anchor {
    Anchor::pair(element, viewport)
}

fn title_reveal(doc: &Document, root: ElementId, b: &mut Bindings) {
    let Some(title) = role(doc, root, "title") else {
        return;
    };
    let spec = RevealSpec::new(title, at(Edge::Top, Edge::Percent(80.0))).group(
        RevealGroup::new([title])
            .prop(Prop::Opacity, 0.0, 1.0)
            .prop(Prop::TranslateY, TITLE_OFFSET, 0.0)
            .duration(1.0)
            .ease(Ease::OutCubic),
    );
    absorb("title reveal", b.reveal(doc, spec));
}

fn children_reveal(doc: &Document, root: ElementId, b: &mut Bindings, name: &str, stagger: f64) {
    let Some(block) = role(doc, root, name) else {
        return;
    };
    let spec = RevealSpec::new(block, at(Edge::Top, Edge::Percent(85.0))).group(
        RevealGroup::new(doc.children(block).to_vec())
            .prop(Prop::Opacity, 0.0, 1.0)
            .prop(Prop::TranslateY, BLOCK_OFFSET, 0.0)
            .duration(0.8)
            .stagger(stagger)
            .ease(Ease::OutCubic),
    );
    absorb("children reveal", b.reveal(doc, spec));
}

fn parallax(doc: &Document, trigger: ElementId, target: ElementId, b: &mut Bindings, depth: f64) {
    let spec = ScrubSpec {
        trigger,
        start: Anchor::default_start(),
        end: Anchor::default_end(),
        target,
        prop: Prop::TranslateY,
        from: 0.0,
        to: -depth,
    };
    absorb("parallax", b.scrub(doc, spec));
}

fn hero(doc: &mut Document, root: ElementId, b: &mut Bindings) {
    let mut tl = Timeline::new();

    if let Some(title) = role(doc, root, "title") {
        let text = doc.get(title).and_then(|e| e.text.clone()).unwrap_or_default();
        // Letters of a previous mount.
        b.surface().forget(&doc.clear_children(title));
        match doc.split_letters(title, &text) {
            Ok(letters) => {
                let group = RevealGroup::new(letters.iter().copied())
                    .prop(Prop::Opacity, 0.0, 1.0)
                    .prop(Prop::TranslateY, 100.0, 0.0)
                    .prop(Prop::RotateX, -90.0, 0.0);
                apply_initial(b, &group);
                tl.add_staggered(
                    &targets(&letters),
                    Tween::to(Prop::Opacity, 1.0)
                        .and(Prop::TranslateY, 0.0)
                        .and(Prop::RotateX, 0.0)
                        .duration(0.8)
                        .delay(0.5)
                        .ease(Ease::back_out()),
                    0.05,
                    Position::End,
                );
            }
            Err(err) => tracing::warn!(%err, "hero title not split"),
        }
    }

    if let Some(subtitle) = role(doc, root, "subtitle") {
        apply_initial(
            b,
            &RevealGroup::new([subtitle])
                .prop(Prop::Opacity, 0.0, 1.0)
                .prop(Prop::TranslateY, BLOCK_OFFSET, 0.0),
        );
        tl.add(
            TweenTarget::from(subtitle),
            Tween::to(Prop::Opacity, 1.0)
                .and(Prop::TranslateY, 0.0)
                .duration(1.0)
                .ease(Ease::OutCubic),
            Position::Relative(-0.3),
        );
    }

    if let Some(cta) = role(doc, root, "cta") {
        apply_initial(
            b,
            &RevealGroup::new([cta])
                .prop(Prop::Opacity, 0.0, 1.0)
                .prop(Prop::TranslateY, BLOCK_OFFSET, 0.0)
                .prop(Prop::Scale, 0.9, 1.0),
        );
        tl.add(
            TweenTarget::from(cta),
            Tween::to(Prop::Opacity, 1.0)
                .and(Prop::TranslateY, 0.0)
                .and(Prop::Scale, 1.0)
                .duration(0.8)
                .ease(Ease::back_out()),
            Position::Relative(-0.5),
        );
    }

    absorb("hero timeline", b.play(tl));

    let spec = ScrubSpec {
        trigger: root,
        start: at(Edge::Top, Edge::Top),
        end: at(Edge::Bottom, Edge::Top),
        target: root,
        prop: Prop::TranslateY,
        from: 0.0,
        to: -100.0,
    };
    absorb("hero parallax", b.scrub(doc, spec));

    if let Some(sphere) = role(doc, root, "sphere") {
        let spin = Tween::from_to(Prop::RotateY, 0.0, TAU)
            .duration(20.0)
            .ease(Ease::Linear)
            .repeat_forever();
        absorb("sphere rotation", b.spin(sphere, spin));
    }
}

fn projects(doc: &Document, root: ElementId, b: &mut Bindings) {
    title_reveal(doc, root, b);

    for card in doc.find_all_roles(root, "card") {
        let mut spec = RevealSpec::new(card, at(Edge::Top, Edge::Percent(80.0)))
            .end(at(Edge::Bottom, Edge::Percent(20.0)))
            .group(
                RevealGroup::new([card])
                    .prop(Prop::Opacity, 0.0, 1.0)
                    .prop(Prop::TranslateY, 100.0, 0.0)
                    .duration(1.0)
                    .ease(Ease::OutCubic),
            );
        if let Some(number) = doc.find_role(card, "number") {
            spec = spec.group(
                RevealGroup::new([number])
                    .prop(Prop::Opacity, 0.0, 1.0)
                    .prop(Prop::Scale, 0.5, 1.0)
                    .duration(0.8)
                    .delay(0.2)
                    .ease(Ease::back_out()),
            );
        }
        absorb("project card", b.reveal(doc, spec));

        if let Some(image) = doc.find_role(card, "image") {
            parallax(doc, image, image, b, 50.0);
        }
    }
}

fn about(doc: &Document, root: ElementId, b: &mut Bindings) {
    title_reveal(doc, root, b);
    children_reveal(doc, root, b, "text", 0.2);

    if let Some(image) = role(doc, root, "image") {
        parallax(doc, image, image, b, 100.0);
    }

    for (i, stat) in doc.find_all_roles(root, "stat").into_iter().enumerate() {
        let to = doc
            .get(stat)
            .and_then(|e| e.attr_value(COUNT_ATTR))
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite());
        let Some(to) = to else {
            tracing::warn!(stat = stat.0, "stat without a numeric {COUNT_ATTR}; counter skipped");
            continue;
        };
        let spec = CounterSpec {
            trigger: stat,
            start: at(Edge::Top, Edge::Percent(80.0)),
            target: stat,
            to,
            duration: 2.0,
            delay: i as f64 * 0.2,
            ease: Ease::OutCubic,
        };
        absorb("stat counter", b.counter(doc, spec));
    }
}

fn contact(doc: &Document, root: ElementId, b: &mut Bindings) {
    title_reveal(doc, root, b);
    children_reveal(doc, root, b, "form", 0.1);
}

fn apply_initial(b: &Bindings, group: &RevealGroup) {
    group.apply_initial(&b.surface());
}

fn targets(els: &[ElementId]) -> Vec<TweenTarget> {
    els.iter().map(|e| TweenTarget::from(*e)).collect()
}
