//! The page session: one document, one surface, one tick source, and everything mounted on them.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::animation::ease::Ease;
use crate::animation::ticker::Ticker;
use crate::cursor::machine::{CursorMachine, CursorOpts, Follower, PointerKind};
use crate::foundation::core::{Point, Viewport, max_scroll};
use crate::foundation::error::{ShowreelError, ShowreelResult};
use crate::intro::{IntroElements, IntroOpts, IntroPhase, IntroSequencer, LOADER_ANCHOR};
use crate::page::document::Document;
use crate::page::surface::Surface;
use crate::scroll::registry::TriggerRegistry;
use crate::scroll::trigger::TriggerId;
use crate::sections::bindings::Bindings;
use crate::sections::navigation::{Navigation, page_progress};
use crate::sections::scenes;
use crate::sections::tracker::{ActiveSection, SectionId};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StageOpts {
    pub viewport: Viewport,
    /// Duration of navigation-triggered smooth scrolling.
    pub smooth_scroll_duration: f64,
    pub smooth_scroll_ease: Ease,
    pub intro_title: String,
    pub cursor: CursorOpts,
    pub intro: IntroOpts,
}

impl Default for StageOpts {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            smooth_scroll_duration: 1.5,
            smooth_scroll_ease: Ease::InOutCubic,
            intro_title: "PORTFOLIO".to_owned(),
            cursor: CursorOpts::default(),
            intro: IntroOpts::default(),
        }
    }
}

/// A page session.
///
/// All time flows through [`Stage::tick`]; scroll and pointer input go through the stage so the
/// registry, cursor and smooth scroll see the same positions.
pub struct Stage {
    opts: StageOpts,
    doc: Document,
    surface: Surface,
    ticker: Ticker,
    registry: TriggerRegistry,
    cursor: CursorMachine,
    active: ActiveSection,
    navigation: Option<Navigation>,
    sections: BTreeMap<SectionId, Bindings>,
    intro: Option<IntroSequencer>,
    content_visible: Rc<Cell<bool>>,
    scroll_y: f64,
    smooth: Option<Follower<f64>>,
    pointer: Option<(PointerKind, Point)>,
}

impl Stage {
    pub fn new(doc: Document, opts: StageOpts) -> ShowreelResult<Self> {
        let viewport = Viewport::new(opts.viewport.width, opts.viewport.height)?;
        let surface = Surface::new();
        let ticker = Ticker::new(surface.clone());
        let registry = TriggerRegistry::new(viewport);
        let active = ActiveSection::default();
        let navigation = Navigation::attach_to(&registry, &doc, active.clone());
        registry.sync();
        Ok(Self {
            cursor: CursorMachine::new(opts.cursor.clone()),
            opts,
            doc,
            surface,
            ticker,
            registry,
            active,
            navigation: Some(navigation),
            sections: BTreeMap::new(),
            intro: None,
            content_visible: Rc::new(Cell::new(false)),
            scroll_y: 0.0,
            smooth: None,
            pointer: None,
        })
    }

    /// Start the loader. Content becomes visible when it completes, then `on_complete` runs.
    ///
    /// Without a loader on the page the content is shown immediately and the error returned.
    pub fn start_intro(&mut self, on_complete: impl FnOnce() + 'static) -> ShowreelResult<()> {
        if self.intro.is_some() {
            return Err(ShowreelError::validation("intro already started"));
        }
        let els = match IntroElements::locate(&self.doc) {
            Ok(els) => els,
            Err(err) => {
                tracing::warn!(%err, "no loader; content shown without intro");
                self.content_visible.set(true);
                return Err(err);
            }
        };
        let visible = self.content_visible.clone();
        let seq = IntroSequencer::start(
            &mut self.doc,
            &self.ticker,
            els,
            &self.opts.intro_title,
            &self.opts.intro,
            move || {
                visible.set(true);
                on_complete();
            },
        )?;
        self.intro = Some(seq);
        Ok(())
    }

    pub fn note_resources_ready(&self) {
        match &self.intro {
            Some(intro) => intro.note_resources_ready(),
            None => tracing::debug!("resources ready before intro start"),
        }
    }

    /// Mount every section present on the page. Returns the ones mounted.
    #[tracing::instrument(skip(self))]
    pub fn mount_sections(&mut self) -> Vec<SectionId> {
        let mut mounted = Vec::new();
        for id in SectionId::ALL {
            if self.doc.by_anchor(id.anchor()).is_none() {
                tracing::warn!(section = %id, "section not on page; not mounted");
                continue;
            }
            match self.mount_one(id) {
                Ok(()) => mounted.push(id),
                Err(err) => tracing::warn!(%err, section = %id, "section mount failed"),
            }
        }
        self.ensure_navigation();
        self.registry.sync();
        mounted
    }

    /// Mount (or remount) one section.
    #[tracing::instrument(skip(self))]
    pub fn mount_section(&mut self, id: SectionId) -> ShowreelResult<()> {
        self.mount_one(id)?;
        self.ensure_navigation();
        self.registry.sync();
        Ok(())
    }

    fn mount_one(&mut self, id: SectionId) -> ShowreelResult<()> {
        // Old bindings go first so nothing of the previous mount survives.
        self.sections.remove(&id);
        let bindings = scenes::mount(id, &mut self.doc, &self.ticker, &self.registry)?;
        self.sections.insert(id, bindings);
        Ok(())
    }

    fn ensure_navigation(&mut self) {
        if self.navigation.is_none() {
            self.navigation = Some(Navigation::attach_to(
                &self.registry,
                &self.doc,
                self.active.clone(),
            ));
        }
    }

    /// Tear a section down and remove its subtree from the page.
    #[tracing::instrument(skip(self))]
    pub fn unmount_section(&mut self, id: SectionId) -> bool {
        let had_bindings = self.sections.remove(&id).is_some();
        let Some(root) = self.doc.by_anchor(id.anchor()) else {
            return had_bindings;
        };
        let removed = self.doc.remove(root);
        self.surface.forget(&removed);
        if self
            .cursor
            .hovered()
            .is_some_and(|h| removed.contains(&h))
        {
            self.cursor.pointer_leave();
        }
        if let Some(nav) = &mut self.navigation {
            nav.untrack(id);
        }
        // The page may have shrunk; remaining triggers keep their zones.
        self.registry.refresh(&self.doc, self.opts.viewport);
        let clamped = self.clamp_scroll(self.scroll_y);
        if clamped != self.scroll_y {
            self.apply_scroll(clamped);
        }
        true
    }

    /// Route change: every observer and tween goes, scroll resets to the top.
    #[tracing::instrument(skip(self))]
    pub fn navigate_away(&mut self) -> usize {
        self.sections.clear();
        self.intro = None;
        self.navigation = None;
        let cleared = self.registry.unregister_all();
        let killed = self.ticker.kill_all();
        tracing::debug!(cleared, killed, "navigated away");
        self.smooth = None;
        self.cursor.pointer_leave();
        self.scroll_y = 0.0;
        self.registry.update(0.0);
        self.active.set(SectionId::Hero);
        cleared
    }

    /// Jump to `y`, clamped to the scrollable range. Cancels a smooth scroll in progress.
    pub fn scroll_to(&mut self, y: f64) {
        if !y.is_finite() {
            tracing::warn!(y, "ignoring non-finite scroll target");
            return;
        }
        self.smooth = None;
        self.apply_scroll(self.clamp_scroll(y));
    }

    pub fn scroll_by(&mut self, dy: f64) {
        self.scroll_to(self.scroll_y + dy);
    }

    /// Smooth-scroll so the section's top meets the viewport top.
    pub fn scroll_to_section(&mut self, id: SectionId) -> ShowreelResult<()> {
        let root = self
            .doc
            .by_anchor(id.anchor())
            .ok_or_else(|| ShowreelError::target_not_found(format!("#{id}")))?;
        let top = self.doc.get(root).map(|e| e.rect.y0).unwrap_or_default();
        let mut follower = Follower::new(
            self.scroll_y,
            self.opts.smooth_scroll_duration,
            self.opts.smooth_scroll_ease,
        );
        follower.retarget(self.clamp_scroll(top));
        tracing::debug!(section = %id, from = self.scroll_y, to = follower.target(), "smooth scroll");
        if follower.is_settled() {
            self.apply_scroll(follower.current());
        } else {
            self.smooth = Some(follower);
        }
        Ok(())
    }

    pub fn resize(&mut self, viewport: Viewport) -> ShowreelResult<()> {
        let viewport = Viewport::new(viewport.width, viewport.height)?;
        self.opts.viewport = viewport;
        self.registry.refresh(&self.doc, viewport);
        let clamped = self.clamp_scroll(self.scroll_y);
        if clamped != self.scroll_y {
            self.apply_scroll(clamped);
        }
        Ok(())
    }

    pub fn set_fine_pointer(&mut self, fine: bool) {
        self.cursor.set_fine_pointer(fine);
    }

    pub fn pointer_move(&mut self, kind: PointerKind, p: Point) {
        self.pointer = Some((kind, p));
        self.cursor.pointer_move(kind, p);
        self.rehover();
    }

    /// The single tick source: smooth scroll, then tweens, then cursor followers.
    pub fn tick(&mut self, dt: f64) {
        if !(dt.is_finite() && dt >= 0.0) {
            tracing::warn!(dt, "ignoring invalid frame delta");
            return;
        }
        if let Some(mut smooth) = self.smooth.take() {
            smooth.tick(dt);
            self.apply_scroll(smooth.current());
            if !smooth.is_settled() {
                self.smooth = Some(smooth);
            }
        }
        self.ticker.tick(dt);
        if self.intro.as_ref().is_some_and(IntroSequencer::is_done) {
            self.dismiss_loader();
        }
        self.cursor.tick(dt);
    }

    /// Unmount the loader once the intro is over.
    fn dismiss_loader(&mut self) {
        let Some(loader) = self.doc.by_anchor(LOADER_ANCHOR) else {
            return;
        };
        let removed = self.doc.remove(loader);
        self.surface.forget(&removed);
        tracing::debug!(elements = removed.len(), "loader dismissed");
        if self.cursor.hovered().is_some_and(|h| removed.contains(&h)) {
            self.cursor.pointer_leave();
        }
        self.rehover();
    }

    fn clamp_scroll(&self, y: f64) -> f64 {
        y.clamp(0.0, max_scroll(self.doc.height(), self.opts.viewport))
    }

    fn apply_scroll(&mut self, y: f64) {
        self.scroll_y = y;
        self.registry.update(y);
        self.rehover();
    }

    fn rehover(&mut self) {
        if let Some((kind, p)) = self.pointer {
            let hit = self.doc.hit_test(p, self.scroll_y);
            self.cursor.hover(&self.doc, kind, hit);
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn registry(&self) -> &TriggerRegistry {
        &self.registry
    }

    pub fn cursor(&self) -> &CursorMachine {
        &self.cursor
    }

    pub fn opts(&self) -> &StageOpts {
        &self.opts
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn is_smooth_scrolling(&self) -> bool {
        self.smooth.is_some()
    }

    pub fn active_section(&self) -> SectionId {
        self.active.get()
    }

    /// Shared handle for subscribing to active-section changes.
    pub fn active(&self) -> ActiveSection {
        self.active.clone()
    }

    pub fn is_scrolled(&self) -> bool {
        self.navigation.as_ref().is_some_and(Navigation::is_scrolled)
    }

    pub fn page_progress(&self) -> f64 {
        page_progress(self.scroll_y, self.doc.height(), self.opts.viewport)
    }

    pub fn mounted(&self) -> Vec<SectionId> {
        self.sections.keys().copied().collect()
    }

    pub fn tracked(&self) -> Vec<SectionId> {
        self.navigation
            .as_ref()
            .map(|n| n.tracked().to_vec())
            .unwrap_or_default()
    }

    pub fn bindings(&self, id: SectionId) -> Option<&Bindings> {
        self.sections.get(&id)
    }

    pub fn live_triggers(&self) -> usize {
        self.registry.len()
    }

    /// Triggers observing removed elements. Empty unless something leaked.
    pub fn dangling(&self) -> Vec<TriggerId> {
        self.registry.dangling(&self.doc)
    }

    pub fn content_visible(&self) -> bool {
        self.content_visible.get()
    }

    pub fn intro(&self) -> Option<&IntroSequencer> {
        self.intro.as_ref()
    }

    pub fn intro_phase(&self) -> Option<IntroPhase> {
        self.intro.as_ref().map(IntroSequencer::phase)
    }

    pub fn intro_percent(&self) -> Option<u8> {
        self.intro.as_ref().map(IntroSequencer::progress_percent)
    }
}
