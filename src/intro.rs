//! One-time loader sequence shown before the page content is revealed.

use std::cell::RefCell;
use std::rc::Rc;

use crate::animation::ease::Ease;
use crate::animation::ticker::{Owner, Ticker, TweenCallbacks, TweenTarget};
use crate::animation::tween::Tween;
use crate::foundation::error::{ShowreelError, ShowreelResult};
use crate::page::document::{Document, ElementId};
use crate::page::surface::Prop;

/// Anchor of the loader surface; its text and bar are found by `data-role` inside it.
pub const LOADER_ANCHOR: &str = "loader";

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IntroPhase {
    Progressing,
    TextRevealed,
    Exiting,
    Done,
}

impl IntroPhase {
    const ORDER: [Self; 4] = [
        Self::Progressing,
        Self::TextRevealed,
        Self::Exiting,
        Self::Done,
    ];
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IntroOpts {
    pub progress_secs: f64,
    pub progress_ease: Ease,
    pub letter_secs: f64,
    pub letter_stagger: f64,
    pub letter_ease: Ease,
    pub letter_offset_y: f64,
    pub letter_rotate_x: f64,
    /// Time from start to the exit transition. Not gated on resource loading.
    pub exit_delay: f64,
    pub text_exit_secs: f64,
    pub text_exit_offset_y: f64,
    pub bar_exit_secs: f64,
    pub surface_exit_secs: f64,
    pub surface_exit_delay: f64,
}

impl Default for IntroOpts {
    fn default() -> Self {
        Self {
            progress_secs: 3.0,
            progress_ease: Ease::InOutCubic,
            letter_secs: 0.8,
            letter_stagger: 0.1,
            letter_ease: Ease::back_out(),
            letter_offset_y: 50.0,
            letter_rotate_x: -90.0,
            exit_delay: 3.5,
            text_exit_secs: 0.8,
            text_exit_offset_y: -50.0,
            bar_exit_secs: 0.5,
            surface_exit_secs: 1.2,
            surface_exit_delay: 0.3,
        }
    }
}

/// Loader element handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntroElements {
    pub surface: ElementId,
    pub text: ElementId,
    pub bar: ElementId,
}

impl IntroElements {
    pub fn locate(doc: &Document) -> ShowreelResult<Self> {
        let surface = doc
            .by_anchor(LOADER_ANCHOR)
            .ok_or_else(|| ShowreelError::target_not_found(format!("#{LOADER_ANCHOR}")))?;
        let find = |role: &str| {
            doc.find_role(surface, role).ok_or_else(|| {
                ShowreelError::target_not_found(format!("#{LOADER_ANCHOR} [data-role={role}]"))
            })
        };
        Ok(Self {
            surface,
            text: find("text")?,
            bar: find("bar")?,
        })
    }
}

type CompleteFn = Box<dyn FnOnce()>;

struct IntroState {
    phase: IntroPhase,
    percent: u8,
    history: Vec<IntroPhase>,
    letters_left: usize,
    resources_ready: bool,
    on_complete: Option<CompleteFn>,
}

impl IntroState {
    /// Move forward to `to`, logging every phase passed on the way. Never moves back.
    fn advance(&mut self, to: IntroPhase) {
        for phase in IntroPhase::ORDER {
            if phase > self.phase && phase <= to {
                tracing::debug!(?phase, percent = self.percent, "intro phase");
                self.phase = phase;
                self.history.push(phase);
            }
        }
    }
}

fn complete(state: &Rc<RefCell<IntroState>>) {
    let cb = {
        let mut st = state.borrow_mut();
        st.advance(IntroPhase::Done);
        st.on_complete.take()
    };
    // One-shot: a second completion event finds the slot empty.
    if let Some(cb) = cb {
        cb();
    }
}

/// The loader's `progressing -> textRevealed -> exiting -> done` sequence.
///
/// Everything runs on the shared ticker under one owner; dropping the sequencer cancels
/// whatever is still in flight and the completion callback then never fires.
pub struct IntroSequencer {
    owner: Owner,
    ticker: Ticker,
    letters: Vec<ElementId>,
    state: Rc<RefCell<IntroState>>,
}

impl IntroSequencer {
    #[tracing::instrument(skip(doc, ticker, els, opts, on_complete))]
    pub fn start(
        doc: &mut Document,
        ticker: &Ticker,
        els: IntroElements,
        title: &str,
        opts: &IntroOpts,
        on_complete: impl FnOnce() + 'static,
    ) -> ShowreelResult<Self> {
        ticker.surface().forget(&doc.clear_children(els.text));
        let letters = doc.split_letters(els.text, title)?;
        let owner = ticker.owner();
        let state = Rc::new(RefCell::new(IntroState {
            phase: IntroPhase::Progressing,
            percent: 0,
            history: vec![IntroPhase::Progressing],
            letters_left: letters.len(),
            resources_ready: false,
            on_complete: Some(Box::new(on_complete)),
        }));
        let seq = Self {
            owner,
            ticker: ticker.clone(),
            letters,
            state,
        };
        if let Err(err) = seq.schedule(els, opts) {
            seq.cancel();
            return Err(err);
        }
        Ok(seq)
    }

    fn schedule(&self, els: IntroElements, opts: &IntroOpts) -> ShowreelResult<()> {
        let ticker = &self.ticker;
        let owner = self.owner;

        ticker.set(els.bar, Prop::WidthPercent, 0.0);
        let (st, surface) = (self.state.clone(), ticker.surface());
        ticker.start_with(
            owner,
            TweenTarget::Detached,
            Tween::from_to(Prop::WidthPercent, 0.0, 100.0)
                .duration(opts.progress_secs)
                .ease(opts.progress_ease),
            TweenCallbacks::default().on_update(move |u| {
                // Time progress, like a loader bar that reports elapsed share.
                let pct = (u.linear * 100.0).round().clamp(0.0, 100.0) as u8;
                let mut st = st.borrow_mut();
                if pct > st.percent {
                    st.percent = pct;
                    surface.set(els.bar, Prop::WidthPercent, f64::from(pct));
                }
            }),
        )?;

        for (i, letter) in self.letters.iter().enumerate() {
            ticker.set(*letter, Prop::Opacity, 0.0);
            ticker.set(*letter, Prop::TranslateY, opts.letter_offset_y);
            ticker.set(*letter, Prop::RotateX, opts.letter_rotate_x);
            let st = self.state.clone();
            ticker.start_with(
                owner,
                TweenTarget::Element(*letter),
                Tween::to(Prop::Opacity, 1.0)
                    .and(Prop::TranslateY, 0.0)
                    .and(Prop::RotateX, 0.0)
                    .duration(opts.letter_secs)
                    .delay(i as f64 * opts.letter_stagger)
                    .ease(opts.letter_ease),
                TweenCallbacks::default().on_complete(move || {
                    let mut st = st.borrow_mut();
                    st.letters_left = st.letters_left.saturating_sub(1);
                    if st.letters_left == 0 {
                        st.advance(IntroPhase::TextRevealed);
                    }
                }),
            )?;
        }
        if self.letters.is_empty() {
            self.state.borrow_mut().advance(IntroPhase::TextRevealed);
        }

        let (st, exit_ticker, opts) = (self.state.clone(), ticker.clone(), opts.clone());
        ticker.delayed_call(owner, opts.exit_delay, move || {
            st.borrow_mut().advance(IntroPhase::Exiting);
            if let Err(err) = exit(&exit_ticker, owner, els, &opts, st) {
                tracing::warn!(%err, "intro exit could not start");
            }
        })?;
        Ok(())
    }

    pub fn phase(&self) -> IntroPhase {
        self.state.borrow().phase
    }

    /// Loader percentage, 0..=100, never decreasing.
    pub fn progress_percent(&self) -> u8 {
        self.state.borrow().percent
    }

    /// Every phase entered so far, in order.
    pub fn history(&self) -> Vec<IntroPhase> {
        self.state.borrow().history.clone()
    }

    pub fn is_done(&self) -> bool {
        self.phase() == IntroPhase::Done
    }

    pub fn letters(&self) -> &[ElementId] {
        &self.letters
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// The completion event. Fires the external callback the first time only.
    pub fn signal_complete(&self) {
        complete(&self.state);
    }

    /// Resource preloading finished. Recorded for diagnostics; the sequence stays time-gated.
    pub fn note_resources_ready(&self) {
        let mut st = self.state.borrow_mut();
        if !st.resources_ready {
            tracing::debug!(phase = ?st.phase, "resources ready (informational)");
            st.resources_ready = true;
        }
    }

    pub fn resources_ready(&self) -> bool {
        self.state.borrow().resources_ready
    }

    /// Cancel every in-flight tween and delayed call of the sequence.
    pub fn cancel(&self) -> usize {
        let killed = self.ticker.kill_owner(self.owner);
        if killed > 0 {
            tracing::debug!(killed, phase = ?self.phase(), "intro cancelled");
        }
        killed
    }
}

impl Drop for IntroSequencer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn exit(
    ticker: &Ticker,
    owner: Owner,
    els: IntroElements,
    opts: &IntroOpts,
    state: Rc<RefCell<IntroState>>,
) -> ShowreelResult<()> {
    ticker.start(
        owner,
        TweenTarget::Element(els.text),
        Tween::to(Prop::TranslateY, opts.text_exit_offset_y)
            .and(Prop::Opacity, 0.0)
            .duration(opts.text_exit_secs)
            .ease(Ease::InCubic),
    )?;
    ticker.start(
        owner,
        TweenTarget::Element(els.bar),
        Tween::to(Prop::ScaleX, 0.0)
            .duration(opts.bar_exit_secs)
            .ease(Ease::InCubic),
    )?;
    ticker.start_with(
        owner,
        TweenTarget::Element(els.surface),
        Tween::to(Prop::TranslateYPercent, -100.0)
            .duration(opts.surface_exit_secs)
            .delay(opts.surface_exit_delay)
            .ease(Ease::InOutCubic),
        TweenCallbacks::default().on_complete(move || complete(&state)),
    )?;
    Ok(())
}
