//! JSON scenarios: a page layout, stage options and an input script to replay.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::cursor::affordance::Affordance;
use crate::cursor::machine::PointerKind;
use crate::foundation::core::{Point, Rect, Viewport};
use crate::foundation::error::{ShowreelError, ShowreelResult};
use crate::intro::IntroPhase;
use crate::page::document::{Document, Element, ElementId};
use crate::sections::tracker::SectionId;
use crate::stage::{Stage, StageOpts};

fn yes() -> bool {
    true
}

fn one() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub opts: StageOpts,
    pub page: PageDef,
    /// Run the loader before the page (requires a `#loader` element).
    #[serde(default = "yes")]
    pub intro: bool,
    #[serde(default)]
    pub script: Vec<Step>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageDef {
    pub elements: Vec<ElementDef>,
}

/// One element; parents must be declared before their children.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementDef {
    pub key: String,
    pub tag: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// `[x, y, width, height]` in document pixels (viewport pixels when `fixed`).
    pub rect: [f64; 4],
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub anchor: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub fixed: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Tick {
        dt: f64,
        #[serde(default = "one")]
        frames: u32,
    },
    Scroll {
        y: f64,
    },
    ScrollBy {
        dy: f64,
    },
    Resize {
        width: f64,
        height: f64,
    },
    Pointer {
        x: f64,
        y: f64,
        #[serde(default)]
        kind: PointerKind,
    },
    ScrollToSection {
        section: SectionId,
    },
    Mount {
        section: SectionId,
    },
    Unmount {
        section: SectionId,
    },
    NavigateAway,
    ResourcesReady,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Scroll { .. } => "scroll",
            Self::ScrollBy { .. } => "scroll_by",
            Self::Resize { .. } => "resize",
            Self::Pointer { .. } => "pointer",
            Self::ScrollToSection { .. } => "scroll_to_section",
            Self::Mount { .. } => "mount",
            Self::Unmount { .. } => "unmount",
            Self::NavigateAway => "navigate_away",
            Self::ResourcesReady => "resources_ready",
        }
    }

    fn is_valid(&self) -> bool {
        let finite = |vals: &[f64]| vals.iter().all(|v| v.is_finite());
        match *self {
            Self::Tick { dt, .. } => dt.is_finite() && dt >= 0.0,
            Self::Scroll { y } => finite(&[y]),
            Self::ScrollBy { dy } => finite(&[dy]),
            Self::Resize { width, height } => Viewport::new(width, height).is_ok(),
            Self::Pointer { x, y, .. } => finite(&[x, y]),
            _ => true,
        }
    }
}

/// Observable state after one script step.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TraceEntry {
    pub step: usize,
    pub op: &'static str,
    pub time: f64,
    pub scroll_y: f64,
    pub active_section: SectionId,
    pub scrolled: bool,
    pub page_progress: f64,
    pub intro_phase: Option<IntroPhase>,
    pub intro_percent: Option<u8>,
    pub cursor: Affordance,
    pub magnetized: bool,
    pub live_triggers: usize,
    pub dangling: usize,
    pub content_visible: bool,
    pub intro_completions: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of `check`: what the stage set up before any input.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct CheckReport {
    pub elements: usize,
    pub mounted: Vec<SectionId>,
    pub tracked: Vec<SectionId>,
    pub triggers: usize,
    pub intro: Option<IntroPhase>,
}

impl PageDef {
    /// Build the document. Returns it with the key → id map.
    pub fn build(&self) -> ShowreelResult<(Document, BTreeMap<String, ElementId>)> {
        let mut doc = Document::new();
        let mut ids = BTreeMap::new();
        for def in &self.elements {
            if ids.contains_key(&def.key) {
                return Err(ShowreelError::validation(format!(
                    "duplicate element key \"{}\"",
                    def.key
                )));
            }
            let parent = match &def.parent {
                Some(p) => Some(*ids.get(p).ok_or_else(|| {
                    ShowreelError::validation(format!(
                        "element \"{}\" refers to undeclared parent \"{p}\"",
                        def.key
                    ))
                })?),
                None => None,
            };
            let id = doc.append(parent, def.element()?)?;
            ids.insert(def.key.clone(), id);
        }
        Ok((doc, ids))
    }
}

impl ElementDef {
    fn element(&self) -> ShowreelResult<Element> {
        let [x, y, w, h] = self.rect;
        if !self.rect.iter().all(|v| v.is_finite()) || w < 0.0 || h < 0.0 {
            return Err(ShowreelError::validation(format!(
                "element \"{}\" has an invalid rect",
                self.key
            )));
        }
        let mut el = Element::new(self.tag.clone(), Rect::new(x, y, x + w, y + h));
        el.classes = self.classes.clone();
        el.attrs = self.attrs.clone();
        el.anchor = self.anchor.clone();
        el.text = self.text.clone();
        if self.fixed {
            el = el.fixed();
        }
        Ok(el)
    }
}

impl Scenario {
    pub fn from_json(s: &str) -> ShowreelResult<Self> {
        let scenario: Self = serde_json::from_str(s)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> ShowreelResult<()> {
        Viewport::new(self.opts.viewport.width, self.opts.viewport.height)?;
        if let Some((i, step)) = self.script.iter().enumerate().find(|(_, s)| !s.is_valid()) {
            return Err(ShowreelError::validation(format!(
                "script step {i}: invalid {} step",
                step.name()
            )));
        }
        Ok(())
    }

    /// Build the stage, start the intro (if requested) and mount every section.
    pub fn build(&self) -> ShowreelResult<(Stage, Rc<Cell<u32>>)> {
        let (doc, _) = self.page.build()?;
        let mut stage = Stage::new(doc, self.opts.clone())?;
        let completions = Rc::new(Cell::new(0u32));
        if self.intro {
            let c = completions.clone();
            if let Err(err) = stage.start_intro(move || c.set(c.get() + 1)) {
                tracing::warn!(%err, "scenario runs without intro");
            }
        }
        stage.mount_sections();
        Ok((stage, completions))
    }

    pub fn check(&self) -> ShowreelResult<CheckReport> {
        let (stage, _) = self.build()?;
        Ok(CheckReport {
            elements: stage.doc().len(),
            mounted: stage.mounted(),
            tracked: stage.tracked(),
            triggers: stage.live_triggers(),
            intro: stage.intro_phase(),
        })
    }

    /// Replay the script. Step failures are recorded in the trace, not propagated.
    #[tracing::instrument(skip(self), fields(steps = self.script.len()))]
    pub fn run(&self) -> ShowreelResult<Vec<TraceEntry>> {
        let (mut stage, completions) = self.build()?;
        let mut trace = Vec::with_capacity(self.script.len());
        for (i, step) in self.script.iter().enumerate() {
            let error = apply(&mut stage, step).err().map(|e| e.to_string());
            if let Some(err) = &error {
                tracing::warn!(step = i, op = step.name(), %err, "step failed");
            }
            trace.push(entry(&stage, i, step.name(), completions.get(), error));
        }
        Ok(trace)
    }
}

fn apply(stage: &mut Stage, step: &Step) -> ShowreelResult<()> {
    match *step {
        Step::Tick { dt, frames } => {
            for _ in 0..frames {
                stage.tick(dt);
            }
        }
        Step::Scroll { y } => stage.scroll_to(y),
        Step::ScrollBy { dy } => stage.scroll_by(dy),
        Step::Resize { width, height } => stage.resize(Viewport::new(width, height)?)?,
        Step::Pointer { x, y, kind } => stage.pointer_move(kind, Point::new(x, y)),
        Step::ScrollToSection { section } => stage.scroll_to_section(section)?,
        Step::Mount { section } => stage.mount_section(section)?,
        Step::Unmount { section } => {
            stage.unmount_section(section);
        }
        Step::NavigateAway => {
            stage.navigate_away();
        }
        Step::ResourcesReady => stage.note_resources_ready(),
    }
    Ok(())
}

fn entry(
    stage: &Stage,
    step: usize,
    op: &'static str,
    intro_completions: u32,
    error: Option<String>,
) -> TraceEntry {
    let cursor = stage.cursor().state();
    TraceEntry {
        step,
        op,
        time: stage.ticker().now(),
        scroll_y: stage.scroll_y(),
        active_section: stage.active_section(),
        scrolled: stage.is_scrolled(),
        page_progress: stage.page_progress(),
        intro_phase: stage.intro_phase(),
        intro_percent: stage.intro_percent(),
        cursor: cursor.affordance,
        magnetized: cursor.magnetized,
        live_triggers: stage.live_triggers(),
        dangling: stage.dangling().len(),
        content_visible: stage.content_visible(),
        intro_completions,
        error,
    }
}
