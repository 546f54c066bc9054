#![forbid(unsafe_code)]

//! Headless animation orchestration for a single-page portfolio: scroll triggers, section
//! tracking, a pointer-following cursor, the intro loader and per-section reveal/parallax
//! bindings, all driven by an explicit tick.

mod foundation;

pub mod animation;
pub mod cursor;
pub mod intro;
pub mod page;
pub mod scenario;
pub mod scroll;
pub mod sections;
pub mod stage;

pub use animation::ease::Ease;
pub use animation::ticker::{Owner, Ticker, TweenCallbacks, TweenId, TweenTarget, TweenUpdate};
pub use animation::timeline::{Position, Timeline};
pub use animation::tween::Tween;
pub use cursor::affordance::{Affordance, CURSOR_ATTR, MAGNETIC_CLASS};
pub use cursor::machine::{CursorFrame, CursorMachine, CursorOpts, CursorState, PointerKind};
pub use foundation::core::{Point, Rect, ScrollDirection, Vec2, Viewport, max_scroll};
pub use foundation::error::{ShowreelError, ShowreelResult};
pub use intro::{IntroElements, IntroOpts, IntroPhase, IntroSequencer, LOADER_ANCHOR};
pub use page::document::{Document, Element, ElementId, Positioning};
pub use page::surface::{Prop, Surface};
pub use scenario::{CheckReport, Scenario, Step, TraceEntry};
pub use scroll::anchor::{Anchor, Edge};
pub use scroll::registry::{TriggerHandle, TriggerRegistry};
pub use scroll::trigger::{
    TriggerCallbacks, TriggerEvent, TriggerId, TriggerSnapshot, TriggerSpec, TriggerTarget,
};
pub use sections::bindings::{Bindings, CounterSpec, RevealGroup, RevealSpec, ScrubSpec};
pub use sections::navigation::Navigation;
pub use sections::tracker::{ActiveSection, SectionId, SectionTracker};
pub use stage::{Stage, StageOpts};
