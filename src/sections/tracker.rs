use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::foundation::error::{ShowreelError, ShowreelResult};
use crate::page::document::Document;
use crate::scroll::anchor::{Anchor, Edge};
use crate::scroll::registry::{TriggerHandle, TriggerRegistry};
use crate::scroll::trigger::{TriggerCallbacks, TriggerSpec};

/// The fixed set of page sections. Their order on the page comes from the layout, not from here.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Hero,
    Projects,
    About,
    Services,
    Contact,
}

impl SectionId {
    pub const ALL: [Self; 5] = [
        Self::Hero,
        Self::Projects,
        Self::About,
        Self::Services,
        Self::Contact,
    ];

    /// Element anchor of the section root (`#hero`).
    pub fn anchor(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Projects => "projects",
            Self::About => "about",
            Self::Services => "services",
            Self::Contact => "contact",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.anchor())
    }
}

impl FromStr for SectionId {
    type Err = ShowreelError;

    fn from_str(s: &str) -> ShowreelResult<Self> {
        let s = s.trim().trim_start_matches('#');
        Self::ALL
            .into_iter()
            .find(|id| id.anchor() == s)
            .ok_or_else(|| ShowreelError::validation(format!("unknown section \"{s}\"")))
    }
}

pub type SectionListener = Box<dyn FnMut(SectionId)>;

struct ActiveInner {
    current: Cell<SectionId>,
    listeners: RefCell<Vec<SectionListener>>,
}

/// Shared current-section value with change notification.
///
/// Readers hold clones; only the tracker writes.
#[derive(Clone)]
pub struct ActiveSection(Rc<ActiveInner>);

impl Default for ActiveSection {
    fn default() -> Self {
        Self(Rc::new(ActiveInner {
            current: Cell::new(SectionId::Hero),
            listeners: RefCell::new(Vec::new()),
        }))
    }
}

impl ActiveSection {
    pub fn get(&self) -> SectionId {
        self.0.current.get()
    }

    /// Call `f` with the new value every time it changes.
    pub fn subscribe(&self, f: impl FnMut(SectionId) + 'static) {
        self.0.listeners.borrow_mut().push(Box::new(f));
    }

    pub(crate) fn set(&self, id: SectionId) {
        if self.0.current.replace(id) == id {
            return;
        }
        tracing::debug!(section = %id, "active section changed");
        let mut listeners = std::mem::take(&mut *self.0.listeners.borrow_mut());
        for f in listeners.iter_mut() {
            f(id);
        }
        // Keep anything subscribed from inside a listener.
        let mut slot = self.0.listeners.borrow_mut();
        listeners.append(&mut slot);
        *slot = listeners;
    }
}

/// One "top center" / "bottom center" trigger per section root; Enter and EnterBack make that
/// section active.
///
/// Triggers register in document order (by root top edge), so on a jump over several sections
/// the one crossed last in the scroll direction wins.
pub struct SectionTracker {
    active: ActiveSection,
    tracked: Vec<SectionId>,
    handles: Vec<TriggerHandle>,
}

impl SectionTracker {
    pub fn attach(registry: &TriggerRegistry, doc: &Document) -> Self {
        Self::attach_to(registry, doc, ActiveSection::default())
    }

    /// Attach and write into an existing [`ActiveSection`] (re-attaching after navigation).
    pub fn attach_to(registry: &TriggerRegistry, doc: &Document, active: ActiveSection) -> Self {
        let mut roots = Vec::new();
        for id in SectionId::ALL {
            match doc.by_anchor(id.anchor()) {
                Some(root) => {
                    let top = doc.get(root).map(|e| e.rect.y0).unwrap_or_default();
                    roots.push((id, root, top));
                }
                None => {
                    let err = ShowreelError::target_not_found(format!("#{id}"));
                    tracing::warn!(%err, "section not on page; not tracked");
                }
            }
        }
        roots.sort_by(|a, b| a.2.total_cmp(&b.2));

        let mut tracked = Vec::new();
        let mut handles = Vec::new();
        for (id, root, _) in roots {
            let spec = TriggerSpec::element(root)
                .start(Anchor::pair(Edge::Top, Edge::Center))
                .end(Anchor::pair(Edge::Bottom, Edge::Center))
                .label(format!("section:{id}"));
            let (a, b) = (active.clone(), active.clone());
            let callbacks = TriggerCallbacks::default()
                .on_enter(move |_| a.set(id))
                .on_enter_back(move |_| b.set(id));
            match registry.register(doc, spec, callbacks) {
                Ok(handle) => {
                    tracked.push(id);
                    handles.push(handle);
                }
                Err(err) => tracing::warn!(%err, section = %id, "section tracking skipped"),
            }
        }
        Self {
            active,
            tracked,
            handles,
        }
    }

    /// Stop tracking one section, leaving the others and the current value alone.
    pub fn untrack(&mut self, id: SectionId) -> bool {
        let Some(i) = self.tracked.iter().position(|t| *t == id) else {
            return false;
        };
        self.tracked.remove(i);
        self.handles.remove(i);
        tracing::debug!(section = %id, "section untracked");
        true
    }

    pub fn active(&self) -> ActiveSection {
        self.active.clone()
    }

    pub fn current(&self) -> SectionId {
        self.active.get()
    }

    /// Sections that were found on the page and are being tracked, in document order.
    pub fn tracked(&self) -> &[SectionId] {
        &self.tracked
    }
}
