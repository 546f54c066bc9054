//! Scroll observers: anchor geometry, trigger state and the page-session registry.

pub mod anchor;
pub mod registry;
pub mod trigger;
