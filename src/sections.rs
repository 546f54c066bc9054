//! Per-section scroll behavior: activation tracking, navigation state, reveal/parallax
//! bindings and the page's scenes.

pub mod bindings;
pub mod navigation;
pub mod scenes;
pub mod tracker;
