pub mod ease;
pub mod ticker;
pub mod timeline;
pub mod tween;
