use crate::foundation::error::{ShowreelError, ShowreelResult};

pub use kurbo::{Point, Rect, Vec2};

/// Visible viewport size in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Viewport {
    /// Create a validated viewport (finite, strictly positive extents).
    pub fn new(width: f64, height: f64) -> ShowreelResult<Self> {
        if !(width.is_finite() && height.is_finite()) {
            return Err(ShowreelError::validation("viewport extents must be finite"));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(ShowreelError::validation("viewport extents must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Viewport rectangle at the origin.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1440.0,
            height: 900.0,
        }
    }
}

/// Direction of the most recent scroll movement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ScrollDirection {
    #[default]
    Down,
    Up,
}

/// Largest valid scroll offset for a document of `doc_height` in `viewport`.
pub fn max_scroll(doc_height: f64, viewport: Viewport) -> f64 {
    (doc_height - viewport.height).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_rejects_degenerate_extents() {
        assert!(Viewport::new(0.0, 100.0).is_err());
        assert!(Viewport::new(100.0, f64::NAN).is_err());
        assert!(Viewport::new(320.0, 640.0).is_ok());
    }

    #[test]
    fn max_scroll_never_negative() {
        let vp = Viewport::new(800.0, 600.0).unwrap();
        assert_eq!(max_scroll(400.0, vp), 0.0);
        assert_eq!(max_scroll(1600.0, vp), 1000.0);
    }
}
