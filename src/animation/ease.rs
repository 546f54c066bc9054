use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{ShowreelError, ShowreelResult};

/// Easing functions used to map normalized animation progress.
///
/// Serialized as the GSAP-style names the page scenes are written in
/// (`"power2.out"`, `"back.out(1.7)"`, `"none"`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Ease {
    /// Linear interpolation.
    Linear,
    /// Quadratic ease-in (`power1.in`).
    InQuad,
    /// Quadratic ease-out (`power1.out`).
    OutQuad,
    /// Quadratic ease-in/out (`power1.inOut`).
    InOutQuad,
    /// Cubic ease-in (`power2.in`).
    InCubic,
    /// Cubic ease-out (`power2.out`).
    OutCubic,
    /// Cubic ease-in/out (`power2.inOut`).
    InOutCubic,
    /// Overshooting ease-out (`back.out(s)`).
    BackOut {
        /// Overshoot amount; GSAP's default is 1.70158.
        overshoot: f64,
    },
}

impl Ease {
    /// Apply this easing function to normalized progress `t` in `[0, 1]`.
    ///
    /// Endpoints are exact for every variant.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::BackOut { overshoot } => {
                let u = t - 1.0;
                1.0 + (overshoot + 1.0) * u.powi(3) + overshoot * u.powi(2)
            }
        }
    }

    /// `back.out(1.7)`, the overshoot the site uses for letter and numeral reveals.
    pub const fn back_out() -> Self {
        Self::BackOut { overshoot: 1.7 }
    }
}

impl FromStr for Ease {
    type Err = ShowreelError;

    fn from_str(s: &str) -> ShowreelResult<Self> {
        let name = s.trim();
        let ease = match name {
            "none" | "linear" => Self::Linear,
            "power1.in" => Self::InQuad,
            "power1.out" | "power1" => Self::OutQuad,
            "power1.inOut" => Self::InOutQuad,
            "power2.in" => Self::InCubic,
            "power2.out" | "power2" => Self::OutCubic,
            "power2.inOut" => Self::InOutCubic,
            "back.out" => Self::BackOut {
                overshoot: 1.70158,
            },
            other => {
                let Some(arg) = other
                    .strip_prefix("back.out(")
                    .and_then(|rest| rest.strip_suffix(')'))
                else {
                    return Err(ShowreelError::validation(format!(
                        "unknown ease \"{other}\""
                    )));
                };
                let overshoot: f64 = arg.trim().parse().map_err(|_| {
                    ShowreelError::validation(format!("invalid back.out overshoot \"{arg}\""))
                })?;
                if !overshoot.is_finite() {
                    return Err(ShowreelError::validation(
                        "back.out overshoot must be finite",
                    ));
                }
                Self::BackOut { overshoot }
            }
        };
        Ok(ease)
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("none"),
            Self::InQuad => f.write_str("power1.in"),
            Self::OutQuad => f.write_str("power1.out"),
            Self::InOutQuad => f.write_str("power1.inOut"),
            Self::InCubic => f.write_str("power2.in"),
            Self::OutCubic => f.write_str("power2.out"),
            Self::InOutCubic => f.write_str("power2.inOut"),
            Self::BackOut { overshoot } => write!(f, "back.out({overshoot})"),
        }
    }
}

impl serde::Serialize for Ease {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Ease {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
