use std::fmt;
use std::str::FromStr;

use crate::foundation::core::{Rect, Viewport};
use crate::foundation::error::{ShowreelError, ShowreelResult};

/// A position along one vertical extent (the trigger region or the viewport).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Edge {
    Top,
    Center,
    Bottom,
    /// Percentage of the extent, measured from its top.
    Percent(f64),
    /// Pixels from the top of the extent.
    Pixels(f64),
}

impl Edge {
    /// Distance of this edge from the top of an extent of `extent` pixels.
    pub fn offset(self, extent: f64) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => extent / 2.0,
            Self::Bottom => extent,
            Self::Percent(p) => extent * p / 100.0,
            Self::Pixels(px) => px,
        }
    }

    fn parse(tok: &str) -> ShowreelResult<Self> {
        let number = |v: &str| -> ShowreelResult<f64> {
            let n: f64 = v
                .parse()
                .map_err(|_| ShowreelError::anchor(format!("unknown edge \"{tok}\"")))?;
            if !n.is_finite() {
                return Err(ShowreelError::anchor(format!("edge \"{tok}\" must be finite")));
            }
            Ok(n)
        };
        match tok {
            "top" => Ok(Self::Top),
            "center" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            _ => {
                if let Some(p) = tok.strip_suffix('%') {
                    Ok(Self::Percent(number(p)?))
                } else if let Some(px) = tok.strip_suffix("px") {
                    Ok(Self::Pixels(number(px)?))
                } else {
                    Ok(Self::Pixels(number(tok)?))
                }
            }
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("top"),
            Self::Center => f.write_str("center"),
            Self::Bottom => f.write_str("bottom"),
            Self::Percent(p) => write!(f, "{p}%"),
            Self::Pixels(px) => write!(f, "{px}px"),
        }
    }
}

/// Symbolic start/end condition of a trigger.
///
/// `"top 80%"` reads "when the region's top reaches 80% of the viewport height"; a bare number
/// is an absolute scroll offset in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Anchor {
    Pair { element: Edge, viewport: Edge },
    Absolute(f64),
}

impl Anchor {
    pub const fn pair(element: Edge, viewport: Edge) -> Self {
        Self::Pair { element, viewport }
    }

    /// `"top bottom"`: the region starts entering the viewport.
    pub const fn default_start() -> Self {
        Self::pair(Edge::Top, Edge::Bottom)
    }

    /// `"bottom top"`: the region has fully left through the top.
    pub const fn default_end() -> Self {
        Self::pair(Edge::Bottom, Edge::Top)
    }

    /// Scroll offset (pixels) at which this anchor is crossed for `region` in `viewport`.
    ///
    /// Depends on the viewport height, so it is recomputed on every refresh.
    pub fn threshold(&self, region: Rect, viewport: Viewport) -> f64 {
        match *self {
            Self::Pair { element, viewport: vp } => {
                region.y0 + element.offset(region.height()) - vp.offset(viewport.height)
            }
            Self::Absolute(px) => px,
        }
    }
}

impl FromStr for Anchor {
    type Err = ShowreelError;

    fn from_str(s: &str) -> ShowreelResult<Self> {
        let s = s.trim();
        if let Ok(px) = s.parse::<f64>() {
            if !px.is_finite() {
                return Err(ShowreelError::anchor("absolute anchor must be finite"));
            }
            return Ok(Self::Absolute(px));
        }
        let mut toks = s.split_whitespace();
        match (toks.next(), toks.next(), toks.next()) {
            (Some(e), Some(v), None) => Ok(Self::pair(Edge::parse(e)?, Edge::parse(v)?)),
            _ => Err(ShowreelError::anchor(format!(
                "expected \"<region edge> <viewport edge>\" or a pixel offset, got \"{s}\""
            ))),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pair { element, viewport } => write!(f, "{element} {viewport}"),
            Self::Absolute(px) => write!(f, "{px}"),
        }
    }
}

impl serde::Serialize for Anchor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absolute(px) => serializer.serialize_f64(*px),
            Self::Pair { .. } => serializer.collect_str(self),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Anchor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Px(f64),
            Str(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Px(px) if px.is_finite() => Ok(Self::Absolute(px)),
            Repr::Px(_) => Err(serde::de::Error::custom("absolute anchor must be finite")),
            Repr::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport::new(1000.0, 800.0).unwrap()
    }

    #[test]
    fn parses_site_anchors() {
        assert_eq!(
            "top 80%".parse::<Anchor>().unwrap(),
            Anchor::pair(Edge::Top, Edge::Percent(80.0))
        );
        assert_eq!(
            "bottom center".parse::<Anchor>().unwrap(),
            Anchor::pair(Edge::Bottom, Edge::Center)
        );
        assert_eq!("100".parse::<Anchor>().unwrap(), Anchor::Absolute(100.0));
        assert_eq!(
            "top 120px".parse::<Anchor>().unwrap(),
            Anchor::pair(Edge::Top, Edge::Pixels(120.0))
        );
        assert!("top".parse::<Anchor>().is_err());
        assert!("top middle".parse::<Anchor>().is_err());
        assert!("top 80% extra".parse::<Anchor>().is_err());
    }

    #[test]
    fn thresholds_follow_viewport_height() {
        let region = Rect::new(0.0, 2000.0, 1000.0, 2600.0);
        let top80: Anchor = "top 80%".parse().unwrap();
        assert_eq!(top80.threshold(region, vp()), 2000.0 - 640.0);
        let taller = Viewport::new(1000.0, 1000.0).unwrap();
        assert_eq!(top80.threshold(region, taller), 2000.0 - 800.0);

        assert_eq!(Anchor::default_start().threshold(region, vp()), 1200.0);
        assert_eq!(Anchor::default_end().threshold(region, vp()), 2600.0);
        let center: Anchor = "bottom center".parse().unwrap();
        assert_eq!(center.threshold(region, vp()), 2200.0);
        assert_eq!(Anchor::Absolute(100.0).threshold(region, vp()), 100.0);
    }

    #[test]
    fn serde_accepts_strings_and_numbers() {
        let a: Anchor = serde_json::from_str("\"top center\"").unwrap();
        assert_eq!(a, Anchor::pair(Edge::Top, Edge::Center));
        let b: Anchor = serde_json::from_str("100").unwrap();
        assert_eq!(b, Anchor::Absolute(100.0));
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"top center\"");
        assert!(serde_json::from_str::<Anchor>("\"sideways\"").is_err());
    }
}
