use std::str::FromStr;

use crate::animation::ticker::{Owner, Ticker, TweenId, TweenTarget};
use crate::animation::tween::Tween;
use crate::foundation::error::{ShowreelError, ShowreelResult};

/// Where a child is placed on a [`Timeline`], in GSAP's position-parameter terms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Position {
    /// Right after the current end of the timeline.
    End,
    /// Relative to the current end (`"-=0.3"` is `Relative(-0.3)`).
    Relative(f64),
    /// Absolute time from the timeline start.
    At(f64),
}

impl FromStr for Position {
    type Err = ShowreelError;

    fn from_str(s: &str) -> ShowreelResult<Self> {
        let s = s.trim();
        let parse = |v: &str| -> ShowreelResult<f64> {
            let v: f64 = v
                .trim()
                .parse()
                .map_err(|_| ShowreelError::validation(format!("invalid position \"{s}\"")))?;
            if !v.is_finite() {
                return Err(ShowreelError::validation("position must be finite"));
            }
            Ok(v)
        };
        if s.is_empty() || s == ">" {
            Ok(Self::End)
        } else if let Some(v) = s.strip_prefix("-=") {
            Ok(Self::Relative(-parse(v)?))
        } else if let Some(v) = s.strip_prefix("+=") {
            Ok(Self::Relative(parse(v)?))
        } else {
            Ok(Self::At(parse(s)?))
        }
    }
}

/// A sequence of tweens positioned in absolute time, played through the shared ticker.
///
/// Children are flattened into plain tweens whose delay encodes their start time, so the ticker
/// needs no notion of nesting.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    children: Vec<(TweenTarget, Tween)>,
    end: f64,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one tween. Its own delay is applied on top of the resolved position.
    pub fn add(&mut self, target: TweenTarget, tween: Tween, pos: Position) -> &mut Self {
        self.add_staggered(&[target], tween, 0.0, pos)
    }

    /// Add the same tween for every target, the i-th offset by `i * stagger`.
    pub fn add_staggered(
        &mut self,
        targets: &[TweenTarget],
        tween: Tween,
        stagger: f64,
        pos: Position,
    ) -> &mut Self {
        let at = match pos {
            Position::End => self.end,
            Position::Relative(d) => (self.end + d).max(0.0),
            Position::At(t) => t.max(0.0),
        };
        for (i, target) in targets.iter().enumerate() {
            let start = at + tween.delay + stagger * i as f64;
            let child = tween.clone().delay(start);
            if let Some(end) = child.end_time() {
                self.end = self.end.max(end);
            }
            self.children.push((*target, child));
        }
        self
    }

    /// Total duration of the non-repeating children.
    pub fn duration(&self) -> f64 {
        self.end
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Start time of every child, in insertion order.
    pub fn start_times(&self) -> Vec<f64> {
        self.children.iter().map(|(_, t)| t.delay).collect()
    }

    /// Hand every child to the ticker under `owner`.
    pub fn play(self, ticker: &Ticker, owner: Owner) -> ShowreelResult<Vec<TweenId>> {
        self.children
            .into_iter()
            .map(|(target, tween)| ticker.start(owner, target, tween))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::document::ElementId;
    use crate::page::surface::Prop;

    fn el(i: u32) -> TweenTarget {
        TweenTarget::Element(ElementId(i))
    }

    #[test]
    fn positions_parse() {
        assert_eq!("-=0.3".parse::<Position>().unwrap(), Position::Relative(-0.3));
        assert_eq!("+=1".parse::<Position>().unwrap(), Position::Relative(1.0));
        assert_eq!("2".parse::<Position>().unwrap(), Position::At(2.0));
        assert_eq!("".parse::<Position>().unwrap(), Position::End);
        assert!("-=x".parse::<Position>().is_err());
    }

    #[test]
    fn overlapping_sequence_matches_hero_layout() {
        let mut tl = Timeline::new();
        tl.add_staggered(
            &[el(0), el(1), el(2)],
            Tween::to(Prop::Opacity, 1.0).duration(0.8).delay(0.5),
            0.05,
            Position::End,
        );
        // letters end at 0.5 + 0.1 + 0.8 = 1.4
        tl.add(el(3), Tween::to(Prop::Opacity, 1.0).duration(1.0), Position::Relative(-0.3));
        // subtitle 1.1 .. 2.1
        tl.add(el(4), Tween::to(Prop::Scale, 1.0).duration(0.8), Position::Relative(-0.5));

        let starts = tl.start_times();
        assert!((starts[0] - 0.5).abs() < 1e-12);
        assert!((starts[2] - 0.6).abs() < 1e-12);
        assert!((starts[3] - 1.1).abs() < 1e-12);
        assert!((starts[4] - 1.6).abs() < 1e-12);
        assert!((tl.duration() - 2.4).abs() < 1e-12);
    }

    #[test]
    fn play_hands_children_to_ticker() {
        let ticker = Ticker::new(crate::page::surface::Surface::new());
        let owner = ticker.owner();
        let mut tl = Timeline::new();
        tl.add(el(0), Tween::to(Prop::Opacity, 0.0), Position::End);
        tl.add(el(1), Tween::to(Prop::Opacity, 0.0), Position::End);
        let ids = tl.play(&ticker, owner).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ticker.owned_by(owner), 2);
    }
}
