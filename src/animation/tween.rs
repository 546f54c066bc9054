use crate::animation::ease::Ease;
use crate::foundation::core::Point;
use crate::foundation::error::{ShowreelError, ShowreelResult};
use crate::page::surface::Prop;

/// GSAP's default tween duration, in seconds.
pub const DEFAULT_DURATION: f64 = 0.5;

pub trait Lerp: Sized {
    /// Interpolate from `a` to `b`; `t == 0` and `t == 1` return the endpoints exactly.
    ///
    /// `t` outside `[0, 1]` extrapolates (overshooting eases rely on it).
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        if t == 0.0 {
            *a
        } else if t == 1.0 {
            *b
        } else {
            a + (b - a) * t
        }
    }
}

impl Lerp for Point {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Point::new(
            <f64 as Lerp>::lerp(&a.x, &b.x, t),
            <f64 as Lerp>::lerp(&a.y, &b.y, t),
        )
    }
}

/// One animated property. `from: None` resolves to the current value when the tween starts.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    pub prop: Prop,
    #[serde(default)]
    pub from: Option<f64>,
    pub to: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    #[default]
    Once,
    Forever,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TweenPhase {
    /// Still inside the start delay.
    Pending,
    Running,
    Done,
}

/// Sampled state of a tween at some elapsed time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TweenSample {
    pub phase: TweenPhase,
    /// Un-eased time progress in `[0, 1]`.
    pub linear: f64,
    /// Eased progress (may overshoot for `BackOut`).
    pub eased: f64,
}

/// Interpolates a set of properties over `duration` seconds after `delay`.
///
/// Sampling is pure: the same elapsed time always yields the same sample. The ticker owns the
/// clock and the mutation of the surface.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tween {
    pub tracks: Vec<Track>,
    pub duration: f64,
    #[serde(default)]
    pub delay: f64,
    pub ease: Ease,
    #[serde(default)]
    pub repeat: Repeat,
}

impl Tween {
    /// Animate `prop` from its current value to `to`.
    pub fn to(prop: Prop, to: f64) -> Self {
        Self::idle(DEFAULT_DURATION).and(prop, to)
    }

    pub fn from_to(prop: Prop, from: f64, to: f64) -> Self {
        Self::idle(DEFAULT_DURATION).and_from_to(prop, from, to)
    }

    /// A tween with no tracks: only time progress and callbacks (`gsap.to({}, ...)`).
    pub fn idle(duration: f64) -> Self {
        Self {
            tracks: Vec::new(),
            duration,
            delay: 0.0,
            ease: Ease::OutQuad,
            repeat: Repeat::Once,
        }
    }

    pub fn and(mut self, prop: Prop, to: f64) -> Self {
        self.tracks.push(Track {
            prop,
            from: None,
            to,
        });
        self
    }

    pub fn and_from_to(mut self, prop: Prop, from: f64, to: f64) -> Self {
        self.tracks.push(Track {
            prop,
            from: Some(from),
            to,
        });
        self
    }

    pub fn duration(mut self, secs: f64) -> Self {
        self.duration = secs;
        self
    }

    pub fn delay(mut self, secs: f64) -> Self {
        self.delay = secs;
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn repeat_forever(mut self) -> Self {
        self.repeat = Repeat::Forever;
        self
    }

    pub fn validate(&self) -> ShowreelResult<()> {
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(ShowreelError::validation(
                "tween duration must be finite and >= 0",
            ));
        }
        if !(self.delay.is_finite() && self.delay >= 0.0) {
            return Err(ShowreelError::validation(
                "tween delay must be finite and >= 0",
            ));
        }
        if self.repeat == Repeat::Forever && self.duration == 0.0 {
            return Err(ShowreelError::validation(
                "a repeating tween needs a non-zero duration",
            ));
        }
        if self
            .tracks
            .iter()
            .any(|t| !t.to.is_finite() || t.from.is_some_and(|f| !f.is_finite()))
        {
            return Err(ShowreelError::validation("tween values must be finite"));
        }
        Ok(())
    }

    /// Time at which the tween completes, or `None` if it repeats forever.
    pub fn end_time(&self) -> Option<f64> {
        match self.repeat {
            Repeat::Once => Some(self.delay + self.duration),
            Repeat::Forever => None,
        }
    }

    pub fn sample(&self, elapsed: f64) -> TweenSample {
        let local = elapsed - self.delay;
        if local < 0.0 {
            return TweenSample {
                phase: TweenPhase::Pending,
                linear: 0.0,
                eased: 0.0,
            };
        }
        if self.duration <= 0.0 {
            return TweenSample {
                phase: TweenPhase::Done,
                linear: 1.0,
                eased: 1.0,
            };
        }

        let (phase, linear) = match self.repeat {
            Repeat::Once if local >= self.duration => (TweenPhase::Done, 1.0),
            Repeat::Once => (TweenPhase::Running, local / self.duration),
            Repeat::Forever => (
                TweenPhase::Running,
                (local % self.duration) / self.duration,
            ),
        };
        TweenSample {
            phase,
            linear,
            eased: self.ease.apply(linear),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_respects_delay_and_completion() {
        let t = Tween::from_to(Prop::Opacity, 0.0, 1.0)
            .duration(1.0)
            .delay(0.5)
            .ease(Ease::Linear);
        assert_eq!(t.sample(0.2).phase, TweenPhase::Pending);
        let mid = t.sample(1.0);
        assert_eq!(mid.phase, TweenPhase::Running);
        assert!((mid.linear - 0.5).abs() < 1e-12);
        assert_eq!(t.sample(1.5).phase, TweenPhase::Done);
        assert_eq!(t.sample(9.0).eased, 1.0);
        assert_eq!(t.end_time(), Some(1.5));
    }

    #[test]
    fn zero_duration_completes_after_delay() {
        let t = Tween::idle(0.0).delay(3.5);
        assert_eq!(t.sample(3.4).phase, TweenPhase::Pending);
        assert_eq!(t.sample(3.5).phase, TweenPhase::Done);
    }

    #[test]
    fn forever_wraps_and_never_finishes() {
        let t = Tween::to(Prop::RotateY, std::f64::consts::TAU)
            .duration(20.0)
            .ease(Ease::Linear)
            .repeat_forever();
        let s = t.sample(25.0);
        assert_eq!(s.phase, TweenPhase::Running);
        assert!((s.linear - 0.25).abs() < 1e-12);
        assert_eq!(t.end_time(), None);
    }

    #[test]
    fn validate_rejects_bad_timing() {
        assert!(Tween::idle(-1.0).validate().is_err());
        assert!(Tween::idle(1.0).delay(f64::NAN).validate().is_err());
        assert!(Tween::idle(0.0).repeat_forever().validate().is_err());
        assert!(Tween::to(Prop::Opacity, f64::INFINITY).validate().is_err());
        assert!(Tween::to(Prop::Opacity, 1.0).validate().is_ok());
    }

    #[test]
    fn lerp_hits_endpoints_exactly() {
        assert_eq!(<f64 as Lerp>::lerp(&0.1, &0.3, 1.0), 0.3);
        assert_eq!(<f64 as Lerp>::lerp(&0.1, &0.3, 0.0), 0.1);
        assert!(<f64 as Lerp>::lerp(&0.0, &1.0, 1.1) > 1.0);
        let p = <Point as Lerp>::lerp(&Point::new(0.0, 0.0), &Point::new(10.0, 20.0), 0.5);
        assert_eq!(p, Point::new(5.0, 10.0));
    }
}
