//! Eased tweens advanced by the frame clock
//!
//! Easing names follow the GSAP convention used by the page styling
//! (`power2.inOut` etc.), where `powerN` eases with an exponent of `N + 1`.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown easing curve: {0}")]
pub struct UnknownEase(pub String);

/// Easing curve applied to normalized tween progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
    Linear,
    /// Accelerating from zero velocity
    In(u8),
    /// Decelerating to zero velocity
    Out(u8),
    /// Accelerating until halfway, then decelerating
    InOut(u8),
}

impl Default for Ease {
    fn default() -> Self {
        Ease::InOut(2)
    }
}

impl Ease {
    /// Map linear progress `t` in `[0, 1]` onto the curve
    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::In(power) => t.powi(exponent(power)),
            Ease::Out(power) => 1.0 - (1.0 - t).powi(exponent(power)),
            Ease::InOut(power) => {
                let e = exponent(power);
                if t < 0.5 {
                    0.5 * (2.0 * t).powi(e)
                } else {
                    1.0 - 0.5 * (2.0 * (1.0 - t)).powi(e)
                }
            }
        }
    }
}

fn exponent(power: u8) -> i32 {
    i32::from(power) + 1
}

impl FromStr for Ease {
    type Err = UnknownEase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "linear" || lower == "none" || lower == "power0" {
            return Ok(Ease::Linear);
        }

        let rest = lower
            .strip_prefix("power")
            .ok_or_else(|| UnknownEase(s.to_string()))?;
        let (power, kind) = rest.split_once('.').unwrap_or((rest, "out"));
        let power: u8 = power.parse().map_err(|_| UnknownEase(s.to_string()))?;
        if power == 0 {
            return Ok(Ease::Linear);
        }
        if power > 4 {
            return Err(UnknownEase(s.to_string()));
        }

        match kind {
            "in" => Ok(Ease::In(power)),
            "out" => Ok(Ease::Out(power)),
            "inout" => Ok(Ease::InOut(power)),
            _ => Err(UnknownEase(s.to_string())),
        }
    }
}

impl TryFrom<String> for Ease {
    type Error = UnknownEase;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ease> for String {
    fn from(ease: Ease) -> Self {
        ease.to_string()
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ease::Linear => write!(f, "linear"),
            Ease::In(p) => write!(f, "power{}.in", p),
            Ease::Out(p) => write!(f, "power{}.out", p),
            Ease::InOut(p) => write!(f, "power{}.inOut", p),
        }
    }
}

/// Values that can be interpolated by a tween
pub trait Lerp: Copy {
    fn lerp_to(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp_to(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

/// A single running animation from one value to another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween<T: Lerp> {
    from: T,
    to: T,
    duration: f32,
    elapsed: f32,
    ease: Ease,
}

impl<T: Lerp> Tween<T> {
    pub fn new(from: T, to: T, duration_secs: f32, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration: duration_secs.max(0.0),
            elapsed: 0.0,
            ease,
        }
    }

    /// Advance the clock and return the value at the new time
    pub fn advance(&mut self, dt_secs: f32) -> T {
        self.elapsed = (self.elapsed + dt_secs.max(0.0)).min(self.duration);
        self.value()
    }

    pub fn value(&self) -> T {
        self.from.lerp_to(self.to, self.ease.sample(self.progress()))
    }

    /// Linear progress in `[0, 1]`
    pub fn progress(&self) -> f32 {
        if self.duration <= f32::EPSILON {
            1.0
        } else {
            self.elapsed / self.duration
        }
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    pub fn target(&self) -> T {
        self.to
    }
}
