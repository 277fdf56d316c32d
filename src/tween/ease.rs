//! Easing curves
//!
//! Names follow the `family.mode` convention used in site markup and config
//! (`"power3.out"`, `"elastic.out(1, 0.4)"`, `"none"`).

use std::f32::consts::{FRAC_PI_2, TAU};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MotionError;

/// Which end of the curve is eased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EaseMode {
    In,
    #[default]
    Out,
    InOut,
}

impl EaseMode {
    fn as_str(&self) -> &'static str {
        match self {
            EaseMode::In => "in",
            EaseMode::Out => "out",
            EaseMode::InOut => "inOut",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(EaseMode::In),
            "out" => Some(EaseMode::Out),
            "inOut" | "inout" => Some(EaseMode::InOut),
            _ => None,
        }
    }
}

/// An easing curve mapping linear progress in [0, 1] to eased progress
///
/// Elastic curves overshoot, so results can leave [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
    /// Linear
    None,
    /// Polynomial; `power1` is quadratic up to `power4` quintic
    Power { power: u8, mode: EaseMode },
    Sine(EaseMode),
    Elastic {
        mode: EaseMode,
        amplitude: f32,
        period: f32,
    },
}

impl Default for Ease {
    fn default() -> Self {
        Ease::Power {
            power: 1,
            mode: EaseMode::Out,
        }
    }
}

impl Ease {
    pub const LINEAR: Ease = Ease::None;
    pub const POWER2_OUT: Ease = Ease::Power {
        power: 2,
        mode: EaseMode::Out,
    };
    pub const POWER3_OUT: Ease = Ease::Power {
        power: 3,
        mode: EaseMode::Out,
    };

    /// Elastic curve with the conventional defaults for missing parameters
    pub fn elastic(mode: EaseMode, amplitude: f32, period: f32) -> Self {
        Ease::Elastic {
            mode,
            amplitude,
            period,
        }
    }

    /// Evaluate the curve at `t` (clamped to [0, 1])
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Ease::None => t,
            Ease::Power { power, mode } => {
                let exponent = i32::from(power) + 1;
                with_mode(mode, t, |p| 1.0 - (1.0 - p).powi(exponent))
            }
            Ease::Sine(mode) => with_mode(mode, t, |p| (p * FRAC_PI_2).sin()),
            Ease::Elastic {
                mode,
                amplitude,
                period,
            } => with_mode(mode, t, |p| elastic_out(p, amplitude, period)),
        }
    }
}

/// Build in/inOut variants from an ease-out curve
fn with_mode(mode: EaseMode, t: f32, out: impl Fn(f32) -> f32) -> f32 {
    match mode {
        EaseMode::Out => out(t),
        EaseMode::In => 1.0 - out(1.0 - t),
        EaseMode::InOut => {
            if t < 0.5 {
                (1.0 - out(1.0 - 2.0 * t)) / 2.0
            } else {
                out(2.0 * t - 1.0) / 2.0 + 0.5
            }
        }
    }
}

fn elastic_out(t: f32, amplitude: f32, period: f32) -> f32 {
    if t >= 1.0 {
        return 1.0;
    }
    let a = amplitude.max(1.0);
    let period = if period > 0.0 { period } else { 0.3 };
    let shift = period / TAU * (1.0 / a).asin();
    a * 2f32.powf(-10.0 * t) * ((t - shift) * TAU / period).sin() + 1.0
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ease::None => write!(f, "none"),
            Ease::Power { power, mode } => write!(f, "power{}.{}", power, mode.as_str()),
            Ease::Sine(mode) => write!(f, "sine.{}", mode.as_str()),
            Ease::Elastic {
                mode,
                amplitude,
                period,
            } => write!(f, "elastic.{}({}, {})", mode.as_str(), amplitude, period),
        }
    }
}

impl FromStr for Ease {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MotionError::InvalidEase(s.to_string());
        let trimmed = s.trim();
        if matches!(trimmed, "none" | "linear") {
            return Ok(Ease::None);
        }

        // Split "elastic.out(1, 0.4)" into name, mode and argument list
        let (head, args) = match trimmed.find('(') {
            Some(open) => {
                let close = trimmed.rfind(')').ok_or_else(invalid)?;
                (&trimmed[..open], Some(&trimmed[open + 1..close]))
            }
            None => (trimmed, None),
        };
        let (family, mode) = match head.split_once('.') {
            Some((family, mode)) => (family, EaseMode::parse(mode).ok_or_else(invalid)?),
            None => (head, EaseMode::Out),
        };

        let params: Vec<f32> = match args {
            Some(list) if !list.trim().is_empty() => list
                .split(',')
                .map(|p| p.trim().parse::<f32>().map_err(|_| invalid()))
                .collect::<Result<_, _>>()?,
            _ => Vec::new(),
        };

        match family {
            "power0" => Ok(Ease::None),
            "power1" | "power2" | "power3" | "power4" if params.is_empty() => {
                let power = family[5..].parse::<u8>().map_err(|_| invalid())?;
                Ok(Ease::Power { power, mode })
            }
            "quad" => Ok(Ease::Power { power: 1, mode }),
            "cubic" => Ok(Ease::Power { power: 2, mode }),
            "quart" => Ok(Ease::Power { power: 3, mode }),
            "quint" => Ok(Ease::Power { power: 4, mode }),
            "sine" if params.is_empty() => Ok(Ease::Sine(mode)),
            "elastic" if params.len() <= 2 => Ok(Ease::Elastic {
                mode,
                amplitude: params.first().copied().unwrap_or(1.0),
                period: params.get(1).copied().unwrap_or(0.3),
            }),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Ease {
    type Error = MotionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ease> for String {
    fn from(ease: Ease) -> Self {
        ease.to_string()
    }
}
