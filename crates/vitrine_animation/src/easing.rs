//! Easing curves
//!
//! Curves follow the GSAP naming the site's motion design was written in:
//! `powerN` is a polynomial of degree `N + 1`, `back.out(s)` overshoots by `s`.
//! Names parse with [`str::parse`] and round-trip through [`Display`](std::fmt::Display),
//! which is also how they are (de)serialized in configuration files.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Easing parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown easing '{0}'")]
pub struct EasingParseError(pub String);

/// An easing curve mapping linear progress (0..=1) to eased progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    #[default]
    Linear,
    /// `powerN.in`
    PowerIn(u8),
    /// `powerN.out`
    PowerOut(u8),
    /// `powerN.inOut`
    PowerInOut(u8),
    SineIn,
    SineOut,
    SineInOut,
    /// `back.out(overshoot)`
    BackOut(f32),
    /// CSS `cubic-bezier(x1, y1, x2, y2)`
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// CSS `ease-in`
    pub const EASE_IN: Easing = Easing::CubicBezier(0.42, 0.0, 1.0, 1.0);
    /// CSS `ease-out`
    pub const EASE_OUT: Easing = Easing::CubicBezier(0.0, 0.0, 0.58, 1.0);
    /// CSS `ease-in-out`
    pub const EASE_IN_OUT: Easing = Easing::CubicBezier(0.42, 0.0, 0.58, 1.0);

    /// Apply the curve to linear progress `t`
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::PowerIn(n) => t.powi(n as i32 + 1),
            Easing::PowerOut(n) => 1.0 - (1.0 - t).powi(n as i32 + 1),
            Easing::PowerInOut(n) => {
                let p = n as i32 + 1;
                if t < 0.5 {
                    0.5 * (2.0 * t).powi(p)
                } else {
                    1.0 - 0.5 * (2.0 * (1.0 - t)).powi(p)
                }
            }
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Easing::BackOut(s) => {
                let u = t - 1.0;
                1.0 + (s + 1.0) * u * u * u + s * u * u
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(t, x1, y1, x2, y2),
        }
    }
}

/// Solve a CSS cubic bezier for `x = t` and return `y`
fn cubic_bezier(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if t <= 0.0 || t >= 1.0 {
        return t;
    }

    let sample = |a1: f32, a2: f32, s: f32| {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * a1 + 3.0 * inv * s * s * a2 + s * s * s
    };
    let slope = |a1: f32, a2: f32, s: f32| {
        let inv = 1.0 - s;
        3.0 * inv * inv * a1 + 6.0 * inv * s * (a2 - a1) + 3.0 * s * s * (1.0 - a2)
    };

    // Newton-Raphson, falling back to bisection on flat slopes
    let mut s = t;
    for _ in 0..8 {
        let x = sample(x1, x2, s) - t;
        if x.abs() < 1e-5 {
            return sample(y1, y2, s);
        }
        let d = slope(x1, x2, s);
        if d.abs() < 1e-6 {
            break;
        }
        s -= x / d;
    }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    s = t;
    for _ in 0..32 {
        let x = sample(x1, x2, s);
        if (x - t).abs() < 1e-5 {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    sample(y1, y2, s)
}

impl FromStr for Easing {
    type Err = EasingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || EasingParseError(s.to_string());
        let name = s.trim();

        match name {
            "none" | "linear" => return Ok(Easing::Linear),
            "ease-in" => return Ok(Easing::EASE_IN),
            "ease-out" => return Ok(Easing::EASE_OUT),
            "ease-in-out" => return Ok(Easing::EASE_IN_OUT),
            _ => {}
        }

        if let Some(args) = name
            .strip_prefix("cubic-bezier(")
            .and_then(|r| r.strip_suffix(')'))
        {
            let values: Vec<f32> = args
                .split(',')
                .map(|v| v.trim().parse::<f32>())
                .collect::<Result<_, _>>()
                .map_err(|_| err())?;
            return match values.as_slice() {
                [x1, y1, x2, y2] => Ok(Easing::CubicBezier(*x1, *y1, *x2, *y2)),
                _ => Err(err()),
            };
        }

        let (family, mode) = name.split_once('.').unwrap_or((name, "out"));

        if let Some(rest) = family.strip_prefix("power") {
            let n: u8 = rest.parse().map_err(|_| err())?;
            if n == 0 {
                return Ok(Easing::Linear);
            }
            if n > 4 {
                return Err(err());
            }
            return match mode {
                "in" => Ok(Easing::PowerIn(n)),
                "out" => Ok(Easing::PowerOut(n)),
                "inOut" => Ok(Easing::PowerInOut(n)),
                _ => Err(err()),
            };
        }

        match family {
            "sine" => match mode {
                "in" => Ok(Easing::SineIn),
                "out" => Ok(Easing::SineOut),
                "inOut" => Ok(Easing::SineInOut),
                _ => Err(err()),
            },
            "back" => {
                if mode == "out" {
                    return Ok(Easing::BackOut(1.70158));
                }
                let overshoot = mode
                    .strip_prefix("out(")
                    .and_then(|r| r.strip_suffix(')'))
                    .ok_or_else(err)?;
                overshoot
                    .trim()
                    .parse::<f32>()
                    .map(Easing::BackOut)
                    .map_err(|_| err())
            }
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Linear => f.write_str("none"),
            Easing::PowerIn(n) => write!(f, "power{n}.in"),
            Easing::PowerOut(n) => write!(f, "power{n}.out"),
            Easing::PowerInOut(n) => write!(f, "power{n}.inOut"),
            Easing::SineIn => f.write_str("sine.in"),
            Easing::SineOut => f.write_str("sine.out"),
            Easing::SineInOut => f.write_str("sine.inOut"),
            Easing::BackOut(s) => write!(f, "back.out({s})"),
            Easing::CubicBezier(a, b, c, d) => write!(f, "cubic-bezier({a}, {b}, {c}, {d})"),
        }
    }
}

impl TryFrom<String> for Easing {
    type Error = EasingParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Easing> for String {
    fn from(value: Easing) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 9] = [
        Easing::Linear,
        Easing::PowerIn(2),
        Easing::PowerOut(2),
        Easing::PowerInOut(3),
        Easing::SineIn,
        Easing::SineOut,
        Easing::SineInOut,
        Easing::BackOut(1.7),
        Easing::EASE_IN_OUT,
    ];

    #[test]
    fn test_endpoints_are_fixed() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-4, "{easing} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-4, "{easing} at 1");
        }
    }

    #[test]
    fn test_out_curves_lead_linear() {
        assert!(Easing::PowerOut(2).apply(0.3) > 0.3);
        assert!(Easing::PowerIn(2).apply(0.3) < 0.3);
        assert!(Easing::SineOut.apply(0.3) > 0.3);
    }

    #[test]
    fn test_back_out_overshoots() {
        let peak = (1..100)
            .map(|i| Easing::BackOut(1.7).apply(i as f32 / 100.0))
            .fold(0.0f32, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_cubic_bezier_is_monotonic_for_css_ease() {
        let mut last = 0.0;
        for i in 1..=20 {
            let v = Easing::EASE_IN_OUT.apply(i as f32 / 20.0);
            assert!(v >= last);
            last = v;
        }
        assert!((Easing::EASE_IN_OUT.apply(0.5) - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_parse_gsap_names() {
        assert_eq!("power2.out".parse::<Easing>(), Ok(Easing::PowerOut(2)));
        assert_eq!("power3.inOut".parse::<Easing>(), Ok(Easing::PowerInOut(3)));
        assert_eq!("sine.inOut".parse::<Easing>(), Ok(Easing::SineInOut));
        assert_eq!("back.out(1.7)".parse::<Easing>(), Ok(Easing::BackOut(1.7)));
        assert_eq!("none".parse::<Easing>(), Ok(Easing::Linear));
        assert_eq!("power1".parse::<Easing>(), Ok(Easing::PowerOut(1)));
        assert!("elastic.out".parse::<Easing>().is_err());
        assert!("power9.in".parse::<Easing>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for easing in ALL {
            assert_eq!(easing.to_string().parse::<Easing>(), Ok(easing));
        }
    }
}
