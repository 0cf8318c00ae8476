//! Volume ramp curves
//!
//! Curves map a normalized position through a ramp (0.0 at the start, 1.0 at
//! the end) to a gain multiplier. The audio director uses them to duck music
//! under a voice-over and restore it afterwards.

use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};
use std::str::FromStr;

/// Curve shape of a volume ramp
///
/// - Linear: constant rate of change
/// - Exponential: slow start, fast finish
/// - Logarithmic: fast start, slow finish
/// - SCurve: smooth acceleration and deceleration
/// - EqualPower: constant perceived loudness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// v(t) = t
    #[default]
    Linear,
    /// v(t) = t²
    Exponential,
    /// v(t) = 1 - (1-t)²
    Logarithmic,
    /// v(t) = 0.5 × (1 - cos(π × t))
    #[serde(alias = "cosine")]
    SCurve,
    /// v(t) = sin(t × π/2)
    EqualPower,
}

impl FadeCurve {
    /// Rising multiplier (0.0 → 1.0) at `position`
    pub fn calculate_fade_in(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::Exponential => t * t,
            FadeCurve::Logarithmic => {
                let inv = 1.0 - t;
                1.0 - inv * inv
            }
            FadeCurve::SCurve => 0.5 * (1.0 - (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Falling multiplier (1.0 → 0.0) at `position`
    pub fn calculate_fade_out(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::Exponential => {
                let inv = 1.0 - t;
                inv * inv
            }
            FadeCurve::Logarithmic => 1.0 - t * t,
            FadeCurve::SCurve => 0.5 * (1.0 + (PI * t).cos()),
            FadeCurve::EqualPower => (t * FRAC_PI_2).cos(),
        }
    }

    /// Volume at `position` of a ramp from `from` to `to`
    ///
    /// Rising ramps follow the fade-in shape and falling ramps the fade-out
    /// shape, so both ends are hit exactly.
    pub fn interpolate(&self, from: f32, to: f32, position: f32) -> f32 {
        if to >= from {
            from + (to - from) * self.calculate_fade_in(position)
        } else {
            to + (from - to) * self.calculate_fade_out(position)
        }
    }

    /// Canonical configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::Exponential => "exponential",
            FadeCurve::Logarithmic => "logarithmic",
            FadeCurve::SCurve => "s_curve",
            FadeCurve::EqualPower => "equal_power",
        }
    }

    /// All curve variants
    pub fn all_variants() -> &'static [FadeCurve] {
        &[
            FadeCurve::Linear,
            FadeCurve::Exponential,
            FadeCurve::Logarithmic,
            FadeCurve::SCurve,
            FadeCurve::EqualPower,
        ]
    }
}

impl FromStr for FadeCurve {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(FadeCurve::Linear),
            "exponential" => Ok(FadeCurve::Exponential),
            "logarithmic" => Ok(FadeCurve::Logarithmic),
            "cosine" | "scurve" | "s-curve" | "s_curve" => Ok(FadeCurve::SCurve),
            "equal_power" | "equalpower" => Ok(FadeCurve::EqualPower),
            other => Err(crate::Error::InvalidInput(format!("unknown fade curve '{}'", other))),
        }
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_in_bounds() {
        for curve in FadeCurve::all_variants() {
            let start_val = curve.calculate_fade_in(0.0);
            let end_val = curve.calculate_fade_in(1.0);
            assert!(start_val.abs() < 0.01, "{:?} fade-in at 0.0 = {}", curve, start_val);
            assert!((end_val - 1.0).abs() < 0.01, "{:?} fade-in at 1.0 = {}", curve, end_val);
        }
    }

    #[test]
    fn test_fade_out_bounds() {
        for curve in FadeCurve::all_variants() {
            let start_val = curve.calculate_fade_out(0.0);
            let end_val = curve.calculate_fade_out(1.0);
            assert!((start_val - 1.0).abs() < 0.01, "{:?} fade-out at 0.0 = {}", curve, start_val);
            assert!(end_val.abs() < 0.01, "{:?} fade-out at 1.0 = {}", curve, end_val);
        }
    }

    #[test]
    fn test_curves_are_monotonic() {
        for curve in FadeCurve::all_variants() {
            let mut prev_in = curve.calculate_fade_in(0.0);
            let mut prev_out = curve.calculate_fade_out(0.0);
            for step in 1..=20 {
                let t = step as f32 / 20.0;
                let v_in = curve.calculate_fade_in(t);
                let v_out = curve.calculate_fade_out(t);
                assert!(v_in >= prev_in - 1e-6, "{:?} fade-in not monotonic at {}", curve, t);
                assert!(v_out <= prev_out + 1e-6, "{:?} fade-out not monotonic at {}", curve, t);
                prev_in = v_in;
                prev_out = v_out;
            }
        }
    }

    #[test]
    fn test_interpolate_duck_and_restore() {
        let curve = FadeCurve::Linear;
        assert!((curve.interpolate(1.0, 0.1, 0.0) - 1.0).abs() < 1e-6);
        assert!((curve.interpolate(1.0, 0.1, 0.5) - 0.55).abs() < 1e-6);
        assert!((curve.interpolate(1.0, 0.1, 1.0) - 0.1).abs() < 1e-6);
        assert!((curve.interpolate(0.1, 1.0, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_interpolate_hits_endpoints_for_all_curves() {
        for curve in FadeCurve::all_variants() {
            assert!((curve.interpolate(0.8, 0.2, 1.0) - 0.2).abs() < 1e-3, "{:?}", curve);
            assert!((curve.interpolate(0.2, 0.8, 1.0) - 0.8).abs() < 1e-3, "{:?}", curve);
        }
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("cosine".parse::<FadeCurve>().unwrap(), FadeCurve::SCurve);
        assert_eq!("LINEAR".parse::<FadeCurve>().unwrap(), FadeCurve::Linear);
        assert!("wobbly".parse::<FadeCurve>().is_err());
    }
}
