// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tilt angle type and percent mapping.
//!
//! Pergola roof slats rotate through a device-native range of 0-125 degrees.
//! Consumers work with a normalized 0-100 percent scale instead, so this
//! module provides the conversion in both directions. Inputs are clamped,
//! never rejected, and the round-trip is lossy by design: the degrees side
//! keeps one decimal of precision.

use std::fmt;

/// Slat tilt angle in device-native degrees (0-125).
///
/// # Examples
///
/// ```
/// use pergor_lib::types::TiltAngle;
///
/// let tilt = TiltAngle::clamped(62.5);
/// assert_eq!(tilt.to_percent(), 50);
///
/// // Out-of-range inputs are clamped, not rejected
/// assert_eq!(TiltAngle::clamped(200.0), TiltAngle::MAX);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TiltAngle(f64);

impl TiltAngle {
    /// Fully closed slats (0 degrees).
    pub const MIN: Self = Self(0.0);

    /// Fully rotated slats (125 degrees).
    pub const MAX: Self = Self(125.0);

    /// The device-native tilt range in degrees.
    pub const RANGE_DEGREES: f64 = 125.0;

    /// Creates a tilt angle, clamping to the valid 0-125 degree range.
    ///
    /// Non-finite inputs collapse to 0 degrees.
    #[must_use]
    pub fn clamped(degrees: f64) -> Self {
        if degrees.is_finite() {
            Self(degrees.clamp(0.0, Self::RANGE_DEGREES))
        } else {
            Self::MIN
        }
    }

    /// Returns the angle in degrees.
    #[must_use]
    pub const fn degrees(&self) -> f64 {
        self.0
    }

    /// Converts the angle to a normalized percentage (0-100).
    ///
    /// Computed as `clamp(round(degrees / 125 * 100), 0, 100)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_percent(&self) -> u8 {
        // Safe: the clamp bounds the rounded value to [0, 100]
        (self.0 / Self::RANGE_DEGREES * 100.0).round().clamp(0.0, 100.0) as u8
    }

    /// Converts a normalized percentage (0-100, clamped) to a tilt angle.
    ///
    /// The resulting angle is rounded to one decimal of precision, so
    /// `from_percent(angle.to_percent())` is not guaranteed to reproduce
    /// `angle` exactly.
    #[must_use]
    pub fn from_percent(percent: u8) -> Self {
        let clamped = f64::from(percent.min(100));
        let degrees = clamped / 100.0 * Self::RANGE_DEGREES;
        Self((degrees * 10.0).round() / 10.0)
    }
}

impl fmt::Display for TiltAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_map_exactly() {
        assert_eq!(TiltAngle::MIN.to_percent(), 0);
        assert_eq!(TiltAngle::MAX.to_percent(), 100);
        assert_eq!(TiltAngle::from_percent(0), TiltAngle::MIN);
        assert_eq!(TiltAngle::from_percent(100), TiltAngle::MAX);
    }

    #[test]
    fn to_percent_is_monotonic_non_decreasing() {
        let mut previous = TiltAngle::clamped(0.0).to_percent();
        let mut degrees = 0.0;
        while degrees <= 125.0 {
            let percent = TiltAngle::clamped(degrees).to_percent();
            assert!(
                percent >= previous,
                "to_percent decreased at {degrees} degrees: {percent} < {previous}"
            );
            previous = percent;
            degrees += 0.1;
        }
    }

    #[test]
    fn from_percent_keeps_one_decimal() {
        // 33% of 125 is 41.25, rounded to one decimal
        let tilt = TiltAngle::from_percent(33);
        assert!((tilt.degrees() - 41.3).abs() < 1e-9);
    }

    #[test]
    fn from_percent_is_monotonic_non_decreasing() {
        let mut previous = TiltAngle::from_percent(0);
        for percent in 1..=100 {
            let tilt = TiltAngle::from_percent(percent);
            assert!(tilt >= previous);
            previous = tilt;
        }
    }

    #[test]
    fn inputs_are_clamped() {
        assert_eq!(TiltAngle::clamped(-10.0), TiltAngle::MIN);
        assert_eq!(TiltAngle::clamped(500.0), TiltAngle::MAX);
        assert_eq!(TiltAngle::from_percent(250), TiltAngle::MAX);
    }

    #[test]
    fn non_finite_collapses_to_zero() {
        assert_eq!(TiltAngle::clamped(f64::NAN), TiltAngle::MIN);
        assert_eq!(TiltAngle::clamped(f64::INFINITY), TiltAngle::MIN);
    }

    #[test]
    fn display() {
        assert_eq!(TiltAngle::clamped(41.24).to_string(), "41.2°");
        assert_eq!(TiltAngle::MAX.to_string(), "125.0°");
    }
}
