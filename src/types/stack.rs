// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stack value scale conventions.
//!
//! Device firmware generations disagree on how the slide position is
//! reported: newer responses use a 0-100 percentage, older ones a 0-1
//! fraction. The scale is a per-device configuration knob rather than a
//! hardcoded assumption; ingested values are normalized to 0-100 either way.

/// Scale convention for the `stack` value reported by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StackScale {
    /// Stack is reported as a 0-100 percentage (current firmware).
    #[default]
    Percent,

    /// Stack is reported as a 0-1 fraction (older firmware).
    Fraction,
}

impl StackScale {
    /// Normalizes a raw stack value to the 0-100 percentage scale.
    ///
    /// The result is clamped to [0, 100]; non-finite inputs collapse to 0.
    #[must_use]
    pub fn normalize(self, raw: f64) -> f64 {
        let scaled = match self {
            Self::Percent => raw,
            Self::Fraction => raw * 100.0,
        };
        if scaled.is_finite() {
            scaled.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}
