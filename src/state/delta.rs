// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Partial state updates.
//!
//! A [`StateDelta`] is the single merge input for both data sources: a REST
//! status body deserializes into one directly, and a push event's `data`
//! record does the same. Every field is optional; a delta only ever says
//! "these fields changed", never "the others are gone".

use serde::Deserialize;

use crate::types::{MotionDirection, StackScale, TiltAngle};

/// Roof drive status as pushed in `SKYE2_STATUS_CHANGED` events.
///
/// REST status responses do not include this record on all firmware
/// versions, which is why it is merged sticky.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoofDeviceStatus {
    /// Drive state, e.g. "idle" or "moving".
    pub state: String,

    /// Motion direction, meaningful while the drive is moving.
    pub direction: MotionDirection,
}

impl RoofDeviceStatus {
    /// Drive state value reported while the roof is in motion.
    pub const MOVING: &'static str = "moving";

    /// Returns `true` if the drive reports itself as moving.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.state == Self::MOVING
    }
}

/// Roof positions as reported by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct RoofPositions {
    /// Slide position; scale depends on firmware, see [`StackScale`].
    #[serde(default)]
    pub stack: Option<f64>,

    /// Slat tilt in device-native degrees (0-125).
    #[serde(default)]
    pub tilt: Option<f64>,
}

/// A partial update to the roof state.
///
/// # Examples
///
/// ```
/// use pergor_lib::state::StateDelta;
///
/// let json = r#"{"state":"moving","current_roof_positions":{"stack":40.0}}"#;
/// let delta: StateDelta = serde_json::from_str(json).unwrap();
/// assert_eq!(delta.state.as_deref(), Some("moving"));
/// assert!(delta.locked.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StateDelta {
    /// Overall device state ("ready", "moving", "homing", "error", ...).
    #[serde(default)]
    pub state: Option<String>,

    /// Current roof positions.
    #[serde(default)]
    pub current_roof_positions: Option<RoofPositions>,

    /// Whether the roof is locked.
    #[serde(default)]
    pub locked: Option<bool>,

    /// Drive status, only present in push events.
    #[serde(default)]
    pub roof_device: Option<RoofDeviceStatus>,

    /// Weather state detected by the device.
    #[serde(default)]
    pub weather_state: Option<String>,
}

impl StateDelta {
    /// Normalizes position values: stack to the 0-100 scale per the
    /// configured convention, tilt clamped to the 0-125 degree range.
    #[must_use]
    pub fn normalized(mut self, scale: StackScale) -> Self {
        if let Some(positions) = self.current_roof_positions.as_mut() {
            if let Some(stack) = positions.stack {
                positions.stack = Some(scale.normalize(stack));
            }
            if let Some(tilt) = positions.tilt {
                positions.tilt = Some(TiltAngle::clamped(tilt).degrees());
            }
        }
        self
    }
}
