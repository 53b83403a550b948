// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roof state tracking.

use chrono::{DateTime, Utc};

use super::{RoofDeviceStatus, StateDelta};

/// Which data source produced the most recent merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    /// A REST status poll.
    Rest,
    /// A WebSocket push event.
    Push,
}

/// Tracked state of a pergola roof device.
///
/// This struct maintains the authoritative view of the device, merged from
/// REST snapshots and push deltas. All fields are optional because state may
/// not be known until a source reports it.
///
/// Merges are field-wise: a delta lacking a field leaves the prior value
/// intact, and `roof_device` in particular survives REST polls that never
/// carry it.
///
/// # Examples
///
/// ```
/// use pergor_lib::state::{RoofState, StateDelta, UpdateSource};
///
/// let mut state = RoofState::new();
/// let delta: StateDelta =
///     serde_json::from_str(r#"{"state":"ready","locked":false}"#).unwrap();
/// state.merge(&delta, UpdateSource::Rest);
///
/// assert_eq!(state.state(), Some("ready"));
/// assert_eq!(state.locked(), Some(false));
/// assert!(state.stack().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoofState {
    /// Overall device state ("ready", "moving", "homing", "error", ...).
    state: Option<String>,
    /// Slide position, 0-100 after scale normalization.
    stack: Option<f64>,
    /// Slat tilt in device-native degrees (0-125).
    tilt: Option<f64>,
    /// Whether the roof is locked.
    locked: Option<bool>,
    /// Drive status; populated only by push events and kept sticky.
    roof_device: Option<RoofDeviceStatus>,
    /// Weather state detected by the device.
    weather_state: Option<String>,
    /// Source of the most recent merge.
    source: Option<UpdateSource>,
    /// When the most recent merge completed.
    last_updated: Option<DateTime<Utc>>,
}

/// Overall state value reported while the roof is in motion.
const STATE_MOVING: &str = "moving";

/// Rounded tilt at or above which the roof counts as fully opened.
const FULLY_OPEN_TILT_DEGREES: i64 = 90;

impl RoofState {
    /// Creates a new empty roof state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the overall device state.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Returns the slide position (0-100).
    #[must_use]
    pub fn stack(&self) -> Option<f64> {
        self.stack
    }

    /// Returns the slat tilt in device-native degrees (0-125).
    #[must_use]
    pub fn tilt(&self) -> Option<f64> {
        self.tilt
    }

    /// Returns whether the roof is locked.
    #[must_use]
    pub fn locked(&self) -> Option<bool> {
        self.locked
    }

    /// Returns the drive status, if any push event has reported one.
    #[must_use]
    pub fn roof_device(&self) -> Option<&RoofDeviceStatus> {
        self.roof_device.as_ref()
    }

    /// Returns the weather state detected by the device.
    #[must_use]
    pub fn weather_state(&self) -> Option<&str> {
        self.weather_state.as_deref()
    }

    /// Returns the source of the most recent merge.
    #[must_use]
    pub fn source(&self) -> Option<UpdateSource> {
        self.source
    }

    /// Returns when the most recent merge completed.
    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Returns `true` if the roof is currently in motion.
    ///
    /// The push-sourced drive status is authoritative when present; the
    /// overall state covers firmwares that never publish drive events.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.roof_device
            .as_ref()
            .is_some_and(RoofDeviceStatus::is_moving)
            || self.state.as_deref() == Some(STATE_MOVING)
    }

    /// Returns `true` if the roof is fully opened (stack >= 100 and tilt
    /// >= 90 after rounding), or `None` while either position is unknown.
    #[must_use]
    pub fn is_fully_open(&self) -> Option<bool> {
        let stack = round(self.stack?);
        let tilt = round(self.tilt?);
        Some(stack >= 100 && tilt >= FULLY_OPEN_TILT_DEGREES)
    }

    /// Returns `true` if the roof is fully closed (stack and tilt both
    /// round to 0), or `None` while either position is unknown.
    #[must_use]
    pub fn is_fully_closed(&self) -> Option<bool> {
        let stack = round(self.stack?);
        let tilt = round(self.tilt?);
        Some(stack == 0 && tilt == 0)
    }

    /// Merges a partial update into this state.
    ///
    /// Fields present in the delta overwrite; absent fields keep their
    /// prior value. The merge source and timestamp are recorded
    /// unconditionally. Returns `true` if any tracked field changed.
    pub fn merge(&mut self, delta: &StateDelta, source: UpdateSource) -> bool {
        let mut changed = false;

        macro_rules! update_if_some {
            ($field:ident, $value:expr) => {
                if let Some(value) = $value {
                    if self.$field.as_ref() != Some(value) {
                        self.$field = Some(value.clone());
                        changed = true;
                    }
                }
            };
        }

        update_if_some!(state, &delta.state);
        update_if_some!(locked, &delta.locked);
        update_if_some!(roof_device, &delta.roof_device);
        update_if_some!(weather_state, &delta.weather_state);

        if let Some(positions) = &delta.current_roof_positions {
            update_if_some!(stack, &positions.stack);
            update_if_some!(tilt, &positions.tilt);
        }

        self.source = Some(source);
        self.last_updated = Some(Utc::now());

        changed
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round(value: f64) -> i64 {
    value.round() as i64
}
