// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Motion and cycle direction types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Motion direction reported by the roof drive while it is moving.
///
/// The device distinguishes slat rotation (`tilting_*`) from slide travel
/// (`stacking`/`unstacking`). Unrecognized firmware strings are preserved
/// verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MotionDirection {
    /// Slats rotating towards open.
    TiltingOpen,
    /// Panels sliding together (roof opening).
    Stacking,
    /// Slats rotating towards closed.
    TiltingClose,
    /// Panels sliding apart (roof closing).
    Unstacking,
    /// A direction string this library does not know about.
    Unknown(String),
}

impl MotionDirection {
    /// Returns the wire representation of this direction.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::TiltingOpen => "tilting_open",
            Self::Stacking => "stacking",
            Self::TiltingClose => "tilting_close",
            Self::Unstacking => "unstacking",
            Self::Unknown(other) => other,
        }
    }

    /// Classifies this motion into a cycle direction.
    ///
    /// Returns `None` for unknown directions, which leave the cycle
    /// direction memory unchanged.
    #[must_use]
    pub fn cycle_direction(&self) -> Option<CycleDirection> {
        match self {
            Self::TiltingOpen | Self::Stacking => Some(CycleDirection::Opening),
            Self::TiltingClose | Self::Unstacking => Some(CycleDirection::Closing),
            Self::Unknown(_) => None,
        }
    }
}

impl From<String> for MotionDirection {
    fn from(value: String) -> Self {
        match value.as_str() {
            "tilting_open" => Self::TiltingOpen,
            "stacking" => Self::Stacking,
            "tilting_close" => Self::TiltingClose,
            "unstacking" => Self::Unstacking,
            _ => Self::Unknown(value),
        }
    }
}

impl From<MotionDirection> for String {
    fn from(value: MotionDirection) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for MotionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction memory for the tri-state cycle control.
///
/// Defaults to [`CycleDirection::Closing`] so the first cycle press opens
/// the roof.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleDirection {
    /// The roof last moved towards open.
    Opening,
    /// The roof last moved towards closed (default).
    #[default]
    Closing,
}
