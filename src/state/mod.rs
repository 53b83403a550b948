// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roof state management types.
//!
//! [`RoofState`] is the authoritative snapshot of the device, with a
//! single writer (the reconciler). [`StateDelta`] is the partial update
//! applied to it, produced by both REST polls and push events.
//!
//! # Examples
//!
//! ```
//! use pergor_lib::state::{RoofState, StateDelta, UpdateSource};
//!
//! let mut state = RoofState::new();
//! let delta: StateDelta = serde_json::from_str(
//!     r#"{"current_roof_positions":{"stack":40.0,"tilt":10.0}}"#,
//! ).unwrap();
//!
//! state.merge(&delta, UpdateSource::Push);
//! assert_eq!(state.stack(), Some(40.0));
//! ```

mod delta;
mod roof_state;

pub use delta::{RoofDeviceStatus, RoofPositions, StateDelta};
pub use roof_state::{RoofState, UpdateSource};
