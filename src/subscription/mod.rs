// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for roof state changes.
//!
//! Consumers register callbacks and receive the full merged
//! [`RoofState`](crate::state::RoofState) snapshot after every successful
//! update, plus a refresh-failed signal when a scheduled poll cannot reach
//! the device. Callbacks run on whichever task completed the merge, so they
//! should return quickly.
//!
//! ```no_run
//! use pergor_lib::PergolaDevice;
//!
//! # async fn example() -> pergor_lib::Result<()> {
//! let (device, _initial_state) = PergolaDevice::builder("192.168.1.100")
//!     .with_password("secret")
//!     .connect()
//!     .await?;
//!
//! let sub_id = device.on_state_changed(|state| {
//!     println!("roof is at {:?}% stack", state.stack());
//! });
//!
//! // Later, unsubscribe
//! device.unsubscribe(sub_id);
//! # Ok(())
//! # }
//! ```

mod callback;

pub use callback::{CallbackRegistry, SubscriptionId};
