// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push message classification.
//!
//! Everything arriving on the event stream goes through [`classify`], which
//! separates state-delta events from protocol chatter and malformed input.

mod classifier;

pub use classifier::{EventTopic, PushEvent, classify};
