// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsers for REST response payloads.
//!
//! Status responses deserialize straight into
//! [`StateDelta`](crate::state::StateDelta); this module covers the
//! remaining endpoint-specific payloads.

mod auth;
mod weather;

pub use auth::AuthResponse;
pub use weather::parse_weather_body;
