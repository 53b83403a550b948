// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Protocol implementations for communicating with pergola roof devices.
//!
//! The device exposes two independent transports:
//!
//! - [`RestClient`]: REST API for authentication, status polls, and commands
//! - [`open_event_stream`]: WebSocket push channel for real-time state events
//!
//! Both are driven by the [`DeviceGateway`](crate::gateway::DeviceGateway),
//! which owns the bearer token and the stream lifecycle.

mod http;
mod ws;

pub use http::{DeviceConfig, MoveAction, RestClient, UserType};
pub use ws::{EventStreamHandle, KEEPALIVE_INTERVAL, open_event_stream};
