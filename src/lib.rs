// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `PergoR` Lib - A Rust library to control motorized pergola roofs.
//!
//! This library provides async APIs to control Renson Skye-class pergola
//! roof devices via their REST API, with real-time state updates over the
//! device's WebSocket event channel.
//!
//! # How state is kept consistent
//!
//! The device exposes two independent, inconsistent data sources: a push
//! event stream and a pollable REST status endpoint. The library merges
//! both into one authoritative [`RoofState`]:
//!
//! - Push events update the state with sub-second latency while the roof
//!   moves.
//! - A fixed 30-second REST poll acts as the liveness backstop and heals a
//!   silently dead push stream.
//! - Merges are field-wise: a partial update never erases what another
//!   source reported earlier, and a failed poll keeps the last known state.
//!
//! Positions cross the API boundary as normalized 0-100 percentages; the
//! device-native units (tilt degrees 0-125, stack percentage or fraction
//! depending on firmware) stay internal.
//!
//! # Supported Features
//!
//! - **Roof control**: open, close, stop, slide position, slat tilt
//! - **Cycle control**: one-action open/stop/close/stop sequencing for
//!   wall-switch style integrations
//! - **Lock control**: keep the roof from moving
//! - **Status**: roof state, positions, lock state, weather state
//!
//! # Quick Start
//!
//! ```no_run
//! use pergor_lib::PergolaDevice;
//!
//! #[tokio::main]
//! async fn main() -> pergor_lib::Result<()> {
//!     // Authenticates, snapshots the state, and starts background updates.
//!     let (device, initial_state) = PergolaDevice::builder("192.168.1.100")
//!         .with_password("secret")
//!         .connect()
//!         .await?;
//!
//!     println!("roof is {:?}", initial_state.state());
//!
//!     // Real-time updates after every merge
//!     device.on_state_changed(|state| {
//!         println!("stack {:?} tilt {:?}", state.stack(), state.tilt());
//!     });
//!
//!     // Normalized 0-100 command surface
//!     device.set_position(50).await?;
//!     device.set_tilt(80).await?;
//!
//!     device.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Cycle control
//!
//! ```no_run
//! use pergor_lib::PergolaDevice;
//!
//! # async fn example(device: PergolaDevice) -> pergor_lib::Result<()> {
//! // moving -> stop; idle -> open or fully close, alternating
//! let action = device.cycle().await?;
//! println!("cycle issued {action:?}");
//! # Ok(())
//! # }
//! ```

pub mod cycle;
mod device;
pub mod error;
pub mod event;
pub mod gateway;
pub mod protocol;
pub mod reconciler;
pub mod response;
pub mod state;
pub mod subscription;
pub mod types;

pub use cycle::{CycleAction, CycleController};
pub use device::{PergolaDevice, PergolaDeviceBuilder};
pub use error::{Error, ParseError, ProtocolError, Result};
pub use event::{EventTopic, PushEvent};
pub use gateway::DeviceGateway;
pub use protocol::{DeviceConfig, UserType};
pub use reconciler::Reconciler;
pub use state::{RoofDeviceStatus, RoofState, StateDelta, UpdateSource};
pub use subscription::SubscriptionId;
pub use types::{CycleDirection, MotionDirection, StackScale, TiltAngle};
