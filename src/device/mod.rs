// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level device abstraction for pergola roofs.
//!
//! [`PergolaDevice`] wires the gateway, the reconciler, and the cycle
//! controller together and exposes the normalized command surface:
//! positions are 0-100 percentages on this boundary and are translated to
//! device-native units before they reach the wire.
//!
//! ```no_run
//! use pergor_lib::PergolaDevice;
//!
//! # async fn example() -> pergor_lib::Result<()> {
//! let (device, initial_state) = PergolaDevice::builder("192.168.1.100")
//!     .with_password("secret")
//!     .connect()
//!     .await?;
//!
//! println!("roof state: {:?}", initial_state.state());
//!
//! device.on_state_changed(|state| {
//!     println!("stack at {:?}", state.stack());
//! });
//!
//! device.open().await?;
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::PergolaDeviceBuilder;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::cycle::CycleAction;
use crate::error::Error;
use crate::gateway::DeviceGateway;
use crate::protocol::DeviceConfig;
use crate::reconciler::Reconciler;
use crate::state::RoofState;
use crate::subscription::SubscriptionId;
use crate::types::{CycleDirection, TiltAngle};

/// A pergola roof device with live state reconciliation.
///
/// Constructed through [`PergolaDevice::builder`], which authenticates,
/// takes an initial snapshot, and starts the background poll loop.
#[derive(Debug)]
pub struct PergolaDevice {
    gateway: Arc<DeviceGateway>,
    reconciler: Reconciler,
    poll: Mutex<Option<JoinHandle<()>>>,
}

impl PergolaDevice {
    /// Creates a builder for the device at the given host.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> PergolaDeviceBuilder {
        PergolaDeviceBuilder::new(DeviceConfig::new(host))
    }

    /// Creates a builder from a prepared configuration.
    #[must_use]
    pub fn with_config(config: DeviceConfig) -> PergolaDeviceBuilder {
        PergolaDeviceBuilder::new(config)
    }

    pub(crate) fn new(gateway: Arc<DeviceGateway>, reconciler: Reconciler) -> Self {
        let poll = reconciler.spawn_poll_loop();
        Self {
            gateway,
            reconciler,
            poll: Mutex::new(Some(poll)),
        }
    }

    /// Returns the device configuration.
    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        self.gateway.config()
    }

    /// Returns a snapshot of the current roof state.
    #[must_use]
    pub fn state(&self) -> RoofState {
        self.reconciler.state()
    }

    /// Returns the current slat tilt as a normalized percentage.
    #[must_use]
    pub fn tilt_percent(&self) -> Option<u8> {
        self.reconciler
            .state()
            .tilt()
            .map(|degrees| TiltAngle::clamped(degrees).to_percent())
    }

    /// Returns the cycle control's direction memory.
    #[must_use]
    pub fn cycle_direction(&self) -> CycleDirection {
        self.reconciler.cycle().direction()
    }

    // ========== Commands ==========

    /// Opens the roof (stack to 100%).
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors from the command write.
    pub async fn open(&self) -> Result<(), Error> {
        self.gateway.open_roof().await?;
        self.refresh_after_command().await;
        Ok(())
    }

    /// Closes the roof slide (stack to 0%).
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors from the command write.
    pub async fn close(&self) -> Result<(), Error> {
        self.gateway.close_roof().await?;
        self.refresh_after_command().await;
        Ok(())
    }

    /// Stops any roof movement.
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors from the command write.
    pub async fn stop(&self) -> Result<(), Error> {
        self.gateway.stop_roof().await?;
        self.refresh_after_command().await;
        Ok(())
    }

    /// Moves the roof slide to a position (0-100, clamped).
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors from the command write.
    pub async fn set_position(&self, percent: u8) -> Result<(), Error> {
        self.gateway.move_stack(f64::from(percent.min(100))).await?;
        self.refresh_after_command().await;
        Ok(())
    }

    /// Tilts the slats to a normalized percentage (0-100, clamped),
    /// translated to device-native degrees.
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors from the command write.
    pub async fn set_tilt(&self, percent: u8) -> Result<(), Error> {
        let degrees = TiltAngle::from_percent(percent).degrees();
        self.gateway.move_tilt(degrees).await?;
        self.refresh_after_command().await;
        Ok(())
    }

    /// Locks or unlocks the roof.
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors from the command write.
    pub async fn set_locked(&self, locked: bool) -> Result<(), Error> {
        self.gateway.set_locked(locked).await?;
        self.refresh_after_command().await;
        Ok(())
    }

    /// Fully opens the roof.
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors from the command write.
    pub async fn fully_open(&self) -> Result<(), Error> {
        self.open().await
    }

    /// Fully closes the roof by folding the slats flat.
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors from the command write.
    pub async fn fully_close(&self) -> Result<(), Error> {
        self.gateway.close_tilt().await?;
        self.refresh_after_command().await;
        Ok(())
    }

    /// Performs one step of the tri-state cycle control and returns the
    /// action that was issued.
    ///
    /// A moving roof is stopped; an idle roof opens or fully closes
    /// depending on the direction memory and the stack position.
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors from the command write; the
    /// direction memory is only updated after the write succeeded.
    pub async fn cycle(&self) -> Result<CycleAction, Error> {
        let action = self.reconciler.cycle().decide(&self.reconciler.state());

        match action {
            CycleAction::Stop => self.gateway.stop_roof().await?,
            CycleAction::Open => self.gateway.open_roof().await?,
            CycleAction::FullClose => self.gateway.close_tilt().await?,
        }

        self.reconciler.cycle().commit(action);
        self.refresh_after_command().await;
        Ok(action)
    }

    // ========== Subscriptions ==========

    /// Subscribes to state snapshots, delivered after every merge.
    pub fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&RoofState) + Send + Sync + 'static,
    {
        self.reconciler.on_state_changed(callback)
    }

    /// Subscribes to refresh failures.
    pub fn on_refresh_failed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.reconciler.on_refresh_failed(callback)
    }

    /// Unsubscribes a callback by its subscription ID.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.reconciler.unsubscribe(id)
    }

    // ========== Lifecycle ==========

    /// Requests an immediate refresh cycle.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; refresh-failed subscribers have already
    /// been notified.
    pub async fn request_refresh(&self) -> Result<(), Error> {
        self.reconciler.refresh().await
    }

    /// Shuts the device down: stops polling, closes the event stream, and
    /// logs out. The last known state remains readable.
    pub async fn shutdown(&self) {
        if let Some(poll) = self.poll.lock().take() {
            poll.abort();
        }
        self.gateway.close_event_stream();
        self.gateway.deauthenticate().await;
    }

    /// Commands change device state; pull a fresh snapshot right away
    /// instead of waiting for the next poll tick. Steady-state policy
    /// applies: a failed refresh is non-fatal.
    async fn refresh_after_command(&self) {
        if let Err(error) = self.reconciler.refresh().await {
            tracing::debug!(error = %error, "Post-command refresh failed");
        }
    }
}
