// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Builder for [`PergolaDevice`].

use std::sync::Arc;
use std::time::Duration;

use crate::device::PergolaDevice;
use crate::error::Error;
use crate::gateway::DeviceGateway;
use crate::protocol::{DeviceConfig, UserType};
use crate::reconciler::Reconciler;
use crate::state::RoofState;
use crate::types::StackScale;

/// Builder for connecting to a pergola roof device.
///
/// Configuration setters delegate to [`DeviceConfig`];
/// [`connect`](Self::connect) performs the authenticated startup sequence.
#[derive(Debug)]
pub struct PergolaDeviceBuilder {
    config: DeviceConfig,
}

impl PergolaDeviceBuilder {
    /// Creates a builder from a configuration.
    #[must_use]
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }

    /// Sets the user type presented during authentication.
    #[must_use]
    pub fn with_user_type(mut self, user_type: UserType) -> Self {
        self.config = self.config.with_user_type(user_type);
        self
    }

    /// Sets the authentication password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.config = self.config.with_password(password);
        self
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.config = self.config.with_port(port);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Sets the status endpoint path.
    #[must_use]
    pub fn with_status_path(mut self, path: impl Into<String>) -> Self {
        self.config = self.config.with_status_path(path);
        self
    }

    /// Sets the stack value scale convention.
    #[must_use]
    pub fn with_stack_scale(mut self, scale: StackScale) -> Self {
        self.config = self.config.with_stack_scale(scale);
        self
    }

    /// Uses plain HTTP and `ws://` instead of TLS.
    #[must_use]
    pub fn with_plain_http(mut self) -> Self {
        self.config = self.config.with_plain_http();
        self
    }

    /// Returns the configuration assembled so far.
    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Connects to the device.
    ///
    /// Authenticates, takes an initial state snapshot (which also opens the
    /// push event stream), and starts the 30-second poll loop. Returns the
    /// device together with the initial state.
    ///
    /// # Errors
    ///
    /// Setup failures are terminal and surface to the caller: an
    /// authentication error means wrong credentials, an initial refresh
    /// error means the device is unreachable.
    pub async fn connect(self) -> Result<(PergolaDevice, RoofState), Error> {
        let gateway = Arc::new(DeviceGateway::new(self.config)?);
        gateway.authenticate().await?;

        let reconciler = Reconciler::new(Arc::clone(&gateway));
        reconciler.refresh().await?;
        let initial_state = reconciler.state();

        let device = PergolaDevice::new(gateway, reconciler);
        Ok((device, initial_state))
    }
}
