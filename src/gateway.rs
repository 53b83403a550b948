// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device gateway: authenticated transport and connection lifecycle.
//!
//! The gateway owns the bearer token, the REST client, and the push-stream
//! handle. Commands are single REST writes with no implicit retry; retry
//! policy belongs to the reconciler's poll cycle. The reconciler never
//! touches the socket directly, it only asks the gateway "are you
//! connected" and "please open".

use parking_lot::{Mutex, RwLock};

use crate::error::Error;
use crate::event::PushEvent;
use crate::protocol::{
    DeviceConfig, EventStreamHandle, MoveAction, RestClient, open_event_stream,
};
use crate::state::StateDelta;

/// Stack value that fully opens the roof.
const STACK_OPEN: f64 = 100.0;
/// Stack value that retracts the roof slide.
const STACK_CLOSED: f64 = 0.0;
/// Tilt value that folds the slats flat.
const TILT_CLOSED: f64 = 0.0;

/// Gateway to a pergola roof device.
///
/// # Examples
///
/// ```no_run
/// use pergor_lib::gateway::DeviceGateway;
/// use pergor_lib::protocol::DeviceConfig;
///
/// # async fn example() -> pergor_lib::Result<()> {
/// let config = DeviceConfig::new("192.168.1.100").with_password("secret");
/// let gateway = DeviceGateway::new(config)?;
///
/// gateway.authenticate().await?;
/// let snapshot = gateway.fetch_status().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DeviceGateway {
    config: DeviceConfig,
    rest: RestClient,
    token: RwLock<Option<String>>,
    stream: Mutex<Option<EventStreamHandle>>,
}

impl DeviceGateway {
    /// Creates a gateway for the given configuration.
    ///
    /// No network traffic happens until [`authenticate`](Self::authenticate)
    /// is called.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be created.
    pub fn new(config: DeviceConfig) -> Result<Self, Error> {
        let rest = RestClient::new(&config).map_err(Error::Protocol)?;
        Ok(Self {
            config,
            rest,
            token: RwLock::new(None),
            stream: Mutex::new(None),
        })
    }

    /// Returns the device configuration.
    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns `true` if a bearer token is currently held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// Authenticates against the device and stores the bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::AuthenticationFailed` when the device rejects
    /// the credentials, transport errors otherwise.
    pub async fn authenticate(&self) -> Result<(), Error> {
        let token = self
            .rest
            .authenticate(self.config.user_type(), self.config.password())
            .await?;
        *self.token.write() = Some(token);
        Ok(())
    }

    /// Logs out and clears the bearer token.
    ///
    /// The logout call is best-effort (the endpoint may not exist on all
    /// firmware versions); the local token is cleared regardless.
    pub async fn deauthenticate(&self) {
        let token = self.token.write().take();
        if let Some(token) = token {
            self.rest.logout(&token).await;
        }
    }

    /// Fetches the current roof status snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotAuthenticated` without a token, an authentication
    /// error on HTTP 401 (the stale token is dropped so the next refresh
    /// logs in again), and transport/parse errors otherwise.
    pub async fn fetch_status(&self) -> Result<StateDelta, Error> {
        let token = self.bearer()?;
        self.checked(self.rest.status(&token).await)
    }

    /// Fetches the current weather state.
    ///
    /// Best-effort telemetry: any failure is logged and reported as `None`
    /// so it can never fail an overall refresh.
    pub async fn fetch_weather(&self) -> Option<String> {
        let token = match self.bearer() {
            Ok(token) => token,
            Err(_) => return None,
        };

        match self.rest.weather(&token).await {
            Ok(weather) => weather,
            Err(error) => {
                tracing::debug!(error = %error, "Weather fetch failed");
                None
            }
        }
    }

    // ========== Commands ==========

    /// Opens the roof (stack to 100%).
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors; no implicit retry.
    pub async fn open_roof(&self) -> Result<(), Error> {
        self.move_stack(STACK_OPEN).await
    }

    /// Closes the roof slide (stack to 0%).
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors; no implicit retry.
    pub async fn close_roof(&self) -> Result<(), Error> {
        self.move_stack(STACK_CLOSED).await
    }

    /// Folds the slats flat (tilt to 0 degrees).
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors; no implicit retry.
    pub async fn close_tilt(&self) -> Result<(), Error> {
        self.move_tilt(TILT_CLOSED).await
    }

    /// Stops any roof movement.
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors; no implicit retry.
    pub async fn stop_roof(&self) -> Result<(), Error> {
        let token = self.bearer()?;
        self.checked(self.rest.roof_stop(&token).await)
    }

    /// Moves the roof slide to a stack value (0-100).
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors; no implicit retry.
    pub async fn move_stack(&self, value: f64) -> Result<(), Error> {
        let token = self.bearer()?;
        self.checked(self.rest.roof_move(&token, MoveAction::Stack, value).await)
    }

    /// Moves the roof slats to a tilt angle in device-native degrees (0-125).
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors; no implicit retry.
    pub async fn move_tilt(&self, degrees: f64) -> Result<(), Error> {
        let token = self.bearer()?;
        self.checked(self.rest.roof_move(&token, MoveAction::Tilt, degrees).await)
    }

    /// Locks or unlocks the roof.
    ///
    /// # Errors
    ///
    /// Returns transport/authentication errors; no implicit retry.
    pub async fn set_locked(&self, locked: bool) -> Result<(), Error> {
        let token = self.bearer()?;
        self.checked(self.rest.set_locked(&token, locked).await)
    }

    // ========== Event stream ==========

    /// Opens the push event stream, delivering classified events to
    /// `on_event` until the connection closes or errors.
    ///
    /// A no-op when the stream is already connected. The stream does not
    /// reconnect internally; the reconciler re-opens it on its next poll.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotAuthenticated` without a token, connection and
    /// handshake errors otherwise.
    pub async fn open_event_stream<F>(&self, on_event: F) -> Result<(), Error>
    where
        F: Fn(PushEvent) + Send + Sync + 'static,
    {
        if self.is_stream_connected() {
            return Ok(());
        }

        let token = self.bearer()?;

        // Drop a dead handle before replacing it
        self.close_event_stream();

        let handle = open_event_stream(&self.config, &token, on_event)
            .await
            .map_err(Error::Protocol)?;
        *self.stream.lock() = Some(handle);
        Ok(())
    }

    /// Closes the push event stream.
    ///
    /// Idempotent: cancels the keepalive, closes the socket, and clears the
    /// handle. Tolerates being called when the stream was never opened.
    pub fn close_event_stream(&self) {
        if let Some(handle) = self.stream.lock().take() {
            handle.close();
        }
    }

    /// Returns `true` while the push event stream is connected.
    #[must_use]
    pub fn is_stream_connected(&self) -> bool {
        self.stream
            .lock()
            .as_ref()
            .is_some_and(EventStreamHandle::is_connected)
    }

    // ========== Helpers ==========

    fn bearer(&self) -> Result<String, Error> {
        self.token.read().clone().ok_or(Error::NotAuthenticated)
    }

    /// Drops the stored token on an authentication failure so the next
    /// refresh cycle re-authenticates instead of retrying a dead token.
    fn checked<T>(&self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(error) = &result {
            if error.is_authentication() {
                *self.token.write() = None;
            }
        }
        result
    }
}
