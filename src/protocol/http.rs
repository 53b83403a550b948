// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! REST protocol implementation for pergola roof devices.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::error::{Error, ProtocolError};
use crate::response::{AuthResponse, parse_weather_body};
use crate::state::StateDelta;
use crate::types::StackScale;

/// API path for authentication.
const AUTHENTICATE_PATH: &str = "/api/v1/authenticate";
/// API path for logout (best-effort; not all firmware implements it).
const LOGOUT_PATH: &str = "/api/v1/logout";
/// API path for the weather state endpoint.
const WEATHER_PATH: &str = "/api/v1/skye2/comfort/weather/state";
/// API path for roof move commands.
const MOVE_PATH: &str = "/api/v1/skye2/roof/move";
/// API path for the roof stop command.
const STOP_PATH: &str = "/api/v1/skye2/roof/stop";
/// API path for the roof lock state.
const LOCK_PATH: &str = "/api/v1/skye2/roof/lock";
/// WebSocket path for the push event stream.
const EVENTS_PATH: &str = "/api/v1/ws/events";

// ============================================================================
// UserType - Authentication role
// ============================================================================

/// User type presented during authentication.
///
/// The device grants different capabilities per role; `User` suffices for
/// roof control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserType {
    /// Regular end user (default).
    #[default]
    User,
    /// Installer account.
    Professional,
    /// Vendor technician account.
    Technician,
}

impl UserType {
    /// Returns the wire name sent in the authentication payload.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Professional => "professional",
            Self::Technician => "renson technician",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DeviceConfig - Configuration for pergola roof devices
// ============================================================================

/// Configuration for a pergola roof device.
///
/// Devices ship self-signed certificates, so TLS verification defaults to
/// off; the status path is discoverable per installation and defaults to
/// the roof endpoint.
///
/// # Examples
///
/// ```
/// use pergor_lib::protocol::{DeviceConfig, UserType};
/// use std::time::Duration;
///
/// // Simple configuration
/// let config = DeviceConfig::new("192.168.1.100");
///
/// // With all options
/// let config = DeviceConfig::new("192.168.1.100")
///     .with_port(8443)
///     .with_user_type(UserType::Professional)
///     .with_password("secret")
///     .with_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    host: String,
    port: u16,
    user_type: UserType,
    password: Option<String>,
    verify_ssl: bool,
    use_tls: bool,
    timeout: Duration,
    status_path: String,
    stack_scale: StackScale,
}

impl DeviceConfig {
    /// Default HTTPS port.
    pub const DEFAULT_PORT: u16 = 443;
    /// Default plain-HTTP port.
    pub const DEFAULT_HTTP_PORT: u16 = 80;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default status endpoint path.
    pub const DEFAULT_STATUS_PATH: &'static str = "/api/v1/roof";

    /// Creates a new configuration for the specified host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            user_type: UserType::default(),
            password: None,
            verify_ssl: false,
            use_tls: true,
            timeout: Self::DEFAULT_TIMEOUT,
            status_path: Self::DEFAULT_STATUS_PATH.to_string(),
            stack_scale: StackScale::default(),
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the user type presented during authentication.
    #[must_use]
    pub fn with_user_type(mut self, user_type: UserType) -> Self {
        self.user_type = user_type;
        self
    }

    /// Sets the authentication password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Enables TLS certificate verification.
    ///
    /// Off by default because the devices present self-signed certificates.
    #[must_use]
    pub fn with_ssl_verification(mut self) -> Self {
        self.verify_ssl = true;
        self
    }

    /// Uses plain HTTP and `ws://` instead of TLS.
    ///
    /// Intended for devices behind a terminating proxy and for test
    /// harnesses. If the port hasn't been explicitly set, it is changed
    /// to 80.
    #[must_use]
    pub fn with_plain_http(mut self) -> Self {
        self.use_tls = false;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTP_PORT;
        }
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the status endpoint path.
    #[must_use]
    pub fn with_status_path(mut self, path: impl Into<String>) -> Self {
        self.status_path = path.into();
        self
    }

    /// Sets the stack value scale convention.
    #[must_use]
    pub fn with_stack_scale(mut self, scale: StackScale) -> Self {
        self.stack_scale = scale;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the user type.
    #[must_use]
    pub fn user_type(&self) -> UserType {
        self.user_type
    }

    /// Returns the password if set.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Returns whether TLS certificates are verified.
    #[must_use]
    pub fn verify_ssl(&self) -> bool {
        self.verify_ssl
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the status endpoint path.
    #[must_use]
    pub fn status_path(&self) -> &str {
        &self.status_path
    }

    /// Returns the stack value scale convention.
    #[must_use]
    pub fn stack_scale(&self) -> StackScale {
        self.stack_scale
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let (scheme, default_port) = if self.use_tls {
            ("https", Self::DEFAULT_PORT)
        } else {
            ("http", Self::DEFAULT_HTTP_PORT)
        };
        let port_suffix = if self.port == default_port {
            String::new()
        } else {
            format!(":{}", self.port)
        };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Builds the WebSocket event stream URL from this configuration.
    #[must_use]
    pub fn ws_url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        let base = self.base_url();
        let authority = base
            .split_once("://")
            .map_or(base.as_str(), |(_, rest)| rest);
        format!("{scheme}://{authority}{EVENTS_PATH}")
    }

    /// Creates a [`RestClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self) -> Result<RestClient, ProtocolError> {
        RestClient::new(&self)
    }
}

// ============================================================================
// RestClient - REST API client
// ============================================================================

/// REST client for a pergola roof device.
///
/// All endpoints except authentication require the bearer token obtained
/// from [`RestClient::authenticate`]; token custody belongs to the
/// [`DeviceGateway`](crate::gateway::DeviceGateway).
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: String,
    status_path: String,
    client: Client,
}

impl RestClient {
    /// Creates a REST client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be created.
    pub fn new(config: &DeviceConfig) -> Result<Self, ProtocolError> {
        let mut builder = Client::builder().timeout(config.timeout());
        if !config.verify_ssl() {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(ProtocolError::Http)?;

        Ok(Self {
            base_url: config.base_url(),
            status_path: config.status_path().to_string(),
            client,
        })
    }

    /// Returns the base URL of the device.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Authenticates against the device and returns a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::AuthenticationFailed` when the device rejects
    /// the credentials, transport errors otherwise.
    pub async fn authenticate(
        &self,
        user_type: UserType,
        password: Option<&str>,
    ) -> Result<String, Error> {
        let url = format!("{}{AUTHENTICATE_PATH}", self.base_url);
        let payload = serde_json::json!({
            "user_name": user_type.as_str(),
            "user_pwd": password.unwrap_or_default(),
        });

        tracing::debug!(url = %url, user_type = %user_type, "Authenticating");

        let response = self.send(self.client.post(&url).json(&payload)).await?;
        let body = response.text().await.map_err(ProtocolError::Http)?;

        let auth: AuthResponse =
            serde_json::from_str(&body).map_err(|e| Error::Parse(e.into()))?;
        Ok(auth.into_token()?)
    }

    /// Logs out from the device.
    ///
    /// Best-effort: the endpoint may not exist on all firmware versions, so
    /// every failure is swallowed.
    pub async fn logout(&self, token: &str) {
        let url = format!("{}{LOGOUT_PATH}", self.base_url);
        let result = self.client.post(&url).bearer_auth(token).send().await;
        if let Err(error) = result {
            tracing::debug!(error = %error, "Logout request failed");
        }
    }

    /// Fetches the current roof status.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::AuthenticationFailed` on HTTP 401, transport
    /// or parse errors otherwise.
    pub async fn status(&self, token: &str) -> Result<StateDelta, Error> {
        let url = format!("{}{}", self.base_url, self.status_path);

        let response = self.send(self.client.get(&url).bearer_auth(token)).await?;
        let body = response.text().await.map_err(ProtocolError::Http)?;

        tracing::debug!(body = %body, "Received status response");

        serde_json::from_str(&body).map_err(|e| Error::Parse(e.into()))
    }

    /// Fetches the current weather state.
    ///
    /// # Errors
    ///
    /// Returns transport errors; an unusable body yields `Ok(None)`.
    pub async fn weather(&self, token: &str) -> Result<Option<String>, Error> {
        let url = format!("{}{WEATHER_PATH}", self.base_url);

        let response = self.send(self.client.get(&url).bearer_auth(token)).await?;
        let body = response.text().await.map_err(ProtocolError::Http)?;

        Ok(parse_weather_body(&body))
    }

    /// Sends a roof move command.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::AuthenticationFailed` on HTTP 401, transport
    /// errors otherwise.
    pub async fn roof_move(&self, token: &str, action: MoveAction, value: f64) -> Result<(), Error> {
        let url = format!("{}{MOVE_PATH}", self.base_url);
        let payload = serde_json::json!({"action": action.as_str(), "value": value});

        tracing::debug!(action = %action, value, "Sending move command");

        self.send(self.client.put(&url).bearer_auth(token).json(&payload))
            .await?;
        Ok(())
    }

    /// Stops the roof.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::AuthenticationFailed` on HTTP 401, transport
    /// errors otherwise.
    pub async fn roof_stop(&self, token: &str) -> Result<(), Error> {
        let url = format!("{}{STOP_PATH}", self.base_url);

        self.send(
            self.client
                .put(&url)
                .bearer_auth(token)
                .json(&serde_json::json!({})),
        )
        .await?;
        Ok(())
    }

    /// Sets the roof lock state.
    ///
    /// The device expects a plain-text `"true"`/`"false"` body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::AuthenticationFailed` on HTTP 401, transport
    /// errors otherwise.
    pub async fn set_locked(&self, token: &str, locked: bool) -> Result<(), Error> {
        let url = format!("{}{LOCK_PATH}", self.base_url);
        let body = if locked { "true" } else { "false" };

        self.send(self.client.put(&url).bearer_auth(token).body(body))
            .await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ProtocolError> {
        let response = request.send().await.map_err(ProtocolError::Http)?;
        check_status(response)
    }
}

/// Maps HTTP error statuses onto the protocol error taxonomy.
fn check_status(response: Response) -> Result<Response, ProtocolError> {
    if response.status() == StatusCode::UNAUTHORIZED {
        return Err(ProtocolError::AuthenticationFailed);
    }

    if !response.status().is_success() {
        return Err(ProtocolError::ConnectionFailed(format!(
            "HTTP {} - {}",
            response.status().as_u16(),
            response.status().canonical_reason().unwrap_or("Unknown")
        )));
    }

    Ok(response)
}

/// Roof move action discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAction {
    /// Slide the roof panels.
    Stack,
    /// Rotate the roof slats.
    Tilt,
}

impl MoveAction {
    /// Returns the wire name of this action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stack => "stack",
            Self::Tilt => "tilt",
        }
    }
}

impl fmt::Display for MoveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
