// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `PergoR` library.
//!
//! This module provides the error hierarchy for failures across the library:
//! transport communication (REST and WebSocket), payload parsing, and
//! authentication state.

use thiserror::Error;

/// The main error type for this library.
///
/// This enum encompasses all possible errors that can occur when interacting
/// with a pergola roof device.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during transport communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// No bearer token is held; `authenticate()` must be called first.
    #[error("not authenticated")]
    NotAuthenticated,
}

impl Error {
    /// Returns `true` if this error means the bearer token was rejected or
    /// is missing, so the caller must re-authenticate rather than retry.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::Protocol(ProtocolError::AuthenticationFailed)
        )
    }
}

/// Errors related to transport communication (REST/WebSocket).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket connection or communication failed.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// TLS connector could not be built.
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The device rejected the bearer token (HTTP 401).
    #[error("authentication failed")]
    AuthenticationFailed,
}

/// Errors related to parsing device responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::ConnectionFailed("HTTP 500 - Internal Server Error".to_string());
        assert_eq!(
            err.to_string(),
            "connection failed: HTTP 500 - Internal Server Error"
        );
    }

    #[test]
    fn error_from_protocol_error() {
        let err: Error = ProtocolError::AuthenticationFailed.into();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::AuthenticationFailed)
        ));
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::MissingField("token".to_string());
        assert_eq!(err.to_string(), "missing field in response: token");
    }

    #[test]
    fn is_authentication() {
        assert!(Error::NotAuthenticated.is_authentication());
        assert!(Error::from(ProtocolError::AuthenticationFailed).is_authentication());
        assert!(
            !Error::from(ProtocolError::ConnectionFailed("HTTP 500".into())).is_authentication()
        );
    }
}
