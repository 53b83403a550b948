// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authentication response parsing.

use serde::Deserialize;

use crate::error::ParseError;

/// Response from `POST /api/v1/authenticate`.
///
/// # Examples
///
/// ```
/// use pergor_lib::response::AuthResponse;
///
/// let json = r#"{"user_role":"USER","token":"eyJhbGciOi..."}"#;
/// let auth: AuthResponse = serde_json::from_str(json).unwrap();
/// assert_eq!(auth.user_role.as_deref(), Some("USER"));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// The bearer token (JWT) to attach to subsequent requests.
    pub token: String,

    /// Role granted by the device for the authenticated user type.
    #[serde(default)]
    pub user_role: Option<String>,
}

impl AuthResponse {
    /// Validates the response and returns the bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if the device sent an empty token.
    pub fn into_token(self) -> Result<String, ParseError> {
        if self.token.is_empty() {
            return Err(ParseError::MissingField("token".to_string()));
        }
        Ok(self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_and_role() {
        let auth: AuthResponse =
            serde_json::from_str(r#"{"user_role":"USER","token":"abc"}"#).unwrap();
        assert_eq!(auth.into_token().unwrap(), "abc");
    }

    #[test]
    fn role_is_optional() {
        let auth: AuthResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert!(auth.user_role.is_none());
    }

    #[test]
    fn empty_token_is_rejected() {
        let auth: AuthResponse = serde_json::from_str(r#"{"token":""}"#).unwrap();
        assert!(matches!(
            auth.into_token(),
            Err(ParseError::MissingField(field)) if field == "token"
        ));
    }

    #[test]
    fn missing_token_fails_to_parse() {
        assert!(serde_json::from_str::<AuthResponse>(r#"{"user_role":"USER"}"#).is_err());
    }
}
