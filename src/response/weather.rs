// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Weather state response parsing.
//!
//! The weather endpoint is loosely specified across firmware versions: it
//! has been observed returning a bare JSON string, a record with a `state`
//! or `weather_state` key, and a quoted plain-text body. All shapes are
//! accepted; anything else yields `None`.

use serde_json::Value;

/// Extracts the weather state from a raw weather endpoint body.
#[must_use]
pub fn parse_weather_body(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return match value {
            Value::String(state) => non_empty(state),
            Value::Object(map) => map
                .get("state")
                .or_else(|| map.get("weather_state"))
                .and_then(Value::as_str)
                .map(str::to_owned)
                .and_then(non_empty),
            _ => None,
        };
    }

    non_empty(body.trim().trim_matches('"').to_owned())
}

fn non_empty(state: String) -> Option<String> {
    if state.is_empty() { None } else { Some(state) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_string() {
        assert_eq!(parse_weather_body(r#""rain""#), Some("rain".to_owned()));
    }

    #[test]
    fn record_with_state_key() {
        assert_eq!(
            parse_weather_body(r#"{"state":"sunny"}"#),
            Some("sunny".to_owned())
        );
    }

    #[test]
    fn record_with_weather_state_key() {
        assert_eq!(
            parse_weather_body(r#"{"weather_state":"wind"}"#),
            Some("wind".to_owned())
        );
    }

    #[test]
    fn state_key_wins_over_weather_state() {
        assert_eq!(
            parse_weather_body(r#"{"state":"rain","weather_state":"sunny"}"#),
            Some("rain".to_owned())
        );
    }

    #[test]
    fn quoted_plain_text() {
        assert_eq!(parse_weather_body("\"frost\"\n"), Some("frost".to_owned()));
    }

    #[test]
    fn unusable_bodies_yield_none() {
        assert!(parse_weather_body("").is_none());
        assert!(parse_weather_body(r#""""#).is_none());
        assert!(parse_weather_body("42").is_none());
        assert!(parse_weather_body(r#"{"other":"rain"}"#).is_none());
        assert!(parse_weather_body(r#"{"state":12}"#).is_none());
    }
}
