// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classification of raw push messages.
//!
//! The device's WebSocket channel interleaves protocol chatter
//! (`Authenticated`, `Pong`, ...) with state events. The classifier turns a
//! raw text frame into a typed [`PushEvent`] or discards it; malformed input
//! is log-worthy but never an error to the caller.

use std::fmt;

use serde_json::{Map, Value};

/// Maximum number of bytes of a raw message echoed into log output.
const PREVIEW_LIMIT: usize = 200;

/// Protocol message types that carry no state data.
const PROTOCOL_TYPES: [&str; 4] = ["Authenticated", "SubscriptionsUpdated", "Ping", "Pong"];

/// State-event topics published by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    /// Roof position or state changed.
    RoofStatusChanged,
    /// Skye2 drive status changed (carries `roof_device`).
    Skye2StatusChanged,
    /// Self-test progress changed.
    RoofSelfTestStatusChanged,
    /// A digital input changed.
    DigitalInputStatusChanged,
    /// Overall system status changed.
    SystemStatusChanged,
}

impl EventTopic {
    /// All topics, in the order they are subscribed.
    pub const ALL: [Self; 5] = [
        Self::RoofStatusChanged,
        Self::Skye2StatusChanged,
        Self::RoofSelfTestStatusChanged,
        Self::DigitalInputStatusChanged,
        Self::SystemStatusChanged,
    ];

    /// Returns the wire name of this topic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RoofStatusChanged => "ROOF_STATUS_CHANGED",
            Self::Skye2StatusChanged => "SKYE2_STATUS_CHANGED",
            Self::RoofSelfTestStatusChanged => "ROOF_SELF_TEST_STATUS_CHANGED",
            Self::DigitalInputStatusChanged => "DIGITAL_INPUT_STATUS_CHANGED",
            Self::SystemStatusChanged => "SYSTEM_STATUS_CHANGED",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|topic| topic.as_str() == value)
    }
}

impl fmt::Display for EventTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified state-delta event from the push channel.
///
/// The `data` record carries a partial update for one topic's fields only;
/// it is consumed once by the reconciler and discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
    /// The topic this event was published under.
    pub topic: EventTopic,
    /// The event's `data` payload.
    pub data: Map<String, Value>,
}

/// Classifies a raw push message.
///
/// Returns `None` for protocol messages, unknown types, and anything that
/// does not decode to a keyed record with a keyed `data` field. No field
/// beyond `type` is ever assumed present.
#[must_use]
pub fn classify(raw: &str) -> Option<PushEvent> {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        tracing::debug!(raw = preview(raw), "discarding non-JSON push message");
        return None;
    };

    let Value::Object(mut message) = value else {
        return None;
    };

    let topic = {
        let kind = message
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if PROTOCOL_TYPES.contains(&kind) {
            tracing::trace!(kind, "protocol message");
            return None;
        }

        match EventTopic::parse(kind) {
            Some(topic) => topic,
            None => {
                // Unknown types hint at protocol evolution; keep them visible.
                tracing::warn!(kind, raw = preview(raw), "unknown push message type");
                return None;
            }
        }
    };

    match message.remove("data") {
        Some(Value::Object(data)) => {
            tracing::debug!(%topic, "push event");
            Some(PushEvent { topic, data })
        }
        _ => None,
    }
}

fn preview(raw: &str) -> &str {
    if raw.len() <= PREVIEW_LIMIT {
        return raw;
    }
    let mut end = PREVIEW_LIMIT;
    while !raw.is_char_boundary(end) {
        end -= 1;
    }
    &raw[..end]
}
