// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State reconciliation core.
//!
//! The reconciler is the single writer of [`RoofState`]. It merges two
//! sources into one authoritative view:
//!
//! - Push deltas from the WebSocket stream, merged and published
//!   immediately. This is the primary path; consumers see sub-second
//!   updates while the roof moves.
//! - REST snapshots from a fixed 30-second poll. The poll is the liveness
//!   backstop: a push stream can die without a socket-level error, so the
//!   timer is never reset by push activity.
//!
//! A failed poll keeps the previous state (stale-but-present data outranks
//! no data) and raises one refresh-failed signal to subscribers. The poll
//! tick also re-opens the event stream when it finds it disconnected, which
//! keeps a single retry loop in the system.
//!
//! All merges are serialized through one lock; listeners receive a cloned
//! snapshot after the lock is released.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::cycle::CycleController;
use crate::error::Error;
use crate::event::PushEvent;
use crate::gateway::DeviceGateway;
use crate::state::{RoofState, StateDelta, UpdateSource};
use crate::subscription::{CallbackRegistry, SubscriptionId};

/// Interval between REST status polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// The single source of truth for the current device state.
///
/// Cheap to clone; clones share the same state and subscriptions.
#[derive(Debug, Clone)]
pub struct Reconciler {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    gateway: Arc<DeviceGateway>,
    state: RwLock<RoofState>,
    callbacks: CallbackRegistry,
    cycle: CycleController,
}

impl Reconciler {
    /// Creates a reconciler over the given gateway, starting from an empty
    /// state.
    #[must_use]
    pub fn new(gateway: Arc<DeviceGateway>) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                state: RwLock::new(RoofState::new()),
                callbacks: CallbackRegistry::new(),
                cycle: CycleController::new(),
            }),
        }
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> RoofState {
        self.inner.state.read().clone()
    }

    /// Returns the cycle controller observing this reconciler's state.
    #[must_use]
    pub fn cycle(&self) -> &CycleController {
        &self.inner.cycle
    }

    /// Subscribes to state snapshots.
    pub fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&RoofState) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_state_changed(callback)
    }

    /// Subscribes to refresh failures.
    pub fn on_refresh_failed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_refresh_failed(callback)
    }

    /// Unsubscribes a callback by its subscription ID.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.callbacks.unsubscribe(id)
    }

    /// Performs one refresh cycle.
    ///
    /// Re-opens the event stream if it is down (fire-and-forget), fetches a
    /// REST snapshot, merges it together with best-effort weather state,
    /// and notifies subscribers. On fetch failure the previous state is
    /// retained and a refresh-failed signal is raised exactly once.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the same error was already delivered to
    /// refresh-failed subscribers.
    pub async fn refresh(&self) -> Result<(), Error> {
        self.ensure_event_stream();

        if !self.inner.gateway.is_authenticated() {
            if let Err(error) = self.inner.gateway.authenticate().await {
                tracing::warn!(error = %error, "Re-authentication failed");
                self.inner.callbacks.dispatch_refresh_failed(&error);
                return Err(error);
            }
        }

        let mut delta = match self.inner.gateway.fetch_status().await {
            Ok(delta) => delta,
            Err(error) => {
                tracing::warn!(error = %error, "Status fetch failed; keeping previous state");
                self.inner.callbacks.dispatch_refresh_failed(&error);
                return Err(error);
            }
        };

        // Weather lives on a separate endpoint and is non-critical
        if let Some(weather) = self.inner.gateway.fetch_weather().await {
            delta.weather_state = Some(weather);
        }

        self.apply(delta, UpdateSource::Rest);
        Ok(())
    }

    /// Merges a classified push event into the state and notifies
    /// subscribers immediately.
    ///
    /// An event whose data does not decode to a state delta is discarded;
    /// malformed push input never surfaces as an error.
    pub fn handle_push_event(&self, event: PushEvent) {
        match serde_json::from_value::<StateDelta>(Value::Object(event.data)) {
            Ok(delta) => self.apply(delta, UpdateSource::Push),
            Err(error) => {
                tracing::debug!(topic = %event.topic, error = %error, "Discarding undecodable push delta");
            }
        }
    }

    /// Spawns the fixed-interval poll loop.
    ///
    /// The interval is not reset by push-triggered updates; polling remains
    /// the liveness backstop regardless of push activity. The first tick
    /// fires one interval after spawn (the initial refresh is done by the
    /// builder).
    pub(crate) fn spawn_poll_loop(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(POLL_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(error) = this.refresh().await {
                    tracing::debug!(error = %error, "Scheduled refresh failed");
                }
            }
        })
    }

    /// Asks the gateway to open the event stream if it is down.
    ///
    /// Fire-and-forget: the refresh path must not block on the WebSocket
    /// handshake. Failures are logged and retried on the next poll tick.
    fn ensure_event_stream(&self) {
        if self.inner.gateway.is_stream_connected() {
            return;
        }

        let this = self.clone();
        tokio::spawn(async move {
            let events = this.clone();
            let result = this
                .inner
                .gateway
                .open_event_stream(move |event| events.handle_push_event(event))
                .await;
            if let Err(error) = result {
                tracing::debug!(error = %error, "Event stream open failed; retrying on next poll");
            }
        });
    }

    /// Applies a delta through the single-writer boundary and notifies
    /// subscribers with a cloned snapshot.
    fn apply(&self, delta: StateDelta, source: UpdateSource) {
        let delta = delta.normalized(self.inner.gateway.config().stack_scale());

        let snapshot = {
            let mut state = self.inner.state.write();
            state.merge(&delta, source);
            state.clone()
        };

        self.inner.cycle.observe(&snapshot);
        self.inner.callbacks.dispatch_state(&snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventTopic, classify};
    use crate::protocol::DeviceConfig;
    use crate::types::{CycleDirection, StackScale};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn reconciler() -> Reconciler {
        reconciler_with(DeviceConfig::new("192.168.1.100"))
    }

    fn reconciler_with(config: DeviceConfig) -> Reconciler {
        Reconciler::new(Arc::new(DeviceGateway::new(config).unwrap()))
    }

    fn push_event(raw: &str) -> PushEvent {
        classify(raw).expect("event should classify")
    }

    #[test]
    fn starts_empty() {
        let reconciler = reconciler();
        assert_eq!(reconciler.state(), RoofState::new());
    }

    #[test]
    fn push_event_merges_and_notifies() {
        let reconciler = reconciler();
        let notified = Arc::new(AtomicU32::new(0));
        let notified_clone = Arc::clone(&notified);
        reconciler.on_state_changed(move |_| {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });

        reconciler.handle_push_event(push_event(
            r#"{"type":"ROOF_STATUS_CHANGED","data":{"state":"moving","current_roof_positions":{"stack":12.0}}}"#,
        ));

        let state = reconciler.state();
        assert_eq!(state.state(), Some("moving"));
        assert_eq!(state.stack(), Some(12.0));
        assert_eq!(state.source(), Some(UpdateSource::Push));
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn push_event_preserves_unrelated_fields() {
        let reconciler = reconciler();
        reconciler.handle_push_event(push_event(
            r#"{"type":"ROOF_STATUS_CHANGED","data":{"current_roof_positions":{"stack":40.0,"tilt":10.0}}}"#,
        ));
        reconciler.handle_push_event(push_event(
            r#"{"type":"SYSTEM_STATUS_CHANGED","data":{"state":"ready"}}"#,
        ));

        let state = reconciler.state();
        assert_eq!(state.stack(), Some(40.0));
        assert_eq!(state.tilt(), Some(10.0));
        assert_eq!(state.state(), Some("ready"));
    }

    #[test]
    fn skye2_event_feeds_cycle_inference() {
        let reconciler = reconciler();
        assert_eq!(reconciler.cycle().direction(), CycleDirection::Closing);

        reconciler.handle_push_event(push_event(
            r#"{"type":"SKYE2_STATUS_CHANGED","data":{"roof_device":{"state":"moving","direction":"stacking"}}}"#,
        ));

        assert_eq!(reconciler.cycle().direction(), CycleDirection::Opening);
        assert!(reconciler.state().roof_device().is_some());
    }

    #[test]
    fn undecodable_push_delta_is_discarded() {
        let reconciler = reconciler();
        reconciler.handle_push_event(push_event(
            r#"{"type":"ROOF_STATUS_CHANGED","data":{"locked":"definitely"}}"#,
        ));

        assert_eq!(reconciler.state(), RoofState::new());
    }

    #[test]
    fn fractional_stack_is_normalized_on_merge() {
        let reconciler =
            reconciler_with(DeviceConfig::new("192.168.1.100").with_stack_scale(StackScale::Fraction));

        reconciler.handle_push_event(push_event(
            r#"{"type":"ROOF_STATUS_CHANGED","data":{"current_roof_positions":{"stack":0.5}}}"#,
        ));

        assert_eq!(reconciler.state().stack(), Some(50.0));
    }

    #[test]
    fn unsubscribed_listener_is_not_notified() {
        let reconciler = reconciler();
        let notified = Arc::new(AtomicU32::new(0));
        let notified_clone = Arc::clone(&notified);
        let id = reconciler.on_state_changed(move |_| {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(reconciler.unsubscribe(id));
        reconciler.handle_push_event(push_event(
            r#"{"type":"ROOF_STATUS_CHANGED","data":{"state":"ready"}}"#,
        ));

        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn topics_share_one_merge_path() {
        let reconciler = reconciler();
        for topic in EventTopic::ALL {
            let raw = format!(r#"{{"type":"{}","data":{{"state":"ready"}}}}"#, topic.as_str());
            reconciler.handle_push_event(push_event(&raw));
        }
        assert_eq!(reconciler.state().state(), Some("ready"));
    }
}
