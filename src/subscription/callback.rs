// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for state subscriptions.
//!
//! This module provides the core types for managing subscription callbacks:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Internal registry for storing and dispatching callbacks

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::Error;
use crate::state::RoofState;

/// Unique identifier for a subscription.
///
/// This ID is returned when creating a subscription and can be used to
/// unsubscribe later. IDs are unique within a device's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a new subscription ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Type alias for state snapshot callbacks.
type StateCallback = Arc<dyn Fn(&RoofState) + Send + Sync>;

/// Type alias for refresh-failure callbacks.
type RefreshFailedCallback = Arc<dyn Fn(&Error) + Send + Sync>;

/// Registry for managing subscription callbacks.
///
/// Listeners receive the full current [`RoofState`] snapshot after every
/// successful merge, and a refresh-failed signal when a scheduled poll
/// cannot reach the device (the prior state is carried forward in that
/// case).
///
/// # Thread Safety
///
/// The registry is fully thread-safe and can be accessed from multiple tasks
/// concurrently. Callbacks are wrapped in `Arc` so they can be cloned cheaply.
pub struct CallbackRegistry {
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
    /// State snapshot callbacks.
    state_callbacks: RwLock<HashMap<SubscriptionId, StateCallback>>,
    /// Refresh-failure callbacks.
    refresh_failed_callbacks: RwLock<HashMap<SubscriptionId, RefreshFailedCallback>>,
}

impl CallbackRegistry {
    /// Creates a new empty callback registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            state_callbacks: RwLock::new(HashMap::new()),
            refresh_failed_callbacks: RwLock::new(HashMap::new()),
        }
    }

    /// Generates a new unique subscription ID.
    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a callback for state snapshots.
    ///
    /// The callback receives the full merged state after every successful
    /// update, whether push- or poll-triggered.
    pub fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&RoofState) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.state_callbacks.write().insert(id, Arc::new(callback));
        id
    }

    /// Registers a callback for refresh failures.
    ///
    /// Called once per failed poll; the previously held state is retained.
    pub fn on_refresh_failed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.refresh_failed_callbacks
            .write()
            .insert(id, Arc::new(callback));
        id
    }

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        if self.state_callbacks.write().remove(&id).is_some() {
            return true;
        }
        if self.refresh_failed_callbacks.write().remove(&id).is_some() {
            return true;
        }
        false
    }

    /// Clears all callbacks.
    pub fn clear(&self) {
        self.state_callbacks.write().clear();
        self.refresh_failed_callbacks.write().clear();
    }

    /// Dispatches a state snapshot to all state callbacks.
    pub fn dispatch_state(&self, state: &RoofState) {
        let callbacks = self.state_callbacks.read();
        for callback in callbacks.values() {
            callback(state);
        }
    }

    /// Dispatches a refresh failure to all refresh-failed callbacks.
    pub fn dispatch_refresh_failed(&self, error: &Error) {
        let callbacks = self.refresh_failed_callbacks.read();
        for callback in callbacks.values() {
            callback(error);
        }
    }

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.state_callbacks.read().len() + self.refresh_failed_callbacks.read().len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::state::{StateDelta, UpdateSource};
    use std::sync::atomic::AtomicU32;

    #[test]
    fn subscription_id_display() {
        let id = SubscriptionId::new(42);
        assert_eq!(id.to_string(), "Sub(42)");
    }

    #[test]
    fn registry_new_is_empty() {
        let registry = CallbackRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.callback_count(), 0);
    }

    #[test]
    fn registry_state_callback() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let id = registry.on_state_changed(move |_state| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(registry.callback_count(), 1);

        registry.dispatch_state(&RoofState::new());
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert!(registry.unsubscribe(id));
        assert!(registry.is_empty());

        registry.dispatch_state(&RoofState::new());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registry_state_callback_sees_snapshot() {
        let registry = CallbackRegistry::new();
        let received = Arc::new(RwLock::new(None::<f64>));
        let received_clone = received.clone();

        registry.on_state_changed(move |state| {
            *received_clone.write() = state.stack();
        });

        let mut state = RoofState::new();
        let delta: StateDelta =
            serde_json::from_str(r#"{"current_roof_positions":{"stack":64.0}}"#).unwrap();
        state.merge(&delta, UpdateSource::Push);

        registry.dispatch_state(&state);
        assert_eq!(*received.read(), Some(64.0));
    }

    #[test]
    fn registry_refresh_failed_callback() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        registry.on_refresh_failed(move |_error| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        let error = Error::from(ProtocolError::ConnectionFailed("HTTP 500".into()));
        registry.dispatch_refresh_failed(&error);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registry_multiple_callbacks() {
        let registry = CallbackRegistry::new();
        let counter1 = Arc::new(AtomicU32::new(0));
        let counter2 = Arc::new(AtomicU32::new(0));
        let c1 = counter1.clone();
        let c2 = counter2.clone();

        registry.on_state_changed(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        registry.on_state_changed(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch_state(&RoofState::new());

        assert_eq!(counter1.load(Ordering::SeqCst), 1);
        assert_eq!(counter2.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registry_unsubscribe_nonexistent() {
        let registry = CallbackRegistry::new();
        assert!(!registry.unsubscribe(SubscriptionId::new(999)));
    }

    #[test]
    fn registry_clear() {
        let registry = CallbackRegistry::new();
        registry.on_state_changed(|_| {});
        registry.on_refresh_failed(|_| {});

        assert_eq!(registry.callback_count(), 2);
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn registry_unique_ids() {
        let registry = CallbackRegistry::new();
        let id1 = registry.on_state_changed(|_| {});
        let id2 = registry.on_refresh_failed(|_| {});
        assert_ne!(id1, id2);
    }

    #[test]
    fn registry_debug() {
        let registry = CallbackRegistry::new();
        registry.on_state_changed(|_| {});

        let debug = format!("{registry:?}");
        assert!(debug.contains("CallbackRegistry"));
        assert!(debug.contains("callback_count"));
    }
}
