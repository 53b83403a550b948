// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tri-state cycle control (open, stop, close, stop).
//!
//! Wall switches and single-button remotes drive the roof with one action
//! that alternates between opening and closing, stopping first when the
//! roof is in motion. The device itself only reports a 3-valued motion
//! signal (idle / moving+opening / moving+closing), so a 2-state direction
//! memory is layered on top: it tracks the last observed movement direction
//! and decides what the next press should do.
//!
//! The memory resets to `Closing` on every process start while the roof may
//! already be fully open, hence the stack >= 100 fallback in the decision
//! rule.

use parking_lot::Mutex;

use crate::state::RoofState;
use crate::types::CycleDirection;

/// Rounded stack value at or above which the roof counts as fully open.
const STACK_FULLY_OPEN: f64 = 100.0;

/// Command chosen by a cycle decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleAction {
    /// Stop the current movement.
    Stop,
    /// Open the roof.
    Open,
    /// Fully close: fold the slats flat.
    FullClose,
}

/// Direction memory and decision logic for the cycle control.
///
/// # Examples
///
/// ```
/// use pergor_lib::cycle::{CycleAction, CycleController};
/// use pergor_lib::state::RoofState;
/// use pergor_lib::types::CycleDirection;
///
/// let controller = CycleController::new();
/// assert_eq!(controller.direction(), CycleDirection::Closing);
///
/// // First press on an idle, closed roof opens it
/// let action = controller.decide(&RoofState::new());
/// assert_eq!(action, CycleAction::Open);
/// ```
#[derive(Debug, Default)]
pub struct CycleController {
    direction: Mutex<CycleDirection>,
}

impl CycleController {
    /// Creates a controller with the direction memory at its default
    /// (`Closing`, so the first press opens).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current direction memory.
    #[must_use]
    pub fn direction(&self) -> CycleDirection {
        *self.direction.lock()
    }

    /// Updates the direction memory from a state snapshot.
    ///
    /// Called on every reconciler merge: while the drive reports itself as
    /// moving, its direction is classified into the opening or closing set;
    /// every other state leaves the memory unchanged.
    pub fn observe(&self, state: &RoofState) {
        let Some(device) = state.roof_device() else {
            return;
        };
        if !device.is_moving() {
            return;
        }
        if let Some(direction) = device.direction.cycle_direction() {
            *self.direction.lock() = direction;
        }
    }

    /// Decides what a cycle press should do, given the current state.
    ///
    /// Pure with respect to the memory: the chosen action is only recorded
    /// via [`commit`](Self::commit) once its command has been issued.
    #[must_use]
    pub fn decide(&self, state: &RoofState) -> CycleAction {
        if state.is_moving() {
            return CycleAction::Stop;
        }

        let opening = self.direction() == CycleDirection::Opening;
        let fully_stacked = state
            .stack()
            .is_some_and(|stack| stack.round() >= STACK_FULLY_OPEN);

        if opening || fully_stacked {
            CycleAction::FullClose
        } else {
            CycleAction::Open
        }
    }

    /// Records an issued action in the direction memory.
    pub fn commit(&self, action: CycleAction) {
        match action {
            CycleAction::Open => *self.direction.lock() = CycleDirection::Opening,
            CycleAction::FullClose => *self.direction.lock() = CycleDirection::Closing,
            CycleAction::Stop => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{StateDelta, UpdateSource};

    fn state(json: &str) -> RoofState {
        let mut state = RoofState::new();
        let delta: StateDelta = serde_json::from_str(json).unwrap();
        state.merge(&delta, UpdateSource::Push);
        state
    }

    #[test]
    fn default_memory_is_closing() {
        let controller = CycleController::new();
        assert_eq!(controller.direction(), CycleDirection::Closing);
    }

    #[test]
    fn closed_idle_roof_opens() {
        let controller = CycleController::new();
        let state = state(r#"{"state":"ready","current_roof_positions":{"stack":0.0,"tilt":0.0}}"#);

        let action = controller.decide(&state);
        assert_eq!(action, CycleAction::Open);

        controller.commit(action);
        assert_eq!(controller.direction(), CycleDirection::Opening);
    }

    #[test]
    fn moving_roof_always_stops() {
        let controller = CycleController::new();

        let moving = state(r#"{"roof_device":{"state":"moving","direction":"stacking"}}"#);
        assert_eq!(controller.decide(&moving), CycleAction::Stop);

        controller.commit(CycleAction::Open);
        assert_eq!(controller.decide(&moving), CycleAction::Stop);

        // Stop leaves the memory untouched
        controller.commit(CycleAction::Stop);
        assert_eq!(controller.direction(), CycleDirection::Opening);
    }

    #[test]
    fn opening_memory_closes_next() {
        let controller = CycleController::new();
        controller.commit(CycleAction::Open);

        let idle = state(r#"{"state":"ready","current_roof_positions":{"stack":40.0,"tilt":10.0}}"#);
        let action = controller.decide(&idle);
        assert_eq!(action, CycleAction::FullClose);

        controller.commit(action);
        assert_eq!(controller.direction(), CycleDirection::Closing);
    }

    #[test]
    fn fully_stacked_roof_closes_despite_closing_memory() {
        // Memory resets to closing on process start, but the roof may
        // already be fully open; the stack fallback overrides memory.
        let controller = CycleController::new();
        assert_eq!(controller.direction(), CycleDirection::Closing);

        let open = state(r#"{"state":"ready","current_roof_positions":{"stack":100.0,"tilt":90.0}}"#);
        assert_eq!(controller.decide(&open), CycleAction::FullClose);
    }

    #[test]
    fn almost_full_stack_rounds_up() {
        let controller = CycleController::new();
        let open = state(r#"{"state":"ready","current_roof_positions":{"stack":99.7,"tilt":90.0}}"#);
        assert_eq!(controller.decide(&open), CycleAction::FullClose);
    }

    #[test]
    fn observe_tracks_moving_direction() {
        let controller = CycleController::new();

        controller.observe(&state(
            r#"{"roof_device":{"state":"moving","direction":"tilting_open"}}"#,
        ));
        assert_eq!(controller.direction(), CycleDirection::Opening);

        controller.observe(&state(
            r#"{"roof_device":{"state":"moving","direction":"unstacking"}}"#,
        ));
        assert_eq!(controller.direction(), CycleDirection::Closing);
    }

    #[test]
    fn observe_ignores_idle_and_unknown() {
        let controller = CycleController::new();
        controller.commit(CycleAction::Open);

        // Idle drive leaves memory unchanged
        controller.observe(&state(
            r#"{"roof_device":{"state":"idle","direction":"unstacking"}}"#,
        ));
        assert_eq!(controller.direction(), CycleDirection::Opening);

        // Unknown direction while moving leaves memory unchanged
        controller.observe(&state(
            r#"{"roof_device":{"state":"moving","direction":"calibrating"}}"#,
        ));
        assert_eq!(controller.direction(), CycleDirection::Opening);

        // No drive status at all leaves memory unchanged
        controller.observe(&RoofState::new());
        assert_eq!(controller.direction(), CycleDirection::Opening);
    }
}
