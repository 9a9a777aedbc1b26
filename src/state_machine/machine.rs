//! The resource status machine: severity ordering and the ban hysteresis.

use crate::core::{PolicyResult, StatusError, StatusValue};
use crate::state_machine::state::{State, StateMachine};

use std::collections::HashMap;

/// Severity ordering and transition guard over the six status values.
///
/// Every status moves freely to every other status except `Banned`, which
/// may only stay `Banned` or move to `Probing`. Any other candidate while
/// banned lands on `Probing`.
#[derive(Debug, Clone)]
pub struct ResourceStatusMachine {
    machine: StateMachine,
}

impl ResourceStatusMachine {
    /// Creates the machine, starting in `Unknown`.
    pub fn new() -> Self {
        Self::starting_at(StatusValue::Unknown)
    }

    /// Creates the machine in the given state.
    pub fn starting_at(initial: StatusValue) -> Self {
        let states: HashMap<StatusValue, State> = StatusValue::ALL
            .into_iter()
            .map(|status| {
                let state = match status {
                    StatusValue::Banned => State::restricted(
                        status.rank(),
                        vec![StatusValue::Banned, StatusValue::Probing],
                        StatusValue::Probing,
                    ),
                    _ => State::unrestricted(status.rank()),
                };
                (status, state)
            })
            .collect();

        Self {
            machine: StateMachine::new(states, initial),
        }
    }

    /// Returns the severity rank of `status`. Lower is more severe.
    pub fn rank(&self, status: StatusValue) -> u8 {
        self.machine.level(status).unwrap_or_else(|| status.rank())
    }

    /// Returns the severity rank of a status literal.
    ///
    /// # Errors
    ///
    /// Returns `StatusError::UnknownStatus` for anything outside the six literals.
    pub fn rank_str(&self, status: &str) -> Result<u8, StatusError> {
        Ok(self.rank(status.parse()?))
    }

    /// Sorts results by severity, most severe first.
    ///
    /// The sort is stable, so among equally severe results the first
    /// configured policy stays first.
    pub fn order_by_severity(&self, mut results: Vec<PolicyResult>) -> Vec<PolicyResult> {
        results.sort_by_key(|result| self.rank(result.status));
        results
    }

    /// Returns the status reached from `current` when `candidate` is proposed.
    pub fn next_state(&self, current: StatusValue, candidate: StatusValue) -> StatusValue {
        self.machine.transition(current, candidate)
    }

    /// Parses both literals and applies [`Self::next_state`].
    pub fn next_state_str(&self, current: &str, candidate: &str) -> Result<StatusValue, StatusError> {
        Ok(self.next_state(current.parse()?, candidate.parse()?))
    }

    /// Returns the current state.
    pub fn current(&self) -> StatusValue {
        self.machine.current()
    }

    /// Forces the current state.
    pub fn set_state(&mut self, status: StatusValue) {
        self.machine.set_state(status);
    }

    /// Applies `candidate` to the current state, moves, and returns the new state.
    pub fn advance(&mut self, candidate: StatusValue) -> StatusValue {
        self.machine.advance(candidate)
    }

    /// Returns every state, most severe first.
    pub fn states(&self) -> Vec<StatusValue> {
        self.machine.states()
    }
}

impl Default for ResourceStatusMachine {
    fn default() -> Self {
        Self::new()
    }
}
