//! Generic status state machine.

use crate::core::StatusValue;

use std::collections::HashMap;

/// One state of a [`StateMachine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Severity level; lower is more severe.
    level: u8,
    /// States reachable from this one. Empty means every state is reachable.
    allowed_next: Vec<StatusValue>,
    /// Where a disallowed transition lands instead.
    default: Option<StatusValue>,
}

impl State {
    /// Creates a state that accepts every transition.
    pub fn unrestricted(level: u8) -> Self {
        Self {
            level,
            allowed_next: Vec::new(),
            default: None,
        }
    }

    /// Creates a state that only moves to `allowed_next`, falling back to `default`.
    pub fn restricted(level: u8, allowed_next: Vec<StatusValue>, default: StatusValue) -> Self {
        Self {
            level,
            allowed_next,
            default: Some(default),
        }
    }

    /// Returns the severity level.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Returns the states reachable from this one (empty means all).
    pub fn allowed_next(&self) -> &[StatusValue] {
        &self.allowed_next
    }

    /// Returns the state actually reached when `next` is requested.
    pub fn transition_rule(&self, next: StatusValue) -> StatusValue {
        if self.allowed_next.is_empty() || self.allowed_next.contains(&next) {
            return next;
        }
        self.default.unwrap_or(next)
    }
}

/// A table-driven state machine over [`StatusValue`]s.
#[derive(Debug, Clone)]
pub struct StateMachine {
    states: HashMap<StatusValue, State>,
    current: StatusValue,
}

impl StateMachine {
    /// Creates a machine in state `initial`.
    pub fn new(states: HashMap<StatusValue, State>, initial: StatusValue) -> Self {
        Self {
            states,
            current: initial,
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> StatusValue {
        self.current
    }

    /// Forces the current state without applying any rule.
    pub fn set_state(&mut self, status: StatusValue) {
        self.current = status;
    }

    /// Returns the states known to this machine, most severe first.
    pub fn states(&self) -> Vec<StatusValue> {
        let mut states: Vec<StatusValue> = self.states.keys().copied().collect();
        states.sort_by_key(|s| self.level(*s));
        states
    }

    /// Returns the level of `status`, if the machine knows it.
    pub fn level(&self, status: StatusValue) -> Option<u8> {
        self.states.get(&status).map(State::level)
    }

    /// Returns the state reached from `current` when `candidate` is requested.
    ///
    /// States missing from the table accept every transition.
    pub fn transition(&self, current: StatusValue, candidate: StatusValue) -> StatusValue {
        match self.states.get(&current) {
            Some(state) => state.transition_rule(candidate),
            None => candidate,
        }
    }

    /// Returns the state reached from the current state, without moving.
    pub fn next_state(&self, candidate: StatusValue) -> StatusValue {
        self.transition(self.current, candidate)
    }

    /// Moves to the state reached from the current state and returns it.
    pub fn advance(&mut self, candidate: StatusValue) -> StatusValue {
        self.current = self.next_state(candidate);
        self.current
    }
}
