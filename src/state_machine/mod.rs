//! Status state machine.
//!
//! Encodes the fixed severity ranking and the anti-flapping transition
//! rule used when several policy results are combined.
//!
//! ## Severity
//!
//! `Error(0) > Banned(1) > Probing(2) > Degraded(3) > Active(4) > Unknown(5)`
//!
//! ## Transitions
//!
//! - Every status may move to every other status, except:
//! - **Banned** may only stay `Banned` or move to `Probing`. Any other
//!   candidate lands on `Probing`, so a banned element needs two good
//!   readings before it is `Active` again.
//!
//! ## Usage
//!
//! ```rust
//! use gridstatus::state_machine::ResourceStatusMachine;
//! use gridstatus::StatusValue;
//!
//! let machine = ResourceStatusMachine::new();
//! assert_eq!(
//!     machine.next_state(StatusValue::Banned, StatusValue::Active),
//!     StatusValue::Probing
//! );
//! ```

mod machine;
mod state;

pub use machine::ResourceStatusMachine;
pub use state::{State, StateMachine};
