//! Persistence of statuses, status history and policy results.
//!
//! The persistence layer is an external collaborator reached through the
//! [`StatusStore`] trait. [`InMemoryStatusStore`] keeps everything in
//! process memory.

mod memory;
mod record;
mod traits;

pub use memory::InMemoryStatusStore;
pub use record::{
    system_token_lifetime, HistoryRecord, PolicyResultRecord, StatusFilter, StatusRecord,
    SYSTEM_TOKEN_OWNER,
};
pub use traits::StatusStore;
