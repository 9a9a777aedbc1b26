//! Core types for the gridstatus library.
//!
//! This module provides the fundamental building blocks used throughout
//! the library:
//!
//! - [`types`] - Status values, element families and decision parameters
//! - [`result`] - Policy and enforcement results
//! - [`error`] - Structured error types

pub mod error;
pub mod result;
pub mod types;

pub use error::{
    CommandError, ErrorKind, NotifyError, StatusError, StatusResult, StoreError, StoreResult,
};
pub use result::{Decision, EnforcementResult, PolicyActionRef, PolicyInfo, PolicyResult};
pub use types::{cache_key, DecisionParams, ElementFamily, ElementKey, StatusValue};
