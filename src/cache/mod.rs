//! A time-bounded cache of decisions in front of the pipeline.
//!
//! The [`StatusCache`] serves the last computed decision of each element
//! axis to many concurrent readers, while one background task recomputes
//! the whole set every lifetime through a [`CacheRefresher`].

mod config;
mod refresher;
mod status_cache;

pub use config::CacheConfig;
pub use refresher::{CacheRefresher, DecisionRefresher};
pub use status_cache::StatusCache;
