//! Producers of full cache snapshots.

use crate::core::{cache_key, DecisionParams, EnforcementResult, StatusResult};
use crate::pep::StatusPipeline;
use crate::store::{StatusFilter, StatusStore};

use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

/// Computes a complete snapshot of decisions keyed by `name#statusType`.
#[async_trait]
pub trait CacheRefresher: Send + Sync + Debug {
    /// Recomputes every decision.
    async fn refresh(&self) -> StatusResult<HashMap<String, EnforcementResult>>;
}

/// Recomputes the decision of every element known to the status store.
#[derive(Debug)]
pub struct DecisionRefresher {
    store: Arc<dyn StatusStore>,
    pipeline: Arc<StatusPipeline>,
    filter: StatusFilter,
    enforce: bool,
}

impl DecisionRefresher {
    /// Creates a refresher deciding without enforcing.
    pub fn new(store: Arc<dyn StatusStore>, pipeline: Arc<StatusPipeline>) -> Self {
        Self {
            store,
            pipeline,
            filter: StatusFilter::new(),
            enforce: false,
        }
    }

    /// Restricts the elements refreshed.
    pub fn with_filter(mut self, filter: StatusFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Also runs the enforcement point for every element.
    pub fn with_enforce(mut self, enforce: bool) -> Self {
        self.enforce = enforce;
        self
    }

    async fn decide(&self, params: &DecisionParams) -> StatusResult<EnforcementResult> {
        if self.enforce {
            Ok(self.pipeline.run(params).await?.decision)
        } else {
            Ok(self.pipeline.pdp().decide(params).await?.enforcement)
        }
    }
}

#[async_trait]
impl CacheRefresher for DecisionRefresher {
    async fn refresh(&self) -> StatusResult<HashMap<String, EnforcementResult>> {
        let rows = self.store.select_status(&self.filter).await?;

        let mut seen = HashSet::new();
        let elements: Vec<DecisionParams> = rows
            .into_iter()
            .filter(|row| seen.insert(cache_key(&row.name, &row.status_type)))
            .map(|row| {
                let params = DecisionParams::new(
                    row.element,
                    row.name,
                    row.element_type,
                    row.status_type,
                )
                .with_status(row.status)
                .with_reason(row.reason)
                .with_token_owner(row.token_owner);
                match row.vo {
                    Some(vo) => params.with_vo(vo),
                    None => params,
                }
            })
            .collect();

        let decisions = join_all(elements.iter().map(|params| self.decide(params))).await;

        let mut snapshot = HashMap::with_capacity(elements.len());
        let mut first_error = None;
        for (params, decision) in elements.iter().zip(decisions) {
            match decision {
                Ok(result) => {
                    snapshot.insert(params.cache_key(), result);
                }
                Err(e) => {
                    tracing::warn!(
                        name = %params.name,
                        status_type = %params.status_type,
                        error = %e,
                        "Skipping element in cache refresh"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if snapshot.is_empty() => Err(e),
            _ => Ok(snapshot),
        }
    }
}
