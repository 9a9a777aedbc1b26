//! Status cache example: serve decisions while a background task refreshes them.
//!
//! This example shows how to:
//! - Seed a status store with known elements
//! - Refresh a cache of decisions from the pipeline in the background
//! - Read decisions without waiting on a recompute
//!
//! Run with: cargo run --example status_cache

use gridstatus::notify::{InMemoryMask, RecordingNotifier};
use gridstatus::prelude::*;
use gridstatus::store::StatusRecord;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Gridstatus Status Cache Example ===\n");

    let config = Arc::new(
        StatusConfig::new()
            .with_policy(
                PolicyDeclaration::new("CE_Jobs", "JobEfficiency")
                    .with_match(MatchParams::any().with_element_type("ComputingElement")),
            )
            .with_policy(
                PolicyDeclaration::new("SE_Space", "FreeDiskSpaceRatio")
                    .with_match(MatchParams::any().with_element_type("StorageElement")),
            ),
    );

    let commands = Arc::new(
        StaticCommandSource::new()
            .with_value("JobCommand", json!({"Completed": 40, "Done": 50, "Failed": 10}))
            .with_value("FreeDiskSpaceCommand", json!({"Total": 1000, "Free": 30})),
    );

    let store = Arc::new(InMemoryStatusStore::with_rows(vec![
        StatusRecord::new(
            ElementFamily::Resource,
            "ce01.cern.ch",
            "all",
            StatusValue::Active,
            "initial",
            "ComputingElement",
        ),
        StatusRecord::new(
            ElementFamily::Resource,
            "CERN-DISK",
            "ReadAccess",
            StatusValue::Active,
            "initial",
            "StorageElement",
        ),
    ]));

    let pdp = PolicyDecisionPoint::new(config.clone(), PolicyRegistry::builtin(), commands.clone())?;
    let registry = ActionRegistry::builtin(
        store.clone(),
        Arc::new(RecordingNotifier::new()),
        Arc::new(InMemoryMask::new()),
        config.clone(),
        RealBanConfig::new(),
    );
    let pep = PolicyEnforcementPoint::new(registry, &config)?;
    let pipeline = Arc::new(StatusPipeline::new(pdp, pep));

    let refresher = Arc::new(DecisionRefresher::new(store.clone(), pipeline));
    let cache = Arc::new(StatusCache::new(
        CacheConfig::new().with_lifetime(Duration::from_millis(200)),
        refresher,
    )?);

    cache.start();
    tokio::time::sleep(Duration::from_millis(50)).await;

    for key in [("ce01.cern.ch", "all"), ("CERN-DISK", "ReadAccess")] {
        match cache.get(key.0, key.1) {
            Some(decision) => println!("{}#{}: {} ({})", key.0, key.1, decision.status, decision.reason),
            None => println!("{}#{}: not cached yet", key.0, key.1),
        }
    }

    // The disk fills up; the next refresh picks it up
    commands.set("FreeDiskSpaceCommand", Ok(json!({"Total": 1000, "Free": 5})));
    cache.reset();
    println!("\nAfter reset: {:?}", cache.get("CERN-DISK", "ReadAccess").map(|d| d.status));

    tokio::time::sleep(Duration::from_millis(300)).await;
    if let Some(decision) = cache.get("CERN-DISK", "ReadAccess") {
        println!("After refresh: {} ({})", decision.status, decision.reason);
    }

    cache.stop();
    tokio::time::sleep(Duration::from_millis(250)).await;
    println!("\nCache running: {}", cache.is_running());

    Ok(())
}
