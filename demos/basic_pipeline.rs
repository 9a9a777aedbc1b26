//! Basic pipeline example: decide and enforce the status of a few elements.
//!
//! This example shows how to:
//! - Load a declarative configuration from JSON
//! - Build the decision and enforcement points with in-memory collaborators
//! - Watch a banned storage element go through Probing before Active
//!
//! Run with: cargo run --example basic_pipeline

use gridstatus::notify::{InMemoryMask, RecordingNotifier};
use gridstatus::prelude::*;
use serde_json::json;
use std::sync::Arc;

const CONFIG: &str = r#"{
    "policies": [
        {"name": "SE_Space", "policyType": "SpaceTokenOccupancy",
         "matchParams": {"elementType": "StorageElement"}},
        {"name": "Site_Downtime", "policyType": "Downtime",
         "matchParams": {"element": "Site"}},
        {"name": "Site_Pilots", "policyType": "PilotEfficiency",
         "matchParams": {"element": "Site"}}
    ],
    "policyActions": [
        {"name": "LogResults", "actionType": "LogPolicyResultAction"},
        {"name": "Notify", "actionType": "AlarmAction", "status": ["Banned", "Probing"]},
        {"name": "Mask", "actionType": "RealBanAction", "status": ["Banned", "Active", "Degraded"]},
        {"name": "LogStatus", "actionType": "LogStatusAction"}
    ],
    "assigneeGroups": [
        {"name": "storage-shifters", "users": ["shifters@example.org"],
         "notifications": "Mail", "matchParams": {"elementType": "StorageElement"}}
    ]
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Gridstatus Basic Pipeline Example ===\n");

    let config = Arc::new(StatusConfig::from_json_str(CONFIG)?);

    // Signals the monitoring commands would return
    let commands = Arc::new(
        StaticCommandSource::new()
            .with_value(
                "SpaceTokenOccupancyCommand",
                json!({"Total": 500, "Free": 0.05, "Guaranteed": 500}),
            )
            .with_value("DowntimeCommand", json!(null))
            .with_value(
                "PilotCommand",
                json!({"Aborted": 2, "Deleted": 0, "Done": 95, "Failed": 3}),
            ),
    );

    let store = Arc::new(InMemoryStatusStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let mask = Arc::new(InMemoryMask::new());

    let pdp = PolicyDecisionPoint::new(config.clone(), PolicyRegistry::builtin(), commands.clone())?;
    let registry = ActionRegistry::builtin(
        store.clone(),
        notifier.clone(),
        mask.clone(),
        config.clone(),
        RealBanConfig::new().with_operations_address("grid-ops@example.org"),
    );
    let pep = PolicyEnforcementPoint::new(registry, &config)?;
    let pipeline = StatusPipeline::new(pdp, pep);

    // A healthy site
    let site = DecisionParams::new(ElementFamily::Site, "LCG.CERN.ch", "Site", "all")
        .with_status(StatusValue::Active);
    let outcome = pipeline.run(&site).await?;
    println!(
        "{}: {} ({})",
        site.name, outcome.decision.status, outcome.decision.reason
    );

    // A storage element running out of space
    let mut disk =
        DecisionParams::new(ElementFamily::Resource, "CERN-DISK", "StorageElement", "WriteAccess")
            .with_status(StatusValue::Active);

    for (cycle, free) in [0.05, 20.0, 20.0].into_iter().enumerate() {
        commands.set(
            "SpaceTokenOccupancyCommand",
            Ok(json!({"Total": 500, "Free": free, "Guaranteed": 500})),
        );
        let outcome = pipeline.run(&disk).await?;
        println!(
            "cycle {}: {} {} -> {} ({}), {} action(s), all ok: {}",
            cycle + 1,
            disk.name,
            disk.status,
            outcome.decision.status,
            outcome.decision.reason,
            outcome.report.len(),
            outcome.report.is_success()
        );
        disk = disk.with_status(outcome.decision.status);
    }

    println!("\n=== Side effects ===");
    for row in store.rows() {
        println!("status row: {} {} = {}", row.name, row.status_type, row.status);
    }
    for mail in notifier.mails() {
        println!("mail to {:?}: {}", mail.recipients, mail.subject);
    }
    println!("mask changes: {}", mask.changes().len());

    Ok(())
}
