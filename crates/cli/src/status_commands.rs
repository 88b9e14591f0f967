use std::{sync::Arc, time::Instant};

use {
    anyhow::Result,
    chrono::Utc,
    lodestar_providers::{Provider, shared_http_client},
    lodestar_status::{ServiceStatus, Status},
    tokio_util::sync::CancellationToken,
    tracing::debug,
};

use crate::Context;

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

pub async fn handle_status(
    ctx: &Context,
    only: Option<&str>,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let selected: Vec<Arc<dyn Provider>> = match only {
        Some(name) => vec![ctx.registry.get(name)?],
        None => ctx
            .registry
            .providers()
            .filter(|p| ctx.config.providers.is_enabled(p.name()))
            .cloned()
            .collect(),
    };

    let checks = selected
        .iter()
        .map(|provider| poll(provider.as_ref(), cancel));
    let statuses = futures::future::join_all(checks).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
    } else {
        print_statuses(&statuses);
    }
    Ok(())
}

/// One timed check, wrapped into the aggregate record.
async fn poll(provider: &dyn Provider, cancel: &CancellationToken) -> ServiceStatus {
    let started = Instant::now();
    let result = provider.check_status(shared_http_client(), cancel).await;
    let elapsed = started.elapsed();
    debug!(
        provider = provider.name(),
        status = %result.status(),
        elapsed = ?elapsed,
        "polled provider"
    );
    ServiceStatus::from_result(provider.name(), result, Utc::now(), Some(elapsed))
        .with_status_url(provider.status_checker().status_url())
}

fn print_statuses(statuses: &[ServiceStatus]) {
    for status in statuses {
        let color = match status.status {
            Status::Operational => GREEN,
            Status::Degraded => YELLOW,
            Status::Down => RED,
        };
        let elapsed = status
            .response_time
            .map(|ms| format!("{ms}ms"))
            .unwrap_or_default();
        println!(
            "{:<14} {color}{:<12}{RESET} {:>7}  {}",
            status.provider,
            status.status.as_str(),
            elapsed,
            status.message
        );
        for incident in &status.incidents {
            println!("{:<14} - {incident}", "");
        }
    }
}
