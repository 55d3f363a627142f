/*!
 * Sync Stress - Main Entry Point
 *
 * Runs the reader/writer/auditor workload against the locks and containers
 * and reports cache accounting. Configured entirely through environment
 * variables (see `WorkloadConfig::from_env`).
 */

use ai_os_sync::{init_tracing, workload, WorkloadConfig};
use anyhow::Context;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = WorkloadConfig::from_env().context("Failed to load workload configuration")?;
    info!(?config, "Configuration loaded");

    let report = workload::run(&config).context("Workload failed")?;

    info!(
        hits = report.cache.hits,
        misses = report.cache.misses,
        hit_rate = report.cache.hit_rate,
        evictions = report.cache.evictions,
        size = report.cache.size,
        upgrades = report.upgrades,
        elapsed_ms = report.elapsed_ms,
        "Stress run finished"
    );

    let print_json = std::env::var("SYNC_REPORT_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);
    if print_json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    }

    Ok(())
}
