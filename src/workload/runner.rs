/*!
 * Workload Runner
 */

use super::{WorkloadConfig, WorkloadError};
use crate::core::data_structures::{BoundedCache, CacheStats, ConcurrentArray};
use crate::core::errors::SyncResult;
use crate::core::sync::{LockStats, UpgradeableLock};
use crate::monitoring::span_phase;
use serde::Serialize;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;
use tracing::{debug, info};

/// Outcome of one stress run
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadReport {
    pub cache: CacheStats,
    /// `get` calls issued by all readers
    pub reads: u64,
    /// Keys the writer inserted and logged
    pub logged_keys: usize,
    /// Audits that found new log entries and upgraded
    pub upgrades: u64,
    pub watermark: u64,
    pub watermark_lock: LockStats,
    pub elapsed_ms: u64,
}

/// Execute the workload described by `config`
///
/// Blocks until every worker has joined. Fails if a worker panics, if the
/// auditor trips a lock protocol error, or if the cache ends up violating
/// its size or accounting guarantees.
pub fn run(config: &WorkloadConfig) -> Result<WorkloadReport, WorkloadError> {
    config.validate()?;

    let phase = span_phase("workload", 1_000);
    let _entered = phase.enter();

    let cache = BoundedCache::with_config(config.cache);
    for key in 0..config.seed_keys as u64 {
        cache.put(key, key);
    }
    let log = ConcurrentArray::with_capacity(config.writes);
    let watermark = UpgradeableLock::new(0u64);

    info!(
        readers = config.readers,
        reads_per_reader = config.reads_per_reader,
        writes = config.writes,
        capacity = config.cache.capacity,
        policy = %config.cache.policy,
        "Starting workload"
    );
    let start = Instant::now();

    let (reads, upgrades) = thread::scope(|s| -> Result<(u64, u64), WorkloadError> {
        let (cache, log, watermark) = (&cache, &log, &watermark);
        let readers: Vec<_> = (0..config.readers)
            .map(|id| {
                let span = phase.span().clone();
                s.spawn(move || span.in_scope(|| read_loop(cache, id, config)))
            })
            .collect();
        let span = phase.span().clone();
        let writer = s.spawn(move || span.in_scope(|| write_loop(cache, log, config)));
        let span = phase.span().clone();
        let auditor =
            s.spawn(move || span.in_scope(|| audit_loop(watermark, log, config.audit_rounds)));

        // every handle is joined before any failure is reported
        let readers = join_all(readers, "reader");
        let writer = join_worker(writer, "writer".into());
        let auditor = join_worker(auditor, "auditor".into());

        let reads = readers?.into_iter().sum::<u64>();
        writer?;
        let upgrades = auditor??;
        Ok((reads, upgrades))
    })?;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    let stats = cache.stats();
    verify(config, &stats, reads, log.size())?;

    phase.record_items_processed(reads + config.writes as u64);
    info!(
        hits = stats.hits,
        misses = stats.misses,
        evictions = stats.evictions,
        size = stats.size,
        upgrades,
        elapsed_ms,
        "Workload complete"
    );

    let watermark_value = *watermark.read();
    Ok(WorkloadReport {
        cache: stats,
        reads,
        logged_keys: log.size(),
        upgrades,
        watermark: watermark_value,
        watermark_lock: watermark.stats(),
        elapsed_ms,
    })
}

fn read_loop(cache: &BoundedCache<u64, u64>, id: usize, config: &WorkloadConfig) -> u64 {
    // seed keys plus the first two keys the writer will insert
    let span = (config.seed_keys + 2) as u64;
    let mut issued = 0u64;
    for i in 0..config.reads_per_reader as u64 {
        let key = (id as u64 + i) % span;
        cache.get(&key);
        issued += 1;
    }
    debug!(reader = id, issued, "Reader finished");
    issued
}

fn write_loop(cache: &BoundedCache<u64, u64>, log: &ConcurrentArray<u64>, config: &WorkloadConfig) {
    let first = config.seed_keys as u64;
    for key in first..first + config.writes as u64 {
        cache.put(key, key * 10);
        log.push_back(key);
    }
    debug!(writes = config.writes, "Writer finished");
}

/// Raise the watermark to the newest logged key, upgrading only when it moved
fn audit_loop(
    watermark: &UpgradeableLock<u64>,
    log: &ConcurrentArray<u64>,
    rounds: usize,
) -> SyncResult<u64> {
    let mut upgrades = 0u64;
    for _ in 0..rounds {
        let len = log.size();
        if len == 0 {
            thread::yield_now();
            continue;
        }
        let newest = log.get(len - 1)?;

        let guard = watermark.upgradable_read();
        if newest > *guard {
            let mut writer = guard.upgrade();
            *writer = newest;
            drop(writer.downgrade());
            upgrades += 1;
        }
        thread::yield_now();
    }
    debug!(upgrades, "Auditor finished");
    Ok(upgrades)
}

fn join_worker<T>(handle: ScopedJoinHandle<'_, T>, name: String) -> Result<T, WorkloadError> {
    handle
        .join()
        .map_err(|_| WorkloadError::WorkerPanicked(name))
}

/// Join every handle, then report the first worker that panicked
fn join_all<T>(handles: Vec<ScopedJoinHandle<'_, T>>, role: &str) -> Result<Vec<T>, WorkloadError> {
    let results: Vec<_> = handles
        .into_iter()
        .enumerate()
        .map(|(id, handle)| join_worker(handle, format!("{role}-{id}")))
        .collect();
    results.into_iter().collect()
}

fn verify(
    config: &WorkloadConfig,
    stats: &CacheStats,
    reads: u64,
    logged: usize,
) -> Result<(), WorkloadError> {
    if stats.size > config.cache.capacity {
        return Err(WorkloadError::InvariantViolated(format!(
            "cache holds {} entries, capacity {}",
            stats.size, config.cache.capacity
        )));
    }
    if stats.hits + stats.misses != reads || reads != config.total_reads() {
        return Err(WorkloadError::InvariantViolated(format!(
            "{} hits + {} misses for {} reads (expected {})",
            stats.hits,
            stats.misses,
            reads,
            config.total_reads()
        )));
    }
    if logged != config.writes {
        return Err(WorkloadError::InvariantViolated(format!(
            "logged {logged} keys, expected {}",
            config.writes
        )));
    }
    Ok(())
}
