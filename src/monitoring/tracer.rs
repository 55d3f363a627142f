/*!
 * Structured Tracing
 * Subscriber setup and timed spans for workload phases
 *
 * Features:
 * - Environment-driven filtering (`RUST_LOG`)
 * - JSON-formatted logs for structured parsing
 * - Slow-phase warnings with elapsed time embedded in the event
 */

use std::time::Instant;
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SYNC_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("SYNC_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Timed span around one phase of a workload
///
/// Logs completion on drop; phases slower than `slow_ms` are reported
/// at warn level.
pub struct PhaseSpan {
    span: Span,
    start: Instant,
    phase: &'static str,
    slow_ms: u128,
}

impl PhaseSpan {
    pub fn new(phase: &'static str, slow_ms: u128) -> Self {
        let span = span!(
            Level::DEBUG,
            "phase",
            phase = phase,
            items_processed = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );

        {
            let _entered = span.enter();
            debug!(phase, "phase started");
        }

        Self {
            span,
            start: Instant::now(),
            phase,
            slow_ms,
        }
    }

    /// Record items processed count
    pub fn record_items_processed(&self, count: u64) {
        self.span.record("items_processed", count);
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// The underlying span, for handing to worker threads
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for PhaseSpan {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_millis();
        self.span.record("duration_ms", duration_ms as u64);
        let _entered = self.span.enter();

        if duration_ms > self.slow_ms {
            warn!(
                phase = self.phase,
                duration_ms = duration_ms as u64,
                slow = true,
                "slow phase detected"
            );
        } else {
            debug!(phase = self.phase, duration_ms = duration_ms as u64, "phase completed");
        }
    }
}

/// Helper to create a phase span
#[inline]
pub fn span_phase(phase: &'static str, slow_ms: u128) -> PhaseSpan {
    PhaseSpan::new(phase, slow_ms)
}
