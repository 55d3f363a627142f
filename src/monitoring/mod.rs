/*!
 * Monitoring
 * Structured tracing setup shared by the binary and the workload runner
 */

mod tracer;

pub use tracer::{init_tracing, span_phase, PhaseSpan};
