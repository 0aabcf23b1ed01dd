//! Dentara — clinical-image review workflow engine for dental screening.
//!
//! Pipeline: upload → quality gate → anomaly detection → risk scoring →
//! review workflow, with notifications and appointment scheduling hanging
//! off risk and review outcomes. Detection and quality scoring sit behind
//! traits; the bundled implementations are stand-ins for a real vision
//! model.

pub mod config;
pub mod db;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod scheduling;
pub mod session;
pub mod workflow;

pub use pipeline::error::WorkflowError;
pub use pipeline::ScreeningProcessor;
pub use workflow::ReviewWorkflow;

use tracing_subscriber::EnvFilter;

/// Initialize tracing with RUST_LOG, falling back to the crate default.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}
