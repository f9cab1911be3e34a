//! perftrack Common Library
//!
//! Shared types for the perftrack workspace: the audit metrics value
//! object, its persisted form, configuration and the error taxonomy.

pub mod config;
pub mod error;
pub mod metrics;

// Re-export commonly used types
pub use config::{Provenance, RegressionThresholds, TrackerConfig};
pub use error::{Error, Result};
pub use metrics::{MetricsSnapshot, PerformanceDataPoint};

/// perftrack version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build a file-safe name: every character outside `[A-Za-z0-9]` becomes `_`
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
