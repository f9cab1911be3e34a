//! Pass/fail gates over a single snapshot
//!
//! A failing gate lists every failing check in one `ThresholdViolation`.

use serde::{Deserialize, Serialize};
use tracing::info;

use perftrack_common::{Error, MetricsSnapshot, Result};

use crate::report::{CLS_GOOD, FCP_GOOD_MS, LCP_GOOD_MS, TBT_GOOD_MS};

/// Minimum category percentages (0-100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreThresholds {
    pub performance: f64,
    pub accessibility: f64,
    pub best_practices: f64,
    pub seo: f64,
}

impl ScoreThresholds {
    /// Lenient preset for smoke checks
    pub fn quick() -> Self {
        Self {
            performance: 50.0,
            accessibility: 80.0,
            best_practices: 70.0,
            seo: 80.0,
        }
    }

    /// Preset for full audits
    pub fn strict() -> Self {
        Self {
            performance: 70.0,
            accessibility: 90.0,
            best_practices: 80.0,
            seo: 90.0,
        }
    }
}

pub fn validate_scores(snapshot: &MetricsSnapshot, thresholds: &ScoreThresholds) -> Result<()> {
    let checks = [
        ("Performance", snapshot.performance_percent(), thresholds.performance),
        ("Accessibility", snapshot.accessibility_percent(), thresholds.accessibility),
        ("Best Practices", snapshot.best_practices_percent(), thresholds.best_practices),
        ("SEO", snapshot.seo_percent(), thresholds.seo),
    ];

    let failures: Vec<String> = checks
        .iter()
        .filter(|(_, actual, minimum)| actual < minimum)
        .map(|(name, actual, minimum)| format!("{}: {:.1}% < {:.1}%", name, actual, minimum))
        .collect();

    if !failures.is_empty() {
        return Err(Error::ThresholdViolation(format!(
            "Lighthouse scores below thresholds: {}",
            failures.join("; ")
        )));
    }

    info!("All Lighthouse scores meet the required thresholds");
    Ok(())
}

pub fn validate_core_web_vitals(snapshot: &MetricsSnapshot) -> Result<()> {
    let mut failures = Vec::new();

    if snapshot.first_contentful_paint > FCP_GOOD_MS {
        failures.push(format!(
            "FCP: {:.0}ms > {:.0}ms",
            snapshot.first_contentful_paint, FCP_GOOD_MS
        ));
    }
    if snapshot.largest_contentful_paint > LCP_GOOD_MS {
        failures.push(format!(
            "LCP: {:.0}ms > {:.0}ms",
            snapshot.largest_contentful_paint, LCP_GOOD_MS
        ));
    }
    if snapshot.cumulative_layout_shift > CLS_GOOD {
        failures.push(format!(
            "CLS: {:.3} > {}",
            snapshot.cumulative_layout_shift, CLS_GOOD
        ));
    }
    if snapshot.total_blocking_time > TBT_GOOD_MS {
        failures.push(format!(
            "TBT: {:.0}ms > {:.0}ms",
            snapshot.total_blocking_time, TBT_GOOD_MS
        ));
    }

    if !failures.is_empty() {
        return Err(Error::ThresholdViolation(format!(
            "Core Web Vitals outside recommended thresholds: {}",
            failures.join("; ")
        )));
    }

    info!("All Core Web Vitals meet the recommended thresholds");
    Ok(())
}
