//! Audit metrics: the per-run snapshot and its persisted form
//!
//! A [`MetricsSnapshot`] holds the category scores and timing measurements
//! of a single audit run. A [`PerformanceDataPoint`] is that snapshot plus
//! provenance (test name, URL, timestamp, commit, build, environment) and is
//! what the history and baseline stores persist.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::config::Provenance;
use crate::error::{Error, Result};

/// Scores and timings from one audit run.
///
/// Category scores are fractions in `[0, 1]`; timings are milliseconds;
/// cumulative layout shift is unitless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsSnapshot {
    pub performance_score: f64,
    pub accessibility_score: f64,
    pub best_practices_score: f64,
    pub seo_score: f64,
    pub first_contentful_paint: f64,
    pub largest_contentful_paint: f64,
    pub speed_index: f64,
    pub total_blocking_time: f64,
    pub cumulative_layout_shift: f64,

    /// Rendered audit artifact, if the auditor produced one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
}

impl MetricsSnapshot {
    /// Build a snapshot from an already-parsed audit report.
    ///
    /// Absent or `null` values read as `0.0`; the auditor reports `null`
    /// for categories it could not score.
    pub fn from_lighthouse_value(root: &Value) -> Result<Self> {
        if !root.is_object() {
            return Err(Error::InvalidReport(
                "report root is not a JSON object".to_string(),
            ));
        }

        let number_at = |pointer: &str| root.pointer(pointer).and_then(Value::as_f64).unwrap_or(0.0);

        Ok(Self {
            performance_score: number_at("/categories/performance/score"),
            accessibility_score: number_at("/categories/accessibility/score"),
            best_practices_score: number_at("/categories/best-practices/score"),
            seo_score: number_at("/categories/seo/score"),
            first_contentful_paint: number_at("/audits/first-contentful-paint/numericValue"),
            largest_contentful_paint: number_at("/audits/largest-contentful-paint/numericValue"),
            speed_index: number_at("/audits/speed-index/numericValue"),
            total_blocking_time: number_at("/audits/total-blocking-time/numericValue"),
            cumulative_layout_shift: number_at("/audits/cumulative-layout-shift/numericValue"),
            report_path: None,
        })
    }

    /// Parse a snapshot from audit report JSON text
    pub fn from_lighthouse_json(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        Self::from_lighthouse_value(&root)
    }

    /// Load a snapshot from a `*.report.json` file on disk.
    ///
    /// `report_path` points at the HTML sibling when the auditor wrote one,
    /// otherwise at the JSON file itself.
    pub fn from_report_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut snapshot = Self::from_lighthouse_json(&content)?;

        let json_path = path.to_string_lossy().to_string();
        let html_path = json_path
            .strip_suffix(".report.json")
            .map(|base| format!("{}.report.html", base))
            .filter(|html| Path::new(html).exists());

        debug!("Loaded audit report from {}", path.display());
        snapshot.report_path = Some(html_path.unwrap_or(json_path));
        Ok(snapshot)
    }

    pub fn with_report_path(mut self, report_path: impl Into<String>) -> Self {
        self.report_path = Some(report_path.into());
        self
    }

    pub fn performance_percent(&self) -> f64 {
        self.performance_score * 100.0
    }

    pub fn accessibility_percent(&self) -> f64 {
        self.accessibility_score * 100.0
    }

    pub fn best_practices_percent(&self) -> f64 {
        self.best_practices_score * 100.0
    }

    pub fn seo_percent(&self) -> f64 {
        self.seo_score * 100.0
    }

    /// Mean of the four category scores, as a percentage
    pub fn average_percent(&self) -> f64 {
        (self.performance_score
            + self.accessibility_score
            + self.best_practices_score
            + self.seo_score)
            / 4.0
            * 100.0
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "performance={:.1}, accessibility={:.1}, bestPractices={:.1}, seo={:.1}, FCP={:.0}ms, LCP={:.0}ms",
            self.performance_percent(),
            self.accessibility_percent(),
            self.best_practices_percent(),
            self.seo_percent(),
            self.first_contentful_paint,
            self.largest_contentful_paint,
        )
    }
}

/// A snapshot recorded for a named test, with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceDataPoint {
    pub test_name: String,

    #[serde(default)]
    pub url: String,

    /// ISO-8601 creation time
    #[serde(default)]
    pub timestamp: String,

    #[serde(default = "Provenance::default_git_commit")]
    pub git_commit: String,

    #[serde(default = "Provenance::default_build_number")]
    pub build_number: String,

    #[serde(default = "Provenance::default_environment")]
    pub environment: String,

    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

impl PerformanceDataPoint {
    /// Create a data point stamped with the current time
    pub fn new(
        metrics: MetricsSnapshot,
        test_name: impl Into<String>,
        url: impl Into<String>,
        provenance: &Provenance,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            url: url.into(),
            timestamp: now_timestamp(),
            git_commit: provenance.git_commit.clone(),
            build_number: provenance.build_number.clone(),
            environment: provenance.environment.clone(),
            metrics,
        }
    }

    /// Re-stamp the point with the current time
    pub fn touch(&mut self) {
        self.timestamp = now_timestamp();
    }

    pub fn snapshot(&self) -> &MetricsSnapshot {
        &self.metrics
    }

    pub fn into_snapshot(self) -> MetricsSnapshot {
        self.metrics
    }
}

/// Current time as an RFC 3339 string with millisecond precision
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
