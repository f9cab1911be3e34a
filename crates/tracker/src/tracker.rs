//! Orchestration facade
//!
//! [`PerformanceTracker`] owns a store and a sink and runs the
//! record → analyze → report cycle for one audited page at a time.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use perftrack_common::{MetricsSnapshot, PerformanceDataPoint, Result, TrackerConfig};

use crate::analyzer::{RegressionAnalysis, RegressionAnalyzer};
use crate::report;
use crate::sink::{Attachment, AttachmentSink, ContentType, DirectorySink};
use crate::store::{BaselineStore, FileStore, HistoryStore};

pub const SUMMARY_ATTACHMENT: &str = "Performance Summary";
pub const CHART_ATTACHMENT: &str = "Core Web Vitals Chart";
pub const SCORECARD_ATTACHMENT: &str = "Performance Scorecard";
pub const METRICS_ATTACHMENT: &str = "Lighthouse Metrics Summary";
pub const REGRESSION_ATTACHMENT: &str = "Regression Analysis";
pub const TREND_ATTACHMENT: &str = "Performance Trend Analysis";
pub const TREND_CSV_ATTACHMENT: &str = "Trend Data";
pub const COMPARISON_ATTACHMENT: &str = "Performance Comparison";

const HTML_REPORT_SUFFIX: &str = ".report.html";
const JSON_REPORT_SUFFIX: &str = ".report.json";

/// Store, analyzer and sink wired together
pub struct PerformanceTracker<S, K> {
    store: S,
    sink: K,
    config: TrackerConfig,
}

impl PerformanceTracker<FileStore, DirectorySink> {
    /// File-backed tracker configured from `PERFTRACK_*` variables,
    /// writing attachments under `attachments_dir`
    pub fn from_env(attachments_dir: impl Into<PathBuf>) -> Result<Self> {
        let config = TrackerConfig::from_env()?;
        let store = FileStore::from_config(&config)?;
        Ok(Self::new(store, DirectorySink::new(attachments_dir), config))
    }
}

impl<S, K> PerformanceTracker<S, K>
where
    S: HistoryStore + BaselineStore,
    K: AttachmentSink,
{
    pub fn new(store: S, sink: K, config: TrackerConfig) -> Self {
        Self { store, sink, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn analyzer(&self) -> RegressionAnalyzer<'_, S, S> {
        RegressionAnalyzer::from_config(&self.store, &self.store, &self.config)
    }

    /// Attach the summary, web vitals chart and scorecard for one run
    pub fn attach_dashboard(&self, snapshot: &MetricsSnapshot, test_name: &str, url: &str) -> Result<()> {
        self.sink.attach(Attachment::markdown(
            SUMMARY_ATTACHMENT,
            report::render_summary(snapshot, test_name, url),
        ))?;
        self.sink.attach(Attachment::markdown(
            CHART_ATTACHMENT,
            report::render_web_vitals_chart(snapshot),
        ))?;
        self.sink.attach(Attachment::markdown(
            SCORECARD_ATTACHMENT,
            report::render_scorecard(snapshot),
        ))?;

        info!("Performance dashboard created for '{}'", test_name);
        Ok(())
    }

    /// Attach the plain-text metrics listing for one run
    pub fn attach_metrics(&self, snapshot: &MetricsSnapshot, url: &str) -> Result<()> {
        self.sink.attach(Attachment::text(
            METRICS_ATTACHMENT,
            report::render_metrics_text(snapshot, url),
        ))
    }

    /// Publish the run's scores and timings as sink parameters
    pub fn publish_parameters(&self, snapshot: &MetricsSnapshot, test_name: &str, url: &str) -> Result<()> {
        self.publish(report::run_parameters(snapshot, test_name, url))
    }

    /// Attach the auditor's own report files.
    ///
    /// The file at `report_path` is attached when it exists. An HTML report
    /// also brings along its `.report.json` sibling when present. Missing
    /// files are skipped.
    pub fn attach_audit_reports(&self, snapshot: &MetricsSnapshot, test_name: &str) -> Result<()> {
        let Some(report_path) = snapshot.report_path.as_deref() else {
            return Ok(());
        };

        self.attach_report_file(Path::new(report_path), test_name)?;
        if let Some(stem) = report_path.strip_suffix(HTML_REPORT_SUFFIX) {
            let json_path = format!("{}{}", stem, JSON_REPORT_SUFFIX);
            self.attach_report_file(Path::new(&json_path), test_name)?;
        }
        Ok(())
    }

    /// Full cycle for one audited page.
    ///
    /// Attaches the metrics listing, the auditor's report files and the
    /// dashboard, analyzes against the baseline (recording the run), attaches
    /// the regression analysis if one was found, then attaches the trend
    /// report for the test's history. Run values and the regression verdict
    /// are published as parameters along the way.
    pub fn audit_with_regression_tracking(
        &self,
        snapshot: &MetricsSnapshot,
        test_name: &str,
        url: &str,
    ) -> Result<RegressionAnalysis> {
        self.attach_metrics(snapshot, url)?;
        self.attach_audit_reports(snapshot, test_name)?;
        self.publish_parameters(snapshot, test_name, url)?;
        self.attach_dashboard(snapshot, test_name, url)?;

        let analysis = self.analyzer().analyze(snapshot, test_name, url)?;
        self.publish(report::regression_parameters(&analysis))?;
        if analysis.has_regression {
            self.sink.attach(Attachment::markdown(
                REGRESSION_ATTACHMENT,
                report::render_regression_analysis(&analysis, test_name),
            ))?;
        }

        self.performance_report(test_name)?;
        Ok(analysis)
    }

    /// Replace the baseline for `test_name` with this run
    pub fn set_baseline(&self, snapshot: &MetricsSnapshot, test_name: &str, url: &str) -> Result<()> {
        let point = self.data_point(snapshot, test_name, url);
        self.store.force_set(test_name, point)
    }

    /// Record a run without analysis; the first run becomes the baseline
    pub fn record(&self, snapshot: &MetricsSnapshot, test_name: &str, url: &str) -> Result<()> {
        let point = self.data_point(snapshot, test_name, url);
        self.store.append(test_name, point.clone())?;
        self.store.set_if_absent(test_name, point)?;

        info!("Performance metrics recorded for '{}'", test_name);
        Ok(())
    }

    /// Attach the trend report and CSV for the test's retained history.
    ///
    /// Does nothing when no history exists.
    pub fn performance_report(&self, test_name: &str) -> Result<()> {
        let history: Vec<MetricsSnapshot> = self
            .store
            .all(test_name)?
            .into_iter()
            .map(PerformanceDataPoint::into_snapshot)
            .collect();

        if history.is_empty() {
            info!("No historical data available for performance report: {}", test_name);
            return Ok(());
        }

        self.sink.attach(Attachment::markdown(
            TREND_ATTACHMENT,
            report::render_trend_report(&history, test_name),
        ))?;
        self.sink.attach(Attachment::csv(
            TREND_CSV_ATTACHMENT,
            report::render_trend_csv(&history),
        ))?;

        info!("Performance report created for '{}'", test_name);
        Ok(())
    }

    /// Attach a comparison of two arbitrary snapshots and publish the
    /// category deltas
    pub fn compare(&self, baseline: &MetricsSnapshot, current: &MetricsSnapshot, name: &str) -> Result<()> {
        self.sink.attach(Attachment::markdown(
            COMPARISON_ATTACHMENT,
            report::render_comparison(baseline, current, name),
        ))?;
        self.publish(report::comparison_parameters(baseline, current, name))
    }

    fn publish(&self, parameters: Vec<(&'static str, String)>) -> Result<()> {
        for (name, value) in parameters {
            self.sink.parameter(name, &value)?;
        }
        Ok(())
    }

    fn attach_report_file(&self, path: &Path, test_name: &str) -> Result<()> {
        if !path.is_file() {
            debug!("Audit report not found: {}", path.display());
            return Ok(());
        }

        let content_type = ContentType::from_path(path);
        let label = match content_type {
            ContentType::Html => "HTML",
            ContentType::Json => "JSON",
            _ => "File",
        };
        let body = std::fs::read(path)?;

        self.sink.attach(Attachment::new(
            format!("{} - Lighthouse {} Report", test_name, label),
            content_type,
            String::from_utf8_lossy(&body).into_owned(),
        ))
    }

    fn data_point(&self, snapshot: &MetricsSnapshot, test_name: &str, url: &str) -> PerformanceDataPoint {
        PerformanceDataPoint::new(snapshot.clone(), test_name, url, &self.config.provenance)
    }
}
