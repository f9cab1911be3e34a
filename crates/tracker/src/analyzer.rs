//! Regression analysis against a stored baseline
//!
//! The analyzer compares a fresh snapshot with the test's baseline, checks
//! the recent history for a downward trend, classifies severity, and then
//! records the snapshot into history. A test without a baseline gets the
//! snapshot as its baseline and a clean analysis.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use perftrack_common::{
    MetricsSnapshot, PerformanceDataPoint, Provenance, RegressionThresholds, Result, TrackerConfig,
};

use crate::store::{BaselineStore, HistoryStore};

/// Advisory detail appended when recent scores keep dropping
pub const TREND_ADVISORY: &str =
    "Consistent downward trend detected in performance scores over recent runs";

/// Coarse ranking of how serious detected regressions are
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "NONE"),
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// Metrics compared against the baseline, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackedMetric {
    #[serde(rename = "Performance Score")]
    PerformanceScore,
    #[serde(rename = "Largest Contentful Paint")]
    LargestContentfulPaint,
    #[serde(rename = "First Contentful Paint")]
    FirstContentfulPaint,
    #[serde(rename = "Cumulative Layout Shift")]
    CumulativeLayoutShift,
}

impl TrackedMetric {
    pub fn label(&self) -> &'static str {
        match self {
            TrackedMetric::PerformanceScore => "Performance Score",
            TrackedMetric::LargestContentfulPaint => "Largest Contentful Paint",
            TrackedMetric::FirstContentfulPaint => "First Contentful Paint",
            TrackedMetric::CumulativeLayoutShift => "Cumulative Layout Shift",
        }
    }
}

impl fmt::Display for TrackedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Relative change of one metric against the baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricChange {
    pub metric: TrackedMetric,
    /// Signed percent change; `None` when the baseline value is zero
    pub percent: Option<f64>,
}

/// Outcome of one analysis call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionAnalysis {
    pub has_regression: bool,
    pub regression_details: Vec<String>,
    pub performance_changes: Vec<MetricChange>,
    pub severity: Severity,
}

impl RegressionAnalysis {
    /// Percent change recorded for a metric, looked up by its label
    pub fn change(&self, label: &str) -> Option<f64> {
        self.performance_changes
            .iter()
            .find(|c| c.metric.label() == label)
            .and_then(|c| c.percent)
    }

    pub fn change_for(&self, metric: TrackedMetric) -> Option<f64> {
        self.change(metric.label())
    }

    fn record_change(&mut self, metric: TrackedMetric, percent: Option<f64>) {
        debug!("{} change: {:?}", metric, percent);
        self.performance_changes.push(MetricChange { metric, percent });
    }

    fn flag(&mut self, detail: String) {
        self.has_regression = true;
        self.regression_details.push(detail);
    }
}

/// `(current - baseline) / baseline * 100`, or `None` for a zero baseline
pub fn percent_change(current: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 {
        None
    } else {
        Some((current - baseline) / baseline * 100.0)
    }
}

/// Whether at least `ratio` of adjacent moves in `values` go down.
///
/// Sequences shorter than `min_points` never form a trend.
pub fn is_downward_trend(values: &[f64], min_points: usize, ratio: f64) -> bool {
    if values.len() < min_points.max(2) {
        return false;
    }

    let downward = values.windows(2).filter(|pair| pair[1] < pair[0]).count();
    downward as f64 / (values.len() - 1) as f64 >= ratio
}

/// Compares snapshots against stored baselines and history
pub struct RegressionAnalyzer<'a, H: ?Sized, B: ?Sized> {
    history: &'a H,
    baselines: &'a B,
    thresholds: RegressionThresholds,
    provenance: Provenance,
}

impl<'a, H, B> RegressionAnalyzer<'a, H, B>
where
    H: HistoryStore + ?Sized,
    B: BaselineStore + ?Sized,
{
    pub fn new(history: &'a H, baselines: &'a B) -> Self {
        Self {
            history,
            baselines,
            thresholds: RegressionThresholds::default(),
            provenance: Provenance::default(),
        }
    }

    pub fn from_config(history: &'a H, baselines: &'a B, config: &TrackerConfig) -> Self {
        Self::new(history, baselines)
            .with_thresholds(config.thresholds.clone())
            .with_provenance(config.provenance.clone())
    }

    pub fn with_thresholds(mut self, thresholds: RegressionThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn thresholds(&self) -> &RegressionThresholds {
        &self.thresholds
    }

    /// Analyze `current` for `test_name` and record it into history.
    ///
    /// Storage failures are propagated; nothing else fails.
    pub fn analyze(
        &self,
        current: &MetricsSnapshot,
        test_name: &str,
        url: &str,
    ) -> Result<RegressionAnalysis> {
        let Some(baseline) = self.baselines.get(test_name)? else {
            info!(
                "No baseline found for '{}', establishing current run as baseline",
                test_name
            );
            let point = self.data_point(current, test_name, url);
            self.history.append(test_name, point.clone())?;
            self.baselines.set_if_absent(test_name, point)?;
            return Ok(RegressionAnalysis::default());
        };

        let recent = self.history.recent(test_name, self.thresholds.trend_window)?;

        let mut analysis = RegressionAnalysis::default();
        self.compare_to_baseline(&mut analysis, current, baseline.snapshot());
        self.check_trend(&mut analysis, &recent);
        analysis.severity = self.classify(&analysis);

        self.history
            .append(test_name, self.data_point(current, test_name, url))?;

        if analysis.has_regression {
            warn!(
                "Performance regression detected in '{}' (severity: {})",
                test_name, analysis.severity
            );
            for detail in &analysis.regression_details {
                warn!("  - {}", detail);
            }
        } else {
            info!("No performance regression detected for '{}'", test_name);
        }

        Ok(analysis)
    }

    fn data_point(&self, current: &MetricsSnapshot, test_name: &str, url: &str) -> PerformanceDataPoint {
        PerformanceDataPoint::new(current.clone(), test_name, url, &self.provenance)
    }

    fn compare_to_baseline(
        &self,
        analysis: &mut RegressionAnalysis,
        current: &MetricsSnapshot,
        baseline: &MetricsSnapshot,
    ) {
        let t = &self.thresholds;

        let perf = percent_change(current.performance_score, baseline.performance_score);
        analysis.record_change(TrackedMetric::PerformanceScore, perf);
        if let Some(change) = perf.filter(|c| *c < -t.score_drop_percent) {
            analysis.flag(format!(
                "Performance score regressed by {:.1}% (from {:.1}% to {:.1}%)",
                change.abs(),
                baseline.performance_percent(),
                current.performance_percent()
            ));
        }

        let lcp = percent_change(current.largest_contentful_paint, baseline.largest_contentful_paint);
        analysis.record_change(TrackedMetric::LargestContentfulPaint, lcp);
        if let Some(change) = lcp.filter(|c| *c > t.timing_increase_percent) {
            analysis.flag(format!(
                "LCP regressed by {:.1}% (from {:.0}ms to {:.0}ms)",
                change, baseline.largest_contentful_paint, current.largest_contentful_paint
            ));
        }

        let fcp = percent_change(current.first_contentful_paint, baseline.first_contentful_paint);
        analysis.record_change(TrackedMetric::FirstContentfulPaint, fcp);
        if let Some(change) = fcp.filter(|c| *c > t.timing_increase_percent) {
            analysis.flag(format!(
                "FCP regressed by {:.1}% (from {:.0}ms to {:.0}ms)",
                change, baseline.first_contentful_paint, current.first_contentful_paint
            ));
        }

        // CLS is only comparable against a non-zero baseline
        if baseline.cumulative_layout_shift > 0.0 {
            let cls = percent_change(current.cumulative_layout_shift, baseline.cumulative_layout_shift);
            analysis.record_change(TrackedMetric::CumulativeLayoutShift, cls);
            if let Some(change) = cls.filter(|c| *c > t.layout_shift_increase_percent) {
                analysis.flag(format!(
                    "CLS regressed by {:.1}% (from {:.3} to {:.3})",
                    change, baseline.cumulative_layout_shift, current.cumulative_layout_shift
                ));
            }
        }
    }

    /// Adds an advisory detail only; a trend alone is not a regression.
    fn check_trend(&self, analysis: &mut RegressionAnalysis, recent: &[PerformanceDataPoint]) {
        let t = &self.thresholds;
        if recent.len() < t.min_trend_points {
            return;
        }

        let scores: Vec<f64> = recent
            .iter()
            .map(|p| p.metrics.performance_score)
            .collect();

        if is_downward_trend(&scores, t.min_trend_points, t.downward_trend_ratio) {
            analysis.regression_details.push(TREND_ADVISORY.to_string());
        }
    }

    fn classify(&self, analysis: &RegressionAnalysis) -> Severity {
        if !analysis.has_regression {
            return Severity::None;
        }

        let severe = analysis
            .performance_changes
            .iter()
            .filter_map(|c| c.percent)
            .filter(|p| p.abs() > self.thresholds.severe_change_percent)
            .count();

        if severe > 0 {
            Severity::High
        } else if analysis.regression_details.len() > 2 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use test_case::test_case;

    fn snapshot(performance: f64, lcp: f64, fcp: f64, cls: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            performance_score: performance,
            accessibility_score: 0.9,
            best_practices_score: 0.9,
            seo_score: 0.9,
            first_contentful_paint: fcp,
            largest_contentful_paint: lcp,
            speed_index: 3000.0,
            total_blocking_time: 150.0,
            cumulative_layout_shift: cls,
            report_path: None,
        }
    }

    fn with_baseline(store: &MemoryStore, baseline: MetricsSnapshot) {
        let point = PerformanceDataPoint::new(baseline, "home", "https://example.com/", &Provenance::default());
        store.force_set("home", point).unwrap();
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_first_run_establishes_baseline() {
        let store = MemoryStore::new();
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.8, 2000.0, 1500.0, 0.05), "home", "https://example.com/")
            .unwrap();

        assert!(!analysis.has_regression);
        assert_eq!(analysis.severity, Severity::None);
        assert!(analysis.regression_details.is_empty());
        assert!(analysis.performance_changes.is_empty());

        let baseline = store.get("home").unwrap().unwrap();
        assert_eq!(baseline.metrics.performance_score, 0.8);
        assert_eq!(baseline.url, "https://example.com/");
        assert_eq!(store.all("home").unwrap().len(), 1);
    }

    #[test]
    fn test_performance_score_regression() {
        let store = MemoryStore::new();
        with_baseline(&store, snapshot(0.80, 2000.0, 1500.0, 0.05));
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.60, 2000.0, 1500.0, 0.05), "home", "https://example.com/")
            .unwrap();

        assert!(analysis.has_regression);
        assert_eq!(
            analysis.regression_details,
            vec!["Performance score regressed by 25.0% (from 80.0% to 60.0%)".to_string()]
        );
        assert!(approx(analysis.change("Performance Score").unwrap(), -25.0));
        assert_eq!(analysis.severity, Severity::Low);
    }

    #[test_case(2500.0, true ; "25 percent slower regresses")]
    #[test_case(2300.0, false ; "15 percent slower is tolerated")]
    #[test_case(2400.0, false ; "exactly 20 percent is tolerated")]
    #[test_case(1500.0, false ; "faster never regresses")]
    fn test_lcp_threshold(current_lcp: f64, regressed: bool) {
        let store = MemoryStore::new();
        with_baseline(&store, snapshot(0.8, 2000.0, 1500.0, 0.05));
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.8, current_lcp, 1500.0, 0.05), "home", "")
            .unwrap();

        assert_eq!(analysis.has_regression, regressed);
        let lcp_detail = analysis
            .regression_details
            .iter()
            .any(|d| d.starts_with("LCP regressed"));
        assert_eq!(lcp_detail, regressed);
    }

    #[test]
    fn test_lcp_detail_message() {
        let store = MemoryStore::new();
        with_baseline(&store, snapshot(0.8, 2000.0, 1500.0, 0.05));
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.8, 2500.0, 1500.0, 0.05), "home", "")
            .unwrap();
        assert_eq!(
            analysis.regression_details,
            vec!["LCP regressed by 25.0% (from 2000ms to 2500ms)".to_string()]
        );
    }

    #[test]
    fn test_changes_are_recorded_in_evaluation_order() {
        let store = MemoryStore::new();
        with_baseline(&store, snapshot(0.8, 2000.0, 1500.0, 0.05));
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.8, 2000.0, 1500.0, 0.05), "home", "")
            .unwrap();
        let order: Vec<TrackedMetric> = analysis.performance_changes.iter().map(|c| c.metric).collect();
        assert_eq!(
            order,
            vec![
                TrackedMetric::PerformanceScore,
                TrackedMetric::LargestContentfulPaint,
                TrackedMetric::FirstContentfulPaint,
                TrackedMetric::CumulativeLayoutShift,
            ]
        );
        assert!(!analysis.has_regression);
        assert_eq!(analysis.severity, Severity::None);
    }

    #[test]
    fn test_zero_cls_baseline_skips_cls() {
        let store = MemoryStore::new();
        with_baseline(&store, snapshot(0.8, 2000.0, 1500.0, 0.0));
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.8, 2000.0, 1500.0, 0.4), "home", "")
            .unwrap();
        assert_eq!(analysis.performance_changes.len(), 3);
        assert!(analysis.change_for(TrackedMetric::CumulativeLayoutShift).is_none());
        assert!(!analysis.has_regression);
    }

    #[test]
    fn test_cls_regression() {
        let store = MemoryStore::new();
        with_baseline(&store, snapshot(0.8, 2000.0, 1500.0, 0.1));
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.8, 2000.0, 1500.0, 0.2), "home", "")
            .unwrap();
        assert!(analysis.has_regression);
        assert_eq!(
            analysis.regression_details,
            vec!["CLS regressed by 100.0% (from 0.100 to 0.200)".to_string()]
        );
        assert_eq!(analysis.severity, Severity::High);
    }

    #[test]
    fn test_zero_baseline_is_unavailable_not_infinite() {
        let store = MemoryStore::new();
        with_baseline(&store, snapshot(0.0, 2000.0, 0.0, 0.05));
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.5, 2000.0, 1200.0, 0.05), "home", "")
            .unwrap();

        assert_eq!(analysis.performance_changes.len(), 4);
        assert_eq!(analysis.performance_changes[0].percent, None);
        assert_eq!(analysis.performance_changes[2].percent, None);
        assert!(analysis
            .performance_changes
            .iter()
            .filter_map(|c| c.percent)
            .all(f64::is_finite));
        assert!(!analysis.has_regression);
    }

    #[test]
    fn test_severity_high_on_large_change() {
        let store = MemoryStore::new();
        with_baseline(&store, snapshot(0.8, 2000.0, 1500.0, 0.05));
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.8, 2700.0, 1500.0, 0.05), "home", "")
            .unwrap();
        assert_eq!(analysis.regression_details.len(), 1);
        assert_eq!(analysis.severity, Severity::High);
    }

    #[test]
    fn test_severity_counts_any_large_change() {
        // A large improvement still marks a regressing run as HIGH
        let store = MemoryStore::new();
        with_baseline(&store, snapshot(0.5, 2000.0, 1500.0, 0.05));
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.75, 2500.0, 1500.0, 0.05), "home", "")
            .unwrap();
        assert!(approx(analysis.change_for(TrackedMetric::PerformanceScore).unwrap(), 50.0));
        assert_eq!(analysis.regression_details.len(), 1);
        assert_eq!(analysis.severity, Severity::High);
    }

    #[test]
    fn test_severity_medium_on_many_moderate_regressions() {
        let store = MemoryStore::new();
        with_baseline(&store, snapshot(0.8, 2000.0, 1000.0, 0.05));
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.64, 2500.0, 1250.0, 0.05), "home", "")
            .unwrap();
        assert_eq!(analysis.regression_details.len(), 3);
        assert_eq!(analysis.severity, Severity::Medium);
    }

    #[test]
    fn test_downward_trend_is_advisory_only() {
        let store = MemoryStore::new();
        with_baseline(&store, snapshot(0.85, 2000.0, 1500.0, 0.05));
        for score in [0.95, 0.92, 0.90, 0.88] {
            let point = PerformanceDataPoint::new(
                snapshot(score, 2000.0, 1500.0, 0.05),
                "home",
                "",
                &Provenance::default(),
            );
            store.append("home", point).unwrap();
        }
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.86, 2000.0, 1500.0, 0.05), "home", "")
            .unwrap();

        assert_eq!(analysis.regression_details, vec![TREND_ADVISORY.to_string()]);
        assert!(!analysis.has_regression);
        assert_eq!(analysis.severity, Severity::None);
    }

    #[test]
    fn test_trend_advisory_counts_toward_medium() {
        let current = snapshot(0.8, 2500.0, 1250.0, 0.05);

        // Two timing regressions alone are LOW
        let flat = MemoryStore::new();
        with_baseline(&flat, snapshot(0.8, 2000.0, 1000.0, 0.05));
        let analysis = RegressionAnalyzer::new(&flat, &flat)
            .analyze(&current, "home", "")
            .unwrap();
        assert_eq!(analysis.regression_details.len(), 2);
        assert_eq!(analysis.severity, Severity::Low);

        // The same run over a falling history gets the advisory as a third detail
        let falling = MemoryStore::new();
        with_baseline(&falling, snapshot(0.8, 2000.0, 1000.0, 0.05));
        for score in [0.9, 0.8, 0.7] {
            let point = PerformanceDataPoint::new(
                snapshot(score, 2000.0, 1000.0, 0.05),
                "home",
                "",
                &Provenance::default(),
            );
            falling.append("home", point).unwrap();
        }

        let analysis = RegressionAnalyzer::new(&falling, &falling)
            .analyze(&current, "home", "")
            .unwrap();
        assert_eq!(analysis.regression_details.len(), 3);
        assert_eq!(analysis.regression_details[2], TREND_ADVISORY);
        assert!(approx(analysis.change_for(TrackedMetric::PerformanceScore).unwrap(), 0.0));
        assert_eq!(analysis.severity, Severity::Medium);
    }

    #[test]
    fn test_trend_needs_three_points() {
        let store = MemoryStore::new();
        with_baseline(&store, snapshot(0.85, 2000.0, 1500.0, 0.05));
        for score in [0.95, 0.90] {
            let point = PerformanceDataPoint::new(
                snapshot(score, 2000.0, 1500.0, 0.05),
                "home",
                "",
                &Provenance::default(),
            );
            store.append("home", point).unwrap();
        }
        let analyzer = RegressionAnalyzer::new(&store, &store);

        let analysis = analyzer
            .analyze(&snapshot(0.86, 2000.0, 1500.0, 0.05), "home", "")
            .unwrap();
        assert!(analysis.regression_details.is_empty());
    }

    #[test]
    fn test_every_analysis_is_recorded() {
        let store = MemoryStore::new();
        let analyzer = RegressionAnalyzer::new(&store, &store).with_provenance(Provenance {
            git_commit: "abc123".to_string(),
            build_number: "7".to_string(),
            environment: "ci".to_string(),
        });

        for perf in [0.8, 0.5, 0.81] {
            analyzer
                .analyze(&snapshot(perf, 2000.0, 1500.0, 0.05), "home", "https://example.com/")
                .unwrap();
        }

        let history = store.all("home").unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|p| p.git_commit == "abc123" && p.environment == "ci"));
        // The baseline is the first run, never replaced by later ones
        assert_eq!(store.get("home").unwrap().unwrap().metrics.performance_score, 0.8);
    }

    #[test_case(&[0.9, 0.8, 0.7], true ; "all down")]
    #[test_case(&[0.9, 0.8, 0.85, 0.7, 0.6], true ; "three of four down")]
    #[test_case(&[0.9, 0.8, 0.85, 0.86, 0.7], false ; "half down")]
    #[test_case(&[0.9, 0.8], false ; "too short")]
    #[test_case(&[0.7, 0.7, 0.7], false ; "flat")]
    fn test_is_downward_trend(values: &[f64], expected: bool) {
        assert_eq!(is_downward_trend(values, 3, 0.7), expected);
    }

    #[test]
    fn test_percent_change_guard() {
        assert_eq!(percent_change(5.0, 0.0), None);
        assert!(approx(percent_change(2500.0, 2000.0).unwrap(), 25.0));
    }
}
