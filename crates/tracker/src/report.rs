//! Report rendering
//!
//! Every function here is pure: structured values are computed from
//! snapshots and rendered to markdown, CSV or plain text. Handing the text
//! to a sink is the caller's business.

use serde::Serialize;
use std::fmt;

use perftrack_common::metrics::now_timestamp;
use perftrack_common::MetricsSnapshot;

use crate::analyzer::RegressionAnalysis;

/// Minimum category percentages for a passing summary row
pub const PERFORMANCE_PASS: f64 = 60.0;
pub const ACCESSIBILITY_PASS: f64 = 80.0;
pub const BEST_PRACTICES_PASS: f64 = 70.0;
pub const SEO_PASS: f64 = 80.0;

/// Core Web Vitals "good" ceilings
pub const FCP_GOOD_MS: f64 = 1800.0;
pub const LCP_GOOD_MS: f64 = 2500.0;
pub const SPEED_INDEX_GOOD_MS: f64 = 3400.0;
pub const TBT_GOOD_MS: f64 = 200.0;
pub const CLS_GOOD: f64 = 0.1;

/// Timings up to this multiple of the ceiling need improvement; beyond is poor
pub const NEEDS_IMPROVEMENT_FACTOR: f64 = 1.5;

const CHART_WIDTH: usize = 50;

pub const EXCELLENT_LINE: &str =
    "✅ **Excellent Performance**: All metrics are within recommended thresholds!";

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Status of one Core Web Vital against its ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VitalStatus {
    Good,
    NeedsImprovement,
    Poor,
}

impl VitalStatus {
    /// Three-tier classification used for timing metrics
    pub fn for_timing(value: f64, threshold: f64) -> Self {
        if value <= threshold {
            VitalStatus::Good
        } else if value <= threshold * NEEDS_IMPROVEMENT_FACTOR {
            VitalStatus::NeedsImprovement
        } else {
            VitalStatus::Poor
        }
    }

    /// Pass/fail classification used for layout shift
    pub fn for_layout_shift(value: f64, threshold: f64) -> Self {
        if value <= threshold {
            VitalStatus::Good
        } else {
            VitalStatus::Poor
        }
    }
}

impl fmt::Display for VitalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalStatus::Good => write!(f, "✅ GOOD"),
            VitalStatus::NeedsImprovement => write!(f, "⚠️ NEEDS IMPROVEMENT"),
            VitalStatus::Poor => write!(f, "❌ POOR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub category: &'static str,
    pub percent: f64,
    pub minimum: f64,
    pub passed: bool,
}

impl CategoryRow {
    fn new(category: &'static str, percent: f64, minimum: f64) -> Self {
        Self {
            category,
            percent,
            minimum,
            passed: percent >= minimum,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalRow {
    pub metric: &'static str,
    pub value: f64,
    pub threshold: f64,
    /// `"ms"` for timings, empty for unitless values
    pub unit: &'static str,
    pub status: VitalStatus,
}

impl VitalRow {
    fn timing(metric: &'static str, value: f64, threshold: f64) -> Self {
        Self {
            metric,
            value,
            threshold,
            unit: "ms",
            status: VitalStatus::for_timing(value, threshold),
        }
    }

    fn format_value(&self, value: f64) -> String {
        if self.unit.is_empty() {
            format!("{:.3}", value)
        } else {
            format!("{:.0} {}", value, self.unit)
        }
    }
}

/// Category verdicts and Core Web Vitals for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub categories: Vec<CategoryRow>,
    pub vitals: Vec<VitalRow>,
}

impl PerformanceSummary {
    pub fn all_passed(&self) -> bool {
        self.categories.iter().all(|c| c.passed)
    }
}

pub fn summarize(snapshot: &MetricsSnapshot) -> PerformanceSummary {
    let categories = vec![
        CategoryRow::new("Performance", snapshot.performance_percent(), PERFORMANCE_PASS),
        CategoryRow::new("Accessibility", snapshot.accessibility_percent(), ACCESSIBILITY_PASS),
        CategoryRow::new("Best Practices", snapshot.best_practices_percent(), BEST_PRACTICES_PASS),
        CategoryRow::new("SEO", snapshot.seo_percent(), SEO_PASS),
    ];

    let vitals = vec![
        VitalRow::timing("First Contentful Paint", snapshot.first_contentful_paint, FCP_GOOD_MS),
        VitalRow::timing("Largest Contentful Paint", snapshot.largest_contentful_paint, LCP_GOOD_MS),
        VitalRow::timing("Speed Index", snapshot.speed_index, SPEED_INDEX_GOOD_MS),
        VitalRow::timing("Total Blocking Time", snapshot.total_blocking_time, TBT_GOOD_MS),
        VitalRow {
            metric: "Cumulative Layout Shift",
            value: snapshot.cumulative_layout_shift,
            threshold: CLS_GOOD,
            unit: "",
            status: VitalStatus::for_layout_shift(snapshot.cumulative_layout_shift, CLS_GOOD),
        },
    ];

    PerformanceSummary { categories, vitals }
}

/// Markdown performance summary for one audited page
pub fn render_summary(snapshot: &MetricsSnapshot, test_name: &str, url: &str) -> String {
    let summary = summarize(snapshot);
    let mut out = String::new();

    out.push_str("# Performance Analysis Report\n\n");
    out.push_str("## Test Information\n");
    out.push_str(&format!("- **Test Name**: {}\n", test_name));
    out.push_str(&format!("- **URL**: {}\n", url));
    out.push_str(&format!("- **Timestamp**: {}\n\n", now_timestamp()));

    out.push_str("## Lighthouse Scores\n");
    out.push_str("| Category | Score | Status |\n");
    out.push_str("|----------|--------|--------|\n");
    for row in &summary.categories {
        let status = if row.passed { "✅ PASS" } else { "❌ FAIL" };
        out.push_str(&format!("| {} | {:.1}% | {} |\n", row.category, row.percent, status));
    }

    out.push_str("\n## Core Web Vitals\n");
    out.push_str("| Metric | Value | Threshold | Status |\n");
    out.push_str("|--------|-------|-----------|--------|\n");
    for row in &summary.vitals {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            row.metric,
            row.format_value(row.value),
            row.format_value(row.threshold),
            row.status
        ));
    }

    out
}

// ---------------------------------------------------------------------------
// Scorecard
// ---------------------------------------------------------------------------

/// Letter grade for the mean category score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 90.0 {
            Grade::APlus
        } else if percent >= 80.0 {
            Grade::A
        } else if percent >= 70.0 {
            Grade::B
        } else if percent >= 60.0 {
            Grade::C
        } else if percent >= 50.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// Traffic-light marker for a category percentage
pub fn score_indicator(percent: f64) -> &'static str {
    if percent >= 90.0 {
        "🟢"
    } else if percent >= 70.0 {
        "🟡"
    } else {
        "🔴"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub average_percent: f64,
    pub grade: Grade,
    /// Triggered recommendation lines in a fixed order
    pub recommendations: Vec<&'static str>,
}

impl Scorecard {
    pub fn is_excellent(&self) -> bool {
        self.recommendations.is_empty()
    }
}

pub fn scorecard(snapshot: &MetricsSnapshot) -> Scorecard {
    let average_percent = snapshot.average_percent();

    let checks: [(bool, &'static str); 6] = [
        (
            snapshot.performance_percent() < PERFORMANCE_PASS,
            "🚀 **Improve Performance**: Consider optimizing images, minifying CSS/JS, and enabling compression",
        ),
        (
            snapshot.accessibility_percent() < ACCESSIBILITY_PASS,
            "♿ **Enhance Accessibility**: Add alt text to images, improve color contrast, and ensure keyboard navigation",
        ),
        (
            snapshot.best_practices_percent() < BEST_PRACTICES_PASS,
            "🛡️ **Follow Best Practices**: Use HTTPS, avoid deprecated APIs, and ensure console is error-free",
        ),
        (
            snapshot.seo_percent() < SEO_PASS,
            "🔍 **Optimize SEO**: Add meta descriptions, improve heading structure, and ensure mobile-friendliness",
        ),
        (
            snapshot.largest_contentful_paint > LCP_GOOD_MS,
            "⚡ **Reduce LCP**: Optimize images and critical rendering path for faster loading",
        ),
        (
            snapshot.cumulative_layout_shift > CLS_GOOD,
            "📐 **Fix Layout Shifts**: Set size attributes on images and avoid inserting content above existing content",
        ),
    ];

    Scorecard {
        average_percent,
        grade: Grade::from_percent(average_percent),
        recommendations: checks
            .into_iter()
            .filter_map(|(triggered, line)| triggered.then_some(line))
            .collect(),
    }
}

pub fn render_scorecard(snapshot: &MetricsSnapshot) -> String {
    let card = scorecard(snapshot);
    let mut out = String::new();

    out.push_str("# Performance Scorecard\n\n");
    out.push_str("## Overall Performance Grade\n");
    out.push_str(&format!("### Grade: {} ({:.1}%)\n\n", card.grade, card.average_percent));

    out.push_str("## Detailed Breakdown\n");
    let breakdown = [
        ("🚀", "Performance", snapshot.performance_percent()),
        ("♿", "Accessibility", snapshot.accessibility_percent()),
        ("🛡️", "Best Practices", snapshot.best_practices_percent()),
        ("🔍", "SEO", snapshot.seo_percent()),
    ];
    for (icon, name, percent) in breakdown {
        out.push_str(&format!(
            "- {} **{}**: {} {:.1}%\n",
            icon,
            name,
            score_indicator(percent),
            percent
        ));
    }
    out.push('\n');

    out.push_str("## Recommendations\n");
    if card.is_excellent() {
        out.push_str(EXCELLENT_LINE);
        out.push('\n');
    } else {
        for line in &card.recommendations {
            out.push_str(&format!("- {}\n", line));
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Web vitals chart and plain text
// ---------------------------------------------------------------------------

/// `[████░░░░] 42.0%` style bar, clamped to `width` cells and 100%
pub fn progress_bar(value: f64, max: f64, width: usize) -> String {
    let ratio = if max > 0.0 { (value / max).max(0.0) } else { 0.0 };
    let filled = ((ratio * width as f64) as usize).min(width);

    let mut bar = String::with_capacity(width * 3 + 12);
    bar.push('[');
    bar.push_str(&"█".repeat(filled));
    bar.push_str(&"░".repeat(width - filled));
    bar.push_str(&format!("] {:.1}%", (ratio * 100.0).min(100.0)));
    bar
}

pub fn render_web_vitals_chart(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();

    out.push_str("# Core Web Vitals Visualization\n\n");
    out.push_str("```\n");
    out.push_str("Core Web Vitals Performance Chart\n");
    out.push_str("=====================================\n\n");

    out.push_str(&format!(
        "First Contentful Paint (FCP): {:.0} ms\n{}\n\n",
        snapshot.first_contentful_paint,
        progress_bar(snapshot.first_contentful_paint, 3000.0, CHART_WIDTH)
    ));
    out.push_str(&format!(
        "Largest Contentful Paint (LCP): {:.0} ms\n{}\n\n",
        snapshot.largest_contentful_paint,
        progress_bar(snapshot.largest_contentful_paint, 4000.0, CHART_WIDTH)
    ));
    out.push_str(&format!(
        "Cumulative Layout Shift (CLS): {:.3}\n{}\n\n",
        snapshot.cumulative_layout_shift,
        progress_bar(snapshot.cumulative_layout_shift * 1000.0, 250.0, CHART_WIDTH)
    ));

    out.push_str("```\n");
    out
}

/// Plain-text metrics listing attached next to the raw audit
pub fn render_metrics_text(snapshot: &MetricsSnapshot, url: &str) -> String {
    let mut out = String::new();

    out.push_str("Lighthouse Performance Report\n");
    out.push_str("=============================\n");
    out.push_str(&format!("URL: {}\n", url));
    out.push_str(&format!("Timestamp: {}\n\n", now_timestamp()));

    out.push_str("Category Scores:\n");
    out.push_str(&format!("- Performance: {:.1}%\n", snapshot.performance_percent()));
    out.push_str(&format!("- Accessibility: {:.1}%\n", snapshot.accessibility_percent()));
    out.push_str(&format!("- Best Practices: {:.1}%\n", snapshot.best_practices_percent()));
    out.push_str(&format!("- SEO: {:.1}%\n\n", snapshot.seo_percent()));

    out.push_str("Core Web Vitals:\n");
    out.push_str(&format!("- First Contentful Paint (FCP): {:.0} ms\n", snapshot.first_contentful_paint));
    out.push_str(&format!("- Largest Contentful Paint (LCP): {:.0} ms\n", snapshot.largest_contentful_paint));
    out.push_str(&format!("- Speed Index: {:.0} ms\n", snapshot.speed_index));
    out.push_str(&format!("- Total Blocking Time (TBT): {:.0} ms\n", snapshot.total_blocking_time));
    out.push_str(&format!("- Cumulative Layout Shift (CLS): {:.3}\n", snapshot.cumulative_layout_shift));

    out
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

/// Whether a metric is better higher (scores) or lower (timings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricKind {
    Score,
    Timing,
}

/// Side-by-side values used by trend and comparison tables
fn tabulated(snapshot: &MetricsSnapshot) -> [(&'static str, MetricKind, f64); 6] {
    [
        ("Performance", MetricKind::Score, snapshot.performance_percent()),
        ("Accessibility", MetricKind::Score, snapshot.accessibility_percent()),
        ("Best Practices", MetricKind::Score, snapshot.best_practices_percent()),
        ("SEO", MetricKind::Score, snapshot.seo_percent()),
        ("FCP (ms)", MetricKind::Timing, snapshot.first_contentful_paint),
        ("LCP (ms)", MetricKind::Timing, snapshot.largest_contentful_paint),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Up,
    Down,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    pub metric: &'static str,
    pub previous: f64,
    pub current: f64,
    /// Absolute change, in the metric's display unit
    pub change: f64,
}

impl TrendRow {
    pub fn direction(&self) -> Direction {
        if self.change.abs() < 0.1 {
            Direction::Unchanged
        } else if self.change > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    fn change_cell(&self) -> String {
        match self.direction() {
            Direction::Unchanged => "➖ No change".to_string(),
            Direction::Up => format!("📈 +{:.1}", self.change),
            Direction::Down => format!("📉 {:.1}", self.change),
        }
    }
}

/// Changes between the last two snapshots; empty with fewer than two
pub fn trend_rows(history: &[MetricsSnapshot]) -> Vec<TrendRow> {
    let [.., previous, current] = history else {
        return Vec::new();
    };

    tabulated(previous)
        .into_iter()
        .zip(tabulated(current))
        .map(|((metric, _, previous), (_, _, current))| TrendRow {
            metric,
            previous,
            current,
            change: current - previous,
        })
        .collect()
}

pub fn render_trend_report(history: &[MetricsSnapshot], test_name: &str) -> String {
    let mut out = String::new();

    out.push_str("# Performance Trend Analysis\n\n");
    out.push_str(&format!("## Test: {}\n", test_name));
    out.push_str(&format!("## Data Points: {} test runs\n\n", history.len()));

    let rows = trend_rows(history);
    if !rows.is_empty() {
        out.push_str("## Recent Changes\n");
        out.push_str("| Metric | Previous | Current | Change |\n");
        out.push_str("|--------|----------|---------|--------|\n");
        for row in &rows {
            out.push_str(&format!(
                "| {} | {:.1} | {:.1} | {} |\n",
                row.metric,
                row.previous,
                row.current,
                row.change_cell()
            ));
        }
    }

    out
}

/// One CSV row per run, oldest first
pub fn render_trend_csv(history: &[MetricsSnapshot]) -> String {
    let mut out = String::from("Run,Performance,Accessibility,BestPractices,SEO,FCP,LCP,SpeedIndex,TBT,CLS\n");

    for (i, m) in history.iter().enumerate() {
        out.push_str(&format!(
            "{},{:.2},{:.2},{:.2},{:.2},{:.0},{:.0},{:.0},{:.0},{:.3}\n",
            i + 1,
            m.performance_percent(),
            m.accessibility_percent(),
            m.best_practices_percent(),
            m.seo_percent(),
            m.first_contentful_paint,
            m.largest_contentful_paint,
            m.speed_index,
            m.total_blocking_time,
            m.cumulative_layout_shift,
        ));
    }

    out
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonStatus {
    Improved,
    Regressed,
    NoChange,
}

impl ComparisonStatus {
    pub fn classify(kind: MetricKind, difference: f64) -> Self {
        if difference.abs() < 1.0 {
            return ComparisonStatus::NoChange;
        }

        let better = match kind {
            MetricKind::Score => difference > 0.0,
            MetricKind::Timing => difference < 0.0,
        };
        if better {
            ComparisonStatus::Improved
        } else {
            ComparisonStatus::Regressed
        }
    }
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonStatus::Improved => write!(f, "✅ Improved"),
            ComparisonStatus::Regressed => write!(f, "❌ Regressed"),
            ComparisonStatus::NoChange => write!(f, "➖ No Change"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub metric: &'static str,
    pub kind: MetricKind,
    pub baseline: f64,
    pub current: f64,
    pub difference: f64,
    pub status: ComparisonStatus,
}

/// Per-metric differences between two arbitrary snapshots
pub fn compare(baseline: &MetricsSnapshot, current: &MetricsSnapshot) -> Vec<ComparisonRow> {
    tabulated(baseline)
        .into_iter()
        .zip(tabulated(current))
        .map(|((metric, kind, baseline), (_, _, current))| {
            let difference = current - baseline;
            ComparisonRow {
                metric,
                kind,
                baseline,
                current,
                difference,
                status: ComparisonStatus::classify(kind, difference),
            }
        })
        .collect()
}

pub fn render_comparison(baseline: &MetricsSnapshot, current: &MetricsSnapshot, name: &str) -> String {
    let mut out = String::new();

    out.push_str("# Performance Comparison Report\n\n");
    out.push_str(&format!("## Comparison: {}\n\n", name));
    out.push_str("| Metric | Baseline | Current | Difference | Status |\n");
    out.push_str("|--------|----------|---------|------------|--------|\n");

    for row in compare(baseline, current) {
        out.push_str(&format!(
            "| {} | {:.1} | {:.1} | {:+.1} | {} |\n",
            row.metric, row.baseline, row.current, row.difference, row.status
        ));
    }

    out
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Named values describing one audited run
pub fn run_parameters(snapshot: &MetricsSnapshot, test_name: &str, url: &str) -> Vec<(&'static str, String)> {
    vec![
        ("Test Name", test_name.to_string()),
        ("URL", url.to_string()),
        ("Performance Score", format!("{:.1}%", snapshot.performance_percent())),
        ("Accessibility Score", format!("{:.1}%", snapshot.accessibility_percent())),
        ("Best Practices Score", format!("{:.1}%", snapshot.best_practices_percent())),
        ("SEO Score", format!("{:.1}%", snapshot.seo_percent())),
        ("First Contentful Paint", format!("{:.0} ms", snapshot.first_contentful_paint)),
        ("Largest Contentful Paint", format!("{:.0} ms", snapshot.largest_contentful_paint)),
        ("Cumulative Layout Shift", format!("{:.3}", snapshot.cumulative_layout_shift)),
    ]
}

/// Regression verdict; severity is only present when a regression was found
pub fn regression_parameters(analysis: &RegressionAnalysis) -> Vec<(&'static str, String)> {
    if analysis.has_regression {
        vec![
            ("Regression Detected", "YES".to_string()),
            ("Regression Severity", analysis.severity.to_string()),
        ]
    } else {
        vec![("Regression Detected", "NO".to_string())]
    }
}

/// Signed category deltas between two snapshots, in percentage points
pub fn comparison_parameters(
    baseline: &MetricsSnapshot,
    current: &MetricsSnapshot,
    name: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("Comparison Name", name.to_string()),
        (
            "Performance Change",
            format!("{:+.1}%", current.performance_percent() - baseline.performance_percent()),
        ),
        (
            "Accessibility Change",
            format!("{:+.1}%", current.accessibility_percent() - baseline.accessibility_percent()),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Regression analysis
// ---------------------------------------------------------------------------

pub fn render_regression_analysis(analysis: &RegressionAnalysis, test_name: &str) -> String {
    let mut out = String::new();

    out.push_str("# Performance Regression Analysis\n\n");
    out.push_str(&format!("## Test: {}\n", test_name));
    out.push_str(&format!("## Severity: {}\n\n", analysis.severity));

    out.push_str("## Regression Details:\n");
    for detail in &analysis.regression_details {
        out.push_str(&format!("- {}\n", detail));
    }

    out.push_str("\n## Performance Changes:\n");
    for change in &analysis.performance_changes {
        match change.percent {
            Some(percent) => out.push_str(&format!("- {}: {:+.1}%\n", change.metric, percent)),
            None => out.push_str(&format!("- {}: n/a\n", change.metric)),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{MetricChange, Severity, TrackedMetric};
    use test_case::test_case;

    fn healthy() -> MetricsSnapshot {
        MetricsSnapshot {
            performance_score: 0.95,
            accessibility_score: 0.92,
            best_practices_score: 0.9,
            seo_score: 0.91,
            first_contentful_paint: 1200.0,
            largest_contentful_paint: 2000.0,
            speed_index: 2500.0,
            total_blocking_time: 100.0,
            cumulative_layout_shift: 0.05,
            report_path: None,
        }
    }

    #[test_case(1800.0, VitalStatus::Good ; "at ceiling")]
    #[test_case(1801.0, VitalStatus::NeedsImprovement ; "just above ceiling")]
    #[test_case(2700.0, VitalStatus::NeedsImprovement ; "at one and a half")]
    #[test_case(2701.0, VitalStatus::Poor ; "beyond one and a half")]
    fn test_timing_tiers(value: f64, expected: VitalStatus) {
        assert_eq!(VitalStatus::for_timing(value, 1800.0), expected);
    }

    #[test]
    fn test_layout_shift_is_pass_fail() {
        assert_eq!(VitalStatus::for_layout_shift(0.1, CLS_GOOD), VitalStatus::Good);
        assert_eq!(VitalStatus::for_layout_shift(0.12, CLS_GOOD), VitalStatus::Poor);
    }

    #[test]
    fn test_summary_categories() {
        let snapshot = MetricsSnapshot {
            performance_score: 0.59,
            best_practices_score: 0.7,
            ..healthy()
        };
        let summary = summarize(&snapshot);

        let verdicts: Vec<(&str, bool)> = summary
            .categories
            .iter()
            .map(|c| (c.category, c.passed))
            .collect();
        assert_eq!(
            verdicts,
            vec![
                ("Performance", false),
                ("Accessibility", true),
                ("Best Practices", true),
                ("SEO", true),
            ]
        );
        assert!(!summary.all_passed());
        assert_eq!(summary.vitals.len(), 5);
    }

    #[test]
    fn test_render_summary() {
        let snapshot = MetricsSnapshot {
            largest_contentful_paint: 3000.0,
            total_blocking_time: 450.0,
            ..healthy()
        };
        let text = render_summary(&snapshot, "Home", "https://example.com/");

        assert!(text.starts_with("# Performance Analysis Report\n\n"));
        assert!(text.contains("- **Test Name**: Home\n"));
        assert!(text.contains("- **URL**: https://example.com/\n"));
        assert!(text.contains("| Performance | 95.0% | ✅ PASS |\n"));
        assert!(text.contains("| First Contentful Paint | 1200 ms | 1800 ms | ✅ GOOD |\n"));
        assert!(text.contains("| Largest Contentful Paint | 3000 ms | 2500 ms | ⚠️ NEEDS IMPROVEMENT |\n"));
        assert!(text.contains("| Total Blocking Time | 450 ms | 200 ms | ❌ POOR |\n"));
        assert!(text.contains("| Cumulative Layout Shift | 0.050 | 0.100 | ✅ GOOD |\n"));
    }

    #[test_case(95.0, Grade::APlus)]
    #[test_case(90.0, Grade::APlus)]
    #[test_case(89.9, Grade::A)]
    #[test_case(80.0, Grade::A)]
    #[test_case(70.0, Grade::B)]
    #[test_case(60.0, Grade::C)]
    #[test_case(50.0, Grade::D)]
    #[test_case(49.9, Grade::F)]
    fn test_grade_boundaries(percent: f64, expected: Grade) {
        assert_eq!(Grade::from_percent(percent), expected);
    }

    #[test_case(90.0, "🟢")]
    #[test_case(70.0, "🟡")]
    #[test_case(69.9, "🔴")]
    fn test_score_indicator(percent: f64, expected: &str) {
        assert_eq!(score_indicator(percent), expected);
    }

    #[test]
    fn test_scorecard_excellent() {
        let card = scorecard(&healthy());
        assert_eq!(card.grade, Grade::APlus);
        assert!(card.is_excellent());

        let text = render_scorecard(&healthy());
        assert!(text.contains("### Grade: A+ (92.0%)\n"));
        assert!(text.contains("- 🚀 **Performance**: 🟢 95.0%\n"));
        assert!(text.ends_with(&format!("## Recommendations\n{}\n", EXCELLENT_LINE)));
    }

    #[test]
    fn test_scorecard_recommendations_in_order() {
        let snapshot = MetricsSnapshot {
            performance_score: 0.4,
            seo_score: 0.5,
            cumulative_layout_shift: 0.3,
            ..healthy()
        };
        let card = scorecard(&snapshot);

        assert_eq!(card.recommendations.len(), 3);
        assert!(card.recommendations[0].contains("Improve Performance"));
        assert!(card.recommendations[1].contains("Optimize SEO"));
        assert!(card.recommendations[2].contains("Fix Layout Shifts"));

        let text = render_scorecard(&snapshot);
        assert!(!text.contains(EXCELLENT_LINE));
        assert!(!text.contains("Reduce LCP"));
    }

    #[test]
    fn test_progress_bar() {
        let bar = progress_bar(1500.0, 3000.0, 10);
        assert_eq!(bar, "[█████░░░░░] 50.0%");

        let clamped = progress_bar(9000.0, 3000.0, 10);
        assert_eq!(clamped, "[██████████] 100.0%");

        assert_eq!(progress_bar(0.0, 3000.0, 4), "[░░░░] 0.0%");
    }

    #[test]
    fn test_web_vitals_chart() {
        let chart = render_web_vitals_chart(&healthy());
        assert!(chart.contains("First Contentful Paint (FCP): 1200 ms\n"));
        assert!(chart.contains("Cumulative Layout Shift (CLS): 0.050\n"));
        // CLS 0.05 * 1000 over 250 fills ten of fifty cells
        let cls_bar = format!("[{}{}] 20.0%", "█".repeat(10), "░".repeat(40));
        assert!(chart.contains(&cls_bar));
    }

    #[test]
    fn test_metrics_text() {
        let text = render_metrics_text(&healthy(), "https://example.com/");
        assert!(text.starts_with("Lighthouse Performance Report\n"));
        assert!(text.contains("URL: https://example.com/\n"));
        assert!(text.contains("- SEO: 91.0%\n"));
        assert!(text.contains("- Total Blocking Time (TBT): 100 ms\n"));
    }

    #[test]
    fn test_trend_needs_two_points() {
        assert!(trend_rows(&[]).is_empty());
        assert!(trend_rows(&[healthy()]).is_empty());

        let text = render_trend_report(&[healthy()], "Home");
        assert!(text.contains("## Data Points: 1 test runs\n"));
        assert!(!text.contains("## Recent Changes"));
    }

    #[test]
    fn test_trend_compares_last_two() {
        let oldest = MetricsSnapshot {
            performance_score: 0.1,
            ..healthy()
        };
        let previous = healthy();
        let current = MetricsSnapshot {
            performance_score: 0.9,
            first_contentful_paint: 1200.05,
            largest_contentful_paint: 2300.0,
            ..healthy()
        };
        let rows = trend_rows(&[oldest, previous.clone(), current.clone()]);

        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].metric, "Performance");
        assert_eq!(rows[0].direction(), Direction::Down);
        assert_eq!(rows[1].direction(), Direction::Unchanged);
        assert_eq!(rows[4].direction(), Direction::Unchanged);
        assert_eq!(rows[5].direction(), Direction::Up);

        let text = render_trend_report(&[previous, current], "Home");
        assert!(text.contains("| Metric | Previous | Current | Change |\n"));
        assert!(text.contains("| Performance | 95.0 | 90.0 | 📉 -5.0 |\n"));
        assert!(text.contains("| Accessibility | 92.0 | 92.0 | ➖ No change |\n"));
        assert!(text.contains("| LCP (ms) | 2000.0 | 2300.0 | 📈 +300.0 |\n"));
    }

    #[test]
    fn test_trend_csv() {
        let second = MetricsSnapshot {
            performance_score: 0.875,
            cumulative_layout_shift: 0.1234,
            ..healthy()
        };
        let csv = render_trend_csv(&[healthy(), second]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Run,Performance,Accessibility,BestPractices,SEO,FCP,LCP,SpeedIndex,TBT,CLS",
                "1,95.00,92.00,90.00,91.00,1200,2000,2500,100,0.050",
                "2,87.50,92.00,90.00,91.00,1200,2000,2500,100,0.123",
            ]
        );
    }

    #[test_case(MetricKind::Timing, -200.0, ComparisonStatus::Improved ; "faster timing improves")]
    #[test_case(MetricKind::Timing, 200.0, ComparisonStatus::Regressed ; "slower timing regresses")]
    #[test_case(MetricKind::Score, 5.0, ComparisonStatus::Improved ; "higher score improves")]
    #[test_case(MetricKind::Score, -5.0, ComparisonStatus::Regressed ; "lower score regresses")]
    #[test_case(MetricKind::Timing, 0.9, ComparisonStatus::NoChange ; "small timing rise")]
    #[test_case(MetricKind::Score, -0.9, ComparisonStatus::NoChange ; "small score drop")]
    fn test_comparison_status(kind: MetricKind, difference: f64, expected: ComparisonStatus) {
        assert_eq!(ComparisonStatus::classify(kind, difference), expected);
    }

    #[test]
    fn test_render_comparison() {
        let baseline = healthy();
        let current = MetricsSnapshot {
            performance_score: 0.85,
            first_contentful_paint: 1000.0,
            largest_contentful_paint: 2000.5,
            ..healthy()
        };

        let rows = compare(&baseline, &current);
        assert_eq!(rows[0].status, ComparisonStatus::Regressed);
        assert_eq!(rows[4].status, ComparisonStatus::Improved);
        assert_eq!(rows[5].status, ComparisonStatus::NoChange);

        let text = render_comparison(&baseline, &current, "staging vs prod");
        assert!(text.contains("## Comparison: staging vs prod\n"));
        assert!(text.contains("| Performance | 95.0 | 85.0 | -10.0 | ❌ Regressed |\n"));
        assert!(text.contains("| FCP (ms) | 1200.0 | 1000.0 | -200.0 | ✅ Improved |\n"));
        assert!(text.contains("| SEO | 91.0 | 91.0 | +0.0 | ➖ No Change |\n"));
    }

    #[test]
    fn test_run_parameters() {
        let parameters = run_parameters(&healthy(), "Home", "https://example.com/");
        assert_eq!(parameters.len(), 9);
        assert_eq!(parameters[0], ("Test Name", "Home".to_string()));
        assert!(parameters.contains(&("Performance Score", "95.0%".to_string())));
        assert!(parameters.contains(&("Largest Contentful Paint", "2000 ms".to_string())));
        assert!(parameters.contains(&("Cumulative Layout Shift", "0.050".to_string())));
    }

    #[test]
    fn test_regression_parameters() {
        let clean = RegressionAnalysis::default();
        assert_eq!(regression_parameters(&clean), vec![("Regression Detected", "NO".to_string())]);

        let regressed = RegressionAnalysis {
            has_regression: true,
            severity: Severity::Medium,
            ..RegressionAnalysis::default()
        };
        assert_eq!(
            regression_parameters(&regressed),
            vec![
                ("Regression Detected", "YES".to_string()),
                ("Regression Severity", "MEDIUM".to_string()),
            ]
        );
    }

    #[test]
    fn test_comparison_parameters() {
        let current = MetricsSnapshot {
            performance_score: 0.85,
            accessibility_score: 0.95,
            ..healthy()
        };
        let parameters = comparison_parameters(&healthy(), &current, "v1 vs v2");
        assert_eq!(
            parameters,
            vec![
                ("Comparison Name", "v1 vs v2".to_string()),
                ("Performance Change", "-10.0%".to_string()),
                ("Accessibility Change", "+3.0%".to_string()),
            ]
        );
    }

    #[test]
    fn test_render_regression_analysis() {
        let analysis = RegressionAnalysis {
            has_regression: true,
            regression_details: vec!["LCP regressed by 25.0% (from 2000ms to 2500ms)".to_string()],
            performance_changes: vec![
                MetricChange {
                    metric: TrackedMetric::PerformanceScore,
                    percent: None,
                },
                MetricChange {
                    metric: TrackedMetric::LargestContentfulPaint,
                    percent: Some(25.0),
                },
            ],
            severity: Severity::Low,
        };

        let text = render_regression_analysis(&analysis, "Home");
        assert!(text.contains("## Severity: LOW\n"));
        assert!(text.contains("- LCP regressed by 25.0% (from 2000ms to 2500ms)\n"));
        assert!(text.contains("- Performance Score: n/a\n"));
        assert!(text.contains("- Largest Contentful Paint: +25.0%\n"));
    }
}
