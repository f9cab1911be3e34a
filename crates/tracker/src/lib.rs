//! perftrack Regression Tracker
//!
//! This crate turns audit snapshots into regression verdicts and reports:
//! - Persists per-test history (sliding window) and per-test baselines
//! - Compares each run with its baseline and flags regressions by severity
//! - Renders markdown/CSV/text reports and hands them to an attachment sink
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  PerformanceTracker                                         │
//! │    ├── audit_with_regression_tracking(snapshot, name, url)  │
//! │    ├── record / set_baseline                                │
//! │    ├── performance_report(name)                             │
//! │    └── compare(baseline, current, name)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RegressionAnalyzer ──> HistoryStore + BaselineStore        │
//! │                          ├── FileStore   (JSON files)       │
//! │                          └── MemoryStore                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  report::*  (pure rendering)  ──> AttachmentSink            │
//! │                                    ├── DirectorySink        │
//! │                                    └── MemorySink           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod analyzer;
pub mod gate;
pub mod report;
pub mod sink;
pub mod store;
pub mod tracker;

pub use analyzer::{MetricChange, RegressionAnalysis, RegressionAnalyzer, Severity, TrackedMetric};
pub use gate::{validate_core_web_vitals, validate_scores, ScoreThresholds};
pub use sink::{Attachment, AttachmentSink, ContentType, DirectorySink, MemorySink};
pub use store::{BaselineStore, FileStore, HistoryStore, MemoryStore};
pub use tracker::PerformanceTracker;
