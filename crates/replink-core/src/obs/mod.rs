//! Observability: runtime event telemetry (metrics) and link state reports.

pub(crate) mod metrics;
pub(crate) mod report;
pub(crate) mod sink;

// re-exports
pub use metrics::{OperationCounters, OperationReport, RepairCounters};
pub use report::{ComponentCounts, LinkReport, StateCounts, link_report};
pub use sink::{
    GlobalMetricsSink, LinkMetricsEvent, MetricsSink, NoopMetricsSink, OperationKind,
    metrics_report, metrics_reset_all, with_metrics_sink,
};
