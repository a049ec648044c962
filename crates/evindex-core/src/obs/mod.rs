//! Observability: in-memory counters and the sink abstraction feeding them.
//!
//! Index logic never touches `obs::metrics` directly; everything flows
//! through `MetricsEvent` and `MetricsSink`.

pub(crate) mod metrics;
pub(crate) mod sink;

pub use metrics::{IndexCounters, LookupCounters};
pub use sink::{
    LookupKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink,
};
