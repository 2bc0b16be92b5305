// Domain models: samples, aggregates, list queries

mod aggregation;
mod metric;
mod query;

pub use aggregation::{AggregatedMetric, BucketGranularity, MetricFilter};
pub use metric::{CreateMetricRequest, MetricSample, MetricType, StoredMetric};
pub use query::{
    ChartParams, DEFAULT_LIMIT, ListParams, ListQuery, MAX_LIMIT, Page, SortDir, SortField,
};
