// Metrics backend trait for time-series queries
use crate::domain::metrics::{HistogramResult, SeriesResult};
use crate::domain::query::MetricsQuery;
use async_trait::async_trait;

/// Query errors are carried inside the returned results so that callers can
/// degrade per chart instead of failing a whole dashboard.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    async fn fetch_range(
        &self,
        metric_name: &str,
        selector: &str,
        group_by: &str,
        aggregator: &str,
        query: &MetricsQuery,
    ) -> SeriesResult;

    async fn fetch_rate_range(
        &self,
        metric_name: &str,
        selector: &str,
        group_by: &str,
        query: &MetricsQuery,
    ) -> SeriesResult;

    /// One result per requested statistic (quantiles and "avg")
    async fn fetch_histogram_range(
        &self,
        metric_name: &str,
        selector: &str,
        group_by: &str,
        query: &MetricsQuery,
    ) -> HistogramResult;

    /// Names of all metrics having at least one series matching the selectors
    async fn get_metric_names_for_selectors(
        &self,
        selectors: &[String],
    ) -> anyhow::Result<Vec<String>>;
}
