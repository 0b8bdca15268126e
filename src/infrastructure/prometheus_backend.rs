// Prometheus metrics backend implementation
use crate::application::metrics_backend::MetricsBackend;
use crate::domain::metrics::{
    HistogramResult, LabelSet, RawSeries, SamplePair, SeriesResult, NAME_LABEL,
};
use crate::domain::query::{MetricsQuery, AVG_STAT};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PrometheusBackend {
    client: reqwest::Client,
    host: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: String,
    data: Option<T>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MatrixData {
    #[serde(rename = "resultType")]
    result_type: String,
    #[serde(default)]
    result: Vec<MatrixSeries>,
}

#[derive(Debug, Deserialize)]
struct MatrixSeries {
    #[serde(default)]
    metric: LabelSet,
    #[serde(default)]
    values: Vec<(f64, String)>,
}

impl PrometheusBackend {
    pub fn new(host: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Prometheus HTTP client")?;
        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
        })
    }

    fn build_url(&self, path: &str, params: &[(&str, String)]) -> String {
        let query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        format!("{}{}?{}", self.host, path, query.join("&"))
    }

    async fn execute<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to Prometheus")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Prometheus response")?;
        let parsed: ApiResponse<T> = serde_json::from_str(&body).with_context(|| {
            format!("Failed to parse Prometheus response (status {})", status)
        })?;

        if parsed.status != "success" {
            anyhow::bail!(
                "Prometheus query failed ({}): {}",
                parsed.error_type.unwrap_or_else(|| status.to_string()),
                parsed.error.unwrap_or_default()
            );
        }
        parsed.data.context("Prometheus response has no data")
    }

    async fn query_range(&self, promql: &str, query: &MetricsQuery) -> SeriesResult {
        tracing::debug!("Executing range query: {}", promql);
        let url = self.build_url(
            "/api/v1/query_range",
            &[
                ("query", promql.to_string()),
                ("start", query.start.timestamp().to_string()),
                ("end", query.end.timestamp().to_string()),
                ("step", format!("{}s", query.step_seconds)),
            ],
        );
        let data: MatrixData = self.execute(&url).await?;
        if data.result_type != "matrix" {
            anyhow::bail!("Unexpected result type {}", data.result_type);
        }
        data.result.into_iter().map(to_raw_series).collect()
    }
}

fn to_raw_series(series: MatrixSeries) -> Result<RawSeries> {
    let samples = series
        .values
        .into_iter()
        .map(|(timestamp, value)| {
            let value: f64 = value
                .parse()
                .with_context(|| format!("Invalid sample value {}", value))?;
            Ok(SamplePair::new((timestamp * 1000.0).round() as i64, value))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(RawSeries::new(series.metric, samples))
}

fn grouped(expression: &str, group_by: &str) -> String {
    if group_by.is_empty() {
        expression.to_string()
    } else {
        format!("{} by ({})", expression, group_by)
    }
}

/// `<aggregator>(<metric><selector>) by (<group_by>)`
pub fn range_query(metric_name: &str, selector: &str, group_by: &str, aggregator: &str) -> String {
    grouped(&format!("{}({}{})", aggregator, metric_name, selector), group_by)
}

/// `sum(<rate_func>(<metric><selector>[<interval>])) by (<group_by>)`
pub fn rate_query(metric_name: &str, selector: &str, group_by: &str, query: &MetricsQuery) -> String {
    grouped(
        &format!(
            "sum({}({}{}[{}]))",
            query.rate_func, metric_name, selector, query.rate_interval
        ),
        group_by,
    )
}

/// Query computing one histogram statistic: "avg" or a quantile such as "0.99"
pub fn histogram_query(
    metric_name: &str,
    selector: &str,
    group_by: &str,
    stat: &str,
    query: &MetricsQuery,
) -> String {
    let interval = &query.rate_interval;
    if stat == AVG_STAT {
        let sum = grouped(
            &format!("sum(rate({}_sum{}[{}]))", metric_name, selector, interval),
            group_by,
        );
        let count = grouped(
            &format!("sum(rate({}_count{}[{}]))", metric_name, selector, interval),
            group_by,
        );
        return format!("{} / {}", sum, count);
    }
    let bucket_grouping = if group_by.is_empty() {
        "le".to_string()
    } else {
        format!("le,{}", group_by)
    };
    format!(
        "histogram_quantile({}, sum(rate({}_bucket{}[{}])) by ({}))",
        stat, metric_name, selector, interval, bucket_grouping
    )
}

#[async_trait]
impl MetricsBackend for PrometheusBackend {
    async fn fetch_range(
        &self,
        metric_name: &str,
        selector: &str,
        group_by: &str,
        aggregator: &str,
        query: &MetricsQuery,
    ) -> SeriesResult {
        let promql = range_query(metric_name, selector, group_by, aggregator);
        self.query_range(&promql, query).await
    }

    async fn fetch_rate_range(
        &self,
        metric_name: &str,
        selector: &str,
        group_by: &str,
        query: &MetricsQuery,
    ) -> SeriesResult {
        let promql = rate_query(metric_name, selector, group_by, query);
        self.query_range(&promql, query).await
    }

    async fn fetch_histogram_range(
        &self,
        metric_name: &str,
        selector: &str,
        group_by: &str,
        query: &MetricsQuery,
    ) -> HistogramResult {
        let stats = query.histogram_stats();
        let queries = stats.iter().map(|stat| {
            let promql = histogram_query(metric_name, selector, group_by, stat, query);
            async move { self.query_range(&promql, query).await }
        });
        let results = join_all(queries).await;
        stats.into_iter().zip(results).collect()
    }

    async fn get_metric_names_for_selectors(&self, selectors: &[String]) -> Result<Vec<String>> {
        let params: Vec<(&str, String)> = selectors
            .iter()
            .map(|selector| ("match[]", selector.clone()))
            .collect();
        let url = self.build_url("/api/v1/series", &params);
        let series: Vec<LabelSet> = self.execute(&url).await?;

        let names: BTreeSet<String> = series
            .into_iter()
            .filter_map(|mut labels| labels.remove(NAME_LABEL))
            .collect();
        tracing::debug!("Found {} metric names for {:?}", names.len(), selectors);
        Ok(names.into_iter().collect())
    }
}
