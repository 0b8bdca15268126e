// Query parameters for dashboard requests
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_RAW_AGGREGATOR: &str = "sum";
pub const AVG_STAT: &str = "avg";

pub const RATE_FUNCS: [&str; 2] = ["rate", "irate"];
pub const AGGREGATORS: [&str; 7] = ["sum", "avg", "min", "max", "count", "stddev", "stdvar"];

static LABEL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("label name pattern"));
static DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+(ms|s|m|h|d|w|y))+$").expect("duration pattern"));

pub fn is_label_name(value: &str) -> bool {
    LABEL_NAME.is_match(value)
}

/// PromQL range duration such as `1m` or `1h30m`
pub fn is_duration(value: &str) -> bool {
    DURATION.is_match(value)
}

pub fn is_rate_func(value: &str) -> bool {
    RATE_FUNCS.contains(&value)
}

pub fn is_aggregator(value: &str) -> bool {
    AGGREGATORS.contains(&value)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step_seconds: i64,
    pub rate_interval: String,
    pub rate_func: String,
    pub quantiles: Vec<String>,
    pub avg: bool,
    pub by_labels: Vec<String>,
}

impl Default for MetricsQuery {
    fn default() -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::minutes(30),
            end,
            step_seconds: 15,
            rate_interval: "1m".to_string(),
            rate_func: "rate".to_string(),
            quantiles: Vec::new(),
            avg: true,
            by_labels: Vec::new(),
        }
    }
}

impl MetricsQuery {
    /// Query covering the last `duration_seconds` up to now
    pub fn last(duration_seconds: i64) -> Self {
        let mut query = Self::default();
        query.start = query.end - Duration::seconds(duration_seconds);
        query
    }

    /// Statistics requested from histogram queries, in request order
    pub fn histogram_stats(&self) -> Vec<String> {
        let mut stats = self.quantiles.clone();
        if self.avg {
            stats.push(AVG_STAT.to_string());
        }
        stats
    }

    pub fn grouping(&self) -> String {
        self.by_labels.join(",")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardQuery {
    pub metrics: MetricsQuery,
    pub namespace: String,
    pub app: String,
    pub version: Option<String>,
    pub raw_data_aggregator: String,
}

impl DashboardQuery {
    pub fn new(namespace: &str, app: &str) -> Self {
        Self {
            metrics: MetricsQuery::default(),
            namespace: namespace.to_string(),
            app: app.to_string(),
            version: None,
            raw_data_aggregator: DEFAULT_RAW_AGGREGATOR.to_string(),
        }
    }

    /// Requested version, ignoring blank values
    pub fn version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn fill_defaults(&mut self) {
        if self.raw_data_aggregator.trim().is_empty() {
            self.raw_data_aggregator = DEFAULT_RAW_AGGREGATOR.to_string();
        }
        if self.metrics.rate_interval.is_empty() {
            self.metrics.rate_interval = "1m".to_string();
        }
        if self.metrics.rate_func.is_empty() {
            self.metrics.rate_func = "rate".to_string();
        }
        if self.metrics.step_seconds <= 0 {
            self.metrics.step_seconds = 15;
        }
    }
}
