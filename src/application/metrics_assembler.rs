// Metrics assembler - Fills a resolved template with backend data
use crate::application::chart_converter::{ConversionParams, MetricRef};
use crate::application::metrics_backend::MetricsBackend;
use crate::domain::dashboard::{collect_aggregations, RenderedChart, ResolvedDashboard};
use crate::domain::query::{DashboardQuery, MetricsQuery};
use crate::domain::template::{Chart, DataType, LabelAggregation, Template};
use futures::future::join_all;
use std::sync::Arc;

pub const DEFAULT_NAMESPACE_LABEL: &str = "namespace";

#[derive(Clone)]
pub struct MetricsAssembler {
    backend: Arc<dyn MetricsBackend>,
    namespace_label: String,
}

impl MetricsAssembler {
    pub fn new(backend: Arc<dyn MetricsBackend>, namespace_label: &str) -> Self {
        let namespace_label = match namespace_label.trim() {
            "" => DEFAULT_NAMESPACE_LABEL,
            label => label,
        };
        Self {
            backend,
            namespace_label: namespace_label.to_string(),
        }
    }

    /// Label selector for a workload, e.g. `{namespace="ns",app="app",version="v1"}`
    pub fn build_selector(&self, namespace: &str, app: &str, version: Option<&str>) -> String {
        let mut labels = format!(
            "{{{}=\"{}\",app=\"{}\"",
            self.namespace_label,
            escape_label_value(namespace),
            escape_label_value(app)
        );
        if let Some(version) = version {
            labels.push_str(&format!(",version=\"{}\"", escape_label_value(version)));
        }
        labels.push('}');
        labels
    }

    /// Aggregations offered by the dashboard, with a version breakdown for app-wide queries
    pub fn aggregations(template: &Template, version: Option<&str>) -> Vec<LabelAggregation> {
        let mut aggregations = collect_aggregations(template);
        if version.is_none() {
            aggregations.insert(0, LabelAggregation::new("version", "Version"));
        }
        aggregations
    }

    /// Fetches every chart concurrently; chart order follows the template
    pub async fn assemble(&self, template: &Template, query: &DashboardQuery) -> ResolvedDashboard {
        let version = query.version();
        let selector = Arc::new(self.build_selector(&query.namespace, &query.app, version));
        let grouping = Arc::new(query.metrics.grouping());
        let metrics_query = Arc::new(query.metrics.clone());
        let aggregations = Self::aggregations(template, version);

        tracing::debug!(
            "Assembling dashboard {} with selector {} grouped by [{}]",
            template.name,
            selector,
            grouping
        );

        let charts: Vec<Chart> = template.charts().cloned().collect();
        let handles: Vec<_> = charts
            .iter()
            .cloned()
            .map(|chart| {
                let task = ChartTask {
                    backend: self.backend.clone(),
                    selector: selector.clone(),
                    grouping: grouping.clone(),
                    query: metrics_query.clone(),
                    default_aggregator: query.raw_data_aggregator.clone(),
                };
                tokio::spawn(task.run(chart))
            })
            .collect();

        // Each handle owns the slot at its template position
        let rendered = join_all(handles)
            .await
            .into_iter()
            .zip(charts.iter())
            .map(|(joined, chart)| {
                joined.unwrap_or_else(|err| {
                    tracing::error!("Chart task for {} failed: {}", chart.name, err);
                    let mut failed = RenderedChart::from_chart(chart);
                    failed.error = Some(format!("error in metric {}: {}", chart.metric_name, err));
                    failed
                })
            })
            .collect();

        ResolvedDashboard::new(template.title.clone(), rendered, aggregations)
    }
}

struct ChartTask {
    backend: Arc<dyn MetricsBackend>,
    selector: Arc<String>,
    grouping: Arc<String>,
    query: Arc<MetricsQuery>,
    default_aggregator: String,
}

impl ChartTask {
    async fn run(self, chart: Chart) -> RenderedChart {
        let mut rendered = RenderedChart::from_chart(&chart);
        let metric = MetricRef::from_chart(&chart);
        let params = ConversionParams::from_chart(&chart);

        match chart.data_type {
            DataType::Raw => {
                let aggregator = chart
                    .declared_aggregator()
                    .unwrap_or(self.default_aggregator.as_str());
                let result = self
                    .backend
                    .fetch_range(
                        &chart.metric_name,
                        &self.selector,
                        &self.grouping,
                        aggregator,
                        &self.query,
                    )
                    .await;
                rendered.fill_series(&metric, result, &params);
            }
            DataType::Rate => {
                let result = self
                    .backend
                    .fetch_rate_range(&chart.metric_name, &self.selector, &self.grouping, &self.query)
                    .await;
                rendered.fill_series(&metric, result, &params);
            }
            DataType::Histogram => {
                let histogram = self
                    .backend
                    .fetch_histogram_range(&chart.metric_name, &self.selector, &self.grouping, &self.query)
                    .await;
                rendered.fill_histogram(&metric, histogram, &params);
            }
        }

        if let Some(error) = &rendered.error {
            tracing::warn!("Chart {} rendered with error: {}", chart.name, error);
        }
        rendered
    }
}

// Label values are double-quoted PromQL strings
fn escape_label_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
