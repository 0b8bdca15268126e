// In-memory fakes for the application ports
use crate::application::errors::RepositoryError;
use crate::application::metrics_backend::MetricsBackend;
use crate::application::template_repository::TemplateRepository;
use crate::domain::metrics::{HistogramResult, LabelSet, RawSeries, SamplePair, SeriesResult};
use crate::domain::query::MetricsQuery;
use crate::domain::template::{Chart, DataType, Item, Template};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

pub fn fake_counter(value: f64) -> RawSeries {
    RawSeries::new(LabelSet::new(), vec![SamplePair::new(1000, value)])
}

pub fn fake_labeled_counter(label: &str, label_value: &str, value: f64) -> RawSeries {
    let mut labels = LabelSet::new();
    labels.insert(label.to_string(), label_value.to_string());
    RawSeries::new(labels, vec![SamplePair::new(1000, value)])
}

pub fn chart_item(name: &str, metric_name: &str, data_type: DataType) -> Item {
    Item::Chart(Chart::new(name, metric_name, data_type))
}

pub fn include_item(reference: &str) -> Item {
    Item::Include(reference.to_string())
}

#[derive(Default)]
pub struct FakeRepository {
    templates: HashMap<(String, String), Template>,
    failing_scopes: Vec<String>,
    lookups: Mutex<Vec<String>>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, scope: &str, name: &str, title: &str, items: Vec<Item>) -> Self {
        let template = Template::new(name.to_string(), title.to_string(), items);
        self.templates
            .insert((scope.to_string(), name.to_string()), template);
        self
    }

    pub fn with_template(mut self, scope: &str, template: Template) -> Self {
        self.templates
            .insert((scope.to_string(), template.name.clone()), template);
        self
    }

    pub fn failing(mut self, scope: &str) -> Self {
        self.failing_scopes.push(scope.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl TemplateRepository for FakeRepository {
    async fn get_template(&self, scope: &str, name: &str) -> Result<Template, RepositoryError> {
        self.lookups.lock().unwrap().push(format!("{}/{}", scope, name));
        if self.failing_scopes.iter().any(|s| s == scope) {
            return Err(RepositoryError::Backend(anyhow::anyhow!("scope {} unavailable", scope)));
        }
        self.templates
            .get(&(scope.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                scope: scope.to_string(),
                name: name.to_string(),
            })
    }

    async fn get_all_templates(
        &self,
        scope: &str,
    ) -> Result<BTreeMap<String, Template>, RepositoryError> {
        if self.failing_scopes.iter().any(|s| s == scope) {
            return Err(RepositoryError::Backend(anyhow::anyhow!("scope {} unavailable", scope)));
        }
        Ok(self
            .templates
            .iter()
            .filter(|((s, _), _)| s == scope)
            .map(|((_, name), template)| (name.clone(), template.clone()))
            .collect())
    }
}

/// Backend call as seen by the fake
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCall {
    pub kind: &'static str,
    pub metric_name: String,
    pub selector: String,
    pub group_by: String,
    pub aggregator: Option<String>,
}

type CannedSeries = Result<Vec<RawSeries>, String>;

#[derive(Default)]
pub struct FakeBackend {
    series: HashMap<String, CannedSeries>,
    histograms: HashMap<String, BTreeMap<String, CannedSeries>>,
    delays: HashMap<String, Duration>,
    metric_names: Option<CannedSeriesNames>,
    calls: Mutex<Vec<BackendCall>>,
}

type CannedSeriesNames = Result<Vec<String>, String>;

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, metric_name: &str, series: Vec<RawSeries>) -> Self {
        self.series.insert(metric_name.to_string(), Ok(series));
        self
    }

    pub fn with_error(mut self, metric_name: &str, message: &str) -> Self {
        self.series
            .insert(metric_name.to_string(), Err(message.to_string()));
        self
    }

    pub fn with_histogram(mut self, metric_name: &str, stat: &str, series: Vec<RawSeries>) -> Self {
        self.histograms
            .entry(metric_name.to_string())
            .or_default()
            .insert(stat.to_string(), Ok(series));
        self
    }

    pub fn with_delay(mut self, metric_name: &str, delay: Duration) -> Self {
        self.delays.insert(metric_name.to_string(), delay);
        self
    }

    pub fn with_metric_names(mut self, names: &[&str]) -> Self {
        self.metric_names = Some(Ok(names.iter().map(|n| n.to_string()).collect()));
        self
    }

    pub fn with_metric_names_error(mut self, message: &str) -> Self {
        self.metric_names = Some(Err(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(
        &self,
        kind: &'static str,
        metric_name: &str,
        selector: &str,
        group_by: &str,
        aggregator: Option<&str>,
    ) {
        self.calls.lock().unwrap().push(BackendCall {
            kind,
            metric_name: metric_name.to_string(),
            selector: selector.to_string(),
            group_by: group_by.to_string(),
            aggregator: aggregator.map(str::to_string),
        });
        if let Some(delay) = self.delays.get(metric_name) {
            tokio::time::sleep(*delay).await;
        }
    }

    fn canned(&self, metric_name: &str) -> SeriesResult {
        match self.series.get(metric_name) {
            Some(Ok(series)) => Ok(series.clone()),
            Some(Err(message)) => Err(anyhow::anyhow!(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl MetricsBackend for FakeBackend {
    async fn fetch_range(
        &self,
        metric_name: &str,
        selector: &str,
        group_by: &str,
        aggregator: &str,
        _query: &MetricsQuery,
    ) -> SeriesResult {
        self.record("range", metric_name, selector, group_by, Some(aggregator))
            .await;
        self.canned(metric_name)
    }

    async fn fetch_rate_range(
        &self,
        metric_name: &str,
        selector: &str,
        group_by: &str,
        _query: &MetricsQuery,
    ) -> SeriesResult {
        self.record("rate", metric_name, selector, group_by, None)
            .await;
        self.canned(metric_name)
    }

    async fn fetch_histogram_range(
        &self,
        metric_name: &str,
        selector: &str,
        group_by: &str,
        _query: &MetricsQuery,
    ) -> HistogramResult {
        self.record("histogram", metric_name, selector, group_by, None)
            .await;
        self.histograms
            .get(metric_name)
            .map(|stats| {
                stats
                    .iter()
                    .map(|(stat, canned)| {
                        let result = match canned {
                            Ok(series) => Ok(series.clone()),
                            Err(message) => Err(anyhow::anyhow!(message.clone())),
                        };
                        (stat.clone(), result)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn get_metric_names_for_selectors(
        &self,
        selectors: &[String],
    ) -> anyhow::Result<Vec<String>> {
        self.calls.lock().unwrap().push(BackendCall {
            kind: "names",
            metric_name: String::new(),
            selector: selectors.join(" "),
            group_by: String::new(),
            aggregator: None,
        });
        match &self.metric_names {
            Some(Ok(names)) => Ok(names.clone()),
            Some(Err(message)) => Err(anyhow::anyhow!(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}
