// Dashboard domain model
use super::metrics::LabeledSeries;
use super::template::{LabelAggregation, Template};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDashboard {
    pub title: String,
    pub charts: Vec<RenderedChart>,
    pub aggregations: Vec<LabelAggregation>,
}

impl ResolvedDashboard {
    pub fn new(
        title: String,
        charts: Vec<RenderedChart>,
        aggregations: Vec<LabelAggregation>,
    ) -> Self {
        Self {
            title,
            charts,
            aggregations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedChart {
    pub name: String,
    pub unit: String,
    pub spans: i32,
    pub series: Vec<LabeledSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Union of every chart's aggregations, unique by display name and sorted by it
pub fn collect_aggregations(template: &Template) -> Vec<LabelAggregation> {
    let mut unique: BTreeMap<String, LabelAggregation> = BTreeMap::new();
    for chart in template.charts() {
        for aggregation in &chart.aggregations {
            unique.insert(aggregation.display_name.clone(), aggregation.clone());
        }
    }
    unique.into_values().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Runtime {
    pub name: String,
    pub dashboard_refs: Vec<DashboardRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardRef {
    pub template: String,
    pub title: String,
}

impl DashboardRef {
    pub fn from_template(template: &Template) -> Self {
        Self {
            template: template.name.clone(),
            title: template.title.clone(),
        }
    }
}

/// Adds a template under its runtime, creating the runtime entry on first use
pub fn add_to_runtimes(runtimes: &mut Vec<Runtime>, template: &Template) {
    let dashboard_ref = DashboardRef::from_template(template);
    match runtimes.iter_mut().find(|rt| rt.name == template.runtime) {
        Some(runtime) => runtime.dashboard_refs.push(dashboard_ref),
        None => runtimes.push(Runtime {
            name: template.runtime.clone(),
            dashboard_refs: vec![dashboard_ref],
        }),
    }
}
