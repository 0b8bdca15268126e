// Dashboard template domain model
use serde::{Deserialize, Serialize};

/// Separator between template name and chart name in an include reference
pub const INCLUDE_SEPARATOR: char = '$';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub discover_on: String,
    #[serde(default)]
    pub runtime: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Template {
    #[cfg(test)]
    pub fn new(name: String, title: String, items: Vec<Item>) -> Self {
        Self {
            name,
            title,
            discover_on: String::new(),
            runtime: String::new(),
            items,
        }
    }

    #[cfg(test)]
    pub fn with_discovery(mut self, runtime: &str, discover_on: &str) -> Self {
        self.runtime = runtime.to_string();
        self.discover_on = discover_on.to_string();
        self
    }

    /// Copy of this template with its items replaced
    pub fn with_items(&self, items: Vec<Item>) -> Self {
        Self {
            name: self.name.clone(),
            title: self.title.clone(),
            discover_on: self.discover_on.clone(),
            runtime: self.runtime.clone(),
            items,
        }
    }

    pub fn charts(&self) -> impl Iterator<Item = &Chart> {
        self.items.iter().filter_map(|item| match item {
            Item::Chart(chart) => Some(chart),
            Item::Include(_) => None,
        })
    }

    /// Template names referenced by include items, in declaration order
    pub fn included_templates(&self) -> impl Iterator<Item = String> + '_ {
        self.items.iter().filter_map(|item| match item {
            Item::Include(reference) => IncludeRef::parse(reference).map(|r| r.template),
            Item::Chart(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Item {
    Include(String),
    Chart(Chart),
}

/// Parsed form of `template` or `template$chart`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRef {
    pub template: String,
    pub chart: Option<String>,
}

impl IncludeRef {
    /// Returns None for a blank reference. Only the first two `$` segments count.
    pub fn parse(reference: &str) -> Option<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        let mut parts = reference.split(INCLUDE_SEPARATOR);
        let template = parts.next().unwrap_or_default().trim().to_string();
        let chart = parts.next().map(|chart| chart.trim().to_string());
        Some(Self { template, chart })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    #[serde(alias = "raw")]
    Raw,
    #[serde(alias = "rate")]
    Rate,
    #[serde(alias = "histogram")]
    Histogram,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chart {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub spans: i32,
    pub metric_name: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub aggregator: Option<String>,
    #[serde(default)]
    pub aggregations: Vec<LabelAggregation>,
    /// Multiplier applied to every sample; 0 means unset
    #[serde(default)]
    pub unit_scale: f64,
    #[serde(default)]
    pub sort_label: Option<String>,
    #[serde(default)]
    pub remove_sort_label: bool,
    #[serde(default)]
    pub sort_label_parse_as: Option<String>,
}

impl Chart {
    #[cfg(test)]
    pub fn new(name: &str, metric_name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            metric_name: metric_name.to_string(),
            data_type,
            ..Default::default()
        }
    }

    /// Declared aggregator, ignoring blank values
    pub fn declared_aggregator(&self) -> Option<&str> {
        self.aggregator
            .as_deref()
            .map(str::trim)
            .filter(|agg| !agg.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelAggregation {
    pub label: String,
    #[serde(alias = "display_name")]
    pub display_name: String,
}

impl LabelAggregation {
    pub fn new(label: &str, display_name: &str) -> Self {
        Self {
            label: label.to_string(),
            display_name: display_name.to_string(),
        }
    }
}
