// Chart converter - Turns backend results into display-ready series
use crate::domain::dashboard::RenderedChart;
use crate::domain::metrics::{
    HistogramResult, LabelSet, LabeledSeries, RawSeries, SamplePair, SeriesResult, NAME_LABEL,
    STAT_LABEL,
};
use crate::domain::template::Chart;
use std::cmp::Ordering;

/// Identifies the metric behind a chart: queried name and the name shown to users
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRef {
    pub metric_name: String,
    pub display_name: String,
}

impl MetricRef {
    pub fn new(metric_name: &str, display_name: &str) -> Self {
        Self {
            metric_name: metric_name.to_string(),
            display_name: display_name.to_string(),
        }
    }

    pub fn from_chart(chart: &Chart) -> Self {
        Self::new(&chart.metric_name, &chart.name)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversionParams {
    /// 0 and 1 both leave values untouched
    pub scale: f64,
    pub sort_label: Option<String>,
    pub remove_sort_label: bool,
    /// "int" to sort numerically, lexicographic otherwise
    pub sort_label_parse_as: Option<String>,
}

impl ConversionParams {
    #[cfg(test)]
    pub fn with_scale(scale: f64) -> Self {
        Self {
            scale,
            ..Default::default()
        }
    }

    pub fn from_chart(chart: &Chart) -> Self {
        Self {
            scale: chart.unit_scale,
            sort_label: chart.sort_label.clone().filter(|l| !l.is_empty()),
            remove_sort_label: chart.remove_sort_label,
            sort_label_parse_as: chart.sort_label_parse_as.clone(),
        }
    }

    fn multiplier(&self) -> f64 {
        if self.scale == 0.0 { 1.0 } else { self.scale }
    }

    fn sorts_as_int(&self) -> bool {
        self.sort_label_parse_as.as_deref() == Some("int")
    }
}

impl RenderedChart {
    /// Chart shell carrying template metadata, before any data is filled in
    pub fn from_chart(chart: &Chart) -> Self {
        Self {
            name: chart.name.clone(),
            unit: chart.unit.clone(),
            spans: chart.spans,
            series: Vec::new(),
            error: None,
        }
    }

    pub fn fill_series(&mut self, metric: &MetricRef, result: SeriesResult, params: &ConversionParams) {
        match result {
            Ok(raw) => {
                let mut labels = LabelSet::new();
                labels.insert(NAME_LABEL.to_string(), metric.display_name.clone());
                self.series = convert_series(raw, &labels, params);
            }
            Err(err) => {
                self.error = Some(format!("error in metric {}: {:#}", metric.metric_name, err));
                self.series = Vec::new();
            }
        }
    }

    pub fn fill_histogram(
        &mut self,
        metric: &MetricRef,
        histogram: HistogramResult,
        params: &ConversionParams,
    ) {
        let mut series = Vec::new();
        for (stat, result) in histogram {
            match result {
                Ok(raw) => {
                    let mut labels = LabelSet::new();
                    labels.insert(NAME_LABEL.to_string(), metric.display_name.clone());
                    labels.insert(STAT_LABEL.to_string(), stat);
                    series.extend(convert_series(raw, &labels, params));
                }
                Err(err) => {
                    self.error = Some(format!(
                        "error in metric {}/{}: {:#}",
                        metric.metric_name, stat, err
                    ));
                    self.series = Vec::new();
                    return;
                }
            }
        }
        self.series = series;
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Int(i64),
    Text(String),
}

/// Converts raw series into labeled, scaled series.
/// `extra_labels` are added to every label set on top of the backend labels.
pub fn convert_series(
    raw: Vec<RawSeries>,
    extra_labels: &LabelSet,
    params: &ConversionParams,
) -> Vec<LabeledSeries> {
    let multiplier = params.multiplier();
    let mut converted: Vec<LabeledSeries> = raw
        .into_iter()
        .map(|series| {
            let mut label_set = series.labels;
            label_set.extend(extra_labels.iter().map(|(k, v)| (k.clone(), v.clone())));
            let values = series
                .samples
                .into_iter()
                .map(|s| SamplePair::new(s.timestamp_ms, s.value * multiplier))
                .collect();
            LabeledSeries::new(label_set, values)
        })
        .collect();

    if let Some(sort_label) = params.sort_label.as_deref() {
        sort_by_label(&mut converted, sort_label, params.sorts_as_int());
        if params.remove_sort_label {
            for series in &mut converted {
                series.label_set.remove(sort_label);
            }
        }
    }
    converted
}

// Stable: series without the label keep their relative order, after labelled ones
fn sort_by_label(series: &mut [LabeledSeries], label: &str, as_int: bool) {
    let key = |s: &LabeledSeries| -> Option<SortKey> {
        s.label_set.get(label).map(|value| match value.parse::<i64>() {
            Ok(n) if as_int => SortKey::Int(n),
            _ => SortKey::Text(value.clone()),
        })
    };
    series.sort_by(|a, b| match (key(a), key(b)) {
        (Some(ka), Some(kb)) => ka.cmp(&kb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
