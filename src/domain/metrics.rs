// Metric series domain models
use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::collections::BTreeMap;

pub const NAME_LABEL: &str = "__name__";
pub const STAT_LABEL: &str = "__stat__";

pub type LabelSet = BTreeMap<String, String>;

/// Result of a single backend range query
pub type SeriesResult = anyhow::Result<Vec<RawSeries>>;

/// Per-statistic results of a histogram query ("avg", "0.99", ...)
pub type HistogramResult = BTreeMap<String, SeriesResult>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePair {
    pub timestamp_ms: i64,
    pub value: f64,
}

impl SamplePair {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }

    fn format_value(&self) -> String {
        if self.value.is_nan() {
            "NaN".to_string()
        } else if self.value.is_infinite() {
            if self.value > 0.0 { "+Inf" } else { "-Inf" }.to_string()
        } else {
            self.value.to_string()
        }
    }
}

// Encoded as [seconds, "value"] so NaN and infinities survive JSON
impl Serialize for SamplePair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        if self.timestamp_ms % 1000 == 0 {
            tuple.serialize_element(&(self.timestamp_ms / 1000))?;
        } else {
            tuple.serialize_element(&(self.timestamp_ms as f64 / 1000.0))?;
        }
        tuple.serialize_element(&self.format_value())?;
        tuple.end()
    }
}

/// A series as returned by the metrics backend
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSeries {
    pub labels: LabelSet,
    pub samples: Vec<SamplePair>,
}

impl RawSeries {
    pub fn new(labels: LabelSet, samples: Vec<SamplePair>) -> Self {
        Self { labels, samples }
    }
}

/// A display-ready series
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledSeries {
    pub label_set: LabelSet,
    pub values: Vec<SamplePair>,
}

impl LabeledSeries {
    pub fn new(label_set: LabelSet, values: Vec<SamplePair>) -> Self {
        Self { label_set, values }
    }
}
