//! Decoding of the legacy `autoscaling.alpha.kubernetes.io` metric annotations.
//!
//! `autoscaling/v1` objects carry their per-metric details as JSON arrays in
//! two annotations: the observed values (`current-metrics`) and the targets
//! (`metrics`). Each element names a source type and nests the metric under
//! a type-specific key:
//!
//! ```text
//! [{"type":"Pods","pods":{"metricName":"qps","currentAverageValue":"1500m"}}]
//! ```
//!
//! Decoding is best effort. A malformed array is reported to the caller as a
//! whole; a malformed or unsupported element only affects itself.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::hpa::quantity::{self, QuantityError};
use crate::hpa::snapshot::{CURRENT_METRICS_ANNOTATION, TARGET_METRICS_ANNOTATION};

/// The metric source types that carry a named custom metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricSourceKind {
    Object,
    Pods,
    External,
}

impl MetricSourceKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Object" => Some(Self::Object),
            "Pods" => Some(Self::Pods),
            "External" => Some(Self::External),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Pods => "Pods",
            Self::External => "External",
        }
    }

    /// JSON key of the nested source object.
    fn source_key(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Pods => "pods",
            Self::External => "external",
        }
    }
}

impl fmt::Display for MetricSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two legacy annotations is being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricDirection {
    /// Observed values, from `current-metrics`.
    Current,
    /// Desired values, from `metrics`.
    Target,
}

impl MetricDirection {
    pub fn annotation_key(&self) -> &'static str {
        match self {
            Self::Current => CURRENT_METRICS_ANNOTATION,
            Self::Target => TARGET_METRICS_ANNOTATION,
        }
    }

    /// Short name used in logs and self-metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Target => "target",
        }
    }
}

/// One successfully decoded array element.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyMetric {
    pub kind: MetricSourceKind,
    pub name: String,
    pub milli_value: i64,
}

impl LegacyMetric {
    /// Gauge value: milli-units scaled to units, rounded to five decimals.
    pub fn value(&self) -> f64 {
        milli_to_decimal(self.milli_value)
    }
}

/// Why a single array element was not exported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkippedEntry {
    #[error("metric source type {0:?} is not supported")]
    UnknownKind(String),

    #[error("{kind} metric source has no {field}")]
    MissingField {
        kind: MetricSourceKind,
        field: &'static str,
    },

    #[error("invalid quantity for metric {metric:?}: {source}")]
    InvalidQuantity {
        metric: String,
        #[source]
        source: QuantityError,
    },
}

impl SkippedEntry {
    /// Stable label value for the skip counter.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownKind(_) => "unknown_type",
            Self::MissingField { .. } => "missing_field",
            Self::InvalidQuantity { .. } => "invalid_quantity",
        }
    }
}

/// Convert milli-units to a decimal gauge value, rounded to five places.
///
/// Rounding goes through the fixed-point text form, so large magnitudes keep
/// every bit of precision the `f64` division produced.
pub fn milli_to_decimal(milli: i64) -> f64 {
    let units = milli as f64 / 1000.0;
    format!("{units:.5}").parse().unwrap_or(units)
}

/// Decode one annotation value into its elements.
///
/// The outer error means the value is not a JSON array of objects at all.
pub fn decode(
    direction: MetricDirection,
    raw: &str,
) -> Result<Vec<Result<LegacyMetric, SkippedEntry>>, serde_json::Error> {
    let entries: Vec<RawEntry> = serde_json::from_str(raw)?;
    Ok(entries
        .into_iter()
        .map(|entry| entry.resolve(direction))
        .collect())
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    object: Option<RawSource>,
    #[serde(default)]
    pods: Option<RawSource>,
    #[serde(default)]
    external: Option<RawSource>,
}

impl RawEntry {
    fn resolve(self, direction: MetricDirection) -> Result<LegacyMetric, SkippedEntry> {
        let kind = MetricSourceKind::parse(&self.kind)
            .ok_or_else(|| SkippedEntry::UnknownKind(self.kind.clone()))?;

        let source = match kind {
            MetricSourceKind::Object => self.object,
            MetricSourceKind::Pods => self.pods,
            MetricSourceKind::External => self.external,
        }
        .ok_or(SkippedEntry::MissingField {
            kind,
            field: kind.source_key(),
        })?;

        let (field, quantity) = source.value_for(direction, kind);
        let quantity = quantity.ok_or(SkippedEntry::MissingField { kind, field })?;
        let milli_value =
            quantity
                .milli_value()
                .map_err(|source_err| SkippedEntry::InvalidQuantity {
                    metric: source.metric_name.clone(),
                    source: source_err,
                })?;

        Ok(LegacyMetric {
            kind,
            name: source.metric_name,
            milli_value,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSource {
    metric_name: String,
    average_value: Option<RawQuantity>,
    current_average_value: Option<RawQuantity>,
    target_value: Option<RawQuantity>,
    target_average_value: Option<RawQuantity>,
}

impl RawSource {
    /// The value field each (direction, kind) pair reads.
    fn value_for(
        &self,
        direction: MetricDirection,
        kind: MetricSourceKind,
    ) -> (&'static str, Option<&RawQuantity>) {
        use MetricDirection::*;
        use MetricSourceKind::*;

        match (direction, kind) {
            (Current, Object) => ("averageValue", self.average_value.as_ref()),
            (Current, Pods) => ("currentAverageValue", self.current_average_value.as_ref()),
            (Current, External) => ("currentAverageValue", self.current_average_value.as_ref()),
            (Target, Object) => ("targetValue", self.target_value.as_ref()),
            (Target, Pods) => ("targetAverageValue", self.target_average_value.as_ref()),
            (Target, External) => ("targetAverageValue", self.target_average_value.as_ref()),
        }
    }
}

/// Quantities are normally strings, but bare JSON numbers are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Text(String),
    Number(serde_json::Number),
}

impl RawQuantity {
    fn milli_value(&self) -> Result<i64, QuantityError> {
        match self {
            Self::Text(text) => quantity::milli_value(text),
            Self::Number(number) => quantity::milli_value(&number.to_string()),
        }
    }
}
