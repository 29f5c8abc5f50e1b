//! Feature binarization.
//!
//! Each named feature carries a [`ThresholdSpec`] deciding whether a raw
//! reading maps to bit 1 or bit 0. A [`FeatureSchema`] fixes the order in
//! which features are laid out in every snapshot.

use crate::error::{HopfieldError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Binarization rule for one feature.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ThresholdSpec {
    /// `reading > value`
    Above { value: f64 },
    /// `reading < value`
    Below { value: f64 },
    /// `reading == value`
    Equal { value: f64 },
    /// `min <= reading <= max`
    Range { min: f64, max: f64 },
}

impl ThresholdSpec {
    /// Map a raw reading to a bit.
    pub fn apply(&self, reading: f64) -> bool {
        match *self {
            ThresholdSpec::Above { value } => reading > value,
            ThresholdSpec::Below { value } => reading < value,
            ThresholdSpec::Equal { value } => reading == value,
            ThresholdSpec::Range { min, max } => min <= reading && reading <= max,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            ThresholdSpec::Above { .. } => "above",
            ThresholdSpec::Below { .. } => "below",
            ThresholdSpec::Equal { .. } => "equal",
            ThresholdSpec::Range { .. } => "range",
        }
    }

    /// Parse a loosely-typed JSON spec such as `{"mode": "range", "min": 60, "max": 80}`.
    ///
    /// Errors name the feature and the missing or malformed field.
    pub fn from_json(feature: &str, spec: &Value) -> Result<Self> {
        let invalid = |reason: String| HopfieldError::InvalidThreshold {
            feature: feature.to_string(),
            reason,
        };

        let obj = spec
            .as_object()
            .ok_or_else(|| invalid("threshold must be an object".into()))?;
        let mode = match obj.get("mode") {
            None | Some(Value::Null) => return Err(invalid("missing mode".into())),
            Some(Value::String(m)) => m.as_str(),
            Some(other) => return Err(invalid(format!("mode must be a string, got {}", other))),
        };

        let number = |key: &str| -> Result<f64> {
            match obj.get(key) {
                None | Some(Value::Null) => Err(invalid(format!("{} mode requires {}", mode, key))),
                Some(v) => v
                    .as_f64()
                    .ok_or_else(|| invalid(format!("{} mode: {} must be a number, got {}", mode, key, v))),
            }
        };

        match mode {
            "above" => Ok(ThresholdSpec::Above {
                value: number("value")?,
            }),
            "below" => Ok(ThresholdSpec::Below {
                value: number("value")?,
            }),
            "equal" => Ok(ThresholdSpec::Equal {
                value: number("value")?,
            }),
            "range" => {
                if !obj.contains_key("min") || !obj.contains_key("max") {
                    return Err(invalid("range mode requires min and max".into()));
                }
                Ok(ThresholdSpec::Range {
                    min: number("min")?,
                    max: number("max")?,
                })
            }
            other => Err(invalid(format!(
                "unknown mode {:?} (expected above, below, equal or range)",
                other
            ))),
        }
    }
}

/// Ordered feature names with their binarization rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    features: Vec<(String, ThresholdSpec)>,
}

impl FeatureSchema {
    /// Build a schema for exactly `feature_count` features.
    ///
    /// Without `order` the features keep the order of `specs`. With `order`
    /// every name must appear in `specs` exactly once.
    pub fn new(
        feature_count: usize,
        specs: Vec<(String, ThresholdSpec)>,
        order: Option<&[&str]>,
    ) -> Result<Self> {
        if specs.len() != feature_count {
            return Err(HopfieldError::ThresholdCount {
                expected: feature_count,
                got: specs.len(),
            });
        }
        let mut seen = HashSet::new();
        for (name, _) in &specs {
            if !seen.insert(name.as_str()) {
                return Err(HopfieldError::InvalidThreshold {
                    feature: name.clone(),
                    reason: "duplicate feature".into(),
                });
            }
        }

        let features = match order {
            None => specs,
            Some(names) => {
                if names.len() != feature_count {
                    return Err(HopfieldError::ThresholdCount {
                        expected: feature_count,
                        got: names.len(),
                    });
                }
                let mut by_name: HashMap<String, ThresholdSpec> = specs.into_iter().collect();
                let mut ordered = Vec::with_capacity(feature_count);
                for &name in names {
                    let spec = by_name.remove(name).ok_or_else(|| {
                        HopfieldError::InvalidThreshold {
                            feature: name.to_string(),
                            reason: "named in feature order but has no threshold".into(),
                        }
                    })?;
                    ordered.push((name.to_string(), spec));
                }
                ordered
            }
        };

        Ok(Self { features })
    }

    /// Build from a JSON object of `{name: spec}` entries.
    ///
    /// `serde_json` keeps object keys sorted, so pass `order` when the
    /// layout must follow some other sequence.
    pub fn from_json(feature_count: usize, specs: &Value, order: Option<&[&str]>) -> Result<Self> {
        let obj = specs.as_object().ok_or_else(|| {
            HopfieldError::InvalidConfig("thresholds must be a JSON object".into())
        })?;
        let parsed = obj
            .iter()
            .map(|(name, spec)| -> Result<(String, ThresholdSpec)> {
                Ok((name.clone(), ThresholdSpec::from_json(name, spec)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(feature_count, parsed, order)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature names in layout order.
    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn specs(&self) -> &[(String, ThresholdSpec)] {
        &self.features
    }

    /// Binarize one reading per feature, in layout order.
    pub fn binarize(&self, readings: &HashMap<String, f64>) -> Result<Vec<bool>> {
        self.features
            .iter()
            .map(|(name, spec)| {
                readings
                    .get(name)
                    .map(|&v| spec.apply(v))
                    .ok_or_else(|| HopfieldError::MissingFeature(name.clone()))
            })
            .collect()
    }
}
