//! Mapping rules: how one visual property is derived from element data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum::{Display as StrumDisplay, EnumString};

use crate::errors::{StyleError, StyleResult};
use crate::stats::ColumnKind;
use crate::style::property::{ValueKind, VisualProperty};
use crate::value::{parse_float_prefix, AttributeValue};

/// A concrete visual value: a number, or a colour/token string.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum VisualValue {
    Number(f64),
    Text(String),
}

impl VisualValue {
    /// Numeric reading. Older documents stored numbers as strings (`"12"`).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            VisualValue::Number(n) => Some(*n),
            VisualValue::Text(s) => parse_float_prefix(s),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            VisualValue::Text(s) => Some(s),
            VisualValue::Number(_) => None,
        }
    }

    /// JSON form for render attributes: whole numbers become integers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            VisualValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serde_json::Value::from(*n as i64)
            }
            VisualValue::Number(n) => serde_json::Value::from(*n),
            VisualValue::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }

    /// Normalise a loaded value to the property's kind, e.g. `"40"` to `40`.
    pub fn normalized_for(self, property: VisualProperty) -> VisualValue {
        match (property.value_kind(), &self) {
            (ValueKind::Number, VisualValue::Text(s)) => match parse_float_prefix(s) {
                Some(n) => VisualValue::Number(n),
                None => self,
            },
            (ValueKind::Color | ValueKind::Enum(_), VisualValue::Number(n)) => {
                VisualValue::Text(n.to_string())
            }
            _ => self,
        }
    }

    /// Check that the value is legal for `property`.
    pub fn validate_for(&self, property: VisualProperty) -> StyleResult<()> {
        let invalid = || StyleError::InvalidValue {
            property: property.to_string(),
            value: self.to_string(),
        };
        match property.value_kind() {
            ValueKind::Number => self.as_number().map(|_| ()).ok_or_else(invalid),
            ValueKind::Color => match self {
                VisualValue::Text(s) => {
                    crate::style::color::Color::parse_hex(s)?;
                    Ok(())
                }
                VisualValue::Number(_) => Err(invalid()),
            },
            ValueKind::Enum(tokens) => match self {
                VisualValue::Text(s) if tokens.contains(&s.as_str()) => Ok(()),
                _ => Err(invalid()),
            },
        }
    }
}

impl Display for VisualValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VisualValue::Number(n) => write!(f, "{}", n),
            VisualValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for VisualValue {
    fn from(n: f64) -> Self {
        VisualValue::Number(n)
    }
}

impl From<&str> for VisualValue {
    fn from(s: &str) -> Self {
        VisualValue::Text(s.to_string())
    }
}

/// Output side of a continuous mapping.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum OutputRange {
    Number {
        #[serde(rename = "outMin")]
        min: f64,
        #[serde(rename = "outMax")]
        max: f64,
    },
    Color {
        #[serde(rename = "colorMin")]
        min: String,
        #[serde(rename = "colorMax")]
        max: String,
    },
}

impl OutputRange {
    /// Defaults offered when a continuous mapping is first configured.
    pub fn default_for(property: VisualProperty) -> Option<OutputRange> {
        match property.value_kind() {
            ValueKind::Color => Some(OutputRange::Color {
                min: "#ffff00".to_string(),
                max: "#000080".to_string(),
            }),
            ValueKind::Number if property == VisualProperty::Width => {
                Some(OutputRange::Number { min: 1.0, max: 10.0 })
            }
            ValueKind::Number => Some(OutputRange::Number { min: 1.0, max: 20.0 }),
            ValueKind::Enum(_) => None,
        }
    }

    fn matches_kind(&self, kind: ValueKind) -> bool {
        matches!(
            (self, kind),
            (OutputRange::Number { .. }, ValueKind::Number)
                | (OutputRange::Color { .. }, ValueKind::Color)
        )
    }
}

/// Domain snapshot plus output range of a continuous mapping.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContinuousRange {
    pub domain_min: f64,
    pub domain_max: f64,
    #[serde(flatten)]
    pub output: OutputRange,
}

impl ContinuousRange {
    /// Position of `value` in the domain. Not clamped; 0 for an empty domain.
    pub fn ratio(&self, value: f64) -> f64 {
        if self.domain_max == self.domain_min {
            0.0
        } else {
            (value - self.domain_min) / (self.domain_max - self.domain_min)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, StrumDisplay, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StrategyKind {
    None,
    Discrete,
    Continuous,
    Passthrough,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MappingStrategy {
    #[default]
    None,
    Discrete {
        #[serde(default)]
        values: IndexMap<String, VisualValue>,
    },
    Continuous(ContinuousRange),
    Passthrough,
}

impl MappingStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            MappingStrategy::None => StrategyKind::None,
            MappingStrategy::Discrete { .. } => StrategyKind::Discrete,
            MappingStrategy::Continuous(_) => StrategyKind::Continuous,
            MappingStrategy::Passthrough => StrategyKind::Passthrough,
        }
    }
}

/// How one visual property is computed for every element of a kind.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MappingRule {
    /// User toggle. A switched-off rule keeps its column and payload.
    pub active: bool,
    #[serde(default)]
    pub column: String,
    #[serde(default)]
    pub strategy: MappingStrategy,
    pub default_value: VisualValue,
}

impl MappingRule {
    pub fn new(default_value: VisualValue) -> Self {
        MappingRule {
            active: false,
            column: String::new(),
            strategy: MappingStrategy::None,
            default_value,
        }
    }

    /// Whether the resolver consults the rule at all.
    pub fn is_active(&self) -> bool {
        self.active && !self.column.is_empty() && self.strategy != MappingStrategy::None
    }

    /// Reject strategies the property's value kind cannot take.
    pub fn check_compatible(property: VisualProperty, strategy: &MappingStrategy) -> StyleResult<()> {
        let kind = property.value_kind();
        let compatible = match strategy {
            MappingStrategy::Continuous(range) => range.output.matches_kind(kind),
            _ => true,
        };
        if compatible {
            Ok(())
        } else {
            Err(StyleError::IncompatibleStrategy {
                property: property.to_string(),
                strategy: strategy.kind().to_string(),
            })
        }
    }

    /// Bind the rule to `column` with `strategy` and switch it on.
    pub fn bind(
        &mut self,
        property: VisualProperty,
        column: &str,
        strategy: MappingStrategy,
    ) -> StyleResult<()> {
        MappingRule::check_compatible(property, &strategy)?;
        self.column = column.to_string();
        self.strategy = strategy;
        self.active = !column.is_empty();
        Ok(())
    }

    /// Add a discrete entry for every value not in the table yet, using the
    /// current default. Returns how many were added.
    pub fn seed_discrete(&mut self, observed: &[AttributeValue]) -> usize {
        let default_value = self.default_value.clone();
        match &mut self.strategy {
            MappingStrategy::Discrete { values } => {
                let before = values.len();
                for value in observed {
                    values
                        .entry(value.to_string())
                        .or_insert_with(|| default_value.clone());
                }
                values.len() - before
            }
            _ => 0,
        }
    }

    /// Edit one entry of a discrete table.
    pub fn set_discrete_value(
        &mut self,
        property: VisualProperty,
        key: &str,
        value: VisualValue,
    ) -> StyleResult<()> {
        value.validate_for(property)?;
        match &mut self.strategy {
            MappingStrategy::Discrete { values } => {
                values.insert(key.to_string(), value);
                Ok(())
            }
            other => Err(StyleError::IncompatibleStrategy {
                property: property.to_string(),
                strategy: other.kind().to_string(),
            }),
        }
    }

    /// Continuous for numeric columns on numeric or colour properties, otherwise discrete.
    pub fn suggested_strategy(property: VisualProperty, column_kind: ColumnKind) -> StrategyKind {
        match (column_kind, property.value_kind()) {
            (ColumnKind::Numeric, ValueKind::Number | ValueKind::Color) => StrategyKind::Continuous,
            _ => StrategyKind::Discrete,
        }
    }
}
