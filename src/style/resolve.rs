//! Evaluation of one mapping rule against one element.
//!
//! Resolution never fails: a missing column, an unreadable number or an
//! unseen discrete value all yield the rule's default value. Continuous
//! rules use the domain captured on the rule and never look at live column
//! statistics, so values outside a stale domain extrapolate.

use tracing::trace;

use crate::backend::AttributeSource;
use crate::style::color::interpolate_hex;
use crate::style::property::{ValueKind, VisualProperty};
use crate::style::rule::{ContinuousRange, MappingRule, MappingStrategy, OutputRange, VisualValue};
use crate::value::AttributeValue;

// Math.round semantics: halves round up.
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Interpolate a continuous range at `value`.
pub fn interpolate(property: VisualProperty, range: &ContinuousRange, value: f64) -> VisualValue {
    let ratio = range.ratio(value);
    match &range.output {
        OutputRange::Number { min, max } => {
            let size = min + (max - min) * ratio;
            let rounded = if property.rounds_to_integer() {
                round_half_up(size)
            } else {
                round_half_up(size * 10.0) / 10.0
            };
            VisualValue::Number(rounded)
        }
        OutputRange::Color { min, max } => VisualValue::Text(interpolate_hex(min, max, ratio)),
    }
}

fn passthrough(property: VisualProperty, raw: &AttributeValue) -> Option<VisualValue> {
    match property.value_kind() {
        ValueKind::Number => Some(
            raw.as_f64()
                .map(VisualValue::Number)
                .unwrap_or_else(|| VisualValue::Text(raw.to_string())),
        ),
        ValueKind::Color => Some(VisualValue::Text(raw.to_string())),
        ValueKind::Enum(tokens) => {
            let token = raw.to_string();
            tokens
                .contains(&token.as_str())
                .then(|| VisualValue::Text(token))
        }
    }
}

/// Compute the value of `property` for `element` under `rule`.
pub fn resolve<E: AttributeSource + ?Sized>(
    element: &E,
    property: VisualProperty,
    rule: &MappingRule,
) -> VisualValue {
    if !rule.is_active() {
        return rule.default_value.clone();
    }

    let raw = match element.attribute(&rule.column) {
        Some(raw) if !raw.is_blank() => raw,
        _ => {
            trace!("No '{}' value, using default {}", rule.column, property);
            return rule.default_value.clone();
        }
    };

    let resolved = match &rule.strategy {
        MappingStrategy::None => None,
        MappingStrategy::Passthrough => passthrough(property, raw),
        MappingStrategy::Continuous(range) => raw
            .as_f64()
            .map(|value| interpolate(property, range, value)),
        MappingStrategy::Discrete { values } => values.get(&raw.to_string()).cloned(),
    };

    resolved.unwrap_or_else(|| {
        trace!("'{}' has no mapping for {}, using default", raw, property);
        rule.default_value.clone()
    })
}
