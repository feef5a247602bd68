//! The complete rule set of an open document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::{ElementKind, GraphBackend};
use crate::errors::{StyleError, StyleResult};
use crate::stats::{column_kind, numeric_range, unique_values, ColumnKind, NumericRange};
use crate::style::property::VisualProperty;
use crate::style::rule::{
    ContinuousRange, MappingRule, MappingStrategy, OutputRange, StrategyKind, VisualValue,
};
use crate::value::AttributeValue;

pub type RuleSet = IndexMap<VisualProperty, MappingRule>;

/// A user request to (re)configure one mapping, as issued by the style
/// panel or listed in a batch plan.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MappingRequest {
    pub kind: ElementKind,
    pub property: VisualProperty,
    #[serde(default)]
    pub column: String,
    /// Picked from the column's data when omitted.
    #[serde(default)]
    pub strategy: Option<StrategyKind>,
    #[serde(default)]
    pub output: Option<OutputRange>,
    /// Discrete entries to set after seeding.
    #[serde(default)]
    pub values: IndexMap<String, VisualValue>,
}

/// Node and edge mapping rules, each carrying its property's default value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StyleSettings {
    #[serde(default)]
    pub node: RuleSet,
    #[serde(default)]
    pub edge: RuleSet,
}

fn builtin_default(property: VisualProperty) -> VisualValue {
    match property {
        VisualProperty::FillColor => "#2563eb".into(),
        VisualProperty::LabelColor => "#1e293b".into(),
        VisualProperty::LabelFontSize => 12.0.into(),
        VisualProperty::Shape => "ellipse".into(),
        VisualProperty::Size => 40.0.into(),
        VisualProperty::BorderWidth => 3.0.into(),
        VisualProperty::BorderColor => "#1d4ed8".into(),
        VisualProperty::Opacity => 1.0.into(),
        VisualProperty::LineColor => "#94a3b8".into(),
        VisualProperty::Width => 2.0.into(),
        VisualProperty::LineType => "solid".into(),
        VisualProperty::ArrowShape => "triangle".into(),
        VisualProperty::CurveStyle => "bezier".into(),
    }
}

fn default_rules(kind: ElementKind) -> RuleSet {
    VisualProperty::for_kind(kind)
        .into_iter()
        .map(|p| (p, MappingRule::new(builtin_default(p))))
        .collect()
}

impl Default for StyleSettings {
    fn default() -> Self {
        StyleSettings {
            node: default_rules(ElementKind::Node),
            edge: default_rules(ElementKind::Edge),
        }
    }
}

struct ColumnSnapshot {
    unique: Vec<AttributeValue>,
    range: NumericRange,
    kind: ColumnKind,
}

fn snapshot<B: GraphBackend + ?Sized>(backend: &B, kind: ElementKind, column: &str) -> ColumnSnapshot {
    match kind {
        ElementKind::Node => ColumnSnapshot {
            unique: unique_values(backend.nodes(), column),
            range: numeric_range(backend.nodes(), column),
            kind: column_kind(backend.nodes(), column),
        },
        ElementKind::Edge => ColumnSnapshot {
            unique: unique_values(backend.edges(), column),
            range: numeric_range(backend.edges(), column),
            kind: column_kind(backend.edges(), column),
        },
    }
}

impl StyleSettings {
    pub fn rules(&self, kind: ElementKind) -> &RuleSet {
        match kind {
            ElementKind::Node => &self.node,
            ElementKind::Edge => &self.edge,
        }
    }

    fn rules_mut(&mut self, kind: ElementKind) -> &mut RuleSet {
        match kind {
            ElementKind::Node => &mut self.node,
            ElementKind::Edge => &mut self.edge,
        }
    }

    pub fn rule(&self, kind: ElementKind, property: VisualProperty) -> StyleResult<&MappingRule> {
        self.rules(kind)
            .get(&property)
            .ok_or_else(|| not_applicable(kind, property))
    }

    pub fn rule_mut(
        &mut self,
        kind: ElementKind,
        property: VisualProperty,
    ) -> StyleResult<&mut MappingRule> {
        self.rules_mut(kind)
            .get_mut(&property)
            .ok_or_else(|| not_applicable(kind, property))
    }

    /// Change the non-mapped value of a property.
    pub fn set_default(
        &mut self,
        kind: ElementKind,
        property: VisualProperty,
        value: VisualValue,
    ) -> StyleResult<()> {
        let value = value.normalized_for(property);
        value.validate_for(property)?;
        self.rule_mut(kind, property)?.default_value = value;
        Ok(())
    }

    /// Switch a rule on or off without touching its column or payload.
    pub fn set_active(
        &mut self,
        kind: ElementKind,
        property: VisualProperty,
        active: bool,
    ) -> StyleResult<()> {
        self.rule_mut(kind, property)?.active = active;
        Ok(())
    }

    /// Bind a property to a column.
    ///
    /// Discrete tables are seeded from the column's distinct values and the
    /// continuous domain is snapshotted from its numeric range. Changing the
    /// column or the strategy drops the previous table or range. An empty
    /// column or a `none` strategy clears the mapping.
    pub fn configure_mapping<B: GraphBackend + ?Sized>(
        &mut self,
        request: &MappingRequest,
        backend: &B,
    ) -> StyleResult<()> {
        let MappingRequest {
            kind,
            property,
            column,
            ..
        } = request;
        let (kind, property) = (*kind, *property);

        if column.is_empty() || request.strategy == Some(StrategyKind::None) {
            let rule = self.rule_mut(kind, property)?;
            rule.column.clear();
            rule.strategy = MappingStrategy::None;
            rule.active = false;
            debug!("Cleared {} mapping for {}", kind, property);
            return Ok(());
        }

        let column_data = snapshot(backend, kind, column);
        let strategy_kind = request
            .strategy
            .unwrap_or_else(|| MappingRule::suggested_strategy(property, column_data.kind));

        let rule = self.rule_mut(kind, property)?;
        let same_binding = rule.column == *column && rule.strategy.kind() == strategy_kind;

        let strategy = match strategy_kind {
            StrategyKind::None => MappingStrategy::None,
            StrategyKind::Passthrough => MappingStrategy::Passthrough,
            StrategyKind::Discrete => {
                let values = match (&rule.strategy, same_binding) {
                    (MappingStrategy::Discrete { values }, true) => values.clone(),
                    _ => IndexMap::new(),
                };
                MappingStrategy::Discrete { values }
            }
            StrategyKind::Continuous => {
                let previous = match (&rule.strategy, same_binding) {
                    (MappingStrategy::Continuous(range), true) => Some(range.output.clone()),
                    _ => None,
                };
                let output = request
                    .output
                    .clone()
                    .or(previous)
                    .or_else(|| OutputRange::default_for(property))
                    .ok_or_else(|| StyleError::IncompatibleStrategy {
                        property: property.to_string(),
                        strategy: strategy_kind.to_string(),
                    })?;
                MappingStrategy::Continuous(ContinuousRange {
                    domain_min: column_data.range.min,
                    domain_max: column_data.range.max,
                    output,
                })
            }
        };

        rule.bind(property, column, strategy)?;
        let seeded = rule.seed_discrete(&column_data.unique);
        for (key, value) in &request.values {
            rule.set_discrete_value(property, key, value.clone().normalized_for(property))?;
        }

        info!(
            "Mapped {} {} from column '{}' ({}, {} new discrete entries)",
            kind, property, column, strategy_kind, seeded
        );
        Ok(())
    }

    /// Re-snapshot a continuous rule's domain from the current data.
    /// Returns false when the rule is not continuous.
    pub fn refresh_continuous_domain<B: GraphBackend + ?Sized>(
        &mut self,
        kind: ElementKind,
        property: VisualProperty,
        backend: &B,
    ) -> StyleResult<bool> {
        let column = self.rule(kind, property)?.column.clone();
        let range = snapshot(backend, kind, &column).range;
        match &mut self.rule_mut(kind, property)?.strategy {
            MappingStrategy::Continuous(continuous) => {
                continuous.domain_min = range.min;
                continuous.domain_max = range.max;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Give every active discrete rule an entry for each value currently in
    /// its column. Existing entries are left alone.
    pub fn seed_discrete_rules<B: GraphBackend + ?Sized>(&mut self, backend: &B) -> usize {
        let mut seeded = 0;
        for kind in [ElementKind::Node, ElementKind::Edge] {
            for rule in self.rules_mut(kind).values_mut() {
                if !rule.is_active() || rule.strategy.kind() != StrategyKind::Discrete {
                    continue;
                }
                let unique = snapshot(backend, kind, &rule.column).unique;
                seeded += rule.seed_discrete(&unique);
            }
        }
        seeded
    }

    /// Bring loaded settings into shape: numeric defaults stored as strings
    /// become numbers, properties missing for a kind get built-in rules and
    /// properties that do not apply to a kind are dropped.
    pub fn normalized(mut self) -> Self {
        for kind in [ElementKind::Node, ElementKind::Edge] {
            let loaded = std::mem::take(self.rules_mut(kind));
            let mut rules = default_rules(kind);
            for (property, mut rule) in loaded {
                if !property.applies_to(kind) {
                    debug!("Dropping {} rule for {}", kind, property);
                    continue;
                }
                rule.default_value = rule.default_value.normalized_for(property);
                if let MappingStrategy::Discrete { values } = &mut rule.strategy {
                    for value in values.values_mut() {
                        *value = value.clone().normalized_for(property);
                    }
                }
                rules.insert(property, rule);
            }
            *self.rules_mut(kind) = rules;
        }
        self
    }

    /// Check every rule's strategy against its property's value kind.
    pub fn validate(&self) -> StyleResult<()> {
        for kind in [ElementKind::Node, ElementKind::Edge] {
            for (property, rule) in self.rules(kind) {
                if !property.applies_to(kind) {
                    return Err(not_applicable(kind, *property));
                }
                MappingRule::check_compatible(*property, &rule.strategy)?;
            }
        }
        Ok(())
    }

    /// Active rules of a kind.
    pub fn active_rules(&self, kind: ElementKind) -> impl Iterator<Item = (&VisualProperty, &MappingRule)> {
        self.rules(kind).iter().filter(|(_, rule)| rule.is_active())
    }
}

fn not_applicable(kind: ElementKind, property: VisualProperty) -> StyleError {
    StyleError::NotApplicable {
        property: property.to_string(),
        kind: kind.to_string(),
    }
}
