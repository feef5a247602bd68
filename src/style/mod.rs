//! Visual mapping: properties, rules, resolution and style application.

pub mod color;
pub mod engine;
pub mod property;
pub mod resolve;
pub mod rule;
pub mod settings;

pub use engine::{apply_all, ApplySummary};
pub use property::{ValueKind, VisualProperty};
pub use resolve::resolve;
pub use rule::{
    ContinuousRange, MappingRule, MappingStrategy, OutputRange, StrategyKind, VisualValue,
};
pub use settings::{MappingRequest, StyleSettings};
