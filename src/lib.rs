pub mod app_context;
pub mod backend;
pub mod coerce;
pub mod common;
pub mod data_loader;
pub mod document;
pub mod errors;
pub mod graph;
pub mod import;
pub mod overlay;
pub mod plan;
pub mod plan_execution;
pub mod stats;
pub mod style;
pub mod value;
