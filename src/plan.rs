use serde::{Deserialize, Serialize};

use crate::backend::ElementKind;
use crate::coerce::DeclaredType;
use crate::import::ColumnRole;
use crate::style::{MappingRequest, OutputRange, StrategyKind, VisualProperty};

/// ## Structure
/// Batch run configuration, read from YAML.
///
/// ```text
/// Plan
///   ├── meta: Option<PlanMeta>
///   │   └── name: Option<String>
///   ├── network: TableImport          edge table, source + target roles
///   │   ├── filename: String
///   │   └── columns: Vec<ColumnRole>
///   ├── nodes: Option<TableImport>    node table, one node role
///   ├── style: Option<String>         document to take style settings from
///   ├── mappings: Vec<MappingRequest>
///   └── output: String
/// ```
///
/// File names are relative to the plan file. An empty `columns` list means
/// the suggested roles for the table are used.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Plan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PlanMeta>,
    pub network: TableImport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<TableImport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub mappings: Vec<MappingRequest>,
    pub output: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PlanMeta {
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TableImport {
    pub filename: String,
    #[serde(default)]
    pub columns: Vec<ColumnRole>,
}

impl Plan {
    pub fn name(&self) -> String {
        self.meta
            .as_ref()
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| crate::document::DEFAULT_NETWORK_NAME.to_string())
    }
}

impl Default for Plan {
    fn default() -> Self {
        Plan {
            meta: Some(PlanMeta {
                name: Some("Network".to_string()),
            }),
            network: TableImport {
                filename: "edges.csv".to_string(),
                columns: vec![
                    ColumnRole::Source,
                    ColumnRole::Target,
                    ColumnRole::attribute(DeclaredType::Number),
                ],
            },
            nodes: Some(TableImport {
                filename: "nodes.csv".to_string(),
                columns: vec![
                    ColumnRole::Node,
                    ColumnRole::attribute(DeclaredType::String),
                ],
            }),
            style: None,
            mappings: vec![MappingRequest {
                kind: ElementKind::Edge,
                property: VisualProperty::Width,
                column: "weight".to_string(),
                strategy: Some(StrategyKind::Continuous),
                output: Some(OutputRange::Number { min: 1.0, max: 10.0 }),
                values: Default::default(),
            }],
            output: "network.json".to_string(),
        }
    }
}
