//! Tabular import: column roles, their validation, and the suggestions the
//! import dialog pre-fills.

pub mod pipeline;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tracing::{debug, warn};

use crate::coerce::{detect_column_type, DeclaredType, DEFAULT_DELIMITER};
use crate::errors::{ImportError, ImportResult};

pub use pipeline::{import_edges, import_node_attributes, EdgeImport, NodeAttributeImport, NodeRecord};

/// Header row plus data rows, all cells as raw strings.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TabularData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularData {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        TabularData { headers, rows }
    }

    /// Build from string slices, mostly for tests and fixtures.
    pub fn from_strs(headers: &[&str], rows: &[&[&str]]) -> Self {
        TabularData {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Cell at (row, column); short rows read as empty.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Element fields that attribute columns may not shadow.
pub const RESERVED_EDGE_FIELDS: &[&str] = &["id", "source", "target"];
pub const RESERVED_NODE_FIELDS: &[&str] = &["id"];

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

/// What a column contributes to the import.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ColumnRole {
    Source,
    Target,
    /// Join key of a node attribute table.
    Node,
    Attribute {
        #[serde(default, rename = "type")]
        declared_type: DeclaredType,
        #[serde(default = "default_delimiter")]
        delimiter: String,
    },
    Ignore,
}

impl ColumnRole {
    pub fn attribute(declared_type: DeclaredType) -> Self {
        ColumnRole::Attribute {
            declared_type,
            delimiter: default_delimiter(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ColumnRole::Source => "Source",
            ColumnRole::Target => "Target",
            ColumnRole::Node => "Node",
            ColumnRole::Attribute { .. } => "Attribute",
            ColumnRole::Ignore => "Ignore",
        }
    }

    /// Roles that at most one column may carry.
    pub fn is_key_role(&self) -> bool {
        matches!(self, ColumnRole::Source | ColumnRole::Target | ColumnRole::Node)
    }
}

impl Display for ColumnRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRole::Attribute {
                declared_type,
                delimiter,
            } if declared_type.is_array() => {
                write!(f, "Attribute ({}, split on {:?})", declared_type, delimiter)
            }
            ColumnRole::Attribute { declared_type, .. } => write!(f, "Attribute ({})", declared_type),
            other => write!(f, "{}", other.name()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Edge,
    Node,
}

impl TableKind {
    pub fn reserved_fields(&self) -> &'static [&'static str] {
        match self {
            TableKind::Edge => RESERVED_EDGE_FIELDS,
            TableKind::Node => RESERVED_NODE_FIELDS,
        }
    }

    fn is_reserved(&self, header: &str) -> bool {
        self.reserved_fields().contains(&header.trim())
    }
}

impl Display for TableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TableKind::Edge => write!(f, "edge"),
            TableKind::Node => write!(f, "node"),
        }
    }
}

/// Column indexes of the key roles after validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyColumns {
    Edge { source: usize, target: usize },
    Node { key: usize },
}

fn single_role(roles: &[ColumnRole], role: &ColumnRole) -> ImportResult<usize> {
    let mut positions = roles
        .iter()
        .enumerate()
        .filter(|(_, r)| *r == role)
        .map(|(i, _)| i);
    let first = positions
        .next()
        .ok_or_else(|| ImportError::MissingRole(role.name().to_string()))?;
    if let Some(second) = positions.next() {
        return Err(ImportError::DuplicateRole {
            role: role.name().to_string(),
            first,
            second,
        });
    }
    Ok(first)
}

fn check_roles(table: &TabularData, roles: &[ColumnRole], kind: TableKind) -> ImportResult<()> {
    if table.headers.is_empty() {
        return Err(ImportError::EmptyTable("no header row".to_string()));
    }
    if roles.len() > table.width() {
        return Err(ImportError::ColumnOutOfRange {
            index: roles.len() - 1,
            width: table.width(),
        });
    }

    let not_allowed: &[ColumnRole] = match kind {
        TableKind::Edge => &[ColumnRole::Node],
        TableKind::Node => &[ColumnRole::Source, ColumnRole::Target],
    };
    if let Some(role) = roles.iter().find(|r| not_allowed.contains(r)) {
        return Err(ImportError::RoleNotAllowed {
            role: role.name().to_string(),
            table: kind.to_string(),
        });
    }

    let reserved = roles.iter().enumerate().find(|(i, role)| {
        matches!(role, ColumnRole::Attribute { .. }) && kind.is_reserved(&table.headers[*i])
    });
    match reserved {
        Some((index, _)) => Err(ImportError::ReservedAttributeName {
            name: table.headers[index].clone(),
            index,
        }),
        None => Ok(()),
    }
}

/// Source and target column of an edge table.
pub fn validate_edge_roles(table: &TabularData, roles: &[ColumnRole]) -> ImportResult<(usize, usize)> {
    check_roles(table, roles, TableKind::Edge)?;
    let source = single_role(roles, &ColumnRole::Source)?;
    let target = single_role(roles, &ColumnRole::Target)?;
    Ok((source, target))
}

/// Key column of a node table.
pub fn validate_node_roles(table: &TabularData, roles: &[ColumnRole]) -> ImportResult<usize> {
    check_roles(table, roles, TableKind::Node)?;
    single_role(roles, &ColumnRole::Node)
}

/// Check a role assignment against a table before anything is imported.
///
/// Edge tables need exactly one source and one target column, node tables
/// exactly one node column. Roles beyond the header width are rejected;
/// columns without a role are ignored.
pub fn validate_roles(
    table: &TabularData,
    roles: &[ColumnRole],
    kind: TableKind,
) -> ImportResult<KeyColumns> {
    let keys = match kind {
        TableKind::Edge => {
            let (source, target) = validate_edge_roles(table, roles)?;
            KeyColumns::Edge { source, target }
        }
        TableKind::Node => KeyColumns::Node {
            key: validate_node_roles(table, roles)?,
        },
    };
    debug!("Validated {} table roles: {:?}", kind, keys);
    Ok(keys)
}

/// Attribute role with a detected type, or `Ignore` for a column named
/// after an element field.
fn detected_attribute(table: &TabularData, column: usize, kind: TableKind) -> ColumnRole {
    if kind.is_reserved(&table.headers[column]) {
        warn!(
            "Column '{}' is named after an element field and is ignored",
            table.headers[column]
        );
        return ColumnRole::Ignore;
    }
    ColumnRole::attribute(detect_column_type(&table.rows, column, DEFAULT_DELIMITER))
}

/// Pre-filled roles for an edge table: first column source, second target,
/// the rest attributes with a detected type.
pub fn suggest_edge_roles(table: &TabularData) -> Vec<ColumnRole> {
    (0..table.width())
        .map(|i| match i {
            0 => ColumnRole::Source,
            1 => ColumnRole::Target,
            _ => detected_attribute(table, i, TableKind::Edge),
        })
        .collect()
}

/// Pre-filled roles for a node table: first column is the node key.
pub fn suggest_node_roles(table: &TabularData) -> Vec<ColumnRole> {
    (0..table.width())
        .map(|i| match i {
            0 => ColumnRole::Node,
            _ => detected_attribute(table, i, TableKind::Node),
        })
        .collect()
}

/// Give `column` a role. Taking a key role away from another column demotes
/// that column to an attribute with a detected type.
pub fn assign_role(
    table: &TabularData,
    roles: &mut Vec<ColumnRole>,
    column: usize,
    role: ColumnRole,
) -> ImportResult<()> {
    if column >= table.width() {
        return Err(ImportError::ColumnOutOfRange {
            index: column,
            width: table.width(),
        });
    }
    if roles.len() < table.width() {
        roles.resize(table.width(), ColumnRole::Ignore);
    }

    if role.is_key_role() {
        let kind = match role {
            ColumnRole::Node => TableKind::Node,
            _ => TableKind::Edge,
        };
        for (i, current) in roles.iter_mut().enumerate() {
            if i != column && *current == role {
                debug!("Column {} loses role {} to column {}", i, role, column);
                *current = detected_attribute(table, i, kind);
            }
        }
    }
    roles[column] = role;
    Ok(())
}
