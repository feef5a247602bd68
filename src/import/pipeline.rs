//! Turning validated tables into node and edge records.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::coerce::coerce;
use crate::errors::ImportResult;
use crate::graph::{Edge, Node};
use crate::import::{validate_edge_roles, validate_node_roles, ColumnRole, TabularData};
use crate::value::AttributeValue;

/// Result of an edge table import, ready to hand to the backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeImport {
    /// Endpoint nodes in first-seen order, labelled with their id.
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub skipped_rows: usize,
}

/// Attribute values for one node of a node table. Absent values mean the
/// cell was empty or did not coerce.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub id: String,
    pub attributes: Vec<(String, Option<AttributeValue>)>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeAttributeImport {
    pub records: Vec<NodeRecord>,
    pub skipped_rows: usize,
}

fn coerce_row(
    table: &TabularData,
    roles: &[ColumnRole],
    row: usize,
) -> Vec<(String, Option<AttributeValue>)> {
    roles
        .iter()
        .enumerate()
        .filter_map(|(column, role)| match role {
            ColumnRole::Attribute {
                declared_type,
                delimiter,
            } => Some((
                table.headers[column].clone(),
                coerce(table.cell(row, column), *declared_type, delimiter),
            )),
            _ => None,
        })
        .collect()
}

/// Build nodes and edges from an edge table.
///
/// Rows with an empty source or target are skipped. Every other row yields
/// one edge whose id combines the row index and both endpoints, so ids are
/// unique within one import only.
pub fn import_edges(table: &TabularData, roles: &[ColumnRole]) -> ImportResult<EdgeImport> {
    let (source_col, target_col) = validate_edge_roles(table, roles)?;

    let mut nodes: IndexMap<String, Node> = IndexMap::new();
    let mut result = EdgeImport::default();

    for row in 0..table.rows.len() {
        let source = table.cell(row, source_col);
        let target = table.cell(row, target_col);
        if source.trim().is_empty() || target.trim().is_empty() {
            debug!("Skipping row {}: missing source or target", row);
            result.skipped_rows += 1;
            continue;
        }

        for id in [source, target] {
            if !nodes.contains_key(id) {
                nodes.insert(id.to_string(), Node::new(id));
            }
        }

        let mut edge = Edge::new(format!("e{}_{}_{}", row, source, target), source, target);
        for (key, value) in coerce_row(table, roles, row) {
            if let Some(value) = value {
                edge.attributes.insert(key, value);
            }
        }
        result.edges.push(edge);
    }

    result.nodes = nodes.into_values().collect();
    info!(
        "Edge table import: {} nodes, {} edges, {} rows skipped",
        result.nodes.len(),
        result.edges.len(),
        result.skipped_rows
    );
    Ok(result)
}

/// Collect attribute updates from a node table, one record per row with a
/// non-empty key.
pub fn import_node_attributes(
    table: &TabularData,
    roles: &[ColumnRole],
) -> ImportResult<NodeAttributeImport> {
    let key_col = validate_node_roles(table, roles)?;

    let mut result = NodeAttributeImport::default();
    for row in 0..table.rows.len() {
        let id = table.cell(row, key_col);
        if id.trim().is_empty() {
            result.skipped_rows += 1;
            continue;
        }
        result.records.push(NodeRecord {
            id: id.to_string(),
            attributes: coerce_row(table, roles, row),
        });
    }

    info!(
        "Node table import: {} records, {} rows skipped",
        result.records.len(),
        result.skipped_rows
    );
    Ok(result)
}
