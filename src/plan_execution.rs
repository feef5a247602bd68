use std::path::Path;
use tracing::{debug, info, warn};

use anyhow::{anyhow, Context, Result};

use crate::app_context::{AppContext, GraphStats};
use crate::common::relative_to;
use crate::data_loader;
use crate::import::{suggest_edge_roles, suggest_node_roles, ColumnRole, TabularData};
use crate::plan::{Plan, TableImport};

fn load_table(plan_file_path: &Path, import: &TableImport) -> Result<TabularData> {
    let path = relative_to(plan_file_path, &import.filename);
    info!("Importing file: {}", path.display());
    data_loader::load_table(&path).with_context(|| format!("Failed to load {}", path.display()))
}

fn roles_for(
    import: &TableImport,
    table: &TabularData,
    suggest: fn(&TabularData) -> Vec<ColumnRole>,
) -> Vec<ColumnRole> {
    if import.columns.is_empty() {
        let roles = suggest(table);
        debug!("Using suggested roles for {}: {:?}", import.filename, roles);
        roles
    } else {
        import.columns.clone()
    }
}

/// Run a batch plan: import the tables, set up styles and write the document.
pub fn execute_plan(plan: String) -> Result<GraphStats> {
    info!("Executing plan");

    let plan_file_path = Path::new(&plan);
    let plan_content = std::fs::read_to_string(plan_file_path)
        .with_context(|| format!("Failed to read plan {}", plan))?;
    let plan: Plan = serde_yaml::from_str(&plan_content)?;
    debug!("Executing plan: {:?}", plan);

    let mut ctx = AppContext::in_memory(&plan.name());

    let network = load_table(plan_file_path, &plan.network)?;
    let roles = roles_for(&plan.network, &network, suggest_edge_roles);
    let summary = ctx
        .import_edge_table(&network, &roles)
        .map_err(|e| anyhow!("Network import failed [{}]: {}", e.error_code(), e))?;
    info!(
        "Network: {} nodes, {} edges, {} rows skipped",
        summary.nodes_added, summary.edges_added, summary.skipped_rows
    );

    if let Some(nodes) = &plan.nodes {
        let table = load_table(plan_file_path, nodes)?;
        let roles = roles_for(nodes, &table, suggest_node_roles);
        let summary = ctx
            .import_node_table(&table, &roles)
            .map_err(|e| anyhow!("Node table import failed [{}]: {}", e.error_code(), e))?;
        info!(
            "Node table: {} updated, {} added",
            summary.nodes_updated, summary.nodes_added
        );
    }

    if let Some(style) = &plan.style {
        let path = relative_to(plan_file_path, style);
        if !ctx.load_style_from(&path)? {
            warn!("{} has no style settings, keeping defaults", path.display());
        }
    }

    for request in &plan.mappings {
        ctx.configure_mapping(request).with_context(|| {
            format!(
                "Invalid mapping of {} {} to '{}'",
                request.kind, request.property, request.column
            )
        })?;
    }

    let output = relative_to(plan_file_path, &plan.output);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    ctx.save_document(&output)?;

    let stats = ctx.stats();
    info!(
        "Wrote {} with {} nodes and {} edges",
        output.display(),
        stats.nodes,
        stats.edges
    );
    Ok(stats)
}

/// Describe the roles the import dialog would pre-assign for a table.
pub fn describe_table(path: &Path) -> Result<String> {
    let table = data_loader::load_table(path)?;
    let edge_roles = suggest_edge_roles(&table);
    let node_roles = suggest_node_roles(&table);

    let mut report = format!(
        "{}: {} columns, {} rows\n",
        path.display(),
        table.width(),
        table.rows.len()
    );
    for (idx, header) in table.headers.iter().enumerate() {
        report.push_str(&format!(
            "  [{}] {:<20} edge table: {:<28} node table: {}\n",
            idx,
            header,
            edge_roles[idx].to_string(),
            node_roles[idx]
        ));
    }
    Ok(report)
}
