use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use vizmap::{common, plan, plan_execution};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import the plan's tables, apply its mappings and write the document
    Run {
        #[clap(short, long)]
        plan: String,
    },
    /// Write a sample plan
    Init {
        #[clap(short, long)]
        plan: String,
    },
    /// Show the column roles and types suggested for a table
    Detect { file: PathBuf },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Run { plan } => {
            info!("Running plan: {}", plan);
            let stats = plan_execution::execute_plan(plan)?;
            info!("Done: {} nodes, {} edges", stats.nodes, stats.edges);
        }
        Commands::Init { plan } => {
            info!("Initializing plan: {}", plan);
            let plan_file_path = plan;
            let plan = plan::Plan::default();
            let serialized_plan = serde_yaml::to_string(&plan)?;
            common::write_string_to_file(&plan_file_path, &serialized_plan)?;
        }
        Commands::Detect { file } => {
            print!("{}", plan_execution::describe_table(&file)?);
        }
    }

    Ok(())
}

/// Filter directive for the chosen level. The level applies to this crate's
/// own targets; dependencies only report warnings.
fn log_filter(log_level: Option<&str>) -> String {
    let level = match log_level.unwrap_or("info").to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    format!("warn,vizmap={level}", level = level)
}

fn setup_logging(log_level: &Option<String>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(log_level.as_deref())));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
