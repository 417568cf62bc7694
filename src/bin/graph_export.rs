use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use planalyze::{compute_critical_path, normalize, DependencyGraph};

#[derive(Parser)]
#[command(name = "plan-graph-export")]
#[command(about = "Export a project's dependency graph to DOT format with the critical path highlighted")]
struct Cli {
    /// Path to the project JSON file
    input: PathBuf,

    /// Output file (defaults to plan.dot)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let content = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {:?}", cli.input))?;
    let raw: serde_json::Value =
        serde_json::from_str(&content).context("Input is not valid JSON")?;

    let project = normalize(&raw)?;
    println!("Loaded project: {} tasks", project.tasks.len());

    let graph = DependencyGraph::build(&project.tasks);
    let critical = compute_critical_path(&project.tasks);
    println!(
        "Graph built: {} nodes, {} edges, {} on critical path",
        graph.node_count(),
        graph.edge_count(),
        critical.path.len()
    );

    let dot = graph.to_dot(&critical.critical_ids());
    let output_path = cli.output.unwrap_or_else(|| PathBuf::from("plan.dot"));
    std::fs::write(&output_path, dot)
        .with_context(|| format!("Failed to write {output_path:?}"))?;
    println!("✅ Exported DOT to: {output_path:?}");

    Ok(())
}
