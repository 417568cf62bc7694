use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use planalyze::{analyze_project_with, AnalysisConfig};

#[derive(Parser)]
#[command(name = "plan-analyze")]
#[command(about = "Analyze a project-schedule JSON document: critical path, schedule, risks")]
struct Cli {
    /// Path to the project JSON file
    input: PathBuf,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Emit one section only: summary, critical-path, schedule, or risks
    #[arg(short, long)]
    section: Option<String>,

    /// Path to a config file with a [thresholds] table
    #[arg(short, long)]
    config: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = AnalysisConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let content = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {:?}", cli.input))?;
    let raw: serde_json::Value =
        serde_json::from_str(&content).context("Input is not valid JSON")?;

    let analysis = analyze_project_with(&raw, &config.thresholds)?;

    let output = match cli.section.as_deref() {
        None => serde_json::to_value(&analysis)?,
        Some("summary") => serde_json::to_value(&analysis.summary)?,
        Some("critical-path") => serde_json::to_value(&analysis.critical_path)?,
        Some("schedule") => serde_json::to_value(&analysis.schedule)?,
        Some("risks") => serde_json::to_value(&analysis.risks)?,
        Some(other) => {
            eprintln!("❌ Unknown section '{other}'. Use summary, critical-path, schedule, or risks");
            std::process::exit(1);
        }
    };

    if cli.pretty {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", serde_json::to_string(&output)?);
    }

    Ok(())
}
