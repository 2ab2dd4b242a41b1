// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Recognize a SQL file and print its symbols, problems or keyword
//! completions as JSON.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sqlscope_catalog::{CatalogSnapshot, StaticCatalog};
use sqlscope_engine::{DocumentAnalyzer, EngineConfig};
use sqlscope_ir::Dialect;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "sqlscope", about = "Recognize SQL statements and report what their names denote")]
struct Args {
    /// SQL file to analyze; standard input when omitted.
    file: Option<PathBuf>,

    /// SQL dialect; overrides the settings file.
    #[arg(long)]
    dialect: Option<Dialect>,

    /// JSON settings document with a "sqlscope" section.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// JSON array of table metadata to resolve names against.
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Print the keyword completions at this byte offset instead.
    #[arg(long, value_name = "OFFSET")]
    complete: Option<usize>,

    /// Report every problem as a warning; overrides the settings file.
    #[arg(long)]
    warnings: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    let args = Args::parse();
    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let mut config = match &args.settings {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
            EngineConfig::from_settings_json(&json).with_context(|| format!("invalid settings in {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(dialect) = args.dialect {
        config.dialect = dialect;
    }
    config.report_problems_as_warnings |= args.warnings;
    config.validate()?;
    let mut analyzer = DocumentAnalyzer::new(config);

    if let Some(path) = &args.catalog {
        let json = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let catalog = StaticCatalog::from_json(&json)?;
        let snapshot = CatalogSnapshot::load(&catalog).await?;
        tracing::info!(tables = snapshot.tables().len(), "Loaded catalog");
        analyzer = analyzer.with_snapshot(Arc::new(snapshot));
    }

    analyzer.set_text(&text);

    let output = match args.complete {
        Some(offset) => serde_json::to_string_pretty(&analyzer.complete_keywords_at(offset))?,
        None => serde_json::to_string_pretty(&analyzer.statements())?,
    };
    println!("{output}");
    Ok(())
}
