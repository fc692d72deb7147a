use anyhow::{anyhow, Result};
use clap::Parser;
use serde_json::json;
use sheetlens::{
    dashboard::missing_columns_message, export, load, Cell, Registry, TableError,
};
use std::{path::PathBuf, process};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Validate an uploaded spreadsheet against a dashboard and print its report.
#[derive(Parser, Debug)]
#[command(name = "sheetlens")]
#[command(version, about, long_about = None)]
struct Args {
    /// Uploaded file (csv, txt, xlsx, xls, xlsm)
    file: PathBuf,

    /// Dashboard to run
    #[arg(default_value = "propeller")]
    dashboard: String,

    /// YAML file with extra dashboard definitions
    #[arg(long)]
    config: Option<PathBuf>,

    /// Restrict the run to one entity id
    #[arg(long)]
    entity: Option<String>,

    /// Write the long records to this file (csv, json or parquet)
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) resolve dashboard ────────────────────────────────────────
    let args = Args::parse();
    let mut registry = Registry::builtin();
    if let Some(cfg) = &args.config {
        registry.load_yaml(cfg)?;
    }
    let dashboard = registry.get(&args.dashboard).ok_or_else(|| {
        anyhow!(
            "unknown dashboard `{}` (known: {})",
            args.dashboard,
            registry.names().join(", ")
        )
    })?;
    info!(dashboard = %dashboard.name, file = %args.file.display(), "startup");

    // ─── 3) load + run ───────────────────────────────────────────────
    let table = load::load(&args.file)?;

    let outcome = match &args.entity {
        Some(raw) => match dashboard.run_for(&table, &Cell::parse(raw)) {
            // mixed-type id columns keep their cells as text
            Err(TableError::EmptySelection { .. }) => {
                dashboard.run_for(&table, &Cell::text(sheetlens::table::clean_str(raw)))
            }
            other => other,
        },
        None => dashboard.run(&table),
    };

    let report = match outcome {
        Ok(report) => report,
        Err(TableError::MissingColumns(missing)) => {
            let out = json!({
                "status": "invalid",
                "missing": missing,
                "message": missing_columns_message(&missing),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            process::exit(2);
        }
        Err(err) => {
            error!(%err, "dashboard run failed");
            let out = json!({ "status": "error", "error": err, "message": err.to_string() });
            println!("{}", serde_json::to_string_pretty(&out)?);
            process::exit(1);
        }
    };

    // ─── 4) emit ─────────────────────────────────────────────────────
    if let Some(out) = &args.export {
        export::export(&report.records, out)?;
        info!(path = %out.display(), "wrote records");
    }

    let out = json!({
        "status": "valid",
        "messages": report.messages(),
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    info!("all done");
    Ok(())
}
