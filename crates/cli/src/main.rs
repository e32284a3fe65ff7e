use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use q07_common::ExportConfig;
use q07_export::{export_layers, load_layers, read_artifact};

#[derive(Parser, Debug)]
#[command(name = "q07", about = "Quantise model weights to Q0.7 and export them as text tables")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Quantise every layer and write one `layer_<i>_<name>.txt` per layer.
    Export(ExportArgs),
    /// Parse exported artifacts and print per-block statistics.
    Verify(VerifyArgs),
    /// Write a default export config.
    InitConfig(InitConfigArgs),
}

// ── Export ─────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Export config; defaults are used when the file does not exist.
    #[arg(long, default_value = "export.json")]
    config: PathBuf,
    /// Model manifest (overrides `model_path`).
    #[arg(long)]
    model: Option<PathBuf>,
    /// Output directory (overrides `output_dir`).
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Cast values straight to i8 instead of quantising to Q0.7.
    #[arg(long)]
    cast: bool,
    /// Export layers in parallel.
    #[arg(long)]
    parallel: bool,
    /// Also write a JSON summary of the run.
    #[arg(long)]
    summary: Option<PathBuf>,
}

// ── Verify / Init-config ───────────────────────────────────────────────────────

#[derive(Parser, Debug)]
struct VerifyArgs {
    #[arg(required = true)]
    artifacts: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct InitConfigArgs {
    #[arg(long, default_value = "export.json")]
    config: PathBuf,
    /// Replace an existing file.
    #[arg(long)]
    force: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Export(args) => cmd_export(args),
        Command::Verify(args) => cmd_verify(args),
        Command::InitConfig(args) => cmd_init_config(args),
    }
}

// ── Command implementations ────────────────────────────────────────────────────

fn cmd_export(args: ExportArgs) -> Result<()> {
    let mut config = if args.config.exists() {
        ExportConfig::load(&args.config)?
    } else {
        ExportConfig::default()
    };
    if let Some(model) = args.model {
        config.model_path = model;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if args.cast {
        config.use_q07 = false;
    }
    if args.parallel {
        config.parallel = true;
    }

    let layers = load_layers(&config.model_path)?;
    let summary = export_layers(&layers, &config)?;

    for artifact in &summary.artifacts {
        println!("{}", artifact.path.display());
    }
    eprintln!(
        "Done. {} artifacts from {} layers, {} values ({} clipped)",
        summary.artifacts.len(),
        summary.layers_seen,
        summary.total_values(),
        summary.total_saturated()
    );

    if let Some(path) = args.summary {
        summary.save(&path)?;
        eprintln!("Summary: {}", path.display());
    }
    Ok(())
}

fn cmd_verify(args: VerifyArgs) -> Result<()> {
    let mut failures = 0usize;
    for path in &args.artifacts {
        match read_artifact(path) {
            Ok(blocks) => {
                println!("{}", path.display());
                for block in &blocks {
                    let min = block.values.iter().min();
                    let max = block.values.iter().max();
                    match (min, max) {
                        (Some(lo), Some(hi)) => println!(
                            "  {:<40} {:>8} values  [{lo}, {hi}]",
                            block.name,
                            block.values.len()
                        ),
                        _ => println!("  {:<40} {:>8} values", block.name, 0),
                    }
                }
            }
            Err(e) => {
                eprintln!("{}: {e:#}", path.display());
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} artifacts failed to parse", args.artifacts.len());
    }
    Ok(())
}

fn cmd_init_config(args: InitConfigArgs) -> Result<()> {
    if args.config.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.config.display()
        );
    }
    let config = ExportConfig::default();
    config.save(&args.config)?;
    eprintln!("Created default config at {}", args.config.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
