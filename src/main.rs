use anyhow::{Context, Result};
use clap::Parser;
use std::{fs, path::PathBuf};
use survey_clean::{pipeline, PipelineConfig};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "survey_clean")]
#[command(about = "Clean a survey export and tag unreliable respondents")]
struct Args {
    /// YAML config naming the input files, columns and thresholds
    #[arg(short, long, default_value = "survey.yaml")]
    config: PathBuf,

    /// Where to write the cleaned table (.csv or .parquet); overrides the config
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the run summary as JSON here
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    let default_filter = if args.verbose {
        "info,survey_clean=debug"
    } else {
        "info"
    };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) load config ──────────────────────────────────────────────
    let mut config = PipelineConfig::from_yaml_path(&args.config)?;
    if let Some(output) = args.output {
        config.paths.output = Some(output);
    }

    // ─── 3) run ──────────────────────────────────────────────────────
    let out = pipeline::run(&config)?;

    if let Some(path) = &args.summary {
        let json = serde_json::to_string_pretty(&out.summary)?;
        fs::write(path, json).with_context(|| format!("writing summary {:?}", path))?;
        info!("wrote summary {}", path.display());
    }

    info!(
        respondents = out.table.num_rows(),
        flagged = out.summary.tag.tagged,
        "all done"
    );
    Ok(())
}
