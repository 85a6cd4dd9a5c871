use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use legiscast_ai::{BundleRegistry, Insights, PipelineConfig, Predictor, registry};
use legiscast_core::config::load_config_file;
use legiscast_core::{UpstreamBill, build_timeline, normalize, tables};

mod display;

/// Staged-ensemble viability and passage prediction for legislative bills
#[derive(Parser, Debug)]
#[command(name = "legiscast", version)]
struct Cli {
    /// TOML config file with `[pipeline]` and `[fetch]` tables
    #[arg(long, global = true, env = "LEGISCAST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict viability and passage for one bill
    Predict {
        /// Upstream bill JSON (bare bill object or `{bill, actions, cosponsors, ...}`)
        #[arg(long)]
        input: PathBuf,

        /// Model bundle directory (overrides the config file)
        #[arg(long, env = "LEGISCAST_MODELS_DIR")]
        models: Option<PathBuf>,

        /// Print machine-readable JSON instead of a card
        #[arg(long)]
        json: bool,

        /// Evaluate as of this date (YYYY-MM-DD) instead of today
        #[arg(long)]
        now: Option<NaiveDate>,
    },

    /// Show load status and recorded performance of every bundle
    Models {
        #[arg(long, env = "LEGISCAST_MODELS_DIR")]
        models: Option<PathBuf>,
    },

    /// Show a bill's normalized actions and activity timeline
    Actions {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        now: Option<NaiveDate>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file = cli
        .config
        .as_deref()
        .map(load_config_file)
        .transpose()
        .context("loading config file")?;
    let mut config = match &file {
        Some(f) => PipelineConfig::from_toml(f).context("reading [pipeline] settings")?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Command::Predict {
            input,
            models,
            json,
            now,
        } => {
            if let Some(dir) = models {
                config.models_dir = dir;
            }
            let today = now.unwrap_or_else(|| Local::now().date_naive());
            let upstream = read_upstream(&input)?;

            let registry = registry::global(&config.models_dir);
            let assessment = Predictor::new(registry, &config)
                .predict(&upstream, today)
                .with_context(|| format!("predicting {}", input.display()))?;
            let insights = Insights::from_assessment(&assessment);

            if json {
                let report = json!({
                    "bill": assessment.bill.bill.id.to_string(),
                    "prediction": assessment.output(),
                    "insights": insights,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                display::print_assessment(&assessment, &insights);
            }
        }
        Command::Models { models } => {
            let dir = models.unwrap_or(config.models_dir);
            let registry = BundleRegistry::load_dir(&dir);
            display::print_models(&registry);
        }
        Command::Actions { input, now } => {
            let today = now.unwrap_or_else(|| Local::now().date_naive());
            let upstream = read_upstream(&input)?;
            let normalized = normalize(&upstream).context("input contains no bill data")?;

            let batch = tables::actions_batch(&normalized.actions)?;
            arrow::util::pretty::print_batches(&[batch])?;
            display::print_timeline(&build_timeline(&normalized.actions, today));
        }
    }

    Ok(())
}

/// Read an upstream payload, accepting either the full fetch or a bare bill.
fn read_upstream(path: &Path) -> anyhow::Result<UpstreamBill> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    if value.get("bill").is_some() {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(UpstreamBill {
            bill: value,
            ..Default::default()
        })
    }
}
