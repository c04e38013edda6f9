//! # Hydro Tracker Application Entry Point
//!
//! This binary crate provides the command-line surface of the hydro tracker,
//! coordinating between input collection, estimation, reminder generation and
//! rendering. Each subcommand is one workflow:
//!
//! - `manual`: assess a single person from flags or interactive prompts
//! - `batch`: generate reminders for every row of the wellness dataset
//! - `clean`: cut a full wellness export down to the columns `batch` needs
//! - `init-config`: write a configuration template

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{bail, Context};
use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use hydro_lib::batch::{export_csv, run_batch, summarize};
use hydro_lib::config::{Config, CONFIG_FILE};
use hydro_lib::dataset::{self, DatasetError};
use hydro_lib::estimator::evaluate;
use hydro_lib::form::{self, Form};
use hydro_lib::reminder::{build_prompt, request_reminder, CompletionsClient};
use hydro_lib::renderer;
use hydro_lib::{ActivityLevel, Climate, Gender, Profile};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Personalized hydration targets and AI reminder schedules
#[derive(Parser)]
#[command(name = "hydro-tracker")]
#[command(version)]
#[command(about = "Estimate daily water targets and generate hydration reminders", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Increase log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess one person and print a hydration report
    Manual {
        /// Age in years (10-90)
        #[arg(long, value_parser = form::parse_age)]
        age: Option<u32>,

        /// Male or Female
        #[arg(long)]
        gender: Option<Gender>,

        /// Weight in kg (30-150)
        #[arg(long, value_parser = form::parse_weight)]
        weight: Option<f64>,

        /// Water drunk today in liters (0-5)
        #[arg(long, value_parser = form::parse_intake)]
        intake: Option<f64>,

        /// Low, Medium or High
        #[arg(long)]
        activity: Option<ActivityLevel>,

        /// Moderate, Hot or Cold
        #[arg(long)]
        climate: Option<Climate>,

        /// Ask for every field on stdin, using the flags as defaults
        #[arg(long)]
        prompt: bool,

        /// Also write the intake-vs-target chart as a PBM image
        #[arg(long)]
        chart: Option<PathBuf>,
    },

    /// Generate reminders for every row of a dataset and export them as CSV
    Batch {
        /// Dataset CSV (defaults to dataset.path from the config)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Export CSV (defaults to dataset.export_path from the config)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Keep only the columns and rows the batch workflow needs
    Clean {
        /// Full wellness dataset
        #[arg(long)]
        input: PathBuf,

        /// Cleaned dataset (defaults to dataset.path from the config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Rows to keep (defaults to dataset.clean_row_limit from the config)
        #[arg(long)]
        rows: Option<usize>,
    },

    /// Write the default configuration to the config path
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "hydro_lib={level},hydro_tracker={level}"
        )))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Assess one profile and print the report.
async fn run_manual(profile: Profile, config: &Config, chart: Option<&Path>) -> anyhow::Result<()> {
    let client = CompletionsClient::new(&config.api).context("building completion client")?;
    info!("Requesting reminder from {}", client.endpoint());

    let result = evaluate(&profile);
    let reminder = request_reminder(&client, &build_prompt(&profile)).await;

    print!(
        "{}",
        renderer::manual_report(&profile, &result, &reminder, Local::now())
    );
    if reminder.is_fallback() {
        info!("Reminder is fallback text, not generated");
    }

    if let Some(path) = chart {
        renderer::render_chart(profile.intake_l, result.target_l)
            .save_pbm(path)
            .with_context(|| format!("writing chart to {}", path.display()))?;
        println!("\n🖼  Chart saved to {}", path.display());
    }

    Ok(())
}

/// Load the dataset, process every row and export the plan.
async fn run_batch_mode(dataset_path: &Path, output: &Path, config: &Config) -> anyhow::Result<()> {
    let rows = match dataset::load_dataset(dataset_path) {
        Ok(rows) => rows,
        Err(DatasetError::NotFound(path)) => {
            println!(
                "❌ Dataset file not found! Place '{}' in the working folder or pass --dataset.",
                path.display()
            );
            return Ok(());
        }
        Err(error) => {
            println!("❌ Could not read dataset {}: {}", dataset_path.display(), error);
            return Ok(());
        }
    };

    println!("✅ Dataset loaded: {}", dataset_path.display());
    print!(
        "{}",
        renderer::dataset_preview(&rows, config.dataset.preview_rows)
    );

    let client = CompletionsClient::new(&config.api).context("building completion client")?;
    info!("Requesting reminders from {}", client.endpoint());

    println!("\n🔄 Processing all users...");
    let outcomes = run_batch(&rows, &client, |progress| {
        eprint!(
            "\rProgress: {}/{} ({:.0}%)",
            progress.completed,
            progress.total,
            progress.fraction() * 100.0
        );
        io::stderr().flush().ok();
    })
    .await;
    eprintln!();

    let summary = summarize(&outcomes);
    println!(
        "\n📊 Hydration Reminder Results ({} processed, {} failed)",
        summary.processed, summary.failed
    );
    if summary.fallbacks > 0 {
        println!(
            "⚠️ {} of {} reminders are fallback text, the completion service was unavailable",
            summary.fallbacks, summary.processed
        );
    }
    print!("{}", renderer::results_table(&outcomes));

    export_csv(&outcomes, output)
        .with_context(|| format!("exporting results to {}", output.display()))?;
    println!("\n📥 Reminder plan saved to {}", output.display());

    Ok(())
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // The credential is resolved once here and passed down explicitly
    let config = Config::load_from_path(&cli.config).with_env_credential();

    // Single-threaded runtime: at most one completion request is in flight
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Manual {
            age,
            gender,
            weight,
            intake,
            activity,
            climate,
            prompt,
            chart,
        } => {
            let defaults = form::default_profile();
            let mut profile = Profile {
                age: age.unwrap_or(defaults.age),
                gender: gender.unwrap_or(defaults.gender),
                weight_kg: weight.unwrap_or(defaults.weight_kg),
                activity: activity.unwrap_or(defaults.activity),
                climate: climate.unwrap_or(defaults.climate),
                intake_l: intake.unwrap_or(defaults.intake_l),
            };

            if prompt {
                println!("📥 Enter Your Details (press Enter to keep the value in brackets)");
                profile = Form::new(io::stdin().lock(), io::stdout())
                    .collect(profile)
                    .context("reading profile from stdin")?;
                println!();
            }

            rt.block_on(run_manual(profile, &config, chart.as_deref()))
        }

        Commands::Batch { dataset, output } => {
            let dataset = dataset.unwrap_or_else(|| PathBuf::from(&config.dataset.path));
            let output = output.unwrap_or_else(|| PathBuf::from(&config.dataset.export_path));
            rt.block_on(run_batch_mode(&dataset, &output, &config))
        }

        Commands::Clean {
            input,
            output,
            rows,
        } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&config.dataset.path));
            let limit = rows.unwrap_or(config.dataset.clean_row_limit);
            let summary = dataset::clean_dataset(&input, &output, limit)
                .with_context(|| format!("cleaning {}", input.display()))?;

            println!("✅ Clean dataset saved as {}", output.display());
            println!("👉 Columns kept: {}", summary.columns.join(", "));
            println!("👉 Rows kept: {}", summary.rows);
            Ok(())
        }

        Commands::InitConfig { force } => {
            if cli.config.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    cli.config.display()
                );
            }
            Config::default().save(&cli.config)?;
            println!("Configuration written to {}", cli.config.display());
            Ok(())
        }
    }
}
