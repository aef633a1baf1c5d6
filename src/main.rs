//! persona-rates command line
//!
//! Usage:
//!   persona-rates profiles
//!   persona-rates persona [--start-offset N]
//!   persona-rates central-banker [--iterations N] [--answer-mode number|open]
//!   persona-rates models

use anyhow::Context;
use clap::{Parser, Subcommand};
use persona_rates::{
    init_tracing, read_profiles, write_profiles, AnswerMode, CentralBankRecord,
    CentralBankerSurvey, CsvSnapshotSink, OllamaClient, PersonaRecord, PersonaSurvey,
    ProfileDomains, ScenarioGrid, ServiceConfig, Settings,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "persona-rates")]
#[command(about = "Ask a local chat model for preferred interest rates across personas and scenarios")]
struct Args {
    /// Configuration file (defaults to ./persona-rates.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the service base URL, e.g. http://localhost:11434/v1
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Override the model identifier
    #[arg(long, global = true)]
    model: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the profile table
    Profiles {
        /// Output file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Ask every profile about every scenario
    Persona {
        /// Profile table to read
        #[arg(long)]
        profiles: Option<PathBuf>,
        /// Results file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip this many leading profiles and keep their rows from the results file
        #[arg(long)]
        start_offset: Option<usize>,
    },
    /// Ask the central banker about every scenario, repeatedly
    CentralBanker {
        /// Number of repetitions
        #[arg(long)]
        iterations: Option<u32>,
        /// "number" or "open"
        #[arg(long)]
        answer_mode: Option<AnswerMode>,
        /// Results file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List models exposed by the service
    Models,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let mut settings = Settings::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(base_url) = &args.base_url {
        settings.service = ServiceConfig::new(base_url)?
            .with_api_key(settings.service.api_key())
            .with_timeout(settings.service.timeout);
    }
    if let Some(model) = &args.model {
        settings.model.model = model.clone();
    }

    match args.command {
        Command::Profiles { output } => {
            let path = output.unwrap_or_else(|| settings.paths.profiles.clone());
            let profiles = ProfileDomains::default().generate()?;
            for profile in profiles.iter().take(5) {
                info!(?profile, "profile");
            }
            write_profiles(&path, &profiles)?;
            println!("Wrote {} profiles to {}", profiles.len(), path.display());
        }

        Command::Persona {
            profiles,
            output,
            start_offset,
        } => {
            if let Some(offset) = start_offset {
                settings.survey.start_offset = offset;
            }
            settings.validate()?;

            let profiles_path = profiles.unwrap_or_else(|| settings.paths.profiles.clone());
            let output = output.unwrap_or_else(|| settings.paths.results.clone());
            let profiles = read_profiles(&profiles_path)
                .with_context(|| format!("reading {}", profiles_path.display()))?;

            let survey = PersonaSurvey::new(client(&settings)?, settings.model.clone(), grid(&settings)?)
                .with_start_offset(settings.survey.start_offset);
            let mut sink: CsvSnapshotSink<PersonaRecord> =
                CsvSnapshotSink::resume(&output, survey.resume_rows())?;

            let summary = survey.run(&profiles, &mut sink).await?;
            println!(
                "Processed {} profiles ({} rows) into {}",
                summary.units_completed,
                sink.into_records().len(),
                output.display()
            );
        }

        Command::CentralBanker {
            iterations,
            answer_mode,
            output,
        } => {
            if let Some(iterations) = iterations {
                settings.survey.iterations = iterations;
            }
            if let Some(mode) = answer_mode {
                settings.survey.answer_mode = mode;
            }
            settings.validate()?;

            let mode = settings.survey.answer_mode;
            let output = output.unwrap_or_else(|| settings.paths.central_bank_for(mode));
            let survey = CentralBankerSurvey::new(
                client(&settings)?,
                settings.model.clone(),
                grid(&settings)?,
                mode,
                settings.survey.iterations,
            );
            let mut sink: CsvSnapshotSink<CentralBankRecord> = CsvSnapshotSink::new(&output);

            let summary = survey.run(&mut sink).await?;
            if summary.failed_saves > 0 {
                warn!(failed_saves = summary.failed_saves, "some snapshots were not written");
            }
            println!("{} rows written to {}", summary.records, output.display());
        }

        Command::Models => {
            let client = OllamaClient::new(settings.service.clone())?;
            let models = client
                .get_models()
                .await
                .with_context(|| format!("querying {}", settings.service.base()))?;
            println!("Available models:");
            for model in &models.data {
                println!("  - {} (owned by: {})", model.id, model.owned_by);
            }
        }
    }

    Ok(())
}

fn client(settings: &Settings) -> anyhow::Result<Arc<OllamaClient>> {
    Ok(Arc::new(OllamaClient::new(settings.service.clone())?))
}

fn grid(settings: &Settings) -> anyhow::Result<ScenarioGrid> {
    Ok(ScenarioGrid::new(
        settings.survey.inflation.clone(),
        settings.survey.unemployment.clone(),
    )?)
}
