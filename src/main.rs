//! RiskMonitor command-line front end.
//!
//! Usage:
//!   riskmonitor train [--samples <n>] [--seed <s>]
//!   riskmonitor score (--fixture | --json <file>) [--record]
//!   riskmonitor batch <input> <output> [--delimiter <d>]
//!   riskmonitor triage
//!   riskmonitor history (list | clear)

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use riskmonitor_lib::bleeding::training::{self, TrainingConfig};
use riskmonitor_lib::config::{self, EngineConfig};
use riskmonitor_lib::db::{HistoryStore, MemoryHistoryStore, SqliteHistoryStore};
use riskmonitor_lib::ingest::{self, batch, fixture, BatchOptions, Normalized};
use riskmonitor_lib::scoring::ScoringEngine;
use riskmonitor_lib::{init_tracing, triage, Assessment, CoreState};

#[derive(Parser)]
#[command(name = "riskmonitor")]
#[command(version)]
#[command(about = "Bedside risk scores, bleeding-risk model and protocol alerts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Bleeding model artifact (overrides RISKMONITOR_MODEL)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// History database (overrides RISKMONITOR_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the bleeding-risk model on synthetic data and save it
    Train {
        /// Number of synthetic samples
        #[arg(long)]
        samples: Option<usize>,

        /// Seed for data generation and the train/validation split
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Score one observation and print the profile and alerts
    Score {
        /// Use the built-in EHR import record
        #[arg(long, conflicts_with = "json")]
        fixture: bool,

        /// Observation JSON file
        #[arg(long, required_unless_present = "fixture")]
        json: Option<PathBuf>,

        /// Append the result to history
        #[arg(long)]
        record: bool,
    },

    /// Score a delimited file and write it back with result columns
    Batch {
        input: PathBuf,
        output: PathBuf,

        /// Field delimiter: a single character or "tab"
        #[arg(short, long, default_value = ",")]
        delimiter: String,
    },

    /// Order the demo waiting room by priority tier
    Triage,

    /// Inspect or clear stored assessments
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Print every record, oldest first
    List,
    /// Delete every record
    Clear,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if let Some(model) = cli.model {
        config.model_path = model;
    }
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    init_tracing(&config.log_filter);
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    match cli.command {
        Commands::Train { samples, seed } => {
            let mut training = TrainingConfig::default();
            if let Some(n) = samples {
                training.synthetic.n_samples = n;
            }
            if let Some(seed) = seed {
                training.synthetic.seed = seed;
                training.split_seed = seed;
            }
            let model = training::train_and_save(&training, &config.model_path)?;
            println!("{}", serde_json::to_string_pretty(&model.metrics)?);
            println!("saved to {}", config.model_path.display());
        }
        Commands::Score { fixture: use_fixture, json, record } => {
            let normalized = match json {
                Some(path) if !use_fixture => {
                    ingest::observation_from_json(&std::fs::read_to_string(path)?)?
                }
                _ => Normalized {
                    observation: fixture::ehr_import_fixture(),
                    issues: Vec::new(),
                },
            };
            for issue in &normalized.issues {
                tracing::warn!(%issue, "Value dropped");
            }

            let assessment = if record {
                let state = CoreState::open(&config)?;
                state.assess_and_record(&normalized.observation)?.0
            } else {
                let engine = ScoringEngine::from_model_path(&config.model_path)?;
                let state = CoreState::new(engine, Arc::new(MemoryHistoryStore::new()));
                state.assess(&normalized.observation)
            };
            print_assessment(&assessment);
        }
        Commands::Batch { input, output, delimiter } => {
            let options = BatchOptions::with_delimiter(&delimiter)?;
            let engine = ScoringEngine::from_model_path(&config.model_path)?;
            let summary = batch::process_file(&input, &output, &engine, options)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Triage => {
            for patient in triage::prioritize(triage::waiting_room_fixture()) {
                let spo2 = patient
                    .entry
                    .spo2
                    .map(|s| format!("{s}%"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<18} {:<8} {:<22} SIRS {}  SpO2 {}",
                    patient.tier.label(),
                    patient.entry.patient_id,
                    patient.entry.complaint,
                    patient.entry.sirs_score,
                    spo2
                );
            }
        }
        Commands::History { action } => {
            let store = SqliteHistoryStore::open(&config.database_path)?;
            match action {
                HistoryAction::List => {
                    println!("{}", serde_json::to_string_pretty(&store.fetch_all()?)?);
                }
                HistoryAction::Clear => {
                    println!("deleted {} records", store.clear()?);
                }
            }
        }
    }

    Ok(())
}

fn print_assessment(assessment: &Assessment) {
    let p = &assessment.profile;
    println!("Status: {}", p.overall_status);
    if p.insufficient_data {
        println!("Insufficient data: age and systolic BP are required");
    }
    println!(
        "Bleeding {:.1}%  AKI {}%  qSOFA {}  SIRS {}  Hypoglycemia {}%  NEWS2 {} ({})",
        p.bleeding_risk_pct,
        p.aki_risk_pct,
        p.sepsis_score,
        p.sirs_score,
        p.hypoglycemia_risk_pct,
        p.news2.total,
        p.news2.band.label()
    );
    println!("Violations: {}", assessment.cascade.violation_count);
    for alert in &assessment.cascade.alerts {
        println!("[{}] {} {}", alert.severity, alert.code, alert.message);
        println!("    -> {}", alert.recommended_action);
    }
}
