//! Process-wide engine state.
//!
//! `CoreState` pairs the read-only scoring engine with the history store.
//! Scoring needs no locks; the store serializes its own writes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bleeding::ModelError;
use crate::cascade::{self, CascadeReport};
use crate::config::EngineConfig;
use crate::db::{DatabaseError, HistoryStore, SqliteHistoryStore};
use crate::ingest::IngestError;
use crate::models::{HistoryRecord, NewHistoryRecord, Observation, RiskProfile};
use crate::scoring::ScoringEngine;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Profile plus cascade for one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub profile: RiskProfile,
    pub cascade: CascadeReport,
}

pub struct CoreState {
    scoring: ScoringEngine,
    history: Arc<dyn HistoryStore>,
}

impl CoreState {
    pub fn new(scoring: ScoringEngine, history: Arc<dyn HistoryStore>) -> Self {
        Self { scoring, history }
    }

    /// Load the model and open the history database named by `config`.
    /// A missing or corrupt model is an error, never a zero score.
    pub fn open(config: &EngineConfig) -> Result<Self, CoreError> {
        let scoring = ScoringEngine::from_model_path(&config.model_path)?;
        let history = SqliteHistoryStore::open(&config.database_path)?;
        tracing::info!(
            model = %config.model_path.display(),
            database = %config.database_path.display(),
            predictor = scoring.predictor_name(),
            "Engine ready"
        );
        Ok(Self::new(scoring, Arc::new(history)))
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    pub fn history(&self) -> &dyn HistoryStore {
        self.history.as_ref()
    }

    /// Score and run the cascade. Pure: nothing is stored.
    pub fn assess(&self, obs: &Observation) -> Assessment {
        let profile = self.scoring.score(obs);
        let cascade = cascade::evaluate(obs, &profile);
        Assessment { profile, cascade }
    }

    /// Assess and append the result to history.
    pub fn assess_and_record(
        &self,
        obs: &Observation,
    ) -> Result<(Assessment, HistoryRecord), CoreError> {
        let assessment = self.assess(obs);
        let record = self
            .history
            .append(&NewHistoryRecord::from_scoring(obs, &assessment.profile))?;
        tracing::info!(
            id = %record.id,
            status = %record.status,
            violations = assessment.cascade.violation_count,
            "Assessment recorded"
        );
        Ok((assessment, record))
    }
}
