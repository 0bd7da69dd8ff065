//! Request orchestration: validate, score, decide.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use serde::Serialize;

use crate::action::{decide, RiskLevel};
use crate::error::{ChurnError, Result};
use crate::inference::{ChurnScorer, ModelInfo};
use crate::models::{to_percentage, CustomerRecord, PredictionResult};

#[derive(Default)]
struct Counters {
    predictions: AtomicU64,
    high_risk: AtomicU64,
    critical: AtomicU64,
    failures: AtomicU64,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_predictions: u64,
    pub high_risk_predictions: u64,
    pub critical_predictions: u64,
    pub failed_predictions: u64,
    pub uptime_secs: u64,
    pub model_version: String,
}

pub struct PredictionService {
    scorer: Arc<dyn ChurnScorer>,
    counters: Counters,
    started: Instant,
}

impl PredictionService {
    pub fn new(scorer: Arc<dyn ChurnScorer>) -> Self {
        Self {
            scorer,
            counters: Counters::default(),
            started: Instant::now(),
        }
    }

    pub fn predict(&self, record: &CustomerRecord) -> Result<PredictionResult> {
        let outcome = self.score_and_decide(record);
        match &outcome {
            Ok(result) => self.record_success(result),
            Err(_) => self.record_failure(),
        }
        outcome
    }

    /// Validates every record before scoring any of them. Counters move only
    /// when the whole batch succeeds; a failed batch counts as one failure.
    pub fn predict_batch(&self, records: &[CustomerRecord]) -> Result<Vec<PredictionResult>> {
        if records.is_empty() {
            self.record_failure();
            return Err(ChurnError::InvalidInput("empty customer list".into()));
        }
        for (i, record) in records.iter().enumerate() {
            if let Err(e) = record.validate() {
                self.record_failure();
                return Err(ChurnError::InvalidInput(format!("customer {}: {}", i + 1, e)));
            }
        }

        let results = records
            .iter()
            .map(|record| self.score_and_decide(record))
            .collect::<Result<Vec<_>>>();
        match &results {
            Ok(results) => results.iter().for_each(|result| self.record_success(result)),
            Err(_) => self.record_failure(),
        }
        results
    }

    fn score_and_decide(&self, record: &CustomerRecord) -> Result<PredictionResult> {
        record.validate().map_err(ChurnError::InvalidInput)?;

        let probability = self.scorer.score(record)?;
        if !(0.0..=1.0).contains(&probability) {
            warn!(
                "Scorer {} returned out-of-range probability {}",
                self.scorer.version(),
                probability
            );
            return Err(ChurnError::ProbabilityOutOfRange { value: probability });
        }

        let probability_pct = to_percentage(probability);
        let decision = decide(probability_pct, record.tenure, record.contract);
        debug!(
            "Scored customer: tenure={} contract={} probability={}% level={:?}",
            record.tenure, record.contract, probability_pct, decision.level
        );

        Ok(PredictionResult {
            probability_pct,
            decision,
            model_version: self.scorer.version().to_string(),
        })
    }

    fn record_success(&self, result: &PredictionResult) {
        self.counters.predictions.fetch_add(1, Ordering::Relaxed);
        if result.decision.is_high_risk() {
            self.counters.high_risk.fetch_add(1, Ordering::Relaxed);
        }
        if result.decision.level == RiskLevel::Critical {
            self.counters.critical.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Counts a failed request, including ones rejected before scoring.
    pub fn record_failure(&self) {
        self.counters.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_predictions: self.counters.predictions.load(Ordering::Relaxed),
            high_risk_predictions: self.counters.high_risk.load(Ordering::Relaxed),
            critical_predictions: self.counters.critical.load(Ordering::Relaxed),
            failed_predictions: self.counters.failures.load(Ordering::Relaxed),
            uptime_secs: self.started.elapsed().as_secs(),
            model_version: self.scorer.version().to_string(),
        }
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo::from_scorer(self.scorer.as_ref())
    }
}
