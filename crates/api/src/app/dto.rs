use serde::{Deserialize, Serialize};

use shelfwise_ai::{RawDemandRecord, RedistributionPlan, TrainingSummary, TransferSuggestion};

use crate::app::services::BranchForecast;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    pub periods_ahead: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRecordsRequest {
    #[serde(default)]
    pub records: Vec<RawDemandRecord>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub status: &'static str,
    pub rows: usize,
    pub books: usize,
    pub branches: usize,
    pub artifact_id: String,
    pub trained_at: String,
    pub mean_absolute_error: f64,
}

impl From<TrainingSummary> for TrainResponse {
    fn from(s: TrainingSummary) -> Self {
        Self {
            status: "trained",
            rows: s.rows,
            books: s.books,
            branches: s.branches,
            artifact_id: s.artifact_id.to_string(),
            trained_at: s.trained_at.to_rfc3339(),
            mean_absolute_error: s.mean_absolute_error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BranchPrediction {
    pub branch_id: i64,
    pub predicted_borrows: f64,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub period: u32,
    pub predictions_per_branch: Vec<BranchPrediction>,
}

impl PredictResponse {
    pub fn new(period: u32, per_branch: Vec<BranchForecast>) -> Self {
        Self {
            period,
            predictions_per_branch: per_branch
                .into_iter()
                .map(|b| BranchPrediction {
                    branch_id: b.branch_id.get(),
                    predicted_borrows: b.predicted_borrows,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub suggestions: Vec<TransferSuggestion>,
    pub candidates_total: usize,
}

impl From<RedistributionPlan> for OptimizeResponse {
    fn from(plan: RedistributionPlan) -> Self {
        Self {
            suggestions: plan.suggestions,
            candidates_total: plan.candidates_total,
        }
    }
}
