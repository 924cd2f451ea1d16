use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use shelfwise_ai::{
    AiError, AiScheduler, DemandEstimator, FeatureRow, InventoryPosition, LinearDemandModel,
    LocalAiScheduler, Prediction, RawDemandRecord, RedistributionJob, RedistributionPlan,
    RedistributionPlanner, TrainingRow, TrainingSummary, merge_demand, records_from_raw,
};
use shelfwise_core::{BranchId, DomainError};
use shelfwise_inventory::{
    DEFAULT_USAGE_WINDOW, DemoDataset, Observation, StockPosition, UsageSummary, demo,
    latest_positions, recent_usage, validate_all,
};

use crate::config::ApiConfig;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("background task failed: {0}")]
    Background(String),
}

/// Run CPU- or file-bound service work on tokio's blocking pool.
pub async fn run_blocking<T, F>(services: Arc<AppServices>, work: F) -> Result<T, ServiceError>
where
    T: Send + 'static,
    F: FnOnce(&AppServices) -> Result<T, ServiceError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&services))
        .await
        .map_err(|e| ServiceError::Background(e.to_string()))?
}

/// Summed predictions for one branch.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchForecast {
    pub branch_id: BranchId,
    pub predicted_borrows: f64,
}

/// Service wiring shared by all handlers.
///
/// The demand model is loaded once here, before the router serves anything.
/// Handlers only take the write lock to swap in a freshly trained model.
#[derive(Debug)]
pub struct AppServices {
    config: ApiConfig,
    model: RwLock<LinearDemandModel>,
    scheduler: LocalAiScheduler,
}

impl AppServices {
    pub fn load(config: ApiConfig) -> Result<Self, AiError> {
        let model = LinearDemandModel::load(&config.model_path)?;
        Ok(Self {
            config,
            model: RwLock::new(model),
            scheduler: LocalAiScheduler::new(),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.read_model().is_trained()
    }

    /// Fit a new model on the demo history, persist it, then make it live.
    pub fn train(&self) -> Result<TrainingSummary, ServiceError> {
        let dataset = self.dataset()?;
        let rows: Vec<TrainingRow> = dataset.observations.iter().map(training_row).collect();

        let mut fresh = LinearDemandModel::new();
        let summary = fresh.train(&rows)?;
        fresh.save(&self.config.model_path)?;

        *self.model.write().unwrap_or_else(|e| e.into_inner()) = fresh;
        Ok(summary)
    }

    /// Predicted borrows summed per branch for `last period + periods_ahead`.
    pub fn forecast_per_branch(
        &self,
        periods_ahead: u32,
    ) -> Result<(u32, Vec<BranchForecast>), ServiceError> {
        if periods_ahead == 0 {
            return Err(DomainError::validation("periods_ahead must be >= 1").into());
        }

        let dataset = self.dataset()?;
        let period = dataset.last_period().saturating_add(periods_ahead);
        let predictions = self.predict_for_period(&dataset, period)?;

        let mut per_branch: BTreeMap<BranchId, f64> = BTreeMap::new();
        for p in &predictions {
            *per_branch.entry(p.branch_id).or_default() += p.predicted_borrows;
        }

        Ok((
            period,
            per_branch
                .into_iter()
                .map(|(branch_id, predicted_borrows)| BranchForecast {
                    branch_id,
                    predicted_borrows,
                })
                .collect(),
        ))
    }

    /// Next-period predictions joined with the latest stock snapshot.
    pub fn optimize(&self) -> Result<RedistributionPlan, ServiceError> {
        let dataset = self.dataset()?;
        let predictions = self.predict_for_period(&dataset, dataset.last_period() + 1)?;
        let positions: Vec<InventoryPosition> = latest_positions(&dataset.observations)
            .into_iter()
            .map(inventory_position)
            .collect();

        let records = merge_demand(&predictions, &positions);
        Ok(self.run_redistribution(records)?)
    }

    /// Redistribution over caller-supplied records (no model involved).
    pub fn optimize_records(&self, raw: Vec<RawDemandRecord>) -> Result<RedistributionPlan, ServiceError> {
        let records = records_from_raw(raw)?;
        Ok(self.run_redistribution(records)?)
    }

    fn run_redistribution(
        &self,
        records: Vec<shelfwise_ai::DemandRecord>,
    ) -> Result<RedistributionPlan, AiError> {
        let planner = RedistributionPlanner::new().with_max_suggestions(self.config.max_suggestions);
        let plan = self
            .scheduler
            .run(RedistributionJob::new(records).with_planner(planner))?;

        tracing::info!(
            candidates = plan.candidates_total,
            returned = plan.suggestions.len(),
            "redistribution suggestions ready"
        );
        Ok(plan)
    }

    fn predict_for_period(&self, dataset: &DemoDataset, period: u32) -> Result<Vec<Prediction>, ServiceError> {
        let features: Vec<FeatureRow> = recent_usage(&dataset.observations, DEFAULT_USAGE_WINDOW, period)?
            .into_iter()
            .map(feature_row)
            .collect();

        Ok(self.read_model().predict(&features)?)
    }

    fn dataset(&self) -> Result<DemoDataset, DomainError> {
        let dataset = demo::generate(&self.config.demo)?;
        validate_all(&dataset.observations)?;
        Ok(dataset)
    }

    fn read_model(&self) -> std::sync::RwLockReadGuard<'_, LinearDemandModel> {
        self.model.read().unwrap_or_else(|e| e.into_inner())
    }
}

fn training_row(o: &Observation) -> TrainingRow {
    TrainingRow {
        book_id: o.book_id,
        branch_id: o.branch_id,
        period: o.period,
        borrows: o.borrows,
        copies: o.copies,
        capacity: o.capacity,
    }
}

fn feature_row(u: UsageSummary) -> FeatureRow {
    FeatureRow {
        book_id: u.book_id,
        branch_id: u.branch_id,
        period: Some(u.period),
        recent_borrows_avg: Some(u.recent_borrows_avg),
        copies: Some(u.copies),
        capacity: Some(u.capacity),
    }
}

fn inventory_position(p: StockPosition) -> InventoryPosition {
    InventoryPosition {
        book_id: p.book_id,
        branch_id: p.branch_id,
        copies: p.copies,
        capacity: p.capacity,
    }
}
