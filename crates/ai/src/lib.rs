//! `shelfwise-ai`
//!
//! **Responsibility:** demand forecasting and copy redistribution.
//!
//! This crate stays storage-agnostic:
//! - It must not depend on the inventory crate; callers map their snapshots
//!   into [`InventoryPosition`] and [`FeatureRow`].
//! - It never mutates inventory. It emits **suggestions**, not stock moves.

pub mod demand;
pub mod error;
pub mod estimator;
pub mod job;
pub mod redistribution;
pub mod scheduler;

pub use demand::{DemandRecord, InventoryPosition, RawDemandRecord, merge_demand, records_from_raw};
pub use error::AiError;
pub use estimator::{
    DemandEstimator, FeatureRow, LinearDemandModel, ModelArtifact, Prediction, TrainingRow,
    TrainingSummary,
};
pub use job::AiJob;
pub use redistribution::{
    DEFICIT_THRESHOLD, MAX_SUGGESTIONS, RedistributionJob, RedistributionPlan, RedistributionPlanner,
    TransferSuggestion,
};
pub use scheduler::{AiScheduler, LocalAiScheduler};
