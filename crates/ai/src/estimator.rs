use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use shelfwise_core::{BookId, BranchId};

use crate::error::AiError;

/// Model inputs, in order: book code, branch code, period, recent borrow
/// average, copies, capacity.
pub const FEATURES: usize = 6;
const ARTIFACT_FORMAT: u32 = 1;
const DEFAULT_RIDGE: f64 = 1.0;
/// Trailing periods averaged into `recent_borrows_avg` while training.
const TRAINING_WINDOW: usize = 4;

/// Historical row the estimator learns from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub book_id: BookId,
    pub branch_id: BranchId,
    pub period: u32,
    pub borrows: f64,
    pub copies: u32,
    pub capacity: u32,
}

/// Row to predict for. Missing numeric features are treated as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub book_id: BookId,
    pub branch_id: BranchId,
    pub period: Option<u32>,
    pub recent_borrows_avg: Option<f64>,
    pub copies: Option<u32>,
    pub capacity: Option<u32>,
}

impl FeatureRow {
    /// Numeric features that are absent or non-finite and will be read as 0.
    pub fn numeric_gaps(&self) -> usize {
        [
            self.period.is_none(),
            !self.recent_borrows_avg.is_some_and(f64::is_finite),
            self.copies.is_none(),
            self.capacity.is_none(),
        ]
        .into_iter()
        .filter(|gap| *gap)
        .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub book_id: BookId,
    pub branch_id: BranchId,
    /// Never negative.
    pub predicted_borrows: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub artifact_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub rows: usize,
    pub books: usize,
    pub branches: usize,
    /// In-sample mean absolute error of the clipped predictions.
    pub mean_absolute_error: f64,
}

/// Train/predict contract of a borrowing-demand model.
pub trait DemandEstimator: Send + Sync {
    fn train(&mut self, rows: &[TrainingRow]) -> Result<TrainingSummary, AiError>;

    /// One prediction per input row, in input order.
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<Prediction>, AiError>;

    fn is_trained(&self) -> bool;
}

/// Everything needed to reproduce predictions after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub artifact_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
    pub ridge: f64,
    pub means: [f64; FEATURES],
    pub scales: [f64; FEATURES],
    pub weights: [f64; FEATURES],
    pub intercept: f64,
    /// Sorted; a book's categorical code is its index.
    pub books: Vec<BookId>,
    /// Sorted; a branch's categorical code is its index.
    pub branches: Vec<BranchId>,
}

impl ModelArtifact {
    fn book_code(&self, id: BookId) -> f64 {
        // Unseen ids fall back to the neutral code 0.
        self.books.binary_search(&id).map(|i| i as f64).unwrap_or(0.0)
    }

    fn branch_code(&self, id: BranchId) -> f64 {
        self.branches.binary_search(&id).map(|i| i as f64).unwrap_or(0.0)
    }

    fn features(&self, row: &FeatureRow) -> [f64; FEATURES] {
        [
            self.book_code(row.book_id),
            self.branch_code(row.branch_id),
            row.period.map(f64::from).unwrap_or(0.0),
            row.recent_borrows_avg.filter(|v| v.is_finite()).unwrap_or(0.0),
            row.copies.map(f64::from).unwrap_or(0.0),
            row.capacity.map(f64::from).unwrap_or(0.0),
        ]
    }

    fn evaluate(&self, x: &[f64; FEATURES]) -> f64 {
        let raw = self.intercept
            + (0..FEATURES)
                .map(|i| self.weights[i] * (x[i] - self.means[i]) / self.scales[i])
                .sum::<f64>();
        if raw.is_finite() { raw.max(0.0) } else { 0.0 }
    }
}

/// Ridge regression over standardised features.
///
/// Deterministic: the same training rows always yield the same weights.
#[derive(Debug, Clone)]
pub struct LinearDemandModel {
    ridge: f64,
    artifact: Option<ModelArtifact>,
}

impl Default for LinearDemandModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearDemandModel {
    /// Untrained model.
    pub fn new() -> Self {
        Self {
            ridge: DEFAULT_RIDGE,
            artifact: None,
        }
    }

    pub fn with_ridge(mut self, ridge: f64) -> Self {
        self.ridge = ridge;
        self
    }

    pub fn artifact(&self) -> Option<&ModelArtifact> {
        self.artifact.as_ref()
    }

    /// Load a persisted model. A missing file is not an error: the model
    /// simply starts untrained.
    pub fn load(path: &Path) -> Result<Self, AiError> {
        if !path.exists() {
            info!(path = %path.display(), "no demand model artifact found; starting untrained");
            return Ok(Self::new());
        }

        let bytes = std::fs::read(path)
            .map_err(|e| AiError::Artifact(format!("read {}: {e}", path.display())))?;
        let artifact: ModelArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| AiError::Artifact(format!("decode {}: {e}", path.display())))?;

        if artifact.format_version != ARTIFACT_FORMAT {
            return Err(AiError::Artifact(format!(
                "unsupported artifact format {} (expected {ARTIFACT_FORMAT})",
                artifact.format_version
            )));
        }

        info!(
            path = %path.display(),
            artifact_id = %artifact.artifact_id,
            trained_at = %artifact.trained_at,
            "loaded demand model artifact"
        );

        Ok(Self {
            ridge: artifact.ridge,
            artifact: Some(artifact),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), AiError> {
        let artifact = self.artifact.as_ref().ok_or(AiError::ModelNotTrained)?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| AiError::Artifact(format!("create {}: {e}", dir.display())))?;
        }
        let bytes = serde_json::to_vec_pretty(artifact)
            .map_err(|e| AiError::Artifact(format!("encode: {e}")))?;
        std::fs::write(path, bytes)
            .map_err(|e| AiError::Artifact(format!("write {}: {e}", path.display())))?;

        info!(path = %path.display(), artifact_id = %artifact.artifact_id, "saved demand model artifact");
        Ok(())
    }
}

impl DemandEstimator for LinearDemandModel {
    fn train(&mut self, rows: &[TrainingRow]) -> Result<TrainingSummary, AiError> {
        if rows.is_empty() {
            return Err(AiError::InvalidInput("no training rows".to_string()));
        }
        if !(self.ridge.is_finite() && self.ridge > 0.0) {
            return Err(AiError::InvalidInput(
                "ridge must be a finite positive number".to_string(),
            ));
        }

        let books = sorted_unique(rows.iter().map(|r| r.book_id));
        let branches = sorted_unique(rows.iter().map(|r| r.branch_id));

        let mut gaps = 0usize;
        let targets: Vec<f64> = rows
            .iter()
            .map(|r| {
                if r.borrows.is_finite() && r.borrows >= 0.0 {
                    r.borrows
                } else {
                    gaps += 1;
                    0.0
                }
            })
            .collect();
        if gaps > 0 {
            warn!(rows = gaps, "training rows with missing borrow counts defaulted to 0");
        }

        let rolling = rolling_means(rows, &targets, TRAINING_WINDOW);

        let mut partial = ModelArtifact {
            format_version: ARTIFACT_FORMAT,
            artifact_id: Uuid::now_v7(),
            trained_at: Utc::now(),
            training_rows: rows.len(),
            ridge: self.ridge,
            means: [0.0; FEATURES],
            scales: [1.0; FEATURES],
            weights: [0.0; FEATURES],
            intercept: 0.0,
            books,
            branches,
        };

        let xs: Vec<[f64; FEATURES]> = rows
            .iter()
            .zip(&rolling)
            .map(|(r, avg)| {
                partial.features(&FeatureRow {
                    book_id: r.book_id,
                    branch_id: r.branch_id,
                    period: Some(r.period),
                    recent_borrows_avg: Some(*avg),
                    copies: Some(r.copies),
                    capacity: Some(r.capacity),
                })
            })
            .collect();

        let n = xs.len() as f64;
        for i in 0..FEATURES {
            let mean = xs.iter().map(|x| x[i]).sum::<f64>() / n;
            let var = xs.iter().map(|x| (x[i] - mean) * (x[i] - mean)).sum::<f64>() / n;
            let std = var.sqrt();
            partial.means[i] = mean;
            partial.scales[i] = if std > 1e-12 { std } else { 1.0 };
        }
        let y_mean = targets.iter().sum::<f64>() / n;

        // Normal equations on standardised features: (ZᵀZ + λI) w = Zᵀ(y - ȳ).
        let mut gram = [[0.0; FEATURES]; FEATURES];
        let mut rhs = [0.0; FEATURES];
        for (x, y) in xs.iter().zip(&targets) {
            let z = standardise(x, &partial.means, &partial.scales);
            for i in 0..FEATURES {
                rhs[i] += z[i] * (y - y_mean);
                for j in 0..FEATURES {
                    gram[i][j] += z[i] * z[j];
                }
            }
        }
        for (i, row) in gram.iter_mut().enumerate() {
            row[i] += self.ridge;
        }

        let weights = solve(gram, rhs)
            .ok_or_else(|| AiError::TrainingFailed("normal equations are singular".to_string()))?;
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(AiError::TrainingFailed("non-finite model weights".to_string()));
        }
        partial.weights = weights;
        partial.intercept = y_mean;

        let mean_absolute_error = xs
            .iter()
            .zip(&targets)
            .map(|(x, y)| (partial.evaluate(x) - y).abs())
            .sum::<f64>()
            / n;

        let summary = TrainingSummary {
            artifact_id: partial.artifact_id,
            trained_at: partial.trained_at,
            rows: rows.len(),
            books: partial.books.len(),
            branches: partial.branches.len(),
            mean_absolute_error,
        };

        info!(
            artifact_id = %summary.artifact_id,
            rows = summary.rows,
            books = summary.books,
            branches = summary.branches,
            mae = summary.mean_absolute_error,
            "trained demand model"
        );

        self.artifact = Some(partial);
        Ok(summary)
    }

    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<Prediction>, AiError> {
        let artifact = self.artifact.as_ref().ok_or(AiError::ModelNotTrained)?;

        let (gap_rows, gap_fields) = rows
            .iter()
            .map(FeatureRow::numeric_gaps)
            .filter(|n| *n > 0)
            .fold((0usize, 0usize), |(r, f), n| (r + 1, f + n));
        if gap_rows > 0 {
            warn!(
                rows = gap_rows,
                fields = gap_fields,
                "prediction rows with missing numeric features defaulted to 0"
            );
        }

        Ok(rows
            .iter()
            .map(|row| Prediction {
                book_id: row.book_id,
                branch_id: row.branch_id,
                predicted_borrows: artifact.evaluate(&artifact.features(row)),
            })
            .collect())
    }

    fn is_trained(&self) -> bool {
        self.artifact.is_some()
    }
}

fn sorted_unique<T: Ord + Copy>(ids: impl Iterator<Item = T>) -> Vec<T> {
    let mut v: Vec<T> = ids.collect();
    v.sort_unstable();
    v.dedup();
    v
}

/// Rolling mean of the last `window` targets per (book, branch), ordered by
/// period and including the row itself. Returned in input order.
fn rolling_means(rows: &[TrainingRow], targets: &[f64], window: usize) -> Vec<f64> {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by_key(|&i| (rows[i].book_id, rows[i].branch_id, rows[i].period));

    let mut out = vec![0.0; rows.len()];
    let mut history: HashMap<(BookId, BranchId), Vec<f64>> = HashMap::new();
    for i in order {
        let seen = history.entry((rows[i].book_id, rows[i].branch_id)).or_default();
        seen.push(targets[i]);
        let tail = &seen[seen.len().saturating_sub(window)..];
        out[i] = tail.iter().sum::<f64>() / tail.len() as f64;
    }
    out
}

fn standardise(
    x: &[f64; FEATURES],
    means: &[f64; FEATURES],
    scales: &[f64; FEATURES],
) -> [f64; FEATURES] {
    let mut z = [0.0; FEATURES];
    for i in 0..FEATURES {
        z[i] = (x[i] - means[i]) / scales[i];
    }
    z
}

/// Gaussian elimination with partial pivoting. `None` when singular.
fn solve(
    mut a: [[f64; FEATURES]; FEATURES],
    mut b: [f64; FEATURES],
) -> Option<[f64; FEATURES]> {
    for col in 0..FEATURES {
        let pivot = (col..FEATURES).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..FEATURES {
            let factor = a[row][col] / a[col][col];
            for k in col..FEATURES {
                let v = a[col][k];
                a[row][k] -= factor * v;
            }
            let v = b[col];
            b[row] -= factor * v;
        }
    }

    let mut x = [0.0; FEATURES];
    for row in (0..FEATURES).rev() {
        let tail: f64 = (row + 1..FEATURES).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
