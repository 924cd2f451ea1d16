//! Demand records: predictions joined with current stock.
//!
//! The join is an explicit left join on (book, branch): every prediction
//! yields exactly one record, and a prediction without a stock position keeps
//! `copies = None` instead of guessing a value.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use shelfwise_core::{BookId, BranchId};

use crate::error::AiError;
use crate::estimator::Prediction;

/// Current copies of a book at a branch, as seen by the AI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryPosition {
    pub book_id: BookId,
    pub branch_id: BranchId,
    pub copies: u32,
    pub capacity: u32,
}

/// Predicted demand and current copies for one (book, branch) pair.
///
/// Numeric fields are optional: a missing or non-finite value is a data gap,
/// and the optimizer treats such a record as neither deficit nor surplus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
    pub book_id: BookId,
    pub branch_id: BranchId,
    pub predicted_borrows: Option<f64>,
    pub copies: Option<u32>,
    /// Carried through for reporting; not used as a cap on incoming copies.
    pub capacity: Option<u32>,
}

impl DemandRecord {
    pub fn new(
        book_id: BookId,
        branch_id: BranchId,
        predicted_borrows: f64,
        copies: u32,
        capacity: u32,
    ) -> Self {
        Self {
            book_id,
            branch_id,
            predicted_borrows: Some(predicted_borrows),
            copies: Some(copies),
            capacity: Some(capacity),
        }
    }

    pub fn key(&self) -> (BookId, BranchId) {
        (self.book_id, self.branch_id)
    }

    /// `(predicted_borrows, copies)` when both are present and usable.
    pub fn measured(&self) -> Option<(f64, u32)> {
        let predicted = self
            .predicted_borrows
            .filter(|p| p.is_finite() && *p >= 0.0)?;
        Some((predicted, self.copies?))
    }

    /// `predicted_borrows - copies`, or `None` on a data gap.
    pub fn need(&self) -> Option<f64> {
        self.measured().map(|(p, c)| p - f64::from(c))
    }
}

/// Wire shape of a caller-supplied demand record; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDemandRecord {
    pub book_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub predicted_borrows: Option<f64>,
    pub copies: Option<i64>,
    pub capacity: Option<i64>,
}

impl TryFrom<RawDemandRecord> for DemandRecord {
    type Error = AiError;

    fn try_from(raw: RawDemandRecord) -> Result<Self, Self::Error> {
        let book_id = raw
            .book_id
            .ok_or_else(|| AiError::MalformedRecord("missing book_id".to_string()))?;
        let branch_id = raw
            .branch_id
            .ok_or_else(|| AiError::MalformedRecord(format!("book {book_id}: missing branch_id")))?;

        Ok(Self {
            book_id: BookId::new(book_id),
            branch_id: BranchId::new(branch_id),
            predicted_borrows: raw.predicted_borrows,
            copies: raw.copies.and_then(|c| u32::try_from(c).ok()),
            capacity: raw
                .capacity
                .and_then(|c| u32::try_from(c).ok())
                .filter(|c| *c > 0),
        })
    }
}

/// Convert caller records, rejecting the whole batch on the first one
/// without identity.
pub fn records_from_raw(raw: Vec<RawDemandRecord>) -> Result<Vec<DemandRecord>, AiError> {
    raw.into_iter()
        .enumerate()
        .map(|(i, r)| {
            DemandRecord::try_from(r).map_err(|e| match e {
                AiError::MalformedRecord(msg) => AiError::MalformedRecord(format!("record {i}: {msg}")),
                other => other,
            })
        })
        .collect()
}

/// Left join of predictions onto stock positions by (book, branch).
///
/// Output follows prediction order. Positions nobody predicted for are dropped.
pub fn merge_demand(predictions: &[Prediction], positions: &[InventoryPosition]) -> Vec<DemandRecord> {
    let by_key: HashMap<(BookId, BranchId), &InventoryPosition> = positions
        .iter()
        .map(|p| ((p.book_id, p.branch_id), p))
        .collect();

    predictions
        .iter()
        .map(|pred| {
            let position = by_key.get(&(pred.book_id, pred.branch_id));
            DemandRecord {
                book_id: pred.book_id,
                branch_id: pred.branch_id,
                predicted_borrows: Some(pred.predicted_borrows),
                copies: position.map(|p| p.copies),
                capacity: position.map(|p| p.capacity),
            }
        })
        .collect()
}
