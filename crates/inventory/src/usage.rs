//! Recent-usage aggregation (next-period feature rows).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use shelfwise_core::{BookId, BranchId, DomainError, DomainResult};

use crate::observation::Observation;

/// Number of trailing periods averaged into `recent_borrows_avg`.
pub const DEFAULT_USAGE_WINDOW: usize = 4;

/// Recent borrowing activity for a (book, branch) pair, projected onto a
/// future period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub book_id: BookId,
    pub branch_id: BranchId,
    /// The period the summary is a feature row for.
    pub period: u32,
    pub recent_borrows_avg: f64,
    pub copies: u32,
    pub capacity: u32,
}

/// Summarize every observed (book, branch) pair for `next_period`.
///
/// `recent_borrows_avg` is the mean of the last `window` borrow counts ordered
/// by period; copies and capacity come from the latest period. Output keeps
/// the order in which keys first appear. Any row failing
/// [`Observation::validate`] rejects the whole history.
pub fn recent_usage(
    observations: &[Observation],
    window: usize,
    next_period: u32,
) -> DomainResult<Vec<UsageSummary>> {
    if window == 0 {
        return Err(DomainError::validation("usage window must be >= 1"));
    }

    validate_all(observations)?;

    let mut order: Vec<(BookId, BranchId)> = Vec::new();
    let mut grouped: HashMap<(BookId, BranchId), Vec<&Observation>> = HashMap::new();
    for obs in observations {
        grouped
            .entry(obs.key())
            .or_insert_with(|| {
                order.push(obs.key());
                Vec::new()
            })
            .push(obs);
    }

    let mut out = Vec::with_capacity(order.len());
    for key in order {
        let Some(mut rows) = grouped.remove(&key) else {
            continue;
        };
        // Stable: rows sharing a period keep input order, so the later one is last.
        rows.sort_by_key(|o| o.period);

        let Some(last) = rows.last() else {
            continue;
        };
        let tail = &rows[rows.len().saturating_sub(window)..];
        let recent_borrows_avg = tail.iter().map(|o| o.borrows).sum::<f64>() / tail.len() as f64;

        out.push(UsageSummary {
            book_id: key.0,
            branch_id: key.1,
            period: next_period,
            recent_borrows_avg,
            copies: last.copies,
            capacity: last.capacity,
        });
    }

    Ok(out)
}

/// First validation failure in a history, if any.
pub fn validate_all(observations: &[Observation]) -> DomainResult<()> {
    observations.iter().try_for_each(Observation::validate)
}
