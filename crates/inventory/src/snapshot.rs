//! Inventory snapshot provider.
//!
//! Collapses historical observations into the current stock position per
//! (book, branch): the copies and capacity of the most recent period win.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use shelfwise_core::{BookId, BranchId};

use crate::observation::Observation;

/// Current copies and capacity for a (book, branch) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPosition {
    pub book_id: BookId,
    pub branch_id: BranchId,
    /// Period the position was observed in.
    pub period: u32,
    pub copies: u32,
    pub capacity: u32,
}

impl StockPosition {
    pub fn key(&self) -> (BookId, BranchId) {
        (self.book_id, self.branch_id)
    }
}

/// Latest observed stock position per (book, branch).
///
/// Last observed value wins: the row with the highest period, and on a period
/// tie the row that comes later in `observations`. Output keeps the order in
/// which keys first appear.
pub fn latest_positions(observations: &[Observation]) -> Vec<StockPosition> {
    let mut index: HashMap<(BookId, BranchId), usize> = HashMap::new();
    let mut positions: Vec<StockPosition> = Vec::new();

    for obs in observations {
        let candidate = StockPosition {
            book_id: obs.book_id,
            branch_id: obs.branch_id,
            period: obs.period,
            copies: obs.copies,
            capacity: obs.capacity,
        };

        match index.get(&obs.key()) {
            Some(&i) => {
                if obs.period >= positions[i].period {
                    positions[i] = candidate;
                }
            }
            None => {
                index.insert(obs.key(), positions.len());
                positions.push(candidate);
            }
        }
    }

    positions
}
