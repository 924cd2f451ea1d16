//! Copy redistribution across branches.
//!
//! Greedy and deterministic. Per book:
//! - Need = predicted borrows - copies, per branch.
//! - Deficits (Need > threshold) are served largest first; surpluses
//!   (Need < 0) are drained largest first. Equal Need is ordered by branch id.
//! - Each deficit takes `min(remaining surplus, outstanding need)` from every
//!   surplus in turn until its rounded-up need is covered.
//!
//! Surplus consumed by one deficit is no longer available to the next one in
//! the same book. Books never share copies.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use shelfwise_core::{BookId, BranchId};

use crate::demand::DemandRecord;
use crate::error::AiError;
use crate::job::AiJob;

/// Minimum Need (exclusive) for a branch to receive copies.
pub const DEFICIT_THRESHOLD: f64 = 1.0;

/// Maximum number of suggestions returned per run.
pub const MAX_SUGGESTIONS: usize = 50;

/// A proposed move of `count` copies of one book between two branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSuggestion {
    pub book_id: BookId,
    pub from_branch: BranchId,
    pub to_branch: BranchId,
    pub count: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedistributionPlan {
    /// Prefix of the full candidate list, in visit order.
    pub suggestions: Vec<TransferSuggestion>,
    /// Number of candidates generated before truncation.
    pub candidates_total: usize,
}

impl RedistributionPlan {
    pub fn is_truncated(&self) -> bool {
        self.candidates_total > self.suggestions.len()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RedistributionPlanner {
    deficit_threshold: f64,
    max_suggestions: usize,
}

impl Default for RedistributionPlanner {
    fn default() -> Self {
        Self {
            deficit_threshold: DEFICIT_THRESHOLD,
            max_suggestions: MAX_SUGGESTIONS,
        }
    }
}

struct Deficit {
    branch_id: BranchId,
    need: f64,
    predicted_borrows: f64,
    copies: u32,
}

impl RedistributionPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deficit_threshold(mut self, deficit_threshold: f64) -> Self {
        self.deficit_threshold = deficit_threshold;
        self
    }

    pub fn with_max_suggestions(mut self, max_suggestions: usize) -> Self {
        self.max_suggestions = max_suggestions;
        self
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    /// Compute transfer suggestions for `records`.
    ///
    /// Fails only on malformed input (duplicate (book, branch) pairs or a bad
    /// threshold). Finding nothing to move is an empty plan, not an error.
    pub fn plan(&self, records: &[DemandRecord]) -> Result<RedistributionPlan, AiError> {
        if !(self.deficit_threshold.is_finite() && self.deficit_threshold >= 0.0) {
            return Err(AiError::InvalidInput(
                "deficit_threshold must be a finite non-negative number".to_string(),
            ));
        }

        let mut seen: HashSet<(BookId, BranchId)> = HashSet::with_capacity(records.len());
        let mut book_order: Vec<BookId> = Vec::new();
        let mut by_book: HashMap<BookId, Vec<&DemandRecord>> = HashMap::new();

        for record in records {
            if !seen.insert(record.key()) {
                return Err(AiError::InvalidInput(format!(
                    "duplicate demand record for book {} at branch {}",
                    record.book_id, record.branch_id
                )));
            }
            by_book
                .entry(record.book_id)
                .or_insert_with(|| {
                    book_order.push(record.book_id);
                    Vec::new()
                })
                .push(record);
        }

        let mut candidates: Vec<TransferSuggestion> = Vec::new();
        for book_id in &book_order {
            if let Some(group) = by_book.get(book_id) {
                self.plan_book(*book_id, group, &mut candidates);
            }
        }

        let candidates_total = candidates.len();
        candidates.truncate(self.max_suggestions);

        debug!(
            records = records.len(),
            books = book_order.len(),
            candidates = candidates_total,
            returned = candidates.len(),
            "redistribution plan computed"
        );

        Ok(RedistributionPlan {
            suggestions: candidates,
            candidates_total,
        })
    }

    fn plan_book(&self, book_id: BookId, group: &[&DemandRecord], out: &mut Vec<TransferSuggestion>) {
        let mut deficits: Vec<Deficit> = Vec::new();
        let mut surpluses: Vec<(BranchId, f64)> = Vec::new();

        for record in group {
            let Some((predicted_borrows, copies)) = record.measured() else {
                warn!(
                    book = %record.book_id,
                    branch = %record.branch_id,
                    "demand record has missing or non-finite numbers; treating need as 0"
                );
                continue;
            };

            let need = predicted_borrows - f64::from(copies);
            if need > self.deficit_threshold {
                deficits.push(Deficit {
                    branch_id: record.branch_id,
                    need,
                    predicted_borrows,
                    copies,
                });
            } else if need < 0.0 {
                surpluses.push((record.branch_id, need));
            }
        }

        if deficits.is_empty() || surpluses.is_empty() {
            return;
        }

        deficits.sort_by(|a, b| b.need.total_cmp(&a.need).then(a.branch_id.cmp(&b.branch_id)));
        surpluses.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        // Whole copies each surplus branch can still give up for this book.
        let mut remaining: HashMap<BranchId, u32> = surpluses
            .iter()
            .map(|(branch, need)| (*branch, (-need).floor() as u32))
            .collect();

        for deficit in &deficits {
            let mut outstanding = deficit.need.ceil() as u32;

            for (from, _) in &surpluses {
                let avail = remaining.get(from).copied().unwrap_or(0);
                if avail == 0 {
                    continue;
                }
                let moved = avail.min(outstanding);
                if moved == 0 {
                    continue;
                }

                out.push(TransferSuggestion {
                    book_id,
                    from_branch: *from,
                    to_branch: deficit.branch_id,
                    count: moved,
                    reason: format!(
                        "Predicted demand {:.1} vs copies {} at destination.",
                        deficit.predicted_borrows, deficit.copies
                    ),
                });

                outstanding -= moved;
                remaining.insert(*from, avail - moved);
                if outstanding == 0 {
                    break;
                }
            }
        }
    }
}

/// Redistribution over an immutable snapshot of demand records.
#[derive(Debug, Clone)]
pub struct RedistributionJob {
    input: Vec<DemandRecord>,
    planner: RedistributionPlanner,
}

impl RedistributionJob {
    pub fn new(input: Vec<DemandRecord>) -> Self {
        Self {
            input,
            planner: RedistributionPlanner::default(),
        }
    }

    pub fn with_planner(mut self, planner: RedistributionPlanner) -> Self {
        self.planner = planner;
        self
    }
}

impl AiJob for RedistributionJob {
    type Input = Vec<DemandRecord>;
    type Output = RedistributionPlan;

    fn kind(&self) -> &'static str {
        "inventory.redistribution"
    }

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn run(&self) -> Result<RedistributionPlan, AiError> {
        self.planner.plan(&self.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::scheduler::{AiScheduler, LocalAiScheduler};

    fn rec(book: i64, branch: i64, predicted: f64, copies: u32) -> DemandRecord {
        DemandRecord::new(BookId::new(book), BranchId::new(branch), predicted, copies, 3000)
    }

    fn unlimited() -> RedistributionPlanner {
        RedistributionPlanner::new().with_max_suggestions(usize::MAX)
    }

    fn moves(plan: &RedistributionPlan) -> Vec<(i64, i64, i64, u32)> {
        plan.suggestions
            .iter()
            .map(|s| (s.book_id.get(), s.from_branch.get(), s.to_branch.get(), s.count))
            .collect()
    }

    #[test]
    fn single_deficit_served_from_single_surplus() {
        // A: Need 8, B: Need -8.
        let plan = RedistributionPlanner::new()
            .plan(&[rec(1, 1, 10.0, 2), rec(1, 2, 1.0, 9)])
            .unwrap();
        assert_eq!(moves(&plan), vec![(1, 2, 1, 8)]);
        assert_eq!(
            plan.suggestions[0].reason,
            "Predicted demand 10.0 vs copies 2 at destination."
        );
        assert!(!plan.is_truncated());
    }

    #[test]
    fn surplus_is_consumed_across_deficits_of_the_same_book() {
        // Need 5, Need 3, Need -6.
        let plan = RedistributionPlanner::new()
            .plan(&[rec(1, 10, 5.0, 0), rec(1, 20, 3.0, 0), rec(1, 30, 0.0, 6)])
            .unwrap();
        assert_eq!(moves(&plan), vec![(1, 30, 10, 5), (1, 30, 20, 1)]);
    }

    #[test]
    fn deficit_draws_from_several_surpluses_largest_first() {
        let plan = RedistributionPlanner::new()
            .plan(&[rec(1, 1, 0.0, 2), rec(1, 2, 9.0, 0), rec(1, 3, 0.0, 4)])
            .unwrap();
        assert_eq!(moves(&plan), vec![(1, 3, 2, 4), (1, 1, 2, 2)]);
    }

    #[test]
    fn fractional_needs_round_toward_caution() {
        // Deficit ceil(2.2) = 3; surplus floor(3.5) = 3.
        let plan = RedistributionPlanner::new()
            .plan(&[rec(1, 1, 4.2, 2), rec(1, 2, 0.5, 4)])
            .unwrap();
        assert_eq!(moves(&plan), vec![(1, 2, 1, 3)]);

        // Surplus smaller than one whole copy cannot give anything.
        let plan = RedistributionPlanner::new()
            .plan(&[rec(1, 1, 5.0, 0), rec(1, 2, 0.5, 1)])
            .unwrap();
        assert!(plan.suggestions.is_empty());
    }

    #[test]
    fn need_of_exactly_one_is_not_a_deficit() {
        let plan = RedistributionPlanner::new()
            .plan(&[rec(1, 1, 3.0, 2), rec(1, 2, 0.0, 5)])
            .unwrap();
        assert!(plan.suggestions.is_empty());
        assert_eq!(plan.candidates_total, 0);
    }

    #[test]
    fn equal_needs_are_ordered_by_branch_id() {
        let plan = RedistributionPlanner::new()
            .plan(&[
                rec(1, 7, 4.0, 0),
                rec(1, 3, 4.0, 0),
                rec(1, 9, 0.0, 3),
                rec(1, 5, 0.0, 3),
            ])
            .unwrap();
        assert_eq!(
            moves(&plan),
            vec![(1, 5, 3, 3), (1, 9, 3, 1), (1, 9, 7, 2)]
        );
    }

    #[test]
    fn books_do_not_share_copies() {
        let plan = RedistributionPlanner::new()
            .plan(&[rec(1, 1, 10.0, 0), rec(2, 2, 0.0, 10)])
            .unwrap();
        assert!(plan.suggestions.is_empty());
    }

    #[test]
    fn books_are_visited_in_first_appearance_order() {
        let plan = RedistributionPlanner::new()
            .plan(&[
                rec(5, 1, 10.0, 0),
                rec(2, 1, 10.0, 0),
                rec(2, 2, 0.0, 4),
                rec(5, 2, 0.0, 3),
            ])
            .unwrap();
        assert_eq!(moves(&plan), vec![(5, 2, 1, 3), (2, 2, 1, 4)]);
    }

    #[test]
    fn records_with_gaps_are_ignored() {
        let mut missing_copies = rec(1, 1, 50.0, 0);
        missing_copies.copies = None;
        let nan_prediction = rec(1, 2, f64::NAN, 0);

        let plan = RedistributionPlanner::new()
            .plan(&[missing_copies, nan_prediction, rec(1, 3, 0.0, 8)])
            .unwrap();
        assert!(plan.suggestions.is_empty());
    }

    #[test]
    fn duplicate_pairs_are_rejected() {
        let err = RedistributionPlanner::new()
            .plan(&[rec(1, 1, 1.0, 1), rec(1, 1, 2.0, 2)])
            .unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));
    }

    #[test]
    fn empty_input_is_an_empty_plan() {
        let plan = RedistributionPlanner::new().plan(&[]).unwrap();
        assert!(plan.suggestions.is_empty());
    }

    #[test]
    fn output_is_capped_to_a_prefix_of_all_candidates() {
        // 75 books, one suggestion each.
        let records: Vec<DemandRecord> = (1..=75)
            .flat_map(|book| [rec(book, 1, 10.0, 2), rec(book, 2, 1.0, 9)])
            .collect();

        let capped = RedistributionPlanner::new().plan(&records).unwrap();
        let full = unlimited().plan(&records).unwrap();

        assert_eq!(full.suggestions.len(), 75);
        assert_eq!(capped.suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(capped.candidates_total, 75);
        assert!(capped.is_truncated());
        assert_eq!(capped.suggestions[..], full.suggestions[..MAX_SUGGESTIONS]);
    }

    #[test]
    fn job_runs_through_the_local_scheduler() {
        let job = RedistributionJob::new(vec![rec(1, 1, 10.0, 2), rec(1, 2, 1.0, 9)])
            .with_planner(RedistributionPlanner::new().with_max_suggestions(1));
        assert_eq!(job.input().len(), 2);
        assert_eq!(job.kind(), "inventory.redistribution");

        let plan = LocalAiScheduler::new().run(job).unwrap();
        assert_eq!(plan.suggestions.len(), 1);
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let err = RedistributionPlanner::new()
            .with_deficit_threshold(f64::NAN)
            .plan(&[])
            .unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));
    }

    fn demand_records() -> impl Strategy<Value = Vec<DemandRecord>> {
        prop::collection::vec(
            prop::collection::vec((0.0f64..30.0, 0u32..30), 1..8),
            1..4,
        )
        .prop_map(|books| {
            books
                .into_iter()
                .enumerate()
                .flat_map(|(b, branches)| {
                    branches.into_iter().enumerate().map(move |(i, (p, c))| {
                        rec(b as i64 + 1, i as i64 + 1, (p * 2.0).round() / 2.0, c)
                    })
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: every suggestion moves copies between two distinct known
        /// branches of the same book.
        #[test]
        fn suggestions_are_well_formed(records in demand_records()) {
            let plan = unlimited().plan(&records).unwrap();
            for s in &plan.suggestions {
                prop_assert!(s.count > 0);
                prop_assert_ne!(s.from_branch, s.to_branch);
                prop_assert!(records.iter().any(|r| r.book_id == s.book_id && r.branch_id == s.from_branch));
                prop_assert!(records.iter().any(|r| r.book_id == s.book_id && r.branch_id == s.to_branch));
            }
        }

        /// Property: no branch gives more than floor(-Need) or receives more
        /// than ceil(Need), and Need in [0, 1] is never touched.
        #[test]
        fn moves_respect_start_state(records in demand_records()) {
            let plan = unlimited().plan(&records).unwrap();
            for r in &records {
                let need = r.need().unwrap();
                let out: u32 = plan.suggestions.iter()
                    .filter(|s| s.book_id == r.book_id && s.from_branch == r.branch_id)
                    .map(|s| s.count)
                    .sum();
                let inbound: u32 = plan.suggestions.iter()
                    .filter(|s| s.book_id == r.book_id && s.to_branch == r.branch_id)
                    .map(|s| s.count)
                    .sum();

                if need < 0.0 {
                    prop_assert!(f64::from(out) <= (-need).floor());
                    prop_assert_eq!(inbound, 0);
                } else if need > DEFICIT_THRESHOLD {
                    prop_assert!(f64::from(inbound) <= need.ceil());
                    prop_assert_eq!(out, 0);
                } else {
                    prop_assert_eq!(out + inbound, 0);
                }
            }
        }

        /// Property: the plan is a pure function of its input.
        #[test]
        fn planning_is_deterministic(records in demand_records(), cap in 0usize..20) {
            let planner = RedistributionPlanner::new().with_max_suggestions(cap);
            let a = planner.plan(&records).unwrap();
            let b = planner.plan(&records).unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert!(a.suggestions.len() <= cap);

            let full = unlimited().plan(&records).unwrap();
            prop_assert_eq!(&a.suggestions[..], &full.suggestions[..a.suggestions.len()]);
        }
    }
}
