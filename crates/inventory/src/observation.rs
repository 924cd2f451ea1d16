use serde::{Deserialize, Serialize};

use shelfwise_core::{BookId, BranchId, DomainError, DomainResult};

/// One observed period of borrowing activity for a (book, branch) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub book_id: BookId,
    pub branch_id: BranchId,
    /// 1-based period index (weeks in the demo dataset).
    pub period: u32,
    pub borrows: f64,
    pub copies: u32,
    pub capacity: u32,
}

impl Observation {
    pub fn key(&self) -> (BookId, BranchId) {
        (self.book_id, self.branch_id)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.period == 0 {
            return Err(DomainError::validation("period must be >= 1"));
        }
        if self.capacity == 0 {
            return Err(DomainError::validation(format!(
                "branch {} has zero capacity",
                self.branch_id
            )));
        }
        if !(self.borrows.is_finite() && self.borrows >= 0.0) {
            return Err(DomainError::validation(format!(
                "borrows must be a finite non-negative number (book {}, branch {}, period {})",
                self.book_id, self.branch_id, self.period
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs() -> Observation {
        Observation {
            book_id: BookId::new(1),
            branch_id: BranchId::new(2),
            period: 3,
            borrows: 4.0,
            copies: 5,
            capacity: 2500,
        }
    }

    #[test]
    fn accepts_well_formed_rows() {
        assert!(obs().validate().is_ok());
    }

    #[test]
    fn rejects_zero_period_and_capacity() {
        let mut o = obs();
        o.period = 0;
        assert!(matches!(o.validate(), Err(DomainError::Validation(_))));

        let mut o = obs();
        o.capacity = 0;
        assert!(matches!(o.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn rejects_nan_borrows() {
        let mut o = obs();
        o.borrows = f64::NAN;
        assert!(o.validate().is_err());
    }
}
