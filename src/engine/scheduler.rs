//! Scheduler - Time budgets for the interruptible work loop.
//!
//! The work loop checks its [`Deadline`] after every unit of work and yields
//! once no time remains. A slice therefore always processes at least one unit.
//!
//! Budgets:
//! - [`TimeBudget`] - wall-clock slice, the idle-callback equivalent
//! - [`UnitBudget`] - fixed number of units per slice, for hosts without a clock
//! - [`Unlimited`] - never yields (synchronous flush)

use std::time::{Duration, Instant};

use super::commit::CommitStats;

// =============================================================================
// Deadline
// =============================================================================

/// Remaining budget for one slice of work.
pub trait Deadline {
    /// Time left in this slice. Zero means yield now.
    fn time_remaining(&self) -> Duration;

    /// Called by the loop after each unit of work.
    fn unit_done(&mut self) {}
}

/// Wall-clock budget starting at construction.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    start: Instant,
    budget: Duration,
}

impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }
}

impl Deadline for TimeBudget {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.start.elapsed())
    }
}

/// Fixed number of units per slice.
///
/// Reports unlimited time while units remain and zero once they run out.
#[derive(Debug, Clone, Copy)]
pub struct UnitBudget {
    remaining: usize,
}

impl UnitBudget {
    pub fn new(units: usize) -> Self {
        Self { remaining: units }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Deadline for UnitBudget {
    fn time_remaining(&self) -> Duration {
        if self.remaining > 0 {
            Duration::MAX
        } else {
            Duration::ZERO
        }
    }

    fn unit_done(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

/// Budget that never runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl Deadline for Unlimited {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

// =============================================================================
// Loop State
// =============================================================================

/// Where the work loop stands between slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No work-in-progress tree and no cursor.
    Idle,
    /// Units of work remain.
    Working,
    /// Every unit is done; the next slice commits.
    PendingCommit,
}

/// What one call to the work loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    /// Nothing to do.
    Idle,
    /// Budget ran out with work remaining.
    Yielded { units: usize },
    /// The work-in-progress tree was committed.
    Committed { units: usize, stats: CommitStats },
}

impl SliceOutcome {
    pub fn units(&self) -> usize {
        match self {
            SliceOutcome::Idle => 0,
            SliceOutcome::Yielded { units } | SliceOutcome::Committed { units, .. } => *units,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, SliceOutcome::Committed { .. })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_budget_counts_down() {
        let mut budget = UnitBudget::new(2);
        assert_eq!(budget.time_remaining(), Duration::MAX);

        budget.unit_done();
        assert!(!budget.time_remaining().is_zero());

        budget.unit_done();
        assert!(budget.time_remaining().is_zero());

        budget.unit_done();
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn test_time_budget_exhausts() {
        let zero = TimeBudget::new(Duration::ZERO);
        assert!(zero.time_remaining().is_zero());

        let long = TimeBudget::new(Duration::from_secs(60));
        assert!(long.time_remaining() > Duration::from_secs(59));
    }

    #[test]
    fn test_unlimited_never_yields() {
        let mut budget = Unlimited;
        for _ in 0..1000 {
            budget.unit_done();
        }
        assert_eq!(budget.time_remaining(), Duration::MAX);
    }

    #[test]
    fn test_outcome_units() {
        assert_eq!(SliceOutcome::Idle.units(), 0);
        assert_eq!(SliceOutcome::Yielded { units: 3 }.units(), 3);

        let committed = SliceOutcome::Committed {
            units: 5,
            stats: CommitStats::default(),
        };
        assert_eq!(committed.units(), 5);
        assert!(committed.is_committed());
    }
}
