//! Search budgets for the iterative algorithms.

use std::time::{Duration, Instant};

/// Upper bounds on how long a tree-growth search may run.
///
/// Both limits are optional; the default budget is unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchBudget {
    /// Maximum number of growth iterations
    pub max_iterations: Option<usize>,
    /// Wall-clock limit per search
    pub time_limit: Option<Duration>,
}

impl SearchBudget {
    /// Create an unlimited budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration limit.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Set the wall-clock limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Whether neither limit is set.
    pub fn is_unlimited(&self) -> bool {
        self.max_iterations.is_none() && self.time_limit.is_none()
    }

    /// Start tracking consumption against this budget.
    pub fn start(&self) -> BudgetTracker {
        BudgetTracker {
            budget: *self,
            started: self.time_limit.map(|_| Instant::now()),
            iterations: 0,
        }
    }
}

/// Consumption of a [`SearchBudget`] during one search.
#[derive(Debug, Clone)]
pub struct BudgetTracker {
    budget: SearchBudget,
    started: Option<Instant>,
    iterations: usize,
}

impl BudgetTracker {
    /// Account for one more iteration. Returns false once the budget is spent.
    pub fn tick(&mut self) -> bool {
        if self.exhausted() {
            return false;
        }
        self.iterations += 1;
        true
    }

    /// Whether either limit has been reached.
    pub fn exhausted(&self) -> bool {
        let over_iterations = self
            .budget
            .max_iterations
            .is_some_and(|max| self.iterations >= max);
        let over_time = match (self.started, self.budget.time_limit) {
            (Some(started), Some(limit)) => started.elapsed() >= limit,
            _ => false,
        };
        over_iterations || over_time
    }

    /// Iterations consumed so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_budget_never_exhausts() {
        let budget = SearchBudget::new();
        assert!(budget.is_unlimited());
        let mut tracker = budget.start();
        for _ in 0..1000 {
            assert!(tracker.tick());
        }
        assert_eq!(tracker.iterations(), 1000);
    }

    #[test]
    fn test_iteration_limit() {
        let mut tracker = SearchBudget::new().with_max_iterations(2).start();
        assert!(tracker.tick());
        assert!(tracker.tick());
        assert!(!tracker.tick());
        assert!(tracker.exhausted());
        assert_eq!(tracker.iterations(), 2);
    }

    #[test]
    fn test_zero_time_limit_exhausts_immediately() {
        let mut tracker = SearchBudget::new().with_time_limit(Duration::ZERO).start();
        assert!(!tracker.tick());
    }
}
