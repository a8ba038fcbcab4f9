//! Objectives, statuses and counters of a search run.

use crate::cp::{DomainStore, VarId};

/// What the search minimizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Objective {
    /// Minimize a single variable.
    Minimize(VarId),

    /// Minimize the maximum of `ends`, modeled by `makespan`.
    ///
    /// The model must already constrain `makespan >= end` for every end;
    /// the extra variables only sharpen the lower bound used for pruning.
    MinimizeMaxEnd { makespan: VarId, ends: Vec<VarId> },
}

impl Objective {
    /// The variable whose value is minimized.
    pub fn var(&self) -> VarId {
        match self {
            Objective::Minimize(var) => *var,
            Objective::MinimizeMaxEnd { makespan, .. } => *makespan,
        }
    }

    /// Best objective value any completion of `domains` can reach.
    ///
    /// For makespan this is the latest earliest-completion over all ends.
    pub fn lower_bound(&self, domains: &DomainStore) -> i64 {
        match self {
            Objective::Minimize(var) => domains.lo(*var),
            Objective::MinimizeMaxEnd { makespan, ends } => ends
                .iter()
                .map(|&e| domains.lo(e))
                .fold(domains.lo(*makespan), i64::max),
        }
    }
}

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    /// Search completed; the incumbent is optimal.
    Optimal,
    /// Budget ran out; the incumbent is the best found so far.
    Feasible,
    /// Search completed without any solution.
    Infeasible,
    /// Budget ran out before any solution was found.
    Unknown,
}

impl SolverStatus {
    /// Whether a solution comes with this status.
    pub fn has_solution(self) -> bool {
        matches!(self, SolverStatus::Optimal | SolverStatus::Feasible)
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// Every branch was explored or pruned.
    Exhausted,
    /// `time_limit_ms` elapsed.
    TimeLimit,
    /// `node_limit` nodes were explored.
    NodeLimit,
    /// The cancellation flag was raised.
    Cancelled,
}

/// A complete assignment: one value per model variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Objective value of the assignment.
    pub objective: i64,
    /// Value of each variable, indexed by [`VarId::index`].
    pub values: Vec<i64>,
}

impl Assignment {
    pub fn value(&self, var: VarId) -> i64 {
        self.values[var.index()]
    }
}

/// Counters collected during a search run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes entered.
    pub nodes: u64,
    /// Nodes whose propagation failed.
    pub failures: u64,
    /// Nodes cut because their lower bound could not beat the incumbent.
    pub pruned: u64,
    /// Complete assignments reached (improving or not).
    pub solutions: u64,
    /// Deepest node entered.
    pub max_depth: usize,
    /// Wall-clock time in milliseconds.
    pub elapsed_ms: u64,
}

impl SearchStats {
    /// Adds the counters of another (worker) run.
    pub fn merge(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.failures += other.failures;
        self.pruned += other.pruned;
        self.solutions += other.solutions;
        self.max_depth = self.max_depth.max(other.max_depth);
    }
}

/// Result of a branch-and-bound run.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub status: SolverStatus,
    /// Best assignment found, if any.
    pub best: Option<Assignment>,
    pub termination: Termination,
    pub stats: SearchStats,
}

impl SearchResult {
    /// Objective value of the best assignment.
    pub fn objective_value(&self) -> Option<i64> {
        self.best.as_ref().map(|a| a.objective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_bound_max_end() {
        let mut domains = DomainStore::new();
        let e1 = domains.create("e1", 4, 10);
        let e2 = domains.create("e2", 7, 10);
        let makespan = domains.create("makespan", 0, 10);

        let objective = Objective::MinimizeMaxEnd {
            makespan,
            ends: vec![e1, e2],
        };
        assert_eq!(objective.var(), makespan);
        assert_eq!(objective.lower_bound(&domains), 7);
        assert_eq!(Objective::Minimize(e1).lower_bound(&domains), 4);
    }

    #[test]
    fn test_status() {
        assert!(SolverStatus::Optimal.has_solution());
        assert!(SolverStatus::Feasible.has_solution());
        assert!(!SolverStatus::Infeasible.has_solution());
        assert!(!SolverStatus::Unknown.has_solution());
    }

    #[test]
    fn test_merge_stats() {
        let mut a = SearchStats {
            nodes: 3,
            max_depth: 2,
            ..Default::default()
        };
        let b = SearchStats {
            nodes: 5,
            failures: 1,
            max_depth: 4,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.nodes, 8);
        assert_eq!(a.failures, 1);
        assert_eq!(a.max_depth, 4);
    }
}
