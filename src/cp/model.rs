//! CP model definition.

use super::constraint::{ConstraintId, ConstraintStore};
use super::interval::{IntervalId, IntervalRegistry};
use super::variables::{DomainStore, VarId};
use crate::error::Result;

/// A constraint programming model.
///
/// Bundles the three stores of one problem. Nothing is global: several
/// models can be built and solved side by side. The stores stay public so
/// callers can pass them individually to the functions that need them.
///
/// # Examples
///
/// ```
/// use u_disjunct::cp::CpModel;
///
/// let mut model = CpModel::new("example");
/// let op1 = model.new_interval("op1", 0, 100, 50).unwrap();
/// let op2 = model.new_interval("op2", 0, 100, 30).unwrap();
/// model.add_no_overlap(&[op1, op2]).unwrap();
/// assert_eq!(model.interval_count(), 2);
/// assert_eq!(model.pair_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    /// Variable domains.
    pub domains: DomainStore,
    /// Interval variables.
    pub intervals: IntervalRegistry,
    /// Constraints.
    pub constraints: ConstraintStore,
}

impl CpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds an integer variable with domain `[lo, hi]`.
    pub fn new_int_var(&mut self, name: impl Into<String>, lo: i64, hi: i64) -> VarId {
        self.domains.create(name, lo, hi)
    }

    /// Adds an interval whose start and end both live in `[lo, hi]`.
    ///
    /// Creates `start_<name>` and `end_<name>` variables.
    pub fn new_interval(
        &mut self,
        name: impl Into<String>,
        lo: i64,
        hi: i64,
        duration: i64,
    ) -> Result<IntervalId> {
        let name = name.into();
        let start = self.domains.create(format!("start_{name}"), lo, hi);
        let end = self.domains.create(format!("end_{name}"), lo, hi);
        self.intervals
            .create_interval(&self.domains, &mut self.constraints, name, start, duration, end)
    }

    /// Convenience: `b == a + k`.
    pub fn add_offset(&mut self, a: VarId, b: VarId, k: i64) -> Result<ConstraintId> {
        self.constraints.post_offset(&self.domains, a, b, k)
    }

    /// Convenience: `b >= a + k`.
    pub fn add_precedence(&mut self, a: VarId, b: VarId, k: i64) -> Result<ConstraintId> {
        self.constraints.post_precedence(&self.domains, a, b, k)
    }

    /// Convenience: no-overlap over `intervals`.
    pub fn add_no_overlap(&mut self, intervals: &[IntervalId]) -> Result<ConstraintId> {
        self.constraints
            .post_no_overlap(&self.domains, &self.intervals, intervals)
    }

    /// Returns the number of variables.
    pub fn var_count(&self) -> usize {
        self.domains.len()
    }

    /// Returns the number of interval variables.
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Returns the number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Returns the number of disjunctive pairs.
    pub fn pair_count(&self) -> usize {
        self.constraints.pairs().len()
    }
}
