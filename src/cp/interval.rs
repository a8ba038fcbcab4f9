//! Interval variables.

use super::constraint::ConstraintStore;
use super::variables::{DomainStore, VarId};
use crate::error::{CpError, Result};

/// Handle to an interval in an [`IntervalRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalId(pub(crate) usize);

impl IntervalId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One occupancy period on a resource: `end == start + duration`.
///
/// The duration is fixed at creation; start and end are variables in the
/// model's [`DomainStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    /// Interval name (used in logs and reports).
    pub name: String,
    /// Start time variable.
    pub start: VarId,
    /// Fixed, non-negative duration.
    pub duration: i64,
    /// End time variable.
    pub end: VarId,
}

/// Registry of the intervals of a model.
///
/// # Examples
///
/// ```
/// use u_disjunct::cp::{ConstraintStore, DomainStore, IntervalRegistry};
///
/// let mut domains = DomainStore::new();
/// let mut constraints = ConstraintStore::new();
/// let mut intervals = IntervalRegistry::new();
///
/// let s = domains.create("start", 0, 10);
/// let e = domains.create("end", 0, 10);
/// let op = intervals
///     .create_interval(&domains, &mut constraints, "op", s, 4, e)
///     .unwrap();
/// assert_eq!(intervals.get(op).duration, 4);
/// assert_eq!(constraints.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IntervalRegistry {
    intervals: Vec<Interval>,
}

impl IntervalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `(start, duration, end)` and posts `end == start + duration`.
    ///
    /// Fails with [`CpError::InvalidDuration`] for a negative duration and
    /// with [`CpError::Unsatisfiable`] when the duration cannot fit the
    /// current domains of `start` and `end`.
    pub fn create_interval(
        &mut self,
        domains: &DomainStore,
        constraints: &mut ConstraintStore,
        name: impl Into<String>,
        start: VarId,
        duration: i64,
        end: VarId,
    ) -> Result<IntervalId> {
        let name = name.into();
        if duration < 0 {
            return Err(CpError::InvalidDuration { name, duration });
        }
        constraints.post_offset(domains, start, end, duration)?;

        let id = IntervalId(self.intervals.len());
        self.intervals.push(Interval {
            name,
            start,
            duration,
            end,
        });
        Ok(id)
    }

    pub fn get(&self, id: IntervalId) -> &Interval {
        &self.intervals[id.0]
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Iterates over `(id, interval)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (IntervalId, &Interval)> {
        self.intervals
            .iter()
            .enumerate()
            .map(|(i, iv)| (IntervalId(i), iv))
    }
}
