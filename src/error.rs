//! Error taxonomy shared by the engine and the scheduling layer.

use crate::cp::VarId;
use thiserror::Error;

/// Errors raised while building or solving a model.
///
/// Only input errors (`InvalidDuration`, `InvalidDemand`, `InvalidHorizon`,
/// `HorizonOverflow`, `DuplicateTask`, `InvalidConfig`) ever reach a caller of
/// [`ScheduleProblem::solve`](crate::schedule::ScheduleProblem::solve).
/// `DomainEmpty` and `Infeasible` are recovered by backtracking, and
/// `Unsatisfiable` is reported as an infeasible schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpError {
    /// A task or interval declares a negative duration.
    #[error("invalid duration {duration} for `{name}`")]
    InvalidDuration { name: String, duration: i64 },

    /// A single-stage task demands more than the unit resource capacity.
    #[error("invalid resource demand {demand} for `{name}` (capacity is 1)")]
    InvalidDemand { name: String, demand: i64 },

    /// The planning horizon is negative.
    #[error("invalid horizon {0}")]
    InvalidHorizon(i64),

    /// No explicit horizon is set and the task times sum past `i64::MAX`.
    #[error("task times overflow the derived horizon; set an explicit horizon")]
    HorizonOverflow,

    /// Two tasks share a name.
    #[error("duplicate task name `{0}`")]
    DuplicateTask(String),

    /// A tightening left a variable with no value.
    #[error("domain of {var} became empty")]
    DomainEmpty { var: VarId },

    /// Propagation reached a contradiction in the current branch.
    #[error("propagation failed: branch is infeasible")]
    Infeasible,

    /// A constraint is violated by the initial domains.
    #[error("unsatisfiable: {0}")]
    Unsatisfiable(String),

    /// A search configuration value is out of range.
    #[error("invalid search config: {0}")]
    InvalidConfig(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CpError>;
