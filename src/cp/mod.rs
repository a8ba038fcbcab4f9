//! Constraint Programming (CP) core.
//!
//! Time-bounded integer variables, interval variables, and the constraints
//! a disjunctive scheduling model needs, plus the propagator that narrows
//! domains to a fixpoint.
//!
//! # Key Components
//!
//! - **Variables**: [`DomainStore`]: owns every `[lo, hi]` domain
//! - **Intervals**: [`IntervalRegistry`]: `(start, duration, end)` triples
//! - **Constraints**: [`ConstraintStore`]: offset, precedence, no-overlap
//! - **Propagation**: [`Propagator`]: worklist bound propagation
//! - **Model**: [`CpModel`]: the three stores of one problem
//!
//! Search lives in [`crate::search`]; this module has no notion of an
//! objective.
//!
//! # References
//!
//! Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"
//! Baptiste, Le Pape & Nuijten (2001), "Constraint-Based Scheduling"

mod constraint;
mod interval;
mod model;
mod propagator;
mod variables;

pub use constraint::{
    Constraint, ConstraintId, ConstraintStore, DisjunctivePair, Member, PairId, PairOrder,
    PairOrders,
};
pub use interval::{Interval, IntervalId, IntervalRegistry};
pub use model::CpModel;
pub use propagator::{PropagationStats, Propagator};
pub use variables::{Domain, DomainStore, VarId};
