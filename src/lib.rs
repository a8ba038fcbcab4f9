//! Disjunctive scheduling engine.
//!
//! Finds start and end times for tasks that compete for a unit-capacity
//! resource, minimizing the makespan:
//!
//! - **CP core** ([`cp`]): integer domains, interval variables, offset,
//!   precedence and no-overlap constraints, worklist bound propagation.
//! - **Search** ([`search`]): depth-first branch-and-bound over the
//!   orderings of overlapping intervals, with time/node budgets,
//!   cancellation and an optional rayon-parallel mode.
//! - **Scheduling** ([`schedule`]): one- and two-stage task records,
//!   model construction and solution reports.
//!
//! # Example
//!
//! ```
//! use u_disjunct::schedule::{ScheduleProblem, TaskSpec};
//! use u_disjunct::search::SearchConfig;
//!
//! let problem = ScheduleProblem::new(vec![
//!     TaskSpec::single("J1", 3),
//!     TaskSpec::single("J2", 2),
//!     TaskSpec::single("J3", 4),
//! ])
//! .with_horizon(10);
//!
//! let report = problem.solve(&SearchConfig::default()).unwrap();
//! assert_eq!(report.makespan, Some(9));
//! println!("{report}");
//! ```
//!
//! # Features
//!
//! - `parallel`: explore subtrees on rayon workers.
//! - `serde`: `Serialize`/`Deserialize` for task records and reports.

pub mod cp;
pub mod error;
pub mod schedule;
pub mod search;

pub use error::{CpError, Result};
