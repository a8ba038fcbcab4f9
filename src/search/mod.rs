//! Branch-and-bound search over disjunctive orderings.
//!
//! Depth-first search where every node is a copy of the domains plus the
//! ordering decisions taken so far. Each node is propagated to a fixpoint;
//! the most constrained open pair is branched on (one child per order), and
//! nodes whose lower bound cannot beat the incumbent are cut.
//!
//! The search is deterministic when run on one thread. With the `parallel`
//! feature, subtrees below a shallow frontier are explored on rayon workers
//! that share the incumbent's objective through an atomic.
//!
//! # References
//!
//! - Land & Doig (1960), "An Automatic Method of Solving Discrete
//!   Programming Problems"
//! - Carlier & Pinson (1989), "An Algorithm for Solving the Job-Shop Problem"

mod config;
mod node;
mod runner;
mod types;

pub use config::SearchConfig;
pub use node::{Incumbent, SearchNode};
pub use runner::BnbRunner;
pub use types::{Assignment, Objective, SearchResult, SearchStats, SolverStatus, Termination};
