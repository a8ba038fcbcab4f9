//! Disjunctive scheduling of one- and two-stage tasks.
//!
//! Turns task records into a [`CpModel`](crate::cp::CpModel), solves it
//! with [`BnbRunner`](crate::search::BnbRunner) and reports concrete start
//! and end times.
//!
//! - **Tasks**: [`TaskSpec`] records, built into immutable [`Task`]s
//! - **Problem**: [`ScheduleProblem`]: horizon, layout, model construction
//! - **Report**: [`SolutionReport`]: status, makespan, per-task times
//! - **Validation**: [`validate_schedule`]: checks a report against the
//!   task records alone
//!
//! A two-stage task `{duration1, wait, duration2}` runs its second stage
//! exactly `wait` units after its first ends. The makespan is the latest
//! end of any task's final stage.

mod problem;
mod report;
mod task;
mod validation;

pub use problem::{ResourceLayout, ScheduleModel, ScheduleProblem};
pub use report::{ReportStatus, SolutionReport, TaskAssignment};
pub use task::{Stages, Task, TaskSpec};
pub use validation::{validate_schedule, ValidationResult, Violation, ViolationKind};
