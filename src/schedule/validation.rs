//! Independent checking of a reported schedule.
//!
//! Re-derives every rule of the problem from the task records alone, without
//! touching the CP model, and reports each violation found:
//! - Missing or unknown tasks
//! - Stage lengths differing from the declared durations
//! - Waits between stages differing from the declared wait
//! - Overlapping intervals on a shared resource
//! - Times outside `[0, horizon]`
//! - A makespan different from the latest final-stage end

use super::problem::{ResourceLayout, ScheduleProblem};
use super::report::{SolutionReport, TaskAssignment};
use super::task::TaskSpec;

/// Validation result.
pub type ValidationResult = Result<(), Vec<Violation>>;

/// A broken rule in a reported schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Violation category.
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// A task has no assignment, or its stage count is wrong.
    MissingTask,
    /// An assignment names a task the problem does not have.
    UnknownTask,
    /// `end != start + duration` for some stage.
    DurationMismatch,
    /// `start2 != end1 + wait`.
    WaitMismatch,
    /// Two intervals on one resource overlap.
    Overlap,
    /// A time lies outside `[0, horizon]`.
    OutOfHorizon,
    /// The makespan is not the latest final-stage end.
    MakespanMismatch,
}

impl Violation {
    fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One occupied period, for the overlap check.
struct Occupation<'a> {
    task: &'a str,
    stage: u8,
    start: i64,
    end: i64,
}

/// Checks `report` against `problem`.
///
/// A report without a schedule is trivially valid.
pub fn validate_schedule(problem: &ScheduleProblem, report: &SolutionReport) -> ValidationResult {
    let mut violations = Vec::new();
    let Some(makespan) = report.makespan else {
        return Ok(());
    };
    let horizon = problem.horizon();

    for assignment in &report.assignments {
        if !problem
            .tasks()
            .iter()
            .any(|t| t.name() == assignment.task_name)
        {
            violations.push(Violation::new(
                ViolationKind::UnknownTask,
                format!("assignment for unknown task `{}`", assignment.task_name),
            ));
        }
    }

    let mut groups: [Vec<Occupation>; 2] = [Vec::new(), Vec::new()];
    let mut latest_end = 0;

    for spec in problem.tasks() {
        let Some(a) = report.assignment(spec.name()) else {
            violations.push(Violation::new(
                ViolationKind::MissingTask,
                format!("task `{}` has no assignment", spec.name()),
            ));
            continue;
        };

        check_stage(&mut violations, a, 1, a.start1, a.end1, horizon);
        match spec {
            TaskSpec::SingleStage { duration, .. } => {
                check_duration(&mut violations, a, 1, a.start1, a.end1, *duration);
                if a.start2.is_some() || a.end2.is_some() {
                    violations.push(Violation::new(
                        ViolationKind::MissingTask,
                        format!("single-stage task `{}` has a second stage", spec.name()),
                    ));
                }
                if spec.uses_resource() {
                    groups[0].push(Occupation {
                        task: spec.name(),
                        stage: 1,
                        start: a.start1,
                        end: a.end1,
                    });
                }
                latest_end = latest_end.max(a.end1);
            }
            TaskSpec::TwoStage {
                duration1,
                wait,
                duration2,
                ..
            } => {
                check_duration(&mut violations, a, 1, a.start1, a.end1, *duration1);
                let (Some(start2), Some(end2)) = (a.start2, a.end2) else {
                    violations.push(Violation::new(
                        ViolationKind::MissingTask,
                        format!("two-stage task `{}` lacks its second stage", spec.name()),
                    ));
                    continue;
                };
                check_stage(&mut violations, a, 2, start2, end2, horizon);
                check_duration(&mut violations, a, 2, start2, end2, *duration2);
                if a.end1.checked_add(*wait) != Some(start2) {
                    violations.push(Violation::new(
                        ViolationKind::WaitMismatch,
                        format!(
                            "`{}` starts stage 2 at {start2}, expected {} + {wait}",
                            spec.name(),
                            a.end1
                        ),
                    ));
                }
                let second_group = match problem.layout() {
                    ResourceLayout::PerStage => 1,
                    ResourceLayout::Shared => 0,
                };
                groups[0].push(Occupation {
                    task: spec.name(),
                    stage: 1,
                    start: a.start1,
                    end: a.end1,
                });
                groups[second_group].push(Occupation {
                    task: spec.name(),
                    stage: 2,
                    start: start2,
                    end: end2,
                });
                latest_end = latest_end.max(end2);
            }
        }
    }

    for group in &groups {
        for (i, x) in group.iter().enumerate() {
            for y in &group[i + 1..] {
                if !(x.end <= y.start || y.end <= x.start) {
                    violations.push(Violation::new(
                        ViolationKind::Overlap,
                        format!(
                            "`{}` stage {} [{}, {}) overlaps `{}` stage {} [{}, {})",
                            x.task, x.stage, x.start, x.end, y.task, y.stage, y.start, y.end
                        ),
                    ));
                }
            }
        }
    }

    if makespan != latest_end {
        violations.push(Violation::new(
            ViolationKind::MakespanMismatch,
            format!("makespan {makespan} but the last task ends at {latest_end}"),
        ));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn check_stage(
    violations: &mut Vec<Violation>,
    a: &TaskAssignment,
    stage: u8,
    start: i64,
    end: i64,
    horizon: i64,
) {
    if start < 0 || end > horizon {
        violations.push(Violation::new(
            ViolationKind::OutOfHorizon,
            format!(
                "`{}` stage {stage} [{start}, {end}) leaves [0, {horizon}]",
                a.task_name
            ),
        ));
    }
}

fn check_duration(
    violations: &mut Vec<Violation>,
    a: &TaskAssignment,
    stage: u8,
    start: i64,
    end: i64,
    duration: i64,
) {
    if start.checked_add(duration) != Some(end) {
        violations.push(Violation::new(
            ViolationKind::DurationMismatch,
            format!(
                "`{}` stage {stage} runs {start}..{end}, expected duration {duration}",
                a.task_name
            ),
        ));
    }
}
