//! Model construction from task records.

use super::report::SolutionReport;
use super::task::{Stages, Task, TaskSpec};
use crate::cp::{CpModel, IntervalId, VarId};
use crate::error::{CpError, Result};
use crate::search::{BnbRunner, Objective, SearchConfig};
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

/// How stages share the resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceLayout {
    /// Stage-1 intervals exclude each other, and so do stage-2 intervals.
    /// Single-stage tasks join the stage-1 group.
    #[default]
    PerStage,
    /// Every stage of every task uses one resource.
    Shared,
}

/// A scheduling problem: tasks, a horizon and a resource layout.
///
/// # Examples
///
/// ```
/// use u_disjunct::schedule::{ReportStatus, ScheduleProblem, TaskSpec};
/// use u_disjunct::search::SearchConfig;
///
/// let problem = ScheduleProblem::new(vec![
///     TaskSpec::two_stage("A", 3, 2, 2),
///     TaskSpec::two_stage("B", 2, 5, 4),
///     TaskSpec::two_stage("C", 7, 4, 1),
/// ]);
/// let report = problem.solve(&SearchConfig::default()).unwrap();
/// assert_eq!(report.status, ReportStatus::Optimal);
/// assert_eq!(report.makespan, Some(16));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleProblem {
    tasks: Vec<TaskSpec>,
    horizon: Option<i64>,
    layout: ResourceLayout,
}

/// The CP model of a [`ScheduleProblem`] with handles back to its tasks.
#[derive(Debug, Clone)]
pub struct ScheduleModel {
    pub model: CpModel,
    /// Built tasks, in input order.
    pub tasks: Vec<Task>,
    pub makespan: VarId,
    pub objective: Objective,
    pub horizon: i64,
}

impl ScheduleProblem {
    pub fn new(tasks: Vec<TaskSpec>) -> Self {
        Self {
            tasks,
            horizon: None,
            layout: ResourceLayout::default(),
        }
    }

    /// Caps every start and end time at `horizon`.
    pub fn with_horizon(mut self, horizon: i64) -> Self {
        self.horizon = Some(horizon);
        self
    }

    pub fn with_layout(mut self, layout: ResourceLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn layout(&self) -> ResourceLayout {
        self.layout
    }

    /// The explicit horizon, or the sum of every task's `sum_time()`.
    ///
    /// The derived horizon always admits the schedule that runs the tasks
    /// one after another. It saturates at `i64::MAX`; [`validate`](Self::validate)
    /// rejects task times whose sum does not fit.
    pub fn horizon(&self) -> i64 {
        self.horizon
            .or_else(|| self.derived_horizon())
            .unwrap_or(i64::MAX)
    }

    fn derived_horizon(&self) -> Option<i64> {
        self.tasks
            .iter()
            .try_fold(0i64, |acc, task| acc.checked_add(task.checked_sum_time()?))
    }

    /// Checks the task records and the horizon.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for task in &self.tasks {
            task.validate()?;
            if !names.insert(task.name()) {
                return Err(CpError::DuplicateTask(task.name().to_string()));
            }
        }
        match self.horizon {
            Some(h) if h < 0 => Err(CpError::InvalidHorizon(h)),
            None if self.derived_horizon().is_none() => Err(CpError::HorizonOverflow),
            _ => Ok(()),
        }
    }

    /// Builds the CP model.
    ///
    /// Input errors are returned first; [`CpError::Unsatisfiable`] means
    /// the horizon is too short for some constraint.
    pub fn build(&self) -> Result<ScheduleModel> {
        self.validate()?;
        let horizon = self.horizon();
        let mut model = CpModel::new("schedule");
        let mut tasks = Vec::with_capacity(self.tasks.len());
        let mut stage1 = Vec::new();
        let mut stage2 = Vec::new();

        for spec in &self.tasks {
            let stages = match spec {
                TaskSpec::SingleStage { name, duration, .. } => {
                    let iv = stage_interval(&mut model, name, "", *duration, horizon)?;
                    if spec.uses_resource() {
                        stage1.push(iv);
                    }
                    Stages::Single(iv)
                }
                TaskSpec::TwoStage {
                    name,
                    duration1,
                    wait,
                    duration2,
                } => {
                    let first = stage_interval(&mut model, name, "1", *duration1, horizon)?;
                    let second = stage_interval(&mut model, name, "2", *duration2, horizon)?;
                    let end1 = model.intervals.get(first).end;
                    let start2 = model.intervals.get(second).start;
                    model
                        .constraints
                        .post_offset(&model.domains, end1, start2, *wait)?;
                    stage1.push(first);
                    stage2.push(second);
                    Stages::Two { first, second }
                }
            };
            tasks.push(Task::new(spec.clone(), stages));
        }

        let groups = match self.layout {
            ResourceLayout::PerStage => vec![stage1, stage2],
            ResourceLayout::Shared => vec![stage1.into_iter().chain(stage2).collect()],
        };
        for group in groups.iter().filter(|g| g.len() > 1) {
            model
                .constraints
                .post_no_overlap(&model.domains, &model.intervals, group)?;
        }

        let makespan = model.domains.create("makespan", 0, horizon);
        let mut ends = Vec::with_capacity(tasks.len());
        for task in &tasks {
            let end = model.intervals.get(task.final_stage()).end;
            model
                .constraints
                .post_precedence(&model.domains, end, makespan, 0)?;
            ends.push(end);
        }

        debug!(
            tasks = tasks.len(),
            horizon,
            layout = ?self.layout,
            pairs = model.pair_count(),
            "schedule model built"
        );

        Ok(ScheduleModel {
            model,
            tasks,
            makespan,
            objective: Objective::MinimizeMaxEnd { makespan, ends },
            horizon,
        })
    }

    /// Builds and solves the problem.
    ///
    /// Returns an error only for malformed input or configuration; an
    /// impossible horizon yields a report with
    /// [`ReportStatus::Infeasible`](super::ReportStatus::Infeasible).
    pub fn solve(&self, config: &SearchConfig) -> Result<SolutionReport> {
        self.solve_with_cancel(config, None)
    }

    /// Like [`solve`](Self::solve), stopping early when `cancel` is raised.
    pub fn solve_with_cancel(
        &self,
        config: &SearchConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SolutionReport> {
        config.validate()?;
        let built = match self.build() {
            Ok(built) => built,
            Err(CpError::Unsatisfiable(reason)) => {
                debug!(%reason, "model unsatisfiable at construction");
                return Ok(SolutionReport::infeasible());
            }
            Err(err) => return Err(err),
        };
        let result = BnbRunner::run_validated(&built.model, &built.objective, config, cancel);
        Ok(SolutionReport::from_search(&built, &result))
    }
}

/// Creates `start{stage}_{name}`, `end{stage}_{name}` and the interval
/// `interval{stage}_{name}` over `[0, horizon]`.
fn stage_interval(
    model: &mut CpModel,
    name: &str,
    stage: &str,
    duration: i64,
    horizon: i64,
) -> Result<IntervalId> {
    let start = model.domains.create(format!("start{stage}_{name}"), 0, horizon);
    let end = model.domains.create(format!("end{stage}_{name}"), 0, horizon);
    model.intervals.create_interval(
        &model.domains,
        &mut model.constraints,
        format!("interval{stage}_{name}"),
        start,
        duration,
        end,
    )
}
