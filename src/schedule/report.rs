//! Solution reporting.

use super::problem::ScheduleModel;
use crate::search::{SearchResult, SearchStats, SolverStatus};
use std::fmt;

/// Outcome of a solve, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ReportStatus {
    /// The makespan is proven minimal.
    Optimal,
    /// Best schedule found before the budget ran out.
    Feasible,
    /// No schedule exists.
    Infeasible,
    /// The budget ran out before any schedule was found.
    Unknown,
}

impl From<SolverStatus> for ReportStatus {
    fn from(status: SolverStatus) -> Self {
        match status {
            SolverStatus::Optimal => ReportStatus::Optimal,
            SolverStatus::Feasible => ReportStatus::Feasible,
            SolverStatus::Infeasible => ReportStatus::Infeasible,
            SolverStatus::Unknown => ReportStatus::Unknown,
        }
    }
}

/// Concrete times of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskAssignment {
    pub task_name: String,
    pub start1: i64,
    pub end1: i64,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub start2: Option<i64>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub end2: Option<i64>,
}

/// The schedule handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolutionReport {
    pub status: ReportStatus,
    /// Makespan of the reported schedule.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub makespan: Option<i64>,
    /// One entry per task, in input order. Empty without a schedule.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub assignments: Vec<TaskAssignment>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub stats: SearchStats,
}

impl SolutionReport {
    /// Report for a problem without any schedule.
    pub fn infeasible() -> Self {
        Self {
            status: ReportStatus::Infeasible,
            makespan: None,
            assignments: Vec::new(),
            stats: SearchStats::default(),
        }
    }

    /// Extracts the task times of the best assignment of `result`.
    pub fn from_search(model: &ScheduleModel, result: &SearchResult) -> Self {
        let status = ReportStatus::from(result.status);
        let Some(best) = result.best.as_ref() else {
            return Self {
                status,
                makespan: None,
                assignments: Vec::new(),
                stats: result.stats,
            };
        };

        let assignments = model
            .tasks
            .iter()
            .map(|task| {
                let first = model.model.intervals.get(task.first_stage());
                let second = task.second_stage().map(|id| model.model.intervals.get(id));
                TaskAssignment {
                    task_name: task.name().to_string(),
                    start1: best.value(first.start),
                    end1: best.value(first.end),
                    start2: second.map(|iv| best.value(iv.start)),
                    end2: second.map(|iv| best.value(iv.end)),
                }
            })
            .collect();

        Self {
            status,
            makespan: Some(best.value(model.makespan)),
            assignments,
            stats: result.stats,
        }
    }

    /// Whether the report carries a schedule.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, ReportStatus::Optimal | ReportStatus::Feasible)
    }

    /// Times of the task called `name`.
    pub fn assignment(&self, name: &str) -> Option<&TaskAssignment> {
        self.assignments.iter().find(|a| a.task_name == name)
    }
}

impl fmt::Display for TaskAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.task_name, self.start1, self.end1)?;
        if let (Some(start2), Some(end2)) = (self.start2, self.end2) {
            write!(f, ", {start2} - {end2}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.makespan {
            Some(makespan) if self.is_solution_found() => {
                writeln!(f, "Objective value = {makespan}")?;
                for assignment in &self.assignments {
                    writeln!(f, "{assignment}")?;
                }
                Ok(())
            }
            _ => writeln!(f, "No solution found."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{ScheduleProblem, TaskSpec};
    use crate::search::SearchConfig;

    fn sample() -> SolutionReport {
        SolutionReport {
            status: ReportStatus::Optimal,
            makespan: Some(7),
            assignments: vec![
                TaskAssignment {
                    task_name: "A".into(),
                    start1: 0,
                    end1: 2,
                    start2: Some(3),
                    end2: Some(6),
                },
                TaskAssignment {
                    task_name: "J".into(),
                    start1: 2,
                    end1: 7,
                    start2: None,
                    end2: None,
                },
            ],
            stats: SearchStats::default(),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            sample().to_string(),
            "Objective value = 7\nA: 0 - 2, 3 - 6\nJ: 2 - 7\n"
        );
        assert_eq!(SolutionReport::infeasible().to_string(), "No solution found.\n");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ReportStatus::from(SolverStatus::Optimal), ReportStatus::Optimal);
        assert_eq!(ReportStatus::from(SolverStatus::Unknown), ReportStatus::Unknown);
        assert!(!SolutionReport::infeasible().is_solution_found());
    }

    #[test]
    fn test_from_search() {
        let problem = ScheduleProblem::new(vec![
            TaskSpec::two_stage("A", 2, 1, 3),
            TaskSpec::single("J", 4),
        ]);
        let report = problem.solve(&SearchConfig::default()).unwrap();

        assert_eq!(report.assignments.len(), 2);
        assert_eq!(report.assignments[0].task_name, "A");
        let a = report.assignment("A").unwrap();
        assert_eq!(a.end1, a.start1 + 2);
        assert_eq!(a.start2, Some(a.end1 + 1));
        assert_eq!(a.end2, a.start2.map(|s| s + 3));
        assert!(report.assignment("J").unwrap().end2.is_none());
        assert!(report.stats.nodes > 0);
        assert!(report.assignment("missing").is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["status"], "OPTIMAL");
        assert_eq!(json["makespan"], 7);
        assert_eq!(json["assignments"][0]["start2"], 3);
        assert!(json["assignments"][1].get("start2").is_none());

        let json = serde_json::to_value(SolutionReport::infeasible()).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "INFEASIBLE" }));

        let back: SolutionReport = serde_json::from_value(serde_json::to_value(sample()).unwrap()).unwrap();
        assert_eq!(back.assignments, sample().assignments);
    }
}
