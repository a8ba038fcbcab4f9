//! Task records and built tasks.

use crate::cp::IntervalId;
use crate::error::{CpError, Result};

/// A task as supplied by the caller.
///
/// # Examples
///
/// ```
/// use u_disjunct::schedule::TaskSpec;
///
/// let a = TaskSpec::two_stage("A", 3, 2, 2);
/// assert_eq!(a.sum_time(), 7);
///
/// let job = TaskSpec::single("J1", 4);
/// assert_eq!(job.sum_time(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskSpec {
    /// One interval on the shared unit-capacity resource.
    SingleStage {
        name: String,
        duration: i64,
        /// 1 to occupy the resource, 0 to run alongside everything else.
        resource_demand: i64,
    },

    /// Two intervals separated by an exact wait:
    /// `start2 == end1 + wait`.
    TwoStage {
        name: String,
        duration1: i64,
        wait: i64,
        duration2: i64,
    },
}

impl TaskSpec {
    /// Single-stage task occupying the resource.
    pub fn single(name: impl Into<String>, duration: i64) -> Self {
        Self::SingleStage {
            name: name.into(),
            duration,
            resource_demand: 1,
        }
    }

    /// Single-stage task with an explicit resource demand.
    pub fn single_with_demand(name: impl Into<String>, duration: i64, resource_demand: i64) -> Self {
        Self::SingleStage {
            name: name.into(),
            duration,
            resource_demand,
        }
    }

    pub fn two_stage(name: impl Into<String>, duration1: i64, wait: i64, duration2: i64) -> Self {
        Self::TwoStage {
            name: name.into(),
            duration1,
            wait,
            duration2,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TaskSpec::SingleStage { name, .. } | TaskSpec::TwoStage { name, .. } => name,
        }
    }

    /// Time from the first start to the last end when nothing interferes.
    /// Saturates at `i64::MAX`.
    pub fn sum_time(&self) -> i64 {
        match self {
            TaskSpec::SingleStage { duration, .. } => *duration,
            TaskSpec::TwoStage {
                duration1,
                wait,
                duration2,
                ..
            } => duration1.saturating_add(*wait).saturating_add(*duration2),
        }
    }

    /// [`sum_time`](Self::sum_time), or `None` when it overflows `i64`.
    pub(crate) fn checked_sum_time(&self) -> Option<i64> {
        match self {
            TaskSpec::SingleStage { duration, .. } => Some(*duration),
            TaskSpec::TwoStage {
                duration1,
                wait,
                duration2,
                ..
            } => duration1.checked_add(*wait)?.checked_add(*duration2),
        }
    }

    /// Whether the first stage takes part in a no-overlap group.
    pub fn uses_resource(&self) -> bool {
        match self {
            TaskSpec::SingleStage {
                resource_demand, ..
            } => *resource_demand > 0,
            TaskSpec::TwoStage { .. } => true,
        }
    }

    pub fn is_two_stage(&self) -> bool {
        matches!(self, TaskSpec::TwoStage { .. })
    }

    /// Rejects negative durations and waits, and demands above 1.
    pub fn validate(&self) -> Result<()> {
        let negative = |name: String, duration: i64| {
            if duration < 0 {
                Err(CpError::InvalidDuration { name, duration })
            } else {
                Ok(())
            }
        };
        match self {
            TaskSpec::SingleStage {
                name,
                duration,
                resource_demand,
            } => {
                negative(name.clone(), *duration)?;
                if !(0..=1).contains(resource_demand) {
                    return Err(CpError::InvalidDemand {
                        name: name.clone(),
                        demand: *resource_demand,
                    });
                }
            }
            TaskSpec::TwoStage {
                name,
                duration1,
                wait,
                duration2,
            } => {
                negative(name.clone(), *duration1)?;
                negative(format!("{name} (wait)"), *wait)?;
                negative(name.clone(), *duration2)?;
            }
        }
        Ok(())
    }
}

/// Intervals of a built task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stages {
    Single(IntervalId),
    Two { first: IntervalId, second: IntervalId },
}

/// A task with its intervals attached.
///
/// Built once during model construction and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    spec: TaskSpec,
    stages: Stages,
}

impl Task {
    pub(crate) fn new(spec: TaskSpec, stages: Stages) -> Self {
        Self { spec, stages }
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    pub fn stages(&self) -> Stages {
        self.stages
    }

    pub fn first_stage(&self) -> IntervalId {
        match self.stages {
            Stages::Single(iv) => iv,
            Stages::Two { first, .. } => first,
        }
    }

    /// The stage whose end counts towards the makespan.
    pub fn final_stage(&self) -> IntervalId {
        match self.stages {
            Stages::Single(iv) => iv,
            Stages::Two { second, .. } => second,
        }
    }

    pub fn second_stage(&self) -> Option<IntervalId> {
        match self.stages {
            Stages::Single(_) => None,
            Stages::Two { second, .. } => Some(second),
        }
    }
}
