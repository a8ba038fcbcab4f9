//! Search configuration.

use crate::error::{CpError, Result};

/// Configuration for the branch-and-bound search.
///
/// Every limit is optional; without limits the search runs until the
/// optimum is proven. Limits are checked each time a node is entered, so a
/// run may overshoot by one propagation.
///
/// # Examples
///
/// ```
/// use u_disjunct::search::SearchConfig;
///
/// let config = SearchConfig::default()
///     .with_time_limit_ms(5_000)
///     .with_node_limit(100_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Wall-clock limit in milliseconds. `None` disables it.
    pub time_limit_ms: Option<u64>,

    /// Maximum number of explored nodes. `None` disables it.
    pub node_limit: Option<u64>,

    /// Explore subtrees on rayon workers (requires the `parallel` feature;
    /// ignored otherwise).
    ///
    /// Parallel runs find the same optimal makespan but may return a
    /// different optimal assignment from run to run.
    pub parallel: bool,

    /// Depth to which the tree is expanded before subtrees are handed to
    /// workers. Only used when `parallel` is set.
    pub frontier_depth: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: None,
            node_limit: None,
            parallel: false,
            frontier_depth: 4,
        }
    }
}

impl SearchConfig {
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_frontier_depth(mut self, depth: usize) -> Self {
        self.frontier_depth = depth;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.node_limit == Some(0) {
            return Err(CpError::InvalidConfig(
                "node_limit must be positive".into(),
            ));
        }
        if self.frontier_depth > 20 {
            return Err(CpError::InvalidConfig(format!(
                "frontier_depth must be at most 20, got {}",
                self.frontier_depth
            )));
        }
        Ok(())
    }
}
