//! Depth-first branch-and-bound over disjunctive orderings.

use super::config::SearchConfig;
use super::node::{Incumbent, SearchNode};
use super::types::{Assignment, Objective, SearchResult, SearchStats, SolverStatus, Termination};
use crate::cp::{ConstraintStore, CpModel, PairId, PairOrder, Propagator, VarId};
use crate::error::Result;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Phases of the search state machine.
///
/// ```text
/// Exploring ──► Propagating ──► Branching ──► Exploring (first branch)
///     │              │                          (second branch pushed)
///     ▼              ▼
/// Backtracking ◄─────┘ (failure, bound, or leaf recorded)
///     │
///     ├──► Exploring (popped node)
///     └──► Done (stack empty or budget spent)
/// ```
#[derive(Debug)]
enum SearchPhase {
    Exploring(SearchNode),
    Propagating(SearchNode),
    Branching(SearchNode, PairId),
    Backtracking,
    Done(Termination),
}

/// What settling a node (propagating it to a fixpoint) revealed.
enum Settled {
    Failed,
    Pruned,
    /// Every pair is ordered; the node was turned into an assignment.
    Leaf,
    Open(PairId),
}

/// External stopping conditions, checked on every `Exploring` transition.
struct Budget {
    start: Instant,
    time_limit: Option<Duration>,
    node_limit: Option<u64>,
    nodes: AtomicU64,
    cancel: Option<Arc<AtomicBool>>,
}

impl Budget {
    fn new(config: &SearchConfig, cancel: Option<Arc<AtomicBool>>) -> Self {
        Self {
            start: Instant::now(),
            time_limit: config.time_limit_ms.map(Duration::from_millis),
            node_limit: config.node_limit,
            nodes: AtomicU64::new(0),
            cancel,
        }
    }

    /// Counts one node and reports whether the search must stop instead.
    fn enter_node(&self) -> Option<Termination> {
        if let Some(ref flag) = self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Some(Termination::Cancelled);
            }
        }
        if let Some(limit) = self.time_limit {
            if self.start.elapsed() >= limit {
                return Some(Termination::TimeLimit);
            }
        }
        let entered = self.nodes.fetch_add(1, Ordering::Relaxed);
        if let Some(limit) = self.node_limit {
            if entered >= limit {
                return Some(Termination::NodeLimit);
            }
        }
        None
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Everything a worker reads but never changes.
struct SearchContext<'a> {
    constraints: &'a ConstraintStore,
    objective: &'a Objective,
    budget: &'a Budget,
    incumbent: &'a Incumbent,
}

impl SearchContext<'_> {
    /// Bounds the node by the incumbent before it is propagated.
    ///
    /// Returns `false` when the node cannot improve on the incumbent.
    fn apply_incumbent_bound(&self, node: &mut SearchNode) -> bool {
        let upper = self.incumbent.upper_bound();
        if upper == i64::MAX {
            return true;
        }
        if self.objective.lower_bound(&node.domains) >= upper {
            return false;
        }
        node.domains
            .tighten_hi(self.objective.var(), upper - 1)
            .is_ok()
    }

    /// Propagates `node` to a fixpoint and decides what comes next.
    fn settle(&self, node: &mut SearchNode, stats: &mut SearchStats) -> Settled {
        if Propagator::propagate(self.constraints, &mut node.domains, &mut node.orders).is_err() {
            stats.failures += 1;
            return Settled::Failed;
        }
        if self.objective.lower_bound(&node.domains) >= self.incumbent.upper_bound() {
            stats.pruned += 1;
            return Settled::Pruned;
        }
        match self.select_pair(node) {
            Some(pair) => Settled::Open(pair),
            None => {
                self.record_leaf(node, stats);
                Settled::Leaf
            }
        }
    }

    /// Most constrained open pair: smallest combined start-domain width,
    /// lowest pair id on ties.
    fn select_pair(&self, node: &SearchNode) -> Option<PairId> {
        let mut best: Option<(i64, PairId)> = None;
        for (index, pair) in self.constraints.pairs().iter().enumerate() {
            let id = PairId(index);
            if node.orders.get(id).is_some() {
                continue;
            }
            let width = node
                .domains
                .width(pair.a.start)
                .saturating_add(node.domains.width(pair.b.start));
            if best.is_none_or(|(w, _)| width < w) {
                best = Some((width, id));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Children of `node` on `pair`, in exploration order: the interval
    /// that can start earlier goes first in the first child.
    fn branch(&self, node: &SearchNode, pair: PairId) -> (SearchNode, SearchNode) {
        let p = self.constraints.pair(pair);
        let first = if node.domains.lo(p.b.start) < node.domains.lo(p.a.start) {
            PairOrder::BFirst
        } else {
            PairOrder::AFirst
        };
        (node.child(pair, first), node.child(pair, first.reverse()))
    }

    /// Fixes every variable to its lower bound and offers the result to the
    /// incumbent.
    ///
    /// With every pair ordered, the remaining constraints are difference
    /// constraints at their fixpoint, so the lower bounds are a solution.
    fn record_leaf(&self, node: &mut SearchNode, stats: &mut SearchStats) {
        for (index, lo) in node.domains.lower_bounds().into_iter().enumerate() {
            if node.domains.fix(VarId(index), lo).is_err() {
                stats.failures += 1;
                return;
            }
        }
        if Propagator::propagate(self.constraints, &mut node.domains, &mut node.orders).is_err() {
            stats.failures += 1;
            return;
        }

        stats.solutions += 1;
        let objective = node.domains.lo(self.objective.var());
        let candidate = Assignment {
            objective,
            values: node.domains.lower_bounds(),
        };
        if self.incumbent.try_install(candidate) {
            debug!(
                objective,
                nodes = stats.nodes,
                depth = node.depth,
                "new incumbent"
            );
        }
    }

    /// Runs the state machine over the subtree rooted at `root`.
    fn explore(&self, root: SearchNode, stats: &mut SearchStats) -> Termination {
        let mut stack: Vec<SearchNode> = Vec::new();
        let mut phase = SearchPhase::Exploring(root);

        loop {
            phase = match phase {
                SearchPhase::Exploring(mut node) => {
                    if let Some(reason) = self.budget.enter_node() {
                        SearchPhase::Done(reason)
                    } else {
                        stats.nodes += 1;
                        stats.max_depth = stats.max_depth.max(node.depth);
                        if self.apply_incumbent_bound(&mut node) {
                            SearchPhase::Propagating(node)
                        } else {
                            stats.pruned += 1;
                            SearchPhase::Backtracking
                        }
                    }
                }
                SearchPhase::Propagating(mut node) => match self.settle(&mut node, stats) {
                    Settled::Open(pair) => SearchPhase::Branching(node, pair),
                    Settled::Failed | Settled::Pruned | Settled::Leaf => SearchPhase::Backtracking,
                },
                SearchPhase::Branching(node, pair) => {
                    trace!(pair = pair.index(), depth = node.depth, "branch");
                    let (first, second) = self.branch(&node, pair);
                    stack.push(second);
                    SearchPhase::Exploring(first)
                }
                SearchPhase::Backtracking => match stack.pop() {
                    Some(node) => SearchPhase::Exploring(node),
                    None => SearchPhase::Done(Termination::Exhausted),
                },
                SearchPhase::Done(reason) => return reason,
            };
        }
    }
}

/// Executes the branch-and-bound search.
///
/// # Examples
///
/// ```
/// use u_disjunct::cp::CpModel;
/// use u_disjunct::search::{BnbRunner, Objective, SearchConfig, SolverStatus};
///
/// let mut model = CpModel::new("three jobs");
/// let jobs: Vec<_> = [3, 2, 4]
///     .iter()
///     .enumerate()
///     .map(|(i, &d)| model.new_interval(format!("job{i}"), 0, 10, d).unwrap())
///     .collect();
/// model.add_no_overlap(&jobs).unwrap();
///
/// let makespan = model.new_int_var("makespan", 0, 10);
/// let ends: Vec<_> = jobs.iter().map(|&j| model.intervals.get(j).end).collect();
/// for &end in &ends {
///     model.add_precedence(end, makespan, 0).unwrap();
/// }
///
/// let objective = Objective::MinimizeMaxEnd { makespan, ends };
/// let result = BnbRunner::run(&model, &objective, &SearchConfig::default()).unwrap();
/// assert_eq!(result.status, SolverStatus::Optimal);
/// assert_eq!(result.objective_value(), Some(9));
/// ```
pub struct BnbRunner;

impl BnbRunner {
    /// Runs the search to completion or until the configured budget is spent.
    pub fn run(model: &CpModel, objective: &Objective, config: &SearchConfig) -> Result<SearchResult> {
        Self::run_with_cancel(model, objective, config, None)
    }

    /// Runs the search with an optional cancellation token.
    ///
    /// If `cancel` is set to `true` while the search runs, the best
    /// assignment found so far is returned with status
    /// [`SolverStatus::Feasible`] (or [`SolverStatus::Unknown`] without one).
    pub fn run_with_cancel(
        model: &CpModel,
        objective: &Objective,
        config: &SearchConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SearchResult> {
        config.validate()?;
        Ok(Self::run_validated(model, objective, config, cancel))
    }

    /// Runs the search with a config the caller has already validated.
    pub(crate) fn run_validated(
        model: &CpModel,
        objective: &Objective,
        config: &SearchConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> SearchResult {
        let budget = Budget::new(config, cancel);
        let incumbent = Incumbent::new();
        let ctx = SearchContext {
            constraints: &model.constraints,
            objective,
            budget: &budget,
            incumbent: &incumbent,
        };
        let root = SearchNode::root(model.domains.clone(), model.constraints.initial_orders());

        debug!(
            model = %model.name,
            vars = model.var_count(),
            constraints = model.constraint_count(),
            pairs = model.pair_count(),
            "search started"
        );

        let mut stats = SearchStats::default();
        let termination = if config.parallel {
            explore_parallel(&ctx, root, config.frontier_depth, &mut stats)
        } else {
            ctx.explore(root, &mut stats)
        };
        stats.elapsed_ms = budget.elapsed_ms();

        let best = incumbent.into_inner();
        let status = match (termination, best.is_some()) {
            (Termination::Exhausted, true) => SolverStatus::Optimal,
            (Termination::Exhausted, false) => SolverStatus::Infeasible,
            (_, true) => SolverStatus::Feasible,
            (_, false) => SolverStatus::Unknown,
        };

        info!(
            model = %model.name,
            status = ?status,
            termination = ?termination,
            objective = ?best.as_ref().map(|a| a.objective),
            nodes = stats.nodes,
            failures = stats.failures,
            elapsed_ms = stats.elapsed_ms,
            "search finished"
        );

        SearchResult {
            status,
            best,
            termination,
            stats,
        }
    }
}

/// Expands the tree breadth-first to `depth` levels and explores the
/// resulting subtrees on rayon workers that share the incumbent.
#[cfg(feature = "parallel")]
fn explore_parallel(
    ctx: &SearchContext<'_>,
    root: SearchNode,
    depth: usize,
    stats: &mut SearchStats,
) -> Termination {
    use rayon::prelude::*;

    let mut frontier = vec![root];
    for _ in 0..depth {
        let mut next = Vec::with_capacity(frontier.len() * 2);
        for mut node in frontier {
            if let Some(reason) = ctx.budget.enter_node() {
                return reason;
            }
            stats.nodes += 1;
            stats.max_depth = stats.max_depth.max(node.depth);
            if !ctx.apply_incumbent_bound(&mut node) {
                stats.pruned += 1;
                continue;
            }
            if let Settled::Open(pair) = ctx.settle(&mut node, stats) {
                let (first, second) = ctx.branch(&node, pair);
                next.push(first);
                next.push(second);
            }
        }
        frontier = next;
        if frontier.is_empty() {
            return Termination::Exhausted;
        }
    }

    debug!(subtrees = frontier.len(), "parallel exploration");
    let outcomes: Vec<(Termination, SearchStats)> = frontier
        .into_par_iter()
        .map(|node| {
            let mut local = SearchStats::default();
            let reason = ctx.explore(node, &mut local);
            (reason, local)
        })
        .collect();

    let mut termination = Termination::Exhausted;
    for (reason, local) in &outcomes {
        stats.merge(local);
        if termination == Termination::Exhausted {
            termination = *reason;
        }
    }
    termination
}

#[cfg(not(feature = "parallel"))]
fn explore_parallel(
    ctx: &SearchContext<'_>,
    root: SearchNode,
    _depth: usize,
    stats: &mut SearchStats,
) -> Termination {
    debug!("built without the `parallel` feature; searching sequentially");
    ctx.explore(root, stats)
}
