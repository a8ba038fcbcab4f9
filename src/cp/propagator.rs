//! Worklist bound propagation.
//!
//! Every constraint starts dirty. A constraint is popped, its rule tightens
//! the domains it reads, and every constraint watching a variable that
//! shrank is queued again. The loop ends when the queue is empty (fixpoint)
//! or a domain empties (contradiction). The rules only ever shrink domains,
//! so the fixpoint does not depend on the processing order.
//!
//! # References
//!
//! Bessière (2006), "Constraint Propagation", in Handbook of Constraint
//! Programming, Ch. 3.

use super::constraint::{
    Constraint, ConstraintId, ConstraintStore, Member, PairId, PairOrder, PairOrders,
};
use super::variables::{DomainStore, VarId};
use crate::error::{CpError, Result};
use std::collections::VecDeque;
use tracing::trace;

/// Counters from one propagation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Constraints processed.
    pub revisions: usize,
    /// Successful domain reductions.
    pub tightenings: usize,
    /// Disjunctive pairs whose order was forced by bounds.
    pub forced_pairs: usize,
}

/// Runs constraint propagation to a fixpoint.
pub struct Propagator;

impl Propagator {
    /// Propagates every constraint of `constraints` over `domains`.
    ///
    /// Decided pairs in `orders` are enforced; undecided pairs whose order is
    /// forced by the bounds are recorded in `orders`. Fails with
    /// [`CpError::Infeasible`] when a domain empties or a pair admits neither
    /// order. On failure `domains` and `orders` are left partially tightened
    /// and should be discarded.
    pub fn propagate(
        constraints: &ConstraintStore,
        domains: &mut DomainStore,
        orders: &mut PairOrders,
    ) -> Result<PropagationStats> {
        let mut stats = PropagationStats::default();
        let mut queue: VecDeque<ConstraintId> = constraints.iter().map(|(id, _)| id).collect();
        let mut queued = vec![true; constraints.len()];
        let mut changed: Vec<VarId> = Vec::new();

        while let Some(id) = queue.pop_front() {
            queued[id.0] = false;
            stats.revisions += 1;
            changed.clear();

            let constraint = constraints.get(id);
            let outcome = match constraint {
                Constraint::Offset { a, b, k } => revise_offset(domains, *a, *b, *k, &mut changed),
                Constraint::Precedence { a, b, k } => {
                    revise_precedence(domains, *a, *b, *k, &mut changed)
                }
                Constraint::NoOverlap { pairs, .. } => revise_no_overlap(
                    constraints,
                    domains,
                    orders,
                    pairs.clone(),
                    &mut changed,
                    &mut stats,
                ),
            };
            if let Err(err) = outcome {
                trace!(constraint = id.0, error = %err, "propagation failed");
                return Err(CpError::Infeasible);
            }

            stats.tightenings += changed.len();
            for &var in &changed {
                for &watcher in constraints.watchers(var) {
                    if watcher == id && constraint.is_idempotent() {
                        continue;
                    }
                    if !queued[watcher.0] {
                        queued[watcher.0] = true;
                        queue.push_back(watcher);
                    }
                }
            }
        }

        trace!(
            revisions = stats.revisions,
            tightenings = stats.tightenings,
            forced = stats.forced_pairs,
            "fixpoint"
        );
        Ok(stats)
    }
}

fn tighten(
    domains: &mut DomainStore,
    var: VarId,
    lo: i64,
    hi: i64,
    changed: &mut Vec<VarId>,
) -> Result<()> {
    if domains.tighten(var, lo, hi)? {
        changed.push(var);
    }
    Ok(())
}

// Shifted bounds saturate at the i64 range. A shift that leaves the range
// empties a domain on the reverse revision, so saturating never hides a
// failure.

/// `b == a + k`
fn revise_offset(
    domains: &mut DomainStore,
    a: VarId,
    b: VarId,
    k: i64,
    changed: &mut Vec<VarId>,
) -> Result<()> {
    let (alo, ahi) = domains.bound(a);
    tighten(domains, b, alo.saturating_add(k), ahi.saturating_add(k), changed)?;
    let (blo, bhi) = domains.bound(b);
    tighten(domains, a, blo.saturating_sub(k), bhi.saturating_sub(k), changed)
}

/// `b >= a + k`
fn revise_precedence(
    domains: &mut DomainStore,
    a: VarId,
    b: VarId,
    k: i64,
    changed: &mut Vec<VarId>,
) -> Result<()> {
    let alo = domains.lo(a);
    tighten(domains, b, alo.saturating_add(k), i64::MAX, changed)?;
    let bhi = domains.hi(b);
    tighten(domains, a, i64::MIN, bhi.saturating_sub(k), changed)
}

/// `first.end <= second.start`
fn enforce_order(
    domains: &mut DomainStore,
    first: Member,
    second: Member,
    changed: &mut Vec<VarId>,
) -> Result<()> {
    revise_precedence(domains, first.end, second.start, 0, changed)
}

/// Whether `first` can still end before `second` starts.
fn order_possible(domains: &DomainStore, first: Member, second: Member) -> bool {
    domains.lo(first.end) <= domains.hi(second.start)
}

/// Pairwise disjunctive reasoning over one no-overlap group.
///
/// Repeats over the group's pairs until a full sweep changes nothing, so a
/// single revision leaves the group at its own fixpoint.
fn revise_no_overlap(
    constraints: &ConstraintStore,
    domains: &mut DomainStore,
    orders: &mut PairOrders,
    pairs: std::ops::Range<usize>,
    changed: &mut Vec<VarId>,
    stats: &mut PropagationStats,
) -> Result<()> {
    loop {
        let before = changed.len();
        for index in pairs.clone() {
            let id = PairId(index);
            let pair = constraints.pair(id);
            let order = match orders.get(id) {
                Some(order) => order,
                None => {
                    let a_first = order_possible(domains, pair.a, pair.b);
                    let b_first = order_possible(domains, pair.b, pair.a);
                    let forced = match (a_first, b_first) {
                        (false, false) => return Err(CpError::Infeasible),
                        (true, false) => PairOrder::AFirst,
                        (false, true) => PairOrder::BFirst,
                        (true, true) => continue,
                    };
                    orders.set(id, forced);
                    stats.forced_pairs += 1;
                    forced
                }
            };
            let (first, second) = pair.ordered(order);
            enforce_order(domains, first, second, changed)?;
        }
        if changed.len() == before {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{IntervalId, IntervalRegistry};

    struct Fixture {
        domains: DomainStore,
        constraints: ConstraintStore,
        registry: IntervalRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                domains: DomainStore::new(),
                constraints: ConstraintStore::new(),
                registry: IntervalRegistry::new(),
            }
        }

        fn interval(&mut self, name: &str, duration: i64, horizon: i64) -> IntervalId {
            let s = self.domains.create(format!("start_{name}"), 0, horizon);
            let e = self.domains.create(format!("end_{name}"), 0, horizon);
            self.registry
                .create_interval(&self.domains, &mut self.constraints, name, s, duration, e)
                .unwrap()
        }

        fn propagate(&mut self, orders: &mut PairOrders) -> Result<PropagationStats> {
            Propagator::propagate(&self.constraints, &mut self.domains, orders)
        }
    }

    #[test]
    fn test_offset_both_directions() {
        let mut fx = Fixture::new();
        let a = fx.domains.create("a", 0, 10);
        let b = fx.domains.create("b", 0, 10);
        fx.constraints.post_offset(&fx.domains, a, b, 3).unwrap();

        let mut orders = fx.constraints.initial_orders();
        fx.propagate(&mut orders).unwrap();
        assert_eq!(fx.domains.bound(a), (0, 7));
        assert_eq!(fx.domains.bound(b), (3, 10));

        fx.domains.tighten_lo(b, 6).unwrap();
        fx.propagate(&mut orders).unwrap();
        assert_eq!(fx.domains.bound(a), (3, 7));
    }

    #[test]
    fn test_offset_chain_reaches_fixpoint() {
        let mut fx = Fixture::new();
        let x: Vec<_> = (0..4).map(|i| fx.domains.create(format!("x{i}"), 0, 20)).collect();
        for w in x.windows(2) {
            fx.constraints.post_offset(&fx.domains, w[0], w[1], 5).unwrap();
        }
        let mut orders = fx.constraints.initial_orders();
        fx.propagate(&mut orders).unwrap();
        assert_eq!(fx.domains.bound(x[0]), (0, 5));
        assert_eq!(fx.domains.bound(x[3]), (15, 20));

        fx.domains.fix(x[3], 17).unwrap();
        fx.propagate(&mut orders).unwrap();
        assert_eq!(fx.domains.value(x[0]), Some(2));
    }

    #[test]
    fn test_precedence_one_way() {
        let mut fx = Fixture::new();
        let end = fx.domains.create("end", 4, 10);
        let makespan = fx.domains.create("makespan", 0, 8);
        fx.constraints
            .post_precedence(&fx.domains, end, makespan, 0)
            .unwrap();
        let mut orders = fx.constraints.initial_orders();
        fx.propagate(&mut orders).unwrap();
        assert_eq!(fx.domains.bound(makespan), (4, 8));
        assert_eq!(fx.domains.bound(end), (4, 8));
    }

    #[test]
    fn test_no_overlap_forces_order() {
        let mut fx = Fixture::new();
        let a = fx.interval("a", 4, 10);
        let b = fx.interval("b", 3, 10);
        fx.constraints
            .post_no_overlap(&fx.domains, &fx.registry, &[a, b])
            .unwrap();

        // b must start at 0, so a cannot go first
        let b_start = fx.registry.get(b).start;
        fx.domains.fix(b_start, 0).unwrap();

        let mut orders = fx.constraints.initial_orders();
        let stats = fx.propagate(&mut orders).unwrap();
        assert_eq!(stats.forced_pairs, 1);
        assert_eq!(orders.get(PairId(0)), Some(PairOrder::BFirst));
        assert_eq!(fx.domains.lo(fx.registry.get(a).start), 3);
    }

    #[test]
    fn test_no_overlap_open_pair() {
        let mut fx = Fixture::new();
        let a = fx.interval("a", 2, 10);
        let b = fx.interval("b", 2, 10);
        fx.constraints
            .post_no_overlap(&fx.domains, &fx.registry, &[a, b])
            .unwrap();
        let mut orders = fx.constraints.initial_orders();
        let stats = fx.propagate(&mut orders).unwrap();
        assert_eq!(stats.forced_pairs, 0);
        assert_eq!(orders.get(PairId(0)), None);
    }

    #[test]
    fn test_decided_pair_is_enforced() {
        let mut fx = Fixture::new();
        let a = fx.interval("a", 2, 10);
        let b = fx.interval("b", 3, 10);
        fx.constraints
            .post_no_overlap(&fx.domains, &fx.registry, &[a, b])
            .unwrap();
        let mut orders = fx.constraints.initial_orders();
        orders.set(PairId(0), PairOrder::AFirst);
        fx.propagate(&mut orders).unwrap();

        let (a, b) = (fx.registry.get(a).clone(), fx.registry.get(b).clone());
        assert_eq!(fx.domains.bound(b.start), (2, 7));
        assert_eq!(fx.domains.bound(a.end), (2, 7));
        assert_eq!(fx.domains.bound(a.start), (0, 5));
    }

    #[test]
    fn test_no_overlap_infeasible() {
        let mut fx = Fixture::new();
        let a = fx.interval("a", 3, 10);
        let b = fx.interval("b", 3, 10);
        fx.constraints
            .post_no_overlap(&fx.domains, &fx.registry, &[a, b])
            .unwrap();
        // both must be running at time 2
        let (sa, sb) = (fx.registry.get(a).start, fx.registry.get(b).start);
        fx.domains.tighten(sa, 0, 2).unwrap();
        fx.domains.tighten(sb, 0, 2).unwrap();

        let mut orders = fx.constraints.initial_orders();
        assert_eq!(fx.propagate(&mut orders), Err(CpError::Infeasible));
    }

    #[test]
    fn test_empty_domain_is_infeasible() {
        let mut fx = Fixture::new();
        let a = fx.domains.create("a", 5, 10);
        let b = fx.domains.create("b", 0, 10);
        let c = fx.domains.create("c", 0, 3);
        fx.constraints.post_offset(&fx.domains, a, b, 0).unwrap();
        fx.constraints.post_precedence(&fx.domains, c, b, 0).unwrap();
        fx.domains.tighten_hi(b, 4).unwrap();
        let mut orders = fx.constraints.initial_orders();
        assert_eq!(fx.propagate(&mut orders), Err(CpError::Infeasible));
    }

    #[test]
    fn test_bounds_saturate_at_i64_range() {
        let mut fx = Fixture::new();
        let a = fx.domains.create("a", 0, i64::MAX);
        let b = fx.domains.create("b", 0, i64::MAX);
        fx.constraints.post_offset(&fx.domains, a, b, 5).unwrap();
        let mut orders = fx.constraints.initial_orders();
        fx.propagate(&mut orders).unwrap();
        assert_eq!(fx.domains.bound(a), (0, i64::MAX - 5));
        assert_eq!(fx.domains.bound(b), (5, i64::MAX));

        // a + 5 lies past i64::MAX for every value of a
        let mut fx = Fixture::new();
        let a = fx.domains.create("a", i64::MAX - 1, i64::MAX);
        let b = fx.domains.create("b", 0, i64::MAX);
        fx.constraints.post_precedence(&fx.domains, a, b, 5).unwrap();
        let mut orders = fx.constraints.initial_orders();
        assert_eq!(fx.propagate(&mut orders), Err(CpError::Infeasible));
    }

    #[test]
    fn test_propagation_is_idempotent() {
        let mut fx = Fixture::new();
        let ids: Vec<_> = (1..=3).map(|d| fx.interval(&format!("op{d}"), d, 9)).collect();
        fx.constraints
            .post_no_overlap(&fx.domains, &fx.registry, &ids)
            .unwrap();
        let mut orders = fx.constraints.initial_orders();
        fx.propagate(&mut orders).unwrap();
        let snapshot = fx.domains.lower_bounds();
        let stats = fx.propagate(&mut orders).unwrap();
        assert_eq!(stats.tightenings, 0);
        assert_eq!(fx.domains.lower_bounds(), snapshot);
    }
}
