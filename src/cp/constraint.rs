//! Constraint store: offsets, precedences and no-overlap groups.

use super::interval::{IntervalId, IntervalRegistry};
use super::variables::{DomainStore, VarId};
use crate::error::{CpError, Result};

/// Handle to a posted constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub(crate) usize);

impl ConstraintId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to an unordered pair of intervals sharing a no-overlap group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairId(pub(crate) usize);

impl PairId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The variables of an interval, copied into the constraints that use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub interval: IntervalId,
    pub start: VarId,
    pub end: VarId,
    pub duration: i64,
}

/// Two intervals of a no-overlap group that must be ordered one way or the
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisjunctivePair {
    pub a: Member,
    pub b: Member,
    /// The no-overlap constraint the pair belongs to.
    pub constraint: ConstraintId,
}

impl DisjunctivePair {
    /// `(first, second)` under the given order.
    pub fn ordered(&self, order: PairOrder) -> (Member, Member) {
        match order {
            PairOrder::AFirst => (self.a, self.b),
            PairOrder::BFirst => (self.b, self.a),
        }
    }
}

/// Ordering decision for a [`DisjunctivePair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairOrder {
    /// `a.end <= b.start`
    AFirst,
    /// `b.end <= a.start`
    BFirst,
}

impl PairOrder {
    pub fn reverse(self) -> Self {
        match self {
            PairOrder::AFirst => PairOrder::BFirst,
            PairOrder::BFirst => PairOrder::AFirst,
        }
    }
}

/// Ordering state of every disjunctive pair of a model.
///
/// Part of each search node, next to the domain snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairOrders {
    orders: Vec<Option<PairOrder>>,
}

impl PairOrders {
    /// All `n` pairs undecided.
    pub fn new(n: usize) -> Self {
        Self {
            orders: vec![None; n],
        }
    }

    pub fn get(&self, pair: PairId) -> Option<PairOrder> {
        self.orders[pair.0]
    }

    pub fn set(&mut self, pair: PairId, order: PairOrder) {
        self.orders[pair.0] = Some(order);
    }

    /// Number of pairs with a decision.
    pub fn decided(&self) -> usize {
        self.orders.iter().filter(|o| o.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// A constraint over the variables of a [`DomainStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `b == a + k`
    ///
    /// Links interval start and end, and the two stages of a task.
    Offset { a: VarId, b: VarId, k: i64 },

    /// `b >= a + k`
    Precedence { a: VarId, b: VarId, k: i64 },

    /// No two member intervals may overlap in time.
    NoOverlap {
        members: Vec<Member>,
        /// Pairs of this group, as a contiguous range of [`PairId`]s.
        pairs: std::ops::Range<usize>,
    },
}

impl Constraint {
    /// Variables the constraint reads.
    pub fn scope(&self) -> Vec<VarId> {
        match self {
            Constraint::Offset { a, b, .. } | Constraint::Precedence { a, b, .. } => vec![*a, *b],
            Constraint::NoOverlap { members, .. } => members
                .iter()
                .flat_map(|m| [m.start, m.end])
                .collect(),
        }
    }

    /// Whether one application of the rule reaches the constraint's own
    /// fixpoint.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Constraint::NoOverlap { .. })
    }
}

/// Holds the constraints of a model and the variable → constraint watch
/// lists the propagator schedules from.
///
/// The store is read-only during search: branching decisions live in
/// [`PairOrders`], not in new constraints.
#[derive(Debug, Clone, Default)]
pub struct ConstraintStore {
    constraints: Vec<Constraint>,
    pairs: Vec<DisjunctivePair>,
    watchers: Vec<Vec<ConstraintId>>,
}

impl ConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts `b == a + k`.
    ///
    /// Fails with [`CpError::Unsatisfiable`] when `[a.lo + k, a.hi + k]`
    /// misses `b`'s domain entirely.
    pub fn post_offset(
        &mut self,
        domains: &DomainStore,
        a: VarId,
        b: VarId,
        k: i64,
    ) -> Result<ConstraintId> {
        let (alo, ahi) = domains.bound(a);
        let (blo, bhi) = domains.bound(b);
        if alo.saturating_add(k) > bhi || ahi.saturating_add(k) < blo {
            return Err(CpError::Unsatisfiable(format!(
                "{} == {} + {k} cannot hold within [{blo}, {bhi}]",
                domains.name(b),
                domains.name(a),
            )));
        }
        Ok(self.push(Constraint::Offset { a, b, k }))
    }

    /// Posts `b >= a + k`.
    pub fn post_precedence(
        &mut self,
        domains: &DomainStore,
        a: VarId,
        b: VarId,
        k: i64,
    ) -> Result<ConstraintId> {
        if domains.lo(a).saturating_add(k) > domains.hi(b) {
            return Err(CpError::Unsatisfiable(format!(
                "{} >= {} + {k} cannot hold",
                domains.name(b),
                domains.name(a),
            )));
        }
        Ok(self.push(Constraint::Precedence { a, b, k }))
    }

    /// Posts a no-overlap constraint over `intervals`.
    ///
    /// Intervals listed twice are kept once. Fails with
    /// [`CpError::Unsatisfiable`] when the total duration cannot fit between
    /// the earliest start and the latest end of the group.
    pub fn post_no_overlap(
        &mut self,
        domains: &DomainStore,
        registry: &IntervalRegistry,
        intervals: &[IntervalId],
    ) -> Result<ConstraintId> {
        let mut members: Vec<Member> = Vec::with_capacity(intervals.len());
        for &id in intervals {
            if members.iter().any(|m| m.interval == id) {
                continue;
            }
            let iv = registry.get(id);
            members.push(Member {
                interval: id,
                start: iv.start,
                end: iv.end,
                duration: iv.duration,
            });
        }

        if members.len() > 1 {
            let earliest = members.iter().map(|m| domains.lo(m.start)).min();
            let latest = members.iter().map(|m| domains.hi(m.end)).max();
            if let (Some(earliest), Some(latest)) = (earliest, latest) {
                let available = latest.saturating_sub(earliest);
                let total = members
                    .iter()
                    .try_fold(0i64, |acc, m| acc.checked_add(m.duration));
                if total.is_none_or(|total| total > available) {
                    return Err(CpError::Unsatisfiable(format!(
                        "no-overlap group needs {} time units but only {available} are available",
                        total.map_or_else(|| "more than i64::MAX".to_string(), |t| t.to_string()),
                    )));
                }
            }
        }

        let id = ConstraintId(self.constraints.len());
        let first_pair = self.pairs.len();
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                self.pairs.push(DisjunctivePair {
                    a: members[i],
                    b: members[j],
                    constraint: id,
                });
            }
        }
        let pairs = first_pair..self.pairs.len();
        Ok(self.push(Constraint::NoOverlap { members, pairs }))
    }

    fn push(&mut self, constraint: Constraint) -> ConstraintId {
        let id = ConstraintId(self.constraints.len());
        for var in constraint.scope() {
            if self.watchers.len() <= var.0 {
                self.watchers.resize_with(var.0 + 1, Vec::new);
            }
            let list = &mut self.watchers[var.0];
            if list.last() != Some(&id) {
                list.push(id);
            }
        }
        self.constraints.push(constraint);
        id
    }

    pub fn get(&self, id: ConstraintId) -> &Constraint {
        &self.constraints[id.0]
    }

    /// Constraints that read `var`.
    pub fn watchers(&self, var: VarId) -> &[ConstraintId] {
        self.watchers.get(var.0).map_or(&[], Vec::as_slice)
    }

    pub fn pair(&self, id: PairId) -> &DisjunctivePair {
        &self.pairs[id.0]
    }

    /// All disjunctive pairs, indexed by [`PairId`].
    pub fn pairs(&self) -> &[DisjunctivePair] {
        &self.pairs
    }

    /// Fresh ordering state with every pair undecided.
    pub fn initial_orders(&self) -> PairOrders {
        PairOrders::new(self.pairs.len())
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConstraintId, &Constraint)> {
        self.constraints
            .iter()
            .enumerate()
            .map(|(i, c)| (ConstraintId(i), c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(
        domains: &mut DomainStore,
        constraints: &mut ConstraintStore,
        registry: &mut IntervalRegistry,
        name: &str,
        duration: i64,
        horizon: i64,
    ) -> IntervalId {
        let s = domains.create(format!("start_{name}"), 0, horizon);
        let e = domains.create(format!("end_{name}"), 0, horizon);
        registry
            .create_interval(domains, constraints, name, s, duration, e)
            .unwrap()
    }

    #[test]
    fn test_offset_unsatisfiable() {
        let mut domains = DomainStore::new();
        let mut store = ConstraintStore::new();
        let a = domains.create("a", 0, 5);
        let b = domains.create("b", 0, 5);
        assert!(store.post_offset(&domains, a, b, 5).is_ok());
        assert!(matches!(
            store.post_offset(&domains, a, b, 6),
            Err(CpError::Unsatisfiable(_))
        ));
        assert!(matches!(
            store.post_offset(&domains, a, b, -6),
            Err(CpError::Unsatisfiable(_))
        ));
    }

    #[test]
    fn test_precedence_unsatisfiable() {
        let mut domains = DomainStore::new();
        let mut store = ConstraintStore::new();
        let a = domains.create("a", 3, 5);
        let b = domains.create("b", 0, 5);
        assert!(store.post_precedence(&domains, a, b, 2).is_ok());
        assert!(store.post_precedence(&domains, a, b, 3).is_err());
    }

    #[test]
    fn test_no_overlap_pairs() {
        let mut domains = DomainStore::new();
        let mut store = ConstraintStore::new();
        let mut registry = IntervalRegistry::new();
        let ids: Vec<_> = (0..4)
            .map(|i| {
                interval(
                    &mut domains,
                    &mut store,
                    &mut registry,
                    &format!("op{i}"),
                    2,
                    20,
                )
            })
            .collect();

        let c = store.post_no_overlap(&domains, &registry, &ids).unwrap();
        // 4 choose 2
        assert_eq!(store.pairs().len(), 6);
        assert!(store.pairs().iter().all(|p| p.constraint == c));
        match store.get(c) {
            Constraint::NoOverlap { members, pairs } => {
                assert_eq!(members.len(), 4);
                assert_eq!(pairs.clone(), 0..6);
            }
            other => panic!("unexpected constraint {other:?}"),
        }

        // every start/end variable watches both its offset and the group
        let start0 = registry.get(ids[0]).start;
        assert_eq!(store.watchers(start0).len(), 2);
    }

    #[test]
    fn test_no_overlap_duplicates_and_singletons() {
        let mut domains = DomainStore::new();
        let mut store = ConstraintStore::new();
        let mut registry = IntervalRegistry::new();
        let a = interval(&mut domains, &mut store, &mut registry, "a", 3, 10);

        store.post_no_overlap(&domains, &registry, &[a, a]).unwrap();
        assert!(store.pairs().is_empty());
        store.post_no_overlap(&domains, &registry, &[]).unwrap();
        assert!(store.initial_orders().is_empty());
    }

    #[test]
    fn test_no_overlap_too_long() {
        let mut domains = DomainStore::new();
        let mut store = ConstraintStore::new();
        let mut registry = IntervalRegistry::new();
        let a = interval(&mut domains, &mut store, &mut registry, "a", 6, 10);
        let b = interval(&mut domains, &mut store, &mut registry, "b", 5, 10);
        assert!(matches!(
            store.post_no_overlap(&domains, &registry, &[a, b]),
            Err(CpError::Unsatisfiable(_))
        ));
    }

    #[test]
    fn test_pair_orders() {
        let mut orders = PairOrders::new(3);
        assert_eq!(orders.decided(), 0);
        orders.set(PairId(1), PairOrder::BFirst);
        assert_eq!(orders.get(PairId(1)), Some(PairOrder::BFirst));
        assert_eq!(orders.get(PairId(0)), None);
        assert_eq!(orders.decided(), 1);
        assert_eq!(PairOrder::BFirst.reverse(), PairOrder::AFirst);
    }
}
