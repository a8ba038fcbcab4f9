//! Search nodes and the shared incumbent.

use super::types::Assignment;
use crate::cp::{DomainStore, PairId, PairOrder, PairOrders};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// A value snapshot of the search state: domains plus ordering decisions.
///
/// Children are built by copying the parent (copy-on-branch), so nodes are
/// never shared and can move freely between worker threads.
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub domains: DomainStore,
    pub orders: PairOrders,
    /// Number of branching decisions above this node.
    pub depth: usize,
}

impl SearchNode {
    /// The root node of a model.
    pub fn root(domains: DomainStore, orders: PairOrders) -> Self {
        Self {
            domains,
            orders,
            depth: 0,
        }
    }

    /// A child with `pair` fixed to `order`.
    pub fn child(&self, pair: PairId, order: PairOrder) -> Self {
        let mut orders = self.orders.clone();
        orders.set(pair, order);
        Self {
            domains: self.domains.clone(),
            orders,
            depth: self.depth + 1,
        }
    }
}

/// The best assignment found so far.
///
/// The objective of the incumbent doubles as an atomic upper bound so
/// workers can prune without taking the lock; the `Mutex` guards the
/// assignment itself. `i64::MAX` means "no incumbent yet".
#[derive(Debug)]
pub struct Incumbent {
    upper_bound: AtomicI64,
    best: Mutex<Option<Assignment>>,
}

impl Default for Incumbent {
    fn default() -> Self {
        Self::new()
    }
}

impl Incumbent {
    pub fn new() -> Self {
        Self {
            upper_bound: AtomicI64::new(i64::MAX),
            best: Mutex::new(None),
        }
    }

    /// Objective of the incumbent, or `i64::MAX` without one.
    pub fn upper_bound(&self) -> i64 {
        self.upper_bound.load(Ordering::Relaxed)
    }

    /// Installs `candidate` if it is strictly better than the incumbent.
    pub fn try_install(&self, candidate: Assignment) -> bool {
        if candidate.objective >= self.upper_bound() {
            return false;
        }
        let mut best = match self.best.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if best
            .as_ref()
            .is_some_and(|b| b.objective <= candidate.objective)
        {
            return false;
        }
        self.upper_bound
            .fetch_min(candidate.objective, Ordering::Relaxed);
        *best = Some(candidate);
        true
    }

    /// Takes the incumbent out.
    pub fn into_inner(self) -> Option<Assignment> {
        match self.best.into_inner() {
            Ok(best) => best,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(objective: i64) -> Assignment {
        Assignment {
            objective,
            values: vec![objective],
        }
    }

    #[test]
    fn test_child_is_a_copy() {
        let mut domains = DomainStore::new();
        let x = domains.create("x", 0, 10);
        let root = SearchNode::root(domains, PairOrders::new(2));
        let mut child = root.child(PairId(1), PairOrder::AFirst);
        child.domains.fix(x, 3).unwrap();

        assert_eq!(child.depth, 1);
        assert_eq!(child.orders.get(PairId(1)), Some(PairOrder::AFirst));
        assert_eq!(root.orders.get(PairId(1)), None);
        assert_eq!(root.domains.bound(x), (0, 10));
    }

    #[test]
    fn test_incumbent_only_improves() {
        let inc = Incumbent::new();
        assert_eq!(inc.upper_bound(), i64::MAX);
        assert!(inc.try_install(assignment(20)));
        assert!(!inc.try_install(assignment(20)));
        assert!(!inc.try_install(assignment(25)));
        assert!(inc.try_install(assignment(15)));
        assert_eq!(inc.upper_bound(), 15);
        assert_eq!(inc.into_inner().map(|a| a.objective), Some(15));
    }

    #[test]
    fn test_incumbent_concurrent() {
        let inc = Incumbent::new();
        std::thread::scope(|s| {
            for t in 0..4 {
                let inc = &inc;
                s.spawn(move || {
                    for v in (0..50).rev() {
                        inc.try_install(assignment(v * 4 + t));
                    }
                });
            }
        });
        assert_eq!(inc.upper_bound(), 0);
        assert_eq!(inc.into_inner().map(|a| a.objective), Some(0));
    }
}
