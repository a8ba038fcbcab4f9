//! Integer variables and the domain store.

use crate::error::{CpError, Result};
use std::fmt;
use std::sync::Arc;

/// Handle to a variable in a [`DomainStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in its store.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// An integer domain `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    /// Smallest value still allowed.
    pub lo: i64,
    /// Largest value still allowed.
    pub hi: i64,
}

impl Domain {
    /// Creates a domain. Empty domains (`lo > hi`) are representable but
    /// never stored.
    pub fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    /// Whether the domain holds exactly one value.
    pub fn is_fixed(&self) -> bool {
        self.lo == self.hi
    }

    /// Whether the domain holds no value.
    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// `hi - lo`; zero for a fixed domain. Saturates at `i64::MAX`.
    pub fn width(&self) -> i64 {
        self.hi.saturating_sub(self.lo)
    }

    /// Number of values in the domain. Saturates at `i64::MAX`.
    pub fn size(&self) -> i64 {
        self.width().saturating_add(1)
    }
}

/// Owns the domain of every variable of a model.
///
/// Domains only ever shrink. The store is cloned once per search node, so
/// variable names are shared behind an `Arc` and only the bounds are copied.
///
/// # Examples
///
/// ```
/// use u_disjunct::cp::DomainStore;
///
/// let mut store = DomainStore::new();
/// let x = store.create("x", 0, 10);
/// assert!(store.tighten(x, 3, 20).unwrap());
/// assert_eq!(store.bound(x), (3, 10));
/// assert!(!store.tighten(x, 0, 10).unwrap());
/// assert!(store.tighten(x, 11, 12).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DomainStore {
    names: Arc<Vec<String>>,
    domains: Vec<Domain>,
}

impl DomainStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a variable with domain `[lo, hi]`.
    pub fn create(&mut self, name: impl Into<String>, lo: i64, hi: i64) -> VarId {
        let id = VarId(self.domains.len());
        Arc::make_mut(&mut self.names).push(name.into());
        self.domains.push(Domain::new(lo, hi));
        id
    }

    /// Current `(lo, hi)` of a variable.
    pub fn bound(&self, var: VarId) -> (i64, i64) {
        let d = self.domains[var.0];
        (d.lo, d.hi)
    }

    /// Current domain of a variable.
    pub fn domain(&self, var: VarId) -> Domain {
        self.domains[var.0]
    }

    pub fn lo(&self, var: VarId) -> i64 {
        self.domains[var.0].lo
    }

    pub fn hi(&self, var: VarId) -> i64 {
        self.domains[var.0].hi
    }

    /// Intersects the domain with `[new_lo, new_hi]`.
    ///
    /// Returns `true` when the domain actually shrank. Fails with
    /// [`CpError::DomainEmpty`] if nothing is left; the stored domain is
    /// left untouched in that case.
    pub fn tighten(&mut self, var: VarId, new_lo: i64, new_hi: i64) -> Result<bool> {
        let d = &mut self.domains[var.0];
        let lo = d.lo.max(new_lo);
        let hi = d.hi.min(new_hi);
        if lo > hi {
            return Err(CpError::DomainEmpty { var });
        }
        let changed = lo != d.lo || hi != d.hi;
        d.lo = lo;
        d.hi = hi;
        Ok(changed)
    }

    /// Raises the lower bound.
    pub fn tighten_lo(&mut self, var: VarId, new_lo: i64) -> Result<bool> {
        self.tighten(var, new_lo, i64::MAX)
    }

    /// Lowers the upper bound.
    pub fn tighten_hi(&mut self, var: VarId, new_hi: i64) -> Result<bool> {
        self.tighten(var, i64::MIN, new_hi)
    }

    /// Fixes a variable to `value`.
    pub fn fix(&mut self, var: VarId, value: i64) -> Result<bool> {
        self.tighten(var, value, value)
    }

    /// Whether the variable holds a single value.
    pub fn is_fixed(&self, var: VarId) -> bool {
        self.domains[var.0].is_fixed()
    }

    /// The value of a fixed variable.
    pub fn value(&self, var: VarId) -> Option<i64> {
        let d = self.domains[var.0];
        d.is_fixed().then_some(d.lo)
    }

    /// Whether every variable in the store is fixed.
    pub fn all_fixed(&self) -> bool {
        self.domains.iter().all(Domain::is_fixed)
    }

    pub fn width(&self, var: VarId) -> i64 {
        self.domains[var.0].width()
    }

    pub fn name(&self, var: VarId) -> &str {
        &self.names[var.0]
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Iterates over all variable handles in creation order.
    pub fn vars(&self) -> impl Iterator<Item = VarId> {
        (0..self.domains.len()).map(VarId)
    }

    /// Lower bound of every variable, indexed by [`VarId::index`].
    pub fn lower_bounds(&self) -> Vec<i64> {
        self.domains.iter().map(|d| d.lo).collect()
    }
}
