//! Identity resolution across account merges.
//!
//! A merge records an edge `absorbed -> survivor`. Resolving an id follows
//! edges until it reaches an id with no outgoing edge: the canonical id.
//! Because an id is absorbed at most once, and only into an id that is
//! canonical at that moment, the edges form chains that never cycle.
//!
//! [`IdentityResolver::resolve`] compresses the walked path so that later
//! lookups take a single hop. Compression never changes what an id
//! resolves to.

use std::collections::HashMap;

use tally_types::{AccountId, LedgerError, Result};

/// Merge-edge map with path-compressing resolution.
#[derive(Debug, Default, Clone)]
pub struct IdentityResolver {
    /// `absorbed -> absorber`. Canonical ids have no entry.
    edges: HashMap<AccountId, AccountId>,
}

impl IdentityResolver {
    /// Create a resolver with no merges recorded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }

    /// Resolve `id` to its canonical id, compressing the walked chain.
    ///
    /// An id with no edge resolves to itself whether or not an account
    /// with that id exists.
    pub fn resolve(&mut self, id: &AccountId) -> AccountId {
        let canonical = self.canonical(id);

        // Point every id on the chain straight at the canonical id.
        let mut cursor = id.clone();
        while let Some(next) = self.edges.get_mut(&cursor) {
            if *next == canonical {
                break;
            }
            let following = std::mem::replace(next, canonical.clone());
            cursor = following;
        }
        canonical
    }

    /// Resolve `id` without modifying the edge map.
    #[must_use]
    pub fn canonical(&self, id: &AccountId) -> AccountId {
        let mut current = id;
        while let Some(next) = self.edges.get(current) {
            current = next;
        }
        current.clone()
    }

    /// Whether `id` has been absorbed by a merge.
    #[must_use]
    pub fn is_absorbed(&self, id: &AccountId) -> bool {
        self.edges.contains_key(id)
    }

    /// Record that `absorbed` now lives under `survivor`.
    ///
    /// Both ids must be canonical; the ledger only calls this with freshly
    /// resolved, distinct ids.
    pub fn absorb(&mut self, absorbed: AccountId, survivor: AccountId) {
        debug_assert_ne!(absorbed, survivor, "an account cannot absorb itself");
        debug_assert!(!self.is_absorbed(&absorbed), "{absorbed} already absorbed");
        debug_assert!(!self.is_absorbed(&survivor), "{survivor} is not canonical");
        self.edges.insert(absorbed, survivor);
    }

    /// Every absorbed id paired with its current canonical id, sorted by
    /// absorbed id.
    #[must_use]
    pub fn redirects(&self) -> Vec<(AccountId, AccountId)> {
        let mut out: Vec<_> = self
            .edges
            .keys()
            .map(|absorbed| (absorbed.clone(), self.canonical(absorbed)))
            .collect();
        out.sort();
        out
    }

    /// Number of absorbed ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether no merge has happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Check that every chain terminates.
    ///
    /// # Errors
    /// Returns [`LedgerError::MergeCycle`] naming an id whose chain is
    /// longer than the number of edges (which can only happen on a cycle).
    pub fn verify(&self) -> Result<()> {
        for start in self.edges.keys() {
            let mut current = start;
            let mut hops = 0usize;
            while let Some(next) = self.edges.get(current) {
                hops += 1;
                if hops > self.edges.len() {
                    return Err(LedgerError::MergeCycle(start.clone()));
                }
                current = next;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::from(s)
    }

    #[test]
    fn unknown_id_resolves_to_itself() {
        let mut r = IdentityResolver::new();
        assert_eq!(r.resolve(&id("ghost")), id("ghost"));
        assert!(r.is_empty());
    }

    #[test]
    fn single_merge_redirects() {
        let mut r = IdentityResolver::new();
        r.absorb(id("b"), id("a"));
        assert_eq!(r.resolve(&id("b")), id("a"));
        assert_eq!(r.resolve(&id("a")), id("a"));
        assert!(r.is_absorbed(&id("b")));
        assert!(!r.is_absorbed(&id("a")));
    }

    #[test]
    fn chain_resolves_transitively_and_compresses() {
        let mut r = IdentityResolver::new();
        // d -> c -> b -> a
        r.absorb(id("b"), id("a"));
        r.absorb(id("c"), id("b"));
        r.absorb(id("d"), id("c"));

        assert_eq!(r.canonical(&id("d")), id("a"));
        assert_eq!(r.resolve(&id("d")), id("a"));

        // After compression every link on the walked chain points at `a`.
        assert_eq!(
            r.redirects(),
            vec![(id("b"), id("a")), (id("c"), id("a")), (id("d"), id("a"))]
        );
        assert_eq!(r.edges.get(&id("c")), Some(&id("a")));
        assert_eq!(r.edges.get(&id("d")), Some(&id("a")));
        assert!(r.verify().is_ok());
    }

    #[test]
    fn compression_does_not_change_results() {
        let mut r = IdentityResolver::new();
        r.absorb(id("b"), id("a"));
        r.absorb(id("c"), id("b"));
        let before: Vec<_> = ["a", "b", "c", "x"].iter().map(|s| r.canonical(&id(s))).collect();
        for s in ["c", "b", "c"] {
            r.resolve(&id(s));
        }
        let after: Vec<_> = ["a", "b", "c", "x"].iter().map(|s| r.canonical(&id(s))).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn verify_detects_cycle() {
        let mut r = IdentityResolver::new();
        r.edges.insert(id("a"), id("b"));
        r.edges.insert(id("b"), id("a"));
        assert!(matches!(r.verify(), Err(LedgerError::MergeCycle(_))));
    }
}
