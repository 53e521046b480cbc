//! Pluggable key ordering and key equality.

use std::cmp::Ordering;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

type CompareFn<K> = dyn Fn(&K, &K) -> Result<Ordering> + Send + Sync;

/// Total order over keys. Comparers may fault; the sort stops at the first
/// fault and reports it.
pub struct Comparer<K> {
    inner: Arc<CompareFn<K>>,
}

impl<K: 'static> Comparer<K> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&K, &K) -> Ordering + Send + Sync + 'static,
    {
        Self::try_new(move |a: &K, b: &K| Ok(f(a, b)))
    }

    pub fn try_new<F>(f: F) -> Self
    where
        F: Fn(&K, &K) -> Result<Ordering> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// The key type's own `Ord`.
    pub fn natural() -> Self
    where
        K: Ord,
    {
        Self::new(|a: &K, b: &K| a.cmp(b))
    }
}

impl<K> Comparer<K> {
    pub fn compare(&self, a: &K, b: &K) -> Result<Ordering> {
        (self.inner)(a, b)
    }
}

impl<K> Clone for Comparer<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Ord + 'static> Default for Comparer<K> {
    fn default() -> Self {
        Self::natural()
    }
}

/// Hashing plus equality for keys, used by lookups and seen-sets.
///
/// Keys that compare equal must hash equally.
pub trait KeyEquality<K>: Send + Sync {
    fn hash_key(&self, key: &K) -> u64;
    fn eq_keys(&self, a: &K, b: &K) -> bool;
}

struct StdEquality(RandomState);

impl<K: Hash + Eq> KeyEquality<K> for StdEquality {
    fn hash_key(&self, key: &K) -> u64 {
        self.0.hash_one(key)
    }

    fn eq_keys(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

struct ProjectedEquality<F> {
    project: F,
    hasher: RandomState,
}

impl<K, P, F> KeyEquality<K> for ProjectedEquality<F>
where
    F: Fn(&K) -> P + Send + Sync,
    P: Hash + Eq,
{
    fn hash_key(&self, key: &K) -> u64 {
        self.hasher.hash_one((self.project)(key))
    }

    fn eq_keys(&self, a: &K, b: &K) -> bool {
        (self.project)(a) == (self.project)(b)
    }
}

/// Shared key-equality handle.
pub struct Equality<K> {
    inner: Arc<dyn KeyEquality<K>>,
}

impl<K: 'static> Equality<K> {
    /// The key type's own `Hash` + `Eq`.
    pub fn standard() -> Self
    where
        K: Hash + Eq,
    {
        Self {
            inner: Arc::new(StdEquality(RandomState::new())),
        }
    }

    /// Compare keys through a projection, e.g. a case-folded string.
    pub fn by<P, F>(project: F) -> Self
    where
        F: Fn(&K) -> P + Send + Sync + 'static,
        P: Hash + Eq,
    {
        Self {
            inner: Arc::new(ProjectedEquality {
                project,
                hasher: RandomState::new(),
            }),
        }
    }

    pub fn custom<E>(equality: E) -> Self
    where
        E: KeyEquality<K> + 'static,
    {
        Self {
            inner: Arc::new(equality),
        }
    }
}

impl<K> Equality<K> {
    pub fn hash_key(&self, key: &K) -> u64 {
        self.inner.hash_key(key)
    }

    pub fn eq_keys(&self, a: &K, b: &K) -> bool {
        self.inner.eq_keys(a, b)
    }
}

impl<K> Clone for Equality<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Hash + Eq + 'static> Default for Equality<K> {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descending_reverses() {
        let cmp = Comparer::<i32>::natural();
        let ord = cmp.compare(&1, &2).unwrap();
        assert_eq!(SortDirection::Descending.apply(ord), Ordering::Greater);
        assert_eq!(SortDirection::Ascending.apply(ord), Ordering::Less);
    }

    #[test]
    fn projected_equality_folds_case() {
        let eq = Equality::<String>::by(|s| s.to_lowercase());
        let a = "Apple".to_string();
        let b = "aPPLE".to_string();
        assert!(eq.eq_keys(&a, &b));
        assert_eq!(eq.hash_key(&a), eq.hash_key(&b));
        assert!(!eq.eq_keys(&a, &"pear".to_string()));
    }
}
