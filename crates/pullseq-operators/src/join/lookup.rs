//! Key → elements multimap built by draining a sequence.
//!
//! Groups keep first-seen key order and elements keep source order inside
//! each group. Keys are matched through an [`Equality`], so lookups work with
//! projected or custom key equality, not only `Hash + Eq`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use pullseq_core::prelude::*;
use pullseq_core::settle;

/// One key and every element that mapped to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping<K, T> {
    pub key: K,
    pub elements: Vec<T>,
}

pub struct Lookup<K, T> {
    groups: Vec<Grouping<K, T>>,
    /// key hash → indices into `groups`
    index: HashMap<u64, Vec<usize>>,
    equality: Equality<K>,
}

impl<K, T> Lookup<K, T> {
    pub fn new(equality: Equality<K>) -> Self {
        Self::with_capacity(equality, 0)
    }

    pub fn with_capacity(equality: Equality<K>, capacity: usize) -> Self {
        Self {
            groups: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            equality,
        }
    }

    /// Index of the group for `key`, if any.
    pub fn find(&self, key: &K) -> Option<usize> {
        let hash = self.equality.hash_key(key);
        self.index
            .get(&hash)?
            .iter()
            .copied()
            .find(|&i| self.equality.eq_keys(&self.groups[i].key, key))
    }

    pub fn push(&mut self, key: K, item: T) {
        match self.find(&key) {
            Some(i) => self.groups[i].elements.push(item),
            None => {
                let hash = self.equality.hash_key(&key);
                self.index.entry(hash).or_default().push(self.groups.len());
                self.groups.push(Grouping {
                    key,
                    elements: vec![item],
                });
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&Grouping<K, T>> {
        self.groups.get(index)
    }

    /// Elements for `key`; empty when the key is absent.
    pub fn elements(&self, key: &K) -> &[T] {
        match self.find(key) {
            Some(i) => &self.groups[i].elements,
            None => &[],
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of elements across all groups.
    pub fn element_count(&self) -> usize {
        self.groups.iter().map(|g| g.elements.len()).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Grouping<K, T>> {
        self.groups.iter()
    }

    pub fn into_groups(self) -> Vec<Grouping<K, T>> {
        self.groups
    }
}

impl<K: Send, T: Send> Lookup<K, T> {
    /// Drain `it` into a lookup keyed by `key`, then dispose it. The token is
    /// checked before each element is pulled.
    pub async fn build(
        mut it: Iter<T>,
        key: &Selector<T, K>,
        equality: Equality<K>,
        token: &CancellationToken,
        capacity: usize,
    ) -> Result<Self> {
        let mut lookup = Self::with_capacity(equality, capacity);
        let outcome = lookup.extend_from(&mut it, key, token).await;
        settle(outcome, it.dispose())?;
        Ok(lookup)
    }

    async fn extend_from(
        &mut self,
        it: &mut Iter<T>,
        key: &Selector<T, K>,
        token: &CancellationToken,
    ) -> Result<()> {
        loop {
            token.check()?;
            let Some(item) = it.next().await? else {
                return Ok(());
            };
            let pending = key.evaluate(&item, token);
            let k = pending.await?;
            self.push(k, item);
        }
    }
}

impl<K, T> IntoIterator for Lookup<K, T> {
    type Item = Grouping<K, T>;
    type IntoIter = std::vec::IntoIter<Grouping<K, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

impl<'a, K, T> IntoIterator for &'a Lookup<K, T> {
    type Item = &'a Grouping<K, T>;
    type IntoIter = std::slice::Iter<'a, Grouping<K, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

impl<K: std::fmt::Debug, T: std::fmt::Debug> std::fmt::Debug for Lookup<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.groups.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::source::from_iter;

    #[test]
    fn groups_keep_first_seen_order() {
        let mut lookup = Lookup::new(Equality::standard());
        for (k, v) in [("b", 1), ("a", 2), ("b", 3), ("c", 4), ("a", 5)] {
            lookup.push(k, v);
        }
        let keys: Vec<&str> = lookup.iter().map(|g| g.key).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(lookup.elements(&"a"), &[2, 5]);
        assert!(lookup.elements(&"z").is_empty());
        assert_eq!(lookup.element_count(), 5);
    }

    #[test]
    fn custom_equality_merges_keys() {
        let mut lookup = Lookup::new(Equality::by(|k: &i32| k.rem_euclid(3)));
        lookup.push(1, "one");
        lookup.push(4, "four");
        lookup.push(2, "two");
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.elements(&7), &["one", "four"]);
    }

    #[test]
    fn build_disposes_source_and_reports_key_faults() {
        let seq = from_iter(vec![1, 2, 3]);
        let key = Selector::try_sync(|x: &i32| {
            if *x == 3 {
                Err(Error::fault("bad key"))
            } else {
                Ok(*x)
            }
        });
        let token = CancellationToken::new();
        let it = seq.begin(&Context::new());
        let err = block_on(Lookup::build(it, &key, Equality::standard(), &token, 4)).unwrap_err();
        assert_eq!(err.to_string(), "bad key");
    }

    #[test]
    fn grouping_serializes() {
        let g = Grouping {
            key: "k",
            elements: vec![1, 2],
        };
        assert_eq!(serde_json::to_string(&g).unwrap(), r#"{"key":"k","elements":[1,2]}"#);
    }
}
