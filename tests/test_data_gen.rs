//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pullseq::{from_iter, Error, Selector, Seq};

/// Deterministic permutation of `0..n` from a linear congruential generator.
pub fn permutation(n: usize, seed: u64) -> Vec<i64> {
    let mut state = seed;
    let mut values: Vec<i64> = (0..n as i64).collect();
    for i in (1..n).rev() {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let j = (state >> 33) as usize % (i + 1);
        values.swap(i, j);
    }
    values
}

pub fn ints(values: &[i64]) -> Seq<i64> {
    from_iter(values.to_vec())
}

/// Selector that faults on `bad` and counts how often it ran.
pub fn faulting_key(bad: i64, calls: &Arc<AtomicUsize>) -> Selector<i64, i64> {
    let calls = Arc::clone(calls);
    Selector::try_sync(move |x: &i64| {
        calls.fetch_add(1, Ordering::SeqCst);
        if *x == bad {
            Err(Error::fault(format!("key fault at {x}")))
        } else {
            Ok(*x)
        }
    })
}
