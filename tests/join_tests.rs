//! Join and GroupJoin: match order, empty groups and fault timing

mod test_data_gen;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::executor::block_on;
use pullseq::prelude::*;
use pullseq::DisposeTracker;
use test_data_gen::{faulting_key, ints};

const INNER: [i64; 8] = [4, 7, 6, 2, 3, 4, 8, 9];

fn mod3() -> Selector<i64, i64> {
    Selector::sync(|x: &i64| x % 3)
}

#[test]
fn test_join_worked_example() {
    let joined = ints(&[0, 1, 2]).join(ints(&INNER), mod3(), mod3(), |x: &i64, y: &i64| {
        Ok((*x, y.to_string()))
    });
    let rows = block_on(joined.to_vec(&Context::new())).unwrap();
    let concat = |key: i64| -> String {
        rows.iter()
            .filter(|(x, _)| *x == key)
            .map(|(_, y)| y.as_str())
            .collect()
    };
    assert_eq!(concat(0), "639");
    assert_eq!(concat(1), "474");
    assert_eq!(concat(2), "28");
}

#[test]
fn test_group_join_zero_match_keeps_position() {
    let grouped = ints(&[1, 5, 2]).group_join(
        ints(&[2, 1, 2]),
        Selector::sync(|x: &i64| *x),
        Selector::sync(|y: &i64| *y),
        |x: &i64, group: &[i64]| Ok((*x, group.to_vec())),
    );
    let rows = block_on(grouped.to_vec(&Context::new())).unwrap();
    assert_eq!(rows, vec![(1, vec![1]), (5, vec![]), (2, vec![2, 2])]);
}

#[test]
fn test_inner_key_fault_surfaces_on_first_advance() {
    let calls = Arc::new(AtomicUsize::new(0));
    let outer = DisposeTracker::new();
    let inner = DisposeTracker::new();
    let joined = outer.track(ints(&[0, 1, 2])).join(
        inner.track(ints(&INNER)),
        mod3(),
        faulting_key(9, &calls),
        |x: &i64, _: &i64| Ok(*x),
    );
    let mut it = joined.begin(&Context::new());
    let err = block_on(it.advance()).unwrap_err();
    assert_eq!(err.to_string(), "key fault at 9");
    // Outer is never started when the inner drain fails.
    assert_eq!(outer.begun(), 0);
    assert_eq!(inner.begun(), 1);
    assert!(inner.balanced());
    assert!(!block_on(it.advance()).unwrap());
    it.dispose().unwrap();
}

#[test]
fn test_outer_key_fault_keeps_earlier_results() {
    let calls = Arc::new(AtomicUsize::new(0));
    let grouped = ints(&[10, 11, 12, 13]).group_join(
        ints(&[10, 11, 12, 13]),
        faulting_key(12, &calls),
        Selector::sync(|y: &i64| *y),
        |x: &i64, _: &[i64]| Ok(*x),
    );
    let mut it = grouped.begin(&Context::new());
    let mut seen = Vec::new();
    let err = block_on(async {
        loop {
            match it.next().await {
                Ok(Some(x)) => seen.push(x),
                Ok(None) => return None,
                Err(err) => return Some(err),
            }
        }
    })
    .expect("outer key fault");
    assert_eq!(err.to_string(), "key fault at 12");
    assert_eq!(seen, vec![10, 11]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_result_selector_fault_on_nth_match() {
    let joined = ints(&[0, 1]).join(ints(&INNER), mod3(), mod3(), |_: &i64, y: &i64| {
        if *y == 7 {
            Err(Error::fault("seven"))
        } else {
            Ok(*y)
        }
    });
    let mut it = joined.begin(&Context::new());
    block_on(async {
        assert_eq!(it.next().await.unwrap(), Some(6));
        assert_eq!(it.next().await.unwrap(), Some(3));
        assert_eq!(it.next().await.unwrap(), Some(9));
        assert_eq!(it.next().await.unwrap(), Some(4));
        assert_eq!(it.next().await.unwrap_err().to_string(), "seven");
    });
}

#[test]
fn test_join_with_custom_equality() {
    let names = from_iter(vec!["ada".to_string(), "Bob".to_string()]);
    let ages = from_iter(vec![("BOB".to_string(), 41), ("ADA".to_string(), 36)]);
    let joined = names.join_with(
        ages,
        Selector::sync(|n: &String| n.clone()),
        Selector::sync(|p: &(String, i32)| p.0.clone()),
        |n: &String, p: &(String, i32)| Ok(format!("{n}={}", p.1)),
        Equality::by(|k: &String| k.to_lowercase()),
    );
    assert_eq!(
        block_on(joined.to_vec(&Context::new())).unwrap(),
        vec!["ada=36".to_string(), "Bob=41".to_string()]
    );
}

#[test]
fn test_both_sources_are_released() {
    let outer = DisposeTracker::new();
    let inner = DisposeTracker::new();
    let joined = outer.track(ints(&[0, 1, 2])).join(
        inner.track(ints(&INNER)),
        mod3(),
        mod3(),
        |x: &i64, y: &i64| Ok(x + y),
    );
    assert_eq!(block_on(joined.count(&Context::new())).unwrap(), 8);
    assert!(outer.balanced());
    assert!(inner.balanced());
}

#[test]
fn test_cancelled_before_inner_drain() {
    let outer = DisposeTracker::new();
    let inner = DisposeTracker::new();
    let token = CancellationToken::new();
    token.cancel();
    let ctx = Context::new().with_token(token);

    let joined = outer.track(ints(&[0, 1, 2])).join(
        inner.track(ints(&INNER)),
        mod3(),
        mod3(),
        |x: &i64, y: &i64| Ok(x + y),
    );
    assert!(block_on(joined.to_vec(&ctx)).unwrap_err().is_cancelled());

    let grouped = outer.track(ints(&[0, 1, 2])).group_join(
        inner.track(ints(&INNER)),
        mod3(),
        mod3(),
        |x: &i64, group: &[i64]| Ok((*x, group.len())),
    );
    assert!(block_on(grouped.to_vec(&ctx)).unwrap_err().is_cancelled());

    assert_eq!(inner.begun(), 0);
    assert_eq!(outer.begun(), 0);
}
