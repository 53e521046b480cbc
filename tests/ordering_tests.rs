//! Ordering engine: stability, composition and fault handling

mod test_data_gen;

use futures::executor::block_on;
use pullseq::prelude::*;
use pullseq::DisposeTracker;
use test_data_gen::{ints, permutation};

fn reference(mut values: Vec<i64>) -> Vec<i64> {
    values.sort_by_key(|x| (x % 2, x % 3));
    values
}

#[test]
fn test_two_clause_sort_matches_stable_reference() {
    let values = permutation(500, 7);
    let sorted = ints(&values)
        .order_by(|x: &i64| x % 2)
        .then_by(|x: &i64| x % 3);
    let out = block_on(sorted.to_vec(&Context::new())).unwrap();
    assert_eq!(out, reference(values));
}

#[test]
fn test_skip_take_after_sort() {
    let values = permutation(200, 11);
    let window = ints(&values)
        .order_by(|x: &i64| x % 2)
        .then_by(|x: &i64| x % 3)
        .skip(40)
        .take(25);
    let out = block_on(window.to_vec(&Context::new())).unwrap();
    let expected: Vec<i64> = reference(values).into_iter().skip(40).take(25).collect();
    assert_eq!(out, expected);
}

#[test]
fn test_selector_shapes_sort_identically() {
    let values = permutation(64, 3);
    let ctx = Context::new();
    let sync = ints(&values).order_by_key(
        Selector::sync(|x: &i64| x % 5),
        Comparer::natural(),
        SortDirection::Descending,
    );
    let future = ints(&values).order_by_key(
        Selector::future(|x: &i64| {
            let x = *x;
            async move { Ok(x % 5) }
        }),
        Comparer::natural(),
        SortDirection::Descending,
    );
    let cancellable = ints(&values).order_by_key(
        Selector::cancellable(|x: &i64, token: CancellationToken| {
            let x = *x;
            async move {
                token.check()?;
                Ok(x % 5)
            }
        }),
        Comparer::natural(),
        SortDirection::Descending,
    );
    let a = block_on(sync.to_vec(&ctx)).unwrap();
    assert_eq!(a, block_on(future.to_vec(&ctx)).unwrap());
    assert_eq!(a, block_on(cancellable.to_vec(&ctx)).unwrap());
}

#[test]
fn test_reiteration_is_independent() {
    let sorted = ints(&permutation(50, 5)).order_by_descending(|x: &i64| *x);
    let ctx = Context::new();
    let first = block_on(sorted.to_vec(&ctx)).unwrap();
    let second = block_on(sorted.to_vec(&ctx)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.first(), Some(&49));
}

#[test]
fn test_cancelled_before_drain_never_begins_source() {
    let tracker = DisposeTracker::new();
    let sorted = tracker.track(ints(&[3, 1, 2])).order_by(|x: &i64| *x);
    let token = CancellationToken::new();
    token.cancel();
    let ctx = Context::new().with_token(token);
    let err = block_on(sorted.to_vec(&ctx)).unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(tracker.begun(), 0);
}

#[test]
fn test_selector_awaiting_cancellation_aborts_the_drain() {
    let tracker = DisposeTracker::new();
    let token = CancellationToken::new();
    let trigger = token.clone();
    let sorted = tracker.track(ints(&[5, 4, 3])).order_by_key(
        Selector::cancellable(move |x: &i64, token: CancellationToken| {
            let x = *x;
            if x == 4 {
                trigger.cancel();
            }
            async move {
                if x == 4 {
                    token.cancelled().await;
                    token.check()?;
                }
                Ok(x)
            }
        }),
        Comparer::natural(),
        SortDirection::Ascending,
    );
    let err = block_on(sorted.to_vec(&Context::new().with_token(token))).unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(tracker.begun(), 1);
    assert!(tracker.balanced());
}

#[test]
fn test_custom_comparer_and_direction() {
    let words = from_iter(vec!["b".to_string(), "A".to_string(), "c".to_string()]);
    let sorted = words.order_by_key(
        Selector::sync(|s: &String| s.clone()),
        Comparer::new(|a: &String, b: &String| a.to_lowercase().cmp(&b.to_lowercase())),
        SortDirection::Ascending,
    );
    assert_eq!(
        block_on(sorted.to_vec(&Context::new())).unwrap(),
        vec!["A".to_string(), "b".to_string(), "c".to_string()]
    );
}
