//! Terminal operations that drive a sequence to completion.
//!
//! Each one begins a single iteration, consumes it, and disposes it whatever
//! the outcome. A disposal fault is reported alongside any consumption fault.

use std::ops::Add;

use pullseq_core::prelude::*;
use pullseq_core::settle;

use crate::join::Lookup;

/// Left fold over every element.
pub async fn fold<S, A, F>(seq: &S, ctx: &Context, init: A, mut f: F) -> Result<A>
where
    S: AsyncSequence,
    S::Item: Send,
    F: FnMut(A, S::Item) -> Result<A>,
{
    let mut it = seq.begin(ctx);
    let mut acc = init;
    let outcome = loop {
        match it.next().await {
            Ok(Some(item)) => match f(acc, item) {
                Ok(next) => acc = next,
                Err(err) => break Err(err),
            },
            Ok(None) => break Ok(acc),
            Err(err) => break Err(err),
        }
    };
    settle(outcome, it.dispose())
}

pub async fn to_vec<S>(seq: &S, ctx: &Context) -> Result<Vec<S::Item>>
where
    S: AsyncSequence,
    S::Item: Send,
{
    let capacity = ctx.config().initial_capacity();
    fold(seq, ctx, Vec::with_capacity(capacity), |mut out, item| {
        out.push(item);
        Ok(out)
    })
    .await
}

pub async fn count<S>(seq: &S, ctx: &Context) -> Result<usize>
where
    S: AsyncSequence,
    S::Item: Send,
{
    let mut it = seq.begin(ctx);
    let mut n = 0usize;
    let outcome = loop {
        match it.advance().await {
            Ok(true) => n += 1,
            Ok(false) => break Ok(n),
            Err(err) => break Err(err),
        }
    };
    settle(outcome, it.dispose())
}

/// Sum of all elements; `T::default()` for an empty sequence.
pub async fn sum<S>(seq: &S, ctx: &Context) -> Result<S::Item>
where
    S: AsyncSequence,
    S::Item: Send + Default + Add<Output = S::Item>,
{
    fold(seq, ctx, S::Item::default(), |acc, item| Ok(acc + item)).await
}

/// Smallest element, `None` when the sequence is empty. Ties keep the
/// earliest element.
pub async fn min<S>(seq: &S, ctx: &Context) -> Result<Option<S::Item>>
where
    S: AsyncSequence,
    S::Item: Send + Ord,
{
    fold(seq, ctx, None, |best: Option<S::Item>, item| {
        Ok(match best {
            Some(b) if b <= item => Some(b),
            _ => Some(item),
        })
    })
    .await
}

/// Largest element, `None` when the sequence is empty. Ties keep the
/// earliest element.
pub async fn max<S>(seq: &S, ctx: &Context) -> Result<Option<S::Item>>
where
    S: AsyncSequence,
    S::Item: Send + Ord,
{
    fold(seq, ctx, None, |best: Option<S::Item>, item| {
        Ok(match best {
            Some(b) if b >= item => Some(b),
            _ => Some(item),
        })
    })
    .await
}

/// Arithmetic mean, `None` when the sequence is empty.
pub async fn average<S>(seq: &S, ctx: &Context) -> Result<Option<f64>>
where
    S: AsyncSequence,
    S::Item: Send + Into<f64>,
{
    let (total, n) = fold(seq, ctx, (0.0f64, 0usize), |(total, n), item| {
        Ok((total + item.into(), n + 1))
    })
    .await?;
    Ok((n > 0).then(|| total / n as f64))
}

/// Group every element by key into a [`Lookup`], in first-seen key order.
pub async fn to_lookup<S, K>(
    seq: &S,
    ctx: &Context,
    key: Selector<S::Item, K>,
    equality: Equality<K>,
) -> Result<Lookup<K, S::Item>>
where
    S: AsyncSequence,
    S::Item: Send,
    K: Send,
{
    let it = seq.begin(ctx);
    Lookup::build(it, &key, equality, ctx.token(), ctx.config().initial_capacity()).await
}
