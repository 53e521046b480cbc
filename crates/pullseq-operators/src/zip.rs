//! Lockstep combination of two sequences.
//!
//! Each step advances `first`, then `second`; the first exhausted side ends
//! the output, so the result is as long as the shorter input.

use std::sync::Arc;

use futures::future::BoxFuture;

use pullseq_core::prelude::*;
use pullseq_core::settle_all;

type ZipFn<A, B, R> = dyn Fn(&A, &B) -> Result<R> + Send + Sync;

pub struct Zip<A, B, R> {
    first: Seq<A>,
    second: Seq<B>,
    result: Arc<ZipFn<A, B, R>>,
}

impl<A: 'static, B: 'static, R: 'static> Zip<A, B, R> {
    pub fn new<F>(first: Seq<A>, second: Seq<B>, result: F) -> Self
    where
        F: Fn(&A, &B) -> Result<R> + Send + Sync + 'static,
    {
        Self {
            first,
            second,
            result: Arc::new(result),
        }
    }
}

impl<A, B, R> AsyncSequence for Zip<A, B, R>
where
    A: Send + 'static,
    B: Send + 'static,
    R: Send + 'static,
{
    type Item = R;

    fn begin(&self, ctx: &Context) -> Iter<R> {
        Iter::new(ZipIter {
            first: self.first.begin(ctx),
            second: self.second.begin(ctx),
            result: Arc::clone(&self.result),
            current: None,
            state: IterState::NotStarted,
        })
    }
}

struct ZipIter<A, B, R> {
    first: Iter<A>,
    second: Iter<B>,
    result: Arc<ZipFn<A, B, R>>,
    current: Option<R>,
    state: IterState,
}

impl<A: Send, B: Send, R: Send> ZipIter<A, B, R> {
    async fn step(&mut self) -> Result<bool> {
        self.current = None;
        if !self.first.advance().await? {
            return Ok(false);
        }
        if !self.second.advance().await? {
            return Ok(false);
        }
        let (Some(a), Some(b)) = (self.first.current(), self.second.current()) else {
            return Ok(false);
        };
        self.current = Some((self.result)(a, b)?);
        Ok(true)
    }
}

impl<A: Send, B: Send, R: Send> AsyncIterator for ZipIter<A, B, R> {
    type Item = R;

    fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            if !self.state.can_advance() {
                return Ok(false);
            }
            let step = self.step().await;
            self.state.settle(step)
        })
    }

    fn current(&self) -> Option<&R> {
        self.current.as_ref()
    }

    fn take_current(&mut self) -> Option<R> {
        self.current.take()
    }

    fn dispose(&mut self) -> Result<()> {
        if !self.state.begin_dispose() {
            return Ok(());
        }
        self.current = None;
        settle_all([self.first.dispose(), self.second.dispose()])
    }
}
