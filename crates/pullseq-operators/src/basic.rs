//! One-element-at-a-time pull-through operators.
//!
//! None of these buffer: each advance pulls at most what it needs from the
//! upstream iterator, and disposal simply disposes the upstream.

use std::sync::Arc;

use futures::future::BoxFuture;

use pullseq_core::prelude::*;

type MapFn<T, R> = dyn Fn(&T) -> R + Send + Sync;

pub struct Select<T, R> {
    source: Seq<T>,
    f: Arc<MapFn<T, R>>,
}

impl<T: 'static, R: 'static> Select<T, R> {
    pub fn new<F>(source: Seq<T>, f: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        Self {
            source,
            f: Arc::new(f),
        }
    }
}

impl<T: Send + 'static, R: Send + 'static> AsyncSequence for Select<T, R> {
    type Item = R;

    fn begin(&self, ctx: &Context) -> Iter<R> {
        Iter::new(SelectIter {
            source: self.source.begin(ctx),
            f: Arc::clone(&self.f),
            current: None,
            state: IterState::NotStarted,
        })
    }
}

struct SelectIter<T, R> {
    source: Iter<T>,
    f: Arc<MapFn<T, R>>,
    current: Option<R>,
    state: IterState,
}

impl<T: Send, R: Send> AsyncIterator for SelectIter<T, R> {
    type Item = R;

    fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            if !self.state.can_advance() {
                return Ok(false);
            }
            let step = match self.source.next().await {
                Ok(Some(item)) => {
                    self.current = Some((self.f)(&item));
                    Ok(true)
                }
                Ok(None) => {
                    self.current = None;
                    Ok(false)
                }
                Err(err) => Err(err),
            };
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
        self.source.dispose()
    }
}

type PredicateFn<T> = dyn Fn(&T) -> bool + Send + Sync;

pub struct Filter<T> {
    source: Seq<T>,
    predicate: Arc<PredicateFn<T>>,
}

impl<T: 'static> Filter<T> {
    pub fn new<F>(source: Seq<T>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            source,
            predicate: Arc::new(predicate),
        }
    }
}

impl<T: Send + 'static> AsyncSequence for Filter<T> {
    type Item = T;

    fn begin(&self, ctx: &Context) -> Iter<T> {
        Iter::new(FilterIter {
            source: self.source.begin(ctx),
            predicate: Arc::clone(&self.predicate),
            current: None,
            state: IterState::NotStarted,
        })
    }
}

struct FilterIter<T> {
    source: Iter<T>,
    predicate: Arc<PredicateFn<T>>,
    current: Option<T>,
    state: IterState,
}

impl<T: Send> FilterIter<T> {
    async fn step(&mut self) -> Result<bool> {
        while let Some(item) = self.source.next().await? {
            if (self.predicate)(&item) {
                self.current = Some(item);
                return Ok(true);
            }
        }
        self.current = None;
        Ok(false)
    }
}

impl<T: Send> AsyncIterator for FilterIter<T> {
    type Item = T;

    fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            if !self.state.can_advance() {
                return Ok(false);
            }
            let step = self.step().await;
            self.state.settle(step)
        })
    }

    fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    fn dispose(&mut self) -> Result<()> {
        if !self.state.begin_dispose() {
            return Ok(());
        }
        self.current = None;
        self.source.dispose()
    }
}

/// Bounds the element window: skip `skip` elements, then yield at most `take`.
pub struct Window<T> {
    source: Seq<T>,
    skip: usize,
    take: Option<usize>,
}

impl<T> Window<T> {
    pub fn take(source: Seq<T>, count: usize) -> Self {
        Self {
            source,
            skip: 0,
            take: Some(count),
        }
    }

    pub fn skip(source: Seq<T>, count: usize) -> Self {
        Self {
            source,
            skip: count,
            take: None,
        }
    }
}

impl<T: Send + 'static> AsyncSequence for Window<T> {
    type Item = T;

    fn begin(&self, ctx: &Context) -> Iter<T> {
        Iter::new(WindowIter {
            source: self.source.begin(ctx),
            to_skip: self.skip,
            remaining: self.take,
            current: None,
            state: IterState::NotStarted,
        })
    }
}

struct WindowIter<T> {
    source: Iter<T>,
    to_skip: usize,
    remaining: Option<usize>,
    current: Option<T>,
    state: IterState,
}

impl<T: Send> WindowIter<T> {
    async fn step(&mut self) -> Result<bool> {
        self.current = None;
        if self.remaining == Some(0) {
            // Stop pulling as soon as the window is full.
            return Ok(false);
        }
        while self.to_skip > 0 {
            if !self.source.advance().await? {
                return Ok(false);
            }
            self.to_skip -= 1;
        }
        match self.source.next().await? {
            Some(item) => {
                self.current = Some(item);
                if let Some(left) = self.remaining.as_mut() {
                    *left -= 1;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<T: Send> AsyncIterator for WindowIter<T> {
    type Item = T;

    fn advance(&mut self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            if !self.state.can_advance() {
                return Ok(false);
            }
            let step = self.step().await;
            self.state.settle(step)
        })
    }

    fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    fn dispose(&mut self) -> Result<()> {
        if !self.state.begin_dispose() {
            return Ok(());
        }
        self.current = None;
        self.source.dispose()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::fold::to_vec;
    use crate::source::from_iter;

    fn collect<S: AsyncSequence>(seq: &S) -> Vec<S::Item>
    where
        S::Item: Send,
    {
        block_on(to_vec(seq, &Context::new())).unwrap()
    }

    #[test]
    fn select_then_filter() {
        let doubled = Select::new(from_iter(1..=5), |x: &i32| x * 2).into_seq();
        let big = Filter::new(doubled, |x: &i32| *x > 4);
        assert_eq!(collect(&big), vec![6, 8, 10]);
    }

    #[test]
    fn take_and_skip_bound_the_window() {
        let source = from_iter(0..10);
        assert_eq!(collect(&Window::take(source.clone(), 3)), vec![0, 1, 2]);
        assert_eq!(collect(&Window::skip(source.clone(), 7)), vec![7, 8, 9]);
        assert_eq!(collect(&Window::skip(source.clone(), 20)), Vec::<i32>::new());
        assert_eq!(collect(&Window::take(source, 0)), Vec::<i32>::new());
    }
}
