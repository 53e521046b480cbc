use std::sync::Arc;

use futures::future::BoxFuture;

use pullseq_core::prelude::*;

use super::{JoinSources, Probe};

type GroupJoinFn<O, I, R> = dyn Fn(&O, &[I]) -> Result<R> + Send + Sync;

/// Exactly one result per outer element, paired with its (possibly empty)
/// group of matching inner elements in inner source order.
pub struct GroupJoin<O, I, K, R> {
    sources: JoinSources<O, I, K>,
    result: Arc<GroupJoinFn<O, I, R>>,
}

impl<O, I, K, R> GroupJoin<O, I, K, R>
where
    O: 'static,
    I: 'static,
    K: 'static,
    R: 'static,
{
    pub fn new<F>(
        outer: Seq<O>,
        inner: Seq<I>,
        outer_key: Selector<O, K>,
        inner_key: Selector<I, K>,
        result: F,
    ) -> Self
    where
        K: std::hash::Hash + Eq,
        F: Fn(&O, &[I]) -> Result<R> + Send + Sync + 'static,
    {
        Self::with_equality(outer, inner, outer_key, inner_key, result, Equality::standard())
    }

    pub fn with_equality<F>(
        outer: Seq<O>,
        inner: Seq<I>,
        outer_key: Selector<O, K>,
        inner_key: Selector<I, K>,
        result: F,
        equality: Equality<K>,
    ) -> Self
    where
        F: Fn(&O, &[I]) -> Result<R> + Send + Sync + 'static,
    {
        Self {
            sources: JoinSources {
                outer,
                inner,
                outer_key,
                inner_key,
                equality,
            },
            result: Arc::new(result),
        }
    }
}

impl<O, I, K, R> AsyncSequence for GroupJoin<O, I, K, R>
where
    O: Send + 'static,
    I: Send + 'static,
    K: Send + 'static,
    R: Send + 'static,
{
    type Item = R;

    fn begin(&self, ctx: &Context) -> Iter<R> {
        Iter::new(GroupJoinIter {
            probe: Probe::new(self.sources.clone(), ctx),
            result: Arc::clone(&self.result),
            current: None,
            state: IterState::NotStarted,
        })
    }
}

struct GroupJoinIter<O, I, K, R> {
    probe: Probe<O, I, K>,
    result: Arc<GroupJoinFn<O, I, R>>,
    current: Option<R>,
    state: IterState,
}

impl<O, I, K, R> GroupJoinIter<O, I, K, R>
where
    O: Send + 'static,
    I: Send + 'static,
    K: Send + 'static,
    R: Send,
{
    async fn step(&mut self) -> Result<bool> {
        self.current = None;
        let Some((outer, group)) = self.probe.next_outer().await? else {
            return Ok(false);
        };
        self.current = Some((self.result)(&outer, self.probe.group(group))?);
        Ok(true)
    }
}

impl<O, I, K, R> AsyncIterator for GroupJoinIter<O, I, K, R>
where
    O: Send + 'static,
    I: Send + 'static,
    K: Send + 'static,
    R: Send,
{
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
        self.probe.dispose()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::fold::to_vec;
    use crate::source::from_iter;

    fn summarize(outer: &i32, group: &[i32]) -> Result<String> {
        let joined: String = group.iter().map(|y| y.to_string()).collect();
        Ok(format!("{outer}:{joined}"))
    }

    #[test]
    fn every_outer_element_yields_once() {
        let gj = GroupJoin::new(
            from_iter(vec![0, 1, 2]),
            from_iter(vec![4, 7, 6, 2, 3, 4, 8, 9]),
            Selector::sync(|x: &i32| x % 3),
            Selector::sync(|y: &i32| y % 3),
            summarize,
        );
        let out = block_on(to_vec(&gj, &Context::new())).unwrap();
        assert_eq!(out, vec!["0:639", "1:474", "2:28"]);
    }

    #[test]
    fn unmatched_outer_gets_empty_group_in_place() {
        let gj = GroupJoin::new(
            from_iter(vec![1, 10, 2]),
            from_iter(vec![1, 2, 2]),
            Selector::sync(|x: &i32| *x),
            Selector::sync(|y: &i32| *y),
            summarize,
        );
        let out = block_on(to_vec(&gj, &Context::new())).unwrap();
        assert_eq!(out, vec!["1:1", "10:", "2:22"]);
    }

    #[test]
    fn async_key_shapes_share_the_algorithm() {
        let gj = GroupJoin::new(
            from_iter(vec![0, 1]),
            from_iter(vec![3, 4, 6]),
            Selector::future(|x: &i32| {
                let x = *x;
                async move { Ok(x % 3) }
            }),
            Selector::cancellable(|y: &i32, token: CancellationToken| {
                let y = *y;
                async move {
                    token.check()?;
                    Ok(y % 3)
                }
            }),
            summarize,
        );
        let out = block_on(to_vec(&gj, &Context::new())).unwrap();
        assert_eq!(out, vec!["0:36", "1:4"]);
    }
}
