//! Middleware-style handler chains.
//!
//! A [`Pipeline`] holds an ordered list of [`Handler`]s. Running the
//! pipeline wraps a payload in an [`Invocation`] and hands it to the first
//! handler; each handler decides whether to continue the chain by calling
//! [`Invocation::next`]. Handlers therefore nest like layers: work placed
//! before `next` runs on the way in, work placed after runs on the way out.

use std::sync::Arc;

use cachekit_core::BoxError;
use parking_lot::RwLock;

/// One processing stage. Closures with the matching signature implement
/// this automatically.
pub trait Handler<T>: Send + Sync {
    fn process(&self, ctx: &mut Invocation<T>) -> Result<(), BoxError>;
}

impl<T, F> Handler<T> for F
where
    F: Fn(&mut Invocation<T>) -> Result<(), BoxError> + Send + Sync,
{
    fn process(&self, ctx: &mut Invocation<T>) -> Result<(), BoxError> {
        self(ctx)
    }
}

/// A single run through a pipeline: the payload plus a cursor over the
/// handler list captured when the run started.
pub struct Invocation<T> {
    idx: usize,
    handlers: Vec<Arc<dyn Handler<T>>>,
    /// The payload threaded through the chain. Handlers mutate it freely.
    pub data: T,
}

impl<T> Invocation<T> {
    /// Invoke the next handler in the chain. A handler that never calls
    /// `next` short-circuits the rest of the chain; calling it past the end
    /// is a no-op that returns `Ok`.
    pub fn next(&mut self) -> Result<(), BoxError> {
        if self.idx >= self.handlers.len() {
            return Ok(());
        }
        let handler = Arc::clone(&self.handlers[self.idx]);
        self.idx += 1;
        handler.process(self)
    }

    /// Consume the invocation and take the payload back.
    pub fn into_data(self) -> T {
        self.data
    }
}

/// Ordered, thread-safe handler chain.
///
/// Handlers registered while a run is in flight do not affect that run: the
/// handler list is snapshotted when the invocation is created.
pub struct Pipeline<T> {
    handlers: RwLock<Vec<Arc<dyn Handler<T>>>>,
}

impl<T> Pipeline<T> {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Append a handler. Returns `&self` so registrations chain.
    pub fn to<H>(&self, handler: H) -> &Self
    where
        H: Handler<T> + 'static,
    {
        self.handlers.write().push(Arc::new(handler));
        self
    }

    /// Wrap `data` in an invocation over the current handler list without
    /// starting it.
    pub fn create(&self, data: T) -> Invocation<T> {
        Invocation {
            idx: 0,
            handlers: self.handlers.read().iter().cloned().collect(),
            data,
        }
    }

    /// Run `data` through the chain and return the transformed payload.
    pub fn run(&self, data: T) -> Result<T, BoxError> {
        let mut invocation = self.create(data);
        invocation.next()?;
        Ok(invocation.into_data())
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl<T> Default for Pipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A pipeline is itself a handler, so chains nest: the inner pipeline runs
/// its full chain over the payload, then control returns to the outer chain.
/// The payload is handed back to the outer invocation even when the inner
/// chain fails, as the inner chain left it.
impl<T: Default + Send + Sync> Handler<T> for Pipeline<T> {
    fn process(&self, ctx: &mut Invocation<T>) -> Result<(), BoxError> {
        let mut inner = self.create(std::mem::take(&mut ctx.data));
        let result = inner.next();
        ctx.data = inner.into_data();
        result?;
        ctx.next()
    }
}
