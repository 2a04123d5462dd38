use super::Context;
use parking_lot::Mutex;
use std::mem;
use std::ops::{Deref, DerefMut};

/// A bounded free list of idle contexts.
///
/// Acquiring moves a context out of the list, so two in-flight requests can never share one.
#[derive(Debug)]
pub(crate) struct ContextPool {
    idle: Mutex<Vec<Context>>,
    capacity: usize,
}

impl ContextPool {
    pub(crate) fn new(capacity: usize) -> ContextPool {
        ContextPool {
            idle: Mutex::new(Vec::new()),
            capacity,
        }
    }

    pub(crate) fn acquire(&self) -> PooledContext<'_> {
        let ctx = self.idle.lock().pop().unwrap_or_default();
        PooledContext { pool: self, ctx }
    }

    fn release(&self, mut ctx: Context) {
        ctx.reset();

        let mut idle = self.idle.lock();
        if idle.len() < self.capacity {
            idle.push(ctx);
        }
    }

    #[cfg(test)]
    pub(crate) fn idle(&self) -> usize {
        self.idle.lock().len()
    }
}

/// A context on loan from a [`ContextPool`]. It goes back, reset, when dropped.
pub(crate) struct PooledContext<'p> {
    pool: &'p ContextPool,
    ctx: Context,
}

impl Deref for PooledContext<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        &self.ctx
    }
}

impl DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        self.pool.release(mem::take(&mut self.ctx));
    }
}
