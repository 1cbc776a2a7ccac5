//! Reusable record buffers
//!
//! A [`BufferPool`] hands out byte buffers and takes them back cleared.
//! Borrowers hold a [`PooledBuffer`], which returns itself on drop, so a
//! buffer goes back to the pool on every exit path.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default capacity of buffers created by [`BufferPool::new`]
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

type Constructor = Box<dyn Fn() -> Vec<u8> + Send + Sync>;

/// Unbounded FIFO of byte buffers.
pub struct BufferPool {
    idle: Mutex<VecDeque<Vec<u8>>>,
    constructor: Constructor,
    allocated: AtomicU64,
    borrowed: AtomicU64,
}

impl BufferPool {
    /// Pool whose fresh buffers start with [`DEFAULT_BUFFER_CAPACITY`].
    pub fn new() -> Self {
        Self::with_constructor(|| Vec::with_capacity(DEFAULT_BUFFER_CAPACITY))
    }

    /// Pool that builds fresh buffers with `constructor`.
    pub fn with_constructor<F>(constructor: F) -> Self
    where
        F: Fn() -> Vec<u8> + Send + Sync + 'static,
    {
        Self {
            idle: Mutex::new(VecDeque::new()),
            constructor: Box::new(constructor),
            allocated: AtomicU64::new(0),
            borrowed: AtomicU64::new(0),
        }
    }

    /// Shared handle for use with [`Logger::with_pool`](super::Logger::with_pool).
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Take the oldest idle buffer, or build one when the pool is empty.
    pub fn pop(&self) -> Vec<u8> {
        self.borrowed.fetch_add(1, Ordering::Relaxed);
        if let Some(buf) = self.idle.lock().pop_front() {
            return buf;
        }
        self.allocated.fetch_add(1, Ordering::Relaxed);
        let mut buf = (self.constructor)();
        buf.clear();
        buf
    }

    /// Clear `buf` and make it available to the next borrower.
    pub fn push(&self, mut buf: Vec<u8>) {
        buf.clear();
        self.idle.lock().push_back(buf);
    }

    /// Borrow a buffer that returns itself to this pool on drop.
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        PooledBuffer {
            buf: self.pop(),
            pool: Some(Arc::clone(self)),
        }
    }

    /// Buffers built by the constructor so far
    pub fn allocated(&self) -> u64 {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Total `pop` calls so far
    pub fn borrowed(&self) -> u64 {
        self.borrowed.load(Ordering::Relaxed)
    }

    /// Buffers currently waiting in the pool
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferPool")
            .field("idle", &self.idle())
            .field("allocated", &self.allocated())
            .field("borrowed", &self.borrowed())
            .finish()
    }
}

/// A buffer on loan from a [`BufferPool`], or a plain buffer owned outright.
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: Option<Arc<BufferPool>>,
}

impl PooledBuffer {
    /// A buffer with no pool behind it; dropping it frees the memory.
    pub fn unpooled(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            pool: None,
        }
    }

    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.push(std::mem::take(&mut self.buf));
        }
    }
}

impl fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.buf.len())
            .field("pooled", &self.is_pooled())
            .finish()
    }
}
