//! Cached - lazy recomputation behind a validity bit
//!
//! Mutations that could change a derived value call `invalidate()`; the
//! next read runs the recompute closure once and clears the bit. Eager
//! recomputation on every mutation is deliberately avoided (HP changes
//! arrive every tick).

/// A cached value guarded by a dirty flag
#[derive(Debug, Clone)]
pub struct Cached<T> {
    value: T,
    dirty: bool,
}

impl<T> Cached<T> {
    /// Start dirty: the first read recomputes
    pub fn new(value: T) -> Self {
        Cached { value, dirty: true }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the value stale; the next read recomputes
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Read, recomputing via `recompute` first if the value is stale
    pub fn get_or_recompute(&mut self, recompute: impl FnOnce(&mut T)) -> &T {
        if self.dirty {
            recompute(&mut self.value);
            self.dirty = false;
        }
        &self.value
    }

    /// Read without validity checking (display paths that tolerate
    /// staleness)
    pub fn peek(&self) -> &T {
        &self.value
    }

    /// Mutable access for the recompute pipeline itself
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl<T: Default> Default for Cached<T> {
    fn default() -> Self {
        Cached::new(T::default())
    }
}
