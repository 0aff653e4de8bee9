//! Double and triple buffering by identity rotation.
//!
//! `advance()` swaps the owning handles (`Vec` headers), never the elements,
//! so rotating even very large buffers costs the same as rotating tiny ones.

/// Two buffers, one read as "current" and one written as "next".
#[derive(Debug, Clone)]
pub struct DoubleBuffer<T> {
    current: T,
    next: T,
}

impl<T> DoubleBuffer<T> {
    /// Create from an initial current state and a scratch next buffer.
    pub fn new(current: T, next: T) -> Self {
        Self { current, next }
    }

    /// The buffer holding the latest completed state.
    #[inline]
    pub fn current(&self) -> &T {
        &self.current
    }

    /// Mutable access to the current state (for seeding or perturbation
    /// between steps).
    #[inline]
    pub fn current_mut(&mut self) -> &mut T {
        &mut self.current
    }

    /// The buffer the next step writes to.
    #[inline]
    pub fn next(&self) -> &T {
        &self.next
    }

    /// Mutable access to the next buffer.
    #[inline]
    pub fn next_mut(&mut self) -> &mut T {
        &mut self.next
    }

    /// Read-only current state together with the writable next buffer.
    #[inline]
    pub fn split_mut(&mut self) -> (&T, &mut T) {
        (&self.current, &mut self.next)
    }

    /// Make "next" the new "current".
    #[inline]
    pub fn advance(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Consume the pair, returning `(current, next)`.
    pub fn into_inner(self) -> (T, T) {
        (self.current, self.next)
    }
}

impl<T: Clone> DoubleBuffer<T> {
    /// Create a pair where both buffers start as copies of `initial`.
    pub fn from_initial(initial: T) -> Self {
        Self::new(initial.clone(), initial)
    }
}

/// Three buffers cycling previous → current → next.
///
/// Used by second-order time stepping, where the next state depends on the
/// two preceding ones.
#[derive(Debug, Clone)]
pub struct TripleBuffer<T> {
    prev: T,
    current: T,
    next: T,
}

impl<T> TripleBuffer<T> {
    /// Create from the three initial buffers.
    pub fn new(prev: T, current: T, next: T) -> Self {
        Self {
            prev,
            current,
            next,
        }
    }

    /// State one step behind current.
    #[inline]
    pub fn prev(&self) -> &T {
        &self.prev
    }

    /// The latest completed state.
    #[inline]
    pub fn current(&self) -> &T {
        &self.current
    }

    /// Mutable access to the current state.
    #[inline]
    pub fn current_mut(&mut self) -> &mut T {
        &mut self.current
    }

    /// The buffer the next step writes to.
    #[inline]
    pub fn next(&self) -> &T {
        &self.next
    }

    /// Read-only (prev, current) together with the writable next buffer.
    #[inline]
    pub fn split_mut(&mut self) -> (&T, &T, &mut T) {
        (&self.prev, &self.current, &mut self.next)
    }

    /// Rotate: prev ← current ← next, and the old prev becomes scratch.
    #[inline]
    pub fn advance(&mut self) {
        std::mem::swap(&mut self.prev, &mut self.current);
        std::mem::swap(&mut self.current, &mut self.next);
    }
}

impl<T: Clone> TripleBuffer<T> {
    /// Create three copies of `initial`.
    pub fn from_initial(initial: T) -> Self {
        Self::new(initial.clone(), initial.clone(), initial)
    }
}
