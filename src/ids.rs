//! Identifiers and handles for tween instances.
//!
//! Slots in the engine's registry are pooled; ids are not. A handle pairs
//! the slot index with the id the slot carried when the handle was created,
//! so a recycled slot invalidates every handle minted for its previous
//! occupant.

use serde::{Deserialize, Serialize};

/// Monotonic tween identity, unique for the engine's lifetime.
/// Id 0 is reserved and never allocated.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TweenId(pub u64);

impl TweenId {
    pub const NONE: TweenId = TweenId(0);
}

/// Monotonic allocator for TweenId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc(&mut self) -> TweenId {
        self.next += 1;
        TweenId(self.next)
    }
}

/// Copyable reference to a tween instance. Validity is checked against the
/// registry on every use; a stale handle degrades every operation to a
/// no-op rather than an error.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TweenHandle {
    pub(crate) slot: u32,
    pub(crate) id: TweenId,
}

impl TweenHandle {
    pub(crate) fn new(slot: u32, id: TweenId) -> Self {
        Self { slot, id }
    }

    /// A handle that no registry will ever consider valid. Returned by
    /// factories when the required target is already destroyed.
    pub fn invalid() -> Self {
        Self {
            slot: u32::MAX,
            id: TweenId::NONE,
        }
    }

    /// The unique id captured when this handle was created.
    pub fn id(&self) -> TweenId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic_and_nonzero() {
        let mut alloc = IdAllocator::new();
        let a = alloc.alloc();
        let b = alloc.alloc();
        assert_eq!(a, TweenId(1));
        assert_eq!(b, TweenId(2));
        assert_ne!(a, TweenId::NONE);
    }

    #[test]
    fn invalid_handle_uses_reserved_id() {
        assert_eq!(TweenHandle::invalid().id(), TweenId::NONE);
    }
}
