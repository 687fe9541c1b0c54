//! Type-safe identifiers.
//!
//! Newtype wrappers keep command ids, bus subscriptions and controller
//! handler registrations from being mixed up at compile time.
//!
//! | Type | Scope | Allocation |
//! |------|-------|------------|
//! | [`CommandId`] | One transport | Counter starting at 1, never reused |
//! | [`SubscriptionId`] | One topic bus | Counter, opaque to callers |
//! | [`HandlerId`] | One domain controller | Counter, opaque to callers |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// CommandId
// ============================================================================

/// Identifier of a command frame, echoed back by the peer in its reply.
///
/// Serialized as a bare JSON integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(u64);

impl CommandId {
    /// Wraps a raw id.
    ///
    /// Returns `None` for 0, which the allocator never hands out.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Option<Self> {
        if id == 0 { None } else { Some(Self(id)) }
    }

    /// Returns the raw integer.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the reply topic for this command: `response:<id>`.
    #[inline]
    #[must_use]
    pub fn reply_topic(&self) -> String {
        format!("response:{}", self.0)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strictly increasing allocator for [`CommandId`]s.
#[derive(Debug)]
pub(crate) struct CommandIdAllocator {
    next: AtomicU64,
}

impl CommandIdAllocator {
    pub(crate) const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Hands out the next id.
    pub(crate) fn next(&self) -> CommandId {
        CommandId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns `true` if `id` has already been handed out.
    pub(crate) fn issued(&self, id: CommandId) -> bool {
        id.0 < self.next.load(Ordering::Relaxed)
    }
}

impl Default for CommandIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SubscriptionId
// ============================================================================

/// Opaque handle for one topic bus subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) const fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

// ============================================================================
// HandlerId
// ============================================================================

/// Opaque handle for one event handler registered on a domain controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Allocates a process-unique handler id.
    pub(crate) fn generate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_command_id_rejects_zero() {
        assert!(CommandId::new(0).is_none());
        assert_eq!(CommandId::new(7).map(|id| id.as_u64()), Some(7));
    }

    #[test]
    fn test_reply_topic() {
        let id = CommandId::new(42).expect("non-zero");
        assert_eq!(id.reply_topic(), "response:42");
    }

    #[test]
    fn test_allocator_starts_at_one() {
        let alloc = CommandIdAllocator::new();
        assert_eq!(alloc.next().as_u64(), 1);
        assert_eq!(alloc.next().as_u64(), 2);
        assert_eq!(alloc.next().as_u64(), 3);
    }

    #[test]
    fn test_allocator_issued() {
        let alloc = CommandIdAllocator::new();
        let first = alloc.next();
        assert!(alloc.issued(first));
        assert!(!alloc.issued(CommandId::new(2).expect("non-zero")));
    }

    #[test]
    fn test_command_id_serializes_as_integer() {
        let id = CommandId::new(9).expect("non-zero");
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "9");
        let back: CommandId = serde_json::from_str("9").expect("parse");
        assert_eq!(back, id);
    }

    #[test]
    fn test_handler_ids_unique() {
        let a = HandlerId::generate();
        let b = HandlerId::generate();
        assert_ne!(a, b);
    }

    proptest! {
        #[test]
        fn prop_allocated_ids_strictly_increase(count in 1usize..500) {
            let alloc = CommandIdAllocator::new();
            let ids: Vec<CommandId> = (0..count).map(|_| alloc.next()).collect();

            prop_assert_eq!(ids[0].as_u64(), 1);
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(ids.iter().all(|id| alloc.issued(*id)));
        }
    }
}
