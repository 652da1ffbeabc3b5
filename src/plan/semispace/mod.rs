//! Plan: a full-heap copying collector.
//!
//! The heap is split into two copy spaces. Mutators allocate into one of them. A collection
//! flips the roles and evacuates every reachable object into the other.

pub(super) mod global;
pub(super) mod mutator;

pub use self::global::SemiSpace;
pub use self::global::SS_CONSTRAINTS;
