//! Memory policies that can be used for spaces.

/// A space is a region of virtual memory under one memory management regime. Several spaces
/// may share a policy (a semispace plan has two copy spaces), but no two spaces ever share
/// virtual memory.
pub mod space;

pub mod copyspace;
pub mod immortalspace;
pub mod largeobjectspace;
pub mod marksweepspace;
