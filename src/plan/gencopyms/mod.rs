//! Plan: a generational collector with a copying nursery and a mark-sweep mature space.
//!
//! New objects are bump allocated in the nursery. A nursery collection copies the survivors
//! into the mature space, using the remembered set of the object barrier as extra roots. A
//! full-heap collection additionally marks the mature, immortal and large object spaces and
//! sweeps the mature and large object spaces.

pub(super) mod global;
pub(super) mod mutator;

pub use self::global::GenCopyMS;
pub use self::global::GENCOPYMS_CONSTRAINTS;
