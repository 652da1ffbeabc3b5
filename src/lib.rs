//! Garbage-collection plans for managed runtimes.
//!
//! A runtime plugs into this crate by implementing [`vm::VMBinding`]. It creates an [`MMTK`]
//! instance through [`MMTKBuilder`] and drives it through [`memory_manager`]. Two plans are
//! provided:
//! * `GenCopyMS`: a copying nursery with a mark-sweep mature space and an object-remembering
//!   write barrier.
//! * `SemiSpace`: two copy spaces that swap roles at every collection.
//!
//! Both plans also have an immortal space and a large object space. Collections are
//! stop-the-world and run a parallel transitive closure on a fixed group of collector threads.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate downcast_rs;

mod global_state;
pub mod memory_manager;
mod mmtk;
pub mod plan;
pub mod policy;
pub mod util;
pub mod vm;

pub use crate::mmtk::{MMTKBuilder, MMTK};
pub use crate::plan::{AllocationSemantics, Mutator, Plan};
pub use crate::util::alloc::AllocationError;
pub use crate::util::heap::HeapLayoutError;
pub use crate::util::statistics::CollectionStats;
