//! The interface a VM binding implements so this crate can manage its heap.
//!
//! A binding provides a type that implements [`VMBinding`], and through its associated types,
//! the object model, scanning, thread control and mutator enumeration of the VM.

mod active_plan;
mod collection;
mod object_model;
mod scanning;

pub use self::active_plan::ActivePlan;
pub use self::collection::Collection;
pub use self::object_model::ObjectModel;
pub use self::scanning::{Scanning, SlotVisitor};

/// Default minimal alignment: one word.
const DEFAULT_LOG_MIN_ALIGNMENT: usize = crate::util::constants::LOG_BYTES_IN_WORD as usize;
/// Default maximal alignment: two words.
const DEFAULT_LOG_MAX_ALIGNMENT: usize = DEFAULT_LOG_MIN_ALIGNMENT + 1;

pub trait VMBinding
where
    Self: Sized + 'static + Send + Sync + Default,
{
    type VMObjectModel: ObjectModel<Self>;
    type VMScanning: Scanning<Self>;
    type VMCollection: Collection<Self>;
    type VMActivePlan: ActivePlan<Self>;

    /// A value to fill in alignment gaps.
    const ALIGNMENT_VALUE: usize = 0xdead_beef;
    /// Allowed minimal alignment in bytes.
    const MIN_ALIGNMENT: usize = 1 << DEFAULT_LOG_MIN_ALIGNMENT;
    /// Allowed maximum alignment in bytes.
    const MAX_ALIGNMENT: usize = 1 << DEFAULT_LOG_MAX_ALIGNMENT;
}

#[cfg(test)]
mod tests;
