//! The GC byte in each object header. The VM reserves it and exposes it through
//! [`ObjectModel::read_gc_header_bits`] and [`ObjectModel::write_gc_header_bits`].
//!
//! ```text
//! bit 7 6 5 | 4        | 3 2 1 0
//!   unused  | unlogged | space tag
//! ```
//!
//! The space tag is the descriptor of the space that allocated or received the object. The
//! unlogged bit is set on objects outside the nursery; the write barrier clears it when it
//! first records the object in the remembered set.

use crate::util::heap::SpaceDescriptor;
use crate::util::ObjectReference;
use crate::vm::{ObjectModel, VMBinding};

pub const SPACE_TAG_MASK: u8 = 0b1111;
pub const UNLOGGED_BIT: u8 = 1 << 4;

/// Overwrite the whole byte for a new object or a new copy.
pub fn initialize<VM: VMBinding>(object: ObjectReference, space: SpaceDescriptor, unlogged: bool) {
    let mut bits = space.as_tag() & SPACE_TAG_MASK;
    if unlogged {
        bits |= UNLOGGED_BIT;
    }
    VM::VMObjectModel::write_gc_header_bits(object, bits);
}

pub fn read_space_tag<VM: VMBinding>(object: ObjectReference) -> Option<SpaceDescriptor> {
    SpaceDescriptor::from_tag(VM::VMObjectModel::read_gc_header_bits(object) & SPACE_TAG_MASK)
}

pub fn is_unlogged<VM: VMBinding>(object: ObjectReference) -> bool {
    VM::VMObjectModel::read_gc_header_bits(object) & UNLOGGED_BIT != 0
}

pub fn set_unlogged<VM: VMBinding>(object: ObjectReference) {
    let bits = VM::VMObjectModel::read_gc_header_bits(object);
    VM::VMObjectModel::write_gc_header_bits(object, bits | UNLOGGED_BIT);
}

pub fn clear_unlogged<VM: VMBinding>(object: ObjectReference) {
    let bits = VM::VMObjectModel::read_gc_header_bits(object);
    VM::VMObjectModel::write_gc_header_bits(object, bits & !UNLOGGED_BIT);
}
