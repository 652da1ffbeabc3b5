use crate::plan::{CopyContext, CopySemantics};
use crate::util::ObjectReference;
use crate::vm::VMBinding;

/// How objects of the VM are laid out. The object reference is the address of the first byte
/// of the object, which is also the address the allocator returned for it.
pub trait ObjectModel<VM: VMBinding> {
    /// Copy an object and return the address of the new copy.
    ///
    /// The binding gets memory with [`CopyContext::alloc_copy`], copies the bytes, and then
    /// calls [`CopyContext::post_copy`] on the new object. The collector has already claimed
    /// `from`, so no other thread copies it concurrently.
    fn copy(
        from: ObjectReference,
        semantics: CopySemantics,
        copy_context: &mut CopyContext<VM>,
    ) -> ObjectReference;

    /// The size of the object in bytes.
    fn get_current_size(object: ObjectReference) -> usize;

    /// The size the copy of the object will have. Usually the current size.
    fn get_size_when_copied(object: ObjectReference) -> usize {
        Self::get_current_size(object)
    }

    fn get_align_when_copied(_object: ObjectReference) -> usize {
        VM::MIN_ALIGNMENT
    }

    fn get_align_offset_when_copied(_object: ObjectReference) -> usize {
        0
    }

    /// Read the GC byte of the object header. See [`crate::util::header_byte`].
    fn read_gc_header_bits(object: ObjectReference) -> u8;

    /// Write the GC byte of the object header. Only the collector writes it, and never
    /// concurrently for the same object.
    fn write_gc_header_bits(object: ObjectReference, bits: u8);
}
