use crate::plan::Mutator;
use crate::util::opaque_pointer::*;
use crate::vm::VMBinding;

/// Lets the collector find the mutators of the VM.
pub trait ActivePlan<VM: VMBinding> {
    fn is_mutator(tls: VMThread) -> bool;

    /// The mutator bound to `tls`.
    fn mutator(tls: VMMutatorThread) -> &'static mut Mutator<VM>;

    /// All mutators. Only called while mutators are stopped.
    fn mutators<'a>() -> Box<dyn Iterator<Item = &'a mut Mutator<VM>> + 'a>;

    fn number_of_mutators() -> usize;
}
