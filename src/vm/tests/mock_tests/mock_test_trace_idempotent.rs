use super::mock_test_prelude::*;
use crate::plan::phase::Phase;
use crate::plan::{CollectorContext, TraceState};
use crate::util::{VMThread, VMWorkerThread};

// Drive one nursery collection by hand, with a single collector, and trace the same object
// twice in it.
#[test]
pub fn tracing_twice_returns_the_same_copy() {
    with_mockvm(
        default_setup,
        || {
            let fixture = MutatorFixture::create_with_builder(
                |builder| {
                    builder.options.plan = PlanSelector::GenCopyMS;
                    builder.options.threads = 1;
                },
                false,
            );
            let mmtk = fixture.mmtk;
            let plan = gencopyms(mmtk);
            let object = alloc_with_id(fixture.mutator, 0, 3, AllocationSemantics::Default);

            let tls = VMWorkerThread(VMThread::UNINITIALIZED);
            let mut collector =
                CollectorContext::new(0, tls, mmtk.get_plan(), mmtk.allocator_context.clone());
            assert_eq!(collector.trace().state(), TraceState::Unused);

            mmtk.get_plan().collection_phase(tls, Phase::Prepare);
            fixture.mutator.collection_phase(tls, Phase::Prepare);
            collector.collection_phase(Phase::Prepare);
            assert_eq!(collector.trace().state(), TraceState::Prepare);

            let first = collector.trace().trace_object(object);
            let second = collector.trace().trace_object(object);
            assert_eq!(first, second);
            assert_ne!(first, object);
            assert!(plan.mature.in_space(first));
            assert!(plan.nursery.is_forwarded(object));
            assert_eq!(plan.nursery.objects_copied(), 1);
            assert_eq!(id_of(first), 3);
            assert!(collector.trace().trace_object(ObjectReference::NULL).is_null());

            collector.collection_phase(Phase::Closure);
            assert_eq!(collector.trace().state(), TraceState::Closure);
            // Tracing again in the closure is still idempotent.
            assert_eq!(collector.trace().trace_object(object), first);
            assert_eq!(plan.nursery.objects_copied(), 1);

            collector.collection_phase(Phase::Release);
            fixture.mutator.collection_phase(tls, Phase::Release);
            mmtk.get_plan().collection_phase(tls, Phase::Release);
            assert_eq!(collector.trace().state(), TraceState::Release);
            assert_eq!(plan.nursery.reserved_pages(), 0);
            assert!(!plan.nursery.is_forwarded(object));
            assert_eq!(id_of(first), 3);
        },
        no_cleanup,
    )
}
