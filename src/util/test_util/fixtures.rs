// Not every test uses every fixture.
#![allow(dead_code)]

use crate::memory_manager;
use crate::plan::Mutator;
use crate::util::options::PlanSelector;
use crate::util::test_util::mock_vm::{self, MockVM};
use crate::util::VMThread;
use crate::MMTKBuilder;
use crate::MMTK;

/// The heap size of fixtures unless the builder closure says otherwise.
pub const TEST_HEAP_SIZE: usize = 16 << 20;

/// An MMTk instance over [`MockVM`]. The instance is leaked, so it lives for the rest of the
/// test process.
pub struct MMTKFixture {
    pub mmtk: &'static MMTK<MockVM>,
}

impl MMTKFixture {
    pub fn create() -> Self {
        Self::create_with_builder(|_| {}, true)
    }

    pub fn create_with_plan(plan: PlanSelector) -> Self {
        Self::create_with_builder(|builder| builder.options.plan = plan, true)
    }

    /// Create an instance with a 16MB heap, a 4MB nursery that triggers a collection at 1MB,
    /// and two collectors. `with_builder` may change any option before the heap is laid out.
    pub fn create_with_builder<F>(with_builder: F, initialize_collection: bool) -> Self
    where
        F: FnOnce(&mut MMTKBuilder),
    {
        let mut builder = MMTKBuilder::new_no_env_vars();
        builder.options.heap_size = TEST_HEAP_SIZE;
        builder.options.nursery_size = 4 << 20;
        builder.options.max_nursery = 1 << 20;
        builder.options.immortal_size = 1 << 20;
        builder.options.threads = 2;
        with_builder(&mut builder);

        let mmtk = match memory_manager::mmtk_init::<MockVM>(&builder) {
            Ok(mmtk) => mmtk,
            Err(e) => panic!("cannot create a test heap: {}", e),
        };
        let mmtk: &'static MMTK<MockVM> = Box::leak(mmtk);
        if initialize_collection {
            memory_manager::initialize_collection(mmtk, VMThread::UNINITIALIZED);
        }
        MMTKFixture { mmtk }
    }
}

/// An MMTk instance and one mutator, registered with the mock VM.
pub struct MutatorFixture {
    pub mmtk: &'static MMTK<MockVM>,
    pub mutator: &'static mut Mutator<MockVM>,
}

impl MutatorFixture {
    pub fn create() -> Self {
        Self::create_with_builder(|_| {}, true)
    }

    pub fn create_with_plan(plan: PlanSelector) -> Self {
        Self::create_with_builder(|builder| builder.options.plan = plan, true)
    }

    pub fn create_with_builder<F>(with_builder: F, initialize_collection: bool) -> Self
    where
        F: FnOnce(&mut MMTKBuilder),
    {
        let MMTKFixture { mmtk } = MMTKFixture::create_with_builder(with_builder, initialize_collection);
        let mutator = Box::leak(memory_manager::bind_mutator(mmtk, mock_vm::mutator_tls(0)));
        mock_vm::register_mutator(mutator);
        MutatorFixture { mmtk, mutator }
    }

    /// Bind and register another mutator of the same instance.
    pub fn bind_another(&self, n: usize) -> &'static mut Mutator<MockVM> {
        let mutator = Box::leak(memory_manager::bind_mutator(self.mmtk, mock_vm::mutator_tls(n)));
        mock_vm::register_mutator(mutator);
        mutator
    }

    /// Run a user-requested collection from the fixture's mutator thread.
    pub fn collect(&self) {
        memory_manager::handle_user_collection_request(self.mmtk, mock_vm::mutator_tls(0));
    }
}
