use crate::plan::phase::{Schedule, COLLECTION};
use crate::plan::{CollectorContext, Plan, Trace};
use crate::util::alloc::AllocatorContext;
use crate::util::opaque_pointer::*;
use crate::vm::{ActivePlan, VMBinding};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;

/// The collector threads of one MMTK instance.
///
/// The contexts persist across collections. Each collection runs every context on its own
/// scoped thread through the [`COLLECTION`] schedule. Global and mutator phases are run by the
/// primary collector alone, and every phase ends with a rendezvous of all collectors.
pub struct ParallelCollectorGroup<VM: VMBinding> {
    contexts: Vec<CollectorContext<VM>>,
    sync: GroupSync,
}

struct GroupSync {
    parties: usize,
    rendezvous: Mutex<Rendezvous>,
    condvar: Condvar,
    trace: Arc<Trace>,
}

struct Rendezvous {
    counters: [usize; 2],
    current: usize,
    aborted: bool,
    /// The first panic of the current collection.
    failure: Option<Box<dyn Any + Send>>,
}

impl<VM: VMBinding> ParallelCollectorGroup<VM> {
    pub fn new(
        size: usize,
        tls: VMWorkerThread,
        plan: &'static dyn Plan<VM = VM>,
        context: Arc<AllocatorContext>,
    ) -> Self {
        assert!(size > 0, "a collector group needs at least one collector");
        let contexts = (0..size)
            .map(|ordinal| CollectorContext::new(ordinal, tls, plan, context.clone()))
            .collect();
        ParallelCollectorGroup {
            contexts,
            sync: GroupSync {
                parties: size,
                rendezvous: Mutex::new(Rendezvous {
                    counters: [0, 0],
                    current: 0,
                    aborted: false,
                    failure: None,
                }),
                condvar: Condvar::new(),
                trace: plan.base().trace.clone(),
            },
        }
    }

    pub fn active_worker_count(&self) -> usize {
        self.contexts.len()
    }

    /// Run one collection on all collectors and return once every one of them has finished
    /// the last phase. Mutators must be stopped.
    ///
    /// A panic on any collector aborts the others and is resumed on the calling thread.
    pub fn run_collection(&mut self, plan: &'static dyn Plan<VM = VM>, tls: VMWorkerThread) {
        let sync = &self.sync;
        {
            let mut rendezvous = sync.lock();
            rendezvous.counters = [0, 0];
            rendezvous.current = 0;
            rendezvous.aborted = false;
        }
        thread::scope(|scope| {
            for context in self.contexts.iter_mut() {
                scope.spawn(move || {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        sync.run_schedule(context, plan, tls)
                    }));
                    if let Err(payload) = result {
                        sync.abort(payload);
                    }
                });
            }
        });
        let failure = sync.lock().failure.take();
        if let Some(payload) = failure {
            panic::resume_unwind(payload);
        }
    }
}

impl GroupSync {
    /// A collector that panicked never holds the lock while unwinding, so poisoning carries
    /// no information here.
    fn lock(&self) -> MutexGuard<'_, Rendezvous> {
        self.rendezvous
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn run_schedule<VM: VMBinding>(
        &self,
        context: &mut CollectorContext<VM>,
        plan: &'static dyn Plan<VM = VM>,
        tls: VMWorkerThread,
    ) {
        for &(schedule, phase) in COLLECTION {
            match schedule {
                Schedule::Global => {
                    if context.is_primary() {
                        debug!("global {:?}", phase);
                        plan.collection_phase(tls, phase);
                    }
                }
                Schedule::Mutator => {
                    if context.is_primary() {
                        debug!("mutator {:?}", phase);
                        for mutator in VM::VMActivePlan::mutators() {
                            mutator.collection_phase(tls, phase);
                        }
                    }
                }
                Schedule::Collector => context.collection_phase(phase),
            }
            self.rendezvous();
        }
    }

    /// Wait until every collector arrived. Returns the arrival order of this collector.
    fn rendezvous(&self) -> usize {
        let mut sync = self.lock();
        if sync.aborted {
            drop(sync);
            panic!("collection aborted");
        }
        let i = sync.current;
        let me = sync.counters[i];
        sync.counters[i] += 1;
        if me == self.parties - 1 {
            // The other counter was last used two rendezvous ago, so nobody waits on it.
            sync.current ^= 1;
            let next = sync.current;
            sync.counters[next] = 0;
            self.condvar.notify_all();
        } else {
            while sync.counters[i] < self.parties {
                sync = self
                    .condvar
                    .wait(sync)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if sync.aborted {
                    drop(sync);
                    panic!("collection aborted");
                }
            }
        }
        me
    }

    fn abort(&self, payload: Box<dyn Any + Send>) {
        {
            let mut sync = self.lock();
            if sync.failure.is_none() {
                sync.failure = Some(payload);
            }
            sync.aborted = true;
            self.condvar.notify_all();
        }
        self.trace.abort();
    }
}
