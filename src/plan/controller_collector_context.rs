use crate::mmtk::MMTK;
use crate::plan::ParallelCollectorGroup;
use crate::util::opaque_pointer::*;
use crate::vm::{Collection, VMBinding};
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Instant;

/// Drives stop-the-world collections.
///
/// The thread whose request triggered a collection runs it: it stops the mutators, runs the
/// collector group and resumes the mutators. Concurrent requests serialize on the group lock,
/// and a request that was satisfied by a collection that ran while waiting is dropped.
pub struct ControllerCollectorContext<VM: VMBinding> {
    collectors: Mutex<Option<ParallelCollectorGroup<VM>>>,
}

impl<VM: VMBinding> ControllerCollectorContext<VM> {
    pub fn new() -> Self {
        ControllerCollectorContext {
            collectors: Mutex::new(None),
        }
    }

    pub fn set_collectors(&self, group: ParallelCollectorGroup<VM>) {
        let mut collectors = self.collectors.lock().unwrap();
        assert!(collectors.is_none(), "collectors initialized twice");
        *collectors = Some(group);
    }

    pub fn is_initialized(&self) -> bool {
        self.collectors.lock().unwrap().is_some()
    }

    pub fn collect(&self, mmtk: &'static MMTK<VM>, tls: VMMutatorThread) {
        let state = &mmtk.state;
        let mut collectors = self.collectors.lock().unwrap();
        if !state.is_collection_requested() {
            debug!("collection already done by another thread");
            return;
        }
        let group = match collectors.as_mut() {
            Some(group) => group,
            None => {
                warn!("collection requested before collectors were initialized");
                state.cancel_collection_request();
                return;
            }
        };

        let plan = &*mmtk.plan;
        let worker_tls = VMWorkerThread(tls.0);
        let start = Instant::now();
        let pages_before = plan.get_pages_used();

        state.gc_in_progress.store(true, Ordering::SeqCst);
        VM::VMCollection::stop_all_mutators(worker_tls);
        debug!("mutators stopped");

        group.run_collection(plan, worker_tls);

        let full_heap = plan.last_collection_full_heap();
        let elapsed = start.elapsed();
        mmtk.stats.collection_done(full_heap, elapsed);
        state.collection_done(full_heap);
        state.gc_in_progress.store(false, Ordering::SeqCst);
        VM::VMCollection::resume_mutators(worker_tls);

        info!(
            "End of GC #{} ({}): {} -> {} pages used, {} available, {:.3} ms",
            state.gc_count(),
            if full_heap { "full heap" } else { "nursery" },
            pages_before,
            plan.get_pages_used(),
            plan.get_pages_avail(),
            elapsed.as_secs_f64() * 1000.0
        );
    }
}

impl<VM: VMBinding> Default for ControllerCollectorContext<VM> {
    fn default() -> Self {
        Self::new()
    }
}
