use crate::util::heap::heap_layout::SpaceDescriptor;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

/// Collection state shared by every component of one MMTK instance. Spaces, allocators and
/// the collection driver hold an `Arc` to it instead of a reference to the plan.
#[derive(Default)]
pub struct GlobalState {
    /// Set by `initialize_collection`. No collection is triggered before that.
    pub(crate) initialized: AtomicBool,
    /// True from the moment mutators are stopped until they are resumed.
    pub(crate) gc_in_progress: AtomicBool,
    /// A collection has been requested and not yet run.
    collection_requested: AtomicBool,
    /// The pending or current collection was requested by the user.
    user_triggered: AtomicBool,
    /// The pending or current collection is a retry after a collection that did not free
    /// enough memory.
    emergency: AtomicBool,
    /// Tag of the space whose allocation triggered the collection, zero if none did.
    trigger_space: AtomicU8,
    /// A space could not satisfy a request at all, as opposed to the plan asking for a
    /// collection ahead of time.
    space_full: AtomicBool,
    gc_count: AtomicUsize,
    last_gc_full_heap: AtomicBool,
}

impl GlobalState {
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn is_gc_in_progress(&self) -> bool {
        self.gc_in_progress.load(Ordering::SeqCst)
    }

    /// Spaces may only poll for a collection once collection is initialized, and never
    /// while one is running.
    pub fn is_collection_enabled(&self) -> bool {
        self.is_initialized() && !self.is_gc_in_progress()
    }

    /// Record a collection request. The first request decides the trigger space.
    pub fn request_collection(
        &self,
        trigger: Option<SpaceDescriptor>,
        space_full: bool,
        user: bool,
    ) {
        if !self.collection_requested.swap(true, Ordering::SeqCst) {
            let tag = trigger.map_or(0, |d| d.as_tag());
            self.trigger_space.store(tag, Ordering::SeqCst);
            self.space_full.store(space_full, Ordering::SeqCst);
        }
        if user {
            self.user_triggered.store(true, Ordering::SeqCst);
        }
    }

    pub fn is_collection_requested(&self) -> bool {
        self.collection_requested.load(Ordering::SeqCst)
    }

    pub fn is_user_triggered_collection(&self) -> bool {
        self.user_triggered.load(Ordering::SeqCst)
    }

    pub fn set_emergency_collection(&self, emergency: bool) {
        self.emergency.store(emergency, Ordering::SeqCst);
    }

    pub fn is_emergency_collection(&self) -> bool {
        self.emergency.load(Ordering::SeqCst)
    }

    pub fn trigger_space(&self) -> Option<SpaceDescriptor> {
        SpaceDescriptor::from_tag(self.trigger_space.load(Ordering::SeqCst))
    }

    pub fn is_space_full(&self) -> bool {
        self.space_full.load(Ordering::SeqCst)
    }

    /// Called once a collection finished. Clears the request so the next poll can raise a
    /// new one.
    pub(crate) fn collection_done(&self, full_heap: bool) {
        self.last_gc_full_heap.store(full_heap, Ordering::SeqCst);
        self.trigger_space.store(0, Ordering::SeqCst);
        self.space_full.store(false, Ordering::SeqCst);
        self.user_triggered.store(false, Ordering::SeqCst);
        self.emergency.store(false, Ordering::SeqCst);
        self.gc_count.fetch_add(1, Ordering::SeqCst);
        self.collection_requested.store(false, Ordering::SeqCst);
    }

    /// Drop a request without collecting, for instance an ignored user request.
    pub(crate) fn cancel_collection_request(&self) {
        self.trigger_space.store(0, Ordering::SeqCst);
        self.user_triggered.store(false, Ordering::SeqCst);
        self.collection_requested.store(false, Ordering::SeqCst);
    }

    pub fn gc_count(&self) -> usize {
        self.gc_count.load(Ordering::SeqCst)
    }

    pub fn last_gc_was_full_heap(&self) -> bool {
        self.last_gc_full_heap.load(Ordering::SeqCst)
    }
}
