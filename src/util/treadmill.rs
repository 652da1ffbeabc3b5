use crate::util::ObjectReference;
use std::collections::HashSet;
use std::mem;

/// Membership lists of the large object space.
///
/// Objects allocated since the last collection sit in `alloc_nursery`. At the start of a
/// collection the lists flip so that everything still to be proven live is in
/// `collect_nursery` (and `from_space` for a full-heap collection). Tracing moves live objects
/// to `to_space`; whatever remains in the collected lists at release is dead.
#[derive(Default)]
pub struct TreadMill {
    lists: spin::Mutex<Lists>,
}

#[derive(Default)]
struct Lists {
    from_space: HashSet<ObjectReference>,
    to_space: HashSet<ObjectReference>,
    collect_nursery: HashSet<ObjectReference>,
    alloc_nursery: HashSet<ObjectReference>,
}

impl TreadMill {
    pub fn new() -> Self {
        Self::default()
    }

    /// `nursery` is true for objects allocated by mutators and false for objects the
    /// collector copies into the space.
    pub fn add_to_treadmill(&self, object: ObjectReference, nursery: bool) {
        let mut lists = self.lists.lock();
        if nursery {
            lists.alloc_nursery.insert(object);
        } else {
            lists.to_space.insert(object);
        }
    }

    /// A traced object survives.
    pub fn copy(&self, object: ObjectReference, is_in_nursery: bool) {
        let mut lists = self.lists.lock();
        let removed = if is_in_nursery {
            lists.collect_nursery.remove(&object)
        } else {
            lists.from_space.remove(&object)
        };
        debug_assert!(removed, "{} is not on the list being collected", object);
        lists.to_space.insert(object);
    }

    /// Take the dead nursery objects.
    pub fn collect_nursery(&self) -> Vec<ObjectReference> {
        mem::take(&mut self.lists.lock().collect_nursery)
            .into_iter()
            .collect()
    }

    /// Take the dead mature objects.
    pub fn collect(&self) -> Vec<ObjectReference> {
        mem::take(&mut self.lists.lock().from_space)
            .into_iter()
            .collect()
    }

    pub fn flip(&self, full_heap: bool) {
        let mut lists = self.lists.lock();
        let allocated = mem::take(&mut lists.alloc_nursery);
        lists.collect_nursery = allocated;
        if full_heap {
            let survivors = mem::take(&mut lists.to_space);
            lists.from_space = survivors;
        }
    }

    pub fn len(&self) -> usize {
        let lists = self.lists.lock();
        lists.from_space.len()
            + lists.to_space.len()
            + lists.collect_nursery.len()
            + lists.alloc_nursery.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
