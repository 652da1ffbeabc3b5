use std::sync::{Condvar, Mutex};

/// A pool of work packets shared by a fixed number of consumers, with termination detection.
///
/// [`SharedQueue::pop`] blocks while the pool is empty. When every participant is blocked in
/// `pop` at the same time, nobody can produce more work, so the queue is drained for good and
/// every waiting `pop` returns `None`.
pub struct SharedQueue<T> {
    sync: Mutex<QueueSync<T>>,
    work_available: Condvar,
}

struct QueueSync<T> {
    packets: Vec<Vec<T>>,
    participants: usize,
    idle: usize,
    drained: bool,
    aborted: bool,
}

impl<T> SharedQueue<T> {
    pub fn new() -> Self {
        SharedQueue {
            sync: Mutex::new(QueueSync {
                packets: Vec::new(),
                participants: 0,
                idle: 0,
                drained: false,
                aborted: false,
            }),
            work_available: Condvar::new(),
        }
    }

    /// Start a new round with `participants` consumers. Leftover packets are discarded.
    pub fn reset(&self, participants: usize) {
        let mut sync = self.sync.lock().unwrap();
        sync.packets.clear();
        sync.participants = participants;
        sync.idle = 0;
        sync.drained = false;
        sync.aborted = false;
    }

    pub fn push(&self, packet: Vec<T>) {
        if packet.is_empty() {
            return;
        }
        let mut sync = self.sync.lock().unwrap();
        debug_assert!(!sync.drained, "pushing work into a drained queue");
        sync.packets.push(packet);
        self.work_available.notify_one();
    }

    /// Take a packet without waiting.
    pub fn try_pop(&self) -> Option<Vec<T>> {
        self.sync.lock().unwrap().packets.pop()
    }

    /// Take a packet, waiting for one if necessary. Returns `None` once all participants are
    /// waiting and the queue is empty.
    ///
    /// Panics if the round was aborted.
    pub fn pop(&self) -> Option<Vec<T>> {
        let mut sync = self.sync.lock().unwrap();
        loop {
            assert!(!sync.aborted, "work queue aborted");
            if let Some(packet) = sync.packets.pop() {
                return Some(packet);
            }
            if sync.drained {
                return None;
            }
            sync.idle += 1;
            if sync.idle == sync.participants {
                sync.drained = true;
                sync.idle -= 1;
                self.work_available.notify_all();
                return None;
            }
            sync = self.work_available.wait(sync).unwrap();
            sync.idle -= 1;
        }
    }

    /// Wake every waiting consumer with a panic. Used when a participant died and the round
    /// can never finish.
    pub fn abort(&self) {
        let mut sync = self
            .sync
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sync.aborted = true;
        self.work_available.notify_all();
    }

    pub fn is_drained(&self) -> bool {
        self.sync.lock().unwrap().drained
    }

    pub fn is_empty(&self) -> bool {
        self.sync.lock().unwrap().packets.is_empty()
    }
}

impl<T> Default for SharedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
