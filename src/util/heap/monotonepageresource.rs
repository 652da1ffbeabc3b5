use super::accounting::PageAccounting;
use super::heap_layout::SpaceExtent;
use super::pageresource::{PageResource, PageResourceError};
use crate::util::constants::{BYTES_IN_PAGE, MIN_OBJECT_SIZE};
use crate::util::conversions::bytes_to_pages_up;
use crate::util::memory;
use crate::util::Address;

/// A bump-pointer page resource. Requests are served at byte granularity from the bottom of
/// the extent, and memory is committed a page at a time as the cursor moves up. Nothing is
/// freed until [`MonotonePageResource::reset`].
pub struct MonotonePageResource {
    extent: SpaceExtent,
    accounting: PageAccounting,
    sync: spin::Mutex<MonotoneSync>,
}

struct MonotoneSync {
    /// Start of the next request.
    cursor: Address,
    /// Everything below this is committed.
    committed_limit: Address,
}

impl MonotonePageResource {
    pub fn new(extent: SpaceExtent) -> Self {
        MonotonePageResource {
            extent,
            accounting: PageAccounting::new(),
            sync: spin::Mutex::new(MonotoneSync {
                cursor: extent.start,
                committed_limit: extent.start,
            }),
        }
    }

    pub fn cursor(&self) -> Address {
        self.sync.lock().cursor
    }

    /// Give all memory back to the OS and start again from the bottom of the extent.
    /// Returns the start and size of the range that had been handed out.
    pub fn reset(&self) -> (Address, usize) {
        let mut sync = self.sync.lock();
        let used = sync.cursor - self.extent.start;
        let committed = sync.committed_limit - self.extent.start;
        if committed > 0 {
            if let Err(e) = memory::uncommit(self.extent.start, committed) {
                // The pages stay mapped and are reused, so this only costs memory.
                warn!("failed to uncommit {} bytes at {}: {}", committed, self.extent.start, e);
            }
        }
        sync.cursor = self.extent.start;
        sync.committed_limit = self.extent.start;
        self.accounting.reset();
        (self.extent.start, used)
    }
}

impl PageResource for MonotonePageResource {
    fn accounting(&self) -> &PageAccounting {
        &self.accounting
    }

    fn extent(&self) -> &SpaceExtent {
        &self.extent
    }

    fn get_new_pages(
        &self,
        reserved_pages: usize,
        bytes: usize,
    ) -> Result<Address, PageResourceError> {
        debug_assert!(bytes % MIN_OBJECT_SIZE == 0, "unaligned request of {} bytes", bytes);
        self.accounting.clear_reserved(reserved_pages);

        let mut sync = self.sync.lock();
        let start = sync.cursor;
        let new_cursor = start + bytes;
        if new_cursor > self.extent.end() {
            return Err(PageResourceError::Exhausted);
        }
        if new_cursor > sync.committed_limit {
            let new_limit = new_cursor.align_up(BYTES_IN_PAGE);
            let grow = new_limit - sync.committed_limit;
            memory::dzmmap(sync.committed_limit, grow).map_err(PageResourceError::Mmap)?;
            self.accounting.reserve_and_commit(bytes_to_pages_up(grow));
            sync.committed_limit = new_limit;
        }
        sync.cursor = new_cursor;
        trace!("monotone: [{}, {})", start, new_cursor);
        Ok(start)
    }
}
