use super::accounting::PageAccounting;
use super::heap_layout::SpaceExtent;
use super::pageresource::{PageResource, PageResourceError};
use crate::util::constants::LOG_BYTES_IN_PAGE;
use crate::util::conversions::{bytes_to_pages_up, pages_to_bytes};
use crate::util::memory;
use crate::util::Address;
use std::collections::{BTreeMap, HashMap};

/// A page resource that hands out runs of whole pages and takes them back individually.
/// Free runs are kept coalesced and are reused first-fit before the high-water mark moves.
pub struct FreeListPageResource {
    extent: SpaceExtent,
    accounting: PageAccounting,
    sync: spin::Mutex<FreeListSync>,
}

#[derive(Default)]
struct FreeListSync {
    /// Free runs below the high-water mark: first page -> length.
    free: BTreeMap<usize, usize>,
    /// Runs handed out: first page -> length.
    live: HashMap<usize, usize>,
    /// Pages at and above this index have never been handed out.
    high_water: usize,
}

impl FreeListSync {
    fn take(&mut self, pages: usize, limit: usize) -> Option<usize> {
        let fit = self
            .free
            .iter()
            .find(|(_, &len)| len >= pages)
            .map(|(&start, &len)| (start, len));
        let start = match fit {
            Some((start, len)) => {
                self.free.remove(&start);
                if len > pages {
                    self.free.insert(start + pages, len - pages);
                }
                start
            }
            None if self.high_water + pages <= limit => {
                let start = self.high_water;
                self.high_water += pages;
                start
            }
            None => return None,
        };
        self.live.insert(start, pages);
        Some(start)
    }

    fn give_back(&mut self, mut start: usize, mut pages: usize) {
        if let Some((&prev, &len)) = self.free.range(..start).next_back() {
            if prev + len == start {
                self.free.remove(&prev);
                start = prev;
                pages += len;
            }
        }
        if let Some(len) = self.free.remove(&(start + pages)) {
            pages += len;
        }
        if start + pages == self.high_water {
            self.high_water = start;
        } else {
            self.free.insert(start, pages);
        }
    }
}

impl FreeListPageResource {
    pub fn new(extent: SpaceExtent) -> Self {
        FreeListPageResource {
            extent,
            accounting: PageAccounting::new(),
            sync: spin::Mutex::new(FreeListSync::default()),
        }
    }

    fn page_index(&self, addr: Address) -> usize {
        (addr - self.extent.start) >> LOG_BYTES_IN_PAGE
    }

    fn page_address(&self, index: usize) -> Address {
        self.extent.start + pages_to_bytes(index)
    }

    /// Release the run starting at `start` and return its length in pages.
    ///
    /// Panics if no run starts there. That is a double free, or a pointer that never came
    /// from this resource.
    pub fn release_pages(&self, start: Address) -> usize {
        let index = self.page_index(start);
        let mut sync = self.sync.lock();
        let pages = match sync.live.remove(&index) {
            Some(pages) => pages,
            None => panic!("releasing pages at {} that are not allocated", start),
        };
        if let Err(e) = memory::uncommit(start, pages_to_bytes(pages)) {
            warn!("failed to uncommit {} pages at {}: {}", pages, start, e);
        }
        self.accounting.release(pages);
        sync.give_back(index, pages);
        pages
    }

    /// The length of the run starting at `start`, if one is live.
    pub fn pages_at(&self, start: Address) -> Option<usize> {
        let index = self.page_index(start);
        self.sync.lock().live.get(&index).copied()
    }
}

impl PageResource for FreeListPageResource {
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
        self.accounting.clear_reserved(reserved_pages);
        let pages = bytes_to_pages_up(bytes);
        let limit = bytes_to_pages_up(self.extent.extent);

        let mut sync = self.sync.lock();
        let index = sync.take(pages, limit).ok_or(PageResourceError::Exhausted)?;
        let start = self.page_address(index);
        if let Err(e) = memory::dzmmap(start, pages_to_bytes(pages)) {
            sync.live.remove(&index);
            sync.give_back(index, pages);
            return Err(PageResourceError::Mmap(e));
        }
        self.accounting.reserve_and_commit(pages);
        trace!("freelist: {} pages at {}", pages, start);
        Ok(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::constants::*;
    use crate::util::heap::{HeapLayout, VMRequest};

    fn resource(pages: usize) -> (HeapLayout, FreeListPageResource) {
        let mut layout = HeapLayout::new(BYTES_IN_CHUNK);
        let extent = layout
            .reserve("freelist", VMRequest::fixed_extent(pages * BYTES_IN_PAGE))
            .unwrap();
        (layout, FreeListPageResource::new(extent))
    }

    #[test]
    fn released_runs_are_reused() {
        let (_layout, pr) = resource(8);
        let a = pr.get_new_pages(0, 2 * BYTES_IN_PAGE).unwrap();
        let b = pr.get_new_pages(0, 3 * BYTES_IN_PAGE).unwrap();
        assert_eq!(b, a + 2 * BYTES_IN_PAGE);
        assert_eq!(pr.reserved_pages(), 5);
        assert_eq!(pr.pages_at(b), Some(3));

        assert_eq!(pr.release_pages(a), 2);
        assert_eq!(pr.reserved_pages(), 3);
        let c = pr.get_new_pages(0, BYTES_IN_PAGE).unwrap();
        assert_eq!(c, a);
        // Reused memory is zeroed again.
        unsafe { assert_eq!(c.load::<usize>(), 0) };
    }

    #[test]
    fn coalesces_and_exhausts() {
        let (_layout, pr) = resource(4);
        let a = pr.get_new_pages(0, BYTES_IN_PAGE).unwrap();
        let b = pr.get_new_pages(0, BYTES_IN_PAGE).unwrap();
        let c = pr.get_new_pages(0, 2 * BYTES_IN_PAGE).unwrap();
        assert!(matches!(
            pr.get_new_pages(0, BYTES_IN_PAGE),
            Err(PageResourceError::Exhausted)
        ));
        pr.release_pages(a);
        pr.release_pages(b);
        // The two single pages merge into one run of two.
        assert_eq!(pr.get_new_pages(0, 2 * BYTES_IN_PAGE).unwrap(), a);
        pr.release_pages(c);
        assert_eq!(pr.reserved_pages(), 2);
    }

    #[test]
    #[should_panic(expected = "not allocated")]
    fn double_release() {
        let (_layout, pr) = resource(4);
        let a = pr.get_new_pages(0, BYTES_IN_PAGE).unwrap();
        pr.release_pages(a);
        pr.release_pages(a);
    }
}
