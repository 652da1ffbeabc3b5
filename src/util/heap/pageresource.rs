use super::accounting::PageAccounting;
use super::heap_layout::SpaceExtent;
use crate::util::Address;
use std::fmt;

/// Why a page resource could not satisfy a request.
#[derive(Debug)]
pub enum PageResourceError {
    /// The extent of the space has no room left for the request.
    Exhausted,
    /// The OS failed to commit memory.
    Mmap(std::io::Error),
}

impl fmt::Display for PageResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageResourceError::Exhausted => write!(f, "space exhausted"),
            PageResourceError::Mmap(e) => write!(f, "failed to commit memory: {}", e),
        }
    }
}

/// Hands out memory from the extent of one space and keeps its page counters.
///
/// A space first calls [`PageResource::reserve_pages`] so that the trigger sees the pending
/// request, then either withdraws it with [`PageResource::clear_request`] or turns it into
/// memory with [`PageResource::get_new_pages`].
pub trait PageResource: Sync + Send {
    fn accounting(&self) -> &PageAccounting;

    fn extent(&self) -> &SpaceExtent;

    fn reserve_pages(&self, pages: usize) {
        self.accounting().reserve(pages);
    }

    fn clear_request(&self, reserved_pages: usize) {
        self.accounting().clear_reserved(reserved_pages);
    }

    /// Get `bytes` of zeroed memory. `reserved_pages` is the pending reservation made for this
    /// request. It is withdrawn whether or not the request succeeds, and replaced by the pages
    /// actually committed.
    fn get_new_pages(
        &self,
        reserved_pages: usize,
        bytes: usize,
    ) -> Result<Address, PageResourceError>;

    fn reserved_pages(&self) -> usize {
        self.accounting().get_reserved_pages()
    }

    fn committed_pages(&self) -> usize {
        self.accounting().get_committed_pages()
    }

    /// Pages in the extent that are not yet reserved.
    fn available_pages(&self) -> usize {
        crate::util::conversions::bytes_to_pages_up(self.extent().extent)
            .saturating_sub(self.reserved_pages())
    }
}
