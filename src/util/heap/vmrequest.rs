use crate::util::constants::*;
use crate::util::conversions::raw_align_up;

/// How much virtual memory a space asks the [`super::HeapLayout`] for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VMRequest {
    /// The space may grow until the whole heap is used. It gets an extent as large as the heap.
    Discontiguous,
    /// A fixed number of bytes.
    Extent { extent: usize },
    /// A fraction of the heap size, in `(0, 1]`.
    Fraction { frac: f32 },
}

impl VMRequest {
    pub fn is_discontiguous(&self) -> bool {
        matches!(self, VMRequest::Discontiguous)
    }

    pub fn discontiguous() -> Self {
        VMRequest::Discontiguous
    }

    pub fn fixed_size(mb: usize) -> Self {
        VMRequest::Extent {
            extent: mb << LOG_BYTES_IN_MBYTE,
        }
    }

    pub fn fixed_extent(extent: usize) -> Self {
        VMRequest::Extent { extent }
    }

    pub fn fraction(frac: f32) -> Self {
        VMRequest::Fraction { frac }
    }

    /// The page-aligned number of bytes this request asks for in a heap of `heap_size` bytes,
    /// or `None` if the request is empty or malformed.
    pub fn extent_in(&self, heap_size: usize) -> Option<usize> {
        let bytes = match *self {
            VMRequest::Discontiguous => heap_size,
            VMRequest::Extent { extent } => extent,
            VMRequest::Fraction { frac } => {
                if !(frac > 0.0 && frac <= 1.0) {
                    return None;
                }
                (heap_size as f64 * frac as f64) as usize
            }
        };
        if bytes == 0 {
            None
        } else {
            Some(raw_align_up(bytes, BYTES_IN_PAGE))
        }
    }
}
