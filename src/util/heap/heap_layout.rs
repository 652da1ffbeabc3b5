use super::vmrequest::VMRequest;
use crate::util::constants::BYTES_IN_CHUNK;
use crate::util::conversions::raw_align_up;
use crate::util::memory;
use crate::util::Address;
use std::fmt;

/// The number of spaces one layout can hold. Descriptors are stored in four header bits, and
/// the value zero means "no space".
pub const MAX_SPACES: usize = 15;

/// Identifies one space of a [`HeapLayout`]. Descriptors start at one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpaceDescriptor(u8);

impl SpaceDescriptor {
    pub const UNINITIALIZED: Self = SpaceDescriptor(0);

    /// Recover a descriptor from the tag stored in an object header.
    pub fn from_tag(tag: u8) -> Option<Self> {
        if tag == 0 || tag as usize > MAX_SPACES {
            None
        } else {
            Some(SpaceDescriptor(tag))
        }
    }

    pub fn as_tag(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// The address range handed to one space.
#[derive(Copy, Clone, Debug)]
pub struct SpaceExtent {
    pub descriptor: SpaceDescriptor,
    pub start: Address,
    /// Usable bytes, page aligned. The reservation behind it may be larger.
    pub extent: usize,
}

impl SpaceExtent {
    pub fn end(&self) -> Address {
        self.start + self.extent
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.start && addr < self.end()
    }
}

/// Configuration errors found while laying out the heap. All of them are reported before the
/// first allocation.
#[derive(Debug)]
pub enum HeapLayoutError {
    /// The request asked for zero bytes, or for a fraction outside `(0, 1]`.
    InvalidRequest {
        space: &'static str,
        request: VMRequest,
    },
    /// The bounded spaces together ask for more than the heap size.
    HeapTooSmall {
        space: &'static str,
        requested: usize,
        heap_size: usize,
    },
    TooManySpaces {
        space: &'static str,
    },
    /// The OS refused to reserve the address range.
    ReservationFailed {
        space: &'static str,
        source: std::io::Error,
    },
}

impl fmt::Display for HeapLayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapLayoutError::InvalidRequest { space, request } => {
                write!(f, "{}: invalid virtual memory request {:?}", space, request)
            }
            HeapLayoutError::HeapTooSmall {
                space,
                requested,
                heap_size,
            } => write!(
                f,
                "{}: bounded spaces need {} bytes, but the heap is only {} bytes",
                space, requested, heap_size
            ),
            HeapLayoutError::TooManySpaces { space } => {
                write!(f, "{}: more than {} spaces", space, MAX_SPACES)
            }
            HeapLayoutError::ReservationFailed { space, source } => {
                write!(f, "{}: failed to reserve address space: {}", space, source)
            }
        }
    }
}

impl std::error::Error for HeapLayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HeapLayoutError::ReservationFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

struct Reservation {
    name: &'static str,
    extent: SpaceExtent,
    reserved_bytes: usize,
}

/// The virtual address layout of one heap. Every space reserves its own chunk-aligned range
/// here while the plan is being built, and the layout answers which space an address
/// belongs to afterwards.
pub struct HeapLayout {
    heap_size: usize,
    /// Bytes requested by spaces with a bounded extent.
    bounded_bytes: usize,
    spaces: Vec<Reservation>,
}

impl HeapLayout {
    pub fn new(heap_size: usize) -> Self {
        HeapLayout {
            heap_size,
            bounded_bytes: 0,
            spaces: Vec::with_capacity(MAX_SPACES),
        }
    }

    pub fn heap_size(&self) -> usize {
        self.heap_size
    }

    pub fn reserve(
        &mut self,
        name: &'static str,
        request: VMRequest,
    ) -> Result<SpaceExtent, HeapLayoutError> {
        if self.spaces.len() == MAX_SPACES {
            return Err(HeapLayoutError::TooManySpaces { space: name });
        }
        let extent = request
            .extent_in(self.heap_size)
            .ok_or(HeapLayoutError::InvalidRequest {
                space: name,
                request,
            })?;
        if !request.is_discontiguous() {
            let requested = self.bounded_bytes + extent;
            if requested > self.heap_size {
                return Err(HeapLayoutError::HeapTooSmall {
                    space: name,
                    requested,
                    heap_size: self.heap_size,
                });
            }
            self.bounded_bytes = requested;
        }

        let reserved_bytes = raw_align_up(extent, BYTES_IN_CHUNK);
        let start = memory::mmap_reserve_aligned(reserved_bytes, BYTES_IN_CHUNK)
            .map_err(|source| HeapLayoutError::ReservationFailed { space: name, source })?;
        let descriptor = SpaceDescriptor(self.spaces.len() as u8 + 1);
        let space_extent = SpaceExtent {
            descriptor,
            start,
            extent,
        };
        debug!(
            "{}: {:?} reserved [{}, {})",
            name,
            descriptor,
            start,
            space_extent.end()
        );
        self.spaces.push(Reservation {
            name,
            extent: space_extent,
            reserved_bytes,
        });
        Ok(space_extent)
    }

    /// Find the space whose extent contains `addr`.
    pub fn space_of(&self, addr: Address) -> Option<SpaceDescriptor> {
        self.spaces
            .iter()
            .find(|r| r.extent.contains(addr))
            .map(|r| r.extent.descriptor)
    }

    pub fn extent_of(&self, descriptor: SpaceDescriptor) -> Option<&SpaceExtent> {
        self.get(descriptor).map(|r| &r.extent)
    }

    pub fn name_of(&self, descriptor: SpaceDescriptor) -> Option<&'static str> {
        self.get(descriptor).map(|r| r.name)
    }

    pub fn num_spaces(&self) -> usize {
        self.spaces.len()
    }

    /// Iterate over `(name, extent)` of every space, in reservation order.
    pub fn spaces(&self) -> impl Iterator<Item = (&'static str, &SpaceExtent)> {
        self.spaces.iter().map(|r| (r.name, &r.extent))
    }

    fn get(&self, descriptor: SpaceDescriptor) -> Option<&Reservation> {
        if descriptor.is_empty() {
            return None;
        }
        self.spaces.get(descriptor.index() - 1)
    }
}

impl Drop for HeapLayout {
    fn drop(&mut self) {
        for r in self.spaces.drain(..) {
            if let Err(e) = memory::munmap(r.extent.start, r.reserved_bytes) {
                warn!("{}: failed to unmap its extent: {}", r.name, e);
            }
        }
    }
}
