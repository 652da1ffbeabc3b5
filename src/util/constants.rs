use static_assertions::const_assert;

/// log2 of the number of bits in a byte
pub const LOG_BITS_IN_BYTE: u8 = 3;
/// The number of bits in a byte
pub const BITS_IN_BYTE: usize = 1 << LOG_BITS_IN_BYTE;

/// log2 of the number of bytes in a megabyte
pub const LOG_BYTES_IN_MBYTE: u8 = 20;
/// The number of bytes in a megabyte
pub const BYTES_IN_MBYTE: usize = 1 << LOG_BYTES_IN_MBYTE;

/// log2 of the number of bytes in a kilobyte
pub const LOG_BYTES_IN_KBYTE: u8 = 10;
/// The number of bytes in a kilobyte
pub const BYTES_IN_KBYTE: usize = 1 << LOG_BYTES_IN_KBYTE;

#[cfg(target_pointer_width = "32")]
/// log2 of the number of bytes in an address
pub const LOG_BYTES_IN_ADDRESS: u8 = 2;
#[cfg(target_pointer_width = "64")]
/// log2 of the number of bytes in an address
pub const LOG_BYTES_IN_ADDRESS: u8 = 3;
/// The number of bytes in an address
pub const BYTES_IN_ADDRESS: usize = 1 << LOG_BYTES_IN_ADDRESS;

/// log2 of the number of bytes in a word
pub const LOG_BYTES_IN_WORD: u8 = LOG_BYTES_IN_ADDRESS;
/// The number of bytes in a word
pub const BYTES_IN_WORD: usize = 1 << LOG_BYTES_IN_WORD;

/// log2 of the number of bytes in a page
pub const LOG_BYTES_IN_PAGE: u8 = 12;
/// The number of bytes in a page
pub const BYTES_IN_PAGE: usize = 1 << LOG_BYTES_IN_PAGE;

/// log2 of the granularity at which space extents are reserved.
pub const LOG_BYTES_IN_CHUNK: usize = 22;
/// Space extents are reserved and aligned in chunks of this many bytes.
pub const BYTES_IN_CHUNK: usize = 1 << LOG_BYTES_IN_CHUNK;
pub const PAGES_IN_CHUNK: usize = BYTES_IN_CHUNK >> LOG_BYTES_IN_PAGE;

/// log2 of the minimal object size in bytes.
///
/// Allocators round every request up to this size, so two objects never start within the same
/// granule. Side tables rely on this to give every object its own slot.
pub const LOG_MIN_OBJECT_SIZE: u8 = LOG_BYTES_IN_WORD + 1;
/// The minimal object size in bytes
pub const MIN_OBJECT_SIZE: usize = 1 << LOG_MIN_OBJECT_SIZE;

/// The minimal alignment every allocation honours.
pub const MIN_ALIGNMENT: usize = BYTES_IN_WORD;
/// The largest alignment an allocation may request.
pub const MAX_ALIGNMENT: usize = BYTES_IN_PAGE;

/// Requests larger than this go to the large object space.
pub const MAX_NON_LOS_ALLOC_BYTES: usize = 8 * BYTES_IN_KBYTE;

/// The default number of bytes a bump allocator claims from its space per refill.
pub const DEFAULT_BUMP_CHUNK_SIZE: usize = 32 * BYTES_IN_KBYTE;

/// Collections attempted for one allocation before the heap is declared exhausted.
pub const DEFAULT_MAX_COLLECTION_ATTEMPTS: usize = 3;

const_assert!(MIN_OBJECT_SIZE >= 2 * BYTES_IN_WORD);
const_assert!(MAX_NON_LOS_ALLOC_BYTES < BYTES_IN_CHUNK);
