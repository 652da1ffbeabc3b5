pub use self::local_queue::LocalQueue;
pub use self::shared_queue::SharedQueue;
use crate::util::constants::{LOG_BYTES_IN_ADDRESS, LOG_BYTES_IN_PAGE};

mod local_queue;
mod shared_queue;

/// Entries per packet: a page worth of references.
const BUFFER_SIZE: usize = 1 << (LOG_BYTES_IN_PAGE - LOG_BYTES_IN_ADDRESS);
