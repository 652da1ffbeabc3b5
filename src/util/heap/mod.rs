mod accounting;
pub mod freelistpageresource;
pub mod gc_trigger;
pub mod heap_layout;
pub mod monotonepageresource;
pub mod pageresource;
mod vmrequest;

pub use self::accounting::PageAccounting;
pub use self::freelistpageresource::FreeListPageResource;
pub use self::gc_trigger::GCTrigger;
pub use self::heap_layout::{HeapLayout, HeapLayoutError, SpaceDescriptor, SpaceExtent};
pub use self::monotonepageresource::MonotonePageResource;
pub use self::pageresource::{PageResource, PageResourceError};
pub use self::vmrequest::VMRequest;
