//! GC metadata kept outside objects.
//!
//! Per-object state that the collector owns (forwarding states, forwarding pointers, mark
//! states) lives in side tables indexed by slot. The only bits kept in the object itself are
//! in the GC header byte the VM provides, see [`crate::util::header_byte`].

pub mod side_table;

pub use side_table::{SideEntry, SideTable};
