//! Plan-specific constraints.

use crate::plan::barriers::BarrierSelector;
use crate::util::constants::*;

/// Constants that differ between plans. Each plan defines a `static` of this type.
#[derive(Debug)]
pub struct PlanConstraints {
    /// Does the plan ever move objects?
    pub moves_objects: bool,
    /// Mutator requests larger than this go to the large object space.
    pub max_non_los_default_alloc_bytes: usize,
    /// Copies larger than this go to the large object space.
    pub max_non_los_copy_bytes: usize,
    /// Do objects outside the nursery start with the unlogged bit set?
    pub needs_log_bit: bool,
    pub barrier: BarrierSelector,
    /// Does the plan distinguish nursery and full-heap collections?
    pub generational: bool,
}

impl PlanConstraints {
    pub const fn default() -> Self {
        PlanConstraints {
            moves_objects: false,
            max_non_los_default_alloc_bytes: MAX_NON_LOS_ALLOC_BYTES,
            max_non_los_copy_bytes: MAX_NON_LOS_ALLOC_BYTES,
            needs_log_bit: false,
            barrier: BarrierSelector::NoBarrier,
            generational: false,
        }
    }
}
