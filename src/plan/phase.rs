//! The phases of a collection and the order they run in.

/// Who executes a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schedule {
    /// Once, on the thread that drives the collection.
    Global,
    /// Once per collector thread, in parallel.
    Collector,
    /// Once per mutator, on the thread that drives the collection.
    Mutator,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    /// Enumerate roots. Only the primary collector does any work.
    Roots,
    /// Compute the transitive closure.
    Closure,
    Release,
}

/// A stop-the-world collection.
pub const COLLECTION: &[(Schedule, Phase)] = &[
    (Schedule::Global, Phase::Prepare),
    (Schedule::Mutator, Phase::Prepare),
    (Schedule::Collector, Phase::Prepare),
    (Schedule::Collector, Phase::Roots),
    (Schedule::Collector, Phase::Closure),
    (Schedule::Collector, Phase::Release),
    (Schedule::Mutator, Phase::Release),
    (Schedule::Global, Phase::Release),
];
