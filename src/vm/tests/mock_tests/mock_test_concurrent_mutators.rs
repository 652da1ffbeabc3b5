use super::mock_test_prelude::*;
use crate::util::constants::BYTES_IN_PAGE;
use crate::MMTK;
use std::sync::{Mutex, MutexGuard};
use std::thread;

const MUTATORS: usize = 4;
const ROUNDS: usize = 200;
const GARBAGE_PER_ROUND: usize = 64;
const GARBAGE_BYTES: usize = 512;

// The mock cannot stop a running thread, so mutators only touch the heap while holding this
// lock. Between steps a thread holds nothing but root indices, like a thread parked at a
// safepoint. Collections still run from whichever thread's allocation triggers them.
lazy_static! {
    static ref HEAP_LOCK: Mutex<()> = Mutex::new(());
}

// A failed mutator thread poisons the lock. The other threads go on and fail on their own.
fn heap() -> MutexGuard<'static, ()> {
    HEAP_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Expected {
    /// Root index of a parent, and the id of the young child it points to.
    parents: Vec<(usize, usize)>,
    /// Root index of the head of a list, and the ids of its nodes from head to tail.
    list: (usize, Vec<usize>),
}

fn parent_semantics(round: usize) -> AllocationSemantics {
    match round % 10 {
        0 => AllocationSemantics::Los,
        1..=4 => AllocationSemantics::Immortal,
        _ => AllocationSemantics::Mature,
    }
}

fn run_mutator(mmtk: &'static MMTK<MockVM>, n: usize) -> Expected {
    let mutator = {
        let _heap = heap();
        let mutator = Box::leak(memory_manager::bind_mutator(mmtk, mutator_tls(n)));
        register_mutator(mutator);
        mutator
    };
    let head = {
        let _heap = heap();
        add_root(ObjectReference::NULL)
    };
    let mut expected = Expected {
        parents: vec![],
        list: (head, vec![]),
    };

    for round in 0..ROUNDS {
        let id = n * 1_000_000 + round * 10;
        {
            let _heap = heap();
            for _ in 0..GARBAGE_PER_ROUND {
                let garbage = alloc_object_with_size(mutator, GARBAGE_BYTES, 0, AllocationSemantics::Default);
                assert!(!garbage.is_null());
            }
        }
        let parent = {
            let _heap = heap();
            let semantics = parent_semantics(round);
            let parent = if semantics == AllocationSemantics::Los {
                let large = alloc_object_with_size(mutator, 2 * BYTES_IN_PAGE, 1, semantics);
                assert!(!large.is_null());
                unsafe { payload(large).store::<usize>(id) };
                large
            } else {
                alloc_with_id(mutator, 1, id, semantics)
            };
            add_root(parent)
        };
        {
            // Old parent, young child: only the write barrier keeps the child alive in a
            // nursery collection.
            let _heap = heap();
            let child = alloc_with_id(mutator, 0, id + 1, AllocationSemantics::Default);
            set_ref(mutator, root(parent), 0, child);
        }
        expected.parents.push((parent, id + 1));
        {
            let _heap = heap();
            let node = alloc_with_id(mutator, 1, id + 2, AllocationSemantics::Default);
            set_ref(mutator, node, 0, root(head));
            set_root(head, node);
        }
        expected.list.1.insert(0, id + 2);
    }
    expected
}

fn check(expected: &Expected) {
    for &(parent, child_id) in &expected.parents {
        let parent = root(parent);
        assert_eq!(id_of(parent) + 1, child_id);
        let child = get_ref(parent, 0);
        assert!(!child.is_null());
        assert_eq!(id_of(child), child_id);
    }
    let (head, ids) = &expected.list;
    let mut node = root(*head);
    for &id in ids {
        assert!(!node.is_null(), "list ends before node {}", id);
        assert_eq!(id_of(node), id);
        node = get_ref(node, 0);
    }
    assert!(node.is_null());
}

fn concurrent_mutators(plan: PlanSelector) {
    let fixture = MutatorFixture::create_with_builder(
        |builder| {
            builder.options.plan = plan;
            builder.options.threads = 4;
            builder.options.max_nursery = 256 << 10;
        },
        true,
    );
    let mmtk = fixture.mmtk;

    let results: Vec<Expected> = thread::scope(|s| {
        let handles: Vec<_> = (1..=MUTATORS)
            .map(|n| s.spawn(move || run_mutator(mmtk, n)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(memory_manager::gc_count(mmtk) > 0, "allocation never triggered a collection");
    for expected in &results {
        check(expected);
    }

    // Everything rooted also survives one more collection.
    fixture.collect();
    for expected in &results {
        check(expected);
    }
}

#[test]
pub fn concurrent_mutators_gencopyms() {
    with_mockvm(
        default_setup,
        || concurrent_mutators(PlanSelector::GenCopyMS),
        no_cleanup,
    )
}

#[test]
pub fn concurrent_mutators_semispace() {
    with_mockvm(
        default_setup,
        || concurrent_mutators(PlanSelector::SemiSpace),
        no_cleanup,
    )
}
