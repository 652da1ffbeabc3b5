use super::mock_test_prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const SEED: u64 = 0x6763_5f72_616e_64;
const ROOTS: usize = 8;
const NREFS: usize = 3;
const ROUNDS: usize = 12;
const NEW_PER_ROUND: usize = 60;
const STORES_PER_ROUND: usize = 120;

/// The object graph as the test expects it to be, by node id.
#[derive(Default)]
struct Shadow {
    edges: BTreeMap<usize, [Option<usize>; NREFS]>,
    roots: [Option<usize>; ROOTS],
}

impl Shadow {
    fn reachable(&self) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut work: Vec<usize> = self.roots.iter().flatten().copied().collect();
        while let Some(id) = work.pop() {
            if seen.insert(id) {
                work.extend(self.edges[&id].iter().flatten().copied());
            }
        }
        seen
    }

    fn forget_unreachable(&mut self) {
        let reachable = self.reachable();
        self.edges.retain(|id, _| reachable.contains(id));
    }
}

/// Walk the heap from the mock roots, checking every edge against the shadow. Returns the
/// current address of every reachable node.
fn walk_heap(shadow: &Shadow, root_indices: &[usize]) -> HashMap<usize, ObjectReference> {
    let mut objects = HashMap::new();
    let mut work = vec![];
    for (i, &index) in root_indices.iter().enumerate() {
        let object = root(index);
        match shadow.roots[i] {
            Some(id) => {
                assert_eq!(id_of(object), id, "root {}", i);
                work.push(object);
            }
            None => assert!(object.is_null(), "root {}", i),
        }
    }
    while let Some(object) = work.pop() {
        let id = id_of(object);
        if let Some(&seen) = objects.get(&id) {
            assert_eq!(seen, object, "node {} is reachable at two addresses", id);
            continue;
        }
        objects.insert(id, object);
        let expected = match shadow.edges.get(&id) {
            Some(edges) => edges,
            None => panic!("node {} at {} should be unreachable", id, object),
        };
        for (slot, target) in expected.iter().enumerate() {
            let child = get_ref(object, slot);
            match target {
                Some(target) => {
                    assert!(!child.is_null(), "node {} slot {} lost its target", id, slot);
                    assert_eq!(id_of(child), *target, "node {} slot {}", id, slot);
                    work.push(child);
                }
                None => assert!(child.is_null(), "node {} slot {}", id, slot),
            }
        }
    }
    objects
}

fn pick(rng: &mut ChaCha8Rng, ids: &[usize], null_chance: f64) -> Option<usize> {
    if rng.random_bool(null_chance) {
        None
    } else {
        Some(ids[rng.random_range(0..ids.len())])
    }
}

fn object_of(live: &HashMap<usize, ObjectReference>, id: Option<usize>) -> ObjectReference {
    id.map_or(ObjectReference::NULL, |id| live[&id])
}

fn mutate_and_collect(plan: PlanSelector) {
    let fixture = MutatorFixture::create_with_plan(plan);
    let mmtk = fixture.mmtk;
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let root_indices: Vec<usize> = (0..ROOTS).map(|_| add_root(ObjectReference::NULL)).collect();
    let mut shadow = Shadow::default();
    let mut next_id = 0;

    for round in 0..ROUNDS {
        let mut live = walk_heap(&shadow, &root_indices);
        assert_eq!(
            live.keys().copied().collect::<BTreeSet<_>>(),
            shadow.reachable(),
            "round {}",
            round
        );
        shadow.forget_unreachable();

        // Some new nodes go straight to the mature space, so that stores into them create
        // old-to-young edges.
        for _ in 0..NEW_PER_ROUND {
            let semantics = if rng.random_bool(0.25) {
                AllocationSemantics::Mature
            } else {
                AllocationSemantics::Default
            };
            let object = alloc_with_id(fixture.mutator, NREFS, next_id, semantics);
            shadow.edges.insert(next_id, [None; NREFS]);
            live.insert(next_id, object);
            next_id += 1;
        }

        let ids: Vec<usize> = live.keys().copied().collect();
        for _ in 0..STORES_PER_ROUND {
            let src = ids[rng.random_range(0..ids.len())];
            let slot = rng.random_range(0..NREFS);
            let target = pick(&mut rng, &ids, 0.2);
            set_ref(fixture.mutator, live[&src], slot, object_of(&live, target));
            if let Some(edges) = shadow.edges.get_mut(&src) {
                edges[slot] = target;
            }
        }
        for (i, &index) in root_indices.iter().enumerate() {
            if rng.random_bool(0.3) {
                let target = pick(&mut rng, &ids, 0.2);
                set_root(index, object_of(&live, target));
                shadow.roots[i] = target;
            }
        }

        if round % 4 == 3 {
            if let Some(plan) = mmtk.get_plan().downcast_ref::<GenCopyMS<MockVM>>() {
                plan.force_full_heap_collection();
            }
        }
        fixture.collect();
        assert_eq!(memory_manager::gc_count(mmtk), round + 1);
    }

    let live = walk_heap(&shadow, &root_indices);
    assert_eq!(live.keys().copied().collect::<BTreeSet<_>>(), shadow.reachable());
    for object in live.values() {
        assert!(memory_manager::is_in_mmtk_spaces(mmtk, *object));
    }
}

#[test]
pub fn random_graph_gencopyms() {
    with_mockvm(
        default_setup,
        || mutate_and_collect(PlanSelector::GenCopyMS),
        no_cleanup,
    )
}

#[test]
pub fn random_graph_semispace() {
    with_mockvm(
        default_setup,
        || mutate_and_collect(PlanSelector::SemiSpace),
        no_cleanup,
    )
}
