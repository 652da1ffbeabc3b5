use crate::plan::{PlanCreateSpaceArgs, TraceLocal};
use crate::policy::space::{CommonSpace, Space};
use crate::util::constants::*;
use crate::util::header_byte;
use crate::util::heap::{FreeListPageResource, HeapLayoutError, PageResource};
use crate::util::metadata::SideTable;
use crate::util::opaque_pointer::*;
use crate::util::{Address, ObjectReference};
use crate::vm::VMBinding;
use static_assertions::const_assert;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Every block holds cells of one size class.
pub const BLOCK_SIZE: usize = 64 * BYTES_IN_KBYTE;

pub const SIZE_CLASSES: [usize; 19] = [
    16, 24, 32, 48, 64, 96, 128, 192, 256, 384, 512, 768, 1024, 1536, 2048, 3072, 4096, 6144,
    8192,
];
pub const NUM_SIZE_CLASSES: usize = SIZE_CLASSES.len();

const_assert!(SIZE_CLASSES[NUM_SIZE_CLASSES - 1] == MAX_NON_LOS_ALLOC_BYTES);

/// The smallest size class that fits `bytes`, if any.
pub fn size_class_for(bytes: usize) -> Option<usize> {
    SIZE_CLASSES.iter().position(|&size| size >= bytes)
}

const UNMARKED: u8 = 0;
const INITIAL_MARK_STATE: u8 = 1;

struct Block {
    start: Address,
    class: usize,
}

#[derive(Default)]
struct BlockLists {
    /// Free lists of blocks that no allocator owns, per size class.
    available: Vec<Vec<Address>>,
    blocks: Vec<Block>,
}

/// A non-moving space of segregated free lists.
///
/// Blocks of [`BLOCK_SIZE`] bytes are carved into cells of one size class. Each cell has a
/// mark byte in a side table, kept at the start of the cell even when the object inside was
/// aligned further in. A cell is live after a full-heap closure iff its mark byte
/// equals the current mark state, which alternates between 1 and 2. The sweep resets the
/// mark of every other cell to 0 and threads it onto the free list of its block.
pub struct MarkSweepSpace<VM: VMBinding> {
    common: CommonSpace<VM>,
    pr: FreeListPageResource,
    marks: SideTable<AtomicU8>,
    /// Per page: the start of the enclosing block, zero outside allocated blocks.
    block_starts: SideTable<AtomicUsize>,
    /// Per page: the size class of the enclosing block.
    block_classes: SideTable<AtomicU8>,
    mark_state: AtomicU8,
    lists: Mutex<BlockLists>,
}

impl<VM: VMBinding> Space<VM> for MarkSweepSpace<VM> {
    fn as_space(&self) -> &dyn Space<VM> {
        self
    }

    fn common(&self) -> &CommonSpace<VM> {
        &self.common
    }

    fn get_page_resource(&self) -> &dyn PageResource {
        &self.pr
    }

    fn is_live(&self, object: ObjectReference) -> bool {
        self.is_marked(object)
    }

    fn is_movable(&self) -> bool {
        false
    }

    fn post_copy(&self, object: ObjectReference, _bytes: usize) {
        self.mark_byte(object)
            .store(self.mark_state.load(Ordering::Relaxed), Ordering::Relaxed);
        header_byte::initialize::<VM>(object, self.descriptor(), self.common.needs_log_bit);
    }
}

impl<VM: VMBinding> MarkSweepSpace<VM> {
    pub fn new(args: PlanCreateSpaceArgs<VM>) -> Result<Self, HeapLayoutError> {
        let common = CommonSpace::new(args)?;
        let marks = SideTable::new(common.extent.start, common.extent.extent, LOG_MIN_OBJECT_SIZE)
            .map_err(|e| common.metadata_error(e))?;
        let block_starts =
            SideTable::new(common.extent.start, common.extent.extent, LOG_BYTES_IN_PAGE)
                .map_err(|e| common.metadata_error(e))?;
        let block_classes =
            SideTable::new(common.extent.start, common.extent.extent, LOG_BYTES_IN_PAGE)
                .map_err(|e| common.metadata_error(e))?;
        Ok(MarkSweepSpace {
            pr: FreeListPageResource::new(common.extent),
            marks,
            block_starts,
            block_classes,
            common,
            mark_state: AtomicU8::new(INITIAL_MARK_STATE),
            lists: Mutex::new(BlockLists {
                available: vec![vec![]; NUM_SIZE_CLASSES],
                blocks: vec![],
            }),
        })
    }

    /// The cell that holds `object`.
    fn cell_of(&self, object: ObjectReference) -> Address {
        let addr = object.to_address();
        let block = self.block_starts.get(addr).load(Ordering::Relaxed);
        debug_assert!(block != 0, "{}: {} is not in a block", self.name(), object);
        let block = unsafe { Address::from_usize(block) };
        let size = SIZE_CLASSES[self.block_classes.get(addr).load(Ordering::Relaxed) as usize];
        block + (addr - block) / size * size
    }

    fn mark_byte(&self, object: ObjectReference) -> &AtomicU8 {
        self.marks.get(self.cell_of(object))
    }

    fn map_block(&self, start: Address, class: usize) {
        for page in (0..BLOCK_SIZE).step_by(BYTES_IN_PAGE) {
            self.block_starts
                .get(start + page)
                .store(start.as_usize(), Ordering::Relaxed);
            self.block_classes
                .get(start + page)
                .store(class as u8, Ordering::Relaxed);
        }
    }

    pub fn is_marked(&self, object: ObjectReference) -> bool {
        self.mark_byte(object).load(Ordering::SeqCst) == self.mark_state.load(Ordering::SeqCst)
    }

    /// Mark `object`. Returns false if it was already marked in this collection.
    fn test_and_mark(&self, object: ObjectReference) -> bool {
        let state = self.mark_state.load(Ordering::Relaxed);
        let mark = self.mark_byte(object);
        let mut old = mark.load(Ordering::SeqCst);
        loop {
            if old == state {
                return false;
            }
            match mark.compare_exchange_weak(old, state, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return true,
                Err(current) => old = current,
            }
        }
    }

    pub fn trace_object(&self, trace: &mut TraceLocal<VM>, object: ObjectReference) -> ObjectReference {
        if self.test_and_mark(object) {
            trace!("{}: marked {}", self.name(), object);
            self.common.stats.object_marked();
            trace.process_node(object);
        }
        object
    }

    /// Hand the free cells of one block of size class `class` to an allocator. Returns the
    /// first free cell, or zero if no block could be had.
    pub fn acquire_free_cells(&self, tls: VMThread, class: usize) -> Address {
        if let Some(head) = self.lists.lock().unwrap().available[class].pop() {
            return head;
        }
        let start = self.acquire(tls, BLOCK_SIZE);
        if start.is_zero() {
            return start;
        }
        let size = SIZE_CLASSES[class];
        let cells = BLOCK_SIZE / size;
        for i in 0..cells - 1 {
            let cell = start + i * size;
            unsafe { cell.store::<Address>(cell + size) };
        }
        // The last cell is fresh zeroed memory, which ends the list.
        self.map_block(start, class);
        self.lists.lock().unwrap().blocks.push(Block { start, class });
        trace!("{}: new block {} of {}-byte cells", self.name(), start, size);
        start
    }

    /// Start a full-heap collection.
    pub fn prepare(&self) {
        self.common.start_cycle();
        let old = self.mark_state.load(Ordering::SeqCst);
        self.mark_state.store(3 - old, Ordering::SeqCst);
    }

    /// Sweep every block. Must run after every allocator dropped its free lists.
    pub fn release(&self) {
        self.common.end_cycle();
        let state = self.mark_state.load(Ordering::SeqCst);
        let mut lists = self.lists.lock().unwrap();
        lists.available.iter_mut().for_each(|list| list.clear());

        let mut kept = Vec::with_capacity(lists.blocks.len());
        let mut live_cells = 0;
        let mut freed_blocks = 0;
        for block in std::mem::take(&mut lists.blocks) {
            let size = SIZE_CLASSES[block.class];
            let mut head = Address::ZERO;
            let mut live = 0;
            // Walk backwards so the free list comes out in address order.
            for i in (0..BLOCK_SIZE / size).rev() {
                let cell = block.start + i * size;
                let mark = self.marks.get(cell);
                if mark.load(Ordering::Relaxed) == state {
                    live += 1;
                } else {
                    mark.store(UNMARKED, Ordering::Relaxed);
                    unsafe { cell.store::<Address>(head) };
                    head = cell;
                }
            }
            if live == 0 {
                self.marks.clear_range(block.start, BLOCK_SIZE);
                self.block_starts.clear_range(block.start, BLOCK_SIZE);
                self.block_classes.clear_range(block.start, BLOCK_SIZE);
                self.pr.release_pages(block.start);
                freed_blocks += 1;
                continue;
            }
            live_cells += live;
            if !head.is_zero() {
                lists.available[block.class].push(head);
            }
            kept.push(block);
        }
        lists.blocks = kept;
        debug!(
            "{}: swept, {} live cells in {} blocks, {} blocks freed",
            self.name(),
            live_cells,
            lists.blocks.len(),
            freed_blocks
        );
    }

    pub fn block_count(&self) -> usize {
        self.lists.lock().unwrap().blocks.len()
    }
}
