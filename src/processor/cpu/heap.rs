use crate::processor::errors::ProcessorError;
use std::ops::Range;

/// Blocks handed out by the memory allocation set.
///
/// Memory layout: `[program][heap region][stack]`
/// - **Program**: the loaded image, `[0, floor)`. Never allocated.
/// - **Heap region**: blocks placed first-fit, sorted by start address and
///   never overlapping.
/// - **Stack**: `[rso, capacity)`. Callers pass the current stack top as the
///   ceiling so a block never covers live stack memory.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Heap {
    blocks: Vec<Range<u64>>,
    floor: u64,
}

impl Heap {
    /// Empty block map whose heap region starts at `floor`.
    pub fn new(floor: u64) -> Self {
        Self {
            blocks: Vec::new(),
            floor,
        }
    }

    /// Allocated blocks in address order.
    pub fn blocks(&self) -> &[Range<u64>] {
        &self.blocks
    }

    /// First address past the program image.
    pub fn floor(&self) -> u64 {
        self.floor
    }

    pub(super) fn set_floor(&mut self, floor: u64) {
        self.floor = floor;
    }

    /// Places a block of `size` bytes at the lowest address where it fits
    /// below `ceiling`, and returns that address.
    pub fn allocate(&mut self, size: u64, ceiling: u64) -> Result<u64, ProcessorError> {
        if size == 0 {
            return Err(ProcessorError::MemoryAllocation { size });
        }
        let start = self
            .find_gap(size, ceiling, None)
            .ok_or(ProcessorError::MemoryAllocation { size })?;
        self.insert(start..start + size);
        Ok(start)
    }

    /// Releases the block starting at `address` and returns its range.
    pub fn free(&mut self, address: u64) -> Result<Range<u64>, ProcessorError> {
        let index = self.index_of(address)?;
        Ok(self.blocks.remove(index))
    }

    /// Resizes the block starting at `address` to `size` bytes. The block
    /// stays put when it shrinks or the space after it is free, otherwise it
    /// moves to the lowest gap that fits.
    ///
    /// Returns the old and new ranges; moving the contents is up to the
    /// caller. On error the map is unchanged.
    pub fn reallocate(
        &mut self,
        address: u64,
        size: u64,
        ceiling: u64,
    ) -> Result<(Range<u64>, Range<u64>), ProcessorError> {
        let index = self.index_of(address)?;
        if size == 0 {
            return Err(ProcessorError::MemoryAllocation { size });
        }
        let old = self.blocks[index].clone();
        let limit = self
            .blocks
            .get(index + 1)
            .map_or(ceiling, |next| next.start);
        let fits_in_place = size <= old.end - old.start
            || limit.checked_sub(old.start).is_some_and(|room| room >= size);
        let start = if fits_in_place {
            old.start
        } else {
            self.find_gap(size, ceiling, Some(index))
                .ok_or(ProcessorError::MemoryAllocation { size })?
        };
        self.blocks.remove(index);
        let new = start..start + size;
        self.insert(new.clone());
        Ok((old, new))
    }

    fn index_of(&self, address: u64) -> Result<usize, ProcessorError> {
        self.blocks
            .binary_search_by_key(&address, |block| block.start)
            .map_err(|_| ProcessorError::InvalidMemoryBlock { address })
    }

    fn insert(&mut self, block: Range<u64>) {
        let index = self.blocks.partition_point(|other| other.start < block.start);
        self.blocks.insert(index, block);
    }

    /// Lowest start in `[floor, ceiling)` with `size` free bytes, treating the
    /// block at `skip` as free.
    fn find_gap(&self, size: u64, ceiling: u64, skip: Option<usize>) -> Option<u64> {
        let fits = |start: u64, end: u64| end.checked_sub(start).is_some_and(|room| room >= size);
        let mut start = self.floor;
        for (index, block) in self.blocks.iter().enumerate() {
            if Some(index) == skip {
                continue;
            }
            if fits(start, block.start.min(ceiling)) {
                return Some(start);
            }
            start = start.max(block.end);
        }
        fits(start, ceiling).then_some(start)
    }
}
