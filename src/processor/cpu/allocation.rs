//! Memory allocation set. Blocks are placed between the program image and the
//! stack top by [`Heap`](super::heap::Heap). None of these touch `rsf`.

use super::Processor;
use crate::processor::errors::ProcessorError;
use crate::processor::operand::Operand;
use crate::processor::register::Register;
use std::ops::Range;

/// Written by `HEAP_TRY` and `HEAP_TRE` when no free region is large enough.
const NO_ROOM: u64 = u64::MAX;
/// Written by `HEAP_TRE` when the register does not hold a block address.
const NOT_A_BLOCK: u64 = u64::MAX - 1;

impl Processor {
    /// Highest address a block may reach: the stack top, or the end of memory
    /// if `rso` points past it.
    pub(super) fn heap_ceiling(&self) -> u64 {
        self.registers
            .get(Register::Rso)
            .min(self.memory.capacity() as u64)
    }

    pub(super) fn op_heap_allocate(
        &mut self,
        instr: &'static str,
        dst: Operand,
        size: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let size = self.load(size)?;
        let address = self.allocate_memory(size)?;
        self.registers.set(register, address)
    }

    pub(super) fn op_heap_try_allocate(
        &mut self,
        instr: &'static str,
        dst: Operand,
        size: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let size = self.load(size)?;
        let address = match self.allocate_memory(size) {
            Err(ProcessorError::MemoryAllocation { .. }) => NO_ROOM,
            result => result?,
        };
        self.registers.set(register, address)
    }

    /// Resizes the block whose address `block` holds, then moves its contents
    /// if it was relocated.
    fn reallocate_block(
        &mut self,
        block: Register,
        size: u64,
    ) -> Result<u64, ProcessorError> {
        let ceiling = self.heap_ceiling();
        let (old, new) = self
            .heap
            .reallocate(self.registers.get(block), size, ceiling)?;
        self.move_block(old, new.clone())?;
        Ok(new.start)
    }

    /// Copies the bytes both ranges have in common from `old` to `new`.
    fn move_block(&mut self, old: Range<u64>, new: Range<u64>) -> Result<(), ProcessorError> {
        if old.start == new.start {
            return Ok(());
        }
        let kept = (old.end - old.start).min(new.end - new.start);
        self.memory.copy_within(old.start, new.start, kept as usize)
    }

    pub(super) fn op_heap_reallocate(
        &mut self,
        instr: &'static str,
        block: Operand,
        size: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, block)?;
        let size = self.load(size)?;
        let address = self.reallocate_block(register, size)?;
        self.registers.set(register, address)
    }

    pub(super) fn op_heap_try_reallocate(
        &mut self,
        instr: &'static str,
        block: Operand,
        size: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, block)?;
        let size = self.load(size)?;
        let address = match self.reallocate_block(register, size) {
            Err(ProcessorError::MemoryAllocation { .. }) => NO_ROOM,
            Err(ProcessorError::InvalidMemoryBlock { .. }) => NOT_A_BLOCK,
            result => result?,
        };
        self.registers.set(register, address)
    }

    pub(super) fn op_heap_free(
        &mut self,
        _instr: &'static str,
        block: Operand,
    ) -> Result<(), ProcessorError> {
        let address = self.load(block)?;
        self.free_memory(address)
    }
}
