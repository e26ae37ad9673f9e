//! Extended base set: byte swapping, processor queries, halting with an exit
//! code and pointer address materialisation. None of these touch `rsf`.

use super::Processor;
use super::base::CALL_FRAME_SIZE;
use crate::processor::errors::ProcessorError;
use crate::processor::operand::Operand;

/// Extension sets this processor executes, one bit per set byte.
pub(super) const SUPPORTED_FEATURES: u64 = 0b11_1110;

fn version_part(text: &str) -> u64 {
    text.parse().unwrap_or(0)
}

impl Processor {
    pub(super) fn op_byte_swap(&mut self, instr: &'static str, dst: Operand) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let swapped = self.registers.get(register).swap_bytes();
        self.registers.set(register, swapped)
    }

    pub(super) fn op_query_features(
        &mut self,
        instr: &'static str,
        dst: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        self.registers.set(register, SUPPORTED_FEATURES)
    }

    pub(super) fn op_query_major(
        &mut self,
        instr: &'static str,
        major: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, major)?;
        self.registers
            .set(register, version_part(env!("CARGO_PKG_VERSION_MAJOR")))
    }

    pub(super) fn op_query_version(
        &mut self,
        instr: &'static str,
        major: Operand,
        minor: Operand,
    ) -> Result<(), ProcessorError> {
        let major = self.target_register(instr, major)?;
        let minor = self.target_register(instr, minor)?;
        self.registers
            .set(major, version_part(env!("CARGO_PKG_VERSION_MAJOR")))?;
        self.registers
            .set(minor, version_part(env!("CARGO_PKG_VERSION_MINOR")))
    }

    pub(super) fn op_call_stack_size(
        &mut self,
        instr: &'static str,
        dst: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        self.registers.set(register, CALL_FRAME_SIZE)
    }

    /// Halts, recording the low 32 bits of `code` as the exit code.
    pub(super) fn op_halt_with(&mut self, _instr: &'static str, code: Operand) -> Result<(), ProcessorError> {
        let code = self.load(code)?;
        self.exit_code = Some(code as u32 as i32);
        self.halted = true;
        Ok(())
    }

    /// Stores the address `src` points at, not the value there. A pointer
    /// destination is written with its own width.
    pub(super) fn op_memory_address(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let address = self.address_of(src);
        self.store(instr, dst, address)
    }
}
