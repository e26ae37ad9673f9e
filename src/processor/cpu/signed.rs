//! Signed extension set. Register bit patterns are reinterpreted as two's
//! complement. The signed jumps share the base jump handler.

use super::Processor;
use crate::processor::errors::ProcessorError;
use crate::processor::operand::{Operand, Width};

impl Processor {
    pub(super) fn op_signed_div(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let divisor = self.load_divisor(instr, src)? as i64;
        let result = (self.registers.get(register) as i64).wrapping_div(divisor);
        self.set_with_result_flags(register, result as u64)
    }

    pub(super) fn op_signed_dvr(
        &mut self,
        instr: &'static str,
        quot: Operand,
        rem: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let quot = self.target_register(instr, quot)?;
        let rem = self.target_register(instr, rem)?;
        let divisor = self.load_divisor(instr, src)? as i64;
        let dividend = self.registers.get(quot) as i64;
        self.store_division(
            quot,
            rem,
            dividend.wrapping_div(divisor) as u64,
            dividend.wrapping_rem(divisor) as u64,
        )
    }

    pub(super) fn op_signed_rem(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let divisor = self.load_divisor(instr, src)? as i64;
        let result = (self.registers.get(register) as i64).wrapping_rem(divisor);
        self.set_with_result_flags(register, result as u64)
    }

    /// Arithmetic right shift. Unlike `SHR`, a zero amount still refreshes
    /// Zero and Sign and clears Carry. For amounts below 64, Carry is set when
    /// a set bit is shifted out or sign bits are shifted in.
    pub(super) fn op_signed_shr(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let amount = self.load(src)?;
        let initial = self.registers.get(register) as i64;
        let (result, carry) = match amount {
            0 => (initial, false),
            64.. => (initial >> 63, false),
            _ => (
                initial >> amount,
                initial < 0 || initial as u64 & ((1u64 << amount) - 1) != 0,
            ),
        };
        self.store_shift(register, result as u64, carry)
    }

    /// Sign-extending move into a register.
    pub(super) fn op_signed_move(
        &mut self,
        instr: &'static str,
        width: Width,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let value = self.load_width(src, width)?;
        self.registers.set(register, width.sign_extend(value))
    }

    pub(super) fn op_sign_extend(
        &mut self,
        instr: &'static str,
        width: Width,
        dst: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let result = width.sign_extend(self.registers.get(register));
        self.set_with_result_flags(register, result)
    }

    pub(super) fn op_negate(&mut self, instr: &'static str, dst: Operand) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let result = (self.registers.get(register) as i64).wrapping_neg() as u64;
        self.set_with_result_flags(register, result)
    }
}
