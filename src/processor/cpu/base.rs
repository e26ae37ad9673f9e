//! Base instruction set: control flow, integer arithmetic, bitwise logic,
//! moves and the stack.

use super::Processor;
use crate::processor::errors::ProcessorError;
use crate::processor::flags::{Condition, StatusFlags};
use crate::processor::operand::{Operand, Width};
use crate::processor::register::Register;

/// Bytes pushed by a call: return address then saved `rsb`.
pub(super) const CALL_FRAME_SIZE: u64 = 16;

/// Flags of `lhs - rhs`: all four arithmetic bits.
fn subtraction_flags(lhs: u64, rhs: u64) -> (u64, StatusFlags) {
    let (result, borrow) = lhs.overflowing_sub(rhs);
    let overflow = (lhs as i64).overflowing_sub(rhs as i64).1;
    let flags = StatusFlags::of_result(result)
        | StatusFlags::when(StatusFlags::CARRY, borrow)
        | StatusFlags::when(StatusFlags::OVERFLOW, overflow);
    (result, flags)
}

fn addition_flags(lhs: u64, rhs: u64) -> (u64, StatusFlags) {
    let (result, carry) = lhs.overflowing_add(rhs);
    let overflow = (lhs as i64).overflowing_add(rhs as i64).1;
    let flags = StatusFlags::of_result(result)
        | StatusFlags::when(StatusFlags::CARRY, carry)
        | StatusFlags::when(StatusFlags::OVERFLOW, overflow);
    (result, flags)
}

impl Processor {
    // ==================== Control ====================

    pub(super) fn op_halt(&mut self, _instr: &'static str) -> Result<(), ProcessorError> {
        self.halted = true;
        Ok(())
    }

    pub(super) fn op_nop(&mut self, _instr: &'static str) -> Result<(), ProcessorError> {
        Ok(())
    }

    pub(super) fn op_jump(
        &mut self,
        _instr: &'static str,
        condition: Condition,
        target: Operand,
    ) -> Result<(), ProcessorError> {
        if condition.holds(self.registers.flags()) {
            self.next_offset = self.address_of(target);
        }
        Ok(())
    }

    // ==================== Arithmetic ====================

    pub(super) fn op_add(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let rhs = self.load(src)?;
        let (result, flags) = addition_flags(self.registers.get(register), rhs);
        self.registers.set(register, result)?;
        self.registers.update_flags(StatusFlags::ARITHMETIC, flags);
        Ok(())
    }

    pub(super) fn op_increment(
        &mut self,
        instr: &'static str,
        dst: Operand,
    ) -> Result<(), ProcessorError> {
        self.op_add(instr, dst, Operand::Literal(1))
    }

    pub(super) fn op_sub(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let rhs = self.load(src)?;
        let (result, flags) = subtraction_flags(self.registers.get(register), rhs);
        self.registers.set(register, result)?;
        self.registers.update_flags(StatusFlags::ARITHMETIC, flags);
        Ok(())
    }

    pub(super) fn op_decrement(
        &mut self,
        instr: &'static str,
        dst: Operand,
    ) -> Result<(), ProcessorError> {
        self.op_sub(instr, dst, Operand::Literal(1))
    }

    pub(super) fn op_mul(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let rhs = self.load(src)?;
        let product = self.registers.get(register) as u128 * rhs as u128;
        let result = product as u64;
        self.registers.set(register, result)?;
        self.registers.update_flags(
            StatusFlags::ZERO | StatusFlags::CARRY | StatusFlags::SIGN,
            StatusFlags::of_result(result)
                | StatusFlags::when(StatusFlags::CARRY, product >> 64 != 0),
        );
        Ok(())
    }

    /// Loads a divisor, rejecting zero.
    pub(super) fn load_divisor(
        &self,
        instr: &'static str,
        src: Operand,
    ) -> Result<u64, ProcessorError> {
        match self.load(src)? {
            0 => Err(ProcessorError::DivideByZero { instruction: instr }),
            divisor => Ok(divisor),
        }
    }

    pub(super) fn op_div(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let divisor = self.load_divisor(instr, src)?;
        let result = self.registers.get(register) / divisor;
        self.registers.set(register, result)?;
        self.registers
            .update_flags(StatusFlags::LOGICAL, StatusFlags::of_result(result));
        Ok(())
    }

    /// Writes quotient then remainder, so the remainder wins when both name
    /// the same register. Flags follow the final quotient register.
    pub(super) fn store_division(
        &mut self,
        quot: Register,
        rem: Register,
        quotient: u64,
        remainder: u64,
    ) -> Result<(), ProcessorError> {
        self.registers.set(quot, quotient)?;
        self.registers.set(rem, remainder)?;
        let flags = StatusFlags::of_result(self.registers.get(quot));
        self.registers.update_flags(StatusFlags::LOGICAL, flags);
        Ok(())
    }

    pub(super) fn op_dvr(
        &mut self,
        instr: &'static str,
        quot: Operand,
        rem: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let quot = self.target_register(instr, quot)?;
        let rem = self.target_register(instr, rem)?;
        let divisor = self.load_divisor(instr, src)?;
        let dividend = self.registers.get(quot);
        self.store_division(quot, rem, dividend / divisor, dividend % divisor)
    }

    pub(super) fn op_rem(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let divisor = self.load_divisor(instr, src)?;
        let result = self.registers.get(register) % divisor;
        self.registers.set(register, result)?;
        self.registers
            .update_flags(StatusFlags::LOGICAL, StatusFlags::of_result(result));
        Ok(())
    }

    pub(super) fn op_shl(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let amount = self.load(src)?;
        if amount == 0 {
            return Ok(());
        }
        let initial = self.registers.get(register);
        let (result, carry) = match amount {
            64.. => (0, initial != 0),
            _ => (initial << amount, initial >> (64 - amount) != 0),
        };
        self.store_shift(register, result, carry)
    }

    pub(super) fn op_shr(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let amount = self.load(src)?;
        if amount == 0 {
            return Ok(());
        }
        let initial = self.registers.get(register);
        let (result, carry) = match amount {
            64.. => (0, initial != 0),
            _ => (initial >> amount, initial & ((1 << amount) - 1) != 0),
        };
        self.store_shift(register, result, carry)
    }

    /// Carry reports whether any set bit was shifted out.
    pub(super) fn store_shift(
        &mut self,
        register: Register,
        result: u64,
        carry: bool,
    ) -> Result<(), ProcessorError> {
        self.registers.set(register, result)?;
        self.registers.update_flags(
            StatusFlags::ZERO | StatusFlags::CARRY | StatusFlags::SIGN,
            StatusFlags::of_result(result) | StatusFlags::when(StatusFlags::CARRY, carry),
        );
        Ok(())
    }

    // ==================== Bitwise ====================

    fn bitwise(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
        op: fn(u64, u64) -> u64,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let rhs = self.load(src)?;
        let result = op(self.registers.get(register), rhs);
        self.set_with_result_flags(register, result)
    }

    /// Stores `result`, updates Zero and Sign from it and clears Carry.
    pub(super) fn set_with_result_flags(
        &mut self,
        register: Register,
        result: u64,
    ) -> Result<(), ProcessorError> {
        self.registers.set(register, result)?;
        self.registers
            .update_flags(StatusFlags::LOGICAL, StatusFlags::of_result(result));
        Ok(())
    }

    pub(super) fn op_and(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        self.bitwise(instr, dst, src, |a, b| a & b)
    }

    pub(super) fn op_orr(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        self.bitwise(instr, dst, src, |a, b| a | b)
    }

    pub(super) fn op_xor(
        &mut self,
        instr: &'static str,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        self.bitwise(instr, dst, src, |a, b| a ^ b)
    }

    pub(super) fn op_not(&mut self, instr: &'static str, dst: Operand) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let result = !self.registers.get(register);
        self.set_with_result_flags(register, result)
    }

    pub(super) fn op_rng(&mut self, instr: &'static str, dst: Operand) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let value = self.random.next_u64();
        self.set_with_result_flags(register, value)
    }

    // ==================== Comparison ====================

    /// `TST` and `CMP` never write their first operand, so it may be `rpo`.
    pub(super) fn op_tst(
        &mut self,
        _instr: &'static str,
        lhs: Operand,
        rhs: Operand,
    ) -> Result<(), ProcessorError> {
        let result = self.load(lhs)? & self.load(rhs)?;
        self.registers
            .update_flags(StatusFlags::LOGICAL, StatusFlags::of_result(result));
        Ok(())
    }

    pub(super) fn op_cmp(
        &mut self,
        _instr: &'static str,
        lhs: Operand,
        rhs: Operand,
    ) -> Result<(), ProcessorError> {
        let (_, flags) = subtraction_flags(self.load(lhs)?, self.load(rhs)?);
        self.registers.update_flags(StatusFlags::ARITHMETIC, flags);
        Ok(())
    }

    // ==================== Moves ====================

    pub(super) fn op_move(
        &mut self,
        instr: &'static str,
        width: Width,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let value = self.load_width(src, width)?;
        self.store_width(instr, dst, width, value)
    }

    // ==================== Stack ====================

    pub(super) fn op_push(&mut self, _instr: &'static str, src: Operand) -> Result<(), ProcessorError> {
        let value = self.load(src)?;
        let top = self.registers.get(Register::Rso).wrapping_sub(8);
        self.memory.write_u64(top, value)?;
        self.registers.set_unchecked(Register::Rso, top);
        Ok(())
    }

    /// The stack offset moves before the destination is written, so `POP rso`
    /// leaves the popped value in `rso`.
    pub(super) fn op_pop(&mut self, instr: &'static str, dst: Operand) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let top = self.registers.get(Register::Rso);
        let value = self.memory.read_u64(top)?;
        self.registers.set_unchecked(Register::Rso, top.wrapping_add(8));
        self.registers.set(register, value)
    }

    /// Pushes the return address and `rsb`, then opens a new frame at the
    /// stack top.
    fn enter_frame(&mut self, target: u64) -> Result<(), ProcessorError> {
        let frame = self
            .registers
            .get(Register::Rso)
            .wrapping_sub(CALL_FRAME_SIZE);
        self.memory.check(frame, CALL_FRAME_SIZE as usize)?;
        self.memory.write_u64(frame + 8, self.next_offset)?;
        self.memory
            .write_u64(frame, self.registers.get(Register::Rsb))?;
        self.registers.set_unchecked(Register::Rso, frame);
        self.registers.set_unchecked(Register::Rsb, frame);
        self.next_offset = target;
        Ok(())
    }

    pub(super) fn op_call(&mut self, _instr: &'static str, target: Operand) -> Result<(), ProcessorError> {
        let target = self.address_of(target);
        self.enter_frame(target)
    }

    /// Like `CAL target`, also passing `value` in `rfp`.
    pub(super) fn op_call_with(
        &mut self,
        _instr: &'static str,
        target: Operand,
        value: Operand,
    ) -> Result<(), ProcessorError> {
        let target = self.address_of(target);
        let value = self.load(value)?;
        self.enter_frame(target)?;
        self.registers.set_unchecked(Register::Rfp, value);
        Ok(())
    }

    /// Discards the callee's stack, restores `rsb` and jumps back.
    fn leave_frame(&mut self) -> Result<(), ProcessorError> {
        let frame = self.registers.get(Register::Rsb);
        self.memory.check(frame, CALL_FRAME_SIZE as usize)?;
        let saved_base = self.memory.read_u64(frame)?;
        let return_address = self.memory.read_u64(frame + 8)?;
        self.registers.set_unchecked(Register::Rsb, saved_base);
        self.registers
            .set_unchecked(Register::Rso, frame + CALL_FRAME_SIZE);
        self.next_offset = return_address;
        Ok(())
    }

    pub(super) fn op_return(&mut self, _instr: &'static str) -> Result<(), ProcessorError> {
        self.leave_frame()
    }

    /// Like `RET`, also passing `value` back in `rrv`.
    pub(super) fn op_return_with(
        &mut self,
        _instr: &'static str,
        value: Operand,
    ) -> Result<(), ProcessorError> {
        let value = self.load(value)?;
        self.leave_frame()?;
        self.registers.set_unchecked(Register::Rrv, value);
        Ok(())
    }
}
