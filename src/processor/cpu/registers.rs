use crate::processor::errors::ProcessorError;
use crate::processor::flags::StatusFlags;
use crate::processor::register::{REGISTER_COUNT, Register};
use std::ops::Index;

/// The sixteen 64-bit registers.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Registers {
    values: [u64; REGISTER_COUNT],
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, register: Register) -> u64 {
        self.values[register.index()]
    }

    /// Instruction-level write. Fails on read-only registers.
    pub fn set(&mut self, register: Register, value: u64) -> Result<(), ProcessorError> {
        Self::check_writable(register)?;
        self.values[register.index()] = value;
        Ok(())
    }

    /// Engine-internal write that bypasses the read-only check, used for
    /// control flow and host access.
    #[inline]
    pub fn set_unchecked(&mut self, register: Register, value: u64) {
        self.values[register.index()] = value;
    }

    pub fn check_writable(register: Register) -> Result<(), ProcessorError> {
        if register.is_read_only() {
            return Err(ProcessorError::ReadOnlyRegister { register });
        }
        Ok(())
    }

    pub fn flags(&self) -> StatusFlags {
        StatusFlags::from_bits(self.get(Register::Rsf))
    }

    /// Replaces the flag bits in `mask` with those of `computed`.
    pub fn update_flags(&mut self, mask: StatusFlags, computed: StatusFlags) {
        let flags = self.flags().update(mask, computed);
        self.set_unchecked(Register::Rsf, flags.bits());
    }

    pub fn as_array(&self) -> &[u64; REGISTER_COUNT] {
        &self.values
    }

    pub fn as_mut_array(&mut self) -> &mut [u64; REGISTER_COUNT] {
        &mut self.values
    }
}

impl Index<Register> for Registers {
    type Output = u64;

    fn index(&self, register: Register) -> &u64 {
        &self.values[register.index()]
    }
}
