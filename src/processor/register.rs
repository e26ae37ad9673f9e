//! Register ids.
//!
//! The numeric value of each [`Register`] is part of the bytecode encoding and
//! must match what assemblers emit.

use crate::processor::errors::ProcessorError;
use std::fmt::{self, Display};

/// Number of registers in the register file.
pub const REGISTER_COUNT: usize = 16;

#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Register {
    /// Program offset: address of the next instruction. Read-only to programs.
    Rpo = 0x0,
    /// Stack offset: address of the top of the stack.
    Rso = 0x1,
    /// Stack base: address of the bottom of the current stack frame.
    Rsb = 0x2,
    /// Status flags.
    Rsf = 0x3,
    /// Return value.
    Rrv = 0x4,
    /// Fast pass parameter.
    Rfp = 0x5,
    Rg0 = 0x6,
    Rg1 = 0x7,
    Rg2 = 0x8,
    Rg3 = 0x9,
    Rg4 = 0xA,
    Rg5 = 0xB,
    Rg6 = 0xC,
    Rg7 = 0xD,
    Rg8 = 0xE,
    Rg9 = 0xF,
}

impl Register {
    /// Every register in encoding order.
    pub const ALL: [Register; REGISTER_COUNT] = [
        Register::Rpo,
        Register::Rso,
        Register::Rsb,
        Register::Rsf,
        Register::Rrv,
        Register::Rfp,
        Register::Rg0,
        Register::Rg1,
        Register::Rg2,
        Register::Rg3,
        Register::Rg4,
        Register::Rg5,
        Register::Rg6,
        Register::Rg7,
        Register::Rg8,
        Register::Rg9,
    ];

    /// Decodes the low four bits of `bits`. Used by pointer operands, which
    /// can only name the sixteen registers.
    pub const fn from_nibble(bits: u8) -> Register {
        Register::ALL[(bits & 0x0F) as usize]
    }

    /// Whether instructions may not use this register as a destination.
    pub const fn is_read_only(self) -> bool {
        matches!(self, Register::Rpo)
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Register::Rpo => "rpo",
            Register::Rso => "rso",
            Register::Rsb => "rsb",
            Register::Rsf => "rsf",
            Register::Rrv => "rrv",
            Register::Rfp => "rfp",
            Register::Rg0 => "rg0",
            Register::Rg1 => "rg1",
            Register::Rg2 => "rg2",
            Register::Rg3 => "rg3",
            Register::Rg4 => "rg4",
            Register::Rg5 => "rg5",
            Register::Rg6 => "rg6",
            Register::Rg7 => "rg7",
            Register::Rg8 => "rg8",
            Register::Rg9 => "rg9",
        }
    }
}

impl TryFrom<u8> for Register {
    type Error = ProcessorError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Register::ALL
            .get(value as usize)
            .copied()
            .ok_or(ProcessorError::InvalidRegister {
                index: value,
                offset: 0,
            })
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_matches_index() {
        for (index, register) in Register::ALL.iter().enumerate() {
            assert_eq!(*register as usize, index);
            assert_eq!(Register::try_from(index as u8), Ok(*register));
        }
    }

    #[test]
    fn out_of_range_byte_is_rejected() {
        assert!(matches!(
            Register::try_from(16u8),
            Err(ProcessorError::InvalidRegister { index: 16, .. })
        ));
    }

    #[test]
    fn only_program_offset_is_read_only() {
        let read_only: Vec<_> = Register::ALL
            .iter()
            .filter(|register| register.is_read_only())
            .collect();
        assert_eq!(read_only, [&Register::Rpo]);
    }

    #[test]
    fn nibble_ignores_high_bits() {
        assert_eq!(Register::from_nibble(0xFD), Register::Rg7);
        assert_eq!(Register::Rg7.to_string(), "rg7");
    }
}
