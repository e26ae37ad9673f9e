use crate::processor::errors::ProcessorError;
use crate::processor::operand::Width;
use std::ops::{Index, IndexMut};

/// Flat little-endian byte memory with a fixed capacity.
///
/// Every accessor validates that the whole access window lies inside
/// `[0, capacity)` before touching the buffer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Memory {
    bytes: Vec<u8>,
}

macro_rules! fixed_width_access {
    ($read:ident, $write:ident, $ty:ty) => {
        pub fn $read(&self, address: u64) -> Result<$ty, ProcessorError> {
            const N: usize = std::mem::size_of::<$ty>();
            let start = self.check(address, N)?;
            // SAFETY: `check` validated `start + N <= self.bytes.len()`.
            let raw: [u8; N] = unsafe { *self.bytes.as_ptr().add(start).cast::<[u8; N]>() };
            Ok(<$ty>::from_le_bytes(raw))
        }

        pub fn $write(&mut self, address: u64, value: $ty) -> Result<(), ProcessorError> {
            const N: usize = std::mem::size_of::<$ty>();
            let start = self.check(address, N)?;
            // SAFETY: `check` validated `start + N <= self.bytes.len()`.
            unsafe { self.bytes.get_unchecked_mut(start..start + N) }
                .copy_from_slice(&value.to_le_bytes());
            Ok(())
        }
    };
}

impl Memory {
    /// Zero-filled memory of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Validates an access of `width` bytes at `address` and returns the start
    /// index.
    pub fn check(&self, address: u64, width: usize) -> Result<usize, ProcessorError> {
        let capacity = self.bytes.len();
        let out_of_bounds = ProcessorError::MemoryOutOfBounds {
            address,
            width,
            capacity,
        };
        let start = usize::try_from(address).map_err(|_| out_of_bounds.clone())?;
        match start.checked_add(width) {
            Some(end) if end <= capacity => Ok(start),
            _ => Err(out_of_bounds),
        }
    }

    fixed_width_access!(read_u8, write_u8, u8);
    fixed_width_access!(read_u16, write_u16, u16);
    fixed_width_access!(read_u32, write_u32, u32);
    fixed_width_access!(read_u64, write_u64, u64);

    /// Reads `width` bytes at `address`, zero-extended.
    pub fn read(&self, address: u64, width: Width) -> Result<u64, ProcessorError> {
        Ok(match width {
            Width::Byte => self.read_u8(address)? as u64,
            Width::Word => self.read_u16(address)? as u64,
            Width::Dword => self.read_u32(address)? as u64,
            Width::Qword => self.read_u64(address)?,
        })
    }

    /// Writes the low `width` bytes of `value` at `address`.
    pub fn write(&mut self, address: u64, width: Width, value: u64) -> Result<(), ProcessorError> {
        match width {
            Width::Byte => self.write_u8(address, value as u8),
            Width::Word => self.write_u16(address, value as u16),
            Width::Dword => self.write_u32(address, value as u32),
            Width::Qword => self.write_u64(address, value),
        }
    }

    /// Reads a NUL-terminated UTF-8 string starting at `address`. A string
    /// running to the end of memory without a terminator ends there.
    pub fn read_string(&self, address: u64) -> Result<String, ProcessorError> {
        let start = self.check(address, 1)?;
        // SAFETY: `check` validated `start < self.bytes.len()`.
        let tail = unsafe { self.bytes.get_unchecked(start..) };
        let end = tail.iter().position(|b| *b == 0).unwrap_or(tail.len());
        String::from_utf8(tail[..end].to_vec()).map_err(|_| ProcessorError::InvalidString { address })
    }

    /// Copies `len` bytes from `src` to `dst`. The two windows may overlap.
    pub fn copy_within(&mut self, src: u64, dst: u64, len: usize) -> Result<(), ProcessorError> {
        let from = self.check(src, len)?;
        let to = self.check(dst, len)?;
        self.bytes.copy_within(from..from + len, to);
        Ok(())
    }

    /// Copies `program` to address 0.
    pub fn load(&mut self, program: &[u8]) -> Result<(), ProcessorError> {
        if program.len() > self.bytes.len() {
            return Err(ProcessorError::ProgramTooLarge {
                size: program.len(),
                capacity: self.bytes.len(),
            });
        }
        self.bytes[..program.len()].copy_from_slice(program);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Index<usize> for Memory {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.bytes[index]
    }
}

impl IndexMut<usize> for Memory {
    fn index_mut(&mut self, index: usize) -> &mut u8 {
        &mut self.bytes[index]
    }
}
