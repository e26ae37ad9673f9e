//! Operand shapes and the pointer operand codec.
//!
//! A pointer operand starts with a mode byte:
//!
//! ```text
//!  7   6   5   4   3   2   1   0
//! [ disp ] [width] [ base reg    ]
//! ```
//!
//! - `width`: `00` = 8 bytes, `01` = 4, `10` = 2, `11` = 1
//! - `disp`: `00` none, `01` 8-byte signed constant, `10` one scaled-register
//!   byte, `11` constant followed by scaled-register byte
//!
//! The scaled-register byte is `[sign][exp exp exp][reg reg reg reg]`: the
//! secondary register multiplied by `2^exp`, subtracted when `sign` is set.

use crate::processor::errors::ProcessorError;
use crate::processor::register::Register;

/// Number of bytes dereferenced at an address.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Width {
    Qword = 0b00,
    Dword = 0b01,
    Word = 0b10,
    Byte = 0b11,
}

impl Width {
    pub const fn bytes(self) -> usize {
        match self {
            Width::Qword => 8,
            Width::Dword => 4,
            Width::Word => 2,
            Width::Byte => 1,
        }
    }

    /// Keeps only the low `bytes()` bytes of `value`.
    pub const fn truncate(self, value: u64) -> u64 {
        match self {
            Width::Qword => value,
            Width::Dword => value & 0xFFFF_FFFF,
            Width::Word => value & 0xFFFF,
            Width::Byte => value & 0xFF,
        }
    }

    /// Sign-extends the low `bytes()` bytes of `value` to 64 bits.
    pub const fn sign_extend(self, value: u64) -> u64 {
        match self {
            Width::Qword => value,
            Width::Dword => value as u32 as i32 as i64 as u64,
            Width::Word => value as u16 as i16 as i64 as u64,
            Width::Byte => value as u8 as i8 as i64 as u64,
        }
    }

    const fn from_bits(bits: u8) -> Width {
        match bits & 0b11 {
            0b00 => Width::Qword,
            0b01 => Width::Dword,
            0b10 => Width::Word,
            _ => Width::Byte,
        }
    }
}

/// Secondary register term of a pointer: `±register * 2^exponent`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScaledRegister {
    pub register: Register,
    /// Multiplier exponent, `0..=7`.
    pub exponent: u8,
    pub subtract: bool,
}

impl ScaledRegister {
    pub const fn from_byte(byte: u8) -> ScaledRegister {
        ScaledRegister {
            register: Register::from_nibble(byte),
            exponent: (byte >> 4) & 0b111,
            subtract: byte & 0x80 != 0,
        }
    }

    pub const fn to_byte(self) -> u8 {
        (if self.subtract { 0x80 } else { 0 }) | ((self.exponent & 0b111) << 4) | self.register as u8
    }

    pub const fn multiplier(self) -> u64 {
        1 << self.exponent
    }

    /// Applies this term to `base` given the secondary register's value.
    const fn apply(self, base: u64, value: u64) -> u64 {
        let scaled = value.wrapping_mul(self.multiplier());
        if self.subtract {
            base.wrapping_sub(scaled)
        } else {
            base.wrapping_add(scaled)
        }
    }
}

/// What is added to a pointer's base register.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Displacement {
    NoDisplacement,
    Constant(i64),
    Register(ScaledRegister),
    Both(i64, ScaledRegister),
}

impl Displacement {
    const fn mode(&self) -> u8 {
        match self {
            Displacement::NoDisplacement => 0b00,
            Displacement::Constant(_) => 0b01,
            Displacement::Register(_) => 0b10,
            Displacement::Both(..) => 0b11,
        }
    }

    /// Bytes following the mode byte.
    pub const fn trailing_len(&self) -> usize {
        match self {
            Displacement::NoDisplacement => 0,
            Displacement::Constant(_) => 8,
            Displacement::Register(_) => 1,
            Displacement::Both(..) => 9,
        }
    }
}

/// A decoded register-indirect operand.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Pointer {
    pub base: Register,
    pub width: Width,
    pub displacement: Displacement,
}

impl Pointer {
    /// Plain `*reg` pointer dereferencing 8 bytes.
    pub const fn register(base: Register) -> Pointer {
        Pointer {
            base,
            width: Width::Qword,
            displacement: Displacement::NoDisplacement,
        }
    }

    /// Decodes a pointer from the start of `bytes`, returning it along with the
    /// number of bytes consumed.
    ///
    /// The returned error carries offset 0; callers that know where `bytes`
    /// came from patch it.
    pub fn decode(bytes: &[u8]) -> Result<(Pointer, usize), ProcessorError> {
        let truncated = |needed| ProcessorError::TruncatedOperand {
            offset: 0,
            needed,
            available: bytes.len(),
        };

        let mode = *bytes.first().ok_or_else(|| truncated(1))?;
        let base = Register::from_nibble(mode);
        let width = Width::from_bits(mode >> 4);

        let constant = |bytes: &[u8]| -> Result<i64, ProcessorError> {
            let raw: [u8; 8] = bytes
                .get(1..9)
                .and_then(|slice| slice.try_into().ok())
                .ok_or_else(|| truncated(9))?;
            Ok(i64::from_le_bytes(raw))
        };

        let displacement = match mode >> 6 {
            0b00 => Displacement::NoDisplacement,
            0b01 => Displacement::Constant(constant(bytes)?),
            0b10 => {
                let byte = *bytes.get(1).ok_or_else(|| truncated(2))?;
                Displacement::Register(ScaledRegister::from_byte(byte))
            }
            _ => {
                let value = constant(bytes)?;
                let byte = *bytes.get(9).ok_or_else(|| truncated(10))?;
                Displacement::Both(value, ScaledRegister::from_byte(byte))
            }
        };

        let pointer = Pointer {
            base,
            width,
            displacement,
        };
        Ok((pointer, pointer.encoded_len()))
    }

    /// Appends the encoded pointer to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.displacement.mode() << 6 | (self.width as u8) << 4 | self.base as u8);
        match self.displacement {
            Displacement::NoDisplacement => {}
            Displacement::Constant(value) => out.extend_from_slice(&value.to_le_bytes()),
            Displacement::Register(scaled) => out.push(scaled.to_byte()),
            Displacement::Both(value, scaled) => {
                out.extend_from_slice(&value.to_le_bytes());
                out.push(scaled.to_byte());
            }
        }
    }

    pub const fn encoded_len(&self) -> usize {
        1 + self.displacement.trailing_len()
    }

    /// Effective address, using `read` to fetch register values.
    /// All arithmetic wraps at 64 bits.
    pub fn address(&self, read: impl Fn(Register) -> u64) -> u64 {
        let base = read(self.base);
        match self.displacement {
            Displacement::NoDisplacement => base,
            Displacement::Constant(value) => base.wrapping_add(value as u64),
            Displacement::Register(scaled) => scaled.apply(base, read(scaled.register)),
            Displacement::Both(value, scaled) => {
                scaled.apply(base.wrapping_add(value as u64), read(scaled.register))
            }
        }
    }
}

/// Operand shape as declared by the instruction table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperandKind {
    Reg,
    Lit,
    Adr,
    Ptr,
}

impl OperandKind {
    pub const fn name(self) -> &'static str {
        match self {
            OperandKind::Reg => "Register",
            OperandKind::Lit => "Literal",
            OperandKind::Adr => "Address",
            OperandKind::Ptr => "Pointer",
        }
    }
}

/// A decoded operand.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    Register(Register),
    /// Immediate value.
    Literal(u64),
    /// Absolute memory address, dereferenced as 8 bytes.
    Address(u64),
    Pointer(Pointer),
}

impl Operand {
    pub const fn kind(&self) -> OperandKind {
        match self {
            Operand::Register(_) => OperandKind::Reg,
            Operand::Literal(_) => OperandKind::Lit,
            Operand::Address(_) => OperandKind::Adr,
            Operand::Pointer(_) => OperandKind::Ptr,
        }
    }

    /// Encoded size in the instruction stream.
    pub const fn encoded_len(&self) -> usize {
        match self {
            Operand::Register(_) => 1,
            Operand::Literal(_) | Operand::Address(_) => 8,
            Operand::Pointer(pointer) => pointer.encoded_len(),
        }
    }
}

impl From<Register> for Operand {
    fn from(register: Register) -> Self {
        Operand::Register(register)
    }
}

impl From<Pointer> for Operand {
    fn from(pointer: Pointer) -> Self {
        Operand::Pointer(pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registers(register: Register) -> u64 {
        match register {
            Register::Rg7 => 0x140,
            Register::Rg8 => 0x1020_3040,
            _ => 0,
        }
    }

    fn encoded(pointer: Pointer) -> Vec<u8> {
        let mut out = Vec::new();
        pointer.encode(&mut out);
        out
    }

    #[test]
    fn bare_register_pointer() {
        let (pointer, used) = Pointer::decode(&[Register::Rg7 as u8]).unwrap();
        assert_eq!(used, 1);
        assert_eq!(pointer, Pointer::register(Register::Rg7));
        assert_eq!(pointer.address(registers), 0x140);
    }

    #[test]
    fn width_bits() {
        for (bits, width) in [
            (0b00, Width::Qword),
            (0b01, Width::Dword),
            (0b10, Width::Word),
            (0b11, Width::Byte),
        ] {
            let (pointer, _) = Pointer::decode(&[bits << 4 | Register::Rg7 as u8]).unwrap();
            assert_eq!(pointer.width, width);
        }
    }

    #[test]
    fn constant_displacement() {
        let bytes = [0x40 | Register::Rg7 as u8, 0x40, 0x30, 0x20, 0x10, 0, 0, 0, 0];
        let (pointer, used) = Pointer::decode(&bytes).unwrap();
        assert_eq!(used, 9);
        assert_eq!(pointer.displacement, Displacement::Constant(0x1020_3040));
        assert_eq!(pointer.address(registers), 0x1020_3180);
    }

    #[test]
    fn negative_constant_wraps() {
        let pointer = Pointer {
            base: Register::Rg7,
            width: Width::Qword,
            displacement: Displacement::Constant(-0x141),
        };
        assert_eq!(pointer.address(registers), u64::MAX);
    }

    #[test]
    fn scaled_register_displacement() {
        // rg8 * 2 added to rg7
        let bytes = [0x80 | Register::Rg7 as u8, 0x10 | Register::Rg8 as u8];
        let (pointer, used) = Pointer::decode(&bytes).unwrap();
        assert_eq!(used, 2);
        assert_eq!(pointer.address(registers), 0x2040_61C0);
    }

    #[test]
    fn subtracted_scaled_register() {
        let scaled = ScaledRegister::from_byte(0x80 | 0x30 | Register::Rg7 as u8);
        assert!(scaled.subtract);
        assert_eq!(scaled.multiplier(), 8);
        let pointer = Pointer {
            base: Register::Rg8,
            width: Width::Qword,
            displacement: Displacement::Register(scaled),
        };
        assert_eq!(pointer.address(registers), 0x1020_3040 - 0x140 * 8);
    }

    #[test]
    fn constant_and_register_displacement() {
        let bytes = [
            0xC0 | Register::Rg7 as u8,
            0x40,
            0x30,
            0x20,
            0x10,
            0,
            0,
            0,
            0,
            0x10 | Register::Rg8 as u8,
        ];
        let (pointer, used) = Pointer::decode(&bytes).unwrap();
        assert_eq!(used, 10);
        assert_eq!(pointer.address(registers), 0x3060_9200);
    }

    #[test]
    fn maximum_multiplier_is_128() {
        assert_eq!(ScaledRegister::from_byte(0x70).multiplier(), 128);
    }

    #[test]
    fn truncated_pointer_is_rejected() {
        assert!(matches!(
            Pointer::decode(&[]),
            Err(ProcessorError::TruncatedOperand { needed: 1, .. })
        ));
        assert!(matches!(
            Pointer::decode(&[0x40, 1, 2, 3]),
            Err(ProcessorError::TruncatedOperand {
                needed: 9,
                available: 4,
                ..
            })
        ));
        assert!(matches!(
            Pointer::decode(&[0xC0, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(ProcessorError::TruncatedOperand { needed: 10, .. })
        ));
    }

    #[test]
    fn encoding_matches_reference_layouts() {
        let pointer = Pointer {
            base: Register::Rg1,
            width: Width::Byte,
            displacement: Displacement::Both(-2, ScaledRegister::from_byte(0xA5)),
        };
        let bytes = encoded(pointer);
        assert_eq!(bytes[0], 0xF7);
        assert_eq!(&bytes[1..9], &(-2i64).to_le_bytes());
        assert_eq!(bytes[9], 0xA5);
        assert_eq!(Pointer::decode(&bytes).unwrap(), (pointer, 10));
    }

    #[test]
    fn widths_truncate_and_extend() {
        assert_eq!(Width::Word.truncate(0x1234_5678), 0x5678);
        assert_eq!(Width::Byte.sign_extend(0x80), 0xFFFF_FFFF_FFFF_FF80);
        assert_eq!(Width::Dword.sign_extend(0x7FFF_FFFF), 0x7FFF_FFFF);
    }
}
