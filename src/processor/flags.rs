//! Status flag bitmask held in `rsf`.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Bitmask over the `rsf` register.
///
/// Only the named bits have meaning to the processor. Any other bits a program
/// stores into `rsf` are carried through flag updates untouched.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct StatusFlags(u64);

impl StatusFlags {
    pub const NONE: StatusFlags = StatusFlags(0);
    pub const ZERO: StatusFlags = StatusFlags(0b1);
    pub const CARRY: StatusFlags = StatusFlags(0b10);
    /// Set by file reads when the open file has no bytes left.
    pub const FILE_END: StatusFlags = StatusFlags(0b100);
    pub const SIGN: StatusFlags = StatusFlags(0b1000);
    pub const OVERFLOW: StatusFlags = StatusFlags(0b10000);

    pub const ZERO_AND_CARRY: StatusFlags = StatusFlags(Self::ZERO.0 | Self::CARRY.0);
    pub const SIGN_AND_OVERFLOW: StatusFlags = StatusFlags(Self::SIGN.0 | Self::OVERFLOW.0);

    /// Bits touched by integer arithmetic.
    pub const ARITHMETIC: StatusFlags =
        StatusFlags(Self::ZERO.0 | Self::CARRY.0 | Self::SIGN.0 | Self::OVERFLOW.0);
    pub const ZERO_AND_SIGN: StatusFlags = StatusFlags(Self::ZERO.0 | Self::SIGN.0);
    /// Bits touched by bitwise, test and division results. Carry is in the
    /// mask but never in the computed flags, so it always ends up clear.
    pub const LOGICAL: StatusFlags =
        StatusFlags(Self::ZERO.0 | Self::CARRY.0 | Self::SIGN.0);

    pub const fn from_bits(bits: u64) -> StatusFlags {
        StatusFlags(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn contains(self, other: StatusFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: StatusFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: StatusFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: StatusFlags) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: StatusFlags, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// `other` if `value` is true, otherwise no bits.
    pub const fn when(other: StatusFlags, value: bool) -> StatusFlags {
        if value { other } else { StatusFlags::NONE }
    }

    /// Zero and Sign as computed from a 64-bit result.
    pub const fn of_result(value: u64) -> StatusFlags {
        StatusFlags(
            Self::when(Self::ZERO, value == 0).0 | Self::when(Self::SIGN, value >> 63 == 1).0,
        )
    }

    /// Replaces the bits selected by `mask` with the corresponding bits of
    /// `computed`, keeping every other bit of `self`.
    #[must_use]
    pub const fn update(self, mask: StatusFlags, computed: StatusFlags) -> StatusFlags {
        StatusFlags((self.0 & !mask.0) | (computed.0 & mask.0))
    }
}

/// Branch condition evaluated against the status flags.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Condition {
    Always,
    Zero,
    NotZero,
    /// Unsigned less-than after `CMP`.
    Carry,
    CarryOrZero,
    NeitherCarryNorZero,
    NotCarry,
    /// Signed less-than after `CMP`.
    SignNotOverflow,
    ZeroOrSignNotOverflow,
    NotZeroAndSignIsOverflow,
    SignIsOverflow,
    Sign,
    NotSign,
    Overflow,
    NotOverflow,
}

impl Condition {
    pub const fn holds(self, flags: StatusFlags) -> bool {
        let zero = flags.contains(StatusFlags::ZERO);
        let carry = flags.contains(StatusFlags::CARRY);
        let sign = flags.contains(StatusFlags::SIGN);
        let overflow = flags.contains(StatusFlags::OVERFLOW);
        match self {
            Condition::Always => true,
            Condition::Zero => zero,
            Condition::NotZero => !zero,
            Condition::Carry => carry,
            Condition::CarryOrZero => carry || zero,
            Condition::NeitherCarryNorZero => !carry && !zero,
            Condition::NotCarry => !carry,
            Condition::SignNotOverflow => sign != overflow,
            Condition::ZeroOrSignNotOverflow => zero || sign != overflow,
            Condition::NotZeroAndSignIsOverflow => !zero && sign == overflow,
            Condition::SignIsOverflow => sign == overflow,
            Condition::Sign => sign,
            Condition::NotSign => !sign,
            Condition::Overflow => overflow,
            Condition::NotOverflow => !overflow,
        }
    }
}

impl BitOr for StatusFlags {
    type Output = StatusFlags;

    fn bitor(self, rhs: StatusFlags) -> StatusFlags {
        StatusFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for StatusFlags {
    fn bitor_assign(&mut self, rhs: StatusFlags) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for StatusFlags {
    type Output = StatusFlags;

    fn bitand(self, rhs: StatusFlags) -> StatusFlags {
        StatusFlags(self.0 & rhs.0)
    }
}

impl BitAndAssign for StatusFlags {
    fn bitand_assign(&mut self, rhs: StatusFlags) {
        self.0 &= rhs.0;
    }
}

impl Not for StatusFlags {
    type Output = StatusFlags;

    fn not(self) -> StatusFlags {
        StatusFlags(!self.0)
    }
}

impl From<u64> for StatusFlags {
    fn from(bits: u64) -> Self {
        StatusFlags(bits)
    }
}

impl From<StatusFlags> for u64 {
    fn from(flags: StatusFlags) -> Self {
        flags.0
    }
}

impl fmt::Debug for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(StatusFlags, &str); 5] = [
            (StatusFlags::ZERO, "ZERO"),
            (StatusFlags::CARRY, "CARRY"),
            (StatusFlags::FILE_END, "FILE_END"),
            (StatusFlags::SIGN, "SIGN"),
            (StatusFlags::OVERFLOW, "OVERFLOW"),
        ];
        let mut remaining = self.0;
        let mut first = true;
        f.write_str("StatusFlags(")?;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                remaining &= !flag.0;
                first = false;
            }
        }
        if remaining != 0 {
            if !first {
                f.write_str(" | ")?;
            }
            write!(f, "{:#x}", remaining)?;
        } else if first {
            f.write_str("NONE")?;
        }
        f.write_str(")")
    }
}
