//! Floating point extension set. Registers hold IEEE-754 binary64 bit
//! patterns; half and single precision values occupy the low bits.

use super::Processor;
use crate::processor::errors::ProcessorError;
use crate::processor::flags::StatusFlags;
use crate::processor::operand::Operand;
use crate::processor::register::Register;

/// Two-operand operations storing into the first operand.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(super) enum FloatBinary {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    /// `atan2(dst, src)`
    Atan2,
    Pow,
    /// Logarithm of `dst` in base `src`.
    Log,
}

impl FloatBinary {
    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            FloatBinary::Add => lhs + rhs,
            FloatBinary::Sub => lhs - rhs,
            FloatBinary::Mul => lhs * rhs,
            FloatBinary::Div => lhs / rhs,
            FloatBinary::Rem => lhs % rhs,
            FloatBinary::Atan2 => lhs.atan2(rhs),
            FloatBinary::Pow => lhs.powf(rhs),
            FloatBinary::Log => lhs.log(rhs),
        }
    }

    /// Carry for operations that report it, `None` for the rest.
    fn carry(self, initial: f64, result: f64) -> Option<bool> {
        match self {
            FloatBinary::Add | FloatBinary::Mul | FloatBinary::Pow => Some(result < initial),
            FloatBinary::Sub | FloatBinary::Log => Some(result > initial),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(super) enum FloatUnary {
    Sin,
    Asin,
    Cos,
    Acos,
    Tan,
    Atan,
    Neg,
}

impl FloatUnary {
    fn apply(self, value: f64) -> f64 {
        match self {
            FloatUnary::Sin => value.sin(),
            FloatUnary::Asin => value.asin(),
            FloatUnary::Cos => value.cos(),
            FloatUnary::Acos => value.acos(),
            FloatUnary::Tan => value.tan(),
            FloatUnary::Atan => value.atan(),
            FloatUnary::Neg => -value,
        }
    }
}

/// In-place conversions between number representations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(super) enum FloatConversion {
    HalfToDouble,
    SingleToDouble,
    DoubleToSingle,
    DoubleToHalf,
    UnsignedToDouble,
    SignedToDouble,
    Truncate,
    Ceiling,
    Floor,
    /// Round half to even.
    Nearest,
}

impl FloatConversion {
    /// Converted bits, and whether they hold a double (as opposed to an
    /// integer or narrower float).
    fn apply(self, bits: u64) -> (u64, bool) {
        let value = f64::from_bits(bits);
        match self {
            FloatConversion::HalfToDouble => (half_to_f64(bits as u16).to_bits(), true),
            FloatConversion::SingleToDouble => ((f32::from_bits(bits as u32) as f64).to_bits(), true),
            FloatConversion::DoubleToSingle => ((value as f32).to_bits() as u64, false),
            FloatConversion::DoubleToHalf => (f64_to_half(value) as u64, false),
            FloatConversion::UnsignedToDouble => ((bits as f64).to_bits(), true),
            FloatConversion::SignedToDouble => ((bits as i64 as f64).to_bits(), true),
            FloatConversion::Truncate => (value.trunc() as i64 as u64, false),
            FloatConversion::Ceiling => (value.ceil() as i64 as u64, false),
            FloatConversion::Floor => (value.floor() as i64 as u64, false),
            FloatConversion::Nearest => (value.round_ties_even() as i64 as u64, false),
        }
    }
}

/// Zero when the value is `±0.0`, Sign from bit 63.
fn float_result_flags(result: f64) -> StatusFlags {
    StatusFlags::when(StatusFlags::ZERO, result == 0.0)
        | StatusFlags::when(StatusFlags::SIGN, result.is_sign_negative())
}

/// Decodes IEEE-754 binary16 bits.
pub(super) fn half_to_f64(bits: u16) -> f64 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = ((bits >> 10) & 0x1F) as i32;
    let mantissa = (bits & 0x3FF) as f64;
    let magnitude = match exponent {
        0 => mantissa * 2f64.powi(-24),
        0x1F if mantissa == 0.0 => f64::INFINITY,
        0x1F => f64::NAN,
        _ => (1.0 + mantissa / 1024.0) * 2f64.powi(exponent - 15),
    };
    sign * magnitude
}

/// Encodes as IEEE-754 binary16, rounding half to even. Out of range values
/// become infinity; NaN stays NaN.
pub(super) fn f64_to_half(value: f64) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 48) & 0x8000) as u16;
    let exponent = ((bits >> 52) & 0x7FF) as i32;
    let mantissa = bits & 0x000F_FFFF_FFFF_FFFF;

    if exponent == 0x7FF {
        let payload = if mantissa != 0 {
            0x0200 | (mantissa >> 42) as u16
        } else {
            0
        };
        return sign | 0x7C00 | payload;
    }

    let unbiased = exponent - 1023;
    if unbiased > 15 {
        return sign | 0x7C00;
    }
    if unbiased < -25 {
        return sign;
    }

    let round = |kept: u64, dropped: u64, shift: u32| {
        let halfway = 1u64 << (shift - 1);
        if dropped > halfway || (dropped == halfway && kept & 1 == 1) {
            kept + 1
        } else {
            kept
        }
    };

    if unbiased >= -14 {
        // Carrying out of the mantissa bumps the exponent, up to infinity.
        let kept = (((unbiased + 15) as u64) << 10) | (mantissa >> 42);
        let encoded = round(kept, mantissa & ((1 << 42) - 1), 42);
        return sign | encoded as u16;
    }

    // Subnormal: a multiple of 2^-24.
    let significand = mantissa | (1 << 52);
    let shift = (28 - unbiased) as u32;
    let kept = significand >> shift;
    let encoded = round(kept, significand & ((1 << shift) - 1), shift);
    sign | encoded as u16
}

impl Processor {
    fn load_float(&self, operand: Operand) -> Result<f64, ProcessorError> {
        Ok(f64::from_bits(self.load(operand)?))
    }

    fn float_register(&self, register: Register) -> f64 {
        f64::from_bits(self.registers.get(register))
    }

    pub(super) fn op_float_binary(
        &mut self,
        instr: &'static str,
        op: FloatBinary,
        dst: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let rhs = self.load_float(src)?;
        let initial = self.float_register(register);
        let result = op.apply(initial, rhs);
        self.registers.set(register, result.to_bits())?;

        let mut flags = float_result_flags(result);
        let mut mask = StatusFlags::ZERO_AND_SIGN;
        if let Some(carry) = op.carry(initial, result) {
            mask |= StatusFlags::CARRY;
            flags |= StatusFlags::when(StatusFlags::CARRY, carry);
        }
        self.registers.update_flags(mask, flags);
        Ok(())
    }

    pub(super) fn op_float_dvr(
        &mut self,
        instr: &'static str,
        quot: Operand,
        rem: Operand,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let quot = self.target_register(instr, quot)?;
        let rem = self.target_register(instr, rem)?;
        let divisor = self.load_float(src)?;
        let dividend = self.float_register(quot);
        self.registers.set(quot, (dividend / divisor).to_bits())?;
        self.registers.set(rem, (dividend % divisor).to_bits())?;
        let flags = float_result_flags(self.float_register(quot));
        self.registers.update_flags(StatusFlags::ZERO_AND_SIGN, flags);
        Ok(())
    }

    pub(super) fn op_float_unary(
        &mut self,
        instr: &'static str,
        op: FloatUnary,
        dst: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let result = op.apply(self.float_register(register));
        self.registers.set(register, result.to_bits())?;
        self.registers
            .update_flags(StatusFlags::ZERO_AND_SIGN, float_result_flags(result));
        Ok(())
    }

    pub(super) fn op_float_convert(
        &mut self,
        instr: &'static str,
        conversion: FloatConversion,
        dst: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let (result, is_double) = conversion.apply(self.registers.get(register));
        self.registers.set(register, result)?;
        let flags = if is_double {
            float_result_flags(f64::from_bits(result))
        } else {
            StatusFlags::of_result(result)
        };
        self.registers.update_flags(StatusFlags::ZERO_AND_SIGN, flags);
        Ok(())
    }

    /// Zero when equal, Carry and Sign when `lhs < rhs`. Unordered operands
    /// clear all three.
    pub(super) fn op_float_cmp(
        &mut self,
        _instr: &'static str,
        lhs: Operand,
        rhs: Operand,
    ) -> Result<(), ProcessorError> {
        let lhs = self.load_float(lhs)?;
        let rhs = self.load_float(rhs)?;
        let flags = if lhs.is_nan() || rhs.is_nan() {
            StatusFlags::NONE
        } else {
            StatusFlags::when(StatusFlags::ZERO, lhs == rhs)
                | StatusFlags::when(StatusFlags::CARRY, lhs < rhs)
                | StatusFlags::when(StatusFlags::SIGN, lhs - rhs < 0.0)
        };
        self.registers.update_flags(
            StatusFlags::ZERO | StatusFlags::CARRY | StatusFlags::SIGN,
            flags,
        );
        Ok(())
    }
}
