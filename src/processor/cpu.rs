//! Execution engine.
//!
//! [`Processor`] owns the register file, memory and host services, and runs the
//! fetch-decode-execute loop. Instruction handlers are grouped by extension set
//! in the child modules; each is an `op_*` method taking the mnemonic followed
//! by the decoded operands.
//!
//! An instruction either completes or fails before changing anything: every
//! handler reads its sources and validates its destinations before its first
//! write, and `rpo` only moves once the handler has returned successfully.

mod allocation;
mod base;
mod extended;
mod external;
mod floating;
pub mod heap;
mod io;
pub mod memory;
pub mod registers;
mod signed;
#[cfg(test)]
mod tests;

use crate::processor::config::ProcessorConfig;
use crate::processor::console::Console;
use crate::processor::errors::ProcessorError;
use crate::processor::flags::{Condition, StatusFlags};
use crate::processor::interop::InteropHost;
use crate::processor::isa::{EXTENSION_PREFIX, ExtensionSet, Instruction};
use crate::processor::operand::{Operand, OperandKind, Pointer, Width};
use crate::processor::random::RandomSource;
use crate::processor::register::{REGISTER_COUNT, Register};
use crate::{error, info, warn};
use floating::{FloatBinary, FloatConversion, FloatUnary};
use heap::Heap;
use io::{NumberFormat, OpenFile};
use memory::Memory;
use registers::Registers;

/// Most operands any instruction takes.
const MAX_OPERANDS: usize = 3;

/// Operands of one instruction, in encoding order. Unused slots hold
/// `Literal(0)`.
#[derive(Copy, Clone, Debug)]
struct Decoded {
    items: [Operand; MAX_OPERANDS],
    /// Offset of the following instruction.
    next_offset: u64,
}

/// Dispatches a decoded instruction to its handler.
///
/// Arms read `Variant | Variant => handler[constant, ...](field, ...)`; the
/// bracketed constants are passed before the operands.
macro_rules! exec_cpu {
    (
        cpu = $cpu:ident,
        instr = $instr:ident,
        operands = $ops:expr,
        { $( $( $variant:ident )|+ => $handler:ident $( [ $( $arg:expr ),* ] )? ( $( $field:ident ),* ) ),* $(,)? }
    ) => {{
        let name = $instr.mnemonic();
        let operands: [Operand; MAX_OPERANDS] = $ops;
        match $instr {
            $(
                $( Instruction::$variant )|+ => {
                    let [ $( $field, )* .. ] = operands;
                    $cpu.$handler(name $( $( , $arg )* )? $( , $field )*)
                }
            ),*
        }
    }};
}

/// A virtual AssEmbly processor.
pub struct Processor {
    registers: Registers,
    memory: Memory,
    heap: Heap,
    random: Box<dyn RandomSource>,
    console: Box<dyn Console>,
    interop: Box<dyn InteropHost>,
    program_loaded: bool,
    /// Where `rpo` moves once the current instruction succeeds. Control flow
    /// handlers overwrite it.
    next_offset: u64,
    /// Set by the halt handlers, consumed by [`Processor::step`].
    halted: bool,
    exit_code: Option<i32>,
    open_file: Option<OpenFile>,
    open_library: Option<String>,
    open_function: Option<String>,
}

impl Processor {
    /// Processor with `memory_size` bytes of memory and default host services.
    pub fn new(memory_size: usize) -> Self {
        Self::with_config(ProcessorConfig::default().with_memory_size(memory_size))
    }

    pub fn with_config(config: ProcessorConfig) -> Self {
        let mut registers = Registers::new();
        let top = config.memory_size as u64;
        registers.set_unchecked(Register::Rpo, config.entry_point);
        registers.set_unchecked(Register::Rso, top);
        registers.set_unchecked(Register::Rsb, top);
        Self {
            registers,
            memory: Memory::new(config.memory_size),
            heap: Heap::new(0),
            random: config.random,
            console: config.console,
            interop: config.interop,
            program_loaded: false,
            next_offset: config.entry_point,
            halted: false,
            exit_code: None,
            open_file: None,
            open_library: None,
            open_function: None,
        }
    }

    /// Copies `program` into memory at address 0. Only one program may be
    /// loaded per processor.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), ProcessorError> {
        if self.program_loaded {
            return Err(ProcessorError::ProgramAlreadyLoaded);
        }
        self.memory.load(program)?;
        self.heap.set_floor(program.len() as u64);
        self.program_loaded = true;
        info!(
            "loaded {} byte program into {} bytes of memory",
            program.len(),
            self.memory.capacity()
        );
        Ok(())
    }

    /// Executes one instruction, or keeps executing until a halt when `repeat`
    /// is set. Returns whether a halt instruction ran.
    pub fn execute(&mut self, repeat: bool) -> Result<bool, ProcessorError> {
        if !self.program_loaded {
            return Err(ProcessorError::ProgramNotLoaded);
        }
        loop {
            let offset = self.registers.get(Register::Rpo);
            let halted = self.step().inspect_err(|err| {
                error!("execution stopped at offset {:#x}: {}", offset, err);
            })?;
            if halted {
                match self.exit_code {
                    Some(code) => info!("halted at offset {:#x} with exit code {}", offset, code),
                    None => info!("halted at offset {:#x}", offset),
                }
                if let Some(file) = &self.open_file {
                    warn!("halted with {} still open", file.path());
                }
            }
            if halted || !repeat {
                return Ok(halted);
            }
        }
    }

    /// Value of `register`.
    pub fn register(&self, register: Register) -> u64 {
        self.registers.get(register)
    }

    /// Host-side register write. Unlike instruction writes this may target
    /// `rpo`.
    pub fn set_register(&mut self, register: Register, value: u64) {
        self.registers.set_unchecked(register, value);
    }

    pub fn registers(&self) -> &[u64; REGISTER_COUNT] {
        self.registers.as_array()
    }

    pub fn flags(&self) -> StatusFlags {
        self.registers.flags()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Blocks allocated by the memory allocation set.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Host-side allocation, placed exactly as `HEAP_ALC` would place it.
    pub fn allocate_memory(&mut self, size: u64) -> Result<u64, ProcessorError> {
        let ceiling = self.heap_ceiling();
        self.heap.allocate(size, ceiling)
    }

    /// Host-side release of the block starting at `address`.
    pub fn free_memory(&mut self, address: u64) -> Result<(), ProcessorError> {
        self.heap.free(address).map(|_| ())
    }

    /// Exit code recorded by `EXTD_HLT`, if it has run.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Runs the instruction at `rpo`.
    fn step(&mut self) -> Result<bool, ProcessorError> {
        let offset = self.registers.get(Register::Rpo);
        let (instruction, decoded) = self.decode(offset)?;
        self.next_offset = decoded.next_offset;
        self.halted = false;
        self.exec(instruction, decoded.items)?;
        self.registers.set_unchecked(Register::Rpo, self.next_offset);
        Ok(std::mem::take(&mut self.halted))
    }

    fn byte_at(&self, offset: u64) -> Result<u8, ProcessorError> {
        usize::try_from(offset)
            .ok()
            .and_then(|index| self.memory.as_slice().get(index))
            .copied()
            .ok_or(ProcessorError::EndOfMemory { offset })
    }

    /// Decodes the opcode and operands starting at `offset`.
    fn decode(&self, offset: u64) -> Result<(Instruction, Decoded), ProcessorError> {
        let opcode = self.byte_at(offset)?;
        let (set, opcode, mut cursor) = if opcode == EXTENSION_PREFIX {
            let set_byte = self.byte_at(offset.wrapping_add(1))?;
            let set = ExtensionSet::from_byte(set_byte).ok_or(
                ProcessorError::UnknownExtensionSet {
                    set: set_byte,
                    offset,
                },
            )?;
            (set, self.byte_at(offset.wrapping_add(2))?, offset.wrapping_add(3))
        } else {
            (ExtensionSet::Base, opcode, offset.wrapping_add(1))
        };
        let instruction =
            Instruction::lookup(set, opcode).map_err(|err| err.at_offset(offset))?;

        let bytes = self.memory.as_slice();
        let mut items = [Operand::Literal(0); MAX_OPERANDS];
        for (slot, kind) in items.iter_mut().zip(instruction.operands()) {
            let tail = usize::try_from(cursor)
                .ok()
                .and_then(|index| bytes.get(index..))
                .unwrap_or(&[]);
            let truncated = |needed| ProcessorError::TruncatedOperand {
                offset: cursor,
                needed,
                available: tail.len(),
            };
            let (operand, len) = match kind {
                OperandKind::Reg => {
                    let byte = *tail.first().ok_or_else(|| truncated(1))?;
                    let register =
                        Register::try_from(byte).map_err(|err| err.at_offset(cursor))?;
                    (Operand::Register(register), 1)
                }
                OperandKind::Lit | OperandKind::Adr => {
                    let raw: [u8; 8] = tail
                        .get(..8)
                        .and_then(|slice| slice.try_into().ok())
                        .ok_or_else(|| truncated(8))?;
                    let value = u64::from_le_bytes(raw);
                    match kind {
                        OperandKind::Lit => (Operand::Literal(value), 8),
                        _ => (Operand::Address(value), 8),
                    }
                }
                OperandKind::Ptr => {
                    let (pointer, len) =
                        Pointer::decode(tail).map_err(|err| err.at_offset(cursor))?;
                    (Operand::Pointer(pointer), len)
                }
            };
            *slot = operand;
            cursor = cursor.wrapping_add(len as u64);
        }

        Ok((
            instruction,
            Decoded {
                items,
                next_offset: cursor,
            },
        ))
    }

    // ==================== Operand access ====================

    /// Effective address of an address or pointer operand. Registers and
    /// literals yield their value.
    fn address_of(&self, operand: Operand) -> u64 {
        match operand {
            Operand::Register(register) => self.registers.get(register),
            Operand::Literal(value) | Operand::Address(value) => value,
            Operand::Pointer(pointer) => pointer.address(|register| self.registers.get(register)),
        }
    }

    /// Reads a 64-bit source value. Pointers read their own width.
    fn load(&self, operand: Operand) -> Result<u64, ProcessorError> {
        match operand {
            Operand::Register(register) => Ok(self.registers.get(register)),
            Operand::Literal(value) => Ok(value),
            Operand::Address(address) => self.memory.read_u64(address),
            Operand::Pointer(pointer) => self.memory.read(self.address_of(operand), pointer.width),
        }
    }

    /// Reads exactly `width` bytes, zero-extended.
    fn load_width(&self, operand: Operand, width: Width) -> Result<u64, ProcessorError> {
        match operand {
            Operand::Register(register) => Ok(width.truncate(self.registers.get(register))),
            Operand::Literal(value) => Ok(width.truncate(value)),
            Operand::Address(_) | Operand::Pointer(_) => {
                self.memory.read(self.address_of(operand), width)
            }
        }
    }

    /// Writes a 64-bit result. Pointers write their own width.
    fn store(
        &mut self,
        instr: &'static str,
        operand: Operand,
        value: u64,
    ) -> Result<(), ProcessorError> {
        match operand {
            Operand::Register(register) => self.registers.set(register, value),
            Operand::Literal(_) => Err(ProcessorError::LiteralDestination { instruction: instr }),
            Operand::Address(address) => self.memory.write_u64(address, value),
            Operand::Pointer(pointer) => {
                let address = self.address_of(operand);
                self.memory.write(address, pointer.width, value)
            }
        }
    }

    /// Writes the low `width` bytes of `value`. A register destination is
    /// zero-extended.
    fn store_width(
        &mut self,
        instr: &'static str,
        operand: Operand,
        width: Width,
        value: u64,
    ) -> Result<(), ProcessorError> {
        match operand {
            Operand::Register(register) => self.registers.set(register, width.truncate(value)),
            Operand::Literal(_) => Err(ProcessorError::LiteralDestination { instruction: instr }),
            Operand::Address(_) | Operand::Pointer(_) => {
                let address = self.address_of(operand);
                self.memory.write(address, width, value)
            }
        }
    }

    /// Register named by a register-only destination operand, checked for
    /// writability.
    fn target_register(
        &self,
        instr: &'static str,
        operand: Operand,
    ) -> Result<Register, ProcessorError> {
        match operand {
            Operand::Register(register) => {
                Registers::check_writable(register)?;
                Ok(register)
            }
            _ => Err(ProcessorError::LiteralDestination { instruction: instr }),
        }
    }

    /// Reads a NUL-terminated string at an address or pointer operand.
    fn load_string(&self, operand: Operand) -> Result<String, ProcessorError> {
        self.memory.read_string(self.address_of(operand))
    }

    fn exec(
        &mut self,
        instruction: Instruction,
        operands: [Operand; MAX_OPERANDS],
    ) -> Result<(), ProcessorError> {
        exec_cpu! {
            cpu = self,
            instr = instruction,
            operands = operands,
            {
                // Control
                Hlt => op_halt(),
                Nop => op_nop(),
                JmpAdr | JmpPtr => op_jump[Condition::Always](target),
                JeqAdr | JeqPtr => op_jump[Condition::Zero](target),
                JneAdr | JnePtr => op_jump[Condition::NotZero](target),
                JltAdr | JltPtr => op_jump[Condition::Carry](target),
                JleAdr | JlePtr => op_jump[Condition::CarryOrZero](target),
                JgtAdr | JgtPtr => op_jump[Condition::NeitherCarryNorZero](target),
                JgeAdr | JgePtr => op_jump[Condition::NotCarry](target),
                // Integer arithmetic
                AddRegReg | AddRegLit | AddRegAdr | AddRegPtr => op_add(dst, src),
                IcrReg => op_increment(dst),
                SubRegReg | SubRegLit | SubRegAdr | SubRegPtr => op_sub(dst, src),
                DcrReg => op_decrement(dst),
                MulRegReg | MulRegLit | MulRegAdr | MulRegPtr => op_mul(dst, src),
                DivRegReg | DivRegLit | DivRegAdr | DivRegPtr => op_div(dst, src),
                DvrRegRegReg | DvrRegRegLit | DvrRegRegAdr | DvrRegRegPtr => op_dvr(quot, rem, src),
                RemRegReg | RemRegLit | RemRegAdr | RemRegPtr => op_rem(dst, src),
                ShlRegReg | ShlRegLit | ShlRegAdr | ShlRegPtr => op_shl(dst, src),
                ShrRegReg | ShrRegLit | ShrRegAdr | ShrRegPtr => op_shr(dst, src),
                // Bitwise
                AndRegReg | AndRegLit | AndRegAdr | AndRegPtr => op_and(dst, src),
                OrrRegReg | OrrRegLit | OrrRegAdr | OrrRegPtr => op_orr(dst, src),
                XorRegReg | XorRegLit | XorRegAdr | XorRegPtr => op_xor(dst, src),
                NotReg => op_not(dst),
                RngReg => op_rng(dst),
                TstRegReg | TstRegLit | TstRegAdr | TstRegPtr => op_tst(lhs, rhs),
                CmpRegReg | CmpRegLit | CmpRegAdr | CmpRegPtr => op_cmp(lhs, rhs),
                // Moves
                MvbRegReg | MvbRegLit | MvbRegAdr | MvbRegPtr | MvbAdrReg | MvbAdrLit | MvbPtrReg
                | MvbPtrLit => op_move[Width::Byte](dst, src),
                MvwRegReg | MvwRegLit | MvwRegAdr | MvwRegPtr | MvwAdrReg | MvwAdrLit | MvwPtrReg
                | MvwPtrLit => op_move[Width::Word](dst, src),
                MvdRegReg | MvdRegLit | MvdRegAdr | MvdRegPtr | MvdAdrReg | MvdAdrLit | MvdPtrReg
                | MvdPtrLit => op_move[Width::Dword](dst, src),
                MvqRegReg | MvqRegLit | MvqRegAdr | MvqRegPtr | MvqAdrReg | MvqAdrLit | MvqPtrReg
                | MvqPtrLit => op_move[Width::Qword](dst, src),
                // Stack and subroutines
                PshReg | PshLit | PshAdr | PshPtr => op_push(src),
                PopReg => op_pop(dst),
                CalAdr | CalPtr => op_call(target),
                CalAdrReg | CalAdrLit | CalAdrAdr | CalAdrPtr | CalPtrReg | CalPtrLit | CalPtrAdr
                | CalPtrPtr => op_call_with(target, value),
                Ret => op_return(),
                RetReg | RetLit | RetAdr | RetPtr => op_return_with(value),
                // Console and file output
                WcnReg | WcnLit | WcnAdr | WcnPtr => op_write_console[NumberFormat::Decimal](src),
                WcbReg | WcbLit | WcbAdr | WcbPtr => op_write_console[NumberFormat::Byte](src),
                WcxReg | WcxLit | WcxAdr | WcxPtr => op_write_console[NumberFormat::Hex](src),
                WccReg | WccLit | WccAdr | WccPtr => op_write_console[NumberFormat::Raw](src),
                WfnReg | WfnLit | WfnAdr | WfnPtr => op_write_file[NumberFormat::Decimal](src),
                WfbReg | WfbLit | WfbAdr | WfbPtr => op_write_file[NumberFormat::Byte](src),
                WfxReg | WfxLit | WfxAdr | WfxPtr => op_write_file[NumberFormat::Hex](src),
                WfcReg | WfcLit | WfcAdr | WfcPtr => op_write_file[NumberFormat::Raw](src),
                // Files and input
                OflAdr | OflPtr => op_open_file(path),
                Cfl => op_close_file(),
                DflAdr | DflPtr => op_delete_file(path),
                FexRegAdr | FexRegPtr => op_file_exists(dst, path),
                FszRegAdr | FszRegPtr => op_file_size(dst, path),
                RccReg => op_read_console(dst),
                RfcReg => op_read_file(dst),

                // Signed
                SignJltAdr | SignJltPtr => op_jump[Condition::SignNotOverflow](target),
                SignJleAdr | SignJlePtr => op_jump[Condition::ZeroOrSignNotOverflow](target),
                SignJgtAdr | SignJgtPtr => op_jump[Condition::NotZeroAndSignIsOverflow](target),
                SignJgeAdr | SignJgePtr => op_jump[Condition::SignIsOverflow](target),
                SignJsiAdr | SignJsiPtr => op_jump[Condition::Sign](target),
                SignJnsAdr | SignJnsPtr => op_jump[Condition::NotSign](target),
                SignJovAdr | SignJovPtr => op_jump[Condition::Overflow](target),
                SignJnoAdr | SignJnoPtr => op_jump[Condition::NotOverflow](target),
                SignDivRegReg | SignDivRegLit | SignDivRegAdr | SignDivRegPtr => op_signed_div(dst, src),
                SignDvrRegRegReg | SignDvrRegRegLit | SignDvrRegRegAdr | SignDvrRegRegPtr => op_signed_dvr(quot, rem, src),
                SignRemRegReg | SignRemRegLit | SignRemRegAdr | SignRemRegPtr => op_signed_rem(dst, src),
                SignShrRegReg | SignShrRegLit | SignShrRegAdr | SignShrRegPtr => op_signed_shr(dst, src),
                SignMvbRegReg | SignMvbRegLit | SignMvbRegAdr | SignMvbRegPtr => op_signed_move[Width::Byte](dst, src),
                SignMvwRegReg | SignMvwRegLit | SignMvwRegAdr | SignMvwRegPtr => op_signed_move[Width::Word](dst, src),
                SignMvdRegReg | SignMvdRegLit | SignMvdRegAdr | SignMvdRegPtr => op_signed_move[Width::Dword](dst, src),
                SignWcnReg | SignWcnLit | SignWcnAdr | SignWcnPtr => op_write_console[NumberFormat::SignedDecimal](src),
                SignWcbReg | SignWcbLit | SignWcbAdr | SignWcbPtr => op_write_console[NumberFormat::SignedByte](src),
                SignWfnReg | SignWfnLit | SignWfnAdr | SignWfnPtr => op_write_file[NumberFormat::SignedDecimal](src),
                SignWfbReg | SignWfbLit | SignWfbAdr | SignWfbPtr => op_write_file[NumberFormat::SignedByte](src),
                SignExbReg => op_sign_extend[Width::Byte](dst),
                SignExwReg => op_sign_extend[Width::Word](dst),
                SignExdReg => op_sign_extend[Width::Dword](dst),
                SignNegReg => op_negate(dst),

                // Floating point
                FlptAddRegReg | FlptAddRegLit | FlptAddRegAdr | FlptAddRegPtr => op_float_binary[FloatBinary::Add](dst, src),
                FlptSubRegReg | FlptSubRegLit | FlptSubRegAdr | FlptSubRegPtr => op_float_binary[FloatBinary::Sub](dst, src),
                FlptMulRegReg | FlptMulRegLit | FlptMulRegAdr | FlptMulRegPtr => op_float_binary[FloatBinary::Mul](dst, src),
                FlptDivRegReg | FlptDivRegLit | FlptDivRegAdr | FlptDivRegPtr => op_float_binary[FloatBinary::Div](dst, src),
                FlptDvrRegRegReg | FlptDvrRegRegLit | FlptDvrRegRegAdr | FlptDvrRegRegPtr => op_float_dvr(quot, rem, src),
                FlptRemRegReg | FlptRemRegLit | FlptRemRegAdr | FlptRemRegPtr => op_float_binary[FloatBinary::Rem](dst, src),
                FlptSinReg => op_float_unary[FloatUnary::Sin](dst),
                FlptAsnReg => op_float_unary[FloatUnary::Asin](dst),
                FlptCosReg => op_float_unary[FloatUnary::Cos](dst),
                FlptAcsReg => op_float_unary[FloatUnary::Acos](dst),
                FlptTanReg => op_float_unary[FloatUnary::Tan](dst),
                FlptAtnReg => op_float_unary[FloatUnary::Atan](dst),
                FlptPtnRegReg | FlptPtnRegLit | FlptPtnRegAdr | FlptPtnRegPtr => op_float_binary[FloatBinary::Atan2](dst, src),
                FlptPowRegReg | FlptPowRegLit | FlptPowRegAdr | FlptPowRegPtr => op_float_binary[FloatBinary::Pow](dst, src),
                FlptLogRegReg | FlptLogRegLit | FlptLogRegAdr | FlptLogRegPtr => op_float_binary[FloatBinary::Log](dst, src),
                FlptWcnReg | FlptWcnLit | FlptWcnAdr | FlptWcnPtr => op_write_console[NumberFormat::Float](src),
                FlptWfnReg | FlptWfnLit | FlptWfnAdr | FlptWfnPtr => op_write_file[NumberFormat::Float](src),
                FlptExhReg => op_float_convert[FloatConversion::HalfToDouble](dst),
                FlptExsReg => op_float_convert[FloatConversion::SingleToDouble](dst),
                FlptShsReg => op_float_convert[FloatConversion::DoubleToSingle](dst),
                FlptShhReg => op_float_convert[FloatConversion::DoubleToHalf](dst),
                FlptNegReg => op_float_unary[FloatUnary::Neg](dst),
                FlptUtfReg => op_float_convert[FloatConversion::UnsignedToDouble](dst),
                FlptStfReg => op_float_convert[FloatConversion::SignedToDouble](dst),
                FlptFtsReg => op_float_convert[FloatConversion::Truncate](dst),
                FlptFcsReg => op_float_convert[FloatConversion::Ceiling](dst),
                FlptFfsReg => op_float_convert[FloatConversion::Floor](dst),
                FlptFnsReg => op_float_convert[FloatConversion::Nearest](dst),
                FlptCmpRegReg | FlptCmpRegLit | FlptCmpRegAdr | FlptCmpRegPtr => op_float_cmp(lhs, rhs),

                // Extended base
                ExtdBswReg => op_byte_swap(dst),
                ExtdQpfReg => op_query_features(dst),
                ExtdQpvReg => op_query_major(major),
                ExtdQpvRegReg => op_query_version(major, minor),
                ExtdCssReg => op_call_stack_size(dst),
                ExtdHltReg | ExtdHltLit | ExtdHltAdr | ExtdHltPtr => op_halt_with(code),
                ExtdMpaRegPtr | ExtdMpaAdrPtr | ExtdMpaPtrPtr => op_memory_address(dst, src),

                // External assembly
                AsmxLdaAdr | AsmxLdaPtr => op_load_library(name),
                AsmxLdfAdr | AsmxLdfPtr => op_load_function(name),
                AsmxCla => op_close_library(),
                AsmxClf => op_close_function(),
                AsmxAexRegAdr | AsmxAexRegPtr => op_library_exists(dst, name),
                AsmxFexRegAdr | AsmxFexRegPtr => op_function_exists(dst, name),
                AsmxCal => op_external_call(),
                AsmxCalReg | AsmxCalLit | AsmxCalAdr | AsmxCalPtr => op_external_call_with(value),

                // Memory allocation
                HeapAlcRegReg | HeapAlcRegLit | HeapAlcRegAdr | HeapAlcRegPtr => op_heap_allocate(dst, size),
                HeapTryRegReg | HeapTryRegLit | HeapTryRegAdr | HeapTryRegPtr => op_heap_try_allocate(dst, size),
                HeapReaRegReg | HeapReaRegLit | HeapReaRegAdr | HeapReaRegPtr => op_heap_reallocate(block, size),
                HeapTreRegReg | HeapTreRegLit | HeapTreRegAdr | HeapTreRegPtr => op_heap_try_reallocate(block, size),
                HeapFreReg => op_heap_free(block),
            }
        }
    }
}
