//! Register-based virtual processor for AssEmbly bytecode.
//!
//! The processor executes bytecode produced by an external AssEmbly assembler.
//! A host constructs it with a memory size, loads a program at address 0 and
//! calls [`cpu::Processor::execute`].
//!
//! # Architecture
//!
//! - **Registers**: sixteen 64-bit registers; `rpo` (program offset) is
//!   read-only to programs
//! - **Memory**: flat little-endian byte array; the stack grows down from its
//!   end
//! - **Instruction format**: one opcode byte, or `0xFF`, set byte, opcode byte
//!   for extension sets, followed by register, literal, address and pointer
//!   operands
//! - **Status flags**: Zero, Carry, FileEnd, Sign and Overflow bits in `rsf`
//! - **Host services**: random numbers, console, files and external functions,
//!   all injectable through [`config::ProcessorConfig`]
//!
//! # Modules
//!
//! - [`config`]: Memory size, entry point and host services
//! - [`console`]: Console seam and an in-memory implementation
//! - [`cpu`]: Fetch-decode-execute loop and instruction handlers
//! - [`errors`]: Execution error type
//! - [`flags`]: Status flag bitmask and jump conditions
//! - [`interop`]: External function registry
//! - [`isa`]: Instruction set definition and opcode tables
//! - [`operand`]: Operand shapes and the pointer codec
//! - [`random`]: Random number sources
//! - [`register`]: Register ids

pub mod config;
pub mod console;
pub mod cpu;
pub mod errors;
pub mod flags;
pub mod interop;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod operand;
pub mod random;
pub mod register;
