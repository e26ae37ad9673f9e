use crate::processor::register::Register;
use cpu_derive::Error;

/// Fatal conditions raised while loading or executing a program.
///
/// Every variant is raised before the failing instruction mutates registers or
/// memory; the processor is left exactly as it was before that instruction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    /// An instruction tried to use a protected register as its destination.
    #[error("register {register} is read-only")]
    ReadOnlyRegister { register: Register },
    /// Integer division or remainder with a zero divisor.
    #[error("{instruction}: division by zero")]
    DivideByZero { instruction: &'static str },
    /// A memory access whose window does not fit inside the allocated buffer.
    #[error("memory access of {width} byte(s) at {address:#x} is outside of {capacity} bytes of memory")]
    MemoryOutOfBounds {
        address: u64,
        width: usize,
        capacity: usize,
    },
    /// The opcode byte has no entry in the selected extension set.
    #[error("unknown opcode {opcode:#04X} in extension set {extension_set:#04X} at offset {offset:#x}")]
    UnknownOpcode {
        extension_set: u8,
        opcode: u8,
        offset: u64,
    },
    /// The byte following the extension prefix does not name a supported set.
    #[error("unknown extension set {set:#04X} at offset {offset:#x}")]
    UnknownExtensionSet { set: u8, offset: u64 },
    /// A register operand byte outside of the register file.
    #[error("invalid register {index} at offset {offset:#x}")]
    InvalidRegister { index: u8, offset: u64 },
    /// An operand ran past the end of memory while being decoded.
    #[error("operand at offset {offset:#x} needs {needed} byte(s) but only {available} remain")]
    TruncatedOperand {
        offset: u64,
        needed: usize,
        available: usize,
    },
    /// A literal operand was used where a writable location is required.
    #[error("{instruction}: a literal cannot be a destination")]
    LiteralDestination { instruction: &'static str },
    /// The program offset reached the end of memory without halting.
    #[error("reached the end of memory at offset {offset:#x}")]
    EndOfMemory { offset: u64 },
    /// The program does not fit into memory.
    #[error("program of {size} bytes does not fit in {capacity} bytes of memory")]
    ProgramTooLarge { size: usize, capacity: usize },
    #[error("a program is already loaded")]
    ProgramAlreadyLoaded,
    #[error("no program has been loaded")]
    ProgramNotLoaded,
    /// Misuse of the file instructions, or a file error reported by the host.
    #[error("file operation failed: {reason}")]
    FileOperation { reason: String },
    /// Console output or input failed.
    #[error("console i/o failed: {reason}")]
    Io { reason: String },
    #[error("console input has ended")]
    ConsoleInputEnded,
    /// A NUL-terminated string in memory is not valid UTF-8.
    #[error("string at {address:#x} is not valid utf-8")]
    InvalidString { address: u64 },
    /// Misuse of the external assembly instructions.
    #[error("external operation failed: {reason}")]
    ExternalOperation { reason: String },
    #[error("no external library named {name:?}")]
    InvalidLibrary { name: String },
    #[error("no external function named {name:?} in the open library")]
    InvalidFunction { name: String },
    /// The host function returned an error.
    #[error("external function {function:?} failed: {reason}")]
    ExternalFunctionFailed { function: String, reason: String },
    /// An empty block, or one no free region between the program and the
    /// stack can hold.
    #[error("cannot allocate a block of {size} byte(s)")]
    MemoryAllocation { size: u64 },
    /// An address that is not the start of an allocated block.
    #[error("{address:#x} is not the start of an allocated block")]
    InvalidMemoryBlock { address: u64 },
}

impl ProcessorError {
    /// Fills in the bytecode offset of decode errors raised by helpers that do
    /// not know where their input came from.
    pub fn at_offset(self, at: u64) -> Self {
        match self {
            ProcessorError::UnknownOpcode {
                extension_set,
                opcode,
                ..
            } => ProcessorError::UnknownOpcode {
                extension_set,
                opcode,
                offset: at,
            },
            ProcessorError::InvalidRegister { index, .. } => {
                ProcessorError::InvalidRegister { index, offset: at }
            }
            ProcessorError::TruncatedOperand {
                needed, available, ..
            } => ProcessorError::TruncatedOperand {
                offset: at,
                needed,
                available,
            },
            other => other,
        }
    }
}

impl From<std::io::Error> for ProcessorError {
    fn from(err: std::io::Error) -> Self {
        ProcessorError::Io {
            reason: err.to_string(),
        }
    }
}
