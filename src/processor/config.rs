//! Construction-time settings for a [`Processor`](super::cpu::Processor).

use crate::processor::console::{Console, StdConsole};
use crate::processor::interop::{InteropHost, InteropRegistry};
use crate::processor::random::{OsRandom, RandomSource};
use std::fmt;

/// Default memory size in bytes.
pub const DEFAULT_MEMORY_SIZE: usize = 2046;

/// Memory size, entry point and the host services a processor talks to.
pub struct ProcessorConfig {
    pub memory_size: usize,
    /// Initial value of `rpo`.
    pub entry_point: u64,
    pub random: Box<dyn RandomSource>,
    pub console: Box<dyn Console>,
    pub interop: Box<dyn InteropHost>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            entry_point: 0,
            random: Box::new(OsRandom),
            console: Box::new(StdConsole),
            interop: Box::new(InteropRegistry::new()),
        }
    }
}

impl ProcessorConfig {
    pub fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn with_entry_point(mut self, entry_point: u64) -> Self {
        self.entry_point = entry_point;
        self
    }

    pub fn with_random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Box::new(random);
        self
    }

    pub fn with_console(mut self, console: impl Console + 'static) -> Self {
        self.console = Box::new(console);
        self
    }

    pub fn with_interop(mut self, interop: impl InteropHost + 'static) -> Self {
        self.interop = Box::new(interop);
        self
    }
}

impl fmt::Debug for ProcessorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorConfig")
            .field("memory_size", &self.memory_size)
            .field("entry_point", &self.entry_point)
            .finish_non_exhaustive()
    }
}
