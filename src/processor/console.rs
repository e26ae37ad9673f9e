//! Console seam used by the `WC*`, `SIGN_WC*`, `FLPT_WCN` and `RCC`
//! instructions.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

/// Byte-oriented console.
pub trait Console {
    /// Writes `bytes` to the console output.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Reads one byte of input, or `None` once input has ended.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Process stdin and stdout. Output is flushed after every write so it
/// interleaves correctly with prompts read through `RCC`.
#[derive(Default, Debug)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}

/// In-memory console with scripted input and shared captured output.
///
/// Clones share the same buffers, so a handle kept by the caller observes
/// everything the processor writes.
#[derive(Clone, Default, Debug)]
pub struct BufferConsole {
    input: Rc<RefCell<VecDeque<u8>>>,
    output: Rc<RefCell<Vec<u8>>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: impl AsRef<[u8]>) -> Self {
        let console = Self::new();
        console.push_input(input);
        console
    }

    /// Appends bytes for later `RCC` reads.
    pub fn push_input(&self, input: impl AsRef<[u8]>) {
        self.input.borrow_mut().extend(input.as_ref());
    }

    /// Everything written so far.
    pub fn output(&self) -> Vec<u8> {
        self.output.borrow().clone()
    }

    /// Output decoded lossily as UTF-8.
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output.borrow()).into_owned()
    }

    pub fn clear_output(&self) {
        self.output.borrow_mut().clear();
    }
}

impl Console for BufferConsole {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.output.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.borrow_mut().pop_front())
    }
}
