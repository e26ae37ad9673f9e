//! Host functions reachable through the external assembly (`ASMX_*`)
//! instructions.
//!
//! A program opens a library by name, then a function within it, then calls
//! that function any number of times. The [`InteropHost`] trait decides which
//! names exist and runs the calls; [`InteropRegistry`] is an in-process
//! implementation keyed by library and function name.

use std::collections::HashMap;
use std::fmt;

/// Native function invoked by `ASMX_CAL`.
///
/// Receives the whole memory and register file, plus the optional value the
/// instruction passed. Registers are indexed by [`Register`] encoding; the
/// processor restores `rpo` after the call.
///
/// [`Register`]: crate::processor::register::Register
pub type ExternalFunction =
    Box<dyn FnMut(&mut [u8], &mut [u64; 16], Option<u64>) -> Result<(), String>>;

/// Resolves and runs external functions.
pub trait InteropHost {
    fn has_library(&self, library: &str) -> bool;

    fn has_function(&self, library: &str, function: &str) -> bool;

    /// Runs `function` from `library`. An `Err` message is reported to the
    /// program as a fatal error.
    fn call(
        &mut self,
        library: &str,
        function: &str,
        memory: &mut [u8],
        registers: &mut [u64; 16],
        passed: Option<u64>,
    ) -> Result<(), String>;
}

/// Named libraries of boxed closures.
#[derive(Default)]
pub struct InteropRegistry {
    libraries: HashMap<String, HashMap<String, ExternalFunction>>,
}

impl InteropRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `function` under `library`, creating the library if needed.
    /// An existing function with the same name is replaced.
    pub fn register(
        &mut self,
        library: impl Into<String>,
        function: impl Into<String>,
        body: impl FnMut(&mut [u8], &mut [u64; 16], Option<u64>) -> Result<(), String> + 'static,
    ) -> &mut Self {
        self.libraries
            .entry(library.into())
            .or_default()
            .insert(function.into(), Box::new(body));
        self
    }

    /// Registers an empty library.
    pub fn add_library(&mut self, library: impl Into<String>) -> &mut Self {
        self.libraries.entry(library.into()).or_default();
        self
    }
}

impl fmt::Debug for InteropRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (library, functions) in &self.libraries {
            let mut names: Vec<&String> = functions.keys().collect();
            names.sort();
            map.entry(library, &names);
        }
        map.finish()
    }
}

impl InteropHost for InteropRegistry {
    fn has_library(&self, library: &str) -> bool {
        self.libraries.contains_key(library)
    }

    fn has_function(&self, library: &str, function: &str) -> bool {
        self.libraries
            .get(library)
            .is_some_and(|functions| functions.contains_key(function))
    }

    fn call(
        &mut self,
        library: &str,
        function: &str,
        memory: &mut [u8],
        registers: &mut [u64; 16],
        passed: Option<u64>,
    ) -> Result<(), String> {
        let body = self
            .libraries
            .get_mut(library)
            .and_then(|functions| functions.get_mut(function))
            .ok_or_else(|| format!("{library}::{function} is not registered"))?;
        body(memory, registers, passed)
    }
}
