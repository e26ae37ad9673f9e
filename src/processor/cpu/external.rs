//! External assembly set. A program opens one library and one function in it
//! at a time, then calls that function through the configured
//! [`InteropHost`](crate::processor::interop::InteropHost).

use super::Processor;
use crate::info;
use crate::processor::errors::ProcessorError;
use crate::processor::operand::Operand;
use crate::processor::register::Register;

fn external_error(reason: impl Into<String>) -> ProcessorError {
    ProcessorError::ExternalOperation {
        reason: reason.into(),
    }
}

impl Processor {
    fn library_name(&self) -> Result<&str, ProcessorError> {
        self.open_library
            .as_deref()
            .ok_or_else(|| external_error("no external library is open"))
    }

    pub(super) fn op_load_library(
        &mut self,
        _instr: &'static str,
        name: Operand,
    ) -> Result<(), ProcessorError> {
        if let Some(open) = &self.open_library {
            return Err(external_error(format!(
                "library {open:?} is already open, close it with ASMX_CLA first"
            )));
        }
        let name = self.load_string(name)?;
        if !self.interop.has_library(&name) {
            return Err(ProcessorError::InvalidLibrary { name });
        }
        info!("opened external library {}", name);
        self.open_library = Some(name);
        Ok(())
    }

    pub(super) fn op_load_function(
        &mut self,
        _instr: &'static str,
        name: Operand,
    ) -> Result<(), ProcessorError> {
        let library = self.library_name()?;
        if let Some(open) = &self.open_function {
            return Err(external_error(format!(
                "function {open:?} is already open, close it with ASMX_CLF first"
            )));
        }
        let name = self.load_string(name)?;
        if !self.interop.has_function(library, &name) {
            return Err(ProcessorError::InvalidFunction { name });
        }
        self.open_function = Some(name);
        Ok(())
    }

    /// Closes the open library together with its open function.
    pub(super) fn op_close_library(&mut self, _instr: &'static str) -> Result<(), ProcessorError> {
        let library = self
            .open_library
            .take()
            .ok_or_else(|| external_error("no external library is open"))?;
        self.open_function = None;
        info!("closed external library {}", library);
        Ok(())
    }

    pub(super) fn op_close_function(&mut self, _instr: &'static str) -> Result<(), ProcessorError> {
        self.open_function
            .take()
            .map(|_| ())
            .ok_or_else(|| external_error("no external function is open"))
    }

    pub(super) fn op_library_exists(
        &mut self,
        instr: &'static str,
        dst: Operand,
        name: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let name = self.load_string(name)?;
        let exists = self.interop.has_library(&name);
        self.registers.set(register, exists as u64)
    }

    pub(super) fn op_function_exists(
        &mut self,
        instr: &'static str,
        dst: Operand,
        name: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let name = self.load_string(name)?;
        let exists = self.interop.has_function(self.library_name()?, &name);
        self.registers.set(register, exists as u64)
    }

    pub(super) fn op_external_call(&mut self, _instr: &'static str) -> Result<(), ProcessorError> {
        self.call_external(None)
    }

    pub(super) fn op_external_call_with(
        &mut self,
        _instr: &'static str,
        value: Operand,
    ) -> Result<(), ProcessorError> {
        let value = self.load(value)?;
        self.call_external(Some(value))
    }

    /// Hands memory and the register file to the open function. Whatever it
    /// leaves in `rpo` is discarded.
    fn call_external(&mut self, passed: Option<u64>) -> Result<(), ProcessorError> {
        let library = self
            .open_library
            .as_deref()
            .ok_or_else(|| external_error("no external library is open"))?;
        let function = self
            .open_function
            .as_deref()
            .ok_or_else(|| external_error("no external function is open"))?;
        let offset = self.registers.get(Register::Rpo);
        let result = self.interop.call(
            library,
            function,
            self.memory.as_mut_slice(),
            self.registers.as_mut_array(),
            passed,
        );
        self.registers.set_unchecked(Register::Rpo, offset);
        result.map_err(|reason| ProcessorError::ExternalFunctionFailed {
            function: format!("{library}::{function}"),
            reason,
        })
    }
}
