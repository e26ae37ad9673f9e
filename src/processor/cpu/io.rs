//! Console and file instructions.
//!
//! At most one file is open at a time. It is opened for both reading and
//! writing through a single handle, so reads and writes share a position.

use super::Processor;
use crate::info;
use crate::processor::errors::ProcessorError;
use crate::processor::flags::StatusFlags;
use crate::processor::operand::Operand;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, Write};

/// How a value is rendered by the console and file write instructions.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(super) enum NumberFormat {
    /// Unsigned decimal.
    Decimal,
    /// Low byte as unsigned decimal.
    Byte,
    /// Uppercase hexadecimal without padding.
    Hex,
    /// Low byte written as-is.
    Raw,
    SignedDecimal,
    /// Low byte as signed decimal.
    SignedByte,
    /// Shortest decimal that reads back as the same double.
    Float,
}

impl NumberFormat {
    pub(super) fn render(self, value: u64) -> Vec<u8> {
        match self {
            NumberFormat::Decimal => value.to_string().into_bytes(),
            NumberFormat::Byte => (value as u8).to_string().into_bytes(),
            NumberFormat::Hex => format!("{value:X}").into_bytes(),
            NumberFormat::Raw => vec![value as u8],
            NumberFormat::SignedDecimal => (value as i64).to_string().into_bytes(),
            NumberFormat::SignedByte => (value as u8 as i8).to_string().into_bytes(),
            NumberFormat::Float => f64::from_bits(value).to_string().into_bytes(),
        }
    }
}

pub(super) struct OpenFile {
    path: String,
    handle: File,
}

impl OpenFile {
    pub(super) fn path(&self) -> &str {
        &self.path
    }
}

fn file_error(reason: impl Into<String>) -> ProcessorError {
    ProcessorError::FileOperation {
        reason: reason.into(),
    }
}

fn host_file_error(path: &str, err: std::io::Error) -> ProcessorError {
    file_error(format!("{path}: {err}"))
}

impl Processor {
    fn open_file_mut(&mut self) -> Result<&mut OpenFile, ProcessorError> {
        self.open_file
            .as_mut()
            .ok_or_else(|| file_error("no file is open"))
    }

    // ==================== Output ====================

    pub(super) fn op_write_console(
        &mut self,
        _instr: &'static str,
        format: NumberFormat,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let text = format.render(self.load(src)?);
        self.console.write(&text)?;
        Ok(())
    }

    pub(super) fn op_write_file(
        &mut self,
        _instr: &'static str,
        format: NumberFormat,
        src: Operand,
    ) -> Result<(), ProcessorError> {
        let text = format.render(self.load(src)?);
        let file = self.open_file_mut()?;
        file.handle
            .write_all(&text)
            .map_err(|err| host_file_error(&file.path, err))
    }

    // ==================== Files ====================

    /// Opens (creating if missing) the file whose path is the string at
    /// `path`. FileEnd reports whether it is empty.
    pub(super) fn op_open_file(
        &mut self,
        _instr: &'static str,
        path: Operand,
    ) -> Result<(), ProcessorError> {
        if let Some(open) = &self.open_file {
            return Err(file_error(format!(
                "{} is already open, close it with CFL first",
                open.path
            )));
        }
        let path = self.load_string(path)?;
        let handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| host_file_error(&path, err))?;
        let empty = handle
            .metadata()
            .map_err(|err| host_file_error(&path, err))?
            .len()
            == 0;
        info!("opened file {}", path);
        self.open_file = Some(OpenFile { path, handle });
        self.registers.update_flags(
            StatusFlags::FILE_END,
            StatusFlags::when(StatusFlags::FILE_END, empty),
        );
        Ok(())
    }

    pub(super) fn op_close_file(&mut self, _instr: &'static str) -> Result<(), ProcessorError> {
        let mut file = self
            .open_file
            .take()
            .ok_or_else(|| file_error("no file is open"))?;
        file.handle
            .flush()
            .map_err(|err| host_file_error(&file.path, err))?;
        info!("closed file {}", file.path);
        Ok(())
    }

    pub(super) fn op_delete_file(
        &mut self,
        _instr: &'static str,
        path: Operand,
    ) -> Result<(), ProcessorError> {
        let path = self.load_string(path)?;
        fs::remove_file(&path).map_err(|err| host_file_error(&path, err))
    }

    pub(super) fn op_file_exists(
        &mut self,
        instr: &'static str,
        dst: Operand,
        path: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let path = self.load_string(path)?;
        let exists = fs::metadata(&path).is_ok_and(|meta| meta.is_file());
        self.registers.set(register, exists as u64)
    }

    pub(super) fn op_file_size(
        &mut self,
        instr: &'static str,
        dst: Operand,
        path: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let path = self.load_string(path)?;
        let size = fs::metadata(&path)
            .map_err(|err| host_file_error(&path, err))?
            .len();
        self.registers.set(register, size)
    }

    // ==================== Input ====================

    pub(super) fn op_read_console(
        &mut self,
        instr: &'static str,
        dst: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let byte = self
            .console
            .read_byte()?
            .ok_or(ProcessorError::ConsoleInputEnded)?;
        self.registers.set(register, byte as u64)
    }

    /// Reads one byte and sets FileEnd once none remain.
    pub(super) fn op_read_file(
        &mut self,
        instr: &'static str,
        dst: Operand,
    ) -> Result<(), ProcessorError> {
        let register = self.target_register(instr, dst)?;
        let file = self.open_file_mut()?;
        let mut byte = [0u8; 1];
        let read = file
            .handle
            .read(&mut byte)
            .map_err(|err| host_file_error(&file.path, err))?;
        if read == 0 {
            return Err(file_error(format!("no bytes left to read in {}", file.path)));
        }
        let position = file
            .handle
            .stream_position()
            .map_err(|err| host_file_error(&file.path, err))?;
        let length = file
            .handle
            .metadata()
            .map_err(|err| host_file_error(&file.path, err))?
            .len();
        self.registers.set(register, byte[0] as u64)?;
        if position >= length {
            self.registers
                .update_flags(StatusFlags::FILE_END, StatusFlags::FILE_END);
        }
        Ok(())
    }
}
