//! # flags
//!
//! Keeps the FX75/FX85 flag registers between sessions. The stored form is a
//! bracketed, comma separated list of decimals, e.g. `[0,1,2,...]`, which is
//! exactly what a JSON array of bytes looks like.

use crate::error::{Chip8Error, Result};
use crate::machine::REGISTER_COUNT;
use std::fs;
use std::io;
use std::path::PathBuf;

pub type FlagRegisters = [u8; REGISTER_COUNT];

pub fn encode_flags(flags: &FlagRegisters) -> Result<String> {
    serde_json::to_string(flags.as_slice()).map_err(|e| Chip8Error::InvalidFlags(e.to_string()))
}

/// parse a stored list. shorter lists fill the leading registers and leave
/// the rest zeroed; longer ones are rejected
pub fn decode_flags(text: &str) -> Result<FlagRegisters> {
    let values: Vec<u8> =
        serde_json::from_str(text).map_err(|e| Chip8Error::InvalidFlags(e.to_string()))?;
    if values.len() > REGISTER_COUNT {
        return Err(Chip8Error::InvalidFlags(format!(
            "{} values, at most {} flag registers",
            values.len(),
            REGISTER_COUNT
        )));
    }
    let mut flags = [0; REGISTER_COUNT];
    flags[..values.len()].copy_from_slice(&values);
    Ok(flags)
}

/// somewhere to keep the flag registers between runs
pub trait FlagStore {
    /// None if nothing has been stored yet
    fn load(&mut self) -> Result<Option<FlagRegisters>>;

    fn store(&mut self, flags: &FlagRegisters) -> Result<()>;
}

/// flags kept in a text file
pub struct FileFlagStore {
    path: PathBuf,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileFlagStore { path: path.into() }
    }
}

impl FlagStore for FileFlagStore {
    fn load(&mut self) -> Result<Option<FlagRegisters>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => decode_flags(text.trim()).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&mut self, flags: &FlagRegisters) -> Result<()> {
        fs::write(&self.path, encode_flags(flags)?)?;
        Ok(())
    }
}

/// flags kept in memory, in their stored form
#[derive(Default)]
pub struct MemoryFlagStore {
    pub saved: Option<String>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn load(&mut self) -> Result<Option<FlagRegisters>> {
        self.saved.as_deref().map(decode_flags).transpose()
    }

    fn store(&mut self, flags: &FlagRegisters) -> Result<()> {
        self.saved = Some(encode_flags(flags)?);
        Ok(())
    }
}
