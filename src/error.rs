use std::io;

/// everything that can stop a run. NB. the halt sentinel is not in here,
/// see `interpreter::Step`
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("no ROM is loaded")]
    RomNotLoaded,

    #[error("invalid opcode {opcode:#06X}")]
    InvalidOpcode { opcode: u16 },

    #[error("stack overflow: call with all {capacity} stack slots in use")]
    StackOverflow { capacity: usize },

    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,

    #[error("malformed flag registers: {0}")]
    InvalidFlags(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Chip8Error>;
