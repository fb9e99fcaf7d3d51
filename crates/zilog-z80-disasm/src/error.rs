//! Decoder errors.

use thiserror::Error;
use z80_mem::MemError;

/// Failure decoding a single instruction.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The fetched prefix-combined opcode word matches no catalog entry.
    #[error("unknown opcode 0x{0:04X}")]
    UnknownOpcode(u32),

    /// Fetching the opcode or an operand byte reached an uninitialized cell.
    #[error("uninitialized read while decoding: {0}")]
    UninitializedRead(#[from] MemError),
}
