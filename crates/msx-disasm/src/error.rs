//! The tool's flat, user-facing error taxonomy. Internal crates each have
//! their own narrower error types; this is what the CLI actually reports.

use std::path::PathBuf;

use thiserror::Error;
use msx_disasm_core::ExploreError;
use zilog_z80_disasm::DecodeError;
use z80_mem::MemError;

#[derive(Debug, Error)]
pub enum DisasmError {
    #[error("cannot read {0}")]
    FileUnreadable(PathBuf),

    #[error("uninitialized read at 0x{0:04X}")]
    UninitializedRead(u16),

    #[error("unknown opcode 0x{0:04X}")]
    UnknownOpcode(u32),

    #[error("explored more than {} distinct addresses", msx_disasm_core::QUEUE_OVERFLOW_LIMIT)]
    QueueOverflow,
}

impl From<ExploreError> for DisasmError {
    fn from(err: ExploreError) -> Self {
        match err {
            ExploreError::Decode(DecodeError::UnknownOpcode(word)) => {
                DisasmError::UnknownOpcode(word)
            }
            ExploreError::Decode(DecodeError::UninitializedRead(MemError::UninitializedRead(
                addr,
            ))) => DisasmError::UninitializedRead(addr),
            ExploreError::QueueOverflow => DisasmError::QueueOverflow,
        }
    }
}
