//! Errors raised by the address space.

use thiserror::Error;

/// Failure reading from the address space.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemError {
    /// A read reached a cell that was never loaded.
    ///
    /// This is how ROM is distinguished from unmapped memory: unlike an
    /// emulator, this model never invents a zero byte for a hole.
    #[error("read of uninitialized cell at 0x{0:04X}")]
    UninitializedRead(u16),
}
