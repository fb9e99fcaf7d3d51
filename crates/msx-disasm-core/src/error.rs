//! Explorer errors.

use thiserror::Error;
use zilog_z80_disasm::DecodeError;

/// The queue is declared overflowed once this many distinct PCs have been
/// dequeued without finishing exploration — a cartridge that needs more
/// than this is almost certainly feeding the jump-table heuristic garbage.
pub const QUEUE_OVERFLOW_LIMIT: usize = 65_536;

/// Failure exploring a cartridge's control flow.
#[derive(Debug, Error)]
pub enum ExploreError {
    /// The decoder could not make sense of the bytes at some reached PC.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// More than [`QUEUE_OVERFLOW_LIMIT`] distinct PCs were reached.
    #[error("explored more than {QUEUE_OVERFLOW_LIMIT} distinct addresses")]
    QueueOverflow,
}
