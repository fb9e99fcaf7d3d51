//! Address space and register model shared by the decoder and the explorer.
//!
//! Unlike a cycle-accurate emulator's bus, this model never executes an
//! instruction stream — it only needs to answer reads, apply the handful of
//! writes the explorer performs, and notify observers of those writes.

mod address_space;
mod error;
mod registers;

pub use address_space::AddressSpace;
pub use error::MemError;
pub use registers::Registers;
