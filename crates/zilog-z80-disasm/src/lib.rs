//! Z80 instruction catalog and decoder.
//!
//! The catalog is one sum type (`Family`) covering every instruction family,
//! built by pattern-matching bit-fields out of the opcode byte(s) — the same
//! style a cycle-accurate core's `execute` switch uses, except every arm
//! here *returns a value* instead of pushing micro-ops. `decode` is pure with
//! respect to `(address space contents, catalog)`: it never mutates memory
//! or registers and never branches on control flow semantics. That belongs
//! to the explorer.

pub mod fields;
mod decode;
mod error;
mod instruction;

pub use decode::decode;
pub use error::DecodeError;
pub use instruction::{
    AluOp, BitKind, Family, IndexReg, Instruction, JrCond, RotOp, Target8,
};
