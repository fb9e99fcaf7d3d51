//! Pluggable renderers turning a decoded instruction into one line of text.
//!
//! Two dialects exist, grounded one-for-one on the original disassembler's
//! two independent renderers: a native dialect meant to be read (`decompiler.py`'s
//! `__str__` methods, annotated with BIOS call names and VDP hook comments),
//! and an assembler-compatible dialect meant to be fed back into a Z80
//! assembler (`z80dasm/instruction.py`'s lowercase, tab-separated output).

mod asm;
mod native;

pub use asm::AsmRenderer;
pub use native::NativeRenderer;

use msx_disasm_core::{DisasmRecord, RoutineTable};

/// Formats a single decoded instruction as one line.
///
/// A dialect is a pure function of `(record, routines)` — it never needs
/// the full explored graph, only the one instruction and the name table.
pub trait Renderer {
    fn render(&self, record: &DisasmRecord, routines: &RoutineTable) -> String;
}

/// Read an 8-bit register's 3-bit code into a 1995-vintage mnemonic name.
pub(crate) fn r_name(code: u8) -> &'static str {
    zilog_z80_disasm::fields::R_NAMES[(code & 0b111) as usize]
}

pub(crate) fn cc_name(code: u8) -> &'static str {
    zilog_z80_disasm::fields::CC_NAMES[(code & 0b111) as usize]
}

pub(crate) fn dd_name(code: u8) -> &'static str {
    zilog_z80_disasm::fields::DD_NAMES[(code & 0b11) as usize]
}

pub(crate) fn qq_name(code: u8) -> &'static str {
    zilog_z80_disasm::fields::QQ_NAMES[(code & 0b11) as usize]
}

pub(crate) fn pp_name(code: u8) -> &'static str {
    zilog_z80_disasm::fields::PP_NAMES[(code & 0b11) as usize]
}

pub(crate) fn rr_name(code: u8) -> &'static str {
    zilog_z80_disasm::fields::RR_NAMES[(code & 0b11) as usize]
}
