//! Ties the catalog, explorer, and renderers together into one pass over a
//! cartridge image: load the ROM, explore reachable code from its entry
//! point, render every reached instruction, and report the header if asked.

mod error;

pub use error::DisasmError;

use std::path::Path;

use log::info;
use msx_disasm_core::{
    edge_label, parse_header, BranchClass, CartridgeHeader, DisasmRecord, Explorer, ExploreStyle,
    RoutineTable,
};
use msx_disasm_fmt::{AsmRenderer, NativeRenderer, Renderer};
use z80_mem::AddressSpace;

/// Cartridge ROM is always mapped starting here.
pub const CARTRIDGE_BASE: u16 = 0x4000;

/// Which rendering dialect to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Native,
    Asm,
}

/// How a run should explore and format a cartridge.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub style: ExploreStyle,
    pub dialect: Dialect,
    pub show_header: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { style: ExploreStyle::BranchAll, dialect: Dialect::Native, show_header: false }
    }
}

/// A finished or halted disassembly pass: the rendered listing is always
/// present (empty only if exploration halted before a single instruction
/// was reached), paired with the error that ended it early, if any.
#[derive(Debug)]
pub struct PartialDisassembly {
    pub output: String,
    pub error: Option<DisasmError>,
}

/// Load `path` as cartridge ROM, explore it, and render every reached
/// instruction in address order.
pub fn disassemble_file(path: &Path, config: &Config) -> Result<PartialDisassembly, DisasmError> {
    let bytes =
        std::fs::read(path).map_err(|_| DisasmError::FileUnreadable(path.to_path_buf()))?;
    Ok(disassemble_bytes(&bytes, config))
}

/// Same as [`disassemble_file`] but takes an already-read ROM image, mainly
/// so tests don't need a filesystem fixture. Unlike file loading, nothing
/// here can fail without having already reached and recorded *something*,
/// so this returns the partial listing directly rather than a `Result`.
#[must_use]
pub fn disassemble_bytes(rom: &[u8], config: &Config) -> PartialDisassembly {
    let mut mem = AddressSpace::new();
    mem.load(CARTRIDGE_BASE, rom);

    let mut out = String::new();
    if config.show_header {
        if let Some(header) = parse_header(&mem, CARTRIDGE_BASE) {
            out.push_str(&format_header(&header));
            out.push('\n');
        }
    }

    let entry = entry_point(&mem);
    info!("exploring from entry point 0x{entry:04X}");

    let routines = RoutineTable::with_bios_defaults();
    let mut explorer = Explorer::new(routines);
    let halt = explorer.run(&mut mem, entry, config.style).err();

    let records = explorer.records();
    let mut addresses: Vec<u16> = records.keys().copied().collect();
    addresses.sort_unstable();

    let renderer: Box<dyn Renderer> = match config.dialect {
        Dialect::Native => Box::new(NativeRenderer),
        Dialect::Asm => Box::new(AsmRenderer),
    };

    for addr in addresses {
        let record = &records[&addr];
        if let Some(name) = explorer.routines().lookup(addr) {
            out.push_str(&format!("; Start of routine {name}.\n"));
        }
        if !is_single_fall_through(record) {
            for &(src, class) in &record.predecessors {
                let predecessor_family = records.get(&src).map(|r| &r.instruction.family);
                out.push_str(&format!(
                    ";   0x{src:04X} {}\n",
                    edge_label(class, predecessor_family)
                ));
            }
        }
        out.push_str(&renderer.render(record, explorer.routines()));
        out.push('\n');
    }

    PartialDisassembly { output: out, error: halt.map(DisasmError::from) }
}

fn is_single_fall_through(record: &DisasmRecord) -> bool {
    matches!(record.predecessors.as_slice(), [(_, BranchClass::FallThrough)])
}

/// The cartridge's declared autostart entry, falling back to the base of
/// ROM when no header is present (a raw code dump with no `"AB"` marker).
fn entry_point(mem: &AddressSpace) -> u16 {
    parse_header(mem, CARTRIDGE_BASE).map_or(CARTRIDGE_BASE, |h: CartridgeHeader| h.init)
}

fn format_header(header: &CartridgeHeader) -> String {
    format!(
        "; header: init=0x{:04X} statement=0x{:04X} device=0x{:04X} text=0x{:04X}",
        header.init, header.statement, header.device, header.text
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn disassembles_a_minimal_ret_entry() {
        let rom = [0xC9];
        let result = disassemble_bytes(&rom, &Config::default());
        assert!(result.error.is_none());
        assert_eq!(result.output.trim(), "4000 RET");
    }

    #[test]
    fn follows_header_entry_point_when_present() {
        let mut rom = vec![0u8; 16]; // 16-byte header, rest padding
        rom[0] = b'A';
        rom[1] = b'B';
        rom[2..4].copy_from_slice(&0x4010u16.to_le_bytes());
        rom.push(0xC9); // RET at 0x4010

        let result = disassemble_bytes(&rom, &Config::default());
        assert!(result.output.contains("RET"));
    }

    #[test]
    fn conditional_jr_labels_both_predecessor_edges() {
        // JR NZ, +2; RET; NOP; RET — matches the literal scenario in spec.
        let rom = [0x20, 0x02, 0xC9, 0x00, 0xC9];
        let result = disassemble_bytes(&rom, &Config::default());
        assert!(result.output.contains(";   0x4000 JR NZ, e"));
        assert!(result.output.contains(";   0x4000 fall through"));
    }

    #[test]
    fn call_and_its_own_return_site_share_the_call_label() {
        // CALL 0x4005; RET (at 0x4003, the call's own fall-through); RET (at 0x4005).
        let rom = [0xCD, 0x05, 0x40, 0xC9, 0x00, 0xC9];
        let result = disassemble_bytes(&rom, &Config::default());
        assert!(result.output.contains(";   0x4000 CALL nn"));
        assert!(!result.output.contains("fall through"));
    }

    #[test]
    fn unknown_opcode_is_reported_as_disasm_error() {
        let rom = [0xED, 0x00];
        let result = disassemble_bytes(&rom, &Config::default());
        assert!(matches!(result.error, Some(DisasmError::UnknownOpcode(0xED00))));
    }

    #[test]
    fn unknown_opcode_still_renders_everything_reached_before_the_halt() {
        // JR NZ, +2 reaches a valid RET at 0x4004 before the fall-through
        // at 0x4002 hits the unknown ED 00 opcode and halts the run.
        let rom = [0x20, 0x02, 0xED, 0x00, 0xC9];
        let result = disassemble_bytes(&rom, &Config::default());
        assert!(matches!(result.error, Some(DisasmError::UnknownOpcode(0xED00))));
        assert!(result.output.contains("RET"));
    }
}
