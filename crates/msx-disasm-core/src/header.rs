//! Cartridge ROM header parsing.
//!
//! An MSX cartridge may start its first 16 KiB page with a 16-byte header
//! identifying an autostart entry point; this is a supplement to the
//! reachability-driven exploration (not a gate on it) exposed for
//! `--show-header` reporting.

use z80_mem::AddressSpace;

/// Parsed contents of a cartridge's ROM header, when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartridgeHeader {
    pub init: u16,
    pub statement: u16,
    pub device: u16,
    pub text: u16,
}

/// Parse the 16-byte header at `base` (conventionally 0x4000). Returns
/// `None` if the `"AB"` identifier bytes are absent or uninitialized.
#[must_use]
pub fn parse(mem: &AddressSpace, base: u16) -> Option<CartridgeHeader> {
    let id0 = mem.read_byte(base).ok()?;
    let id1 = mem.read_byte(base.wrapping_add(1)).ok()?;
    if (id0, id1) != (b'A', b'B') {
        return None;
    }
    let init = mem.read_word(base.wrapping_add(2)).ok()?;
    let statement = mem.read_word(base.wrapping_add(4)).ok()?;
    let device = mem.read_word(base.wrapping_add(6)).ok()?;
    let text = mem.read_word(base.wrapping_add(8)).ok()?;
    Some(CartridgeHeader { init, statement, device, text })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_with_valid_id() {
        let mut mem = AddressSpace::new();
        mem.load(
            0x4000,
            &[b'A', b'B', 0x10, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        );
        let header = parse(&mem, 0x4000).unwrap();
        assert_eq!(header.init, 0x4010);
    }

    #[test]
    fn missing_id_yields_none() {
        let mut mem = AddressSpace::new();
        mem.load(0x4000, &[0xC9, 0x00]);
        assert_eq!(parse(&mem, 0x4000), None);
    }
}
