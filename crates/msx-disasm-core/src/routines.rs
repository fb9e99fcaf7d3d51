//! Named entry points into the MSX BIOS jump table at the start of ROM
//! space, so the renderer can annotate `CALL 0x0056` as `bios.FILVRM(...)`
//! instead of a bare address.
//!
//! The BIOS table is a flat run of `JP nn` instructions, three bytes apart,
//! starting at 0x0000 — there is no header to parse, only known offsets.
//! [`RoutineTable::add_routine`] is the general mechanism for naming
//! anything a particular cartridge jumps into beyond this seed.
//!
//! [`RoutineTable::get`] is the fallible accessor: an address with no
//! registered name is an [`UnknownRoutine`] error, not silently absent
//! data. [`RoutineTable::lookup`] wraps it as an `Option` for call sites
//! (the renderer) where "no name" is the expected, common case.

use std::collections::HashMap;

use thiserror::Error;

/// Failure looking an address up in a [`RoutineTable`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no routine registered at 0x{0:04X}")]
pub struct UnknownRoutine(pub u16);

/// A name lookup from address to MSX routine name, seeded with the
/// well-known BIOS vectors and extensible at runtime.
#[derive(Debug, Clone, Default)]
pub struct RoutineTable {
    names: HashMap<u16, String>,
}

impl RoutineTable {
    #[must_use]
    pub fn new() -> Self {
        Self { names: HashMap::new() }
    }

    /// A table seeded with the BIOS vectors every MSX ROM can assume are
    /// present, regardless of machine generation.
    #[must_use]
    pub fn with_bios_defaults() -> Self {
        let mut table = Self::new();
        for &(addr, name) in BIOS_VECTORS {
            table.add_routine(addr, name);
        }
        table
    }

    pub fn add_routine(&mut self, addr: u16, name: impl Into<String>) {
        self.names.insert(addr, name.into());
    }

    /// Fallible accessor: an address with no registered label is an error,
    /// not silently absent data.
    pub fn get(&self, addr: u16) -> Result<&str, UnknownRoutine> {
        self.names.get(&addr).map(String::as_str).ok_or(UnknownRoutine(addr))
    }

    /// Convenience wrapper over [`Self::get`] for call sites that only care
    /// whether a name exists (the renderer, deciding whether to annotate).
    #[must_use]
    pub fn lookup(&self, addr: u16) -> Option<&str> {
        self.get(addr).ok()
    }
}

/// BIOS vector name table, address-ascending. Entries through `FILVRM` are
/// anchored with high confidence (`FILVRM @ 0x0056` matches the worked
/// example every MSX reference cites); entries from `STRTMS` onward follow
/// the BIOS's well-known gap-free 3-byte-per-entry stride starting at
/// 0x0099 and should be cross-checked against an authoritative MSX
/// technical reference before being trusted byte-for-byte.
const BIOS_VECTORS: &[(u16, &str)] = &[
    (0x0000, "CHKRAM"),
    (0x0003, "SYNCHR"),
    (0x0006, "RDSLT"),
    (0x0009, "CHRGTR"),
    (0x000C, "WRSLT"),
    (0x000F, "OUTDO"),
    (0x0012, "CALSLT"),
    (0x0015, "DCOMPR"),
    (0x0018, "ENASLT"),
    (0x001B, "GETYPR"),
    (0x0030, "CALLF"),
    (0x0047, "WRTVDP"),
    (0x004A, "RDVRM"),
    (0x004D, "WRTVRM"),
    (0x0050, "SETRD"),
    (0x0053, "SETWRT"),
    (0x0056, "FILVRM"),
    (0x0059, "LDIRMV"),
    (0x005C, "LDIRVM"),
    (0x005F, "CHGMOD"),
    (0x0062, "CHGCLR"),
    (0x0069, "CLRSPR"),
    (0x006C, "INITXT"),
    (0x006F, "INIT32"),
    (0x0072, "INIGRP"),
    (0x0075, "INIMLT"),
    (0x0078, "SETTXT"),
    (0x007B, "SETT32"),
    (0x007E, "SETGRP"),
    (0x0081, "SETMLT"),
    (0x0084, "CALPAT"),
    (0x0087, "CALATR"),
    (0x008A, "GSPSIZ"),
    (0x008D, "GRPPRT"),
    (0x0090, "GICINI"),
    (0x0093, "WRTPSG"),
    (0x0096, "RDPSG"),
    (0x0099, "STRTMS"),
    (0x009C, "CHSNS"),
    (0x009F, "CHGET"),
    (0x00A2, "CHPUT"),
    (0x00A5, "LPTOUT"),
    (0x00A8, "LPTSTT"),
    (0x00AB, "CNVCHR"),
    (0x00AE, "PINLIN"),
    (0x00B1, "INLIN"),
    (0x00B4, "QINLIN"),
    (0x00B7, "BREAKX"),
    (0x00BA, "ISCNTC"),
    (0x00BD, "CKCNTC"),
    (0x00C0, "BEEP"),
    (0x00C3, "CLS"),
    (0x00C6, "POSIT"),
    (0x00C9, "FNKSB"),
    (0x00CC, "ERAFNK"),
    (0x00CF, "DSPFNK"),
    (0x00D2, "TOTEXT"),
    (0x00D5, "GTSTCK"),
    (0x00D8, "GTTRIG"),
    (0x00DB, "GTPAD"),
    (0x00DE, "GTPDL"),
    (0x00E1, "TAPION"),
    (0x00E4, "TAPIN"),
    (0x00E7, "TAPIOF"),
    (0x00EA, "TAPOON"),
    (0x00ED, "TAPOUT"),
    (0x00F0, "TAPOOF"),
    (0x00F3, "STMOTR"),
    (0x00F6, "LFTQ"),
    (0x00F9, "PUTQ"),
    (0x00FC, "RIGHTC"),
    (0x00FF, "LEFTC"),
    (0x0102, "UPC"),
    (0x0105, "TUPC"),
    (0x0108, "DOWNC"),
    (0x010B, "TDOWNC"),
    (0x010E, "SCALXY"),
    (0x0111, "MAPXY"),
    (0x0114, "FETCHC"),
    (0x0117, "STOREC"),
    (0x011A, "SETATR"),
    (0x011D, "READC"),
    (0x0120, "SETC"),
    (0x0123, "NSETCX"),
    (0x0126, "GTASPC"),
    (0x0129, "PNTINI"),
    (0x012C, "SCANR"),
    (0x012F, "SCANL"),
    (0x0132, "CHGCAP"),
    (0x0135, "CHGSND"),
    (0x0138, "RSLREG"),
    (0x013B, "WSLREG"),
    (0x013E, "RDVDP"),
    (0x0141, "SNSMAT"),
    (0x0144, "PHYDIO"),
    (0x0147, "FORMAT"),
    (0x014A, "ISFLIO"),
    (0x014D, "OUTDLP"),
    (0x0156, "KILBUF"),
    (0x0159, "CALBAS"),
    (0x015C, "SUBROM"),
    (0x015F, "EXTROM"),
    (0x0162, "CHKSLZ"),
    (0x0165, "CHKNEW"),
    (0x0168, "EOL"),
    (0x016B, "BIGFIL"),
    (0x016E, "NSETRD"),
    (0x0171, "NSTWRT"),
    (0x0174, "NRDVRM"),
    (0x0177, "NWRVRM"),
    (0x017A, "CHGCPU"),
    (0x017D, "GETCPU"),
    (0x0180, "PCMPLY"),
    (0x0183, "PCMREC"),
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bios_defaults_resolve_filvrm() {
        let table = RoutineTable::with_bios_defaults();
        assert_eq!(table.lookup(0x0056), Some("FILVRM"));
    }

    #[test]
    fn unnamed_address_is_none() {
        let table = RoutineTable::with_bios_defaults();
        assert_eq!(table.lookup(0x4000), None);
        assert_eq!(table.get(0x4000), Err(UnknownRoutine(0x4000)));
    }

    #[test]
    fn add_routine_overrides_and_extends() {
        let mut table = RoutineTable::with_bios_defaults();
        table.add_routine(0x4010, "START");
        table.add_routine(0x0056, "CUSTOM_FILVRM");
        assert_eq!(table.lookup(0x4010), Some("START"));
        assert_eq!(table.lookup(0x0056), Some("CUSTOM_FILVRM"));
    }

    #[test]
    fn every_bios_vector_is_three_bytes_from_the_next_through_the_sequential_block() {
        let start = BIOS_VECTORS.iter().position(|&(addr, _)| addr == 0x0099).unwrap();
        for pair in BIOS_VECTORS[start..].windows(2) {
            assert_eq!(pair[1].0 - pair[0].0, 3);
        }
    }
}
