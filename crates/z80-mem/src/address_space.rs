//! Byte/word-addressable memory with write observation.

use crate::error::MemError;

/// Number of cells backing the address space.
///
/// The cartridge and its BIOS only ever address the low 64 KiB via a 16-bit
/// program counter, but the underlying cell array is sized at 128 KiB to
/// match the model the disassembler was specified against — a leftover of
/// the host's bank-switched memory map that this tool never needs to walk
/// past 0xFFFF to reach.
const CELLS: usize = 128 * 1024;

type WriteObserver = Box<dyn FnMut(u16, u8, u8)>;

/// A mutable array of cells, each holding a byte or the uninitialized
/// marker, with per-address write observers.
///
/// Reads never succeed against an uninitialized cell. This is what lets the
/// explorer tell ROM apart from unmapped memory instead of silently walking
/// into a field of zero bytes.
pub struct AddressSpace {
    cells: Vec<Option<u8>>,
    observers: std::collections::HashMap<u16, Vec<WriteObserver>>,
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSpace {
    /// Create an address space with every cell uninitialized.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: vec![None; CELLS],
            observers: std::collections::HashMap::new(),
        }
    }

    /// Load a contiguous block of bytes, starting at `offset`.
    pub fn load(&mut self, offset: u16, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            let addr = offset.wrapping_add(i as u16);
            self.cells[addr as usize] = Some(b);
        }
    }

    /// Read an unsigned byte.
    pub fn read_byte(&self, addr: u16) -> Result<u8, MemError> {
        self.cells[addr as usize].ok_or(MemError::UninitializedRead(addr))
    }

    /// Read a byte and interpret it as signed two's complement.
    pub fn read_byte_signed(&self, addr: u16) -> Result<i8, MemError> {
        self.read_byte(addr).map(|b| b as i8)
    }

    /// Read a little-endian word. Fails if either half is uninitialized.
    pub fn read_word(&self, addr: u16) -> Result<u16, MemError> {
        let lo = self.read_byte(addr)?;
        let hi = self.read_byte(addr.wrapping_add(1))?;
        Ok(u16::from(lo) | (u16::from(hi) << 8))
    }

    /// Write a byte, invoking any observers registered on this address.
    pub fn write_byte(&mut self, addr: u16, value: u8) {
        let old = self.cells[addr as usize];
        self.cells[addr as usize] = Some(value);
        if let Some(observers) = self.observers.get_mut(&addr) {
            for observer in observers {
                observer(addr, value, old.unwrap_or(0));
            }
        }
    }

    /// Write a little-endian word. The low byte is written first, then the
    /// high byte — matching the order a real `LD (nn), HL` performs it in,
    /// which is why an observer on the high byte alone is sufficient to
    /// catch a completed word write (see the VDP hook in `msx-disasm-core`).
    pub fn write_word(&mut self, addr: u16, value: u16) {
        self.write_byte(addr, value as u8);
        self.write_byte(addr.wrapping_add(1), (value >> 8) as u8);
    }

    /// Register a callback invoked as `(addr, new, old)` after every write
    /// to `addr`. Multiple observers per address run in registration order.
    pub fn install_observer<F>(&mut self, addr: u16, callback: F)
    where
        F: FnMut(u16, u8, u8) + 'static,
    {
        self.observers.entry(addr).or_default().push(Box::new(callback));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_read_fails() {
        let mem = AddressSpace::new();
        assert_eq!(mem.read_byte(0x4000), Err(MemError::UninitializedRead(0x4000)));
    }

    #[test]
    fn load_then_read() {
        let mut mem = AddressSpace::new();
        mem.load(0x4000, &[0x41, 0x42, 0xC9]);
        assert_eq!(mem.read_byte(0x4000), Ok(0x41));
        assert_eq!(mem.read_word(0x4000), Ok(0x4241));
    }

    #[test]
    fn signed_byte_reads_two_complement() {
        let mut mem = AddressSpace::new();
        mem.load(0x0000, &[0xFE]); // -2
        assert_eq!(mem.read_byte_signed(0x0000), Ok(-2));
    }

    #[test]
    fn observer_sees_new_and_old_value() {
        let mut mem = AddressSpace::new();
        mem.load(0x4000, &[0x00]);
        let seen = std::rc::Rc::new(std::cell::RefCell::new(None));
        let seen2 = seen.clone();
        mem.install_observer(0x4000, move |addr, new, old| {
            *seen2.borrow_mut() = Some((addr, new, old));
        });
        mem.write_byte(0x4000, 0xC3);
        assert_eq!(*seen.borrow(), Some((0x4000, 0xC3, 0x00)));
    }

    #[test]
    fn word_write_observer_fires_on_high_byte_only() {
        let mut mem = AddressSpace::new();
        let fired = std::rc::Rc::new(std::cell::RefCell::new(0));
        let fired2 = fired.clone();
        mem.install_observer(0xFD9C, move |_, _, _| {
            *fired2.borrow_mut() += 1;
        });
        mem.write_word(0xFD9B, 0x4500);
        assert_eq!(*fired.borrow(), 1);
        assert_eq!(mem.read_word(0xFD9B), Ok(0x4500));
    }
}
