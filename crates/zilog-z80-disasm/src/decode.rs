//! The pure decoder: turns the byte(s) at a PC into one [`Instruction`].
//!
//! Structured the way the original z80.py's `fetch_opcode`/`execute_opcode`
//! split the work, but collapsed into one function per prefix shape since
//! there is no microcode step to interleave — decoding an opcode and
//! assembling its `Family` happen together.

use log::{debug, trace};
use z80_mem::AddressSpace;

use crate::error::DecodeError;
use crate::instruction::{AluOp, BitKind, Family, IndexReg, Instruction, JrCond, RotOp, Target8};

/// Walks memory forward from a base PC, one field at a time, and remembers
/// how many bytes it has consumed so far — that count becomes the decoded
/// instruction's `size`.
struct Fetcher<'a> {
    mem: &'a AddressSpace,
    base: u16,
    len: u16,
}

impl<'a> Fetcher<'a> {
    fn new(mem: &'a AddressSpace, base: u16) -> Self {
        Self { mem, base, len: 0 }
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        let value = self.mem.read_byte(self.base.wrapping_add(self.len))?;
        self.len += 1;
        Ok(value)
    }

    fn i8(&mut self) -> Result<i8, DecodeError> {
        let value = self.mem.read_byte_signed(self.base.wrapping_add(self.len))?;
        self.len += 1;
        Ok(value)
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        let value = self.mem.read_word(self.base.wrapping_add(self.len))?;
        self.len += 2;
        Ok(value)
    }

    /// Destination of a relative jump whose displacement byte was the last
    /// byte fetched: `base + size + e`, matching `jump_destination` in
    /// spec.md's worked example.
    fn relative_target(&self, e: i8) -> u16 {
        self.base
            .wrapping_add(self.len)
            .wrapping_add(e as i16 as u16)
    }
}

/// Decode the instruction at `address`. Never mutates `mem`; never looks at
/// register or flag state.
pub fn decode(address: u16, mem: &AddressSpace) -> Result<Instruction, DecodeError> {
    let mut f = Fetcher::new(mem, address);
    let op0 = f.u8()?;

    let (family, opcode_word) = match op0 {
        0xCB => {
            let op2 = f.u8()?;
            (decode_cb(op2, None), 0xCB00 | u32::from(op2))
        }
        0xED => {
            let op2 = f.u8()?;
            (decode_ed(op2, &mut f)?, 0xED00 | u32::from(op2))
        }
        0xDD => {
            let op2 = f.u8()?;
            let (family, word) = decode_indexed(IndexReg::Ix, op2, &mut f)?;
            (family, 0xDD00 | word)
        }
        0xFD => {
            let op2 = f.u8()?;
            let (family, word) = decode_indexed(IndexReg::Iy, op2, &mut f)?;
            (family, 0xFD00 | word)
        }
        _ => (decode_unprefixed(op0, &mut f)?, u32::from(op0)),
    };

    trace!("0x{address:04X}: opcode word 0x{opcode_word:X}, {} bytes", f.len);

    Ok(Instruction {
        pc: address,
        opcode_word,
        size: f.len as u8,
        family,
    })
}

fn decode_unprefixed(op: u8, f: &mut Fetcher) -> Result<Family, DecodeError> {
    let x = op >> 6;
    let y = (op >> 3) & 7;
    let z = op & 7;
    let p = y >> 1;
    let q = y & 1;

    Ok(match x {
        0 => match z {
            0 => match y {
                0 => Family::Nop,
                1 => Family::ExAfAf,
                2 => {
                    let e = f.i8()?;
                    Family::Djnz { e, jump_destination: f.relative_target(e) }
                }
                3 => {
                    let e = f.i8()?;
                    Family::Jr { e, jump_destination: f.relative_target(e) }
                }
                4..=7 => {
                    let e = f.i8()?;
                    let dest = f.relative_target(e);
                    let cc = jr_cond(y - 4);
                    Family::JrCond { cc, e, jump_destination: dest }
                }
                _ => unreachable!(),
            },
            1 => {
                if q == 0 {
                    let nn = f.u16()?;
                    Family::LdDdNn { dd: p, nn }
                } else {
                    Family::AddHlSs { ss: p }
                }
            }
            2 => match (q, p) {
                (0, 0) => Family::LdDerefBcA,
                (0, 1) => Family::LdDerefDeA,
                (0, 2) => {
                    let nn = f.u16()?;
                    Family::LdDerefNnHl { nn }
                }
                (0, 3) => {
                    let nn = f.u16()?;
                    Family::LdDerefNnA { nn }
                }
                (1, 0) => Family::LdADerefBc,
                (1, 1) => Family::LdADerefDe,
                (1, 2) => {
                    let nn = f.u16()?;
                    Family::LdHlDerefNn { nn }
                }
                (1, 3) => {
                    let nn = f.u16()?;
                    Family::LdADerefNn { nn }
                }
                _ => unreachable!(),
            },
            3 => {
                if q == 0 {
                    Family::IncSs { ss: p }
                } else {
                    Family::DecSs { ss: p }
                }
            }
            4 => Family::IncR { r: y },
            5 => Family::DecR { r: y },
            6 => {
                let n = f.u8()?;
                if y == 6 {
                    Family::LdDerefHlN { n }
                } else {
                    Family::LdRN { r: y, n }
                }
            }
            7 => match y {
                0 => Family::Rlca,
                1 => Family::Rrca,
                2 => Family::Rla,
                3 => Family::Rra,
                4 => Family::Daa,
                5 => Family::Cpl,
                6 => Family::Scf,
                7 => Family::Ccf,
                _ => unreachable!(),
            },
            _ => unreachable!(),
        },
        1 => {
            if z == 6 && y == 6 {
                Family::Halt
            } else if z == 6 {
                Family::LdRDerefHl { r: y }
            } else if y == 6 {
                Family::LdDerefHlR { r: z }
            } else {
                Family::LdRR { dst: y, src: z }
            }
        }
        2 => {
            let op = AluOp::decode(y);
            let target = if z == 6 { Target8::DerefHl } else { Target8::Reg(z) };
            Family::Alu8 { op, target }
        }
        3 => match z {
            0 => Family::RetCc { cc: y },
            1 => {
                if q == 0 {
                    Family::Pop { qq: p }
                } else {
                    match p {
                        0 => Family::Ret,
                        1 => Family::Exx,
                        2 => Family::JpDerefHl,
                        3 => Family::LdSpHl,
                        _ => unreachable!(),
                    }
                }
            }
            2 => {
                let nn = f.u16()?;
                Family::JpCc { cc: y, nn }
            }
            3 => match y {
                0 => {
                    let nn = f.u16()?;
                    Family::Jp { nn }
                }
                1 => return Err(DecodeError::UnknownOpcode(0xCB)),
                2 => {
                    let n = f.u8()?;
                    Family::OutDerefNA { n }
                }
                3 => {
                    let n = f.u8()?;
                    Family::InADerefN { n }
                }
                4 => Family::ExDerefSpHl,
                5 => Family::ExDeHl,
                6 => Family::Di,
                7 => Family::Ei,
                _ => unreachable!(),
            },
            4 => {
                let nn = f.u16()?;
                Family::CallCc { cc: y, nn }
            }
            5 => {
                if q == 0 {
                    Family::Push { qq: p }
                } else {
                    match p {
                        0 => {
                            let nn = f.u16()?;
                            Family::Call { nn }
                        }
                        1 | 2 | 3 => return Err(DecodeError::UnknownOpcode(u32::from(op))),
                        _ => unreachable!(),
                    }
                }
            }
            6 => {
                let op = AluOp::decode(y);
                let n = f.u8()?;
                Family::AluN { op, n }
            }
            7 => Family::Rst { t: y },
            _ => unreachable!(),
        },
        _ => unreachable!(),
    })
}

fn jr_cond(code: u8) -> JrCond {
    match code & 0b11 {
        0 => JrCond::Nz,
        1 => JrCond::Z,
        2 => JrCond::Nc,
        _ => JrCond::C,
    }
}

/// Decode a CB-table byte. `override_target`, when set, is `(IX+d)`/`(IY+d)`
/// from a DDCB/FDCB shape — the CB table never re-reads a register field in
/// that case (z is forced to 6 on real hardware, and every family below
/// ignores it in favor of the override).
fn decode_cb(op2: u8, override_target: Option<Target8>) -> Family {
    let x = op2 >> 6;
    let y = (op2 >> 3) & 7;
    let z = op2 & 7;
    let target = override_target.unwrap_or(if z == 6 { Target8::DerefHl } else { Target8::Reg(z) });

    match x {
        0 => Family::RotateShift { op: RotOp::decode(y), target },
        1 => Family::BitOp { kind: BitKind::Bit, b: y, target },
        2 => Family::BitOp { kind: BitKind::Res, b: y, target },
        _ => Family::BitOp { kind: BitKind::Set, b: y, target },
    }
}

fn decode_ed(op2: u8, f: &mut Fetcher) -> Result<Family, DecodeError> {
    let x = op2 >> 6;
    let y = (op2 >> 3) & 7;
    let z = op2 & 7;
    let p = y >> 1;
    let q = y & 1;

    let unknown = || DecodeError::UnknownOpcode(0xED00 | u32::from(op2));

    match x {
        1 => match z {
            0 => Ok(Family::InRDerefC { r: y }),
            1 => Ok(Family::OutDerefCR { r: y }),
            2 => {
                if q == 0 {
                    Ok(Family::SbcHlSs { ss: p })
                } else {
                    Ok(Family::AdcHlSs { ss: p })
                }
            }
            3 => {
                let nn = f.u16()?;
                if q == 0 {
                    Ok(Family::LdDerefNnDd { dd: p, nn })
                } else {
                    Ok(Family::LdDdDerefNn { dd: p, nn })
                }
            }
            4 => Ok(Family::Neg),
            5 => Ok(if y == 1 { Family::Reti } else { Family::Retn }),
            6 => Ok(Family::Im { mode: [0, 0, 1, 2, 0, 0, 1, 2][y as usize] }),
            7 => match y {
                0 => Ok(Family::LdIA),
                1 => Ok(Family::LdRA),
                2 => Ok(Family::LdAI),
                3 => Ok(Family::LdAR),
                4 => Ok(Family::Rrd),
                5 => Ok(Family::Rld),
                _ => Err(unknown()),
            },
            _ => Err(unknown()),
        },
        2 if y >= 4 && z <= 3 => Ok(match (y, z) {
            (4, 0) => Family::BlockLdi,
            (4, 1) => Family::BlockCpi,
            (4, 2) => Family::BlockIni,
            (4, 3) => Family::BlockOuti,
            (5, 0) => Family::BlockLdd,
            (5, 1) => Family::BlockCpd,
            (5, 2) => Family::BlockInd,
            (5, 3) => Family::BlockOutd,
            (6, 0) => Family::BlockLdir,
            (6, 1) => Family::BlockCpir,
            (6, 2) => Family::BlockInir,
            (6, 3) => Family::BlockOtir,
            (7, 0) => Family::BlockLddr,
            (7, 1) => Family::BlockCpdr,
            (7, 2) => Family::BlockIndr,
            (7, 3) => Family::BlockOtdr,
            _ => return Err(unknown()),
        }),
        _ => Err(unknown()),
    }
}

/// Decode the byte following a DD/FD prefix. Returns the family plus the
/// word (sans the DD/FD prefix itself) used for error/logging context.
fn decode_indexed(
    index: IndexReg,
    op2: u8,
    f: &mut Fetcher,
) -> Result<(Family, u32), DecodeError> {
    let family = match op2 {
        0x76 => Family::Halt,
        0x21 => {
            let nn = f.u16()?;
            Family::LdIndexNn { index, nn }
        }
        0x2A => {
            let nn = f.u16()?;
            Family::LdIndexDerefNn { index, nn }
        }
        0x22 => {
            let nn = f.u16()?;
            Family::LdDerefNnIndex { index, nn }
        }
        0x23 => Family::IncIndex { index },
        0x2B => Family::DecIndex { index },
        0x09 | 0x19 | 0x29 | 0x39 => {
            let pp = (op2 >> 4) & 0b11;
            Family::AddIndexPp { index, pp }
        }
        0x34 => {
            let d = f.i8()?;
            Family::IncDerefIndex { index, d }
        }
        0x35 => {
            let d = f.i8()?;
            Family::DecDerefIndex { index, d }
        }
        0x36 => {
            let d = f.i8()?;
            let n = f.u8()?;
            Family::LdDerefIndexN { index, d, n }
        }
        0x46 | 0x4E | 0x56 | 0x5E | 0x66 | 0x6E | 0x7E => {
            let r = (op2 >> 3) & 0b111;
            let d = f.i8()?;
            Family::LdRDerefIndex { r, index, d }
        }
        0x70..=0x75 | 0x77 => {
            let r = op2 & 0b111;
            let d = f.i8()?;
            Family::LdDerefIndexR { index, d, r }
        }
        0x86 | 0x8E | 0x96 | 0x9E | 0xA6 | 0xAE | 0xB6 | 0xBE => {
            let op = AluOp::decode((op2 >> 3) & 0b111);
            let d = f.i8()?;
            Family::Alu8 { op, target: Target8::DerefIndex(index, d) }
        }
        0xE1 => Family::PopIndex { index },
        0xE5 => Family::PushIndex { index },
        0xE3 => Family::ExDerefSpIndex(index),
        0xE9 => Family::JpDerefIndex { index },
        0xF9 => Family::LdSpIndex { index },
        0xCB => {
            let d = f.i8()?;
            let op3 = f.u8()?;
            let family = decode_cb(op3, Some(Target8::DerefIndex(index, d)));
            return Ok((family, 0xCB00 | u32::from(op3)));
        }
        _ => {
            debug!("0x{op2:02X} after a {} prefix carries no index semantics, decoding plain", index.name());
            decode_unprefixed(op2, f)?
        }
    };
    Ok((family, u32::from(op2)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use z80_mem::AddressSpace;

    fn mem_with(bytes: &[u8]) -> AddressSpace {
        let mut mem = AddressSpace::new();
        mem.load(0x4000, bytes);
        mem
    }

    #[test]
    fn decodes_ret() {
        let mem = mem_with(&[0xC9]);
        let instr = decode(0x4000, &mem).unwrap();
        assert_eq!(instr.family, Family::Ret);
        assert_eq!(instr.size, 1);
    }

    #[test]
    fn decodes_jr_nz_with_jump_destination() {
        // JR NZ, +5 from an instruction at 0x4000 (2 bytes) lands at 0x4007.
        let mem = mem_with(&[0x20, 0x05]);
        let instr = decode(0x4000, &mem).unwrap();
        match instr.family {
            Family::JrCond { cc: JrCond::Nz, e: 5, jump_destination } => {
                assert_eq!(jump_destination, 0x4007);
            }
            other => panic!("unexpected family: {other:?}"),
        }
        assert_eq!(instr.size, 2);
    }

    #[test]
    fn decodes_call_nn() {
        let mem = mem_with(&[0xCD, 0x00, 0x40]);
        let instr = decode(0x4000, &mem).unwrap();
        assert_eq!(instr.family, Family::Call { nn: 0x4000 });
        assert_eq!(instr.size, 3);
    }

    #[test]
    fn decodes_djnz_backwards() {
        // DJNZ -2 at 0x4010 re-targets itself (a one-instruction spin loop).
        let mem = mem_with_at(0x4010, &[0x10, 0xFE]);
        let instr = decode(0x4010, &mem).unwrap();
        assert_eq!(
            instr.family,
            Family::Djnz { e: -2, jump_destination: 0x4010 }
        );
    }

    fn mem_with_at(base: u16, bytes: &[u8]) -> AddressSpace {
        let mut mem = AddressSpace::new();
        mem.load(base, bytes);
        mem
    }

    #[test]
    fn decodes_ld_ix_plus_d_n() {
        // LD (IX+2), 0x55
        let mem = mem_with(&[0xDD, 0x36, 0x02, 0x55]);
        let instr = decode(0x4000, &mem).unwrap();
        assert_eq!(
            instr.family,
            Family::LdDerefIndexN { index: IndexReg::Ix, d: 2, n: 0x55 }
        );
        assert_eq!(instr.size, 4);
    }

    #[test]
    fn decodes_ddcb_bit_test_on_displaced_address() {
        // DD CB 03 46 => BIT 0, (IX+3) — the displacement sits between the
        // prefix pair and the trailing CB opcode byte, not after it.
        let mem = mem_with(&[0xDD, 0xCB, 0x03, 0x46]);
        let instr = decode(0x4000, &mem).unwrap();
        assert_eq!(
            instr.family,
            Family::BitOp {
                kind: BitKind::Bit,
                b: 0,
                target: Target8::DerefIndex(IndexReg::Ix, 3)
            }
        );
        assert_eq!(instr.size, 4);
    }

    #[test]
    fn decodes_ed_block_instruction() {
        let mem = mem_with(&[0xED, 0xB0]); // LDIR
        let instr = decode(0x4000, &mem).unwrap();
        assert_eq!(instr.family, Family::BlockLdir);
        assert_eq!(instr.size, 2);
    }

    #[test]
    fn unknown_ed_opcode_is_reported() {
        let mem = mem_with(&[0xED, 0x00]);
        let err = decode(0x4000, &mem).unwrap_err();
        assert_eq!(err, DecodeError::UnknownOpcode(0xED00));
    }

    #[test]
    fn dd_prefix_falls_through_to_unprefixed_on_unrelated_opcode() {
        // DD 00 behaves as a wasted prefix byte followed by NOP on real
        // hardware; falling through keeps the decoder total rather than
        // rejecting otherwise-ordinary ROM bytes that happen to follow a
        // stray DD.
        let mem = mem_with(&[0xDD, 0x00]);
        let instr = decode(0x4000, &mem).unwrap();
        assert_eq!(instr.family, Family::Nop);
        assert_eq!(instr.size, 2);
    }
}
