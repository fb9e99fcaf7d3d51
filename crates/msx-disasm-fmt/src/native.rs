//! The native dialect: uppercase mnemonics, `0x%04X`-style numbers, and
//! inline comments naming BIOS call targets and VDP hook installations.
//! Grounded on `decompiler.py`'s per-instruction `__str__` methods.

use msx_disasm_core::{DisasmRecord, RoutineTable};
use zilog_z80_disasm::{AluOp, BitKind, Family, IndexReg, Instruction, RotOp, Target8};

use crate::{cc_name, dd_name, pp_name, qq_name, r_name, rr_name, Renderer};

const HKEYI_OPCODE_ADDR: u16 = 0xFD9A;
const HKEYI_TARGET_ADDR: u16 = 0xFD9B;

/// Human-oriented renderer: the dialect you'd actually want to read while
/// reverse-engineering a cartridge.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeRenderer;

impl Renderer for NativeRenderer {
    fn render(&self, record: &DisasmRecord, routines: &RoutineTable) -> String {
        let instr = &record.instruction;
        let body = render_family(instr);
        let line = match annotation(instr, routines) {
            Some(note) => format!("{body} ; {note}"),
            None => body,
        };
        format!("{:04X} {line}", instr.pc)
    }
}

fn hex8(v: u8) -> String {
    format!("0x{v:02X}")
}

fn hex16(v: u16) -> String {
    format!("0x{v:04X}")
}

fn target(t: Target8) -> String {
    match t {
        Target8::Reg(r) => r_name(r).to_string(),
        Target8::DerefHl => "(HL)".to_string(),
        Target8::DerefIndex(index, d) => format!("({}{:+})", index.name(), d),
    }
}

fn alu_name(op: AluOp, operand: String) -> String {
    format!("{} {operand}", op.mnemonic())
}

fn rot_name(op: RotOp, operand: String) -> String {
    format!("{} {operand}", op.mnemonic())
}

fn render_family(instr: &Instruction) -> String {
    match instr.family {
        Family::Nop => "NOP".to_string(),
        Family::Halt => "HALT".to_string(),
        Family::Di => "DI".to_string(),
        Family::Ei => "EI".to_string(),
        Family::Daa => "DAA".to_string(),
        Family::Cpl => "CPL".to_string(),
        Family::Scf => "SCF".to_string(),
        Family::Ccf => "CCF".to_string(),
        Family::Rlca => "RLCA".to_string(),
        Family::Rrca => "RRCA".to_string(),
        Family::Rla => "RLA".to_string(),
        Family::Rra => "RRA".to_string(),
        Family::ExAfAf => "EX AF, AF'".to_string(),
        Family::ExDeHl => "EX DE, HL".to_string(),
        Family::Exx => "EXX".to_string(),
        Family::ExDerefSpHl => "EX (SP), HL".to_string(),
        Family::ExDerefSpIndex(ix) => format!("EX (SP), {}", ix.name()),

        Family::LdRR { dst, src } => format!("LD {}, {}", r_name(dst), r_name(src)),
        Family::LdRN { r, n } => format!("LD {}, {}", r_name(r), hex8(n)),
        Family::LdRDerefHl { r } => format!("LD {}, (HL)", r_name(r)),
        Family::LdDerefHlR { r } => format!("LD (HL), {}", r_name(r)),
        Family::LdDerefHlN { n } => format!("LD (HL), {}", hex8(n)),
        Family::LdRDerefIndex { r, index, d } => {
            format!("LD {}, ({}{:+})", r_name(r), index.name(), d)
        }
        Family::LdDerefIndexR { index, d, r } => {
            format!("LD ({}{:+}), {}", index.name(), d, r_name(r))
        }
        Family::LdDerefIndexN { index, d, n } => {
            format!("LD ({}{:+}), {}", index.name(), d, hex8(n))
        }
        Family::LdADerefBc => "LD A, (BC)".to_string(),
        Family::LdADerefDe => "LD A, (DE)".to_string(),
        Family::LdDerefBcA => "LD (BC), A".to_string(),
        Family::LdDerefDeA => "LD (DE), A".to_string(),
        Family::LdADerefNn { nn } => format!("LD A, ({})", hex16(nn)),
        Family::LdDerefNnA { nn } => format!("LD ({}), A", hex16(nn)),
        Family::LdAI => "LD A, I".to_string(),
        Family::LdAR => "LD A, R".to_string(),
        Family::LdIA => "LD I, A".to_string(),
        Family::LdRA => "LD R, A".to_string(),

        Family::LdDdNn { dd, nn } => format!("LD {}, {}", dd_name(dd), hex16(nn)),
        Family::LdIndexNn { index, nn } => format!("LD {}, {}", index.name(), hex16(nn)),
        Family::LdDdDerefNn { dd, nn } => format!("LD {}, ({})", dd_name(dd), hex16(nn)),
        Family::LdIndexDerefNn { index, nn } => {
            format!("LD {}, ({})", index.name(), hex16(nn))
        }
        Family::LdDerefNnDd { dd, nn } => format!("LD ({}), {}", hex16(nn), dd_name(dd)),
        Family::LdDerefNnIndex { index, nn } => {
            format!("LD ({}), {}", hex16(nn), index.name())
        }
        Family::LdHlDerefNn { nn } => format!("LD HL, ({})", hex16(nn)),
        Family::LdDerefNnHl { nn } => format!("LD ({}), HL", hex16(nn)),
        Family::LdSpHl => "LD SP, HL".to_string(),
        Family::LdSpIndex { index } => format!("LD SP, {}", index.name()),

        Family::Push { qq } => format!("PUSH {}", qq_name(qq)),
        Family::Pop { qq } => format!("POP {}", qq_name(qq)),
        Family::PushIndex { index } => format!("PUSH {}", index.name()),
        Family::PopIndex { index } => format!("POP {}", index.name()),

        Family::Alu8 { op, target: t } => alu_name(op, target(t)),
        Family::AluN { op, n } => alu_name(op, hex8(n)),

        Family::IncR { r } => format!("INC {}", r_name(r)),
        Family::DecR { r } => format!("DEC {}", r_name(r)),
        Family::IncDerefHl => "INC (HL)".to_string(),
        Family::DecDerefHl => "DEC (HL)".to_string(),
        Family::IncDerefIndex { index, d } => format!("INC ({}{:+})", index.name(), d),
        Family::DecDerefIndex { index, d } => format!("DEC ({}{:+})", index.name(), d),
        Family::IncSs { ss } => format!("INC {}", dd_name(ss)),
        Family::DecSs { ss } => format!("DEC {}", dd_name(ss)),
        Family::IncIndex { index } => format!("INC {}", index.name()),
        Family::DecIndex { index } => format!("DEC {}", index.name()),
        Family::AddHlSs { ss } => format!("ADD HL, {}", dd_name(ss)),
        Family::AddIndexPp { index, pp } => format!("ADD {}, {}", index.name(), pp_or_rr(index, pp)),
        Family::AdcHlSs { ss } => format!("ADC HL, {}", dd_name(ss)),
        Family::SbcHlSs { ss } => format!("SBC HL, {}", dd_name(ss)),

        Family::RotateShift { op, target: t } => rot_name(op, target(t)),
        Family::BitOp { kind, b, target: t } => format!("{} {}, {}", kind.mnemonic(), b, target(t)),

        Family::Jp { nn } => format!("JP {}", hex16(nn)),
        Family::JpCc { cc, nn } => format!("JP {}, {}", cc_name(cc), hex16(nn)),
        Family::JpDerefHl => "JP (HL)".to_string(),
        Family::JpDerefIndex { index } => format!("JP ({})", index.name()),
        Family::Jr { jump_destination, .. } => format!("JR {}", hex16(jump_destination)),
        Family::JrCond { cc, jump_destination, .. } => {
            format!("JR {}, {}", cc.name(), hex16(jump_destination))
        }
        Family::Djnz { jump_destination, .. } => format!("DJNZ {}", hex16(jump_destination)),
        Family::Call { nn } => format!("CALL {}", hex16(nn)),
        Family::CallCc { cc, nn } => format!("CALL {}, {}", cc_name(cc), hex16(nn)),
        Family::Ret => "RET".to_string(),
        Family::RetCc { cc } => format!("RET {}", cc_name(cc)),
        Family::Reti => "RETI".to_string(),
        Family::Retn => "RETN".to_string(),
        Family::Rst { t } => format!("RST {}", hex8(t * 8)),

        Family::InADerefN { n } => format!("IN A, ({})", hex8(n)),
        Family::InRDerefC { r } => format!("IN {}, (C)", r_name(r)),
        Family::OutDerefCR { r } => format!("OUT (C), {}", r_name(r)),
        Family::OutDerefNA { n } => format!("OUT ({}), A", hex8(n)),

        Family::BlockLdi => "LDI".to_string(),
        Family::BlockLdir => "LDIR".to_string(),
        Family::BlockLdd => "LDD".to_string(),
        Family::BlockLddr => "LDDR".to_string(),
        Family::BlockCpi => "CPI".to_string(),
        Family::BlockCpir => "CPIR".to_string(),
        Family::BlockCpd => "CPD".to_string(),
        Family::BlockCpdr => "CPDR".to_string(),
        Family::BlockIni => "INI".to_string(),
        Family::BlockInir => "INIR".to_string(),
        Family::BlockInd => "IND".to_string(),
        Family::BlockIndr => "INDR".to_string(),
        Family::BlockOuti => "OUTI".to_string(),
        Family::BlockOtir => "OTIR".to_string(),
        Family::BlockOutd => "OUTD".to_string(),
        Family::BlockOtdr => "OTDR".to_string(),

        Family::Neg => "NEG".to_string(),
        Family::Im { mode } => format!("IM {mode}"),
        Family::Rrd => "RRD".to_string(),
        Family::Rld => "RLD".to_string(),
    }
}

fn pp_or_rr(index: IndexReg, code: u8) -> &'static str {
    match index {
        IndexReg::Ix => pp_name(code),
        IndexReg::Iy => rr_name(code),
    }
}

fn annotation(instr: &Instruction, routines: &RoutineTable) -> Option<String> {
    match instr.family {
        Family::Call { nn } | Family::CallCc { nn, .. } => routines
            .lookup(nn)
            .map(|name| format!("bios.{name}(...)")),
        Family::LdDerefNnA { nn } if nn == HKEYI_OPCODE_ADDR => {
            Some("H.KEYI[0] = A, 0xC3 means 'JP'".to_string())
        }
        Family::LdDerefNnHl { nn } if nn == HKEYI_TARGET_ADDR => {
            Some("H.KEYI[1..2] = HL".to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use msx_disasm_core::DisasmRecord;
    use zilog_z80_disasm::decode;
    use z80_mem::AddressSpace;

    #[test]
    fn renders_bios_call_with_routine_comment() {
        let mut mem = AddressSpace::new();
        mem.load(0x4000, &[0xCD, 0x56, 0x00]); // CALL 0x0056 (FILVRM)
        let instr = decode(0x4000, &mem).unwrap();
        let record = DisasmRecord::new(instr);
        let routines = RoutineTable::with_bios_defaults();
        let line = NativeRenderer.render(&record, &routines);
        assert_eq!(line, "4000 CALL 0x0056 ; bios.FILVRM(...)");
    }

    #[test]
    fn renders_plain_ret_with_no_annotation() {
        let mut mem = AddressSpace::new();
        mem.load(0x4000, &[0xC9]);
        let instr = decode(0x4000, &mem).unwrap();
        let record = DisasmRecord::new(instr);
        let routines = RoutineTable::new();
        assert_eq!(NativeRenderer.render(&record, &routines), "4000 RET");
    }
}
