//! The assembler-compatible dialect: lowercase mnemonics, `0NNh`/`0NNNNh`
//! style immediates (a leading zero keeps a leading `A`-`F` digit from
//! reading as a label), operands comma-separated with no space, and a
//! trailing tab-separated `;pc` comment. Grounded on
//! `z80/z80dasm/instruction.py`'s `__str__` methods.

use msx_disasm_core::DisasmRecord;
use zilog_z80_disasm::{AluOp, Family, IndexReg, Instruction, Target8};

use crate::{cc_name, dd_name, pp_name, qq_name, r_name, rr_name, Renderer};

/// Assembler-compatible renderer: output meant to be fed back into a Z80
/// assembler, not read by a person.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsmRenderer;

impl Renderer for AsmRenderer {
    fn render(&self, record: &DisasmRecord, _routines: &msx_disasm_core::RoutineTable) -> String {
        let instr = &record.instruction;
        format!("\t{}\t;{:04x}", render_family(instr), instr.pc)
    }
}

fn hex8(v: u8) -> String {
    format!("0{v:02x}h")
}

fn hex16(v: u16) -> String {
    format!("0{v:04x}h")
}

fn lower(s: &str) -> String {
    s.to_lowercase()
}

/// Relative branches render as an offset from the instruction after the
/// branch, not an absolute address: `e + 2` accounts for the two bytes the
/// branch opcode itself occupies.
fn relative(e: i8) -> String {
    format!("${:+}", i16::from(e) + 2)
}

fn target(t: Target8) -> String {
    match t {
        Target8::Reg(r) => lower(r_name(r)),
        Target8::DerefHl => "(hl)".to_string(),
        Target8::DerefIndex(index, d) => format!("({}{:+})", lower(index.name()), d),
    }
}

fn render_family(instr: &Instruction) -> String {
    match instr.family {
        Family::Nop => "nop".to_string(),
        Family::Halt => "halt".to_string(),
        Family::Di => "di".to_string(),
        Family::Ei => "ei".to_string(),
        Family::Daa => "daa".to_string(),
        Family::Cpl => "cpl".to_string(),
        Family::Scf => "scf".to_string(),
        Family::Ccf => "ccf".to_string(),
        Family::Rlca => "rlca".to_string(),
        Family::Rrca => "rrca".to_string(),
        Family::Rla => "rla".to_string(),
        Family::Rra => "rra".to_string(),
        Family::ExAfAf => "ex af,af'".to_string(),
        Family::ExDeHl => "ex de,hl".to_string(),
        Family::Exx => "exx".to_string(),
        Family::ExDerefSpHl => "ex (sp),hl".to_string(),
        Family::ExDerefSpIndex(ix) => format!("ex (sp),{}", lower(ix.name())),

        Family::LdRR { dst, src } => format!("ld {},{}", lower(r_name(dst)), lower(r_name(src))),
        Family::LdRN { r, n } => format!("ld {},{}", lower(r_name(r)), hex8(n)),
        Family::LdRDerefHl { r } => format!("ld {},(hl)", lower(r_name(r))),
        Family::LdDerefHlR { r } => format!("ld (hl),{}", lower(r_name(r))),
        Family::LdDerefHlN { n } => format!("ld (hl),{}", hex8(n)),
        Family::LdRDerefIndex { r, index, d } => {
            format!("ld {},({}{:+})", lower(r_name(r)), lower(index.name()), d)
        }
        Family::LdDerefIndexR { index, d, r } => {
            format!("ld ({}{:+}),{}", lower(index.name()), d, lower(r_name(r)))
        }
        Family::LdDerefIndexN { index, d, n } => {
            format!("ld ({}{:+}),{}", lower(index.name()), d, hex8(n))
        }
        Family::LdADerefBc => "ld a,(bc)".to_string(),
        Family::LdADerefDe => "ld a,(de)".to_string(),
        Family::LdDerefBcA => "ld (bc),a".to_string(),
        Family::LdDerefDeA => "ld (de),a".to_string(),
        Family::LdADerefNn { nn } => format!("ld a,({})", hex16(nn)),
        Family::LdDerefNnA { nn } => format!("ld ({}),a", hex16(nn)),
        Family::LdAI => "ld a,i".to_string(),
        Family::LdAR => "ld a,r".to_string(),
        Family::LdIA => "ld i,a".to_string(),
        Family::LdRA => "ld r,a".to_string(),

        Family::LdDdNn { dd, nn } => format!("ld {},{}", lower(dd_name(dd)), hex16(nn)),
        Family::LdIndexNn { index, nn } => format!("ld {},{}", lower(index.name()), hex16(nn)),
        Family::LdDdDerefNn { dd, nn } => format!("ld {},({})", lower(dd_name(dd)), hex16(nn)),
        Family::LdIndexDerefNn { index, nn } => {
            format!("ld {},({})", lower(index.name()), hex16(nn))
        }
        Family::LdDerefNnDd { dd, nn } => format!("ld ({}),{}", hex16(nn), lower(dd_name(dd))),
        Family::LdDerefNnIndex { index, nn } => {
            format!("ld ({}),{}", hex16(nn), lower(index.name()))
        }
        Family::LdHlDerefNn { nn } => format!("ld hl,({})", hex16(nn)),
        Family::LdDerefNnHl { nn } => format!("ld ({}),hl", hex16(nn)),
        Family::LdSpHl => "ld sp,hl".to_string(),
        Family::LdSpIndex { index } => format!("ld sp,{}", lower(index.name())),

        Family::Push { qq } => format!("push {}", lower(qq_name(qq))),
        Family::Pop { qq } => format!("pop {}", lower(qq_name(qq))),
        Family::PushIndex { index } => format!("push {}", lower(index.name())),
        Family::PopIndex { index } => format!("pop {}", lower(index.name())),

        Family::Alu8 { op, target: t } => alu_asm(op, target(t)),
        Family::AluN { op, n } => alu_asm(op, hex8(n)),

        Family::IncR { r } => format!("inc {}", lower(r_name(r))),
        Family::DecR { r } => format!("dec {}", lower(r_name(r))),
        Family::IncDerefHl => "inc (hl)".to_string(),
        Family::DecDerefHl => "dec (hl)".to_string(),
        Family::IncDerefIndex { index, d } => format!("inc ({}{:+})", lower(index.name()), d),
        Family::DecDerefIndex { index, d } => format!("dec ({}{:+})", lower(index.name()), d),
        Family::IncSs { ss } => format!("inc {}", lower(dd_name(ss))),
        Family::DecSs { ss } => format!("dec {}", lower(dd_name(ss))),
        Family::IncIndex { index } => format!("inc {}", lower(index.name())),
        Family::DecIndex { index } => format!("dec {}", lower(index.name())),
        Family::AddHlSs { ss } => format!("add hl,{}", lower(dd_name(ss))),
        Family::AddIndexPp { index, pp } => {
            format!("add {},{}", lower(index.name()), lower(pp_or_rr(index, pp)))
        }
        Family::AdcHlSs { ss } => format!("adc hl,{}", lower(dd_name(ss))),
        Family::SbcHlSs { ss } => format!("sbc hl,{}", lower(dd_name(ss))),

        Family::RotateShift { op, target: t } => format!("{} {}", lower(op.mnemonic()), target(t)),
        Family::BitOp { kind, b, target: t } => {
            format!("{} {},{}", lower(kind.mnemonic()), b, target(t))
        }

        Family::Jp { nn } => format!("jp {}", hex16(nn)),
        Family::JpCc { cc, nn } => format!("jp {},{}", lower(cc_name(cc)), hex16(nn)),
        Family::JpDerefHl => "jp (hl)".to_string(),
        Family::JpDerefIndex { index } => format!("jp ({})", lower(index.name())),
        Family::Jr { e, .. } => format!("jr {}", relative(e)),
        Family::JrCond { cc, e, .. } => format!("jr {},{}", lower(cc.name()), relative(e)),
        Family::Djnz { e, .. } => format!("djnz {}", relative(e)),
        Family::Call { nn } => format!("call {}", hex16(nn)),
        Family::CallCc { cc, nn } => format!("call {},{}", lower(cc_name(cc)), hex16(nn)),
        Family::Ret => "ret".to_string(),
        Family::RetCc { cc } => format!("ret {}", lower(cc_name(cc))),
        Family::Reti => "reti".to_string(),
        Family::Retn => "retn".to_string(),
        Family::Rst { t } => format!("rst {}", hex8(t * 8)),

        Family::InADerefN { n } => format!("in a,({})", hex8(n)),
        Family::InRDerefC { r } => format!("in {},(c)", lower(r_name(r))),
        Family::OutDerefCR { r } => format!("out (c),{}", lower(r_name(r))),
        Family::OutDerefNA { n } => format!("out ({}),a", hex8(n)),

        Family::BlockLdi => "ldi".to_string(),
        Family::BlockLdir => "ldir".to_string(),
        Family::BlockLdd => "ldd".to_string(),
        Family::BlockLddr => "lddr".to_string(),
        Family::BlockCpi => "cpi".to_string(),
        Family::BlockCpir => "cpir".to_string(),
        Family::BlockCpd => "cpd".to_string(),
        Family::BlockCpdr => "cpdr".to_string(),
        Family::BlockIni => "ini".to_string(),
        Family::BlockInir => "inir".to_string(),
        Family::BlockInd => "ind".to_string(),
        Family::BlockIndr => "indr".to_string(),
        Family::BlockOuti => "outi".to_string(),
        Family::BlockOtir => "otir".to_string(),
        Family::BlockOutd => "outd".to_string(),
        Family::BlockOtdr => "otdr".to_string(),

        Family::Neg => "neg".to_string(),
        Family::Im { mode } => format!("im {mode}"),
        Family::Rrd => "rrd".to_string(),
        Family::Rld => "rld".to_string(),
    }
}

/// `ADD`/`ADC`/`SBC` always carry an explicit `a,` operand; the rest act on
/// the accumulator implicitly, so only a space separates mnemonic and operand.
fn alu_asm(op: AluOp, operand: String) -> String {
    match op {
        AluOp::Add => format!("add a,{operand}"),
        AluOp::Adc => format!("adc a,{operand}"),
        AluOp::Sbc => format!("sbc a,{operand}"),
        AluOp::Sub => format!("sub {operand}"),
        AluOp::And => format!("and {operand}"),
        AluOp::Xor => format!("xor {operand}"),
        AluOp::Or => format!("or {operand}"),
        AluOp::Cp => format!("cp {operand}"),
    }
}

fn pp_or_rr(index: IndexReg, code: u8) -> &'static str {
    match index {
        IndexReg::Ix => pp_name(code),
        IndexReg::Iy => rr_name(code),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use msx_disasm_core::RoutineTable;
    use z80_mem::AddressSpace;
    use zilog_z80_disasm::decode;

    #[test]
    fn renders_call_lowercase_with_h_suffix() {
        let mut mem = AddressSpace::new();
        mem.load(0x4000, &[0xCD, 0x56, 0x00]);
        let instr = decode(0x4000, &mem).unwrap();
        let record = DisasmRecord::new(instr);
        let line = AsmRenderer.render(&record, &RoutineTable::new());
        assert_eq!(line, "\tcall 00056h\t;4000");
    }

    #[test]
    fn renders_relative_jump_as_offset_from_next_instruction() {
        let mut mem = AddressSpace::new();
        mem.load(0x4000, &[0x18, 0x00]); // JR +0
        let instr = decode(0x4000, &mem).unwrap();
        let record = DisasmRecord::new(instr);
        let line = AsmRenderer.render(&record, &RoutineTable::new());
        assert_eq!(line, "\tjr $+2\t;4000");
    }

    #[test]
    fn renders_alu_with_a_operand_trimmed() {
        let mut mem = AddressSpace::new();
        mem.load(0x4000, &[0x87]); // ADD A,A
        let instr = decode(0x4000, &mem).unwrap();
        let record = DisasmRecord::new(instr);
        let line = AsmRenderer.render(&record, &RoutineTable::new());
        assert_eq!(line, "\tadd a,a\t;4000");
    }
}
