//! The instruction catalog: one sum type, `Family`, covering every Z80
//! instruction family, plus the immutable `Instruction` value the decoder
//! produces.

/// Selects IX or IY for a DD-/FD-prefixed family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexReg {
    Ix,
    Iy,
}

impl IndexReg {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            IndexReg::Ix => "IX",
            IndexReg::Iy => "IY",
        }
    }
}

/// An 8-bit ALU operation family (`ADD A, x` / `ADC A, x` / ... / `CP x`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADD A,",
            AluOp::Adc => "ADC A,",
            AluOp::Sub => "SUB",
            AluOp::Sbc => "SBC A,",
            AluOp::And => "AND",
            AluOp::Xor => "XOR",
            AluOp::Or => "OR",
            AluOp::Cp => "CP",
        }
    }

    const fn from_code(code: u8) -> Self {
        match code & 0b111 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbc,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }
}

/// A CB-prefixed rotate/shift family. `Sll` is the undocumented "shift left,
/// set bit 0" — decoded so exploration never halts on it, never relied on
/// for flag accuracy (a Non-goal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Sll,
    Srl,
}

impl RotOp {
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            RotOp::Rlc => "RLC",
            RotOp::Rrc => "RRC",
            RotOp::Rl => "RL",
            RotOp::Rr => "RR",
            RotOp::Sla => "SLA",
            RotOp::Sra => "SRA",
            RotOp::Sll => "SLL",
            RotOp::Srl => "SRL",
        }
    }

    const fn from_code(code: u8) -> Self {
        match code & 0b111 {
            0 => RotOp::Rlc,
            1 => RotOp::Rrc,
            2 => RotOp::Rl,
            3 => RotOp::Rr,
            4 => RotOp::Sla,
            5 => RotOp::Sra,
            6 => RotOp::Sll,
            _ => RotOp::Srl,
        }
    }
}

/// `BIT`/`RES`/`SET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitKind {
    Bit,
    Res,
    Set,
}

impl BitKind {
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            BitKind::Bit => "BIT",
            BitKind::Res => "RES",
            BitKind::Set => "SET",
        }
    }
}

/// An 8-bit operand location: a plain register, `(HL)`, or `(IX+d)`/`(IY+d)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target8 {
    Reg(u8),
    DerefHl,
    DerefIndex(IndexReg, i8),
}

/// Every Z80 instruction family this disassembler can produce.
///
/// Operand fields carry raw numeric values (register codes, immediates,
/// addresses) rather than pre-rendered text — the renderer is a pure
/// function over this data, per spec.md §4.G.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Nop,
    Halt,
    Di,
    Ei,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Rlca,
    Rrca,
    Rla,
    Rra,
    ExAfAf,
    ExDeHl,
    Exx,
    ExDerefSpHl,
    ExDerefSpIndex(IndexReg),

    LdRR { dst: u8, src: u8 },
    LdRN { r: u8, n: u8 },
    LdRDerefHl { r: u8 },
    LdDerefHlR { r: u8 },
    LdDerefHlN { n: u8 },
    LdRDerefIndex { r: u8, index: IndexReg, d: i8 },
    LdDerefIndexR { index: IndexReg, d: i8, r: u8 },
    LdDerefIndexN { index: IndexReg, d: i8, n: u8 },
    LdADerefBc,
    LdADerefDe,
    LdDerefBcA,
    LdDerefDeA,
    LdADerefNn { nn: u16 },
    LdDerefNnA { nn: u16 },
    LdAI,
    LdAR,
    LdIA,
    LdRA,

    LdDdNn { dd: u8, nn: u16 },
    LdIndexNn { index: IndexReg, nn: u16 },
    LdDdDerefNn { dd: u8, nn: u16 },
    LdIndexDerefNn { index: IndexReg, nn: u16 },
    LdDerefNnDd { dd: u8, nn: u16 },
    LdDerefNnIndex { index: IndexReg, nn: u16 },
    LdHlDerefNn { nn: u16 },
    LdDerefNnHl { nn: u16 },
    LdSpHl,
    LdSpIndex { index: IndexReg },

    Push { qq: u8 },
    Pop { qq: u8 },
    PushIndex { index: IndexReg },
    PopIndex { index: IndexReg },

    Alu8 { op: AluOp, target: Target8 },
    AluN { op: AluOp, n: u8 },

    IncR { r: u8 },
    DecR { r: u8 },
    IncDerefHl,
    DecDerefHl,
    IncDerefIndex { index: IndexReg, d: i8 },
    DecDerefIndex { index: IndexReg, d: i8 },
    IncSs { ss: u8 },
    DecSs { ss: u8 },
    IncIndex { index: IndexReg },
    DecIndex { index: IndexReg },
    AddHlSs { ss: u8 },
    AddIndexPp { index: IndexReg, pp: u8 },
    AdcHlSs { ss: u8 },
    SbcHlSs { ss: u8 },

    RotateShift { op: RotOp, target: Target8 },
    BitOp { kind: BitKind, b: u8, target: Target8 },

    Jp { nn: u16 },
    JpCc { cc: u8, nn: u16 },
    JpDerefHl,
    JpDerefIndex { index: IndexReg },
    Jr { e: i8, jump_destination: u16 },
    JrCond { cc: JrCond, e: i8, jump_destination: u16 },
    Djnz { e: i8, jump_destination: u16 },
    Call { nn: u16 },
    CallCc { cc: u8, nn: u16 },
    Ret,
    RetCc { cc: u8 },
    Reti,
    Retn,
    Rst { t: u8 },

    InADerefN { n: u8 },
    InRDerefC { r: u8 },
    OutDerefCR { r: u8 },
    OutDerefNA { n: u8 },

    BlockLdi,
    BlockLdir,
    BlockLdd,
    BlockLddr,
    BlockCpi,
    BlockCpir,
    BlockCpd,
    BlockCpdr,
    BlockIni,
    BlockInir,
    BlockInd,
    BlockIndr,
    BlockOuti,
    BlockOtir,
    BlockOutd,
    BlockOtdr,

    Neg,
    Im { mode: u8 },
    Rrd,
    Rld,
}

/// The four conditions a relative jump/`DJNZ` can carry — a strict subset
/// of the full 8-way `cc` table (only Z/NZ/C/NC are encodable as `JR cc, e`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JrCond {
    Nz,
    Z,
    Nc,
    C,
}

impl JrCond {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            JrCond::Nz => "NZ",
            JrCond::Z => "Z",
            JrCond::Nc => "NC",
            JrCond::C => "C",
        }
    }
}

impl AluOp {
    pub(crate) const fn decode(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl RotOp {
    pub(crate) const fn decode(code: u8) -> Self {
        Self::from_code(code)
    }
}

/// An immutable record of one decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// PC at decode time, captured before any PC mutation.
    pub pc: u16,
    /// The raw prefix-combined opcode word used to select the family.
    pub opcode_word: u32,
    /// Total encoded size in bytes (1-4).
    pub size: u8,
    /// The decoded family and its operands.
    pub family: Family,
}

impl Instruction {
    /// Whether this family carries a relative-branch `jump_destination`.
    #[must_use]
    pub const fn jump_destination(&self) -> Option<u16> {
        match self.family {
            Family::Jr { jump_destination, .. }
            | Family::JrCond { jump_destination, .. }
            | Family::Djnz { jump_destination, .. } => Some(jump_destination),
            _ => None,
        }
    }

    /// The address immediately after this instruction.
    #[must_use]
    pub const fn fall_through(&self) -> u16 {
        self.pc.wrapping_add(self.size as u16)
    }
}
