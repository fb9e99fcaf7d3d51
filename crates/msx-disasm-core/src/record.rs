//! A single explored instruction plus the edges that led to it.

use zilog_z80_disasm::{Family, Instruction};

/// Why the explorer enqueued a particular PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchClass {
    /// Execution simply continues past the previous instruction.
    FallThrough,
    /// `JP nn` / `JP cc, nn`.
    Jp,
    /// `JR e` / `JR cc, e`.
    Jr,
    /// `CALL nn` / `CALL cc, nn`.
    Call,
    /// `DJNZ e`.
    Djnz,
    /// `RET` / `RET cc` — never produces an outgoing edge; recorded so
    /// callers can tell a routine's exit points from its dead ends.
    Ret,
    /// A write-observer-triggered hook installation (the VDP interrupt
    /// vector at 0xFD9A-0xFD9C).
    Hook,
    /// An entry discovered by the jump-table heuristic.
    JumpTable,
}

/// One decoded instruction together with the addresses that reached it.
#[derive(Debug, Clone)]
pub struct DisasmRecord {
    pub instruction: Instruction,
    /// `(predecessor_pc, how_we_got_here)`, one entry per distinct arrival.
    pub predecessors: Vec<(u16, BranchClass)>,
}

impl DisasmRecord {
    #[must_use]
    pub fn new(instruction: Instruction) -> Self {
        Self { instruction, predecessors: Vec::new() }
    }
}

/// Render the text a listing prints for one predecessor edge: `"fall
/// through"`, `"CALL nn"`, `"JR NZ, e"`, and so on. `predecessor_family` is
/// the decoded instruction at the edge's source PC, when that PC was
/// reached (a hook or jump-table root has no meaningful source family).
#[must_use]
pub fn edge_label(class: BranchClass, predecessor_family: Option<&Family>) -> String {
    match class {
        BranchClass::FallThrough => "fall through".to_string(),
        BranchClass::Hook => "VDP hook".to_string(),
        BranchClass::JumpTable => "jump table".to_string(),
        BranchClass::Ret => "RET".to_string(),
        BranchClass::Call => match predecessor_family {
            Some(Family::CallCc { cc, .. }) => format!("CALL {}, nn", cc_label(*cc)),
            _ => "CALL nn".to_string(),
        },
        BranchClass::Jp => match predecessor_family {
            Some(Family::JpCc { cc, .. }) => format!("JP {}, nn", cc_label(*cc)),
            _ => "JP nn".to_string(),
        },
        BranchClass::Jr => match predecessor_family {
            Some(Family::JrCond { cc, .. }) => format!("JR {}, e", cc.name()),
            _ => "JR e".to_string(),
        },
        BranchClass::Djnz => "DJNZ e".to_string(),
    }
}

fn cc_label(cc: u8) -> &'static str {
    zilog_z80_disasm::fields::CC_NAMES[(cc & 0b111) as usize]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fall_through_has_no_instruction_context() {
        assert_eq!(edge_label(BranchClass::FallThrough, None), "fall through");
    }

    #[test]
    fn conditional_jr_names_its_condition() {
        let family = Family::JrCond {
            cc: zilog_z80_disasm::JrCond::Nz,
            e: 2,
            jump_destination: 0x4008,
        };
        assert_eq!(edge_label(BranchClass::Jr, Some(&family)), "JR NZ, e");
    }

    #[test]
    fn call_is_unconditional_by_default() {
        assert_eq!(edge_label(BranchClass::Call, None), "CALL nn");
    }
}
