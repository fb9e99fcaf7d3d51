//! Operand lookup tables shared by the catalog and the renderers.
//!
//! These are the `r`, `cc`, `dd`, `pp`, `qq`, `rr`, `ss`, `t`→restart tables
//! spec.md's catalog calls out as first-class: every opcode embeds a 2- or
//! 3-bit selector, and every family resolves it through exactly one of
//! these tables.

/// Names for the 3-bit `r` register selector (B,C,D,E,H,L,-,A). Index 6
/// ((HL)) is never resolved through this table — every family that can
/// select (HL) has its own `Target8::DerefHl`/dedicated variant instead.
pub const R_NAMES: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];

/// Names for the 3-bit `cc` condition selector.
pub const CC_NAMES: [&str; 8] = ["NZ", "Z", "NC", "C", "PO", "PE", "P", "M"];

/// Names for the 2-bit `dd` register-pair selector (BC,DE,HL,SP).
pub const DD_NAMES: [&str; 4] = ["BC", "DE", "HL", "SP"];

/// Names for the 2-bit `qq` register-pair selector used by PUSH/POP (BC,DE,HL,AF).
pub const QQ_NAMES: [&str; 4] = ["BC", "DE", "HL", "AF"];

/// Names for the 2-bit `pp` register-pair selector used by DD-prefixed
/// `ADD IX, pp` (BC,DE,IX,SP).
pub const PP_NAMES: [&str; 4] = ["BC", "DE", "IX", "SP"];

/// Names for the 2-bit `rr` register-pair selector used by FD-prefixed
/// `ADD IY, rr` (BC,DE,IY,SP).
pub const RR_NAMES: [&str; 4] = ["BC", "DE", "IY", "SP"];

/// `ss` is the same encoding as `dd` — a separate table per spec.md's naming,
/// an alias in practice.
pub const SS_NAMES: [&str; 4] = DD_NAMES;

/// Restart addresses selected by the 3-bit `t` field of `RST t`.
pub const RESTART_ADDRESSES: [u16; 8] =
    [0x00, 0x08, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38];

/// Evaluate the Z80 condition `cc` against flag register `f`.
///
/// Not used by decoding itself (conditions are never resolved at decode
/// time — only rendered and classified), kept here because it is the
/// natural complement to `CC_NAMES` and the explorer never needs it either:
/// both branches of a conditional jump/call are always explored statically.
#[must_use]
pub const fn condition_name(cc: u8) -> &'static str {
    CC_NAMES[(cc & 0b111) as usize]
}
