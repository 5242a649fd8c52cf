//! Decoding of ARM mnemonics into an opcode prefix, condition, and flags.
//!
//! ARM mnemonics carry a condition code suffix, an optional `S` suffix for
//! flag-setting forms, an optional Thumb-2 width qualifier, and sometimes an
//! opcode-specific suffix such as the `IA` of `LDMIA`. Both the pre-UAL order
//! (`ADDEQS`, `LDREQB`) and the UAL order (`ADDSEQ`, `LDRBEQ`) are accepted.
//! The mnemonic is decoded once, at the entry of a translator.

use crate::error::*;
use std::fmt;

/// An ARM condition code.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Condition {
    Eq,
    Ne,
    Cs,
    Cc,
    Mi,
    Pl,
    Vs,
    Vc,
    Hi,
    Ls,
    Ge,
    Lt,
    Gt,
    Le,
    Al,
    Nv,
}

/// Every condition suffix a mnemonic may carry, including the empty suffix.
pub const CONDITION_SUFFIXES: &[&str] = &[
    "", "EQ", "NE", "CS", "HS", "CC", "LO", "MI", "PL", "VS", "VC", "HI", "LS", "GE", "LT", "GT",
    "LE", "AL", "NV",
];

impl Condition {
    /// Parse a two letter condition suffix. `HS` and `LO` are accepted as
    /// aliases for `CS` and `CC`.
    pub fn from_suffix(suffix: &str) -> Option<Condition> {
        Some(match suffix {
            "EQ" => Condition::Eq,
            "NE" => Condition::Ne,
            "CS" | "HS" => Condition::Cs,
            "CC" | "LO" => Condition::Cc,
            "MI" => Condition::Mi,
            "PL" => Condition::Pl,
            "VS" => Condition::Vs,
            "VC" => Condition::Vc,
            "HI" => Condition::Hi,
            "LS" => Condition::Ls,
            "GE" => Condition::Ge,
            "LT" => Condition::Lt,
            "GT" => Condition::Gt,
            "LE" => Condition::Le,
            "AL" => Condition::Al,
            "NV" => Condition::Nv,
            _ => return None,
        })
    }

    pub fn suffix(&self) -> &'static str {
        match *self {
            Condition::Eq => "EQ",
            Condition::Ne => "NE",
            Condition::Cs => "CS",
            Condition::Cc => "CC",
            Condition::Mi => "MI",
            Condition::Pl => "PL",
            Condition::Vs => "VS",
            Condition::Vc => "VC",
            Condition::Hi => "HI",
            Condition::Ls => "LS",
            Condition::Ge => "GE",
            Condition::Lt => "LT",
            Condition::Gt => "GT",
            Condition::Le => "LE",
            Condition::Al => "AL",
            Condition::Nv => "NV",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

bitflags! {
    /// Properties of a mnemonic which are encoded in its suffixes, or in the
    /// state it was decoded in.
    pub struct MnemonicFlags: u8 {
        /// The `S` suffix: update the condition flags.
        const SET_FLAGS = 0b0000_0001;
        /// The Thumb-2 `.W` qualifier.
        const WIDE = 0b0000_0010;
        /// The Thumb-2 `.N` qualifier.
        const NARROW = 0b0000_0100;
        /// Decoded in Thumb state.
        const THUMB = 0b0000_1000;
    }
}

/// A decoded mnemonic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mnemonic {
    text: String,
    prefix: String,
    condition: Option<Condition>,
    flags: MnemonicFlags,
    suffix: String,
}

impl Mnemonic {
    /// Decode `mnemonic`, which must start with `prefix`.
    ///
    /// Errors with `MnemonicMismatch` when the mnemonic does not belong to
    /// the opcode family named by `prefix`.
    pub fn parse(mnemonic: &str, prefix: &str, thumb: bool) -> Result<Mnemonic> {
        let text = mnemonic.trim().to_ascii_uppercase();
        let rest = text
            .strip_prefix(prefix)
            .ok_or_else(|| Error::MnemonicMismatch {
                expected: prefix.to_string(),
                actual: mnemonic.to_string(),
            })?;

        let mut flags = MnemonicFlags::empty();
        if thumb {
            flags |= MnemonicFlags::THUMB;
        }

        let rest = if let Some(rest) = rest.strip_suffix(".W") {
            flags |= MnemonicFlags::WIDE;
            rest
        } else if let Some(rest) = rest.strip_suffix(".N") {
            flags |= MnemonicFlags::NARROW;
            rest
        } else {
            rest
        };

        let (condition, suffix) = split_condition(rest);

        let suffix = if suffix == "S" {
            flags |= MnemonicFlags::SET_FLAGS;
            String::new()
        } else {
            suffix.to_string()
        };

        Ok(Mnemonic {
            prefix: prefix.to_string(),
            text,
            condition,
            flags,
            suffix,
        })
    }

    /// This mnemonic with the `S` flag set, for encodings which always set
    /// the flags without spelling it out.
    pub fn with_set_flags(mut self) -> Mnemonic {
        self.flags |= MnemonicFlags::SET_FLAGS;
        self
    }

    /// The full, upper case mnemonic.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The opcode family prefix this mnemonic was decoded against.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The condition suffix, if one was present.
    pub fn condition(&self) -> Option<Condition> {
        self.condition
    }

    /// Returns true if this instruction only executes when its condition
    /// holds. `AL` is unconditional.
    pub fn is_conditional(&self) -> bool {
        !matches!(self.condition, None | Some(Condition::Al))
    }

    pub fn flags(&self) -> MnemonicFlags {
        self.flags
    }

    pub fn sets_flags(&self) -> bool {
        self.flags.contains(MnemonicFlags::SET_FLAGS)
    }

    pub fn is_thumb(&self) -> bool {
        self.flags.contains(MnemonicFlags::THUMB)
    }

    /// The opcode-specific suffix left after removing the condition, the `S`
    /// flag and the width qualifier, for example `B` for `LDREQB`.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

// Splits a condition code off the front (pre-UAL) or back (UAL) of the text
// following the opcode prefix.
fn split_condition(rest: &str) -> (Option<Condition>, &str) {
    if rest.len() >= 2 && rest.is_char_boundary(2) {
        if let Some(condition) = Condition::from_suffix(&rest[..2]) {
            return (Some(condition), &rest[2..]);
        }
    }
    if rest.len() > 2 && rest.is_char_boundary(rest.len() - 2) {
        let (head, tail) = rest.split_at(rest.len() - 2);
        if let Some(condition) = Condition::from_suffix(tail) {
            return (Some(condition), head);
        }
    }
    (None, rest)
}
