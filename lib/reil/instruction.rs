use crate::reil::Operand;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata key marking a jump as a call (`"true"`) or a plain jump/return
/// (`"false"`).
pub const IS_CALL: &str = "isCall";

/// The seventeen REIL opcodes.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Opcode {
    Add,
    And,
    Bisz,
    Bsh,
    Div,
    Jcc,
    Ldm,
    Mod,
    Mul,
    Nop,
    Or,
    Stm,
    Str,
    Sub,
    Undef,
    Unkn,
    Xor,
}

impl Opcode {
    pub fn mnemonic(&self) -> &'static str {
        match *self {
            Opcode::Add => "add",
            Opcode::And => "and",
            Opcode::Bisz => "bisz",
            Opcode::Bsh => "bsh",
            Opcode::Div => "div",
            Opcode::Jcc => "jcc",
            Opcode::Ldm => "ldm",
            Opcode::Mod => "mod",
            Opcode::Mul => "mul",
            Opcode::Nop => "nop",
            Opcode::Or => "or",
            Opcode::Stm => "stm",
            Opcode::Str => "str",
            Opcode::Sub => "sub",
            Opcode::Undef => "undef",
            Opcode::Unkn => "unkn",
            Opcode::Xor => "xor",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// A single REIL instruction.
///
/// The address of a REIL instruction is the native address of the
/// instruction it was lifted from, multiplied by `0x100`, plus the index of the
/// REIL instruction within that translation.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Instruction {
    address: u64,
    opcode: Opcode,
    first: Operand,
    second: Operand,
    third: Operand,
    metadata: BTreeMap<String, String>,
}

impl Instruction {
    pub fn new(
        address: u64,
        opcode: Opcode,
        first: Operand,
        second: Operand,
        third: Operand,
    ) -> Instruction {
        Instruction {
            address,
            opcode,
            first,
            second,
            third,
            metadata: BTreeMap::new(),
        }
    }

    /// The REIL address of this instruction.
    pub fn address(&self) -> u64 {
        self.address
    }

    /// The native address this instruction was lifted from.
    pub fn native_address(&self) -> u64 {
        self.address >> 8
    }

    /// The position of this instruction in the translation of its native
    /// instruction.
    pub fn index(&self) -> u64 {
        self.address & 0xff
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn first(&self) -> &Operand {
        &self.first
    }

    pub fn second(&self) -> &Operand {
        &self.second
    }

    pub fn third(&self) -> &Operand {
        &self.third
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Attach a key/value annotation to this instruction.
    pub fn set_metadata<K: Into<String>, V: Into<String>>(
        &mut self,
        key: K,
        value: V,
    ) -> &mut Instruction {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Tag this instruction, which should be a `jcc`, as a call or not.
    pub fn set_call(&mut self, is_call: bool) -> &mut Instruction {
        self.set_metadata(IS_CALL, is_call.to_string())
    }

    /// Returns `Some(true)` for jumps tagged as calls, `Some(false)` for
    /// jumps tagged as plain jumps or returns, and `None` otherwise.
    pub fn is_call(&self) -> Option<bool> {
        self.metadata.get(IS_CALL).map(|value| value == "true")
    }

    pub fn is_jcc(&self) -> bool {
        self.opcode == Opcode::Jcc
    }

    pub fn is_unknown(&self) -> bool {
        self.opcode == Opcode::Unkn
    }

    pub fn is_nop(&self) -> bool {
        self.opcode == Opcode::Nop
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:X}.{:02X}: {} [{}, {}, {}]",
            self.native_address(),
            self.index(),
            self.opcode,
            self.first,
            self.second,
            self.third
        )?;
        for (key, value) in &self.metadata {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}
