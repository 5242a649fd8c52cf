//! Decoded native instructions, as handed to the translators.
//!
//! A decoder produces one `Instruction` per native instruction. Each operand
//! is a tree of `OperandNode`s whose root is a size prefix node with a single
//! child holding the actual expression.
//!
//! The shapes the ARM translators understand are:
//!
//! * `R0` - `Register("R0")`
//! * `#4` - `ImmediateInteger("4")`
//! * `R1, LSL #2` - `Operator("LSL")` over `Register("R1")`, `ImmediateInteger("2")`
//! * `R1, RRX` - `Operator("RRX")` over `Register("R1")`
//! * `[R1]` - `MemDeref("[")` over `Register("R1")`
//! * `[R1, #4]` - `MemDeref("[")` over `Operator(",")` over `Register("R1")`, `ImmediateInteger("4")`
//! * `[R1, #4]!` - `Operator("!")` over the offset form
//! * `[R1], #4` - `Operator(",")` over `MemDeref("[")` over `Register("R1")`, and `ImmediateInteger("4")`
//! * `-R2` - `Operator("-")` over `Register("R2")`, for subtracted offset registers
//! * `R0!` - `Operator("!")` over `Register("R0")`, for block transfer write-back
//! * `{R4, R5}` - `ExpressionList("{")` over the registers

use crate::error::*;
use serde::{Deserialize, Serialize};
use std::fmt;

mod node;

pub use self::node::*;

/// The size prefix every operand tree carries at its root.
pub const SIZE_PREFIX: &str = "b4";

/// A decoded native instruction.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Instruction {
    address: u64,
    length: u64,
    #[serde(default)]
    thumb: bool,
    mnemonic: String,
    operands: Vec<Operand>,
}

impl Instruction {
    /// Create a new 4-byte instruction.
    pub fn new<S: Into<String>>(address: u64, mnemonic: S, operands: Vec<Operand>) -> Instruction {
        Instruction {
            address,
            length: 4,
            thumb: false,
            mnemonic: mnemonic.into(),
            operands,
        }
    }

    /// Parse an instruction handed over as JSON by a decoder.
    pub fn from_json(json: &str) -> Result<Instruction> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the length of this instruction in bytes.
    pub fn with_length(mut self, length: u64) -> Instruction {
        self.length = length;
        self
    }

    /// Mark this instruction as decoded in Thumb state. Only needed for
    /// 32-bit Thumb-2 encodings, as 16-bit instructions are always Thumb.
    pub fn with_thumb(mut self, thumb: bool) -> Instruction {
        self.thumb = thumb;
        self
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// Returns true if this instruction executes in Thumb state.
    pub fn is_thumb(&self) -> bool {
        self.thumb || self.length < 4
    }

    /// The address of the instruction following this one.
    pub fn next_address(&self) -> u64 {
        self.address + self.length
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn operand(&self, index: usize) -> Option<&Operand> {
        self.operands.get(index)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:08X} {}", self.address, self.mnemonic)?;
        let operands: Vec<String> = self.operands.iter().map(|o| o.to_string()).collect();
        if !operands.is_empty() {
            write!(f, " {}", operands.join(", "))?;
        }
        Ok(())
    }
}

/// One operand of a decoded instruction.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Operand {
    root: OperandNode,
}

impl Operand {
    /// Wrap an expression in the size prefix root node.
    pub fn new(expression: OperandNode) -> Operand {
        Operand {
            root: OperandNode::new(ExpressionType::SizePrefix, SIZE_PREFIX, vec![expression]),
        }
    }

    /// The size prefix node at the root of this operand.
    pub fn root(&self) -> &OperandNode {
        &self.root
    }

    /// The expression below the size prefix.
    pub fn expression(&self) -> Option<&OperandNode> {
        self.root.children().first()
    }

    pub fn register(name: &str) -> Operand {
        Operand::new(OperandNode::register(name))
    }

    pub fn immediate(value: i64) -> Operand {
        Operand::new(OperandNode::immediate(value))
    }

    /// `Rm, <shift> #imm`, for example `R1, LSL #2`.
    pub fn shifted_immediate(shift: &str, register: &str, amount: u64) -> Operand {
        Operand::new(OperandNode::operator(
            shift,
            vec![
                OperandNode::register(register),
                OperandNode::immediate(amount as i64),
            ],
        ))
    }

    /// `Rm, <shift> Rs`, for example `R1, ROR R2`.
    pub fn shifted_register(shift: &str, register: &str, amount: &str) -> Operand {
        Operand::new(OperandNode::operator(
            shift,
            vec![OperandNode::register(register), OperandNode::register(amount)],
        ))
    }

    /// `Rm, RRX`
    pub fn rrx(register: &str) -> Operand {
        Operand::new(OperandNode::operator(
            "RRX",
            vec![OperandNode::register(register)],
        ))
    }

    /// `[Rn]`
    pub fn memory(base: &str) -> Operand {
        Operand::new(OperandNode::memory(vec![OperandNode::register(base)]))
    }

    /// `[Rn, <offset>]`
    pub fn memory_offset(base: &str, offset: OperandNode) -> Operand {
        Operand::new(OperandNode::memory(vec![OperandNode::operator(
            ",",
            vec![OperandNode::register(base), offset],
        )]))
    }

    /// `[Rn, <offset>]!`
    pub fn memory_pre_indexed(base: &str, offset: OperandNode) -> Operand {
        Operand::new(OperandNode::operator(
            "!",
            vec![OperandNode::memory(vec![OperandNode::operator(
                ",",
                vec![OperandNode::register(base), offset],
            )])],
        ))
    }

    /// `[Rn], <offset>`
    pub fn memory_post_indexed(base: &str, offset: OperandNode) -> Operand {
        Operand::new(OperandNode::operator(
            ",",
            vec![
                OperandNode::memory(vec![OperandNode::register(base)]),
                offset,
            ],
        ))
    }

    /// `Rn!`
    pub fn write_back(register: &str) -> Operand {
        Operand::new(OperandNode::operator(
            "!",
            vec![OperandNode::register(register)],
        ))
    }

    /// `{R0, R1, ...}`
    pub fn register_list(registers: &[&str]) -> Operand {
        Operand::new(OperandNode::new(
            ExpressionType::ExpressionList,
            "{",
            registers
                .iter()
                .map(|register| OperandNode::register(register))
                .collect(),
        ))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.expression() {
            Some(expression) => write!(f, "{}", expression),
            None => write!(f, "{}", self.root),
        }
    }
}
