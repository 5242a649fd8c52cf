//! Reverse Engineering Intermediate Language.
//!
//! # An Introduction
//!
//! REIL is a flat, three-address intermediate language for the analysis of
//! binary programs. Every REIL instruction has an opcode, two input operand
//! slots, one output operand slot, and an address.
//!
//! * Arithmetic: `add`, `sub`, `mul`, `div`, `mod`, `bsh`.
//! * Bitwise: `and`, `or`, `xor`.
//! * Data transfer: `ldm`, `stm`, `str`.
//! * Conditionals: `bisz`, `jcc`.
//! * Other: `undef`, `unkn`, `nop`.
//!
//! ## Operands
//!
//! Every operand carries an `OperandSize`. An operation reads its inputs at
//! their sizes and produces its output at the size of the output slot,
//! truncating the result. Lifters exploit this: a `Dword` addition written to
//! a `Qword` temporary keeps the carry in bit 32.
//!
//! `bsh` shifts left for positive amounts and right for negative amounts. An
//! amount is negative when the sign bit of its size is set, see
//! `Operand::negative`.
//!
//! ## Addresses
//!
//! REIL has no labels. Jumps within the translation of one native instruction
//! target REIL addresses, which are formed from the native address times
//! `0x100` plus the index of the instruction within that translation. `Block`
//! hands out these addresses as instructions are appended.
//!
//! ## Flags
//!
//! Processor flags are plain registers (`N`, `Z`, `C`, `V`, `Q`, `T`,
//! `CPSR_GE_0` .. `CPSR_GE_3`) written with ordinary REIL instructions.

mod block;
mod instruction;
mod operand;
mod operand_size;

pub use self::block::*;
pub use self::instruction::*;
pub use self::operand::*;
pub use self::operand_size::OperandSize::{self, Byte, Dword, Qword, Word};

/// A convenience function to create an integer operand.
pub fn const_(value: u64, size: OperandSize) -> Operand {
    Operand::integer(value, size)
}

/// A convenience function to create a negative integer operand.
pub fn neg_const(magnitude: u64, size: OperandSize) -> Operand {
    Operand::negative(magnitude, size)
}
