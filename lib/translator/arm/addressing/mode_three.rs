//! Load and store halfword, signed byte, or doubleword.
//!
//! The same forms as mode two, except that an offset register is never
//! shifted.

use crate::disassembly::{Instruction, Operand as NativeOperand};
use crate::error::*;
use crate::reil::Block;
use crate::translator::arm::addressing::mode_two::{generate_address, MemoryAddress};
use crate::translator::TranslationEnvironment;

/// Evaluate a mode three memory operand.
pub fn generate(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    operand: &NativeOperand,
) -> Result<MemoryAddress> {
    generate_address(environment, instruction, block, operand, 3, false)
}
