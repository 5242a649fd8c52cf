//! Conditional execution.
//!
//! A conditional instruction is lifted as
//!
//! ```text
//! <condition>          ; holds = condition(N, Z, C, V)
//! bisz holds, skip
//! jcc  skip, landing
//! <body>
//! landing: nop
//! ```
//!
//! REIL has no labels, so the body is first translated into a scratch block
//! to learn its length, and the landing address is computed from it.

use crate::disassembly::Instruction;
use crate::error::*;
use crate::reil::*;
use crate::translator::arm::{Condition, InstructionTranslator, Mnemonic, Register};
use crate::translator::TranslationEnvironment;

/// Translate `instruction` with `translator`, guarding the body with the
/// condition encoded in its mnemonic.
///
/// Unconditional instructions, including those with the `AL` suffix, are
/// translated without a guard.
pub fn translate_conditional<T: InstructionTranslator + ?Sized>(
    translator: &T,
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
) -> Result<()> {
    let mnemonic = Mnemonic::parse(
        instruction.mnemonic(),
        translator.prefix(),
        instruction.is_thumb(),
    )?;
    // Inside an IT block the 16-bit forms leave the flags alone
    let mnemonic = if translator.implicit_flags() && !mnemonic.is_conditional() {
        mnemonic.with_set_flags()
    } else {
        mnemonic
    };

    let condition = match mnemonic.condition() {
        Some(condition) if mnemonic.is_conditional() => condition,
        _ => return translator.translate_core(environment, instruction, &mnemonic, block),
    };

    let body_length = {
        let mut scratch = Block::new(block.native_address());
        translator.translate_core(
            &mut environment.clone(),
            instruction,
            &mnemonic,
            &mut scratch,
        )?;
        scratch.len() as u64
    };

    let holds = condition_value(environment, block, condition);
    let skip = environment.next_temporary().byte();
    block.bisz(holds, skip);

    // The body starts right after the jcc, the landing nop right after it
    let landing = block.next_address() + 1 + body_length;
    block.jcc(skip, Operand::Address(landing));

    translator.translate_core(environment, instruction, &mnemonic, block)?;
    block.nop();

    Ok(())
}

/// Emit the computation of `condition` from the flags, returning a `Byte`
/// operand which is `1` when the condition holds.
pub fn condition_value(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    condition: Condition,
) -> Operand {
    let n = Register::N.byte();
    let z = Register::Z.byte();
    let c = Register::C.byte();
    let v = Register::V.byte();

    match condition {
        Condition::Eq => z,
        Condition::Ne => not(environment, block, z),
        Condition::Cs => c,
        Condition::Cc => not(environment, block, c),
        Condition::Mi => n,
        Condition::Pl => not(environment, block, n),
        Condition::Vs => v,
        Condition::Vc => not(environment, block, v),
        Condition::Hi => {
            let not_z = not(environment, block, z);
            binary(environment, block, Opcode::And, c, not_z)
        }
        Condition::Ls => {
            let not_c = not(environment, block, c);
            binary(environment, block, Opcode::Or, not_c, z)
        }
        Condition::Ge => {
            let differ = binary(environment, block, Opcode::Xor, n, v);
            not(environment, block, differ)
        }
        Condition::Lt => binary(environment, block, Opcode::Xor, n, v),
        Condition::Gt => {
            let differ = binary(environment, block, Opcode::Xor, n, v);
            let same = not(environment, block, differ);
            let not_z = not(environment, block, z);
            binary(environment, block, Opcode::And, not_z, same)
        }
        Condition::Le => {
            let differ = binary(environment, block, Opcode::Xor, n, v);
            binary(environment, block, Opcode::Or, z, differ)
        }
        Condition::Al => const_(1, Byte),
        Condition::Nv => const_(0, Byte),
    }
}

fn not(environment: &mut TranslationEnvironment, block: &mut Block, value: Operand) -> Operand {
    let result = environment.next_temporary().byte();
    block.bisz(value, result);
    result
}

fn binary(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    opcode: Opcode,
    lhs: Operand,
    rhs: Operand,
) -> Operand {
    let result = environment.next_temporary().byte();
    match opcode {
        Opcode::And => block.and(lhs, rhs, result),
        Opcode::Or => block.or(lhs, rhs, result),
        _ => block.xor(lhs, rhs, result),
    };
    result
}
