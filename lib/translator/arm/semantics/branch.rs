//! Branches.
//!
//! Direct branch targets arrive as absolute addresses, already resolved by
//! the decoder. Every branch ends in a `jcc` tagged with `isCall`, which is
//! set for branches that write the link register and for indirect branches
//! through any register other than `LR`.

use super::*;
use crate::disassembly::ExpressionType;
use crate::translator::arm::addressing::{pc_value, read_register};

fn direct_target(instruction: &Instruction, index: usize) -> Result<u64> {
    Ok(immediate(instruction, index)? as u64 & 0xffff_ffff)
}

// The return address, with bit 0 set in Thumb state
fn link(instruction: &Instruction, block: &mut Block) {
    let return_address = instruction.next_address() | instruction.is_thumb() as u64;
    block.str(
        const_(return_address & 0xffff_ffff, Dword),
        Register::Lr.dword(),
    );
}

fn set_thumb(block: &mut Block, thumb: bool) {
    block.str(const_(thumb as u64, Byte), Register::T.byte());
}

// T = value & 1, returning value & ~1
fn interwork(environment: &mut TranslationEnvironment, block: &mut Block, value: Operand) -> Operand {
    let target = environment.next_temporary().dword();
    block.and(value, const_(1, Dword), Register::T.byte());
    block.and(value, const_(0xffff_fffe, Dword), target);
    target
}

/// `B label`
pub fn b(
    _environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[1])?;
    let target = direct_target(instruction, 0)?;
    block.jcc(const_(1, Byte), const_(target, Dword)).set_call(false);
    Ok(())
}

/// `BL label`
pub fn bl(
    _environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[1])?;
    let target = direct_target(instruction, 0)?;
    link(instruction, block);
    block.jcc(const_(1, Byte), const_(target, Dword)).set_call(true);
    Ok(())
}

/// `BLX label`, which changes instruction set, and `BLX Rm`.
pub fn blx(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[1])?;
    let node = operand(instruction, 0)?
        .expression()
        .ok_or_else(|| invalid_operand(instruction, "missing branch target"))?;

    let target = match node.kind() {
        ExpressionType::ImmediateInteger => {
            let target = direct_target(instruction, 0)?;
            if instruction.is_thumb() {
                set_thumb(block, false);
                const_(target & !3, Dword)
            } else {
                set_thumb(block, true);
                const_(target, Dword)
            }
        }
        ExpressionType::Register => {
            // Read Rm before LR is overwritten
            let value = environment.next_temporary().dword();
            block.str(read_register(instruction, node)?, value);
            interwork(environment, block, value)
        }
        _ => return Err(invalid_operand(instruction, format!("bad branch target {}", node))),
    };

    link(instruction, block);
    block.jcc(const_(1, Byte), target).set_call(true);
    Ok(())
}

/// `BX Rm`. `BX LR` is a return.
pub fn bx(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[1])?;
    let rm = register(instruction, 0)?;
    let target = interwork(environment, block, source(instruction, 0)?);
    block
        .jcc(const_(1, Byte), target)
        .set_call(rm != Register::Lr);
    Ok(())
}

/// `CBZ Rn, label` and `CBNZ Rn, label`.
pub fn cbz(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    nonzero: bool,
) -> Result<()> {
    expect_operands(instruction, &[2])?;
    let rn = source(instruction, 0)?;
    let target = direct_target(instruction, 1)?;

    let zero = environment.next_temporary().byte();
    block.bisz(rn, zero);
    let taken = if nonzero {
        let taken = environment.next_temporary().byte();
        block.bisz(zero, taken);
        taken
    } else {
        zero
    };
    block.jcc(taken, const_(target, Dword)).set_call(false);
    Ok(())
}

/// `TBB [Rn, Rm]` and `TBH [Rn, Rm, LSL #1]`: branch forward by twice the
/// table entry at index `Rm`.
pub fn table_branch(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    size: OperandSize,
) -> Result<()> {
    expect_operands(instruction, &[1])?;
    let bad_table = || invalid_operand(instruction, "expected a branch table [Rn, Rm]");
    let node = operand(instruction, 0)?
        .expression()
        .filter(|node| node.is_memory())
        .and_then(|node| node.child(0))
        .filter(|node| node.is_operator(","))
        .ok_or_else(bad_table)?;

    let (base, index) = match node.children() {
        [base, index] if base.is_register() => (base, index),
        _ => return Err(bad_table()),
    };
    let index = match (index.kind(), index.children()) {
        (ExpressionType::Register, _) => index,
        (ExpressionType::Operator, [register, amount])
            if index.value() == "LSL" && register.is_register() && amount.is_immediate() =>
        {
            register
        }
        _ => return Err(bad_table()),
    };

    let base = read_register(instruction, base)?;
    let index = read_register(instruction, index)?;
    let offset = environment.next_temporary().dword();
    if size == Word {
        block.bsh(index, const_(1, Dword), offset);
    } else {
        block.str(index, offset);
    }

    let address = environment.next_temporary().dword();
    let entry = environment.next_temporary().sized(size);
    let doubled = environment.next_temporary().dword();
    let target = environment.next_temporary().dword();
    block.add(base, offset, address);
    block.ldm(address, entry);
    block.bsh(entry, const_(1, Dword), doubled);
    block.add(const_(pc_value(instruction), Dword), doubled, target);
    block.jcc(const_(1, Byte), target).set_call(false);
    Ok(())
}
