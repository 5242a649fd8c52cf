//! Data processing instructions.
//!
//! These take a destination, an optional first source register, and a
//! shifter operand. When the first source is omitted, as in the two operand
//! Thumb forms, the destination is also the first source.
//!
//! Flag-setting forms with `PC` as the destination would also restore `CPSR`
//! from `SPSR`. That mode switch is not modeled, the instruction is translated
//! as if the destination were any other register.

use super::*;
use crate::translator::arm::addressing::mode_one::{self, ShifterOperand};
use crate::translator::arm::addressing::read;
use crate::translator::arm::helpers::add_overflow;

const MASK: u64 = 0xffff_ffff;

// (Rd, Rn, shifter operand)
fn data_operands(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
) -> Result<(Register, Operand, ShifterOperand)> {
    expect_operands(instruction, &[3, 2])?;
    let rd = register(instruction, 0)?;
    if instruction.operands().len() == 3 {
        let rn = source(instruction, 1)?;
        let shifter = mode_one::generate(environment, instruction, block, operand(instruction, 2)?)?;
        Ok((rd, rn, shifter))
    } else {
        let rn = read(instruction, rd);
        let shifter = mode_one::generate(environment, instruction, block, operand(instruction, 1)?)?;
        Ok((rd, rn, shifter))
    }
}

// (Rn, shifter operand) for the comparisons
fn compare_operands(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
) -> Result<(Operand, ShifterOperand)> {
    expect_operands(instruction, &[2])?;
    let rn = source(instruction, 0)?;
    let shifter = mode_one::generate(environment, instruction, block, operand(instruction, 1)?)?;
    Ok((rn, shifter))
}

fn invert(environment: &mut TranslationEnvironment, block: &mut Block, value: Operand) -> Operand {
    let inverted = environment.next_temporary().dword();
    block.xor(value, const_(MASK, Dword), inverted);
    inverted
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Logical {
    And,
    Or,
    Xor,
}

fn logical_result(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    operation: Logical,
    lhs: Operand,
    rhs: Operand,
) -> Operand {
    let result = environment.next_temporary().dword();
    match operation {
        Logical::And => block.and(lhs, rhs, result),
        Logical::Or => block.or(lhs, rhs, result),
        Logical::Xor => block.xor(lhs, rhs, result),
    };
    result
}

// Rd = Rn <operation> (inverted) shifter operand
fn logical(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
    operation: Logical,
    inverted: bool,
) -> Result<()> {
    let (rd, rn, shifter) = data_operands(environment, instruction, block)?;
    let rhs = if inverted {
        invert(environment, block, shifter.value())
    } else {
        shifter.value()
    };
    let result = logical_result(environment, block, operation, rn, rhs);

    if mnemonic.sets_flags() {
        write_nz(block, result);
        write_carry(block, shifter.carry());
    }
    write_register(block, rd, result);
    Ok(())
}

pub fn and(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    logical(environment, instruction, mnemonic, block, Logical::And, false)
}

pub fn bic(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    logical(environment, instruction, mnemonic, block, Logical::And, true)
}

pub fn eor(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    logical(environment, instruction, mnemonic, block, Logical::Xor, false)
}

pub fn orn(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    logical(environment, instruction, mnemonic, block, Logical::Or, true)
}

pub fn orr(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    logical(environment, instruction, mnemonic, block, Logical::Or, false)
}

fn move_value(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
    inverted: bool,
) -> Result<()> {
    expect_operands(instruction, &[2])?;
    let rd = register(instruction, 0)?;
    let shifter = mode_one::generate(environment, instruction, block, operand(instruction, 1)?)?;
    let result = if inverted {
        invert(environment, block, shifter.value())
    } else {
        shifter.value()
    };

    if mnemonic.sets_flags() {
        write_nz(block, result);
        write_carry(block, shifter.carry());
    }
    write_register(block, rd, result);
    Ok(())
}

/// `MOV Rd, <shifter>` and `CPY Rd, Rm`.
pub fn mov(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    move_value(environment, instruction, mnemonic, block, false)
}

pub fn mvn(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    move_value(environment, instruction, mnemonic, block, true)
}

/// `MOVW Rd, #imm16`
pub fn movw(
    _environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[2])?;
    let rd = register(instruction, 0)?;
    let value = immediate(instruction, 1)? as u64 & 0xffff;
    write_register(block, rd, const_(value, Dword));
    Ok(())
}

/// `ADR Rd, label`, where the decoder resolved the label to its address.
pub fn adr(
    _environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[2])?;
    let rd = register(instruction, 0)?;
    let address = immediate(instruction, 1)? as u64;
    write_register(block, rd, const_(address, Dword));
    Ok(())
}

fn test(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    operation: Logical,
) -> Result<()> {
    let (rn, shifter) = compare_operands(environment, instruction, block)?;
    let result = logical_result(environment, block, operation, rn, shifter.value());
    write_nz(block, result);
    write_carry(block, shifter.carry());
    Ok(())
}

pub fn tst(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    test(environment, instruction, block, Logical::And)
}

pub fn teq(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    test(environment, instruction, block, Logical::Xor)
}

/// The result and flags of `lhs + rhs + carry`.
struct Sum {
    result: Operand,
    carry: Operand,
}

/// `lhs + rhs + carry_in` at `Qword`, so that the carry out lands in bit 32.
/// The carry and `V` are only computed when `flags` is set.
fn add_with_carry(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    lhs: Operand,
    rhs: Operand,
    carry_in: Option<Operand>,
    flags: bool,
) -> Sum {
    let wide = environment.next_temporary().qword();
    block.add(lhs, rhs, wide);
    let wide = match carry_in {
        Some(carry_in) => {
            let with_carry = environment.next_temporary().qword();
            block.add(wide, carry_in, with_carry);
            with_carry
        }
        None => wide,
    };

    let result = environment.next_temporary().dword();
    block.and(wide, const_(MASK, Qword), result);

    if !flags {
        return Sum {
            result,
            carry: Register::C.byte(),
        };
    }

    let high = environment.next_temporary().qword();
    let carry = environment.next_temporary().byte();
    block.bsh(wide, neg_const(32, Qword), high);
    block.and(high, const_(1, Qword), carry);
    add_overflow(environment, block, lhs, rhs, result, 32, Register::V);

    Sum { result, carry }
}

/// The arithmetic operations, as additions with carry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Arithmetic {
    /// `Rn + op2`
    Add,
    /// `Rn + op2 + C`
    Adc,
    /// `Rn + ~op2 + 1`
    Sub,
    /// `Rn + ~op2 + C`
    Sbc,
    /// `op2 + ~Rn + 1`
    Rsb,
    /// `op2 + ~Rn + C`
    Rsc,
}

fn arithmetic_result(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    operation: Arithmetic,
    rn: Operand,
    operand2: Operand,
    flags: bool,
) -> Sum {
    let c = Register::C.byte();
    let one = const_(1, Byte);
    match operation {
        Arithmetic::Add => add_with_carry(environment, block, rn, operand2, None, flags),
        Arithmetic::Adc => add_with_carry(environment, block, rn, operand2, Some(c), flags),
        Arithmetic::Sub => {
            let inverted = invert(environment, block, operand2);
            add_with_carry(environment, block, rn, inverted, Some(one), flags)
        }
        Arithmetic::Sbc => {
            let inverted = invert(environment, block, operand2);
            add_with_carry(environment, block, rn, inverted, Some(c), flags)
        }
        Arithmetic::Rsb => {
            let inverted = invert(environment, block, rn);
            add_with_carry(environment, block, operand2, inverted, Some(one), flags)
        }
        Arithmetic::Rsc => {
            let inverted = invert(environment, block, rn);
            add_with_carry(environment, block, operand2, inverted, Some(c), flags)
        }
    }
}

fn arithmetic(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
    operation: Arithmetic,
) -> Result<()> {
    let (rd, rn, shifter) = data_operands(environment, instruction, block)?;
    let flags = mnemonic.sets_flags();
    let sum = arithmetic_result(environment, block, operation, rn, shifter.value(), flags);

    if flags {
        write_nz(block, sum.result);
        block.str(sum.carry, Register::C.byte());
    }
    write_register(block, rd, sum.result);
    Ok(())
}

pub fn add(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    arithmetic(environment, instruction, mnemonic, block, Arithmetic::Add)
}

pub fn adc(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    arithmetic(environment, instruction, mnemonic, block, Arithmetic::Adc)
}

pub fn sub(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    arithmetic(environment, instruction, mnemonic, block, Arithmetic::Sub)
}

pub fn sbc(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    arithmetic(environment, instruction, mnemonic, block, Arithmetic::Sbc)
}

pub fn rsb(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    arithmetic(environment, instruction, mnemonic, block, Arithmetic::Rsb)
}

pub fn rsc(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    arithmetic(environment, instruction, mnemonic, block, Arithmetic::Rsc)
}

/// `NEG Rd, Rm`, which is `RSB Rd, Rm, #0`.
pub fn neg(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[2])?;
    let rd = register(instruction, 0)?;
    let rm = source(instruction, 1)?;
    let flags = mnemonic.sets_flags();
    let sum = arithmetic_result(
        environment,
        block,
        Arithmetic::Rsb,
        rm,
        const_(0, Dword),
        flags,
    );

    if flags {
        write_nz(block, sum.result);
        block.str(sum.carry, Register::C.byte());
    }
    write_register(block, rd, sum.result);
    Ok(())
}

fn compare(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    operation: Arithmetic,
) -> Result<()> {
    let (rn, shifter) = compare_operands(environment, instruction, block)?;
    let sum = arithmetic_result(environment, block, operation, rn, shifter.value(), true);
    write_nz(block, sum.result);
    block.str(sum.carry, Register::C.byte());
    Ok(())
}

pub fn cmp(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    compare(environment, instruction, block, Arithmetic::Sub)
}

pub fn cmn(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    compare(environment, instruction, block, Arithmetic::Add)
}

/// `LSL`, `LSR`, `ASR` and `ROR` as instructions of their own:
/// `Rd, Rm, #imm`, `Rd, Rm, Rs`, or the Thumb form `Rd, Rs`.
pub fn shift(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
    kind: ShiftKind,
) -> Result<()> {
    expect_operands(instruction, &[3, 2])?;
    let rd = register(instruction, 0)?;
    let (value, amount) = if instruction.operands().len() == 3 {
        (source(instruction, 1)?, operand(instruction, 2)?)
    } else {
        (read(instruction, rd), operand(instruction, 1)?)
    };

    let shifter = match amount.expression() {
        Some(node) if node.is_immediate() => {
            let amount = node.immediate_value()? as u64;
            mode_one::shift_immediate(environment, block, kind, value, amount)
        }
        Some(node) if node.is_register() => {
            let amount = read_register(instruction, node)?;
            mode_one::shift_register(environment, block, kind, value, amount)
        }
        _ => {
            return Err(invalid_operand(
                instruction,
                format!("expected a shift amount, got {}", amount),
            ))
        }
    };

    if mnemonic.sets_flags() {
        write_nz(block, shifter.value());
        write_carry(block, shifter.carry());
    }
    write_register(block, rd, shifter.value());
    Ok(())
}

/// `RRX Rd, Rm`
pub fn rrx(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[2])?;
    let rd = register(instruction, 0)?;
    let rm = source(instruction, 1)?;
    let shifter = mode_one::rrx(environment, block, rm);

    if mnemonic.sets_flags() {
        write_nz(block, shifter.value());
        write_carry(block, shifter.carry());
    }
    write_register(block, rd, shifter.value());
    Ok(())
}
