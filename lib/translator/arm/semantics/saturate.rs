//! Saturating arithmetic on whole registers.
//!
//! Every clamp sets the sticky `Q` flag. Nothing clears it.

use super::*;
use crate::translator::arm::addressing::mode_one;
use crate::translator::arm::helpers::{
    extract_field, saturate, saturating_add_sub, sign_extend, AddSub,
};

// Rd, #saturate_to, Rn{, shift}
fn saturate_operands(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
) -> Result<(Register, i64, Operand)> {
    expect_operands(instruction, &[3])?;
    let rd = register(instruction, 0)?;
    let bits = immediate(instruction, 1)?;
    let shifted = mode_one::generate(environment, instruction, block, operand(instruction, 2)?)?;
    Ok((rd, bits, shifted.value()))
}

fn saturate_register(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    rd: Register,
    value: Operand,
    signedness: Signedness,
    bits: usize,
) {
    let wide = sign_extend(environment, block, value, 32, Qword);
    let (clamped, _) = saturate(environment, block, wide, signedness, bits, Some(Register::Q));
    let result = environment.next_temporary().dword();
    block.and(clamped, const_(0xffff_ffff, Qword), result);
    write_register(block, rd, result);
}

/// `SSAT Rd, #n, Rn{, shift}`: saturate the signed shifted value into `n`
/// bits, `1 <= n <= 32`.
pub fn ssat(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (rd, bits, value) = saturate_operands(environment, instruction, block)?;
    if !(1..=32).contains(&bits) {
        return Err(invalid_operand(
            instruction,
            format!("saturation width {} is out of range", bits),
        ));
    }
    saturate_register(environment, block, rd, value, Signedness::Signed, bits as usize);
    Ok(())
}

/// `USAT Rd, #n, Rn{, shift}`: saturate the signed shifted value into the
/// unsigned range of `n` bits, `0 <= n <= 31`.
pub fn usat(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (rd, bits, value) = saturate_operands(environment, instruction, block)?;
    if !(0..=31).contains(&bits) {
        return Err(invalid_operand(
            instruction,
            format!("saturation width {} is out of range", bits),
        ));
    }
    saturate_register(environment, block, rd, value, Signedness::Unsigned, bits as usize);
    Ok(())
}

// Rd, #saturate_to, Rn, with the width checked against range
fn halfword_operands(
    instruction: &Instruction,
    range: std::ops::RangeInclusive<i64>,
) -> Result<(Register, usize, Operand)> {
    expect_operands(instruction, &[3])?;
    let rd = register(instruction, 0)?;
    let bits = immediate(instruction, 1)?;
    if !range.contains(&bits) {
        return Err(invalid_operand(
            instruction,
            format!("saturation width {} is out of range", bits),
        ));
    }
    Ok((rd, bits as usize, source(instruction, 2)?))
}

// Saturate both signed halfwords of value independently
fn saturate_halfwords(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    rd: Register,
    value: Operand,
    signedness: Signedness,
    bits: usize,
) {
    let mut result = const_(0, Dword);
    for &lsb in [0, 16].iter() {
        let half = extract_field(environment, block, value, lsb, 16, Dword);
        let wide = sign_extend(environment, block, half, 16, Qword);
        let (clamped, _) = saturate(environment, block, wide, signedness, bits, Some(Register::Q));
        let masked = environment.next_temporary().dword();
        let positioned = environment.next_temporary().dword();
        let merged = environment.next_temporary().dword();
        block.and(clamped, const_(0xffff, Qword), masked);
        block.bsh(masked, const_(lsb as u64, Dword), positioned);
        block.or(result, positioned, merged);
        result = merged;
    }
    write_register(block, rd, result);
}

/// `SSAT16 Rd, #n, Rn`: saturate each signed halfword into `n` bits,
/// `1 <= n <= 16`.
pub fn ssat16(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (rd, bits, value) = halfword_operands(instruction, 1..=16)?;
    saturate_halfwords(environment, block, rd, value, Signedness::Signed, bits);
    Ok(())
}

/// `USAT16 Rd, #n, Rn`: saturate each signed halfword into the unsigned
/// range of `n` bits, `0 <= n <= 15`.
pub fn usat16(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (rd, bits, value) = halfword_operands(instruction, 0..=15)?;
    saturate_halfwords(environment, block, rd, value, Signedness::Unsigned, bits);
    Ok(())
}

fn saturating(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    operation: AddSub,
    doubling: bool,
) -> Result<()> {
    expect_operands(instruction, &[3])?;
    let rd = register(instruction, 0)?;
    let rm = source(instruction, 1)?;
    let rn = source(instruction, 2)?;

    let rn = if doubling {
        let (doubled, _) = saturating_add_sub(
            environment,
            block,
            AddSub::Add,
            rn,
            rn,
            Signedness::Signed,
            32,
            Some(Register::Q),
        );
        doubled
    } else {
        rn
    };

    let (result, _) = saturating_add_sub(
        environment,
        block,
        operation,
        rm,
        rn,
        Signedness::Signed,
        32,
        Some(Register::Q),
    );
    write_register(block, rd, result);
    Ok(())
}

/// `QADD Rd, Rm, Rn` and `QDADD Rd, Rm, Rn`, which first doubles `Rn` with
/// saturation.
pub fn qadd(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    doubling: bool,
) -> Result<()> {
    saturating(environment, instruction, block, AddSub::Add, doubling)
}

/// `QSUB Rd, Rm, Rn` and `QDSUB Rd, Rm, Rn`.
pub fn qsub(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    doubling: bool,
) -> Result<()> {
    saturating(environment, instruction, block, AddSub::Sub, doubling)
}
