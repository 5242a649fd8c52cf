//! Byte and bit reversal, extension, status register access, and the
//! opcodes without modeled effects.

use super::*;
use crate::disassembly::ExpressionType;
use crate::translator::arm::addressing::mode_one::{self, shift_immediate};
use crate::translator::arm::helpers::{extract_field, reverse_bits, reverse_bytes, sign_extend};

// Rd, Rm for the single source instructions
fn unary_operands(instruction: &Instruction) -> Result<(Register, Operand)> {
    expect_operands(instruction, &[2])?;
    Ok((register(instruction, 0)?, source(instruction, 1)?))
}

/// `CLZ Rd, Rm`
///
/// Smears the highest set bit into every lower bit, then counts the zero
/// bits left above it.
pub fn clz(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (rd, rm) = unary_operands(instruction)?;

    let mut smeared = rm;
    for shift in [1, 2, 4, 8, 16] {
        let shifted = environment.next_temporary().dword();
        let merged = environment.next_temporary().dword();
        block.bsh(smeared, neg_const(shift, Dword), shifted);
        block.or(smeared, shifted, merged);
        smeared = merged;
    }
    let zeros = environment.next_temporary().dword();
    block.xor(smeared, const_(0xffff_ffff, Dword), zeros);

    let count = population_count(environment, block, zeros);
    write_register(block, rd, count);
    Ok(())
}

fn population_count(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
) -> Operand {
    // pairs = value - ((value >> 1) & 0x55555555)
    let half = environment.next_temporary().dword();
    let odd = environment.next_temporary().dword();
    let pairs = environment.next_temporary().dword();
    block.bsh(value, neg_const(1, Dword), half);
    block.and(half, const_(0x5555_5555, Dword), odd);
    block.sub(value, odd, pairs);

    // nibbles = (pairs & 0x33333333) + ((pairs >> 2) & 0x33333333)
    let low_pairs = environment.next_temporary().dword();
    let pairs_shifted = environment.next_temporary().dword();
    let high_pairs = environment.next_temporary().dword();
    let nibbles = environment.next_temporary().dword();
    block.and(pairs, const_(0x3333_3333, Dword), low_pairs);
    block.bsh(pairs, neg_const(2, Dword), pairs_shifted);
    block.and(pairs_shifted, const_(0x3333_3333, Dword), high_pairs);
    block.add(low_pairs, high_pairs, nibbles);

    // bytes = (nibbles + (nibbles >> 4)) & 0x0f0f0f0f
    let nibbles_shifted = environment.next_temporary().dword();
    let summed = environment.next_temporary().dword();
    let bytes = environment.next_temporary().dword();
    block.bsh(nibbles, neg_const(4, Dword), nibbles_shifted);
    block.add(nibbles, nibbles_shifted, summed);
    block.and(summed, const_(0x0f0f_0f0f, Dword), bytes);

    // The top byte of bytes * 0x01010101 sums all four bytes
    let total = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();
    block.mul(bytes, const_(0x0101_0101, Dword), total);
    block.bsh(total, neg_const(24, Dword), result);
    result
}

/// `RBIT Rd, Rm`
pub fn rbit(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (rd, rm) = unary_operands(instruction)?;
    let result = reverse_bits(environment, block, rm);
    write_register(block, rd, result);
    Ok(())
}

/// `REV Rd, Rm`
pub fn rev(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (rd, rm) = unary_operands(instruction)?;
    let result = reverse_bytes(environment, block, rm);
    write_register(block, rd, result);
    Ok(())
}

/// `REV16 Rd, Rm`: reverse the bytes of each halfword.
pub fn rev16(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (rd, rm) = unary_operands(instruction)?;

    let down = environment.next_temporary().dword();
    let low = environment.next_temporary().dword();
    let up = environment.next_temporary().dword();
    let high = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();
    block.bsh(rm, neg_const(8, Dword), down);
    block.and(down, const_(0x00ff_00ff, Dword), low);
    block.bsh(rm, const_(8, Dword), up);
    block.and(up, const_(0xff00_ff00, Dword), high);
    block.or(low, high, result);
    write_register(block, rd, result);
    Ok(())
}

/// `REVSH Rd, Rm`: reverse the bytes of the bottom halfword and sign
/// extend.
pub fn revsh(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (rd, rm) = unary_operands(instruction)?;

    let low = environment.next_temporary().dword();
    let up = environment.next_temporary().dword();
    let down = environment.next_temporary().dword();
    let high = environment.next_temporary().dword();
    let swapped = environment.next_temporary().dword();
    block.and(rm, const_(0xff, Dword), low);
    block.bsh(low, const_(8, Dword), up);
    block.bsh(rm, neg_const(8, Dword), down);
    block.and(down, const_(0xff, Dword), high);
    block.or(up, high, swapped);

    let result = sign_extend(environment, block, swapped, 16, Dword);
    write_register(block, rd, result);
    Ok(())
}

// Rm{, ROR #rotation}
fn rotated_source(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    index: usize,
) -> Result<Operand> {
    let node = operand(instruction, index)?
        .expression()
        .ok_or_else(|| invalid_operand(instruction, "missing source operand"))?;
    match (node.kind(), node.children()) {
        (ExpressionType::Register, _) => source(instruction, index),
        (ExpressionType::Operator, [register, rotation])
            if node.value() == "ROR" && register.is_register() && rotation.is_immediate() =>
        {
            let value = read_register(instruction, register)?;
            let rotation = rotation.immediate_value()? as u64 % 32;
            if rotation == 0 {
                Ok(value)
            } else {
                Ok(shift_immediate(environment, block, ShiftKind::Ror, value, rotation).value())
            }
        }
        _ => Err(invalid_operand(
            instruction,
            format!("expected Rm{{, ROR #n}}, got {}", node),
        )),
    }
}

/// `SXTB`, `SXTH`, `UXTB` and `UXTH`, `Rd, Rm{, ROR #n}`, and the
/// accumulating forms `SXTAB`, `SXTAH`, `UXTAB` and `UXTAH`,
/// `Rd, Rn, Rm{, ROR #n}`.
#[allow(clippy::too_many_arguments)]
pub fn extend(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    signedness: Signedness,
    bits: usize,
    accumulate: bool,
) -> Result<()> {
    let rd = register(instruction, 0)?;
    let (rn, rm_index) = if accumulate {
        expect_operands(instruction, &[3])?;
        (Some(source(instruction, 1)?), 2)
    } else {
        expect_operands(instruction, &[2])?;
        (None, 1)
    };

    let rotated = rotated_source(environment, instruction, block, rm_index)?;
    let field = extract_field(environment, block, rotated, 0, bits, Dword);
    let extended = match signedness {
        Signedness::Signed => sign_extend(environment, block, field, bits, Dword),
        Signedness::Unsigned => field,
    };

    let result = match rn {
        Some(rn) => {
            let sum = environment.next_temporary().dword();
            block.add(rn, extended, sum);
            sum
        }
        None => extended,
    };
    write_register(block, rd, result);
    Ok(())
}

/// `SXTB16` and `UXTB16`, `Rd, Rm{, ROR #n}`, extend bytes 0 and 2 of the
/// rotated `Rm` into the two halfwords of `Rd`. `SXTAB16` and `UXTAB16`,
/// `Rd, Rn, Rm{, ROR #n}`, add them to the halfwords of `Rn`, each halfword
/// wrapping on its own.
pub fn extend16(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    signedness: Signedness,
    accumulate: bool,
) -> Result<()> {
    let rd = register(instruction, 0)?;
    let (rn, rm_index) = if accumulate {
        expect_operands(instruction, &[3])?;
        (Some(source(instruction, 1)?), 2)
    } else {
        expect_operands(instruction, &[2])?;
        (None, 1)
    };

    let rotated = rotated_source(environment, instruction, block, rm_index)?;
    let mut result = const_(0, Dword);
    for &lsb in [0, 16].iter() {
        let byte = extract_field(environment, block, rotated, lsb, 8, Dword);
        let extended = match signedness {
            Signedness::Signed => sign_extend(environment, block, byte, 8, Dword),
            Signedness::Unsigned => byte,
        };
        let half = match rn {
            Some(rn) => {
                let addend = extract_field(environment, block, rn, lsb, 16, Dword);
                let sum = environment.next_temporary().dword();
                block.add(addend, extended, sum);
                sum
            }
            None => extended,
        };
        let masked = environment.next_temporary().dword();
        let positioned = environment.next_temporary().dword();
        let merged = environment.next_temporary().dword();
        block.and(half, const_(0xffff, Dword), masked);
        block.bsh(masked, const_(lsb as u64, Dword), positioned);
        block.or(result, positioned, merged);
        result = merged;
    }
    write_register(block, rd, result);
    Ok(())
}

/// `PKHBT Rd, Rn, Rm{, LSL #n}` packs the bottom of `Rn` with the top of
/// the shifted `Rm`. `PKHTB Rd, Rn, Rm{, ASR #n}` packs the top of `Rn`
/// with the bottom of the shifted `Rm`.
pub fn pkh(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    top: bool,
) -> Result<()> {
    expect_operands(instruction, &[3])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let shifted = mode_one::generate(environment, instruction, block, operand(instruction, 2)?)?;

    let (n_mask, m_mask) = if top {
        (0xffff_0000, 0x0000_ffff)
    } else {
        (0x0000_ffff, 0xffff_0000)
    };
    let n_part = environment.next_temporary().dword();
    let m_part = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();
    block.and(rn, const_(n_mask, Dword), n_part);
    block.and(shifted.value(), const_(m_mask, Dword), m_part);
    block.or(n_part, m_part, result);
    write_register(block, rd, result);
    Ok(())
}

// The APSR flags and their bit positions
const STATUS_FLAGS: [(Register, u64); 10] = [
    (Register::N, 31),
    (Register::Z, 30),
    (Register::C, 29),
    (Register::V, 28),
    (Register::Q, 27),
    (Register::Ge3, 19),
    (Register::Ge2, 18),
    (Register::Ge1, 17),
    (Register::Ge0, 16),
    (Register::T, 5),
];

// The lowercase name of a status register operand, with its fields
fn status_register(instruction: &Instruction, index: usize) -> Result<String> {
    let name = operand(instruction, index)?
        .expression()
        .ok_or_else(|| invalid_operand(instruction, "missing status register"))?
        .value()
        .to_ascii_lowercase();
    if ["apsr", "cpsr", "spsr"].iter().any(|prefix| name.starts_with(prefix)) {
        Ok(name)
    } else {
        Err(invalid_operand(
            instruction,
            format!("expected a status register, got {}", name),
        ))
    }
}

/// `MRS Rd, APSR`: assemble the status register from the flags. Mode and
/// mask bits read as zero. The banked `SPSR` is not modeled, reading it is
/// `unkn`.
pub fn mrs(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[2])?;
    let rd = register(instruction, 0)?;
    if status_register(instruction, 1)?.starts_with("spsr") {
        return unknown(instruction, block);
    }

    let mut status = const_(0, Dword);
    for &(flag, bit) in STATUS_FLAGS.iter() {
        let positioned = environment.next_temporary().dword();
        let merged = environment.next_temporary().dword();
        block.bsh(flag.byte(), const_(bit, Dword), positioned);
        block.or(status, positioned, merged);
        status = merged;
    }
    write_register(block, rd, status);
    Ok(())
}

/// `MSR <spec_reg>_<fields>, Rn|#imm`
///
/// The `f` field, also spelled `nzcvq`, writes `N`, `Z`, `C`, `V` and `Q`.
/// The `g` field writes the `GE` flags. Without a field both are written.
/// Control fields are not modeled, and neither is the `SPSR`, whose writes
/// are `unkn`.
pub fn msr(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[2])?;
    let destination = status_register(instruction, 0)?;
    let value = register_or_immediate(instruction, 1)?;
    if destination.starts_with("spsr") {
        return unknown(instruction, block);
    }

    let (flags, ge) = match destination.split_once('_') {
        Some((_, fields)) => (
            fields.contains('f') || fields.contains("nzcvq"),
            fields.contains('g'),
        ),
        None => (true, true),
    };

    for &(flag, bit) in STATUS_FLAGS.iter() {
        let write = match flag {
            Register::N | Register::Z | Register::C | Register::V | Register::Q => flags,
            Register::Ge0 | Register::Ge1 | Register::Ge2 | Register::Ge3 => ge,
            _ => false,
        };
        if write {
            let shifted = environment.next_temporary().dword();
            block.bsh(value, neg_const(bit, Dword), shifted);
            block.and(shifted, const_(1, Dword), flag.byte());
        }
    }
    Ok(())
}

/// Hints and barriers, which have no effect on registers or memory.
pub fn nop(block: &mut Block) -> Result<()> {
    block.nop();
    Ok(())
}

/// Opcodes whose effects are not modeled, such as `BKPT`, `BXJ` and `SVC`.
pub fn unknown(instruction: &Instruction, block: &mut Block) -> Result<()> {
    debug!(
        "Effects of {} at 0x{:X} are not modeled, emitting unkn",
        instruction.mnemonic(),
        instruction.address()
    );
    block.unknown();
    Ok(())
}
