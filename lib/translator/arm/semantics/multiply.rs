//! Multiply, multiply accumulate, and divide.
//!
//! Products are formed at twice the operand width. Only `MUL`, `MLA` and the
//! long multiplies have flag-setting forms, which write `N` and `Z` and leave
//! `C` and `V` alone. The halfword and dual multiplies set the sticky `Q` flag
//! when a 32-bit accumulation overflows.

use super::*;
use crate::translator::arm::helpers::{
    add_overflow_bit, conditional_negate, extract_bit, set_sticky, sign_extend, signed_mul,
};

const MASK: u64 = 0xffff_ffff;

fn low_half(environment: &mut TranslationEnvironment, block: &mut Block, value: Operand) -> Operand {
    let low = environment.next_temporary().dword();
    block.and(value, const_(MASK, Qword), low);
    low
}

fn high_half(environment: &mut TranslationEnvironment, block: &mut Block, value: Operand) -> Operand {
    let shifted = environment.next_temporary().qword();
    let high = environment.next_temporary().dword();
    block.bsh(value, neg_const(32, Qword), shifted);
    block.and(shifted, const_(MASK, Qword), high);
    high
}

// RdHi:RdLo as a Qword
fn join(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    low: Operand,
    high: Operand,
) -> Operand {
    let shifted = environment.next_temporary().qword();
    let joined = environment.next_temporary().qword();
    block.bsh(high, const_(32, Qword), shifted);
    block.or(shifted, low, joined);
    joined
}

/// `MUL Rd, Rn, Rm`, or the Thumb form `MUL Rd, Rm`.
pub fn mul(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[3, 2])?;
    let rd = register(instruction, 0)?;
    let (rn, rm) = if instruction.operands().len() == 3 {
        (source(instruction, 1)?, source(instruction, 2)?)
    } else {
        (rd.dword(), source(instruction, 1)?)
    };

    let result = environment.next_temporary().dword();
    block.mul(rn, rm, result);

    if mnemonic.sets_flags() {
        write_nz(block, result);
    }
    write_register(block, rd, result);
    Ok(())
}

/// `MLA Rd, Rn, Rm, Ra`: `Rd = Rn * Rm + Ra`
pub fn mla(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[4])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let rm = source(instruction, 2)?;
    let ra = source(instruction, 3)?;

    let product = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();
    block.mul(rn, rm, product);
    block.add(product, ra, result);

    if mnemonic.sets_flags() {
        write_nz(block, result);
    }
    write_register(block, rd, result);
    Ok(())
}

/// `MLS Rd, Rn, Rm, Ra`: `Rd = Ra - Rn * Rm`
pub fn mls(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[4])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let rm = source(instruction, 2)?;
    let ra = source(instruction, 3)?;

    let product = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();
    block.mul(rn, rm, product);
    block.sub(ra, product, result);
    write_register(block, rd, result);
    Ok(())
}

// Operands of the long multiplies: RdLo, RdHi, Rn, Rm
fn long_operands(instruction: &Instruction) -> Result<(Register, Register, Operand, Operand)> {
    expect_operands(instruction, &[4])?;
    Ok((
        register(instruction, 0)?,
        register(instruction, 1)?,
        source(instruction, 2)?,
        source(instruction, 3)?,
    ))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Long {
    Unsigned,
    Signed,
}

fn long_multiply(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
    kind: Long,
    accumulate: bool,
) -> Result<()> {
    let (rd_lo, rd_hi, rn, rm) = long_operands(instruction)?;

    let product = match kind {
        Long::Unsigned => {
            let product = environment.next_temporary().qword();
            block.mul(rn, rm, product);
            product
        }
        Long::Signed => signed_mul(environment, block, rn, rm),
    };

    let result = if accumulate {
        let accumulator = join(environment, block, rd_lo.dword(), rd_hi.dword());
        let sum = environment.next_temporary().qword();
        block.add(product, accumulator, sum);
        sum
    } else {
        product
    };

    if mnemonic.sets_flags() {
        write_nz(block, result);
    }
    let low = low_half(environment, block, result);
    let high = high_half(environment, block, result);
    write_register(block, rd_lo, low);
    write_register(block, rd_hi, high);
    Ok(())
}

/// `UMULL RdLo, RdHi, Rn, Rm`
pub fn umull(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    long_multiply(environment, instruction, mnemonic, block, Long::Unsigned, false)
}

/// `UMLAL RdLo, RdHi, Rn, Rm`
pub fn umlal(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    long_multiply(environment, instruction, mnemonic, block, Long::Unsigned, true)
}

/// `SMULL RdLo, RdHi, Rn, Rm`
pub fn smull(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    long_multiply(environment, instruction, mnemonic, block, Long::Signed, false)
}

/// `SMLAL RdLo, RdHi, Rn, Rm`
pub fn smlal(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    long_multiply(environment, instruction, mnemonic, block, Long::Signed, true)
}

/// `UMAAL RdLo, RdHi, Rn, Rm`: `RdHi:RdLo = Rn * Rm + RdHi + RdLo`
///
/// The result always fits in 64 bits.
pub fn umaal(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (rd_lo, rd_hi, rn, rm) = long_operands(instruction)?;

    let product = environment.next_temporary().qword();
    let partial = environment.next_temporary().qword();
    let result = environment.next_temporary().qword();
    block.mul(rn, rm, product);
    block.add(product, rd_lo.dword(), partial);
    block.add(partial, rd_hi.dword(), result);

    let low = low_half(environment, block, result);
    let high = high_half(environment, block, result);
    write_register(block, rd_lo, low);
    write_register(block, rd_hi, high);
    Ok(())
}

/// `SMMUL{R} Rd, Rn, Rm`: the high word of the signed product, rounded when
/// `round` is set.
pub fn smmul(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    round: bool,
) -> Result<()> {
    expect_operands(instruction, &[3])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let rm = source(instruction, 2)?;

    let product = signed_mul(environment, block, rn, rm);
    let product = if round {
        let rounded = environment.next_temporary().qword();
        block.add(product, const_(0x8000_0000, Qword), rounded);
        rounded
    } else {
        product
    };

    let high = high_half(environment, block, product);
    write_register(block, rd, high);
    Ok(())
}

// The top or bottom halfword of a register, sign extended to a Dword.
fn signed_half(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
    top: bool,
) -> Operand {
    let half = if top {
        let shifted = environment.next_temporary().dword();
        block.bsh(value, neg_const(16, Dword), shifted);
        shifted
    } else {
        value
    };
    sign_extend(environment, block, half, 16, Dword)
}

/// `SMULW<y> Rd, Rn, Rm`: bits 47:16 of `Rn` times a halfword of `Rm`.
pub fn smulw(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    top: bool,
) -> Result<()> {
    expect_operands(instruction, &[3])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let rm = source(instruction, 2)?;

    let half = signed_half(environment, block, rm, top);
    let product = signed_mul(environment, block, rn, half);
    let shifted = environment.next_temporary().qword();
    let result = environment.next_temporary().dword();
    block.bsh(product, neg_const(16, Qword), shifted);
    block.and(shifted, const_(MASK, Qword), result);
    write_register(block, rd, result);
    Ok(())
}

/// `SMUL<x><y> Rd, Rn, Rm`: a halfword of `Rn` times a halfword of `Rm`.
pub fn smulxy(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    top_n: bool,
    top_m: bool,
) -> Result<()> {
    expect_operands(instruction, &[3])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let rm = source(instruction, 2)?;

    let lhs = signed_half(environment, block, rn, top_n);
    let rhs = signed_half(environment, block, rm, top_m);
    let product = environment.next_temporary().dword();
    block.mul(lhs, rhs, product);
    write_register(block, rd, product);
    Ok(())
}

/// `SMLA<x><y> Rd, Rn, Rm, Ra`: as `SMUL<x><y>`, plus `Ra`. Signed overflow
/// of the accumulation sets `Q`.
pub fn smlaxy(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    top_n: bool,
    top_m: bool,
) -> Result<()> {
    expect_operands(instruction, &[4])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let rm = source(instruction, 2)?;
    let ra = source(instruction, 3)?;

    let lhs = signed_half(environment, block, rn, top_n);
    let rhs = signed_half(environment, block, rm, top_m);
    let product = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();
    block.mul(lhs, rhs, product);
    block.add(product, ra, result);

    let overflow = add_overflow_bit(environment, block, product, ra, result, 32);
    set_sticky(block, Register::Q, overflow);
    write_register(block, rd, result);
    Ok(())
}

/// `SMLAL<x><y> RdLo, RdHi, Rn, Rm`: `RdHi:RdLo` plus the signed product of
/// a halfword of `Rn` and a halfword of `Rm`.
pub fn smlalxy(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    top_n: bool,
    top_m: bool,
) -> Result<()> {
    let (rd_lo, rd_hi, rn, rm) = long_operands(instruction)?;

    let lhs = signed_half(environment, block, rn, top_n);
    let rhs = signed_half(environment, block, rm, top_m);
    let product = environment.next_temporary().dword();
    block.mul(lhs, rhs, product);
    let product = sign_extend(environment, block, product, 32, Qword);

    let accumulator = join(environment, block, rd_lo.dword(), rd_hi.dword());
    let result = environment.next_temporary().qword();
    block.add(accumulator, product, result);

    let low = low_half(environment, block, result);
    let high = high_half(environment, block, result);
    write_register(block, rd_lo, low);
    write_register(block, rd_hi, high);
    Ok(())
}

/// `SMLAW<y> Rd, Rn, Rm, Ra`: as `SMULW<y>`, plus `Ra`. Signed overflow of
/// the accumulation sets `Q`.
pub fn smlaw(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    top: bool,
) -> Result<()> {
    expect_operands(instruction, &[4])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let rm = source(instruction, 2)?;
    let ra = source(instruction, 3)?;

    let half = signed_half(environment, block, rm, top);
    let product = signed_mul(environment, block, rn, half);
    let shifted = environment.next_temporary().qword();
    let scaled = environment.next_temporary().dword();
    block.bsh(product, neg_const(16, Qword), shifted);
    block.and(shifted, const_(MASK, Qword), scaled);

    let result = environment.next_temporary().dword();
    block.add(scaled, ra, result);
    let overflow = add_overflow_bit(environment, block, scaled, ra, result, 32);
    set_sticky(block, Register::Q, overflow);
    write_register(block, rd, result);
    Ok(())
}

/// `SMMLA{R} Rd, Rn, Rm, Ra` and `SMMLS{R} Rd, Rn, Rm, Ra`: the high word of
/// `Ra << 32` plus, or minus, the signed product, rounded when `round` is
/// set.
pub fn smmla(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    subtract: bool,
    round: bool,
) -> Result<()> {
    expect_operands(instruction, &[4])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let rm = source(instruction, 2)?;
    let ra = source(instruction, 3)?;

    let product = signed_mul(environment, block, rn, rm);
    let accumulator = join(environment, block, const_(0, Qword), ra);
    let combined = environment.next_temporary().qword();
    if subtract {
        block.sub(accumulator, product, combined);
    } else {
        block.add(accumulator, product, combined);
    }
    let combined = if round {
        let rounded = environment.next_temporary().qword();
        block.add(combined, const_(0x8000_0000, Qword), rounded);
        rounded
    } else {
        combined
    };

    let high = high_half(environment, block, combined);
    write_register(block, rd, high);
    Ok(())
}

// Rm with its halfwords exchanged
fn swap_halves(environment: &mut TranslationEnvironment, block: &mut Block, value: Operand) -> Operand {
    let up = environment.next_temporary().dword();
    let down = environment.next_temporary().dword();
    let swapped = environment.next_temporary().dword();
    block.bsh(value, const_(16, Dword), up);
    block.bsh(value, neg_const(16, Dword), down);
    block.or(up, down, swapped);
    swapped
}

// The signed product of the bottom, or top, halfwords, as a Qword
fn half_product(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    rn: Operand,
    rm: Operand,
    top: bool,
) -> Operand {
    let lhs = signed_half(environment, block, rn, top);
    let rhs = signed_half(environment, block, rm, top);
    let product = environment.next_temporary().dword();
    block.mul(lhs, rhs, product);
    sign_extend(environment, block, product, 32, Qword)
}

// The bottom and top products of a dual multiply
fn dual_products(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    rn: Operand,
    rm: Operand,
    exchange: bool,
) -> (Operand, Operand) {
    let rm = if exchange {
        swap_halves(environment, block, rm)
    } else {
        rm
    };
    let bottom = half_product(environment, block, rn, rm, false);
    let top = half_product(environment, block, rn, rm, true);
    (bottom, top)
}

// 1 when a Qword does not hold a sign extended Dword
fn signed_overflow(environment: &mut TranslationEnvironment, block: &mut Block, wide: Operand) -> Operand {
    let narrow = low_half(environment, block, wide);
    let extended = sign_extend(environment, block, narrow, 32, Qword);
    let difference = environment.next_temporary().qword();
    let fits = environment.next_temporary().byte();
    let overflow = environment.next_temporary().byte();
    block.xor(extended, wide, difference);
    block.bisz(difference, fits);
    block.xor(fits, const_(1, Byte), overflow);
    overflow
}

/// `SMUAD{X} Rd, Rn, Rm`, `SMUSD{X} Rd, Rn, Rm`, `SMLAD{X} Rd, Rn, Rm, Ra`
/// and `SMLSD{X} Rd, Rn, Rm, Ra`.
///
/// The sum, or difference, of the two signed halfword products, plus `Ra`
/// when accumulating. `X` exchanges the halfwords of `Rm`. Overflow sets
/// `Q`, except for `SMUSD`, which cannot overflow.
#[allow(clippy::too_many_arguments)]
pub fn dual_multiply(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    subtract: bool,
    exchange: bool,
    accumulate: bool,
) -> Result<()> {
    expect_operands(instruction, if accumulate { &[4] } else { &[3] })?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let rm = source(instruction, 2)?;

    let (bottom, top) = dual_products(environment, block, rn, rm, exchange);
    let combined = environment.next_temporary().qword();
    if subtract {
        block.sub(bottom, top, combined);
    } else {
        block.add(bottom, top, combined);
    }
    let result = if accumulate {
        let ra = sign_extend(environment, block, source(instruction, 3)?, 32, Qword);
        let sum = environment.next_temporary().qword();
        block.add(combined, ra, sum);
        sum
    } else {
        combined
    };

    if accumulate || !subtract {
        let overflow = signed_overflow(environment, block, result);
        set_sticky(block, Register::Q, overflow);
    }
    let low = low_half(environment, block, result);
    write_register(block, rd, low);
    Ok(())
}

/// `SMLALD{X} RdLo, RdHi, Rn, Rm` and `SMLSLD{X} RdLo, RdHi, Rn, Rm`:
/// `RdHi:RdLo` plus the sum, or difference, of the two signed halfword
/// products.
pub fn dual_multiply_long(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    subtract: bool,
    exchange: bool,
) -> Result<()> {
    let (rd_lo, rd_hi, rn, rm) = long_operands(instruction)?;

    let (bottom, top) = dual_products(environment, block, rn, rm, exchange);
    let combined = environment.next_temporary().qword();
    if subtract {
        block.sub(bottom, top, combined);
    } else {
        block.add(bottom, top, combined);
    }
    let accumulator = join(environment, block, rd_lo.dword(), rd_hi.dword());
    let result = environment.next_temporary().qword();
    block.add(accumulator, combined, result);

    let low = low_half(environment, block, result);
    let high = high_half(environment, block, result);
    write_register(block, rd_lo, low);
    write_register(block, rd_hi, high);
    Ok(())
}

// Divisor with zero replaced by one, and a mask which clears the quotient
// of a division by zero.
fn guard_divisor(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    divisor: Operand,
) -> (Operand, Operand) {
    let is_zero = environment.next_temporary().byte();
    let guarded = environment.next_temporary().dword();
    let keep = environment.next_temporary().dword();
    block.bisz(divisor, is_zero);
    block.or(divisor, is_zero, guarded);
    block.sub(is_zero, const_(1, Dword), keep);
    (guarded, keep)
}

fn divide_operands(instruction: &Instruction) -> Result<(Register, Operand, Operand)> {
    expect_operands(instruction, &[3, 2])?;
    let rd = register(instruction, 0)?;
    if instruction.operands().len() == 3 {
        Ok((rd, source(instruction, 1)?, source(instruction, 2)?))
    } else {
        Ok((rd, rd.dword(), source(instruction, 1)?))
    }
}

/// `UDIV Rd, Rn, Rm`. Division by zero yields zero.
pub fn udiv(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (rd, rn, rm) = divide_operands(instruction)?;
    let (divisor, keep) = guard_divisor(environment, block, rm);
    let quotient = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();
    block.div(rn, divisor, quotient);
    block.and(quotient, keep, result);
    write_register(block, rd, result);
    Ok(())
}

/// `SDIV Rd, Rn, Rm`, rounding towards zero. Division by zero yields zero.
pub fn sdiv(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (rd, rn, rm) = divide_operands(instruction)?;

    let n_negative = extract_bit(environment, block, rn, 31);
    let m_negative = extract_bit(environment, block, rm, 31);
    let n = conditional_negate(environment, block, rn, n_negative);
    let m = conditional_negate(environment, block, rm, m_negative);

    let (divisor, keep) = guard_divisor(environment, block, m);
    let quotient = environment.next_temporary().dword();
    block.div(n, divisor, quotient);

    let negative = environment.next_temporary().byte();
    block.xor(n_negative, m_negative, negative);
    let signed = conditional_negate(environment, block, quotient, negative);
    let result = environment.next_temporary().dword();
    block.and(signed, keep, result);
    write_register(block, rd, result);
    Ok(())
}
