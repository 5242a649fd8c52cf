//! Bit manipulation building blocks shared by the ARM translators.
//!
//! These functions emit REIL into the caller's block and return the operand
//! holding their result. None of them has any other side effect.

use crate::error::*;
use crate::reil::*;
use crate::translator::arm::Register;
use crate::translator::TranslationEnvironment;

/// Whether a value is interpreted as signed or unsigned.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// An additive operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddSub {
    Add,
    Sub,
}

/// A mask with ones over bits `[lsb, lsb + width)`.
pub fn pos_bit_mask(lsb: usize, width: usize) -> u64 {
    let ones = if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    };
    ones.checked_shl(lsb as u32).unwrap_or(0)
}

/// A mask at `size` with zeros over bits `[lsb, lsb + width)` and ones
/// everywhere else.
pub fn neg_bit_mask(lsb: usize, width: usize, size: OperandSize) -> u64 {
    !pos_bit_mask(lsb, width) & size.mask()
}

/// The most negative value representable in `bits` bits, in two's complement
/// at `size`.
pub fn highest_negative_value(bits: usize, size: OperandSize) -> u64 {
    (1u64 << (bits - 1)).wrapping_neg() & size.mask()
}

/// The most positive value representable in `bits` bits, signed.
pub fn highest_positive_value(bits: usize) -> u64 {
    (1u64 << (bits - 1)) - 1
}

/// The index of the register named `name`. `SP`, `LR` and `PC` are 13, 14
/// and 15.
pub fn register_index(name: &str) -> Result<usize> {
    Register::index_of(name)
}

/// Extract bit `bit` of `value` into a fresh `Byte` temporary.
pub fn extract_bit(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
    bit: usize,
) -> Operand {
    let size = value.size().unwrap_or(Dword);
    let shifted = environment.next_temporary().sized(size);
    let result = environment.next_temporary().byte();
    block.bsh(value, neg_const(bit as u64, size), shifted);
    block.and(shifted, const_(1, size), result);
    result
}

/// Extract `width` bits of `value` starting at `lsb`, zero extended into a
/// fresh temporary of `size`.
pub fn extract_field(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
    lsb: usize,
    width: usize,
    size: OperandSize,
) -> Operand {
    let value_size = value.size().unwrap_or(Dword);
    let result = environment.next_temporary().sized(size);
    if lsb == 0 {
        block.and(value, const_(pos_bit_mask(0, width), value_size), result);
    } else {
        let shifted = environment.next_temporary().sized(value_size);
        block.bsh(value, neg_const(lsb as u64, value_size), shifted);
        block.and(shifted, const_(pos_bit_mask(0, width), value_size), result);
    }
    result
}

/// Sign extend the low `from_bits` bits of `value` to `to_size`.
///
/// Emits `add 2^(n-1)`, `and 2^n - 1`, `sub 2^(n-1)`. The final subtraction
/// wraps at `to_size`, which replicates the sign bit of the field into the
/// upper bits.
pub fn sign_extend(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
    from_bits: usize,
    to_size: OperandSize,
) -> Operand {
    let biased = environment.next_temporary().sized(to_size);
    let masked = environment.next_temporary().sized(to_size);
    let result = environment.next_temporary().sized(to_size);
    let half = 1u64 << (from_bits - 1);

    block.add(value, const_(half, to_size), biased);
    block.and(biased, const_(pos_bit_mask(0, from_bits), to_size), masked);
    block.sub(masked, const_(half, to_size), result);
    result
}

/// Signed multiplication of two operands of the same size, producing a
/// result of the next larger size.
///
/// Both operands are sign extended to the result size before multiplying.
/// The truncated product of the extended operands is the exact signed
/// product.
pub fn signed_mul(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    lhs: Operand,
    rhs: Operand,
) -> Operand {
    let size = lhs.size().unwrap_or(Dword);
    let wide = size.next_larger();
    let lhs = sign_extend(environment, block, lhs, size.bits(), wide);
    let rhs = sign_extend(environment, block, rhs, size.bits(), wide);
    let result = environment.next_temporary().sized(wide);
    block.mul(lhs, rhs, result);
    result
}

/// Compute the overflow flag of `result = lhs + rhs` at bit `bits - 1`, and
/// write it to `flag`.
///
/// `V = ((lhs ^ result) & (rhs ^ result))[bits - 1]`
pub fn add_overflow(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    lhs: Operand,
    rhs: Operand,
    result: Operand,
    bits: usize,
    flag: Register,
) {
    let overflow = add_overflow_bit(environment, block, lhs, rhs, result, bits);
    block.str(overflow, flag.byte());
}

/// The overflow bit of `result = lhs + rhs` at bit `bits - 1`, in a fresh
/// `Byte` temporary.
pub fn add_overflow_bit(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    lhs: Operand,
    rhs: Operand,
    result: Operand,
    bits: usize,
) -> Operand {
    let size = OperandSize::from_bits(bits).unwrap_or(Dword).next_larger();
    let lhs_xor = environment.next_temporary().sized(size);
    let rhs_xor = environment.next_temporary().sized(size);
    let both = environment.next_temporary().sized(size);
    let shifted = environment.next_temporary().sized(size);
    let overflow = environment.next_temporary().byte();

    block.xor(lhs, result, lhs_xor);
    block.xor(rhs, result, rhs_xor);
    block.and(lhs_xor, rhs_xor, both);
    block.bsh(both, neg_const(bits as u64 - 1, size), shifted);
    block.and(shifted, const_(1, size), overflow);
    overflow
}

/// Compute the overflow flag of `result = lhs - rhs` at bit `bits - 1`, and
/// write it to `flag`.
///
/// `V = ((lhs ^ rhs) & (lhs ^ result))[bits - 1]`
pub fn sub_overflow(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    lhs: Operand,
    rhs: Operand,
    result: Operand,
    bits: usize,
    flag: Register,
) {
    let size = OperandSize::from_bits(bits).unwrap_or(Dword).next_larger();
    let operands_xor = environment.next_temporary().sized(size);
    let result_xor = environment.next_temporary().sized(size);
    let both = environment.next_temporary().sized(size);
    let shifted = environment.next_temporary().sized(size);

    block.xor(lhs, rhs, operands_xor);
    block.xor(lhs, result, result_xor);
    block.and(operands_xor, result_xor, both);
    block.bsh(both, neg_const(bits as u64 - 1, size), shifted);
    block.and(shifted, const_(1, size), flag.byte());
}

/// Set `flag = flag | value`, for sticky flags such as `Q`.
pub fn set_sticky(block: &mut Block, flag: Register, value: Operand) {
    block.or(flag.byte(), value, flag.byte());
}

/// Clamp `value`, a signed two's complement integer at its own size, into the
/// range of a `bits` wide integer of the given signedness.
///
/// Returns the clamped value (at the size of `value`, two's complement), and
/// a `Byte` operand which is `1` when clamping took place. When `flag` is
/// given, the clamp indicator is ORed into it.
///
/// `value` must have headroom: its magnitude must stay well below the range
/// of its size, so that comparing against the bounds cannot overflow.
pub fn saturate(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
    signedness: Signedness,
    bits: usize,
    flag: Option<Register>,
) -> (Operand, Operand) {
    let size = value.size().unwrap_or(Qword);
    let (high, low) = match signedness {
        Signedness::Signed => (
            highest_positive_value(bits),
            highest_negative_value(bits, size),
        ),
        Signedness::Unsigned => (pos_bit_mask(0, bits), 0),
    };
    let sign = (size.bits() - 1) as u64;

    // above = (high - value) < 0
    let high_difference = environment.next_temporary().sized(size);
    let above_big = environment.next_temporary().sized(size);
    let above = environment.next_temporary().byte();
    block.sub(const_(high, size), value, high_difference);
    block.bsh(high_difference, neg_const(sign, size), above_big);
    block.and(above_big, const_(1, size), above);

    // below = (value - low) < 0
    let low_difference = environment.next_temporary().sized(size);
    let below_big = environment.next_temporary().sized(size);
    let below = environment.next_temporary().byte();
    block.sub(value, const_(low, size), low_difference);
    block.bsh(low_difference, neg_const(sign, size), below_big);
    block.and(below_big, const_(1, size), below);

    let saturated = environment.next_temporary().byte();
    block.or(above, below, saturated);

    // keep = saturated ? 0 : all ones
    let in_range = environment.next_temporary().byte();
    let keep_mask = environment.next_temporary().sized(size);
    let kept = environment.next_temporary().sized(size);
    block.xor(saturated, const_(1, Byte), in_range);
    block.sub(const_(0, size), in_range, keep_mask);
    block.and(value, keep_mask, kept);

    let high_part = environment.next_temporary().sized(size);
    let low_part = environment.next_temporary().sized(size);
    let partial = environment.next_temporary().sized(size);
    let result = environment.next_temporary().sized(size);
    block.mul(above, const_(high, size), high_part);
    block.mul(below, const_(low, size), low_part);
    block.or(kept, high_part, partial);
    block.or(partial, low_part, result);

    if let Some(flag) = flag {
        set_sticky(block, flag, saturated);
    }

    (result, saturated)
}

/// Saturating addition or subtraction of two `bits` wide integers.
///
/// `lhs` and `rhs` hold their values in their low `bits` bits. They are
/// extended according to `signedness`, combined at `Qword`, and the result is
/// clamped into the `bits` wide range. Returns the result masked to `bits`
/// bits, and the clamp indicator.
#[allow(clippy::too_many_arguments)]
pub fn saturating_add_sub(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    operation: AddSub,
    lhs: Operand,
    rhs: Operand,
    signedness: Signedness,
    bits: usize,
    flag: Option<Register>,
) -> (Operand, Operand) {
    let (lhs, rhs) = match signedness {
        Signedness::Signed => (
            sign_extend(environment, block, lhs, bits, Qword),
            sign_extend(environment, block, rhs, bits, Qword),
        ),
        Signedness::Unsigned => {
            let l = environment.next_temporary().qword();
            let r = environment.next_temporary().qword();
            block.and(lhs, const_(pos_bit_mask(0, bits), Qword), l);
            block.and(rhs, const_(pos_bit_mask(0, bits), Qword), r);
            (l, r)
        }
    };

    let combined = environment.next_temporary().qword();
    match operation {
        AddSub::Add => block.add(lhs, rhs, combined),
        AddSub::Sub => block.sub(lhs, rhs, combined),
    };

    let (clamped, saturated) = saturate(environment, block, combined, signedness, bits, flag);
    let result = environment.next_temporary().dword();
    block.and(clamped, const_(pos_bit_mask(0, bits), Qword), result);
    (result, saturated)
}

/// Reverse the bits of a `Dword`.
///
/// Swaps adjacent bits, bit pairs and nibbles with masks, then reverses the
/// byte order.
pub fn reverse_bits(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
) -> Operand {
    let mut current = value;
    for (mask, shift) in [(0x5555_5555u64, 1u64), (0x3333_3333, 2), (0x0f0f_0f0f, 4)] {
        current = swap_fields(environment, block, current, mask, shift);
    }
    reverse_bytes(environment, block, current)
}

// ((value >> shift) & mask) | ((value & mask) << shift)
fn swap_fields(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
    mask: u64,
    shift: u64,
) -> Operand {
    let low_shifted = environment.next_temporary().dword();
    let low = environment.next_temporary().dword();
    let high_masked = environment.next_temporary().dword();
    let high = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();

    block.bsh(value, neg_const(shift, Dword), low_shifted);
    block.and(low_shifted, const_(mask, Dword), low);
    block.and(value, const_(mask, Dword), high_masked);
    block.bsh(high_masked, const_(shift, Dword), high);
    block.or(low, high, result);
    result
}

/// Reverse the byte order of a `Dword`.
pub fn reverse_bytes(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
) -> Operand {
    let byte0 = environment.next_temporary().dword();
    let byte1_masked = environment.next_temporary().dword();
    let byte1 = environment.next_temporary().dword();
    let byte2_masked = environment.next_temporary().dword();
    let byte2 = environment.next_temporary().dword();
    let byte3 = environment.next_temporary().dword();
    let low = environment.next_temporary().dword();
    let high = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();

    block.bsh(value, const_(24, Dword), byte0);
    block.and(value, const_(0x0000_ff00, Dword), byte1_masked);
    block.bsh(byte1_masked, const_(8, Dword), byte1);
    block.and(value, const_(0x00ff_0000, Dword), byte2_masked);
    block.bsh(byte2_masked, neg_const(8, Dword), byte2);
    block.bsh(value, neg_const(24, Dword), byte3);
    block.or(byte0, byte1, low);
    block.or(byte2, byte3, high);
    block.or(low, high, result);
    result
}

/// `condition ? when_true : when_false` for a `Byte` condition which is
/// either `0` or `1`. Both alternatives and the result have `size`.
pub fn select(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    condition: Operand,
    when_true: Operand,
    when_false: Operand,
    size: OperandSize,
) -> Operand {
    let true_mask = environment.next_temporary().sized(size);
    let false_mask = environment.next_temporary().sized(size);
    let true_part = environment.next_temporary().sized(size);
    let false_part = environment.next_temporary().sized(size);
    let result = environment.next_temporary().sized(size);

    block.sub(const_(0, size), condition, true_mask);
    block.xor(true_mask, const_(size.mask(), size), false_mask);
    block.and(when_true, true_mask, true_part);
    block.and(when_false, false_mask, false_part);
    block.or(true_part, false_part, result);
    result
}

/// `negate ? -value : value` for a `Dword`, where `negate` is `0` or `1`.
pub fn conditional_negate(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
    negate: Operand,
) -> Operand {
    let mask = environment.next_temporary().dword();
    let flipped = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();
    block.sub(const_(0, Dword), negate, mask);
    block.xor(value, mask, flipped);
    block.add(flipped, negate, result);
    result
}

/// The absolute value of a signed `Dword`.
pub fn absolute_value(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
) -> Operand {
    let negative = extract_bit(environment, block, value, 31);
    conditional_negate(environment, block, value, negative)
}

/// Write `N` from bit `size.bits() - 1` of `result`.
pub fn write_negative(block: &mut Block, result: Operand, size: OperandSize) {
    block.bsh(result, neg_const(size.bits() as u64 - 1, size), Register::N.byte());
}

/// Write `Z` as `result == 0`.
pub fn write_zero(block: &mut Block, result: Operand) {
    block.bisz(result, Register::Z.byte());
}
