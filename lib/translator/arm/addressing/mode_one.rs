//! Data processing operands.
//!
//! A shifter operand is an immediate, a register, or a register shifted by an
//! immediate or by the bottom byte of another register. Every form yields a
//! value and a carry out. Forms which leave the carry unaffected return the
//! `C` flag itself as their carry.

use crate::disassembly::{ExpressionType, Instruction, Operand as NativeOperand};
use crate::error::*;
use crate::reil::*;
use crate::translator::arm::addressing::{invalid, read_register};
use crate::translator::arm::helpers::{select, sign_extend};
use crate::translator::arm::Register;
use crate::translator::TranslationEnvironment;

const MASK: u64 = 0xffff_ffff;

/// The value and carry out of a shifter operand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ShifterOperand {
    value: Operand,
    carry: Operand,
}

impl ShifterOperand {
    pub fn new(value: Operand, carry: Operand) -> ShifterOperand {
        ShifterOperand { value, carry }
    }

    /// The `Dword` value of the operand.
    pub fn value(&self) -> Operand {
        self.value
    }

    /// The `Byte` carry out of the operand.
    pub fn carry(&self) -> Operand {
        self.carry
    }

    /// Returns true if this operand leaves the carry flag as it was.
    pub fn carry_unaffected(&self) -> bool {
        self.carry.is_register(Register::C)
    }
}

/// The four shift kinds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ShiftKind {
    Lsl,
    Lsr,
    Asr,
    Ror,
}

impl ShiftKind {
    pub fn from_name(name: &str) -> Option<ShiftKind> {
        match name {
            "LSL" => Some(ShiftKind::Lsl),
            "LSR" => Some(ShiftKind::Lsr),
            "ASR" => Some(ShiftKind::Asr),
            "ROR" => Some(ShiftKind::Ror),
            _ => None,
        }
    }
}

/// Evaluate the shifter operand `operand`.
pub fn generate(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    operand: &NativeOperand,
) -> Result<ShifterOperand> {
    let node = operand.expression().ok_or_else(|| invalid(1, instruction))?;

    match node.kind() {
        ExpressionType::ImmediateInteger => Ok(ShifterOperand::new(
            const_(node.immediate_value()? as u64, Dword),
            Register::C.byte(),
        )),
        ExpressionType::Register => Ok(ShifterOperand::new(
            read_register(instruction, node)?,
            Register::C.byte(),
        )),
        ExpressionType::Operator => match (node.value(), node.children()) {
            ("ROR", [immediate, rotation]) if immediate.is_immediate() => {
                if !rotation.is_immediate() {
                    return Err(invalid(1, instruction));
                }
                Ok(rotated_immediate(
                    immediate.immediate_value()? as u64,
                    rotation.immediate_value()? as u64,
                ))
            }
            ("RRX", [register]) if register.is_register() => {
                let value = read_register(instruction, register)?;
                Ok(rrx(environment, block, value))
            }
            (shift, [register, amount]) if register.is_register() => {
                let kind = ShiftKind::from_name(shift).ok_or_else(|| invalid(1, instruction))?;
                let value = read_register(instruction, register)?;
                if amount.is_immediate() {
                    Ok(shift_immediate(
                        environment,
                        block,
                        kind,
                        value,
                        amount.immediate_value()? as u64,
                    ))
                } else if amount.is_register() {
                    let amount = read_register(instruction, amount)?;
                    Ok(shift_register(environment, block, kind, value, amount))
                } else {
                    Err(invalid(1, instruction))
                }
            }
            _ => Err(invalid(1, instruction)),
        },
        _ => Err(invalid(1, instruction)),
    }
}

/// `#imm ROR #rotation`, folded at translation time.
///
/// The carry is the `C` flag when the rotation is zero, else bit 31 of the
/// rotated immediate.
pub fn rotated_immediate(immediate: u64, rotation: u64) -> ShifterOperand {
    let value = (immediate as u32).rotate_right(rotation as u32 % 32) as u64;
    if rotation % 32 == 0 {
        ShifterOperand::new(const_(value, Dword), Register::C.byte())
    } else {
        ShifterOperand::new(const_(value, Dword), const_(value >> 31, Byte))
    }
}

/// `Rm, <shift> #amount`.
///
/// A zero amount is `Rm` itself for `LSL`, a shift by 32 for `LSR` and `ASR`,
/// and `RRX` for `ROR`.
pub fn shift_immediate(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    kind: ShiftKind,
    value: Operand,
    amount: u64,
) -> ShifterOperand {
    match kind {
        ShiftKind::Lsl => {
            if amount == 0 {
                return ShifterOperand::new(value, Register::C.byte());
            }
            let shifted = environment.next_temporary().qword();
            let result = environment.next_temporary().dword();
            let high = environment.next_temporary().qword();
            let carry = environment.next_temporary().byte();
            block.bsh(value, const_(amount, Dword), shifted);
            block.and(shifted, const_(MASK, Qword), result);
            block.bsh(shifted, neg_const(32, Qword), high);
            block.and(high, const_(1, Qword), carry);
            ShifterOperand::new(result, carry)
        }
        ShiftKind::Lsr => {
            let amount = if amount == 0 { 32 } else { amount.min(32) };
            let partial = environment.next_temporary().dword();
            let carry = environment.next_temporary().byte();
            let result = environment.next_temporary().dword();
            block.bsh(value, neg_const(amount - 1, Dword), partial);
            block.and(partial, const_(1, Dword), carry);
            block.bsh(partial, neg_const(1, Dword), result);
            ShifterOperand::new(result, carry)
        }
        ShiftKind::Asr => {
            let amount = if amount == 0 { 32 } else { amount.min(32) };
            let extended = sign_extend(environment, block, value, 32, Qword);
            let partial = environment.next_temporary().qword();
            let carry = environment.next_temporary().byte();
            let shifted = environment.next_temporary().qword();
            let result = environment.next_temporary().dword();
            block.bsh(extended, neg_const(amount - 1, Qword), partial);
            block.and(partial, const_(1, Qword), carry);
            block.bsh(partial, neg_const(1, Qword), shifted);
            block.and(shifted, const_(MASK, Qword), result);
            ShifterOperand::new(result, carry)
        }
        ShiftKind::Ror => {
            let amount = amount % 32;
            if amount == 0 {
                return rrx(environment, block, value);
            }
            let low = environment.next_temporary().dword();
            let high = environment.next_temporary().qword();
            let combined = environment.next_temporary().qword();
            let result = environment.next_temporary().dword();
            let top = environment.next_temporary().dword();
            let carry = environment.next_temporary().byte();
            block.bsh(value, neg_const(amount, Dword), low);
            block.bsh(value, const_(32 - amount, Dword), high);
            block.or(low, high, combined);
            block.and(combined, const_(MASK, Qword), result);
            block.bsh(result, neg_const(31, Dword), top);
            block.and(top, const_(1, Dword), carry);
            ShifterOperand::new(result, carry)
        }
    }
}

/// `Rm, RRX`: rotate right by one through the carry flag.
pub fn rrx(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
) -> ShifterOperand {
    let carry_in = environment.next_temporary().dword();
    let shifted = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();
    let carry = environment.next_temporary().byte();
    block.bsh(Register::C.byte(), const_(31, Dword), carry_in);
    block.bsh(value, neg_const(1, Dword), shifted);
    block.or(carry_in, shifted, result);
    block.and(value, const_(1, Dword), carry);
    ShifterOperand::new(result, carry)
}

/// `Rm, <shift> Rs`, shifting by the bottom byte of `Rs`.
///
/// A zero amount leaves both the value and the carry flag unchanged.
pub fn shift_register(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    kind: ShiftKind,
    value: Operand,
    amount: Operand,
) -> ShifterOperand {
    let amount_byte = environment.next_temporary().dword();
    let is_zero = environment.next_temporary().byte();
    block.and(amount, const_(0xff, Dword), amount_byte);
    block.bisz(amount_byte, is_zero);

    let (result, carry_out) = match kind {
        ShiftKind::Lsl => {
            let shifted = environment.next_temporary().qword();
            let result = environment.next_temporary().dword();
            let high = environment.next_temporary().qword();
            let carry = environment.next_temporary().byte();
            block.bsh(value, amount_byte, shifted);
            block.and(shifted, const_(MASK, Qword), result);
            block.bsh(shifted, neg_const(32, Qword), high);
            block.and(high, const_(1, Qword), carry);
            (result, carry)
        }
        ShiftKind::Lsr => {
            // (Rm << 1) >> amount keeps the last bit shifted out in bit 0
            let doubled = environment.next_temporary().qword();
            let negated = environment.next_temporary().qword();
            let partial = environment.next_temporary().qword();
            let carry = environment.next_temporary().byte();
            let shifted = environment.next_temporary().qword();
            let result = environment.next_temporary().dword();
            block.bsh(value, const_(1, Dword), doubled);
            block.sub(const_(0, Qword), amount_byte, negated);
            block.bsh(doubled, negated, partial);
            block.and(partial, const_(1, Qword), carry);
            block.bsh(partial, neg_const(1, Qword), shifted);
            block.and(shifted, const_(MASK, Qword), result);
            (result, carry)
        }
        ShiftKind::Asr => {
            // Amounts of 32 and above all replicate the sign bit
            let upper = environment.next_temporary().dword();
            let small = environment.next_temporary().byte();
            block.bsh(amount_byte, neg_const(5, Dword), upper);
            block.bisz(upper, small);
            let clamped = select(
                environment,
                block,
                small,
                amount_byte,
                const_(32, Dword),
                Dword,
            );

            // Shift by amount - 1 first so the carry is in bit 0
            let extended = sign_extend(environment, block, value, 32, Qword);
            let negated = environment.next_temporary().qword();
            let partial = environment.next_temporary().qword();
            let carry = environment.next_temporary().byte();
            let shifted = environment.next_temporary().qword();
            let result = environment.next_temporary().dword();
            block.sub(const_(1, Qword), clamped, negated);
            block.bsh(extended, negated, partial);
            block.and(partial, const_(1, Qword), carry);
            block.bsh(partial, neg_const(1, Qword), shifted);
            block.and(shifted, const_(MASK, Qword), result);
            (result, carry)
        }
        ShiftKind::Ror => {
            let rotation = environment.next_temporary().dword();
            let negated = environment.next_temporary().dword();
            let complement = environment.next_temporary().dword();
            let low = environment.next_temporary().dword();
            let high = environment.next_temporary().qword();
            let combined = environment.next_temporary().qword();
            let result = environment.next_temporary().dword();
            let top = environment.next_temporary().dword();
            let carry = environment.next_temporary().byte();
            block.and(amount_byte, const_(31, Dword), rotation);
            block.sub(const_(0, Dword), rotation, negated);
            block.sub(const_(32, Dword), rotation, complement);
            block.bsh(value, negated, low);
            block.bsh(value, complement, high);
            block.or(low, high, combined);
            block.and(combined, const_(MASK, Qword), result);
            block.bsh(result, neg_const(31, Dword), top);
            block.and(top, const_(1, Dword), carry);
            (result, carry)
        }
    };

    let carry = select(
        environment,
        block,
        is_zero,
        Register::C.byte(),
        carry_out,
        Byte,
    );
    ShifterOperand::new(result, carry)
}
