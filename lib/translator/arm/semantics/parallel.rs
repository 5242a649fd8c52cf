//! Parallel add and subtract over packed halfwords and bytes.
//!
//! Lane `k` of a register holds bits `[k * width, (k + 1) * width)`. Every
//! lane is computed from zero or sign extended inputs at `Dword`, which leaves
//! room above the lane for carries and signs, and is then reassembled at its
//! own bit position.

use super::*;
use crate::translator::arm::helpers::{
    absolute_value, extract_bit, extract_field, pos_bit_mask, saturating_add_sub, sign_extend,
    AddSub,
};
use std::fmt;

/// How lane results are formed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ParallelKind {
    /// `S`: signed, modular, sets `GE`.
    Signed,
    /// `U`: unsigned, modular, sets `GE`.
    Unsigned,
    /// `Q`: signed saturating.
    Saturating,
    /// `UQ`: unsigned saturating.
    UnsignedSaturating,
    /// `SH`: signed, halved.
    SignedHalving,
    /// `UH`: unsigned, halved.
    UnsignedHalving,
}

impl ParallelKind {
    pub const ALL: [ParallelKind; 6] = [
        ParallelKind::Signed,
        ParallelKind::Unsigned,
        ParallelKind::Saturating,
        ParallelKind::UnsignedSaturating,
        ParallelKind::SignedHalving,
        ParallelKind::UnsignedHalving,
    ];

    /// The mnemonic prefix of this kind.
    pub fn prefix(&self) -> &'static str {
        match *self {
            ParallelKind::Signed => "S",
            ParallelKind::Unsigned => "U",
            ParallelKind::Saturating => "Q",
            ParallelKind::UnsignedSaturating => "UQ",
            ParallelKind::SignedHalving => "SH",
            ParallelKind::UnsignedHalving => "UH",
        }
    }

    fn signedness(&self) -> Signedness {
        match *self {
            ParallelKind::Signed | ParallelKind::Saturating | ParallelKind::SignedHalving => {
                Signedness::Signed
            }
            _ => Signedness::Unsigned,
        }
    }
}

/// The per-lane operations of a parallel instruction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LaneOperation {
    Add16,
    Sub16,
    Add8,
    Sub8,
    /// Exchange, subtract in the bottom halfword, add in the top.
    Asx,
    /// Exchange, add in the bottom halfword, subtract in the top.
    Sax,
}

impl LaneOperation {
    pub const ALL: [LaneOperation; 6] = [
        LaneOperation::Add16,
        LaneOperation::Sub16,
        LaneOperation::Add8,
        LaneOperation::Sub8,
        LaneOperation::Asx,
        LaneOperation::Sax,
    ];

    /// The UAL mnemonic stem, without the kind prefix.
    pub fn name(&self) -> &'static str {
        match *self {
            LaneOperation::Add16 => "ADD16",
            LaneOperation::Sub16 => "SUB16",
            LaneOperation::Add8 => "ADD8",
            LaneOperation::Sub8 => "SUB8",
            LaneOperation::Asx => "ASX",
            LaneOperation::Sax => "SAX",
        }
    }

    /// The pre-UAL stem, for the two exchanging operations.
    pub fn legacy_name(&self) -> Option<&'static str> {
        match *self {
            LaneOperation::Asx => Some("ADDSUBX"),
            LaneOperation::Sax => Some("SUBADDX"),
            _ => None,
        }
    }

    pub fn lane_width(&self) -> usize {
        match *self {
            LaneOperation::Add8 | LaneOperation::Sub8 => 8,
            _ => 16,
        }
    }

    // (operation, lane of Rm) for every lane of the result
    fn lanes(&self) -> Vec<(AddSub, usize)> {
        match *self {
            LaneOperation::Add16 => vec![(AddSub::Add, 0), (AddSub::Add, 1)],
            LaneOperation::Sub16 => vec![(AddSub::Sub, 0), (AddSub::Sub, 1)],
            LaneOperation::Add8 => (0..4).map(|lane| (AddSub::Add, lane)).collect(),
            LaneOperation::Sub8 => (0..4).map(|lane| (AddSub::Sub, lane)).collect(),
            LaneOperation::Asx => vec![(AddSub::Sub, 1), (AddSub::Add, 0)],
            LaneOperation::Sax => vec![(AddSub::Add, 1), (AddSub::Sub, 0)],
        }
    }
}

impl fmt::Display for LaneOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn lane(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    value: Operand,
    index: usize,
    width: usize,
    signedness: Signedness,
) -> Operand {
    let field = extract_field(environment, block, value, index * width, width, Dword);
    match signedness {
        Signedness::Signed => sign_extend(environment, block, field, width, Dword),
        Signedness::Unsigned => field,
    }
}

fn combine(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    operation: AddSub,
    lhs: Operand,
    rhs: Operand,
) -> Operand {
    let result = environment.next_temporary().dword();
    match operation {
        AddSub::Add => block.add(lhs, rhs, result),
        AddSub::Sub => block.sub(lhs, rhs, result),
    };
    result
}

// Write the GE bits covering result lane `index`.
fn write_ge(block: &mut Block, index: usize, width: usize, value: Operand) {
    let bits = width / 8;
    for bit in index * bits..(index + 1) * bits {
        block.str(value, Register::ge(bit).byte());
    }
}

// GE for a modular lane: the unsigned sum carried out, or the result of a
// signed sum or any difference is not negative.
fn greater_or_equal(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    kind: ParallelKind,
    operation: AddSub,
    combined: Operand,
    width: usize,
) -> Operand {
    if kind == ParallelKind::Unsigned && operation == AddSub::Add {
        extract_bit(environment, block, combined, width)
    } else {
        let negative = extract_bit(environment, block, combined, 31);
        let result = environment.next_temporary().byte();
        block.bisz(negative, result);
        result
    }
}

// The result of one lane at the low `width` bits of a `Dword`.
#[allow(clippy::too_many_arguments)]
fn lane_result(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    kind: ParallelKind,
    operation: AddSub,
    rn: Operand,
    rm: Operand,
    n_lane: usize,
    m_lane: usize,
    width: usize,
) -> Operand {
    let mask = const_(pos_bit_mask(0, width), Dword);
    match kind {
        ParallelKind::Saturating | ParallelKind::UnsignedSaturating => {
            let n = extract_field(environment, block, rn, n_lane * width, width, Dword);
            let m = extract_field(environment, block, rm, m_lane * width, width, Dword);
            let (result, _) = saturating_add_sub(
                environment,
                block,
                operation,
                n,
                m,
                kind.signedness(),
                width,
                Some(Register::Q),
            );
            result
        }
        ParallelKind::SignedHalving | ParallelKind::UnsignedHalving => {
            let n = lane(environment, block, rn, n_lane, width, kind.signedness());
            let m = lane(environment, block, rm, m_lane, width, kind.signedness());
            let combined = combine(environment, block, operation, n, m);
            let halved = environment.next_temporary().dword();
            let result = environment.next_temporary().dword();
            block.bsh(combined, neg_const(1, Dword), halved);
            block.and(halved, mask, result);
            result
        }
        ParallelKind::Signed | ParallelKind::Unsigned => {
            let n = lane(environment, block, rn, n_lane, width, kind.signedness());
            let m = lane(environment, block, rm, m_lane, width, kind.signedness());
            let combined = combine(environment, block, operation, n, m);
            let ge = greater_or_equal(environment, block, kind, operation, combined, width);
            write_ge(block, n_lane, width, ge);
            let result = environment.next_temporary().dword();
            block.and(combined, mask, result);
            result
        }
    }
}

/// The parallel instructions, `<kind><operation> Rd, Rn, Rm`.
pub fn parallel(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    kind: ParallelKind,
    operation: LaneOperation,
) -> Result<()> {
    expect_operands(instruction, &[3])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let rm = source(instruction, 2)?;
    let width = operation.lane_width();

    let mut result = const_(0, Dword);
    for (index, (lane_operation, m_lane)) in operation.lanes().into_iter().enumerate() {
        let value = lane_result(
            environment,
            block,
            kind,
            lane_operation,
            rn,
            rm,
            index,
            m_lane,
            width,
        );
        let positioned = if index == 0 {
            value
        } else {
            let shifted = environment.next_temporary().dword();
            block.bsh(value, const_((index * width) as u64, Dword), shifted);
            shifted
        };
        let merged = environment.next_temporary().dword();
        block.or(result, positioned, merged);
        result = merged;
    }

    write_register(block, rd, result);
    Ok(())
}

/// `SEL Rd, Rn, Rm`: byte `k` of `Rn` where `GE[k]` is set, else byte `k`
/// of `Rm`.
pub fn sel(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[3])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let rm = source(instruction, 2)?;

    let mut mask = const_(0, Dword);
    for byte in 0..4 {
        let part = environment.next_temporary().dword();
        let merged = environment.next_temporary().dword();
        block.mul(
            Register::ge(byte).byte(),
            const_(0xff << (byte * 8), Dword),
            part,
        );
        block.or(mask, part, merged);
        mask = merged;
    }

    let inverted = environment.next_temporary().dword();
    let from_n = environment.next_temporary().dword();
    let from_m = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();
    block.xor(mask, const_(0xffff_ffff, Dword), inverted);
    block.and(rn, mask, from_n);
    block.and(rm, inverted, from_m);
    block.or(from_n, from_m, result);
    write_register(block, rd, result);
    Ok(())
}

/// `USAD8 Rd, Rn, Rm` and `USADA8 Rd, Rn, Rm, Ra`: the sum of the absolute
/// differences of the unsigned bytes, plus `Ra` when accumulating.
pub fn usad8(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    accumulate: bool,
) -> Result<()> {
    expect_operands(instruction, if accumulate { &[4] } else { &[3] })?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let rm = source(instruction, 2)?;

    let mut sum = if accumulate {
        source(instruction, 3)?
    } else {
        const_(0, Dword)
    };
    for byte in 0..4 {
        let n = lane(environment, block, rn, byte, 8, Signedness::Unsigned);
        let m = lane(environment, block, rm, byte, 8, Signedness::Unsigned);
        let difference = combine(environment, block, AddSub::Sub, n, m);
        let absolute = absolute_value(environment, block, difference);
        let total = environment.next_temporary().dword();
        block.add(sum, absolute, total);
        sum = total;
    }

    write_register(block, rd, sum);
    Ok(())
}
