//! Semantics of the ARM instruction set.
//!
//! Every supported opcode family is a variant of `ArmOpcode`. The registry in
//! `translator::arm` maps mnemonics to an `OpcodeTranslator`, which pairs the
//! opcode with the mnemonic prefix it was registered under, and is run through
//! the condition wrapper.

use crate::disassembly::{Instruction, Operand as NativeOperand};
use crate::error::*;
use crate::reil::*;
use crate::translator::arm::addressing::{mode_one::ShiftKind, read_register};
use crate::translator::arm::helpers::{write_negative, write_zero, Signedness};
use crate::translator::arm::{InstructionTranslator, Mnemonic, Register};
use crate::translator::TranslationEnvironment;

pub mod bitfield;
pub mod branch;
pub mod data;
pub mod memory;
pub mod misc;
pub mod multiply;
pub mod parallel;
pub mod saturate;

pub use self::parallel::{LaneOperation, ParallelKind};

/// The opcode families with translators.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ArmOpcode {
    // Data processing
    Adc,
    Add,
    Adr,
    And,
    Bic,
    Cmn,
    Cmp,
    Eor,
    Mov,
    Movw,
    Mvn,
    Neg,
    Orn,
    Orr,
    Rrx,
    Rsb,
    Rsc,
    Sbc,
    Shift(ShiftKind),
    Sub,
    Teq,
    Tst,
    // Multiply and divide
    Mla,
    Mls,
    Mul,
    Sdiv,
    Smlal,
    Smlalxy { top_n: bool, top_m: bool },
    Smlaw { top: bool },
    Smlaxy { top_n: bool, top_m: bool },
    Smmla { subtract: bool, round: bool },
    Smmul { round: bool },
    /// `SMUAD`, `SMUSD`, `SMLAD` and `SMLSD`
    DualMultiply {
        subtract: bool,
        exchange: bool,
        accumulate: bool,
    },
    /// `SMLALD` and `SMLSLD`
    DualMultiplyLong { subtract: bool, exchange: bool },
    Smull,
    Smulw { top: bool },
    Smulxy { top_n: bool, top_m: bool },
    Udiv,
    Umaal,
    Umlal,
    Umull,
    // Parallel add and subtract
    Parallel(ParallelKind, LaneOperation),
    Sel,
    Usad8,
    Usada8,
    // Saturation
    Qadd,
    Qdadd,
    Qdsub,
    Qsub,
    Ssat,
    Ssat16,
    Usat,
    Usat16,
    // Branches
    B,
    Bl,
    Blx,
    Bx,
    Cbnz,
    Cbz,
    Tbb,
    Tbh,
    // Loads and stores
    Ldm,
    Ldr,
    Ldrex,
    Pop,
    Push,
    Stm,
    Str,
    Strex,
    Swp,
    // Bitfields
    Bfc,
    Bfi,
    Movt,
    Sbfx,
    Ubfx,
    // Miscellaneous
    Clz,
    Extend {
        signedness: Signedness,
        bits: usize,
        accumulate: bool,
    },
    /// `SXTB16`, `UXTB16`, `SXTAB16` and `UXTAB16`
    Extend16 {
        signedness: Signedness,
        accumulate: bool,
    },
    Mrs,
    Msr,
    Nop,
    Pkh { top: bool },
    Rbit,
    Rev,
    Rev16,
    Revsh,
    /// Opcodes whose effects are not modeled, such as `BKPT` and `BXJ`.
    Unknown,
}

impl ArmOpcode {
    /// Emit the unconditional semantics of this opcode.
    pub fn translate_core(
        &self,
        environment: &mut TranslationEnvironment,
        instruction: &Instruction,
        mnemonic: &Mnemonic,
        block: &mut Block,
    ) -> Result<()> {
        let e = environment;
        let i = instruction;
        let m = mnemonic;
        let b = block;
        match *self {
            ArmOpcode::Adc => data::adc(e, i, m, b),
            ArmOpcode::Add => data::add(e, i, m, b),
            ArmOpcode::Adr => data::adr(e, i, m, b),
            ArmOpcode::And => data::and(e, i, m, b),
            ArmOpcode::Bic => data::bic(e, i, m, b),
            ArmOpcode::Cmn => data::cmn(e, i, m, b),
            ArmOpcode::Cmp => data::cmp(e, i, m, b),
            ArmOpcode::Eor => data::eor(e, i, m, b),
            ArmOpcode::Mov => data::mov(e, i, m, b),
            ArmOpcode::Movw => data::movw(e, i, m, b),
            ArmOpcode::Mvn => data::mvn(e, i, m, b),
            ArmOpcode::Neg => data::neg(e, i, m, b),
            ArmOpcode::Orn => data::orn(e, i, m, b),
            ArmOpcode::Orr => data::orr(e, i, m, b),
            ArmOpcode::Rrx => data::rrx(e, i, m, b),
            ArmOpcode::Rsb => data::rsb(e, i, m, b),
            ArmOpcode::Rsc => data::rsc(e, i, m, b),
            ArmOpcode::Sbc => data::sbc(e, i, m, b),
            ArmOpcode::Shift(kind) => data::shift(e, i, m, b, kind),
            ArmOpcode::Sub => data::sub(e, i, m, b),
            ArmOpcode::Teq => data::teq(e, i, m, b),
            ArmOpcode::Tst => data::tst(e, i, m, b),

            ArmOpcode::Mla => multiply::mla(e, i, m, b),
            ArmOpcode::Mls => multiply::mls(e, i, m, b),
            ArmOpcode::Mul => multiply::mul(e, i, m, b),
            ArmOpcode::Sdiv => multiply::sdiv(e, i, m, b),
            ArmOpcode::Smlal => multiply::smlal(e, i, m, b),
            ArmOpcode::Smlalxy { top_n, top_m } => multiply::smlalxy(e, i, m, b, top_n, top_m),
            ArmOpcode::Smlaw { top } => multiply::smlaw(e, i, m, b, top),
            ArmOpcode::Smlaxy { top_n, top_m } => multiply::smlaxy(e, i, m, b, top_n, top_m),
            ArmOpcode::Smmla { subtract, round } => multiply::smmla(e, i, m, b, subtract, round),
            ArmOpcode::Smmul { round } => multiply::smmul(e, i, m, b, round),
            ArmOpcode::DualMultiply {
                subtract,
                exchange,
                accumulate,
            } => multiply::dual_multiply(e, i, m, b, subtract, exchange, accumulate),
            ArmOpcode::DualMultiplyLong { subtract, exchange } => {
                multiply::dual_multiply_long(e, i, m, b, subtract, exchange)
            }
            ArmOpcode::Smull => multiply::smull(e, i, m, b),
            ArmOpcode::Smulw { top } => multiply::smulw(e, i, m, b, top),
            ArmOpcode::Smulxy { top_n, top_m } => multiply::smulxy(e, i, m, b, top_n, top_m),
            ArmOpcode::Udiv => multiply::udiv(e, i, m, b),
            ArmOpcode::Umaal => multiply::umaal(e, i, m, b),
            ArmOpcode::Umlal => multiply::umlal(e, i, m, b),
            ArmOpcode::Umull => multiply::umull(e, i, m, b),

            ArmOpcode::Parallel(kind, operation) => parallel::parallel(e, i, m, b, kind, operation),
            ArmOpcode::Sel => parallel::sel(e, i, m, b),
            ArmOpcode::Usad8 => parallel::usad8(e, i, m, b, false),
            ArmOpcode::Usada8 => parallel::usad8(e, i, m, b, true),

            ArmOpcode::Qadd => saturate::qadd(e, i, m, b, false),
            ArmOpcode::Qdadd => saturate::qadd(e, i, m, b, true),
            ArmOpcode::Qdsub => saturate::qsub(e, i, m, b, true),
            ArmOpcode::Qsub => saturate::qsub(e, i, m, b, false),
            ArmOpcode::Ssat => saturate::ssat(e, i, m, b),
            ArmOpcode::Ssat16 => saturate::ssat16(e, i, m, b),
            ArmOpcode::Usat => saturate::usat(e, i, m, b),
            ArmOpcode::Usat16 => saturate::usat16(e, i, m, b),

            ArmOpcode::B => branch::b(e, i, m, b),
            ArmOpcode::Bl => branch::bl(e, i, m, b),
            ArmOpcode::Blx => branch::blx(e, i, m, b),
            ArmOpcode::Bx => branch::bx(e, i, m, b),
            ArmOpcode::Cbnz => branch::cbz(e, i, m, b, true),
            ArmOpcode::Cbz => branch::cbz(e, i, m, b, false),
            ArmOpcode::Tbb => branch::table_branch(e, i, m, b, Byte),
            ArmOpcode::Tbh => branch::table_branch(e, i, m, b, Word),

            ArmOpcode::Ldm => memory::ldm(e, i, m, b),
            ArmOpcode::Ldr => memory::ldr(e, i, m, b),
            ArmOpcode::Ldrex => memory::ldrex(e, i, m, b),
            ArmOpcode::Pop => memory::pop(e, i, m, b),
            ArmOpcode::Push => memory::push(e, i, m, b),
            ArmOpcode::Stm => memory::stm(e, i, m, b),
            ArmOpcode::Str => memory::str(e, i, m, b),
            ArmOpcode::Strex => memory::strex(e, i, m, b),
            ArmOpcode::Swp => memory::swp(e, i, m, b),

            ArmOpcode::Bfc => bitfield::bfc(e, i, m, b),
            ArmOpcode::Bfi => bitfield::bfi(e, i, m, b),
            ArmOpcode::Movt => bitfield::movt(e, i, m, b),
            ArmOpcode::Sbfx => bitfield::extract(e, i, m, b, Signedness::Signed),
            ArmOpcode::Ubfx => bitfield::extract(e, i, m, b, Signedness::Unsigned),

            ArmOpcode::Clz => misc::clz(e, i, m, b),
            ArmOpcode::Extend {
                signedness,
                bits,
                accumulate,
            } => misc::extend(e, i, m, b, signedness, bits, accumulate),
            ArmOpcode::Extend16 {
                signedness,
                accumulate,
            } => misc::extend16(e, i, m, b, signedness, accumulate),
            ArmOpcode::Mrs => misc::mrs(e, i, m, b),
            ArmOpcode::Msr => misc::msr(e, i, m, b),
            ArmOpcode::Nop => misc::nop(b),
            ArmOpcode::Pkh { top } => misc::pkh(e, i, m, b, top),
            ArmOpcode::Rbit => misc::rbit(e, i, m, b),
            ArmOpcode::Rev => misc::rev(e, i, m, b),
            ArmOpcode::Rev16 => misc::rev16(e, i, m, b),
            ArmOpcode::Revsh => misc::revsh(e, i, m, b),
            ArmOpcode::Unknown => misc::unknown(i, b),
        }
    }
}

/// An opcode together with the mnemonic prefix it was registered under.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OpcodeTranslator {
    opcode: ArmOpcode,
    prefix: String,
    implicit_flags: bool,
}

impl OpcodeTranslator {
    pub fn new<S: Into<String>>(opcode: ArmOpcode, prefix: S) -> OpcodeTranslator {
        OpcodeTranslator {
            opcode,
            prefix: prefix.into(),
            implicit_flags: false,
        }
    }

    /// For 16-bit Thumb encodings which set the flags without an `S` suffix.
    pub fn with_implicit_flags(mut self) -> OpcodeTranslator {
        self.implicit_flags = true;
        self
    }

    pub fn opcode(&self) -> ArmOpcode {
        self.opcode
    }
}

impl InstructionTranslator for OpcodeTranslator {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn implicit_flags(&self) -> bool {
        self.implicit_flags
    }

    fn translate_core(
        &self,
        environment: &mut TranslationEnvironment,
        instruction: &Instruction,
        mnemonic: &Mnemonic,
        block: &mut Block,
    ) -> Result<()> {
        self.opcode
            .translate_core(environment, instruction, mnemonic, block)
    }
}

/// Errors unless `instruction` has one of the `expected` operand counts.
pub(crate) fn expect_operands(instruction: &Instruction, expected: &[usize]) -> Result<()> {
    let actual = instruction.operands().len();
    if expected.contains(&actual) {
        Ok(())
    } else {
        Err(Error::OperandCount {
            mnemonic: instruction.mnemonic().to_string(),
            expected: expected.to_vec(),
            actual,
        })
    }
}

pub(crate) fn operand(instruction: &Instruction, index: usize) -> Result<&NativeOperand> {
    instruction.operand(index).ok_or_else(|| Error::OperandCount {
        mnemonic: instruction.mnemonic().to_string(),
        expected: vec![index + 1],
        actual: instruction.operands().len(),
    })
}

pub(crate) fn invalid_operand<S: Into<String>>(instruction: &Instruction, reason: S) -> Error {
    Error::InvalidOperand {
        mnemonic: instruction.mnemonic().to_string(),
        reason: reason.into(),
    }
}

/// The register named by the operand at `index`.
pub(crate) fn register(instruction: &Instruction, index: usize) -> Result<Register> {
    let operand = operand(instruction, index)?;
    match operand.expression() {
        Some(node) if node.is_register() => Register::from_name(node.value()),
        // Rn! in block transfers
        Some(node) if node.is_operator("!") => match node.children() {
            [register] if register.is_register() => Register::from_name(register.value()),
            _ => Err(invalid_operand(instruction, format!("expected a register, got {}", operand))),
        },
        _ => Err(invalid_operand(
            instruction,
            format!("expected a register, got {}", operand),
        )),
    }
}

/// The value of the register operand at `index`, with `PC` read as a
/// constant.
pub(crate) fn source(instruction: &Instruction, index: usize) -> Result<Operand> {
    let operand = operand(instruction, index)?;
    match operand.expression() {
        Some(node) if node.is_register() => read_register(instruction, node),
        _ => Err(invalid_operand(
            instruction,
            format!("expected a register, got {}", operand),
        )),
    }
}

/// The value of the immediate operand at `index`.
pub(crate) fn immediate(instruction: &Instruction, index: usize) -> Result<i64> {
    let operand = operand(instruction, index)?;
    match operand.expression() {
        Some(node) if node.is_immediate() => node.immediate_value(),
        _ => Err(invalid_operand(
            instruction,
            format!("expected an immediate, got {}", operand),
        )),
    }
}

/// The value of a register or immediate operand at `index`.
pub(crate) fn register_or_immediate(instruction: &Instruction, index: usize) -> Result<Operand> {
    let operand = operand(instruction, index)?;
    match operand.expression() {
        Some(node) if node.is_register() => read_register(instruction, node),
        Some(node) if node.is_immediate() => Ok(const_(node.immediate_value()? as u64, Dword)),
        _ => Err(invalid_operand(
            instruction,
            format!("expected a register or immediate, got {}", operand),
        )),
    }
}

/// Write `value` to `register`. A write to `PC` is a jump to the written
/// value.
pub(crate) fn write_register(block: &mut Block, register: Register, value: Operand) {
    block.str(value, register.dword());
    if register == Register::Pc {
        block
            .jcc(const_(1, Byte), Register::Pc.dword())
            .set_call(false);
    }
}

/// Write `N` and `Z` for a `Dword` result.
pub(crate) fn write_nz(block: &mut Block, result: Operand) {
    write_negative(block, result, result.size().unwrap_or(Dword));
    write_zero(block, result);
}

/// Write `C`, unless `carry` is the carry flag itself.
pub(crate) fn write_carry(block: &mut Block, carry: Operand) {
    if !carry.is_register(Register::C) {
        block.str(carry, Register::C.byte());
    }
}

/// Translate an encoding the architecture leaves unpredictable.
pub(crate) fn unpredictable(instruction: &Instruction, block: &mut Block, reason: &str) -> Result<()> {
    debug!(
        "{} at 0x{:X} is unpredictable ({}), emitting unkn",
        instruction.mnemonic(),
        instruction.address(),
        reason
    );
    block.unknown();
    Ok(())
}
