//! Load and store word or unsigned byte.
//!
//! The address is a base register plus or minus an immediate, a register, or
//! a register shifted by an immediate. Offset forms leave the base alone,
//! pre-indexed forms write the address back to the base, and post-indexed
//! forms access the base address and then write back the base plus offset.

use crate::disassembly::{ExpressionType, Instruction, Operand as NativeOperand, OperandNode};
use crate::error::*;
use crate::reil::*;
use crate::translator::arm::addressing::{invalid, mode_one, pc_value, read_register};
use crate::translator::arm::helpers::AddSub;
use crate::translator::arm::Register;
use crate::translator::TranslationEnvironment;

/// The effective address of a load or store, and the base register update
/// to apply once the access has been emitted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MemoryAddress {
    address: Operand,
    base: Register,
    write_back: Option<Operand>,
}

impl MemoryAddress {
    /// The `Dword` address accessed.
    pub fn address(&self) -> Operand {
        self.address
    }

    pub fn base(&self) -> Register {
        self.base
    }

    /// The new value of the base register, for pre and post-indexed forms.
    pub fn write_back_value(&self) -> Option<Operand> {
        self.write_back
    }

    pub fn writes_back(&self) -> bool {
        self.write_back.is_some()
    }

    /// Emit the base register update, if there is one.
    pub fn write_back(&self, block: &mut Block) {
        if let Some(value) = self.write_back {
            block.str(value, self.base.dword());
        }
    }
}

/// Evaluate a mode two memory operand.
pub fn generate(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    operand: &NativeOperand,
) -> Result<MemoryAddress> {
    generate_address(environment, instruction, block, operand, 2, true)
}

/// Shared by modes two and three, which differ only in whether the offset
/// register may be shifted.
pub(crate) fn generate_address(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    operand: &NativeOperand,
    mode: u8,
    allow_shift: bool,
) -> Result<MemoryAddress> {
    let node = operand
        .expression()
        .ok_or_else(|| invalid(mode, instruction))?;

    match node.kind() {
        // [Rn] or [Rn, offset]
        ExpressionType::MemDeref => {
            let (base, address) =
                offset_address(environment, instruction, block, node, mode, allow_shift)?;
            Ok(MemoryAddress {
                address,
                base,
                write_back: None,
            })
        }
        // [Rn, offset]!
        ExpressionType::Operator if node.value() == "!" => {
            let memory = match node.children() {
                [memory] if memory.is_memory() => memory,
                _ => return Err(invalid(mode, instruction)),
            };
            let (base, address) =
                offset_address(environment, instruction, block, memory, mode, allow_shift)?;
            Ok(MemoryAddress {
                address,
                base,
                write_back: Some(address),
            })
        }
        // [Rn], offset
        ExpressionType::Operator if node.value() == "," => {
            let (memory, offset) = match node.children() {
                [memory, offset] if memory.is_memory() => (memory, offset),
                _ => return Err(invalid(mode, instruction)),
            };
            let base_node = match memory.children() {
                [base] if base.is_register() => base,
                _ => return Err(invalid(mode, instruction)),
            };
            let base = Register::from_name(base_node.value())?;
            let address = environment.next_temporary().dword();
            block.str(base_value(instruction, base), address);
            let updated = apply_offset(
                environment,
                instruction,
                block,
                address,
                offset,
                mode,
                allow_shift,
            )?;
            Ok(MemoryAddress {
                address,
                base,
                write_back: Some(updated),
            })
        }
        _ => Err(invalid(mode, instruction)),
    }
}

// The base register value. Literal loads address PC word aligned.
fn base_value(instruction: &Instruction, base: Register) -> Operand {
    if base == Register::Pc {
        const_(pc_value(instruction) & !3, Dword)
    } else {
        base.dword()
    }
}

// Evaluates MemDeref("[")(Rn) and MemDeref("[")(Operator(",")(Rn, offset)).
fn offset_address(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    memory: &OperandNode,
    mode: u8,
    allow_shift: bool,
) -> Result<(Register, Operand)> {
    match memory.children() {
        [base] if base.is_register() => {
            let base = Register::from_name(base.value())?;
            let address = environment.next_temporary().dword();
            block.str(base_value(instruction, base), address);
            Ok((base, address))
        }
        [pair] if pair.is_operator(",") => match pair.children() {
            [base, offset] if base.is_register() => {
                let base = Register::from_name(base.value())?;
                let address = apply_offset(
                    environment,
                    instruction,
                    block,
                    base_value(instruction, base),
                    offset,
                    mode,
                    allow_shift,
                )?;
                Ok((base, address))
            }
            _ => Err(invalid(mode, instruction)),
        },
        _ => Err(invalid(mode, instruction)),
    }
}

fn apply_offset(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    base: Operand,
    offset: &OperandNode,
    mode: u8,
    allow_shift: bool,
) -> Result<Operand> {
    let (offset, operation) =
        offset_value(environment, instruction, block, offset, mode, allow_shift)?;
    let address = environment.next_temporary().dword();
    match operation {
        AddSub::Add => block.add(base, offset, address),
        AddSub::Sub => block.sub(base, offset, address),
    };
    Ok(address)
}

fn offset_value(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    offset: &OperandNode,
    mode: u8,
    allow_shift: bool,
) -> Result<(Operand, AddSub)> {
    match offset.kind() {
        // Negative immediates are added in two's complement
        ExpressionType::ImmediateInteger => {
            Ok((const_(offset.immediate_value()? as u64, Dword), AddSub::Add))
        }
        ExpressionType::Register => Ok((read_register(instruction, offset)?, AddSub::Add)),
        ExpressionType::Operator => match (offset.value(), offset.children()) {
            ("-", [inner]) if !inner.is_immediate() => {
                let (value, _) =
                    offset_value(environment, instruction, block, inner, mode, allow_shift)?;
                Ok((value, AddSub::Sub))
            }
            ("RRX", [register]) if allow_shift && register.is_register() => {
                let value = read_register(instruction, register)?;
                Ok((mode_one::rrx(environment, block, value).value(), AddSub::Add))
            }
            (shift, [register, amount])
                if allow_shift && register.is_register() && amount.is_immediate() =>
            {
                let kind = mode_one::ShiftKind::from_name(shift)
                    .ok_or_else(|| invalid(mode, instruction))?;
                let value = read_register(instruction, register)?;
                let shifted = mode_one::shift_immediate(
                    environment,
                    block,
                    kind,
                    value,
                    amount.immediate_value()? as u64,
                );
                Ok((shifted.value(), AddSub::Add))
            }
            _ => Err(invalid(mode, instruction)),
        },
        _ => Err(invalid(mode, instruction)),
    }
}
