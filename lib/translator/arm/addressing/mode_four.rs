//! Load and store multiple.
//!
//! Registers are transferred in ascending register order to ascending
//! addresses starting at `start`, four bytes apart. The mode decides where
//! the block lies relative to the base register.

use crate::disassembly::{ExpressionType, Instruction, Operand as NativeOperand};
use crate::error::*;
use crate::reil::*;
use crate::translator::arm::addressing::{invalid, read};
use crate::translator::arm::Register;
use crate::translator::TranslationEnvironment;

/// A block transfer addressing mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockMode {
    IncrementAfter,
    IncrementBefore,
    DecrementAfter,
    DecrementBefore,
}

impl BlockMode {
    /// Parse the suffix of an `LDM` or `STM` mnemonic. The stack suffixes
    /// `FD`, `FA`, `ED` and `EA` mean different modes for loads and stores.
    /// No suffix means increment after.
    pub fn from_suffix(suffix: &str, load: bool) -> Option<BlockMode> {
        Some(match (suffix, load) {
            ("" | "IA", _) => BlockMode::IncrementAfter,
            ("IB", _) => BlockMode::IncrementBefore,
            ("DA", _) => BlockMode::DecrementAfter,
            ("DB", _) => BlockMode::DecrementBefore,
            ("FD", true) | ("EA", false) => BlockMode::IncrementAfter,
            ("ED", true) | ("FA", false) => BlockMode::IncrementBefore,
            ("FA", true) | ("ED", false) => BlockMode::DecrementAfter,
            ("EA", true) | ("FD", false) => BlockMode::DecrementBefore,
            _ => return None,
        })
    }

    fn is_increment(&self) -> bool {
        matches!(
            self,
            BlockMode::IncrementAfter | BlockMode::IncrementBefore
        )
    }
}

/// The addresses of a block transfer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlockTransfer {
    start: Operand,
    base: Register,
    write_back: Option<Operand>,
}

impl BlockTransfer {
    /// The lowest address accessed.
    pub fn start(&self) -> Operand {
        self.start
    }

    pub fn base(&self) -> Register {
        self.base
    }

    pub fn writes_back(&self) -> bool {
        self.write_back.is_some()
    }

    /// Emit the base register update, if the base operand asked for one.
    pub fn write_back(&self, block: &mut Block) {
        if let Some(value) = self.write_back {
            block.str(value, self.base.dword());
        }
    }
}

/// Compute the start address of a transfer of `count` registers based at
/// `operand`, which is `Rn` or `Rn!`.
pub fn generate(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    operand: &NativeOperand,
    mode: BlockMode,
    count: usize,
) -> Result<BlockTransfer> {
    let node = operand
        .expression()
        .ok_or_else(|| invalid(4, instruction))?;

    let (base, write_back) = match (node.kind(), node.children()) {
        (ExpressionType::Register, _) => (Register::from_name(node.value())?, false),
        (ExpressionType::Operator, [register]) if node.value() == "!" && register.is_register() => {
            (Register::from_name(register.value())?, true)
        }
        _ => return Err(invalid(4, instruction)),
    };

    let length = 4 * count as u64;
    let base_value = read(instruction, base);
    let start = environment.next_temporary().dword();
    match mode {
        BlockMode::IncrementAfter => block.str(base_value, start),
        BlockMode::IncrementBefore => block.add(base_value, const_(4, Dword), start),
        BlockMode::DecrementAfter => {
            block.sub(base_value, const_(length.wrapping_sub(4), Dword), start)
        }
        BlockMode::DecrementBefore => block.sub(base_value, const_(length, Dword), start),
    };

    let write_back = if write_back {
        let updated = environment.next_temporary().dword();
        if mode.is_increment() {
            block.add(base_value, const_(length, Dword), updated);
        } else {
            block.sub(base_value, const_(length, Dword), updated);
        }
        Some(updated)
    } else {
        None
    };

    Ok(BlockTransfer {
        start,
        base,
        write_back,
    })
}

/// The registers of a register list operand `{Ra, Rb, ...}`, in ascending
/// register order.
pub fn register_list(instruction: &Instruction, operand: &NativeOperand) -> Result<Vec<Register>> {
    let node = operand
        .expression()
        .filter(|node| node.kind() == ExpressionType::ExpressionList)
        .ok_or_else(|| invalid(4, instruction))?;

    let mut registers = node
        .children()
        .iter()
        .map(|child| {
            if child.is_register() {
                Register::from_name(child.value())
            } else {
                Err(invalid(4, instruction))
            }
        })
        .collect::<Result<Vec<Register>>>()?;
    registers.sort();
    registers.dedup();
    if registers.is_empty() {
        return Err(invalid(4, instruction));
    }
    Ok(registers)
}
