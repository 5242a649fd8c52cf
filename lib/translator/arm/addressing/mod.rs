//! ARM addressing modes.
//!
//! * Mode one: the shifter operand of data processing instructions.
//! * Mode two: word and unsigned byte loads and stores.
//! * Mode three: halfword, signed byte and doubleword loads and stores.
//! * Mode four: load and store multiple.
//!
//! Each generator reads an operand tree, emits the REIL computing its result,
//! and applies base register write-back when the tree asks for it.

use crate::disassembly::{Instruction, OperandNode};
use crate::error::*;
use crate::reil::*;
use crate::translator::arm::Register;

pub mod mode_four;
pub mod mode_one;
pub mod mode_three;
pub mod mode_two;

pub use self::mode_four::BlockMode;
pub use self::mode_one::{ShiftKind, ShifterOperand};
pub use self::mode_two::MemoryAddress;

/// The value of `PC` as read by `instruction`: the address of the
/// instruction plus 8 in ARM state, or plus 4 in Thumb state.
pub fn pc_value(instruction: &Instruction) -> u64 {
    if instruction.is_thumb() {
        (instruction.address() + 4) & 0xffff_ffff
    } else {
        (instruction.address() + 8) & 0xffff_ffff
    }
}

/// The `Dword` operand for reading the register named by `node`.
///
/// Reads of `PC` become the constant value of `PC` at this instruction.
pub fn read_register(instruction: &Instruction, node: &OperandNode) -> Result<Operand> {
    let register = Register::from_name(node.value())?;
    Ok(read(instruction, register))
}

/// The `Dword` operand for reading `register`.
pub fn read(instruction: &Instruction, register: Register) -> Operand {
    if register == Register::Pc {
        const_(pc_value(instruction), Dword)
    } else {
        register.dword()
    }
}

pub(crate) fn invalid(mode: u8, instruction: &Instruction) -> Error {
    Error::InvalidAddressingMode {
        mode,
        mnemonic: instruction.mnemonic().to_string(),
    }
}
