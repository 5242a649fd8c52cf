use crate::error::*;
use crate::reil::{Instruction, Opcode, Operand};

/// Number of REIL sub-addresses reserved for each native instruction.
pub const SUB_ADDRESSES: u64 = 0x100;

/// The output buffer for the translation of a single native instruction.
///
/// Instructions are only ever appended. Each emitted instruction receives the
/// next REIL address, `native_address * 0x100 + index`, so addresses within a
/// block are strictly increasing and never collide with another native
/// instruction's translation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Block {
    native_address: u64,
    instructions: Vec<Instruction>,
}

impl Block {
    /// Create an empty block for the native instruction at `native_address`.
    pub fn new(native_address: u64) -> Block {
        Block {
            native_address,
            instructions: Vec::new(),
        }
    }

    pub fn native_address(&self) -> u64 {
        self.native_address
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The REIL address of the first instruction in this block.
    pub fn base_address(&self) -> u64 {
        self.native_address * SUB_ADDRESSES
    }

    /// The REIL address the next emitted instruction will receive.
    pub fn next_address(&self) -> u64 {
        self.base_address() + self.instructions.len() as u64
    }

    /// Consume this block, returning its instructions.
    ///
    /// Errors if more instructions were emitted than there are sub-addresses
    /// for a single native instruction.
    pub fn into_instructions(self) -> Result<Vec<Instruction>> {
        if self.instructions.len() as u64 > SUB_ADDRESSES {
            return Err(Error::BlockOverflow(self.native_address));
        }
        Ok(self.instructions)
    }

    fn push(
        &mut self,
        opcode: Opcode,
        first: Operand,
        second: Operand,
        third: Operand,
    ) -> &mut Instruction {
        let address = self.next_address();
        self.instructions
            .push(Instruction::new(address, opcode, first, second, third));
        let last = self.instructions.len() - 1;
        &mut self.instructions[last]
    }

    pub fn add(&mut self, lhs: Operand, rhs: Operand, dst: Operand) -> &mut Instruction {
        self.push(Opcode::Add, lhs, rhs, dst)
    }

    pub fn and(&mut self, lhs: Operand, rhs: Operand, dst: Operand) -> &mut Instruction {
        self.push(Opcode::And, lhs, rhs, dst)
    }

    /// `dst = 1` if `src == 0`, otherwise `dst = 0`.
    pub fn bisz(&mut self, src: Operand, dst: Operand) -> &mut Instruction {
        self.push(Opcode::Bisz, src, Operand::Empty, dst)
    }

    /// Shift `src` left by `amount`, or right when `amount` is negative at its
    /// size.
    pub fn bsh(&mut self, src: Operand, amount: Operand, dst: Operand) -> &mut Instruction {
        self.push(Opcode::Bsh, src, amount, dst)
    }

    pub fn div(&mut self, lhs: Operand, rhs: Operand, dst: Operand) -> &mut Instruction {
        self.push(Opcode::Div, lhs, rhs, dst)
    }

    /// Jump to `target` when `condition` is non-zero.
    pub fn jcc(&mut self, condition: Operand, target: Operand) -> &mut Instruction {
        self.push(Opcode::Jcc, condition, Operand::Empty, target)
    }

    /// Load `dst`-sized bytes from `address` into `dst`.
    pub fn ldm(&mut self, address: Operand, dst: Operand) -> &mut Instruction {
        self.push(Opcode::Ldm, address, Operand::Empty, dst)
    }

    pub fn mod_(&mut self, lhs: Operand, rhs: Operand, dst: Operand) -> &mut Instruction {
        self.push(Opcode::Mod, lhs, rhs, dst)
    }

    pub fn mul(&mut self, lhs: Operand, rhs: Operand, dst: Operand) -> &mut Instruction {
        self.push(Opcode::Mul, lhs, rhs, dst)
    }

    pub fn nop(&mut self) -> &mut Instruction {
        self.push(Opcode::Nop, Operand::Empty, Operand::Empty, Operand::Empty)
    }

    pub fn or(&mut self, lhs: Operand, rhs: Operand, dst: Operand) -> &mut Instruction {
        self.push(Opcode::Or, lhs, rhs, dst)
    }

    /// Store `src`-sized bytes of `src` to `address`.
    pub fn stm(&mut self, src: Operand, address: Operand) -> &mut Instruction {
        self.push(Opcode::Stm, src, Operand::Empty, address)
    }

    pub fn str(&mut self, src: Operand, dst: Operand) -> &mut Instruction {
        self.push(Opcode::Str, src, Operand::Empty, dst)
    }

    pub fn sub(&mut self, lhs: Operand, rhs: Operand, dst: Operand) -> &mut Instruction {
        self.push(Opcode::Sub, lhs, rhs, dst)
    }

    /// Mark `dst` as holding an undefined value.
    pub fn undef(&mut self, dst: Operand) -> &mut Instruction {
        self.push(Opcode::Undef, Operand::Empty, Operand::Empty, dst)
    }

    /// Emit an instruction with unknown effect.
    pub fn unknown(&mut self) -> &mut Instruction {
        self.push(Opcode::Unkn, Operand::Empty, Operand::Empty, Operand::Empty)
    }

    pub fn xor(&mut self, lhs: Operand, rhs: Operand, dst: Operand) -> &mut Instruction {
        self.push(Opcode::Xor, lhs, rhs, dst)
    }
}
