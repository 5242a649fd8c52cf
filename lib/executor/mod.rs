//! Concrete execution of REIL, used to check lifted semantics in tests.

use crate::error::*;
use crate::reil::{Instruction, Opcode, Operand, OperandSize, Symbol};
use crate::translator::arm::Register;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Upper bound on executed instructions, guarding against jump loops.
const MAX_STEPS: usize = 0x10000;

/// A concrete REIL machine state: symbol values and little endian memory.
#[derive(Clone, Debug, Default)]
pub struct State {
    symbols: FxHashMap<Symbol, u64>,
    memory: BTreeMap<u64, u8>,
    branch: Option<u64>,
    unknown: bool,
}

impl State {
    pub fn new() -> State {
        State::default()
    }

    pub fn set_register(&mut self, register: Register, value: u64) {
        self.symbols
            .insert(register.symbol(), value & register.size().mask());
    }

    /// The value of a register. Registers which were never written read as
    /// zero.
    pub fn register(&self, register: Register) -> u64 {
        self.symbols
            .get(&register.symbol())
            .copied()
            .unwrap_or(0)
    }

    pub fn set_memory(&mut self, address: u64, value: u64, bytes: usize) {
        for i in 0..bytes {
            self.memory.insert(address + i as u64, (value >> (i * 8)) as u8);
        }
    }

    pub fn memory(&self, address: u64, bytes: usize) -> u64 {
        (0..bytes).fold(0, |value, i| {
            let byte = self.memory.get(&(address + i as u64)).copied().unwrap_or(0);
            value | (byte as u64) << (i * 8)
        })
    }

    /// The native address control was transferred to, if a `jcc` to a native
    /// address was taken.
    pub fn branch(&self) -> Option<u64> {
        self.branch
    }

    /// Returns true if an `unkn` instruction was executed.
    pub fn hit_unknown(&self) -> bool {
        self.unknown
    }

    /// Read an operand at its declared size.
    pub fn value(&self, operand: &Operand) -> u64 {
        match *operand {
            Operand::Empty => 0,
            Operand::Integer { value, size } => value & size.mask(),
            Operand::Symbol { symbol, size } => {
                self.symbols.get(&symbol).copied().unwrap_or(0) & size.mask()
            }
            Operand::Address(address) => address,
        }
    }

    fn write(&mut self, operand: &Operand, value: u64) -> Result<()> {
        match *operand {
            Operand::Symbol { symbol, size } => {
                self.symbols.insert(symbol, value & size.mask());
                Ok(())
            }
            _ => Err(format!("Cannot write to operand {}", operand).into()),
        }
    }

    /// Execute a translation from its first instruction until it falls off
    /// the end or jumps to a native address.
    pub fn execute(&mut self, instructions: &[Instruction]) -> Result<()> {
        let mut index = 0;
        let mut steps = 0;
        while let Some(instruction) = instructions.get(index) {
            steps += 1;
            if steps > MAX_STEPS {
                bail!("Execution did not terminate");
            }
            index += 1;
            if let Some(target) = self.step(instruction)? {
                match target {
                    Operand::Address(address) => {
                        index = instructions
                            .iter()
                            .position(|i| i.address() == address)
                            .ok_or_else(|| {
                                Error::Custom(format!("No REIL instruction at 0x{:X}", address))
                            })?;
                    }
                    other => {
                        self.branch = Some(self.value(&other));
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    // Returns the jump target when a jcc is taken.
    fn step(&mut self, instruction: &Instruction) -> Result<Option<Operand>> {
        let first = self.value(instruction.first());
        let second = self.value(instruction.second());
        let third = instruction.third();

        let result = match instruction.opcode() {
            Opcode::Add => first.wrapping_add(second),
            Opcode::And => first & second,
            Opcode::Bisz => (first == 0) as u64,
            Opcode::Bsh => {
                let size = instruction.second().size().unwrap_or(OperandSize::Qword);
                if second & size.sign_bit() != 0 {
                    let amount = second.wrapping_neg() & size.mask();
                    first.checked_shr(amount as u32).unwrap_or(0)
                } else {
                    first.checked_shl(second as u32).unwrap_or(0)
                }
            }
            Opcode::Div => {
                if second == 0 {
                    bail!("Division by zero");
                }
                first / second
            }
            Opcode::Mod => {
                if second == 0 {
                    bail!("Division by zero");
                }
                first % second
            }
            Opcode::Mul => first.wrapping_mul(second),
            Opcode::Or => first | second,
            Opcode::Sub => first.wrapping_sub(second),
            Opcode::Xor => first ^ second,
            Opcode::Str => first,
            Opcode::Ldm => {
                let bytes = third.size().map(|s| s.bytes()).unwrap_or(4);
                self.memory(first, bytes)
            }
            Opcode::Stm => {
                let bytes = instruction.first().size().map(|s| s.bytes()).unwrap_or(4);
                let address = self.value(third);
                self.set_memory(address, first, bytes);
                return Ok(None);
            }
            Opcode::Jcc => {
                return Ok(if first != 0 { Some(*third) } else { None });
            }
            Opcode::Nop => return Ok(None),
            Opcode::Undef => {
                if let Some(symbol) = third.symbol() {
                    self.symbols.remove(&symbol);
                }
                return Ok(None);
            }
            Opcode::Unkn => {
                self.unknown = true;
                return Ok(None);
            }
        };

        self.write(third, result)?;
        Ok(None)
    }
}
