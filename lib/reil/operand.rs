use crate::reil::OperandSize;
use crate::translator::arm::Register;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named storage location in REIL.
///
/// Native registers and processor flags are both `Register`s. Temporaries are
/// handed out by the `TranslationEnvironment` and are only meaningful within
/// the translation of a single native instruction.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Symbol {
    Register(Register),
    Temporary(u32),
}

impl Symbol {
    /// Attach a size to this symbol, producing an operand.
    pub fn sized(self, size: OperandSize) -> Operand {
        Operand::Symbol { symbol: self, size }
    }

    pub fn byte(self) -> Operand {
        self.sized(OperandSize::Byte)
    }

    pub fn word(self) -> Operand {
        self.sized(OperandSize::Word)
    }

    pub fn dword(self) -> Operand {
        self.sized(OperandSize::Dword)
    }

    pub fn qword(self) -> Operand {
        self.sized(OperandSize::Qword)
    }

    /// Get the register behind this symbol, if it is not a temporary.
    pub fn register(&self) -> Option<Register> {
        match *self {
            Symbol::Register(register) => Some(register),
            Symbol::Temporary(_) => None,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(*self, Symbol::Temporary(_))
    }
}

impl From<Register> for Symbol {
    fn from(register: Register) -> Symbol {
        Symbol::Register(register)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Symbol::Register(register) => write!(f, "{}", register.name()),
            Symbol::Temporary(index) => write!(f, "t{}", index),
        }
    }
}

/// One operand slot of a REIL instruction.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Operand {
    /// An unused slot.
    Empty,
    /// An integer literal. The value is held masked to `size`, so negative
    /// literals are stored in two's complement at their size.
    Integer { value: u64, size: OperandSize },
    /// A register, flag or temporary of the given size.
    Symbol { symbol: Symbol, size: OperandSize },
    /// A REIL address, used as a jump target inside a single native
    /// instruction's translation.
    Address(u64),
}

impl Operand {
    /// Create an integer operand. `value` is masked to `size`.
    pub fn integer(value: u64, size: OperandSize) -> Operand {
        Operand::Integer {
            value: value & size.mask(),
            size,
        }
    }

    /// Create a negative integer operand, stored in two's complement.
    ///
    /// This is mostly used as the shift amount of `bsh`, where a negative
    /// amount shifts right.
    pub fn negative(magnitude: u64, size: OperandSize) -> Operand {
        Operand::integer(magnitude.wrapping_neg(), size)
    }

    /// Get the size of this operand. `Empty` has no size, and REIL addresses
    /// have the size of a REIL address.
    pub fn size(&self) -> Option<OperandSize> {
        match *self {
            Operand::Empty => None,
            Operand::Integer { size, .. } | Operand::Symbol { size, .. } => Some(size),
            Operand::Address(_) => Some(OperandSize::Qword),
        }
    }

    /// Get the symbol of this operand, if it is a symbol.
    pub fn symbol(&self) -> Option<Symbol> {
        match *self {
            Operand::Symbol { symbol, .. } => Some(symbol),
            _ => None,
        }
    }

    /// Get the value of this operand, if it is an integer literal.
    pub fn value(&self) -> Option<u64> {
        match *self {
            Operand::Integer { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(*self, Operand::Empty)
    }

    /// Returns true if this operand reads or writes the given register.
    pub fn is_register(&self, register: Register) -> bool {
        self.symbol() == Some(Symbol::Register(register))
    }

    /// The same operand reinterpreted at a different size. Literals are
    /// re-masked to the new size.
    pub fn resized(&self, size: OperandSize) -> Operand {
        match *self {
            Operand::Integer { value, .. } => Operand::integer(value, size),
            Operand::Symbol { symbol, .. } => Operand::Symbol { symbol, size },
            other => other,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Operand::Empty => write!(f, ""),
            Operand::Integer { value, size } => write!(f, "{} 0x{:X}", size, value),
            Operand::Symbol { symbol, size } => write!(f, "{} {}", size, symbol),
            Operand::Address(address) => {
                write!(f, "QWORD 0x{:X}.{:02X}", address >> 8, address & 0xff)
            }
        }
    }
}
