use serde::{Deserialize, Serialize};
use std::fmt;

/// The width of a REIL operand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum OperandSize {
    Byte,
    Word,
    Dword,
    Qword,
}

impl OperandSize {
    /// Get the number of bits in an operand of this size.
    pub fn bits(&self) -> usize {
        match *self {
            OperandSize::Byte => 8,
            OperandSize::Word => 16,
            OperandSize::Dword => 32,
            OperandSize::Qword => 64,
        }
    }

    /// Get the number of bytes in an operand of this size.
    pub fn bytes(&self) -> usize {
        self.bits() / 8
    }

    /// A mask with every bit of this size set.
    pub fn mask(&self) -> u64 {
        match *self {
            OperandSize::Qword => u64::MAX,
            _ => (1 << self.bits()) - 1,
        }
    }

    /// A mask with only the sign bit of this size set.
    pub fn sign_bit(&self) -> u64 {
        1 << (self.bits() - 1)
    }

    /// The next larger size, used to hold carries out of arithmetic at this
    /// size. `Qword` is the largest size and is its own successor.
    pub fn next_larger(&self) -> OperandSize {
        match *self {
            OperandSize::Byte => OperandSize::Word,
            OperandSize::Word => OperandSize::Dword,
            OperandSize::Dword | OperandSize::Qword => OperandSize::Qword,
        }
    }

    /// The size holding exactly `bits` bits, if there is one.
    pub fn from_bits(bits: usize) -> Option<OperandSize> {
        match bits {
            8 => Some(OperandSize::Byte),
            16 => Some(OperandSize::Word),
            32 => Some(OperandSize::Dword),
            64 => Some(OperandSize::Qword),
            _ => None,
        }
    }
}

impl fmt::Display for OperandSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            OperandSize::Byte => write!(f, "BYTE"),
            OperandSize::Word => write!(f, "WORD"),
            OperandSize::Dword => write!(f, "DWORD"),
            OperandSize::Qword => write!(f, "QWORD"),
        }
    }
}
