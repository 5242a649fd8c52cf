//! ARM to REIL lifter.
//!
//! This crate lifts decoded ARM, Thumb and Thumb-2 instructions into REIL, the
//! Reverse Engineering Intermediate Language. REIL is a flat three-address
//! language with seventeen opcodes, intended for data-flow, taint and symbolic
//! analyses over binary code.
//!
//! Lifting happens one native instruction at a time. A decoder (not part of
//! this crate) hands over an [`disassembly::Instruction`] carrying the mnemonic
//! and an operand tree for every operand. The [`translator::arm::Arm`] registry
//! selects a semantic translator for the mnemonic, and the translator appends
//! REIL instructions to a [`reil::Block`].
//!
//! ```
//! use arm_reil::disassembly::{Instruction, Operand};
//! use arm_reil::translator::arm::Arm;
//! use arm_reil::translator::{TranslationEnvironment, Translator};
//!
//! let instruction = Instruction::new(
//!     0x1000,
//!     "MOVS",
//!     vec![Operand::register("R1"), Operand::register("R2")],
//! );
//!
//! let mut environment = TranslationEnvironment::default();
//! let reil = Arm::new().translate(&mut environment, &instruction).unwrap();
//! assert_eq!(reil.len(), 3);
//! ```

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate log;

/// Return early with a `Custom` error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::Custom(format!($($arg)*)).into())
    };
}

pub mod disassembly;
pub mod error;
#[cfg(test)]
mod executor;
pub mod reil;
pub mod translator;

pub use error::*;
