//! Translators from native instructions to REIL.
//!
//! Translators lift one decoded native instruction at a time. Each
//! translation receives a fresh `TranslationEnvironment`, which hands out
//! temporaries, and appends REIL instructions to a `reil::Block` owned by the
//! call. Translations of different instructions share no state, and may be
//! run in parallel.
//!
//! A translation which fails leaves nothing behind: the error is returned to
//! the caller, who decides whether to skip the instruction, substitute a
//! placeholder, or abort. `Translator::translate_batch` substitutes a single
//! `unkn` instruction when `Options::isolate_failures` is set.

use crate::disassembly::Instruction;
use crate::error::*;
use crate::reil;

pub mod arm;
mod environment;
mod options;

pub use self::environment::*;
pub use self::options::*;

/// This trait is used to lift native instructions to REIL.
pub trait Translator {
    /// Translates a single instruction.
    fn translate(
        &self,
        environment: &mut TranslationEnvironment,
        instruction: &Instruction,
    ) -> Result<Vec<reil::Instruction>>;

    /// Translates a sequence of instructions, concatenating their REIL.
    ///
    /// Every instruction receives its own `TranslationEnvironment`.
    fn translate_batch(
        &self,
        options: &Options,
        instructions: &[Instruction],
    ) -> Result<Vec<reil::Instruction>> {
        let mut reil_instructions = Vec::new();
        for instruction in instructions {
            let mut environment = TranslationEnvironment::new(options.clone());
            match self.translate(&mut environment, instruction) {
                Ok(mut translated) => reil_instructions.append(&mut translated),
                Err(error) => {
                    if !options.isolate_failures() {
                        return Err(error);
                    }
                    warn!(
                        "Failed to translate {}: {}, substituting unkn",
                        instruction, error
                    );
                    let mut block = reil::Block::new(instruction.address());
                    block.unknown();
                    reil_instructions.append(&mut block.into_instructions()?);
                }
            }
        }
        Ok(reil_instructions)
    }
}
