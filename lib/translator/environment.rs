use crate::reil::{OperandSize, Symbol};
use crate::translator::Options;

/// Mutable state for the translation of one native instruction.
///
/// The environment hands out fresh temporaries, and carries the translator
/// options. An environment must not be shared between concurrent
/// translations.
#[derive(Clone, Debug, Default)]
pub struct TranslationEnvironment {
    next_temporary: u32,
    options: Options,
}

impl TranslationEnvironment {
    pub fn new(options: Options) -> TranslationEnvironment {
        TranslationEnvironment {
            next_temporary: 0,
            options,
        }
    }

    /// Get a temporary which has not been handed out by this environment
    /// before.
    pub fn next_temporary(&mut self) -> Symbol {
        let temporary = Symbol::Temporary(self.next_temporary);
        self.next_temporary += 1;
        temporary
    }

    /// The number of temporaries handed out so far.
    pub fn temporaries(&self) -> u32 {
        self.next_temporary
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The width of a native register.
    pub fn register_size(&self) -> OperandSize {
        OperandSize::Dword
    }
}
