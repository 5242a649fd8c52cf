use crate::error::*;
use serde::{Deserialize, Serialize};
use std::default;

/// Various options that can be passed to the translator. Options will change
/// the behavior of the translator.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Options {
    unsupported_are_unknown: bool,
    isolate_failures: bool,
}

impl Options {
    /// Create a new set of Options with the default settings.
    pub fn new() -> Options {
        Options::default()
    }

    /// Load options from a JSON document. Missing fields take their default
    /// values.
    pub fn from_json(json: &str) -> Result<Options> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the value of the, "Unsupported are unknown," option.
    pub fn set_unsupported_are_unknown(&mut self, unsupported_are_unknown: bool) {
        self.unsupported_are_unknown = unsupported_are_unknown;
    }

    /// Whether the translator should lift mnemonics it has no semantics for
    /// to a single `unkn` instruction, or throw an error.
    ///
    /// By default, unsupported mnemonics lift to `unkn`, which tells
    /// downstream analyses the effect of the instruction is not modeled.
    /// Setting this to false is useful when checking translator coverage.
    pub fn unsupported_are_unknown(&self) -> bool {
        self.unsupported_are_unknown
    }

    /// Set the value of the, "Isolate failures," option.
    pub fn set_isolate_failures(&mut self, isolate_failures: bool) {
        self.isolate_failures = isolate_failures;
    }

    /// Whether batch translation replaces an instruction which fails to
    /// translate with a single `unkn` instruction, instead of returning the
    /// error.
    pub fn isolate_failures(&self) -> bool {
        self.isolate_failures
    }
}

impl default::Default for Options {
    fn default() -> Options {
        Options {
            unsupported_are_unknown: true,
            isolate_failures: true,
        }
    }
}

/// Create your options with the builder pattern.
///
/// For more details on the options, see `translator::Options`
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    /// Create a new builder for translator options.
    pub fn new() -> OptionsBuilder {
        OptionsBuilder {
            options: Options::default(),
        }
    }

    /// Set the, "Unsupported are unknown," option. By default this is true.
    pub fn unsupported_are_unknown(mut self, unsupported_are_unknown: bool) -> OptionsBuilder {
        self.options.unsupported_are_unknown = unsupported_are_unknown;
        self
    }

    /// Set the, "Isolate failures," option. By default this is true.
    pub fn isolate_failures(mut self, isolate_failures: bool) -> OptionsBuilder {
        self.options.isolate_failures = isolate_failures;
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

impl default::Default for OptionsBuilder {
    fn default() -> OptionsBuilder {
        OptionsBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json() {
        let options = Options::from_json(r#"{ "unsupported_are_unknown": false }"#).unwrap();
        assert!(!options.unsupported_are_unknown());
        assert!(options.isolate_failures());

        let built = OptionsBuilder::new()
            .unsupported_are_unknown(false)
            .build();
        assert_eq!(options, built);
    }
}
