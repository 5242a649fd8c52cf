//! Error types for lifting.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Translator for `{expected}` was handed `{actual}`")]
    MnemonicMismatch { expected: String, actual: String },
    #[error("`{mnemonic}` expects {} operands, got {actual}", operand_counts(.expected))]
    OperandCount {
        mnemonic: String,
        expected: Vec<usize>,
        actual: usize,
    },
    #[error("Invalid operand for `{mnemonic}`: {reason}")]
    InvalidOperand { mnemonic: String, reason: String },
    #[error("Operand tree is not a valid addressing mode {mode} operand for `{mnemonic}`")]
    InvalidAddressingMode { mode: u8, mnemonic: String },
    #[error("Unknown register `{0}`")]
    UnknownRegister(String),
    #[error("Invalid immediate `{0}`")]
    InvalidImmediate(String),
    #[error("Translation of instruction at 0x{0:X} overflowed the REIL sub-address space")]
    BlockOverflow(u64),
    #[error("Json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

fn operand_counts(counts: &[usize]) -> String {
    counts
        .iter()
        .map(|count| count.to_string())
        .collect::<Vec<String>>()
        .join(" or ")
}

impl From<&str> for Error {
    fn from(s: &str) -> Error {
        Error::Custom(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_count_lists_every_accepted_count() {
        let error = Error::OperandCount {
            mnemonic: "MUL".to_string(),
            expected: vec![3, 2],
            actual: 1,
        };
        assert_eq!(error.to_string(), "`MUL` expects 3 or 2 operands, got 1");
    }
}
