use crate::error::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a node in an operand tree.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ExpressionType {
    SizePrefix,
    Register,
    ImmediateInteger,
    Operator,
    MemDeref,
    ExpressionList,
}

/// A node in an operand tree.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct OperandNode {
    kind: ExpressionType,
    value: String,
    #[serde(default)]
    children: Vec<OperandNode>,
}

impl OperandNode {
    pub fn new<S: Into<String>>(
        kind: ExpressionType,
        value: S,
        children: Vec<OperandNode>,
    ) -> OperandNode {
        OperandNode {
            kind,
            value: value.into(),
            children,
        }
    }

    pub fn register(name: &str) -> OperandNode {
        OperandNode::new(ExpressionType::Register, name, Vec::new())
    }

    pub fn immediate(value: i64) -> OperandNode {
        OperandNode::new(ExpressionType::ImmediateInteger, value.to_string(), Vec::new())
    }

    pub fn operator(operator: &str, children: Vec<OperandNode>) -> OperandNode {
        OperandNode::new(ExpressionType::Operator, operator, children)
    }

    pub fn memory(children: Vec<OperandNode>) -> OperandNode {
        OperandNode::new(ExpressionType::MemDeref, "[", children)
    }

    /// `-Rm`, a subtracted offset register.
    pub fn negated_register(name: &str) -> OperandNode {
        OperandNode::operator("-", vec![OperandNode::register(name)])
    }

    /// `Rm, <shift> #imm` inside a memory operand.
    pub fn shifted_register(shift: &str, name: &str, amount: u64) -> OperandNode {
        OperandNode::operator(
            shift,
            vec![
                OperandNode::register(name),
                OperandNode::immediate(amount as i64),
            ],
        )
    }

    pub fn kind(&self) -> ExpressionType {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn children(&self) -> &[OperandNode] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&OperandNode> {
        self.children.get(index)
    }

    pub fn is_register(&self) -> bool {
        self.kind == ExpressionType::Register
    }

    pub fn is_immediate(&self) -> bool {
        self.kind == ExpressionType::ImmediateInteger
    }

    /// Returns true if this is an operator node with the given operator.
    pub fn is_operator(&self, operator: &str) -> bool {
        self.kind == ExpressionType::Operator && self.value == operator
    }

    pub fn is_memory(&self) -> bool {
        self.kind == ExpressionType::MemDeref
    }

    /// Parse the value of an immediate node. Decimal, `0x` hexadecimal and a
    /// leading `-` or `#` are accepted.
    pub fn immediate_value(&self) -> Result<i64> {
        if !self.is_immediate() {
            return Err(Error::InvalidImmediate(self.to_string()));
        }
        parse_immediate(&self.value)
    }
}

/// Parse an immediate as written by a decoder.
pub fn parse_immediate(text: &str) -> Result<i64> {
    let text = text.trim().trim_start_matches('#');
    let (negative, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse::<u64>(),
    }
    .map_err(|_| Error::InvalidImmediate(text.to_string()))?;

    let magnitude = magnitude as i64;
    Ok(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

impl fmt::Display for OperandNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ExpressionType::Register => write!(f, "{}", self.value),
            ExpressionType::ImmediateInteger => write!(f, "#{}", self.value),
            ExpressionType::SizePrefix => match self.children.first() {
                Some(child) => write!(f, "{}", child),
                None => write!(f, "{}", self.value),
            },
            ExpressionType::MemDeref => {
                let children: Vec<String> = self.children.iter().map(|c| c.to_string()).collect();
                write!(f, "[{}]", children.join(", "))
            }
            ExpressionType::ExpressionList => {
                let children: Vec<String> = self.children.iter().map(|c| c.to_string()).collect();
                write!(f, "{{{}}}", children.join(", "))
            }
            ExpressionType::Operator => match (self.value.as_str(), self.children.as_slice()) {
                ("!", [inner]) => write!(f, "{}!", inner),
                ("-", [inner]) => write!(f, "-{}", inner),
                (",", children) => {
                    let children: Vec<String> = children.iter().map(|c| c.to_string()).collect();
                    write!(f, "{}", children.join(", "))
                }
                (operator, [lhs]) => write!(f, "{}, {}", lhs, operator),
                (operator, [lhs, rhs]) => write!(f, "{}, {} {}", lhs, operator, rhs),
                (operator, _) => write!(f, "{}", operator),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediates() {
        assert_eq!(parse_immediate("12").unwrap(), 12);
        assert_eq!(parse_immediate("#0x1F").unwrap(), 0x1f);
        assert_eq!(parse_immediate("-4").unwrap(), -4);
        assert_eq!(parse_immediate("-0x10").unwrap(), -16);
        assert!(parse_immediate("R0").is_err());
    }

    #[test]
    fn display() {
        let node = OperandNode::memory(vec![OperandNode::operator(
            ",",
            vec![
                OperandNode::register("R1"),
                OperandNode::shifted_register("LSL", "R3", 2),
            ],
        )]);
        assert_eq!(node.to_string(), "[R1, R3, LSL #2]");
    }
}
