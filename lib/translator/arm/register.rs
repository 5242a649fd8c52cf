use crate::error::*;
use crate::reil::{Operand, OperandSize, Symbol};
use serde::{Deserialize, Serialize};

/// The ARM core registers, and the processor flags REIL treats as registers.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
    R11,
    R12,
    Sp,
    Lr,
    Pc,
    N,
    Z,
    C,
    V,
    Q,
    T,
    Ge0,
    Ge1,
    Ge2,
    Ge3,
}

struct ArmRegister {
    name: &'static str,
    register: Register,
    // Position in the register file, for core registers.
    index: Option<usize>,
    size: OperandSize,
}

#[rustfmt::skip]
const ARM_REGISTERS: &[ArmRegister] = &[
    ArmRegister { name: "R0", register: Register::R0, index: Some(0), size: OperandSize::Dword },
    ArmRegister { name: "R1", register: Register::R1, index: Some(1), size: OperandSize::Dword },
    ArmRegister { name: "R2", register: Register::R2, index: Some(2), size: OperandSize::Dword },
    ArmRegister { name: "R3", register: Register::R3, index: Some(3), size: OperandSize::Dword },
    ArmRegister { name: "R4", register: Register::R4, index: Some(4), size: OperandSize::Dword },
    ArmRegister { name: "R5", register: Register::R5, index: Some(5), size: OperandSize::Dword },
    ArmRegister { name: "R6", register: Register::R6, index: Some(6), size: OperandSize::Dword },
    ArmRegister { name: "R7", register: Register::R7, index: Some(7), size: OperandSize::Dword },
    ArmRegister { name: "R8", register: Register::R8, index: Some(8), size: OperandSize::Dword },
    ArmRegister { name: "R9", register: Register::R9, index: Some(9), size: OperandSize::Dword },
    ArmRegister { name: "R10", register: Register::R10, index: Some(10), size: OperandSize::Dword },
    ArmRegister { name: "R11", register: Register::R11, index: Some(11), size: OperandSize::Dword },
    ArmRegister { name: "R12", register: Register::R12, index: Some(12), size: OperandSize::Dword },
    ArmRegister { name: "SP", register: Register::Sp, index: Some(13), size: OperandSize::Dword },
    ArmRegister { name: "LR", register: Register::Lr, index: Some(14), size: OperandSize::Dword },
    ArmRegister { name: "PC", register: Register::Pc, index: Some(15), size: OperandSize::Dword },
    ArmRegister { name: "N", register: Register::N, index: None, size: OperandSize::Byte },
    ArmRegister { name: "Z", register: Register::Z, index: None, size: OperandSize::Byte },
    ArmRegister { name: "C", register: Register::C, index: None, size: OperandSize::Byte },
    ArmRegister { name: "V", register: Register::V, index: None, size: OperandSize::Byte },
    ArmRegister { name: "Q", register: Register::Q, index: None, size: OperandSize::Byte },
    ArmRegister { name: "T", register: Register::T, index: None, size: OperandSize::Byte },
    ArmRegister { name: "CPSR_GE_0", register: Register::Ge0, index: None, size: OperandSize::Byte },
    ArmRegister { name: "CPSR_GE_1", register: Register::Ge1, index: None, size: OperandSize::Byte },
    ArmRegister { name: "CPSR_GE_2", register: Register::Ge2, index: None, size: OperandSize::Byte },
    ArmRegister { name: "CPSR_GE_3", register: Register::Ge3, index: None, size: OperandSize::Byte },
];

// Names decoders use besides the canonical ones.
const ALIASES: &[(&str, Register)] = &[
    ("R13", Register::Sp),
    ("R14", Register::Lr),
    ("R15", Register::Pc),
    ("SB", Register::R9),
    ("SL", Register::R10),
    ("FP", Register::R11),
    ("IP", Register::R12),
];

impl Register {
    fn entry(&self) -> &'static ArmRegister {
        &ARM_REGISTERS[*self as usize]
    }

    /// The name of this register as written in REIL.
    pub fn name(&self) -> &'static str {
        self.entry().name
    }

    /// The natural size of this register. Core registers are `Dword`, flags
    /// are `Byte`.
    pub fn size(&self) -> OperandSize {
        self.entry().size
    }

    /// The index of this register in the register file, or `None` for flags.
    pub fn index(&self) -> Option<usize> {
        self.entry().index
    }

    pub fn is_flag(&self) -> bool {
        self.entry().index.is_none()
    }

    /// Get the core register with the given index.
    pub fn from_index(index: usize) -> Result<Register> {
        ARM_REGISTERS
            .iter()
            .find(|entry| entry.index == Some(index))
            .map(|entry| entry.register)
            .ok_or_else(|| Error::UnknownRegister(format!("R{}", index)))
    }

    /// Look up a register by name. Names are matched case insensitively, and
    /// the aliases `R13`-`R15`, `SB`, `SL`, `FP` and `IP` are accepted.
    pub fn from_name(name: &str) -> Result<Register> {
        let upper = name.trim().to_ascii_uppercase();
        if let Some(entry) = ARM_REGISTERS.iter().find(|entry| entry.name == upper) {
            return Ok(entry.register);
        }
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == upper)
            .map(|(_, register)| *register)
            .ok_or_else(|| Error::UnknownRegister(name.to_string()))
    }

    /// The index of the register named `name`. Flags have no index.
    pub fn index_of(name: &str) -> Result<usize> {
        Register::from_name(name)?
            .index()
            .ok_or_else(|| Error::UnknownRegister(name.to_string()))
    }

    /// The `GE` flag for byte lane `lane`.
    pub fn ge(lane: usize) -> Register {
        match lane {
            0 => Register::Ge0,
            1 => Register::Ge1,
            2 => Register::Ge2,
            _ => Register::Ge3,
        }
    }

    pub fn symbol(&self) -> Symbol {
        Symbol::Register(*self)
    }

    /// This register as an operand of its natural size.
    pub fn operand(&self) -> Operand {
        self.symbol().sized(self.size())
    }

    pub fn byte(&self) -> Operand {
        self.symbol().byte()
    }

    pub fn word(&self) -> Operand {
        self.symbol().word()
    }

    pub fn dword(&self) -> Operand {
        self.symbol().dword()
    }

    pub fn qword(&self) -> Operand {
        self.symbol().qword()
    }
}
