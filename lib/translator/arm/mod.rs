//! ARM, Thumb and Thumb-2 to REIL.
//!
//! `Arm` holds a registry from every accepted spelling of a mnemonic to the
//! `OpcodeTranslator` for its opcode family. A spelling is the family base,
//! an optional opcode suffix, an optional condition in either order, and an
//! optional `.W` or `.N` qualifier. 16-bit Thumb encodings whose semantics
//! differ from the ARM mnemonic of the same name are registered a second
//! time under a `THUMB` prefixed key, which is tried first.

use crate::disassembly::Instruction;
use crate::error::*;
use crate::reil::{self, Block};
use crate::translator::{TranslationEnvironment, Translator};
use rustc_hash::FxHashMap;

pub mod addressing;
mod condition;
pub mod helpers;
mod mnemonic;
mod register;
pub mod semantics;

pub use self::condition::{condition_value, translate_conditional};
pub use self::mnemonic::{Condition, Mnemonic, MnemonicFlags, CONDITION_SUFFIXES};
pub use self::register::*;
pub use self::semantics::{ArmOpcode, LaneOperation, OpcodeTranslator, ParallelKind};

use self::addressing::mode_one::ShiftKind;
use self::helpers::Signedness;

#[cfg(test)]
mod test;

/// The semantics of one opcode family.
pub trait InstructionTranslator {
    /// The mnemonic base this translator was registered under, such as
    /// `LDR` for `LDRSBEQ`.
    fn prefix(&self) -> &str;

    /// Whether the mnemonic sets the flags even without an `S` suffix.
    fn implicit_flags(&self) -> bool {
        false
    }

    /// Emit the semantics of `instruction`, ignoring its condition.
    fn translate_core(
        &self,
        environment: &mut TranslationEnvironment,
        instruction: &Instruction,
        mnemonic: &Mnemonic,
        block: &mut Block,
    ) -> Result<()>;
}

const NONE: &[&str] = &[""];
const S: &[&str] = &["", "S"];
const LOAD: &[&str] = &["", "B", "H", "SB", "SH", "D", "T", "BT", "HT", "SBT", "SHT"];
const STORE: &[&str] = &["", "B", "H", "D", "T", "BT", "HT"];
const BLOCK: &[&str] = &["", "IA", "IB", "DA", "DB", "FD", "FA", "ED", "EA"];
const SWAP: &[&str] = &["", "B"];
const CPS: &[&str] = &["", "IE", "ID"];
const EXCLUSIVE: &[&str] = &["", "B", "H", "D"];
const EXCEPTION: &[&str] = &["", "IA", "IB", "DA", "DB"];

const fn extend(signedness: Signedness, bits: usize, accumulate: bool) -> ArmOpcode {
    ArmOpcode::Extend {
        signedness,
        bits,
        accumulate,
    }
}

const fn dual(subtract: bool, exchange: bool, accumulate: bool) -> ArmOpcode {
    ArmOpcode::DualMultiply {
        subtract,
        exchange,
        accumulate,
    }
}

const fn extend16(signedness: Signedness, accumulate: bool) -> ArmOpcode {
    ArmOpcode::Extend16 {
        signedness,
        accumulate,
    }
}

const OPCODES: &[(&str, ArmOpcode, &[&str])] = &[
    // Data processing
    ("ADC", ArmOpcode::Adc, S),
    ("ADD", ArmOpcode::Add, S),
    ("ADDW", ArmOpcode::Add, NONE),
    ("ADR", ArmOpcode::Adr, NONE),
    ("ADRL", ArmOpcode::Adr, NONE),
    ("AND", ArmOpcode::And, S),
    ("ASR", ArmOpcode::Shift(ShiftKind::Asr), S),
    ("BIC", ArmOpcode::Bic, S),
    ("CMN", ArmOpcode::Cmn, NONE),
    ("CMP", ArmOpcode::Cmp, NONE),
    ("CPY", ArmOpcode::Mov, NONE),
    ("EOR", ArmOpcode::Eor, S),
    ("LSL", ArmOpcode::Shift(ShiftKind::Lsl), S),
    ("LSR", ArmOpcode::Shift(ShiftKind::Lsr), S),
    ("MOV", ArmOpcode::Mov, S),
    ("MOVW", ArmOpcode::Movw, NONE),
    ("MVN", ArmOpcode::Mvn, S),
    ("NEG", ArmOpcode::Neg, S),
    ("ORN", ArmOpcode::Orn, S),
    ("ORR", ArmOpcode::Orr, S),
    ("ROR", ArmOpcode::Shift(ShiftKind::Ror), S),
    ("RRX", ArmOpcode::Rrx, S),
    ("RSB", ArmOpcode::Rsb, S),
    ("RSC", ArmOpcode::Rsc, S),
    ("SBC", ArmOpcode::Sbc, S),
    ("SUB", ArmOpcode::Sub, S),
    ("SUBW", ArmOpcode::Sub, NONE),
    ("TEQ", ArmOpcode::Teq, NONE),
    ("TST", ArmOpcode::Tst, NONE),
    // Multiply and divide
    ("MLA", ArmOpcode::Mla, S),
    ("MLS", ArmOpcode::Mls, NONE),
    ("MUL", ArmOpcode::Mul, S),
    ("SDIV", ArmOpcode::Sdiv, NONE),
    ("SMLABB", ArmOpcode::Smlaxy { top_n: false, top_m: false }, NONE),
    ("SMLABT", ArmOpcode::Smlaxy { top_n: false, top_m: true }, NONE),
    ("SMLATB", ArmOpcode::Smlaxy { top_n: true, top_m: false }, NONE),
    ("SMLATT", ArmOpcode::Smlaxy { top_n: true, top_m: true }, NONE),
    ("SMLAD", dual(false, false, true), NONE),
    ("SMLADX", dual(false, true, true), NONE),
    ("SMLAL", ArmOpcode::Smlal, S),
    ("SMLALBB", ArmOpcode::Smlalxy { top_n: false, top_m: false }, NONE),
    ("SMLALBT", ArmOpcode::Smlalxy { top_n: false, top_m: true }, NONE),
    ("SMLALD", ArmOpcode::DualMultiplyLong { subtract: false, exchange: false }, NONE),
    ("SMLALDX", ArmOpcode::DualMultiplyLong { subtract: false, exchange: true }, NONE),
    ("SMLALTB", ArmOpcode::Smlalxy { top_n: true, top_m: false }, NONE),
    ("SMLALTT", ArmOpcode::Smlalxy { top_n: true, top_m: true }, NONE),
    ("SMLAWB", ArmOpcode::Smlaw { top: false }, NONE),
    ("SMLAWT", ArmOpcode::Smlaw { top: true }, NONE),
    ("SMLSD", dual(true, false, true), NONE),
    ("SMLSDX", dual(true, true, true), NONE),
    ("SMLSLD", ArmOpcode::DualMultiplyLong { subtract: true, exchange: false }, NONE),
    ("SMLSLDX", ArmOpcode::DualMultiplyLong { subtract: true, exchange: true }, NONE),
    ("SMMLA", ArmOpcode::Smmla { subtract: false, round: false }, NONE),
    ("SMMLAR", ArmOpcode::Smmla { subtract: false, round: true }, NONE),
    ("SMMLS", ArmOpcode::Smmla { subtract: true, round: false }, NONE),
    ("SMMLSR", ArmOpcode::Smmla { subtract: true, round: true }, NONE),
    ("SMMUL", ArmOpcode::Smmul { round: false }, NONE),
    ("SMMULR", ArmOpcode::Smmul { round: true }, NONE),
    ("SMUAD", dual(false, false, false), NONE),
    ("SMUADX", dual(false, true, false), NONE),
    ("SMULBB", ArmOpcode::Smulxy { top_n: false, top_m: false }, NONE),
    ("SMULBT", ArmOpcode::Smulxy { top_n: false, top_m: true }, NONE),
    ("SMULTB", ArmOpcode::Smulxy { top_n: true, top_m: false }, NONE),
    ("SMULTT", ArmOpcode::Smulxy { top_n: true, top_m: true }, NONE),
    ("SMULL", ArmOpcode::Smull, S),
    ("SMULWB", ArmOpcode::Smulw { top: false }, NONE),
    ("SMULWT", ArmOpcode::Smulw { top: true }, NONE),
    ("SMUSD", dual(true, false, false), NONE),
    ("SMUSDX", dual(true, true, false), NONE),
    ("UDIV", ArmOpcode::Udiv, NONE),
    ("UMAAL", ArmOpcode::Umaal, NONE),
    ("UMLAL", ArmOpcode::Umlal, S),
    ("UMULL", ArmOpcode::Umull, S),
    // Parallel, besides the lane operations below
    ("SEL", ArmOpcode::Sel, NONE),
    ("USAD8", ArmOpcode::Usad8, NONE),
    ("USADA8", ArmOpcode::Usada8, NONE),
    // Saturation
    ("QADD", ArmOpcode::Qadd, NONE),
    ("QDADD", ArmOpcode::Qdadd, NONE),
    ("QDSUB", ArmOpcode::Qdsub, NONE),
    ("QSUB", ArmOpcode::Qsub, NONE),
    ("SSAT", ArmOpcode::Ssat, NONE),
    ("SSAT16", ArmOpcode::Ssat16, NONE),
    ("USAT", ArmOpcode::Usat, NONE),
    ("USAT16", ArmOpcode::Usat16, NONE),
    // Branches
    ("B", ArmOpcode::B, NONE),
    ("BL", ArmOpcode::Bl, NONE),
    ("BLX", ArmOpcode::Blx, NONE),
    ("BX", ArmOpcode::Bx, NONE),
    ("CBNZ", ArmOpcode::Cbnz, NONE),
    ("CBZ", ArmOpcode::Cbz, NONE),
    ("TBB", ArmOpcode::Tbb, NONE),
    ("TBH", ArmOpcode::Tbh, NONE),
    // Loads and stores
    ("LDM", ArmOpcode::Ldm, BLOCK),
    ("LDR", ArmOpcode::Ldr, LOAD),
    ("LDREX", ArmOpcode::Ldrex, EXCLUSIVE),
    ("POP", ArmOpcode::Pop, NONE),
    ("PUSH", ArmOpcode::Push, NONE),
    ("STM", ArmOpcode::Stm, BLOCK),
    ("STR", ArmOpcode::Str, STORE),
    ("STREX", ArmOpcode::Strex, EXCLUSIVE),
    ("SWP", ArmOpcode::Swp, SWAP),
    // Bitfields
    ("BFC", ArmOpcode::Bfc, NONE),
    ("BFI", ArmOpcode::Bfi, NONE),
    ("MOVT", ArmOpcode::Movt, NONE),
    ("SBFX", ArmOpcode::Sbfx, NONE),
    ("UBFX", ArmOpcode::Ubfx, NONE),
    // Miscellaneous
    ("CLZ", ArmOpcode::Clz, NONE),
    ("MRS", ArmOpcode::Mrs, NONE),
    ("MSR", ArmOpcode::Msr, NONE),
    ("PKHBT", ArmOpcode::Pkh { top: false }, NONE),
    ("PKHTB", ArmOpcode::Pkh { top: true }, NONE),
    ("RBIT", ArmOpcode::Rbit, NONE),
    ("REV", ArmOpcode::Rev, NONE),
    ("REV16", ArmOpcode::Rev16, NONE),
    ("REVSH", ArmOpcode::Revsh, NONE),
    ("SXTAB", extend(Signedness::Signed, 8, true), NONE),
    ("SXTAB16", extend16(Signedness::Signed, true), NONE),
    ("SXTAH", extend(Signedness::Signed, 16, true), NONE),
    ("SXTB", extend(Signedness::Signed, 8, false), NONE),
    ("SXTB16", extend16(Signedness::Signed, false), NONE),
    ("SXTH", extend(Signedness::Signed, 16, false), NONE),
    ("UXTAB", extend(Signedness::Unsigned, 8, true), NONE),
    ("UXTAB16", extend16(Signedness::Unsigned, true), NONE),
    ("UXTAH", extend(Signedness::Unsigned, 16, true), NONE),
    ("UXTB", extend(Signedness::Unsigned, 8, false), NONE),
    ("UXTB16", extend16(Signedness::Unsigned, false), NONE),
    ("UXTH", extend(Signedness::Unsigned, 16, false), NONE),
    // Hints and barriers. The exclusive monitor is not modeled.
    ("CLREX", ArmOpcode::Nop, NONE),
    ("DMB", ArmOpcode::Nop, NONE),
    ("DSB", ArmOpcode::Nop, NONE),
    ("ISB", ArmOpcode::Nop, NONE),
    ("NOP", ArmOpcode::Nop, NONE),
    ("PLD", ArmOpcode::Nop, NONE),
    ("YIELD", ArmOpcode::Nop, NONE),
    // Recognized, with effects outside the modeled state
    ("BKPT", ArmOpcode::Unknown, NONE),
    ("BXJ", ArmOpcode::Unknown, NONE),
    ("CDP", ArmOpcode::Unknown, NONE),
    ("CDP2", ArmOpcode::Unknown, NONE),
    ("CPS", ArmOpcode::Unknown, CPS),
    ("LDC", ArmOpcode::Unknown, NONE),
    ("LDC2", ArmOpcode::Unknown, NONE),
    ("MCR", ArmOpcode::Unknown, NONE),
    ("MCR2", ArmOpcode::Unknown, NONE),
    ("MCRR", ArmOpcode::Unknown, NONE),
    ("MRC", ArmOpcode::Unknown, NONE),
    ("MRC2", ArmOpcode::Unknown, NONE),
    ("MRRC", ArmOpcode::Unknown, NONE),
    ("RFE", ArmOpcode::Unknown, EXCEPTION),
    ("SETEND", ArmOpcode::Unknown, NONE),
    ("SEV", ArmOpcode::Unknown, NONE),
    ("SRS", ArmOpcode::Unknown, EXCEPTION),
    ("STC", ArmOpcode::Unknown, NONE),
    ("STC2", ArmOpcode::Unknown, NONE),
    ("SVC", ArmOpcode::Unknown, NONE),
    ("SWI", ArmOpcode::Unknown, NONE),
    ("WFE", ArmOpcode::Unknown, NONE),
    ("WFI", ArmOpcode::Unknown, NONE),
];

// 16-bit Thumb forms, keyed without the THUMB prefix. NEG is RSBS Rd, Rm, #0.
// The flagged forms only have flag-setting 16-bit encodings outside an IT
// block. ADD, SUB and MOV also have 16-bit encodings which leave the flags
// alone, so they rely on the S suffix.
const THUMB_OPCODES: &[(&str, ArmOpcode, bool)] = &[
    ("ADC", ArmOpcode::Adc, true),
    ("AND", ArmOpcode::And, true),
    ("ASR", ArmOpcode::Shift(ShiftKind::Asr), true),
    ("BIC", ArmOpcode::Bic, true),
    ("CPY", ArmOpcode::Mov, false),
    ("EOR", ArmOpcode::Eor, true),
    ("LSL", ArmOpcode::Shift(ShiftKind::Lsl), true),
    ("LSR", ArmOpcode::Shift(ShiftKind::Lsr), true),
    ("MUL", ArmOpcode::Mul, true),
    ("MVN", ArmOpcode::Mvn, true),
    ("NEG", ArmOpcode::Neg, true),
    ("ORR", ArmOpcode::Orr, true),
    ("ROR", ArmOpcode::Shift(ShiftKind::Ror), true),
    ("SBC", ArmOpcode::Sbc, true),
    ("SWI", ArmOpcode::Unknown, false),
];

/// The ARM translator.
#[derive(Clone, Debug)]
pub struct Arm {
    translators: FxHashMap<String, OpcodeTranslator>,
}

impl Arm {
    pub fn new() -> Arm {
        let mut translators = FxHashMap::default();

        for (base, opcode, suffixes) in OPCODES {
            register_spellings(&mut translators, base, suffixes, || {
                OpcodeTranslator::new(*opcode, *base)
            });
        }

        for kind in ParallelKind::ALL.iter() {
            for operation in LaneOperation::ALL.iter() {
                let names = [Some(operation.name()), operation.legacy_name()];
                for name in names.iter().flatten() {
                    let base = format!("{}{}", kind.prefix(), name);
                    let opcode = ArmOpcode::Parallel(*kind, *operation);
                    register_spellings(&mut translators, &base, NONE, || {
                        OpcodeTranslator::new(opcode, base.clone())
                    });
                }
            }
        }

        for (base, opcode, implicit_flags) in THUMB_OPCODES {
            register_spellings(&mut translators, &format!("THUMB{}", base), NONE, || {
                let translator = OpcodeTranslator::new(*opcode, *base);
                if *implicit_flags {
                    translator.with_implicit_flags()
                } else {
                    translator
                }
            });
        }

        // The condition of an IT block is an operand, and the instructions
        // it guards carry their own condition suffixes.
        for mask in it_masks() {
            let base = format!("IT{}", mask);
            for qualifier in ["", ".W", ".N"].iter() {
                translators
                    .entry(format!("{}{}", base, qualifier))
                    .or_insert_with(|| OpcodeTranslator::new(ArmOpcode::Nop, base.clone()));
            }
        }

        Arm { translators }
    }

    /// The translator for `mnemonic`, if one is registered.
    ///
    /// `thumb` selects the 16-bit Thumb form of the mnemonic, where one
    /// exists.
    pub fn lookup(&self, mnemonic: &str, thumb: bool) -> Option<&OpcodeTranslator> {
        let mnemonic = mnemonic.trim().to_ascii_uppercase();
        if thumb {
            if let Some(translator) = self.translators.get(&format!("THUMB{}", mnemonic)) {
                return Some(translator);
            }
        }
        self.translators.get(&mnemonic)
    }

    /// The number of registered spellings.
    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }

    fn translator(&self, instruction: &Instruction) -> Option<&OpcodeTranslator> {
        let narrow = instruction.is_thumb() && instruction.length() < 4;
        self.lookup(instruction.mnemonic(), narrow)
    }
}

impl Default for Arm {
    fn default() -> Arm {
        Arm::new()
    }
}

impl Translator for Arm {
    fn translate(
        &self,
        environment: &mut TranslationEnvironment,
        instruction: &Instruction,
    ) -> Result<Vec<reil::Instruction>> {
        let mut block = Block::new(instruction.address());

        match self.translator(instruction) {
            Some(translator) => {
                translate_conditional(translator, environment, instruction, &mut block)?
            }
            None => {
                if !environment.options().unsupported_are_unknown() {
                    bail!(
                        "Unsupported mnemonic {} at 0x{:X}",
                        instruction.mnemonic(),
                        instruction.address()
                    );
                }
                debug!(
                    "No translator for {} at 0x{:X}, emitting unkn",
                    instruction.mnemonic(),
                    instruction.address()
                );
                block.unknown();
            }
        }

        trace!(
            "Translated {} into {} REIL instructions",
            instruction,
            block.len()
        );
        block.into_instructions()
    }
}

// Every spelling of base with one of its suffixes, in either order with a
// condition, and with or without a width qualifier. Earlier registrations
// win when two families produce the same spelling.
fn register_spellings<F>(
    translators: &mut FxHashMap<String, OpcodeTranslator>,
    base: &str,
    suffixes: &[&str],
    translator: F,
) where
    F: Fn() -> OpcodeTranslator,
{
    for suffix in suffixes {
        for condition in CONDITION_SUFFIXES {
            let spellings = [
                format!("{}{}{}", base, suffix, condition),
                format!("{}{}{}", base, condition, suffix),
            ];
            for spelling in spellings.iter() {
                for qualifier in ["", ".W", ".N"].iter() {
                    translators
                        .entry(format!("{}{}", spelling, qualifier))
                        .or_insert_with(&translator);
                }
            }
        }
    }
}

// T and E combinations following the first, implicit, T of an IT block
fn it_masks() -> Vec<String> {
    let mut masks = vec![String::new()];
    let mut previous = vec![String::new()];
    for _ in 0..3 {
        let next = previous
            .iter()
            .flat_map(|mask| vec![format!("{}T", mask), format!("{}E", mask)])
            .collect::<Vec<String>>();
        masks.extend(next.iter().cloned());
        previous = next;
    }
    masks
}
