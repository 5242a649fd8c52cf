//! Loads and stores.
//!
//! The access width comes from the mnemonic suffix. Base register write-back
//! is emitted after a store, and after a load but before the loaded register
//! is written, so that a loaded base register keeps the loaded value.

use super::*;
use crate::translator::arm::addressing::mode_four::{self, BlockMode, BlockTransfer};
use crate::translator::arm::addressing::{mode_three, mode_two, read, MemoryAddress};
use crate::translator::arm::helpers::sign_extend;

/// The shape of a single register transfer, decoded from a mnemonic suffix.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Access {
    size: OperandSize,
    signed: bool,
    pair: bool,
}

impl Access {
    // The T variants are unprivileged accesses, which are not distinguished
    fn from_suffix(suffix: &str) -> Option<Access> {
        let (size, signed, pair) = match suffix.strip_suffix('T').unwrap_or(suffix) {
            "" => (Dword, false, false),
            "B" => (Byte, false, false),
            "H" => (Word, false, false),
            "SB" => (Byte, true, false),
            "SH" => (Word, true, false),
            "D" if suffix == "D" => (Dword, false, true),
            _ => return None,
        };
        Some(Access { size, signed, pair })
    }

    // Word and unsigned byte use mode two. Thumb-2 also allows shifted
    // offsets for the other widths.
    fn uses_mode_two(&self, thumb: bool) -> bool {
        thumb || (!self.signed && !self.pair && self.size != Word)
    }
}

fn access(instruction: &Instruction, mnemonic: &Mnemonic) -> Result<Access> {
    Access::from_suffix(mnemonic.suffix()).ok_or_else(|| {
        invalid_operand(
            instruction,
            format!("unknown access suffix {}", mnemonic.suffix()),
        )
    })
}

fn address(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    access: Access,
    index: usize,
) -> Result<MemoryAddress> {
    let operand = operand(instruction, index)?;
    if access.uses_mode_two(instruction.is_thumb()) {
        mode_two::generate(environment, instruction, block, operand)
    } else {
        mode_three::generate(environment, instruction, block, operand)
    }
}

// The registers of a doubleword transfer, or None when the pair is
// unpredictable.
fn pair(instruction: &Instruction) -> Result<Option<(Register, Register, usize)>> {
    expect_operands(instruction, &[3, 2])?;
    let first = register(instruction, 0)?;
    let (second, memory) = if instruction.operands().len() == 3 {
        (register(instruction, 1)?, 2)
    } else {
        match first.index() {
            Some(index) if index < 15 => (Register::from_index(index + 1)?, 1),
            _ => return Ok(None),
        }
    };

    // ARM state requires an even first register below R14, followed by
    // its successor
    if !instruction.is_thumb() {
        match first.index() {
            Some(index) if index % 2 == 0 && index != 14 => {
                if second.index() != Some(index + 1) {
                    return Ok(None);
                }
            }
            _ => return Ok(None),
        }
    }
    Ok(Some((first, second, memory)))
}

fn offset(environment: &mut TranslationEnvironment, block: &mut Block, address: Operand, offset: u64) -> Operand {
    if offset == 0 {
        return address;
    }
    let result = environment.next_temporary().dword();
    block.add(address, const_(offset, Dword), result);
    result
}

// Write a loaded value. A load into PC is an interworking jump.
fn write_loaded(environment: &mut TranslationEnvironment, block: &mut Block, register: Register, value: Operand) {
    if register == Register::Pc {
        let target = environment.next_temporary().dword();
        block.and(value, const_(1, Dword), Register::T.byte());
        block.and(value, const_(0xffff_fffe, Dword), target);
        write_register(block, Register::Pc, target);
    } else {
        block.str(value, register.dword());
    }
}

fn load_value(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    address: Operand,
    access: Access,
) -> Operand {
    let loaded = environment.next_temporary().sized(access.size);
    block.ldm(address, loaded);
    if access.signed {
        sign_extend(environment, block, loaded, access.size.bits(), Dword)
    } else {
        loaded
    }
}

/// `LDR{B,H,SB,SH,D}{T} Rt, <address>` and `LDRD Rt, Rt2, <address>`.
pub fn ldr(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let access = access(instruction, mnemonic)?;

    if access.pair {
        let (first, second, memory) = match pair(instruction)? {
            Some(pair) => pair,
            None => return unpredictable(instruction, block, "bad register pair"),
        };
        let address = address(environment, instruction, block, access, memory)?;
        let low = load_value(environment, block, address.address(), access);
        let high_address = offset(environment, block, address.address(), 4);
        let high = load_value(environment, block, high_address, access);
        address.write_back(block);
        write_loaded(environment, block, first, low);
        write_loaded(environment, block, second, high);
        return Ok(());
    }

    expect_operands(instruction, &[2])?;
    let rt = register(instruction, 0)?;
    let address = address(environment, instruction, block, access, 1)?;
    let value = load_value(environment, block, address.address(), access);
    address.write_back(block);
    write_loaded(environment, block, rt, value);
    Ok(())
}

/// `STR{B,H,D}{T} Rt, <address>` and `STRD Rt, Rt2, <address>`.
pub fn str(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let access = access(instruction, mnemonic)?;
    if access.signed {
        return Err(invalid_operand(instruction, "stores are never signed"));
    }

    if access.pair {
        let (first, second, memory) = match pair(instruction)? {
            Some(pair) => pair,
            None => return unpredictable(instruction, block, "bad register pair"),
        };
        let address = address(environment, instruction, block, access, memory)?;
        block.stm(read(instruction, first), address.address());
        let high_address = offset(environment, block, address.address(), 4);
        block.stm(read(instruction, second), high_address);
        address.write_back(block);
        return Ok(());
    }

    expect_operands(instruction, &[2])?;
    let value = source(instruction, 0)?;
    let address = address(environment, instruction, block, access, 1)?;
    block.stm(value.resized(access.size), address.address());
    address.write_back(block);
    Ok(())
}

fn block_mode(instruction: &Instruction, mnemonic: &Mnemonic, load: bool) -> Result<BlockMode> {
    BlockMode::from_suffix(mnemonic.suffix(), load).ok_or_else(|| {
        invalid_operand(
            instruction,
            format!("unknown block transfer suffix {}", mnemonic.suffix()),
        )
    })
}

fn load_multiple(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    base: &NativeOperand,
    list: &NativeOperand,
    mode: BlockMode,
) -> Result<()> {
    let registers = mode_four::register_list(instruction, list)?;
    let transfer = mode_four::generate(environment, instruction, block, base, mode, registers.len())?;
    let values = transfer_addresses(environment, block, &transfer, registers.len())
        .into_iter()
        .map(|address| {
            let value = environment.next_temporary().dword();
            block.ldm(address, value);
            value
        })
        .collect::<Vec<Operand>>();

    transfer.write_back(block);
    for (register, value) in registers.into_iter().zip(values) {
        write_loaded(environment, block, register, value);
    }
    Ok(())
}

fn store_multiple(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    base: &NativeOperand,
    list: &NativeOperand,
    mode: BlockMode,
) -> Result<()> {
    let registers = mode_four::register_list(instruction, list)?;
    let transfer = mode_four::generate(environment, instruction, block, base, mode, registers.len())?;
    let addresses = transfer_addresses(environment, block, &transfer, registers.len());
    for (register, address) in registers.into_iter().zip(addresses) {
        block.stm(read(instruction, register), address);
    }
    transfer.write_back(block);
    Ok(())
}

fn transfer_addresses(
    environment: &mut TranslationEnvironment,
    block: &mut Block,
    transfer: &BlockTransfer,
    count: usize,
) -> Vec<Operand> {
    (0..count)
        .map(|index| offset(environment, block, transfer.start(), 4 * index as u64))
        .collect()
}

/// `LDM{mode} Rn{!}, {registers}`
pub fn ldm(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[2])?;
    let mode = block_mode(instruction, mnemonic, true)?;
    load_multiple(
        environment,
        instruction,
        block,
        operand(instruction, 0)?,
        operand(instruction, 1)?,
        mode,
    )
}

/// `STM{mode} Rn{!}, {registers}`
pub fn stm(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[2])?;
    let mode = block_mode(instruction, mnemonic, false)?;
    store_multiple(
        environment,
        instruction,
        block,
        operand(instruction, 0)?,
        operand(instruction, 1)?,
        mode,
    )
}

/// `POP {registers}`, which is `LDMIA SP!, {registers}`.
pub fn pop(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[1])?;
    load_multiple(
        environment,
        instruction,
        block,
        &NativeOperand::write_back("SP"),
        operand(instruction, 0)?,
        BlockMode::IncrementAfter,
    )
}

/// `PUSH {registers}`, which is `STMDB SP!, {registers}`.
pub fn push(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[1])?;
    store_multiple(
        environment,
        instruction,
        block,
        &NativeOperand::write_back("SP"),
        operand(instruction, 0)?,
        BlockMode::DecrementBefore,
    )
}

/// `SWP{B} Rt, Rt2, [Rn]`: load `Rt` from `[Rn]` and store `Rt2` there.
pub fn swp(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[3])?;
    let size = match mnemonic.suffix() {
        "" => Dword,
        "B" => Byte,
        suffix => {
            return Err(invalid_operand(
                instruction,
                format!("unknown swap suffix {}", suffix),
            ))
        }
    };
    let rt = register(instruction, 0)?;
    let rt2 = source(instruction, 1)?;
    let address = mode_two::generate(environment, instruction, block, operand(instruction, 2)?)?;
    if address.writes_back() {
        return Err(invalid_operand(instruction, "swap addresses never write back"));
    }

    // Rt2 is read before Rt is written, they may be the same register
    let loaded = environment.next_temporary().sized(size);
    block.ldm(address.address(), loaded);
    block.stm(rt2.resized(size), address.address());
    write_register(block, rt, loaded);
    Ok(())
}

// Width of an exclusive access from its suffix, whether it is a pair
fn exclusive_access(instruction: &Instruction, mnemonic: &Mnemonic) -> Result<(OperandSize, bool)> {
    match mnemonic.suffix() {
        "" => Ok((Dword, false)),
        "B" => Ok((Byte, false)),
        "H" => Ok((Word, false)),
        "D" => Ok((Dword, true)),
        suffix => Err(invalid_operand(
            instruction,
            format!("unknown exclusive suffix {}", suffix),
        )),
    }
}

fn exclusive_address(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    block: &mut Block,
    index: usize,
) -> Result<Operand> {
    let address = mode_two::generate(environment, instruction, block, operand(instruction, index)?)?;
    if address.writes_back() {
        return Err(invalid_operand(instruction, "exclusive addresses never write back"));
    }
    Ok(address.address())
}

/// `LDREX{B,H} Rt, [Rn{, #imm}]` and `LDREXD Rt, Rt2, [Rn]`.
///
/// The exclusive monitor is not modeled, these are plain loads.
pub fn ldrex(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (size, pair) = exclusive_access(instruction, mnemonic)?;
    if pair {
        expect_operands(instruction, &[3])?;
        let first = register(instruction, 0)?;
        let second = register(instruction, 1)?;
        let address = exclusive_address(environment, instruction, block, 2)?;
        let low = environment.next_temporary().dword();
        let high = environment.next_temporary().dword();
        block.ldm(address, low);
        let high_address = offset(environment, block, address, 4);
        block.ldm(high_address, high);
        write_register(block, first, low);
        write_register(block, second, high);
        return Ok(());
    }

    expect_operands(instruction, &[2])?;
    let rt = register(instruction, 0)?;
    let address = exclusive_address(environment, instruction, block, 1)?;
    let loaded = environment.next_temporary().sized(size);
    block.ldm(address, loaded);
    write_register(block, rt, loaded);
    Ok(())
}

/// `STREX{B,H} Rd, Rt, [Rn{, #imm}]` and `STREXD Rd, Rt, Rt2, [Rn]`.
///
/// Every exclusive store succeeds and writes `0` to `Rd`.
pub fn strex(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    let (size, pair) = exclusive_access(instruction, mnemonic)?;
    let rd = register(instruction, 0)?;
    if pair {
        expect_operands(instruction, &[4])?;
        let low = source(instruction, 1)?;
        let high = source(instruction, 2)?;
        let address = exclusive_address(environment, instruction, block, 3)?;
        block.stm(low, address);
        let high_address = offset(environment, block, address, 4);
        block.stm(high, high_address);
    } else {
        expect_operands(instruction, &[3])?;
        let value = source(instruction, 1)?;
        let address = exclusive_address(environment, instruction, block, 2)?;
        block.stm(value.resized(size), address);
    }
    write_register(block, rd, const_(0, Dword));
    Ok(())
}
