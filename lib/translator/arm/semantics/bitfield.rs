//! Bitfield clear, insert and extract, and `MOVT`.
//!
//! Bitfields are given as `#lsb, #width`. A field reaching past bit 31 is
//! unpredictable and translates to `unkn`.

use super::*;
use crate::translator::arm::helpers::{extract_field, neg_bit_mask, pos_bit_mask, sign_extend};

// (lsb, width), or None when the field does not fit in a register
fn field(instruction: &Instruction, index: usize) -> Result<Option<(usize, usize)>> {
    let lsb = immediate(instruction, index)?;
    let width = immediate(instruction, index + 1)?;
    let fits = lsb.checked_add(width).map_or(false, |end| end <= 32);
    if lsb < 0 || width < 1 || !fits {
        Ok(None)
    } else {
        Ok(Some((lsb as usize, width as usize)))
    }
}

/// `BFC Rd, #lsb, #width`
pub fn bfc(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[3])?;
    let rd = register(instruction, 0)?;
    let (lsb, width) = match field(instruction, 1)? {
        Some(field) => field,
        None => return unpredictable(instruction, block, "msb below lsb"),
    };

    let result = environment.next_temporary().dword();
    block.and(
        rd.dword(),
        const_(neg_bit_mask(lsb, width, Dword), Dword),
        result,
    );
    write_register(block, rd, result);
    Ok(())
}

/// `BFI Rd, Rn, #lsb, #width`: insert the low `width` bits of `Rn` at `lsb`.
pub fn bfi(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[4])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let (lsb, width) = match field(instruction, 2)? {
        Some(field) => field,
        None => return unpredictable(instruction, block, "msb below lsb"),
    };

    let shifted = environment.next_temporary().dword();
    let inserted = environment.next_temporary().dword();
    let cleared = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();
    block.bsh(rn, const_(lsb as u64, Dword), shifted);
    block.and(shifted, const_(pos_bit_mask(lsb, width), Dword), inserted);
    block.and(
        rd.dword(),
        const_(neg_bit_mask(lsb, width, Dword), Dword),
        cleared,
    );
    block.or(cleared, inserted, result);
    write_register(block, rd, result);
    Ok(())
}

/// `SBFX Rd, Rn, #lsb, #width` and `UBFX Rd, Rn, #lsb, #width`.
pub fn extract(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
    signedness: Signedness,
) -> Result<()> {
    expect_operands(instruction, &[4])?;
    let rd = register(instruction, 0)?;
    let rn = source(instruction, 1)?;
    let (lsb, width) = match field(instruction, 2)? {
        Some(field) => field,
        None => return unpredictable(instruction, block, "field past bit 31"),
    };

    let value = extract_field(environment, block, rn, lsb, width, Dword);
    let result = match signedness {
        Signedness::Signed => sign_extend(environment, block, value, width, Dword),
        Signedness::Unsigned => value,
    };
    write_register(block, rd, result);
    Ok(())
}

/// `MOVT Rd, #imm16`: write the top halfword, keeping the bottom.
pub fn movt(
    environment: &mut TranslationEnvironment,
    instruction: &Instruction,
    _mnemonic: &Mnemonic,
    block: &mut Block,
) -> Result<()> {
    expect_operands(instruction, &[2])?;
    let rd = register(instruction, 0)?;
    let value = (immediate(instruction, 1)? as u64 & 0xffff) << 16;

    let bottom = environment.next_temporary().dword();
    let result = environment.next_temporary().dword();
    block.and(rd.dword(), const_(0xffff, Dword), bottom);
    block.or(bottom, const_(value, Dword), result);
    write_register(block, rd, result);
    Ok(())
}
