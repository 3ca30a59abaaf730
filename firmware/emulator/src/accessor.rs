//! Memory accesses on behalf of the trapped code
//!
//! Every access goes through the trap barrier of the [`Hart`] so a fault is observed as an [`AccessFault`] instead of
//! a nested trap.
//! Unaligned values are assembled from single byte accesses in little endian order.
//! The first faulting byte aborts the operation, so a store may be left partially done, just like on hardware.

use crate::error::AccessFault;
use crate::hart::{AccessWidth, Hart};

pub fn read_word(hart: &mut impl Hart, address: u32) -> Result<u32, AccessFault> {
    hart.try_load(address, AccessWidth::Word)
}

pub fn write_word(hart: &mut impl Hart, address: u32, value: u32) -> Result<(), AccessFault> {
    hart.try_store(address, AccessWidth::Word, value)
}

fn read_bytes_unaligned(hart: &mut impl Hart, address: u32, len: u32) -> Result<u32, AccessFault> {
    let mut value = 0;
    for i in 0..len {
        let byte = hart.try_load(address.wrapping_add(i), AccessWidth::Byte)?;
        value |= (byte & 0xff) << (8 * i);
    }
    Ok(value)
}

fn write_bytes_unaligned(
    hart: &mut impl Hart,
    address: u32,
    len: u32,
    value: u32,
) -> Result<(), AccessFault> {
    for i in 0..len {
        hart.try_store(address.wrapping_add(i), AccessWidth::Byte, value >> (8 * i))?;
    }
    Ok(())
}

pub fn read_half_unaligned(hart: &mut impl Hart, address: u32) -> Result<u16, AccessFault> {
    read_bytes_unaligned(hart, address, 2).map(|value| value as u16)
}

pub fn read_word_unaligned(hart: &mut impl Hart, address: u32) -> Result<u32, AccessFault> {
    read_bytes_unaligned(hart, address, 4)
}

pub fn write_half_unaligned(hart: &mut impl Hart, address: u32, value: u16) -> Result<(), AccessFault> {
    write_bytes_unaligned(hart, address, 2, value as u32)
}

pub fn write_word_unaligned(hart: &mut impl Hart, address: u32, value: u32) -> Result<(), AccessFault> {
    write_bytes_unaligned(hart, address, 4, value)
}

/// Fetch the instruction at `pc`.
///
/// Only aligned words are read.
/// If `pc` points into the middle of a word, the upper half of that word is the first parcel of the instruction.
/// When that parcel belongs to a 32-bit instruction, the second parcel is taken from the following word.
/// The result of a 16-bit instruction only has its lower half populated.
pub fn fetch_instruction(hart: &mut impl Hart, pc: u32) -> Result<u32, AccessFault> {
    if pc & 2 == 0 {
        return read_word(hart, pc);
    }

    let low = read_word(hart, pc.wrapping_sub(2))? >> 16;
    if low & 0b11 != 0b11 {
        return Ok(low);
    }
    let high = read_word(hart, pc.wrapping_add(2))?;
    Ok(low | high << 16)
}
