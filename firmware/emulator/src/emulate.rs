//! Emulation of decoded operations
//!
//! Executing an [`Operation`] changes memory, registers or devices exactly like the hardware would have.
//! Advancing `mepc` past the instruction is left to the caller.

use crate::accessor;
use crate::context::Machine;
use crate::decode::{CounterHalf, LoadKind, Operation, StoreKind};
use crate::error::EmulationError;
use crate::hart::Hart;
use crate::platform::Platform;
use crate::sbi::handle_sbi_call;

pub fn execute<H: Hart, P: Platform>(
    machine: &mut Machine<'_, H, P>,
    operation: Operation,
) -> Result<(), EmulationError> {
    match operation {
        Operation::UnalignedLoad { kind, rd, address } => {
            let hart = &mut machine.hart;
            let value = match kind {
                LoadKind::Half => accessor::read_half_unaligned(hart, address)? as i16 as i32 as u32,
                LoadKind::HalfUnsigned => accessor::read_half_unaligned(hart, address)? as u32,
                LoadKind::Word => accessor::read_word_unaligned(hart, address)?,
            };
            log::trace!("emulated misaligned {:?} load from {:#010x}", kind, address);
            machine.write_register(rd, value);
        }
        Operation::UnalignedStore { kind, src, address } => {
            let value = machine.read_register(src);
            let hart = &mut machine.hart;
            match kind {
                StoreKind::Half => accessor::write_half_unaligned(hart, address, value as u16)?,
                StoreKind::Word => accessor::write_word_unaligned(hart, address, value)?,
            }
            log::trace!("emulated misaligned {:?} store to {:#010x}", kind, address);
        }
        Operation::Atomic { op, rd, addr, src } => {
            let address = machine.read_register(addr);
            let operand = machine.read_register(src);
            let old = accessor::read_word(&mut machine.hart, address)?;
            match op.apply(operand, old) {
                Some(new) => {
                    accessor::write_word(&mut machine.hart, address, new)?;
                    machine.write_register(rd, old);
                    log::trace!("emulated {:?} on {:#010x}", op, address);
                }
                None => log::warn!("{:?} on {:#010x} is not emulated and was skipped", op, address),
            }
        }
        Operation::CounterRead { half, rd } => {
            let value = match half {
                CounterHalf::Low => machine.platform.read_low(),
                CounterHalf::High => machine.platform.read_high(),
            };
            log::trace!("emulated {:?} counter read into {:?}", half, rd);
            machine.write_register(rd, value);
        }
        Operation::Sbi(call) => handle_sbi_call(machine, call),
    }
    Ok(())
}
