//! The hart the firmware is running on

use super::entry::trap_entry_address;
use crate::error::AccessFault;
use crate::hart::{AccessWidth, Csr, Hart};
use core::arch::asm;
use riscv::cpu::{
    MBadAddr, MScratch, MStatus, MTVec, Mcause, Mepc, Mie, SBadAddr, Scause, Sepc, Sip, StVec,
};

/// Perform one raw load inside a trap barrier.
///
/// `mstatus.MPRV` is set for the duration of the access so that it is translated and checked like a supervisor
/// access.
/// `mtvec` points directly behind the access, so a fault skips it and leaves `failed` at 1.
/// Evaluates to `(value, failed)`.
macro_rules! barrier_load {
    ($insn:literal, $address:expr) => {{
        let value: u32;
        let failed: u32;
        asm!(
            "la {tmp}, 1f",
            "csrw mtvec, {tmp}",
            "li {failed}, 1",
            "li {tmp}, 0x20000",
            "csrs mstatus, {tmp}",
            concat!($insn, " {value}, 0({address})"),
            "li {failed}, 0",
            ".balign 4",
            "1:",
            "li {tmp}, 0x20000",
            "csrc mstatus, {tmp}",
            address = in(reg) $address,
            value = out(reg) value,
            failed = out(reg) failed,
            tmp = out(reg) _,
            options(nostack),
        );
        (value, failed != 0)
    }};
}

/// Perform one raw store inside a trap barrier.
///
/// See [`barrier_load`]. Evaluates to `failed`.
macro_rules! barrier_store {
    ($insn:literal, $address:expr, $value:expr) => {{
        let failed: u32;
        asm!(
            "la {tmp}, 1f",
            "csrw mtvec, {tmp}",
            "li {failed}, 1",
            "li {tmp}, 0x20000",
            "csrs mstatus, {tmp}",
            concat!($insn, " {value}, 0({address})"),
            "li {failed}, 0",
            ".balign 4",
            "1:",
            "li {tmp}, 0x20000",
            "csrc mstatus, {tmp}",
            address = in(reg) $address,
            value = in(reg) $value,
            failed = out(reg) failed,
            tmp = out(reg) _,
            options(nostack),
        );
        failed != 0
    }};
}

/// Machine trap CSRs that a fault inside a trap barrier overwrites
struct BarrierState {
    mepc: u32,
    mcause: u32,
    mbadaddr: u32,
    mstatus: u32,
}

impl BarrierState {
    fn save() -> Self {
        Self {
            mepc: Mepc::read(),
            mcause: Mcause::read(),
            mbadaddr: MBadAddr::read(),
            mstatus: MStatus::read(),
        }
    }

    /// Collect the fault that hit the barrier and undo its effect on the trap CSRs
    fn recover(self) -> AccessFault {
        let fault = AccessFault {
            address: MBadAddr::read(),
            cause: Mcause::read(),
        };
        unsafe {
            Mepc::write(self.mepc);
            Mcause::write(self.mcause);
            MBadAddr::write(self.mbadaddr);
            MStatus::write(self.mstatus);
        }
        fault
    }
}

/// The VexRiscv hart, accessed through CSR instructions
pub struct MetalHart;

impl Hart for MetalHart {
    fn read_csr(&self, csr: Csr) -> u32 {
        match csr {
            Csr::Mstatus => MStatus::read(),
            Csr::Mepc => Mepc::read(),
            Csr::Mcause => Mcause::read(),
            Csr::Mbadaddr => MBadAddr::read(),
            Csr::Mtvec => MTVec::read(),
            Csr::Mscratch => MScratch::read(),
            Csr::Mie => Mie::read(),
            Csr::Sip => Sip::read(),
            Csr::Sepc => Sepc::read(),
            Csr::Scause => Scause::read(),
            Csr::Sbadaddr => SBadAddr::read(),
            Csr::Stvec => StVec::read(),
        }
    }

    fn write_csr(&mut self, csr: Csr, value: u32) {
        unsafe {
            match csr {
                Csr::Mstatus => MStatus::write(value),
                Csr::Mepc => Mepc::write(value),
                Csr::Mcause => Mcause::write(value),
                Csr::Mbadaddr => MBadAddr::write(value),
                Csr::Mtvec => MTVec::write(value),
                Csr::Mscratch => MScratch::write(value),
                Csr::Mie => Mie::write(value),
                Csr::Sip => Sip::write(value),
                Csr::Sepc => Sepc::write(value),
                Csr::Scause => Scause::write(value),
                Csr::Sbadaddr => SBadAddr::write(value),
                Csr::Stvec => StVec::write(value),
            }
        }
    }

    fn set_csr(&mut self, csr: Csr, mask: u32) {
        unsafe {
            match csr {
                Csr::Mie => Mie::set(mask),
                Csr::Sip => Sip::set(mask),
                Csr::Mstatus => MStatus::set(mask),
                _ => self.write_csr(csr, self.read_csr(csr) | mask),
            }
        }
    }

    fn clear_csr(&mut self, csr: Csr, mask: u32) {
        unsafe {
            match csr {
                Csr::Mie => Mie::clear(mask),
                Csr::Sip => Sip::clear(mask),
                Csr::Mstatus => MStatus::clear(mask),
                _ => self.write_csr(csr, self.read_csr(csr) & !mask),
            }
        }
    }

    fn trap_vector(&self) -> u32 {
        trap_entry_address()
    }

    fn try_load(&mut self, address: u32, width: AccessWidth) -> Result<u32, AccessFault> {
        let state = BarrierState::save();
        let (value, failed) = unsafe {
            match width {
                AccessWidth::Byte => barrier_load!("lbu", address),
                AccessWidth::Word => barrier_load!("lw", address),
            }
        };
        if failed {
            Err(state.recover())
        } else {
            Ok(value)
        }
    }

    fn try_store(&mut self, address: u32, width: AccessWidth, value: u32) -> Result<(), AccessFault> {
        let state = BarrierState::save();
        let failed = unsafe {
            match width {
                AccessWidth::Byte => barrier_store!("sb", address, value),
                AccessWidth::Word => barrier_store!("sw", address, value),
            }
        };
        if failed {
            Err(state.recover())
        } else {
            Ok(())
        }
    }
}
