//! Abstraction over the hart the firmware runs on
//!
//! Everything the trap handling logic needs from the cpu goes through the [`Hart`] trait.
//! On the real machine this is implemented with CSR instructions and inline assembly while tests provide a mock.

use crate::error::AccessFault;

/// The control and status registers touched while handling a trap
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Csr {
    Mstatus,
    Mepc,
    Mcause,
    Mbadaddr,
    Mtvec,
    Mscratch,
    Mie,
    Sip,
    Sepc,
    Scause,
    Sbadaddr,
    Stvec,
}

/// Width of a single raw memory access
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AccessWidth {
    Byte,
    Word,
}

pub trait Hart {
    fn read_csr(&self, csr: Csr) -> u32;

    fn write_csr(&mut self, csr: Csr, value: u32);

    /// Set the bits of `csr` where `mask` has a 1 but leave all others untouched
    fn set_csr(&mut self, csr: Csr, mask: u32) {
        let value = self.read_csr(csr);
        self.write_csr(csr, value | mask);
    }

    /// Clear the bits of `csr` where `mask` has a 1 but leave all others untouched
    fn clear_csr(&mut self, csr: Csr, mask: u32) {
        let value = self.read_csr(csr);
        self.write_csr(csr, value & !mask);
    }

    /// Address of the primary machine mode trap vector
    fn trap_vector(&self) -> u32;

    /// Perform exactly one raw load from `address` with the supervisor's view of memory.
    ///
    /// Bytes are zero extended.
    /// If the access faults, the fault is returned instead of being taken by the trap handler.
    /// Afterwards a secondary trap vector may still be installed, see [`Hart::trap_vector`].
    fn try_load(&mut self, address: u32, width: AccessWidth) -> Result<u32, AccessFault>;

    /// Perform exactly one raw store of `value` to `address` with the supervisor's view of memory.
    ///
    /// Only the lowest byte of `value` is stored for [`AccessWidth::Byte`].
    /// Faults are reported like for [`Hart::try_load`].
    fn try_store(&mut self, address: u32, width: AccessWidth, value: u32) -> Result<(), AccessFault>;

    /// Install the primary trap vector again
    fn restore_trap_vector(&mut self) {
        let vector = self.trap_vector();
        self.write_csr(Csr::Mtvec, vector);
    }
}
