//! Errors that can occur while handling a trap

use thiserror_no_std::Error;

/// A fault that was raised by a raw memory access inside a trap barrier.
///
/// It is reported instead of being handled recursively and always leads to delegation of the original trap.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
#[error("access to {address:#010x} faulted with cause {cause}")]
pub struct AccessFault {
    /// The address that could not be accessed
    pub address: u32,
    /// The exception code the hardware reported for the access
    pub cause: u32,
}

/// Something this firmware is not able to emulate.
///
/// All of these are fatal and halt the machine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum Unsupported {
    #[error("exception {0} is not handled in machine mode")]
    Exception(u32),
    #[error("interrupt {0} is not handled in machine mode")]
    Interrupt(u32),
    #[error("instruction {0:#010x} has an opcode that is not emulated")]
    Opcode(u32),
    #[error("misaligned load with funct3 {0} is not emulated")]
    LoadWidth(u32),
    #[error("misaligned store with funct3 {0} is not emulated")]
    StoreWidth(u32),
    #[error("atomic memory operation with funct3 {0} is not emulated")]
    AmoWidth(u32),
    #[error("atomic memory operation {0:#x} is not emulated")]
    AmoSelector(u32),
    #[error("csr instruction {0:#010x} does not encode a csr access")]
    CsrMode(u32),
    #[error("csr {0:#x} is not emulated")]
    CsrAddress(u16),
    #[error("csr {0:#x} is read only")]
    CsrWrite(u16),
    #[error("sbi call {0} is not implemented")]
    SbiCall(u32),
    #[error("compressed instruction {0:#06x} is not emulated")]
    CompressedInstruction(u32),
}

/// The reasons for which an emulation attempt did not complete
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum EmulationError {
    #[error("emulated access faulted: {0}")]
    Fault(#[from] AccessFault),
    #[error("{0}")]
    Unsupported(#[from] Unsupported),
}
