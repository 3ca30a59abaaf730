//! Bringing the machine from reset into the supervisor

use crate::config::TRAP_FRAME_SIZE;
use fdt_rs::base::DevTree;
use fdt_rs::error::DevTreeError;
use riscv::cpu::{ExceptionBits, InterruptBits, MStatusFlags, PmpFlags};

/// Configuration of PMP entry 0 which grants the supervisor access to all memory
pub const PMP_ALL_MEMORY: PmpFlags = PmpFlags::NAPOT
    .union(PmpFlags::R)
    .union(PmpFlags::W)
    .union(PmpFlags::X);

/// Values of the machine CSRs before entering the supervisor for the first time
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MachineInit {
    /// `mtvec`
    pub trap_vector: u32,
    /// `mscratch`, the save area of the trap handler on top of the machine stack
    pub scratch: u32,
    /// `mstatus`
    pub status: MStatusFlags,
    /// `mie`
    pub interrupt_enable: InterruptBits,
    /// `mepc`, where `mret` will enter the supervisor
    pub entry: u32,
    /// `medeleg`
    pub exception_delegation: ExceptionBits,
    /// `mideleg`
    pub interrupt_delegation: InterruptBits,
    /// `sbadaddr`
    pub supervisor_badaddr: u32,
}

impl MachineInit {
    pub fn new(trap_vector: u32, stack_top: u32, entry: u32) -> Self {
        Self {
            trap_vector,
            scratch: stack_top - TRAP_FRAME_SIZE as u32,
            status: MStatusFlags::MPP_SUPERVISOR | MStatusFlags::MPIE,
            interrupt_enable: InterruptBits::empty(),
            entry,
            // misaligned accesses stay in machine mode to be emulated
            exception_delegation: ExceptionBits::InstructionPageFault
                | ExceptionBits::LoadPageFault
                | ExceptionBits::StorePageFault
                | ExceptionBits::EnvCallFromUMode,
            interrupt_delegation: InterruptBits::SupervisorTimerInterrupt
                | InterruptBits::SupervisorExternalInterrupt
                | InterruptBits::SupervisorSoftwareInterrupt,
            // keeps the register identical to the simulation model
            supervisor_badaddr: 0,
        }
    }
}

/// Validate the header of the device tree blob at `dtb` and return the blob's size
///
/// # Safety
/// `dtb` must point to readable memory that is at least as large as a device tree header.
pub unsafe fn device_tree_size(dtb: *const u8) -> Result<usize, DevTreeError> {
    let tree = DevTree::from_raw_pointer(dtb)?;
    Ok(tree.totalsize())
}

/// The lines printed before the supervisor is started
pub fn banner() -> [&'static str; 2] {
    [
        concat!("VexRiscv machine mode emulator v", env!("CARGO_PKG_VERSION")),
        "--========== \x1b[1mBooting Linux\x1b[0m =============--",
    ]
}
