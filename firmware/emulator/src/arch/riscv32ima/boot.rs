//! Applying the boot plan to the hart and entering the supervisor

use crate::boot::{MachineInit, PMP_ALL_MEMORY};
use core::arch::asm;
use riscv::cpu::{MEDeleg, MIDeleg, MScratch, MStatus, MTVec, Mepc, Mie, SBadAddr};

/// Open PMP entry 0 to all of memory so the supervisor may access it.
///
/// `mtvec` points behind the PMP writes while they are executed.
/// On a core without PMP they raise an illegal instruction exception which then skips them.
///
/// # Safety
/// The machine trap vector is left pointing into this function and has to be replaced afterwards.
pub unsafe fn open_pmp() {
    asm!(
        "la {tmp}, 1f",
        "csrw mtvec, {tmp}",
        "csrw pmpaddr0, {addr}",
        "csrw pmpcfg0, {cfg}",
        ".balign 4",
        "1:",
        addr = in(reg) u32::MAX,
        cfg = in(reg) PMP_ALL_MEMORY.bits(),
        tmp = out(reg) _,
        options(nostack),
    );
}

/// Write the machine CSRs as planned by `init`.
///
/// # Safety
/// After this, traps are handled by the firmware's trap handler using the stack region described by `init`.
pub unsafe fn apply(init: &MachineInit) {
    MTVec::write(init.trap_vector);
    MScratch::write(init.scratch);
    MStatus::write(init.status.bits());
    Mie::write(init.interrupt_enable.bits());
    Mepc::write(init.entry);
    MEDeleg::write(init.exception_delegation.bits());
    MIDeleg::write(init.interrupt_delegation.bits());
    SBadAddr::write(init.supervisor_badaddr);
}

/// Return into the supervisor at `mepc` with `a0 = 0` and `a1 = dtb`.
///
/// # Safety
/// [`apply`] must have prepared `mepc` and `mstatus`.
pub unsafe fn enter_supervisor(dtb: u32) -> ! {
    asm!(
        "li a0, 0",
        "mret",
        in("a1") dtb,
        options(noreturn),
    );
}
