//! Entry into and exit from machine mode traps
//!
//! `mscratch` holds the address of a [`TrapFrame`] at the top of the machine stack.
//! On entry it is swapped with `sp` so the handler runs on the machine stack directly below the frame while the
//! interrupted stack pointer is parked in `mscratch`.
//! The swap back on exit re-arms `mscratch` for the next trap.

use super::hart::MetalHart;
use crate::context::{Machine, TrapFrame};
use crate::platform::{ActivePlatform, Platform};
use crate::trap::{handle_trap, TrapOutcome};
use riscv::trap::TrapInfo;

core::arch::global_asm!(
    ".section .text",
    ".global machine_trap_entry",
    ".balign 4",
    "machine_trap_entry:",
    "   csrrw sp, mscratch, sp",
    "   sw x1, 1*4(sp)",
    "   sw x3, 3*4(sp)",
    "   sw x4, 4*4(sp)",
    "   sw x5, 5*4(sp)",
    "   sw x6, 6*4(sp)",
    "   sw x7, 7*4(sp)",
    "   sw x8, 8*4(sp)",
    "   sw x9, 9*4(sp)",
    "   sw x10, 10*4(sp)",
    "   sw x11, 11*4(sp)",
    "   sw x12, 12*4(sp)",
    "   sw x13, 13*4(sp)",
    "   sw x14, 14*4(sp)",
    "   sw x15, 15*4(sp)",
    "   sw x16, 16*4(sp)",
    "   sw x17, 17*4(sp)",
    "   sw x18, 18*4(sp)",
    "   sw x19, 19*4(sp)",
    "   sw x20, 20*4(sp)",
    "   sw x21, 21*4(sp)",
    "   sw x22, 22*4(sp)",
    "   sw x23, 23*4(sp)",
    "   sw x24, 24*4(sp)",
    "   sw x25, 25*4(sp)",
    "   sw x26, 26*4(sp)",
    "   sw x27, 27*4(sp)",
    "   sw x28, 28*4(sp)",
    "   sw x29, 29*4(sp)",
    "   sw x30, 30*4(sp)",
    "   sw x31, 31*4(sp)",
    "   mv a0, sp",
    "   call vexriscv_machine_mode_trap",
    "   lw x1, 1*4(sp)",
    "   lw x3, 3*4(sp)",
    "   lw x4, 4*4(sp)",
    "   lw x5, 5*4(sp)",
    "   lw x6, 6*4(sp)",
    "   lw x7, 7*4(sp)",
    "   lw x8, 8*4(sp)",
    "   lw x9, 9*4(sp)",
    "   lw x10, 10*4(sp)",
    "   lw x11, 11*4(sp)",
    "   lw x12, 12*4(sp)",
    "   lw x13, 13*4(sp)",
    "   lw x14, 14*4(sp)",
    "   lw x15, 15*4(sp)",
    "   lw x16, 16*4(sp)",
    "   lw x17, 17*4(sp)",
    "   lw x18, 18*4(sp)",
    "   lw x19, 19*4(sp)",
    "   lw x20, 20*4(sp)",
    "   lw x21, 21*4(sp)",
    "   lw x22, 22*4(sp)",
    "   lw x23, 23*4(sp)",
    "   lw x24, 24*4(sp)",
    "   lw x25, 25*4(sp)",
    "   lw x26, 26*4(sp)",
    "   lw x27, 27*4(sp)",
    "   lw x28, 28*4(sp)",
    "   lw x29, 29*4(sp)",
    "   lw x30, 30*4(sp)",
    "   lw x31, 31*4(sp)",
    "   csrrw sp, mscratch, sp",
    "   mret",
);

extern "C" {
    /// The assembly trap entry above. Its address is what `mtvec` holds outside of trap barriers.
    pub fn machine_trap_entry();
}

/// Address of [`machine_trap_entry`]
pub fn trap_entry_address() -> u32 {
    machine_trap_entry as usize as u32
}

/// Handle a machine mode trap.
///
/// This is called by [`machine_trap_entry`] with the registers of the interrupted code saved in `frame`.
#[no_mangle]
extern "C" fn vexriscv_machine_mode_trap(frame: &mut TrapFrame) {
    let platform = unsafe { ActivePlatform::from_config() };
    let mut machine = Machine::new(MetalHart, platform, frame);

    if let TrapOutcome::Halted(reason) = handle_trap(&mut machine) {
        log::error!("halting the machine: {}", reason);
        log::error!("{:#x?}", TrapInfo::from_current_regs());
        machine.platform.halt();
    }
}
