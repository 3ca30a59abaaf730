//! The parts of the firmware that only make sense on the VexRiscv itself

pub mod boot;
pub mod entry;
pub mod hart;

extern crate r0;
extern crate rlibc;

use core::ptr::{addr_of, addr_of_mut};

extern "C" {
    static mut _ebss: u32;
    static mut _sbss: u32;

    static mut _edata: u32;
    static mut _sdata: u32;

    static _sidata: u32;

    /// Top of the machine mode stack, see `link.ld`
    static _sp: u32;
}

// Reset lands here. Nothing but the stack pointer has to be set up before rust code can run.
core::arch::global_asm!(
    ".section .text.start",
    ".global _start",
    "_start:",
    "   la sp, _sp",
    "   j _start_rust",
);

/// Zero `.bss` and copy `.data` from its load address.
///
/// # Safety
/// Must be called exactly once before any static is accessed.
pub unsafe fn init_memory() {
    r0::zero_bss(addr_of_mut!(_sbss), addr_of_mut!(_ebss));
    r0::init_data(addr_of_mut!(_sdata), addr_of_mut!(_edata), addr_of!(_sidata));
}

/// Address of the top of the machine mode stack
pub fn stack_top() -> u32 {
    unsafe { addr_of!(_sp) as u32 }
}
