//! Machine mode register definitions for 32-bit RISC-V cores like the VexRiscv
#![no_std]

pub mod cpu;
pub mod trap;
