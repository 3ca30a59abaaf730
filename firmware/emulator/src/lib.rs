//! Machine mode firmware for VexRiscv based LiteX SoCs
//!
//! The VexRiscv lacks some features that a Linux kernel expects from an RV32IMA machine with an SBI.
//! This firmware fills the gaps by handling the resulting traps in machine mode:
//! - misaligned loads and stores are emulated byte by byte
//! - atomic memory operations and reads of the `time` counter are emulated
//! - legacy SBI calls are implemented on top of the LiteX UART and timer
//!
//! Everything that is not hardware specific lives in this library so that it can be tested on a host.
#![no_std]

#[cfg(test)]
extern crate std;

pub mod accessor;
pub mod boot;
pub mod config;
pub mod context;
pub mod decode;
pub mod delegate;
pub mod emulate;
pub mod error;
pub mod hart;
pub mod platform;
pub mod sbi;
pub mod trap;

#[cfg(test)]
mod testing;

#[cfg(target_arch = "riscv32")]
#[path = "arch/riscv32ima/mod.rs"]
pub mod arch;
