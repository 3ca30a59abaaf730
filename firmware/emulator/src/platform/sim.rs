//! The VexRiscv simulator
//!
//! The simulator maps a handful of word sized devices at the very top of the address space.

use super::{Console, Platform, Timer};
use crate::config::sim::REGISTERS_BASE;
use regs::{RO, RW, WO};

/// Device registers of the simulator
#[repr(C)]
pub struct SimRegisters {
    time_low: RO<u32>,
    time_high: RO<u32>,
    time_compare: [WO<u32>; 2],
    _reserved: [u32; 2],
    /// Writing outputs a character, reading returns the next input character or -1
    console: RW<u32>,
    stop: WO<u32>,
}

pub struct SimPlatform<'a> {
    regs: &'a SimRegisters,
}

impl<'a> SimPlatform<'a> {
    pub fn new(regs: &'a SimRegisters) -> Self {
        Self { regs }
    }
}

impl SimPlatform<'static> {
    /// Access the simulator devices at [`REGISTERS_BASE`].
    ///
    /// # Safety
    /// The firmware must run inside the VexRiscv simulator.
    pub unsafe fn from_config() -> Self {
        Self::new(&*(REGISTERS_BASE as *const SimRegisters))
    }
}

impl Console for SimPlatform<'_> {
    fn try_read(&mut self) -> Option<u8> {
        let value = unsafe { self.regs.console.read() } as i32;
        if value < 0 {
            None
        } else {
            Some(value as u8)
        }
    }

    fn write(&mut self, byte: u8) {
        unsafe { self.regs.console.write(byte as u32) }
    }
}

impl Timer for SimPlatform<'_> {
    fn read_low(&mut self) -> u32 {
        unsafe { self.regs.time_low.read() }
    }

    fn read_high(&mut self) -> u32 {
        unsafe { self.regs.time_high.read() }
    }

    fn write_compare(&mut self, low: u32, high: u32) {
        let [compare_low, compare_high] = &self.regs.time_compare;
        unsafe {
            // park the compare value in the far future so no half written value can match
            compare_high.write(0xffff_ffff);
            compare_low.write(low);
            compare_high.write(high);
        }
    }
}

impl Platform for SimPlatform<'_> {
    fn halt(&mut self) -> ! {
        unsafe { self.regs.stop.write(0) };
        loop {
            core::hint::spin_loop();
        }
    }
}
