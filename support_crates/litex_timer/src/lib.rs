//! Driver implementation for the machine timer of LiteX VexRiscv SoCs
//!
//! The timer consists of a free running 64-bit counter and a 64-bit compare value.
//! Both are only transferred between the timer core and the CSR bus when the `latch` register is strobed.
#![no_std]

use regs::LitexCsr;

/// Register block of the timer as it appears on the CSR bus
#[repr(C)]
pub struct TimerRegisters {
    latch: LitexCsr<1>,
    time: LitexCsr<8>,
    time_cmp: LitexCsr<8>,
}

impl TimerRegisters {
    /// A register block that lives in ordinary memory with every register cleared
    pub const fn zeroed() -> Self {
        Self {
            latch: LitexCsr::zeroed(),
            time: LitexCsr::zeroed(),
            time_cmp: LitexCsr::zeroed(),
        }
    }
}

/// Controller for a memory mapped LiteX machine timer
pub struct LitexTimer<'a> {
    regs: &'a TimerRegisters,
}

impl<'a> LitexTimer<'a> {
    /// Create a controller of the timer whose register block is mapped at `ptr`.
    ///
    /// # Safety
    /// `ptr` must point to the register block of the LiteX VexRiscv machine timer.
    pub unsafe fn from_ptr(ptr: *mut TimerRegisters) -> Self {
        Self { regs: &*ptr }
    }

    pub fn new(regs: &'a TimerRegisters) -> Self {
        Self { regs }
    }

    /// Latch the counter and read all 64 bits of it.
    pub fn read_time(&self) -> u64 {
        unsafe {
            self.regs.latch.write(1);
            self.regs.time.read()
        }
    }

    /// Latch the counter and return its lower 32 bits.
    pub fn read_low(&self) -> u32 {
        self.read_time() as u32
    }

    /// Latch the counter and return its upper 32 bits.
    pub fn read_high(&self) -> u32 {
        (self.read_time() >> 32) as u32
    }

    /// Program the compare value.
    ///
    /// The new value only takes effect once it is latched, which happens after all sub-registers are written.
    pub fn write_compare(&self, deadline: u64) {
        unsafe {
            self.regs.time_cmp.write(deadline);
            self.regs.latch.write(1);
        }
    }
}
