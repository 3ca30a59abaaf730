//! Driver implementation for the LiteX "finish" register
//!
//! In simulation, writing to this register ends the simulation.
//! On hardware the write has no effect, so callers have to park the hart afterwards.
#![no_std]

use regs::WO;

/// Controller for a memory mapped finish register
pub struct LitexFinish<'a> {
    reg: &'a WO<u32>,
}

impl<'a> LitexFinish<'a> {
    /// Create a controller of a finish register that is memory mapped at `ptr`.
    ///
    /// # Safety
    /// - This function is safe to use iff `ptr` points to the memory mapped finish register of a LiteX SoC.
    pub unsafe fn from_ptr(ptr: *mut u32) -> Self {
        Self {
            reg: &*(ptr as *mut WO<u32>),
        }
    }

    pub fn new(reg: &'a WO<u32>) -> Self {
        Self { reg }
    }

    /// Ask the SoC to finish.
    ///
    /// # Safety
    /// In simulation this stops the CPU and terminates everything.
    pub unsafe fn finish(&self) {
        self.reg.write(1);
    }
}
