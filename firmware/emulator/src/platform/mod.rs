//! Devices of the SoC the firmware needs besides the hart itself
//!
//! Two platforms are supported:
//! - [`litex`]: a LiteX SoC with UART, VexRiscv machine timer and finish register on the CSR bus
//! - [`sim`]: the VexRiscv simulator, which maps a console and a timer at the top of the address space
//!
//! The `sim` feature selects which of them is the [`ActivePlatform`].

pub mod litex;
pub mod sim;

/// A byte oriented console
pub trait Console {
    /// Fetch a received byte without waiting
    fn try_read(&mut self) -> Option<u8>;

    /// Output a byte, waiting until the device accepts it
    fn write(&mut self, byte: u8);
}

/// The 64-bit machine timer
pub trait Timer {
    fn read_low(&mut self) -> u32;

    fn read_high(&mut self) -> u32;

    /// Program the compare value at which the machine timer interrupt becomes pending
    fn write_compare(&mut self, low: u32, high: u32);
}

pub trait Platform: Console + Timer {
    /// Stop the machine for good
    fn halt(&mut self) -> !;
}

#[cfg(not(feature = "sim"))]
pub type ActivePlatform = litex::LitexPlatform<'static>;

#[cfg(feature = "sim")]
pub type ActivePlatform = sim::SimPlatform<'static>;
