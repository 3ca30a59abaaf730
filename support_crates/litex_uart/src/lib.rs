//! Driver implementation for the LiteX UART core
#![no_std]

use regs::LitexCsr;

/// Event bit signalling that a byte was received
pub const UART_EV_RX: u64 = 0x2;

/// Register block of a LiteX UART as it appears on the CSR bus
#[repr(C)]
pub struct UartRegisters {
    rxtx: LitexCsr<1>,
    txfull: LitexCsr<1>,
    rxempty: LitexCsr<1>,
    #[allow(dead_code)]
    ev_status: LitexCsr<1>,
    ev_pending: LitexCsr<1>,
    #[allow(dead_code)]
    ev_enable: LitexCsr<1>,
}

impl UartRegisters {
    /// A register block that lives in ordinary memory with every register cleared
    pub const fn zeroed() -> Self {
        Self {
            rxtx: LitexCsr::zeroed(),
            txfull: LitexCsr::zeroed(),
            rxempty: LitexCsr::zeroed(),
            ev_status: LitexCsr::zeroed(),
            ev_pending: LitexCsr::zeroed(),
            ev_enable: LitexCsr::zeroed(),
        }
    }
}

/// Controller for a memory mapped LiteX UART
pub struct LitexUart<'a> {
    regs: &'a UartRegisters,
}

impl<'a> LitexUart<'a> {
    /// Create a controller of a LiteX UART whose register block is mapped at `ptr`.
    ///
    /// # Safety
    /// - `ptr` must point to the register block of an attached LiteX UART.
    ///
    /// - Creating multiple controllers for the same device is fine as long as they are not used concurrently.
    pub unsafe fn from_ptr(ptr: *mut UartRegisters) -> Self {
        Self { regs: &*ptr }
    }

    pub fn new(regs: &'a UartRegisters) -> Self {
        Self { regs }
    }

    /// Put one byte on the wire, waiting for room in the transmit fifo first.
    ///
    /// Carriage returns are dropped because the terminal on the other side does its own line ending translation.
    pub fn write_byte(&self, byte: u8) {
        unsafe {
            while self.regs.txfull.read() & 0x1 != 0 {}
            if byte != b'\r' {
                self.regs.rxtx.write(byte as u64);
            }
        }
    }

    /// Fetch a received byte if one is available and acknowledge the receive event.
    pub fn try_read(&self) -> Option<u8> {
        unsafe {
            if self.regs.rxempty.read() & 0x1 != 0 {
                return None;
            }
            let byte = self.regs.rxtx.read() as u8;
            self.regs.ev_pending.write(UART_EV_RX);
            Some(byte)
        }
    }
}
