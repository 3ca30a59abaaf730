//! A LiteX SoC with a VexRiscv cpu

use super::{Console, Platform, Timer};
use crate::config::litex::{FINISH_BASE, TIMER_BASE, UART_BASE};
use litex_finish::LitexFinish;
use litex_timer::LitexTimer;
use litex_uart::LitexUart;

pub struct LitexPlatform<'a> {
    uart: LitexUart<'a>,
    timer: LitexTimer<'a>,
    finish: LitexFinish<'a>,
}

impl<'a> LitexPlatform<'a> {
    pub fn new(uart: LitexUart<'a>, timer: LitexTimer<'a>, finish: LitexFinish<'a>) -> Self {
        Self { uart, timer, finish }
    }
}

impl LitexPlatform<'static> {
    /// Access the devices at the locations given in [`config`](crate::config::litex).
    ///
    /// # Safety
    /// The firmware must run on a LiteX SoC that has its devices at these locations.
    /// The devices carry no state in memory so multiple instances may exist but must not be used concurrently.
    pub unsafe fn from_config() -> Self {
        Self::new(
            LitexUart::from_ptr(UART_BASE as *mut _),
            LitexTimer::from_ptr(TIMER_BASE as *mut _),
            LitexFinish::from_ptr(FINISH_BASE as *mut _),
        )
    }
}

impl Console for LitexPlatform<'_> {
    fn try_read(&mut self) -> Option<u8> {
        self.uart.try_read()
    }

    fn write(&mut self, byte: u8) {
        self.uart.write_byte(byte)
    }
}

impl Timer for LitexPlatform<'_> {
    fn read_low(&mut self) -> u32 {
        self.timer.read_low()
    }

    fn read_high(&mut self) -> u32 {
        self.timer.read_high()
    }

    fn write_compare(&mut self, low: u32, high: u32) {
        self.timer.write_compare((high as u64) << 32 | low as u64)
    }
}

impl Platform for LitexPlatform<'_> {
    fn halt(&mut self) -> ! {
        unsafe { self.finish.finish() };
        loop {
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use litex_timer::TimerRegisters;
    use litex_uart::UartRegisters;
    use regs::{RW, WO};

    #[test]
    fn console_goes_through_the_uart() {
        let uart_regs = UartRegisters::zeroed();
        let timer_regs = TimerRegisters::zeroed();
        let finish_reg = RW::new(0u32);
        let finish: &WO<u32> = unsafe { WO::from_ptr(&finish_reg as *const RW<u32> as *mut u32) };
        let mut platform = LitexPlatform::new(
            LitexUart::new(&uart_regs),
            LitexTimer::new(&timer_regs),
            LitexFinish::new(finish),
        );

        // rxtx is plain memory here, so it reads back what was written
        platform.write(b'x');
        assert_eq!(platform.try_read(), Some(b'x'));

        platform.write_compare(0x89ab_cdef, 0x1);
        assert_eq!(platform.read_low(), 0);
        assert_eq!(platform.read_high(), 0);
    }
}
