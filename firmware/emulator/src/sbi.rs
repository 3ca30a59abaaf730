//! The legacy supervisor binary interface
//!
//! Only the calls a Linux kernel needs on this machine are implemented.
//! The call number is passed in `a7`, arguments in `a0` and `a1` and a result, if any, is returned in `a0`.

use crate::context::{Machine, Register};
use crate::error::Unsupported;
use crate::hart::{Csr, Hart};
use crate::platform::Platform;
use riscv::cpu::InterruptBits;

/// Legacy SBI extensions that are implemented
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SbiCall {
    /// Program the timer with the 64-bit deadline `a1:a0`
    SetTimer,
    /// Print the character in `a0`
    ConsolePutchar,
    /// Return a received character in `a0` or -1 if there is none
    ConsoleGetchar,
}

impl TryFrom<u32> for SbiCall {
    type Error = Unsupported;

    fn try_from(which: u32) -> Result<Self, Self::Error> {
        match which {
            0 => Ok(SbiCall::SetTimer),
            1 => Ok(SbiCall::ConsolePutchar),
            2 => Ok(SbiCall::ConsoleGetchar),
            other => Err(Unsupported::SbiCall(other)),
        }
    }
}

/// Perform `call` on behalf of the trapped supervisor
pub fn handle_sbi_call<H: Hart, P: Platform>(machine: &mut Machine<'_, H, P>, call: SbiCall) {
    let a0 = machine.read_register(Register::A0);
    let a1 = machine.read_register(Register::A1);

    match call {
        SbiCall::SetTimer => {
            log::trace!("sbi set_timer({:#x})", (a1 as u64) << 32 | a0 as u64);
            machine.platform.write_compare(a0, a1);
            machine
                .hart
                .set_csr(Csr::Mie, InterruptBits::MachineTimerInterrupt.bits());
            machine
                .hart
                .clear_csr(Csr::Sip, InterruptBits::SupervisorTimerInterrupt.bits());
        }
        SbiCall::ConsolePutchar => {
            log::trace!("sbi console_putchar({:#04x})", a0 as u8);
            machine.platform.write(a0 as u8)
        }
        SbiCall::ConsoleGetchar => {
            let result = match machine.platform.try_read() {
                Some(byte) => byte as u32,
                None => -1i32 as u32,
            };
            log::trace!("sbi console_getchar() = {}", result as i32);
            machine.write_register(Register::A0, result);
        }
    }
}
