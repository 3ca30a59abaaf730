//! Data Structures for handling trap information

use crate::cpu::MStatusFlags;

/// An indication of the event that caused a trap to trigger
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TrapEvent {
    Interrupt(Interrupt),
    Exception(Exception),
}

impl From<u32> for TrapEvent {
    /// Decode a raw `mcause` value.
    ///
    /// Interpreted as a signed number, interrupts are negative and their low byte selects the source.
    /// Exceptions are non-negative and carry the exception code directly.
    fn from(value: u32) -> Self {
        if (value as i32) < 0 {
            TrapEvent::Interrupt(Interrupt::from(value & 0xff))
        } else {
            TrapEvent::Exception(Exception::from(value))
        }
    }
}

/// An interrupt code indicating the cause of a trap
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Interrupt {
    SupervisorSoftwareInterrupt,
    MachineSoftwareInterrupt,
    SupervisorTimerInterrupt,
    MachineTimerInterrupt,
    SupervisorExternalInterrupt,
    MachineExternalInterrupt,
    Unknown(u32),
}

impl From<u32> for Interrupt {
    fn from(value: u32) -> Self {
        match value {
            1 => Interrupt::SupervisorSoftwareInterrupt,
            3 => Interrupt::MachineSoftwareInterrupt,
            5 => Interrupt::SupervisorTimerInterrupt,
            7 => Interrupt::MachineTimerInterrupt,
            9 => Interrupt::SupervisorExternalInterrupt,
            11 => Interrupt::MachineExternalInterrupt,
            other => Interrupt::Unknown(other),
        }
    }
}

impl From<Interrupt> for u32 {
    fn from(value: Interrupt) -> Self {
        match value {
            Interrupt::SupervisorSoftwareInterrupt => 1,
            Interrupt::MachineSoftwareInterrupt => 3,
            Interrupt::SupervisorTimerInterrupt => 5,
            Interrupt::MachineTimerInterrupt => 7,
            Interrupt::SupervisorExternalInterrupt => 9,
            Interrupt::MachineExternalInterrupt => 11,
            Interrupt::Unknown(other) => other,
        }
    }
}

/// An exception indicating the cause of a trap
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Exception {
    InstructionAddressMisaligned,
    InstructionAccessFault,
    IllegalInstruction,
    Breakpoint,
    LoadAddressMisaligned,
    LoadAccessFault,
    StoreAddressMisaligned,
    StoreAccessFault,
    EnvCallFromUMode,
    EnvCallFromSMode,
    EnvCallFromMMode,
    InstructionPageFault,
    LoadPageFault,
    StorePageFault,
    Unknown(u32),
}

impl From<u32> for Exception {
    fn from(value: u32) -> Self {
        match value {
            0 => Exception::InstructionAddressMisaligned,
            1 => Exception::InstructionAccessFault,
            2 => Exception::IllegalInstruction,
            3 => Exception::Breakpoint,
            4 => Exception::LoadAddressMisaligned,
            5 => Exception::LoadAccessFault,
            6 => Exception::StoreAddressMisaligned,
            7 => Exception::StoreAccessFault,
            8 => Exception::EnvCallFromUMode,
            9 => Exception::EnvCallFromSMode,
            11 => Exception::EnvCallFromMMode,
            12 => Exception::InstructionPageFault,
            13 => Exception::LoadPageFault,
            15 => Exception::StorePageFault,
            other => Exception::Unknown(other),
        }
    }
}

impl From<Exception> for u32 {
    fn from(value: Exception) -> Self {
        match value {
            Exception::InstructionAddressMisaligned => 0,
            Exception::InstructionAccessFault => 1,
            Exception::IllegalInstruction => 2,
            Exception::Breakpoint => 3,
            Exception::LoadAddressMisaligned => 4,
            Exception::LoadAccessFault => 5,
            Exception::StoreAddressMisaligned => 6,
            Exception::StoreAccessFault => 7,
            Exception::EnvCallFromUMode => 8,
            Exception::EnvCallFromSMode => 9,
            Exception::EnvCallFromMMode => 11,
            Exception::InstructionPageFault => 12,
            Exception::LoadPageFault => 13,
            Exception::StorePageFault => 15,
            Exception::Unknown(other) => other,
        }
    }
}

/// Context information about a trap that was taken into machine mode.
#[derive(Debug, Eq, PartialEq)]
pub struct TrapInfo {
    /// The exception program counter.
    ///
    /// This is the program counter at the point at which the trap was triggered.
    /// Essentially, the program counter of the interrupted code.
    pub epc: u32,

    /// The event that caused the trap to trigger.
    pub cause: TrapEvent,

    /// Machine bad address or instruction data.
    ///
    /// If the `cause` field indicates that the cpu encountered a bad instruction or tried to access a bad memory
    /// address, this field holds that bad instruction or bad address.
    pub badaddr: u32,

    /// Information about the execution conditions under which a trap was triggered.
    pub status: MStatusFlags,
}

impl TrapInfo {
    /// Construct an instance by reading the values that are currently stored in the corresponding CPU registers
    #[cfg(target_arch = "riscv32")]
    pub fn from_current_regs() -> Self {
        Self {
            epc: crate::cpu::Mepc::read(),
            cause: TrapEvent::from(crate::cpu::Mcause::read()),
            badaddr: crate::cpu::MBadAddr::read(),
            status: MStatusFlags::from_bits_retain(crate::cpu::MStatus::read()),
        }
    }
}
