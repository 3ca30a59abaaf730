//! Handling of CPU control and status registers
//!
//! This module implements some dummy structs which each model a certain cpu register as it is defined in
//! Chapter 3 and 4 of the [Risc-V Privileged Specification](https://github.com/riscv/riscv-isa-manual/releases/download/Priv-v1.10/riscv-privileged-v1.10.pdf).
//!
//! The VexRiscv implements version 1.10 of the privileged specification in which `mtval` and `stval` were still called
//! `mbadaddr` and `sbadaddr`.
//! Both names refer to the same CSR numbers so the accessors below use the old names while the assembly uses the new
//! ones which current assemblers understand.
//!
//! Bit definitions are available on every target so that register values can be computed and tested on a host.
//! The accessor functions themselves only exist when compiling for `riscv32`.

use bitflags::bitflags;
use static_assertions::const_assert_eq;
#[cfg(target_arch = "riscv32")]
use core::arch::asm;

/// Generate code to read from a specific register.
///
/// # Example:
/// ```ignore
/// let val = read_reg!("mstatus");
/// ```
#[cfg(target_arch = "riscv32")]
macro_rules! read_reg {
    ($csr:literal) => {{
        let res: u32;
        asm!(concat!("csrr {}, ", $csr), out(reg) res);
        res
    }};
}

/// Generate code to write to a specific register.
#[cfg(target_arch = "riscv32")]
macro_rules! write_reg {
    ($csr:literal, $value:expr) => {
        asm!(concat!("csrw ", $csr, ", {}"), in(reg) $value)
    };
}

/// Generate code to set specific register bits but leave others untouched
#[cfg(target_arch = "riscv32")]
macro_rules! set_reg {
    ($csr:literal, $value:expr) => {
        asm!(concat!("csrs ", $csr, ", {}"), in(reg) $value)
    };
}

/// Generate code to clear specific register bits but leave others untouched
#[cfg(target_arch = "riscv32")]
macro_rules! clear_reg {
    ($csr:literal, $value:expr) => {
        asm!(concat!("csrc ", $csr, ", {}"), in(reg) $value)
    };
}

/// Declare a dummy struct for a CSR together with its raw accessor functions.
macro_rules! csr {
    ($(#[$doc:meta])* $name:ident = $csr:literal) => {
        $(#[$doc])*
        #[allow(dead_code)]
        pub struct $name {}

        #[cfg(target_arch = "riscv32")]
        impl $name {
            /// Read the raw 32 bit value that is contained in the register
            #[inline(always)]
            pub fn read() -> u32 {
                unsafe { read_reg!($csr) }
            }

            /// Write a raw 32 bit value to the register.
            ///
            /// # Safety
            /// Writing to a machine mode register changes how the hart handles traps and privilege transitions.
            /// Ensure that you write an intended value!
            #[inline(always)]
            pub unsafe fn write(val: u32) {
                write_reg!($csr, val)
            }

            /// Set the bits of this register where `mask` has a 1 but leave all others untouched
            ///
            /// # Safety
            /// See [`write()`](Self::write).
            #[inline(always)]
            pub unsafe fn set(mask: u32) {
                set_reg!($csr, mask)
            }

            /// Clear all register bits, setting them to `0` where `mask` has a `1`
            ///
            /// # Safety
            /// See [`write()`](Self::write).
            #[inline(always)]
            pub unsafe fn clear(mask: u32) {
                clear_reg!($csr, mask)
            }
        }
    };
}

csr!(
    /// Machine Status Register.
    ///
    /// It keeps track of and controls the hart's current operating state, including the state that is saved on trap
    /// entry into machine or supervisor mode.
    MStatus = "mstatus"
);

csr!(
    /// Machine Trap-Vector Base-Address Register
    ///
    /// Holds the address the hart jumps to when a trap is taken into machine mode.
    /// Only direct mode (all traps to BASE) is used by this firmware.
    MTVec = "mtvec"
);

csr!(
    /// Machine Scratch Register
    ///
    /// Dedicated for use by machine mode.
    /// The trap entry swaps it with `sp` so that the handler always runs on the machine mode stack while the
    /// interrupted stack pointer is parked here.
    MScratch = "mscratch"
);

csr!(
    /// Machine Exception Program Counter
    ///
    /// When a trap is taken into M-mode, mepc is written with the address of the instruction that was interrupted or
    /// that encountered the exception. `mret` continues execution at this address.
    Mepc = "mepc"
);

csr!(
    /// Machine Cause Register
    ///
    /// Written with a code indicating the event that caused a trap into M-mode.
    /// The most significant bit is set for interrupts, so interpreted as a signed number interrupts are negative.
    Mcause = "mcause"
);

csr!(
    /// Machine Bad Address Register (`mtval`)
    ///
    /// Holds the faulting address for misaligned and access faults and, on the VexRiscv, the faulting instruction bits
    /// on an illegal instruction exception.
    MBadAddr = "mtval"
);

csr!(
    /// Machine Interrupt Enable Register
    ///
    /// See [`InterruptBits`] for the meaning of each bit.
    Mie = "mie"
);

csr!(
    /// Machine Exception Delegation Register
    ///
    /// Exceptions whose bit is set in this register are taken directly in supervisor mode by the hardware.
    /// See [`ExceptionBits`].
    MEDeleg = "medeleg"
);

csr!(
    /// Machine Interrupt Delegation Register
    ///
    /// Interrupts whose bit is set in this register are taken directly in supervisor mode by the hardware.
    /// See [`InterruptBits`].
    MIDeleg = "mideleg"
);

csr!(
    /// Supervisor Exception Program Counter
    ///
    /// When a trap is taken into S-mode, sepc is written with the virtual address of the instruction that was
    /// interrupted or that encountered the exception.
    Sepc = "sepc"
);

csr!(
    /// Supervisor Cause Register
    ///
    /// When a trap is taken into S-mode, `scause` is written with a code indicating the event that caused the trap.
    Scause = "scause"
);

csr!(
    /// Supervisor Bad Address Register (`stval`)
    SBadAddr = "stval"
);

csr!(
    /// Supervisor Trap Vector Base Address Register
    ///
    /// Holds the address that the supervisor wants traps to be delivered to.
    /// Because the firmware forwards traps by hand it jumps to this address itself.
    StVec = "stvec"
);

csr!(
    /// Supervisor Interrupt Pending Register
    ///
    /// Written from machine mode to raise or lower the supervisor timer interrupt.
    Sip = "sip"
);

csr!(
    /// Physical Memory Protection Configuration Register 0
    ///
    /// Holds the configuration bytes of PMP entries 0 to 3, see [`PmpFlags`].
    /// Cores without PMP raise an illegal instruction exception on access.
    PmpCfg0 = "pmpcfg0"
);

csr!(
    /// Physical Memory Protection Address Register 0
    ///
    /// Bits 33:2 of the address of PMP entry 0.
    /// In NAPOT mode the trailing ones encode the size of the region.
    PmpAddr0 = "pmpaddr0"
);

bitflags! {
    /// Bits of the [`MStatus`] register that this firmware reads or writes.
    ///
    /// The supervisor view of the register (`sstatus`) is a restricted view of the same bits.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct MStatusFlags: u32 {
        /// Supervisor interrupt enable
        const SIE = 1 << 1;
        /// Machine interrupt enable
        const MIE = 1 << 3;
        /// The value of SIE before the last trap into supervisor mode.
        const SPIE = 1 << 5;
        /// The value of MIE before the last trap into machine mode.
        /// `mret` copies it back into MIE.
        const MPIE = 1 << 7;
        /// The privilege mode before the last trap into supervisor mode (`0` user, `1` supervisor).
        const SPP = 1 << 8;
        /// The two bit privilege mode before the last trap into machine mode.
        /// `mret` returns into this mode.
        const MPP = 0b11 << 11;
        /// Modify PRiVilege.
        /// When set, loads and stores executed in M-mode are translated and protected as if the current privilege
        /// mode was the one held in MPP.
        const MPRV = 1 << 17;
        /// permit Supervisor User Memory access
        const SUM = 1 << 18;
        /// Make eXecutable Readable
        const MXR = 1 << 19;
    }
}

impl MStatusFlags {
    /// The MPP field value that makes `mret` return into supervisor mode.
    pub const MPP_SUPERVISOR: Self = Self::from_bits_retain(0b01 << 11);
}

// the firmware computes delegated mstatus values with these positions
const_assert_eq!(MStatusFlags::SPP.bits(), 0x100);
const_assert_eq!(MStatusFlags::MPP.bits(), 0x1800);
const_assert_eq!(MStatusFlags::MPRV.bits(), 0x0002_0000);
const_assert_eq!(InterruptBits::MachineTimerInterrupt.bits(), 0x80);
const_assert_eq!(InterruptBits::SupervisorTimerInterrupt.bits(), 0x20);

bitflags! {
    /// A bitmap mapping an interrupt cause number to the bit that represents it in the `mie`, `mip`, `sip` and
    /// `mideleg` registers.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct InterruptBits: u32 {
        const SupervisorSoftwareInterrupt = 1 << 1;
        const MachineSoftwareInterrupt = 1 << 3;
        /// STIP is read-only for the supervisor and is set and cleared by the execution environment, which is us.
        const SupervisorTimerInterrupt = 1 << 5;
        /// MTIP mirrors the platform timer comparing against its compare register.
        const MachineTimerInterrupt = 1 << 7;
        const SupervisorExternalInterrupt = 1 << 9;
        const MachineExternalInterrupt = 1 << 11;
    }
}

bitflags! {
    /// A bitmap mapping an exception code to its bit in the [`MEDeleg`] register.
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct ExceptionBits: u32 {
        const InstructionAddressMisaligned = 1 << 0;
        const InstructionAccessFault = 1 << 1;
        const IllegalInstruction = 1 << 2;
        const Breakpoint = 1 << 3;
        const LoadAddressMisaligned = 1 << 4;
        const LoadAccessFault = 1 << 5;
        const StoreAddressMisaligned = 1 << 6;
        const StoreAccessFault = 1 << 7;
        const EnvCallFromUMode = 1 << 8;
        const EnvCallFromSMode = 1 << 9;
        const InstructionPageFault = 1 << 12;
        const LoadPageFault = 1 << 13;
        const StorePageFault = 1 << 15;
    }
}

bitflags! {
    /// Configuration byte of a single physical memory protection entry (one byte of `pmpcfg0`)
    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    pub struct PmpFlags: u32 {
        const R = 1 << 0;
        const W = 1 << 1;
        const X = 1 << 2;
        /// Address matching mode "naturally aligned power of two".
        /// With all bits of `pmpaddr` set, the entry covers the whole address space.
        const NAPOT = 0b11 << 3;
        const L = 1 << 7;
    }
}

/// Numbers of the unprivileged counter CSRs that the VexRiscv does not implement
pub mod counters {
    pub const CYCLE: u16 = 0xC00;
    pub const TIME: u16 = 0xC01;
    pub const INSTRET: u16 = 0xC02;
    pub const CYCLEH: u16 = 0xC80;
    pub const TIMEH: u16 = 0xC81;
    pub const INSTRETH: u16 = 0xC82;
}
