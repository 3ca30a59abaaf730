//! The context a trap is handled in
//!
//! The trap entry saves the register file of the interrupted code into a [`TrapFrame`] and then hands it to the
//! dispatcher bundled with the hart and the platform as a [`Machine`].

use crate::config::TRAP_FRAME_SIZE;
use crate::hart::{Csr, Hart};
use static_assertions::{assert_eq_align, assert_eq_size};

/// Save area of the trapped register file.
///
/// ## ABI
/// The layout is used by the trap entry assembly: register `xi` is stored at byte offset `4 * i`.
/// The slots of `x0` (hardwired to zero) and `x2` (swapped into `mscratch` instead) are never written.
#[repr(C)]
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct TrapFrame {
    pub regs: [u32; 32],
}

assert_eq_size!(TrapFrame, [u8; TRAP_FRAME_SIZE]);
assert_eq_align!(TrapFrame, u32);

/// The index of a general purpose register
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct Register(u8);

impl Register {
    pub const ZERO: Register = Register(0);
    pub const SP: Register = Register(2);
    pub const A0: Register = Register(10);
    pub const A1: Register = Register(11);
    pub const A7: Register = Register(17);

    /// Interpret the lowest five bits of `bits` as a register index
    pub const fn from_field(bits: u32) -> Self {
        Self((bits & 0x1f) as u8)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Everything a trap is handled with: the hart, the platform devices and the trapped register file.
pub struct Machine<'frame, H, P> {
    pub hart: H,
    pub platform: P,
    frame: &'frame mut TrapFrame,
}

impl<'frame, H: Hart, P> Machine<'frame, H, P> {
    pub fn new(hart: H, platform: P, frame: &'frame mut TrapFrame) -> Self {
        Self {
            hart,
            platform,
            frame,
        }
    }

    /// Read a register of the trapped code
    pub fn read_register(&self, reg: Register) -> u32 {
        match reg {
            Register::ZERO => 0,
            Register::SP => self.hart.read_csr(Csr::Mscratch),
            _ => self.frame.regs[reg.index()],
        }
    }

    /// Change a register of the trapped code.
    ///
    /// The new value is restored into the register when the trap returns.
    /// Writes to `x0` are ignored.
    pub fn write_register(&mut self, reg: Register, value: u32) {
        match reg {
            Register::ZERO => {}
            Register::SP => self.hart.write_csr(Csr::Mscratch, value),
            _ => self.frame.regs[reg.index()] = value,
        }
    }

    pub fn frame(&self) -> &TrapFrame {
        self.frame
    }
}
