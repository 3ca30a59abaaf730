//! Library for modelling memory mapped registers
//!
//! Besides plain volatile registers ([`RW`], [`RO`], [`WO`]) this crate models the register layout of the LiteX CSR
//! bus.
//! LiteX places every CSR on its bus as a sequence of narrow sub-registers, each of which occupies its own 32-bit word.
//! The sub-registers are ordered from the most significant to the least significant byte.
//! [`LitexCsr`] hides that split and presents the CSR as a single integer.
#![no_std]

use core::cell::UnsafeCell;
use core::marker::PhantomData;
use core::ptr;

/// A volatile memory area that may change unexpectedly and does not honor normal memory semantics.
///
/// This cell variant always uses explicitly volatile read and write operations that are not optimized out by the
/// compiler.
#[repr(transparent)]
struct VolatileCell<T> {
    value: UnsafeCell<T>,
}

/// A memory mapped register
///
/// This struct is generic over the operations it supports via `ReadOp` and `WriteOp`.
/// These should be [`ReadAllowed`] or [`ReadDenied`] for `ReadOp` and [`WriteAllowed`] or [`WriteDenied`] for `WriteOp`.
#[repr(transparent)]
pub struct Reg<ReadOp, WriteOp, T>
where
    T: Copy,
{
    register: VolatileCell<T>,
    #[allow(dead_code)]
    read: PhantomData<ReadOp>,
    #[allow(dead_code)]
    write: PhantomData<WriteOp>,
}

/// Marker struct for configuring a [`Reg`] to allow reading from it
pub struct ReadAllowed;

/// Marker struct for configuring a [`Reg`] to deny reading from it
pub struct ReadDenied;

/// Marker struct for configuring a [`Reg`] to allow writing to it
pub struct WriteAllowed;

/// Marker struct for configuring a [`Reg`] to deny writing to it
pub struct WriteDenied;

/// A Register that allows **read and write** interactions
pub type RW<T> = Reg<ReadAllowed, WriteAllowed, T>;

/// A Register that allows **only write** interactions
pub type WO<T> = Reg<ReadDenied, WriteAllowed, T>;

/// A Register that allows **only read** interactions
pub type RO<T> = Reg<ReadAllowed, WriteDenied, T>;

impl<T> VolatileCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value),
        }
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *mut T {
        self.value.get()
    }
}

impl<T> VolatileCell<T>
where
    T: Copy,
{
    /// Read the value contained in the cell
    ///
    /// # Safety
    /// This function is unsafe, because volatile Cells can have side effects
    #[inline(always)]
    pub unsafe fn get(&self) -> T {
        ptr::read_volatile(self.as_ptr())
    }

    /// Set the value contained in the cell
    ///
    /// # Safety
    /// This function is unsafe, because volatile Cells can have side effects
    #[inline(always)]
    pub unsafe fn set(&self, value: T) {
        ptr::write_volatile(self.as_ptr(), value)
    }
}

impl<RP, T> Reg<RP, WriteAllowed, T>
where
    T: Copy,
{
    /// Write a value to the register.
    ///
    /// # Safety
    /// This function is unsafe, because writing to memory mapped registers may have side effects.
    #[inline(always)]
    pub unsafe fn write(&self, value: T) {
        self.register.set(value)
    }
}

impl<WP, T> Reg<ReadAllowed, WP, T>
where
    T: Copy,
{
    /// Read a value from the register.
    ///
    /// # Safety
    /// This function is unsafe, because reading from memory mapped registers may have side effects.
    #[inline(always)]
    pub unsafe fn read(&self) -> T {
        self.register.get()
    }
}

impl<RP, WP, T> Reg<RP, WP, T>
where
    T: Copy,
{
    /// Create a new `Reg` wrapping the given value.
    ///
    /// Registers are normally obtained by casting a pointer to device memory (see [`Reg::from_ptr`]).
    /// Constructing one from a value is mainly useful for backing a register block with ordinary memory.
    #[inline(always)]
    pub const fn new(value: T) -> Self {
        Self {
            register: VolatileCell::new(value),
            read: PhantomData,
            write: PhantomData,
        }
    }

    /// Interpret the memory at `ptr` as a register.
    ///
    /// # Safety
    /// `ptr` must point to a memory mapped register (or valid memory) of type `T` that lives for `'a`.
    #[inline(always)]
    pub unsafe fn from_ptr<'a>(ptr: *mut T) -> &'a Self {
        &*(ptr as *const Self)
    }
}

/// A LiteX CSR that is split over `N` 8-bit sub-registers.
///
/// Each sub-register sits in the low byte of its own 32-bit bus word.
/// The first word holds the most significant byte.
/// A CSR of `N` sub-registers therefore occupies `4 * N` bytes of address space and can hold up to `8 * N` bits.
#[repr(transparent)]
pub struct LitexCsr<const N: usize> {
    subregs: [RW<u32>; N],
}

impl<const N: usize> LitexCsr<N> {
    /// Size of one sub-register in bits
    pub const SUBREG_BITS: usize = 8;

    /// Create a CSR that is backed by ordinary memory and initialised to zero.
    pub const fn zeroed() -> Self {
        Self {
            subregs: [const { RW::new(0) }; N],
        }
    }

    /// Interpret the memory at `ptr` as a LiteX CSR.
    ///
    /// # Safety
    /// `ptr` must point to the first sub-register of a CSR with `N` sub-registers that stays mapped for `'a`.
    pub unsafe fn from_ptr<'a>(ptr: *mut u32) -> &'a Self {
        &*(ptr as *const Self)
    }

    /// Read the whole CSR value, assembling it from all sub-registers.
    ///
    /// # Safety
    /// Reading from a CSR may have side effects on the device.
    pub unsafe fn read(&self) -> u64 {
        self.subregs
            .iter()
            .fold(0u64, |acc, subreg| (acc << Self::SUBREG_BITS) | (subreg.read() & 0xff) as u64)
    }

    /// Write the whole CSR value, splitting it over all sub-registers (most significant first).
    ///
    /// # Safety
    /// Writing to a CSR may have side effects on the device.
    pub unsafe fn write(&self, value: u64) {
        for (i, subreg) in self.subregs.iter().enumerate() {
            let shift = Self::SUBREG_BITS * (N - 1 - i);
            subreg.write(((value >> shift) & 0xff) as u32);
        }
    }
}
