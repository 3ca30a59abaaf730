//! Host side stand-ins for the hart and the platform

use crate::error::AccessFault;
use crate::hart::{AccessWidth, Csr, Hart};
use crate::platform::{Console, Platform, Timer};
use riscv::trap::Exception;
use core::cell::RefCell;
use log::{LevelFilter, Log, Metadata, Record};
use std::collections::{BTreeSet, VecDeque};
use std::format;
use std::string::String;
use std::sync::Once;
use std::vec;
use std::vec::Vec;

/// Start of the memory that the mock hart can access
pub const RAM_BASE: u32 = 0x8000_0000;
pub const RAM_SIZE: u32 = 0x1000;

/// Value of `mtvec` when the firmware's trap handler is installed
pub const TRAP_VECTOR: u32 = 0x2000_0100;
/// Value of `mtvec` while a barrier access is in progress
pub const BARRIER_VECTOR: u32 = 0x2000_0400;

/// Number of CSRs in [`Csr`]
const CSR_COUNT: usize = 12;

/// A hart with a small RAM window and a configurable set of faulting addresses
pub struct MockHart {
    csrs: [u32; CSR_COUNT],
    ram: Vec<u8>,
    faults: BTreeSet<u32>,
    store_faults: BTreeSet<u32>,
    /// Number of raw accesses done through the trap barrier
    pub barrier_accesses: usize,
}

impl MockHart {
    pub fn new() -> Self {
        let mut hart = Self {
            csrs: [0; CSR_COUNT],
            ram: vec![0; RAM_SIZE as usize],
            faults: BTreeSet::new(),
            store_faults: BTreeSet::new(),
            barrier_accesses: 0,
        };
        hart.write_csr(Csr::Mtvec, TRAP_VECTOR);
        hart
    }

    /// Let every access that touches `address` fault with a page fault
    pub fn fault_at(&mut self, address: u32) {
        self.faults.insert(address);
    }

    /// Let only stores that touch `address` fault with a page fault, loads still succeed
    pub fn fault_store_at(&mut self, address: u32) {
        self.store_faults.insert(address);
    }

    fn offset(address: u32) -> usize {
        (address - RAM_BASE) as usize
    }

    pub fn poke_bytes(&mut self, address: u32, bytes: &[u8]) {
        let start = Self::offset(address);
        self.ram[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub fn poke_word(&mut self, address: u32, value: u32) {
        self.poke_bytes(address, &value.to_le_bytes());
    }

    pub fn peek_bytes(&self, address: u32, len: usize) -> Vec<u8> {
        let start = Self::offset(address);
        self.ram[start..start + len].to_vec()
    }

    pub fn peek_word(&self, address: u32) -> u32 {
        let start = Self::offset(address);
        u32::from_le_bytes([
            self.ram[start],
            self.ram[start + 1],
            self.ram[start + 2],
            self.ram[start + 3],
        ])
    }

    /// Simulate the checks the hardware does for a single access
    fn check_access(
        &mut self,
        address: u32,
        width: AccessWidth,
        misaligned: Exception,
        access: Exception,
        page: Exception,
        store: bool,
    ) -> Result<(), AccessFault> {
        self.barrier_accesses += 1;
        self.write_csr(Csr::Mtvec, BARRIER_VECTOR);

        let len = match width {
            AccessWidth::Byte => 1,
            AccessWidth::Word => 4,
        };
        let fault = |cause: Exception| AccessFault {
            address,
            cause: cause.into(),
        };
        if address % len != 0 {
            return Err(fault(misaligned));
        }
        if address < RAM_BASE || address - RAM_BASE > RAM_SIZE - len {
            return Err(fault(access));
        }
        let faulting = |a: &u32| self.faults.contains(a) || (store && self.store_faults.contains(a));
        if (address..address + len).any(|a| faulting(&a)) {
            return Err(fault(page));
        }
        Ok(())
    }
}

impl Hart for MockHart {
    fn read_csr(&self, csr: Csr) -> u32 {
        self.csrs[csr as usize]
    }

    fn write_csr(&mut self, csr: Csr, value: u32) {
        self.csrs[csr as usize] = value;
    }

    fn trap_vector(&self) -> u32 {
        TRAP_VECTOR
    }

    fn try_load(&mut self, address: u32, width: AccessWidth) -> Result<u32, AccessFault> {
        self.check_access(
            address,
            width,
            Exception::LoadAddressMisaligned,
            Exception::LoadAccessFault,
            Exception::LoadPageFault,
            false,
        )?;
        Ok(match width {
            AccessWidth::Byte => self.ram[Self::offset(address)] as u32,
            AccessWidth::Word => self.peek_word(address),
        })
    }

    fn try_store(&mut self, address: u32, width: AccessWidth, value: u32) -> Result<(), AccessFault> {
        self.check_access(
            address,
            width,
            Exception::StoreAddressMisaligned,
            Exception::StoreAccessFault,
            Exception::StorePageFault,
            true,
        )?;
        match width {
            AccessWidth::Byte => self.poke_bytes(address, &[value as u8]),
            AccessWidth::Word => self.poke_word(address, value),
        }
        Ok(())
    }
}

/// A platform with a scripted console input and a free running timer
#[derive(Default)]
pub struct MockPlatform {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
    pub time: u64,
    pub compare: Option<u64>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Console for MockPlatform {
    fn try_read(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn write(&mut self, byte: u8) {
        self.output.push(byte)
    }
}

impl Timer for MockPlatform {
    fn read_low(&mut self) -> u32 {
        self.time as u32
    }

    fn read_high(&mut self) -> u32 {
        (self.time >> 32) as u32
    }

    fn write_compare(&mut self, low: u32, high: u32) {
        self.compare = Some((high as u64) << 32 | low as u64);
    }
}

impl Platform for MockPlatform {
    fn halt(&mut self) -> ! {
        panic!("machine halted")
    }
}

std::thread_local! {
    static RECORDS: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

/// A logger that keeps the messages of each test thread apart
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| records.borrow_mut().push(format!("{}", record.args())));
    }

    fn flush(&self) {}
}

static CAPTURE_LOGGER: CaptureLogger = CaptureLogger;

/// Run `f` and return its result together with the messages it logged on this thread
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = log::set_logger(&CAPTURE_LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });

    RECORDS.with(|records| records.borrow_mut().clear());
    let result = f();
    let records = RECORDS.with(|records| records.borrow_mut().drain(..).collect());
    (result, records)
}
