//! Decoding of the instructions that the firmware emulates
//!
//! [`Instruction`] only extracts bit fields.
//! Turning fields into an [`Operation`] is where unsupported encodings are rejected.

use crate::context::Register;
use crate::error::Unsupported;
use crate::sbi::SbiCall;
use riscv::cpu::counters;

/// Major opcode of the atomic memory operations
pub const OPCODE_AMO: u32 = 0x2f;
/// Major opcode of the system instructions, which include the CSR accesses
pub const OPCODE_SYSTEM: u32 = 0x73;

/// A raw instruction word
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Instruction(pub u32);

impl Instruction {
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is a 16-bit instruction of the C extension
    pub const fn is_compressed(self) -> bool {
        self.0 & 0b11 != 0b11
    }

    pub const fn opcode(self) -> u32 {
        self.0 & 0x7f
    }

    pub const fn funct3(self) -> u32 {
        (self.0 >> 12) & 0x7
    }

    pub const fn rd(self) -> Register {
        Register::from_field(self.0 >> 7)
    }

    pub const fn rs1(self) -> Register {
        Register::from_field(self.0 >> 15)
    }

    pub const fn rs2(self) -> Register {
        Register::from_field(self.0 >> 20)
    }

    /// The `funct5` field which selects the atomic memory operation
    pub const fn amo_selector(self) -> u32 {
        self.0 >> 27
    }

    pub const fn csr_address(self) -> u16 {
        (self.0 >> 20) as u16
    }
}

/// Kinds of loads the hardware refuses to do misaligned
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadKind {
    /// `lh`, sign extended
    Half,
    /// `lw`
    Word,
    /// `lhu`, zero extended
    HalfUnsigned,
}

impl TryFrom<u32> for LoadKind {
    type Error = Unsupported;

    fn try_from(funct3: u32) -> Result<Self, Self::Error> {
        match funct3 {
            1 => Ok(LoadKind::Half),
            2 => Ok(LoadKind::Word),
            5 => Ok(LoadKind::HalfUnsigned),
            other => Err(Unsupported::LoadWidth(other)),
        }
    }
}

/// Kinds of stores the hardware refuses to do misaligned
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StoreKind {
    /// `sh`
    Half,
    /// `sw`
    Word,
}

impl TryFrom<u32> for StoreKind {
    type Error = Unsupported;

    fn try_from(funct3: u32) -> Result<Self, Self::Error> {
        match funct3 {
            1 => Ok(StoreKind::Half),
            2 => Ok(StoreKind::Word),
            other => Err(Unsupported::StoreWidth(other)),
        }
    }
}

/// The 32-bit atomic memory operations
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AmoOp {
    Add,
    Swap,
    /// `lr.w` is executed by the hardware.
    /// It only traps when the cpu is configured without reservation support, in which case it is not emulated.
    LoadReserved,
    /// `sc.w`, see [`AmoOp::LoadReserved`]
    StoreConditional,
    Xor,
    And,
    Or,
    Min,
    Max,
    MinUnsigned,
    MaxUnsigned,
}

impl TryFrom<u32> for AmoOp {
    type Error = Unsupported;

    fn try_from(selector: u32) -> Result<Self, Self::Error> {
        match selector {
            0x00 => Ok(AmoOp::Add),
            0x01 => Ok(AmoOp::Swap),
            0x02 => Ok(AmoOp::LoadReserved),
            0x03 => Ok(AmoOp::StoreConditional),
            0x04 => Ok(AmoOp::Xor),
            0x0c => Ok(AmoOp::And),
            0x08 => Ok(AmoOp::Or),
            0x10 => Ok(AmoOp::Min),
            0x14 => Ok(AmoOp::Max),
            0x18 => Ok(AmoOp::MinUnsigned),
            0x1c => Ok(AmoOp::MaxUnsigned),
            other => Err(Unsupported::AmoSelector(other)),
        }
    }
}

impl AmoOp {
    /// Compute the value that is stored back to memory when `old` was read from it and `src` is the source operand.
    ///
    /// Returns `None` for the reservation based operations which are not emulated.
    pub fn apply(self, src: u32, old: u32) -> Option<u32> {
        Some(match self {
            AmoOp::Add => src.wrapping_add(old),
            AmoOp::Swap => src,
            AmoOp::Xor => src ^ old,
            AmoOp::And => src & old,
            AmoOp::Or => src | old,
            AmoOp::Min => (src as i32).min(old as i32) as u32,
            AmoOp::Max => (src as i32).max(old as i32) as u32,
            AmoOp::MinUnsigned => src.min(old),
            AmoOp::MaxUnsigned => src.max(old),
            AmoOp::LoadReserved | AmoOp::StoreConditional => return None,
        })
    }
}

/// Which half of the 64-bit machine timer a counter CSR reads
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CounterHalf {
    Low,
    High,
}

impl TryFrom<u16> for CounterHalf {
    type Error = Unsupported;

    /// `cycle`, `time` and `instret` all read the machine timer because the cpu implements none of them.
    fn try_from(address: u16) -> Result<Self, Self::Error> {
        match address {
            counters::CYCLE | counters::TIME | counters::INSTRET => Ok(CounterHalf::Low),
            counters::CYCLEH | counters::TIMEH | counters::INSTRETH => Ok(CounterHalf::High),
            other => Err(Unsupported::CsrAddress(other)),
        }
    }
}

/// A decoded trap that the firmware can emulate
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Operation {
    UnalignedLoad {
        kind: LoadKind,
        rd: Register,
        address: u32,
    },
    UnalignedStore {
        kind: StoreKind,
        src: Register,
        address: u32,
    },
    Atomic {
        op: AmoOp,
        rd: Register,
        addr: Register,
        src: Register,
    },
    CounterRead {
        half: CounterHalf,
        rd: Register,
    },
    Sbi(SbiCall),
}

fn reject_compressed(instruction: Instruction) -> Result<(), Unsupported> {
    if instruction.is_compressed() {
        Err(Unsupported::CompressedInstruction(instruction.raw() & 0xffff))
    } else {
        Ok(())
    }
}

/// Decode the load that raised a misaligned load exception for `address`
pub fn decode_load(instruction: Instruction, address: u32) -> Result<Operation, Unsupported> {
    reject_compressed(instruction)?;
    Ok(Operation::UnalignedLoad {
        kind: LoadKind::try_from(instruction.funct3())?,
        rd: instruction.rd(),
        address,
    })
}

/// Decode the store that raised a misaligned store exception for `address`
pub fn decode_store(instruction: Instruction, address: u32) -> Result<Operation, Unsupported> {
    reject_compressed(instruction)?;
    Ok(Operation::UnalignedStore {
        kind: StoreKind::try_from(instruction.funct3())?,
        src: instruction.rs2(),
        address,
    })
}

/// Decode an instruction that raised an illegal instruction exception
pub fn decode_illegal(instruction: Instruction) -> Result<Operation, Unsupported> {
    reject_compressed(instruction)?;
    match instruction.opcode() {
        OPCODE_AMO => decode_amo(instruction),
        OPCODE_SYSTEM => decode_csr(instruction),
        _ => Err(Unsupported::Opcode(instruction.raw())),
    }
}

fn decode_amo(instruction: Instruction) -> Result<Operation, Unsupported> {
    match instruction.funct3() {
        0x2 => Ok(Operation::Atomic {
            op: AmoOp::try_from(instruction.amo_selector())?,
            rd: instruction.rd(),
            addr: instruction.rs1(),
            src: instruction.rs2(),
        }),
        other => Err(Unsupported::AmoWidth(other)),
    }
}

/// Only reads of the counter CSRs are emulated.
///
/// `csrrw` always writes.
/// `csrrs` and `csrrc` (and their immediate forms) only write when their `rs1` field is not zero.
/// Because all emulated CSRs are read only, every write is rejected.
fn decode_csr(instruction: Instruction) -> Result<Operation, Unsupported> {
    let writes = match instruction.funct3() & 0b11 {
        0 => return Err(Unsupported::CsrMode(instruction.raw())),
        1 => true,
        _ => instruction.rs1() != Register::ZERO,
    };
    let address = instruction.csr_address();
    let half = CounterHalf::try_from(address)?;
    if writes {
        return Err(Unsupported::CsrWrite(address));
    }
    Ok(Operation::CounterRead {
        half,
        rd: instruction.rd(),
    })
}
