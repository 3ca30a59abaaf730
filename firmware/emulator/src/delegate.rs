//! Forwarding of machine mode traps to the supervisor
//!
//! The hardware delegates some exceptions directly (see `medeleg`).
//! For traps that arrive in machine mode but belong to the supervisor, the firmware reproduces what hardware
//! delegation would have done: it fills the supervisor trap CSRs, updates `mstatus` as a trap into supervisor mode
//! would and returns into the supervisor's trap vector.

use crate::hart::{Csr, Hart};
use riscv::cpu::MStatusFlags;

/// The machine trap CSRs as they were when the trap was taken.
///
/// They are captured before any emulation so that delegation reports the original trap even if a barrier access
/// changed the CSRs in between.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TrapState {
    pub mepc: u32,
    pub mcause: u32,
    pub mbadaddr: u32,
    pub mstatus: MStatusFlags,
}

impl TrapState {
    pub fn capture(hart: &impl Hart) -> Self {
        Self {
            mepc: hart.read_csr(Csr::Mepc),
            mcause: hart.read_csr(Csr::Mcause),
            mbadaddr: hart.read_csr(Csr::Mbadaddr),
            mstatus: MStatusFlags::from_bits_retain(hart.read_csr(Csr::Mstatus)),
        }
    }
}

/// Compute `mstatus` for returning into the supervisor trap handler.
///
/// - SPP records the privilege mode the trap came from, taken from the low bit of MPP
/// - SPIE records SIE and SIE is cleared
/// - MPP is set to supervisor and MPIE is set, so `mret` enters supervisor mode with machine interrupts enabled
pub fn delegated_status(status: MStatusFlags) -> MStatusFlags {
    let mut delegated = status.difference(
        MStatusFlags::SPP | MStatusFlags::MPP | MStatusFlags::SIE | MStatusFlags::SPIE,
    );
    if status.contains(MStatusFlags::MPP_SUPERVISOR) {
        delegated |= MStatusFlags::SPP;
    }
    if status.contains(MStatusFlags::SIE) {
        delegated |= MStatusFlags::SPIE;
    }
    delegated | MStatusFlags::MPP_SUPERVISOR | MStatusFlags::MPIE
}

/// Make the trap described by `state` appear to the supervisor as if the hardware had delegated it.
///
/// When the trap returns, execution continues at `stvec` in supervisor mode.
pub fn delegate_to_supervisor(hart: &mut impl Hart, state: &TrapState) {
    hart.restore_trap_vector();
    hart.write_csr(Csr::Sbadaddr, state.mbadaddr);
    hart.write_csr(Csr::Scause, state.mcause);
    hart.write_csr(Csr::Sepc, state.mepc);
    let stvec = hart.read_csr(Csr::Stvec);
    hart.write_csr(Csr::Mepc, stvec);
    hart.write_csr(Csr::Mstatus, delegated_status(state.mstatus).bits());
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{MockHart, BARRIER_VECTOR, TRAP_VECTOR};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const SPP: u32 = 1 << 8;
    const MPP: u32 = 0b11 << 11;
    const SIE: u32 = 1 << 1;
    const SPIE: u32 = 1 << 5;
    const MPIE: u32 = 1 << 7;

    /// The arithmetic form of [`delegated_status`]
    fn delegated_bits(m: u32) -> u32 {
        (m & !(SPP | MPP | SIE | SPIE)) | ((m >> 3) & SPP) | (0x0800 | MPIE) | ((m & SIE) << 4)
    }

    #[test]
    fn status_matches_bit_arithmetic() {
        let mut rng = StdRng::seed_from_u64(0xde1e);
        for _ in 0..1000 {
            let m: u32 = rng.gen();
            assert_eq!(
                delegated_status(MStatusFlags::from_bits_retain(m)).bits(),
                delegated_bits(m),
                "mstatus {:#010x}",
                m
            );
        }
    }

    #[test]
    fn trap_from_supervisor_with_interrupts_enabled() {
        let status = MStatusFlags::MPP_SUPERVISOR | MStatusFlags::SIE | MStatusFlags::MPRV;
        let delegated = delegated_status(status);
        assert!(delegated.contains(MStatusFlags::SPP | MStatusFlags::SPIE | MStatusFlags::MPIE));
        assert!(!delegated.contains(MStatusFlags::SIE));
        assert!(delegated.contains(MStatusFlags::MPRV));
        assert_eq!(delegated & MStatusFlags::MPP, MStatusFlags::MPP_SUPERVISOR);
    }

    #[test]
    fn trap_from_user() {
        let delegated = delegated_status(MStatusFlags::SPP);
        assert!(!delegated.contains(MStatusFlags::SPP));
        assert!(!delegated.contains(MStatusFlags::SPIE));
    }

    #[test]
    fn supervisor_sees_the_original_trap() {
        let mut rng = StdRng::seed_from_u64(0x5eb);
        for _ in 0..100 {
            let mut hart = MockHart::new();
            let state = TrapState {
                mepc: rng.gen(),
                mcause: rng.gen_range(0..16),
                mbadaddr: rng.gen(),
                mstatus: MStatusFlags::from_bits_retain(rng.gen()),
            };
            let stvec = rng.gen::<u32>() & !3;
            hart.write_csr(Csr::Stvec, stvec);
            hart.write_csr(Csr::Mtvec, BARRIER_VECTOR);

            delegate_to_supervisor(&mut hart, &state);

            assert_eq!(hart.read_csr(Csr::Scause), state.mcause);
            assert_eq!(hart.read_csr(Csr::Sepc), state.mepc);
            assert_eq!(hart.read_csr(Csr::Sbadaddr), state.mbadaddr);
            assert_eq!(hart.read_csr(Csr::Mepc), stvec);
            assert_eq!(hart.read_csr(Csr::Mtvec), TRAP_VECTOR);

            let status = hart.read_csr(Csr::Mstatus);
            let old = state.mstatus.bits();
            assert_eq!(status & SPP != 0, old & (1 << 11) != 0);
            assert_eq!(status & SPIE != 0, old & SIE != 0);
        }
    }

    #[test]
    fn capture_reads_machine_trap_csrs() {
        let mut hart = MockHart::new();
        hart.write_csr(Csr::Mepc, 0xC000_1000);
        hart.write_csr(Csr::Mcause, 4);
        hart.write_csr(Csr::Mbadaddr, 0xC100_0003);
        hart.write_csr(Csr::Mstatus, 0x0800);
        assert_eq!(
            TrapState::capture(&hart),
            TrapState {
                mepc: 0xC000_1000,
                mcause: 4,
                mbadaddr: 0xC100_0003,
                mstatus: MStatusFlags::MPP_SUPERVISOR,
            }
        );
    }
}
