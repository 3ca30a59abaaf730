//! Dispatching of machine mode traps
//!
//! Every trap ends in one of three ways:
//! - the trapped code resumes after the emulated instruction (or at the same place after an interrupt)
//! - the trap is forwarded to the supervisor because an emulated access faulted
//! - the machine halts because the trap cannot be handled

use crate::accessor;
use crate::context::{Machine, Register};
use crate::decode::{self, Instruction, Operation};
use crate::delegate::{delegate_to_supervisor, TrapState};
use crate::emulate::execute;
use crate::error::{AccessFault, EmulationError, Unsupported};
use crate::hart::{Csr, Hart};
use crate::platform::Platform;
use crate::sbi::SbiCall;
use riscv::cpu::InterruptBits;
use riscv::trap::{Exception, Interrupt, TrapEvent};

/// How a trap was resolved
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TrapOutcome {
    Resumed,
    Delegated(AccessFault),
    Halted(Unsupported),
}

/// Handle the trap that is described by the machine trap CSRs of `machine.hart`.
///
/// On [`TrapOutcome::Resumed`] and [`TrapOutcome::Delegated`] the primary trap vector is installed again.
/// A halt has to be carried out by the caller.
pub fn handle_trap<H: Hart, P: Platform>(machine: &mut Machine<'_, H, P>) -> TrapOutcome {
    let state = TrapState::capture(&machine.hart);

    let outcome = match TrapEvent::from(state.mcause) {
        TrapEvent::Interrupt(interrupt) => handle_interrupt(&mut machine.hart, interrupt),
        TrapEvent::Exception(exception) => match emulate_exception(machine, exception, &state) {
            Ok(()) => {
                machine.hart.write_csr(Csr::Mepc, state.mepc.wrapping_add(4));
                TrapOutcome::Resumed
            }
            Err(EmulationError::Fault(fault)) => {
                log::debug!(
                    "delegating {:?} at {:#010x} to the supervisor: {}",
                    exception,
                    state.mepc,
                    fault
                );
                delegate_to_supervisor(&mut machine.hart, &state);
                TrapOutcome::Delegated(fault)
            }
            Err(EmulationError::Unsupported(reason)) => TrapOutcome::Halted(reason),
        },
    };

    if outcome == TrapOutcome::Resumed {
        machine.hart.restore_trap_vector();
    }
    outcome
}

/// Turn a machine timer tick into a supervisor timer interrupt.
///
/// The machine timer interrupt stays disabled until the supervisor programs the next deadline.
fn handle_interrupt(hart: &mut impl Hart, interrupt: Interrupt) -> TrapOutcome {
    match interrupt {
        Interrupt::MachineTimerInterrupt => {
            hart.set_csr(Csr::Sip, InterruptBits::SupervisorTimerInterrupt.bits());
            hart.clear_csr(Csr::Mie, InterruptBits::MachineTimerInterrupt.bits());
            TrapOutcome::Resumed
        }
        other => TrapOutcome::Halted(Unsupported::Interrupt(other.into())),
    }
}

fn emulate_exception<H: Hart, P: Platform>(
    machine: &mut Machine<'_, H, P>,
    exception: Exception,
    state: &TrapState,
) -> Result<(), EmulationError> {
    let operation = match exception {
        Exception::LoadAddressMisaligned => {
            let instruction = accessor::fetch_instruction(&mut machine.hart, state.mepc)?;
            decode::decode_load(Instruction(instruction), state.mbadaddr)?
        }
        Exception::StoreAddressMisaligned => {
            let instruction = accessor::fetch_instruction(&mut machine.hart, state.mepc)?;
            decode::decode_store(Instruction(instruction), state.mbadaddr)?
        }
        Exception::IllegalInstruction => {
            let instruction = illegal_instruction(&mut machine.hart, state)?;
            decode::decode_illegal(instruction)?
        }
        Exception::EnvCallFromSMode => {
            Operation::Sbi(SbiCall::try_from(machine.read_register(Register::A7))?)
        }
        other => return Err(Unsupported::Exception(other.into()).into()),
    };
    execute(machine, operation)
}

/// The VexRiscv reports the bits of an illegal instruction in `mbadaddr`.
/// Should that be zero, the instruction is fetched from memory instead.
fn illegal_instruction(hart: &mut impl Hart, state: &TrapState) -> Result<Instruction, AccessFault> {
    if state.mbadaddr != 0 {
        return Ok(Instruction(state.mbadaddr));
    }
    accessor::fetch_instruction(hart, state.mepc).map(Instruction)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::TrapFrame;
    use crate::testing::{MockHart, MockPlatform, BARRIER_VECTOR, RAM_BASE, TRAP_VECTOR};
    use riscv::cpu::MStatusFlags;

    const LOAD_MISALIGNED: u32 = 4;
    const STORE_MISALIGNED: u32 = 6;
    const ILLEGAL_INSTRUCTION: u32 = 2;
    const ECALL_FROM_S: u32 = 9;
    const MACHINE_TIMER: u32 = 0x8000_0007;

    /// The trapping code lives here
    const PC: u32 = RAM_BASE + 0x100;
    /// Misaligned data lives here
    const DATA: u32 = RAM_BASE + 0x201;
    const STVEC: u32 = 0xC000_2000;

    fn trapped(mcause: u32, mbadaddr: u32) -> MockHart {
        let mut hart = MockHart::new();
        hart.write_csr(Csr::Mcause, mcause);
        hart.write_csr(Csr::Mepc, PC);
        hart.write_csr(Csr::Mbadaddr, mbadaddr);
        hart.write_csr(Csr::Mstatus, (MStatusFlags::MPP_SUPERVISOR | MStatusFlags::SIE).bits());
        hart.write_csr(Csr::Stvec, STVEC);
        hart
    }

    #[test]
    fn misaligned_word_load_lands_in_rd() {
        let mut hart = trapped(LOAD_MISALIGNED, DATA);
        // lw x5, 0(x10)
        hart.poke_word(PC, 0x0005_2283);
        hart.poke_bytes(DATA, &[0xef, 0xbe, 0xad, 0xde]);
        let mut frame = TrapFrame::default();
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(handle_trap(&mut machine), TrapOutcome::Resumed);
        assert_eq!(machine.read_register(Register::from_field(5)), 0xdead_beef);
        assert_eq!(machine.hart.read_csr(Csr::Mepc), PC + 4);
        assert_eq!(machine.hart.read_csr(Csr::Mtvec), TRAP_VECTOR);
    }

    #[test]
    fn faulting_byte_delegates_the_original_trap() {
        let mut hart = trapped(LOAD_MISALIGNED, DATA);
        hart.poke_word(PC, 0x0005_2283);
        hart.fault_at(DATA + 3);
        let mut frame = TrapFrame::default();
        frame.regs[5] = 0x5555;
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        let outcome = handle_trap(&mut machine);

        assert!(matches!(
            outcome,
            TrapOutcome::Delegated(AccessFault { address, .. }) if address == DATA + 3
        ));
        let hart = &machine.hart;
        assert_eq!(hart.read_csr(Csr::Sbadaddr), DATA);
        assert_eq!(hart.read_csr(Csr::Scause), LOAD_MISALIGNED);
        assert_eq!(hart.read_csr(Csr::Sepc), PC);
        assert_eq!(hart.read_csr(Csr::Mepc), STVEC);
        assert_eq!(hart.read_csr(Csr::Mtvec), TRAP_VECTOR);
        let status = MStatusFlags::from_bits_retain(hart.read_csr(Csr::Mstatus));
        assert!(status.contains(MStatusFlags::SPP | MStatusFlags::SPIE));
        assert!(!status.contains(MStatusFlags::SIE));
        assert_eq!(machine.read_register(Register::from_field(5)), 0x5555);
    }

    #[test]
    fn misaligned_store_writes_rs2() {
        let mut hart = trapped(STORE_MISALIGNED, DATA);
        // sw x6, 0(x10)
        hart.poke_word(PC, 0x0065_2023);
        let mut frame = TrapFrame::default();
        frame.regs[6] = 0x0403_0201;
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(handle_trap(&mut machine), TrapOutcome::Resumed);
        assert_eq!(machine.hart.peek_bytes(DATA, 4), [1, 2, 3, 4]);
        assert_eq!(machine.hart.read_csr(Csr::Mepc), PC + 4);
    }

    #[test]
    fn trap_vector_is_restored_after_any_number_of_barriers() {
        for (cause, instruction) in [(LOAD_MISALIGNED, 0x0005_1283), (STORE_MISALIGNED, 0x0065_2023)] {
            let mut hart = trapped(cause, DATA);
            hart.poke_word(PC, instruction);
            let mut frame = TrapFrame::default();
            let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

            handle_trap(&mut machine);
            assert!(machine.hart.barrier_accesses > 1);
            assert_eq!(machine.hart.read_csr(Csr::Mtvec), TRAP_VECTOR);
        }
    }

    #[test]
    fn compressed_load_halts() {
        let mut hart = trapped(LOAD_MISALIGNED, DATA);
        // c.lw x14, 0(x15)
        hart.poke_word(PC, 0x0000_4398);
        let mut frame = TrapFrame::default();
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(
            handle_trap(&mut machine),
            TrapOutcome::Halted(Unsupported::CompressedInstruction(0x4398))
        );
    }

    #[test]
    fn unfetchable_instruction_is_delegated() {
        let mut hart = trapped(LOAD_MISALIGNED, DATA);
        hart.fault_at(PC);
        let mut frame = TrapFrame::default();
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert!(matches!(handle_trap(&mut machine), TrapOutcome::Delegated(_)));
        assert_eq!(machine.hart.read_csr(Csr::Sepc), PC);
    }

    #[test]
    fn amo_uses_instruction_from_mbadaddr() {
        // amoadd.w x5, x7, (x6)
        let amoadd = 0x0073_22af;
        let mut hart = trapped(ILLEGAL_INSTRUCTION, amoadd);
        hart.poke_word(DATA + 3, 40);
        let mut frame = TrapFrame::default();
        frame.regs[6] = DATA + 3;
        frame.regs[7] = 2;
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(handle_trap(&mut machine), TrapOutcome::Resumed);
        assert_eq!(machine.read_register(Register::from_field(5)), 40);
        assert_eq!(machine.hart.peek_word(DATA + 3), 42);
        assert_eq!(machine.hart.read_csr(Csr::Mepc), PC + 4);
        assert_eq!(machine.hart.read_csr(Csr::Mtvec), TRAP_VECTOR);
    }

    #[test]
    fn amo_fault_delegates() {
        let amoswap = 0x0873_22af;
        let hart = trapped(ILLEGAL_INSTRUCTION, amoswap);
        let mut frame = TrapFrame::default();
        frame.regs[6] = 0x1000;
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert!(matches!(handle_trap(&mut machine), TrapOutcome::Delegated(_)));
        assert_eq!(machine.hart.read_csr(Csr::Scause), ILLEGAL_INSTRUCTION);
        assert_eq!(machine.hart.read_csr(Csr::Sbadaddr), amoswap);
    }

    #[test]
    fn amo_store_fault_delegates_without_side_effects() {
        // amoadd.w x5, x7, (x6)
        let amoadd = 0x0073_22af;
        let mut hart = trapped(ILLEGAL_INSTRUCTION, amoadd);
        hart.poke_word(DATA + 3, 40);
        hart.fault_store_at(DATA + 3);
        let mut frame = TrapFrame::default();
        frame.regs[5] = 0x77;
        frame.regs[6] = DATA + 3;
        frame.regs[7] = 2;
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(
            handle_trap(&mut machine),
            TrapOutcome::Delegated(AccessFault {
                address: DATA + 3,
                cause: Exception::StorePageFault.into(),
            })
        );
        assert_eq!(machine.read_register(Register::from_field(5)), 0x77);
        let hart = &machine.hart;
        assert_eq!(hart.peek_word(DATA + 3), 40);
        assert_eq!(hart.read_csr(Csr::Scause), ILLEGAL_INSTRUCTION);
        assert_eq!(hart.read_csr(Csr::Sbadaddr), amoadd);
        assert_eq!(hart.read_csr(Csr::Sepc), PC);
        assert_eq!(hart.read_csr(Csr::Mepc), STVEC);
        assert_eq!(hart.read_csr(Csr::Mtvec), TRAP_VECTOR);
    }

    #[test]
    fn misaligned_store_fault_delegates_the_original_trap() {
        let mut hart = trapped(STORE_MISALIGNED, DATA);
        // sw x6, 0(x10)
        hart.poke_word(PC, 0x0065_2023);
        hart.fault_store_at(DATA + 1);
        let mut frame = TrapFrame::default();
        frame.regs[6] = 0x0403_0201;
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(
            handle_trap(&mut machine),
            TrapOutcome::Delegated(AccessFault {
                address: DATA + 1,
                cause: Exception::StorePageFault.into(),
            })
        );
        let hart = &machine.hart;
        // bytes before the faulting one are already written, like on hardware
        assert_eq!(hart.peek_bytes(DATA, 4), [1, 0, 0, 0]);
        assert_eq!(hart.read_csr(Csr::Scause), STORE_MISALIGNED);
        assert_eq!(hart.read_csr(Csr::Sbadaddr), DATA);
        assert_eq!(hart.read_csr(Csr::Sepc), PC);
        assert_eq!(hart.read_csr(Csr::Mepc), STVEC);
        assert_eq!(hart.read_csr(Csr::Mtvec), TRAP_VECTOR);
    }

    #[test]
    fn illegal_instruction_is_fetched_when_mbadaddr_is_empty() {
        let mut hart = trapped(ILLEGAL_INSTRUCTION, 0);
        // rdtime x10
        hart.poke_word(PC, 0xc010_2573);
        let mut frame = TrapFrame::default();
        let mut platform = MockPlatform::new();
        platform.time = 0x0000_0001_0000_0010;
        let mut machine = Machine::new(hart, platform, &mut frame);

        assert_eq!(handle_trap(&mut machine), TrapOutcome::Resumed);
        assert_eq!(machine.read_register(Register::A0), 0x10);
        assert_eq!(machine.hart.read_csr(Csr::Mepc), PC + 4);
    }

    #[test]
    fn csr_write_halts() {
        // csrw time, x5
        let hart = trapped(ILLEGAL_INSTRUCTION, 0xc012_9073);
        let mut frame = TrapFrame::default();
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(
            handle_trap(&mut machine),
            TrapOutcome::Halted(Unsupported::CsrWrite(0xC01))
        );
        assert_eq!(machine.hart.read_csr(Csr::Mepc), PC);
    }

    #[test]
    fn sbi_set_timer() {
        let mut hart = trapped(ECALL_FROM_S, 0);
        hart.write_csr(Csr::Sip, InterruptBits::SupervisorTimerInterrupt.bits());
        let mut frame = TrapFrame::default();
        frame.regs[17] = 0;
        frame.regs[10] = 1000;
        frame.regs[11] = 0;
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(handle_trap(&mut machine), TrapOutcome::Resumed);
        assert_eq!(machine.platform.compare, Some(1000));
        assert_ne!(
            machine.hart.read_csr(Csr::Mie) & InterruptBits::MachineTimerInterrupt.bits(),
            0
        );
        assert_eq!(
            machine.hart.read_csr(Csr::Sip) & InterruptBits::SupervisorTimerInterrupt.bits(),
            0
        );
        assert_eq!(machine.hart.read_csr(Csr::Mepc), PC + 4);
    }

    #[test]
    fn unknown_sbi_call_halts() {
        let hart = trapped(ECALL_FROM_S, 0);
        let mut frame = TrapFrame::default();
        frame.regs[17] = 0x10;
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(
            handle_trap(&mut machine),
            TrapOutcome::Halted(Unsupported::SbiCall(0x10))
        );
    }

    #[test]
    fn machine_timer_becomes_supervisor_timer() {
        let mut hart = trapped(MACHINE_TIMER, 0);
        hart.write_csr(Csr::Mie, InterruptBits::MachineTimerInterrupt.bits());
        let mut frame = TrapFrame::default();
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(handle_trap(&mut machine), TrapOutcome::Resumed);
        assert_eq!(
            machine.hart.read_csr(Csr::Sip),
            InterruptBits::SupervisorTimerInterrupt.bits()
        );
        assert_eq!(machine.hart.read_csr(Csr::Mie), 0);
        assert_eq!(machine.hart.read_csr(Csr::Mepc), PC);
    }

    #[test]
    fn other_interrupts_halt() {
        let hart = trapped(0x8000_000b, 0);
        let mut frame = TrapFrame::default();
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(
            handle_trap(&mut machine),
            TrapOutcome::Halted(Unsupported::Interrupt(11))
        );
    }

    #[test]
    fn other_exceptions_halt() {
        let hart = trapped(3, 0);
        let mut frame = TrapFrame::default();
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(
            handle_trap(&mut machine),
            TrapOutcome::Halted(Unsupported::Exception(3))
        );
        assert_eq!(machine.hart.barrier_accesses, 0);
    }

    #[test]
    fn halting_leaves_the_barrier_vector_alone() {
        let mut hart = trapped(LOAD_MISALIGNED, DATA);
        // lbu does not trap when misaligned
        hart.poke_word(PC, 0x0005_4283);
        let mut frame = TrapFrame::default();
        let mut machine = Machine::new(hart, MockPlatform::new(), &mut frame);

        assert_eq!(
            handle_trap(&mut machine),
            TrapOutcome::Halted(Unsupported::LoadWidth(4))
        );
        assert_eq!(machine.hart.read_csr(Csr::Mtvec), BARRIER_VECTOR);
    }
}
