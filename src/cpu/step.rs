//! The step engine (component G): one `DoStep` per retired instruction
//! or REP iteration, with interrupt/trap sampling at each boundary.
//!
//! Grounded on `spec.md` §4.G, since `original_source` has no
//! equivalent single entry point (its CPU runs its whole instruction
//! loop inline). The ordering below — snapshot old FLAGS, check HALT,
//! deliver #DB, deliver NMI, deliver INTR, then dispatch — is taken
//! directly from that section, as is the rule that `old_flags` (not the
//! live FLAGS) gates TF/IF: an instruction that just cleared TF or IF
//! still lets one more trap/interrupt through before the change takes
//! effect.

use crate::backend::Backend;
use crate::cpu::exception::{StepResult, Vector};
use crate::cpu::state::flag::{IF, TF};
use crate::cpu::{dispatch, exception::Status, prefix, signal::NO_INTERRUPT, Cpu};

pub fn do_step(cpu: &mut Cpu, backend: &mut dyn Backend) -> StepResult {
    let old_flags = cpu.state().flags;

    if cpu.signals_halted() {
        log::trace!("step: CPU parked in HALT");
        return StepResult::Halt;
    }

    if old_flags & TF != 0 {
        log::debug!("step: delivering #DB, TF was set before this step");
        cpu.deliver_interrupt(backend, Vector::Debug.number());
        cpu.set_old_flags(cpu.state().flags);
        return StepResult::Normal;
    }

    if cpu.signals_take_nmi() {
        log::debug!("step: delivering NMI");
        cpu.deliver_interrupt(backend, Vector::Nmi.number());
        cpu.set_old_flags(cpu.state().flags);
        return StepResult::Normal;
    }

    if old_flags & IF != 0 {
        let intr = cpu.signals_read_intr();
        if intr != NO_INTERRUPT {
            log::debug!("step: delivering INTR vector {intr:#04x}");
            cpu.deliver_interrupt(backend, intr as u8);
            cpu.set_old_flags(cpu.state().flags);
            return StepResult::Normal;
        }
    }

    let prev_ip = cpu.state().ip;
    loop {
        let prefixes = prefix::parse(cpu, backend);
        let op = cpu.fetch_byte(backend);
        log::trace!("step: dispatching opcode {op:#04x} at ip {prev_ip:#06x}");
        let handler = dispatch::handler_for(op);
        match handler(cpu, backend, prefixes, op) {
            Ok(Status::Continue) => continue,
            Ok(Status::Repeat) => {
                cpu.rewind_ip_to(prev_ip);
                break;
            }
            Ok(Status::Halt) => {
                log::debug!("step: HLT reached at ip {prev_ip:#06x}");
                cpu.set_old_flags(cpu.state().flags);
                return StepResult::Halt;
            }
            Ok(Status::Normal) => break,
            Err(vector) => {
                log::warn!("step: {vector} raised at ip {prev_ip:#06x}, rewinding and delivering");
                cpu.rewind_ip_to(prev_ip);
                cpu.deliver_interrupt(backend, vector.number());
                break;
            }
        }
    }

    cpu.set_old_flags(cpu.state().flags);
    StepResult::Normal
}
