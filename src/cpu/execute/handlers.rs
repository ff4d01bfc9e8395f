//! Handlers with no operands worth their own module: NOP, HLT, undefined
//! opcodes, FWAIT, and ESC (decode-and-discard).

use crate::backend::Backend;
use crate::cpu::exception::{HandlerResult, Status, Vector};
use crate::cpu::modrm;
use crate::cpu::prefix::Prefixes;
use crate::cpu::Cpu;

pub fn nop(_cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    Ok(Status::Normal)
}

/// HLT (0xF4). Latches the internal halt signal so the step engine keeps
/// parking on `Halt` on every subsequent `Step()`, not just this one.
/// `SetNMI`/`SetINTR` clear the latch as a side effect of arming (see
/// `signal::SignalState`), and a host can also clear it directly with
/// `SetHalt(false)`.
pub fn hlt(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    cpu.set_halt(true);
    Ok(Status::Halt)
}

/// Every reserved/undefined 8086 opcode: 0x60-0x6F, 0xC8/0xC9, 0xD6,
/// 0xF1. One instruction "retires" (IP already past the opcode byte, as
/// for any other fault) and #UD is delivered.
pub fn undefined(_cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    Err(Vector::InvalidOpcode)
}

/// FWAIT (0x9B): a no-op with no FPU to wait on.
pub fn fwait(_cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    Ok(Status::Normal)
}

/// ESC (0xD8-0xDF): decode the ModR/M byte (and its displacement, if
/// any) and discard it — there is no FPU to hand the operand to.
pub fn esc(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    modrm::decode(cpu, backend);
    Ok(Status::Normal)
}

/// Every legacy-prefix opcode's dispatch-table slot. Unreachable in
/// practice: [`crate::cpu::prefix::parse`] consumes these bytes before
/// the step engine ever dispatches on them. Kept so the table stays a
/// complete 256-entry map, and returns `Continue` in case it is ever
/// reached so the step loop just re-dispatches rather than faulting.
pub fn prefix_byte(_cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    Ok(Status::Continue)
}
