//! PUSH/POP r16 (0x50-0x5F), segment PUSH/POP, PUSHF/POPF, Grp5 POP r/m.
//!
//! Grounded on `original_source/src/cpu.cpp`'s `PushReg`/`PopReg`/
//! `PushSeg`/`PopSeg`/`Pushf`/`Popf`. `PushSeg`/`PopSeg` there index with
//! `(op >> 3) & 3`, which only ever reaches ES/CS/SS/DS — the 8086 has no
//! one-byte PUSH FS/PUSH GS encoding (those arrived with the 80386), so
//! there is no reserved-encoding case to fault on here (`spec.md` §9).

use crate::backend::Backend;
use crate::cpu::exception::{HandlerResult, Status, Vector};
use crate::cpu::modrm;
use crate::cpu::prefix::Prefixes;
use crate::cpu::state::{Register, SegmentRegister, WORD};
use crate::cpu::Cpu;

const SEGMENTS: [SegmentRegister; 4] =
    [SegmentRegister::ES, SegmentRegister::CS, SegmentRegister::SS, SegmentRegister::DS];

/// PUSH r16 (0x50-0x57). `op & 7` selects the register.
pub fn push_reg(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, op: u8) -> HandlerResult {
    let value = cpu.state().read_reg(op & 7, WORD);
    cpu.push(backend, WORD, value);
    Ok(Status::Normal)
}

/// POP r16 (0x58-0x5F). `op & 7` selects the register.
pub fn pop_reg(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, op: u8) -> HandlerResult {
    let value = cpu.pop(backend, WORD);
    cpu.state_mut().write_reg(op & 7, WORD, value);
    Ok(Status::Normal)
}

/// PUSH sreg (0x06, 0x0E, 0x16, 0x1E). `(op >> 3) & 3` selects ES/CS/SS/DS.
pub fn push_sreg(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, op: u8) -> HandlerResult {
    let seg = SEGMENTS[((op >> 3) & 3) as usize];
    let value = cpu.state().read_seg(seg);
    cpu.push(backend, WORD, value);
    Ok(Status::Normal)
}

/// POP sreg (0x07, 0x17, 0x1F). 0x0F is the two-byte escape, not POP CS.
pub fn pop_sreg(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, op: u8) -> HandlerResult {
    let seg = SEGMENTS[((op >> 3) & 3) as usize];
    let value = cpu.pop(backend, WORD);
    cpu.state_mut().write_seg(seg, value);
    Ok(Status::Normal)
}

/// PUSHF (0x9C): FLAGS onto the stack unmodified.
pub fn pushf(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let flags = cpu.state().flags;
    cpu.push(backend, WORD, flags);
    Ok(Status::Normal)
}

/// POPF (0x9D): restore FLAGS wholesale, including TF/IF — the step
/// engine samples `old_flags` from *before* this retires, so a POPF that
/// sets TF still lets this instruction finish before the trap fires.
pub fn popf(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let flags = cpu.pop(backend, WORD);
    cpu.state_mut().flags = flags;
    Ok(Status::Normal)
}

/// Grp POP r/m16 (0x8F). Only reg field 0 is defined; anything else is
/// reserved and raises #UD.
pub fn pop_rm(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, _op: u8) -> HandlerResult {
    let modrm = modrm::decode(cpu, backend);
    if modrm.reg != 0 {
        return Err(Vector::InvalidOpcode);
    }
    let value = cpu.pop(backend, WORD);
    modrm::write_rm(cpu, backend, &modrm, &prefixes, WORD, value);
    Ok(Status::Normal)
}
