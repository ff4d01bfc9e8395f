//! MOVS/CMPS/STOS/LODS/SCAS (0xA4-0xA7, 0xAA-0xAF) with REP iteration.
//!
//! The byte-transfer bodies are grounded on `original_source/src/cpu.cpp`'s
//! `Movs`/`Cmps`/`Stos`/`Lods`/`Scas` (each there is marked
//! `// TODO: handle rep prefix`). The REP loop itself is *not* taken from
//! that source: each handler here checks `CX != 0` before performing its
//! one iteration, so `REP ... ` with CX already 0 runs zero iterations,
//! matching real 8086 behavior (`spec.md` §4.E) rather than a
//! decrement-then-check loop that would run one iteration regardless.
//! Every REP-capable handler returns `Status::Repeat` to ask the step
//! engine to rewind IP and re-enter on the next step, which is what lets
//! an interrupt land between iterations.

use crate::backend::Backend;
use crate::cpu::exception::{HandlerResult, Status};
use crate::cpu::flags::{AluOp, FlagsCalc};
use crate::cpu::prefix::{Prefixes, RepGroup};
use crate::cpu::state::flag::{DF, ZF};
use crate::cpu::state::{Register, SegmentRegister};
use crate::cpu::Cpu;

fn source_seg(prefixes: &Prefixes) -> SegmentRegister {
    if prefixes.segment == SegmentRegister::SegReserve {
        SegmentRegister::DS
    } else {
        prefixes.segment
    }
}

fn step_amount(cpu: &Cpu, log_size: u8) -> u16 {
    let delta = 1i32 << log_size;
    (if cpu.state().flag(DF) { -delta } else { delta }) as u16
}

fn cx_is_zero(cpu: &Cpu) -> bool {
    cpu.state().read_reg(Register::CX as u8, crate::cpu::state::WORD) == 0
}

fn decrement_cx(cpu: &mut Cpu) -> u16 {
    let cx = cpu.state().read_reg(Register::CX as u8, crate::cpu::state::WORD).wrapping_sub(1);
    cpu.state_mut().write_reg(Register::CX as u8, crate::cpu::state::WORD, cx);
    cx
}

/// MOVS (0xA4/0xA5): [seg:SI] -> [ES:DI].
pub fn movs(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    if prefixes.has_rep() && cx_is_zero(cpu) {
        return Ok(Status::Normal);
    }
    let si = cpu.state().read_reg(Register::SI as u8, crate::cpu::state::WORD);
    let di = cpu.state().read_reg(Register::DI as u8, crate::cpu::state::WORD);
    let value = cpu.read_mem(backend, source_seg(&prefixes), si, log_size);
    cpu.write_mem(backend, SegmentRegister::ES, di, log_size, value);
    let step = step_amount(cpu, log_size);
    cpu.state_mut().write_reg(Register::SI as u8, crate::cpu::state::WORD, si.wrapping_add(step));
    cpu.state_mut().write_reg(Register::DI as u8, crate::cpu::state::WORD, di.wrapping_add(step));
    finish_rep_non_predicated(cpu, &prefixes)
}

/// STOS (0xAA/0xAB): AL/AX -> [ES:DI].
pub fn stos(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    if prefixes.has_rep() && cx_is_zero(cpu) {
        return Ok(Status::Normal);
    }
    let di = cpu.state().read_reg(Register::DI as u8, crate::cpu::state::WORD);
    let value = cpu.state().read_reg(Register::AX as u8, log_size);
    cpu.write_mem(backend, SegmentRegister::ES, di, log_size, value);
    let step = step_amount(cpu, log_size);
    cpu.state_mut().write_reg(Register::DI as u8, crate::cpu::state::WORD, di.wrapping_add(step));
    finish_rep_non_predicated(cpu, &prefixes)
}

/// LODS (0xAC/0xAD): [seg:SI] -> AL/AX.
pub fn lods(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    if prefixes.has_rep() && cx_is_zero(cpu) {
        return Ok(Status::Normal);
    }
    let si = cpu.state().read_reg(Register::SI as u8, crate::cpu::state::WORD);
    let value = cpu.read_mem(backend, source_seg(&prefixes), si, log_size);
    cpu.state_mut().write_reg(Register::AX as u8, log_size, value);
    let step = step_amount(cpu, log_size);
    cpu.state_mut().write_reg(Register::SI as u8, crate::cpu::state::WORD, si.wrapping_add(step));
    finish_rep_non_predicated(cpu, &prefixes)
}

/// CMPS (0xA6/0xA7): compare [seg:SI] with [ES:DI].
pub fn cmps(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    if prefixes.has_rep() && cx_is_zero(cpu) {
        return Ok(Status::Normal);
    }
    let si = cpu.state().read_reg(Register::SI as u8, crate::cpu::state::WORD);
    let di = cpu.state().read_reg(Register::DI as u8, crate::cpu::state::WORD);
    let n0 = cpu.read_mem(backend, source_seg(&prefixes), si, log_size);
    let n1 = cpu.read_mem(backend, SegmentRegister::ES, di, log_size);
    let calc = FlagsCalc::new(log_size).eval(AluOp::Cmp, n0, n1, false);
    cpu.state_mut().flags = calc.apply(cpu.state().flags);
    let step = step_amount(cpu, log_size);
    cpu.state_mut().write_reg(Register::SI as u8, crate::cpu::state::WORD, si.wrapping_add(step));
    cpu.state_mut().write_reg(Register::DI as u8, crate::cpu::state::WORD, di.wrapping_add(step));
    finish_rep_predicated(cpu, &prefixes)
}

/// SCAS (0xAE/0xAF): compare AL/AX with [ES:DI].
pub fn scas(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    if prefixes.has_rep() && cx_is_zero(cpu) {
        return Ok(Status::Normal);
    }
    let di = cpu.state().read_reg(Register::DI as u8, crate::cpu::state::WORD);
    let n0 = cpu.state().read_reg(Register::AX as u8, log_size);
    let n1 = cpu.read_mem(backend, SegmentRegister::ES, di, log_size);
    let calc = FlagsCalc::new(log_size).eval(AluOp::Cmp, n0, n1, false);
    cpu.state_mut().flags = calc.apply(cpu.state().flags);
    let step = step_amount(cpu, log_size);
    cpu.state_mut().write_reg(Register::DI as u8, crate::cpu::state::WORD, di.wrapping_add(step));
    finish_rep_predicated(cpu, &prefixes)
}

/// MOVS/STOS/LODS: repeat purely on CX.
fn finish_rep_non_predicated(cpu: &mut Cpu, prefixes: &Prefixes) -> HandlerResult {
    if prefixes.has_rep() {
        let cx = decrement_cx(cpu);
        if cx != 0 {
            return Ok(Status::Repeat);
        }
    }
    Ok(Status::Normal)
}

/// CMPS/SCAS: repeat on CX and on ZF matching the REPZ/REPNZ predicate.
fn finish_rep_predicated(cpu: &mut Cpu, prefixes: &Prefixes) -> HandlerResult {
    if prefixes.has_rep() {
        let cx = decrement_cx(cpu);
        let zf = cpu.state().flags & ZF != 0;
        let predicate_holds = match prefixes.rep {
            RepGroup::Repz => zf,
            RepGroup::Repnz => !zf,
            _ => false,
        };
        if cx != 0 && predicate_holds {
            return Ok(Status::Repeat);
        }
    }
    Ok(Status::Normal)
}
