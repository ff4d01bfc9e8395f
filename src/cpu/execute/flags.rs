//! CLC/STC/CMC/CLI/STI/CLD/STD — single-bit FLAGS instructions (0xF5,
//! 0xF8-0xFD). No operands, no ModR/M, no status other than `Normal`.

use crate::backend::Backend;
use crate::cpu::exception::{HandlerResult, Status};
use crate::cpu::prefix::Prefixes;
use crate::cpu::state::flag::{CF, DF, IF};
use crate::cpu::Cpu;

pub fn clc(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    cpu.state_mut().set_flag(CF, false);
    Ok(Status::Normal)
}

pub fn stc(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    cpu.state_mut().set_flag(CF, true);
    Ok(Status::Normal)
}

/// CMC (0xF5) - complement carry flag.
pub fn cmc(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let cf = cpu.state().flag(CF);
    cpu.state_mut().set_flag(CF, !cf);
    Ok(Status::Normal)
}

pub fn cli(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    cpu.state_mut().set_flag(IF, false);
    Ok(Status::Normal)
}

pub fn sti(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    cpu.state_mut().set_flag(IF, true);
    Ok(Status::Normal)
}

pub fn cld(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    cpu.state_mut().set_flag(DF, false);
    Ok(Status::Normal)
}

pub fn std(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    cpu.state_mut().set_flag(DF, true);
    Ok(Status::Normal)
}
