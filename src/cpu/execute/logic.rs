//! TEST (0x84/0x85, 0xA8/0xA9): AND without a store. Grounded on
//! `original_source/src/cpu.cpp`'s `Test`/`TestAI`.

use crate::backend::Backend;
use crate::cpu::exception::{HandlerResult, Status};
use crate::cpu::flags::{AluOp, FlagsCalc};
use crate::cpu::modrm;
use crate::cpu::prefix::Prefixes;
use crate::cpu::state::flag::CF;
use crate::cpu::state::Register;
use crate::cpu::Cpu;

/// TEST r/m, r (0x84/0x85).
pub fn test_rm_r(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    let modrm = modrm::decode(cpu, backend);
    let n0 = modrm::read_rm(cpu, backend, &modrm, &prefixes, log_size);
    let n1 = cpu.state().read_reg(modrm.reg, log_size);
    let carry_in = cpu.state().flag(CF);
    let calc = FlagsCalc::new(log_size).eval(AluOp::And, n0, n1, carry_in);
    cpu.state_mut().flags = calc.apply(cpu.state().flags);
    Ok(Status::Normal)
}

/// TEST AL/AX, imm (0xA8/0xA9).
pub fn test_ai(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    let imm = if log_size == crate::cpu::state::BYTE {
        cpu.fetch_byte(backend) as u16
    } else {
        cpu.fetch_word(backend)
    };
    let n0 = cpu.state().read_reg(Register::AX as u8, log_size);
    let calc = FlagsCalc::new(log_size).eval(AluOp::And, n0, imm, false);
    cpu.state_mut().flags = calc.apply(cpu.state().flags);
    Ok(Status::Normal)
}
