//! Jcc, CALL/RET/JMP, LOOP/LOOPZ/LOOPNZ/JCXZ, INT3/INT imm8/INTO/IRET,
//! and Grp5 (0xFF).
//!
//! The short-jump predicate table is grounded on
//! `original_source/src/cpu.cpp`'s `CPU::Jcc`, corrected for the 0x7F
//! ("JG"/"JNLE") case: the source there drops the outer negation, so it
//! branches on `SF == OF` alone instead of `!ZF && (SF == OF)` — fixed
//! here (`spec.md` §9). INT3/INTO/INT imm8 perform their own interrupt
//! delivery directly (via `Cpu::deliver_interrupt`) rather than
//! returning a fault `Vector`: unlike a CPU-detected fault, the pushed
//! return address must point *past* the INT instruction, not at its
//! start, so these do not want the step engine's fault-rewind behavior.

use crate::backend::Backend;
use crate::cpu::exception::{HandlerResult, Status, Vector};
use crate::cpu::modrm;
use crate::cpu::prefix::Prefixes;
use crate::cpu::state::flag::{CF, OF, SF, ZF};
use crate::cpu::state::{Register, SegmentRegister, WORD};
use crate::cpu::Cpu;

fn jcc_taken(flags: u16, ccc: u8) -> bool {
    match ccc & 7 {
        0 => flags & OF != 0,
        1 => flags & CF != 0,
        2 => flags & ZF != 0,
        3 => flags & (CF | ZF) != 0,
        4 => flags & SF != 0,
        5 => flags & crate::cpu::state::flag::PF != 0,
        6 => (flags & SF != 0) != (flags & OF != 0),
        _ => flags & ZF != 0 || ((flags & SF != 0) != (flags & OF != 0)),
    }
}

/// 0x70-0x7F: short conditional jumps.
pub fn jcc(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, op: u8) -> HandlerResult {
    let rel = cpu.fetch_byte(backend) as i8 as i16 as u16;
    let ccc = (op >> 1) & 7;
    let invert = op & 1 != 0;
    let taken = jcc_taken(cpu.state().flags, ccc) != invert;
    if taken {
        let ip = cpu.state().ip.wrapping_add(rel);
        cpu.state_mut().ip = ip;
    }
    Ok(Status::Normal)
}

/// 0xE8: CALL near, relative.
pub fn call_near(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let rel = cpu.fetch_word(backend);
    let return_ip = cpu.state().ip;
    cpu.push(backend, WORD, return_ip);
    cpu.state_mut().ip = return_ip.wrapping_add(rel);
    Ok(Status::Normal)
}

/// 0x9A: CALL far, direct. Pushes CS then IP (the return address); no
/// FLAGS are pushed — this is a call, not a trap.
pub fn call_far(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let offset = cpu.fetch_word(backend);
    let segment = cpu.fetch_word(backend);
    let return_cs = cpu.state().read_seg(SegmentRegister::CS);
    let return_ip = cpu.state().ip;
    cpu.push(backend, WORD, return_cs);
    cpu.push(backend, WORD, return_ip);
    cpu.state_mut().write_seg(SegmentRegister::CS, segment);
    cpu.state_mut().ip = offset;
    Ok(Status::Normal)
}

/// 0xE9: JMP near, relative (word displacement).
pub fn jmp_near(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let rel = cpu.fetch_word(backend);
    cpu.state_mut().ip = cpu.state().ip.wrapping_add(rel);
    Ok(Status::Normal)
}

/// 0xEB: JMP short, relative (byte displacement).
pub fn jmp_short(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let rel = cpu.fetch_byte(backend) as i8 as i16 as u16;
    cpu.state_mut().ip = cpu.state().ip.wrapping_add(rel);
    Ok(Status::Normal)
}

/// 0xEA: JMP far, direct.
pub fn jmp_far(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let offset = cpu.fetch_word(backend);
    let segment = cpu.fetch_word(backend);
    cpu.state_mut().write_seg(SegmentRegister::CS, segment);
    cpu.state_mut().ip = offset;
    Ok(Status::Normal)
}

/// 0xC2: RET near, popping `imm16` extra bytes off the stack.
pub fn ret_near_imm(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let extra = cpu.fetch_word(backend);
    let ip = cpu.pop(backend, WORD);
    cpu.state_mut().ip = ip;
    let sp = cpu.state().read_reg(Register::SP as u8, WORD);
    cpu.state_mut().write_reg(Register::SP as u8, WORD, sp.wrapping_add(extra));
    Ok(Status::Normal)
}

/// 0xC3: RET near.
pub fn ret_near(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let ip = cpu.pop(backend, WORD);
    cpu.state_mut().ip = ip;
    Ok(Status::Normal)
}

/// 0xCA: RET far, popping `imm16` extra bytes off the stack.
pub fn ret_far_imm(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let extra = cpu.fetch_word(backend);
    let ip = cpu.pop(backend, WORD);
    let cs = cpu.pop(backend, WORD);
    cpu.state_mut().ip = ip;
    cpu.state_mut().write_seg(SegmentRegister::CS, cs);
    let sp = cpu.state().read_reg(Register::SP as u8, WORD);
    cpu.state_mut().write_reg(Register::SP as u8, WORD, sp.wrapping_add(extra));
    Ok(Status::Normal)
}

/// 0xCB: RET far.
pub fn ret_far(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let ip = cpu.pop(backend, WORD);
    let cs = cpu.pop(backend, WORD);
    cpu.state_mut().ip = ip;
    cpu.state_mut().write_seg(SegmentRegister::CS, cs);
    Ok(Status::Normal)
}

/// 0xE0: LOOPNZ/LOOPNE. 0xE1: LOOPZ/LOOPE. 0xE2: LOOP. 0xE3: JCXZ.
pub fn loop_group(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, op: u8) -> HandlerResult {
    let rel = cpu.fetch_byte(backend) as i8 as i16 as u16;
    let taken = if op == 0xE3 {
        cpu.state().read_reg(Register::CX as u8, WORD) == 0
    } else {
        let cx = cpu.state().read_reg(Register::CX as u8, WORD).wrapping_sub(1);
        cpu.state_mut().write_reg(Register::CX as u8, WORD, cx);
        let zf = cpu.state().flag(ZF);
        let zf_ok = match op {
            0xE0 => !zf, // LOOPNZ
            0xE1 => zf,  // LOOPZ
            _ => true,   // LOOP
        };
        cx != 0 && zf_ok
    };
    if taken {
        cpu.state_mut().ip = cpu.state().ip.wrapping_add(rel);
    }
    Ok(Status::Normal)
}

/// 0xCC: INT3 (vector 3, breakpoint).
pub fn int3(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    cpu.deliver_interrupt(backend, Vector::Breakpoint.number());
    Ok(Status::Normal)
}

/// 0xCD: INT imm8.
pub fn int_imm(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let vector = cpu.fetch_byte(backend);
    cpu.deliver_interrupt(backend, vector);
    Ok(Status::Normal)
}

/// 0xCE: INTO — trap to vector 4 iff OF is set.
pub fn into(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    if cpu.state().flag(OF) {
        cpu.deliver_interrupt(backend, Vector::Overflow.number());
    }
    Ok(Status::Normal)
}

/// 0xCF: IRET — pop IP, CS, FLAGS (reverse push order of interrupt
/// delivery).
pub fn iret(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let ip = cpu.pop(backend, WORD);
    let cs = cpu.pop(backend, WORD);
    let flags = cpu.pop(backend, WORD);
    cpu.state_mut().ip = ip;
    cpu.state_mut().write_seg(SegmentRegister::CS, cs);
    cpu.state_mut().flags = flags;
    Ok(Status::Normal)
}

/// Grp5 (0xFF): INC/DEC r/m16, CALL near/far indirect, JMP near/far
/// indirect, PUSH r/m16. Far indirect forms require a memory operand;
/// the register form is reserved and raises #UD. Sub-opcode 7 is
/// reserved.
pub fn grp5(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, _op: u8) -> HandlerResult {
    let modrm = modrm::decode(cpu, backend);
    match modrm.reg {
        0 | 1 => {
            let decrement = modrm.reg == 1;
            let value = modrm::read_rm(cpu, backend, &modrm, &prefixes, WORD);
            let flags = cpu.state().flags;
            let (result, new_flags) = crate::cpu::flags::inc_dec(WORD, value, decrement, flags);
            modrm::write_rm(cpu, backend, &modrm, &prefixes, WORD, result);
            cpu.state_mut().flags = new_flags;
            Ok(Status::Normal)
        }
        2 => {
            let target = modrm::read_rm(cpu, backend, &modrm, &prefixes, WORD);
            let return_ip = cpu.state().ip;
            cpu.push(backend, WORD, return_ip);
            cpu.state_mut().ip = target;
            Ok(Status::Normal)
        }
        3 => {
            if modrm.is_reg_form() {
                return Err(Vector::InvalidOpcode);
            }
            let offset = modrm::read_rm(cpu, backend, &modrm, &prefixes, WORD);
            let seg = modrm.effective_seg(&prefixes);
            let ptr_off = match modrm.rm {
                crate::cpu::modrm::RmLocation::Mem { offset, .. } => offset,
                _ => unreachable!(),
            };
            let segment = cpu.read_mem(backend, seg, ptr_off.wrapping_add(2), WORD);
            let return_cs = cpu.state().read_seg(SegmentRegister::CS);
            let return_ip = cpu.state().ip;
            cpu.push(backend, WORD, return_cs);
            cpu.push(backend, WORD, return_ip);
            cpu.state_mut().write_seg(SegmentRegister::CS, segment);
            cpu.state_mut().ip = offset;
            Ok(Status::Normal)
        }
        4 => {
            let target = modrm::read_rm(cpu, backend, &modrm, &prefixes, WORD);
            cpu.state_mut().ip = target;
            Ok(Status::Normal)
        }
        5 => {
            if modrm.is_reg_form() {
                return Err(Vector::InvalidOpcode);
            }
            let offset = modrm::read_rm(cpu, backend, &modrm, &prefixes, WORD);
            let seg = modrm.effective_seg(&prefixes);
            let ptr_off = match modrm.rm {
                crate::cpu::modrm::RmLocation::Mem { offset, .. } => offset,
                _ => unreachable!(),
            };
            let segment = cpu.read_mem(backend, seg, ptr_off.wrapping_add(2), WORD);
            cpu.state_mut().write_seg(SegmentRegister::CS, segment);
            cpu.state_mut().ip = offset;
            Ok(Status::Normal)
        }
        6 => {
            let value = modrm::read_rm(cpu, backend, &modrm, &prefixes, WORD);
            cpu.push(backend, WORD, value);
            Ok(Status::Normal)
        }
        _ => Err(Vector::InvalidOpcode),
    }
}
