//! MOV family, XCHG, LEA/LES/LDS, XLAT, CBW/CWD, SAHF/LAHF.
//!
//! Grounded on `original_source/src/cpu.cpp`'s `Mov`/`MovAI`/`MovRegImm`/
//! `Xchg`/`Lea`. SAHF/LAHF target AH (general-register index 4 at byte
//! width) through the same `read_reg`/`write_reg` bit-trick that also
//! resolves SP (index 4 at word width) — no separate "SP vs AH" path is
//! needed, see `spec.md` §9.

use crate::backend::Backend;
use crate::cpu::exception::{HandlerResult, Status, Vector};
use crate::cpu::modrm::{self, RmLocation};
use crate::cpu::prefix::Prefixes;
use crate::cpu::state::{Register, SegmentRegister, BYTE, WORD};
use crate::cpu::Cpu;

/// 0x88-0x8B: MOV r/m, r / MOV r, r/m. `op&2` selects direction like the
/// binary-op rows.
pub fn mov_rm_r(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    let modrm = modrm::decode(cpu, backend);
    if op & 2 != 0 {
        let value = modrm::read_rm(cpu, backend, &modrm, &prefixes, log_size);
        cpu.state_mut().write_reg(modrm.reg, log_size, value);
    } else {
        let value = cpu.state().read_reg(modrm.reg, log_size);
        modrm::write_rm(cpu, backend, &modrm, &prefixes, log_size, value);
    }
    Ok(Status::Normal)
}

/// 0xC6/0xC7: MOV r/m, imm.
pub fn mov_rm_imm(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    let modrm = modrm::decode(cpu, backend);
    let imm = fetch_imm(cpu, backend, log_size);
    modrm::write_rm(cpu, backend, &modrm, &prefixes, log_size, imm);
    Ok(Status::Normal)
}

/// 0xA0-0xA3: MOV AL/AX, [moffs] / MOV [moffs], AL/AX.
pub fn mov_moffs(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    let offset = cpu.fetch_word(backend);
    let seg = if prefixes.segment == SegmentRegister::SegReserve {
        SegmentRegister::DS
    } else {
        prefixes.segment
    };
    if op & 2 != 0 {
        let value = cpu.state().read_reg(Register::AX as u8, log_size);
        cpu.write_mem(backend, seg, offset, log_size, value);
    } else {
        let value = cpu.read_mem(backend, seg, offset, log_size);
        cpu.state_mut().write_reg(Register::AX as u8, log_size, value);
    }
    Ok(Status::Normal)
}

/// 0xB0-0xBF: MOV r, imm.
pub fn mov_reg_imm(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = (op >> 3) & 1;
    let reg = op & 7;
    let imm = fetch_imm(cpu, backend, log_size);
    cpu.state_mut().write_reg(reg, log_size, imm);
    Ok(Status::Normal)
}

fn fetch_imm(cpu: &mut Cpu, backend: &mut dyn Backend, log_size: u8) -> u16 {
    if log_size == BYTE {
        cpu.fetch_byte(backend) as u16
    } else {
        cpu.fetch_word(backend)
    }
}

/// 0x8C: MOV r/m, sreg.
pub fn mov_rm_sreg(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, _op: u8) -> HandlerResult {
    let modrm = modrm::decode(cpu, backend);
    let seg = sreg_from_field(modrm.reg)?;
    let value = cpu.state().read_seg(seg);
    modrm::write_rm(cpu, backend, &modrm, &prefixes, WORD, value);
    Ok(Status::Normal)
}

/// 0x8E: MOV sreg, r/m. Writing CS this way is reserved (#UD): altering
/// CS without also loading IP would leave the CPU pointing at garbage.
pub fn mov_sreg_rm(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, _op: u8) -> HandlerResult {
    let modrm = modrm::decode(cpu, backend);
    let seg = sreg_from_field(modrm.reg)?;
    if seg == SegmentRegister::CS {
        return Err(Vector::InvalidOpcode);
    }
    let value = modrm::read_rm(cpu, backend, &modrm, &prefixes, WORD);
    cpu.state_mut().write_seg(seg, value);
    Ok(Status::Normal)
}

/// The `reg` field of a MOV-to/from-sreg ModR/M selects ES/CS/SS/DS;
/// fields 4-7 have no corresponding segment register on the 8086 and are
/// reserved (#UD).
fn sreg_from_field(field: u8) -> Result<SegmentRegister, Vector> {
    match field & 7 {
        0 => Ok(SegmentRegister::ES),
        1 => Ok(SegmentRegister::CS),
        2 => Ok(SegmentRegister::SS),
        3 => Ok(SegmentRegister::DS),
        _ => Err(Vector::InvalidOpcode),
    }
}

/// 0x8D: LEA. Register form has no effective address to load, so it is
/// reserved (#UD).
pub fn lea(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let modrm = modrm::decode(cpu, backend);
    match modrm.rm {
        RmLocation::Mem { offset, .. } => {
            cpu.state_mut().write_reg(modrm.reg, WORD, offset);
            Ok(Status::Normal)
        }
        RmLocation::Reg(_) => Err(Vector::InvalidOpcode),
    }
}

/// 0xC4: LES (load ES:r16 far pointer). 0xC5: LDS (load DS:r16).
/// Register form is reserved (#UD).
fn load_far_pointer(
    cpu: &mut Cpu,
    backend: &mut dyn Backend,
    prefixes: &Prefixes,
    target_seg: SegmentRegister,
) -> HandlerResult {
    let modrm = modrm::decode(cpu, backend);
    let offset = match modrm.rm {
        RmLocation::Mem { offset, .. } => offset,
        RmLocation::Reg(_) => return Err(Vector::InvalidOpcode),
    };
    let value = modrm::read_rm(cpu, backend, &modrm, prefixes, WORD);
    let seg = modrm.effective_seg(prefixes);
    let segment = cpu.read_mem(backend, seg, offset.wrapping_add(2), WORD);
    cpu.state_mut().write_reg(modrm.reg, WORD, value);
    cpu.state_mut().write_seg(target_seg, segment);
    Ok(Status::Normal)
}

pub fn les(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, _op: u8) -> HandlerResult {
    load_far_pointer(cpu, backend, &prefixes, SegmentRegister::ES)
}

pub fn lds(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, _op: u8) -> HandlerResult {
    load_far_pointer(cpu, backend, &prefixes, SegmentRegister::DS)
}

/// 0x86/0x87: XCHG r/m, r. Read both operands, then write both; no bus
/// lock is simulated (`spec.md` §4.E).
pub fn xchg_rm_r(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    let modrm = modrm::decode(cpu, backend);
    let a = modrm::read_rm(cpu, backend, &modrm, &prefixes, log_size);
    let b = cpu.state().read_reg(modrm.reg, log_size);
    modrm::write_rm(cpu, backend, &modrm, &prefixes, log_size, b);
    cpu.state_mut().write_reg(modrm.reg, log_size, a);
    Ok(Status::Normal)
}

/// 0x91-0x97: XCHG AX, r16 (0x90 itself is the NOP alias, handled
/// separately since XCHG AX,AX has no visible effect).
pub fn xchg_ax_reg(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, op: u8) -> HandlerResult {
    let reg = op & 7;
    let ax = cpu.state().read_reg(Register::AX as u8, WORD);
    let other = cpu.state().read_reg(reg, WORD);
    cpu.state_mut().write_reg(Register::AX as u8, WORD, other);
    cpu.state_mut().write_reg(reg, WORD, ax);
    Ok(Status::Normal)
}

/// 0x98: CBW — sign-extend AL into AH.
pub fn cbw(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let al = cpu.state().read_reg(Register::AX as u8, BYTE) as i8 as i16 as u16;
    cpu.state_mut().write_reg(Register::AX as u8, WORD, al);
    Ok(Status::Normal)
}

/// 0x99: CWD — sign-extend AX into DX:AX.
pub fn cwd(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let ax = cpu.state().read_reg(Register::AX as u8, WORD) as i16;
    let dx = if ax < 0 { 0xFFFFu16 } else { 0 };
    cpu.state_mut().write_reg(Register::DX as u8, WORD, dx);
    Ok(Status::Normal)
}

/// 0x9E: SAHF — load the low byte of FLAGS from AH.
pub fn sahf(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let ah = cpu.state().read_reg(4, BYTE);
    let flags = cpu.state().flags;
    cpu.state_mut().flags = (flags & !0xFF) | (ah & 0xFF);
    Ok(Status::Normal)
}

/// 0x9F: LAHF — store the low byte of FLAGS into AH.
pub fn lahf(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let flags = cpu.state().flags & 0xFF;
    cpu.state_mut().write_reg(4, BYTE, flags);
    Ok(Status::Normal)
}

/// 0xD7: XLAT — AL := [(seg:)BX + AL].
pub fn xlat(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, _op: u8) -> HandlerResult {
    let seg = if prefixes.segment == SegmentRegister::SegReserve {
        SegmentRegister::DS
    } else {
        prefixes.segment
    };
    let bx = cpu.state().read_reg(Register::BX as u8, WORD);
    let al = cpu.state().read_reg(Register::AX as u8, BYTE);
    let offset = bx.wrapping_add(al);
    let value = cpu.read_mem(backend, seg, offset, BYTE);
    cpu.state_mut().write_reg(Register::AX as u8, BYTE, value);
    Ok(Status::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::state::CPUState;
    use pretty_assertions::assert_eq;

    struct RamBackend(Vec<u8>);
    impl Backend for RamBackend {
        fn read_mem(&mut self, _s: &CPUState, dst: &mut [u8], size: usize, addr: u32) {
            let base = addr as usize;
            for (i, b) in dst.iter_mut().enumerate().take(size) {
                *b = *self.0.get(base + i).unwrap_or(&0);
            }
        }
        fn write_mem(&mut self, _s: &CPUState, addr: u32, src: &[u8], size: usize) {
            let base = addr as usize;
            if base + size > self.0.len() {
                self.0.resize(base + size, 0);
            }
            self.0[base..base + size].copy_from_slice(&src[..size]);
        }
        fn read_io_byte(&mut self, _port: u16) -> u8 {
            0xFF
        }
        fn read_io_word(&mut self, _port: u16) -> u16 {
            0xFFFF
        }
        fn write_io_byte(&mut self, _port: u16, _val: u8) {}
        fn write_io_word(&mut self, _port: u16, _val: u16) {}
    }

    #[test]
    fn mov_sreg_rm_rejects_writing_cs() {
        let mut cpu = Cpu::with_state(CPUState::default());
        let mut backend = RamBackend(vec![0xC8]); // mod=11 reg=001(CS) rm=000
        let err = mov_sreg_rm(&mut cpu, &mut backend, Prefixes::default(), 0x8E).unwrap_err();
        assert_eq!(err, Vector::InvalidOpcode);
    }

    #[test]
    fn lea_register_form_is_undefined_opcode() {
        let mut cpu = Cpu::with_state(CPUState::default());
        let mut backend = RamBackend(vec![0xC0]); // mod=11 reg=000 rm=000
        let err = lea(&mut cpu, &mut backend, Prefixes::default(), 0x8D).unwrap_err();
        assert_eq!(err, Vector::InvalidOpcode);
    }

    #[test]
    fn sahf_and_lahf_round_trip_through_ah_without_touching_sp() {
        let mut state = CPUState::default();
        state.gpr[Register::AX as usize] = 0x8500; // AH = 0x85
        state.gpr[Register::SP as usize] = 0x1234;
        let mut cpu = Cpu::with_state(state);
        let mut backend = RamBackend(vec![]);
        sahf(&mut cpu, &mut backend, Prefixes::default(), 0x9E).unwrap();
        assert_eq!(cpu.state().flags & 0xFF, 0x85);
        assert_eq!(cpu.state().read_reg(Register::SP as u8, WORD), 0x1234);
        cpu.state_mut().flags = 0x0042;
        lahf(&mut cpu, &mut backend, Prefixes::default(), 0x9F).unwrap();
        assert_eq!(cpu.state().read_reg(Register::AX as u8, BYTE), 0x42);
        assert_eq!(cpu.state().read_reg(Register::SP as u8, WORD), 0x1234);
    }

    #[test]
    fn cwd_sign_extends_negative_ax_into_dx() {
        let mut state = CPUState::default();
        state.gpr[Register::AX as usize] = 0x8000;
        let mut cpu = Cpu::with_state(state);
        let mut backend = RamBackend(vec![]);
        cwd(&mut cpu, &mut backend, Prefixes::default(), 0x99).unwrap();
        assert_eq!(cpu.state().read_reg(Register::DX as u8, WORD), 0xFFFF);
    }
}
