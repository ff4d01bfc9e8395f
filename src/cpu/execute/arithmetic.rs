//! Binary ALU ops (0x00-0x3D, 0x80-0x83), INC/DEC, Grp3 (0xF6/0xF7), Grp4
//! (0xFE), and the decimal-adjust family (AAA/AAS/AAM/AAD/DAA/DAS).
//!
//! The two-operand forms are thin dispatchers over [`crate::cpu::flags`];
//! the decimal-adjust bodies are transcribed from
//! `original_source/src/cpu.cpp`'s `AAA`/`AAS`/`DAA`/`DAS` (AAM/AAD have
//! no source counterpart there and are built from the documented 8086
//! algorithm instead).

use crate::backend::Backend;
use crate::cpu::exception::{HandlerResult, Status, Vector};
use crate::cpu::flags::{inc_dec, AluOp, FlagsCalc};
use crate::cpu::modrm::{self, ModRm};
use crate::cpu::prefix::Prefixes;
use crate::cpu::state::flag::{AF, CF};
use crate::cpu::state::{Register, BYTE, WORD};
use crate::cpu::Cpu;

/// 0x00-0x3D's `{r/m,r}`/`{r,r/m}` rows. `op&1` selects width, `op&2`
/// selects direction (0: store to r/m, 1: store to reg), `(op>>3)&7`
/// selects the ALU op.
pub fn bi_op(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    let modrm = modrm::decode(cpu, backend);
    let alu_op = AluOp::from_group_field(op >> 3);
    let n0 = modrm::read_rm(cpu, backend, &modrm, &prefixes, log_size);
    let n1 = cpu.state().read_reg(modrm.reg, log_size);
    let carry_in = cpu.state().flag(CF);
    let calc = FlagsCalc::new(log_size).eval(alu_op, n0, n1, carry_in);
    if alu_op != AluOp::Cmp {
        if op & 2 != 0 {
            cpu.state_mut().write_reg(modrm.reg, log_size, calc.result());
        } else {
            modrm::write_rm(cpu, backend, &modrm, &prefixes, log_size, calc.result());
        }
    }
    let flags = calc.apply(cpu.state().flags);
    cpu.state_mut().flags = flags;
    Ok(Status::Normal)
}

/// 0x00-0x3D's `{AL,imm8}`/`{AX,imm16}` rows.
pub fn bi_op_ai(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    let imm = fetch_imm(cpu, backend, log_size);
    let alu_op = AluOp::from_group_field(op >> 3);
    let n0 = cpu.state().read_reg(Register::AX as u8, log_size);
    let carry_in = cpu.state().flag(CF);
    let calc = FlagsCalc::new(log_size).eval(alu_op, n0, imm, carry_in);
    if alu_op != AluOp::Cmp {
        cpu.state_mut().write_reg(Register::AX as u8, log_size, calc.result());
    }
    cpu.state_mut().flags = calc.apply(cpu.state().flags);
    Ok(Status::Normal)
}

/// Grp1 (0x80-0x83): immediate-form binary ops. 0x83 sign-extends an
/// imm8 over a word r/m; 0x80/0x82 are byte forms (0x82 an undocumented
/// alias of 0x80), 0x81 a word form with a full imm16.
pub fn bi_op_im(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    let modrm = modrm::decode(cpu, backend);
    let alu_op = AluOp::from_group_field(modrm.reg);
    let imm = if op == 0x83 {
        cpu.fetch_byte(backend) as i8 as i16 as u16
    } else {
        fetch_imm(cpu, backend, log_size)
    };
    let n0 = modrm::read_rm(cpu, backend, &modrm, &prefixes, log_size);
    let carry_in = cpu.state().flag(CF);
    let calc = FlagsCalc::new(log_size).eval(alu_op, n0, imm, carry_in);
    if alu_op != AluOp::Cmp {
        modrm::write_rm(cpu, backend, &modrm, &prefixes, log_size, calc.result());
    }
    cpu.state_mut().flags = calc.apply(cpu.state().flags);
    Ok(Status::Normal)
}

fn fetch_imm(cpu: &mut Cpu, backend: &mut dyn Backend, log_size: u8) -> u16 {
    if log_size == BYTE {
        cpu.fetch_byte(backend) as u16
    } else {
        cpu.fetch_word(backend)
    }
}

/// 0x40-0x4F: INC/DEC r16, CF preserved.
pub fn inc_dec_reg(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, op: u8) -> HandlerResult {
    let reg = op & 7;
    let decrement = op & 8 != 0;
    let value = cpu.state().read_reg(reg, WORD);
    let flags = cpu.state().flags;
    let (result, new_flags) = inc_dec(WORD, value, decrement, flags);
    cpu.state_mut().write_reg(reg, WORD, result);
    cpu.state_mut().flags = new_flags;
    Ok(Status::Normal)
}

/// Grp4 (0xFE): INC/DEC r/m8 only; every other sub-opcode is #UD.
pub fn grp4(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, _op: u8) -> HandlerResult {
    let modrm = modrm::decode(cpu, backend);
    match modrm.reg {
        0 | 1 => {
            let decrement = modrm.reg == 1;
            let value = modrm::read_rm(cpu, backend, &modrm, &prefixes, BYTE);
            let flags = cpu.state().flags;
            let (result, new_flags) = inc_dec(BYTE, value, decrement, flags);
            modrm::write_rm(cpu, backend, &modrm, &prefixes, BYTE, result);
            cpu.state_mut().flags = new_flags;
            Ok(Status::Normal)
        }
        _ => Err(Vector::InvalidOpcode),
    }
}

/// Grp3 (0xF6/0xF7): TEST imm, NOT, NEG, MUL, IMUL, DIV, IDIV.
/// Sub-opcode 1 is reserved (#UD).
pub fn grp3(cpu: &mut Cpu, backend: &mut dyn Backend, prefixes: Prefixes, op: u8) -> HandlerResult {
    let log_size = op & 1;
    let modrm = modrm::decode(cpu, backend);
    match modrm.reg {
        0 => {
            let imm = fetch_imm(cpu, backend, log_size);
            let n0 = modrm::read_rm(cpu, backend, &modrm, &prefixes, log_size);
            let calc = FlagsCalc::new(log_size).eval(AluOp::And, n0, imm, false);
            cpu.state_mut().flags = calc.apply(cpu.state().flags);
            Ok(Status::Normal)
        }
        1 => Err(Vector::InvalidOpcode),
        2 => {
            let v = modrm::read_rm(cpu, backend, &modrm, &prefixes, log_size);
            let mask = if log_size == BYTE { 0xFF } else { 0xFFFF };
            modrm::write_rm(cpu, backend, &modrm, &prefixes, log_size, !v & mask);
            Ok(Status::Normal)
        }
        3 => {
            let v = modrm::read_rm(cpu, backend, &modrm, &prefixes, log_size);
            let calc = FlagsCalc::new(log_size).eval(AluOp::Sub, 0, v, false);
            modrm::write_rm(cpu, backend, &modrm, &prefixes, log_size, calc.result());
            cpu.state_mut().flags = calc.apply(cpu.state().flags);
            Ok(Status::Normal)
        }
        4 => mul(cpu, backend, &modrm, &prefixes, log_size, false),
        5 => mul(cpu, backend, &modrm, &prefixes, log_size, true),
        6 => div(cpu, backend, &modrm, &prefixes, log_size, false),
        _ => div(cpu, backend, &modrm, &prefixes, log_size, true),
    }
}

fn mul(
    cpu: &mut Cpu,
    backend: &mut dyn Backend,
    modrm: &ModRm,
    prefixes: &Prefixes,
    log_size: u8,
    signed: bool,
) -> HandlerResult {
    let src = modrm::read_rm(cpu, backend, modrm, prefixes, log_size);
    let overflow = if log_size == BYTE {
        let al = cpu.state().read_reg(Register::AX as u8, BYTE);
        let product: u16 = if signed {
            ((al as i8 as i32) * (src as i8 as i32)) as u16
        } else {
            (al as u32 * src as u32) as u16
        };
        cpu.state_mut().write_reg(Register::AX as u8, WORD, product);
        let high = (product >> 8) as u8;
        if signed {
            let sign_extension = if (product as i8) < 0 { 0xFF } else { 0x00 };
            high != sign_extension
        } else {
            high != 0
        }
    } else {
        let ax = cpu.state().read_reg(Register::AX as u8, WORD);
        let product: u64 = if signed {
            ((ax as i16 as i64) * (src as i16 as i64)) as u64
        } else {
            ax as u64 * src as u64
        };
        let low = product as u16;
        let high = (product >> 16) as u16;
        cpu.state_mut().write_reg(Register::AX as u8, WORD, low);
        cpu.state_mut().write_reg(Register::DX as u8, WORD, high);
        if signed {
            let sign_extension = if (low as i16) < 0 { 0xFFFF } else { 0x0000 };
            high != sign_extension
        } else {
            high != 0
        }
    };
    cpu.state_mut().set_flag(CF, overflow);
    cpu.state_mut().set_flag(crate::cpu::state::flag::OF, overflow);
    Ok(Status::Normal)
}

fn div(
    cpu: &mut Cpu,
    backend: &mut dyn Backend,
    modrm: &ModRm,
    prefixes: &Prefixes,
    log_size: u8,
    signed: bool,
) -> HandlerResult {
    let divisor = modrm::read_rm(cpu, backend, modrm, prefixes, log_size);
    if log_size == BYTE {
        let dividend = cpu.state().read_reg(Register::AX as u8, WORD);
        if signed {
            let divisor_i = divisor as i8 as i32;
            if divisor_i == 0 {
                return Err(Vector::DivideError);
            }
            let dividend_i = dividend as i16 as i32;
            let q = dividend_i / divisor_i;
            let r = dividend_i % divisor_i;
            if !(i8::MIN as i32..=i8::MAX as i32).contains(&q) {
                return Err(Vector::DivideError);
            }
            cpu.state_mut().write_reg(Register::AX as u8, BYTE, (q as i8 as u8) as u16);
            cpu.state_mut().write_reg(4, BYTE, (r as i8 as u8) as u16);
        } else {
            if divisor == 0 {
                return Err(Vector::DivideError);
            }
            let q = dividend as u32 / divisor as u32;
            let r = dividend as u32 % divisor as u32;
            if q > 0xFF {
                return Err(Vector::DivideError);
            }
            cpu.state_mut().write_reg(Register::AX as u8, BYTE, q as u16);
            cpu.state_mut().write_reg(4, BYTE, r as u16);
        }
    } else {
        let ax = cpu.state().read_reg(Register::AX as u8, WORD);
        let dx = cpu.state().read_reg(Register::DX as u8, WORD);
        let dividend = ((dx as u32) << 16) | ax as u32;
        if signed {
            let divisor_i = divisor as i16 as i64;
            if divisor_i == 0 {
                return Err(Vector::DivideError);
            }
            let dividend_i = dividend as i32 as i64;
            let q = dividend_i / divisor_i;
            let r = dividend_i % divisor_i;
            if !(i16::MIN as i64..=i16::MAX as i64).contains(&q) {
                return Err(Vector::DivideError);
            }
            cpu.state_mut().write_reg(Register::AX as u8, WORD, q as i16 as u16);
            cpu.state_mut().write_reg(Register::DX as u8, WORD, r as i16 as u16);
        } else {
            if divisor == 0 {
                return Err(Vector::DivideError);
            }
            let q = dividend / divisor as u32;
            let r = dividend % divisor as u32;
            if q > 0xFFFF {
                return Err(Vector::DivideError);
            }
            cpu.state_mut().write_reg(Register::AX as u8, WORD, q as u16);
            cpu.state_mut().write_reg(Register::DX as u8, WORD, r as u16);
        }
    }
    Ok(Status::Normal)
}

/// AAA (0x37).
pub fn aaa(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let al = cpu.state().read_reg(Register::AX as u8, BYTE);
    let af = cpu.state().flag(AF);
    if (al & 0xF) > 9 || af {
        let ax = cpu.state().read_reg(Register::AX as u8, WORD);
        cpu.state_mut().write_reg(Register::AX as u8, WORD, ax.wrapping_add(0x106));
        cpu.state_mut().set_flag(AF, true);
        cpu.state_mut().set_flag(CF, true);
    } else {
        cpu.state_mut().set_flag(AF, false);
        cpu.state_mut().set_flag(CF, false);
    }
    let al = cpu.state().read_reg(Register::AX as u8, BYTE) & 0x0F;
    cpu.state_mut().write_reg(Register::AX as u8, BYTE, al);
    Ok(Status::Normal)
}

/// AAS (0x3F).
pub fn aas(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let al = cpu.state().read_reg(Register::AX as u8, BYTE);
    let af = cpu.state().flag(AF);
    if (al & 0xF) > 9 || af {
        let ax = cpu.state().read_reg(Register::AX as u8, WORD);
        let al = ax & 0xFF;
        let adjusted = (ax ^ al).wrapping_add(al.wrapping_sub(6) & 0xFF).wrapping_sub(0x100);
        cpu.state_mut().write_reg(Register::AX as u8, WORD, adjusted);
        cpu.state_mut().set_flag(AF, true);
        cpu.state_mut().set_flag(CF, true);
    } else {
        cpu.state_mut().set_flag(AF, false);
        cpu.state_mut().set_flag(CF, false);
    }
    let al = cpu.state().read_reg(Register::AX as u8, BYTE) & 0x0F;
    cpu.state_mut().write_reg(Register::AX as u8, BYTE, al);
    Ok(Status::Normal)
}

/// DAA (0x27).
pub fn daa(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let al = cpu.state().read_reg(Register::AX as u8, BYTE);
    let af = cpu.state().flag(AF);
    let cf = cpu.state().flag(CF);
    let needs_af = af || (al & 0xF) > 9;
    let needs_cf = cf || al > 0x99;
    let add = (needs_af as u16) * 6 + (needs_cf as u16) * 0x60;
    let result = al.wrapping_add(add) & 0xFF;
    cpu.state_mut().write_reg(Register::AX as u8, BYTE, result);
    cpu.state_mut().set_flag(AF, needs_af);
    cpu.state_mut().set_flag(CF, needs_cf);
    Ok(Status::Normal)
}

/// DAS (0x2F).
pub fn das(cpu: &mut Cpu, _backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let mut al = cpu.state().read_reg(Register::AX as u8, BYTE);
    let af = cpu.state().flag(AF);
    let cf = cpu.state().flag(CF);
    let needs_cf_initial = al > 0x99 || cf;
    let needs_af = af || (al & 0xF) > 9;
    let mut needs_cf = false;
    if needs_af {
        needs_cf = al < 6 || cf;
        al = al.wrapping_sub(6) & 0xFF;
    }
    if needs_cf_initial {
        al = al.wrapping_sub(0x60) & 0xFF;
        needs_cf = true;
    }
    cpu.state_mut().write_reg(Register::AX as u8, BYTE, al);
    cpu.state_mut().set_flag(AF, needs_af);
    cpu.state_mut().set_flag(CF, needs_cf);
    Ok(Status::Normal)
}

/// AAM (0xD4): divide AL by an 8-bit immediate; #DE if the immediate is
/// zero.
pub fn aam(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let base = cpu.fetch_byte(backend);
    if base == 0 {
        return Err(Vector::DivideError);
    }
    let al = cpu.state().read_reg(Register::AX as u8, BYTE) as u8;
    let ah = al / base;
    let al = al % base;
    let ax = ((ah as u16) << 8) | al as u16;
    cpu.state_mut().write_reg(Register::AX as u8, WORD, ax);
    let calc = FlagsCalc::new(BYTE).eval(AluOp::Or, al as u16, 0, false);
    cpu.state_mut().flags = calc.apply(cpu.state().flags);
    Ok(Status::Normal)
}

/// AAD (0xD5): pre-divide adjust; combines AH/AL into AL using an 8-bit
/// immediate base, clearing AH.
pub fn aad(cpu: &mut Cpu, backend: &mut dyn Backend, _prefixes: Prefixes, _op: u8) -> HandlerResult {
    let base = cpu.fetch_byte(backend);
    let al = cpu.state().read_reg(Register::AX as u8, BYTE) as u8;
    let ah = cpu.state().read_reg(4, BYTE) as u8;
    let al = al.wrapping_add(ah.wrapping_mul(base));
    cpu.state_mut().write_reg(Register::AX as u8, WORD, al as u16);
    let calc = FlagsCalc::new(BYTE).eval(AluOp::Or, al as u16, 0, false);
    cpu.state_mut().flags = calc.apply(cpu.state().flags);
    Ok(Status::Normal)
}
