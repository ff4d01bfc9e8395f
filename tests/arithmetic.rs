//! Binary ALU, INC/DEC, and Grp3 (MUL/DIV) instruction tests driven
//! through the full step engine.

mod common;

use common::{cpu_at_cs0, set_gpr, RamBackend};
use cpu8086::cpu::state::flag::{CF, OF, ZF};
use cpu8086::{Register, StepResult, Vector};

#[test]
fn add_r16_imm_sets_destination_and_flags() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::AX, 0x7FFF);
    // ADD AX, 1 via Grp1 (0x83 /0 ib, sign-extended imm8)
    backend.load_at_cs(0, &[0x83, 0xC0, 0x01]);
    cpu.step(&mut backend);
    assert_eq!(cpu.state().read_reg(Register::AX as u8, 1), 0x8000);
    assert!(cpu.state().flag(OF), "signed overflow from 0x7FFF+1 must set OF");
}

#[test]
fn inc_r16_does_not_touch_carry() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::CX, 0xFFFF);
    let mut state = cpu8086::CPUState::default();
    cpu.store_state(&mut state);
    state.flags |= CF;
    cpu.load_state(&state);
    backend.load_at_cs(0, &[0x41]); // INC CX
    cpu.step(&mut backend);
    assert_eq!(cpu.state().read_reg(Register::CX as u8, 1), 0);
    assert!(cpu.state().flag(ZF));
    assert!(cpu.state().flag(CF), "INC must not clear a carry set before it");
}

#[test]
fn dec_r16_wraps_and_sets_no_carry() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::DX, 0);
    backend.load_at_cs(0, &[0x4A]); // DEC DX
    cpu.step(&mut backend);
    assert_eq!(cpu.state().read_reg(Register::DX as u8, 1), 0xFFFF);
}

#[test]
fn byte_mul_sets_carry_and_overflow_when_high_half_is_nonzero() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::AX, 0x0010); // AL = 0x10
    set_gpr(&mut cpu, Register::BX, 0x0010); // BL = 0x10
    // MUL BL  (Grp3 0xF6 /4, ModRM mod=11 reg=100 rm=011)
    backend.load_at_cs(0, &[0xF6, 0xE3]);
    cpu.step(&mut backend);
    assert_eq!(cpu.state().read_reg(Register::AX as u8, 1), 0x0100);
    assert!(cpu.state().flag(CF));
    assert!(cpu.state().flag(OF));
}

#[test]
fn word_div_by_zero_raises_divide_error_and_leaves_ip_at_the_instruction() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::AX, 0x0064);
    set_gpr(&mut cpu, Register::DX, 0x0000);
    set_gpr(&mut cpu, Register::CX, 0x0000); // divisor
    // DIV CX (Grp3 0xF7 /6, ModRM mod=11 reg=110 rm=001)
    backend.load_at_cs(0, &[0xF7, 0xF1]);
    backend.set_ivt_entry(Vector::DivideError.number(), 0x0050, 0x0000);
    let status = cpu.step(&mut backend);
    assert_eq!(status, StepResult::Normal);
    // Delivery rewrote CS:IP to the #DE handler, not past the DIV.
    assert_eq!(cpu.state().read_seg(cpu8086::SegmentRegister::CS), 0x0050);
    assert_eq!(cpu.state().ip, 0x0000);
}

#[test]
fn word_div_quotient_overflow_raises_divide_error() {
    // AX:DX = 0x0000_0002, divisor 1: quotient 0x20000 doesn't fit u16.
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::AX, 0x0000);
    set_gpr(&mut cpu, Register::DX, 0x0002);
    set_gpr(&mut cpu, Register::CX, 0x0001);
    backend.load_at_cs(0, &[0xF7, 0xF1]); // DIV CX
    backend.set_ivt_entry(Vector::DivideError.number(), 0x0060, 0x0000);
    cpu.step(&mut backend);
    assert_eq!(cpu.state().read_seg(cpu8086::SegmentRegister::CS), 0x0060);
}

#[test]
fn daa_adjusts_an_invalid_bcd_low_nibble() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::AX, 0x000A); // AL = 0x0A, an invalid BCD digit
    backend.load_at_cs(0, &[0x27]); // DAA
    cpu.step(&mut backend);
    assert_eq!(cpu.state().read_reg(Register::AX as u8, 0), 0x10);
}
