//! Grp2 shift/rotate instruction tests through the full step engine.

mod common;

use common::{cpu_at_cs0, set_gpr, RamBackend};
use cpu8086::cpu::state::flag::{CF, OF};
use cpu8086::Register;

#[test]
fn shl_al_0x80_by_one_sets_carry_and_clears_al() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::AX, 0x0080);
    // SHL AL, 1 (0xD0 /4, mod=11 reg=100 rm=000)
    backend.load_at_cs(0, &[0xD0, 0xE0]);
    cpu.step(&mut backend);
    assert_eq!(cpu.state().read_reg(Register::AX as u8, 0), 0x00);
    assert!(cpu.state().flag(CF));
    assert!(cpu.state().flag(OF), "OF is defined for a 1-bit shift: top two bits differed");
}

#[test]
fn shr_by_cl_with_count_zero_leaves_flags_untouched() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::AX, 0x00FF);
    set_gpr(&mut cpu, Register::CX, 0x0000);
    let mut state = cpu8086::CPUState::default();
    cpu.store_state(&mut state);
    state.flags |= CF;
    cpu.load_state(&state);
    // SHR AL, CL (0xD2 /5, mod=11 reg=101 rm=000)
    backend.load_at_cs(0, &[0xD2, 0xE8]);
    cpu.step(&mut backend);
    assert_eq!(cpu.state().read_reg(Register::AX as u8, 0), 0xFF);
    assert!(cpu.state().flag(CF), "a shift count of zero must not disturb flags");
}

#[test]
fn rol_r16_by_imm8_wraps_the_high_bit_around() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::BX, 0x8001);
    // ROL BX, 1 (0xC1 /0, mod=11 reg=000 rm=011, imm8=1)
    backend.load_at_cs(0, &[0xC1, 0xC3, 0x01]);
    cpu.step(&mut backend);
    assert_eq!(cpu.state().read_reg(Register::BX as u8, 1), 0x0003);
    assert!(cpu.state().flag(CF));
}
