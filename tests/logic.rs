//! TEST instruction tests (AND-without-store, both ModR/M and
//! accumulator-immediate forms).

mod common;

use common::{cpu_at_cs0, set_gpr, RamBackend};
use cpu8086::cpu::state::flag::ZF;
use cpu8086::Register;

#[test]
fn test_rm_r_sets_zf_without_changing_either_operand() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::AX, 0x00F0);
    set_gpr(&mut cpu, Register::BX, 0x000F);
    // TEST AL, BL (0x84, mod=11 reg=011 rm=000)
    backend.load_at_cs(0, &[0x84, 0xD8]);
    cpu.step(&mut backend);
    assert!(cpu.state().flag(ZF));
    assert_eq!(cpu.state().read_reg(Register::AX as u8, 0), 0xF0);
    assert_eq!(cpu.state().read_reg(Register::BX as u8, 0), 0x0F);
}

#[test]
fn test_ai_clears_zf_when_bits_overlap() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::AX, 0x0003);
    // TEST AL, 0x01
    backend.load_at_cs(0, &[0xA8, 0x01]);
    cpu.step(&mut backend);
    assert!(!cpu.state().flag(ZF));
}
