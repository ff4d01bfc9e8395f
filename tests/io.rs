//! IN/OUT port instruction tests through the full step engine.

mod common;

use common::{cpu_at_cs0, set_gpr, RamBackend};
use cpu8086::Register;

#[test]
fn out_imm_then_in_imm_round_trips_a_byte_port() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::AX, 0x00AB);
    // OUT 0x60, AL; MOV AL, 0; IN AL, 0x60
    backend.load_at_cs(0, &[0xE6, 0x60, 0xB0, 0x00, 0xE4, 0x60]);
    cpu.step(&mut backend); // OUT
    cpu.step(&mut backend); // MOV AL, 0
    assert_eq!(cpu.state().read_reg(Register::AX as u8, 0), 0);
    cpu.step(&mut backend); // IN
    assert_eq!(cpu.state().read_reg(Register::AX as u8, 0), 0xAB);
}

#[test]
fn out_dx_writes_a_word_port_seen_by_in_dx() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_gpr(&mut cpu, Register::DX, 0x03F8);
    set_gpr(&mut cpu, Register::AX, 0xBEEF);
    backend.load_at_cs(0, &[0xEF]); // OUT DX, AX
    cpu.step(&mut backend);
    let word = backend.io[0x03F8] as u16 | ((backend.io[0x03F9] as u16) << 8);
    assert_eq!(word, 0xBEEF);
}
