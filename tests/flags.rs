//! The single-bit FLAGS instructions (CLC/STC/CMC/CLI/STI/CLD/STD)
//! through the full step engine.

mod common;

use common::{cpu_at_cs0, set_flags, RamBackend};
use cpu8086::cpu::state::flag::{CF, DF, IF};

#[test]
fn clc_and_stc_set_carry_independent_of_its_prior_state() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_flags(&mut cpu, CF);
    backend.load_at_cs(0, &[0xF8, 0xF9]); // CLC ; STC
    cpu.step(&mut backend);
    assert!(!cpu.state().flag(CF));
    cpu.step(&mut backend);
    assert!(cpu.state().flag(CF));
}

#[test]
fn cmc_flips_carry_each_time_it_runs() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_flags(&mut cpu, 0);
    backend.load_at_cs(0, &[0xF5, 0xF5]); // CMC ; CMC
    cpu.step(&mut backend);
    assert!(cpu.state().flag(CF));
    cpu.step(&mut backend);
    assert!(!cpu.state().flag(CF));
}

#[test]
fn cli_and_sti_toggle_the_interrupt_enable_flag() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_flags(&mut cpu, IF);
    backend.load_at_cs(0, &[0xFA, 0xFB]); // CLI ; STI
    cpu.step(&mut backend);
    assert!(!cpu.state().flag(IF));
    cpu.step(&mut backend);
    assert!(cpu.state().flag(IF));
}

#[test]
fn cld_and_std_toggle_the_direction_flag() {
    let mut cpu = cpu_at_cs0();
    let mut backend = RamBackend::new();
    set_flags(&mut cpu, 0);
    backend.load_at_cs(0, &[0xFD, 0xFC]); // STD ; CLD
    cpu.step(&mut backend);
    assert!(cpu.state().flag(DF));
    cpu.step(&mut backend);
    assert!(!cpu.state().flag(DF));
}
