//! The flat opcode-byte-to-handler table (component E).
//!
//! Grounded on `original_source/src/cpu.cpp`'s `map1`: a 256-entry array
//! indexed directly by the opcode byte, with adjacent slots in a row
//! often pointing at the same function (the function itself reads the
//! low bits of `op` to pick width/direction/sub-operation). Built once
//! behind a `OnceLock` rather than as a `'static` array literal, since a
//! `const fn` building a 256-entry function-pointer table by index is
//! far less readable than an imperative builder.

use crate::backend::Backend;
use crate::cpu::exception::HandlerResult;
use crate::cpu::execute::flags as flag_ops;
use crate::cpu::execute::{arithmetic, control_flow, data_transfer, handlers, io, logic, shift, stack, string};
use crate::cpu::prefix::Prefixes;
use crate::cpu::Cpu;
use std::sync::OnceLock;

/// The shared handler signature every dispatch-table slot has.
pub type Handler = fn(&mut Cpu, &mut dyn Backend, Prefixes, u8) -> HandlerResult;

static TABLE: OnceLock<[Handler; 256]> = OnceLock::new();

/// Look up the handler for `op`. Builds the table on first use and
/// caches it for the life of the process.
pub fn handler_for(op: u8) -> Handler {
    TABLE.get_or_init(build_table)[op as usize]
}

fn build_table() -> [Handler; 256] {
    let mut t: [Handler; 256] = [handlers::undefined; 256];

    // 0x00-0x3F: eight ALU-op rows of 8 bytes each; `bi_op`/`bi_op_ai`
    // read the row and op bits straight from the opcode byte.
    let mut base = 0x00u8;
    loop {
        t[(base) as usize] = arithmetic::bi_op;
        t[(base + 1) as usize] = arithmetic::bi_op;
        t[(base + 2) as usize] = arithmetic::bi_op;
        t[(base + 3) as usize] = arithmetic::bi_op;
        t[(base + 4) as usize] = arithmetic::bi_op_ai;
        t[(base + 5) as usize] = arithmetic::bi_op_ai;
        if base == 0x38 {
            break;
        }
        base += 8;
    }
    // The `+6`/`+7` slot of each row is special-cased: segment push/pop
    // for ADD/OR/ADC/SBB, a segment-override prefix paired with a
    // decimal-adjust op for AND/SUB/XOR/CMP.
    t[0x06] = stack::push_sreg;
    t[0x07] = stack::pop_sreg;
    t[0x0E] = stack::push_sreg;
    t[0x0F] = handlers::undefined; // POP CS: reserved, not a valid 8086 encoding to rely on
    t[0x16] = stack::push_sreg;
    t[0x17] = stack::pop_sreg;
    t[0x1E] = stack::push_sreg;
    t[0x1F] = stack::pop_sreg;
    t[0x26] = handlers::prefix_byte; // ES override
    t[0x27] = arithmetic::daa;
    t[0x2E] = handlers::prefix_byte; // CS override
    t[0x2F] = arithmetic::das;
    t[0x36] = handlers::prefix_byte; // SS override
    t[0x37] = arithmetic::aaa;
    t[0x3E] = handlers::prefix_byte; // DS override
    t[0x3F] = arithmetic::aas;

    // 0x40-0x4F: INC/DEC r16.
    for op in 0x40..=0x4Fu8 {
        t[op as usize] = arithmetic::inc_dec_reg;
    }
    // 0x50-0x5F: PUSH/POP r16.
    for op in 0x50..=0x57u8 {
        t[op as usize] = stack::push_reg;
    }
    for op in 0x58..=0x5Fu8 {
        t[op as usize] = stack::pop_reg;
    }
    // 0x60-0x6F: reserved on 8086, except the four legacy prefix bytes
    // that also happen to fall in this range (FS/GS override,
    // operand-size, address-size).
    t[0x64] = handlers::prefix_byte;
    t[0x65] = handlers::prefix_byte;
    t[0x66] = handlers::prefix_byte;
    t[0x67] = handlers::prefix_byte;

    // 0x70-0x7F: short conditional jumps.
    for op in 0x70..=0x7Fu8 {
        t[op as usize] = control_flow::jcc;
    }
    // 0x80-0x83: Grp1 immediate binary ops.
    for op in 0x80..=0x83u8 {
        t[op as usize] = arithmetic::bi_op_im;
    }
    t[0x84] = logic::test_rm_r;
    t[0x85] = logic::test_rm_r;
    t[0x86] = data_transfer::xchg_rm_r;
    t[0x87] = data_transfer::xchg_rm_r;
    for op in 0x88..=0x8Bu8 {
        t[op as usize] = data_transfer::mov_rm_r;
    }
    t[0x8C] = data_transfer::mov_rm_sreg;
    t[0x8D] = data_transfer::lea;
    t[0x8E] = data_transfer::mov_sreg_rm;
    t[0x8F] = stack::pop_rm;
    t[0x90] = handlers::nop;
    for op in 0x91..=0x97u8 {
        t[op as usize] = data_transfer::xchg_ax_reg;
    }
    t[0x98] = data_transfer::cbw;
    t[0x99] = data_transfer::cwd;
    t[0x9A] = control_flow::call_far;
    t[0x9B] = handlers::fwait;
    t[0x9C] = stack::pushf;
    t[0x9D] = stack::popf;
    t[0x9E] = data_transfer::sahf;
    t[0x9F] = data_transfer::lahf;
    for op in 0xA0..=0xA3u8 {
        t[op as usize] = data_transfer::mov_moffs;
    }
    t[0xA4] = string::movs;
    t[0xA5] = string::movs;
    t[0xA6] = string::cmps;
    t[0xA7] = string::cmps;
    t[0xA8] = logic::test_ai;
    t[0xA9] = logic::test_ai;
    t[0xAA] = string::stos;
    t[0xAB] = string::stos;
    t[0xAC] = string::lods;
    t[0xAD] = string::lods;
    t[0xAE] = string::scas;
    t[0xAF] = string::scas;
    for op in 0xB0..=0xBFu8 {
        t[op as usize] = data_transfer::mov_reg_imm;
    }
    t[0xC0] = shift::by_imm;
    t[0xC1] = shift::by_imm;
    t[0xC2] = control_flow::ret_near_imm;
    t[0xC3] = control_flow::ret_near;
    t[0xC4] = data_transfer::les;
    t[0xC5] = data_transfer::lds;
    t[0xC6] = data_transfer::mov_rm_imm;
    t[0xC7] = data_transfer::mov_rm_imm;
    // 0xC8/0xC9: ENTER/LEAVE (80186+) — reserved here, left as `undefined`.
    t[0xCA] = control_flow::ret_far_imm;
    t[0xCB] = control_flow::ret_far;
    t[0xCC] = control_flow::int3;
    t[0xCD] = control_flow::int_imm;
    t[0xCE] = control_flow::into;
    t[0xCF] = control_flow::iret;
    t[0xD0] = shift::by_one;
    t[0xD1] = shift::by_one;
    t[0xD2] = shift::by_cl;
    t[0xD3] = shift::by_cl;
    t[0xD4] = arithmetic::aam;
    t[0xD5] = arithmetic::aad;
    // 0xD6: reserved, left as `undefined`.
    t[0xD7] = data_transfer::xlat;
    for op in 0xD8..=0xDFu8 {
        t[op as usize] = handlers::esc;
    }
    t[0xE0] = control_flow::loop_group;
    t[0xE1] = control_flow::loop_group;
    t[0xE2] = control_flow::loop_group;
    t[0xE3] = control_flow::loop_group;
    t[0xE4] = io::in_imm;
    t[0xE5] = io::in_imm;
    t[0xE6] = io::out_imm;
    t[0xE7] = io::out_imm;
    t[0xE8] = control_flow::call_near;
    t[0xE9] = control_flow::jmp_near;
    t[0xEA] = control_flow::jmp_far;
    t[0xEB] = control_flow::jmp_short;
    t[0xEC] = io::in_dx;
    t[0xED] = io::in_dx;
    t[0xEE] = io::out_dx;
    t[0xEF] = io::out_dx;
    t[0xF0] = handlers::prefix_byte; // LOCK
    // 0xF1: reserved, left as `undefined`.
    t[0xF2] = handlers::prefix_byte; // REPNZ
    t[0xF3] = handlers::prefix_byte; // REPZ
    t[0xF4] = handlers::hlt;
    t[0xF5] = flag_ops::cmc;
    t[0xF6] = arithmetic::grp3;
    t[0xF7] = arithmetic::grp3;
    t[0xF8] = flag_ops::clc;
    t[0xF9] = flag_ops::stc;
    t[0xFA] = flag_ops::cli;
    t[0xFB] = flag_ops::sti;
    t[0xFC] = flag_ops::cld;
    t[0xFD] = flag_ops::std;
    t[0xFE] = arithmetic::grp4;
    t[0xFF] = control_flow::grp5;

    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_is_populated_and_lookup_is_stable() {
        for op in 0..=255u8 {
            let a = handler_for(op);
            let b = handler_for(op);
            assert_eq!(a as usize, b as usize);
        }
    }

    #[test]
    fn hlt_and_jcc_rows_resolve_to_distinct_handlers() {
        assert_ne!(handler_for(0xF4) as usize, handler_for(0x70) as usize);
    }
}
