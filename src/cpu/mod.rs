//! 8086 CPU core: registers, decode, ALU, dispatch, and the step engine.
//!
//! [`Cpu`] owns only architectural state ([`state::CPUState`]) plus the
//! asynchronous [`signal::SignalState`] surface; it never stores a
//! back-end. Every call that touches memory or I/O takes
//! `&mut dyn Backend` as an argument, so "hot-swapping" the back-end
//! (`spec.md` §6's `SetHook`) is simply passing a different reference on
//! the next call — there is nothing to store or mutate.

pub mod dispatch;
pub mod exception;
pub mod execute;
pub mod flags;
pub mod modrm;
pub mod prefix;
pub mod signal;
pub mod state;
pub mod step;

use crate::backend::Backend;
use exception::{RunResult, StepResult};
use signal::SignalState;
use state::{CPUState, LogSize, Register, SegmentRegister, BYTE, WORD};

/// One 8086 CPU core. Holds architectural state and the host-signal
/// surface; all memory/IO goes through a caller-supplied [`Backend`].
#[derive(Debug)]
pub struct Cpu {
    state: CPUState,
    signals: SignalState,
    /// FLAGS as they stood *before* the instruction that just retired.
    /// The step engine checks TF/IF against this, not the live FLAGS, so
    /// an instruction that clears TF or IF still lets one more
    /// trap/interrupt through first (`spec.md` §4.G step 1).
    old_flags: u16,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// A fresh CPU at the 8086 reset vector (CS=0xFFFF, IP=0, FLAGS=0).
    pub fn new() -> Self {
        Self::with_state(CPUState::reset())
    }

    /// A CPU initialized to an arbitrary architectural state.
    pub fn with_state(state: CPUState) -> Self {
        let old_flags = state.flags;
        Cpu { state, signals: SignalState::new(), old_flags }
    }

    /// The live architectural state.
    pub fn state(&self) -> &CPUState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut CPUState {
        &mut self.state
    }

    /// Replace the architectural state wholesale (restore from a save).
    pub fn load_state(&mut self, state: &CPUState) {
        self.state = *state;
        self.old_flags = state.flags;
    }

    /// Copy the architectural state out (for save).
    pub fn store_state(&self, out: &mut CPUState) {
        *out = self.state;
    }

    /// Arm a maskable interrupt, or disarm with [`signal::NO_INTERRUPT`].
    pub fn set_intr(&self, vector_or_none: i32) {
        self.signals.set_intr(vector_or_none);
    }

    /// Arm or clear the non-maskable interrupt latch.
    pub fn set_nmi(&self, level: bool) {
        self.signals.set_nmi(level);
    }

    /// Force (or release) HALT from outside the instruction stream.
    pub fn set_halt(&self, level: bool) {
        self.signals.set_halt(level);
    }

    /// Run one step (one instruction, one REP iteration, or a no-op if
    /// already halted). See [`step::do_step`].
    pub fn step(&mut self, backend: &mut dyn Backend) -> StepResult {
        step::do_step(self, backend)
    }

    /// Run until HALT or `steps` instructions have retired, whichever
    /// comes first. `steps < 0` means unbounded.
    pub fn run(&mut self, backend: &mut dyn Backend, steps: i64) -> RunResult {
        let mut remaining = steps;
        loop {
            if steps >= 0 {
                if remaining == 0 {
                    return RunResult::BudgetExhausted;
                }
                remaining -= 1;
            }
            if let StepResult::Halt = self.step(backend) {
                return RunResult::Halted;
            }
        }
    }

    pub(crate) fn old_flags(&self) -> u16 {
        self.old_flags
    }

    pub(crate) fn set_old_flags(&mut self, flags: u16) {
        self.old_flags = flags;
    }

    // -- shared memory/register plumbing used by cpu::execute handlers --

    pub(crate) fn read_mem(
        &self,
        backend: &mut dyn Backend,
        seg: SegmentRegister,
        off: u16,
        log_size: LogSize,
    ) -> u16 {
        let addr = CPUState::linear_addr(self.state.read_seg(seg), off);
        let size = 1usize << log_size;
        let mut buf = [0u8; 2];
        backend.read_mem(&self.state, &mut buf[..size], size, addr);
        if log_size == BYTE {
            buf[0] as u16
        } else {
            u16::from_le_bytes(buf)
        }
    }

    pub(crate) fn write_mem(
        &self,
        backend: &mut dyn Backend,
        seg: SegmentRegister,
        off: u16,
        log_size: LogSize,
        val: u16,
    ) {
        let addr = CPUState::linear_addr(self.state.read_seg(seg), off);
        let size = 1usize << log_size;
        let bytes = val.to_le_bytes();
        backend.write_mem(&self.state, addr, &bytes[..size], size);
    }

    /// Fetch the next byte from CS:IP, advancing IP by one.
    pub(crate) fn fetch_byte(&mut self, backend: &mut dyn Backend) -> u8 {
        let v = self.read_mem(backend, SegmentRegister::CS, self.state.ip, BYTE) as u8;
        self.state.ip = self.state.ip.wrapping_add(1);
        v
    }

    /// Fetch the next word from CS:IP, advancing IP by two.
    pub(crate) fn fetch_word(&mut self, backend: &mut dyn Backend) -> u16 {
        let v = self.read_mem(backend, SegmentRegister::CS, self.state.ip, WORD);
        self.state.ip = self.state.ip.wrapping_add(2);
        v
    }

    /// Un-consume `n` previously fetched bytes (used by the prefix
    /// parser to put back the first non-prefix byte it reads ahead of).
    pub(crate) fn rewind_ip(&mut self, n: u16) {
        self.state.ip = self.state.ip.wrapping_sub(n);
    }

    /// Rewind IP to an absolute value (used by the step engine to
    /// return to the start of the instruction on `Repeat` or fault).
    pub(crate) fn rewind_ip_to(&mut self, ip: u16) {
        self.state.ip = ip;
    }

    pub(crate) fn signals_halted(&self) -> bool {
        self.signals.halted()
    }

    pub(crate) fn signals_take_nmi(&self) -> bool {
        self.signals.take_nmi()
    }

    pub(crate) fn signals_read_intr(&self) -> i32 {
        self.signals.intr()
    }

    /// `PUSH`: decrement SP by the operand size, then store.
    pub(crate) fn push(&mut self, backend: &mut dyn Backend, log_size: LogSize, val: u16) {
        let sp = self
            .state
            .read_reg(Register::SP as u8, WORD)
            .wrapping_sub(1 << log_size);
        self.state.write_reg(Register::SP as u8, WORD, sp);
        self.write_mem(backend, SegmentRegister::SS, sp, log_size, val);
    }

    /// `POP`: load, then increment SP by the operand size.
    pub(crate) fn pop(&mut self, backend: &mut dyn Backend, log_size: LogSize) -> u16 {
        let sp = self.state.read_reg(Register::SP as u8, WORD);
        let val = self.read_mem(backend, SegmentRegister::SS, sp, log_size);
        self.state
            .write_reg(Register::SP as u8, WORD, sp.wrapping_add(1 << log_size));
        val
    }

    /// The common interrupt-delivery sequence (`spec.md` §4.G): push
    /// FLAGS, CS, IP (in that order), clear IF and TF, then load CS:IP
    /// from the 4-byte real-mode IVT entry at `vector * 4`. Shared by
    /// the step engine (#DB, NMI, INTR, and CPU-detected faults, all
    /// delivered at whatever IP the caller has already arranged) and by
    /// the software-trap handlers (INT3/INTO/INT imm8, which call this
    /// directly with IP already past their own encoding, since they act
    /// like a CALL rather than a rewound fault).
    pub(crate) fn deliver_interrupt(&mut self, backend: &mut dyn Backend, vector: u8) {
        let ivt_addr = (vector as u32) * 4;
        let mut buf = [0u8; 4];
        backend.read_mem(&self.state, &mut buf, 4, ivt_addr);
        let offset = u16::from_le_bytes([buf[0], buf[1]]);
        let segment = u16::from_le_bytes([buf[2], buf[3]]);

        let flags = self.state.flags;
        let cs = self.state.read_seg(SegmentRegister::CS);
        let ip = self.state.ip;
        self.push(backend, WORD, flags);
        self.push(backend, WORD, cs);
        self.push(backend, WORD, ip);

        self.state.set_flag(state::flag::IF, false);
        self.state.set_flag(state::flag::TF, false);
        self.state.write_seg(SegmentRegister::CS, segment);
        self.state.ip = offset;
    }
}
