//! Asynchronous signal surface for a host driving the CPU from another
//! thread.
//!
//! `SignalState` is a single-producer/single-consumer channel: the host
//! thread writes with release ordering, the CPU thread reads with acquire
//! ordering, and neither side reads back what it wrote. No locks. Grounded
//! on `original_source/src/include/cpu86e/cpu.h`'s
//! `std::atomic_bool nmi/halt` and `std::atomic_int intr` fields and the
//! `SetNMI`/`SetHalt`/`SetINTR` methods declared alongside them.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Sentinel meaning "no interrupt armed", matching
/// `cpu86e::IIOHook::NoInterrupt` / `CPU::NoInterrupt`.
pub const NO_INTERRUPT: i32 = -1;

/// The three host-visible, thread-safe inputs to the step engine.
#[derive(Debug, Default)]
pub struct SignalState {
    nmi: AtomicBool,
    halt: AtomicBool,
    intr: AtomicI32,
}

impl SignalState {
    /// A fresh signal state: nothing asserted, no interrupt armed.
    pub fn new() -> Self {
        Self {
            nmi: AtomicBool::new(false),
            halt: AtomicBool::new(false),
            intr: AtomicI32::new(NO_INTERRUPT),
        }
    }

    /// Arm a maskable interrupt (or disarm with [`NO_INTERRUPT`]). Also
    /// clears HALT so a halted CPU wakes, matching
    /// `cpu86e::CPU::SetINTR`'s documented effect.
    pub fn set_intr(&self, vector_or_none: i32) {
        self.intr.store(vector_or_none, Ordering::Release);
        if vector_or_none != NO_INTERRUPT {
            self.halt.store(false, Ordering::Release);
        }
    }

    /// Arm or clear the non-maskable interrupt latch. Also clears HALT.
    pub fn set_nmi(&self, level: bool) {
        if level {
            self.nmi.store(true, Ordering::Release);
            self.halt.store(false, Ordering::Release);
        } else {
            self.nmi.store(false, Ordering::Release);
        }
    }

    /// Force (or release) the halt state from outside the CPU thread.
    pub fn set_halt(&self, level: bool) {
        self.halt.store(level, Ordering::Release);
    }

    /// Read the current armed interrupt vector (or [`NO_INTERRUPT`]).
    pub fn intr(&self) -> i32 {
        self.intr.load(Ordering::Acquire)
    }

    /// Read and clear the NMI latch atomically enough for our
    /// single-producer/single-consumer contract: only the CPU thread ever
    /// clears it, so a plain load-then-store is sufficient.
    pub fn take_nmi(&self) -> bool {
        let asserted = self.nmi.load(Ordering::Acquire);
        if asserted {
            self.nmi.store(false, Ordering::Release);
        }
        asserted
    }

    /// Read the current halt request.
    pub fn halted(&self) -> bool {
        self.halt.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intr_defaults_to_none() {
        let sig = SignalState::new();
        assert_eq!(sig.intr(), NO_INTERRUPT);
    }

    #[test]
    fn set_intr_clears_halt() {
        let sig = SignalState::new();
        sig.set_halt(true);
        sig.set_intr(0x20);
        assert_eq!(sig.intr(), 0x20);
        assert!(!sig.halted());
    }

    #[test]
    fn set_nmi_clears_halt_and_latches_once() {
        let sig = SignalState::new();
        sig.set_halt(true);
        sig.set_nmi(true);
        assert!(!sig.halted());
        assert!(sig.take_nmi());
        assert!(!sig.take_nmi());
    }
}
