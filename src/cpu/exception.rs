//! Faults and the per-instruction dispatch result.
//!
//! `original_source`'s `CPU::DoOpcode` threw a C++ exception type to unwind
//! a faulting instruction (see `spec.md` §9, "Exceptions-for-control-flow").
//! This crate follows the spec's requested translation instead: every
//! handler returns `Result<Status, Vector>`, and [`crate::cpu::step`]
//! pattern-matches the `Err` arm, rewinds IP, and delivers the
//! corresponding real-mode interrupt vector. No unwinding, and no handler
//! may leave a visible side effect on a faulting path beyond IP, since the
//! step engine rewinds IP on fault.

/// Real-mode interrupt/exception vectors this interpreter can raise on its
/// own. Only the real-mode-reachable subset of the 8086/286+ exception set
/// is generated; the rest of the architectural vector space (`BR`, `NM`,
/// `DF`, `MF`, `TS`, `NP`, `SS`, `GP`, `PF`, `AC`, `MC`, `XM`, `VE`) exists
/// only as IVT entries a guest program may itself invoke via `INT n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vector {
    /// #DE - divide error: DIV/IDIV by zero or quotient overflow, AAM with
    /// a zero immediate.
    DivideError,
    /// #DB - debug: delivered when TF was set before the instruction that
    /// just retired.
    Debug,
    /// NMI - non-maskable interrupt, vector 2.
    Nmi,
    /// #BP - breakpoint: INT3.
    Breakpoint,
    /// #OF - overflow: INTO with OF set.
    Overflow,
    /// #UD - undefined opcode: reserved encodings, illegal register forms,
    /// writes to CS via MOV-to-sreg.
    InvalidOpcode,
    /// A guest-requested software interrupt (`INT imm8`) or an externally
    /// signalled maskable interrupt (INTR), carrying its vector number.
    Interrupt(u8),
}

impl Vector {
    /// The IVT vector number this fault delivers through.
    pub fn number(self) -> u8 {
        match self {
            Vector::DivideError => 0,
            Vector::Debug => 1,
            Vector::Nmi => 2,
            Vector::Breakpoint => 3,
            Vector::Overflow => 4,
            Vector::InvalidOpcode => 6,
            Vector::Interrupt(n) => n,
        }
    }
}

impl std::fmt::Display for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vector::DivideError => write!(f, "#DE (divide error)"),
            Vector::Debug => write!(f, "#DB (debug)"),
            Vector::Nmi => write!(f, "NMI"),
            Vector::Breakpoint => write!(f, "#BP (breakpoint)"),
            Vector::Overflow => write!(f, "#OF (overflow)"),
            Vector::InvalidOpcode => write!(f, "#UD (invalid opcode)"),
            Vector::Interrupt(n) => write!(f, "INT {n:#04x}"),
        }
    }
}

impl std::error::Error for Vector {}

/// Outcome of dispatching one opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The instruction retired normally; IP now points past it.
    Normal,
    /// The dispatched byte was a prefix; the step loop should fetch and
    /// dispatch again without leaving the instruction.
    Continue,
    /// A REP-prefixed string op performed one iteration and has not yet
    /// satisfied its termination condition; the engine rewinds IP to the
    /// start of the instruction so the next `Step` resumes the loop
    /// (and so an interrupt can be delivered between iterations).
    Repeat,
    /// HLT was executed; the engine parks until an enabled interrupt, NMI,
    /// or an external halt-clear.
    Halt,
}

/// Result of a full `Step`/`DoStep` call, returned to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// One instruction (or REP iteration) retired; execution continues.
    Normal,
    /// HLT was reached (or the CPU was already halted and remains so).
    Halt,
}

/// The result of `Run`: either the step budget ran out, or the CPU
/// halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResult {
    /// `steps` instructions were executed without halting.
    BudgetExhausted,
    /// HLT was reached before the step budget ran out.
    Halted,
}

/// A handler's result: the instruction's dispatch outcome, or a fault to
/// deliver.
pub type HandlerResult = Result<Status, Vector>;
