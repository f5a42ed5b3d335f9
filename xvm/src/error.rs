use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("Unknown label '{0}'")]
    UnknownLabel(String),

    #[error("Duplicate label '{0}'")]
    DuplicateLabel(String),

    #[error("Division by zero at instruction {pc}")]
    DivideByZero { pc: usize },

    #[error("Division overflow at instruction {pc}")]
    DivideOverflow { pc: usize },

    #[error("Stack access at {address:#x} outside the stack (instruction {pc})")]
    StackFault { address: u64, pc: usize },

    #[error("Cannot write to an immediate operand at instruction {pc}")]
    ImmediateDestination { pc: usize },

    #[error("Conditional instruction before any comparison at instruction {pc}")]
    FlagsUndefined { pc: usize },

    #[error("Unsupported syscall {number}")]
    UnsupportedSyscall { number: u64 },

    #[error("Program counter {pc} ran past the end of the program")]
    PcOutOfBounds { pc: usize },

    #[error("Step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },

    #[error("Machine has already halted")]
    Halted,
}
