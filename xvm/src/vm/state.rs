/// Machine execution states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Ready,
    Running,
    /// Halted through the exit syscall or by returning to the entry caller
    Exited(i32),
}

/// Operands of the last `cmpl`, as `(destination, source)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub left: i32,
    pub right: i32,
}
