// Stack layout
pub const STACK_SIZE: usize = 1 << 20;
pub const STACK_TOP: u64 = 0x7fff_0000_0000;
pub const STACK_BASE: u64 = STACK_TOP - STACK_SIZE as u64;

/// Return address pushed by `run_from`; returning to it halts the machine
pub const RETURN_SENTINEL: u64 = u64::MAX;

pub const DEFAULT_STEP_LIMIT: u64 = 50_000_000;

// Linux syscall numbers
pub const SYS_EXIT: u64 = 60;
