use super::*;
use pretty_assertions::assert_eq;
use xcc_codegen::{Cond, Operand, ShiftCount};

fn reg(reg: Reg) -> Operand {
    Operand::Reg(reg)
}

fn imm(value: i32) -> Operand {
    Operand::Imm(value)
}

/// Wraps a function body in a label and runs it directly
fn run_body(body: Vec<AsmInst>) -> Result<i32, VmError> {
    let mut program = vec![AsmInst::Label("f".to_string())];
    program.extend(body);
    Machine::new(&program)?.run_from("f")
}

#[test]
fn test_exit_syscall_returns_edi() {
    let program = vec![
        AsmInst::Label("main".to_string()),
        AsmInst::Call("_main".to_string()),
        AsmInst::Movq(reg(Reg::Rax), reg(Reg::Rdi)),
        AsmInst::Movq(imm(60), reg(Reg::Rax)),
        AsmInst::Syscall,
        AsmInst::Label("_main".to_string()),
        AsmInst::Movl(imm(42), reg(Reg::Rax)),
        AsmInst::Ret,
    ];
    let mut machine = Machine::new(&program).unwrap();
    assert_eq!(machine.run_from("main"), Ok(42));
    assert_eq!(machine.state(), MachineState::Exited(42));
}

#[test]
fn test_32_bit_writes_zero_extend() {
    let program = vec![
        AsmInst::Label("f".to_string()),
        AsmInst::Movq(imm(-1), reg(Reg::Rbx)),
        AsmInst::Movl(imm(-1), reg(Reg::Rbx)),
        AsmInst::Movl(imm(0), reg(Reg::Rax)),
        AsmInst::Ret,
    ];
    let mut machine = Machine::new(&program).unwrap();
    machine.run_from("f").unwrap();
    assert_eq!(machine.register(Reg::Rbx), 0xffff_ffff);
}

#[test]
fn test_arithmetic_wraps() {
    let result = run_body(vec![
        AsmInst::Movl(imm(i32::MAX), reg(Reg::Rax)),
        AsmInst::Addl(imm(1), reg(Reg::Rax)),
        AsmInst::Ret,
    ]);
    assert_eq!(result, Ok(i32::MIN));
}

#[test]
fn test_signed_division_and_remainder() {
    let result = run_body(vec![
        AsmInst::Movl(imm(-7), reg(Reg::Rax)),
        AsmInst::Cltd,
        AsmInst::Movl(imm(2), reg(Reg::Rbx)),
        AsmInst::Idivl(reg(Reg::Rbx)),
        AsmInst::Imull(imm(10), Reg::Rax),
        AsmInst::Addl(reg(Reg::Rdx), reg(Reg::Rax)),
        AsmInst::Ret,
    ]);
    assert_eq!(result, Ok(-31));
}

#[test]
fn test_division_traps() {
    let zero = run_body(vec![
        AsmInst::Movl(imm(1), reg(Reg::Rax)),
        AsmInst::Cltd,
        AsmInst::Idivl(imm(0)),
        AsmInst::Ret,
    ]);
    assert_eq!(zero, Err(VmError::DivideByZero { pc: 3 }));

    let overflow = run_body(vec![
        AsmInst::Movl(imm(i32::MIN), reg(Reg::Rax)),
        AsmInst::Cltd,
        AsmInst::Idivl(imm(-1)),
        AsmInst::Ret,
    ]);
    assert_eq!(overflow, Err(VmError::DivideOverflow { pc: 3 }));
}

#[test]
fn test_shifts() {
    let result = run_body(vec![
        AsmInst::Movl(imm(-64), reg(Reg::Rax)),
        AsmInst::Movl(imm(35), reg(Reg::Rcx)),
        AsmInst::Sarl(ShiftCount::Cl, reg(Reg::Rax)),
        AsmInst::Shll(ShiftCount::Imm(1), reg(Reg::Rax)),
        AsmInst::Ret,
    ]);
    assert_eq!(result, Ok(-16));
}

#[test]
fn test_compare_setcc_and_branch() {
    let result = run_body(vec![
        AsmInst::Movl(imm(3), reg(Reg::Rbx)),
        AsmInst::Movl(reg(Reg::Rbx), reg(Reg::Rax)),
        AsmInst::Cmpl(imm(5), reg(Reg::Rax)),
        AsmInst::Set(Cond::L, Reg::Rax),
        AsmInst::Movzbl(Reg::Rax, Reg::Rax),
        AsmInst::Cmpl(imm(0), reg(Reg::Rax)),
        AsmInst::J(Cond::E, "no".to_string()),
        AsmInst::Movl(imm(1), reg(Reg::Rax)),
        AsmInst::Ret,
        AsmInst::Label("no".to_string()),
        AsmInst::Movl(imm(2), reg(Reg::Rax)),
        AsmInst::Ret,
    ]);
    assert_eq!(result, Ok(1));
}

#[test]
fn test_frame_and_spill_slots() {
    let slot = Operand::Mem { base: Reg::Rbp, offset: -8 };
    let result = run_body(vec![
        AsmInst::Pushq(reg(Reg::Rbp)),
        AsmInst::Movq(reg(Reg::Rsp), reg(Reg::Rbp)),
        AsmInst::Subq(16, Reg::Rsp),
        AsmInst::Movl(imm(9), slot),
        AsmInst::Pushq(slot),
        AsmInst::Popq(Operand::Mem { base: Reg::Rbp, offset: -16 }),
        AsmInst::Movl(Operand::Mem { base: Reg::Rbp, offset: -16 }, reg(Reg::Rax)),
        AsmInst::Leave,
        AsmInst::Ret,
    ]);
    assert_eq!(result, Ok(9));
}

#[test]
fn test_unknown_label() {
    let result = run_body(vec![AsmInst::Jmp("nowhere".to_string())]);
    assert_eq!(result, Err(VmError::UnknownLabel("nowhere".to_string())));
}

#[test]
fn test_step_limit() {
    let program = vec![
        AsmInst::Label("f".to_string()),
        AsmInst::Jmp("f".to_string()),
    ];
    let mut machine = Machine::new(&program).unwrap().with_step_limit(100);
    assert_eq!(
        machine.run_from("f"),
        Err(VmError::StepLimitExceeded { limit: 100 })
    );
    assert_eq!(machine.steps(), 100);
}

#[test]
fn test_duplicate_label_rejected() {
    let program = vec![AsmInst::Label("f".to_string()), AsmInst::Label("f".to_string())];
    assert!(matches!(Machine::new(&program), Err(VmError::DuplicateLabel(_))));
}
