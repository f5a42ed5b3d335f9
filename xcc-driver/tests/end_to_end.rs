//! Compiles whole programs and runs them on the simulator at every
//! optimization level

use pretty_assertions::assert_eq;
use xcc_common::ExitStatus;
use xcc_driver::{compile_source, run_source, CompileOptions};
use xcc_ir::OptLevel;
use xvm::VmError;

const LEVELS: [OptLevel; 2] = [OptLevel::O0, OptLevel::O1];

fn run_at(source: &str, optimize: OptLevel) -> Result<i32, VmError> {
    run_source(source, &CompileOptions { optimize })
        .unwrap_or_else(|err| panic!("{} failed to compile: {}", optimize, err))
}

fn assert_returns(source: &str, expected: i32) {
    for level in LEVELS {
        assert_eq!(run_at(source, level), Ok(expected), "at {}", level);
    }
}

#[test]
fn test_constant_arithmetic() {
    assert_returns("int main() { return 2 + 3 * 4; }", 14);
    assert_returns("int main() { return 17 % 5; }", 2);
    assert_returns("int main() { return -7 / 2 * 10 + -7 % 2; }", -31);
}

#[test]
fn test_while_sum() {
    let source = "int main() {
        int i = 0;
        int s = 0;
        while (i < 5) { s += i; i += 1; }
        return s;
    }";
    assert_returns(source, 10);
}

#[test]
fn test_nested_loops_with_break_and_continue() {
    let source = "int main() {
        int total = 0;
        for (int i = 0; i < 10; i += 1) {
            if (i == 7) { break; }
            if (i % 2 == 1) { continue; }
            int j = 0;
            while (true) {
                if (j >= i) { break; }
                total += j;
                j += 1;
            }
        }
        return total;
    }";
    assert_returns(source, 22);
}

#[test]
fn test_continue_in_while_loop() {
    let source = "int main() {
        int i = 0;
        int odd = 0;
        while (i < 10) {
            i += 1;
            if (i % 2 == 0) { continue; }
            odd += i;
        }
        return odd;
    }";
    assert_returns(source, 25);
}

#[test]
fn test_short_circuit_skips_division() {
    let source = "int main() {
        int a = 5;
        int b = 0;
        bool ok = b != 0 && a / b > 1;
        int c = ok ? 1 : 2;
        bool either = a > 3 || a / b == 0;
        return either ? c * 10 : c;
    }";
    assert_returns(source, 20);
}

#[test]
fn test_ternary_in_loop() {
    let source = "int main() {
        int n = 27;
        int steps = 0;
        while (n != 1) {
            n = n % 2 == 0 ? n / 2 : 3 * n + 1;
            steps += 1;
        }
        return steps;
    }";
    assert_returns(source, 111);
}

#[test]
fn test_shifts_and_bitwise() {
    let source = "int main() {
        int x = -64;
        int s = 3;
        int y = 5 << s;
        int mask = ~0 ^ 0xF0;
        return (x >> 3) + (1 << 4) + (y >> s) + (mask & 0xFF);
    }";
    assert_returns(source, -8 + 16 + 5 + 0x0F);
}

#[test]
fn test_loop_carried_swap() {
    let source = "int main() {
        int a = 1;
        int b = 2;
        for (int i = 0; i < 5; i += 1) {
            int t = a;
            a = b;
            b = t;
        }
        return a * 10 + b;
    }";
    assert_returns(source, 21);
}

#[test]
fn test_register_pressure_spills() {
    let count = 16;
    let mut source = String::from("int main() {\n");
    for k in 0..count {
        source.push_str(&format!("int a{} = {};\n", k, k + 1));
    }
    source.push_str("for (int i = 0; i < 3; i += 1) {\n");
    source.push_str(&format!("a0 += a{};\n", count - 1));
    for k in 1..count {
        source.push_str(&format!("a{} += a{};\n", k, k - 1));
    }
    source.push_str("}\nreturn ");
    let names: Vec<String> = (0..count).map(|k| format!("a{}", k)).collect();
    source.push_str(&names.join(" + "));
    source.push_str(";\n}\n");

    let mut values: Vec<i32> = (1..=count as i32).collect();
    for _ in 0..3 {
        values[0] = values[0].wrapping_add(values[count - 1]);
        for k in 1..count {
            values[k] = values[k].wrapping_add(values[k - 1]);
        }
    }
    let expected = values.iter().fold(0i32, |sum, value| sum.wrapping_add(*value));

    for level in LEVELS {
        let compilation = compile_source(&source, "pressure.l2", &CompileOptions { optimize: level }).unwrap();
        assert!(compilation.functions[0].allocation.spill_slots() > 0, "no spills at {}", level);
        assert_eq!(compilation.run(), Ok(expected), "at {}", level);
    }
}

#[test]
fn test_unused_division_still_traps() {
    let source = "int main() { int a = 10 / 2; int b = a % 0; return a; }";
    for level in LEVELS {
        assert!(
            matches!(run_at(source, level), Err(VmError::DivideByZero { .. })),
            "at {}",
            level
        );
    }
}

#[test]
fn test_division_overflow_traps() {
    let source = "int main() { int m = -2147483648; return m / -1; }";
    for level in LEVELS {
        assert!(
            matches!(run_at(source, level), Err(VmError::DivideOverflow { .. })),
            "at {}",
            level
        );
    }
}

#[test]
fn test_assembly_text() {
    let compilation = compile_source(
        "int main() { int a = 17; int b = 5; return a % b; }",
        "mod.l2",
        &CompileOptions { optimize: OptLevel::O0 },
    )
    .unwrap();
    let asm = compilation.assembly().unwrap();
    assert!(asm.starts_with(".global main\n.text\nmain:\n    call _main\n"));
    assert!(asm.contains("    cltd\n    idivl "));
    assert!(asm.contains("_main:\n    pushq %rbp\n    movq %rsp, %rbp\n"));
    assert!(asm.ends_with("    leave\n    ret\n"));
}

#[test]
fn test_semantic_failures_stop_before_codegen() {
    let options = CompileOptions::default();
    let err = compile_source("int main() { break; return 0; }", "bad.l2", &options)
        .err()
        .unwrap();
    assert_eq!(err.exit_status(), ExitStatus::SemanticFailure);

    let err = compile_source("int main() { return x; }", "bad.l2", &options)
        .err()
        .unwrap();
    assert_eq!(err.exit_status(), ExitStatus::SemanticFailure);

    let err = compile_source("int main() { return 1 }", "bad.l2", &options)
        .err()
        .unwrap();
    assert_eq!(err.exit_status(), ExitStatus::ParseFailure);
}

#[test]
fn test_ir_dump_lists_every_function() {
    let compilation = compile_source(
        "int helper() { return 1; } int main() { return 2; }",
        "two.l2",
        &CompileOptions::default(),
    )
    .unwrap();
    let dump = compilation.ir_dump();
    assert!(dump.contains("graph helper {"));
    assert!(dump.contains("graph main {"));
    assert_eq!(compilation.allocations().len(), 2);
}
