use super::*;
use crate::graph::*;
use crate::{IrError, OptLevel};
use pretty_assertions::assert_eq;
use xcc_frontend::Frontend;

fn build(source: &str, level: OptLevel) -> IrGraph {
    let program = Frontend::analyze_source(source, "ssa.l2").unwrap();
    SsaTranslation::new(&program.functions[0], level.optimizer())
        .translate()
        .unwrap()
}

fn translate_unchecked(source: &str) -> Result<IrGraph, IrError> {
    let program = Frontend::parse_source(source, "ssa.l2").unwrap();
    SsaTranslation::new(&program.functions[0], OptLevel::O0.optimizer()).translate()
}

fn returns(graph: &IrGraph) -> Vec<NodeId> {
    graph.predecessors(graph.end_block()).to_vec()
}

fn returned_value(graph: &IrGraph) -> NodeId {
    let ret = returns(graph)[0];
    graph.predecessor(ret, RETURN_RESULT_INDEX).unwrap()
}

fn data_phis(graph: &IrGraph) -> Vec<NodeId> {
    graph
        .reverse_postorder()
        .into_iter()
        .flat_map(|block| graph.phis(block).collect::<Vec<_>>())
        .filter(|&phi| graph.produces_value(phi))
        .collect()
}

fn find_node(graph: &IrGraph, predicate: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
    graph
        .reverse_postorder()
        .into_iter()
        .flat_map(|block| graph.block_nodes(block).to_vec())
        .find(|&id| predicate(graph.kind(id)))
}

#[test]
fn test_constant_expression_folds_at_o1() {
    let graph = build("int main() { return 2 + 3 * 4; }", OptLevel::O1);
    assert_eq!(graph.kind(returned_value(&graph)), &NodeKind::ConstInt(14));
}

#[test]
fn test_constant_expression_kept_at_o0() {
    let graph = build("int main() { return 2 + 3 * 4; }", OptLevel::O0);
    let value = returned_value(&graph);
    assert_eq!(graph.kind(value), &NodeKind::Binary(BinaryOp::Add));
    let right = graph.predecessor(value, RIGHT_INDEX).unwrap();
    assert_eq!(graph.kind(right), &NodeKind::Binary(BinaryOp::Mul));
}

#[test]
fn test_same_value_on_both_arms_needs_no_phi() {
    let source = r#"
        int main() {
            int y = 5;
            int x;
            bool c = y > 2;
            if (c) { x = y; } else { x = y; }
            return x;
        }
    "#;
    for level in [OptLevel::O0, OptLevel::O1] {
        let graph = build(source, level);
        assert!(data_phis(&graph).is_empty(), "{}", graph);
    }
}

#[test]
fn test_different_values_merge_in_phi() {
    let source = r#"
        int main() {
            int y = 5;
            int x = 0;
            if (y > 2) { x = y + 1; }
            return x;
        }
    "#;
    let graph = build(source, OptLevel::O0);
    let phis = data_phis(&graph);
    assert_eq!(phis.len(), 1);
    assert_eq!(returned_value(&graph), phis[0]);
    assert_eq!(graph.predecessors(phis[0]).len(), 2);
}

#[test]
fn test_loop_header_phis() {
    let source = r#"
        int main() {
            int i = 0;
            int s = 0;
            while (i < 5) {
                s += i;
                i += 1;
            }
            return s;
        }
    "#;
    let graph = build(source, OptLevel::O1);
    let compare = find_node(&graph, |kind| matches!(kind, NodeKind::Compare(CompareOp::Lt))).unwrap();
    let header = graph.block_of(compare);

    let header_phis: Vec<NodeId> = graph
        .phis(header)
        .filter(|&phi| graph.produces_value(phi))
        .collect();
    assert_eq!(header_phis.len(), 2);
    for phi in &header_phis {
        assert_eq!(graph.predecessors(*phi).len(), 2);
        assert_eq!(graph.block_predecessors(header).len(), 2);
    }
    assert!(header_phis.contains(&returned_value(&graph)));
    assert!(graph.verify().is_ok());
}

#[test]
fn test_division_threads_side_effects() {
    let graph = build("int main() { int a = 17; int b = 5; return a % b; }", OptLevel::O0);
    let ret = returns(&graph)[0];

    let value = returned_value(&graph);
    assert_eq!(graph.kind(value), &NodeKind::Proj(ProjKind::Result));
    let modulo = graph.skip_proj(value);
    assert_eq!(graph.kind(modulo), &NodeKind::Binary(BinaryOp::Mod));

    let incoming = graph.predecessor(modulo, BINARY_SIDE_EFFECT_INDEX).unwrap();
    assert_eq!(graph.kind(incoming), &NodeKind::Proj(ProjKind::SideEffect));
    assert_eq!(graph.predecessor(incoming, PROJ_SOURCE_INDEX), Some(graph.start()));

    let outgoing = graph.predecessor(ret, RETURN_SIDE_EFFECT_INDEX).unwrap();
    assert_eq!(graph.kind(outgoing), &NodeKind::Proj(ProjKind::SideEffect));
    assert_eq!(graph.predecessor(outgoing, PROJ_SOURCE_INDEX), Some(modulo));
}

#[test]
fn test_division_folds_when_safe() {
    let graph = build("int main() { return 17 % 5; }", OptLevel::O1);
    assert_eq!(graph.kind(returned_value(&graph)), &NodeKind::ConstInt(2));

    let graph = build("int main() { return 1 / 0; }", OptLevel::O1);
    assert_eq!(
        graph.kind(graph.skip_proj(returned_value(&graph))),
        &NodeKind::Binary(BinaryOp::Div)
    );
}

#[test]
fn test_break_outside_loop_is_rejected() {
    let err = translate_unchecked("int main() { break; }").unwrap_err();
    assert!(matches!(err, IrError::LoopControlOutsideLoop { keyword: "break", .. }));
}

#[test]
fn test_missing_return_is_inconsistent() {
    let err = translate_unchecked("int main() { int x = 1; }").unwrap_err();
    assert!(matches!(err, IrError::Consistency { .. }));
}

#[test]
fn test_nested_loops_with_break_and_continue() {
    let source = r#"
        int main() {
            int total = 0;
            for (int i = 0; i < 4; i += 1) {
                if (i == 1) { continue; }
                int j = 0;
                while (true) {
                    if (j >= i) { break; }
                    total += j;
                    j += 1;
                }
            }
            return total;
        }
    "#;
    for level in [OptLevel::O0, OptLevel::O1] {
        let graph = build(source, level);
        assert!(graph.verify().is_ok());
        assert_eq!(returns(&graph).len(), 1);
        assert!(!data_phis(&graph).is_empty());
    }
}

#[test]
fn test_statements_after_return_are_skipped() {
    let graph = build("int main() { return 1; int x = 2; return x; }", OptLevel::O0);
    assert_eq!(returns(&graph).len(), 1);
    assert_eq!(graph.kind(returned_value(&graph)), &NodeKind::ConstInt(1));
}

#[test]
fn test_short_circuit_and_conditional() {
    let source = r#"
        int main() {
            int a = 3;
            bool both = a > 1 && a < 5;
            return both ? a : 0;
        }
    "#;
    let graph = build(source, OptLevel::O0);
    assert!(graph.verify().is_ok());
    assert_eq!(data_phis(&graph).len(), 2);
}

#[test]
fn test_translate_program_maps_errors() {
    let program = Frontend::parse_source("int main() { continue; }", "ssa.l2").unwrap();
    let err = translate_program(&program, || OptLevel::O1.optimizer()).unwrap_err();
    assert_eq!(err.exit_status(), xcc_common::ExitStatus::SemanticFailure);
}

#[test]
fn test_dump_names_function() {
    let graph = build("int main() { return 0; }", OptLevel::O1);
    let dump = graph.to_string();
    assert!(dump.starts_with("graph main {"));
    assert!(dump.contains("Return"));
}

#[test]
fn test_variable_first_read_after_header_is_sealed() {
    // y is first read after the loop, so its header phi is created late
    let source = "int main() {
        int x = 0;
        int y = 0;
        while (x < 10) { y = x; x = x + 1; }
        return y * 100 + x;
    }";
    for level in [OptLevel::O0, OptLevel::O1] {
        let graph = build(source, level);
        assert_eq!(data_phis(&graph).len(), 2);
        let header = graph.block_of(data_phis(&graph)[0]);
        let terminator = graph.terminator(header).unwrap();
        assert!(graph.kind(terminator).is_terminator());
        assert_eq!(graph.verify(), Ok(()));
    }
}
