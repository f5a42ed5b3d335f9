//! Parallel copies for phi moves
//!
//! All phis of a block take their values at once when control enters
//! along an edge. The moves are ordered so no destination is written
//! while it is still a pending source; cycles are broken through the
//! scratch register.

use log::trace;
use xcc_codegen::{AsmInst, CallingConvention, Operand};

/// A single 32-bit move, staged through the stack when both sides are
/// memory
pub fn move_value(src: Operand, dst: Operand) -> Vec<AsmInst> {
    if src == dst {
        Vec::new()
    } else if src.is_mem() && dst.is_mem() {
        vec![AsmInst::Pushq(src), AsmInst::Popq(dst)]
    } else {
        vec![AsmInst::Movl(src, dst)]
    }
}

/// Orders `(source, destination)` pairs with distinct destinations
pub fn sequentialize(moves: Vec<(Operand, Operand)>) -> Vec<AsmInst> {
    let scratch = Operand::Reg(CallingConvention::SCRATCH);
    let mut pending: Vec<(Operand, Operand)> = moves
        .into_iter()
        .filter(|(src, dst)| src != dst)
        .collect();
    let mut insts = Vec::new();

    while !pending.is_empty() {
        let ready = pending
            .iter()
            .position(|(_, dst)| !pending.iter().any(|(src, _)| src == dst));

        match ready {
            Some(index) => {
                let (src, dst) = pending.remove(index);
                insts.extend(move_value(src, dst));
            }
            None => {
                // every destination is still needed: park one in scratch
                let (_, blocked) = pending[0];
                trace!("breaking copy cycle at {}", blocked);
                insts.extend(move_value(blocked, scratch));
                for (src, _) in pending.iter_mut() {
                    if *src == blocked {
                        *src = scratch;
                    }
                }
            }
        }
    }
    insts
}
