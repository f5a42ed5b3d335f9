//! Machine state and the fetch/execute loop

mod execution;
mod stack;
mod state;

pub use state::{Flags, MachineState};

use crate::constants::*;
use crate::VmError;
use log::{debug, trace};
use stack::Stack;
use std::collections::HashMap;
use xcc_codegen::{AsmInst, Reg};

pub struct Machine {
    instructions: Vec<AsmInst>,
    labels: HashMap<String, usize>,
    registers: [u64; 16],
    flags: Option<Flags>,
    stack: Stack,
    pc: usize,
    state: MachineState,
    steps: u64,
    step_limit: u64,
}

impl Machine {
    /// Loads a program; labels resolve to the index of their instruction
    pub fn new(instructions: &[AsmInst]) -> Result<Self, VmError> {
        let mut labels = HashMap::new();
        for (index, inst) in instructions.iter().enumerate() {
            if let AsmInst::Label(name) = inst {
                if labels.insert(name.clone(), index).is_some() {
                    return Err(VmError::DuplicateLabel(name.clone()));
                }
            }
        }
        debug!("loaded {} instructions, {} labels", instructions.len(), labels.len());

        let mut registers = [0; 16];
        registers[Reg::Rsp.index()] = STACK_TOP;
        Ok(Self {
            instructions: instructions.to_vec(),
            labels,
            registers,
            flags: None,
            stack: Stack::new(),
            pc: 0,
            state: MachineState::Ready,
            steps: 0,
            step_limit: DEFAULT_STEP_LIMIT,
        })
    }

    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = limit;
        self
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn register(&self, reg: Reg) -> u64 {
        self.registers[reg.index()]
    }

    /// Runs from `label` until the program exits. Entering a function
    /// directly works too: its final `ret` halts with `%eax`.
    pub fn run_from(&mut self, label: &str) -> Result<i32, VmError> {
        if self.state != MachineState::Ready {
            return Err(VmError::Halted);
        }
        self.pc = self.label(label)?;
        self.push(RETURN_SENTINEL)?;
        self.state = MachineState::Running;

        loop {
            if let MachineState::Exited(code) = self.state {
                debug!("exited with {} after {} steps", code, self.steps);
                return Ok(code);
            }
            self.step()?;
        }
    }

    pub fn step(&mut self) -> Result<(), VmError> {
        match self.state {
            MachineState::Running => {}
            MachineState::Ready | MachineState::Exited(_) => return Err(VmError::Halted),
        }
        if self.steps >= self.step_limit {
            return Err(VmError::StepLimitExceeded {
                limit: self.step_limit,
            });
        }
        self.steps += 1;

        let inst = self
            .instructions
            .get(self.pc)
            .cloned()
            .ok_or(VmError::PcOutOfBounds { pc: self.pc })?;
        trace!("[{:04}] {}", self.pc, inst);
        self.execute_instruction(&inst)
    }

    fn label(&self, name: &str) -> Result<usize, VmError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| VmError::UnknownLabel(name.to_string()))
    }

    fn push(&mut self, value: u64) -> Result<(), VmError> {
        let rsp = self.registers[Reg::Rsp.index()].wrapping_sub(8);
        self.stack.write(rsp, 8, value, self.pc)?;
        self.registers[Reg::Rsp.index()] = rsp;
        Ok(())
    }

    fn pop(&mut self) -> Result<u64, VmError> {
        let rsp = self.registers[Reg::Rsp.index()];
        let value = self.stack.read(rsp, 8, self.pc)?;
        self.registers[Reg::Rsp.index()] = rsp.wrapping_add(8);
        Ok(value)
    }
}

#[cfg(test)]
mod tests;
