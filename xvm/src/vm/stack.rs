//! Byte-addressed, little-endian stack memory

use crate::constants::{STACK_BASE, STACK_SIZE};
use crate::VmError;

pub struct Stack {
    bytes: Vec<u8>,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; STACK_SIZE],
        }
    }

    fn range(&self, address: u64, width: usize, pc: usize) -> Result<std::ops::Range<usize>, VmError> {
        let fault = VmError::StackFault { address, pc };
        let start = address.checked_sub(STACK_BASE).ok_or(fault.clone())? as usize;
        let end = start.checked_add(width).ok_or(fault.clone())?;
        if end > self.bytes.len() {
            return Err(fault);
        }
        Ok(start..end)
    }

    pub fn read(&self, address: u64, width: usize, pc: usize) -> Result<u64, VmError> {
        let range = self.range(address, width, pc)?;
        let mut buf = [0u8; 8];
        buf[..width].copy_from_slice(&self.bytes[range]);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn write(&mut self, address: u64, width: usize, value: u64, pc: usize) -> Result<(), VmError> {
        let range = self.range(address, width, pc)?;
        self.bytes[range].copy_from_slice(&value.to_le_bytes()[..width]);
        Ok(())
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
