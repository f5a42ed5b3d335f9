use super::{Flags, Machine, MachineState};
use crate::constants::{RETURN_SENTINEL, SYS_EXIT};
use crate::VmError;
use xcc_codegen::{AsmInst, Operand, Reg, ShiftCount};

impl Machine {
    pub(super) fn execute_instruction(&mut self, inst: &AsmInst) -> Result<(), VmError> {
        let mut next = self.pc + 1;

        match inst {
            AsmInst::Movl(src, dst) => {
                let value = self.read32(src)?;
                self.write32(dst, value)?;
            }
            AsmInst::Movq(src, dst) => {
                let value = self.read64(src)?;
                self.write64(dst, value)?;
            }
            AsmInst::Movzbl(src, dst) => {
                let byte = self.registers[src.index()] & 0xff;
                self.registers[dst.index()] = byte;
            }
            AsmInst::Pushq(src) => {
                let value = self.read64(src)?;
                self.push(value)?;
            }
            AsmInst::Popq(dst) => {
                let value = self.pop()?;
                self.write64(dst, value)?;
            }

            AsmInst::Addl(src, dst) => self.arithmetic(src, dst, i32::wrapping_add)?,
            AsmInst::Subl(src, dst) => self.arithmetic(src, dst, i32::wrapping_sub)?,
            AsmInst::Andl(src, dst) => self.arithmetic(src, dst, |a, b| a & b)?,
            AsmInst::Orl(src, dst) => self.arithmetic(src, dst, |a, b| a | b)?,
            AsmInst::Xorl(src, dst) => self.arithmetic(src, dst, |a, b| a ^ b)?,
            AsmInst::Imull(src, dst) => {
                self.arithmetic(src, &Operand::Reg(*dst), i32::wrapping_mul)?
            }
            AsmInst::Shll(count, dst) => {
                let count = self.shift_count(count);
                let value = self.read32(dst)?;
                self.write32(dst, value.wrapping_shl(count))?;
            }
            AsmInst::Sarl(count, dst) => {
                let count = self.shift_count(count);
                let value = self.read32(dst)?;
                self.write32(dst, value.wrapping_shr(count))?;
            }
            AsmInst::Cltd => {
                let eax = self.registers[Reg::Rax.index()] as u32 as i32;
                self.set32(Reg::Rdx, if eax < 0 { -1 } else { 0 });
            }
            AsmInst::Idivl(src) => self.divide(src)?,
            AsmInst::Cmpl(src, dst) => {
                self.flags = Some(Flags {
                    left: self.read32(dst)?,
                    right: self.read32(src)?,
                });
            }
            AsmInst::Set(cond, dst) => {
                let flags = self.flags.ok_or(VmError::FlagsUndefined { pc: self.pc })?;
                let bit = u64::from(cond.holds(flags.left, flags.right));
                let reg = &mut self.registers[dst.index()];
                *reg = (*reg & !0xff) | bit;
            }

            AsmInst::Addq(imm, reg) => {
                let reg = &mut self.registers[reg.index()];
                *reg = reg.wrapping_add(*imm as i64 as u64);
            }
            AsmInst::Subq(imm, reg) => {
                let reg = &mut self.registers[reg.index()];
                *reg = reg.wrapping_sub(*imm as i64 as u64);
            }

            AsmInst::Jmp(label) => next = self.label(label)?,
            AsmInst::J(cond, label) => {
                let flags = self.flags.ok_or(VmError::FlagsUndefined { pc: self.pc })?;
                if cond.holds(flags.left, flags.right) {
                    next = self.label(label)?;
                }
            }
            AsmInst::Call(label) => {
                let target = self.label(label)?;
                self.push(next as u64)?;
                next = target;
            }
            AsmInst::Ret => {
                let address = self.pop()?;
                if address == RETURN_SENTINEL {
                    let eax = self.registers[Reg::Rax.index()] as u32 as i32;
                    self.state = MachineState::Exited(eax);
                } else {
                    next = address as usize;
                }
            }
            AsmInst::Leave => {
                self.registers[Reg::Rsp.index()] = self.registers[Reg::Rbp.index()];
                let rbp = self.pop()?;
                self.registers[Reg::Rbp.index()] = rbp;
            }
            AsmInst::Syscall => {
                let number = self.registers[Reg::Rax.index()];
                if number != SYS_EXIT {
                    return Err(VmError::UnsupportedSyscall { number });
                }
                let code = self.registers[Reg::Rdi.index()] as u32 as i32;
                self.state = MachineState::Exited(code);
            }

            AsmInst::Label(_) | AsmInst::Directive(_) | AsmInst::Comment(_) => {}
        }

        self.pc = next;
        Ok(())
    }

    fn arithmetic(&mut self, src: &Operand, dst: &Operand, op: fn(i32, i32) -> i32) -> Result<(), VmError> {
        let right = self.read32(src)?;
        let left = self.read32(dst)?;
        self.write32(dst, op(left, right))
    }

    fn shift_count(&self, count: &ShiftCount) -> u32 {
        match count {
            ShiftCount::Imm(count) => u32::from(*count) & 31,
            ShiftCount::Cl => (self.registers[Reg::Rcx.index()] & 31) as u32,
        }
    }

    /// `%edx:%eax / src`; quotients outside `i32` trap like a zero divisor
    fn divide(&mut self, src: &Operand) -> Result<(), VmError> {
        let divisor = i64::from(self.read32(src)?);
        if divisor == 0 {
            return Err(VmError::DivideByZero { pc: self.pc });
        }
        let high = i64::from(self.registers[Reg::Rdx.index()] as u32 as i32);
        let low = i64::from(self.registers[Reg::Rax.index()] as u32);
        let dividend = (high << 32) | low;

        let overflow = VmError::DivideOverflow { pc: self.pc };
        let (quotient, remainder) = dividend
            .checked_div(divisor)
            .zip(dividend.checked_rem(divisor))
            .ok_or(overflow.clone())?;
        let quotient = i32::try_from(quotient).map_err(|_| overflow)?;
        self.set32(Reg::Rax, quotient);
        self.set32(Reg::Rdx, remainder as i32);
        Ok(())
    }

    /// 32-bit register writes clear the upper half
    fn set32(&mut self, reg: Reg, value: i32) {
        self.registers[reg.index()] = u64::from(value as u32);
    }

    fn address(&self, base: Reg, offset: i32) -> u64 {
        self.registers[base.index()].wrapping_add(offset as i64 as u64)
    }

    fn read32(&self, operand: &Operand) -> Result<i32, VmError> {
        Ok(match *operand {
            Operand::Reg(reg) => self.registers[reg.index()] as u32 as i32,
            Operand::Imm(value) => value,
            Operand::Mem { base, offset } => {
                self.stack.read(self.address(base, offset), 4, self.pc)? as u32 as i32
            }
        })
    }

    fn write32(&mut self, operand: &Operand, value: i32) -> Result<(), VmError> {
        match *operand {
            Operand::Reg(reg) => self.set32(reg, value),
            Operand::Imm(_) => return Err(VmError::ImmediateDestination { pc: self.pc }),
            Operand::Mem { base, offset } => {
                let address = self.address(base, offset);
                self.stack.write(address, 4, u64::from(value as u32), self.pc)?;
            }
        }
        Ok(())
    }

    fn read64(&self, operand: &Operand) -> Result<u64, VmError> {
        Ok(match *operand {
            Operand::Reg(reg) => self.registers[reg.index()],
            Operand::Imm(value) => value as i64 as u64,
            Operand::Mem { base, offset } => self.stack.read(self.address(base, offset), 8, self.pc)?,
        })
    }

    fn write64(&mut self, operand: &Operand, value: u64) -> Result<(), VmError> {
        match *operand {
            Operand::Reg(reg) => self.registers[reg.index()] = value,
            Operand::Imm(_) => return Err(VmError::ImmediateDestination { pc: self.pc }),
            Operand::Mem { base, offset } => {
                let address = self.address(base, offset);
                self.stack.write(address, 8, value, self.pc)?;
            }
        }
        Ok(())
    }
}
