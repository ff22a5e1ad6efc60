mod trap;

pub use self::trap::TrapVector;

use crate::device::Console;
use crate::error::RunError;
use crate::image::Image;
use crate::instr::{
    extract_base_r, extract_cond, extract_dr, extract_imm5, extract_offset11, extract_offset6,
    extract_offset9, extract_sr1, extract_sr2, is_imm, is_long, Opcode,
};
use crate::memory::Memory;
use crate::registers::Registers;
use crate::PC_START;

/// Whether the fetch-decode-execute loop should keep going.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Running,
    /// Reached `HALT`. Terminal.
    Halted,
}

/// Represents complete program state during runtime.
#[derive(Debug)]
pub struct RunState<C> {
    mem: Memory,
    reg: Registers,
    console: C,
    status: Status,
}

type Handler<C> = fn(&mut RunState<C>, u16) -> Result<(), RunError>;

impl<C: Console> RunState<C> {
    /// Zeroed machine, ready to fetch from [`PC_START`].
    pub fn new(console: C) -> Self {
        Self::with_parts(Memory::new(), Registers::new(PC_START), console)
    }

    pub fn with_parts(mem: Memory, reg: Registers, console: C) -> Self {
        Self {
            mem,
            reg,
            console,
            status: Status::Running,
        }
    }

    /// Copy `image` into memory. Returns its origin; the PC is left alone.
    pub fn load(&mut self, image: &Image) -> u16 {
        self.mem.load(image)
    }

    const OP_TABLE: [Handler<C>; 16] = [
        Self::br,   // 0x0
        Self::add,  // 0x1
        Self::ld,   // 0x2
        Self::st,   // 0x3
        Self::jsr,  // 0x4
        Self::and,  // 0x5
        Self::ldr,  // 0x6
        Self::str,  // 0x7
        Self::rti,  // 0x8
        Self::not,  // 0x9
        Self::ldi,  // 0xA
        Self::sti,  // 0xB
        Self::jmp,  // 0xC
        Self::res,  // 0xD
        Self::lea,  // 0xE
        Self::trap, // 0xF
    ];

    /// Execute instructions until `HALT`. Returns the amount of instructions executed.
    pub fn run(&mut self) -> Result<u64, RunError> {
        let mut count = 0;
        while self.status == Status::Running {
            self.step()?;
            count += 1;
        }
        Ok(count)
    }

    /// Fetch, decode and execute a single instruction.
    ///
    /// Does nothing once halted.
    pub fn step(&mut self) -> Result<Status, RunError> {
        if self.status == Status::Halted {
            return Ok(Status::Halted);
        }
        let addr = self.reg.pc();
        let instr = self.mem_read(addr);
        // PC incremented before instruction is performed
        self.reg.set_pc(addr.wrapping_add(1));

        let opcode = Opcode::from_instr(instr);
        tracing::trace!(
            addr = format!("0x{addr:04X}"),
            instr = format!("0x{instr:04X}"),
            "{opcode}"
        );
        Self::OP_TABLE[opcode as usize](self, instr)?;

        if self.console.take_interrupt() {
            return Err(RunError::Interrupted);
        }
        Ok(self.status)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn registers(&self) -> &Registers {
        &self.reg
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.reg
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn into_console(self) -> C {
        self.console
    }

    #[inline]
    fn mem_read(&mut self, addr: u16) -> u16 {
        self.mem.read(addr, &mut self.console)
    }

    /// Address of the instruction currently executing.
    #[inline]
    fn instr_addr(&self) -> u16 {
        self.reg.pc().wrapping_sub(1)
    }

    #[inline]
    fn pc_relative(&self, offset: u16) -> u16 {
        self.reg.pc().wrapping_add(offset)
    }

    fn add(&mut self, instr: u16) -> Result<(), RunError> {
        let dr = extract_dr(instr);
        let val1 = self.reg.get(extract_sr1(instr));
        let val2 = if is_imm(instr) {
            extract_imm5(instr)
        } else {
            self.reg.get(extract_sr2(instr))
        };
        self.reg.set(dr, val1.wrapping_add(val2));
        self.reg.recompute_flags(dr);
        Ok(())
    }

    fn and(&mut self, instr: u16) -> Result<(), RunError> {
        let dr = extract_dr(instr);
        let val1 = self.reg.get(extract_sr1(instr));
        let val2 = if is_imm(instr) {
            extract_imm5(instr)
        } else {
            self.reg.get(extract_sr2(instr))
        };
        self.reg.set(dr, val1 & val2);
        self.reg.recompute_flags(dr);
        Ok(())
    }

    fn not(&mut self, instr: u16) -> Result<(), RunError> {
        let dr = extract_dr(instr);
        let val = !self.reg.get(extract_sr1(instr));
        self.reg.set(dr, val);
        self.reg.recompute_flags(dr);
        Ok(())
    }

    fn br(&mut self, instr: u16) -> Result<(), RunError> {
        if extract_cond(instr) & self.reg.flag() as u16 != 0 {
            self.reg.set_pc(self.pc_relative(extract_offset9(instr)));
        }
        Ok(())
    }

    /// Also `RET`, as `JMP R7`.
    fn jmp(&mut self, instr: u16) -> Result<(), RunError> {
        let target = self.reg.get(extract_base_r(instr));
        self.reg.set_pc(target);
        Ok(())
    }

    /// `JSR` and `JSRR`.
    fn jsr(&mut self, instr: u16) -> Result<(), RunError> {
        // Read base register first, in case it is R7
        let target = if is_long(instr) {
            self.pc_relative(extract_offset11(instr))
        } else {
            self.reg.get(extract_base_r(instr))
        };
        self.reg.set(7, self.reg.pc());
        self.reg.set_pc(target);
        Ok(())
    }

    fn ld(&mut self, instr: u16) -> Result<(), RunError> {
        let dr = extract_dr(instr);
        let val = self.mem_read(self.pc_relative(extract_offset9(instr)));
        self.reg.set(dr, val);
        self.reg.recompute_flags(dr);
        Ok(())
    }

    fn ldi(&mut self, instr: u16) -> Result<(), RunError> {
        let dr = extract_dr(instr);
        let ptr = self.mem_read(self.pc_relative(extract_offset9(instr)));
        let val = self.mem_read(ptr);
        self.reg.set(dr, val);
        self.reg.recompute_flags(dr);
        Ok(())
    }

    fn ldr(&mut self, instr: u16) -> Result<(), RunError> {
        let dr = extract_dr(instr);
        let base = self.reg.get(extract_base_r(instr));
        let val = self.mem_read(base.wrapping_add(extract_offset6(instr)));
        self.reg.set(dr, val);
        self.reg.recompute_flags(dr);
        Ok(())
    }

    fn lea(&mut self, instr: u16) -> Result<(), RunError> {
        let dr = extract_dr(instr);
        self.reg.set(dr, self.pc_relative(extract_offset9(instr)));
        self.reg.recompute_flags(dr);
        Ok(())
    }

    fn st(&mut self, instr: u16) -> Result<(), RunError> {
        let val = self.reg.get(extract_dr(instr));
        self.mem.write(self.pc_relative(extract_offset9(instr)), val);
        Ok(())
    }

    fn sti(&mut self, instr: u16) -> Result<(), RunError> {
        let val = self.reg.get(extract_dr(instr));
        let ptr = self.mem_read(self.pc_relative(extract_offset9(instr)));
        self.mem.write(ptr, val);
        Ok(())
    }

    fn str(&mut self, instr: u16) -> Result<(), RunError> {
        let val = self.reg.get(extract_dr(instr));
        let base = self.reg.get(extract_base_r(instr));
        self.mem.write(base.wrapping_add(extract_offset6(instr)), val);
        Ok(())
    }

    fn rti(&mut self, _instr: u16) -> Result<(), RunError> {
        Err(RunError::ReservedOpcode {
            opcode: Opcode::Rti,
            addr: self.instr_addr(),
        })
    }

    fn res(&mut self, _instr: u16) -> Result<(), RunError> {
        Err(RunError::ReservedOpcode {
            opcode: Opcode::Res,
            addr: self.instr_addr(),
        })
    }
}
