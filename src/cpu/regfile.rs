//! Architectural register state: x0..x31 plus the program counter.

pub const NUM_REGS: usize = 32;

/// Integer register file with a hard-wired zero register and the PC.
///
/// Every register write in the simulator goes through [`RegisterFile::write`],
/// so the x0 invariant holds no matter which instruction produced the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    x: [u32; NUM_REGS],
    pc: u32,
}

impl RegisterFile {
    pub fn new(pc: u32) -> Self {
        Self {
            x: [0; NUM_REGS],
            pc,
        }
    }

    /// x0 always reads as zero.
    #[inline]
    pub fn read(&self, reg: u8) -> u32 {
        if reg == 0 { 0 } else { self.x[reg as usize] }
    }

    /// Writes to x0 are dropped.
    #[inline]
    pub fn write(&mut self, reg: u8, value: u32) {
        if reg == 0 {
            return;
        }
        self.x[reg as usize] = value;
    }

    #[inline]
    pub fn pc(&self) -> u32 {
        self.pc
    }

    #[inline]
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn snapshot(&self) -> &[u32; NUM_REGS] {
        &self.x
    }
}
