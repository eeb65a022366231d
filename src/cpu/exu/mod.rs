//! Execution units split by instruction group
//!
//! `execute` is the single entry point: it dispatches on the decoded format and
//! opcode, mutates registers/memory, and reports whether the hart keeps running.
//! PC advance for straight-line code is left to the caller; branch and jump units
//! set the PC themselves.

mod alu;
mod branch;
mod lsu;

use thiserror::Error;

use super::regfile::RegisterFile;
use crate::isa::{DecodedInstr, EBREAK, ECALL, Format, Opcode, UFields};
use crate::memory::{MemError, Memory};

pub use crate::isa::AluOp;

/// 执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    /// 继续取指
    Continue,
    /// ECALL/EBREAK：正常停机
    Halt,
}

/// 执行失败
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecError {
    /// opcode 可识别但 funct3/funct7/移位类型等字段非法，或 opcode 未知
    #[error("invalid encoding 0x{raw:08x} at pc 0x{pc:08x}: {reason}")]
    InvalidEncoding {
        raw: u32,
        pc: u32,
        reason: &'static str,
    },
    /// 访存越界（含取指）
    #[error("memory fault at pc 0x{pc:08x}: {source}")]
    Memory {
        pc: u32,
        #[source]
        source: MemError,
    },
}

pub type ExecResult = Result<ExecStatus, ExecError>;

pub(crate) fn invalid(instr: &DecodedInstr, pc: u32, reason: &'static str) -> ExecError {
    ExecError::InvalidEncoding {
        raw: instr.raw,
        pc,
        reason,
    }
}

/// Execute one decoded instruction against `regs` and `mem`.
///
/// `regs.pc()` must still hold the address of `instr`.
pub fn execute(instr: &DecodedInstr, regs: &mut RegisterFile, mem: &mut dyn Memory) -> ExecResult {
    let pc = regs.pc();

    match instr.format {
        Format::R(r) => alu::execute_reg(instr, r, regs),
        Format::I(i) => match instr.opcode {
            Opcode::OpImm => alu::execute_imm(instr, i, regs),
            Opcode::Load => lsu::load(instr, i, regs, mem),
            Opcode::Jalr => branch::jalr(instr, i, regs),
            Opcode::System => system(instr, pc),
            _ => Err(invalid(instr, pc, "opcode is not an I-type opcode")),
        },
        Format::S(s) => lsu::store(instr, s, regs, mem),
        Format::U(u) => upper(instr, u, regs),
        Format::B(b) => branch::branch(instr, b, regs),
        Format::J(j) => branch::jal(j, regs),
        Format::Unknown => Err(invalid(instr, pc, "unknown opcode")),
    }
}

/// LUI / AUIPC
fn upper(instr: &DecodedInstr, u: UFields, regs: &mut RegisterFile) -> ExecResult {
    let value = match instr.opcode {
        Opcode::Lui => u.imm as u32,
        Opcode::Auipc => regs.pc().wrapping_add(u.imm as u32),
        _ => return Err(invalid(instr, regs.pc(), "opcode is not a U-type opcode")),
    };
    regs.write(u.rd, value);
    Ok(ExecStatus::Continue)
}

/// ECALL 与 EBREAK 都作为停机信号；不模拟 trap
fn system(instr: &DecodedInstr, pc: u32) -> ExecResult {
    match instr.raw {
        ECALL | EBREAK => Ok(ExecStatus::Halt),
        _ => Err(invalid(instr, pc, "unsupported SYSTEM instruction")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::decode;
    use crate::memory::FlatMemory;

    fn run_one(raw: u32, regs: &mut RegisterFile, mem: &mut FlatMemory) -> ExecResult {
        execute(&decode(raw), regs, mem)
    }

    #[test]
    fn test_lui_auipc() {
        let mut regs = RegisterFile::new(0x100);
        let mut mem = FlatMemory::new(64, 0);

        run_one(0x123450B7, &mut regs, &mut mem).unwrap(); // lui x1, 0x12345
        assert_eq!(regs.read(1), 0x12345000);

        run_one(0x12345117, &mut regs, &mut mem).unwrap(); // auipc x2, 0x12345
        assert_eq!(regs.read(2), 0x100 + 0x12345000);
        // U-type 不修改 PC
        assert_eq!(regs.pc(), 0x100);
    }

    #[test]
    fn test_ecall_ebreak_halt() {
        let mut regs = RegisterFile::new(0);
        let mut mem = FlatMemory::new(64, 0);
        assert_eq!(run_one(ECALL, &mut regs, &mut mem), Ok(ExecStatus::Halt));
        assert_eq!(run_one(EBREAK, &mut regs, &mut mem), Ok(ExecStatus::Halt));
    }

    #[test]
    fn test_other_system_is_invalid() {
        let mut regs = RegisterFile::new(0x40);
        let mut mem = FlatMemory::new(64, 0);
        // csrrw x1, mstatus, x2
        let err = run_one(0x300110F3, &mut regs, &mut mem).unwrap_err();
        assert!(matches!(
            err,
            ExecError::InvalidEncoding { raw: 0x300110F3, pc: 0x40, .. }
        ));
    }

    #[test]
    fn test_unknown_opcode_is_invalid() {
        let mut regs = RegisterFile::new(0);
        let mut mem = FlatMemory::new(64, 0);
        let err = run_one(0x0000000F, &mut regs, &mut mem).unwrap_err(); // fence
        assert!(matches!(err, ExecError::InvalidEncoding { .. }));
    }
}
