//! Load/store unit

use super::{ExecError, ExecResult, ExecStatus, invalid};
use crate::cpu::regfile::RegisterFile;
use crate::isa::{DecodedInstr, IFields, SFields};
use crate::memory::Memory;

/// LB/LH/LW/LBU/LHU
pub(super) fn load(
    instr: &DecodedInstr,
    i: IFields,
    regs: &mut RegisterFile,
    mem: &mut dyn Memory,
) -> ExecResult {
    let pc = regs.pc();
    let addr = regs.read(i.rs1).wrapping_add(i.imm as u32);

    let value = match i.funct3 {
        0b000 => mem.lb(addr),
        0b001 => mem.lh(addr),
        0b010 => mem.lw(addr),
        0b100 => mem.lbu(addr),
        0b101 => mem.lhu(addr),
        _ => return Err(invalid(instr, pc, "unsupported funct3 for LOAD")),
    }
    .map_err(|source| ExecError::Memory { pc, source })?;

    regs.write(i.rd, value);
    Ok(ExecStatus::Continue)
}

/// SB/SH/SW：写入 rs2 的低 8/16/32 位
pub(super) fn store(
    instr: &DecodedInstr,
    s: SFields,
    regs: &mut RegisterFile,
    mem: &mut dyn Memory,
) -> ExecResult {
    let pc = regs.pc();
    let addr = regs.read(s.rs1).wrapping_add(s.imm as u32);
    let value = regs.read(s.rs2);

    match s.funct3 {
        0b000 => mem.sb(addr, value),
        0b001 => mem.sh(addr, value),
        0b010 => mem.sw(addr, value),
        _ => return Err(invalid(instr, pc, "unsupported funct3 for STORE")),
    }
    .map_err(|source| ExecError::Memory { pc, source })?;

    Ok(ExecStatus::Continue)
}
