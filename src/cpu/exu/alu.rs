//! Integer ALU: OP (register-register) and OP-IMM (register-immediate)

use super::{ExecResult, ExecStatus, invalid};
use crate::cpu::regfile::RegisterFile;
use crate::isa::{AluOp, DecodedInstr, IFields, RFields};

pub(super) fn execute_reg(instr: &DecodedInstr, r: RFields, regs: &mut RegisterFile) -> ExecResult {
    let op = AluOp::from_reg(r.funct3, r.funct7)
        .ok_or_else(|| invalid(instr, regs.pc(), "unsupported funct3/funct7 for OP"))?;
    let result = op.apply(regs.read(r.rs1), regs.read(r.rs2));
    regs.write(r.rd, result);
    Ok(ExecStatus::Continue)
}

pub(super) fn execute_imm(instr: &DecodedInstr, i: IFields, regs: &mut RegisterFile) -> ExecResult {
    let op = AluOp::from_imm(i.funct3, i.imm)
        .ok_or_else(|| invalid(instr, regs.pc(), "invalid shift type for OP-IMM"))?;
    let result = op.apply(regs.read(i.rs1), i.imm as u32);
    regs.write(i.rd, result);
    Ok(ExecStatus::Continue)
}
