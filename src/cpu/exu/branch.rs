//! Control transfer: conditional branches, JAL, JALR
//!
//! These units always write the PC, taken or not, so the run loop never adds 4
//! after them.

use super::{ExecResult, ExecStatus, invalid};
use crate::cpu::regfile::RegisterFile;
use crate::isa::{BFields, DecodedInstr, IFields, JFields};

pub(super) fn branch(instr: &DecodedInstr, b: BFields, regs: &mut RegisterFile) -> ExecResult {
    let pc = regs.pc();
    let a = regs.read(b.rs1);
    let c = regs.read(b.rs2);

    let taken = match b.funct3 {
        0b000 => a == c,
        0b001 => a != c,
        0b100 => (a as i32) < (c as i32),
        0b101 => (a as i32) >= (c as i32),
        0b110 => a < c,
        0b111 => a >= c,
        _ => return Err(invalid(instr, pc, "unsupported funct3 for BRANCH")),
    };

    let next = if taken {
        pc.wrapping_add(b.imm as u32)
    } else {
        pc.wrapping_add(4)
    };
    regs.set_pc(next);
    Ok(ExecStatus::Continue)
}

pub(super) fn jal(j: JFields, regs: &mut RegisterFile) -> ExecResult {
    let pc = regs.pc();
    regs.write(j.rd, pc.wrapping_add(4));
    regs.set_pc(pc.wrapping_add(j.imm as u32));
    Ok(ExecStatus::Continue)
}

/// 目标地址最低位清零；先读 rs1 再写 rd（rd == rs1 时也成立）
pub(super) fn jalr(instr: &DecodedInstr, i: IFields, regs: &mut RegisterFile) -> ExecResult {
    let pc = regs.pc();
    if i.funct3 != 0 {
        return Err(invalid(instr, pc, "JALR requires funct3 = 0"));
    }

    let target = regs.read(i.rs1).wrapping_add(i.imm as u32) & !1;
    regs.write(i.rd, pc.wrapping_add(4));
    regs.set_pc(target);
    Ok(ExecStatus::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::exu::{ExecError, execute};
    use crate::isa::decode;
    use crate::memory::FlatMemory;

    fn step(raw: u32, regs: &mut RegisterFile) -> ExecResult {
        let mut mem = FlatMemory::new(16, 0);
        execute(&decode(raw), regs, &mut mem)
    }

    #[test]
    fn test_jal_links_and_jumps() {
        let mut regs = RegisterFile::new(0x100);
        step(0x008000EF, &mut regs).unwrap(); // jal x1, 8
        assert_eq!(regs.read(1), 0x104);
        assert_eq!(regs.pc(), 0x108);
    }

    #[test]
    fn test_jal_backward() {
        let mut regs = RegisterFile::new(0x100);
        step(0xFF9FF06F, &mut regs).unwrap(); // jal x0, -8
        assert_eq!(regs.pc(), 0xF8);
        assert_eq!(regs.read(0), 0);
    }

    #[test]
    fn test_beq_taken() {
        let mut regs = RegisterFile::new(0x100);
        regs.write(1, 5);
        regs.write(2, 5);
        step(0x00208463, &mut regs).unwrap(); // beq x1, x2, 8
        assert_eq!(regs.pc(), 0x108);
    }

    #[test]
    fn test_beq_not_taken() {
        let mut regs = RegisterFile::new(0x100);
        regs.write(1, 5);
        regs.write(2, 6);
        step(0x00208463, &mut regs).unwrap(); // beq x1, x2, 8
        assert_eq!(regs.pc(), 0x104);
    }

    #[test]
    fn test_signed_vs_unsigned_branches() {
        // x1 = -1, x2 = 1
        let cases = [
            (0x0020C463, 0x108), // blt x1, x2, 8：-1 < 1
            (0x0020D463, 0x104), // bge x1, x2, 8
            (0x0020E463, 0x104), // bltu x1, x2, 8：0xFFFFFFFF > 1
            (0x0020F463, 0x108), // bgeu x1, x2, 8
            (0x00209463, 0x108), // bne x1, x2, 8
        ];
        for (raw, expected) in cases {
            let mut regs = RegisterFile::new(0x100);
            regs.write(1, u32::MAX);
            regs.write(2, 1);
            step(raw, &mut regs).unwrap();
            assert_eq!(regs.pc(), expected, "raw = 0x{raw:08x}");
        }
    }

    #[test]
    fn test_branch_bad_funct3() {
        let mut regs = RegisterFile::new(0);
        let err = step(0x0020A463, &mut regs).unwrap_err(); // funct3 = 010
        assert!(matches!(err, ExecError::InvalidEncoding { .. }));
        assert_eq!(regs.pc(), 0);
    }

    #[test]
    fn test_jalr_clears_low_bit() {
        let mut regs = RegisterFile::new(0x100);
        regs.write(5, 0x201);
        step(0x000280E7, &mut regs).unwrap(); // jalr x1, 0(x5)
        assert_eq!(regs.pc(), 0x200);
        assert_eq!(regs.read(1), 0x104);
    }

    #[test]
    fn test_jalr_rd_equals_rs1() {
        let mut regs = RegisterFile::new(0x100);
        regs.write(1, 0x300);
        step(0x004080E7, &mut regs).unwrap(); // jalr x1, 4(x1)
        assert_eq!(regs.pc(), 0x304);
        assert_eq!(regs.read(1), 0x104);
    }

    #[test]
    fn test_jalr_bad_funct3() {
        let mut regs = RegisterFile::new(0);
        let err = step(0x000090E7, &mut regs).unwrap_err(); // funct3 = 001
        assert!(matches!(err, ExecError::InvalidEncoding { .. }));
    }
}
