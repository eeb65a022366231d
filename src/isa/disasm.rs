//! 反汇编：把已解码指令渲染为汇编文本，用于跟踪日志与调试输出

use std::fmt;

use super::alu_op::AluOp;
use super::fields::{EBREAK, ECALL};
use super::instr::{DecodedInstr, Format, Opcode};

/// x0..x31 的 ABI 名称
pub const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", //
    "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5", //
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", //
    "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6",
];

/// 寄存器的 ABI 名称，越界编号返回 `"?"`
pub fn abi_name(reg: u8) -> &'static str {
    ABI_NAMES.get(reg as usize).copied().unwrap_or("?")
}

fn load_mnemonic(funct3: u8) -> Option<&'static str> {
    Some(match funct3 {
        0b000 => "lb",
        0b001 => "lh",
        0b010 => "lw",
        0b100 => "lbu",
        0b101 => "lhu",
        _ => return None,
    })
}

fn store_mnemonic(funct3: u8) -> Option<&'static str> {
    Some(match funct3 {
        0b000 => "sb",
        0b001 => "sh",
        0b010 => "sw",
        _ => return None,
    })
}

fn branch_mnemonic(funct3: u8) -> Option<&'static str> {
    Some(match funct3 {
        0b000 => "beq",
        0b001 => "bne",
        0b100 => "blt",
        0b101 => "bge",
        0b110 => "bltu",
        0b111 => "bgeu",
        _ => return None,
    })
}

impl DecodedInstr {
    fn fmt_word(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".word 0x{:08x}", self.raw)
    }
}

impl fmt::Display for DecodedInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.opcode, self.format) {
            (Opcode::Op, Format::R(r)) => match AluOp::from_reg(r.funct3, r.funct7) {
                Some(op) => write!(
                    f,
                    "{} {}, {}, {}",
                    op.mnemonic(),
                    abi_name(r.rd),
                    abi_name(r.rs1),
                    abi_name(r.rs2)
                ),
                None => self.fmt_word(f),
            },
            (Opcode::OpImm, Format::I(i)) => {
                let Some(op) = AluOp::from_imm(i.funct3, i.imm) else {
                    return self.fmt_word(f);
                };
                let Some(m) = op.imm_mnemonic() else {
                    return self.fmt_word(f);
                };
                if op.is_shift() {
                    write!(f, "{m} {}, {}, {}", abi_name(i.rd), abi_name(i.rs1), i.imm & 0x1F)
                } else {
                    write!(f, "{m} {}, {}, {}", abi_name(i.rd), abi_name(i.rs1), i.imm)
                }
            }
            (Opcode::Load, Format::I(i)) => match load_mnemonic(i.funct3) {
                Some(m) => write!(f, "{m} {}, {}({})", abi_name(i.rd), i.imm, abi_name(i.rs1)),
                None => self.fmt_word(f),
            },
            (Opcode::Jalr, Format::I(i)) => {
                write!(f, "jalr {}, {}({})", abi_name(i.rd), i.imm, abi_name(i.rs1))
            }
            (Opcode::System, _) => match self.raw {
                ECALL => f.write_str("ecall"),
                EBREAK => f.write_str("ebreak"),
                _ => self.fmt_word(f),
            },
            (Opcode::Store, Format::S(s)) => match store_mnemonic(s.funct3) {
                Some(m) => write!(f, "{m} {}, {}({})", abi_name(s.rs2), s.imm, abi_name(s.rs1)),
                None => self.fmt_word(f),
            },
            (Opcode::Lui, Format::U(u)) => {
                write!(f, "lui {}, 0x{:x}", abi_name(u.rd), (u.imm as u32) >> 12)
            }
            (Opcode::Auipc, Format::U(u)) => {
                write!(f, "auipc {}, 0x{:x}", abi_name(u.rd), (u.imm as u32) >> 12)
            }
            (Opcode::Branch, Format::B(b)) => match branch_mnemonic(b.funct3) {
                Some(m) => write!(f, "{m} {}, {}, {}", abi_name(b.rs1), abi_name(b.rs2), b.imm),
                None => self.fmt_word(f),
            },
            (Opcode::Jal, Format::J(j)) => write!(f, "jal {}, {}", abi_name(j.rd), j.imm),
            _ => self.fmt_word(f),
        }
    }
}
