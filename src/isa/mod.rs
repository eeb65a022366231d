//! RISC-V RV32I 指令解码
//!
//! - `decode`: 32-bit 指令字 → `DecodedInstr`（按格式打标签的记录）
//! - `fields`: 字段提取与立即数重建
//! - `disasm`: 反汇编输出与 ABI 寄存器名
//! - `alu_op`: OP/OP-IMM 的运算选择与助记符

mod alu_op;
mod decoder;
mod disasm;
mod fields;
mod instr;

pub use alu_op::AluOp;
pub use decoder::decode;
pub use disasm::{ABI_NAMES, abi_name};
pub use fields::*;
pub use instr::{
    BFields, DecodedInstr, Format, IFields, InstrClass, JFields, Opcode, RFields, SFields, UFields,
};

#[cfg(test)]
mod tests;
