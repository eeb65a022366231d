//! 指令解码
//!
//! 先按 opcode 确定格式，再按固定位置提取该格式的字段并重建立即数。

use super::fields::*;
use super::instr::{
    BFields, DecodedInstr, Format, IFields, InstrClass, JFields, Opcode, RFields, SFields, UFields,
};

/// 解码一条 32-bit 指令
///
/// 全函数、无副作用：未识别的 opcode 解码为 [`Format::Unknown`]，
/// 是否合法由执行阶段判定。
///
/// ```
/// use rv32i_sim::isa::{decode, Format, IFields, Opcode};
///
/// let d = decode(0x00500093); // addi x1, x0, 5
/// assert_eq!(d.opcode, Opcode::OpImm);
/// assert_eq!(d.format, Format::I(IFields { rd: 1, rs1: 0, funct3: 0, imm: 5 }));
/// ```
pub fn decode(raw: u32) -> DecodedInstr {
    let opcode = Opcode::from_raw(raw);

    let format = match opcode.class() {
        InstrClass::R => Format::R(RFields {
            rd: rd(raw),
            rs1: rs1(raw),
            rs2: rs2(raw),
            funct3: funct3(raw),
            funct7: funct7(raw),
        }),
        InstrClass::I => Format::I(IFields {
            rd: rd(raw),
            rs1: rs1(raw),
            funct3: funct3(raw),
            imm: imm_i(raw),
        }),
        InstrClass::S => Format::S(SFields {
            rs1: rs1(raw),
            rs2: rs2(raw),
            funct3: funct3(raw),
            imm: imm_s(raw),
        }),
        InstrClass::U => Format::U(UFields {
            rd: rd(raw),
            imm: imm_u(raw),
        }),
        InstrClass::B => Format::B(BFields {
            rs1: rs1(raw),
            rs2: rs2(raw),
            funct3: funct3(raw),
            imm: imm_b(raw),
        }),
        InstrClass::J => Format::J(JFields {
            rd: rd(raw),
            imm: imm_j(raw),
        }),
        InstrClass::Unknown => Format::Unknown,
    };

    DecodedInstr {
        raw,
        opcode,
        format,
    }
}
