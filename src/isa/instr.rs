//! 已解码指令的类型定义
//!
//! 解码结果按编码格式 (R/I/S/U/B/J) 打标签，每种格式只携带它实际拥有的字段。
//! opcode 与格式均为封闭枚举，执行阶段通过穷尽匹配分派。

use super::fields;

/// 指令格式（类别）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrClass {
    R,
    I,
    S,
    U,
    B,
    J,
    Unknown,
}

/// RV32I 主 opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// LB, LH, LW, LBU, LHU
    Load,
    /// ADDI, SLTI, SLTIU, XORI, ORI, ANDI, SLLI, SRLI, SRAI
    OpImm,
    Auipc,
    /// SB, SH, SW
    Store,
    /// ADD, SUB, SLL, SLT, SLTU, XOR, SRL, SRA, OR, AND
    Op,
    Lui,
    /// BEQ, BNE, BLT, BGE, BLTU, BGEU
    Branch,
    Jalr,
    Jal,
    /// ECALL, EBREAK
    System,
    /// 未识别的 7-bit opcode
    Unknown(u8),
}

impl Opcode {
    /// 从指令字低 7 位识别 opcode
    pub const fn from_raw(raw: u32) -> Self {
        match fields::opcode(raw) {
            fields::OP_LOAD => Opcode::Load,
            fields::OP_IMM => Opcode::OpImm,
            fields::OP_AUIPC => Opcode::Auipc,
            fields::OP_STORE => Opcode::Store,
            fields::OP_REG => Opcode::Op,
            fields::OP_LUI => Opcode::Lui,
            fields::OP_BRANCH => Opcode::Branch,
            fields::OP_JALR => Opcode::Jalr,
            fields::OP_JAL => Opcode::Jal,
            fields::OP_SYSTEM => Opcode::System,
            other => Opcode::Unknown(other as u8),
        }
    }

    /// 7-bit 编码值
    pub const fn bits(self) -> u8 {
        (match self {
            Opcode::Load => fields::OP_LOAD,
            Opcode::OpImm => fields::OP_IMM,
            Opcode::Auipc => fields::OP_AUIPC,
            Opcode::Store => fields::OP_STORE,
            Opcode::Op => fields::OP_REG,
            Opcode::Lui => fields::OP_LUI,
            Opcode::Branch => fields::OP_BRANCH,
            Opcode::Jalr => fields::OP_JALR,
            Opcode::Jal => fields::OP_JAL,
            Opcode::System => fields::OP_SYSTEM,
            Opcode::Unknown(bits) => bits as u32,
        }) as u8
    }

    /// opcode → 格式映射表
    pub const fn class(self) -> InstrClass {
        match self {
            Opcode::Op => InstrClass::R,
            Opcode::Load | Opcode::OpImm | Opcode::Jalr | Opcode::System => InstrClass::I,
            Opcode::Store => InstrClass::S,
            Opcode::Auipc | Opcode::Lui => InstrClass::U,
            Opcode::Branch => InstrClass::B,
            Opcode::Jal => InstrClass::J,
            Opcode::Unknown(_) => InstrClass::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RFields {
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub funct3: u8,
    pub funct7: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IFields {
    pub rd: u8,
    pub rs1: u8,
    pub funct3: u8,
    pub imm: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SFields {
    pub rs1: u8,
    pub rs2: u8,
    pub funct3: u8,
    pub imm: i32,
}

/// `imm` 已位于 [31:12]，低 12 位为 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UFields {
    pub rd: u8,
    pub imm: i32,
}

/// `imm` 为偶数的分支偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BFields {
    pub rs1: u8,
    pub rs2: u8,
    pub funct3: u8,
    pub imm: i32,
}

/// `imm` 为偶数的跳转偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JFields {
    pub rd: u8,
    pub imm: i32,
}

/// 按格式提取出的操作数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    R(RFields),
    I(IFields),
    S(SFields),
    U(UFields),
    B(BFields),
    J(JFields),
    Unknown,
}

/// 已解码的指令
///
/// 由解码器产生、立即交给执行单元消费，不做持久化。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstr {
    /// 原始 32-bit 指令编码
    pub raw: u32,
    pub opcode: Opcode,
    pub format: Format,
}

impl DecodedInstr {
    pub fn class(&self) -> InstrClass {
        match self.format {
            Format::R(_) => InstrClass::R,
            Format::I(_) => InstrClass::I,
            Format::S(_) => InstrClass::S,
            Format::U(_) => InstrClass::U,
            Format::B(_) => InstrClass::B,
            Format::J(_) => InstrClass::J,
            Format::Unknown => InstrClass::Unknown,
        }
    }

    /// 分支与跳转（含 JALR）自行更新 PC，取指循环不再额外 +4
    pub fn writes_pc(&self) -> bool {
        matches!(self.format, Format::B(_) | Format::J(_)) || self.opcode == Opcode::Jalr
    }
}
