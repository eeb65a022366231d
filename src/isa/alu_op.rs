//! ALU 运算选择：执行单元与反汇编共用同一张 funct3/funct7 表

/// ALU 运算，OP 与 OP-IMM 共用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
}

impl AluOp {
    /// 根据 funct3/funct7 选择寄存器-寄存器运算
    pub fn from_reg(funct3: u8, funct7: u8) -> Option<Self> {
        Some(match (funct3, funct7) {
            (0b000, 0x00) => AluOp::Add,
            (0b000, 0x20) => AluOp::Sub,
            (0b001, 0x00) => AluOp::Sll,
            (0b010, 0x00) => AluOp::Slt,
            (0b011, 0x00) => AluOp::Sltu,
            (0b100, 0x00) => AluOp::Xor,
            (0b101, 0x00) => AluOp::Srl,
            (0b101, 0x20) => AluOp::Sra,
            (0b110, 0x00) => AluOp::Or,
            (0b111, 0x00) => AluOp::And,
            _ => return None,
        })
    }

    /// 根据 funct3 与立即数选择寄存器-立即数运算
    ///
    /// 移位指令的 imm[11:5] 充当 funct7：SLLI/SRLI 要求 0x00，SRAI 要求 0x20。
    /// OP-IMM 没有减法。
    pub fn from_imm(funct3: u8, imm: i32) -> Option<Self> {
        let shift_type = ((imm as u32) >> 5) & 0x7F;
        Some(match funct3 {
            0b000 => AluOp::Add,
            0b010 => AluOp::Slt,
            0b011 => AluOp::Sltu,
            0b100 => AluOp::Xor,
            0b110 => AluOp::Or,
            0b111 => AluOp::And,
            0b001 if shift_type == 0x00 => AluOp::Sll,
            0b101 if shift_type == 0x00 => AluOp::Srl,
            0b101 if shift_type == 0x20 => AluOp::Sra,
            _ => return None,
        })
    }

    /// OP 形式的助记符
    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "add",
            AluOp::Sub => "sub",
            AluOp::Sll => "sll",
            AluOp::Slt => "slt",
            AluOp::Sltu => "sltu",
            AluOp::Xor => "xor",
            AluOp::Srl => "srl",
            AluOp::Sra => "sra",
            AluOp::Or => "or",
            AluOp::And => "and",
        }
    }

    /// OP-IMM 形式的助记符；`Sub` 没有立即数形式
    pub fn imm_mnemonic(self) -> Option<&'static str> {
        Some(match self {
            AluOp::Add => "addi",
            AluOp::Sub => return None,
            AluOp::Sll => "slli",
            AluOp::Slt => "slti",
            AluOp::Sltu => "sltiu",
            AluOp::Xor => "xori",
            AluOp::Srl => "srli",
            AluOp::Sra => "srai",
            AluOp::Or => "ori",
            AluOp::And => "andi",
        })
    }

    pub fn is_shift(self) -> bool {
        matches!(self, AluOp::Sll | AluOp::Srl | AluOp::Sra)
    }

    pub fn apply(self, a: u32, b: u32) -> u32 {
        let shamt = b & 0x1F;
        match self {
            AluOp::Add => a.wrapping_add(b),
            AluOp::Sub => a.wrapping_sub(b),
            AluOp::Sll => a << shamt,
            AluOp::Slt => ((a as i32) < (b as i32)) as u32,
            AluOp::Sltu => (a < b) as u32,
            AluOp::Xor => a ^ b,
            AluOp::Srl => a >> shamt,
            AluOp::Sra => ((a as i32) >> shamt) as u32,
            AluOp::Or => a | b,
            AluOp::And => a & b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reg_and_mnemonic() {
        assert_eq!(AluOp::from_reg(0b000, 0x20), Some(AluOp::Sub));
        assert_eq!(AluOp::from_reg(0b101, 0x20).map(AluOp::mnemonic), Some("sra"));
        assert_eq!(AluOp::from_reg(0b011, 0x00).map(AluOp::mnemonic), Some("sltu"));
        // M 扩展
        assert_eq!(AluOp::from_reg(0b000, 0x01), None);
    }

    #[test]
    fn test_from_imm_and_mnemonic() {
        assert_eq!(AluOp::from_imm(0b011, -1).and_then(AluOp::imm_mnemonic), Some("sltiu"));
        assert_eq!(AluOp::from_imm(0b101, 0x403).and_then(AluOp::imm_mnemonic), Some("srai"));
        assert_eq!(AluOp::from_imm(0b001, 4).and_then(AluOp::imm_mnemonic), Some("slli"));
        assert_eq!(AluOp::from_imm(0b101, 0x204), None);
        assert_eq!(AluOp::Sub.imm_mnemonic(), None);
    }

    #[test]
    fn test_shift_ops() {
        assert!(AluOp::Sra.is_shift());
        assert!(!AluOp::Sltu.is_shift());
    }
}
