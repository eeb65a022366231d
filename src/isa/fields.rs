//! 指令字段提取辅助函数
//!
//! 所有函数都是对 32-bit 指令字的纯位运算，对任意输入都有定义。
//! 立即数统一经由 [`sign_extend`] 完成符号扩展。

/// 将 `value` 的低 `bits` 位视为有符号数并扩展到 32 位
///
/// 先左移使符号位对齐到 bit 31，再算术右移回原位。`bits` 取值 1..=32。
#[inline]
pub const fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

/// opcode [6:0]
#[inline]
pub const fn opcode(raw: u32) -> u32 {
    raw & 0x7F
}

/// rd [11:7]
#[inline]
pub const fn rd(raw: u32) -> u8 {
    ((raw >> 7) & 0x1F) as u8
}

/// funct3 [14:12]
#[inline]
pub const fn funct3(raw: u32) -> u8 {
    ((raw >> 12) & 0x7) as u8
}

/// rs1 [19:15]
#[inline]
pub const fn rs1(raw: u32) -> u8 {
    ((raw >> 15) & 0x1F) as u8
}

/// rs2 [24:20]
#[inline]
pub const fn rs2(raw: u32) -> u8 {
    ((raw >> 20) & 0x1F) as u8
}

/// funct7 [31:25]
#[inline]
pub const fn funct7(raw: u32) -> u8 {
    ((raw >> 25) & 0x7F) as u8
}

/// I-type: imm[11:0] = raw[31:20]
#[inline]
pub const fn imm_i(raw: u32) -> i32 {
    sign_extend(raw >> 20, 12)
}

/// S-type: imm[11:5] = raw[31:25], imm[4:0] = raw[11:7]
#[inline]
pub const fn imm_s(raw: u32) -> i32 {
    let imm_11_5 = (raw >> 25) & 0x7F;
    let imm_4_0 = (raw >> 7) & 0x1F;
    sign_extend((imm_11_5 << 5) | imm_4_0, 12)
}

/// B-type: imm[12|10:5] = raw[31|30:25], imm[4:1|11] = raw[11:8|7]，imm[0] = 0
#[inline]
pub const fn imm_b(raw: u32) -> i32 {
    let imm_12 = (raw >> 31) & 0x1;
    let imm_11 = (raw >> 7) & 0x1;
    let imm_10_5 = (raw >> 25) & 0x3F;
    let imm_4_1 = (raw >> 8) & 0xF;
    sign_extend(
        (imm_12 << 12) | (imm_11 << 11) | (imm_10_5 << 5) | (imm_4_1 << 1),
        13,
    )
}

/// U-type: imm[31:12] = raw[31:12]，低 12 位为 0，无需符号扩展
#[inline]
pub const fn imm_u(raw: u32) -> i32 {
    (raw & 0xFFFF_F000) as i32
}

/// J-type: imm[20|10:1|11|19:12] = raw[31|30:21|20|19:12]，imm[0] = 0
#[inline]
pub const fn imm_j(raw: u32) -> i32 {
    let imm_20 = (raw >> 31) & 0x1;
    let imm_19_12 = (raw >> 12) & 0xFF;
    let imm_11 = (raw >> 20) & 0x1;
    let imm_10_1 = (raw >> 21) & 0x3FF;
    sign_extend(
        (imm_20 << 20) | (imm_19_12 << 12) | (imm_11 << 11) | (imm_10_1 << 1),
        21,
    )
}

// ========== Opcode 常量 ==========
pub const OP_LOAD: u32 = 0b0000011;
pub const OP_IMM: u32 = 0b0010011;
pub const OP_AUIPC: u32 = 0b0010111;
pub const OP_STORE: u32 = 0b0100011;
pub const OP_REG: u32 = 0b0110011;
pub const OP_LUI: u32 = 0b0110111;
pub const OP_BRANCH: u32 = 0b1100011;
pub const OP_JALR: u32 = 0b1100111;
pub const OP_JAL: u32 = 0b1101111;
pub const OP_SYSTEM: u32 = 0b1110011;

/// ECALL 的完整编码
pub const ECALL: u32 = 0x0000_0073;
/// EBREAK 的完整编码
pub const EBREAK: u32 = 0x0010_0073;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sign_extend_edges() {
        assert_eq!(sign_extend(0x7FF, 12), 2047);
        assert_eq!(sign_extend(0x800, 12), -2048);
        assert_eq!(sign_extend(0xFFF, 12), -1);
        assert_eq!(sign_extend(0x1000, 13), -4096);
        assert_eq!(sign_extend(0xFFFF_FFFF, 32), -1);
        // 高于 bits 的位被忽略
        assert_eq!(sign_extend(0xF0_0001, 12), 1);
    }

    #[test]
    fn test_register_fields() {
        let raw = 0x402081B3; // sub x3, x1, x2
        assert_eq!(opcode(raw), OP_REG);
        assert_eq!(rd(raw), 3);
        assert_eq!(rs1(raw), 1);
        assert_eq!(rs2(raw), 2);
        assert_eq!(funct3(raw), 0);
        assert_eq!(funct7(raw), 0x20);
    }

    #[test]
    fn test_imm_s() {
        assert_eq!(imm_s(0x00112423), 8); // sw x1, 8(x2)
        assert_eq!(imm_s(0xFE112E23), -4); // sw x1, -4(x2)
    }

    proptest! {
        #[test]
        fn prop_imm_i_matches_arithmetic_shift(raw in any::<u32>()) {
            prop_assert_eq!(imm_i(raw), (raw as i32) >> 20);
        }

        #[test]
        fn prop_imm_s_sign_follows_bit31(raw in any::<u32>()) {
            let imm = imm_s(raw);
            prop_assert_eq!(imm < 0, raw >> 31 == 1);
            prop_assert!((-2048..=2047).contains(&imm));
        }

        #[test]
        fn prop_imm_b_even_and_in_range(raw in any::<u32>()) {
            let imm = imm_b(raw);
            prop_assert_eq!(imm & 1, 0);
            prop_assert_eq!(imm < 0, raw >> 31 == 1);
            prop_assert!((-4096..=4094).contains(&imm));
        }

        #[test]
        fn prop_imm_j_even_and_in_range(raw in any::<u32>()) {
            let imm = imm_j(raw);
            prop_assert_eq!(imm & 1, 0);
            prop_assert_eq!(imm < 0, raw >> 31 == 1);
            prop_assert!((-(1 << 20)..=(1 << 20) - 2).contains(&imm));
        }

        #[test]
        fn prop_imm_u_keeps_upper_bits(raw in any::<u32>()) {
            prop_assert_eq!(imm_u(raw) as u32, raw & 0xFFFF_F000);
        }
    }
}
