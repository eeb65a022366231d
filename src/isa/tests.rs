//! ISA 模块测试

use super::*;

/// 按 B-type 布局拼出 `beq x0, x0, imm`
fn enc_b(imm: i32) -> u32 {
    let imm = imm as u32;
    ((imm >> 12) & 1) << 31
        | ((imm >> 5) & 0x3F) << 25
        | ((imm >> 1) & 0xF) << 8
        | ((imm >> 11) & 1) << 7
        | OP_BRANCH
}

/// 按 J-type 布局拼出 `jal x0, imm`
fn enc_j(imm: i32) -> u32 {
    let imm = imm as u32;
    ((imm >> 20) & 1) << 31
        | ((imm >> 1) & 0x3FF) << 21
        | ((imm >> 11) & 1) << 20
        | ((imm >> 12) & 0xFF) << 12
        | OP_JAL
}

/// `sw x0, imm(x0)`
fn enc_s(imm: i32) -> u32 {
    let imm = imm as u32;
    ((imm >> 5) & 0x7F) << 25 | (imm & 0x1F) << 7 | (0b010 << 12) | OP_STORE
}

/// `addi x0, x0, imm`
fn enc_i(imm: i32) -> u32 {
    ((imm as u32) & 0xFFF) << 20 | OP_IMM
}

fn imm_of(raw: u32) -> i32 {
    match decode(raw).format {
        Format::I(i) => i.imm,
        Format::S(s) => s.imm,
        Format::U(u) => u.imm,
        Format::B(b) => b.imm,
        Format::J(j) => j.imm,
        other => panic!("no immediate in {other:?}"),
    }
}

#[test]
fn test_decode_addi() {
    let decoded = decode(0x00500093); // addi x1, x0, 5
    assert_eq!(decoded.opcode, Opcode::OpImm);
    assert_eq!(decoded.class(), InstrClass::I);
    assert_eq!(
        decoded.format,
        Format::I(IFields {
            rd: 1,
            rs1: 0,
            funct3: 0,
            imm: 5
        })
    );
}

#[test]
fn test_decode_sub() {
    let decoded = decode(0x402081B3); // sub x3, x1, x2
    assert_eq!(
        decoded.format,
        Format::R(RFields {
            rd: 3,
            rs1: 1,
            rs2: 2,
            funct3: 0,
            funct7: 0x20
        })
    );
}

#[test]
fn test_decode_sw() {
    let decoded = decode(0x00112423); // sw x1, 8(x2)
    assert_eq!(
        decoded.format,
        Format::S(SFields {
            rs1: 2,
            rs2: 1,
            funct3: 0b010,
            imm: 8
        })
    );
}

#[test]
fn test_decode_lui() {
    let decoded = decode(0x123450B7); // lui x1, 0x12345
    assert_eq!(
        decoded.format,
        Format::U(UFields {
            rd: 1,
            imm: 0x12345000
        })
    );
    // 高位为 1 时不做额外符号扩展，值本身就是完整 32 位
    assert_eq!(imm_of(0xFFFFF0B7) as u32, 0xFFFFF000);
}

#[test]
fn test_decode_jal_and_branch() {
    assert_eq!(
        decode(0x008000EF).format, // jal x1, 8
        Format::J(JFields { rd: 1, imm: 8 })
    );
    assert_eq!(
        decode(0xFE000CE3).format, // beq x0, x0, -8
        Format::B(BFields {
            rs1: 0,
            rs2: 0,
            funct3: 0,
            imm: -8
        })
    );
}

#[test]
fn test_opcode_class_table() {
    let table = [
        (0x33, InstrClass::R),
        (0x03, InstrClass::I),
        (0x13, InstrClass::I),
        (0x67, InstrClass::I),
        (0x73, InstrClass::I),
        (0x23, InstrClass::S),
        (0x17, InstrClass::U),
        (0x37, InstrClass::U),
        (0x63, InstrClass::B),
        (0x6F, InstrClass::J),
        (0x0F, InstrClass::Unknown),
        (0x00, InstrClass::Unknown),
    ];
    for (bits, class) in table {
        let opcode = Opcode::from_raw(bits);
        assert_eq!(opcode.class(), class, "opcode 0x{bits:02x}");
        assert_eq!(opcode.bits() as u32, bits);
        assert_eq!(decode(bits).class(), class);
    }
}

#[test]
fn test_decode_unknown() {
    let decoded = decode(0x0000000B); // custom-0
    assert_eq!(decoded.opcode, Opcode::Unknown(0x0B));
    assert_eq!(decoded.format, Format::Unknown);
    assert!(!decoded.writes_pc());
}

#[test]
fn test_writes_pc() {
    assert!(decode(0x008000EF).writes_pc()); // jal
    assert!(decode(0x00008067).writes_pc()); // jalr x0, 0(x1)
    assert!(decode(0x00208463).writes_pc()); // beq
    assert!(!decode(0x00500093).writes_pc()); // addi
    assert!(!decode(0x00000073).writes_pc()); // ecall
}

#[test]
fn test_i_immediate_boundaries() {
    for imm in [0, 1, -1, 2047, -2048] {
        assert_eq!(imm_of(enc_i(imm)), imm, "imm = {imm}");
    }
}

#[test]
fn test_s_immediate_boundaries() {
    for imm in [0, 1, -1, 2047, -2048] {
        assert_eq!(imm_of(enc_s(imm)), imm, "imm = {imm}");
    }
}

#[test]
fn test_b_immediate_boundaries() {
    // 最小步长为 2，bit 0 恒为 0
    for imm in [0, 2, -2, 4094, -4096] {
        assert_eq!(imm_of(enc_b(imm)), imm, "imm = {imm}");
    }
}

#[test]
fn test_j_immediate_boundaries() {
    for imm in [0, 2, -2, (1 << 20) - 2, -(1 << 20)] {
        assert_eq!(imm_of(enc_j(imm)), imm, "imm = {imm}");
    }
}

#[test]
fn test_b_j_ignore_low_bit() {
    // 奇数偏移无法编码：bit 0 在解码后总是 0
    assert_eq!(imm_of(enc_b(7)), 6);
    assert_eq!(imm_of(enc_j(-3)), -4);
}
