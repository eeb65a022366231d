//! 内存抽象层
//!
//! 本模块定义了内存访问的统一接口 `Memory` trait，
//! 以及用于功能仿真的线性内存实现 `FlatMemory`。
//! 所有访问都做越界检查，越界访问返回 `MemError`，不会触碰宿主内存。

use std::collections::TryReserveError;

use thiserror::Error;

/// 默认内存容量：1 MiB
pub const DEFAULT_MEM_SIZE: usize = 1024 * 1024;

/// 访存粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSize {
    Byte,
    Half,
    Word,
}

impl AccessSize {
    pub fn bytes(self) -> usize {
        match self {
            AccessSize::Byte => 1,
            AccessSize::Half => 2,
            AccessSize::Word => 4,
        }
    }
}

/// 内存访问错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemError {
    /// 访问范围（任意一个字节）落在内存区域之外
    #[error(
        "out-of-range {access:?} access at 0x{addr:08x} (region=0x{base:08x}..0x{end:08x})",
        end = region_end(.base, .size)
    )]
    OutOfRange {
        addr: u32,
        access: AccessSize,
        base: u32,
        size: usize,
    },
}

fn region_end(base: &u32, size: &usize) -> u64 {
    *base as u64 + *size as u64
}

pub type MemResult<T> = Result<T, MemError>;

/// 内存访问的统一接口
///
/// 实现者只需提供 8/16/32 位原始读写；带符号扩展的 RV32I 访存原语
/// (`lb`/`lh`/`lbu`/`lhu`/`lw`/`sb`/`sh`/`sw`) 由默认方法给出。
pub trait Memory {
    /// 从指定地址读取 8 位数据
    fn load8(&self, addr: u32) -> MemResult<u8>;

    /// 从指定地址读取 16 位数据（小端序）
    fn load16(&self, addr: u32) -> MemResult<u16>;

    /// 从指定地址读取 32 位数据（小端序）
    fn load32(&self, addr: u32) -> MemResult<u32>;

    /// 向指定地址写入 8 位数据
    fn store8(&mut self, addr: u32, value: u8) -> MemResult<()>;

    /// 向指定地址写入 16 位数据（小端序）
    fn store16(&mut self, addr: u32, value: u16) -> MemResult<()>;

    /// 向指定地址写入 32 位数据（小端序）
    fn store32(&mut self, addr: u32, value: u32) -> MemResult<()>;

    /// LB: 读取一个字节并符号扩展到 32 位
    fn lb(&self, addr: u32) -> MemResult<u32> {
        Ok(self.load8(addr)? as i8 as i32 as u32)
    }

    /// LBU: 读取一个字节并零扩展
    fn lbu(&self, addr: u32) -> MemResult<u32> {
        Ok(self.load8(addr)? as u32)
    }

    /// LH: 读取半字并符号扩展到 32 位
    fn lh(&self, addr: u32) -> MemResult<u32> {
        Ok(self.load16(addr)? as i16 as i32 as u32)
    }

    /// LHU: 读取半字并零扩展
    fn lhu(&self, addr: u32) -> MemResult<u32> {
        Ok(self.load16(addr)? as u32)
    }

    /// LW: 读取一个字
    fn lw(&self, addr: u32) -> MemResult<u32> {
        self.load32(addr)
    }

    /// SB: 写入 value 的低 8 位
    fn sb(&mut self, addr: u32, value: u32) -> MemResult<()> {
        self.store8(addr, value as u8)
    }

    /// SH: 写入 value 的低 16 位
    fn sh(&mut self, addr: u32, value: u32) -> MemResult<()> {
        self.store16(addr, value as u16)
    }

    /// SW: 写入整个字
    fn sw(&mut self, addr: u32, value: u32) -> MemResult<()> {
        self.store32(addr, value)
    }
}

/// 简单线性内存实现
///
/// 使用 `Vec<u8>` 存储一段固定容量的地址空间，支持可选的基地址偏移。
/// 不检查对齐：非对齐的半字/字访问按字节拼接完成。
pub struct FlatMemory {
    /// 内存数据存储
    data: Vec<u8>,
    /// 内存映射起始地址
    base_addr: u32,
}

impl FlatMemory {
    /// 创建一个指定大小的内存区域
    ///
    /// # 参数
    ///
    /// * `size` - 内存大小（字节数）
    /// * `base_addr` - 内存映射的起始地址
    ///
    /// # 示例
    ///
    /// ```
    /// use rv32i_sim::memory::{FlatMemory, Memory};
    ///
    /// let mut mem = FlatMemory::new(64 * 1024, 0);
    /// mem.sw(0x10, 0xDEAD_BEEF).unwrap();
    /// assert_eq!(mem.lbu(0x10).unwrap(), 0xEF);
    /// ```
    pub fn new(size: usize, base_addr: u32) -> Self {
        FlatMemory {
            data: vec![0; size],
            base_addr,
        }
    }

    /// 同 [`FlatMemory::new`]，但分配失败时返回错误而不是中止进程
    pub fn try_new(size: usize, base_addr: u32) -> Result<Self, TryReserveError> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)?;
        data.resize(size, 0);
        Ok(FlatMemory { data, base_addr })
    }

    /// 获取内存的基地址
    pub fn base_addr(&self) -> u32 {
        self.base_addr
    }

    /// 获取内存的大小
    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn out_of_range(&self, addr: u32, access: AccessSize) -> MemError {
        MemError::OutOfRange {
            addr,
            access,
            base: self.base_addr,
            size: self.data.len(),
        }
    }

    /// 返回 `[addr, addr + len)` 在 `data` 中的起始下标
    fn bounds_check(&self, addr: u32, len: usize, access: AccessSize) -> MemResult<usize> {
        let relative = addr
            .checked_sub(self.base_addr)
            .ok_or_else(|| self.out_of_range(addr, access))? as usize;

        let end = relative
            .checked_add(len)
            .ok_or_else(|| self.out_of_range(addr, access))?;

        if end > self.data.len() {
            return Err(self.out_of_range(addr, access));
        }

        Ok(relative)
    }

    fn slice(&self, addr: u32, access: AccessSize) -> MemResult<&[u8]> {
        let start = self.bounds_check(addr, access.bytes(), access)?;
        Ok(&self.data[start..start + access.bytes()])
    }

    fn slice_mut(&mut self, addr: u32, access: AccessSize) -> MemResult<&mut [u8]> {
        let start = self.bounds_check(addr, access.bytes(), access)?;
        Ok(&mut self.data[start..start + access.bytes()])
    }

    /// 批量写入数据到内存，越界时整体拒绝且不写入任何字节
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> MemResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        let start = self.bounds_check(addr, data.len(), AccessSize::Byte)?;
        self.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// 批量读取数据，返回副本
    pub fn read_bytes(&self, addr: u32, len: usize) -> MemResult<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let start = self.bounds_check(addr, len, AccessSize::Byte)?;
        Ok(self.data[start..start + len].to_vec())
    }

    /// 将指定范围填充为固定字节
    pub fn fill(&mut self, addr: u32, len: usize, value: u8) -> MemResult<()> {
        if len == 0 {
            return Ok(());
        }
        let start = self.bounds_check(addr, len, AccessSize::Byte)?;
        self.data[start..start + len].fill(value);
        Ok(())
    }
}

impl Memory for FlatMemory {
    fn load8(&self, addr: u32) -> MemResult<u8> {
        Ok(self.slice(addr, AccessSize::Byte)?[0])
    }

    fn load16(&self, addr: u32) -> MemResult<u16> {
        let b = self.slice(addr, AccessSize::Half)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn load32(&self, addr: u32) -> MemResult<u32> {
        let b = self.slice(addr, AccessSize::Word)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn store8(&mut self, addr: u32, value: u8) -> MemResult<()> {
        self.slice_mut(addr, AccessSize::Byte)?[0] = value;
        Ok(())
    }

    fn store16(&mut self, addr: u32, value: u16) -> MemResult<()> {
        self.slice_mut(addr, AccessSize::Half)?
            .copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn store32(&mut self, addr: u32, value: u32) -> MemResult<()> {
        self.slice_mut(addr, AccessSize::Word)?
            .copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}
