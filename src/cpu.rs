//! CPU 核心与解释循环
//!
//! 本模块定义了单线程 RV32I CPU 核心 `CpuCore`：
//! 寄存器文件、程序计数器、取指-解码-执行循环，以及停机原因的汇总。

use std::fmt;

use log::{error, trace, warn};

use crate::isa::{self, abi_name};
use crate::memory::Memory;

mod exu;
mod regfile;

pub use exu::{AluOp, ExecError, ExecStatus, execute};
pub use regfile::{NUM_REGS, RegisterFile};

/// CPU 执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    /// 正常运行中
    Running,
    /// 执行了 ECALL/EBREAK
    Halted,
}

/// 遇到非法编码时解释循环的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidPolicy {
    /// 停止运行并上报
    #[default]
    Halt,
    /// 打印警告，PC += 4 后继续
    Skip,
}

/// 解释循环停止的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// ECALL/EBREAK
    Halted,
    /// PC 越过已加载镜像的末尾
    EndOfImage,
    /// 达到指令数上限
    InstructionLimit,
    /// 非法编码且策略为 `InvalidPolicy::Halt`
    InvalidEncoding(ExecError),
    /// 访存越界（含取指）
    Fault(ExecError),
}

impl StopReason {
    /// 停机或执行完镜像视为正常结束
    pub fn is_normal(&self) -> bool {
        matches!(self, StopReason::Halted | StopReason::EndOfImage)
    }

    /// 非法编码或访存错误
    pub fn is_error(&self) -> bool {
        matches!(self, StopReason::InvalidEncoding(_) | StopReason::Fault(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Halted => write!(f, "halted"),
            StopReason::EndOfImage => write!(f, "reached end of image"),
            StopReason::InstructionLimit => write!(f, "instruction limit reached"),
            StopReason::InvalidEncoding(err) | StopReason::Fault(err) => write!(f, "{err}"),
        }
    }
}

/// `CpuCore::run` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 成功执行的指令数（被跳过的非法编码不计入）
    pub executed: u64,
    pub reason: StopReason,
}

/// 单线程 CPU 核心
///
/// 包含 RV32I 的最小状态：
/// - 32 个 32-bit 通用寄存器 x0..x31（x0 恒为 0）
/// - 32-bit 程序计数器
///
/// 设计约定：
/// - 所有寄存器写入都经过 `RegisterFile::write`
/// - 分支/跳转指令自行设置 PC，其余指令由循环执行 PC += 4
/// - 核心状态不依赖全局变量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuCore {
    regs: RegisterFile,
    state: CpuState,
}

impl CpuCore {
    /// 创建一个新的 CPU 核心
    ///
    /// # 示例
    ///
    /// ```
    /// use rv32i_sim::cpu::CpuCore;
    ///
    /// let cpu = CpuCore::new(0x1000);
    /// assert_eq!(cpu.pc(), 0x1000);
    /// ```
    pub fn new(entry_pc: u32) -> Self {
        CpuCore {
            regs: RegisterFile::new(entry_pc),
            state: CpuState::Running,
        }
    }

    pub fn pc(&self) -> u32 {
        self.regs.pc()
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.regs.set_pc(pc);
    }

    pub fn state(&self) -> CpuState {
        self.state
    }

    /// 读取 x0 总是返回 0
    pub fn read_reg(&self, reg: u8) -> u32 {
        self.regs.read(reg)
    }

    pub fn write_reg(&mut self, reg: u8, value: u32) {
        self.regs.write(reg, value)
    }

    /// 获取所有寄存器的快照
    pub fn regs(&self) -> &[u32; NUM_REGS] {
        self.regs.snapshot()
    }

    pub fn register_file(&self) -> &RegisterFile {
        &self.regs
    }

    /// 执行单步指令
    ///
    /// # 流程
    ///
    /// 1. 从 PC 处取指（越界即访存错误）
    /// 2. 解码
    /// 3. 执行
    /// 4. 若指令未自行设置 PC 且未停机，则 PC += 4
    ///
    /// 出错时 PC 仍指向出错的指令。
    pub fn step(&mut self, mem: &mut dyn Memory) -> Result<CpuState, ExecError> {
        if self.state != CpuState::Running {
            return Ok(self.state);
        }

        let pc = self.regs.pc();
        let raw = mem
            .load32(pc)
            .map_err(|source| ExecError::Memory { pc, source })?;
        let decoded = isa::decode(raw);
        trace!("0x{pc:08x}: {raw:08x}  {decoded}");

        match exu::execute(&decoded, &mut self.regs, mem)? {
            ExecStatus::Halt => self.state = CpuState::Halted,
            ExecStatus::Continue => {
                if !decoded.writes_pc() {
                    self.regs.set_pc(pc.wrapping_add(4));
                }
            }
        }

        Ok(self.state)
    }

    /// 跳过当前指令（PC += 4）
    pub fn skip(&mut self) {
        let pc = self.regs.pc();
        self.regs.set_pc(pc.wrapping_add(4));
    }

    /// 运行直到停止
    ///
    /// # 参数
    ///
    /// * `mem` - 内存接口
    /// * `image_end` - 已加载镜像的末尾地址（不含），PC 到达此处即停止
    /// * `max_instructions` - 最大执行指令数，0 表示不限
    /// * `on_invalid` - 非法编码的处理策略
    ///
    /// # 停止条件
    ///
    /// - 遇到 ECALL/EBREAK
    /// - PC >= `image_end`
    /// - 达到最大指令数
    /// - 非法编码（`InvalidPolicy::Halt` 时）
    /// - 访存越界
    pub fn run(
        &mut self,
        mem: &mut dyn Memory,
        image_end: u32,
        max_instructions: u64,
        on_invalid: InvalidPolicy,
    ) -> RunSummary {
        let mut executed = 0u64;

        let reason = loop {
            if self.state == CpuState::Halted {
                break StopReason::Halted;
            }
            if self.pc() >= image_end {
                break StopReason::EndOfImage;
            }
            if max_instructions != 0 && executed >= max_instructions {
                break StopReason::InstructionLimit;
            }

            match self.step(mem) {
                Ok(_) => executed += 1,
                Err(err @ ExecError::InvalidEncoding { .. }) => match on_invalid {
                    InvalidPolicy::Skip => {
                        warn!("skipping {err}");
                        self.skip();
                    }
                    InvalidPolicy::Halt => {
                        error!("{err}");
                        break StopReason::InvalidEncoding(err);
                    }
                },
                Err(err) => {
                    error!("{err}");
                    break StopReason::Fault(err);
                }
            }
        };

        RunSummary { executed, reason }
    }

    /// 打印 PC、状态与全部整数寄存器（带 ABI 名）
    pub fn dump_regs(&self) {
        print!("{self}");
    }
}

impl Default for CpuCore {
    fn default() -> Self {
        Self::new(0)
    }
}

impl fmt::Display for CpuCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PC: 0x{:08x}  State: {:?}", self.pc(), self.state)?;
        for (i, value) in self.regs().iter().enumerate() {
            let name = format!("x{i}({})", abi_name(i as u8));
            write!(f, "  {name:<10}0x{value:08x}")?;
            if i % 4 == 3 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
