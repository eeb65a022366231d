//! 仿真环境初始化模块
//!
//! 本模块负责：
//! - 仿真配置（内存区域、入口、指令上限、非法编码策略）
//! - 加载程序镜像：原始二进制，或以 ELF magic 开头的 32 位 RISC-V ELF
//! - 运行解释循环并汇总结果
//! - 将 x0..x31 以小端 u32 写入 `<镜像名>-answer.res`
//!
//! # 示例
//!
//! ```no_run
//! use rv32i_sim::sim_env::{SimConfig, SimEnv};
//!
//! let config = SimConfig::new()
//!     .with_image_path("program.bin")
//!     .with_max_instructions(1_000_000);
//!
//! let mut env = SimEnv::from_config(config).expect("failed to create sim env");
//! let summary = env.run_until_halt();
//! println!("{} instructions, {}", summary.executed, summary.reason);
//! ```

use std::collections::TryReserveError;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use elf::ElfBytes;
use elf::abi::{EM_RISCV, PT_LOAD};
use elf::endian::AnyEndian;
use log::{debug, info};
use thiserror::Error;

use crate::cpu::{CpuCore, CpuState, ExecError, InvalidPolicy, NUM_REGS, RunSummary};
use crate::memory::{DEFAULT_MEM_SIZE, FlatMemory, MemError};

/// ELF 文件头 magic
pub const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

/// 寄存器转储文件的后缀
pub const DUMP_SUFFIX: &str = "-answer.res";

/// 仿真环境错误
#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// 原始镜像大于内存容量
    #[error("image of {size} bytes does not fit in {capacity} bytes of memory")]
    ImageTooLarge { size: usize, capacity: usize },
    #[error("ELF parse error: {0}")]
    ElfParse(String),
    /// ELF 段落在内存区域之外
    #[error(
        "memory region '{region}' (0x{base:08x}..0x{end:08x}) cannot fit range 0x{start:08x}..0x{stop:08x}"
    )]
    OutOfRegion {
        region: String,
        base: u32,
        end: u64,
        start: u64,
        stop: u64,
    },
    #[error("memory error: {0}")]
    Memory(#[from] MemError),
    /// 无法分配模拟内存
    #[error("failed to allocate {size} bytes of memory")]
    Alloc {
        size: usize,
        #[source]
        source: TryReserveError,
    },
    #[error("config error: {0}")]
    Config(String),
}

pub type SimResult<T> = Result<T, SimError>;

/// 内存区域配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion {
    /// 区域名称（用于诊断）
    pub name: String,
    /// 起始地址
    pub base: u32,
    /// 大小（字节）
    pub size: usize,
}

impl MemoryRegion {
    /// 区域末尾（不含）
    pub fn end(&self) -> u64 {
        self.base as u64 + self.size as u64
    }

    fn contains(&self, start: u64, len: u64) -> bool {
        start >= self.base as u64 && start + len <= self.end()
    }
}

impl Default for MemoryRegion {
    fn default() -> Self {
        Self {
            name: "ram".to_string(),
            base: 0,
            size: DEFAULT_MEM_SIZE,
        }
    }
}

/// 仿真配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimConfig {
    /// 程序镜像路径（原始二进制或 ELF）
    pub image_path: Option<PathBuf>,
    /// 内存配置
    pub memory: MemoryRegion,
    /// 入口 PC；未指定时原始镜像从内存基地址开始，ELF 从 e_entry 开始
    pub entry_pc: Option<u32>,
    /// 每次 `run_until_halt` 的最大执行指令数（0 表示无限制）
    pub max_instructions: u64,
    /// 非法编码的处理策略
    pub on_invalid: InvalidPolicy,
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    pub fn with_entry_pc(mut self, pc: u32) -> Self {
        self.entry_pc = Some(pc);
        self
    }

    pub fn with_memory_size(mut self, size: usize) -> Self {
        self.memory.size = size;
        self
    }

    pub fn with_memory_base(mut self, base: u32) -> Self {
        self.memory.base = base;
        self
    }

    pub fn with_memory(mut self, name: impl Into<String>, base: u32, size: usize) -> Self {
        self.memory = MemoryRegion {
            name: name.into(),
            base,
            size,
        };
        self
    }

    pub fn with_max_instructions(mut self, max: u64) -> Self {
        self.max_instructions = max;
        self
    }

    pub fn with_on_invalid(mut self, policy: InvalidPolicy) -> Self {
        self.on_invalid = policy;
        self
    }

    /// 检查内存区域：非空，且不超出 32 位地址空间
    pub fn validate(&self) -> SimResult<()> {
        if self.memory.size == 0 {
            return Err(SimError::Config(format!(
                "memory region '{}' has zero size",
                self.memory.name
            )));
        }
        if self.memory.end() > u32::MAX as u64 + 1 {
            return Err(SimError::Config(format!(
                "memory region '{}' (base 0x{:08x}, size 0x{:x}) exceeds the 32-bit address space",
                self.memory.name, self.memory.base, self.memory.size
            )));
        }
        Ok(())
    }
}

/// ELF 可加载段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfSegment {
    pub vaddr: u32,
    pub file_size: usize,
    pub mem_size: usize,
    pub data: Vec<u8>,
}

/// ELF 文件解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfImage {
    /// 入口点地址
    pub entry: u32,
    /// PT_LOAD 段
    pub segments: Vec<ElfSegment>,
}

impl ElfImage {
    /// 从字节数组解析 32 位小端 RISC-V ELF（使用 elf crate）
    pub fn parse_bytes(data: &[u8]) -> SimResult<Self> {
        let elf_file = ElfBytes::<AnyEndian>::minimal_parse(data)
            .map_err(|e| SimError::ElfParse(format!("failed to parse ELF: {e}")))?;

        let header = &elf_file.ehdr;

        if header.e_machine != EM_RISCV {
            return Err(SimError::ElfParse(format!(
                "not a RISC-V ELF (machine type: 0x{:x}, expected 0x{:x})",
                header.e_machine, EM_RISCV
            )));
        }
        if header.class != elf::file::Class::ELF32 {
            return Err(SimError::ElfParse("only 32-bit ELF is supported".into()));
        }
        if header.endianness != AnyEndian::Little {
            return Err(SimError::ElfParse("only little-endian ELF is supported".into()));
        }

        let mut segments = Vec::new();
        if let Some(phdrs) = elf_file.segments() {
            for phdr in phdrs.iter().filter(|p| p.p_type == PT_LOAD) {
                let data = elf_file
                    .segment_data(&phdr)
                    .map_err(|e| SimError::ElfParse(format!("failed to read segment data: {e}")))?
                    .to_vec();

                segments.push(ElfSegment {
                    vaddr: phdr.p_vaddr as u32,
                    file_size: phdr.p_filesz as usize,
                    mem_size: phdr.p_memsz as usize,
                    data,
                });
            }
        }

        if segments.iter().all(|s| s.mem_size == 0) {
            return Err(SimError::ElfParse("no loadable segments".into()));
        }

        Ok(ElfImage {
            entry: header.e_entry as u32,
            segments,
        })
    }

    /// 最高的段末尾地址（不含）
    pub fn image_end(&self) -> u64 {
        self.segments
            .iter()
            .map(|s| s.vaddr as u64 + s.mem_size as u64)
            .max()
            .unwrap_or(0)
    }
}

fn ensure_range(region: &MemoryRegion, start: u64, len: u64) -> SimResult<()> {
    if region.contains(start, len) {
        return Ok(());
    }
    Err(SimError::OutOfRegion {
        region: region.name.clone(),
        base: region.base,
        end: region.end(),
        start,
        stop: start + len,
    })
}

fn load_segments_into_memory(
    memory: &mut FlatMemory,
    region: &MemoryRegion,
    segments: &[ElfSegment],
) -> SimResult<()> {
    // 先检查全部段，任一越界时内存保持原样
    for seg in segments.iter().filter(|s| s.mem_size > 0) {
        ensure_range(region, seg.vaddr as u64, seg.mem_size as u64)?;
    }

    for seg in segments.iter().filter(|s| s.mem_size > 0) {
        let file_size = seg.file_size.min(seg.mem_size).min(seg.data.len());
        memory.write_bytes(seg.vaddr, &seg.data[..file_size])?;

        // bss
        if seg.mem_size > file_size {
            let bss_start = seg.vaddr.wrapping_add(file_size as u32);
            memory.fill(bss_start, seg.mem_size - file_size, 0)?;
        }

        debug!(
            "segment vaddr=0x{:08x} filesz=0x{:x} memsz=0x{:x}",
            seg.vaddr, seg.file_size, seg.mem_size
        );
    }
    Ok(())
}

/// `<镜像路径去掉一个扩展名>-answer.res`
///
/// ```
/// use std::path::Path;
/// use rv32i_sim::sim_env::dump_filename;
///
/// assert_eq!(
///     dump_filename(Path::new("tests/add.bin")),
///     Path::new("tests/add-answer.res"),
/// );
/// ```
pub fn dump_filename(image: &Path) -> PathBuf {
    let mut name = image.file_stem().unwrap_or_default().to_os_string();
    name.push(DUMP_SUFFIX);
    image.with_file_name(name)
}

/// 将 32 个寄存器依次写为小端 u32（共 128 字节）
pub fn write_register_dump<W: Write>(regs: &[u32; NUM_REGS], out: &mut W) -> io::Result<()> {
    for value in regs {
        out.write_u32::<LittleEndian>(*value)?;
    }
    out.flush()
}

/// 仿真环境
///
/// 封装了 CPU、内存和仿真配置，提供统一的仿真接口
pub struct SimEnv {
    pub cpu: CpuCore,
    pub memory: FlatMemory,
    pub config: SimConfig,
    /// 已加载镜像的末尾地址（不含），PC 到达此处即停止
    pub image_end: u32,
    /// 已执行的指令数（跨多次运行累计）
    pub instructions_executed: u64,
}

impl SimEnv {
    /// 从配置创建仿真环境；配置了镜像路径时同时加载镜像
    pub fn from_config(config: SimConfig) -> SimResult<Self> {
        config.validate()?;

        let size = config.memory.size;
        let memory = FlatMemory::try_new(size, config.memory.base)
            .map_err(|source| SimError::Alloc { size, source })?;
        let entry_pc = config.entry_pc.unwrap_or(config.memory.base);

        let mut env = SimEnv {
            cpu: CpuCore::new(entry_pc),
            memory,
            image_end: config.memory.base,
            config,
            instructions_executed: 0,
        };

        if let Some(path) = env.config.image_path.clone() {
            let data = fs::read(&path)?;
            info!("loaded {} bytes from {}", data.len(), path.display());
            env.load_image_bytes(&data)?;
        }

        Ok(env)
    }

    /// 加载镜像：以 ELF magic 开头按 ELF 处理，否则作为原始二进制放在内存基地址
    ///
    /// 设置入口 PC（除非配置明确指定）与镜像末尾。
    pub fn load_image_bytes(&mut self, data: &[u8]) -> SimResult<()> {
        if data.starts_with(&ELF_MAGIC) {
            self.load_elf(data)
        } else {
            self.load_raw(data)
        }
    }

    fn load_raw(&mut self, data: &[u8]) -> SimResult<()> {
        let region = &self.config.memory;
        if data.len() > region.size {
            return Err(SimError::ImageTooLarge {
                size: data.len(),
                capacity: region.size,
            });
        }

        self.memory.write_bytes(region.base, data)?;
        // validate() 保证 base + size <= 2^32，等号时 image_end 取 u32::MAX
        self.image_end = (region.base as u64 + data.len() as u64).min(u32::MAX as u64) as u32;
        self.cpu = CpuCore::new(self.config.entry_pc.unwrap_or(region.base));

        info!(
            "raw image: {} bytes at 0x{:08x}, entry 0x{:08x}",
            data.len(),
            region.base,
            self.cpu.pc()
        );
        Ok(())
    }

    fn load_elf(&mut self, data: &[u8]) -> SimResult<()> {
        let elf = ElfImage::parse_bytes(data)?;
        load_segments_into_memory(&mut self.memory, &self.config.memory, &elf.segments)?;

        self.image_end = elf.image_end().min(u32::MAX as u64) as u32;
        self.cpu = CpuCore::new(self.config.entry_pc.unwrap_or(elf.entry));

        info!(
            "ELF image: {} segment(s), entry 0x{:08x}, end 0x{:08x}",
            elf.segments.len(),
            self.cpu.pc(),
            self.image_end
        );
        Ok(())
    }

    /// 执行单步；CPU 已停机时不再计数
    pub fn step(&mut self) -> Result<CpuState, ExecError> {
        let was_running = self.cpu.state() == CpuState::Running;
        let state = self.cpu.step(&mut self.memory)?;
        if was_running {
            self.instructions_executed += 1;
        }
        Ok(state)
    }

    /// 运行直到停止条件（停机、镜像末尾、指令上限、非法编码或访存错误）
    pub fn run_until_halt(&mut self) -> RunSummary {
        let summary = self.cpu.run(
            &mut self.memory,
            self.image_end,
            self.config.max_instructions,
            self.config.on_invalid,
        );
        self.instructions_executed += summary.executed;

        info!(
            "{} instructions executed, {} (pc=0x{:08x})",
            summary.executed,
            summary.reason,
            self.cpu.pc()
        );
        summary
    }

    pub fn cpu(&self) -> &CpuCore {
        &self.cpu
    }

    pub fn memory(&self) -> &FlatMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut FlatMemory {
        &mut self.memory
    }

    /// 打印仿真状态
    pub fn dump(&self) {
        println!("Instructions executed: {}", self.instructions_executed);
        self.cpu.dump_regs();
    }

    /// 将寄存器转储写入 `path`
    pub fn dump_registers_to(&self, path: &Path) -> SimResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        write_register_dump(self.cpu.regs(), &mut out)?;
        info!("register dump written to {}", path.display());
        Ok(())
    }

    /// 将寄存器转储写入镜像旁的 `-answer.res` 文件，返回写入的路径
    pub fn dump_registers(&self) -> SimResult<PathBuf> {
        let image = self.config.image_path.as_deref().ok_or_else(|| {
            SimError::Config("no image path configured for the register dump".into())
        })?;
        let path = dump_filename(image);
        self.dump_registers_to(&path)?;
        Ok(path)
    }
}
