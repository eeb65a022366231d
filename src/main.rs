//! rv32i_sim 命令行入口
//!
//! 加载镜像（原始二进制或 ELF），运行到停机/镜像末尾，
//! 可选打印寄存器状态并写出 `-answer.res` 寄存器转储。

use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::warn;

use rv32i_sim::cpu::{InvalidPolicy, StopReason};
use rv32i_sim::memory::DEFAULT_MEM_SIZE;
use rv32i_sim::sim_env::{SimConfig, SimEnv};

#[derive(Parser, Debug)]
#[command(name = "rv32i_sim", author, version, about = "RV32I functional simulator")]
struct Cli {
    /// Program image: raw little-endian words loaded at the memory base, or an ELF file
    image: PathBuf,

    /// Memory size in bytes
    #[arg(long, default_value_t = DEFAULT_MEM_SIZE)]
    memory_size: usize,

    /// Memory base address; raw images are loaded here
    #[arg(long, default_value_t = 0, value_parser = parse_u32)]
    memory_base: u32,

    /// Stop after this many instructions (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_instructions: u64,

    /// What to do with an invalid instruction encoding
    #[arg(long, value_enum, default_value_t = OnInvalid::Halt)]
    on_invalid: OnInvalid,

    /// Write x0..x31 to `<image without extension>-answer.res`
    #[arg(long)]
    dump: bool,

    /// Prints the final register state after execution
    #[arg(long)]
    print_state: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OnInvalid {
    /// Stop the run and exit with an error
    Halt,
    /// Log a warning and continue with the next word
    Skip,
}

impl From<OnInvalid> for InvalidPolicy {
    fn from(value: OnInvalid) -> Self {
        match value {
            OnInvalid::Halt => InvalidPolicy::Halt,
            OnInvalid::Skip => InvalidPolicy::Skip,
        }
    }
}

/// 十进制或 0x 前缀的十六进制
fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help / --version 走 stdout 并以 0 退出，其余参数错误以 1 退出
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let config = SimConfig::new()
        .with_image_path(&cli.image)
        .with_memory("ram", cli.memory_base, cli.memory_size)
        .with_max_instructions(cli.max_instructions)
        .with_on_invalid(cli.on_invalid.into());

    let mut env = match SimEnv::from_config(config) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Error: {}: {e}", cli.image.display());
            process::exit(1);
        }
    };

    let summary = env.run_until_halt();
    println!(
        "{} instructions executed, {} (pc=0x{:08x})",
        summary.executed,
        summary.reason,
        env.cpu.pc()
    );
    if summary.reason == StopReason::InstructionLimit {
        warn!("stopped before the program finished");
    }

    if cli.print_state {
        env.dump();
    }

    if cli.dump {
        match env.dump_registers() {
            Ok(path) => println!("Registers written to {}", path.display()),
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }

    if summary.reason.is_error() {
        process::exit(1);
    }
}
