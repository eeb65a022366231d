//! rv32i_sim: RV32I 单线程功能仿真库
//!
//! 从平坦内存取 32 位指令字，解码为按格式打标签的记录，
//! 再在寄存器文件、PC 和内存上执行其架构效果。
//!
//! # 模块结构
//!
//! - `isa`: 指令字段提取、解码与反汇编
//! - `cpu`: 寄存器文件、执行单元与解释循环
//! - `memory`: 带边界检查的小端内存
//! - `sim_env`: 仿真环境（配置、镜像加载、寄存器转储）

pub mod cpu;
pub mod isa;
pub mod memory;
pub mod sim_env;
