//! # config 子命令 CLI 定义
//!
//! 查看和修改持久化的会话参数：
//! - `show`: 列出全部键
//! - `set`: 修改一个键
//! - `reset`: 恢复默认
//! - `pick-sector`: 由四个像素点确定扇区
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/config.rs`

use crate::utils::args::PointArg;

use clap::{Args, Subcommand};

/// config 主命令参数
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// config 子命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print every key with its current and default value
    Show,

    /// Set one key
    Set {
        /// Settings key, e.g. x_Center
        key: String,
        /// Numeric value
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Restore all defaults
    Reset,

    /// Define the sector from four pixel points around the beam center:
    /// start ray, end ray, inner radius, outer radius
    PickSector {
        /// Four "x,y" points
        #[arg(num_args = 4, value_name = "X,Y", allow_hyphen_values = true, required = true)]
        points: Vec<PointArg>,
    },
}
