//! # heatmap 子命令 CLI 定义
//!
//! 读取批量处理输出的矩阵文件（或一组两列曲线文件）并绘制原位热图。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/heatmap.rs`

use super::ProfileKind;

use clap::Args;
use std::path::PathBuf;

/// heatmap 子命令参数
#[derive(Args, Debug)]
pub struct HeatmapArgs {
    /// Matrix file (first column x, one column per frame), or a directory of
    /// two-column profile files
    pub input: PathBuf,

    /// Glob pattern for profile files when the input is a directory
    #[arg(short, long, default_value = "*.txt")]
    pub pattern: String,

    /// Output JPEG (default: <stem>_heatmap.jpg next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Meaning of the x column, used for the axis label
    #[arg(long, value_enum, default_value_t = ProfileKind::Q)]
    pub axis: ProfileKind,

    /// Chart width in pixels
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Chart height in pixels
    #[arg(long, default_value_t = 800)]
    pub height: u32,
}
