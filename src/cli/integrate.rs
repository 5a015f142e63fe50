//! # integrate 子命令 CLI 定义
//!
//! 单帧扇区积分并导出一维曲线。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/integrate.rs`

use super::overrides::OverrideArgs;
use super::{NormalizationChoice, ProfileKind};

use clap::Args;
use std::path::PathBuf;

/// integrate 子命令参数
#[derive(Args, Debug)]
pub struct IntegrateArgs {
    /// Detector frame (TIFF, PNG, ...)
    pub frame: PathBuf,

    /// Profile x axis
    #[arg(short, long, value_enum, default_value_t = ProfileKind::Q)]
    pub profile: ProfileKind,

    /// Export the unsmoothed radial histogram
    #[arg(long, default_value_t = false)]
    pub raw: bool,

    /// Output text file (default: <stem>.txt next to the frame)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also plot the profile to this JPEG
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Logarithmic intensity axis for the plot
    #[arg(long, default_value_t = false)]
    pub log_y: bool,

    /// Bin normalization
    #[arg(long, value_enum, default_value_t = NormalizationChoice::PixelMean)]
    pub normalization: NormalizationChoice,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}
