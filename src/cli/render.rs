//! # render 子命令 CLI 定义
//!
//! 导出单帧二维图像：归一化原始图像或 Qr/Qz 倒空间图。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/render.rs`

use super::overrides::OverrideArgs;
use super::{ColormapChoice, RenderMode};
use crate::utils::args::SpanArg;

use clap::Args;
use std::path::PathBuf;

/// render 子命令参数
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Detector frame (TIFF, PNG, ...)
    pub frame: PathBuf,

    /// Output image mode
    #[arg(short, long, value_enum, default_value_t = RenderMode::Raw)]
    pub mode: RenderMode,

    /// Output JPEG path (default: <stem>.jpg or <stem>_q.jpg next to the frame)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Flip the raw image vertically
    #[arg(long, default_value_t = false)]
    pub flip: bool,

    /// Colour map
    #[arg(long, value_enum, default_value_t = ColormapChoice::Jet)]
    pub colormap: ColormapChoice,

    /// Qr view window, "min:max" (overrides the settings)
    #[arg(long, value_name = "MIN:MAX", allow_hyphen_values = true)]
    pub qr: Option<SpanArg>,

    /// Qz view window, "min:max" (overrides the settings)
    #[arg(long, value_name = "MIN:MAX", allow_hyphen_values = true)]
    pub qz: Option<SpanArg>,

    /// Chart width in pixels (reciprocal mode)
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Chart height in pixels (reciprocal mode)
    #[arg(long, default_value_t = 1000)]
    pub height: u32,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}
