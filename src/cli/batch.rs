//! # batch 子命令 CLI 定义
//!
//! 原位序列批量积分，可选背底扣除与二维图像导出。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/batch.rs`

use super::overrides::OverrideArgs;
use super::{ColormapChoice, NormalizationChoice, ProfileKind, RenderMode};
use crate::utils::args::{ListArg, SpanArg};
use crate::waxs::session::DEFAULT_REMOVE_THRESHOLD;

use clap::Args;
use std::path::PathBuf;

/// batch 子命令参数
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory containing the frame sequence
    pub input: PathBuf,

    /// Output directory (default: the input directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Glob pattern(s) for frame files, comma separated
    #[arg(short, long, default_value = "*.tif")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Export 1D curves (per-frame txt and plots, plus 1D/output.txt)
    #[arg(long, default_value_t = false)]
    pub curves: bool,

    /// Export 2D images to image/
    #[arg(long, default_value_t = false)]
    pub images: bool,

    /// Image mode for --images
    #[arg(long, value_enum, default_value_t = RenderMode::Raw)]
    pub image_mode: RenderMode,

    /// Colour map for --images
    #[arg(long, value_enum, default_value_t = ColormapChoice::Jet)]
    pub colormap: ColormapChoice,

    /// Subtract a spline background (writes 1D/output_subBk.txt)
    #[arg(long, default_value_t = false)]
    pub background: bool,

    /// 1-based index of the frame used to choose background anchors
    #[arg(long, default_value_t = 1)]
    pub reference: usize,

    /// Background anchor x positions, "x1,x2,..."
    #[arg(long, value_name = "X1,X2,...", allow_hyphen_values = true)]
    pub anchors: Option<ListArg>,

    /// Choose background anchors interactively on the reference frame
    #[arg(long, default_value_t = false)]
    pub interactive: bool,

    /// Largest distance between a removal position and the anchor it removes
    #[arg(long, default_value_t = DEFAULT_REMOVE_THRESHOLD)]
    pub remove_threshold: f64,

    /// Restrict anchor selection to "xmin:xmax"
    #[arg(long, value_name = "XMIN:XMAX", allow_hyphen_values = true)]
    pub window: Option<SpanArg>,

    /// Profile x axis
    #[arg(long, value_enum, default_value_t = ProfileKind::Q)]
    pub profile: ProfileKind,

    /// Use the unsmoothed radial histogram
    #[arg(long, default_value_t = false)]
    pub raw: bool,

    /// Bin normalization
    #[arg(long, value_enum, default_value_t = NormalizationChoice::PixelMean)]
    pub normalization: NormalizationChoice,

    /// Logarithmic intensity axis for curve plots
    #[arg(long, default_value_t = false)]
    pub log_y: bool,

    /// Number of parallel jobs (0 = auto, 1 = sequential)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}
