//! # 参数覆盖
//!
//! 各子命令共享的几何、阈值与扇区覆盖参数，未给出的项沿用设置文件。
//!
//! ## 依赖关系
//! - 被 `cli/render.rs`、`cli/integrate.rs`、`cli/batch.rs` flatten 使用
//! - 由 `commands/mod.rs` 写入 `SessionSettings`

use crate::utils::args::{PointArg, SpanArg};

use clap::Args;

/// 覆盖设置文件中的参数
#[derive(Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// Beam center in pixels, "x,y"
    #[arg(long, value_name = "X,Y", allow_hyphen_values = true)]
    pub center: Option<PointArg>,

    /// Sector angles in degrees, "start:end" (start >= end wraps through ±180°)
    #[arg(long, value_name = "START:END", allow_hyphen_values = true)]
    pub sector: Option<SpanArg>,

    /// Sector radii in pixels, "inner:outer"
    #[arg(long, value_name = "INNER:OUTER")]
    pub radii: Option<SpanArg>,

    /// Number of histogram bins
    #[arg(long)]
    pub bins: Option<usize>,

    /// Intensity mask range, "min:max"
    #[arg(long, value_name = "MIN:MAX", allow_hyphen_values = true)]
    pub threshold: Option<SpanArg>,

    /// Display clamp range, "min:max"
    #[arg(long, value_name = "MIN:MAX", allow_hyphen_values = true)]
    pub color_range: Option<SpanArg>,

    /// Sample-detector distance (mm)
    #[arg(long)]
    pub distance: Option<f64>,

    /// X-ray wavelength (Å)
    #[arg(long)]
    pub wavelength: Option<f64>,

    /// Grazing incidence angle (degrees)
    #[arg(long, allow_hyphen_values = true)]
    pub incidence: Option<f64>,

    /// Write the overrides back to the settings file
    #[arg(long, default_value_t = false)]
    pub save: bool,
}
