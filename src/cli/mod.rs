//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `render`: 原始图像或倒空间图导出
//! - `integrate`: 单帧扇区积分
//! - `batch`: 原位序列批量积分与背底扣除
//! - `heatmap`: 原位矩阵热图
//! - `config`: 会话参数管理（嵌套子命令）
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: render, integrate, batch, heatmap, config, overrides

pub mod batch;
pub mod config;
pub mod heatmap;
pub mod integrate;
pub mod overrides;
pub mod render;

use crate::settings::DEFAULT_SETTINGS_FILE;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// waxskit - GIWAXS/WAXS 探测器图像处理工具
#[derive(Parser)]
#[command(name = "waxskit")]
#[command(version)]
#[command(about = "GIWAXS/WAXS detector image reduction: reprojection, sector integration, background subtraction", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file holding geometry, ranges and sector
    #[arg(long, global = true, env = "WAXSKIT_SETTINGS", default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Render a frame as a colour image or as a Qr/Qz map
    Render(render::RenderArgs),

    /// Integrate one frame over the configured sector
    Integrate(integrate::IntegrateArgs),

    /// Integrate an in-situ frame sequence, optionally subtracting a background
    Batch(batch::BatchArgs),

    /// Plot an in-situ profile matrix as a heatmap
    Heatmap(heatmap::HeatmapArgs),

    /// Show or edit the persisted settings
    Config(config::ConfigArgs),
}

/// 一维曲线横轴
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ProfileKind {
    /// Scattering vector q (1/Å)
    Q,
    /// Equivalent 2θ at 1.54 Å (degrees)
    TwoTheta,
    /// Radius in pixels
    Pixel,
    /// Azimuth angle (degrees)
    Azimuth,
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileKind::Q => write!(f, "q"),
            ProfileKind::TwoTheta => write!(f, "two-theta"),
            ProfileKind::Pixel => write!(f, "pixel"),
            ProfileKind::Azimuth => write!(f, "azimuth"),
        }
    }
}

/// 颜色映射
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ColormapChoice {
    Jet,
    Gray,
}

/// bin 归一化方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum NormalizationChoice {
    /// Mean intensity per bin
    PixelMean,
    /// Summed intensity divided by bin width
    BinWidth,
}

/// 二维图像模式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RenderMode {
    /// Normalized detector image
    Raw,
    /// Reprojected onto the Qr/Qz grid
    Reciprocal,
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderMode::Raw => write!(f, "raw"),
            RenderMode::Reciprocal => write!(f, "reciprocal"),
        }
    }
}
