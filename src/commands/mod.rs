//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。每个命令读取一次设置文件，叠加命令行覆盖后
//! 转换为不可变参数传入 `waxs/` 计算核心。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `settings.rs`, `parsers/`, `waxs/`, `batch/`, `utils/`
//! - 子模块: render, integrate, batch, heatmap, config

pub mod batch;
pub mod config;
pub mod heatmap;
pub mod integrate;
pub mod render;

use crate::cli::overrides::OverrideArgs;
use crate::cli::{Cli, ColormapChoice, Commands, NormalizationChoice, ProfileKind};
use crate::error::Result;
use crate::models::ProfileAxis;
use crate::settings::SessionSettings;
use crate::utils::output;
use crate::waxs::colormap::Colormap;
use crate::waxs::{Normalization, ProfileSelection};

use std::path::{Path, PathBuf};

/// 执行命令
pub fn run(cli: Cli) -> Result<()> {
    let settings = cli.settings;
    match cli.command {
        Commands::Render(args) => render::execute(args, &settings),
        Commands::Integrate(args) => integrate::execute(args, &settings),
        Commands::Batch(args) => batch::execute(args, &settings),
        Commands::Heatmap(args) => heatmap::execute(args),
        Commands::Config(args) => config::execute(args, &settings),
    }
}

/// 读取设置并叠加命令行覆盖，`--save` 时写回
pub(crate) fn load_settings(path: &Path, overrides: &OverrideArgs) -> Result<SessionSettings> {
    let mut settings = SessionSettings::load(path)?;
    apply_overrides(&mut settings, overrides)?;
    if overrides.save {
        settings.save(path)?;
        output::print_info(&format!("Settings saved to {}", path.display()));
    }
    Ok(settings)
}

fn apply_overrides(settings: &mut SessionSettings, overrides: &OverrideArgs) -> Result<()> {
    let mut pairs: Vec<(&str, f64)> = Vec::new();
    if let Some(center) = overrides.center {
        pairs.push(("x_Center", center.0));
        pairs.push(("y_Center", center.1));
    }
    if let Some(sector) = overrides.sector {
        pairs.push(("start_angle", sector.0));
        pairs.push(("end_angle", sector.1));
    }
    if let Some(radii) = overrides.radii {
        pairs.push(("inner_radius", radii.0));
        pairs.push(("outer_radius", radii.1));
    }
    if let Some(bins) = overrides.bins {
        pairs.push(("numbin", bins as f64));
    }
    if let Some(threshold) = overrides.threshold {
        pairs.push(("threshold_min", threshold.0));
        pairs.push(("threshold_max", threshold.1));
    }
    if let Some(color) = overrides.color_range {
        pairs.push(("textbox_min", color.0));
        pairs.push(("textbox_max", color.1));
    }
    if let Some(distance) = overrides.distance {
        pairs.push(("distance", distance));
    }
    if let Some(wavelength) = overrides.wavelength {
        pairs.push(("lamda", wavelength));
    }
    if let Some(incidence) = overrides.incidence {
        pairs.push(("Angle_incidence", incidence));
    }

    for (key, value) in pairs {
        settings.set(key, &value.to_string())?;
    }
    Ok(())
}

pub(crate) fn profile_selection(kind: ProfileKind, raw: bool) -> ProfileSelection {
    let axis = match kind {
        ProfileKind::Q => ProfileAxis::Q,
        ProfileKind::TwoTheta => ProfileAxis::TwoTheta,
        ProfileKind::Pixel => ProfileAxis::Pixel,
        ProfileKind::Azimuth => ProfileAxis::Azimuth,
    };
    ProfileSelection::from_axis(axis, !raw)
}

pub(crate) fn colormap(choice: ColormapChoice) -> Colormap {
    match choice {
        ColormapChoice::Jet => Colormap::Jet,
        ColormapChoice::Gray => Colormap::Grayscale,
    }
}

pub(crate) fn normalization(choice: NormalizationChoice) -> Normalization {
    match choice {
        NormalizationChoice::PixelMean => Normalization::PixelMean,
        NormalizationChoice::BinWidth => Normalization::BinWidth,
    }
}

/// 与输入同目录、替换扩展名的默认输出路径
pub(crate) fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("frame");
    input.with_file_name(format!("{}{}", stem, suffix))
}
