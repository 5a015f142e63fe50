//! # integrate 命令实现
//!
//! 单帧扇区积分。
//!
//! ## 功能
//! - 读取图像，截断与翻转后在扇区内做径向/角向直方图
//! - 按所选横轴导出两列文本，可选绘图
//! - 终端打印积分摘要表
//!
//! ## 依赖关系
//! - 使用 `cli/integrate.rs` 定义的参数
//! - 使用 `waxs/integrate.rs`, `waxs/export.rs`, `waxs/plot.rs`
//! - `integrate_frame` 同时被 `commands/batch.rs` 使用

use super::{load_settings, profile_selection, sibling_path};
use crate::cli::integrate::IntegrateArgs;
use crate::error::Result;
use crate::models::{Frame, Profile};
use crate::parsers;
use crate::settings::SessionSettings;
use crate::utils::output;
use crate::waxs::export::profile_to_txt;
use crate::waxs::normalize::{clamp, flip_vertical};
use crate::waxs::plot::{self, PlotOptions};
use crate::waxs::{Integration, Normalization, SectorIntegrator};

use std::path::Path;
use tabled::{Table, Tabled};

/// 摘要表行
#[derive(Debug, Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Property")]
    property: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// 执行 integrate 命令
pub fn execute(args: IntegrateArgs, settings_path: &Path) -> Result<()> {
    let settings = load_settings(settings_path, &args.overrides)?;
    let normalization = super::normalization(args.normalization);

    let frame = parsers::load_frame(&args.frame)?;
    let integration = integrate_frame(&frame, &settings, normalization)?;
    let profile = integration.profile(profile_selection(args.profile, args.raw))?;

    print_summary(&args.frame, &settings, &integration, &profile)?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| sibling_path(&args.frame, ".txt"));
    profile_to_txt(&profile, &output_path)?;
    output::print_written(&format!("{} profile", profile.axis), &output_path);

    if let Some(plot_path) = &args.plot {
        let options = PlotOptions {
            log_y: args.log_y,
            ..Default::default()
        };
        plot::plot_profile(&profile, plot_path, &options)?;
        output::print_written("plot", plot_path);
    }

    Ok(())
}

/// 按设置积分一帧：阈值判断用翻转后的原始强度，权重用翻转后的截断强度
pub(crate) fn integrate_frame(
    frame: &Frame,
    settings: &SessionSettings,
    normalization: Normalization,
) -> Result<Integration> {
    let color = settings.color_range()?;
    let mask = settings.mask_range()?;
    let geometry = settings.geometry();
    let integrator = SectorIntegrator::new(settings.sector()?, settings.num_bins(), mask)?
        .with_normalization(normalization);

    let values = flip_vertical(frame);
    let intensity = flip_vertical(&clamp(frame, &color));
    integrator.integrate(&values, &intensity, &geometry)
}

fn print_summary(
    frame_path: &Path,
    settings: &SessionSettings,
    integration: &Integration,
    profile: &Profile,
) -> Result<()> {
    let sector = settings.sector()?;
    let (x_min, x_max) = profile
        .x
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let peak = profile
        .points()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let rows = vec![
        SummaryRow {
            property: "Frame",
            value: frame_path.display().to_string(),
        },
        SummaryRow {
            property: "Center (px)",
            value: format!("({}, {})", sector.center_x, sector.center_y),
        },
        SummaryRow {
            property: "Sector (deg)",
            value: format!(
                "{} → {}{}",
                sector.start_angle,
                sector.end_angle,
                if sector.wraps() { " (wraps)" } else { "" }
            ),
        },
        SummaryRow {
            property: "Radii (px)",
            value: format!("{} → {}", sector.inner_radius, sector.outer_radius),
        },
        SummaryRow {
            property: "Bins",
            value: settings.num_bins().to_string(),
        },
        SummaryRow {
            property: "Pixels in sector",
            value: integration.pixel_count().to_string(),
        },
        SummaryRow {
            property: "Axis",
            value: format!(
                "{}{}",
                profile.axis.label(),
                if profile.smoothed { ", smoothed" } else { "" }
            ),
        },
        SummaryRow {
            property: "x range",
            value: if x_min <= x_max {
                format!("{:.4} → {:.4}", x_min, x_max)
            } else {
                "n/a".to_string()
            },
        },
        SummaryRow {
            property: "Peak",
            value: peak
                .map(|(x, y)| format!("{:.3} at {:.4}", y, x))
                .unwrap_or_else(|| "n/a".to_string()),
        },
    ];

    output::print_header("Sector Integration");
    println!("{}", Table::new(&rows));
    if integration.pixel_count() == 0 {
        output::print_warning("No pixel fell inside the sector and intensity range");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn settings() -> SessionSettings {
        let mut settings = SessionSettings::default();
        settings.set("x_Center", "50").unwrap();
        settings.set("y_Center", "50").unwrap();
        settings.set("outer_radius", "40").unwrap();
        settings.set("numbin", "20").unwrap();
        settings
    }

    #[test]
    fn test_flat_frame_gives_flat_profile() {
        let frame = Frame::filled(100, 100, 500.0);
        let integration = integrate_frame(&frame, &settings(), Normalization::PixelMean).unwrap();
        let profile = integration
            .profile(crate::waxs::ProfileSelection::PixelRaw)
            .unwrap();
        assert_eq!(profile.len(), 20);
        for (&y, &count) in profile.y.iter().zip(&integration.radial_counts) {
            if count > 0 {
                approx::assert_relative_eq!(y, 500.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_clamp_limits_weights() {
        let mut s = settings();
        s.set("textbox_max", "300").unwrap();
        let frame = Frame::new(Array2::from_elem((100, 100), 500.0));
        let integration = integrate_frame(&frame, &s, Normalization::PixelMean).unwrap();
        assert!(integration
            .radial
            .iter()
            .zip(&integration.radial_counts)
            .filter(|(_, c)| **c > 0)
            .all(|(&y, _)| (y - 300.0).abs() < 1e-9));
    }

    #[test]
    fn test_threshold_uses_raw_values() {
        let mut s = settings();
        s.set("threshold_max", "400").unwrap();
        let frame = Frame::filled(100, 100, 500.0);
        let integration = integrate_frame(&frame, &s, Normalization::PixelMean).unwrap();
        assert_eq!(integration.pixel_count(), 0);
        assert!(integration.radial.iter().all(|&y| y == 0.0));
    }
}
