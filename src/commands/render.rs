//! # render 命令实现
//!
//! 导出单帧二维图像。
//!
//! ## 功能
//! - raw: 截断、掩膜、归一化到 8 位后按颜色映射写出 JPEG
//! - reciprocal: 翻转后的显示图像映射到 Qr/Qz 网格，按坐标范围裁剪后绘制
//!
//! ## 依赖关系
//! - 使用 `cli/render.rs` 定义的参数
//! - 使用 `parsers/frame.rs`, `waxs/normalize.rs`, `waxs/reciprocal.rs`, `waxs/plot.rs`
//! - 同时被 `commands/batch.rs` 用于 `--images`

use super::{colormap, load_settings, sibling_path};
use crate::cli::render::RenderArgs;
use crate::cli::RenderMode;
use crate::error::Result;
use crate::models::{AxisLimits, Frame};
use crate::parsers;
use crate::settings::SessionSettings;
use crate::utils::output;
use crate::waxs::colormap::Colormap;
use crate::waxs::normalize::normalize;
use crate::waxs::plot::{self, PlotOptions};
use crate::waxs::to_reciprocal_space;

use std::path::Path;

/// 二维图像导出参数
pub(crate) struct ImageRequest {
    pub mode: RenderMode,
    pub colormap: Colormap,
    pub flip: bool,
    pub limits: AxisLimits,
    pub options: PlotOptions,
}

/// 执行 render 命令
pub fn execute(args: RenderArgs, settings_path: &Path) -> Result<()> {
    let mut settings = load_settings(settings_path, &args.overrides)?;

    let mut limits = settings.axis_limits();
    if let Some(qr) = args.qr {
        limits.qr_min = Some(qr.0);
        limits.qr_max = Some(qr.1);
    }
    if let Some(qz) = args.qz {
        limits.qz_min = Some(qz.0);
        limits.qz_max = Some(qz.1);
    }
    if args.overrides.save && (args.qr.is_some() || args.qz.is_some()) {
        settings.set_axis_limits(&limits)?;
        settings.save(settings_path)?;
    }

    let output_path = args.output.clone().unwrap_or_else(|| match args.mode {
        RenderMode::Raw => sibling_path(&args.frame, ".jpg"),
        RenderMode::Reciprocal => sibling_path(&args.frame, "_q.jpg"),
    });

    let frame = parsers::load_frame(&args.frame)?;
    output::print_info(&format!(
        "{} ({}x{}, {}-bit)",
        args.frame.display(),
        frame.width(),
        frame.height(),
        frame.bit_depth()
    ));

    let request = ImageRequest {
        mode: args.mode,
        colormap: colormap(args.colormap),
        flip: args.flip,
        limits,
        options: PlotOptions {
            width: args.width,
            height: args.height,
            log_y: false,
        },
    };
    write_image(&frame, &settings, &request, &output_path)?;

    output::print_written(&format!("{} image", args.mode), &output_path);
    Ok(())
}

/// 按请求生成并写出二维图像
pub(crate) fn write_image(
    frame: &Frame,
    settings: &SessionSettings,
    request: &ImageRequest,
    output_path: &Path,
) -> Result<()> {
    let color = settings.color_range()?;
    let mask = settings.mask_range()?;

    match request.mode {
        RenderMode::Raw => {
            let display = normalize(frame, &color, &mask, request.flip)?;
            plot::render_frame(&display, request.colormap, output_path)
        }
        RenderMode::Reciprocal => {
            let geometry = settings.geometry();
            let display = normalize(frame, &color, &mask, true)?;
            let map = to_reciprocal_space(display.shape(), &geometry)?;
            let intensity = map.masked_intensity(&display)?;
            let window = map.view_window(&request.limits)?;
            log::debug!(
                "reciprocal window Qr [{:.4}, {:.4}] Qz [{:.4}, {:.4}]",
                window.0 .0,
                window.0 .1,
                window.1 .0,
                window.1 .1
            );
            plot::plot_reciprocal(
                &map,
                &intensity,
                window,
                request.colormap,
                output_path,
                &request.options,
            )
        }
    }
}
