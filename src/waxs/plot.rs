//! # 图像与曲线绘制
//!
//! 使用 `plotters` 生成 JPEG 图像，使用 `image` 写出归一化的原始探测器图像。
//!
//! ## 功能
//! - 原始图像：8 位归一化图像经颜色映射后写出 JPEG
//! - 倒空间图：Qr/Qz 网格上的颜色映射
//! - 一维曲线：线性或对数 y 轴，可叠加背底与扣除结果
//! - 原位热图：横轴为曲线 x，纵轴为帧序号
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `waxs/reciprocal.rs`、`waxs/colormap.rs`、`models/profile.rs`

use crate::error::{Result, WaxsError};
use crate::models::{DisplayImage, Profile, ProfileMatrix};
use crate::waxs::background::BaselineCurve;
use crate::waxs::colormap::Colormap;
use crate::waxs::reciprocal::{self, ReciprocalMap};

use ndarray::Array2;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

/// 倒空间网格绘制时每个方向最多的单元数
const MAX_MESH_CELLS: usize = 400;

const LINE_COLOR: RGBColor = RGBColor(0, 102, 204);
const BACKGROUND_COLOR: RGBColor = RGBColor(220, 20, 60);
const RESULT_COLOR: RGBColor = RGBColor(34, 139, 34);

/// 图像尺寸与坐标轴选项
#[derive(Debug, Clone, Copy)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    pub log_y: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            log_y: false,
        }
    }
}

/// 写出归一化后的原始图像
pub fn render_frame(display: &DisplayImage, colormap: Colormap, output_path: &Path) -> Result<()> {
    let (height, width) = display.shape();
    let pixels: Vec<u8> = display
        .pixels
        .iter()
        .flat_map(|&p| colormap.apply(p as f64 / 255.0))
        .collect();
    let image = image::RgbImage::from_raw(width as u32, height as u32, pixels)
        .ok_or_else(|| WaxsError::RenderError("pixel buffer size mismatch".to_string()))?;

    image
        .save_with_format(output_path, image::ImageFormat::Jpeg)
        .map_err(|e| match e {
            image::ImageError::IoError(source) => WaxsError::FileWriteError {
                path: output_path.display().to_string(),
                source,
            },
            other => WaxsError::RenderError(other.to_string()),
        })
}

/// 绘制一维曲线
pub fn plot_profile(profile: &Profile, output_path: &Path, options: &PlotOptions) -> Result<()> {
    let series = [Series {
        label: "Intensity",
        x: &profile.x,
        y: &profile.y,
        color: LINE_COLOR,
    }];
    let points = curve_points(&series, options.log_y)?;
    let root = BitMapBackend::new(output_path, (options.width, options.height)).into_drawing_area();
    draw_curves(&root, profile.title(), profile.axis.label(), &series, &points, options.log_y)?;
    root.present().map_err(render_err)?;
    Ok(())
}

/// 绘制原始曲线、背底和扣除结果
pub fn plot_background(
    profile: &Profile,
    baseline: &BaselineCurve,
    corrected: &[f64],
    output_path: &Path,
    options: &PlotOptions,
) -> Result<()> {
    let series = [
        Series {
            label: "Original Data",
            x: &profile.x,
            y: &profile.y,
            color: LINE_COLOR,
        },
        Series {
            label: "Background",
            x: &baseline.x,
            y: &baseline.y,
            color: BACKGROUND_COLOR,
        },
        Series {
            label: "Result",
            x: &profile.x,
            y: corrected,
            color: RESULT_COLOR,
        },
    ];
    let points = curve_points(&series, options.log_y)?;
    let root = BitMapBackend::new(output_path, (options.width, options.height)).into_drawing_area();
    draw_curves(&root, profile.title(), profile.axis.label(), &series, &points, options.log_y)?;
    root.present().map_err(render_err)?;
    Ok(())
}

/// 绘制倒空间图
pub fn plot_reciprocal(
    map: &ReciprocalMap,
    intensity: &Array2<f64>,
    window: ((f64, f64), (f64, f64)),
    colormap: Colormap,
    output_path: &Path,
    options: &PlotOptions,
) -> Result<()> {
    if intensity.dim() != map.shape() {
        return Err(WaxsError::RenderError(format!(
            "intensity shape {:?} does not match grid {:?}",
            intensity.dim(),
            map.shape()
        )));
    }

    let root = BitMapBackend::new(output_path, (options.width, options.height)).into_drawing_area();
    draw_mesh(&root, map, intensity, window, colormap)?;
    root.present().map_err(render_err)?;
    Ok(())
}

/// 绘制原位热图
pub fn plot_heatmap(
    matrix: &ProfileMatrix,
    x_label: &str,
    output_path: &Path,
    options: &PlotOptions,
) -> Result<()> {
    if matrix.n_rows() < 2 || matrix.n_frames() == 0 {
        return Err(WaxsError::RenderError(
            "heatmap needs at least two x samples and one frame".to_string(),
        ));
    }

    let root = BitMapBackend::new(output_path, (options.width, options.height)).into_drawing_area();
    draw_heatmap(&root, matrix, x_label)?;
    root.present().map_err(render_err)?;
    Ok(())
}

struct Series<'a> {
    label: &'static str,
    x: &'a [f64],
    y: &'a [f64],
    color: RGBColor,
}

fn render_err<E: std::fmt::Debug>(e: E) -> WaxsError {
    WaxsError::RenderError(format!("{:?}", e))
}

/// 每条曲线可绘制的点（对数轴只保留正值）
fn curve_points(series: &[Series], log_y: bool) -> Result<Vec<Vec<(f64, f64)>>> {
    let points: Vec<Vec<(f64, f64)>> = series
        .iter()
        .map(|s| {
            s.x.iter()
                .copied()
                .zip(s.y.iter().copied())
                .filter(|(x, y)| x.is_finite() && y.is_finite() && (!log_y || *y > 0.0))
                .collect()
        })
        .collect();

    if points.iter().all(|p| p.is_empty()) {
        return Err(WaxsError::RenderError(if log_y {
            "no positive values to draw on a log axis".to_string()
        } else {
            "no finite values to draw".to_string()
        }));
    }
    Ok(points)
}

fn draw_curves<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    title: &str,
    x_desc: &str,
    series: &[Series],
    points: &[Vec<(f64, f64)>],
    log_y: bool,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(render_err)?;

    let (x_min, x_max, y_min, y_max) = points.iter().flatten().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(x0, x1, y0, y1), &(x, y)| (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
    );
    let (x_min, x_max) = pad_range(x_min, x_max);

    if log_y {
        let (y_lo, y_hi) = (y_min * 0.8, y_max * 1.25);
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 28).into_font())
            .margin(30)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, (y_lo..y_hi).log_scale())
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc("Intensity (Log Scale)")
            .x_label_style(("sans-serif", 16))
            .y_label_style(("sans-serif", 16))
            .axis_desc_style(("sans-serif", 18))
            .draw()
            .map_err(render_err)?;

        for (s, pts) in series.iter().zip(points) {
            let color = s.color;
            chart
                .draw_series(LineSeries::new(pts.iter().copied(), color.stroke_width(2)))
                .map_err(render_err)?
                .label(s.label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
        if series.len() > 1 {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(render_err)?;
        }
    } else {
        let (y_lo, y_hi) = pad_range(y_min, y_max);
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 28).into_font())
            .margin(30)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, y_lo..y_hi)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc("Intensity")
            .x_label_style(("sans-serif", 16))
            .y_label_style(("sans-serif", 16))
            .axis_desc_style(("sans-serif", 18))
            .draw()
            .map_err(render_err)?;

        for (s, pts) in series.iter().zip(points) {
            let color = s.color;
            chart
                .draw_series(LineSeries::new(pts.iter().copied(), color.stroke_width(2)))
                .map_err(render_err)?
                .label(s.label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
        if series.len() > 1 {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(render_err)?;
        }
    }

    Ok(())
}

fn draw_mesh<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    map: &ReciprocalMap,
    intensity: &Array2<f64>,
    window: ((f64, f64), (f64, f64)),
    colormap: Colormap,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(render_err)?;
    let ((qr0, qr1), (qz0, qz1)) = window;

    let mut chart = ChartBuilder::on(root)
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(qr0..qr1, qz0..qz1)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Qr (Å⁻¹)")
        .y_desc("Qz (Å⁻¹)")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(render_err)?;

    let (height, width) = map.shape();
    let stride = height.max(width).div_ceil(MAX_MESH_CELLS).max(1);

    let cells = mesh_cells(map, intensity, stride)
        .into_iter()
        .map(|(corners, value)| {
            let [r, g, b] = colormap.apply_range(value, 0.0, 255.0);
            Rectangle::new(corners, RGBColor(r, g, b).filled())
        });

    chart.draw_series(cells).map_err(render_err)?;
    Ok(())
}

/// 抽稀后的网格单元：(对角两点, 强度)
///
/// 任一角点为 NaN 或跨越 Qy 变号的单元不画。
fn mesh_cells(
    map: &ReciprocalMap,
    intensity: &Array2<f64>,
    stride: usize,
) -> Vec<([(f64, f64); 2], f64)> {
    let (height, width) = map.shape();
    let mut cells = Vec::new();

    for i in (0..height.saturating_sub(1)).step_by(stride) {
        let i2 = (i + stride).min(height - 1);
        for j in (0..width.saturating_sub(1)).step_by(stride) {
            let j2 = (j + stride).min(width - 1);
            let corners = [(i, j), (i, j2), (i2, j), (i2, j2)];
            if corners.iter().any(|&c| intensity[c].is_nan()) {
                continue;
            }
            let side = reciprocal::sign(map.qy[[i, j]]);
            if corners.iter().any(|&c| reciprocal::sign(map.qy[c]) != side) {
                continue;
            }
            cells.push((
                [
                    (map.qr[[i, j]], map.qz[[i, j]]),
                    (map.qr[[i2, j2]], map.qz[[i2, j2]]),
                ],
                intensity[[i, j]],
            ));
        }
    }
    cells
}

fn draw_heatmap<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    matrix: &ProfileMatrix,
    x_label: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(render_err)?;

    let (x_min, x_max) = matrix
        .x
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let (v_min, v_max) = matrix.value_range().unwrap_or((0.0, 1.0));
    let n_frames = matrix.n_frames() as f64;

    let mut chart = ChartBuilder::on(root)
        .caption("In-situ Heatmap", ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 1.0..(n_frames + 1.0))
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(x_label)
        .y_desc("Frame")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(render_err)?;

    let cells = matrix.columns.iter().enumerate().flat_map(move |(f, column)| {
        matrix.x.windows(2).zip(column).filter_map(move |(xs, &v)| {
            if !v.is_finite() || !xs[0].is_finite() || !xs[1].is_finite() {
                return None;
            }
            let [r, g, b] = Colormap::Jet.apply_range(v, v_min, v_max);
            let y = f as f64 + 1.0;
            Some(Rectangle::new(
                [(xs[0], y), (xs[1], y + 1.0)],
                RGBColor(r, g, b).filled(),
            ))
        })
    });

    chart.draw_series(cells).map_err(render_err)?;
    Ok(())
}

/// 避免零宽坐标范围
fn pad_range(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        let pad = (hi - lo) * 0.02;
        (lo - pad, hi + pad)
    } else {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        (lo - pad, hi + pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileAxis;

    #[test]
    fn test_pad_range_never_empty() {
        let (lo, hi) = pad_range(5.0, 5.0);
        assert!(hi > lo);
        let (lo, hi) = pad_range(0.0, 0.0);
        assert_eq!((lo, hi), (-1.0, 1.0));
    }

    #[test]
    fn test_render_frame_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        let display = DisplayImage {
            pixels: Array2::from_shape_fn((16, 24), |(r, c)| (r * 10 + c) as u8),
            mask: Array2::from_elem((16, 24), false),
        };
        render_frame(&display, Colormap::Jet, &path).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (24, 16));

        render_frame(&display, Colormap::Grayscale, &path).unwrap();
        assert!(image::open(&path).is_ok());
    }

    #[test]
    fn test_log_plot_without_positive_values_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.jpg");
        let profile = Profile::new(
            ProfileAxis::Pixel,
            false,
            vec![1.0, 2.0, 3.0],
            vec![0.0, -1.0, 0.0],
        )
        .unwrap();
        let options = PlotOptions {
            log_y: true,
            ..Default::default()
        };
        let err = plot_profile(&profile, &path, &options).unwrap_err();
        assert!(err.is_computation());
    }

    #[test]
    fn test_decimated_mesh_skips_qy_seam() {
        // Qy 在第 500 与 501 列之间变号，宽度超过 MAX_MESH_CELLS，步长为 3
        let (height, width) = (6, 1200);
        let qy = Array2::from_shape_fn((height, width), |(_, j)| j as f64 - 500.5);
        let map = ReciprocalMap {
            qr: qy.clone(),
            qz: Array2::from_shape_fn((height, width), |(i, _)| i as f64),
            qy,
        };
        let display = DisplayImage {
            pixels: Array2::from_elem((height, width), 100),
            mask: Array2::from_elem((height, width), false),
        };
        let intensity = map.masked_intensity(&display).unwrap();
        assert!(!intensity[[0, 498]].is_nan());

        let stride = width.div_ceil(MAX_MESH_CELLS);
        assert_eq!(stride, 3);
        let cells = mesh_cells(&map, &intensity, stride);
        assert!(!cells.is_empty());
        for ([(qr_a, _), (qr_b, _)], value) in &cells {
            assert!(qr_a * qr_b > 0.0, "cell spans the seam: {} -> {}", qr_a, qr_b);
            assert!(!value.is_nan());
        }
        // 两侧仍有单元
        assert!(cells.iter().any(|([(qr, _), _], _)| *qr < 0.0));
        assert!(cells.iter().any(|([(qr, _), _], _)| *qr > 0.0));
    }

    #[test]
    fn test_heatmap_requires_frames() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = ProfileMatrix::new(vec![0.0, 1.0]);
        assert!(plot_heatmap(
            &matrix,
            "q",
            &dir.path().join("heatmap.jpg"),
            &PlotOptions::default()
        )
        .is_err());
    }
}
