//! # 扇形区域径向/角向积分
//!
//! 在极坐标下对扇形区域内的像素做加权直方图：
//! - 径向：半径区间 [inner, outer] 等分 `num_bins` 份
//! - 角向：角度区间 [start, end] 等分 `num_bins` 份（跨越 ±180° 时 end 加 2π）
//!
//! 每个 bin 的强度和按像素数平均（默认），或按 bin 宽度归一化为密度。
//! 结果再做窗口为 5 的滑动平均，并换算到 q 与参考波长 1.54 Å 下的 2θ。
//!
//! ## 依赖关系
//! - 被 `commands/integrate.rs`、`commands/batch.rs` 使用
//! - 使用 `models/sector.rs`、`models/geometry.rs`、`models/profile.rs`

use crate::error::{Result, WaxsError};
use crate::models::{Frame, Geometry, MaskRange, Profile, ProfileAxis, SectorSelection};

use std::f64::consts::PI;

/// 滑动平均窗口
pub const SMOOTHING_WINDOW: usize = 5;

/// 2θ 换算使用的参考波长（Cu Kα，Å）
pub const REFERENCE_WAVELENGTH: f64 = 1.54;

/// bin 归一化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// 强度和除以像素数（空 bin 为 0）
    #[default]
    PixelMean,
    /// 强度和除以 bin 宽度
    BinWidth,
}

/// 输出曲线选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSelection {
    Q,
    TwoTheta,
    Pixel,
    QRaw,
    TwoThetaRaw,
    PixelRaw,
    /// 角向曲线（总是平滑后的）
    Azimuth,
}

impl ProfileSelection {
    pub fn from_axis(axis: ProfileAxis, smoothed: bool) -> Self {
        match (axis, smoothed) {
            (ProfileAxis::Q, true) => ProfileSelection::Q,
            (ProfileAxis::Q, false) => ProfileSelection::QRaw,
            (ProfileAxis::TwoTheta, true) => ProfileSelection::TwoTheta,
            (ProfileAxis::TwoTheta, false) => ProfileSelection::TwoThetaRaw,
            (ProfileAxis::Pixel, true) => ProfileSelection::Pixel,
            (ProfileAxis::Pixel, false) => ProfileSelection::PixelRaw,
            (ProfileAxis::Azimuth, _) => ProfileSelection::Azimuth,
        }
    }

    pub fn axis(&self) -> ProfileAxis {
        match self {
            ProfileSelection::Q | ProfileSelection::QRaw => ProfileAxis::Q,
            ProfileSelection::TwoTheta | ProfileSelection::TwoThetaRaw => ProfileAxis::TwoTheta,
            ProfileSelection::Pixel | ProfileSelection::PixelRaw => ProfileAxis::Pixel,
            ProfileSelection::Azimuth => ProfileAxis::Azimuth,
        }
    }

    pub fn is_smoothed(&self) -> bool {
        matches!(
            self,
            ProfileSelection::Q
                | ProfileSelection::TwoTheta
                | ProfileSelection::Pixel
                | ProfileSelection::Azimuth
        )
    }
}

/// 一次积分的全部结果
#[derive(Debug, Clone)]
pub struct Integration {
    /// 径向 bin 中心（像素）
    pub rbin_centers: Vec<f64>,
    pub q: Vec<f64>,
    pub two_theta: Vec<f64>,
    pub radial: Vec<f64>,
    pub radial_smoothed: Vec<f64>,
    pub radial_counts: Vec<usize>,
    /// 角向 bin 中心（度）
    pub azimuth: Vec<f64>,
    pub azimuthal: Vec<f64>,
    pub azimuthal_smoothed: Vec<f64>,
    pub azimuthal_counts: Vec<usize>,
}

impl Integration {
    /// 取出一条曲线
    pub fn profile(&self, selection: ProfileSelection) -> Result<Profile> {
        let (x, y) = match selection {
            ProfileSelection::Q => (&self.q, &self.radial_smoothed),
            ProfileSelection::TwoTheta => (&self.two_theta, &self.radial_smoothed),
            ProfileSelection::Pixel => (&self.rbin_centers, &self.radial_smoothed),
            ProfileSelection::QRaw => (&self.q, &self.radial),
            ProfileSelection::TwoThetaRaw => (&self.two_theta, &self.radial),
            ProfileSelection::PixelRaw => (&self.rbin_centers, &self.radial),
            ProfileSelection::Azimuth => (&self.azimuth, &self.azimuthal_smoothed),
        };
        Profile::new(
            selection.axis(),
            selection.is_smoothed(),
            x.clone(),
            y.clone(),
        )
    }

    /// 扇区内参与积分的像素数
    pub fn pixel_count(&self) -> usize {
        self.radial_counts.iter().sum()
    }
}

/// 扇形积分器
#[derive(Debug, Clone)]
pub struct SectorIntegrator {
    sector: SectorSelection,
    num_bins: usize,
    mask: MaskRange,
    normalization: Normalization,
}

impl SectorIntegrator {
    pub fn new(sector: SectorSelection, num_bins: usize, mask: MaskRange) -> Result<Self> {
        sector.validate()?;
        if num_bins == 0 {
            return Err(WaxsError::Validation(
                "number of bins must be at least 1".to_string(),
            ));
        }
        if sector.inner_radius >= sector.outer_radius {
            return Err(WaxsError::Validation(format!(
                "radial range [{}, {}] is empty",
                sector.inner_radius, sector.outer_radius
            )));
        }
        Ok(Self {
            sector,
            num_bins,
            mask,
            normalization: Normalization::default(),
        })
    }

    pub fn with_normalization(self, normalization: Normalization) -> Self {
        Self {
            normalization,
            ..self
        }
    }

    pub fn sector(&self) -> &SectorSelection {
        &self.sector
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// 执行积分
    ///
    /// `values` 提供阈值判断用的原始强度，`intensity` 提供权重（通常是截断后的图像），
    /// 二者方向一致。扇区中心为 0 起始的 (列, 行) 坐标。
    pub fn integrate(
        &self,
        values: &Frame,
        intensity: &Frame,
        geometry: &Geometry,
    ) -> Result<Integration> {
        geometry.validate()?;
        if values.shape() != intensity.shape() {
            return Err(WaxsError::Validation(format!(
                "mask frame shape {:?} does not match intensity frame shape {:?}",
                values.shape(),
                intensity.shape()
            )));
        }

        let sector = &self.sector;
        let n = self.num_bins;
        let (r0, r1) = (sector.inner_radius, sector.outer_radius);
        let (a0, a1) = sector.angle_span_radians();
        let wraps = sector.wraps();

        let mut radial_sum = vec![0.0; n];
        let mut radial_counts = vec![0usize; n];
        let mut azimuthal_sum = vec![0.0; n];
        let mut azimuthal_counts = vec![0usize; n];

        let raw = values.data();
        let weights = intensity.data();

        for ((row, col), &weight) in weights.indexed_iter() {
            let x = col as f64 - sector.center_x;
            let y = row as f64 - sector.center_y;
            let r = x.hypot(y);
            let theta = y.atan2(x);

            if !sector.contains_radius(r) || !sector.contains_angle(theta) {
                continue;
            }
            if !self.mask.contains(raw[[row, col]]) {
                continue;
            }

            if let Some(bin) = bin_index(r, r0, r1, n) {
                radial_sum[bin] += weight;
                radial_counts[bin] += 1;
            }

            let theta = if wraps && theta < a0 { theta + 2.0 * PI } else { theta };
            if let Some(bin) = bin_index(theta, a0, a1, n) {
                azimuthal_sum[bin] += weight;
                azimuthal_counts[bin] += 1;
            }
        }

        let radial = self.normalize(&radial_sum, &radial_counts, (r1 - r0) / n as f64);
        let azimuthal = self.normalize(&azimuthal_sum, &azimuthal_counts, (a1 - a0) / n as f64);

        let rbin_centers = bin_centers(r0, r1, n);
        let azimuth = bin_centers(a0, a1, n)
            .into_iter()
            .map(f64::to_degrees)
            .collect();

        let pixel = geometry.mean_pixel_m();
        let d = geometry.distance_m();
        let q: Vec<f64> = rbin_centers
            .iter()
            .map(|&r| 4.0 * PI * ((r * pixel / d).atan() / 2.0).sin() / geometry.wavelength)
            .collect();
        let two_theta = q
            .iter()
            .map(|&q| 2.0 * (q * REFERENCE_WAVELENGTH / (4.0 * PI)).asin().to_degrees())
            .collect();

        let integration = Integration {
            radial_smoothed: moving_average(&radial, SMOOTHING_WINDOW),
            azimuthal_smoothed: moving_average(&azimuthal, SMOOTHING_WINDOW),
            rbin_centers,
            q,
            two_theta,
            radial,
            radial_counts,
            azimuth,
            azimuthal,
            azimuthal_counts,
        };

        log::debug!(
            "integrated {} pixels into {} bins (r {}..{}, θ {}°..{}°)",
            integration.pixel_count(),
            n,
            r0,
            r1,
            sector.start_angle,
            sector.end_angle
        );

        Ok(integration)
    }

    fn normalize(&self, sums: &[f64], counts: &[usize], width: f64) -> Vec<f64> {
        match self.normalization {
            Normalization::PixelMean => sums
                .iter()
                .zip(counts)
                .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
                .collect(),
            Normalization::BinWidth => sums.iter().map(|&s| s / width).collect(),
        }
    }
}

/// 等宽 bin 的下标，最后一个 bin 右端闭合
fn bin_index(v: f64, lo: f64, hi: f64, n: usize) -> Option<usize> {
    if !(v >= lo && v <= hi) {
        return None;
    }
    let idx = ((v - lo) / (hi - lo) * n as f64).floor() as usize;
    Some(idx.min(n - 1))
}

fn bin_centers(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let step = (hi - lo) / n as f64;
    (0..n).map(|i| lo + (i as f64 + 0.5) * step).collect()
}

/// 滑动平均，输出与输入等长，边缘按零填充
pub fn moving_average(y: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return y.to_vec();
    }
    let half = (window - 1) / 2;
    let n = y.len() as isize;
    (0..n)
        .map(|i| {
            let sum: f64 = (i - half as isize..=i + (window - 1 - half) as isize)
                .filter(|&j| j >= 0 && j < n)
                .map(|j| y[j as usize])
                .sum();
            sum / window as f64
        })
        .collect()
}
