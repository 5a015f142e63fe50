//! # 像素坐标到倒空间 (Qr, Qz) 的变换
//!
//! 掠入射几何下，探测器上每个像素对应一个散射矢量：
//!
//! ```text
//! dx = (c - cx)·px·1e-6,  dz = (cy - r)·py·1e-6,  D = distance·1e-3
//! Θf = atan(dx / D) / 2,  αf = atan(dz / hypot(D, dx)),  αi = incidence·π/180
//! Qx = k(cos2Θf·cosαf - cosαi)
//! Qy = k(sin2Θf·cosαf)
//! Qz = k(sinαf + sinαi)
//! Qr = sign(Qy)·sqrt(Qx² + Qy²)
//! ```
//!
//! 其中 (r, c) 为上下翻转后显示数组的 1 起始行列号，k = 2π/λ。
//!
//! Qy 变号处（Qr 从负跳到正）的像素在网格绘制时会被拉成跨越整个图的色带，
//! 因此 `masked_intensity` 把变号列附近的像素置为 NaN。这是沿用的显示修补规则，
//! 只是近似处理。
//!
//! ## 依赖关系
//! - 被 `commands/render.rs` 使用
//! - 使用 `models/geometry.rs`
//! - 结果交给 `waxs/plot.rs` 绘制

use crate::error::{Result, WaxsError};
use crate::models::{AxisLimits, DisplayImage, Geometry};

use ndarray::Array2;

/// 倒空间坐标网格
#[derive(Debug, Clone)]
pub struct ReciprocalMap {
    /// 面内分量（带符号），Å⁻¹
    pub qr: Array2<f64>,
    /// 面外分量，Å⁻¹
    pub qz: Array2<f64>,
    /// 水平分量，用于变号检测
    pub qy: Array2<f64>,
}

/// 计算整幅图像的倒空间坐标
///
/// `shape` 为 (height, width)，网格与上下翻转后的显示数组逐像素对应。
pub fn to_reciprocal_space(shape: (usize, usize), geometry: &Geometry) -> Result<ReciprocalMap> {
    geometry.validate()?;
    let (height, width) = shape;
    if height == 0 || width == 0 {
        return Err(WaxsError::Validation("frame is empty".to_string()));
    }

    let d = geometry.distance_m();
    let k = geometry.wavenumber();
    let alpha_i = geometry.incidence_angle.to_radians();
    let (cos_ai, sin_ai) = (alpha_i.cos(), alpha_i.sin());

    let mut qr = Array2::<f64>::zeros(shape);
    let mut qz = Array2::<f64>::zeros(shape);
    let mut qy = Array2::<f64>::zeros(shape);

    for row in 0..height {
        let r = (row + 1) as f64;
        let dz = (geometry.center_y - r) * geometry.pixel_y * 1e-6;
        for col in 0..width {
            let c = (col + 1) as f64;
            let dx = (c - geometry.center_x) * geometry.pixel_x * 1e-6;

            let theta_f = (dx / d).atan() / 2.0;
            let alpha_f = (dz / d.hypot(dx)).atan();

            let q_x = k * ((2.0 * theta_f).cos() * alpha_f.cos() - cos_ai);
            let q_y = k * ((2.0 * theta_f).sin() * alpha_f.cos());
            let q_z = k * (alpha_f.sin() + sin_ai);

            qr[[row, col]] = sign(q_y) * q_x.hypot(q_y);
            qz[[row, col]] = q_z;
            qy[[row, col]] = q_y;
        }
    }

    log::debug!(
        "reprojected {}x{} grid (k = {:.4} Å⁻¹, αi = {}°)",
        width,
        height,
        k,
        geometry.incidence_angle
    );

    Ok(ReciprocalMap { qr, qz, qy })
}

impl ReciprocalMap {
    pub fn shape(&self) -> (usize, usize) {
        self.qr.dim()
    }

    /// 显示图像转为浮点，并在 Qy 变号处置 NaN
    ///
    /// 对每行每对相邻列 (j, j+1)，若 sign(Qy) 不同：
    /// - j 置 NaN
    /// - Qy[j+1] > 0 时 j+1 置 NaN
    /// - j > 0 且 Qy[j-1] < 0 时 j-1 置 NaN
    pub fn masked_intensity(&self, display: &DisplayImage) -> Result<Array2<f64>> {
        if display.shape() != self.shape() {
            return Err(WaxsError::Validation(format!(
                "image shape {:?} does not match reciprocal grid {:?}",
                display.shape(),
                self.shape()
            )));
        }

        let mut out = display.pixels.mapv(f64::from);
        let (height, width) = self.shape();

        for row in 0..height {
            for j in 0..width.saturating_sub(1) {
                if sign(self.qy[[row, j]]) == sign(self.qy[[row, j + 1]]) {
                    continue;
                }
                out[[row, j]] = f64::NAN;
                if self.qy[[row, j + 1]] > 0.0 {
                    out[[row, j + 1]] = f64::NAN;
                }
                if j > 0 && self.qy[[row, j - 1]] < 0.0 {
                    out[[row, j - 1]] = f64::NAN;
                }
            }
        }

        Ok(out)
    }

    /// Qr 数据范围
    pub fn qr_range(&self) -> (f64, f64) {
        finite_range(&self.qr)
    }

    /// Qz 数据范围
    pub fn qz_range(&self) -> (f64, f64) {
        finite_range(&self.qz)
    }

    /// 结合用户设置得到最终显示范围
    pub fn view_window(&self, limits: &AxisLimits) -> Result<((f64, f64), (f64, f64))> {
        let ((qr0, qr1), (qz0, qz1)) = limits.resolve(self.qr_range(), self.qz_range());
        if qr0 >= qr1 || qz0 >= qz1 {
            return Err(WaxsError::Validation(format!(
                "empty view window: Qr [{}, {}], Qz [{}, {}]",
                qr0, qr1, qz0, qz1
            )));
        }
        Ok(((qr0, qr1), (qz0, qz1)))
    }
}

/// 与 numpy `sign` 一致：0 的符号为 0
pub(crate) fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn finite_range(a: &Array2<f64>) -> (f64, f64) {
    a.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_beam_center_maps_to_origin() {
        let geometry = Geometry::default()
            .with_center(50.0, 30.0)
            .with_incidence_angle(0.0);
        let map = to_reciprocal_space((80, 100), &geometry).unwrap();

        assert_abs_diff_eq!(map.qr[[29, 49]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(map.qz[[29, 49]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_center_qz_is_incidence_offset() {
        let geometry = Geometry::default().with_center(10.0, 10.0);
        let map = to_reciprocal_space((20, 20), &geometry).unwrap();

        let expected = geometry.wavenumber() * geometry.incidence_angle.to_radians().sin();
        assert_abs_diff_eq!(map.qr[[9, 9]], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(map.qz[[9, 9]], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_qr_sign_follows_side_of_beam() {
        let geometry = Geometry::default().with_center(10.0, 10.0);
        let map = to_reciprocal_space((20, 20), &geometry).unwrap();

        assert!(map.qr[[9, 15]] > 0.0);
        assert!(map.qr[[9, 3]] < 0.0);
        // 第一行在光束中心上方
        assert!(map.qz[[0, 9]] > map.qz[[19, 9]]);
    }

    #[test]
    fn test_zero_distance_rejected() {
        let geometry = Geometry::default().with_distance(0.0);
        let err = to_reciprocal_space((10, 10), &geometry).unwrap_err();
        assert!(err.is_computation());
    }

    #[test]
    fn test_sign_change_columns_are_nan() {
        let geometry = Geometry::default().with_center(5.0, 3.0);
        let map = to_reciprocal_space((6, 10), &geometry).unwrap();
        let display = DisplayImage {
            pixels: Array2::from_elem((6, 10), 200u8),
            mask: Array2::from_elem((6, 10), false),
        };

        let masked = map.masked_intensity(&display).unwrap();
        for row in 0..6 {
            for col in 2..=5 {
                assert!(masked[[row, col]].is_nan(), "({}, {})", row, col);
            }
            assert_eq!(masked[[row, 1]], 200.0);
            assert_eq!(masked[[row, 6]], 200.0);
        }
    }

    #[test]
    fn test_view_window_applies_limits() {
        let map = to_reciprocal_space((20, 20), &Geometry::default().with_center(10.0, 10.0))
            .unwrap();
        let limits = AxisLimits {
            qr_min: Some(-0.1),
            qr_max: Some(0.1),
            ..Default::default()
        };
        let ((qr0, qr1), (qz0, qz1)) = map.view_window(&limits).unwrap();
        assert_eq!((qr0, qr1), (-0.1, 0.1));
        assert_eq!((qz0, qz1), map.qz_range());
    }
}
