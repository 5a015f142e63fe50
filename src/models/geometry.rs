//! # 实验几何与显示/掩膜区间
//!
//! 定义掠入射几何参数、强度掩膜区间、色标截断区间和倒空间坐标轴范围。
//! 所有结构都是不可变值：修改参数即构造新值。
//!
//! ## 依赖关系
//! - 被 `settings.rs` 从持久化配置构造
//! - 被 `waxs/` 各模块只读使用

use crate::error::{Result, WaxsError};

use serde::{Deserialize, Serialize};

/// 实验几何
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// 入射角（度）
    pub incidence_angle: f64,
    /// 光束中心 x（像素）
    pub center_x: f64,
    /// 光束中心 y（像素）
    pub center_y: f64,
    /// 样品-探测器距离（mm）
    pub distance: f64,
    /// 像素尺寸 x（µm）
    pub pixel_x: f64,
    /// 像素尺寸 y（µm）
    pub pixel_y: f64,
    /// 波长（Å）
    pub wavelength: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            incidence_angle: 0.5,
            center_x: 0.0,
            center_y: 0.0,
            distance: 300.0,
            pixel_x: 73.2,
            pixel_y: 73.2,
            wavelength: 1.24,
        }
    }
}

impl Geometry {
    /// 检查几何参数是否可用于坐标变换
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("incidence_angle", self.incidence_angle),
            ("center_x", self.center_x),
            ("center_y", self.center_y),
            ("distance", self.distance),
            ("pixel_x", self.pixel_x),
            ("pixel_y", self.pixel_y),
            ("wavelength", self.wavelength),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(WaxsError::Validation(format!(
                    "geometry field '{}' is not a finite number",
                    name
                )));
            }
        }

        if self.distance <= 0.0 {
            return Err(WaxsError::Computation(format!(
                "sample-detector distance must be positive (got {} mm)",
                self.distance
            )));
        }
        if self.wavelength <= 0.0 {
            return Err(WaxsError::Computation(format!(
                "wavelength must be positive (got {} Å)",
                self.wavelength
            )));
        }
        if self.pixel_x <= 0.0 || self.pixel_y <= 0.0 {
            return Err(WaxsError::Computation(format!(
                "pixel pitch must be positive (got {} x {} µm)",
                self.pixel_x, self.pixel_y
            )));
        }
        Ok(())
    }

    pub fn with_center(self, center_x: f64, center_y: f64) -> Self {
        Self {
            center_x,
            center_y,
            ..self
        }
    }

    pub fn with_incidence_angle(self, incidence_angle: f64) -> Self {
        Self {
            incidence_angle,
            ..self
        }
    }

    pub fn with_distance(self, distance: f64) -> Self {
        Self { distance, ..self }
    }

    pub fn with_wavelength(self, wavelength: f64) -> Self {
        Self { wavelength, ..self }
    }

    pub fn with_pixel_size(self, pixel_x: f64, pixel_y: f64) -> Self {
        Self {
            pixel_x,
            pixel_y,
            ..self
        }
    }

    /// 距离（m）
    pub fn distance_m(&self) -> f64 {
        self.distance * 1e-3
    }

    /// 平均像素尺寸（m）
    pub fn mean_pixel_m(&self) -> f64 {
        (self.pixel_x + self.pixel_y) / 2.0 * 1e-6
    }

    /// 波数 k = 2π/λ（Å⁻¹）
    pub fn wavenumber(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.wavelength
    }
}

/// 强度掩膜区间，区间外像素不参与积分并在显示中置零
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskRange {
    threshold_min: f64,
    threshold_max: f64,
}

impl MaskRange {
    pub fn new(threshold_min: f64, threshold_max: f64) -> Result<Self> {
        if threshold_min.is_nan() || threshold_max.is_nan() {
            return Err(WaxsError::Validation(
                "mask thresholds must be numbers".to_string(),
            ));
        }
        if threshold_max < threshold_min {
            return Err(WaxsError::Validation(format!(
                "mask range is inverted: max {} < min {}",
                threshold_max, threshold_min
            )));
        }
        Ok(Self {
            threshold_min,
            threshold_max,
        })
    }

    pub fn min(&self) -> f64 {
        self.threshold_min
    }

    pub fn max(&self) -> f64 {
        self.threshold_max
    }

    /// 像素值是否在区间内（闭区间）
    pub fn contains(&self, value: f64) -> bool {
        value >= self.threshold_min && value <= self.threshold_max
    }
}

impl Default for MaskRange {
    fn default() -> Self {
        Self {
            threshold_min: 0.0,
            threshold_max: 1_000_000.0,
        }
    }
}

/// 色标截断区间，只影响显示
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    cb_min: f64,
    cb_max: f64,
}

impl ColorRange {
    pub fn new(cb_min: f64, cb_max: f64) -> Result<Self> {
        if cb_min.is_nan() || cb_max.is_nan() {
            return Err(WaxsError::Validation(
                "color range bounds must be numbers".to_string(),
            ));
        }
        if cb_max < cb_min {
            return Err(WaxsError::Validation(format!(
                "color range is inverted: max {} < min {}",
                cb_max, cb_min
            )));
        }
        Ok(Self { cb_min, cb_max })
    }

    pub fn min(&self) -> f64 {
        self.cb_min
    }

    pub fn max(&self) -> f64 {
        self.cb_max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.cb_min, self.cb_max)
    }
}

impl Default for ColorRange {
    fn default() -> Self {
        Self {
            cb_min: 0.0,
            cb_max: 800.0,
        }
    }
}

/// 倒空间图显示范围，`None` 表示该方向不限制
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisLimits {
    pub qr_min: Option<f64>,
    pub qr_max: Option<f64>,
    pub qz_min: Option<f64>,
    pub qz_max: Option<f64>,
}

impl AxisLimits {
    /// 根据数据范围补全未设置的边界
    pub fn resolve(&self, data_qr: (f64, f64), data_qz: (f64, f64)) -> ((f64, f64), (f64, f64)) {
        (
            (
                self.qr_min.unwrap_or(data_qr.0),
                self.qr_max.unwrap_or(data_qr.1),
            ),
            (
                self.qz_min.unwrap_or(data_qz.0),
                self.qz_max.unwrap_or(data_qz.1),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_ranges_rejected() {
        assert!(MaskRange::new(10.0, 1.0).unwrap_err().is_validation());
        assert!(ColorRange::new(800.0, 0.0).unwrap_err().is_validation());
        assert!(MaskRange::new(5.0, 5.0).is_ok());
    }

    #[test]
    fn test_zero_distance_is_computation_error() {
        let geometry = Geometry::default().with_distance(0.0);
        assert!(geometry.validate().unwrap_err().is_computation());
    }

    #[test]
    fn test_axis_limits_resolve_open_edges() {
        let limits = AxisLimits {
            qr_min: Some(-1.0),
            qz_max: Some(2.5),
            ..Default::default()
        };
        let ((qr0, qr1), (qz0, qz1)) = limits.resolve((-3.0, 3.0), (0.0, 4.0));
        assert_eq!((qr0, qr1), (-1.0, 3.0));
        assert_eq!((qz0, qz1), (0.0, 2.5));
    }
}
