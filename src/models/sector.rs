//! # 扇形积分区域
//!
//! 扇区由中心、起止方位角（度）和内外半径（像素）定义。
//! 起始角大于等于终止角时表示跨越 ±180° 的环绕扇区。
//!
//! ## 依赖关系
//! - 被 `waxs/integrate.rs` 使用
//! - 被 `settings.rs` 持久化

use crate::error::{Result, WaxsError};

use serde::{Deserialize, Serialize};

/// 扇形积分区域
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorSelection {
    pub center_x: f64,
    pub center_y: f64,
    /// 起始方位角（度），0° 为 x 正方向
    pub start_angle: f64,
    /// 终止方位角（度）
    pub end_angle: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl SectorSelection {
    pub fn new(
        center: (f64, f64),
        angles: (f64, f64),
        radii: (f64, f64),
    ) -> Result<Self> {
        let sector = Self {
            center_x: center.0,
            center_y: center.1,
            start_angle: angles.0,
            end_angle: angles.1,
            inner_radius: radii.0,
            outer_radius: radii.1,
        };
        sector.validate()?;
        Ok(sector)
    }

    /// 由四次点击确定扇区：两条边界射线上各一点，内外半径上各一点
    ///
    /// 角度和半径保留两位小数。
    pub fn from_points(center: (f64, f64), points: [(f64, f64); 4]) -> Result<Self> {
        let angle = |p: (f64, f64)| round2((p.1 - center.1).atan2(p.0 - center.0).to_degrees());
        let radius = |p: (f64, f64)| round2((p.0 - center.0).hypot(p.1 - center.1));
        Self::new(
            center,
            (angle(points[0]), angle(points[1])),
            (radius(points[2]), radius(points[3])),
        )
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            self.center_x,
            self.center_y,
            self.start_angle,
            self.end_angle,
            self.inner_radius,
            self.outer_radius,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(WaxsError::Validation(
                "sector parameters must be finite numbers".to_string(),
            ));
        }
        if self.inner_radius < 0.0 {
            return Err(WaxsError::Validation(format!(
                "inner radius must be non-negative (got {})",
                self.inner_radius
            )));
        }
        if self.inner_radius > self.outer_radius {
            return Err(WaxsError::Validation(format!(
                "inner radius {} exceeds outer radius {}",
                self.inner_radius, self.outer_radius
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

    /// 是否跨越 ±180°
    pub fn wraps(&self) -> bool {
        self.start_angle >= self.end_angle
    }

    /// 积分用的弧度区间，环绕时终止角加 2π
    pub fn angle_span_radians(&self) -> (f64, f64) {
        let start = self.start_angle.to_radians();
        let mut end = self.end_angle.to_radians();
        if self.wraps() {
            end += 2.0 * std::f64::consts::PI;
        }
        (start, end)
    }

    /// 方位角 θ（弧度，(-π, π]）是否落在扇区角度范围内
    pub fn contains_angle(&self, theta: f64) -> bool {
        let start = self.start_angle.to_radians();
        let end = self.end_angle.to_radians();
        if self.wraps() {
            theta >= start || theta <= end
        } else {
            theta >= start && theta <= end
        }
    }

    pub fn contains_radius(&self, r: f64) -> bool {
        r >= self.inner_radius && r <= self.outer_radius
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraparound_sector_spans_seam() {
        let sector = SectorSelection::new((0.0, 0.0), (170.0, -170.0), (0.0, 10.0)).unwrap();
        assert!(sector.wraps());
        assert!(sector.contains_angle(179f64.to_radians()));
        assert!(sector.contains_angle((-179f64).to_radians()));
        assert!(!sector.contains_angle(0.0));

        let (start, end) = sector.angle_span_radians();
        assert!((end - start - 20f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_inner_greater_than_outer_rejected() {
        let err = SectorSelection::new((0.0, 0.0), (0.0, 90.0), (20.0, 10.0)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_from_points() {
        let sector = SectorSelection::from_points(
            (10.0, 10.0),
            [(20.0, 10.0), (10.0, 20.0), (13.0, 14.0), (10.0, 30.0)],
        )
        .unwrap();
        assert_eq!(sector.start_angle, 0.0);
        assert_eq!(sector.end_angle, 90.0);
        assert_eq!(sector.inner_radius, 5.0);
        assert_eq!(sector.outer_radius, 20.0);
    }
}
