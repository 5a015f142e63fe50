//! # 颜色映射
//!
//! 归一化强度 [0, 1] 到 RGB 的映射，用于倒空间图和原位热图。
//!
//! ## 依赖关系
//! - 被 `waxs/plot.rs` 使用

use std::fmt;

/// 可用的颜色映射
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    /// 蓝 → 青 → 黄 → 红
    #[default]
    Jet,
    Grayscale,
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Colormap::Jet => write!(f, "jet"),
            Colormap::Grayscale => write!(f, "gray"),
        }
    }
}

// 分段线性控制点 (位置, 分量)
const JET_RED: [(f64, f64); 5] = [(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)];
const JET_GREEN: [(f64, f64); 6] = [
    (0.0, 0.0),
    (0.125, 0.0),
    (0.375, 1.0),
    (0.64, 1.0),
    (0.91, 0.0),
    (1.0, 0.0),
];
const JET_BLUE: [(f64, f64); 5] = [(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)];

impl Colormap {
    /// 将 [0, 1] 内的值映射为 RGB，超出范围的值先截断
    pub fn apply(self, val: f64) -> [u8; 3] {
        let v = if val.is_nan() { 0.0 } else { val.clamp(0.0, 1.0) };
        match self {
            Colormap::Jet => [
                to_u8(piecewise(&JET_RED, v)),
                to_u8(piecewise(&JET_GREEN, v)),
                to_u8(piecewise(&JET_BLUE, v)),
            ],
            Colormap::Grayscale => {
                let g = to_u8(v);
                [g, g, g]
            }
        }
    }

    /// 按 [lo, hi] 归一化后映射
    pub fn apply_range(self, val: f64, lo: f64, hi: f64) -> [u8; 3] {
        let span = hi - lo;
        let t = if span > 0.0 { (val - lo) / span } else { 0.0 };
        self.apply(t)
    }
}

fn piecewise(points: &[(f64, f64)], v: f64) -> f64 {
    for w in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (w[0], w[1]);
        if v <= x1 {
            return y0 + (y1 - y0) * (v - x0) / (x1 - x0);
        }
    }
    points.last().map(|p| p.1).unwrap_or(0.0)
}

fn to_u8(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
