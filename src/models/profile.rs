//! # 一维积分曲线数据模型
//!
//! `Profile` 为有序的 (x, y) 序列，x 可以是 q、2θ、像素半径或方位角。
//! `ProfileMatrix` 为原位批量处理的输出矩阵：第一列为共享 x 轴，之后每帧一列。
//!
//! ## 依赖关系
//! - 被 `waxs/integrate.rs` 创建
//! - 被 `waxs/export.rs`、`waxs/plot.rs`、`waxs/background.rs` 使用

use crate::error::{Result, WaxsError};

use std::fmt;

/// 曲线横轴类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAxis {
    /// 散射矢量 q（Å⁻¹）
    Q,
    /// 参考波长 1.54 Å 下的等效 2θ（度）
    TwoTheta,
    /// 像素半径
    Pixel,
    /// 方位角（度）
    Azimuth,
}

impl ProfileAxis {
    /// 坐标轴标签
    pub fn label(&self) -> &'static str {
        match self {
            ProfileAxis::Q => "q (Å⁻¹)",
            ProfileAxis::TwoTheta => "2θ (°)",
            ProfileAxis::Pixel => "Pixel",
            ProfileAxis::Azimuth => "θ (°)",
        }
    }

    pub fn is_radial(&self) -> bool {
        !matches!(self, ProfileAxis::Azimuth)
    }
}

impl fmt::Display for ProfileAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileAxis::Q => write!(f, "q"),
            ProfileAxis::TwoTheta => write!(f, "2theta"),
            ProfileAxis::Pixel => write!(f, "pixel"),
            ProfileAxis::Azimuth => write!(f, "azimuth"),
        }
    }
}

/// 一维积分曲线
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub axis: ProfileAxis,
    pub smoothed: bool,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Profile {
    pub fn new(axis: ProfileAxis, smoothed: bool, x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(WaxsError::Validation(format!(
                "profile x/y length mismatch: {} vs {}",
                x.len(),
                y.len()
            )));
        }
        Ok(Self {
            axis,
            smoothed,
            x,
            y,
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// (x, y) 点对
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// 距离给定 x 最近的样本下标
    pub fn nearest_index(&self, x: f64) -> Option<usize> {
        nearest_index(&self.x, x)
    }

    /// 标题
    pub fn title(&self) -> &'static str {
        if self.axis.is_radial() {
            "Radial Profile"
        } else {
            "Azimuth Profile"
        }
    }
}

/// 距离给定 x 最近的样本下标（忽略 NaN）
pub fn nearest_index(xs: &[f64], x: f64) -> Option<usize> {
    xs.iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .min_by(|(_, a), (_, b)| {
            (*a - x)
                .abs()
                .partial_cmp(&(*b - x).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
}

/// 原位批量输出矩阵
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileMatrix {
    /// 共享横轴
    pub x: Vec<f64>,
    /// 每帧一列
    pub columns: Vec<Vec<f64>>,
}

impl ProfileMatrix {
    pub fn new(x: Vec<f64>) -> Self {
        Self {
            x,
            columns: Vec::new(),
        }
    }

    /// 追加一列，长度必须与横轴一致
    pub fn push_column(&mut self, y: Vec<f64>) -> Result<()> {
        if y.len() != self.x.len() {
            return Err(WaxsError::Validation(format!(
                "matrix column length {} does not match x axis length {}",
                y.len(),
                self.x.len()
            )));
        }
        self.columns.push(y);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.x.len()
    }

    pub fn n_frames(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// 第 i 行：x 后接每帧的 y
    pub fn row(&self, i: usize) -> Vec<f64> {
        std::iter::once(self.x[i])
            .chain(self.columns.iter().map(|c| c[i]))
            .collect()
    }

    /// 所有 y 的最小/最大值（忽略非有限值）
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.columns
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_index() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(nearest_index(&xs, 1.4), Some(1));
        assert_eq!(nearest_index(&xs, 1.6), Some(2));
        assert_eq!(nearest_index(&xs, -5.0), Some(0));
        assert_eq!(nearest_index(&[], 1.0), None);
    }

    #[test]
    fn test_matrix_rejects_mismatched_column() {
        let mut matrix = ProfileMatrix::new(vec![0.0, 1.0, 2.0]);
        matrix.push_column(vec![1.0, 2.0, 3.0]).unwrap();
        assert!(matrix.push_column(vec![1.0]).is_err());
        assert_eq!(matrix.row(1), vec![1.0, 2.0]);
        assert_eq!(matrix.value_range(), Some((1.0, 3.0)));
    }
}
