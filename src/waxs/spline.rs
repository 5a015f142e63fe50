//! # 二次插值 B 样条
//!
//! 通过全部节点的二次 (k = 2) B 样条。节点向量取
//!
//! ```text
//! t = [x0, x0, x0, m1, ..., m(n-3), xn, xn, xn],  m_i = (x_i + x_(i+1)) / 2
//! ```
//!
//! 即相邻点中点去掉首尾两个，系数个数等于数据点个数。
//! 系数由配置矩阵 B_j(x_i) c_j = y_i 经 LU 分解求得。
//! 区间外求值按首尾多项式段外推。
//!
//! ## 依赖关系
//! - 被 `waxs/background.rs` 使用
//! - 使用 `nalgebra` 求解线性方程组

use crate::error::{Result, WaxsError};

use nalgebra::{DMatrix, DVector};

const DEGREE: usize = 2;

/// 二次插值样条
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticSpline {
    knots: Vec<f64>,
    coeffs: Vec<f64>,
}

impl QuadraticSpline {
    /// 构造通过 (x, y) 全部点的样条
    ///
    /// x 必须严格递增且至少 3 个点。
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(WaxsError::Validation(format!(
                "spline x/y length mismatch: {} vs {}",
                x.len(),
                y.len()
            )));
        }
        let n = x.len();
        if n < DEGREE + 1 {
            return Err(WaxsError::Validation(format!(
                "a quadratic spline needs at least {} points (got {})",
                DEGREE + 1,
                n
            )));
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(WaxsError::Validation(
                "spline points must be finite".to_string(),
            ));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(WaxsError::Validation(
                "spline x values must be strictly increasing".to_string(),
            ));
        }

        let knots = knot_vector(x);
        let collocation = DMatrix::from_fn(n, n, |i, j| {
            let (span, basis) = basis_functions(&knots, n, x[i]);
            if j + DEGREE >= span && j <= span {
                basis[j + DEGREE - span]
            } else {
                0.0
            }
        });

        let coeffs = collocation
            .lu()
            .solve(&DVector::from_column_slice(y))
            .ok_or_else(|| {
                WaxsError::Computation("spline collocation matrix is singular".to_string())
            })?;

        Ok(Self {
            knots,
            coeffs: coeffs.iter().copied().collect(),
        })
    }

    /// 在 x 处求值
    pub fn evaluate(&self, x: f64) -> f64 {
        let (span, basis) = basis_functions(&self.knots, self.coeffs.len(), x);
        basis
            .iter()
            .enumerate()
            .map(|(j, b)| self.coeffs[span - DEGREE + j] * b)
            .sum()
    }

    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }
}

/// 闭区间上的 n 个等距点
pub fn linspace((lo, hi): (f64, f64), n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { hi } else { lo + i as f64 * step })
                .collect()
        }
    }
}

fn knot_vector(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let first = x[0];
    let last = x[n - 1];
    let mut knots = vec![first; DEGREE + 1];
    let midpoints: Vec<f64> = x.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    knots.extend_from_slice(&midpoints[1..midpoints.len() - 1]);
    knots.extend(std::iter::repeat(last).take(DEGREE + 1));
    knots
}

/// 返回 (span, 非零基函数)，span 满足 t[span] <= x < t[span+1]
///
/// span 限制在 [k, n-1]，区间外的 x 使用首尾段外推。
fn basis_functions(knots: &[f64], n_coeffs: usize, x: f64) -> (usize, [f64; DEGREE + 1]) {
    let span = knots
        .partition_point(|&t| t <= x)
        .saturating_sub(1)
        .clamp(DEGREE, n_coeffs - 1);

    let mut basis = [0.0; DEGREE + 1];
    let mut left = [0.0; DEGREE + 1];
    let mut right = [0.0; DEGREE + 1];
    basis[0] = 1.0;

    for j in 1..=DEGREE {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = basis[r] / (right[r + 1] + left[j - r]);
            basis[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        basis[j] = saved;
    }

    (span, basis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_knot_vector_layout() {
        let knots = knot_vector(&[0.0, 1.0, 2.0, 4.0, 6.0]);
        assert_eq!(knots, vec![0.0, 0.0, 0.0, 1.5, 3.0, 6.0, 6.0, 6.0]);
    }

    #[test]
    fn test_reproduces_quadratic_exactly() {
        let f = |x: f64| 2.0 * x * x - 3.0 * x + 1.0;
        let x = vec![0.0, 0.7, 1.5, 3.0, 3.2, 5.0];
        let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
        let spline = QuadraticSpline::new(&x, &y).unwrap();

        for at in [0.0, 0.3, 1.1, 2.5, 4.4, 5.0, -1.0, 6.0] {
            assert_abs_diff_eq!(spline.evaluate(at), f(at), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_interpolates_anchor_points() {
        let x = vec![1.0, 2.0, 4.0, 5.5, 7.0, 9.0, 10.0];
        let y = vec![3.0, -1.0, 2.5, 8.0, 0.0, 1.0, 4.0];
        let spline = QuadraticSpline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert_abs_diff_eq!(spline.evaluate(*xi), *yi, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_three_points_is_single_parabola() {
        let spline = QuadraticSpline::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
        assert_abs_diff_eq!(spline.evaluate(1.5), 2.25, epsilon = 1e-12);
        let xs = linspace((0.0, 2.0), 5);
        let ys = spline.evaluate_many(&xs);
        assert_eq!(xs, vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_abs_diff_eq!(ys[1], 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(QuadraticSpline::new(&[0.0, 1.0], &[0.0, 1.0]).is_err());
        assert!(QuadraticSpline::new(&[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
        assert!(QuadraticSpline::new(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]).is_err());
    }
}
