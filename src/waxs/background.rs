//! # 样条背底拟合与扣除
//!
//! 用户（或默认）选取若干背底锚点，用二次插值样条拟合平滑基线并从曲线中扣除。
//!
//! ## 功能
//! - `BackgroundPoints`: 按 x 排序、x 唯一、至少 3 个点的锚点集合
//! - `fit` / `subtract`: 拟合基线并扣除
//! - `crop`: 可选的 [xmin, xmax] 裁剪窗口
//! - `BaselineTemplate`: 批量处理时复用参考帧的锚点 x，逐帧重新取 y 并拟合
//!
//! ## 依赖关系
//! - 被 `waxs/session.rs`、`commands/batch.rs` 使用
//! - 使用 `waxs/spline.rs`

use crate::error::{Result, WaxsError};
use crate::models::profile::nearest_index;
use crate::waxs::spline::{linspace, QuadraticSpline};

/// 拟合所需的最少锚点数
pub const MIN_ANCHORS: usize = 3;

/// 背底锚点集合
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundPoints {
    points: Vec<(f64, f64)>,
}

impl BackgroundPoints {
    /// 排序并校验：x 不可重复，至少 3 个点
    pub fn new(mut points: Vec<(f64, f64)>) -> Result<Self> {
        if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(WaxsError::Validation(
                "background anchors must be finite".to_string(),
            ));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        if let Some(w) = points.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(WaxsError::Validation(format!(
                "duplicate background anchor at x = {}",
                w[0].0
            )));
        }
        if points.len() < MIN_ANCHORS {
            return Err(WaxsError::Validation(format!(
                "at least {} background anchors are required (got {})",
                MIN_ANCHORS,
                points.len()
            )));
        }
        Ok(Self { points })
    }

    /// 由锚点 x 与曲线构造，y 取最近样本的值
    pub fn from_anchor_x(x: &[f64], y: &[f64], anchor_x: &[f64]) -> Result<Self> {
        check_lengths(x, y)?;
        let points = anchor_x
            .iter()
            .map(|&ax| {
                nearest_index(x, ax)
                    .map(|i| (ax, y[i]))
                    .ok_or_else(|| WaxsError::Validation("curve has no samples".to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(points)
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.0).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.1).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// 拟合得到的基线
#[derive(Debug, Clone)]
pub struct BaselineCurve {
    spline: QuadraticSpline,
    /// 在 [x_first, x_last] 上与原曲线等点数的均匀采样（用于显示和导出）
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl BaselineCurve {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.spline.evaluate(x)
    }

    pub fn spline(&self) -> &QuadraticSpline {
        &self.spline
    }
}

/// 对锚点拟合基线
pub fn fit(x: &[f64], y: &[f64], anchors: &BackgroundPoints) -> Result<BaselineCurve> {
    check_lengths(x, y)?;
    let (first, last) = match (x.first(), x.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => {
            return Err(WaxsError::Validation(
                "cannot fit a baseline to an empty curve".to_string(),
            ))
        }
    };

    let spline = QuadraticSpline::new(&anchors.xs(), &anchors.ys())?;
    let grid = linspace((first, last), x.len());
    let values = spline.evaluate_many(&grid);

    log::debug!(
        "fitted background through {} anchors over [{}, {}]",
        anchors.len(),
        first,
        last
    );

    Ok(BaselineCurve {
        spline,
        x: grid,
        y: values,
    })
}

/// 扣除基线，基线在给定 x 处求值
pub fn subtract(x: &[f64], y: &[f64], baseline: &BaselineCurve) -> Result<(Vec<f64>, Vec<f64>)> {
    check_lengths(x, y)?;
    let corrected = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| yi - baseline.evaluate(xi))
        .collect();
    Ok((x.to_vec(), corrected))
}

/// 裁剪到 [xmin, xmax]
///
/// `None` 表示不裁剪；窗口必须满足 xmin < xmax 且与数据范围有交集。
pub fn crop(x: &[f64], y: &[f64], window: Option<(f64, f64)>) -> Result<(Vec<f64>, Vec<f64>)> {
    check_lengths(x, y)?;
    let Some((xmin, xmax)) = window else {
        return Ok((x.to_vec(), y.to_vec()));
    };

    let data_min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let data_max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(xmin < xmax) || xmin > data_max || xmax < data_min {
        return Err(WaxsError::InvalidRange(format!(
            "window [{}, {}] does not overlap data range [{}, {}]",
            xmin, xmax, data_min, data_max
        )));
    }

    Ok(x.iter()
        .zip(y)
        .filter(|&(&xi, _)| xi >= xmin && xi <= xmax)
        .map(|(&xi, &yi)| (xi, yi))
        .unzip())
}

/// 批量复用的背底模板：只保存锚点 x
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineTemplate {
    pub anchor_x: Vec<f64>,
}

impl BaselineTemplate {
    pub fn new(anchor_x: Vec<f64>) -> Self {
        Self { anchor_x }
    }

    pub fn from_points(points: &BackgroundPoints) -> Self {
        Self::new(points.xs())
    }

    /// 对一帧曲线重新取锚点 y、拟合并扣除，返回扣除后的 y
    pub fn apply(&self, x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
        let anchors = BackgroundPoints::from_anchor_x(x, y, &self.anchor_x)?;
        let baseline = fit(x, y, &anchors)?;
        let (_, corrected) = subtract(x, y, &baseline)?;
        Ok(corrected)
    }
}

fn check_lengths(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(WaxsError::Validation(format!(
            "curve x/y length mismatch: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn curve() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let y = x
            .iter()
            .map(|&v| 10.0 - v + 5.0 * (-(v - 2.5) * (v - 2.5) / 0.05).exp())
            .collect();
        (x, y)
    }

    #[test]
    fn test_residual_is_zero_at_anchors() {
        let (x, y) = curve();
        let anchors = BackgroundPoints::new(
            [0usize, 10, 40, 49]
                .iter()
                .map(|&i| (x[i], y[i]))
                .collect(),
        )
        .unwrap();
        let baseline = fit(&x, &y, &anchors).unwrap();
        let (_, corrected) = subtract(&x, &y, &baseline).unwrap();

        for i in [0usize, 10, 40, 49] {
            assert_abs_diff_eq!(corrected[i], 0.0, epsilon = 1e-9);
        }
        assert_eq!(baseline.x.len(), x.len());
        assert_abs_diff_eq!(baseline.x[0], x[0]);
        assert_abs_diff_eq!(baseline.x[49], x[49]);
        // 峰在扣除后仍然保留
        assert!(corrected[25] > 4.0);
    }

    #[test]
    fn test_duplicate_x_rejected() {
        let err = BackgroundPoints::new(vec![(0.0, 1.0), (1.0, 2.0), (1.0, 3.0), (2.0, 1.0)])
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_too_few_anchors_rejected() {
        let err = BackgroundPoints::new(vec![(0.0, 1.0), (1.0, 2.0)]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_anchors_sorted() {
        let points = BackgroundPoints::new(vec![(3.0, 0.0), (1.0, 0.0), (2.0, 0.0)]).unwrap();
        assert_eq!(points.xs(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_template_reapplies_to_new_frame() {
        let (x, y) = curve();
        let template = BaselineTemplate::new(vec![0.0, 1.0, 4.0, 4.9]);
        let shifted: Vec<f64> = y.iter().map(|v| v + 3.0).collect();

        let a = template.apply(&x, &y).unwrap();
        let b = template.apply(&x, &shifted).unwrap();
        for (va, vb) in a.iter().zip(&b) {
            assert_abs_diff_eq!(va, vb, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_crop_window() {
        let (x, y) = curve();
        let (cx, cy) = crop(&x, &y, Some((1.0, 2.0))).unwrap();
        assert!(cx.iter().all(|&v| (1.0..=2.0).contains(&v)));
        assert_eq!(cx.len(), cy.len());

        assert!(crop(&x, &y, Some((2.0, 1.0))).is_err());
        assert!(crop(&x, &y, Some((10.0, 20.0))).is_err());
        assert_eq!(crop(&x, &y, None).unwrap().0.len(), x.len());
    }
}
