//! # 交互式背底选点状态机
//!
//! 与绘图界面解耦的背底选择流程，由离散命令驱动：
//!
//! ```text
//! Idle ──start──▶ AnchorSelection ──Add/Remove──▶ Fitting ──Commit──▶ Committed
//!                        │                          │
//!                        └────────Cancel────────────┴──────▶ Cancelled
//! ```
//!
//! - 开始时默认锚点为首尾两个样本
//! - 每次锚点集合变化都重新拟合；不足 3 个锚点时没有基线
//! - 删除锚点：取 x 最近的锚点，距离超过阈值或只剩 2 个锚点时忽略
//!
//! ## 依赖关系
//! - 被 `commands/batch.rs` 的交互式参考帧选点使用
//! - 使用 `waxs/background.rs`

use crate::error::{Result, WaxsError};
use crate::models::profile::nearest_index;
use crate::waxs::background::{self, BackgroundPoints, BaselineCurve, BaselineTemplate};

use std::fmt;

/// 删除锚点的默认距离阈值
pub const DEFAULT_REMOVE_THRESHOLD: f64 = 20.0;

/// 不允许删除到少于该数量
const PROTECTED_ANCHORS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AnchorSelection,
    Fitting,
    Committed,
    Cancelled,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::AnchorSelection => "anchor selection",
            SessionState::Fitting => "fitting",
            SessionState::Committed => "committed",
            SessionState::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionCommand {
    AddAnchor(f64),
    RemoveAnchor(f64),
    Commit,
    Cancel,
}

/// 命令执行结果
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Added((f64, f64)),
    Removed((f64, f64)),
    /// 命令合法但未改变锚点
    Ignored(String),
    Committed,
    Cancelled,
}

/// 背底选点会话
#[derive(Debug, Clone)]
pub struct BackgroundSession {
    x: Vec<f64>,
    y: Vec<f64>,
    anchors: Vec<(f64, f64)>,
    baseline: Option<BaselineCurve>,
    state: SessionState,
    remove_threshold: f64,
}

impl BackgroundSession {
    /// 创建会话，可选裁剪窗口
    pub fn new(x: &[f64], y: &[f64], window: Option<(f64, f64)>) -> Result<Self> {
        let (x, y) = background::crop(x, y, window)?;
        if x.is_empty() {
            return Err(WaxsError::Validation(
                "background selection needs a non-empty curve".to_string(),
            ));
        }
        Ok(Self {
            x,
            y,
            anchors: Vec::new(),
            baseline: None,
            state: SessionState::Idle,
            remove_threshold: DEFAULT_REMOVE_THRESHOLD,
        })
    }

    pub fn with_remove_threshold(self, remove_threshold: f64) -> Self {
        Self {
            remove_threshold,
            ..self
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// 当前锚点（按 x 排序）
    pub fn anchors(&self) -> &[(f64, f64)] {
        &self.anchors
    }

    pub fn baseline(&self) -> Option<&BaselineCurve> {
        self.baseline.as_ref()
    }

    /// 进入选点状态，放置首尾默认锚点
    pub fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(WaxsError::Validation(format!(
                "cannot start a background session in state '{}'",
                self.state
            )));
        }
        let n = self.x.len();
        self.anchors = vec![(self.x[0], self.y[0])];
        if n > 1 {
            self.anchors.push((self.x[n - 1], self.y[n - 1]));
        }
        self.state = SessionState::AnchorSelection;
        self.refit();
        Ok(())
    }

    /// 执行一条命令
    pub fn apply(&mut self, command: SessionCommand) -> Result<CommandOutcome> {
        if !matches!(
            self.state,
            SessionState::AnchorSelection | SessionState::Fitting
        ) {
            return Err(WaxsError::Validation(format!(
                "background session is not accepting commands (state '{}')",
                self.state
            )));
        }

        match command {
            SessionCommand::AddAnchor(x) => self.add_anchor(x),
            SessionCommand::RemoveAnchor(x) => Ok(self.remove_anchor(x)),
            SessionCommand::Commit => {
                if self.baseline.is_none() {
                    return Err(WaxsError::Validation(format!(
                        "cannot commit: at least {} anchors with distinct x are required",
                        background::MIN_ANCHORS
                    )));
                }
                self.state = SessionState::Committed;
                Ok(CommandOutcome::Committed)
            }
            SessionCommand::Cancel => {
                self.state = SessionState::Cancelled;
                self.baseline = None;
                Ok(CommandOutcome::Cancelled)
            }
        }
    }

    /// 已提交时返回可复用的锚点模板
    pub fn template(&self) -> Option<BaselineTemplate> {
        if self.state != SessionState::Committed {
            return None;
        }
        Some(BaselineTemplate::new(
            self.anchors.iter().map(|p| p.0).collect(),
        ))
    }

    /// 当前基线扣除后的曲线
    pub fn corrected(&self) -> Option<Result<Vec<f64>>> {
        self.baseline
            .as_ref()
            .map(|b| background::subtract(&self.x, &self.y, b).map(|(_, y)| y))
    }

    fn add_anchor(&mut self, x: f64) -> Result<CommandOutcome> {
        let idx = nearest_index(&self.x, x)
            .ok_or_else(|| WaxsError::Validation("curve has no samples".to_string()))?;
        let point = (self.x[idx], self.y[idx]);

        if self.anchors.contains(&point) {
            return Ok(CommandOutcome::Ignored(format!(
                "anchor at x = {} already selected",
                point.0
            )));
        }

        self.anchors.push(point);
        self.anchors.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.refit();
        Ok(CommandOutcome::Added(point))
    }

    fn remove_anchor(&mut self, x: f64) -> CommandOutcome {
        if self.anchors.len() <= PROTECTED_ANCHORS {
            return CommandOutcome::Ignored("cannot remove the initial anchors".to_string());
        }

        let anchor_x: Vec<f64> = self.anchors.iter().map(|p| p.0).collect();
        let (Some(anchor_idx), Some(sample_idx)) =
            (nearest_index(&anchor_x, x), nearest_index(&self.x, x))
        else {
            return CommandOutcome::Ignored("no anchors".to_string());
        };

        let nearest = self.anchors[anchor_idx];
        let distance = (x - nearest.0).hypot(self.y[sample_idx] - nearest.1);
        if distance > self.remove_threshold {
            return CommandOutcome::Ignored(format!(
                "no anchor within {} of x = {}",
                self.remove_threshold, x
            ));
        }

        self.anchors.remove(anchor_idx);
        self.refit();
        CommandOutcome::Removed(nearest)
    }

    fn refit(&mut self) {
        if self.state == SessionState::AnchorSelection && self.anchors.len() > PROTECTED_ANCHORS {
            self.state = SessionState::Fitting;
        }

        self.baseline = BackgroundPoints::new(self.anchors.clone())
            .and_then(|points| background::fit(&self.x, &self.y, &points))
            .map_err(|e| log::debug!("background not fitted yet: {}", e))
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn session() -> BackgroundSession {
        let x: Vec<f64> = (0..21).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        BackgroundSession::new(&x, &y, None).unwrap()
    }

    #[test]
    fn test_start_places_default_anchors() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Idle);
        s.start().unwrap();
        assert_eq!(s.state(), SessionState::AnchorSelection);
        assert_eq!(s.anchors(), &[(0.0, 1.0), (20.0, 41.0)]);
        assert!(s.baseline().is_none());
        assert!(s.start().is_err());
    }

    #[test]
    fn test_add_anchor_snaps_and_fits() {
        let mut s = session();
        s.start().unwrap();
        let outcome = s.apply(SessionCommand::AddAnchor(9.7)).unwrap();
        assert_eq!(outcome, CommandOutcome::Added((10.0, 21.0)));
        assert_eq!(s.state(), SessionState::Fitting);

        let baseline = s.baseline().unwrap();
        assert_abs_diff_eq!(baseline.evaluate(5.0), 11.0, epsilon = 1e-9);

        let corrected = s.corrected().unwrap().unwrap();
        assert!(corrected.iter().all(|v| v.abs() < 1e-9));

        let again = s.apply(SessionCommand::AddAnchor(10.2)).unwrap();
        assert!(matches!(again, CommandOutcome::Ignored(_)));
    }

    #[test]
    fn test_remove_anchor_rules() {
        let mut s = session();
        s.start().unwrap();
        assert!(matches!(
            s.apply(SessionCommand::RemoveAnchor(0.0)).unwrap(),
            CommandOutcome::Ignored(_)
        ));

        s.apply(SessionCommand::AddAnchor(10.0)).unwrap();
        s.apply(SessionCommand::AddAnchor(15.0)).unwrap();
        assert_eq!(s.anchors().len(), 4);

        let removed = s.apply(SessionCommand::RemoveAnchor(14.6)).unwrap();
        assert_eq!(removed, CommandOutcome::Removed((15.0, 31.0)));
        assert_eq!(s.anchors().len(), 3);
        assert!(s.baseline().is_some());
    }

    #[test]
    fn test_remove_respects_threshold() {
        let mut s = session().with_remove_threshold(0.5);
        s.start().unwrap();
        s.apply(SessionCommand::AddAnchor(10.0)).unwrap();
        // 最近样本 y 与锚点 y 相差 2，超过阈值
        let outcome = s.apply(SessionCommand::RemoveAnchor(11.0)).unwrap();
        assert!(matches!(outcome, CommandOutcome::Ignored(_)));
        assert_eq!(s.anchors().len(), 3);
    }

    #[test]
    fn test_commit_requires_fit() {
        let mut s = session();
        s.start().unwrap();
        assert!(s.apply(SessionCommand::Commit).unwrap_err().is_validation());

        s.apply(SessionCommand::AddAnchor(5.0)).unwrap();
        assert_eq!(
            s.apply(SessionCommand::Commit).unwrap(),
            CommandOutcome::Committed
        );
        assert_eq!(s.state(), SessionState::Committed);
        assert_eq!(s.template().unwrap().anchor_x, vec![0.0, 5.0, 20.0]);
        assert!(s.apply(SessionCommand::AddAnchor(3.0)).is_err());
    }

    #[test]
    fn test_cancel_discards_baseline() {
        let mut s = session();
        s.start().unwrap();
        s.apply(SessionCommand::AddAnchor(5.0)).unwrap();
        s.apply(SessionCommand::Cancel).unwrap();
        assert_eq!(s.state(), SessionState::Cancelled);
        assert!(s.baseline().is_none());
        assert!(s.template().is_none());
    }

    #[test]
    fn test_window_crops_curve() {
        let x: Vec<f64> = (0..21).map(|i| i as f64).collect();
        let y = x.clone();
        let mut s = BackgroundSession::new(&x, &y, Some((5.0, 15.0))).unwrap();
        s.start().unwrap();
        assert_eq!(s.anchors(), &[(5.0, 5.0), (15.0, 15.0)]);
    }
}
