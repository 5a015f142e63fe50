//! # WAXS/GIWAXS 数据处理核心
//!
//! 探测器图像从读取到一维曲线的全部数值计算。
//!
//! ## 子模块
//! - `normalize`: 截断、掩膜、8 位归一化、翻转
//! - `reciprocal`: 像素坐标到 (Qr, Qz) 的变换
//! - `integrate`: 扇形区域径向/角向积分
//! - `spline`: 二次插值 B 样条
//! - `background`: 背底拟合与扣除
//! - `session`: 交互式背底选点状态机
//! - `colormap`: 颜色映射
//! - `plot`: 图表生成
//! - `export`: 数据导出
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/` 数据模型

pub mod background;
pub mod colormap;
pub mod export;
pub mod integrate;
pub mod normalize;
pub mod plot;
pub mod reciprocal;
pub mod session;
pub mod spline;

pub use background::{BackgroundPoints, BaselineCurve, BaselineTemplate};
pub use integrate::{Integration, Normalization, ProfileSelection, SectorIntegrator};
pub use reciprocal::{to_reciprocal_space, ReciprocalMap};
pub use session::{BackgroundSession, CommandOutcome, SessionCommand, SessionState};
