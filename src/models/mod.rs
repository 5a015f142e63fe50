//! # 数据模型模块
//!
//! 定义探测器图像、实验几何、掩膜/色标区间、扇区选择和一维曲线的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`waxs/` 和 `commands/` 使用
//! - 子模块: frame, geometry, sector, profile

pub mod frame;
pub mod geometry;
pub mod profile;
pub mod sector;

pub use frame::{DisplayImage, Frame};
pub use geometry::{AxisLimits, ColorRange, Geometry, MaskRange};
pub use profile::{Profile, ProfileAxis, ProfileMatrix};
pub use sector::SectorSelection;
