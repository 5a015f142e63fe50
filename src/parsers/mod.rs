//! # 解析器模块
//!
//! 提供探测器图像读取和文本曲线/矩阵解析。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: frame, profile

pub mod frame;
pub mod profile;

pub use frame::load_frame;
pub use profile::{parse_matrix_file, parse_profile_file};
