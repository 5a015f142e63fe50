//! # 工具函数模块
//!
//! 提供美化输出、进度条和命令行参数类型。
//!
//! ## 依赖关系
//! - 被 `cli/`、`commands/`、`batch/` 使用
//! - 子模块: output, progress, args

pub mod args;
pub mod output;
pub mod progress;
