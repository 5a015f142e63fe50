//! # 批量处理模块
//!
//! 提供原位序列的文件收集与有序并行处理。
//!
//! ## 功能
//! - 收集并排序匹配文件
//! - 并行处理，结果按文件顺序汇总
//! - 协作式取消与首错中止
//!
//! ## 依赖关系
//! - 被 `commands/batch.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchRunner, CancelToken};
