//! # 统一错误处理模块
//!
//! 定义 waxskit 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - I/O 错误：文件不可读、不存在、格式无法解码
//! - 校验错误：参数非法、区间反向、背底锚点重复或不足
//! - 计算错误：几何退化（如样品-探测器距离为零）
//! - 取消：批量处理被用户中止
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// waxskit 统一错误类型
#[derive(Error, Debug)]
pub enum WaxsError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to decode image '{path}': {reason}")]
    ImageDecodeError { path: String, reason: String },

    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 校验错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid parameter: {0}")]
    Validation(String),

    #[error("Invalid range format: {0}")]
    InvalidRange(String),

    // ─────────────────────────────────────────────────────────────
    // 计算错误
    // ─────────────────────────────────────────────────────────────
    #[error("Computation failed: {0}")]
    Computation(String),

    #[error("Rendering failed: {0}")]
    RenderError(String),

    // ─────────────────────────────────────────────────────────────
    // CSV / JSON 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Settings error: {0}")]
    SettingsError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("Processing cancelled by user")]
    Cancelled,
}

impl WaxsError {
    /// 是否属于 I/O 类错误
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            WaxsError::FileReadError { .. }
                | WaxsError::FileWriteError { .. }
                | WaxsError::DirectoryNotFound { .. }
                | WaxsError::FileNotFound { .. }
                | WaxsError::ImageDecodeError { .. }
                | WaxsError::ParseError { .. }
                | WaxsError::CsvError(_)
        )
    }

    /// 是否属于校验类错误
    pub fn is_validation(&self) -> bool {
        matches!(self, WaxsError::Validation(_) | WaxsError::InvalidRange(_))
    }

    /// 是否属于计算类错误
    pub fn is_computation(&self) -> bool {
        matches!(self, WaxsError::Computation(_) | WaxsError::RenderError(_))
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, WaxsError>;
