//! # 文件收集器
//!
//! 根据输入目录和 glob 模式收集待处理的探测器图像。
//!
//! ## 功能
//! - 单文件或目录输入
//! - `glob` 模式匹配文件名（逗号分隔多个模式）
//! - 可选递归搜索
//! - 结果按路径排序，决定原位矩阵的列顺序
//!
//! ## 依赖关系
//! - 被 `commands/batch.rs` 调用
//! - 使用 `walkdir` 遍历目录，`glob::Pattern` 匹配

use crate::error::{Result, WaxsError};

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    /// 输入路径
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<String>,
    /// 是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建新的文件收集器
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: vec!["*".to_string()],
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.patterns = pattern
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if self.patterns.is_empty() {
            self.patterns = vec!["*".to_string()];
        }
        self
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的文件（排序后）
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if self.input.is_file() {
            return Ok(vec![self.input.clone()]);
        }
        if !self.input.is_dir() {
            return Err(WaxsError::DirectoryNotFound {
                path: self.input.display().to_string(),
            });
        }

        let patterns = self
            .patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    WaxsError::Validation(format!("invalid file pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| matches_any(&patterns, e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(WaxsError::NoFilesFound {
                pattern: format!("{}/{}", self.input.display(), self.patterns.join(",")),
            });
        }

        log::debug!("collected {} files from {}", files.len(), self.input.display());
        Ok(files)
    }
}

/// 文件名是否匹配任一模式
fn matches_any(patterns: &[Pattern], path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| patterns.iter().any(|p| p.matches(name)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_sorted_matches() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_002.tif", "a_001.tif", "c_003.tif", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let files = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*.tif")
            .collect()
            .unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a_001.tif", "b_002.tif", "c_003.tif"]);
    }

    #[test]
    fn test_multiple_patterns_and_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.tif"), b"").unwrap();
        fs::write(dir.path().join("y.png"), b"").unwrap();

        let files = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*.tif, *.png")
            .collect()
            .unwrap();
        assert_eq!(files.len(), 2);

        let err = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*.edf")
            .collect()
            .unwrap_err();
        assert!(matches!(err, WaxsError::NoFilesFound { .. }));
    }

    #[test]
    fn test_missing_directory() {
        let err = FileCollector::new(PathBuf::from("/nonexistent/frames"))
            .collect()
            .unwrap_err();
        assert!(err.is_io());
    }
}
