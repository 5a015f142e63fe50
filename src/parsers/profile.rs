//! # 一维曲线与原位矩阵文本解析
//!
//! 读取本工具导出的文本文件：
//! - 两列曲线文件（制表符或空白分隔，每行一个 (x, y)）
//! - 原位批量矩阵（第一列 x，之后每帧一列）
//!
//! 以 `#` 开头的行和空行被忽略。
//!
//! ## 依赖关系
//! - 被 `commands/heatmap.rs` 使用（导入原位矩阵）
//! - 使用 `models/profile.rs`

use crate::error::{Result, WaxsError};
use crate::models::ProfileMatrix;

use std::fs;
use std::path::Path;

/// 读取两列曲线文件
pub fn parse_profile_file(path: &Path) -> Result<(Vec<f64>, Vec<f64>)> {
    let content = read(path)?;
    parse_profile_content(&content).map_err(|reason| WaxsError::ParseError {
        format: "profile".to_string(),
        path: path.display().to_string(),
        reason,
    })
}

/// 从字符串解析两列曲线
pub fn parse_profile_content(content: &str) -> std::result::Result<(Vec<f64>, Vec<f64>), String> {
    let mut x = Vec::new();
    let mut y = Vec::new();

    for (lineno, values) in numeric_rows(content) {
        let values = values?;
        if values.len() != 2 {
            return Err(format!(
                "line {}: expected 2 columns, found {}",
                lineno,
                values.len()
            ));
        }
        x.push(values[0]);
        y.push(values[1]);
    }

    Ok((x, y))
}

/// 读取原位矩阵文件
pub fn parse_matrix_file(path: &Path) -> Result<ProfileMatrix> {
    let content = read(path)?;
    parse_matrix_content(&content).map_err(|reason| WaxsError::ParseError {
        format: "matrix".to_string(),
        path: path.display().to_string(),
        reason,
    })
}

/// 从字符串解析原位矩阵
pub fn parse_matrix_content(content: &str) -> std::result::Result<ProfileMatrix, String> {
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (lineno, values) in numeric_rows(content) {
        let values = values?;
        if let Some(first) = rows.first() {
            if first.len() != values.len() {
                return Err(format!(
                    "line {}: expected {} columns, found {}",
                    lineno,
                    first.len(),
                    values.len()
                ));
            }
        }
        rows.push(values);
    }

    let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
    if n_cols < 2 {
        return Err("matrix needs an x column and at least one frame column".to_string());
    }

    let mut matrix = ProfileMatrix::new(rows.iter().map(|r| r[0]).collect());
    for col in 1..n_cols {
        matrix
            .push_column(rows.iter().map(|r| r[col]).collect())
            .map_err(|e| e.to_string())?;
    }
    Ok(matrix)
}

fn read(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(WaxsError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    fs::read_to_string(path).map_err(|e| WaxsError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 逐行拆分数值，返回 (行号, 数值列表)
fn numeric_rows(
    content: &str,
) -> impl Iterator<Item = (usize, std::result::Result<Vec<f64>, String>)> + '_ {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(lineno, line)| {
            let values = line
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>()
                        .map_err(|_| format!("line {}: invalid number '{}'", lineno, tok))
                })
                .collect::<std::result::Result<Vec<f64>, String>>();
            (lineno, values)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_tab_and_space() {
        let content = "# q\tintensity\n0.1\t5.0\n0.2 6.5\n\n0.3\t\t7.25\n";
        let (x, y) = parse_profile_content(content).unwrap();
        assert_eq!(x, vec![0.1, 0.2, 0.3]);
        assert_eq!(y, vec![5.0, 6.5, 7.25]);
    }

    #[test]
    fn test_parse_profile_rejects_extra_columns() {
        assert!(parse_profile_content("1 2 3\n").is_err());
        assert!(parse_profile_content("1 abc\n").is_err());
    }

    #[test]
    fn test_parse_matrix() {
        let content = "0.100000 1.000000 2.000000\n0.200000 3.000000 4.000000\n";
        let matrix = parse_matrix_content(content).unwrap();
        assert_eq!(matrix.x, vec![0.1, 0.2]);
        assert_eq!(matrix.n_frames(), 2);
        assert_eq!(matrix.columns[1], vec![2.0, 4.0]);
    }

    #[test]
    fn test_parse_matrix_ragged_rows() {
        assert!(parse_matrix_content("1 2 3\n4 5\n").is_err());
        assert!(parse_matrix_content("1\n2\n").is_err());
    }
}
