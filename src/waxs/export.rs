//! # 积分数据导出
//!
//! ## 支持格式
//! - 曲线: 制表符分隔的两列文本 (x, y)，每行一个点
//! - 原位矩阵: 空格分隔，第一列为共享 x，之后每帧一列，`%.6f` 精度
//!
//! ## 依赖关系
//! - 被 `commands/integrate.rs`、`commands/batch.rs` 调用
//! - 使用 `models/profile.rs` 的 Profile, ProfileMatrix
//! - 使用 `csv` 库写入分隔文本

use crate::error::{Result, WaxsError};
use crate::models::{Profile, ProfileMatrix};

use std::path::Path;

/// 导出单条曲线
pub fn profile_to_txt(profile: &Profile, output_path: &Path) -> Result<()> {
    let mut wtr = writer(output_path, b'\t')?;

    for (x, y) in profile.points() {
        wtr.write_record(&[x.to_string(), y.to_string()])?;
    }

    flush(wtr, output_path)?;
    log::debug!(
        "wrote {} points to {}",
        profile.len(),
        output_path.display()
    );
    Ok(())
}

/// 导出原位批量矩阵
pub fn matrix_to_txt(matrix: &ProfileMatrix, output_path: &Path) -> Result<()> {
    let mut wtr = writer(output_path, b' ')?;

    for i in 0..matrix.n_rows() {
        let record: Vec<String> = matrix.row(i).iter().map(|v| format!("{:.6}", v)).collect();
        wtr.write_record(&record)?;
    }

    flush(wtr, output_path)?;
    log::debug!(
        "wrote {}x{} matrix to {}",
        matrix.n_rows(),
        matrix.n_frames() + 1,
        output_path.display()
    );
    Ok(())
}

fn writer(output_path: &Path, delimiter: u8) -> Result<csv::Writer<std::fs::File>> {
    Ok(csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_path(output_path)?)
}

fn flush(mut wtr: csv::Writer<std::fs::File>, output_path: &Path) -> Result<()> {
    wtr.flush().map_err(|e| WaxsError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })
}
