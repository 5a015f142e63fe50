//! # heatmap 命令实现
//!
//! 原位热图：横轴为曲线 x，纵轴为帧序号，颜色为强度。
//!
//! ## 输入
//! - 批量处理写出的矩阵文件（`1D/output.txt` 等）
//! - 或一个目录，其中每个两列曲线文件为一帧（按文件名排序，跳过矩阵文件）
//!
//! ## 依赖关系
//! - 使用 `cli/heatmap.rs` 定义的参数
//! - 使用 `parsers/profile.rs`, `waxs/plot.rs`

use super::batch::{RAW_MATRIX_FILE, SUBTRACTED_MATRIX_FILE};
use super::sibling_path;
use crate::batch::FileCollector;
use crate::cli::heatmap::HeatmapArgs;
use crate::error::{Result, WaxsError};
use crate::models::ProfileMatrix;
use crate::parsers;
use crate::utils::output;
use crate::waxs::plot::{self, PlotOptions};

use std::path::{Path, PathBuf};

/// 不同帧 x 轴允许的最大偏差
const X_TOLERANCE: f64 = 1e-6;

/// 执行 heatmap 命令
pub fn execute(args: HeatmapArgs) -> Result<()> {
    let matrix = if args.input.is_dir() {
        let files: Vec<PathBuf> = FileCollector::new(args.input.clone())
            .with_pattern(&args.pattern)
            .collect()?
            .into_iter()
            .filter(|f| !is_matrix_file(f))
            .collect();
        output::print_info(&format!("Stacking {} profile files", files.len()));
        stack_profiles(&files)?
    } else {
        parsers::parse_matrix_file(&args.input)?
    };

    output::print_info(&format!(
        "{} frames x {} points",
        matrix.n_frames(),
        matrix.n_rows()
    ));

    let output_path = args.output.clone().unwrap_or_else(|| default_output(&args.input));
    let options = PlotOptions {
        width: args.width,
        height: args.height,
        log_y: false,
    };
    let axis = super::profile_selection(args.axis, false).axis();
    plot::plot_heatmap(&matrix, axis.label(), &output_path, &options)?;

    output::print_written("heatmap", &output_path);
    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.join("heatmap.jpg")
    } else {
        sibling_path(input, "_heatmap.jpg")
    }
}

/// batch 写出的矩阵文件不参与逐帧拼接
fn is_matrix_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n == RAW_MATRIX_FILE || n == SUBTRACTED_MATRIX_FILE)
}

/// 将多条两列曲线按顺序拼成矩阵，x 轴必须一致
fn stack_profiles(files: &[PathBuf]) -> Result<ProfileMatrix> {
    let mut matrix: Option<ProfileMatrix> = None;

    for file in files {
        let (x, y) = parsers::parse_profile_file(file)?;
        let m = matrix.get_or_insert_with(|| ProfileMatrix::new(x.clone()));
        let same_axis = m.x.len() == x.len()
            && m
                .x
                .iter()
                .zip(&x)
                .all(|(a, b)| (a - b).abs() <= X_TOLERANCE || (a.is_nan() && b.is_nan()));
        if !same_axis {
            return Err(WaxsError::Validation(format!(
                "{} does not share the x axis of the first profile",
                file.display()
            )));
        }
        m.push_column(y)?;
    }

    matrix.ok_or_else(|| WaxsError::Validation("no profile files to stack".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_stack_profiles_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "0.1\t1\n0.2\t2\n").unwrap();
        fs::write(&b, "0.1\t3\n0.2\t4\n").unwrap();

        let matrix = stack_profiles(&[a, b]).unwrap();
        assert_eq!(matrix.x, vec![0.1, 0.2]);
        assert_eq!(matrix.columns, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_stack_profiles_rejects_other_axis() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "0.1\t1\n0.2\t2\n").unwrap();
        fs::write(&b, "0.1\t3\n0.3\t4\n").unwrap();

        assert!(stack_profiles(&[a, b]).unwrap_err().is_validation());
        assert!(stack_profiles(&[]).is_err());
    }

    #[test]
    fn test_matrix_files_are_skipped() {
        assert!(is_matrix_file(Path::new("/run/1D/output.txt")));
        assert!(is_matrix_file(Path::new("output_subBk.txt")));
        assert!(!is_matrix_file(Path::new("/run/1D/frame_01.txt")));
    }

    #[test]
    fn test_default_output_names() {
        assert_eq!(
            default_output(Path::new("/run/1D/output.txt")),
            PathBuf::from("/run/1D/output_heatmap.jpg")
        );
    }
}
