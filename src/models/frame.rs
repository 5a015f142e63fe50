//! # 探测器图像数据模型
//!
//! `Frame` 保存一次读取的原始强度数据，加载后不可变；
//! 所有截断、翻转、掩膜操作都产生新的数组。
//!
//! ## 依赖关系
//! - 被 `parsers/frame.rs` 创建
//! - 被 `waxs/` 各模块读取

use ndarray::Array2;
use std::path::{Path, PathBuf};

/// 原始探测器图像
#[derive(Debug, Clone)]
pub struct Frame {
    /// 强度数据，形状 (height, width)，行对应 y，列对应 x
    data: Array2<f64>,
    /// 来源文件
    source: Option<PathBuf>,
    /// 原始位深
    bit_depth: u8,
}

impl Frame {
    /// 从内存数组创建（合成数据、测试）
    pub fn new(data: Array2<f64>) -> Self {
        Self {
            data,
            source: None,
            bit_depth: 64,
        }
    }

    /// 从文件读取结果创建
    pub fn from_file(data: Array2<f64>, source: &Path, bit_depth: u8) -> Self {
        Self {
            data,
            source: Some(source.to_path_buf()),
            bit_depth,
        }
    }

    /// 创建常数图像
    pub fn filled(height: usize, width: usize, value: f64) -> Self {
        Self::new(Array2::from_elem((height, width), value))
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// (height, width)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    /// 文件名（不含扩展名），用于输出命名
    pub fn stem(&self) -> String {
        self.source
            .as_ref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or("frame")
            .to_string()
    }

    /// 以新数据派生一个保留来源信息的图像
    pub fn derive(&self, data: Array2<f64>) -> Self {
        Self {
            data,
            source: self.source.clone(),
            bit_depth: self.bit_depth,
        }
    }
}

/// 归一化后的 8 位显示图像
#[derive(Debug, Clone)]
pub struct DisplayImage {
    /// 0-255 灰度，被掩膜的像素为 0
    pub pixels: Array2<u8>,
    /// 被掩膜（阈值区间外）的像素
    pub mask: Array2<bool>,
}

impl DisplayImage {
    pub fn shape(&self) -> (usize, usize) {
        self.pixels.dim()
    }
}
