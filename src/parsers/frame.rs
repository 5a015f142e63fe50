//! # 探测器图像读取
//!
//! 使用 `image` 库读取单帧栅格图像（TIFF/PNG 等），保留原始位深。
//!
//! ## 支持的像素格式
//! - 8 位 / 16 位灰度：无损读取
//! - 32 位浮点：按 luma 转换
//! - 带 alpha 的灰度：只取强度通道
//! - 彩色图像：转换为 16 位 luma
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/frame.rs`

use crate::error::{Result, WaxsError};
use crate::models::Frame;

use image::{DynamicImage, ImageError};
use ndarray::Array2;
use std::path::Path;

/// 读取探测器图像
pub fn load_frame(path: &Path) -> Result<Frame> {
    if !path.is_file() {
        return Err(WaxsError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let image = image::open(path).map_err(|e| match e {
        ImageError::IoError(source) => WaxsError::FileReadError {
            path: path.display().to_string(),
            source,
        },
        other => WaxsError::ImageDecodeError {
            path: path.display().to_string(),
            reason: other.to_string(),
        },
    })?;

    let (data, bit_depth) = to_intensity(image).map_err(|reason| WaxsError::ImageDecodeError {
        path: path.display().to_string(),
        reason,
    })?;

    log::debug!(
        "loaded {} ({}x{}, {}-bit)",
        path.display(),
        data.ncols(),
        data.nrows(),
        bit_depth
    );

    Ok(Frame::from_file(data, path, bit_depth))
}

/// 将解码后的图像转换为强度数组和位深
fn to_intensity(image: DynamicImage) -> std::result::Result<(Array2<f64>, u8), String> {
    let (width, height) = (image.width() as usize, image.height() as usize);

    let (values, depth): (Vec<f64>, u8) = match image {
        DynamicImage::ImageLuma8(buf) => (buf.into_raw().into_iter().map(f64::from).collect(), 8),
        DynamicImage::ImageLuma16(buf) => {
            (buf.into_raw().into_iter().map(f64::from).collect(), 16)
        }
        DynamicImage::ImageLumaA8(buf) => (
            buf.pixels().map(|p| f64::from(p.0[0])).collect(),
            8,
        ),
        DynamicImage::ImageLumaA16(buf) => (
            buf.pixels().map(|p| f64::from(p.0[0])).collect(),
            16,
        ),
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => (
            image
                .to_luma32f()
                .into_raw()
                .into_iter()
                .map(f64::from)
                .collect(),
            32,
        ),
        other => (
            other
                .to_luma16()
                .into_raw()
                .into_iter()
                .map(f64::from)
                .collect(),
            16,
        ),
    };

    let data = Array2::from_shape_vec((height, width), values).map_err(|e| e.to_string())?;
    Ok((data, depth))
}
