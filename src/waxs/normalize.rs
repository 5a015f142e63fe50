//! # 图像截断、掩膜与归一化
//!
//! 将原始探测器强度转换为 8 位显示图像：
//! 1. 按色标区间截断
//! 2. 阈值区间外的像素标记为掩膜
//! 3. 截断后的数据线性拉伸到 0-255
//! 4. 掩膜像素置零
//! 5. 可选上下翻转
//!
//! 所有函数均为纯函数，不修改输入。
//!
//! ## 依赖关系
//! - 被 `commands/render.rs`、`commands/integrate.rs`、`commands/batch.rs` 使用
//! - 使用 `models/frame.rs`、`models/geometry.rs`

use crate::error::{Result, WaxsError};
use crate::models::{ColorRange, DisplayImage, Frame, MaskRange};

use ndarray::{Array2, Axis};

/// 按色标区间截断强度
pub fn clamp(frame: &Frame, color: &ColorRange) -> Frame {
    frame.derive(frame.data().mapv(|v| color.clamp(v)))
}

/// 上下翻转（第一行变为最后一行）
pub fn flip_vertical(frame: &Frame) -> Frame {
    let mut flipped = frame.data().clone();
    flipped.invert_axis(Axis(0));
    frame.derive(flipped.as_standard_layout().to_owned())
}

/// 阈值区间外的像素（true 表示被掩膜）
pub fn intensity_mask(frame: &Frame, mask: &MaskRange) -> Array2<bool> {
    frame.data().mapv(|v| !mask.contains(v))
}

/// 生成 8 位显示图像
pub fn normalize(
    frame: &Frame,
    color: &ColorRange,
    mask: &MaskRange,
    flip: bool,
) -> Result<DisplayImage> {
    let (height, width) = frame.shape();
    if height == 0 || width == 0 {
        return Err(WaxsError::Validation("frame is empty".to_string()));
    }

    let clamped = clamp(frame, color);
    let masked = intensity_mask(frame, mask);

    let (lo, hi) = clamped
        .data()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = hi - lo;

    let mut pixels = Array2::<u8>::zeros((height, width));
    if span > 0.0 {
        ndarray::Zip::from(&mut pixels)
            .and(clamped.data())
            .and(&masked)
            .for_each(|p, &v, &m| {
                if !m {
                    *p = ((v - lo) / span * 255.0).round().clamp(0.0, 255.0) as u8;
                }
            });
    }

    let (pixels, mask) = if flip {
        let mut pixels = pixels;
        let mut mask = masked;
        pixels.invert_axis(Axis(0));
        mask.invert_axis(Axis(0));
        (
            pixels.as_standard_layout().to_owned(),
            mask.as_standard_layout().to_owned(),
        )
    } else {
        (pixels, masked)
    };

    log::debug!(
        "normalized {}x{} frame, clamp [{}, {}], {} masked pixels",
        width,
        height,
        color.min(),
        color.max(),
        mask.iter().filter(|&&m| m).count()
    );

    Ok(DisplayImage { pixels, mask })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_maps_color_range_to_full_scale() {
        let frame = Frame::new(array![[0.0, 400.0], [800.0, 2000.0]]);
        let image = normalize(
            &frame,
            &ColorRange::new(0.0, 800.0).unwrap(),
            &MaskRange::default(),
            false,
        )
        .unwrap();

        assert_eq!(image.pixels[[0, 0]], 0);
        assert_eq!(image.pixels[[0, 1]], 128);
        assert_eq!(image.pixels[[1, 0]], 255);
        assert_eq!(image.pixels[[1, 1]], 255);
    }

    #[test]
    fn test_masked_pixels_are_zero() {
        let frame = Frame::new(array![[100.0, 200.0], [300.0, 5000.0]]);
        let image = normalize(
            &frame,
            &ColorRange::new(0.0, 800.0).unwrap(),
            &MaskRange::new(0.0, 1000.0).unwrap(),
            false,
        )
        .unwrap();

        assert!(image.mask[[1, 1]]);
        assert_eq!(image.pixels[[1, 1]], 0);
        assert!(!image.mask[[0, 0]]);
    }

    #[test]
    fn test_constant_frame_normalizes_to_zero() {
        let frame = Frame::filled(4, 4, 500.0);
        let image = normalize(
            &frame,
            &ColorRange::default(),
            &MaskRange::default(),
            false,
        )
        .unwrap();
        assert!(image.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_flip_reverses_rows() {
        let frame = Frame::new(array![[0.0, 0.0], [800.0, 800.0]]);
        let image = normalize(
            &frame,
            &ColorRange::default(),
            &MaskRange::default(),
            true,
        )
        .unwrap();
        assert_eq!(image.pixels.row(0).to_vec(), vec![255, 255]);
        assert_eq!(image.pixels.row(1).to_vec(), vec![0, 0]);

        let flipped = flip_vertical(&frame);
        assert_eq!(flipped.data()[[0, 0]], 800.0);
    }
}
