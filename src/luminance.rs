//! # 亮度场
//!
//! 把 BGR 像素缓冲区转换为逐像素亮度。计算前清除每个通道的最低位，
//! 因此嵌入前后得到的亮度场完全一致，编码端与解码端选中的区域也一致。

use crate::constants::{LSB_CLEAR_MASK, LUMA_WEIGHTS};
use crate::error::StegError;
use crate::geometry::Geometry;

/// BT.601 亮度：`0.299 R + 0.587 G + 0.114 B`。
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    let [wr, wg, wb] = LUMA_WEIGHTS;
    wr * f64::from(r) + wg * f64::from(g) + wb * f64::from(b)
}

/// 去除行填充、按存储行序排列的亮度值。
#[derive(Debug, Clone, PartialEq)]
pub struct LuminanceField {
    width: usize,
    rows: usize,
    values: Vec<f64>,
}

impl LuminanceField {
    /// 按 `geometry` 描述的布局从像素缓冲区构建亮度场。
    ///
    /// # Errors
    ///
    /// 缓冲区短于 `geometry` 要求时返回 [`StegError::InvalidImage`]，
    /// 无法分配亮度场时返回 [`StegError::AllocationFailure`]。
    pub fn build(pixels: &[u8], geometry: Geometry) -> Result<Self, StegError> {
        if pixels.len() < geometry.buffer_len() {
            return Err(StegError::InvalidImage("pixel buffer is shorter than stride x rows"));
        }

        let (width, rows) = (geometry.width(), geometry.rows());
        let mut values = Vec::new();
        values
            .try_reserve_exact(geometry.pixel_count())
            .map_err(StegError::alloc("luminance field"))?;

        for row in pixels.chunks(geometry.stride()).take(rows) {
            values.extend(row[..width * 3].chunks_exact(3).map(|bgr| {
                luma(
                    bgr[2] & LSB_CLEAR_MASK,
                    bgr[1] & LSB_CLEAR_MASK,
                    bgr[0] & LSB_CLEAR_MASK,
                )
            }));
        }

        Ok(Self {
            width,
            rows,
            values,
        })
    }

    /// 直接由亮度值构造，`values` 按行优先排列。
    pub fn from_values(width: usize, rows: usize, values: Vec<f64>) -> Self {
        Self {
            width,
            rows,
            values,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.width + col]
    }
}
