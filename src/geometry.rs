//! # 像素网格几何
//!
//! 每次调用只从位图推导一次宽度、行数、行跨度与行存储顺序，
//! 之后由亮度计算、区域扫描与嵌入/提取共用同一份 [`Geometry`]。
//!
//! 核心算法一律按*存储*行序索引像素；[`RowOrder`] 只在把可视坐标
//! `(x, y)` 映射到存储行时使用。

use crate::bitmap::Bitmap;
use crate::error::StegError;

/// BMP 的行存储顺序，由高度的符号决定。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// 高度为正：第一行存储的是图像最底部的一行。
    BottomUp,
    /// 高度为负：按可视顺序自上而下存储。
    TopDown,
}

impl RowOrder {
    pub fn from_height(height: i32) -> Self {
        if height < 0 {
            Self::TopDown
        } else {
            Self::BottomUp
        }
    }

    /// 把可视行号 `y` (0 为最上方) 转换为存储行号。`y` 必须小于 `rows`。
    pub fn storage_row(self, y: usize, rows: usize) -> usize {
        match self {
            Self::TopDown => y,
            Self::BottomUp => rows - 1 - y,
        }
    }
}

/// 一个嵌入位置：按存储行序、无填充的像素索引 `row * width + col`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmbedPosition(usize);

impl EmbedPosition {
    pub fn new(pixel_index: usize) -> Self {
        Self(pixel_index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// 经过校验的像素缓冲区几何信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    width: usize,
    rows: usize,
    stride: usize,
    row_order: RowOrder,
    buffer_len: usize,
}

impl Geometry {
    /// 校验位图并推导几何信息。
    ///
    /// # Errors
    ///
    /// 像素数据为空、宽度非正、高度为零、行跨度小于一行像素，
    /// 或缓冲区短于 `stride * |height|` 时返回 [`StegError::InvalidImage`]。
    pub fn of(image: &Bitmap) -> Result<Self, StegError> {
        Self::from_raw(image.width(), image.height(), image.stride(), image.data().len())
    }

    pub(crate) fn from_raw(
        width: i32,
        height: i32,
        stride: usize,
        data_len: usize,
    ) -> Result<Self, StegError> {
        if data_len == 0 {
            return Err(StegError::InvalidImage("pixel data is empty"));
        }
        if width <= 0 {
            return Err(StegError::InvalidImage("width must be positive"));
        }
        if height == 0 {
            return Err(StegError::InvalidImage("height must be non-zero"));
        }

        let width = width as usize;
        let rows = height.unsigned_abs() as usize;

        let row_bytes = width
            .checked_mul(3)
            .ok_or(StegError::InvalidImage("row size overflows"))?;
        if stride < row_bytes {
            return Err(StegError::InvalidImage("stride is shorter than one row of pixels"));
        }
        let buffer_len = stride
            .checked_mul(rows)
            .ok_or(StegError::InvalidImage("pixel buffer size overflows"))?;
        if data_len < buffer_len {
            return Err(StegError::InvalidImage("pixel buffer is shorter than stride x rows"));
        }
        width
            .checked_mul(rows)
            .ok_or(StegError::InvalidImage("pixel count overflows"))?;

        Ok(Self {
            width,
            rows,
            stride,
            row_order: RowOrder::from_height(height),
            buffer_len,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// 行数，即 `|height|`。
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn row_order(&self) -> RowOrder {
        self.row_order
    }

    /// `stride * rows`，像素缓冲区至少需要的字节数。
    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.rows
    }

    pub fn contains(&self, position: EmbedPosition) -> bool {
        position.index() < self.pixel_count()
    }

    /// 像素在缓冲区中的起始字节 (B 通道) 偏移。
    pub fn pixel_offset(&self, position: EmbedPosition) -> usize {
        let index = position.index();
        (index / self.width) * self.stride + (index % self.width) * 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_buffers() {
        assert!(matches!(
            Geometry::from_raw(4, 4, 12, 0),
            Err(StegError::InvalidImage(_))
        ));
        assert!(matches!(
            Geometry::from_raw(0, 4, 12, 48),
            Err(StegError::InvalidImage(_))
        ));
        assert!(matches!(
            Geometry::from_raw(4, 0, 12, 48),
            Err(StegError::InvalidImage(_))
        ));
        assert!(matches!(
            Geometry::from_raw(4, 4, 11, 48),
            Err(StegError::InvalidImage(_))
        ));
        assert!(matches!(
            Geometry::from_raw(4, 4, 12, 47),
            Err(StegError::InvalidImage(_))
        ));
    }

    #[test]
    fn negative_height_is_top_down() {
        let geometry = Geometry::from_raw(5, -3, 16, 48).unwrap();
        assert_eq!(geometry.rows(), 3);
        assert_eq!(geometry.row_order(), RowOrder::TopDown);
        assert_eq!(geometry.row_order().storage_row(0, 3), 0);
        assert_eq!(RowOrder::BottomUp.storage_row(0, 3), 2);
    }

    #[test]
    fn pixel_offset_skips_row_padding() {
        let geometry = Geometry::from_raw(5, 3, 16, 48).unwrap();
        assert_eq!(geometry.pixel_offset(EmbedPosition::new(0)), 0);
        assert_eq!(geometry.pixel_offset(EmbedPosition::new(4)), 12);
        assert_eq!(geometry.pixel_offset(EmbedPosition::new(5)), 16);
        assert_eq!(geometry.pixel_offset(EmbedPosition::new(14)), 32 + 12);
        assert!(!geometry.contains(EmbedPosition::new(15)));
    }
}
