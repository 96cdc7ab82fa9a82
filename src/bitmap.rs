//! # 24 位 BMP 容器
//!
//! 读取与写回未压缩的 24 位 BMP。像素数据之前的全部字节 (文件头、信息头
//! 以及可能存在的扩展字段) 原样保留，写回时只替换像素缓冲区。

use crate::constants::{
    BMP_BITS_PER_PIXEL, BMP_COMPRESSION_NONE, BMP_FILE_HEADER_SIZE, BMP_HEADER_SIZE,
    BMP_PIXELS_PER_METER, BMP_ROW_ALIGN,
};
use crate::geometry::RowOrder;
use image::{Rgb, RgbImage};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// 解析或保存 BMP 时的错误。
#[derive(Debug, Error)]
pub enum BitmapError {
    #[error("file is too short to be a BMP ({0} bytes)")]
    HeaderTooShort(usize),

    #[error("missing 'BM' signature")]
    NotBmp,

    #[error("only 24-bit BMP is supported (got {0} bpp)")]
    UnsupportedBitDepth(u16),

    #[error("compressed BMP is not supported (compression={0})")]
    Compressed(u32),

    #[error("invalid BMP dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("pixel data offset {0} is outside the file")]
    BadDataOffset(u32),

    #[error("pixel data truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("pixel ({x}, {y}) is outside the image")]
    OutOfBounds { x: u32, y: u32 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// 内存中的 24 位 BMP：原始头部加带行填充的 BGR 像素缓冲区。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    header: Vec<u8>,
    width: i32,
    height: i32,
    stride: usize,
    data: Vec<u8>,
}

fn le_bytes<const N: usize>(bytes: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[at..at + N]);
    out
}

/// 每行字节数：`width * 3` 向上对齐到 4 字节。
pub fn row_stride(width: usize) -> Option<usize> {
    let row = width.checked_mul(3)?.checked_add(BMP_ROW_ALIGN - 1)?;
    Some(row / BMP_ROW_ALIGN * BMP_ROW_ALIGN)
}

fn synthesize_header(width: i32, height: i32, image_size: usize) -> Vec<u8> {
    let image_size = u32::try_from(image_size).unwrap_or(u32::MAX);
    let file_size = image_size.saturating_add(BMP_HEADER_SIZE as u32);

    let mut header = Vec::with_capacity(BMP_HEADER_SIZE);
    header.extend_from_slice(b"BM");
    header.extend_from_slice(&file_size.to_le_bytes());
    header.extend_from_slice(&[0; 4]);
    header.extend_from_slice(&(BMP_HEADER_SIZE as u32).to_le_bytes());
    header.extend_from_slice(&((BMP_HEADER_SIZE - BMP_FILE_HEADER_SIZE) as u32).to_le_bytes());
    header.extend_from_slice(&width.to_le_bytes());
    header.extend_from_slice(&height.to_le_bytes());
    header.extend_from_slice(&1u16.to_le_bytes());
    header.extend_from_slice(&BMP_BITS_PER_PIXEL.to_le_bytes());
    header.extend_from_slice(&BMP_COMPRESSION_NONE.to_le_bytes());
    header.extend_from_slice(&image_size.to_le_bytes());
    header.extend_from_slice(&BMP_PIXELS_PER_METER.to_le_bytes());
    header.extend_from_slice(&BMP_PIXELS_PER_METER.to_le_bytes());
    header.extend_from_slice(&[0; 8]);
    header
}

impl Bitmap {
    /// 创建一张全黑、自底向上存储的位图，并合成标准的 54 字节头部。
    pub fn new(width: u32, height: u32) -> Result<Self, BitmapError> {
        let invalid = || BitmapError::InvalidDimensions {
            width: width.into(),
            height: height.into(),
        };
        let signed_width = i32::try_from(width).map_err(|_| invalid())?;
        let signed_height = i32::try_from(height).map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }

        let stride = row_stride(width as usize).ok_or_else(invalid)?;
        let size = stride.checked_mul(height as usize).ok_or_else(invalid)?;

        Ok(Self {
            header: synthesize_header(signed_width, signed_height, size),
            width: signed_width,
            height: signed_height,
            stride,
            data: vec![0; size],
        })
    }

    /// 用任意的几何参数和像素缓冲区直接构造位图，不做校验。
    ///
    /// 隐写核心会在使用前自行校验 (见 [`crate::geometry::Geometry::of`])。
    pub fn from_parts(width: i32, height: i32, stride: usize, data: Vec<u8>) -> Self {
        Self {
            header: synthesize_header(width, height, data.len()),
            width,
            height,
            stride,
            data,
        }
    }

    /// 从完整的 BMP 文件内容解析位图。
    ///
    /// # Errors
    ///
    /// 签名、位深、压缩方式、尺寸或像素数据偏移不合法，
    /// 以及像素数据不足 `stride * |height|` 字节时返回错误。
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BitmapError> {
        if bytes.len() < BMP_HEADER_SIZE {
            return Err(BitmapError::HeaderTooShort(bytes.len()));
        }
        if &bytes[0..2] != b"BM" {
            return Err(BitmapError::NotBmp);
        }

        let data_offset = u32::from_le_bytes(le_bytes(bytes, 10));
        let width = i32::from_le_bytes(le_bytes(bytes, 18));
        let height = i32::from_le_bytes(le_bytes(bytes, 22));
        let bits_per_pixel = u16::from_le_bytes(le_bytes(bytes, 28));
        let compression = u32::from_le_bytes(le_bytes(bytes, 30));

        if bits_per_pixel != BMP_BITS_PER_PIXEL {
            return Err(BitmapError::UnsupportedBitDepth(bits_per_pixel));
        }
        if compression != BMP_COMPRESSION_NONE {
            return Err(BitmapError::Compressed(compression));
        }
        if width <= 0 || height == 0 {
            return Err(BitmapError::InvalidDimensions {
                width: width.into(),
                height: height.into(),
            });
        }

        let offset = data_offset as usize;
        if offset < BMP_HEADER_SIZE || offset > bytes.len() {
            return Err(BitmapError::BadDataOffset(data_offset));
        }

        let invalid = || BitmapError::InvalidDimensions {
            width: width.into(),
            height: height.into(),
        };
        let stride = row_stride(width as usize).ok_or_else(invalid)?;
        let size = stride
            .checked_mul(height.unsigned_abs() as usize)
            .ok_or_else(invalid)?;

        let pixels = &bytes[offset..];
        if pixels.len() < size {
            return Err(BitmapError::Truncated {
                expected: size,
                actual: pixels.len(),
            });
        }

        log::debug!(
            "parsed {}x{} BMP ({:?}), stride {}, pixel data at offset {}",
            width,
            height.unsigned_abs(),
            RowOrder::from_height(height),
            stride,
            offset
        );

        Ok(Self {
            header: bytes[..offset].to_vec(),
            width,
            height,
            stride,
            data: pixels[..size].to_vec(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, BitmapError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// 头部后接像素缓冲区。
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.header.len() + self.data.len());
        bytes.extend_from_slice(&self.header);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BitmapError> {
        fs::write(path, self.to_bytes())?;
        Ok(())
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    /// 带符号的高度，负数表示自上而下存储。
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn rows(&self) -> usize {
        self.height.unsigned_abs() as usize
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn row_order(&self) -> RowOrder {
        RowOrder::from_height(self.height)
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        let (x, y) = (x as usize, y as usize);
        let rows = self.rows();
        if self.width <= 0 || x >= self.width as usize || y >= rows {
            return None;
        }
        let row = self.row_order().storage_row(y, rows);
        let offset = row * self.stride + x * 3;
        (offset + 3 <= self.data.len()).then_some(offset)
    }

    /// 可视坐标 `(x, y)` 处的 `[r, g, b]`，`y = 0` 为最上方一行。
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let offset = self.offset(x, y)?;
        let bgr = &self.data[offset..offset + 3];
        Some([bgr[2], bgr[1], bgr[0]])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, [r, g, b]: [u8; 3]) -> Result<(), BitmapError> {
        let offset = self.offset(x, y).ok_or(BitmapError::OutOfBounds { x, y })?;
        self.data[offset..offset + 3].copy_from_slice(&[b, g, r]);
        Ok(())
    }

    /// 由 `image` 的 RGB 图像构造一张自底向上存储的位图。
    pub fn from_rgb_image(image: &RgbImage) -> Result<Self, BitmapError> {
        let mut bitmap = Self::new(image.width(), image.height())?;
        for (x, y, pixel) in image.enumerate_pixels() {
            bitmap.set_pixel(x, y, pixel.0)?;
        }
        Ok(bitmap)
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let width = self.width.max(0) as u32;
        let height = self.rows() as u32;
        RgbImage::from_fn(width, height, |x, y| Rgb(self.pixel(x, y).unwrap_or_default()))
    }
}
