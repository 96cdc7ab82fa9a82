//! # flatbit 库
//!
//! 本库包含低对比度区域 LSB 隐写的核心逻辑：亮度场、滑动窗口扫描、
//! 比特编解码与嵌入/提取，以及 24 位 BMP 容器和命令行处理逻辑。

// 声明库包含的所有模块。

pub mod bitmap;
pub mod bits;
pub mod carrier;
pub mod cli;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod handler;
pub mod luminance;
pub mod scanner;
pub mod steganography;

pub use bitmap::{Bitmap, BitmapError};
pub use error::StegError;
pub use geometry::{EmbedPosition, RowOrder};
pub use scanner::{ScanParams, Selection};
pub use steganography::{
    Capacity, capacity, decode_message, encode_message, find_low_contrast_positions,
};
