//! # 嵌入/提取引擎
//!
//! [`Carrier`] 把一份扫描得到的位置列表与对应的 [`Geometry`] 绑定在一起。
//! 每个位置按 R、G、B 的顺序承载 3 个比特，只改写通道字节的最低位。
//!
//! 容量检查是 [`Carrier::embed`] 的第一步：容量不足时直接返回错误，
//! 像素缓冲区不会被改动，因此不存在“只写入一部分”的状态。

use crate::constants::{CHANNELS_PER_PIXEL, CHANNEL_ORDER, LSB_CLEAR_MASK};
use crate::error::StegError;
use crate::geometry::{EmbedPosition, Geometry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carrier {
    geometry: Geometry,
    positions: Vec<EmbedPosition>,
}

impl Carrier {
    /// # Errors
    ///
    /// 任一位置超出图像范围时返回 [`StegError::InvalidParameters`]。
    pub fn new(geometry: Geometry, positions: Vec<EmbedPosition>) -> Result<Self, StegError> {
        if positions.iter().any(|&position| !geometry.contains(position)) {
            return Err(StegError::InvalidParameters("embed position outside the image"));
        }
        Ok(Self {
            geometry,
            positions,
        })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn positions(&self) -> &[EmbedPosition] {
        &self.positions
    }

    pub fn into_positions(self) -> Vec<EmbedPosition> {
        self.positions
    }

    /// 容量 (比特) 恒为 `3 * positions.len()`。
    pub fn capacity_bits(&self) -> usize {
        self.positions.len().saturating_mul(CHANNELS_PER_PIXEL)
    }

    pub fn ensure_capacity(&self, required_bits: usize) -> Result<(), StegError> {
        let available_bits = self.capacity_bits();
        if available_bits < required_bits {
            return Err(StegError::CapacityInsufficient {
                required_bits,
                available_bits,
            });
        }
        Ok(())
    }

    fn ensure_buffer(&self, pixels: &[u8]) -> Result<(), StegError> {
        if pixels.len() < self.geometry.buffer_len() {
            return Err(StegError::InvalidImage("pixel buffer is shorter than stride x rows"));
        }
        Ok(())
    }

    /// 按位置顺序、R/G/B 通道顺序列出每个比特对应的字节偏移。
    fn channel_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().flat_map(move |&position| {
            let base = self.geometry.pixel_offset(position);
            CHANNEL_ORDER.into_iter().map(move |channel| base + channel)
        })
    }

    /// 把比特流完整写入像素缓冲区。
    ///
    /// # Errors
    ///
    /// 容量不足时返回 [`StegError::CapacityInsufficient`]，缓冲区与几何信息
    /// 不符时返回 [`StegError::InvalidImage`]；两种情况下都不会写入任何字节。
    pub fn embed(&self, pixels: &mut [u8], bits: &[u8]) -> Result<(), StegError> {
        self.ensure_capacity(bits.len())?;
        self.ensure_buffer(pixels)?;

        for (offset, &bit) in self.channel_offsets().zip(bits) {
            pixels[offset] = (pixels[offset] & LSB_CLEAR_MASK) | (bit & 1);
        }
        Ok(())
    }

    /// 按与 [`Carrier::embed`] 相同的顺序读出 `bit_count` 个比特。
    ///
    /// # Errors
    ///
    /// 位置列表不足以提供 `bit_count` 个比特时返回 [`StegError::InsufficientBits`]。
    pub fn extract(&self, pixels: &[u8], bit_count: usize) -> Result<Vec<u8>, StegError> {
        let available_bits = self.capacity_bits();
        if available_bits < bit_count {
            return Err(StegError::InsufficientBits {
                required_bits: bit_count,
                available_bits,
            });
        }
        self.ensure_buffer(pixels)?;

        let mut bits = Vec::new();
        bits.try_reserve_exact(bit_count)
            .map_err(StegError::alloc("extracted bitstream"))?;
        bits.extend(
            self.channel_offsets()
                .take(bit_count)
                .map(|offset| pixels[offset] & 1),
        );
        Ok(bits)
    }
}
