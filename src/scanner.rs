//! # 低对比度区域扫描
//!
//! 以 `block_size × block_size` 的滑动窗口遍历亮度场，窗口原点按行、列
//! 升序逐一访问 (窗口之间可以重叠)。块内亮度的总体标准差低于阈值时，
//! 按块内行优先顺序输出该块的全部像素。
//!
//! 重叠窗口会让同一像素出现多次。[`Selection::Overlapping`] 原样保留这些
//! 重复位置；默认的 [`Selection::Distinct`] 只保留每个像素在扫描顺序中的
//! 第一次出现，保证每个比特写入独立的通道。

use crate::constants::{DEFAULT_BLOCK_SIZE, DEFAULT_CONTRAST_THRESHOLD};
use crate::error::StegError;
use crate::geometry::EmbedPosition;
use crate::luminance::LuminanceField;
use log::debug;

/// 重叠窗口产生的重复像素如何处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// 每个像素只在第一次被选中时输出。
    #[default]
    Distinct,
    /// 保留滑动窗口的原始输出，包括重复像素。
    Overlapping,
}

/// 编码端与解码端必须一致的扫描参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanParams {
    pub block_size: usize,
    pub contrast_threshold: f64,
    pub selection: Selection,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE, DEFAULT_CONTRAST_THRESHOLD)
    }
}

impl ScanParams {
    pub fn new(block_size: usize, contrast_threshold: f64) -> Self {
        Self {
            block_size,
            contrast_threshold,
            selection: Selection::default(),
        }
    }

    pub fn with_selection(self, selection: Selection) -> Self {
        Self { selection, ..self }
    }

    pub fn validate(&self) -> Result<(), StegError> {
        if self.block_size == 0 {
            return Err(StegError::InvalidParameters("block size must be positive"));
        }
        if self.contrast_threshold.is_nan() {
            return Err(StegError::InvalidParameters("contrast threshold is NaN"));
        }
        Ok(())
    }
}

/// 块内亮度的总体标准差。
fn block_stddev(field: &LuminanceField, top: usize, left: usize, size: usize) -> f64 {
    let rows = top..top + size;
    let cols = left..left + size;
    let n = (size * size) as f64;

    let sum: f64 = rows
        .clone()
        .flat_map(|row| cols.clone().map(move |col| (row, col)))
        .map(|(row, col)| field.get(row, col))
        .sum();
    let mean = sum / n;

    let squares: f64 = rows
        .flat_map(|row| cols.clone().map(move |col| (row, col)))
        .map(|(row, col)| {
            let d = field.get(row, col) - mean;
            d * d
        })
        .sum();

    (squares / n).sqrt()
}

/// 扫描亮度场，返回按扫描顺序排列的嵌入位置。
///
/// 图像小于一个块时返回空列表；容量不足留给后续的容量检查处理。
///
/// # Errors
///
/// * 参数非法时返回 [`StegError::InvalidParameters`]。
/// * 亮度场尺寸为零或与其数值个数不符时返回 [`StegError::InvalidImage`]。
/// * 位置列表无法增长时返回 [`StegError::AllocationFailure`]。
pub fn scan(field: &LuminanceField, params: &ScanParams) -> Result<Vec<EmbedPosition>, StegError> {
    params.validate()?;

    let (width, rows) = (field.width(), field.rows());
    if width == 0 || rows == 0 {
        return Err(StegError::InvalidImage("luminance field has no pixels"));
    }
    if width.checked_mul(rows) != Some(field.values().len()) {
        return Err(StegError::InvalidImage("luminance field does not match its dimensions"));
    }

    let size = params.block_size;
    if size > width || size > rows {
        debug!("{width}x{rows} image is smaller than one {size}x{size} block");
        return Ok(Vec::new());
    }

    let mut seen = match params.selection {
        Selection::Distinct => {
            let mut seen = Vec::new();
            seen.try_reserve_exact(field.values().len())
                .map_err(StegError::alloc("selection mask"))?;
            seen.resize(field.values().len(), false);
            Some(seen)
        }
        Selection::Overlapping => None,
    };

    let mut positions = Vec::new();
    let mut flat_blocks = 0usize;

    for top in 0..=rows - size {
        for left in 0..=width - size {
            if block_stddev(field, top, left, size) >= params.contrast_threshold {
                continue;
            }
            flat_blocks += 1;

            positions
                .try_reserve(size * size)
                .map_err(StegError::alloc("position list"))?;
            for row in top..top + size {
                for col in left..left + size {
                    let index = row * width + col;
                    if let Some(seen) = seen.as_mut() {
                        if seen[index] {
                            continue;
                        }
                        seen[index] = true;
                    }
                    positions.push(EmbedPosition::new(index));
                }
            }
        }
    }

    debug!(
        "{flat_blocks} of {} blocks below contrast {}, {} positions ({:?})",
        (rows - size + 1) * (width - size + 1),
        params.contrast_threshold,
        positions.len(),
        params.selection
    );

    Ok(positions)
}
