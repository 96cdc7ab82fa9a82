//! # 隐写核心
//!
//! 对外暴露的三个操作：
//!
//! * [`find_low_contrast_positions`]：计算亮度场并扫描低对比度块。
//! * [`encode_message`]：检查容量后，把长度头与载荷写入选中的像素。
//! * [`decode_message`]：先读长度头，再按声明的长度读出载荷。
//!
//! 每次调用都从位图重新推导几何信息与位置列表，调用结束后全部释放，
//! 不保留对位图的任何引用。

use crate::bitmap::Bitmap;
use crate::bits;
use crate::carrier::Carrier;
use crate::constants::{CHANNELS_PER_PIXEL, LENGTH_HEADER_BITS, LENGTH_HEADER_BYTES};
use crate::error::StegError;
use crate::geometry::{EmbedPosition, Geometry};
use crate::luminance::LuminanceField;
use crate::scanner::{self, ScanParams};
use log::{debug, warn};

/// 一张图像在给定扫描参数下的承载能力。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    /// 选中的位置数 (重叠模式下包含重复像素)。
    pub positions: usize,
    /// 可用比特数，恒为 `3 * positions`。
    pub bits: usize,
}

impl Capacity {
    /// 扣除 4 字节长度头后最多可隐藏的载荷字节数。
    pub fn max_payload_bytes(&self) -> usize {
        (self.bits / 8).saturating_sub(LENGTH_HEADER_BYTES)
    }
}

fn select(image: &Bitmap, params: &ScanParams) -> Result<Carrier, StegError> {
    params.validate()?;
    let geometry = Geometry::of(image)?;
    let field = LuminanceField::build(image.data(), geometry)?;
    let positions = scanner::scan(&field, params)?;
    Carrier::new(geometry, positions)
}

/// 找出低对比度块中的全部像素，按扫描顺序返回。
///
/// # Errors
///
/// 图像非法时返回 [`StegError::InvalidImage`]，参数非法时返回
/// [`StegError::InvalidParameters`]。图像小于一个块不算错误，结果为空列表。
pub fn find_low_contrast_positions(
    image: &Bitmap,
    params: &ScanParams,
) -> Result<Vec<EmbedPosition>, StegError> {
    Ok(select(image, params)?.into_positions())
}

/// 计算图像的承载能力。
pub fn capacity(image: &Bitmap, params: &ScanParams) -> Result<Capacity, StegError> {
    let carrier = select(image, params)?;
    Ok(Capacity {
        positions: carrier.positions().len(),
        bits: carrier.capacity_bits(),
    })
}

/// 把 `payload` 隐藏进 `image`，成功时原地修改像素数据。
///
/// 容量在写入任何字节之前完成检查；容量不足时返回
/// [`StegError::CapacityInsufficient`]，图像保持原样。
pub fn encode_message(
    image: &mut Bitmap,
    payload: &[u8],
    params: &ScanParams,
) -> Result<(), StegError> {
    let carrier = select(image, params)?;
    let available_bits = carrier.capacity_bits();
    let required_bits =
        bits::envelope_bits(payload.len()).ok_or(StegError::CapacityInsufficient {
            required_bits: usize::MAX,
            available_bits,
        })?;

    if let Err(err) = carrier.ensure_capacity(required_bits) {
        warn!(
            "{} byte payload needs {required_bits} bits, carrier holds {available_bits}",
            payload.len()
        );
        return Err(err);
    }

    let stream = bits::seal(payload)?;
    carrier.embed(image.data_mut(), &stream)?;

    debug!(
        "embedded {} bits into {} of {} positions",
        stream.len(),
        stream.len().div_ceil(CHANNELS_PER_PIXEL),
        carrier.positions().len()
    );
    Ok(())
}

/// 从 `image` 中恢复隐藏的载荷，扫描参数必须与编码时一致。
///
/// 参数错误或图像中没有隐藏数据时通常得到无意义的长度；只有当该长度超出
/// 载体容量时才会报告 [`StegError::CapacityInsufficient`]。
pub fn decode_message(image: &Bitmap, params: &ScanParams) -> Result<Vec<u8>, StegError> {
    let carrier = select(image, params)?;
    let available_bits = carrier.capacity_bits();

    carrier.ensure_capacity(LENGTH_HEADER_BITS)?;
    let header = carrier.extract(image.data(), LENGTH_HEADER_BITS)?;
    let length = bits::read_length(&header)? as usize;

    let required_bits = bits::envelope_bits(length).ok_or(StegError::CapacityInsufficient {
        required_bits: usize::MAX,
        available_bits,
    })?;
    if let Err(err) = carrier.ensure_capacity(required_bits) {
        warn!("header declares {length} bytes, carrier holds only {available_bits} bits");
        return Err(err);
    }

    let stream = carrier.extract(image.data(), required_bits)?;
    let payload = bits::open(&stream, length)?;

    debug!("recovered {length} byte payload from {available_bits} bit carrier");
    Ok(payload)
}
