//! # 比特编解码
//!
//! 比特流中每个元素是 0 或 1，每个字节按 MSB 优先展开为 8 个元素。
//! 载荷封装格式：4 字节小端 `u32` 长度，紧跟同样长度的原始字节，
//! 没有魔数、版本号或校验和。

use crate::constants::{LENGTH_HEADER_BITS, LENGTH_HEADER_BYTES};
use crate::error::StegError;

fn byte_bits(byte: u8) -> impl Iterator<Item = u8> {
    (0..8).rev().map(move |shift| (byte >> shift) & 1)
}

/// 把字节展开为 MSB 优先的比特流，长度为 `bytes.len() * 8`。
pub fn pack_bits(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().copied().flat_map(byte_bits).collect()
}

/// [`pack_bits`] 的逆运算，只读取前 `byte_count * 8` 个比特。
///
/// # Errors
///
/// 比特流不足 `byte_count * 8` 个元素时返回 [`StegError::TruncatedBitstream`]。
pub fn unpack_bits(bits: &[u8], byte_count: usize) -> Result<Vec<u8>, StegError> {
    let truncated = |required_bits| StegError::TruncatedBitstream {
        required_bits,
        available_bits: bits.len(),
    };
    let required_bits = byte_count.checked_mul(8).ok_or(truncated(usize::MAX))?;
    if bits.len() < required_bits {
        return Err(truncated(required_bits));
    }

    Ok(bits[..required_bits]
        .chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | (bit & 1)))
        .collect())
}

/// 封装 `payload_len` 字节载荷所需的总比特数 (含长度头)；溢出时返回 `None`。
pub fn envelope_bits(payload_len: usize) -> Option<usize> {
    LENGTH_HEADER_BYTES.checked_add(payload_len)?.checked_mul(8)
}

/// 生成长度头加载荷的完整比特流。
///
/// # Errors
///
/// 载荷长度超出 `u32` 时返回 [`StegError::CapacityInsufficient`]，
/// 比特流无法分配时返回 [`StegError::AllocationFailure`]。
pub fn seal(payload: &[u8]) -> Result<Vec<u8>, StegError> {
    let too_long = || StegError::CapacityInsufficient {
        required_bits: envelope_bits(payload.len()).unwrap_or(usize::MAX),
        available_bits: envelope_bits(u32::MAX as usize).unwrap_or(usize::MAX),
    };
    let length = u32::try_from(payload.len()).map_err(|_| too_long())?;
    let total_bits = envelope_bits(payload.len()).ok_or_else(too_long)?;

    let mut stream = Vec::new();
    stream
        .try_reserve_exact(total_bits)
        .map_err(StegError::alloc("envelope bitstream"))?;
    stream.extend(
        length
            .to_le_bytes()
            .into_iter()
            .chain(payload.iter().copied())
            .flat_map(byte_bits),
    );
    Ok(stream)
}

/// 从长度头的 32 个比特中还原载荷长度。
pub fn read_length(header_bits: &[u8]) -> Result<u32, StegError> {
    let bytes = unpack_bits(header_bits, LENGTH_HEADER_BYTES)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// 跳过长度头，还原 `length` 字节的载荷。
pub fn open(stream: &[u8], length: usize) -> Result<Vec<u8>, StegError> {
    let body = stream.get(LENGTH_HEADER_BITS..).unwrap_or_default();
    unpack_bits(body, length).map_err(|err| match err {
        StegError::TruncatedBitstream {
            required_bits,
            available_bits,
        } => StegError::TruncatedBitstream {
            required_bits: required_bits.saturating_add(LENGTH_HEADER_BITS),
            available_bits: available_bits + stream.len().min(LENGTH_HEADER_BITS),
        },
        other => other,
    })
}
