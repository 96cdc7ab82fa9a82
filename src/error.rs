//! # 错误类型
//!
//! 隐写核心 (亮度计算、区域扫描、比特编解码、嵌入/提取) 的全部失败情形。

use thiserror::Error;

/// 隐写核心可能返回的错误。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StegError {
    /// 像素数据缺失或尺寸非法。
    #[error("invalid image: {0}")]
    InvalidImage(&'static str),

    /// 扫描参数非法 (块大小为 0 或阈值为 NaN)。
    #[error("invalid parameters: {0}")]
    InvalidParameters(&'static str),

    /// 内部缓冲区增长时内存不足。
    #[error("failed to allocate {what}")]
    AllocationFailure { what: &'static str },

    /// 载体容量不足以容纳请求的 (或头部声明的) 长度。
    #[error("capacity insufficient: need {required_bits} bits, have {available_bits} bits")]
    CapacityInsufficient {
        required_bits: usize,
        available_bits: usize,
    },

    /// 比特流长度不足以还原请求的字节数。
    #[error("truncated bitstream: need {required_bits} bits, got {available_bits}")]
    TruncatedBitstream {
        required_bits: usize,
        available_bits: usize,
    },

    /// 位置列表在读满请求的比特数之前耗尽。
    #[error("insufficient bits: need {required_bits} bits, positions hold {available_bits}")]
    InsufficientBits {
        required_bits: usize,
        available_bits: usize,
    },
}

impl StegError {
    /// 是否为“容量不足”这一需要调用方单独处理的结果。
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::CapacityInsufficient { .. })
    }

    pub(crate) fn alloc(what: &'static str) -> impl FnOnce(std::collections::TryReserveError) -> Self {
        move |_| Self::AllocationFailure { what }
    }
}
