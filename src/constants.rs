//! # 常量与默认配置
//!
//! 隐写格式常量以及命令行未指定时使用的默认扫描参数。

/// 默认的滑动窗口边长 (像素)。
pub const DEFAULT_BLOCK_SIZE: usize = 8;

/// 默认的对比度阈值：块内亮度标准差低于该值即视为“平坦”区域。
pub const DEFAULT_CONTRAST_THRESHOLD: f64 = 5.0;

/// 每个像素可承载的比特数 (R、G、B 各一位)。
pub const CHANNELS_PER_PIXEL: usize = 3;

/// 嵌入顺序 R, G, B 在 BGR 存储布局中对应的字节偏移。
pub const CHANNEL_ORDER: [usize; CHANNELS_PER_PIXEL] = [2, 1, 0];

/// 用于隐写载荷长度的字节数 (u32, 小端)。
pub const LENGTH_HEADER_BYTES: usize = 4;

/// 长度头占用的比特数。
pub const LENGTH_HEADER_BITS: usize = LENGTH_HEADER_BYTES * 8;

/// 计算亮度前对每个通道应用的掩码，去掉将被改写的最低位。
pub const LSB_CLEAR_MASK: u8 = 0xFE;

/// ITU-R BT.601 亮度权重 (R, G, B)。
pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// BMP 文件头 (14 字节) 加 BITMAPINFOHEADER (40 字节) 的最小长度。
pub const BMP_HEADER_SIZE: usize = 54;

/// BMP 文件头本身的长度。
pub const BMP_FILE_HEADER_SIZE: usize = 14;

/// 支持的唯一位深。
pub const BMP_BITS_PER_PIXEL: u16 = 24;

/// `BI_RGB`，即未压缩。
pub const BMP_COMPRESSION_NONE: u32 = 0;

/// 行数据按 4 字节对齐。
pub const BMP_ROW_ALIGN: usize = 4;

/// 合成 BMP 头时写入的分辨率 (约 72 DPI)。
pub const BMP_PIXELS_PER_METER: i32 = 2835;
