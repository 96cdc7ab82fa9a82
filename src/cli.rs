//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use crate::constants::{DEFAULT_BLOCK_SIZE, DEFAULT_CONTRAST_THRESHOLD};
use crate::scanner::{ScanParams, Selection};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// 一款只改写低对比度区域的 LSB 隐写工具，用于在 24 位 BMP 图像中隐藏或恢复任意文件。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款只改写低对比度区域的 LSB 隐写工具，用于在 24 位 BMP 图像中隐藏或恢复任意文件。\n编码与解码必须使用相同的块大小、阈值与选择模式。"
)]
pub struct Cli {
    /// 输出更详细的日志 (-v 为 info，-vv 为 debug，-vvv 为 trace)。
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：encode (隐藏)、decode (恢复) 和 capacity (容量查询)。
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 把文件内容隐藏到 24 位 BMP 图像的平坦区域中。
    Encode(EncodeArgs),

    /// 从经过隐写的 BMP 图像中恢复隐藏的内容。
    Decode(DecodeArgs),

    /// 报告图像在给定参数下可以隐藏多少字节。
    Capacity(CapacityArgs),
}

/// 低对比度区域的扫描参数，编码与解码两端必须一致。
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ScanArgs {
    /// 滑动窗口的边长 (像素)。
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,

    /// 块内亮度标准差低于该值时视为平坦区域。
    #[arg(short = 'c', long = "threshold", default_value_t = DEFAULT_CONTRAST_THRESHOLD)]
    pub threshold: f64,

    /// 保留重叠窗口产生的重复像素 (与旧版工具生成的图像兼容)。
    #[arg(long)]
    pub overlapping: bool,
}

impl Default for ScanArgs {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            threshold: DEFAULT_CONTRAST_THRESHOLD,
            overlapping: false,
        }
    }
}

impl ScanArgs {
    pub fn params(&self) -> ScanParams {
        let selection = if self.overlapping {
            Selection::Overlapping
        } else {
            Selection::Distinct
        };
        ScanParams::new(self.block_size, self.threshold).with_selection(selection)
    }
}

/// 'encode' 命令所需的参数。
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// 用作载体的 24 位 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的文件路径 (任意二进制内容)。
    #[arg(short, long)]
    pub text: PathBuf,

    /// 结果图像的保存路径，默认为载体旁的 `doctored_<文件名>`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 目标文件已存在时直接覆盖。
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub scan: ScanArgs,
}

/// 'decode' 命令所需的参数。
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// 已隐藏数据的 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复内容的保存路径，默认为图像旁的 `recovered_<文件名>.txt`。
    #[arg(short, long)]
    pub text: Option<PathBuf>,

    /// 目标文件已存在时直接覆盖。
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub scan: ScanArgs,
}

/// 'capacity' 命令所需的参数。
#[derive(Args, Debug)]
pub struct CapacityArgs {
    /// 要检查的 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    #[command(flatten)]
    pub scan: ScanArgs,
}
