//! # 命令处理逻辑模块
//!
//! 包含处理 `encode`、`decode` 和 `capacity` 子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用隐写核心以及向用户报告结果。

use crate::bitmap::Bitmap;
use crate::cli::{CapacityArgs, DecodeArgs, EncodeArgs};
use crate::error::StegError;
use crate::steganography::{capacity, decode_message, encode_message};
use anyhow::{Context, Result};
use colored::Colorize;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// 在输入文件旁生成默认的输出路径：`<prefix><文件名主干>.<extension>`。
fn default_output(input: &Path, prefix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{prefix}{stem}.{extension}"))
}

/// 目标文件已存在且未指定 `--force` 时拒绝继续。
fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

fn load_bitmap(path: &Path) -> Result<Bitmap> {
    Bitmap::load(path).with_context(|| {
        format!(
            "Unable to read BMP image: {}",
            path.to_string_lossy().red().bold()
        )
    })
}

/// 处理 'Encode' 命令的执行逻辑。
///
/// 负责读取载体图像和待隐藏文件、调用隐写核心完成容量检查与嵌入，
/// 最后将结果写入目标图像文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径与扫描参数的 `EncodeArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 目标文件已存在且未指定 `--force`。
/// * 无法读取输入的图像或载荷文件，或图像不是 24 位未压缩 BMP。
/// * 图像的低对比度区域没有足够的空间。
/// * 无法写入到目标图像文件。
pub fn handle_encode(args: EncodeArgs) -> Result<()> {
    let extension = args
        .image
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bmp".to_owned());
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| default_output(&args.image, "doctored_", &extension));
    ensure_writable(&dest, args.force)?;

    let mut bitmap = load_bitmap(&args.image)?;

    let payload = fs::read(&args.text).with_context(|| {
        format!(
            "Unable to read payload file: {}",
            args.text.to_string_lossy().red().bold()
        )
    })?;

    let params = args.scan.params();
    info!(
        "hiding {} bytes in {}x{} image (block {}, threshold {}, {:?})",
        payload.len(),
        bitmap.width(),
        bitmap.rows(),
        params.block_size,
        params.contrast_threshold,
        params.selection
    );

    match encode_message(&mut bitmap, &payload, &params) {
        Ok(()) => {}
        Err(StegError::CapacityInsufficient {
            required_bits,
            available_bits,
        }) => anyhow::bail!(
            "Not enough space in the image to hide the message. \nRequired: {} bits, Available: {} bits",
            required_bits.to_string().red().bold(),
            available_bits.to_string().green().bold()
        ),
        Err(err) => {
            return Err(err).with_context(|| {
                format!(
                    "Failed to hide the message in {}. \nThe image may be corrupt or the parameters invalid.",
                    args.image.to_string_lossy().red().bold()
                )
            });
        }
    }

    bitmap.save(&dest).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The message has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );

    Ok(())
}

/// 处理 'Decode' 命令的执行逻辑。
///
/// 负责读取经过隐写的图像、调用隐写核心恢复长度头与载荷，
/// 最后将恢复的内容写入目标文件。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 目标文件已存在且未指定 `--force`。
/// * 无法读取输入的图像文件。
/// * 长度头声明的长度超出载体容量 (通常意味着参数不一致或图像中没有隐藏数据)。
/// * 无法写入到目标文件。
pub fn handle_decode(args: DecodeArgs) -> Result<()> {
    let dest = args
        .text
        .clone()
        .unwrap_or_else(|| default_output(&args.image, "recovered_", "txt"));
    ensure_writable(&dest, args.force)?;

    let bitmap = load_bitmap(&args.image)?;
    let params = args.scan.params();

    let payload = decode_message(&bitmap, &params).with_context(|| {
        format!(
            "Failed to recover the message from '{}'. \nThe image may not contain a hidden message, or the scan parameters differ from those used to hide it.",
            args.image.to_string_lossy().red().bold()
        )
    })?;
    info!("recovered {} bytes", payload.len());

    fs::write(&dest, payload).with_context(|| {
        format!(
            "Unable to write to target file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "The message has been successfully recovered and saved: {}",
        dest.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Capacity' 命令：打印选中的位置数、可用比特数与最大载荷字节数。
pub fn handle_capacity(args: CapacityArgs) -> Result<()> {
    let bitmap = load_bitmap(&args.image)?;
    let params = args.scan.params();

    let report = capacity(&bitmap, &params).with_context(|| {
        format!(
            "Failed to scan '{}' for low-contrast regions.",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "{}: {} positions, {} bits, up to {} payload bytes",
        args.image.to_string_lossy().bold(),
        report.positions.to_string().green(),
        report.bits.to_string().green(),
        report.max_payload_bytes().to_string().green().bold()
    );
    Ok(())
}
