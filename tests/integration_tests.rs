use flatbit::{
    Bitmap,
    cli::{CapacityArgs, DecodeArgs, EncodeArgs, ScanArgs},
    handler::{handle_capacity, handle_decode, handle_encode},
};
use image::{ImageBuffer, Rgb};
use rand::RngCore;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// 一个辅助函数，用于创建测试图像：上半部分为平坦的灰蓝色，下半部分为随机噪声
fn create_test_image(path: &Path, width: u32, height: u32) {
    let mut raw_pixels = vec![0u8; (width * height * 3) as usize];
    rand::rng().fill_bytes(&mut raw_pixels);

    let img_buf = ImageBuffer::from_fn(width, height, |x, y| {
        if y < height / 2 {
            Rgb([90, 110, 130])
        } else {
            let i = ((y * width + x) * 3) as usize;
            Rgb([
                raw_pixels[i] | 0x80,
                raw_pixels[i + 1] | 0x80,
                raw_pixels[i + 2] | 0x80,
            ])
        }
    });

    Bitmap::from_rgb_image(&img_buf)
        .and_then(|bitmap| bitmap.save(path))
        .expect("Failed to create test image.");
}

/// 一个辅助函数，用于创建完全由随机噪声组成、没有平坦区域的图像
fn create_noise_image(path: &Path, width: u32, height: u32) {
    let mut raw_pixels = vec![0u8; (width * height * 3) as usize];
    rand::rng().fill_bytes(&mut raw_pixels);

    let img_buf = ImageBuffer::from_fn(width, height, |x, y| {
        let i = ((y * width + x) * 3) as usize;
        // 偶数像素偏暗、奇数像素偏亮，保证任何窗口都有很高的对比度
        let base = if (x + y) % 2 == 0 { 0x00 } else { 0x80 };
        Rgb([
            base | (raw_pixels[i] & 0x3F),
            base | (raw_pixels[i + 1] & 0x3F),
            base | (raw_pixels[i + 2] & 0x3F),
        ])
    });

    Bitmap::from_rgb_image(&img_buf)
        .and_then(|bitmap| bitmap.save(path))
        .expect("Failed to create noise image.");
}

/// 验证从隐藏到恢复的完整流程
#[test]
fn test_handle_encode_and_decode_integration() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.bmp");
    let hidden_image_path = dir.path().join("hidden.bmp");
    let source_text_path = dir.path().join("source.txt");
    let recovered_text_path = dir.path().join("recovered.txt");

    create_test_image(&original_image_path, 64, 64);
    let original_text = "This is a test message for the handler! 这是一个给处理器的测试信息！";
    fs::write(&source_text_path, original_text)?;

    // 2. 测试 handle_encode
    let encode_args = EncodeArgs {
        image: original_image_path.clone(),
        text: source_text_path.clone(),
        dest: Some(hidden_image_path.clone()),
        force: false,
        scan: ScanArgs::default(),
    };
    handle_encode(encode_args)?;
    assert!(
        hidden_image_path.exists(),
        "Hidden image should be created."
    );

    // 3. 测试 handle_decode
    let decode_args = DecodeArgs {
        image: hidden_image_path.clone(),
        text: Some(recovered_text_path.clone()),
        force: false,
        scan: ScanArgs::default(),
    };
    handle_decode(decode_args)?;
    assert!(
        recovered_text_path.exists(),
        "Recovered text file should be created."
    );

    // 4. 验证结果
    let recovered_text = fs::read_to_string(&recovered_text_path)?;
    assert_eq!(
        original_text, recovered_text,
        "Recovered text must match the original."
    );

    // 5. 头部与文件长度保持不变
    let original = fs::read(&original_image_path)?;
    let hidden = fs::read(&hidden_image_path)?;
    assert_eq!(original.len(), hidden.len());
    assert_eq!(original[..54], hidden[..54]);

    Ok(())
}

/// 验证当用户不提供输出路径时，是否能正确生成默认路径并完成操作
#[test]
fn test_handle_encode_and_decode_with_defaults() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.bmp");
    let source_text_path = dir.path().join("source.txt");

    create_test_image(&original_image_path, 64, 64);
    let original_text = "Testing default path generation. 测试默认路径生成。";
    fs::write(&source_text_path, original_text)?;

    // 2. 测试 handle_encode，不提供 dest 路径
    let encode_args = EncodeArgs {
        image: original_image_path.clone(),
        text: source_text_path.clone(),
        dest: None, // 关键：测试 None 的情况
        force: false,
        scan: ScanArgs::default(),
    };
    handle_encode(encode_args)?;

    // 验证默认的隐写图像文件是否已创建
    let expected_hidden_path = dir.path().join("doctored_original.bmp");
    assert!(
        expected_hidden_path.exists(),
        "Default hidden image should be created at: {:?}",
        expected_hidden_path
    );

    // 3. 测试 handle_decode，不提供 text 输出路径
    let decode_args = DecodeArgs {
        image: expected_hidden_path, // 使用上一步生成的默认文件
        text: None,                  // 关键：测试 None 的情况
        force: false,
        scan: ScanArgs::default(),
    };
    handle_decode(decode_args)?;

    // 验证默认的恢复文本文件是否已创建
    let expected_recovered_path = dir.path().join("recovered_doctored_original.txt");
    assert!(
        expected_recovered_path.exists(),
        "Default recovered text file should be created at: {:?}",
        expected_recovered_path
    );

    // 4. 验证结果
    let recovered_text = fs::read_to_string(&expected_recovered_path)?;
    assert_eq!(
        original_text, recovered_text,
        "Recovered text from default file must match the original."
    );

    Ok(())
}

/// 验证覆盖保护机制以及 `--force` 标志是否按预期工作
#[test]
fn test_overwrite_protection_and_force_flag() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let text_path = dir.path().join("text.txt");
    let dest_path = dir.path().join("dest.bmp");

    create_test_image(&image_path, 48, 48);
    fs::write(&text_path, "some text")?;

    // 2. 场景一：测试覆盖保护
    // 先创建一个同名的目标文件，模拟“文件已存在”的场景
    fs::write(&dest_path, "this is a dummy file to be overwritten")?;
    assert!(dest_path.exists());

    // 构建参数，不使用 --force
    let encode_args_no_force = EncodeArgs {
        image: image_path.clone(),
        text: text_path.clone(),
        dest: Some(dest_path.clone()),
        force: false,
        scan: ScanArgs::default(),
    };

    // 执行并断言操作会失败
    let result = handle_encode(encode_args_no_force);
    assert!(result.is_err(), "Execution should fail without --force when file exists.");
    if let Err(e) = result {
        assert!(e.to_string().contains("Output file already exists"));
    }

    // 3. 场景二：测试强制覆盖
    // 构建参数，这次使用 --force
    let encode_args_with_force = EncodeArgs {
        image: image_path.clone(),
        text: text_path.clone(),
        dest: Some(dest_path.clone()),
        force: true,
        scan: ScanArgs::default(),
    };

    // 执行并断言操作会成功
    let result = handle_encode(encode_args_with_force);
    assert!(result.is_ok(), "Execution should succeed with --force when file exists.");

    // 验证文件确实被覆盖（内容不再是 "this is a dummy file..."）
    let dummy_content = fs::read(&dest_path)?;
    assert_ne!(dummy_content, b"this is a dummy file to be overwritten");

    // 4. 场景三：解码同样受到覆盖保护
    let decode_args = DecodeArgs {
        image: dest_path.clone(),
        text: Some(text_path.clone()),
        force: false,
        scan: ScanArgs::default(),
    };
    let result = handle_decode(decode_args);
    assert!(result.is_err(), "Decode should refuse to overwrite the payload file.");

    Ok(())
}

/// 验证空间不足时的错误处理
#[test]
fn test_handle_encode_not_enough_space() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let image_path = dir.path().join("small.bmp");
    let text_path = dir.path().join("large.txt");
    let dest_path = dir.path().join("dest.bmp");

    // 创建一个没有平坦区域的图片
    create_noise_image(&image_path, 10, 10);
    // 创建一个非常大的文本
    let large_text = "a".repeat(5000);
    fs::write(&text_path, large_text)?;

    // 2. 执行并断言错误
    let encode_args = EncodeArgs {
        image: image_path,
        text: text_path,
        dest: Some(dest_path.clone()),
        force: false,
        scan: ScanArgs::default(),
    };
    let result = handle_encode(encode_args);

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Not enough space"));
    }
    assert!(!dest_path.exists(), "No output should be written on failure.");

    Ok(())
}

/// 验证非 BMP 输入会被拒绝
#[test]
fn test_handle_encode_rejects_non_bmp() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("fake.bmp");
    let text_path = dir.path().join("text.txt");
    fs::write(&image_path, b"definitely not a bitmap, but long enough to hold a header......")?;
    fs::write(&text_path, "hi")?;

    let result = handle_encode(EncodeArgs {
        image: image_path,
        text: text_path,
        dest: None,
        force: false,
        scan: ScanArgs::default(),
    });

    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Unable to read BMP image"));
    }
    Ok(())
}

/// 隐写后的图像仍然是标准 BMP，可以被 `image` 正常解码，且像素与写入的一致
#[test]
fn test_output_is_a_standard_bmp() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("cover.bmp");
    let text_path = dir.path().join("text.txt");
    let dest_path = dir.path().join("stego.bmp");

    create_test_image(&image_path, 40, 30);
    fs::write(&text_path, [0u8, 1, 2, 3, 254, 255])?;

    handle_encode(EncodeArgs {
        image: image_path.clone(),
        text: text_path,
        dest: Some(dest_path.clone()),
        force: false,
        scan: ScanArgs {
            block_size: 4,
            threshold: 2.0,
            overlapping: false,
        },
    })?;

    let decoded = image::open(&dest_path)?.to_rgb8();
    assert_eq!(decoded, Bitmap::load(&dest_path)?.to_rgb_image());

    // 每个通道最多只变化 1
    let cover = Bitmap::load(&image_path)?.to_rgb_image();
    assert!(
        cover
            .as_raw()
            .iter()
            .zip(decoded.as_raw())
            .all(|(a, b)| a.abs_diff(*b) <= 1)
    );

    handle_capacity(CapacityArgs {
        image: dest_path,
        scan: ScanArgs::default(),
    })?;

    Ok(())
}
