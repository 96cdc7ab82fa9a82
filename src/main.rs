use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

use flatbit::{
    cli::{Cli, Commands},
    handler::{handle_capacity, handle_decode, handle_encode},
};

/// 按 `-v` 的次数初始化日志，`RUST_LOG` 可以覆盖该级别。
fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    Builder::new()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// 程序的主入口点
///
/// 负责解析命令行参数，并根据指定的子命令（`encode`、`decode` 或 `capacity`）
/// 将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();
    init_logger(cli.verbose);

    // 根据子命令调用相应的处理函数
    match cli.command {
        Commands::Encode(args) => handle_encode(args),
        Commands::Decode(args) => handle_decode(args),
        Commands::Capacity(args) => handle_capacity(args),
    }
}
