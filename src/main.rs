//! # waxskit - GIWAXS/WAXS 探测器图像处理工具
//!
//! 将二维 X 射线散射图像重投影到倒空间、做扇区积分、批量处理原位序列并扣除背底，
//! 统一成单一可执行文件。
//!
//! ## 子命令
//! - `render` - 原始图像 / Qr-Qz 倒空间图导出
//! - `integrate` - 单帧扇区径向/角向积分
//! - `batch` - 原位序列批量积分与背底扣除
//! - `heatmap` - 原位矩阵热图
//! - `config` - 会话参数管理
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── waxs/      (重投影、积分、背底拟合、绘图)
//!   │     ├── batch/     (文件收集与并行执行)
//!   │     ├── parsers/   (图像与文本读取)
//!   │     └── models/    (数据模型)
//!   ├── settings.rs (参数持久化)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod settings;
mod utils;
mod waxs;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli) {
        utils::output::print_error(&format!("{}", e));
        if e.is_validation() || e.is_computation() {
            utils::output::print_info("Check the active parameters with `waxskit config show`");
        } else if e.is_io() {
            log::debug!("{:?}", e);
        }
        std::process::exit(1);
    }
}
