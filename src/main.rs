// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use lumina_study::{cli::Cli, run_from_cli, utils};
use std::{
    env,
    sync::{Arc, atomic::AtomicBool, atomic::Ordering},
    time::Duration,
};

#[tokio::main]
async fn main() {
    // 为 Windows 终端启用 ANSI 颜色支持
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }

    let cancellation_token = Arc::new(AtomicBool::new(false));
    let ctrl_c_flag = cancellation_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.unwrap();
        ctrl_c_flag.store(true, Ordering::Relaxed);
        println!("\n{} 用户强制中断程序。", "[!]".yellow());
        tokio::time::sleep(Duration::from_millis(100)).await;
        std::process::exit(130);
    });

    let bin_name = env::var("CARGO_BIN_NAME").unwrap_or_else(|_| "lumina-study".to_string());

    let after_help = format!(
        "示例:\n  # 启动交互学习模式 (推荐)\n  {bin} -i\n\n  # 直接打开某门课程的大纲\n  {bin} --course-id 42\n\n  # 列出进行中的课程\n  {bin} -l --status in_progress\n\n  # 获取 Token 帮助\n  {bin} --token-help",
        bin = bin_name
    );

    let cmd = Cli::command().after_help(after_help);

    let args = Arc::new(Cli::from_arg_matches(&cmd.get_matches()).unwrap());
    utils::setup_logging(args.log_level);

    if let Err(e) = run_from_cli(args, cancellation_token).await {
        eprintln!("\n{} {}", "[X]".red(), format!("程序执行出错: {}", e).red());
        std::process::exit(1);
    }
}
