// src/lib.rs

pub mod api;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod outline;
pub mod player;
pub mod progress;
pub mod resolver;
pub mod symbols;
pub mod ui;
pub mod utils;
pub mod viewer;
pub mod workflows;

use crate::{
    api::LmsApi,
    cli::Cli,
    client::RobustClient,
    config::AppConfig,
    error::*,
};
use colored::*;
use log::{debug, info};
use std::sync::{Arc, atomic::AtomicBool};
use tokio::sync::Mutex as TokioMutex;

/// 核心的执行上下文，包含所有任务所需的状态和工具
#[derive(Clone)]
pub struct StudyJobContext {
    pub config: Arc<AppConfig>,
    pub http_client: Arc<RobustClient>,
    pub api: Arc<LmsApi>,
    pub args: Arc<Cli>,
    pub token: Arc<TokioMutex<String>>,
    pub non_interactive: bool,
    pub cancellation_token: Arc<AtomicBool>,
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>, cancellation_token: Arc<AtomicBool>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);
    if args.token_help {
        ui::box_message(
            "获取 Access Token 指南",
            constants::HELP_TOKEN_GUIDE
                .lines()
                .collect::<Vec<_>>()
                .as_slice(),
            |s| s.cyan(),
        );
        println!(
            "\n{} 安全提醒: 请妥善保管你的 Token，不要分享给他人。",
            *symbols::INFO
        );
        return Ok(());
    }

    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);

    let (token_opt, source) = config::token::resolve_token(args.token.as_deref());
    if token_opt.is_some() {
        info!("从 {} 加载 Access Token", source);
        println!("\n{} 已从 {} 加载 Access Token。", *symbols::INFO, source);
    } else {
        info!("未找到本地 Access Token");
        println!(
            "\n{}",
            format!(
                "{} 未找到本地 Access Token，将在需要时提示输入。",
                *symbols::INFO
            )
            .yellow()
        );
    }
    let token = Arc::new(TokioMutex::new(token_opt.unwrap_or_default()));

    let http_client = Arc::new(RobustClient::new(config.clone(), token.clone())?);
    let api = Arc::new(LmsApi::new(http_client.clone()));

    let context = StudyJobContext {
        config: config.clone(),
        http_client,
        api,
        args: args.clone(),
        token,
        // --list 是唯一真正的非交互模式；课程大纲会话同样可以提示输入
        non_interactive: !args.interactive && args.course_id.is_none(),
        cancellation_token,
    };

    if args.interactive {
        workflows::run_interactive(context).await?;
    } else if let Some(course_id) = args.course_id {
        workflows::run_course_by_id(context, course_id).await?;
    } else if args.list {
        workflows::run_list(context).await?;
    };

    Ok(())
}
