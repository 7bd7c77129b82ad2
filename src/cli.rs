// src/cli.rs

use crate::models::CourseStatus;
use clap::{Parser, ValueEnum, command, crate_version};

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// 课程列表排序方式
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortKey {
    #[value(name = "recent")]
    Recent,
    #[value(name = "title")]
    Title,
    #[value(name = "progress")]
    Progress,
}

/// 按学习状态过滤课程
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    #[value(name = "not_started")]
    NotStarted,
    #[value(name = "in_progress")]
    InProgress,
    #[value(name = "completed")]
    Completed,
}

impl From<StatusFilter> for CourseStatus {
    fn from(value: StatusFilter) -> Self {
        match value {
            StatusFilter::NotStarted => CourseStatus::NotStarted,
            StatusFilter::InProgress => CourseStatus::InProgress,
            StatusFilter::Completed => CourseStatus::Completed,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_help_flag = true,
    disable_version_flag = true,
)]
#[command(group(
    clap::ArgGroup::new("mode")
        .required(true)
        .args(&["interactive", "course_id", "list", "token_help"]),
))]
pub struct Cli {
    // --- 运行模式 (Mode) ---
    /// 启动交互式学习会话: 浏览课程、打开课时、跟踪进度
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub interactive: bool,
    /// 直接打开指定课程的大纲
    #[arg(long, value_name = "ID", help_heading = "Mode")]
    pub course_id: Option<u64>,
    /// 非交互地打印过滤后的课程列表
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub list: bool,
    /// 显示如何获取 Access Token 的指南并退出
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Mode")]
    pub token_help: bool,

    // --- 列表选项 (Options) ---
    /// 按关键词过滤课程 (匹配课程/模块/课时标题，大小写不敏感)
    #[arg(short, long, help_heading = "Options")]
    pub search: Option<String>,
    /// 按学习状态过滤
    #[arg(long, value_enum, help_heading = "Options")]
    pub status: Option<StatusFilter>,
    /// 只显示收藏的课程
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub bookmarked: bool,
    /// 课程排序方式
    #[arg(long, value_enum, default_value_t = SortKey::Recent, help_heading = "Options")]
    pub sort: SortKey,
    /// 提供访问令牌 (Access Token)，优先级最高
    #[arg(long, help_heading = "Options")]
    pub token: Option<String>,
    /// 设置拉取课程详情的最大并发数
    #[arg(short, long, value_parser = clap::value_parser!(usize), help_heading = "Options")]
    pub workers: Option<usize>,

    // --- 通用选项 (General) ---
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}
