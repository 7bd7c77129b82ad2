// src/utils.rs

use crate::{cli::LogLevel, constants};
use log::{LevelFilter, warn};
use std::{collections::BTreeSet, env};

/// 判断输入是否是纯数字编号（区别于命令）
pub fn is_numeric_input(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

pub fn truncate_text(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut end_pos = 0;
    for (i, c) in text.char_indices() {
        width += if c.is_ascii() { 1 } else { 2 };
        if width > max_width.saturating_sub(3) {
            end_pos = i;
            break;
        }
    }
    if end_pos == 0 { text.to_string() } else { format!("{}...", &text[..end_pos]) }
}

pub fn parse_selection_indices(selection_str: &str, total_items: usize) -> Vec<usize> {
    if selection_str.to_lowercase() == "all" { return (0..total_items).collect(); }
    let mut indices = BTreeSet::new();
    for part in selection_str.split(',').map(|s| s.trim()) {
        if part.is_empty() { continue; }
        if let Some(range_part) = part.split_once('-') {
            if let (Ok(start), Ok(end)) = (range_part.0.parse::<usize>(), range_part.1.parse::<usize>()) {
                if start == 0 || end == 0 { continue; }
                let (min, max) = (start.min(end), start.max(end));
                for i in min..=max {
                    if i > 0 && i <= total_items { indices.insert(i - 1); }
                }
            }
        } else if let Ok(num) = part.parse::<usize>() {
            if num > 0 && num <= total_items { indices.insert(num - 1); }
        }
    }
    indices.into_iter().collect()
}

/// 把后端的时长字段解析为秒。兼容 "HH:MM:SS"、"MM:SS" 与纯秒数。
pub fn parse_duration_secs(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<f64>() {
        return (secs > 0.0).then_some(secs);
    }
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() > 3 || parts.is_empty() {
        return None;
    }
    let mut secs = 0.0;
    for part in &parts {
        secs = secs * 60.0 + part.trim().parse::<f64>().ok()?;
    }
    (secs > 0.0).then_some(secs)
}

pub fn format_seconds(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// 初始化 fern 文件日志。终端输出留给 UI 层，日志只进文件。
pub fn setup_logging(level: LogLevel) {
    let filter = match level {
        LogLevel::Off => return,
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    };

    let app_name = clap::crate_name!();
    // 优先使用配置目录，取不到主目录时回退到临时目录
    let log_file_path = match dirs::home_dir() {
        Some(home) => home
            .join(constants::CONFIG_DIR_NAME)
            .join(constants::LOG_FILE_NAME),
        None => {
            eprintln!("警告: 无法获取用户主目录，日志将写入临时目录。");
            env::temp_dir().join(app_name).join(constants::LOG_FILE_NAME)
        }
    };

    if let Some(dir) = log_file_path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("警告: 无法创建日志目录 {:?}: {}", dir, e);
        }
    }

    let file_appender = match fern::log_file(&log_file_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!(
                "警告: 无法打开主日志文件 {:?} : {}。将尝试使用备用日志文件。",
                log_file_path, e
            );
            let fallback_path = env::temp_dir().join(format!(
                "{}-{}",
                app_name,
                constants::LOG_FALLBACK_FILE_NAME
            ));
            match fern::log_file(&fallback_path) {
                Ok(fb_file) => {
                    warn!("日志将写入备用文件: {:?}", fallback_path);
                    fb_file
                }
                Err(e_fb) => {
                    eprintln!(
                        "错误: 无法创建主日志和备用日志文件 {:?}: {}。日志将不会被记录到文件。",
                        fallback_path, e_fb
                    );
                    return;
                }
            }
        }
    };

    let result = fern::Dispatch::new()
        .level(filter)
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{:<5}] [{}:{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                message
            ))
        })
        .chain(file_appender)
        .apply();

    if let Err(e) = result {
        eprintln!("警告: 日志系统初始化失败: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection_indices() {
        assert_eq!(parse_selection_indices("1,3,5", 5), vec![0, 2, 4]);

        // 范围与 "all" 关键字 (大小写不敏感)
        assert_eq!(parse_selection_indices("2-4", 5), vec![1, 2, 3]);
        assert_eq!(parse_selection_indices("all", 3), vec![0, 1, 2]);
        assert_eq!(parse_selection_indices("All", 3), vec![0, 1, 2]);

        // 混合、乱序和重复
        assert_eq!(parse_selection_indices("5, 1-2, 1", 5), vec![0, 1, 4]);

        // 无效和越界输入
        assert_eq!(parse_selection_indices("1,10,foo,-2", 5), vec![0]);
        assert_eq!(parse_selection_indices("", 5), Vec::<usize>::new());
    }

    #[test]
    fn test_is_numeric_input() {
        assert!(is_numeric_input("42"));
        assert!(!is_numeric_input(""));
        assert!(!is_numeric_input("42a"));
        assert!(!is_numeric_input("m2"));
    }

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs("90"), Some(90.0));
        assert_eq!(parse_duration_secs("05:30"), Some(330.0));
        assert_eq!(parse_duration_secs("1:00:01"), Some(3601.0));
        assert_eq!(parse_duration_secs(""), None);
        assert_eq!(parse_duration_secs("0"), None);
        assert_eq!(parse_duration_secs("abc"), None);
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(65.0), "1:05");
        assert_eq!(format_seconds(3601.0), "1:00:01");
        assert_eq!(format_seconds(-2.0), "0:00");
    }
}
