// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const TITLE_TRUNCATE_LENGTH: usize = 65;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const BOOKMARK_FILE_NAME: &str = "bookmarks.json";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const TOKEN_ENV_VAR: &str = "LUMINA_ACCESS_TOKEN";
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// 播放快进/快退步长（秒）
pub const SEEK_STEP_SECS: f64 = 5.0;
/// 原生视频在距离结尾该秒数以内即视为播放完成
pub const COMPLETION_TAIL_SECS: f64 = 1.0;
/// 可选播放速率的固定集合
pub const PLAYBACK_RATES: [f64; 7] = [0.5, 0.75, 1.0, 1.25, 1.2, 1.5, 2.0];
pub const DEFAULT_RATE_INDEX: usize = 2;
pub const VOLUME_STEP: f64 = 0.1;

/// Office 文档在线预览服务，源地址需经 URL 编码后附加在 src 参数上
pub const OFFICE_VIEWER_PREFIX: &str = "https://view.officeapps.live.com/op/view.aspx?src=";

pub const HELP_TOKEN_GUIDE: &str = r#"
1. 登录平台: 使用 Chrome / Edge / Firefox 浏览器登录学习平台。
2. 打开开发者工具:
   - 在 Windows / Linux 上: 按 F12 或 Ctrl+Shift+I
   - 在 macOS 上: 按 Cmd+Opt+I (⌘⌥I)
3. 切换到“应用” (Application) 标签页，展开 Local Storage。
4. 找到名为 access_token 的键，复制其值。
5. 通过 --token 参数、LUMINA_ACCESS_TOKEN 环境变量
   或在程序提示时粘贴，均可使用该 Token。"#;

pub mod api {
    /// 后端声明的课时类型（上游数据经常缺失或标错，仅作兜底参考）
    pub mod lesson_types {
        pub const VIDEO: &str = "video";
        pub const LINK: &str = "link";
        pub const UNKNOWN: &str = "unknown";
    }
    pub mod extensions {
        pub const PDF: &str = "pdf";
        pub const PPT: [&str; 2] = ["ppt", "pptx"];
        pub const DOC: [&str; 2] = ["doc", "docx"];
    }
}
