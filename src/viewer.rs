// src/viewer.rs

use crate::{
    constants,
    resolver::{self, LessonKind},
    symbols, ui,
};
use colored::Colorize;
use log::debug;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// 文档查看方案。分发是同步的类型判定，iframe 式的跨域加载没有
/// 成败回执，所以这里没有“加载中”状态可言。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewPlan {
    /// PDF 可直接用源地址渲染
    PdfNative { url: String },
    /// Office 系文档走第三方在线预览，源地址经 URL 编码挂在 src 参数上
    OfficeWeb { source_url: String, viewer_url: String },
    /// 误路由进来的 YouTube 地址，提示转去媒体播放器，绝不尝试渲染
    RedirectToPlayer { url: String },
    /// 其余类型回退为“打开原始链接”
    ExternalOnly { url: String, kind_label: String },
}

/// 根据有效类型选择渲染路径，首先拦截误路由的 YouTube 地址
pub fn build_view_plan(url: &str, kind: &LessonKind) -> ViewPlan {
    if resolver::is_youtube_url(url) {
        debug!("文档查看器收到 YouTube 地址，拒绝渲染: {}", url);
        return ViewPlan::RedirectToPlayer {
            url: url.to_string(),
        };
    }

    match kind {
        LessonKind::Pdf => ViewPlan::PdfNative {
            url: url.to_string(),
        },
        LessonKind::Ppt | LessonKind::Doc => ViewPlan::OfficeWeb {
            source_url: url.to_string(),
            viewer_url: office_viewer_url(url),
        },
        other => ViewPlan::ExternalOnly {
            url: url.to_string(),
            kind_label: other.label().to_string(),
        },
    }
}

fn office_viewer_url(source: &str) -> String {
    format!(
        "{}{}",
        constants::OFFICE_VIEWER_PREFIX,
        utf8_percent_encode(source, NON_ALPHANUMERIC)
    )
}

/// 把查看方案渲染为终端面板。返回该方案是否算作“查看器已打开”:
/// 只有真正给出可查看内容的路径才算，误路由与课时完成无关。
pub fn render(title: &str, plan: &ViewPlan) -> bool {
    match plan {
        ViewPlan::PdfNative { url } => {
            ui::box_message(
                &format!("PDF 文档: {}", title),
                &["在浏览器中打开以下地址即可阅读:", "", url.as_str()],
                |s| s.cyan(),
            );
            true
        }
        ViewPlan::OfficeWeb { source_url, viewer_url } => {
            ui::box_message(
                &format!("Office 文档: {}", title),
                &[
                    "在浏览器中打开以下在线预览地址:",
                    "",
                    viewer_url.as_str(),
                    "",
                    "原始文件:",
                    source_url.as_str(),
                ],
                |s| s.cyan(),
            );
            true
        }
        ViewPlan::RedirectToPlayer { url } => {
            println!(
                "\n{} 这是一个 YouTube 视频地址，请从课时列表按视频方式打开: {}",
                *symbols::WARN,
                url
            );
            false
        }
        ViewPlan::ExternalOnly { url, kind_label } => {
            ui::box_message(
                &format!("暂不支持预览的内容 ({})", kind_label),
                &["该类型无法在线预览，请打开原始链接查看:", "", url.as_str()],
                |s| s.yellow(),
            );
            true
        }
    }
}
