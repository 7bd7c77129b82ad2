// src/resolver.rs

use crate::{
    constants::api::{extensions, lesson_types},
    models::{Lesson, Resource},
};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static YOUTUBE_HOST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|\.)(youtube(-nocookie)?\.com|youtu\.be)$").unwrap());

/// 课时的“有效类型”。上游的声明类型经常缺失或标错，
/// URL 与扩展名嗅探才是权威信号，声明类型只在嗅探无果时兜底。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonKind {
    Video,
    Youtube,
    Pdf,
    Ppt,
    Doc,
    Link,
    /// 声明类型未被任何嗅探规则覆盖时按原样透传
    Declared(String),
    Unknown,
}

impl LessonKind {
    pub fn label(&self) -> &str {
        match self {
            LessonKind::Video => "视频",
            LessonKind::Youtube => "YouTube",
            LessonKind::Pdf => "PDF",
            LessonKind::Ppt => "演示文稿",
            LessonKind::Doc => "文档",
            LessonKind::Link => "外部链接",
            LessonKind::Declared(s) => s,
            LessonKind::Unknown => "未知",
        }
    }
}

/// 每次选中课时都重新嗅探，结果不缓存在课时实体上
pub fn resolve_lesson(lesson: &Lesson) -> LessonKind {
    resolve(
        lesson.lesson_type.as_deref(),
        lesson.content_url.as_deref(),
        lesson.content_file.as_deref(),
    )
}

/// 课程附件复用同一套嗅探规则
pub fn resolve_resource(resource: &Resource) -> LessonKind {
    resolve(
        resource.resource_type.as_deref(),
        resource.url.as_deref(),
        resource.file.as_deref(),
    )
}

/// 有效类型推导，规则按序匹配，先中先得:
/// 1. 无 URL 也无文件 → 未知
/// 2. URL 域名命中 YouTube → youtube
/// 3. 扩展名 (去掉查询串，大小写不敏感): pdf / ppt,pptx / doc,docx
/// 4. 声明类型存在且不是哨兵值 "unknown" → 按声明
/// 5. URL 为 http(s) 方案 → 外部链接
/// 6. 其余 → 未知
pub fn resolve(declared: Option<&str>, url: Option<&str>, file: Option<&str>) -> LessonKind {
    let source = match url.or(file) {
        Some(s) if !s.trim().is_empty() => s,
        _ => return LessonKind::Unknown,
    };

    if let Some(u) = url
        && is_youtube_url(u)
    {
        return LessonKind::Youtube;
    }

    if let Some(ext) = extension_of(source) {
        if ext == extensions::PDF {
            return LessonKind::Pdf;
        }
        if extensions::PPT.contains(&ext.as_str()) {
            return LessonKind::Ppt;
        }
        if extensions::DOC.contains(&ext.as_str()) {
            return LessonKind::Doc;
        }
    }

    if let Some(declared) = declared {
        let trimmed = declared.trim();
        if !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(lesson_types::UNKNOWN) {
            return match trimmed.to_lowercase().as_str() {
                lesson_types::VIDEO => LessonKind::Video,
                "youtube" => LessonKind::Youtube,
                lesson_types::LINK => LessonKind::Link,
                "pdf" => LessonKind::Pdf,
                "ppt" | "pptx" => LessonKind::Ppt,
                "doc" | "docx" => LessonKind::Doc,
                _ => LessonKind::Declared(trimmed.to_string()),
            };
        }
    }

    if let Some(u) = url {
        let lower = u.trim_start().to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return LessonKind::Link;
        }
    }

    LessonKind::Unknown
}

pub fn is_youtube_url(raw: &str) -> bool {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| YOUTUBE_HOST_RE.is_match(h)))
        .unwrap_or(false)
}

/// 取路径最后一段的扩展名，查询串与片段先剥掉，统一转小写。
/// 非法 URL (裸文件路径) 走手工剥离。
fn extension_of(source: &str) -> Option<String> {
    let path = match Url::parse(source) {
        Ok(u) => u.path().to_string(),
        Err(_) => {
            let s = source.split(['?', '#']).next().unwrap_or(source);
            s.to_string()
        }
    };
    let segment = path.rsplit('/').next().unwrap_or(&path);
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_wins_over_declared_type() {
        // 声明类型不可靠: 扩展名存在时一律以扩展名为准
        assert_eq!(
            resolve(Some("video"), Some("https://cdn.example.com/x.pdf"), None),
            LessonKind::Pdf
        );
        assert_eq!(
            resolve(Some("link"), Some("https://cdn.example.com/slides.PPTX"), None),
            LessonKind::Ppt
        );
    }

    #[test]
    fn test_query_string_is_stripped() {
        assert_eq!(
            resolve(None, Some("https://cdn.example.com/a/b/notes.DOCX?sig=abc&e=1"), None),
            LessonKind::Doc
        );
    }

    #[test]
    fn test_youtube_hosts_take_precedence() {
        for u in [
            "https://www.youtube.com/watch?v=abc123",
            "https://youtu.be/abc123",
            "https://m.youtube.com/watch?v=abc123",
            "https://www.youtube-nocookie.com/embed/abc123",
        ] {
            assert_eq!(resolve(Some("video"), Some(u), None), LessonKind::Youtube, "{u}");
        }
        // 域名只匹配后缀，防止伪装域名混入
        assert_ne!(
            resolve(None, Some("https://notyoutube.comx/v.pdf"), None),
            LessonKind::Youtube
        );
    }

    #[test]
    fn test_missing_source_is_unknown() {
        assert_eq!(resolve(Some("video"), None, None), LessonKind::Unknown);
        assert_eq!(resolve(None, Some("   "), None), LessonKind::Unknown);
    }

    #[test]
    fn test_declared_type_used_verbatim_when_no_extension() {
        assert_eq!(
            resolve(Some("video"), Some("https://cdn.example.com/stream/123"), None),
            LessonKind::Video
        );
        assert_eq!(
            resolve(Some("scorm"), Some("https://cdn.example.com/pkg/123"), None),
            LessonKind::Declared("scorm".to_string())
        );
    }

    #[test]
    fn test_sentinel_unknown_falls_through_to_scheme_check() {
        assert_eq!(
            resolve(Some("unknown"), Some("https://example.com/article"), None),
            LessonKind::Link
        );
        assert_eq!(
            resolve(None, Some("https://example.com/article"), None),
            LessonKind::Link
        );
    }

    #[test]
    fn test_bare_file_reference() {
        // 后端上传文件只有相对路径，没有 URL 方案
        assert_eq!(
            resolve(None, None, Some("uploads/lessons/deck.pptx")),
            LessonKind::Ppt
        );
        assert_eq!(
            resolve(None, None, Some("uploads/lessons/readme")),
            LessonKind::Unknown
        );
    }

    #[test]
    fn test_non_http_scheme_is_unknown() {
        assert_eq!(
            resolve(None, Some("ftp://files.example.com/a"), None),
            LessonKind::Unknown
        );
    }
}
