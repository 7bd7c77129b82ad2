// src/catalog.rs

use crate::{
    cli::{Cli, SortKey},
    constants,
    models::{CourseEntry, CourseStatus},
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeSet, fs, path::PathBuf};

/// 课程列表的过滤与排序条件
#[derive(Debug, Clone)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub status: Option<CourseStatus>,
    pub bookmarked_only: bool,
    pub sort: SortKey,
}

impl CatalogFilter {
    pub fn from_args(args: &Cli) -> Self {
        Self {
            search: args.search.clone().filter(|s| !s.trim().is_empty()),
            status: args.status.map(Into::into),
            bookmarked_only: args.bookmarked,
            sort: args.sort,
        }
    }

    pub fn reset(&mut self) {
        self.search = None;
        self.status = None;
        self.bookmarked_only = false;
    }

    /// 当前生效条件的单行描述，用于列表页眉
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(s) = &self.search {
            parts.push(format!("搜索 '{}'", s));
        }
        if let Some(st) = self.status {
            parts.push(format!("状态 {}", st.label()));
        }
        if self.bookmarked_only {
            parts.push("仅收藏".to_string());
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}

/// 过滤 + 排序。总是从规范列表（含最新进度补丁）重算，
/// 返回借用视图，不复制条目，也就不存在被旧快照覆盖的窗口。
pub fn apply<'a>(
    courses: &'a [CourseEntry],
    filter: &CatalogFilter,
    bookmarks: &BookmarkSet,
) -> Vec<&'a CourseEntry> {
    let mut list: Vec<&CourseEntry> = courses
        .iter()
        .filter(|c| {
            filter
                .search
                .as_deref()
                .is_none_or(|needle| c.matches_search(needle))
        })
        .filter(|c| filter.status.is_none_or(|s| c.status() == s))
        .filter(|c| !filter.bookmarked_only || bookmarks.contains(c.id))
        .collect();

    match filter.sort {
        SortKey::Recent => {
            // 最近选课在前，无时间戳的排在最后
            list.sort_by(|a, b| match (b.enrolled_at, a.enrolled_at) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            });
        }
        SortKey::Title => {
            list.sort_by_key(|c| c.title.to_lowercase());
        }
        SortKey::Progress => {
            list.sort_by(|a, b| {
                b.progress
                    .partial_cmp(&a.progress)
                    .unwrap_or(Ordering::Equal)
            });
        }
    }
    debug!("过滤后课程数量: {} / {}", list.len(), courses.len());
    list
}

/// 收藏集: 以课程 ID 为键的用户本地状态，落盘在配置目录下，
/// 重启后仍然有效。
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BookmarkSet {
    #[serde(default)]
    courses: BTreeSet<u64>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl BookmarkSet {
    /// 从配置目录加载；文件不存在或无法解析时从空集开始
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("无法获取用户主目录，收藏将不会持久化");
            return Self::default();
        };
        Self::load_from(path)
    }

    pub fn load_from(path: PathBuf) -> Self {
        let mut set = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<BookmarkSet>(&content).unwrap_or_else(|e| {
                warn!("收藏文件 '{}' 解析失败，忽略: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        set.path = Some(path);
        set
    }

    /// 不落盘的内存收藏集
    pub fn in_memory() -> Self {
        Self::default()
    }

    fn default_path() -> Option<PathBuf> {
        Some(
            dirs::home_dir()?
                .join(constants::CONFIG_DIR_NAME)
                .join(constants::BOOKMARK_FILE_NAME),
        )
    }

    pub fn contains(&self, course_id: u64) -> bool {
        self.courses.contains(&course_id)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// 切换收藏状态并尽力落盘，返回切换后的状态
    pub fn toggle(&mut self, course_id: u64) -> bool {
        let now_bookmarked = if self.courses.remove(&course_id) {
            false
        } else {
            self.courses.insert(course_id);
            true
        };
        self.save();
        now_bookmarked
    }

    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let result = (|| -> std::io::Result<()> {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(path, serde_json::to_string_pretty(self)?)
        })();
        if let Err(e) = result {
            // 收藏只是便利功能，落盘失败不影响主流程
            warn!("保存收藏文件 '{}' 失败: {}", path.display(), e);
        }
    }
}
