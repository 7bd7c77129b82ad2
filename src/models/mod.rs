// src/models/mod.rs

pub mod api;

use self::api::{CourseDetailResponse, EnrollmentItem};
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// 课程学习状态。该状态不由后端下发，而是从完成时间戳与进度值推导，
/// 所有展示位置必须统一经过 `derive`，避免多处转换逻辑漂移。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl CourseStatus {
    /// 唯一的状态推导入口: 有完成时间戳即为已完成，否则按进度区分
    pub fn derive(completed_at: Option<DateTime<Utc>>, progress: f64) -> Self {
        if completed_at.is_some() {
            CourseStatus::Completed
        } else if progress > 0.0 {
            CourseStatus::InProgress
        } else {
            CourseStatus::NotStarted
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CourseStatus::NotStarted => "未开始",
            CourseStatus::InProgress => "进行中",
            CourseStatus::Completed => "已完成",
        }
    }

    pub fn get_display_info(&self) -> (fn(ColoredString) -> ColoredString, &'static str) {
        match self {
            CourseStatus::NotStarted => (|s| s.dimmed(), "未开始"),
            CourseStatus::InProgress => (|s| s.yellow(), "进行中"),
            CourseStatus::Completed => (|s| s.green(), "已完成"),
        }
    }
}

/// 客户端侧的“已选课程”记录: 选课信息、课程结构与后端进度镜像的合并视图。
/// 只有课时完成流程会修改它。
#[derive(Debug, Clone)]
pub struct CourseEntry {
    pub id: u64,
    pub title: String,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    /// 后端权威的课程完成百分比 (0-100)，客户端只镜像，不自行累加
    pub progress: f64,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub modules: Vec<Module>,
    pub resources: Vec<Resource>,
    pub instructors: Vec<Instructor>,
}

impl CourseEntry {
    /// 由选课记录与课程详情响应合并出客户端视图，
    /// 模块/课时/附件统一按后端的 order 字段排序
    pub fn from_parts(enrollment: &EnrollmentItem, detail: CourseDetailResponse) -> Self {
        let modules = detail
            .modules
            .into_iter()
            .sorted_by_key(|m| m.order.unwrap_or(i64::MAX))
            .map(|m| Module {
                id: m.id,
                title: m.title,
                lessons: m
                    .lessons
                    .into_iter()
                    .sorted_by_key(|l| l.order.unwrap_or(i64::MAX))
                    .map(|l| Lesson {
                        id: l.id,
                        title: l.title,
                        duration: l.duration,
                        lesson_type: l.lesson_type,
                        content_url: l.content_url,
                        content_file: l.content_file,
                        description: l.description,
                        text_content: l.text_content,
                        is_completed: l.is_completed,
                    })
                    .collect(),
            })
            .collect();

        Self {
            id: detail.id,
            title: detail.title,
            thumbnail: detail.thumbnail,
            description: detail.description,
            progress: 0.0,
            enrolled_at: enrollment.enrolled_at,
            started_at: None,
            completed_at: enrollment.completed_at,
            modules,
            resources: detail
                .resources
                .into_iter()
                .sorted_by_key(|r| r.order.unwrap_or(i64::MAX))
                .map(|r| Resource {
                    id: r.id,
                    title: r.title,
                    resource_type: r.resource_type,
                    url: r.url,
                    file: r.file,
                })
                .collect(),
            instructors: detail
                .course_instructors
                .into_iter()
                .map(|ci| Instructor {
                    id: ci.instructor.id,
                    name: ci.instructor.user_name.unwrap_or_else(|| "未知讲师".to_string()),
                    bio: ci.instructor.bio,
                })
                .collect(),
        }
    }

    /// 镜像后端下发的进度快照。进度不在本地从课时标记推导，
    /// 模块百分比 (`Module::progress`) 才是纯展示的本地推导值。
    pub fn set_progress_snapshot(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 100.0);
        if self.progress > 0.0 && self.started_at.is_none() {
            self.started_at = self.enrolled_at;
        }
    }

    pub fn status(&self) -> CourseStatus {
        CourseStatus::derive(self.completed_at, self.progress)
    }

    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    pub fn completed_lesson_count(&self) -> usize {
        self.modules
            .iter()
            .map(|m| m.lessons.iter().filter(|l| l.is_completed).count())
            .sum()
    }

    /// 搜索匹配: 课程标题、模块标题、课时标题，大小写不敏感
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        if self.title.to_lowercase().contains(&needle) {
            return true;
        }
        self.modules.iter().any(|m| {
            m.title.to_lowercase().contains(&needle)
                || m.lessons
                    .iter()
                    .any(|l| l.title.to_lowercase().contains(&needle))
        })
    }

    pub fn find_lesson(&self, lesson_id: u64) -> Option<&Lesson> {
        self.modules
            .iter()
            .flat_map(|m| m.lessons.iter())
            .find(|l| l.id == lesson_id)
    }

    /// 完成标记是单调的: 只置位，本子系统内从不复位
    pub fn mark_lesson_completed(&mut self, lesson_id: u64) {
        for module in &mut self.modules {
            if let Some(lesson) = module.lessons.iter_mut().find(|l| l.id == lesson_id) {
                lesson.is_completed = true;
                return;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Module {
    pub id: u64,
    pub title: String,
    pub lessons: Vec<Lesson>,
}

impl Module {
    /// 模块进度是推导值，不落库: 已完成课时占比，四舍五入到整数百分比。
    /// 它只用于展示，可能与后端的课程进度不一致。
    pub fn progress(&self) -> u8 {
        if self.lessons.is_empty() {
            return 0;
        }
        let done = self.lessons.iter().filter(|l| l.is_completed).count();
        (done as f64 * 100.0 / self.lessons.len() as f64).round() as u8
    }
}

#[derive(Debug, Clone)]
pub struct Lesson {
    pub id: u64,
    pub title: String,
    pub duration: Option<String>,
    /// 上游声明的课时类型，经常缺失或标错，展示与分发一律以嗅探结果为准
    pub lesson_type: Option<String>,
    pub content_url: Option<String>,
    pub content_file: Option<String>,
    pub description: Option<String>,
    pub text_content: Option<String>,
    pub is_completed: bool,
}

/// 课程级附件: 与课时走同一套查看分发，但不参与完成度统计
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: u64,
    pub title: String,
    pub resource_type: Option<String>,
    pub url: Option<String>,
    pub file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Instructor {
    pub id: u64,
    pub name: String,
    pub bio: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn lesson(id: u64, title: &str, completed: bool) -> Lesson {
        Lesson {
            id,
            title: title.to_string(),
            duration: None,
            lesson_type: None,
            content_url: None,
            content_file: None,
            description: None,
            text_content: None,
            is_completed: completed,
        }
    }

    fn course_with_lessons(lessons: Vec<Lesson>) -> CourseEntry {
        CourseEntry {
            id: 1,
            title: "示例课程".to_string(),
            thumbnail: None,
            description: None,
            progress: 0.0,
            enrolled_at: None,
            started_at: None,
            completed_at: None,
            modules: vec![Module {
                id: 10,
                title: "第一章".to_string(),
                lessons,
            }],
            resources: vec![],
            instructors: vec![],
        }
    }

    #[test]
    fn test_status_derivation() {
        // 有完成时间戳时，无论进度数值如何都判定为已完成
        let ts = chrono::Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(CourseStatus::derive(Some(ts), 40.0), CourseStatus::Completed);
        assert_eq!(CourseStatus::derive(Some(ts), 0.0), CourseStatus::Completed);

        assert_eq!(CourseStatus::derive(None, 40.0), CourseStatus::InProgress);
        assert_eq!(CourseStatus::derive(None, 0.0), CourseStatus::NotStarted);
    }

    #[test]
    fn test_module_progress_is_completed_ratio() {
        let module = Module {
            id: 1,
            title: "m".to_string(),
            lessons: vec![lesson(1, "a", true), lesson(2, "b", false)],
        };
        assert_eq!(module.progress(), 50);

        let empty = Module {
            id: 2,
            title: "空模块".to_string(),
            lessons: vec![],
        };
        assert_eq!(empty.progress(), 0);
    }

    #[test]
    fn test_matches_search_reaches_lesson_titles() {
        let course = course_with_lessons(vec![lesson(1, "Intro to Algebra", false)]);
        assert!(course.matches_search("algebra"));
        assert!(course.matches_search("ALGEBRA"));
        assert!(!course.matches_search("geometry"));
        // 课程标题与模块标题同样可命中
        assert!(course.matches_search("示例"));
        assert!(course.matches_search("第一章"));
    }

    #[test]
    fn test_mark_lesson_completed_is_monotonic() {
        let mut course = course_with_lessons(vec![lesson(1, "a", true), lesson(2, "b", false)]);
        course.mark_lesson_completed(2);
        assert!(course.find_lesson(2).unwrap().is_completed);
        // 重复标记不会翻转
        course.mark_lesson_completed(2);
        assert!(course.find_lesson(2).unwrap().is_completed);
        assert_eq!(course.completed_lesson_count(), 2);
    }
}
