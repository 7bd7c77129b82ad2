// src/outline.rs

use crate::{
    constants,
    models::{CourseEntry, Lesson, Resource},
    player::MediaKind,
    resolver::{self, LessonKind},
    utils,
    viewer::{self, ViewPlan},
};
use colored::*;
use std::collections::BTreeSet;

/// 选中课时后由有效类型驱动的动作。
/// 分发只看嗅探出的有效类型，声明类型不参与。
#[derive(Debug, Clone, PartialEq)]
pub enum LessonAction {
    OpenPlayer { url: String, kind: MediaKind },
    OpenDocument { plan: ViewPlan },
    OpenLink { url: String },
    NoOp,
}

pub fn dispatch(lesson: &Lesson) -> LessonAction {
    let kind = resolver::resolve_lesson(lesson);
    let source = lesson
        .content_url
        .clone()
        .or_else(|| lesson.content_file.clone());
    action_for(kind, source)
}

/// 课程附件走同一张分发表，但调用方不会为其上报完成
pub fn dispatch_resource(resource: &Resource) -> LessonAction {
    let kind = resolver::resolve_resource(resource);
    let source = resource.url.clone().or_else(|| resource.file.clone());
    action_for(kind, source)
}

fn action_for(kind: LessonKind, source: Option<String>) -> LessonAction {
    let Some(url) = source else {
        return LessonAction::NoOp;
    };
    match kind {
        LessonKind::Video => LessonAction::OpenPlayer {
            url,
            kind: MediaKind::Native,
        },
        LessonKind::Youtube => LessonAction::OpenPlayer {
            url,
            kind: MediaKind::Youtube,
        },
        LessonKind::Pdf | LessonKind::Ppt | LessonKind::Doc => {
            let plan = viewer::build_view_plan(&url, &kind);
            LessonAction::OpenDocument { plan }
        }
        LessonKind::Link => LessonAction::OpenLink { url },
        // 表外的声明类型回退到文档查看器的“打开原始链接”面板
        LessonKind::Declared(_) => {
            let plan = viewer::build_view_plan(&url, &kind);
            LessonAction::OpenDocument { plan }
        }
        LessonKind::Unknown => LessonAction::NoOp,
    }
}

/// 同一时刻至多一个活动查看面。选中新课时必须先清掉旧状态，
/// 播放器与文档面板永远不会同时存在。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    None,
    Player { lesson_id: u64 },
    Document { lesson_id: u64 },
}

impl ActiveView {
    pub fn clear(&mut self) {
        *self = ActiveView::None;
    }

    pub fn open_player(&mut self, lesson_id: u64) {
        self.clear();
        *self = ActiveView::Player { lesson_id };
    }

    pub fn open_document(&mut self, lesson_id: u64) {
        self.clear();
        *self = ActiveView::Document { lesson_id };
    }
}

/// 课程大纲: 模块可折叠的课时树，带完成标记与有效类型标签
pub struct CourseOutline {
    collapsed: BTreeSet<u64>,
}

impl Default for CourseOutline {
    fn default() -> Self {
        Self::new()
    }
}

impl CourseOutline {
    pub fn new() -> Self {
        Self {
            collapsed: BTreeSet::new(),
        }
    }

    /// 切换模块折叠状态，返回切换后是否折叠
    pub fn toggle_module(&mut self, module_id: u64) -> bool {
        if self.collapsed.remove(&module_id) {
            false
        } else {
            self.collapsed.insert(module_id);
            true
        }
    }

    pub fn is_collapsed(&self, module_id: u64) -> bool {
        self.collapsed.contains(&module_id)
    }

    /// 可见课时的编号顺序表（折叠模块内的课时不编号）。
    /// 渲染与选择共用该表，保证编号与显示一致。
    pub fn visible_lessons(&self, course: &CourseEntry) -> Vec<u64> {
        course
            .modules
            .iter()
            .filter(|m| !self.is_collapsed(m.id))
            .flat_map(|m| m.lessons.iter().map(|l| l.id))
            .collect()
    }

    /// 渲染课程树并返回编号→课时 id 的映射
    pub fn render(&self, course: &CourseEntry) -> Vec<u64> {
        let (color_fn, status_label) = course.status().get_display_info();
        println!(
            "\n{}  {}  进度 {:.0}%  课时 {}/{}",
            course.title.bold(),
            color_fn(status_label.into()),
            course.progress,
            course.completed_lesson_count(),
            course.lesson_count()
        );
        if !course.instructors.is_empty() {
            let names: Vec<&str> = course.instructors.iter().map(|i| i.name.as_str()).collect();
            println!("讲师: {}", names.join(", ").dimmed());
        }
        if let Some(desc) = &course.description {
            println!("{}", utils::truncate_text(desc, constants::UI_WIDTH * 2).dimmed());
        }

        let mut numbering = Vec::new();
        for (mi, module) in course.modules.iter().enumerate() {
            let marker = if self.is_collapsed(module.id) { "▸" } else { "▾" };
            println!(
                "\n [{}] {} {} ({} 课时 · {}%)",
                format!("m{}", mi + 1).yellow(),
                marker,
                module.title.bold(),
                module.lessons.len(),
                module.progress()
            );
            if self.is_collapsed(module.id) {
                continue;
            }
            for lesson in &module.lessons {
                numbering.push(lesson.id);
                let done = if lesson.is_completed {
                    "✓".green()
                } else {
                    "·".dimmed()
                };
                let kind = resolver::resolve_lesson(lesson);
                let duration = lesson
                    .duration
                    .as_deref()
                    .map(|d| format!(" {}", d.dimmed()))
                    .unwrap_or_default();
                println!(
                    "   [{}] {} {} ({}){}",
                    numbering.len().to_string().yellow(),
                    done,
                    utils::truncate_text(&lesson.title, constants::TITLE_TRUNCATE_LENGTH),
                    kind.label(),
                    duration
                );
            }
        }

        if !course.resources.is_empty() {
            println!("\n 课程附件 (不计入完成度):");
            for (ri, resource) in course.resources.iter().enumerate() {
                let kind = resolver::resolve_resource(resource);
                println!(
                    "   [{}] {} ({})",
                    format!("r{}", ri + 1).yellow(),
                    utils::truncate_text(&resource.title, constants::TITLE_TRUNCATE_LENGTH),
                    kind.label()
                );
            }
        }
        numbering
    }
}
