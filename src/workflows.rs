// src/workflows.rs

use crate::{
    StudyJobContext,
    catalog::{self, BookmarkSet, CatalogFilter},
    cli::SortKey,
    config::token::save_token,
    constants,
    error::{AppError, AppResult},
    models::{CourseEntry, CourseStatus},
    outline::{ActiveView, CourseOutline, LessonAction, dispatch, dispatch_resource},
    player::{PlaybackSession, run_transport},
    progress::ProgressTracker,
    symbols, ui, utils, viewer,
};
use colored::*;
use futures::{StreamExt, stream};
use log::{debug, error, info, warn};
use std::{collections::HashMap, sync::atomic::Ordering};

/// 拉取选课列表并并发补全课程详情与后端进度快照
pub(crate) async fn load_catalog(context: &StudyJobContext) -> AppResult<Vec<CourseEntry>> {
    let enrollments = context.api.list_enrollments().await?;
    if enrollments.is_empty() {
        return Ok(vec![]);
    }

    ui::plain("");
    ui::info(&format!(
        "正在拉取 {} 门课程的详情 (并发数: {})...",
        enrollments.len(),
        context.config.max_workers
    ));
    let pbar = ui::new_tasks_progress_bar(enrollments.len() as u64, "拉取");

    let mut detail_stream = stream::iter(enrollments)
        .map(|enrollment| {
            let api = context.api.clone();
            async move {
                let detail = api.course_detail(enrollment.course).await;
                // 进度是后端权威值，详情拉取成功后紧跟着镜像一份快照
                let progress = match &detail {
                    Ok(_) => Some(api.course_progress(enrollment.course).await),
                    Err(_) => None,
                };
                (enrollment, detail, progress)
            }
        })
        .buffer_unordered(context.config.max_workers);

    let mut courses = Vec::new();
    let mut failed = 0;
    while let Some((enrollment, detail, progress)) = detail_stream.next().await {
        if context.cancellation_token.load(Ordering::Relaxed) {
            pbar.finish_and_clear();
            return Err(AppError::UserInterrupt);
        }
        match detail {
            Ok(detail) => {
                let mut entry = CourseEntry::from_parts(&enrollment, detail);
                match progress {
                    Some(Ok(p)) => entry.set_progress_snapshot(p.progress),
                    Some(Err(e)) => {
                        warn!("课程 {} 进度拉取失败: {}", enrollment.course, e)
                    }
                    None => {}
                }
                pbar.println(format!(
                    "{} {}",
                    *symbols::OK,
                    utils::truncate_text(&entry.title, 60)
                ));
                courses.push(entry);
            }
            Err(e @ AppError::TokenInvalid) => {
                pbar.finish_and_clear();
                return Err(e);
            }
            Err(e) => {
                failed += 1;
                error!("课程 '{}' 详情拉取失败: {}", enrollment.course_title, e);
                pbar.println(format!(
                    "{} {} ({})",
                    *symbols::ERROR,
                    utils::truncate_text(&enrollment.course_title, 60),
                    e
                ));
            }
        }
        pbar.inc(1);
    }
    pbar.finish_and_clear();

    if failed > 0 {
        ui::warn(&format!("{} 门课程详情拉取失败，已跳过。", failed));
    }

    // buffer_unordered 的完成顺序不稳定，恢复“最近选课在前”的规范顺序
    courses.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at).then(a.id.cmp(&b.id)));
    Ok(courses)
}

/// 鉴权失败时提示输入新 Token 并重试一次
async fn load_catalog_with_token_retry(context: &StudyJobContext) -> AppResult<Vec<CourseEntry>> {
    match load_catalog(context).await {
        Err(AppError::TokenInvalid) if !context.non_interactive => {
            warn!("Token 失效，提示用户重新输入");
            ui::warn("Token 无效或已过期。");
            let new_token = ui::prompt_hidden("请输入新的 Access Token")?;
            let new_token = new_token.trim().to_string();
            if new_token.is_empty() {
                return Err(AppError::TokenMissing);
            }
            *context.token.lock().await = new_token.clone();
            if ui::confirm("是否保存该 Token 以便下次使用?", true)
                && let Err(e) = save_token(&new_token)
            {
                warn!("保存 Token 失败: {}", e);
            }
            load_catalog(context).await
        }
        other => other,
    }
}

fn print_course_cards(
    courses: &[&CourseEntry],
    bookmarks: &BookmarkSet,
    filter: &CatalogFilter,
) {
    if let Some(summary) = filter.summary() {
        ui::info(&format!("当前过滤: {}", summary));
    }
    if courses.is_empty() {
        ui::plain("  (没有符合条件的课程)");
        return;
    }
    for (i, course) in courses.iter().enumerate() {
        let (color_fn, label) = course.status().get_display_info();
        let star = if bookmarks.contains(course.id) {
            "★".yellow()
        } else {
            "☆".dimmed()
        };
        println!(
            " [{}] {} {}  {}  进度 {:>3.0}%  课时 {}/{}",
            format!("{:>2}", i + 1).yellow(),
            star,
            utils::truncate_text(&course.title, constants::TITLE_TRUNCATE_LENGTH).bold(),
            color_fn(label.into()),
            course.progress,
            course.completed_lesson_count(),
            course.lesson_count()
        );
    }
    let completed = courses
        .iter()
        .filter(|c| c.status() == CourseStatus::Completed)
        .count();
    let in_progress = courses
        .iter()
        .filter(|c| c.status() == CourseStatus::InProgress)
        .count();
    println!(
        "\n 共 {} 门 | {} | {}",
        courses.len(),
        format!("已完成: {}", completed).green(),
        format!("进行中: {}", in_progress).yellow()
    );
}

/// 运行列表模式（--list）
pub(crate) async fn run_list(context: StudyJobContext) -> AppResult<()> {
    ui::print_header("我的课程");
    let courses = load_catalog(&context).await?;
    if courses.is_empty() {
        ui::info("当前没有已选课程。");
        return Ok(());
    }
    let bookmarks = BookmarkSet::load();
    let filter = CatalogFilter::from_args(&context.args);
    let visible = catalog::apply(&courses, &filter, &bookmarks);
    print_course_cards(&visible, &bookmarks, &filter);
    Ok(())
}

/// 运行单课程模式（--course-id）
pub(crate) async fn run_course_by_id(context: StudyJobContext, course_id: u64) -> AppResult<()> {
    let mut courses = load_catalog_with_token_retry(&context).await?;
    let Some(index) = courses.iter().position(|c| c.id == course_id) else {
        return Err(AppError::UserInputError(format!(
            "课程 {} 不在当前用户的已选列表中。",
            course_id
        )));
    };
    open_course(&context, &mut courses[index]).await
}

/// 运行交互模式
pub(crate) async fn run_interactive(context: StudyJobContext) -> AppResult<()> {
    ui::print_header("交互学习模式");
    ui::plain(&format!(
        "输入课程编号打开大纲。命令: f <词>=搜索  t <状态>=按状态过滤  b <编号>=收藏  o <排序>=排序  r=重置过滤\n直接回车退出，按 {} 可随时中断。",
        *symbols::CTRL_C
    ));

    let mut courses = load_catalog_with_token_retry(&context).await?;
    if courses.is_empty() {
        ui::info("当前没有已选课程。");
        return Ok(());
    }

    let mut bookmarks = BookmarkSet::load();
    let mut filter = CatalogFilter::from_args(&context.args);

    loop {
        if context.cancellation_token.load(Ordering::Relaxed) {
            return Err(AppError::UserInterrupt);
        }

        // 过滤视图总是基于带最新进度补丁的规范列表重算
        let visible_ids: Vec<u64> = {
            let visible = catalog::apply(&courses, &filter, &bookmarks);
            ui::print_sub_header("我的课程");
            print_course_cards(&visible, &bookmarks, &filter);
            visible.iter().map(|c| c.id).collect()
        };

        let input = match ui::prompt("课程编号或命令", None) {
            Ok(input) => input,
            Err(_) => return Err(AppError::UserInterrupt),
        };
        if input.is_empty() {
            break;
        }

        if let Some(rest) = input.strip_prefix("f ") {
            let needle = rest.trim();
            filter.search = (!needle.is_empty()).then(|| needle.to_string());
        } else if let Some(rest) = input.strip_prefix("t ") {
            match parse_status(rest.trim()) {
                Some(status) => filter.status = Some(status),
                None => ui::warn("无效的状态，可选: not_started / in_progress / completed"),
            }
        } else if let Some(rest) = input.strip_prefix("o ") {
            match parse_sort(rest.trim()) {
                Some(sort) => filter.sort = sort,
                None => ui::warn("无效的排序，可选: recent / title / progress"),
            }
        } else if let Some(rest) = input.strip_prefix("b ") {
            match pick_from(&visible_ids, rest.trim()) {
                Some(course_id) => {
                    let bookmarked = bookmarks.toggle(course_id);
                    let title = courses
                        .iter()
                        .find(|c| c.id == course_id)
                        .map(|c| c.title.as_str())
                        .unwrap_or("?");
                    if bookmarked {
                        ui::info(&format!("已收藏: {}", title));
                    } else {
                        ui::info(&format!("已取消收藏: {}", title));
                    }
                }
                None => ui::warn("无效的课程编号"),
            }
        } else if input == "r" {
            filter.reset();
        } else if utils::is_numeric_input(&input) {
            match pick_from(&visible_ids, &input)
                .and_then(|course_id| courses.iter().position(|c| c.id == course_id))
            {
                Some(index) => {
                    if let Err(e) = open_course(&context, &mut courses[index]).await {
                        if matches!(e, AppError::UserInterrupt) {
                            return Err(e);
                        }
                        error!("课程会话出错: {}", e);
                        eprintln!(
                            "\n{} 处理课程时发生错误: {}",
                            *symbols::ERROR,
                            e.to_string().red()
                        );
                    }
                }
                None => ui::warn("无效的课程编号"),
            }
        } else {
            ui::warn("无法识别的输入。");
        }
    }

    ui::plain("");
    ui::info("退出交互模式。");
    Ok(())
}

/// 课程大纲会话: 渲染课时树，按有效类型分发打开动作
async fn open_course(context: &StudyJobContext, course: &mut CourseEntry) -> AppResult<()> {
    let tracker = ProgressTracker::new(context.api.clone());
    let mut outline = CourseOutline::new();
    let mut active_view = ActiveView::default();
    // 每个课时保留自己的播放会话: 再次打开时回到 idle、位置清零，
    // 音量与倍速等偏好得以延续
    let mut sessions: HashMap<u64, PlaybackSession> = HashMap::new();
    info!("打开课程大纲: {} ({})", course.title, course.id);

    loop {
        if context.cancellation_token.load(Ordering::Relaxed) {
            return Err(AppError::UserInterrupt);
        }

        ui::print_header(&format!("课程大纲 - {}", utils::truncate_text(&course.title, 50)));
        let numbering = outline.render(course);
        ui::plain("\n输入课时编号打开课时；m<N> 折叠/展开模块；r<N> 打开附件；直接回车返回课程列表。");

        let input = match ui::prompt("课时编号或命令", None) {
            Ok(input) => input,
            Err(_) => return Err(AppError::UserInterrupt),
        };
        if input.is_empty() {
            break;
        }

        if let Some(rest) = input.strip_prefix('m')
            && let Ok(n) = rest.trim().parse::<usize>()
        {
            match course.modules.get(n.wrapping_sub(1)) {
                Some(module) => {
                    outline.toggle_module(module.id);
                }
                None => ui::warn("无效的模块编号"),
            }
            continue;
        }

        if let Some(rest) = input.strip_prefix('r')
            && let Ok(n) = rest.trim().parse::<usize>()
        {
            match course.resources.get(n.wrapping_sub(1)).cloned() {
                Some(resource) => {
                    open_resource(&mut active_view, &resource).await?;
                }
                None => ui::warn("无效的附件编号"),
            }
            continue;
        }

        if let Ok(n) = input.parse::<usize>() {
            match numbering.get(n.wrapping_sub(1)).copied() {
                Some(lesson_id) => {
                    open_lesson(&tracker, course, lesson_id, &mut active_view, &mut sessions)
                        .await?;
                }
                None => ui::warn("无效的课时编号"),
            }
            continue;
        }

        ui::warn("无法识别的输入。");
    }
    Ok(())
}

/// 打开单个课时。选中新课时先清掉上一个查看面，
/// 播放器与文档面板绝不同时存在。
async fn open_lesson(
    tracker: &ProgressTracker,
    course: &mut CourseEntry,
    lesson_id: u64,
    active_view: &mut ActiveView,
    sessions: &mut HashMap<u64, PlaybackSession>,
) -> AppResult<()> {
    active_view.clear();
    let Some(lesson) = course.find_lesson(lesson_id).cloned() else {
        return Ok(());
    };
    debug!("选中课时 {} '{}'", lesson.id, lesson.title);

    if let Some(text) = lesson.description.as_deref().or(lesson.text_content.as_deref()) {
        println!("\n{}", utils::truncate_text(text, constants::UI_WIDTH * 2).dimmed());
    }

    match dispatch(&lesson) {
        LessonAction::OpenPlayer { url, kind } => {
            active_view.open_player(lesson_id);
            let duration = lesson.duration.as_deref().and_then(utils::parse_duration_secs);
            if duration.is_none() {
                ui::warn("课时未标注时长，本次播放无法检测完成。");
            }
            // 重新打开同一媒体: 状态回到 idle、位置清零，完成标记复位
            let session = sessions
                .entry(lesson_id)
                .and_modify(|s| s.reopen())
                .or_insert_with(|| PlaybackSession::new(kind, duration));
            let outcome = run_transport(&lesson.title, &url, session).await?;
            active_view.clear();
            if outcome.completed {
                report_completion(tracker, course, lesson_id).await;
            }
        }
        LessonAction::OpenDocument { plan } => {
            active_view.open_document(lesson_id);
            let opened = viewer::render(&lesson.title, &plan);
            // 查看器真正给出内容才算消费；误路由到文档面板的不算
            if opened {
                report_completion(tracker, course, lesson_id).await;
            }
        }
        LessonAction::OpenLink { url } => {
            active_view.open_document(lesson_id);
            ui::box_message(
                &lesson.title,
                &["请在浏览器中打开外部链接:", "", url.as_str()],
                |s| s.cyan(),
            );
            if ui::confirm("将该课时标记为已读?", true) {
                report_completion(tracker, course, lesson_id).await;
            }
        }
        LessonAction::NoOp => {
            ui::info("该课时没有可打开的内容，请选择其他课时。");
        }
    }
    Ok(())
}

/// 附件与课时共用分发表，但从不上报完成
async fn open_resource(active_view: &mut ActiveView, resource: &crate::models::Resource) -> AppResult<()> {
    active_view.clear();
    match dispatch_resource(resource) {
        LessonAction::OpenPlayer { url, kind } => {
            let mut session = PlaybackSession::new(kind, None);
            run_transport(&resource.title, &url, &mut session).await?;
        }
        LessonAction::OpenDocument { plan } => {
            viewer::render(&resource.title, &plan);
        }
        LessonAction::OpenLink { url } => {
            ui::box_message(
                &resource.title,
                &["请在浏览器中打开外部链接:", "", url.as_str()],
                |s| s.cyan(),
            );
        }
        LessonAction::NoOp => {
            ui::info("该附件没有可打开的内容。");
        }
    }
    Ok(())
}

/// 完成上报路径的失败策略: 只记日志，不打扰用户，
/// 界面停留在完成前状态，下次打开课时可重试。
async fn report_completion(tracker: &ProgressTracker, course: &mut CourseEntry, lesson_id: u64) {
    match tracker.complete_lesson(course, lesson_id).await {
        Ok(progress) => {
            println!("{} 学习进度已更新: {:.0}%", *symbols::DONE, progress);
            if course.status() == CourseStatus::Completed {
                println!("{}", "恭喜，本课程已全部完成！".green().bold());
            }
        }
        Err(e) => {
            error!("课时 {} 完成上报失败: {}", lesson_id, e);
        }
    }
}

fn pick_from(visible_ids: &[u64], input: &str) -> Option<u64> {
    let n = input.trim().parse::<usize>().ok()?;
    visible_ids.get(n.wrapping_sub(1)).copied()
}

fn parse_status(raw: &str) -> Option<CourseStatus> {
    match raw.to_lowercase().as_str() {
        "not_started" | "未开始" => Some(CourseStatus::NotStarted),
        "in_progress" | "进行中" => Some(CourseStatus::InProgress),
        "completed" | "已完成" => Some(CourseStatus::Completed),
        _ => None,
    }
}

fn parse_sort(raw: &str) -> Option<SortKey> {
    match raw.to_lowercase().as_str() {
        "recent" | "最近" => Some(SortKey::Recent),
        "title" | "标题" => Some(SortKey::Title),
        "progress" | "进度" => Some(SortKey::Progress),
        _ => None,
    }
}
