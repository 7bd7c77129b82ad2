// src/progress.rs

use crate::{
    api::LmsApi,
    error::*,
    models::CourseEntry,
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::sync::Arc;

/// 课程进度汇总器。完成一个课时后负责把后端权威进度镜像回本地课程记录。
pub struct ProgressTracker {
    api: Arc<LmsApi>,
}

impl ProgressTracker {
    pub fn new(api: Arc<LmsApi>) -> Self {
        Self { api }
    }

    /// 课时完成流程:
    /// 1. 上报课时完成
    /// 2. 拉取课程进度（严格在上报成功之后，串行依赖）
    /// 3. 用返回的百分比补丁本地课程记录并维护状态时间戳
    ///
    /// 后端对“标记完成”是幂等的，重复调用会重新发起两次请求，
    /// 客户端不做去重；展示用的完成标记保持单调。
    pub async fn complete_lesson(
        &self,
        course: &mut CourseEntry,
        lesson_id: u64,
    ) -> AppResult<f64> {
        info!("上报课时完成: course={} lesson={}", course.id, lesson_id);
        let ack = self.api.complete_lesson(lesson_id).await?;
        debug!(
            "课时完成回执: {}",
            ack.detail.as_deref().unwrap_or("(无内容)")
        );

        let response = self.api.course_progress(course.id).await?;
        info!(
            "课程 {} 进度刷新: {:.1}% -> {:.1}%",
            course.id, course.progress, response.progress
        );

        course.mark_lesson_completed(lesson_id);
        apply_progress(course, response.progress, Utc::now());
        Ok(course.progress)
    }
}

/// 进度补丁的唯一入口: 镜像后端百分比并维护状态时间戳。
/// 100% 时写入完成时间，首次 >0 时写入开始时间；时间戳只写不擦。
pub fn apply_progress(course: &mut CourseEntry, percentage: f64, now: DateTime<Utc>) {
    course.progress = percentage.clamp(0.0, 100.0);
    if course.progress >= 100.0 {
        if course.completed_at.is_none() {
            course.completed_at = Some(now);
        }
    } else if course.progress > 0.0 && course.started_at.is_none() {
        course.started_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseStatus;
    use chrono::TimeZone;

    fn course() -> CourseEntry {
        CourseEntry {
            id: 7,
            title: "测试课程".to_string(),
            thumbnail: None,
            description: None,
            progress: 0.0,
            enrolled_at: None,
            started_at: None,
            completed_at: None,
            modules: vec![],
            resources: vec![],
            instructors: vec![],
        }
    }

    #[test]
    fn test_apply_progress_sets_started_once() {
        let mut c = course();
        let t1 = Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 5, 2, 10, 0, 0).unwrap();

        apply_progress(&mut c, 25.0, t1);
        assert_eq!(c.status(), CourseStatus::InProgress);
        assert_eq!(c.started_at, Some(t1));

        // 后续进度刷新不改写开始时间
        apply_progress(&mut c, 50.0, t2);
        assert_eq!(c.started_at, Some(t1));
        assert_eq!(c.progress, 50.0);
    }

    #[test]
    fn test_apply_progress_completion_timestamp() {
        let mut c = course();
        let t1 = Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap();
        apply_progress(&mut c, 100.0, t1);
        assert_eq!(c.status(), CourseStatus::Completed);
        assert_eq!(c.completed_at, Some(t1));

        let t2 = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        apply_progress(&mut c, 100.0, t2);
        assert_eq!(c.completed_at, Some(t1));
    }

    #[test]
    fn test_apply_progress_clamps_out_of_range() {
        let mut c = course();
        let t = Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap();
        apply_progress(&mut c, 130.0, t);
        assert_eq!(c.progress, 100.0);
        let mut c2 = course();
        apply_progress(&mut c2, -3.0, t);
        assert_eq!(c2.progress, 0.0);
        assert_eq!(c2.status(), CourseStatus::NotStarted);
    }
}
