// src/models/api.rs

use chrono::{DateTime, Utc};
use serde::Deserialize;

// --- 通用结构体 ---

/// 后端列表接口统一的分页信封
#[derive(Deserialize, Debug, Clone)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

// --- 选课 (Enrollment) API 响应结构体 ---

#[derive(Deserialize, Debug, Clone)]
pub struct EnrollmentItem {
    pub id: u64,
    pub course: u64,
    pub course_title: String,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
}

// --- 课程详情 (Course) API 响应结构体 ---

#[derive(Deserialize, Debug, Clone)]
pub struct CourseDetailResponse {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub modules: Vec<ModulePayload>,
    #[serde(default)]
    pub resources: Vec<ResourcePayload>,
    #[serde(default)]
    pub course_instructors: Vec<CourseInstructorPayload>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ModulePayload {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub lessons: Vec<LessonPayload>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LessonPayload {
    pub id: u64,
    pub title: String,
    pub lesson_type: Option<String>,
    pub content_url: Option<String>,
    pub content_file: Option<String>,
    pub duration: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    pub description: Option<String>,
    pub text_content: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResourcePayload {
    pub id: u64,
    pub title: String,
    pub resource_type: Option<String>,
    pub url: Option<String>,
    pub file: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CourseInstructorPayload {
    pub id: u64,
    pub instructor: InstructorPayload,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct InstructorPayload {
    pub id: u64,
    pub user_name: Option<String>,
    pub bio: Option<String>,
}

// --- 进度 (Progress) API 响应结构体 ---

/// 课程进度由后端计算，客户端只做镜像展示
#[derive(Deserialize, Debug, Clone)]
pub struct ProgressResponse {
    pub progress: f64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionAck {
    #[serde(default)]
    pub detail: Option<String>,
}

// --- 作业 (Assignment) API 响应结构体 ---

#[derive(Deserialize, Debug, Clone)]
pub struct AssignmentSummary {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub course: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SubmissionRecord {
    pub id: u64,
    pub assignment: u64,
    pub response_text: Option<String>,
    pub file: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub grade: Option<String>,
}

// --- 消息 (Messaging) API 响应结构体 ---

#[derive(Deserialize, Debug, Clone)]
pub struct MessageRecord {
    pub id: u64,
    pub subject: String,
    pub content: String,
    pub message_type: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub sender_name: Option<String>,
    #[serde(default)]
    pub read: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UnreadCountResponse {
    pub unread_count: u64,
}

// --- 用户与分组 API 响应结构体 ---

#[derive(Deserialize, Debug, Clone)]
pub struct UserSummary {
    pub id: u64,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GroupSummary {
    pub id: u64,
    pub name: String,
}
