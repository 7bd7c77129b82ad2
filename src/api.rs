// src/api.rs

use crate::{
    client::RobustClient,
    error::*,
    models::api::{
        AssignmentSummary, CompletionAck, CourseDetailResponse, EnrollmentItem, GroupSummary,
        MessageRecord, Paginated, ProgressResponse, SubmissionRecord, UnreadCountResponse,
        UserSummary,
    },
};
use dashmap::DashMap;
use log::{debug, info};
use reqwest::Method;
use serde_json::{Value, json};
use std::{path::Path, sync::Arc};
use tokio_util::io::ReaderStream;

/// 后端 REST 接口的类型化封装。路径模板来自外部配置，
/// 请求一律经过带重试的客户端。
pub struct LmsApi {
    client: Arc<RobustClient>,
    /// 课程结构在一次会话内基本不变，详情按课程 ID 缓存；
    /// 进度接口是权威增量信号，永不缓存
    detail_cache: DashMap<u64, CourseDetailResponse>,
}

impl LmsApi {
    pub fn new(client: Arc<RobustClient>) -> Self {
        Self {
            client,
            detail_cache: DashMap::new(),
        }
    }

    // --- 课程与进度 ---

    /// 逐页拉取当前用户的全部选课记录，翻页跟随后端下发的 next 链接
    pub async fn list_enrollments(&self) -> AppResult<Vec<EnrollmentItem>> {
        let mut all: Vec<EnrollmentItem> = Vec::new();
        let mut payload: Paginated<EnrollmentItem> =
            self.client.fetch_json("ENROLLMENTS", &[("page", "1")]).await?;
        loop {
            all.append(&mut payload.results);
            match payload.next.take() {
                Some(next) => {
                    debug!("跟随分页链接: {}", next);
                    payload = self.client.fetch_json_url(&next).await?;
                }
                None => break,
            }
        }
        info!("共拉取 {} 条选课记录", all.len());
        Ok(all)
    }

    pub async fn course_detail(&self, course_id: u64) -> AppResult<CourseDetailResponse> {
        if let Some(entry) = self.detail_cache.get(&course_id) {
            debug!("课程详情缓存命中: {}", course_id);
            return Ok(entry.value().clone());
        }
        let id = course_id.to_string();
        let detail: CourseDetailResponse = self
            .client
            .fetch_json("COURSE_DETAILS", &[("course_id", id.as_str())])
            .await?;
        self.detail_cache.insert(course_id, detail.clone());
        Ok(detail)
    }

    pub async fn course_progress(&self, course_id: u64) -> AppResult<ProgressResponse> {
        let id = course_id.to_string();
        self.client
            .fetch_json("COURSE_PROGRESS", &[("course_id", id.as_str())])
            .await
    }

    pub async fn complete_lesson(&self, lesson_id: u64) -> AppResult<CompletionAck> {
        let id = lesson_id.to_string();
        self.client
            .send_json(
                Method::POST,
                "COMPLETE_LESSON",
                &[("lesson_id", id.as_str())],
                &json!({}),
            )
            .await
    }

    // --- 作业 ---

    pub async fn assignments(&self, course_id: u64) -> AppResult<Vec<AssignmentSummary>> {
        let id = course_id.to_string();
        self.client
            .fetch_json("ASSIGNMENTS", &[("course_id", id.as_str())])
            .await
    }

    pub async fn my_submissions(&self) -> AppResult<Vec<SubmissionRecord>> {
        self.client.fetch_json("ASSIGNMENT_SUBMISSIONS", &[]).await
    }

    /// 提交作业: 文本 + 可选附件。附件流式上传，不整体读入内存。
    pub async fn submit_assignment(
        &self,
        assignment_id: u64,
        response_text: &str,
        file: Option<&Path>,
    ) -> AppResult<SubmissionRecord> {
        let mut form =
            reqwest::multipart::Form::new().text("response_text", response_text.to_string());
        if let Some(path) = file {
            let file_name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("attachment")
                .to_string();
            let file = tokio::fs::File::open(path).await?;
            let part = reqwest::multipart::Part::stream(reqwest::Body::wrap_stream(
                ReaderStream::new(file),
            ))
            .file_name(file_name);
            form = form.part("file", part);
        }
        let id = assignment_id.to_string();
        self.client
            .post_multipart("SUBMIT_ASSIGNMENT", &[("assignment_id", id.as_str())], form)
            .await
    }

    // --- 消息 ---

    pub async fn messages(
        &self,
        filters: &[(&str, &str)],
    ) -> AppResult<Paginated<MessageRecord>> {
        self.client.fetch_json_query("MESSAGES", &[], filters).await
    }

    pub async fn unread_count(&self) -> AppResult<u64> {
        let response: UnreadCountResponse = self.client.fetch_json("UNREAD_COUNT", &[]).await?;
        Ok(response.unread_count)
    }

    pub async fn mark_as_read(&self, message_id: u64) -> AppResult<()> {
        let id = message_id.to_string();
        self.client
            .send_empty(Method::POST, "MARK_AS_READ", &[("message_id", id.as_str())])
            .await
    }

    pub async fn create_message(&self, payload: &Value) -> AppResult<MessageRecord> {
        self.client
            .send_json(Method::POST, "CREATE_MESSAGE", &[], payload)
            .await
    }

    pub async fn update_message(
        &self,
        message_id: u64,
        payload: &Value,
    ) -> AppResult<MessageRecord> {
        let id = message_id.to_string();
        self.client
            .send_json(
                Method::PATCH,
                "UPDATE_MESSAGE",
                &[("message_id", id.as_str())],
                payload,
            )
            .await
    }

    pub async fn delete_message_for_user(&self, message_id: u64) -> AppResult<()> {
        let id = message_id.to_string();
        self.client
            .send_empty(
                Method::DELETE,
                "DELETE_MESSAGE",
                &[("message_id", id.as_str())],
            )
            .await
    }

    // --- 用户与分组 ---

    pub async fn users(&self, search: &str, page: usize) -> AppResult<Paginated<UserSummary>> {
        let page = page.to_string();
        self.client
            .fetch_json_query(
                "USERS",
                &[],
                &[("search", search), ("page", page.as_str())],
            )
            .await
    }

    pub async fn groups(&self) -> AppResult<Vec<GroupSummary>> {
        self.client.fetch_json("GROUPS", &[]).await
    }
}
