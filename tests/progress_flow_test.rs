// tests/progress_flow_test.rs

use lumina_study::{
    api::LmsApi,
    client::RobustClient,
    config::AppConfig,
    error::AppResult,
    models::{CourseEntry, CourseStatus},
    progress::ProgressTracker,
};
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;

fn test_course() -> CourseEntry {
    CourseEntry {
        id: 101,
        title: "线性代数入门".to_string(),
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

async fn build_tracker(server_url: &str, max_retries: u32) -> AppResult<ProgressTracker> {
    let mut config = AppConfig::default();
    config.max_retries = max_retries;
    config.url_templates.insert(
        "COMPLETE_LESSON".to_string(),
        format!("{}/api/courses/lessons/{{lesson_id}}/complete/", server_url),
    );
    config.url_templates.insert(
        "COURSE_PROGRESS".to_string(),
        format!("{}/api/courses/courses/{{course_id}}/progress/", server_url),
    );
    let config = Arc::new(config);

    let token = Arc::new(TokioMutex::new("fake-token".to_string()));
    let client = Arc::new(RobustClient::new(config.clone(), token)?);
    Ok(ProgressTracker::new(Arc::new(LmsApi::new(client))))
}

#[tokio::test]
async fn test_complete_lesson_mirrors_backend_progress() -> AppResult<()> {
    // --- 1. Arrange (准备阶段) ---
    let mut server = mockito::Server::new_async().await;

    let complete_mock = server
        .mock("POST", "/api/courses/lessons/51/complete/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "lesson marked as complete"}"#)
        .create_async()
        .await;

    let progress_mock = server
        .mock("GET", "/api/courses/courses/101/progress/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"progress": 50.0}"#)
        .create_async()
        .await;

    let tracker = build_tracker(&server.url(), 3).await?;
    let mut course = test_course();

    // --- 2. Act (执行阶段) ---
    let progress = tracker.complete_lesson(&mut course, 51).await?;

    // --- 3. Assert (断言阶段) ---
    complete_mock.assert_async().await;
    progress_mock.assert_async().await;

    // 本地记录镜像后端返回的百分比，并推导出进行中状态
    assert_eq!(progress, 50.0);
    assert_eq!(course.progress, 50.0);
    assert_eq!(course.status(), CourseStatus::InProgress);
    assert!(course.completed_at.is_none());

    Ok(())
}

#[tokio::test]
async fn test_double_completion_reissues_both_calls() -> AppResult<()> {
    // --- 1. Arrange (准备阶段) ---
    let mut server = mockito::Server::new_async().await;

    // 完成接口是幂等的，两次调用都应该实际发出
    let complete_mock = server
        .mock("POST", "/api/courses/lessons/51/complete/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "ok"}"#)
        .expect(2)
        .create_async()
        .await;

    let first_progress = server
        .mock("GET", "/api/courses/courses/101/progress/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"progress": 50.0}"#)
        .create_async()
        .await;

    let tracker = build_tracker(&server.url(), 3).await?;
    let mut course = test_course();

    // --- 2. Act (执行阶段) ---
    tracker.complete_lesson(&mut course, 51).await?;
    assert_eq!(course.progress, 50.0);

    // 第一个进度响应命中一次后耗尽，第二次查询落到这里新注册的响应
    let second_progress = server
        .mock("GET", "/api/courses/courses/101/progress/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"progress": 100.0}"#)
        .create_async()
        .await;

    tracker.complete_lesson(&mut course, 51).await?;

    // --- 3. Assert (断言阶段) ---
    complete_mock.assert_async().await;
    first_progress.assert_async().await;
    second_progress.assert_async().await;

    // 最终展示值等于第二次响应，100% 时写入完成时间戳
    assert_eq!(course.progress, 100.0);
    assert_eq!(course.status(), CourseStatus::Completed);
    assert!(course.completed_at.is_some());

    Ok(())
}

#[tokio::test]
async fn test_completion_failure_leaves_local_state_untouched() -> AppResult<()> {
    // --- 1. Arrange (准备阶段) ---
    let mut server = mockito::Server::new_async().await;

    // 完成接口持续 5xx，重试中间件耗尽后返回错误
    let complete_mock = server
        .mock("POST", "/api/courses/lessons/51/complete/")
        .with_status(500)
        .with_body("server error")
        .expect_at_least(1)
        .create_async()
        .await;

    // 完成调用失败后绝不应该发起进度查询（串行依赖）
    let progress_mock = server
        .mock("GET", "/api/courses/courses/101/progress/")
        .with_status(200)
        .with_body(r#"{"progress": 50.0}"#)
        .expect(0)
        .create_async()
        .await;

    // 失败路径不关心重试本身，关掉重试让测试跑得快
    let tracker = build_tracker(&server.url(), 0).await?;
    let mut course = test_course();

    // --- 2. Act (执行阶段) ---
    let result = tracker.complete_lesson(&mut course, 51).await;

    // --- 3. Assert (断言阶段) ---
    complete_mock.assert_async().await;
    progress_mock.assert_async().await;

    assert!(result.is_err());
    // 界面停留在完成前状态
    assert_eq!(course.progress, 0.0);
    assert_eq!(course.status(), CourseStatus::NotStarted);

    Ok(())
}
