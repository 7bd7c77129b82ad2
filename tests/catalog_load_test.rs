// tests/catalog_load_test.rs

use lumina_study::{
    api::LmsApi,
    client::RobustClient,
    config::AppConfig,
    error::AppResult,
    models::{CourseEntry, CourseStatus},
    outline::{self, LessonAction},
    player::MediaKind,
    viewer::ViewPlan,
};
use std::{fs, sync::Arc};
use tokio::sync::Mutex as TokioMutex;

fn build_api(server_url: &str) -> AppResult<LmsApi> {
    let mut config = AppConfig::default();
    config.url_templates.insert(
        "ENROLLMENTS".to_string(),
        format!("{}/api/courses/enrollments/?page={{page}}", server_url),
    );
    config.url_templates.insert(
        "COURSE_DETAILS".to_string(),
        format!("{}/api/courses/courses/{{course_id}}/", server_url),
    );
    let config = Arc::new(config);
    let token = Arc::new(TokioMutex::new("fake-token".to_string()));
    let client = Arc::new(RobustClient::new(config, token)?);
    Ok(LmsApi::new(client))
}

#[tokio::test]
async fn test_enrollments_and_course_detail_merge() -> AppResult<()> {
    // --- 1. Arrange (准备阶段) ---
    let mut server = mockito::Server::new_async().await;

    let enrollments_body =
        fs::read_to_string("tests/fixtures/enrollments_response.json").expect("无法读取模拟响应文件");
    let course_body =
        fs::read_to_string("tests/fixtures/course_response.json").expect("无法读取模拟响应文件");

    let enrollments_mock = server
        .mock("GET", "/api/courses/enrollments/")
        .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(&enrollments_body)
        .create_async()
        .await;

    let course_mock = server
        .mock("GET", "/api/courses/courses/101/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(&course_body)
        .create_async()
        .await;

    let api = build_api(&server.url())?;

    // --- 2. Act (执行阶段) ---
    let enrollments = api.list_enrollments().await?;
    let detail = api.course_detail(101).await?;
    let mut course = CourseEntry::from_parts(&enrollments[0], detail);
    course.set_progress_snapshot(33.0);

    // --- 3. Assert (断言阶段) ---
    enrollments_mock.assert_async().await;
    course_mock.assert_async().await;

    assert_eq!(enrollments.len(), 2, "应该拉取到两条选课记录");

    // 模块按 order 排序，课时完成标记与讲师一并合入
    assert_eq!(course.title, "线性代数入门");
    assert_eq!(course.modules.len(), 2);
    assert_eq!(course.modules[0].title, "第一章 向量");
    assert_eq!(course.modules[0].progress(), 50);
    assert_eq!(course.modules[1].progress(), 0);
    assert_eq!(course.lesson_count(), 3);
    assert_eq!(course.completed_lesson_count(), 1);
    assert_eq!(course.instructors[0].name, "张维");

    // 进度镜像自后端快照，状态由此推导
    assert_eq!(course.progress, 33.0);
    assert_eq!(course.status(), CourseStatus::InProgress);

    // 搜索能命中嵌套的模块/课时标题
    assert!(course.matches_search("矩阵"));
    assert!(!course.matches_search("微积分"));

    Ok(())
}

#[tokio::test]
async fn test_lesson_dispatch_uses_sniffed_types() -> AppResult<()> {
    // --- 1. Arrange (准备阶段) ---
    let mut server = mockito::Server::new_async().await;
    let course_body =
        fs::read_to_string("tests/fixtures/course_response.json").expect("无法读取模拟响应文件");
    server
        .mock("GET", "/api/courses/courses/101/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(&course_body)
        .create_async()
        .await;

    let enrollments_body =
        fs::read_to_string("tests/fixtures/enrollments_response.json").expect("无法读取模拟响应文件");
    server
        .mock("GET", "/api/courses/enrollments/")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(&enrollments_body)
        .create_async()
        .await;

    let api = build_api(&server.url())?;

    // --- 2. Act (执行阶段) ---
    let enrollments = api.list_enrollments().await?;
    let detail = api.course_detail(101).await?;
    let course = CourseEntry::from_parts(&enrollments[0], detail);

    // --- 3. Assert (断言阶段) ---

    // 课时 73 声明为 video，但 URL 扩展名是 pdf: 分发进文档查看器
    let pdf_lesson = course.find_lesson(73).expect("缺少课时 73");
    match outline::dispatch(pdf_lesson) {
        LessonAction::OpenDocument { plan } => {
            assert!(matches!(plan, ViewPlan::PdfNative { .. }));
        }
        other => panic!("期望 OpenDocument，实际: {:?}", other),
    }

    // 课时 51 是 mp4 直链，按声明进原生播放器
    let video_lesson = course.find_lesson(51).expect("缺少课时 51");
    match outline::dispatch(video_lesson) {
        LessonAction::OpenPlayer { kind, .. } => assert_eq!(kind, MediaKind::Native),
        other => panic!("期望 OpenPlayer，实际: {:?}", other),
    }

    // 课时 52 没有声明类型，靠域名嗅探出 YouTube
    let youtube_lesson = course.find_lesson(52).expect("缺少课时 52");
    match outline::dispatch(youtube_lesson) {
        LessonAction::OpenPlayer { kind, .. } => assert_eq!(kind, MediaKind::Youtube),
        other => panic!("期望 OpenPlayer，实际: {:?}", other),
    }

    Ok(())
}
