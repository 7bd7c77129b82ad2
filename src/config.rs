// src/config.rs

pub mod token;

use self::token::load_or_create_external_config;
use crate::{cli::Cli, constants, error::AppResult};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub server_prefixes: Option<Vec<String>>,
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

/// 落盘在 `~/.lumina-study/config.json` 的外部配置。
/// URL 模板集中在这里，便于私有化部署改地址而不用改代码。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accesstoken: Option<String>,
    #[serde(default)]
    pub network: NetworkConfig,
    pub url_templates: HashMap<String, String>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        let url_templates = HashMap::from([
            ("ENROLLMENTS".into(), "https://{prefix}/api/courses/enrollments/?page={page}".into()),
            ("COURSE_DETAILS".into(), "https://{prefix}/api/courses/courses/{course_id}/".into()),
            ("COURSE_PROGRESS".into(), "https://{prefix}/api/courses/courses/{course_id}/progress/".into()),
            ("COMPLETE_LESSON".into(), "https://{prefix}/api/courses/lessons/{lesson_id}/complete/".into()),
            ("ASSIGNMENTS".into(), "https://{prefix}/api/assignments/?course={course_id}".into()),
            ("ASSIGNMENT_SUBMISSIONS".into(), "https://{prefix}/api/assignments/submissions/".into()),
            ("SUBMIT_ASSIGNMENT".into(), "https://{prefix}/api/assignments/{assignment_id}/submissions/".into()),
            ("MESSAGES".into(), "https://{prefix}/api/messaging/messages/".into()),
            ("UNREAD_COUNT".into(), "https://{prefix}/api/messaging/messages/unread-count/".into()),
            ("MARK_AS_READ".into(), "https://{prefix}/api/messaging/messages/{message_id}/mark-as-read/".into()),
            ("CREATE_MESSAGE".into(), "https://{prefix}/api/messaging/messages/".into()),
            ("UPDATE_MESSAGE".into(), "https://{prefix}/api/messaging/messages/{message_id}/".into()),
            ("DELETE_MESSAGE".into(), "https://{prefix}/api/messaging/messages/{message_id}/delete-for-user/".into()),
            ("USERS".into(), "https://{prefix}/api/users/".into()),
            ("GROUPS".into(), "https://{prefix}/api/groups/".into()),
        ]);

        // 一组稳健的网络默认值
        let network_config = NetworkConfig {
            server_prefixes: Some(vec!["lms.luminacare.com".into()]),
            connect_timeout_secs: Some(10),
            timeout_secs: Some(60),
            max_retries: Some(3),
        };

        Self {
            accesstoken: None,
            network: network_config,
            url_templates,
            page_size: Some(constants::DEFAULT_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub max_workers: usize,
    pub page_size: usize,
    pub server_prefixes: Vec<String>,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub url_templates: HashMap<String, String>,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;

        Ok(Self {
            max_workers: args.workers.unwrap_or(5),
            page_size: external_config
                .page_size
                .unwrap_or(constants::DEFAULT_PAGE_SIZE),
            server_prefixes: external_config.network.server_prefixes.unwrap_or_default(),
            user_agent: constants::USER_AGENT.into(),
            connect_timeout: Duration::from_secs(
                external_config.network.connect_timeout_secs.unwrap_or(10),
            ),
            timeout: Duration::from_secs(external_config.network.timeout_secs.unwrap_or(60)),
            max_retries: external_config.network.max_retries.unwrap_or(3),
            url_templates: external_config.url_templates,
        })
    }
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_workers: 5,
            page_size: constants::DEFAULT_PAGE_SIZE,
            server_prefixes: vec!["unused".to_string()],
            user_agent: "test-agent/1.0".to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            max_retries: 3,
            url_templates: HashMap::new(),
        }
    }
}
