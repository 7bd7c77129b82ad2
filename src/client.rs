// src/client.rs

use crate::{config::AppConfig, error::*};
use anyhow::anyhow;
use colored::Colorize;
use log::debug;
use reqwest::{Method, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;

/// 带重试中间件与鉴权注入的 HTTP 客户端。
/// 瞬时故障由指数退避中间件兜底，服务器前缀间再做一层故障转移。
#[derive(Clone)]
pub struct RobustClient {
    pub client: ClientWithMiddleware,
    config: Arc<AppConfig>,
    token: Arc<TokioMutex<String>>,
}

impl RobustClient {
    pub fn new(config: Arc<AppConfig>, token: Arc<TokioMutex<String>>) -> AppResult<Self> {
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let inner = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_workers * 3)
            .build()
            .map_err(|e| AppError::Other(anyhow!("构建 HTTP 客户端失败: {}", e)))?;
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            config,
            token,
        })
    }

    async fn authorized(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        let token = self.token.lock().await;
        if !token.is_empty() {
            builder = builder.bearer_auth(&*token);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> AppResult<Response> {
        let res = builder.send().await?;
        if res.status() == StatusCode::UNAUTHORIZED || res.status() == StatusCode::FORBIDDEN {
            return Err(AppError::TokenInvalid);
        }
        Ok(res.error_for_status()?)
    }

    pub async fn get<T: reqwest::IntoUrl>(&self, url: T) -> AppResult<Response> {
        let mut builder = self.client.get(url);
        {
            let token = self.token.lock().await;
            if !token.is_empty() {
                builder = builder.bearer_auth(&*token);
            }
        }
        self.send(builder).await
    }

    /// 填充 `{prefix}` 与命名参数后的完整 URL
    fn fill_template(template: &str, prefix: &str, params: &[(&str, &str)]) -> String {
        let mut url = template.replace("{prefix}", prefix);
        for (key, val) in params {
            url = url.replace(&format!("{{{}}}", key), val);
        }
        url
    }

    fn template(&self, key: &str) -> AppResult<&str> {
        self.config
            .url_templates
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| AppError::Other(anyhow!("配置缺少 URL 模板 '{}'", key)))
    }

    /// GET 并反序列化。依次尝试所有服务器前缀；
    /// 鉴权失败立即终止，不再尝试其他服务器。
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        template_key: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let template = self.template(template_key)?;
        let mut last_error = None;
        for prefix in &self.config.server_prefixes {
            let url = Self::fill_template(template, prefix, params);
            debug!("GET {}", url);
            match self.get(&url).await {
                Ok(res) => return Self::parse_body(res, url).await,
                Err(e @ AppError::TokenInvalid) => return Err(e),
                Err(e) => {
                    eprintln!("{} 服务器 '{}' 请求失败: {:?}", "[!]".yellow(), prefix, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(AppError::Other(anyhow!("所有服务器均请求失败"))))
    }

    /// 直接 GET 一个后端下发的绝对地址（分页 next 链接）
    pub async fn fetch_json_url<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let res = self.get(url).await?;
        Self::parse_body(res, url.to_string()).await
    }

    /// 与 `fetch_json` 相同，额外把查询参数以标准编码追加到 URL 上
    pub async fn fetch_json_query<T: DeserializeOwned>(
        &self,
        template_key: &str,
        params: &[(&str, &str)],
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        let template = self.template(template_key)?;
        let mut last_error = None;
        for prefix in &self.config.server_prefixes {
            let filled = Self::fill_template(template, prefix, params);
            let mut url = url::Url::parse(&filled)?;
            url.query_pairs_mut().extend_pairs(query);
            let url = url.to_string();
            debug!("GET {}", url);
            match self.get(&url).await {
                Ok(res) => return Self::parse_body(res, url).await,
                Err(e @ AppError::TokenInvalid) => return Err(e),
                Err(e) => {
                    eprintln!("{} 服务器 '{}' 请求失败: {:?}", "[!]".yellow(), prefix, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(AppError::Other(anyhow!("所有服务器均请求失败"))))
    }

    /// 携带 JSON 体的写操作，同样带前缀故障转移
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        template_key: &str,
        params: &[(&str, &str)],
        body: &Value,
    ) -> AppResult<T> {
        let template = self.template(template_key)?;
        let mut last_error = None;
        for prefix in &self.config.server_prefixes {
            let url = Self::fill_template(template, prefix, params);
            debug!("{} {}", method, url);
            let builder = self.authorized(method.clone(), &url).await.json(body);
            match self.send(builder).await {
                Ok(res) => return Self::parse_body(res, url).await,
                Err(e @ AppError::TokenInvalid) => return Err(e),
                Err(e) => {
                    eprintln!("{} 服务器 '{}' 请求失败: {:?}", "[!]".yellow(), prefix, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(AppError::Other(anyhow!("所有服务器均请求失败"))))
    }

    /// 无响应体（204 一类）的写操作
    pub async fn send_empty(
        &self,
        method: Method,
        template_key: &str,
        params: &[(&str, &str)],
    ) -> AppResult<()> {
        let template = self.template(template_key)?;
        let mut last_error = None;
        for prefix in &self.config.server_prefixes {
            let url = Self::fill_template(template, prefix, params);
            debug!("{} {}", method, url);
            let builder = self.authorized(method.clone(), &url).await;
            match self.send(builder).await {
                Ok(_) => return Ok(()),
                Err(e @ AppError::TokenInvalid) => return Err(e),
                Err(e) => {
                    eprintln!("{} 服务器 '{}' 请求失败: {:?}", "[!]".yellow(), prefix, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(AppError::Other(anyhow!("所有服务器均请求失败"))))
    }

    /// multipart 提交（作业附件为流式上传，表单不可重建，
    /// 因此只对首个服务器前缀发起一次请求）
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        template_key: &str,
        params: &[(&str, &str)],
        form: reqwest::multipart::Form,
    ) -> AppResult<T> {
        let template = self.template(template_key)?;
        let prefix = self
            .config
            .server_prefixes
            .first()
            .ok_or_else(|| AppError::Other(anyhow!("未配置任何服务器前缀")))?;
        let url = Self::fill_template(template, prefix, params);
        debug!("POST(multipart) {}", url);
        let builder = self.authorized(Method::POST, &url).await.multipart(form);
        let res = self.send(builder).await?;
        Self::parse_body(res, url).await
    }

    async fn parse_body<T: DeserializeOwned>(res: Response, url: String) -> AppResult<T> {
        let text = res.text().await?;
        serde_json::from_str(&text).map_err(|source| AppError::ApiParseFailed { url, source })
    }
}
