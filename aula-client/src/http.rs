//! HTTP 客户端 - 网络通信

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use shared::client::{LoginRequest, LoginResponse};
use shared::models::{ModulePage, PageCreate, PageList, PageReorder, PageUpdate, ReorderEntry};

use crate::error::{ClientError, ClientResult};

/// 服务端返回的错误响应格式
#[derive(serde::Deserialize)]
struct ApiErrorResponse {
    pub code: String,
    pub message: String,
}

/// Page operations the cache layer depends on.
///
/// Implemented by [`ApiClient`] for the network; tests substitute in-memory
/// fakes.
#[async_trait]
pub trait PagesApi: Send + Sync {
    async fn list_pages(&self, module_id: &str) -> ClientResult<Vec<ModulePage>>;
    async fn create_page(&self, module_id: &str, payload: &PageCreate) -> ClientResult<ModulePage>;
    async fn update_page(
        &self,
        module_id: &str,
        page_id: &str,
        payload: &PageUpdate,
        expected_version: i64,
    ) -> ClientResult<ModulePage>;
    async fn delete_page(&self, module_id: &str, page_id: &str) -> ClientResult<ModulePage>;
    async fn reorder_pages(
        &self,
        module_id: &str,
        updates: &[ReorderEntry],
    ) -> ClientResult<Vec<ModulePage>>;
}

/// 网络 HTTP 客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 当前令牌
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// 登录并保存令牌
    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let url = format!("{}/api/auth/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        let login: LoginResponse = handle_response(response).await?;
        self.token = Some(login.token.clone());
        Ok(login)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }
}

#[async_trait]
impl PagesApi for ApiClient {
    async fn list_pages(&self, module_id: &str) -> ClientResult<Vec<ModulePage>> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/api/modules/{module_id}/pages"),
            )
            .send()
            .await?;
        let list: PageList = handle_response(response).await?;
        Ok(list.pages)
    }

    async fn create_page(&self, module_id: &str, payload: &PageCreate) -> ClientResult<ModulePage> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/api/modules/{module_id}/pages"),
            )
            .json(payload)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn update_page(
        &self,
        module_id: &str,
        page_id: &str,
        payload: &PageUpdate,
        expected_version: i64,
    ) -> ClientResult<ModulePage> {
        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("/api/modules/{module_id}/pages/{page_id}"),
            )
            // 乐观锁：携带最后读取到的版本号
            .header(reqwest::header::IF_MATCH, expected_version.to_string())
            .json(payload)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn delete_page(&self, module_id: &str, page_id: &str) -> ClientResult<ModulePage> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                &format!("/api/modules/{module_id}/pages/{page_id}"),
            )
            .send()
            .await?;
        handle_response(response).await
    }

    async fn reorder_pages(
        &self,
        module_id: &str,
        updates: &[ReorderEntry],
    ) -> ClientResult<Vec<ModulePage>> {
        let response = self
            .request(
                reqwest::Method::PATCH,
                &format!("/api/modules/{module_id}/pages/reorder"),
            )
            .json(&PageReorder {
                updates: updates.to_vec(),
            })
            .send()
            .await?;
        let list: PageList = handle_response(response).await?;
        Ok(list.pages)
    }
}

/// Decode a success body, or map an error envelope to the matching kind
async fn handle_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()));
    }

    let (code, message) = match response.json::<ApiErrorResponse>().await {
        Ok(body) => (body.code, body.message),
        Err(_) => (String::new(), status.to_string()),
    };

    tracing::debug!(status = %status, code = %code, "request rejected: {message}");

    // E0007 is the optimistic-lock conflict code; surface it distinctly
    if code == "E0007" {
        return Err(ClientError::VersionConflict(message));
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(message));
    }
    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}
