//! RestTaskStore - PostgREST 互換の行 API クライアント
//!
//! BaaS の `/rest/v1/{table}` エンドポイントに対して CRUD を発行します。
//! owner スコープはクエリの `user_id=eq.{owner}` で毎回付与します。
//!
//! # 認証
//! - `apikey` ヘッダ: プロジェクトの公開キー
//! - `Authorization: Bearer {access_token}`: 現在のセッションから取得

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use crate::domain::{Task, TaskId, TaskInsert, TaskPatch, UserId};
use crate::ports::{SessionProvider, StoreError, TaskStore};

/// 行 API への接続設定
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// プロジェクト URL（例: `https://xyz.supabase.co`）
    pub base_url: String,
    pub api_key: String,
    pub table: String,
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            table: "tasks".to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), self.table)
    }
}

/// PostgREST のエラーボディ
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
}

pub struct RestTaskStore {
    client: reqwest::Client,
    config: RestConfig,
    session: Arc<dyn SessionProvider>,
}

impl RestTaskStore {
    pub fn new(config: RestConfig, session: Arc<dyn SessionProvider>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("http client: {e}")))?;
        Ok(Self {
            client,
            config,
            session,
        })
    }

    fn request(&self, method: Method, query: &[(&'static str, String)]) -> Result<RequestBuilder, StoreError> {
        let token = self
            .session
            .current()
            .map(|session| session.access_token)
            .ok_or_else(|| StoreError::Rejected {
                status: 401,
                message: "no active session".to_string(),
            })?;

        Ok(self
            .client
            .request(method, self.config.endpoint())
            .query(query)
            .header("apikey", &self.config.api_key)
            .bearer_auth(token))
    }

    /// 送信して行の配列をデコード（`return=representation`）
    async fn rows(&self, request: RequestBuilder) -> Result<Vec<Task>, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let response = check_status(response).await?;
        response
            .json::<Vec<Task>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TaskStore for RestTaskStore {
    async fn select(&self, owner: &UserId, id: Option<&TaskId>) -> Result<Vec<Task>, StoreError> {
        let mut query = vec![("select", "*".to_string())];
        query.extend(scope_query(owner, id));
        query.push(("order", "created_at.desc".to_string()));

        debug!(%owner, "GET {}", self.config.endpoint());
        self.rows(self.request(Method::GET, &query)?).await
    }

    async fn insert(&self, row: &TaskInsert) -> Result<Task, StoreError> {
        debug!(owner = %row.owner, "POST {}", self.config.endpoint());
        let request = self
            .request(Method::POST, &[])?
            .header("Prefer", "return=representation")
            .json(row);

        self.rows(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no row".to_string()))
    }

    async fn update(
        &self,
        owner: &UserId,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        debug!(%owner, task_id = %id, "PATCH {}", self.config.endpoint());
        let request = self
            .request(Method::PATCH, &scope_query(owner, Some(id)))?
            .header("Prefer", "return=representation")
            .json(patch);

        Ok(self.rows(request).await?.into_iter().next())
    }

    async fn delete(&self, owner: &UserId, id: &TaskId) -> Result<Vec<Task>, StoreError> {
        debug!(%owner, task_id = %id, "DELETE {}", self.config.endpoint());
        let request = self
            .request(Method::DELETE, &scope_query(owner, Some(id)))?
            .header("Prefer", "return=representation");

        self.rows(request).await
    }
}

/// 行フィルタ：owner は必ず、id は指定時のみ
fn scope_query(owner: &UserId, id: Option<&TaskId>) -> Vec<(&'static str, String)> {
    let mut query = vec![("user_id", format!("eq.{owner}"))];
    if let Some(id) = id {
        query.push(("id", format!("eq.{id}")));
    }
    query
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message: error_message(&body, status.canonical_reason().unwrap_or("error")),
    })
}

fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error_description).or(b.msg))
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemorySessionProvider;
    use rstest::rstest;

    #[test]
    fn endpoint_joins_base_url_and_table() {
        let config = RestConfig::new("https://example.supabase.co/", "anon");
        assert_eq!(config.endpoint(), "https://example.supabase.co/rest/v1/tasks");
    }

    #[test]
    fn scope_query_always_contains_owner() {
        let owner = UserId::new("u1");
        assert_eq!(scope_query(&owner, None), vec![("user_id", "eq.u1".to_string())]);

        let id = TaskId::new("t9");
        assert_eq!(
            scope_query(&owner, Some(&id)),
            vec![("user_id", "eq.u1".to_string()), ("id", "eq.t9".to_string())]
        );
    }

    #[rstest]
    #[case::postgrest(r#"{"code":"42501","message":"permission denied"}"#, "permission denied")]
    #[case::auth(r#"{"error":"invalid_grant","error_description":"expired"}"#, "expired")]
    #[case::plain_text("upstream down", "upstream down")]
    #[case::empty("", "Bad Request")]
    fn error_message_prefers_structured_body(#[case] body: &str, #[case] expected: &str) {
        assert_eq!(error_message(body, "Bad Request"), expected);
    }

    #[tokio::test]
    async fn requests_without_session_are_rejected_locally() {
        let session = Arc::new(InMemorySessionProvider::new());
        let store = RestTaskStore::new(RestConfig::new("http://127.0.0.1:9", "anon"), session).unwrap();

        let err = store.select(&UserId::new("u1"), None).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 401, .. }));
    }
}
