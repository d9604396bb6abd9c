use crate::error::ApiError;
use crate::models::{TodoDraft, TodoPatch, TodoRecord};
use crate::session::Session;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// The REST operations the todo store depends on.
#[allow(async_fn_in_trait)]
pub trait TodoApi {
    async fn fetch_todos(&self) -> Result<Vec<TodoRecord>, ApiError>;
    async fn create_todo(&self, draft: &TodoDraft) -> Result<(), ApiError>;
    async fn update_todo(&self, id: &str, patch: &TodoPatch) -> Result<(), ApiError>;
    async fn delete_todo(&self, id: &str) -> Result<(), ApiError>;
}

pub struct ApiClient {
    client: Client,
    session: Session,
}

impl ApiClient {
    pub fn new(session: Session) -> ApiClient {
        ApiClient {
            client: Client::new(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.session.base_url(), path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Authorization", format!("Bearer {}", self.session.token()))
    }
}

impl TodoApi for ApiClient {
    async fn fetch_todos(&self) -> Result<Vec<TodoRecord>, ApiError> {
        let url = self.url("/todos");
        debug!(%url, "GET");

        let res = self.authorized(self.client.get(&url)).send().await?;
        let todos = ensure_success(res).await?.json::<Vec<TodoRecord>>().await?;
        Ok(todos)
    }

    async fn create_todo(&self, draft: &TodoDraft) -> Result<(), ApiError> {
        let url = self.url("/todos");
        debug!(%url, "POST");

        let res = self
            .authorized(self.client.post(&url))
            .json(draft)
            .send()
            .await?;
        ensure_success(res).await?;
        Ok(())
    }

    async fn update_todo(&self, id: &str, patch: &TodoPatch) -> Result<(), ApiError> {
        let url = self.url(&format!("/todos/{}", id));
        debug!(%url, "PUT");

        let res = self
            .authorized(self.client.put(&url))
            .json(patch)
            .send()
            .await?;
        ensure_success(res).await?;
        Ok(())
    }

    async fn delete_todo(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/todos/{}", id));
        debug!(%url, "DELETE");

        let res = self.authorized(self.client.delete(&url)).send().await?;
        ensure_success(res).await?;
        Ok(())
    }
}

async fn ensure_success(res: Response) -> Result<Response, ApiError> {
    if res.status().is_success() {
        Ok(res)
    } else {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// Exchanges account credentials for a bearer token.
pub async fn login(base_url: &str, email: &str, password: &str) -> Result<String, ApiError> {
    let client = Client::new();
    let url = format!("{}/auth/login", base_url.trim_end_matches('/'));

    let res = client
        .post(&url)
        .json(&json!({
            "email": email,
            "password": password
        }))
        .send()
        .await?;

    let login = ensure_success(res).await?.json::<LoginResponse>().await?;
    Ok(login.token)
}
