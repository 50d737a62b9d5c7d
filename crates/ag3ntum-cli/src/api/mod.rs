//! API client for the Ag3ntum backend

use ag3ntum_core::types::{
    is_valid_session_id, DeleteResponse, DirectoryListing, FileContent, ListOptions, SessionList,
    SkillList, UploadFile, UploadResponse,
};
use ag3ntum_core::{ConsoleConfig, ConsoleError, FileService, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client as ReqwestClient, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Client {
    http: ReqwestClient,
    base_url: String,
    token: Option<String>,
}

impl Client {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self> {
        Self::new(&config.server_url, config.auth_token.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_sessions(&self) -> Result<SessionList> {
        let response = self.request(Method::GET, "/sessions").send().await.map_err(transport)?;
        json(response).await
    }

    pub async fn list_skills(&self) -> Result<SkillList> {
        let response = self.request(Method::GET, "/skills").send().await.map_err(transport)?;
        json(response).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        let builder = self.http.request(method, url);
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn files_url(session_id: &str, suffix: &str) -> Result<String> {
        if !is_valid_session_id(session_id) {
            return Err(ConsoleError::InvalidSessionId(session_id.to_string()));
        }
        Ok(format!("/sessions/{}/files{}", session_id, suffix))
    }
}

#[async_trait]
impl FileService for Client {
    async fn list_files(
        &self,
        session_id: &str,
        path: &str,
        options: &ListOptions,
    ) -> Result<DirectoryListing> {
        let mut query = vec![
            ("path", path.to_string()),
            ("include_hidden", options.include_hidden.to_string()),
            ("sort_by", options.sort.sort_by.as_str().to_string()),
            ("sort_order", options.sort.sort_order.as_str().to_string()),
        ];
        if let Some(limit) = options.limit {
            query.push(("limit", limit.to_string()));
        }

        let response = self
            .request(Method::GET, &Self::files_url(session_id, "")?)
            .query(&query)
            .send()
            .await
            .map_err(transport)?;
        json(response).await
    }

    async fn get_content(&self, session_id: &str, path: &str) -> Result<FileContent> {
        let response = self
            .request(Method::GET, &Self::files_url(session_id, "/content")?)
            .query(&[("path", path)])
            .send()
            .await
            .map_err(transport)?;
        json(response).await
    }

    async fn fetch_bytes(&self, session_id: &str, path: &str) -> Result<Bytes> {
        let response = self
            .request(Method::GET, &Self::files_url(session_id, "/download")?)
            .query(&[("path", path)])
            .send()
            .await
            .map_err(transport)?;
        check(response).await?.bytes().await.map_err(transport)
    }

    async fn delete_file(&self, session_id: &str, path: &str) -> Result<DeleteResponse> {
        let response = self
            .request(Method::DELETE, &Self::files_url(session_id, "")?)
            .query(&[("path", path)])
            .send()
            .await
            .map_err(transport)?;
        json(response).await
    }

    async fn upload_files(
        &self,
        session_id: &str,
        dir: &str,
        files: Vec<UploadFile>,
    ) -> Result<UploadResponse> {
        let mut form = multipart::Form::new().text("path", dir.to_string());
        for file in files {
            let mime = file
                .mime_type
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let part = multipart::Part::bytes(file.bytes)
                .file_name(file.name)
                .mime_str(&mime)
                .map_err(transport)?;
            form = form.part("files", part);
        }

        let response = self
            .request(Method::POST, &Self::files_url(session_id, "/upload")?)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        json(response).await
    }
}

fn transport(e: reqwest::Error) -> ConsoleError {
    ConsoleError::Transport(e.to_string())
}

/// Turn a non-2xx response into `ConsoleError::Http`
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ConsoleError::Http {
        status: status.as_u16(),
        message: error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string()),
    })
}

async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = check(response).await?.text().await.map_err(transport)?;
    Ok(serde_json::from_str(&body)?)
}

/// Pull a readable message out of an error body (`detail`, `message` or `error`)
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}
