//! Blocking BookStack REST client with token authentication.

use crate::api::error::ApiError;
use crate::api::BookStackApi;
use crate::model::{Book, BookSummary, ListResponse, Shelf, ShelfSummary, SystemInfo};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("bookstack-export/", env!("CARGO_PKG_VERSION"));

/// Rows requested per list call. BookStack caps `count` at 500.
const PAGE_SIZE: u64 = 500;

/// Longest error body excerpt kept in [ApiError::HttpStatus].
const MAX_ERROR_MESSAGE: usize = 200;

/// Blocking HTTP client for one BookStack instance.
#[derive(Debug)]
pub struct BookStackClient {
    inner: reqwest::blocking::Client,
    base: Url,
    authorization: String,
}

impl BookStackClient {
    /// Client with default User-Agent and no request timeout.
    pub fn new(base_url: &str, token_id: &str, token_secret: &str) -> Result<Self, ApiError> {
        Self::builder(base_url, token_id, token_secret).build()
    }

    pub fn builder(
        base_url: &str,
        token_id: &str,
        token_secret: &str,
    ) -> BookStackClientBuilder {
        BookStackClientBuilder {
            base_url: base_url.to_string(),
            token_id: token_id.to_string(),
            token_secret: token_secret.to_string(),
            user_agent: None,
            timeout_secs: None,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|e| ApiError::InvalidUrl {
            input: format!("{}{}", self.base, path),
            reason: e.to_string(),
        })
    }

    fn send(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<reqwest::blocking::Response, ApiError> {
        tracing::debug!(%url, ?query, "GET");
        let response = self
            .inner
            .get(url.clone())
            .query(query)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .send()
            .map_err(|e| ApiError::Network {
                url: url.to_string(),
                source: e,
            })?;
        check_status(response, &url)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let response = self.send(url.clone(), query)?;
        let body = response.bytes().map_err(|e| ApiError::BodyRead {
            url: url.to_string(),
            source: e,
        })?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            source: e,
        })
    }

    fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(path)?;
        let response = self.send(url.clone(), &[])?;
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ApiError::BodyRead {
                url: url.to_string(),
                source: e,
            })
    }

    /// Fetch every page of a list endpoint.
    fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let mut rows = Vec::new();
        loop {
            let query = [
                ("count", PAGE_SIZE.to_string()),
                ("offset", rows.len().to_string()),
            ];
            let page: ListResponse<T> = self.get_json(path, &query)?;
            let fetched = page.data.len();
            rows.extend(page.data);
            if fetched == 0 || rows.len() as u64 >= page.total {
                break;
            }
        }
        Ok(rows)
    }
}

impl BookStackApi for BookStackClient {
    fn list_shelves(&mut self) -> Result<Vec<ShelfSummary>, ApiError> {
        self.list_all("api/shelves")
    }

    fn read_shelf(&mut self, id: u64) -> Result<Shelf, ApiError> {
        self.get_json(&format!("api/shelves/{}", id), &[])
    }

    fn list_books(&mut self) -> Result<Vec<BookSummary>, ApiError> {
        self.list_all("api/books")
    }

    fn read_book(&mut self, id: u64) -> Result<Book, ApiError> {
        self.get_json(&format!("api/books/{}", id), &[])
    }

    fn export_book_pdf(&mut self, id: u64) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(&format!("api/books/{}/export/pdf", id))
    }

    fn export_chapter_pdf(&mut self, id: u64) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(&format!("api/chapters/{}/export/pdf", id))
    }

    fn export_page_pdf(&mut self, id: u64) -> Result<Vec<u8>, ApiError> {
        self.get_bytes(&format!("api/pages/{}/export/pdf", id))
    }

    fn system_info(&mut self) -> Result<SystemInfo, ApiError> {
        self.get_json("api/system", &[])
    }
}

fn check_status(
    response: reqwest::blocking::Response,
    url: &Url,
) -> Result<reqwest::blocking::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().ok();
    Err(status_error(status, body, url))
}

/// Map a non-2xx status to [ApiError], keeping BookStack's error message when present.
fn status_error(status: reqwest::StatusCode, body: Option<String>, url: &Url) -> ApiError {
    let code = status.as_u16();
    if code == 401 || code == 403 {
        return ApiError::Unauthorized {
            status: code,
            url: url.to_string(),
        };
    }
    ApiError::HttpStatus {
        status: code,
        url: url.to_string(),
        message: body.as_deref().and_then(error_message),
    }
}

/// Pull `error.message` out of a BookStack JSON error body, or fall back to a trimmed excerpt.
fn error_message(body: &str) -> Option<String> {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = v.pointer("/error/message").and_then(|m| m.as_str()) {
            return Some(msg.to_string());
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_ERROR_MESSAGE).collect())
}

/// Parse the instance URL and make sure relative joins land under it.
fn normalize_base_url(input: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(input.trim()).map_err(|e| ApiError::InvalidUrl {
        input: input.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl {
            input: input.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Builder for [BookStackClient] with optional User-Agent and timeout.
#[derive(Debug)]
pub struct BookStackClientBuilder {
    base_url: String,
    token_id: String,
    token_secret: String,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
}

impl BookStackClientBuilder {
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Per-request timeout. Without one, a hung call blocks indefinitely.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> Result<BookStackClient, ApiError> {
        let base = normalize_base_url(&self.base_url)?;
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let mut builder = reqwest::blocking::Client::builder().user_agent(user_agent);
        // reqwest's blocking client defaults to a 30s timeout; None disables it.
        builder = builder.timeout(self.timeout_secs.map(Duration::from_secs));
        let inner = builder.build().map_err(ApiError::Client)?;
        Ok(BookStackClient {
            inner,
            base,
            authorization: format!("Token {}:{}", self.token_id, self.token_secret),
        })
    }
}
