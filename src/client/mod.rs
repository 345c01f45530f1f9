//! Typed HTTP client for the `/api/users` endpoints.
//!
//! Failures are classified into [`ClientError`] so callers can tell a
//! rejected form apart from a server fault or an unreachable host.

mod error;

use indexmap::IndexMap;
use reqwest::{RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

pub use error::{ClientError, FieldMessages, ValidationError};

use crate::envelope::ApiResponse;
use crate::i18n::{Locale, Text};
use crate::users::dto::{CreateUserRequest, UpdateUserRequest};
use crate::users::resource::UserResource;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Shape of any non-2xx body; every member is optional.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    errors: Option<IndexMap<String, FieldMessages>>,
    help: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserClient {
    http: reqwest::Client,
    base_url: String,
    locale: Locale,
}

impl Default for UserClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl UserClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            locale: Locale::default(),
        }
    }

    /// Language of the fallback messages used when the server sends none.
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_users(&self) -> Result<ApiResponse<Vec<UserResource>>, ClientError> {
        let req = self.http.get(self.url("/users"));
        self.execute(req, Text::ListFailed).await
    }

    pub async fn get_user(&self, id: i64) -> Result<ApiResponse<UserResource>, ClientError> {
        let req = self.http.get(self.url(&format!("/users/{id}")));
        self.execute(req, Text::FetchFailed).await
    }

    pub async fn create_user(
        &self,
        body: &CreateUserRequest,
    ) -> Result<ApiResponse<UserResource>, ClientError> {
        let req = self.http.post(self.url("/users")).json(body);
        self.execute(req, Text::CreateFailed).await
    }

    pub async fn update_user(
        &self,
        id: i64,
        body: &UpdateUserRequest,
    ) -> Result<ApiResponse<UserResource>, ClientError> {
        let req = self.http.put(self.url(&format!("/users/{id}"))).json(body);
        self.execute(req, Text::UpdateFailed).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<ApiResponse<()>, ClientError> {
        let req = self.http.delete(self.url(&format!("/users/{id}")));
        self.execute(req, Text::DeleteFailed).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        fallback: Text,
    ) -> Result<ApiResponse<T>, ClientError> {
        let resp = req
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| ClientError::Connection {
                message: self.locale.text(Text::ConnectionFailed).to_string(),
                source,
            })?;

        let status = resp.status();
        if status.is_success() {
            return resp.json().await.map_err(ClientError::InvalidResponse);
        }

        let body = resp.json::<ErrorBody>().await.unwrap_or_default();
        debug!(%status, message = ?body.message, "request rejected");

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            if let Some(errors) = body.errors {
                return Err(ValidationError {
                    message: body
                        .message
                        .unwrap_or_else(|| self.locale.text(Text::ValidationFailed).to_string()),
                    errors,
                    help: body.help,
                }
                .into());
            }
        }

        Err(ClientError::Http {
            status: status.as_u16(),
            message: body
                .message
                .unwrap_or_else(|| self.locale.text(fallback).to_string()),
        })
    }
}
