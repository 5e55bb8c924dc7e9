//!
//! commissions API boundary
//! ------------------------
//! Every backend call goes through `ApiClient`. It attaches the session's bearer token (read at
//! dispatch time, so a token cleared by one call is absent from the next), and turns a 401 from
//! any call into: clear the session if it still holds the token that call was sent with, publish
//! `SessionEvent::Unauthorized`, then fail the call with `AppError::AuthorizationExpired`.
//! Network and timeout errors pass through untouched and nothing is retried here.

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};
use crate::identity::{Credential, SessionCell, SessionEvent, SessionEvents};

mod auth;
mod genealogy;
mod managers;
mod uploads;

pub use auth::{AuthApi, AuthResponse, LoginRequest, RegisterRequest};
pub use genealogy::{AssignmentDraft, GenealogyApi, GenealogyAssignment, Level, TeamDownline};
pub use managers::{ManagersApi, PayoutDraft, PayoutRequest, PayoutStatus, RecruitmentBonusForm, RecruitmentBonusRequest};
pub use uploads::{UploadBatch, UploadFile, UploadResult, UploadsApi, MAX_UPLOAD_BYTES};

/// How a 401 on this call is treated. Credential exchanges (login, register) answer bad
/// passwords with 401, which must not end an unrelated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnUnauthorized {
    ExpireSession,
    PassThrough,
}

/// A request ready to send, with the token it carries.
pub(crate) struct Outgoing {
    builder: RequestBuilder,
    credential: Option<Credential>,
}

impl Outgoing {
    pub(crate) fn map(self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        Self { builder: f(self.builder), credential: self.credential }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    client: reqwest::Client,
    session: SessionCell,
    events: SessionEvents,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> AppResult<Self> {
        Self::with_session(config, SessionCell::new())
    }

    pub fn with_session(config: &ClientConfig, session: SessionCell) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal { code: "http_client".into(), message: e.to_string() })?;
        Ok(Self { base: config.base_url.clone(), client, session, events: SessionEvents::new() })
    }

    pub fn base_url(&self) -> &Url { &self.base }
    pub fn session(&self) -> &SessionCell { &self.session }
    pub fn events(&self) -> &SessionEvents { &self.events }

    pub fn auth(&self) -> AuthApi<'_> { AuthApi::new(self) }
    pub fn managers(&self) -> ManagersApi<'_> { ManagersApi::new(self) }
    pub fn uploads(&self) -> UploadsApi<'_> { UploadsApi::new(self) }
    pub fn genealogy(&self) -> GenealogyApi<'_> { GenealogyApi::new(self) }

    // Paths are appended to the base so a base with a path prefix (`https://host/api`) is kept.
    fn url(&self, path: &str) -> AppResult<Url> {
        let joined = format!("{}{}", self.base.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| AppError::Internal { code: "bad_url".into(), message: format!("{}: {}", joined, e) })
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> AppResult<Outgoing> {
        self.request_as(method, path, self.session.credential())
    }

    /// Request carrying an explicit token instead of the session's.
    pub(crate) fn request_as(&self, method: Method, path: &str, credential: Option<Credential>) -> AppResult<Outgoing> {
        let mut builder = self.client.request(method, self.url(path)?);
        if let Some(cred) = &credential {
            builder = builder.header(AUTHORIZATION, cred.bearer());
        }
        Ok(Outgoing { builder, credential })
    }

    pub(crate) async fn execute(
        &self,
        out: Outgoing,
        path: &str,
        on_401: OnUnauthorized,
        fallback: &str,
    ) -> AppResult<Response> {
        let Outgoing { builder, credential } = out;
        let resp = builder.send().await.map_err(|e| {
            warn!(target: "commission_desk::http", "request failed path={} err={}", path, e);
            AppError::from(e)
        })?;
        let status = resp.status();
        debug!(target: "commission_desk::http", "response path={} status={}", path, status.as_u16());

        if status == StatusCode::UNAUTHORIZED && on_401 == OnUnauthorized::ExpireSession {
            // A token the session no longer holds says nothing about the current one.
            let dropped = credential.as_ref().and_then(|c| self.session.clear_if(c));
            let epoch = dropped.unwrap_or_else(|| self.session.epoch());
            let cleared = dropped.is_some();
            warn!(target: "commission_desk::http", "401 from {}; session cleared={}", path, cleared);
            self.events.publish(SessionEvent::Unauthorized { path: path.to_string(), cleared, epoch });
            let message = server_message(resp).await.unwrap_or_else(|| "Session expired".to_string());
            return Err(AppError::AuthorizationExpired { code: "unauthorized".into(), message });
        }
        if !status.is_success() {
            let message = server_message(resp).await.unwrap_or_else(|| fallback.to_string());
            return Err(AppError::Server { code: status_code_name(status).into(), message, status: status.as_u16() });
        }
        Ok(resp)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)], fallback: &str) -> AppResult<T> {
        let out = self.request(Method::GET, path)?;
        self.fetch_json(out, query, fallback, path).await
    }

    /// GET sent with `credential` rather than the session's token.
    pub(crate) async fn get_json_as<T: DeserializeOwned>(&self, path: &str, credential: &Credential, fallback: &str) -> AppResult<T> {
        let out = self.request_as(Method::GET, path, Some(credential.clone()))?;
        self.fetch_json(out, &[], fallback, path).await
    }

    async fn fetch_json<T: DeserializeOwned>(&self, out: Outgoing, query: &[(&str, &str)], fallback: &str, path: &str) -> AppResult<T> {
        let out = if query.is_empty() { out } else { out.map(|rb| rb.query(query)) };
        let resp = self.execute(out, path, OnUnauthorized::ExpireSession, fallback).await?;
        decode(resp, path).await
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        on_401: OnUnauthorized,
        fallback: &str,
    ) -> AppResult<T> {
        let out = self.request(method, path)?.map(|rb| rb.json(body));
        let resp = self.execute(out, path, on_401, fallback).await?;
        decode(resp, path).await
    }

    /// POST without a body.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> AppResult<T> {
        let out = self.request(Method::POST, path)?;
        let resp = self.execute(out, path, OnUnauthorized::ExpireSession, fallback).await?;
        decode(resp, path).await
    }

    /// Call whose response body is ignored.
    pub(crate) async fn send_unit(&self, method: Method, path: &str, fallback: &str) -> AppResult<()> {
        let out = self.request(method, path)?;
        self.execute(out, path, OnUnauthorized::ExpireSession, fallback).await?;
        Ok(())
    }
}

/// Percent-encode one path segment (ids come from user input).
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

async fn decode<T: DeserializeOwned>(resp: Response, path: &str) -> AppResult<T> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| AppError::Decode {
        code: "decode_error".into(),
        message: format!("unexpected response from {}: {}", path, e),
    })
}

/// Backend error text: `{"message": "..."}` or `{"message": ["...", "..."]}`.
async fn server_message(resp: Response) -> Option<String> {
    let v: serde_json::Value = resp.json().await.ok()?;
    message_of(&v)
}

fn message_of(v: &serde_json::Value) -> Option<String> {
    match v.get("message")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(|x| x.as_str()).collect();
            if parts.is_empty() { None } else { Some(parts.join("; ")) }
        }
        _ => None,
    }
}

fn status_code_name(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "bad_request",
        403 => "forbidden",
        404 => "not_found",
        409 => "conflict",
        413 => "payload_too_large",
        422 => "unprocessable",
        500..=599 => "server_error",
        _ => "http_error",
    }
}
