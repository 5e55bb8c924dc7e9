use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiClient, OnUnauthorized};
use crate::error::{AppError, AppResult};
use crate::identity::{Credential, Identity};

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

impl LoginRequest {
    pub fn new(email: &str, password: &str) -> AppResult<Self> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::validation("missing_field", "Please enter email and password"));
        }
        Ok(Self { email: email.to_string(), password: password.to_string() })
    }

    pub fn email(&self) -> &str { &self.email }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest").field("email", &self.email).field("password", &"***").finish()
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> AppResult<()> {
        let blank = [&self.email, &self.first_name, &self.last_name].iter().any(|s| s.trim().is_empty());
        if blank || self.password.is_empty() {
            return Err(AppError::validation("missing_field", "Please fill in all required fields"));
        }
        if !self.email.contains('@') {
            return Err(AppError::validation("invalid_email", "Please enter a valid email address"));
        }
        Ok(())
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"***")
            .finish()
    }
}

/// Token plus the user it belongs to. The backend names the token field in snake case.
#[derive(Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: Identity,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse").field("access_token", &"***").field("user", &self.user).finish()
    }
}

pub struct AuthApi<'a> {
    api: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self { Self { api } }

    pub async fn login(&self, req: &LoginRequest) -> AppResult<AuthResponse> {
        self.api.send_json(Method::POST, "/auth/login", req, OnUnauthorized::PassThrough, "Login failed").await
    }

    pub async fn register(&self, req: &RegisterRequest) -> AppResult<AuthResponse> {
        self.api.send_json(Method::POST, "/auth/register", req, OnUnauthorized::PassThrough, "Registration failed").await
    }

    pub async fn me(&self) -> AppResult<Identity> {
        self.api.get_json("/auth/me", &[], "Failed to load current user").await
    }

    /// Resolve the user behind a carried-over token that is not yet the session's.
    pub(crate) async fn me_as(&self, credential: &Credential) -> AppResult<Identity> {
        self.api.get_json_as("/auth/me", credential, "Failed to load current user").await
    }

    pub async fn refresh(&self) -> AppResult<AuthResponse> {
        self.api.post_empty("/auth/refresh", "Failed to refresh session").await
    }
}
