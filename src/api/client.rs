//! HTTP client for the platform authentication API. Centralizes request
//! setup, bearer-token handling, and error mapping so the login flow never
//! touches the wire format directly.

use crate::api::{
    error::ApiError,
    types::{
        Account, ErrorBody, LoginRequest, LoginResponse, MeResponse, SetPasswordRequest,
        TotpEnrollment, VerifyCodeRequest,
    },
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info_span, Instrument};
use url::Url;

/// Request timeout applied to every call, so a hung request surfaces as an
/// inline error instead of a stuck wizard step.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

/// Result of a login attempt that was not rejected outright.
#[derive(Clone, Debug)]
pub enum LoginOutcome {
    Success {
        token: SecretString,
        account: Account,
    },
    /// The account already has 2FA enrolled; a TOTP code is required to
    /// finish the login.
    Requires2fa,
}

/// Authentication API client. Holds the bearer token issued at login and
/// attaches it to every subsequent request for the session.
pub struct AuthClient {
    http: Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
}

impl AuthClient {
    /// Builds a client for the given API base URL.
    ///
    /// # Errors
    /// Returns an error if the URL cannot be parsed, has no host, or uses an
    /// unsupported scheme.
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, user_agent, DEFAULT_TIMEOUT)
    }

    /// Builds a client with an explicit request timeout.
    ///
    /// # Errors
    /// Returns an error if the URL cannot be parsed, has no host, or uses an
    /// unsupported scheme.
    pub fn with_timeout(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = parse_base_url(base_url)?;

        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;

        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Attempts a login, optionally with a TOTP code for accounts that
    /// already have 2FA enrolled. On success the bearer token is kept for the
    /// rest of the session.
    ///
    /// # Errors
    /// Returns `ApiError::Blocked` when the server reports a disabled
    /// account, and the usual transport/status errors otherwise.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
        totp_code: Option<&str>,
    ) -> Result<LoginOutcome, ApiError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.expose_secret().to_string(),
            totp_code: totp_code.map(ToString::to_string),
        };

        let url = self.endpoint("/v1/auth/login");
        let span = info_span!("auth.login", http.method = "POST", url = %url);
        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .instrument(span)
            .await
            .map_err(map_send_error)?;

        let body: LoginResponse = decode_json(check_status(response).await?).await?;

        if body.requires_2fa {
            return Ok(LoginOutcome::Requires2fa);
        }

        let (Some(token), Some(account)) = (body.token, body.user) else {
            return Err(ApiError::Decode(
                "login response missing token or user".to_string(),
            ));
        };

        let token = SecretString::from(token);
        self.set_token(token.clone());
        debug!("login succeeded for {}", account.email);

        Ok(LoginOutcome::Success { token, account })
    }

    /// Asks the server to email a verification code to the account address.
    ///
    /// # Errors
    /// Returns an error if the request fails or the server rejects it.
    pub async fn send_email_code(&self) -> Result<(), ApiError> {
        self.post_empty("/v1/auth/email/send-code", "auth.email_send_code")
            .await
    }

    /// Verifies the 6-digit email code.
    ///
    /// # Errors
    /// Returns an error if the request fails or the code is rejected.
    pub async fn verify_email_code(&self, code: &str) -> Result<(), ApiError> {
        self.post_code("/v1/auth/email/verify", "auth.email_verify", code)
            .await
    }

    /// Begins TOTP enrollment and returns the secret plus otpauth URL for
    /// the authenticator app.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response cannot be
    /// decoded.
    pub async fn totp_setup(&self) -> Result<TotpEnrollment, ApiError> {
        let url = self.endpoint("/v1/auth/totp/setup");
        let span = info_span!("auth.totp_setup", http.method = "POST", url = %url);
        let response = self
            .authorized(self.http.post(url))
            .send()
            .instrument(span)
            .await
            .map_err(map_send_error)?;

        decode_json(check_status(response).await?).await
    }

    /// Confirms TOTP enrollment by verifying the first code.
    ///
    /// # Errors
    /// Returns an error if the request fails or the code is rejected.
    pub async fn totp_verify(&self, code: &str) -> Result<(), ApiError> {
        self.post_code("/v1/auth/totp/verify", "auth.totp_verify", code)
            .await
    }

    /// Sets a new password. Relies on the already-issued bearer token; the
    /// server does not re-authenticate.
    ///
    /// # Errors
    /// Returns an error if the request fails or the password is rejected.
    pub async fn set_password(&self, new_password: &SecretString) -> Result<(), ApiError> {
        let request = SetPasswordRequest {
            new_password: new_password.expose_secret().to_string(),
        };

        let url = self.endpoint("/v1/auth/password");
        let span = info_span!("auth.set_password", http.method = "POST", url = %url);
        let response = self
            .authorized(self.http.post(url))
            .json(&request)
            .send()
            .instrument(span)
            .await
            .map_err(map_send_error)?;

        check_status(response).await.map(|_| ())
    }

    /// Fetches the current security-flag snapshot for the account.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response cannot be
    /// decoded.
    pub async fn me(&self) -> Result<Account, ApiError> {
        let url = self.endpoint("/v1/auth/me");
        let span = info_span!("auth.me", http.method = "GET", url = %url);
        let response = self
            .authorized(self.http.get(url))
            .send()
            .instrument(span)
            .await
            .map_err(map_send_error)?;

        let body: MeResponse = decode_json(check_status(response).await?).await?;
        Ok(body.user)
    }

    /// Drops the session token, typically when the user returns to the login
    /// form.
    pub fn clear_token(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }

    fn set_token(&self, token: SecretString) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token);
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token.read() {
            Ok(slot) => match slot.as_ref() {
                Some(token) => builder.bearer_auth(token.expose_secret()),
                None => builder,
            },
            Err(_) => builder,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{}{}", base, path)
    }

    async fn post_empty(&self, path: &str, span_name: &'static str) -> Result<(), ApiError> {
        let url = self.endpoint(path);
        let span = info_span!("api.post", operation = span_name, url = %url);
        let response = self
            .authorized(self.http.post(url))
            .send()
            .instrument(span)
            .await
            .map_err(map_send_error)?;

        check_status(response).await.map(|_| ())
    }

    async fn post_code(
        &self,
        path: &str,
        span_name: &'static str,
        code: &str,
    ) -> Result<(), ApiError> {
        let request = VerifyCodeRequest {
            code: code.to_string(),
        };

        let url = self.endpoint(path);
        let span = info_span!("api.post", operation = span_name, url = %url);
        let response = self
            .authorized(self.http.post(url))
            .json(&request)
            .send()
            .instrument(span)
            .await
            .map_err(map_send_error)?;

        check_status(response).await.map(|_| ())
    }
}

/// Parses and validates the API base URL.
///
/// # Errors
/// Returns an error if the URL cannot be parsed, has no host, or uses an
/// unsupported scheme.
fn parse_base_url(url: &str) -> Result<Url, ApiError> {
    let parsed = Url::parse(url).map_err(|err| ApiError::BaseUrl(err.to_string()))?;

    if parsed.host().is_none() {
        return Err(ApiError::BaseUrl("no host specified".to_string()));
    }

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ApiError::BaseUrl(format!("unsupported scheme {scheme}")));
    }

    Ok(parsed)
}

fn map_send_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(err.to_string())
    }
}

/// Maps non-success statuses to `ApiError`, detecting the blocked-account
/// signal in the error body.
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();

    if parsed.blocked || status == StatusCode::LOCKED {
        return Err(ApiError::Blocked);
    }

    let message = parsed
        .message
        .or(parsed.error)
        .unwrap_or_else(|| sanitize_body(&body));

    Err(ApiError::Http {
        status: status.as_u16(),
        message,
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::Decode(err.to_string()))
}

/// Trims and truncates raw error bodies for user-facing messages.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "request failed".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
