//! Request and response types for the authentication API. Login payloads
//! carry credentials and verification codes, so they must never be logged.

use serde::{Deserialize, Serialize};

/// Security-flag snapshot for the authenticated account. The wizard refreshes
/// this after every completed step to decide what is still outstanding.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub email: String,
    pub email_verified: bool,
    pub two_factor_enabled: bool,
    pub require_password_change: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp_code: Option<String>,
}

/// Raw login response body. A success carries `token` and `user`; an account
/// that already has 2FA enrolled answers with `requires2FA` instead.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginResponse {
    pub token: Option<String>,
    pub user: Option<Account>,
    #[serde(default, rename = "requires2FA")]
    pub requires_2fa: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
}

/// TOTP enrollment material returned by the server. Held only between the
/// setup and verify steps, never persisted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TotpEnrollment {
    pub secret: String,
    pub otpauth_url: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordRequest {
    pub new_password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MeResponse {
    pub user: Account,
}

/// Error body shape used by the platform API. `blocked` distinguishes a
/// disabled account from an ordinary rejection.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
