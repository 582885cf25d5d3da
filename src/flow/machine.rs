//! The security-setup wizard: a finite state machine gating dashboard access
//! until the account has a verified email, TOTP 2FA, and no pending password
//! rotation.
//!
//! Each transition is driven by an explicit caller action plus one API round
//! trip. A failed call leaves the current step untouched; the caller surfaces
//! the error and the user retries. Client-side validation (code length,
//! password rules) rejects input before any network call is made.

use crate::api::{
    types::{Account, TotpEnrollment},
    ApiError, AuthClient, LoginOutcome,
};
use crate::flow::{
    input,
    rules::{self, Gate},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::debug;

/// Current step of the wizard. Step-specific data lives inside the variant
/// so stale material (a TOTP secret, a pending login) cannot outlive the
/// step that needs it.
#[derive(Clone, Debug)]
pub enum Step {
    /// Waiting for credentials.
    Login,
    /// Email verification outstanding; `email` is the address shown to the
    /// user as the verification target.
    Email { email: String, code_sent: bool },
    /// 2FA enrollment outstanding; no secret requested yet.
    TwoFactorSetup,
    /// Enrollment material issued; waiting for the first code.
    TwoFactorVerify { enrollment: TotpEnrollment },
    /// The account already has 2FA; the login needs a TOTP code. Credentials
    /// are retained for the follow-up login call.
    TwoFactorLogin {
        email: String,
        password: SecretString,
    },
    /// Mandatory password rotation outstanding.
    PasswordChange,
    /// The account is disabled. Terminal except for an explicit return to
    /// `Login`, which resets local state only.
    Blocked,
}

/// Result of a successful transition attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// More steps remain; inspect [`SecuritySetup::step`].
    Continue,
    /// All prerequisites satisfied; the caller may proceed to the dashboard.
    Dashboard,
}

#[derive(Debug, Error)]
pub enum FlowError {
    /// Rejected client-side; no network call was made.
    #[error("{0}")]
    Validation(String),
    /// The requested action does not apply to the current step.
    #[error("action not available at this step")]
    WrongStep,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// One wizard session. Created per login attempt and discarded on completion
/// or navigation away; nothing is persisted.
pub struct SecuritySetup {
    api: AuthClient,
    step: Step,
    account: Option<Account>,
    token: Option<SecretString>,
}

impl SecuritySetup {
    #[must_use]
    pub fn new(api: AuthClient) -> Self {
        Self {
            api,
            step: Step::Login,
            account: None,
            token: None,
        }
    }

    #[must_use]
    pub fn step(&self) -> &Step {
        &self.step
    }

    /// Latest security-flag snapshot, present once a login succeeded.
    #[must_use]
    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    /// Bearer token for the session, present once a login succeeded.
    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Submits credentials from the login form.
    ///
    /// # Errors
    /// Returns a validation error for empty fields, and an API error when the
    /// server rejects the login for a reason other than a blocked account.
    pub async fn submit_credentials(
        &mut self,
        email: &str,
        password: SecretString,
    ) -> Result<Outcome, FlowError> {
        if !matches!(self.step, Step::Login) {
            return Err(FlowError::WrongStep);
        }

        let email = email.trim().to_string();
        if email.is_empty() || password.expose_secret().trim().is_empty() {
            return Err(FlowError::Validation(
                "email and password are required".to_string(),
            ));
        }

        match self.api.login(&email, &password, None).await {
            Ok(LoginOutcome::Success { token, account }) => {
                self.token = Some(token);
                Ok(self.advance(account, &email))
            }
            Ok(LoginOutcome::Requires2fa) => {
                debug!("login requires a TOTP code");
                self.step = Step::TwoFactorLogin { email, password };
                Ok(Outcome::Continue)
            }
            Err(ApiError::Blocked) => {
                self.step = Step::Blocked;
                Ok(Outcome::Continue)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Asks the server to send the email verification code.
    ///
    /// # Errors
    /// Returns an API error when the request fails; `code_sent` stays false.
    pub async fn send_email_code(&mut self) -> Result<(), FlowError> {
        let Step::Email { .. } = &self.step else {
            return Err(FlowError::WrongStep);
        };

        self.api.send_email_code().await?;

        if let Step::Email { code_sent, .. } = &mut self.step {
            *code_sent = true;
        }
        Ok(())
    }

    /// Verifies the emailed 6-digit code, then re-evaluates the remaining
    /// gates from a fresh flag snapshot.
    ///
    /// # Errors
    /// Returns a validation error for a partial code or when no code was
    /// requested yet, and an API error when the server rejects the code.
    pub async fn verify_email_code(&mut self, code: &str) -> Result<Outcome, FlowError> {
        let Step::Email { email, code_sent } = &self.step else {
            return Err(FlowError::WrongStep);
        };
        if !code_sent {
            return Err(FlowError::Validation(
                "request a verification code first".to_string(),
            ));
        }
        if !input::is_complete_code(code) {
            return Err(FlowError::Validation("enter the 6-digit code".to_string()));
        }
        let email = email.clone();

        self.api.verify_email_code(code).await?;
        let account = self.api.me().await?;
        Ok(self.advance(account, &email))
    }

    /// Requests TOTP enrollment material from the server.
    ///
    /// # Errors
    /// Returns an API error when the request fails; the step is unchanged.
    pub async fn begin_totp_setup(&mut self) -> Result<(), FlowError> {
        if !matches!(self.step, Step::TwoFactorSetup) {
            return Err(FlowError::WrongStep);
        }

        let enrollment = self.api.totp_setup().await?;
        self.step = Step::TwoFactorVerify { enrollment };
        Ok(())
    }

    /// Confirms TOTP enrollment with the first authenticator code.
    ///
    /// # Errors
    /// Returns a validation error for a partial code, and an API error when
    /// the server rejects it.
    pub async fn verify_totp(&mut self, code: &str) -> Result<Outcome, FlowError> {
        let Step::TwoFactorVerify { .. } = &self.step else {
            return Err(FlowError::WrongStep);
        };
        if !input::is_complete_code(code) {
            return Err(FlowError::Validation("enter the 6-digit code".to_string()));
        }

        self.api.totp_verify(code).await?;
        let account = self.api.me().await?;
        let email = account.email.clone();
        Ok(self.advance(account, &email))
    }

    /// Completes a 2FA-challenged login with the authenticator code.
    ///
    /// # Errors
    /// Returns a validation error for a partial code, and an API error when
    /// the server rejects the login.
    pub async fn submit_totp_login(&mut self, code: &str) -> Result<Outcome, FlowError> {
        let Step::TwoFactorLogin { email, password } = &self.step else {
            return Err(FlowError::WrongStep);
        };
        if !input::is_complete_code(code) {
            return Err(FlowError::Validation("enter the 6-digit code".to_string()));
        }
        let (email, password) = (email.clone(), password.clone());

        match self.api.login(&email, &password, Some(code)).await {
            Ok(LoginOutcome::Success { token, account }) => {
                self.token = Some(token);
                Ok(self.advance(account, &email))
            }
            Ok(LoginOutcome::Requires2fa) => Err(FlowError::Api(ApiError::Decode(
                "unexpected repeated 2FA challenge".to_string(),
            ))),
            Err(ApiError::Blocked) => {
                self.step = Step::Blocked;
                Ok(Outcome::Continue)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Submits the rotated password. The session keeps its bearer token; the
    /// server does not re-authenticate.
    ///
    /// # Errors
    /// Returns a validation error when the password is too short or the
    /// confirmation differs, and an API error when the server rejects it.
    pub async fn submit_new_password(
        &mut self,
        password: &SecretString,
        confirm: &SecretString,
    ) -> Result<Outcome, FlowError> {
        if !matches!(self.step, Step::PasswordChange) {
            return Err(FlowError::WrongStep);
        }
        input::validate_new_password(password.expose_secret(), confirm.expose_secret())
            .map_err(FlowError::Validation)?;

        self.api.set_password(password).await?;
        let account = self.api.me().await?;
        let email = account.email.clone();
        Ok(self.advance(account, &email))
    }

    /// Returns to the login form from the TOTP challenge or the blocked
    /// screen, discarding all local session state. A blocked account stays
    /// blocked server-side.
    ///
    /// # Errors
    /// Returns `WrongStep` from any other step.
    pub fn back_to_login(&mut self) -> Result<(), FlowError> {
        if !matches!(self.step, Step::TwoFactorLogin { .. } | Step::Blocked) {
            return Err(FlowError::WrongStep);
        }

        self.step = Step::Login;
        self.account = None;
        self.token = None;
        self.api.clear_token();
        Ok(())
    }

    /// Stores the fresh snapshot and moves to the first outstanding gate, or
    /// reports that the dashboard is reachable.
    fn advance(&mut self, account: Account, verification_email: &str) -> Outcome {
        let gate = rules::next_gate(&account);
        self.account = Some(account);

        match gate {
            Some(Gate::EmailVerification) => {
                self.step = Step::Email {
                    email: verification_email.to_string(),
                    code_sent: false,
                };
                Outcome::Continue
            }
            Some(Gate::TwoFactorEnrollment) => {
                self.step = Step::TwoFactorSetup;
                Outcome::Continue
            }
            Some(Gate::PasswordRotation) => {
                self.step = Step::PasswordChange;
                Outcome::Continue
            }
            None => Outcome::Dashboard,
        }
    }
}
