//! Interactive login wizard. Walks the terminal user through whatever
//! security steps the account still owes (email verification, TOTP
//! enrollment or challenge, password rotation) before announcing that the
//! dashboard is reachable.

use crate::api::AuthClient;
use crate::cli::actions::Action;
use crate::flow::{input::CodeInput, Outcome, SecuritySetup, Step};
use anyhow::Result;
use secrecy::SecretString;
use std::io::{self, BufRead, Write};

const USER_AGENT: &str = concat!("adpanel/", env!("CARGO_PKG_VERSION"));

/// Handle the login action
pub async fn handle(action: Action) -> Result<()> {
    let Action::Login { api_url, email } = action;

    let client = AuthClient::new(&api_url, USER_AGENT)?;
    let mut flow = SecuritySetup::new(client);
    let mut prefill = email;

    loop {
        // Clone the step so the match does not hold a borrow across the
        // mutating transition calls.
        let result = match flow.step().clone() {
            Step::Login => {
                let email = match prefill.take() {
                    Some(email) => {
                        println!("Email: {email}");
                        email
                    }
                    None => prompt("Email")?,
                };
                let password = SecretString::from(prompt("Password")?);
                flow.submit_credentials(&email, password).await
            }
            Step::Email { email, code_sent } => {
                if code_sent {
                    match read_code("Verification code")? {
                        Some(code) => flow.verify_email_code(&code).await,
                        None => Ok(Outcome::Continue),
                    }
                } else {
                    println!("Your email address is not verified yet.");
                    println!("Sending a verification code to {email}.");
                    flow.send_email_code().await.map(|()| Outcome::Continue)
                }
            }
            Step::TwoFactorSetup => {
                println!("Two-factor authentication is required for this account.");
                flow.begin_totp_setup().await.map(|()| Outcome::Continue)
            }
            Step::TwoFactorVerify { enrollment } => {
                println!("Add this account to your authenticator app:");
                println!("  {}", enrollment.otpauth_url);
                println!("  secret: {}", enrollment.secret);
                match read_code("Authenticator code")? {
                    Some(code) => flow.verify_totp(&code).await,
                    None => Ok(Outcome::Continue),
                }
            }
            Step::TwoFactorLogin { .. } => {
                println!("Enter the code from your authenticator app, or 'back' to start over.");
                match prompt("Authenticator code")?.as_str() {
                    "back" => flow.back_to_login().map(|()| Outcome::Continue),
                    line => {
                        let mut code = CodeInput::new();
                        code.push_str(line);
                        match code.take_ready() {
                            Some(code) => flow.submit_totp_login(code).await,
                            None => {
                                println!("Enter the 6-digit code.");
                                Ok(Outcome::Continue)
                            }
                        }
                    }
                }
            }
            Step::PasswordChange => {
                println!("A password change is required before you can continue.");
                let password = SecretString::from(prompt("New password")?);
                let confirm = SecretString::from(prompt("Confirm new password")?);
                flow.submit_new_password(&password, &confirm).await
            }
            Step::Blocked => {
                println!("This account is blocked. Contact support to restore access.");
                let line = prompt("Press Enter to return to the login form, or type 'quit'")?;
                if line == "quit" {
                    return Ok(());
                }
                flow.back_to_login().map(|()| Outcome::Continue)
            }
        };

        match result {
            Ok(Outcome::Dashboard) => {
                let email = flow
                    .account()
                    .map_or_else(|| "account".to_string(), |account| account.email.clone());
                println!("Signed in as {email}. All security requirements are satisfied.");
                return Ok(());
            }
            Ok(Outcome::Continue) => {}
            // Inline error, no automatic retry: the user resubmits.
            Err(err) => println!("Error: {err}"),
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Reads a 6-digit code. Partial input is rejected locally and re-prompted;
/// a full code (typed or pasted) is returned once. `None` means the user
/// submitted an empty line to abort the attempt.
fn read_code(label: &str) -> Result<Option<String>> {
    loop {
        let line = prompt(label)?;
        if line.is_empty() {
            return Ok(None);
        }

        let mut code = CodeInput::new();
        code.push_str(&line);
        match code.take_ready() {
            Some(code) => return Ok(Some(code.to_string())),
            None => println!("Enter the 6-digit code."),
        }
    }
}
