//! End-to-end run of the security-setup wizard for a freshly provisioned
//! account: email verification, TOTP enrollment, then the mandatory password
//! rotation, finishing at the dashboard.

use adpanel::api::AuthClient;
use adpanel::flow::{Outcome, SecuritySetup, Step};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMAIL: &str = "newbuyer@agency.tld";
const TOKEN: &str = "tok-session";

fn account_body(email_verified: bool, two_factor_enabled: bool, require: bool) -> serde_json::Value {
    json!({
        "email": EMAIL,
        "emailVerified": email_verified,
        "twoFactorEnabled": two_factor_enabled,
        "requirePasswordChange": require,
    })
}

/// Queues a one-shot `/v1/auth/me` snapshot; snapshots are consumed in mount
/// order as the wizard refreshes after each step.
async fn mount_me_snapshot(
    server: &MockServer,
    email_verified: bool,
    two_factor_enabled: bool,
    require: bool,
) {
    Mock::given(method("GET"))
        .and(path("/v1/auth/me"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": account_body(email_verified, two_factor_enabled, require),
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn fresh_account_clears_every_gate() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .and(body_json(json!({
            "email": EMAIL,
            "password": "provisioned-pw",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": TOKEN,
            "user": account_body(false, false, true),
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/email/send-code"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/email/verify"))
        .and(body_json(json!({ "code": "111111" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/totp/setup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secret": "JBSWY3DPEHPK3PXP",
            "otpauthUrl": "otpauth://totp/adpanel:newbuyer@agency.tld?secret=JBSWY3DPEHPK3PXP",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/totp/verify"))
        .and(body_json(json!({ "code": "222222" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/auth/password"))
        .and(body_json(json!({ "newPassword": "a-much-better-one" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    // Flag snapshots after each completed step, in order.
    mount_me_snapshot(&server, true, false, true).await;
    mount_me_snapshot(&server, true, true, true).await;
    mount_me_snapshot(&server, true, true, false).await;

    let client = AuthClient::new(&server.uri(), "adpanel-test").expect("client");
    let mut flow = SecuritySetup::new(client);

    // Login routes to email verification first, whatever else is pending.
    let outcome = flow
        .submit_credentials(EMAIL, SecretString::from("provisioned-pw"))
        .await
        .expect("login");
    assert_eq!(outcome, Outcome::Continue);
    match flow.step() {
        Step::Email { email, code_sent } => {
            assert_eq!(email, EMAIL);
            assert!(!code_sent);
        }
        other => panic!("unexpected step: {other:?}"),
    }

    flow.send_email_code().await.expect("send code");
    let outcome = flow.verify_email_code("111111").await.expect("verify email");
    assert_eq!(outcome, Outcome::Continue);
    assert!(matches!(flow.step(), Step::TwoFactorSetup));

    flow.begin_totp_setup().await.expect("totp setup");
    match flow.step() {
        Step::TwoFactorVerify { enrollment } => {
            assert!(enrollment.otpauth_url.starts_with("otpauth://"));
        }
        other => panic!("unexpected step: {other:?}"),
    }

    let outcome = flow.verify_totp("222222").await.expect("verify totp");
    assert_eq!(outcome, Outcome::Continue);
    assert!(matches!(flow.step(), Step::PasswordChange));

    let outcome = flow
        .submit_new_password(
            &SecretString::from("a-much-better-one"),
            &SecretString::from("a-much-better-one"),
        )
        .await
        .expect("rotate password");
    assert_eq!(outcome, Outcome::Dashboard);

    let account = flow.account().expect("account snapshot");
    assert!(account.email_verified);
    assert!(account.two_factor_enabled);
    assert!(!account.require_password_change);
}
