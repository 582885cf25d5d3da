//! Ordered gate evaluation for the security-setup wizard.
//!
//! The branching that decides which step an account still owes is a single
//! rule list evaluated in sequence, shared by the initial login and every
//! post-step re-check. The ordering invariant (email before 2FA before
//! password) lives here and nowhere else.

use crate::api::types::Account;

/// A security prerequisite the account has not satisfied yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    EmailVerification,
    TwoFactorEnrollment,
    PasswordRotation,
}

const GATES: [(fn(&Account) -> bool, Gate); 3] = [
    (|a| !a.email_verified, Gate::EmailVerification),
    (|a| !a.two_factor_enabled, Gate::TwoFactorEnrollment),
    (|a| a.require_password_change, Gate::PasswordRotation),
];

/// Returns the first unsatisfied gate, or `None` when the account may
/// proceed to the dashboard.
#[must_use]
pub fn next_gate(account: &Account) -> Option<Gate> {
    GATES
        .iter()
        .find(|(outstanding, _)| outstanding(account))
        .map(|(_, gate)| *gate)
}
