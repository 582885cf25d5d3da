//! Client-side input validation for the wizard. Anything rejected here never
//! reaches the network.

/// Length of email and TOTP verification codes.
pub const CODE_LEN: usize = 6;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Accumulator for 6-digit verification codes.
///
/// Non-digit characters are ignored and the buffer caps at six digits.
/// [`CodeInput::take_ready`] yields the code exactly once when the sixth
/// digit arrives, whether typed one key at a time or pasted as a block, so a
/// paste auto-fires a single verification attempt and partial codes fire
/// none.
#[derive(Clone, Debug, Default)]
pub struct CodeInput {
    buffer: String,
    fired: bool,
}

impl CodeInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends input, keeping only digits and capping at six.
    pub fn push_str(&mut self, input: &str) {
        for ch in input.chars() {
            if self.buffer.len() >= CODE_LEN {
                break;
            }
            if ch.is_ascii_digit() {
                self.buffer.push(ch);
            }
        }
    }

    /// Returns the complete code exactly once, or `None` while the buffer is
    /// partial or the code was already taken.
    pub fn take_ready(&mut self) -> Option<&str> {
        if self.fired || self.buffer.len() < CODE_LEN {
            return None;
        }
        self.fired = true;
        Some(&self.buffer)
    }

    /// Clears the buffer and re-arms the fire-once latch.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.fired = false;
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

/// Checks that a code is exactly six ASCII digits.
#[must_use]
pub fn is_complete_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.chars().all(|ch| ch.is_ascii_digit())
}

/// Validates the new-password form before any network call.
///
/// # Errors
/// Returns a user-facing message when the password is too short or the
/// confirmation does not match.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), String> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    if password != confirm {
        return Err("passwords do not match".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_code_never_fires() {
        let mut input = CodeInput::new();
        input.push_str("12345");
        assert!(input.take_ready().is_none());
        assert!(input.take_ready().is_none());
    }

    #[test]
    fn pasted_code_fires_exactly_once() {
        let mut input = CodeInput::new();
        input.push_str("123456");
        assert_eq!(input.take_ready(), Some("123456"));
        assert!(input.take_ready().is_none());
    }

    #[test]
    fn typed_code_fires_on_sixth_digit() {
        let mut input = CodeInput::new();
        for digit in ["1", "2", "3", "4", "5"] {
            input.push_str(digit);
            assert!(input.take_ready().is_none());
        }
        input.push_str("6");
        assert_eq!(input.take_ready(), Some("123456"));
    }

    #[test]
    fn non_digits_are_ignored() {
        let mut input = CodeInput::new();
        input.push_str("12-34 56");
        assert_eq!(input.take_ready(), Some("123456"));
    }

    #[test]
    fn excess_input_is_capped() {
        let mut input = CodeInput::new();
        input.push_str("1234567890");
        assert_eq!(input.take_ready(), Some("123456"));
    }

    #[test]
    fn clear_rearms_the_latch() {
        let mut input = CodeInput::new();
        input.push_str("123456");
        assert!(input.take_ready().is_some());
        input.clear();
        input.push_str("654321");
        assert_eq!(input.take_ready(), Some("654321"));
    }

    #[test]
    fn complete_code_check() {
        assert!(is_complete_code("123456"));
        assert!(!is_complete_code("12345"));
        assert!(!is_complete_code("12345a"));
        assert!(!is_complete_code("1234567"));
    }

    #[test]
    fn password_rules() {
        assert!(validate_new_password("short", "short").is_err());
        assert!(validate_new_password("longenough", "different").is_err());
        assert!(validate_new_password("longenough", "longenough").is_ok());
    }
}
