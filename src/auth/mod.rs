//! Credential forms: sign-in and sign-up.
//!
//! Both forms share one shape. Field edits are plain local mutations;
//! `submit` validates locally and is the only call that reaches the
//! session gateway.

mod sign_in;
mod sign_up;

use thiserror::Error;

pub use sign_in::{SignInField, SignInForm};
pub use sign_up::{SignUpField, SignUpForm, REGISTRATION_SUCCESS};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Local validation failures, detected before any network call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LEN)]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// What a submit attempt ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    /// Local validation failed; the message is in `status().error()`.
    Invalid,
    /// The gateway refused; its message is in `status().error()`.
    Rejected,
    /// Sign-in succeeded.
    Authenticated,
    /// Sign-up succeeded. With `session_active` the caller should open the
    /// workspace once the success message has been shown.
    Registered { session_active: bool },
    /// A submit is already in flight.
    Busy,
}

/// Error/success text and the busy flag shared by both forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormStatus {
    error: Option<String>,
    success: Option<String>,
    submitting: bool,
}

impl FormStatus {
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    /// While true, inputs and the submit action are disabled.
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Start a submit attempt: clear messages, then run local validation.
    /// Returns the outcome to report when the attempt stops here.
    fn begin(&mut self, validation: Result<(), ValidationError>) -> Option<FormOutcome> {
        if self.submitting {
            return Some(FormOutcome::Busy);
        }
        self.error = None;
        self.success = None;
        if let Err(e) = validation {
            self.error = Some(e.to_string());
            return Some(FormOutcome::Invalid);
        }
        self.submitting = true;
        None
    }

    fn reject(&mut self, message: String) {
        self.error = Some(message);
        self.submitting = false;
    }

    fn succeed(&mut self, message: Option<&str>) {
        self.success = message.map(str::to_string);
        self.submitting = false;
    }
}

/// The shape both credential forms share.
pub trait CredentialForm {
    type Field: Copy;

    /// Overwrite one field. Ignored while a submit is in flight.
    fn update_field(&mut self, field: Self::Field, value: String);

    fn field(&self, field: Self::Field) -> &str;

    fn status(&self) -> &FormStatus;

    /// Client-side checks only; the service stays the source of truth.
    fn validate(&self) -> Result<(), ValidationError>;
}

fn normalize_field_name(s: &str) -> String {
    s.trim().to_lowercase().replace(&['-', ' '][..], "_")
}
