use super::{
    normalize_field_name, CredentialForm, FormOutcome, FormStatus, ValidationError,
    MIN_PASSWORD_LEN,
};
use crate::gateway::{Profile, SessionGateway};

pub const REGISTRATION_SUCCESS: &str =
    "Registration successful! Please check your email for a confirmation link.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpField {
    FirstName,
    LastName,
    Email,
    Password,
    ConfirmPassword,
}

impl std::str::FromStr for SignUpField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_field_name(s).as_str() {
            "first_name" | "firstname" => Ok(SignUpField::FirstName),
            "last_name" | "lastname" => Ok(SignUpField::LastName),
            "email" => Ok(SignUpField::Email),
            "password" => Ok(SignUpField::Password),
            "confirm_password" | "confirmpassword" | "confirm" => Ok(SignUpField::ConfirmPassword),
            _ => Err(format!("Unknown sign-up field: {}", s)),
        }
    }
}

#[derive(Clone, Default)]
pub struct SignUpForm {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    confirm_password: String,
    status: FormStatus,
}

impl std::fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpForm")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .field("status", &self.status)
            .finish()
    }
}

impl SignUpForm {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear_fields(&mut self) {
        self.first_name.clear();
        self.last_name.clear();
        self.email.clear();
        self.password.clear();
        self.confirm_password.clear();
    }

    pub async fn submit(&mut self, gateway: &dyn SessionGateway) -> FormOutcome {
        let validation = self.validate();
        if let Some(outcome) = self.status.begin(validation) {
            return outcome;
        }

        let profile = Profile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        };

        match gateway.sign_up(&self.email, &self.password, &profile).await {
            Ok(registration) => {
                tracing::debug!(
                    session_active = registration.session_active,
                    "Registered new account"
                );
                self.clear_fields();
                self.status.succeed(Some(REGISTRATION_SUCCESS));
                FormOutcome::Registered {
                    session_active: registration.session_active,
                }
            }
            Err(e) => {
                tracing::warn!("Sign-up rejected: {}", e);
                self.status.reject(e.message);
                FormOutcome::Rejected
            }
        }
    }
}

impl CredentialForm for SignUpForm {
    type Field = SignUpField;

    fn update_field(&mut self, field: SignUpField, value: String) {
        if self.status.submitting {
            return;
        }
        match field {
            SignUpField::FirstName => self.first_name = value,
            SignUpField::LastName => self.last_name = value,
            SignUpField::Email => self.email = value,
            SignUpField::Password => self.password = value,
            SignUpField::ConfirmPassword => self.confirm_password = value,
        }
    }

    fn field(&self, field: SignUpField) -> &str {
        match field {
            SignUpField::FirstName => &self.first_name,
            SignUpField::LastName => &self.last_name,
            SignUpField::Email => &self.email,
            SignUpField::Password => &self.password,
            SignUpField::ConfirmPassword => &self.confirm_password,
        }
    }

    fn status(&self) -> &FormStatus {
        &self.status
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.first_name.is_empty()
            || self.last_name.is_empty()
            || self.email.is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(ValidationError::MissingFields);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}
