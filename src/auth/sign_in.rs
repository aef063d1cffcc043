use super::{normalize_field_name, CredentialForm, FormOutcome, FormStatus, ValidationError};
use crate::gateway::SessionGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInField {
    Email,
    Password,
}

impl std::str::FromStr for SignInField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_field_name(s).as_str() {
            "email" => Ok(SignInField::Email),
            "password" => Ok(SignInField::Password),
            _ => Err(format!("Unknown sign-in field: {}", s)),
        }
    }
}

#[derive(Clone, Default)]
pub struct SignInForm {
    email: String,
    password: String,
    status: FormStatus,
}

impl std::fmt::Debug for SignInForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("status", &self.status)
            .finish()
    }
}

impl SignInForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn submit(&mut self, gateway: &dyn SessionGateway) -> FormOutcome {
        let validation = self.validate();
        if let Some(outcome) = self.status.begin(validation) {
            return outcome;
        }

        match gateway.sign_in(&self.email, &self.password).await {
            Ok(()) => {
                tracing::debug!(email = %self.email, "Signed in");
                self.status.succeed(None);
                FormOutcome::Authenticated
            }
            Err(e) => {
                tracing::warn!("Sign-in rejected: {}", e);
                self.status.reject(e.message);
                FormOutcome::Rejected
            }
        }
    }
}

impl CredentialForm for SignInForm {
    type Field = SignInField;

    fn update_field(&mut self, field: SignInField, value: String) {
        if self.status.submitting {
            return;
        }
        match field {
            SignInField::Email => self.email = value,
            SignInField::Password => self.password = value,
        }
    }

    fn field(&self, field: SignInField) -> &str {
        match field {
            SignInField::Email => &self.email,
            SignInField::Password => &self.password,
        }
    }

    fn status(&self) -> &FormStatus {
        &self.status
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        Ok(())
    }
}
