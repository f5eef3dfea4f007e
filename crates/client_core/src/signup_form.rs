//! Multi-step waitlist form.
//!
//! [`transition`] is a pure function of the current [`FormState`] and a
//! [`FormEvent`]; network work is requested through [`FormEffect`] and its
//! outcome is fed back in as another event. [`SignupForm`] drives that loop
//! against a [`WaitlistApi`].

use std::sync::Arc;

use shared::{
    domain::{OrganizationKind, Role},
    error::DUPLICATE_EMAIL_MESSAGE,
    protocol::{SignupReceipt, SubmitSignupRequest},
    validation::{is_valid_email, validate_signup, ValidationError},
};
use tracing::{info, warn};

use crate::{universities::University, ClientError, UniversityDirectory, WaitlistApi};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormStep {
    #[default]
    Email,
    Profile,
    Success,
}

/// Field values shared by every step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub organization: String,
    pub accepted_terms: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub step: FormStep,
    pub data: FormData,
    pub submitting: bool,
    pub error: Option<String>,
    pub receipt: Option<SignupReceipt>,
}

impl FormState {
    pub fn can_continue(&self) -> bool {
        self.step == FormStep::Email && is_valid_email(&self.data.email)
    }

    pub fn can_submit(&self) -> bool {
        self.step == FormStep::Profile
            && !self.submitting
            && self.data.accepted_terms
            && !self.data.organization.trim().is_empty()
    }

    pub fn position(&self) -> Option<i64> {
        self.receipt.as_ref().map(|receipt| receipt.signup_position)
    }

    /// Text shown on the success step.
    pub fn success_message(&self) -> Option<String> {
        let position = self.position()?;
        let name = self.data.name.trim();
        let greeting = if name.is_empty() {
            "Thanks for joining".to_string()
        } else {
            format!("Thanks for joining, {name}")
        };
        Some(format!(
            "{greeting}! You are number {position} on the waitlist. We'll be in touch shortly."
        ))
    }
}

/// Why a submission did not land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitFailure {
    Duplicate,
    Other(String),
}

impl SubmitFailure {
    pub fn message(&self) -> &str {
        match self {
            Self::Duplicate => DUPLICATE_EMAIL_MESSAGE,
            Self::Other(message) => message,
        }
    }
}

impl From<ClientError> for SubmitFailure {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api(err) if err.is_duplicate_email() => Self::Duplicate,
            ClientError::Api(err) => Self::Other(err.message),
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    EmailChanged(String),
    NameChanged(String),
    RoleChanged(Role),
    OrganizationChanged(String),
    TermsToggled(bool),
    Continue,
    Back,
    Submit,
    SubmitSucceeded(SignupReceipt),
    SubmitFailed(SubmitFailure),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEffect {
    SubmitSignup(SubmitSignupRequest),
}

pub fn transition(state: &FormState, event: FormEvent) -> (FormState, Option<FormEffect>) {
    let mut next = state.clone();
    let mut effect = None;

    match (state.step, event) {
        (FormStep::Email, FormEvent::EmailChanged(email)) => {
            next.data.email = email;
            next.error = None;
        }
        (FormStep::Email, FormEvent::Continue) => {
            if state.can_continue() {
                next.step = FormStep::Profile;
                next.error = None;
            } else {
                next.error = Some(ValidationError::InvalidEmail.to_string());
            }
        }
        (FormStep::Profile, event) if state.submitting => match event {
            FormEvent::SubmitSucceeded(receipt) => {
                next.step = FormStep::Success;
                next.submitting = false;
                next.error = None;
                next.receipt = Some(receipt);
            }
            FormEvent::SubmitFailed(failure) => {
                next.submitting = false;
                next.error = Some(failure.message().to_string());
            }
            _ => {}
        },
        (FormStep::Profile, FormEvent::NameChanged(name)) => {
            next.data.name = name;
        }
        (FormStep::Profile, FormEvent::RoleChanged(role)) => {
            if role.organization_kind() != state.data.role.organization_kind() {
                next.data.organization.clear();
            }
            next.data.role = role;
            next.error = None;
        }
        (FormStep::Profile, FormEvent::OrganizationChanged(organization)) => {
            next.data.organization = organization;
            next.error = None;
        }
        (FormStep::Profile, FormEvent::TermsToggled(accepted)) => {
            next.data.accepted_terms = accepted;
        }
        (FormStep::Profile, FormEvent::Back) => {
            next.step = FormStep::Email;
            next.error = None;
        }
        (FormStep::Profile, FormEvent::Submit) => {
            if state.can_submit() {
                let request = submit_request(&state.data);
                match validate_signup(&request) {
                    Ok(_) => {
                        next.submitting = true;
                        next.error = None;
                        effect = Some(FormEffect::SubmitSignup(request));
                    }
                    Err(err) => next.error = Some(err.to_string()),
                }
            }
        }
        (FormStep::Success, FormEvent::Reset) => {
            next = FormState::default();
        }
        _ => {}
    }

    (next, effect)
}

fn submit_request(data: &FormData) -> SubmitSignupRequest {
    let name = data.name.trim();
    SubmitSignupRequest {
        email: data.email.trim().to_string(),
        name: (!name.is_empty()).then(|| name.to_string()),
        role: data.role,
        organization: data.organization.trim().to_string(),
    }
}

/// Form state plus the read-only university list used for suggestions.
pub struct SignupForm {
    state: FormState,
    universities: Arc<UniversityDirectory>,
}

impl SignupForm {
    pub fn new(universities: Arc<UniversityDirectory>) -> Self {
        Self {
            state: FormState::default(),
            universities,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn handle(&mut self, event: FormEvent) -> Option<FormEffect> {
        let (next, effect) = transition(&self.state, event);
        self.state = next;
        effect
    }

    /// Directory matches for the organization typed so far. Business
    /// signups type their organization freely and get no suggestions.
    pub fn organization_suggestions(&self, limit: usize) -> Vec<&University> {
        match self.state.data.role.organization_kind() {
            OrganizationKind::University => self
                .universities
                .search(&self.state.data.organization, limit),
            OrganizationKind::Company => Vec::new(),
        }
    }

    pub fn organization_label(&self) -> &'static str {
        self.state.data.role.organization_label()
    }

    /// Submit the profile step and apply the server's answer.
    ///
    /// Does nothing when the form is not ready or a submission is already in
    /// flight.
    pub async fn submit(&mut self, api: &dyn WaitlistApi) {
        let Some(FormEffect::SubmitSignup(request)) = self.handle(FormEvent::Submit) else {
            return;
        };

        let outcome = match api.submit_signup(&request).await {
            Ok(receipt) => {
                info!(position = receipt.signup_position, "signup accepted");
                FormEvent::SubmitSucceeded(receipt)
            }
            Err(err) => {
                warn!(error = %err, "signup rejected");
                FormEvent::SubmitFailed(SubmitFailure::from(err))
            }
        };
        self.handle(outcome);
    }
}

#[cfg(test)]
#[path = "tests/signup_form_tests.rs"]
mod tests;
