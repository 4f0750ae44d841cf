//! Registration page

use super::AuthState;
use crate::client::ApiClient;
use crate::config::UiConfig;
use crate::forms::ValidationErrors;
use crate::models::{Career, RegisterRequest, Role};
use crate::notice::NoticeBoard;
use crate::pages::PageError;
use crate::router::Route;
use regex::Regex;
use std::sync::OnceLock;

/// Role assigned to self-registered accounts
const SELF_SERVICE_ROLE: &str = "TEACHER";

static DIGIT_RE: OnceLock<Regex> = OnceLock::new();
static UPPER_RE: OnceLock<Regex> = OnceLock::new();
static LOWER_RE: OnceLock<Regex> = OnceLock::new();
static SYMBOL_RE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("password rule regex failed to compile: {error}"))
    })
}

/// Password strength rules, evaluated individually so each can be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordChecks {
    pub min_length: bool,
    pub has_number: bool,
    pub has_upper: bool,
    pub has_lower: bool,
    pub has_symbol: bool,
}

impl PasswordChecks {
    pub fn evaluate(password: &str) -> Self {
        Self {
            min_length: password.chars().count() >= 8,
            has_number: compiled(&DIGIT_RE, r"\d").is_match(password),
            has_upper: compiled(&UPPER_RE, r"\p{Lu}").is_match(password),
            has_lower: compiled(&LOWER_RE, r"\p{Ll}").is_match(password),
            has_symbol: compiled(&SYMBOL_RE, r#"[!@#$%^&*(),.?":{}|<>]"#).is_match(password),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.unmet().is_empty()
    }

    /// Human-readable rules that are not satisfied yet
    pub fn unmet(&self) -> Vec<&'static str> {
        [
            (self.min_length, "at least 8 characters"),
            (self.has_number, "a number"),
            (self.has_upper, "an upper-case letter"),
            (self.has_lower, "a lower-case letter"),
            (self.has_symbol, "a symbol"),
        ]
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, rule)| rule)
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub career_id: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.add("name", "Name is required");
        }
        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !self.email.contains('@') {
            errors.add("email", "Invalid email");
        }
        let checks = PasswordChecks::evaluate(&self.password);
        if !checks.is_valid() {
            errors.add(
                "password",
                format!("Password needs {}", checks.unmet().join(", ")),
            );
        }
        if self.career_id.trim().is_empty() {
            errors.add("careerId", "Career is required");
        }
        errors.into_result(())
    }
}

/// Registration page state
#[derive(Debug, Clone)]
pub struct RegisterPage {
    pub careers: Vec<Career>,
    pub roles: Vec<Role>,
    pub notices: NoticeBoard,
    state: AuthState,
}

impl RegisterPage {
    /// Fetch careers and roles. Either may fail without blocking the page.
    pub async fn load(client: &ApiClient, ui: &UiConfig) -> Self {
        let (careers, roles) = tokio::join!(client.list_careers(), client.list_roles());

        let careers = careers.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load careers");
            Vec::new()
        });
        let roles = roles.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load roles");
            Vec::new()
        });

        Self {
            careers,
            roles,
            notices: NoticeBoard::new(ui),
            state: AuthState::Anonymous,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Id of the role given to new accounts, empty when roles are unknown
    pub fn default_role_id(&self) -> String {
        self.roles
            .iter()
            .find(|role| role.name == SELF_SERVICE_ROLE)
            .map(|role| role.id.clone())
            .unwrap_or_default()
    }

    /// Create the account. On success the login route is returned.
    pub async fn submit(
        &mut self,
        client: &ApiClient,
        form: &RegistrationForm,
    ) -> Result<Route, PageError> {
        if let Err(errors) = form.validate() {
            if errors.get("password").is_some() {
                self.notices
                    .show_error("The password does not meet the requirements");
            }
            return Err(errors.into());
        }

        let request = RegisterRequest {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            role_id: self.default_role_id(),
            password: form.password.clone(),
            career_id: form.career_id.clone(),
        };

        self.state = AuthState::Authenticating;
        let result = client.register(&request).await;
        self.state = AuthState::Anonymous;

        match result {
            Ok(_) => {
                tracing::info!(email = %request.email, "account registered");
                self.notices.show_success("Account created");
                Ok(Route::Login)
            }
            Err(e) => {
                tracing::warn!(error = %e, "registration rejected");
                self.notices.show_error(e.user_message());
                Err(e.into())
            }
        }
    }
}
