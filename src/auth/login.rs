//! Login page

use super::{AuthState, FieldErrors};
use crate::client::ApiClient;
use crate::router::Route;
use crate::session::SessionStore;

/// Login form state
#[derive(Debug, Clone)]
pub struct LoginPage {
    state: AuthState,
    pub errors: FieldErrors,
}

impl LoginPage {
    pub fn new(session: &SessionStore) -> Self {
        Self {
            state: AuthState::of(&session.snapshot()),
            errors: FieldErrors::default(),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Checks done before any request is issued
    pub fn validate(email: &str, password: &str) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if email.trim().is_empty() {
            errors.email = Some("Email is required".to_string());
        } else if !email.contains('@') {
            errors.email = Some("Invalid email".to_string());
        }
        if password.trim().is_empty() {
            errors.password = Some("Password is required".to_string());
        }
        errors
    }

    /// Submit the credentials. On success the session is populated and the
    /// dashboard route is returned.
    pub async fn submit(
        &mut self,
        client: &ApiClient,
        session: &SessionStore,
        email: &str,
        password: &str,
    ) -> Result<Route, FieldErrors> {
        self.errors = Self::validate(email, password);
        if !self.errors.is_empty() {
            return Err(self.errors.clone());
        }

        self.state = AuthState::Authenticating;
        let response = match client.login(email, password).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "login rejected");
                self.state = AuthState::Anonymous;
                self.errors = FieldErrors::from_api_error(&e);
                return Err(self.errors.clone());
            }
        };

        if let Err(e) = session.login(response.access_token, response.user_id, response.user_role) {
            tracing::error!(error = %e, "failed to persist session");
            if let Err(e) = session.logout() {
                tracing::warn!(error = %e, "failed to roll back session");
            }
            self.state = AuthState::Anonymous;
            self.errors.general = Some("Could not save the session".to_string());
            return Err(self.errors.clone());
        }

        tracing::info!("logged in");
        self.state = AuthState::Authenticated;
        Ok(Route::Dashboard)
    }
}
