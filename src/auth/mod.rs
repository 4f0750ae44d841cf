//! Authentication Flow
//!
//! `Anonymous → Authenticating → Authenticated`, and back to `Anonymous` on
//! logout. Login and registration pages live in the submodules; this module
//! holds the shared state, the routing of backend messages onto form fields
//! and the logout action.

mod login;
mod register;

pub use login::LoginPage;
pub use register::{PasswordChecks, RegisterPage, RegistrationForm};

use crate::client::ApiError;
use crate::config::UiConfig;
use crate::notice::NoticeBoard;
use crate::router::Route;
use crate::session::{Session, SessionError, SessionStore};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No token
    Anonymous,
    /// A login or register submission is in flight; inputs are disabled
    Authenticating,
    /// Token present
    Authenticated,
}

impl AuthState {
    pub fn of(session: &Session) -> Self {
        if session.is_logged_in && session.token.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }
}

/// Error text attached to the login form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub email: Option<String>,
    pub password: Option<String>,
    pub general: Option<String>,
}

const EMAIL_KEYWORDS: [&str; 2] = ["correo", "email"];
const PASSWORD_KEYWORDS: [&str; 2] = ["contraseña", "password"];

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.general.is_none()
    }

    /// Distribute a failed backend call over the form fields.
    ///
    /// Field-tagged errors are used as sent. Plain messages fall back to
    /// keyword matching; a later message overwrites an earlier one on the
    /// same field.
    pub fn from_api_error(err: &ApiError) -> Self {
        let mut errors = Self::default();

        if err.is_transport() {
            errors.general = Some(err.user_message());
            return errors;
        }

        let tagged = err.field_messages();
        if !tagged.is_empty() {
            for item in tagged {
                let slot = match item.field.to_lowercase().as_str() {
                    "email" => &mut errors.email,
                    "password" => &mut errors.password,
                    _ => &mut errors.general,
                };
                *slot = Some(item.message.clone());
            }
            return errors;
        }

        let messages = err.messages();
        if messages.is_empty() {
            errors.general = Some(err.user_message());
            return errors;
        }

        for message in messages {
            let lower = message.to_lowercase();
            let slot = if EMAIL_KEYWORDS.iter().any(|k| lower.contains(k)) {
                &mut errors.email
            } else if PASSWORD_KEYWORDS.iter().any(|k| lower.contains(k)) {
                &mut errors.password
            } else {
                &mut errors.general
            };
            *slot = Some(message.clone());
        }
        errors
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            ("email", &self.email),
            ("password", &self.password),
            ("error", &self.general),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}: {}", label, v)))
        .collect();
        f.write_str(&parts.join("\n"))
    }
}

/// Close the session: clear the store, confirm, then hand back the login
/// route once the redirect delay has passed.
pub async fn logout(
    session: &SessionStore,
    notices: &mut NoticeBoard,
    ui: &UiConfig,
) -> Result<Route, SessionError> {
    if let Err(e) = session.logout() {
        tracing::error!(error = %e, "failed to clear session");
        notices.show_error("Could not close the session");
        return Err(e);
    }

    tracing::info!("session closed");
    notices.show_success("Session closed");
    tokio::time::sleep(Duration::from_millis(ui.logout_redirect_ms)).await;
    Ok(Route::Login)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_routing() {
        let err = ApiError::from_response(
            401,
            r#"{"message":["El correo no existe","Contraseña incorrecta","Cuenta bloqueada"]}"#,
        );
        let errors = FieldErrors::from_api_error(&err);
        assert_eq!(errors.email.as_deref(), Some("El correo no existe"));
        assert_eq!(errors.password.as_deref(), Some("Contraseña incorrecta"));
        assert_eq!(errors.general.as_deref(), Some("Cuenta bloqueada"));
    }

    #[test]
    fn test_later_message_wins() {
        let err = ApiError::from_response(400, r#"{"message":["bad email","email taken"]}"#);
        let errors = FieldErrors::from_api_error(&err);
        assert_eq!(errors.email.as_deref(), Some("email taken"));
        assert!(errors.general.is_none());
    }

    #[test]
    fn test_tagged_errors_take_precedence() {
        let err = ApiError::from_response(
            422,
            r#"{"message":"Contraseña incorrecta","errors":[{"field":"email","message":"unknown account"}]}"#,
        );
        let errors = FieldErrors::from_api_error(&err);
        assert_eq!(errors.email.as_deref(), Some("unknown account"));
        assert!(errors.password.is_none());
    }

    #[test]
    fn test_unstructured_is_general() {
        let err = ApiError::from_response(500, "oops");
        let errors = FieldErrors::from_api_error(&err);
        assert_eq!(errors.general.as_deref(), Some("Something went wrong"));
        assert!(errors.email.is_none());
    }

    #[test]
    fn test_auth_state_of_session() {
        assert_eq!(AuthState::of(&Session::default()), AuthState::Anonymous);
        let session = Session {
            is_logged_in: true,
            token: Some("t".into()),
            ..Session::default()
        };
        assert_eq!(AuthState::of(&session), AuthState::Authenticated);
    }

    #[tokio::test]
    async fn test_logout_clears_and_redirects() {
        let session = SessionStore::in_memory();
        session.login("tok", "u1", "ADMIN").unwrap();
        let ui = UiConfig {
            logout_redirect_ms: 10,
            ..UiConfig::default()
        };
        let mut notices = NoticeBoard::new(&ui);

        let route = logout(&session, &mut notices, &ui).await.unwrap();

        assert_eq!(route, Route::Login);
        assert_eq!(session.snapshot(), Session::default());
        assert_eq!(notices.success(), Some("Session closed"));
    }
}
