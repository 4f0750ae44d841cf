//! Page models
//!
//! Each page fetches what it needs through the [`ApiClient`](crate::client::ApiClient),
//! keeps the results as local state and derives its views from it. Pages share
//! nothing besides the client and the session store.

mod dashboard;
mod profile;
mod projects;

pub use dashboard::{DashboardPage, DashboardStats, StatCard};
pub use profile::{ProfilePage, ProfileView};
pub use projects::{
    OwnershipFilter, ProjectFilter, ProjectPermissions, ProjectsPage, StatusFilter, Viewer,
};

use crate::client::ApiError;
use crate::forms::ValidationErrors;
use crate::router::Route;
use crate::session::SessionError;
use thiserror::Error;

/// Errors surfaced by page loads and mutation handlers
#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl PageError {
    /// Where to navigate instead of showing the error inline
    pub fn redirect(&self) -> Option<Route> {
        match self {
            PageError::NotLoggedIn => Some(Route::Login),
            PageError::Api(e) if e.is_unauthorized() => Some(Route::Login),
            _ => None,
        }
    }

    /// Text for the error notice
    pub fn user_message(&self) -> String {
        match self {
            PageError::Validation(_) => "Please review the highlighted fields".to_string(),
            PageError::Api(e) => e.user_message(),
            PageError::Session(_) => "Could not save the session".to_string(),
            PageError::NotLoggedIn => "Please log in".to_string(),
            PageError::NotFound(what) => format!("{} not found", what),
        }
    }
}
