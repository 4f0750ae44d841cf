//! Routing
//!
//! Maps URL paths to pages. `guard` sends anonymous sessions on protected
//! routes to the login page; it is a navigation convenience, the backend
//! remains the only place where access is enforced.

use crate::session::Session;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Profile,
    Projects,
    /// Projects page with the detail dialog of one project open
    ProjectDetail(String),
    NotFound(String),
}

impl Route {
    /// Parse a URL path. `/` redirects to the login page.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] | ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["dashboard"] => Route::Dashboard,
            ["profile"] => Route::Profile,
            ["projects"] => Route::Projects,
            ["projects", id] => match urlencoding::decode(id) {
                Ok(id) => Route::ProjectDetail(id.into_owned()),
                Err(_) => Route::NotFound(path.to_string()),
            },
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::Projects => "/projects".to_string(),
            Route::ProjectDetail(id) => format!("/projects/{}", urlencoding::encode(id)),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            Route::Dashboard | Route::Profile | Route::Projects | Route::ProjectDetail(_)
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Redirect protected routes to login when nobody is logged in
pub fn guard(route: Route, session: &Session) -> Route {
    if route.requires_session() && !session.is_logged_in {
        tracing::debug!(requested = %route, "no session, redirecting to login");
        Route::Login
    } else {
        route
    }
}
