//! # Capstone Portal
//!
//! Client library for managing academic capstone projects over a REST
//! backend: authentication, a statistics dashboard, project and skill
//! management and a profile editor.
//!
//! ## Modules
//!
//! - [`client`]: HTTP client with bearer-token injection and typed endpoints
//! - [`session`]: persisted session store (one serialization point)
//! - [`auth`]: login, registration and logout flows
//! - [`pages`]: dashboard, projects and profile page models
//! - [`forms`]: validation and request-body serialization
//! - [`router`]: URL paths to pages
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use capstone_portal::auth::LoginPage;
//! use capstone_portal::client::ApiClient;
//! use capstone_portal::config::Config;
//! use capstone_portal::pages::DashboardPage;
//! use capstone_portal::session::{FileStorage, SessionStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let session = Arc::new(SessionStore::open(FileStorage::new(config.session.path())));
//!     let client = ApiClient::new(&config.api, session.clone())?;
//!
//!     let mut login = LoginPage::new(&session);
//!     let route = login
//!         .submit(&client, &session, "ana@uni.edu", "Sup3r$ecret")
//!         .await
//!         .map_err(|e| e.to_string())?;
//!     println!("navigating to {}", route);
//!
//!     let dashboard = DashboardPage::load(&client, &session, &config.ui).await;
//!     for card in dashboard.stat_cards() {
//!         println!("{}: {}", card.label, card.value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod forms;
pub mod models;
pub mod notice;
pub mod pages;
pub mod router;
pub mod session;
pub mod telemetry;

pub use client::{ApiClient, ApiError, ApiResult, TokenSource};
pub use config::Config;
pub use pages::PageError;
pub use router::Route;
pub use session::{Session, SessionStore};
