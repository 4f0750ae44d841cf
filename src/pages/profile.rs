//! Profile page

use super::PageError;
use crate::client::ApiClient;
use crate::config::UiConfig;
use crate::models::{UserPatch, UserProfile};
use crate::notice::NoticeBoard;
use crate::session::SessionStore;
use std::path::Path;

const UNASSIGNED_CAREER: &str = "Unassigned";
const DEFAULT_ROLE: &str = "User";

/// Profile with its reference names resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub user: UserProfile,
    pub career_name: String,
    pub role_name: String,
}

#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub view: ProfileView,
    pub notices: NoticeBoard,
    user_id: String,
    base_url: String,
}

impl ProfilePage {
    /// Fetch the logged-in user's profile and push it into the session
    pub async fn load(
        client: &ApiClient,
        session: &SessionStore,
        ui: &UiConfig,
    ) -> Result<Self, PageError> {
        let user_id = match (session.is_logged_in(), session.user_id()) {
            (true, Some(id)) => id,
            _ => return Err(PageError::NotLoggedIn),
        };

        let view = Self::fetch(client, session, &user_id).await?;
        Ok(Self {
            view,
            notices: NoticeBoard::new(ui),
            user_id,
            base_url: client.base_url().to_string(),
        })
    }

    async fn fetch(
        client: &ApiClient,
        session: &SessionStore,
        user_id: &str,
    ) -> Result<ProfileView, PageError> {
        let user = client.get_user(user_id).await?;
        let (careers, roles) = tokio::try_join!(client.list_careers(), client.list_roles())?;

        let career_name = user
            .career_id
            .as_deref()
            .and_then(|id| careers.iter().find(|c| c.id == id))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| UNASSIGNED_CAREER.to_string());
        let role_name = roles
            .iter()
            .find(|r| r.id == user.role_id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| DEFAULT_ROLE.to_string());

        session.set_user(user.clone())?;

        Ok(ProfileView {
            user,
            career_name,
            role_name,
        })
    }

    pub async fn reload(
        &mut self,
        client: &ApiClient,
        session: &SessionStore,
    ) -> Result<(), PageError> {
        self.view = Self::fetch(client, session, &self.user_id).await?;
        Ok(())
    }

    /// Change the display name. Blank names are ignored (`Ok(false)`).
    ///
    /// The cached profile is patched before the reload confirms the change.
    pub async fn rename(
        &mut self,
        client: &ApiClient,
        session: &SessionStore,
        name: &str,
    ) -> Result<bool, PageError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }

        let patch = UserPatch::name(name);
        if let Err(e) = client.update_user(&self.user_id, &patch).await {
            tracing::warn!(error = %e, "failed to rename user");
            self.notices.show_error("Could not update the name");
            return Err(e.into());
        }

        session.update_user(&patch)?;
        self.view.user.apply(&patch);
        self.notices.show_success("Name updated");
        self.reload(client, session).await?;
        Ok(true)
    }

    /// Upload a new profile picture
    pub async fn upload_image(
        &mut self,
        client: &ApiClient,
        session: &SessionStore,
        file: &Path,
    ) -> Result<(), PageError> {
        if let Err(e) = client.upload_user_image(&self.user_id, file).await {
            tracing::warn!(error = %e, file = %file.display(), "failed to upload image");
            self.notices.show_error("Could not upload the image");
            return Err(e.into());
        }

        self.notices.show_success("Image updated");
        self.reload(client, session).await
    }

    /// Where the profile picture can be fetched from
    pub fn image_url(&self) -> Option<String> {
        resolve_image(&self.base_url, self.view.user.image.as_deref()?)
    }
}

fn resolve_image(base_url: &str, image: &str) -> Option<String> {
    let image = image.trim();
    if image.is_empty() {
        None
    } else if image.starts_with("http://") || image.starts_with("https://") {
        Some(image.to_string())
    } else {
        Some(format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            image.trim_start_matches('/')
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_image() {
        assert_eq!(
            resolve_image("http://localhost:8000", "/uploads/me.png").as_deref(),
            Some("http://localhost:8000/uploads/me.png")
        );
        assert_eq!(
            resolve_image("http://localhost:8000/", "uploads/me.png").as_deref(),
            Some("http://localhost:8000/uploads/me.png")
        );
        assert_eq!(
            resolve_image("http://localhost:8000", "https://cdn.example.org/me.png").as_deref(),
            Some("https://cdn.example.org/me.png")
        );
        assert!(resolve_image("http://localhost:8000", "  ").is_none());
    }

    #[tokio::test]
    async fn test_requires_session() {
        let config = crate::config::ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let session = std::sync::Arc::new(SessionStore::in_memory());
        let client = ApiClient::new(&config, session.clone()).unwrap();

        let err = ProfilePage::load(&client, &session, &UiConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::NotLoggedIn));
        assert_eq!(err.redirect(), Some(crate::router::Route::Login));
    }
}
