//! Typed endpoint helpers
//!
//! One method per backend route. Path ids are percent-encoded.

use super::{ApiClient, ApiError, ApiResult};
use crate::models::{
    Career, ListEnvelope, LoginRequest, LoginResponse, NewProjectSkill, NewUserProject, Project,
    ProjectPayload, ProjectSkill, RegisterRequest, Role, Skill, SkillPayload, StatusPatch,
    UserPatch, UserProfile, UserProject,
};
use std::path::Path;

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Best-effort content type for an uploaded image
fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

impl ApiClient {
    // ============ Auth / Users ============

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("/auth/login", &body).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<serde_json::Value> {
        self.post("/users", request).await
    }

    pub async fn list_users(&self) -> ApiResult<Vec<UserProfile>> {
        self.get_list("/users").await
    }

    pub async fn get_user(&self, id: &str) -> ApiResult<UserProfile> {
        self.get(&format!("/users/{}", segment(id))).await
    }

    pub async fn update_user(&self, id: &str, patch: &UserPatch) -> ApiResult<serde_json::Value> {
        self.patch(&format!("/users/{}", segment(id)), patch).await
    }

    pub async fn delete_user(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/users/{}", segment(id))).await
    }

    /// Upload a profile picture as multipart field `file`
    pub async fn upload_user_image(
        &self,
        id: &str,
        file: &Path,
    ) -> ApiResult<serde_json::Value> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| ApiError::Request(format!("cannot read {:?}: {}", file, e)))?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(image_mime(file))
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        self.patch_multipart(&format!("/users/{}/image", segment(id)), form)
            .await
    }

    // ============ Projects ============

    pub async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        self.get_list("/projects").await
    }

    pub async fn create_project(&self, payload: &ProjectPayload) -> ApiResult<Project> {
        self.post("/projects", payload).await
    }

    pub async fn update_project(
        &self,
        id: &str,
        payload: &ProjectPayload,
    ) -> ApiResult<serde_json::Value> {
        self.patch(&format!("/projects/{}", segment(id)), payload).await
    }

    pub async fn set_project_status(&self, id: &str, status: &str) -> ApiResult<serde_json::Value> {
        self.patch(&format!("/projects/{}", segment(id)), &StatusPatch { status })
            .await
    }

    pub async fn delete_project(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/projects/{}", segment(id))).await
    }

    // ============ Skills ============

    pub async fn list_skills(&self) -> ApiResult<Vec<Skill>> {
        self.get_list("/skills").await
    }

    pub async fn create_skill(&self, payload: &SkillPayload) -> ApiResult<serde_json::Value> {
        self.post("/skills", payload).await
    }

    pub async fn update_skill(&self, id: &str, payload: &SkillPayload) -> ApiResult<serde_json::Value> {
        self.patch(&format!("/skills/{}", segment(id)), payload).await
    }

    pub async fn delete_skill(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/skills/{}", segment(id))).await
    }

    // ============ Reference data ============

    pub async fn list_careers(&self) -> ApiResult<Vec<Career>> {
        self.get_list("/careers").await
    }

    pub async fn list_roles(&self) -> ApiResult<Vec<Role>> {
        self.get_list("/roles").await
    }

    // ============ Associations ============

    pub async fn list_project_skills(&self) -> ApiResult<Vec<ProjectSkill>> {
        self.get_list("/projects-skills").await
    }

    pub async fn attach_skill(&self, project_id: &str, skill_id: &str) -> ApiResult<serde_json::Value> {
        self.post(
            "/projects-skills",
            &NewProjectSkill {
                project_id,
                skill_id,
            },
        )
        .await
    }

    /// Projects linked to a user through `/users-projects`
    pub async fn list_user_projects(&self, user_id: &str) -> ApiResult<Vec<Project>> {
        let links: ListEnvelope<UserProject> = self
            .get(&format!("/users-projects/user/{}", segment(user_id)))
            .await?;
        Ok(links
            .into_vec()
            .into_iter()
            .filter_map(|link| link.project)
            .collect())
    }

    pub async fn link_user_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> ApiResult<serde_json::Value> {
        self.post(
            "/users-projects",
            &NewUserProject {
                user_id,
                project_id,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("abc-123"), "abc-123");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime(Path::new("me.PNG")), "image/png");
        assert_eq!(image_mime(Path::new("me.jpeg")), "image/jpeg");
        assert_eq!(image_mime(Path::new("me")), "application/octet-stream");
    }
}
