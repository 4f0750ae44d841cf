//! Backend Records
//!
//! Plain records exchanged verbatim with the capstone backend, plus the
//! request bodies the client sends. Field names follow the backend's JSON
//! (`camelCase`, except `academic_period`).

use serde::{Deserialize, Deserializer, Serialize};

/// Project status values understood by the backend
pub mod status {
    /// Awaiting admin approval
    pub const PENDING: &str = "pendiente";
    /// Approved and running
    pub const IN_PROGRESS: &str = "en progreso";
    /// Finished
    pub const COMPLETED: &str = "completado";
}

/// Decode `null` as the type's default (the backend sends both `null` and
/// missing fields for empty values).
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================
// Entities
// ============================================

/// A user profile as returned by `/users/:id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable")]
    pub role_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl UserProfile {
    /// Shallow-merge the fields present in `patch`
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(role_id) = &patch.role_id {
            self.role_id = role_id.clone();
        }
        if let Some(career_id) = &patch.career_id {
            self.career_id = Some(career_id.clone());
        }
        if let Some(image) = &patch.image {
            self.image = Some(image.clone());
        }
    }
}

/// Partial user update, used both as a PATCH body and as a cache patch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl UserPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A capstone project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub objectives: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub summary: String,
    #[serde(default, deserialize_with = "nullable")]
    pub cycle: String,
    #[serde(rename = "academic_period", default, deserialize_with = "nullable")]
    pub academic_period: String,
    #[serde(default, deserialize_with = "nullable")]
    pub career_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub created_by: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub deliverables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Project {
    pub fn is_pending(&self) -> bool {
        self.status == status::PENDING
    }

    /// Structured view over the flat deliverables array
    pub fn deliverables(&self) -> Deliverables {
        Deliverables::classify(&self.deliverables)
    }
}

/// Deliverables split into links and free-text notes.
///
/// The backend stores both in one flat array; an item counts as a link when
/// it starts with `http`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deliverables {
    pub links: Vec<String>,
    pub notes: Vec<String>,
}

impl Deliverables {
    pub fn is_link(item: &str) -> bool {
        item.starts_with("http")
    }

    pub fn classify(items: &[String]) -> Self {
        let (links, notes) = items.iter().cloned().partition(|item| Self::is_link(item));
        Self { links, notes }
    }

    /// The link shown in the detail view and prefilled in the edit form
    pub fn primary_link(&self) -> Option<&str> {
        self.links.first().map(String::as_str)
    }

    /// Add a link after the ones already present
    pub fn push_link(&mut self, link: impl Into<String>) {
        self.links.push(link.into());
    }

    /// Wire representation: notes first, then links
    pub fn into_flat(self) -> Vec<String> {
        let mut items = self.notes;
        items.extend(self.links);
        items
    }
}

/// A technical skill that can be attached to projects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Career {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

/// Join record linking a project to a skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSkill {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    pub project_id: String,
    pub skill_id: String,
}

/// Join record linking a user to a project; list endpoints embed the project
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project: Option<Project>,
}

/// List responses come either as a bare array or wrapped in `{ "data": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Wrapped { data: Option<Vec<T>> },
}

impl<T> ListEnvelope<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListEnvelope::Bare(items) => items,
            ListEnvelope::Wrapped { data } => data.unwrap_or_default(),
        }
    }
}

// ============================================
// Request / Response bodies
// ============================================

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub user_role: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub role_id: String,
    pub password: String,
    pub career_id: String,
}

/// Body for creating or updating a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    pub name: String,
    pub description: String,
    pub summary: String,
    pub cycle: String,
    #[serde(rename = "academic_period")]
    pub academic_period: String,
    pub career_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub objectives: Vec<String>,
    pub deliverables: Vec<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// Body for `PATCH /projects/:id` status changes
#[derive(Debug, Serialize)]
pub struct StatusPatch<'a> {
    pub status: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillPayload {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectSkill<'a> {
    pub project_id: &'a str,
    pub skill_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserProject<'a> {
    pub user_id: &'a str,
    pub project_id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_envelope_shapes() {
        let bare: ListEnvelope<Role> =
            serde_json::from_str(r#"[{"id":"1","name":"ADMIN"}]"#).unwrap();
        assert_eq!(bare.into_vec().len(), 1);

        let wrapped: ListEnvelope<Role> =
            serde_json::from_str(r#"{"data":[{"id":"1","name":"ADMIN"},{"id":"2","name":"TEACHER"}],"total":2}"#)
                .unwrap();
        assert_eq!(wrapped.into_vec().len(), 2);

        let empty: ListEnvelope<Role> = serde_json::from_str(r#"{"total":0}"#).unwrap();
        assert!(empty.into_vec().is_empty());
    }

    #[test]
    fn test_project_tolerates_nulls() {
        let json = r#"{
            "id": "p1",
            "name": "Drone mapping",
            "description": null,
            "status": "pendiente",
            "objectives": null,
            "academic_period": "2024-2025",
            "careerId": "c1",
            "createdBy": "u1",
            "startDate": "2024-03-01T00:00:00.000Z"
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.description, "");
        assert!(project.objectives.is_empty());
        assert!(project.deliverables.is_empty());
        assert_eq!(project.academic_period, "2024-2025");
        assert!(project.is_pending());
        assert_eq!(project.end_date, None);
    }

    #[test]
    fn test_deliverables_classify() {
        let items = vec![
            "Final report".to_string(),
            "https://github.com/team/repo".to_string(),
            "Slides".to_string(),
        ];
        let deliverables = Deliverables::classify(&items);
        assert_eq!(deliverables.notes, vec!["Final report", "Slides"]);
        assert_eq!(deliverables.primary_link(), Some("https://github.com/team/repo"));
        assert_eq!(
            deliverables.into_flat(),
            vec!["Final report", "Slides", "https://github.com/team/repo"]
        );
    }

    #[test]
    fn test_user_apply_patch_is_shallow() {
        let mut user = UserProfile {
            id: "u1".into(),
            name: "Ana".into(),
            email: "ana@uni.edu".into(),
            role_id: "r1".into(),
            career_id: Some("c1".into()),
            image: None,
        };
        user.apply(&UserPatch::name("Ana María"));
        assert_eq!(user.name, "Ana María");
        assert_eq!(user.email, "ana@uni.edu");
        assert_eq!(user.career_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_payload_serializes_backend_names() {
        let payload = ProjectPayload {
            name: "n".into(),
            description: "d".into(),
            summary: String::new(),
            cycle: "8".into(),
            academic_period: "2024-2025".into(),
            career_id: "c1".into(),
            status: Some(status::PENDING.into()),
            objectives: vec!["A".into()],
            deliverables: vec![],
            start_date: "2024-03-01T00:00:00.000Z".into(),
            end_date: "2024-07-01T00:00:00.000Z".into(),
            created_by: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["careerId"], "c1");
        assert_eq!(value["academic_period"], "2024-2025");
        assert_eq!(value["startDate"], "2024-03-01T00:00:00.000Z");
        assert!(value.get("createdBy").is_none());
    }
}
