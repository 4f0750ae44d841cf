//! Projects page
//!
//! Holds the full project collection plus the reference data needed to
//! filter it, and the create/edit/approve/delete handlers for projects and
//! skills. Every handler issues its write, then re-fetches the affected
//! collections; nothing is patched locally.
//!
//! Visibility and permissions computed here decide what is *shown*. They are
//! not an access-control boundary: the backend enforces the real rules.

use super::PageError;
use crate::client::{ApiClient, ApiResult};
use crate::config::UiConfig;
use crate::forms::{ProjectForm, SkillForm};
use crate::models::{status, Career, Project, ProjectSkill, Role, Skill, UserProfile};
use crate::notice::NoticeBoard;
use crate::session::SessionStore;
use futures_util::future::join_all;
use std::collections::HashSet;

// ============================================
// Filters
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(String),
}

impl StatusFilter {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "all" | "All" | "todo" | "Todo" => StatusFilter::All,
            other => StatusFilter::Only(other.to_string()),
        }
    }

    pub fn matches(&self, project_status: &str) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == project_status,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OwnershipFilter {
    #[default]
    All,
    Mine,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub search: String,
    pub status: StatusFilter,
    pub ownership: OwnershipFilter,
}

// ============================================
// Viewer & permissions
// ============================================

/// Who is looking at the page
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub user_id: Option<String>,
    pub role_name: String,
    /// Ids of projects linked to the user through `/users-projects`
    pub linked_projects: HashSet<String>,
}

impl Viewer {
    pub fn is_admin(&self) -> bool {
        self.role_name.to_lowercase().contains("admin")
    }

    pub fn owns(&self, project: &Project) -> bool {
        self.user_id.as_deref() == Some(project.created_by.as_str())
            || self.linked_projects.contains(&project.id)
    }

    /// Pending projects are shown to admins and owners only
    pub fn can_see(&self, project: &Project) -> bool {
        !project.is_pending() || self.is_admin() || self.owns(project)
    }

    pub fn permissions(&self, project: &Project) -> ProjectPermissions {
        let admin = self.is_admin();
        ProjectPermissions {
            can_approve: admin && project.is_pending(),
            can_edit: admin || self.owns(project),
            can_delete: admin,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectPermissions {
    pub can_approve: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

// ============================================
// Page
// ============================================

/// Projects page state
#[derive(Debug, Clone)]
pub struct ProjectsPage {
    pub projects: Vec<Project>,
    pub skills: Vec<Skill>,
    pub project_skills: Vec<ProjectSkill>,
    pub careers: Vec<Career>,
    pub roles: Vec<Role>,
    pub user: Option<UserProfile>,
    pub user_projects: Vec<Project>,
    pub filter: ProjectFilter,
    /// Search term of the skills panel
    pub skill_search: String,
    pub notices: NoticeBoard,
    user_id: Option<String>,
    /// Role reported at login, used until the profile is known
    session_role: Option<String>,
}

impl ProjectsPage {
    /// An empty page for `user_id`; nothing is fetched
    pub fn new(user_id: Option<String>, ui: &UiConfig) -> Self {
        Self {
            projects: Vec::new(),
            skills: Vec::new(),
            project_skills: Vec::new(),
            careers: Vec::new(),
            roles: Vec::new(),
            user: None,
            user_projects: Vec::new(),
            filter: ProjectFilter::default(),
            skill_search: String::new(),
            notices: NoticeBoard::new(ui),
            user_id,
            session_role: None,
        }
    }

    /// Fetch everything the page shows. Any failed request fails the load.
    pub async fn load(
        client: &ApiClient,
        session: &SessionStore,
        ui: &UiConfig,
    ) -> Result<Self, PageError> {
        let snapshot = session.snapshot();
        let mut page = Self::new(snapshot.user_id.clone(), ui);
        page.session_role = snapshot.user_role;

        let user_id = snapshot.user_id.as_deref();
        let user = async {
            match user_id {
                Some(id) => client.get_user(id).await.map(Some),
                None => Ok(None),
            }
        };
        let user_projects = async {
            match user_id {
                Some(id) => client.list_user_projects(id).await,
                None => Ok(Vec::new()),
            }
        };

        let (projects, skills, project_skills, careers, roles, user, user_projects) = tokio::try_join!(
            client.list_projects(),
            client.list_skills(),
            client.list_project_skills(),
            client.list_careers(),
            client.list_roles(),
            user,
            user_projects,
        )?;

        tracing::debug!(
            projects = projects.len(),
            skills = skills.len(),
            links = project_skills.len(),
            "projects page loaded"
        );

        page.projects = projects;
        page.skills = skills;
        page.project_skills = project_skills;
        page.careers = careers;
        page.roles = roles;
        page.user = user;
        page.user_projects = user_projects;
        Ok(page)
    }

    // ============ Derived views ============

    pub fn viewer(&self) -> Viewer {
        let role_name = self
            .user
            .as_ref()
            .and_then(|user| self.roles.iter().find(|r| r.id == user.role_id))
            .map(|role| role.name.clone())
            .or_else(|| self.session_role.clone())
            .unwrap_or_default();

        Viewer {
            user_id: self.user_id.clone(),
            role_name,
            linked_projects: self.user_projects.iter().map(|p| p.id.clone()).collect(),
        }
    }

    pub fn career_name(&self, career_id: &str) -> Option<&str> {
        self.careers
            .iter()
            .find(|c| c.id == career_id)
            .map(|c| c.name.as_str())
    }

    /// Skills attached to a project, in link order
    pub fn project_skills(&self, project_id: &str) -> Vec<&Skill> {
        self.project_skills
            .iter()
            .filter(|link| link.project_id == project_id)
            .filter_map(|link| self.skills.iter().find(|s| s.id == link.skill_id))
            .collect()
    }

    pub fn linked_skill_ids(&self, project_id: &str) -> Vec<String> {
        self.project_skills
            .iter()
            .filter(|link| link.project_id == project_id)
            .map(|link| link.skill_id.clone())
            .collect()
    }

    fn matches_search(&self, project: &Project, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        contains_ci(&project.name, term)
            || contains_ci(&project.description, term)
            || self
                .career_name(&project.career_id)
                .is_some_and(|name| contains_ci(name, term))
            || self
                .project_skills(&project.id)
                .iter()
                .any(|skill| contains_ci(&skill.name, term))
    }

    /// Projects passing the current filter and the visibility rule
    pub fn visible_projects(&self) -> Vec<&Project> {
        let viewer = self.viewer();
        let term = self.filter.search.to_lowercase();

        self.projects
            .iter()
            .filter(|p| viewer.can_see(p))
            .filter(|p| self.filter.status.matches(&p.status))
            .filter(|p| match self.filter.ownership {
                OwnershipFilter::All => true,
                OwnershipFilter::Mine => viewer.owns(p),
            })
            .filter(|p| self.matches_search(p, &term))
            .collect()
    }

    pub fn permissions(&self, project: &Project) -> ProjectPermissions {
        self.viewer().permissions(project)
    }

    /// Project targeted by a `/projects/:id` deep link, once loaded
    pub fn open_detail(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    /// Edit form prefilled from a loaded project
    pub fn edit_form(&self, project_id: &str) -> Option<ProjectForm> {
        self.open_detail(project_id)
            .map(|p| ProjectForm::from_project(p, self.linked_skill_ids(project_id)))
    }

    fn skill_matches(&self, skill: &Skill) -> bool {
        contains_ci(&skill.name, &self.skill_search.to_lowercase())
    }

    fn is_mine(&self, skill: &Skill) -> bool {
        self.user_id.is_some() && skill.created_by_id == self.user_id
    }

    /// Skills created by the current user
    pub fn my_skills(&self) -> Vec<&Skill> {
        self.skills
            .iter()
            .filter(|s| self.is_mine(s) && self.skill_matches(s))
            .collect()
    }

    /// Skills created by everyone else
    pub fn community_skills(&self) -> Vec<&Skill> {
        self.skills
            .iter()
            .filter(|s| !self.is_mine(s) && self.skill_matches(s))
            .collect()
    }

    pub fn can_edit_skill(&self, skill: &Skill) -> bool {
        self.is_mine(skill) || self.viewer().is_admin()
    }

    // ============ Refetching ============

    async fn reload_projects(&mut self, client: &ApiClient) -> ApiResult<()> {
        self.projects = client.list_projects().await?;
        Ok(())
    }

    async fn reload_user_projects(&mut self, client: &ApiClient) -> ApiResult<()> {
        if let Some(user_id) = self.user_id.clone() {
            self.user_projects = client.list_user_projects(&user_id).await?;
        }
        Ok(())
    }

    async fn reload_skills(&mut self, client: &ApiClient) -> ApiResult<()> {
        let (skills, links) =
            tokio::try_join!(client.list_skills(), client.list_project_skills())?;
        self.skills = skills;
        self.project_skills = links;
        Ok(())
    }

    /// A failed refetch after a successful write is reported but does not
    /// undo the write's outcome.
    fn settle_refresh(&mut self, result: ApiResult<()>) {
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to refresh projects page");
            self.notices.show_error("Could not refresh the list");
        }
    }

    fn report(&mut self, message: &str, err: impl Into<PageError>) -> PageError {
        let err = err.into();
        tracing::warn!(error = %err, "{}", message);
        self.notices.show_error(message);
        err
    }

    // ============ Project handlers ============

    /// Create a project (always pending) and attach the selected skills.
    ///
    /// Attachment is not transactional: failures are logged and the project
    /// stays created.
    pub async fn create_project(
        &mut self,
        client: &ApiClient,
        form: &ProjectForm,
    ) -> Result<Project, PageError> {
        let user_id = self.user_id.clone().ok_or(PageError::NotLoggedIn)?;
        let payload = form.to_create_payload(&user_id)?;

        let created = client
            .create_project(&payload)
            .await
            .map_err(|e| self.report("Could not create the project", e))?;

        if !created.id.is_empty() {
            let attached = join_all(
                form.selected_skills
                    .iter()
                    .map(|skill_id| client.attach_skill(&created.id, skill_id)),
            )
            .await;
            for (skill_id, result) in form.selected_skills.iter().zip(attached) {
                if let Err(e) = result {
                    tracing::warn!(project = %created.id, skill = %skill_id, error = %e, "failed to attach skill");
                }
            }
        }

        tracing::info!(project = %created.id, "project created");
        let refreshed = async {
            self.reload_projects(client).await?;
            self.reload_user_projects(client).await?;
            self.reload_skills(client).await
        }
        .await;
        self.settle_refresh(refreshed);
        self.notices.show_success("Project saved");
        Ok(created)
    }

    /// Update a project and attach the newly selected skills
    pub async fn edit_project(
        &mut self,
        client: &ApiClient,
        project_id: &str,
        form: &ProjectForm,
    ) -> Result<(), PageError> {
        let payload = form.to_update_payload()?;

        client
            .update_project(project_id, &payload)
            .await
            .map_err(|e| self.report("Could not save changes", e))?;

        let existing: HashSet<String> = self.linked_skill_ids(project_id).into_iter().collect();
        let added: Vec<&String> = form
            .selected_skills
            .iter()
            .filter(|id| !existing.contains(*id))
            .collect();

        let results = join_all(
            added
                .iter()
                .map(|skill_id| client.attach_skill(project_id, skill_id)),
        )
        .await;
        if let Some(e) = results.into_iter().find_map(Result::err) {
            return Err(self.report("Could not save changes", e));
        }

        tracing::info!(project = %project_id, added = added.len(), "project updated");
        let refreshed = async {
            self.reload_projects(client).await?;
            self.reload_skills(client).await
        }
        .await;
        self.settle_refresh(refreshed);
        self.notices.show_success("Changes saved");
        Ok(())
    }

    /// Move a pending project to "en progreso"
    pub async fn approve_project(
        &mut self,
        client: &ApiClient,
        project_id: &str,
    ) -> Result<(), PageError> {
        client
            .set_project_status(project_id, status::IN_PROGRESS)
            .await
            .map_err(|e| self.report("Could not approve the project", e))?;

        tracing::info!(project = %project_id, "project approved");
        let refreshed = self.reload_projects(client).await;
        self.settle_refresh(refreshed);
        self.notices.show_success("Project approved");
        Ok(())
    }

    pub async fn delete_project(
        &mut self,
        client: &ApiClient,
        project_id: &str,
    ) -> Result<(), PageError> {
        client
            .delete_project(project_id)
            .await
            .map_err(|e| self.report("Could not delete the project", e))?;

        tracing::info!(project = %project_id, "project deleted");
        let refreshed = async {
            self.reload_projects(client).await?;
            self.reload_skills(client).await
        }
        .await;
        self.settle_refresh(refreshed);
        self.notices.show_success("Project deleted");
        Ok(())
    }

    // ============ Skill handlers ============

    pub async fn create_skill(
        &mut self,
        client: &ApiClient,
        form: &SkillForm,
    ) -> Result<(), PageError> {
        let payload = form.to_create_payload()?;

        if let Err(e) = client.create_skill(&payload).await {
            let message = if e.is_conflict() {
                "Skill already added"
            } else {
                "Could not create the skill"
            };
            return Err(self.report(message, e));
        }

        tracing::info!(skill = %payload.name, "skill created");
        let refreshed = self.reload_skills(client).await;
        self.settle_refresh(refreshed);
        self.notices.show_success("Skill created");
        Ok(())
    }

    pub async fn update_skill(
        &mut self,
        client: &ApiClient,
        skill_id: &str,
        form: &SkillForm,
    ) -> Result<(), PageError> {
        let payload = form.to_update_payload()?;

        client
            .update_skill(skill_id, &payload)
            .await
            .map_err(|e| self.report("Could not update the skill", e))?;

        let refreshed = self.reload_skills(client).await;
        self.settle_refresh(refreshed);
        self.notices.show_success("Skill updated");
        Ok(())
    }

    pub async fn delete_skill(
        &mut self,
        client: &ApiClient,
        skill_id: &str,
    ) -> Result<(), PageError> {
        client
            .delete_skill(skill_id)
            .await
            .map_err(|e| self.report("Could not delete the skill", e))?;

        tracing::info!(skill = %skill_id, "skill deleted");
        let refreshed = self.reload_skills(client).await;
        self.settle_refresh(refreshed);
        self.notices.show_success("Skill deleted");
        Ok(())
    }
}
