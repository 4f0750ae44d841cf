//! Dashboard page
//!
//! Aggregate counts over the four main collections. The fetches are joined
//! all-settled: one failing collection leaves its count at zero without
//! affecting the others.

use crate::client::{ApiClient, ApiResult};
use crate::config::UiConfig;
use crate::models::{Career, Project, Skill, UserProfile};
use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub projects: usize,
    pub users: usize,
    pub careers: usize,
    pub skills: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardPage {
    pub stats: DashboardStats,
    pub projects: Vec<Project>,
    pub users: Vec<UserProfile>,
    pub careers: Vec<Career>,
    pub skills: Vec<Skill>,
    /// Collections whose fetch failed during the last load
    pub failed: Vec<&'static str>,
    recent_limit: usize,
}

fn settle<T>(
    collection: &'static str,
    result: ApiResult<Vec<T>>,
    failed: &mut Vec<&'static str>,
) -> Option<Vec<T>> {
    match result {
        Ok(items) => Some(items),
        Err(e) => {
            tracing::warn!(collection, error = %e, "dashboard fetch failed");
            failed.push(collection);
            None
        }
    }
}

impl DashboardPage {
    pub fn new(ui: &UiConfig) -> Self {
        Self {
            recent_limit: ui.recent_projects,
            ..Self::default()
        }
    }

    /// Load the counts. Without a token nothing is fetched.
    pub async fn load(client: &ApiClient, session: &SessionStore, ui: &UiConfig) -> Self {
        let mut page = Self::new(ui);
        if session.token().is_none() {
            tracing::debug!("no token, dashboard left empty");
            return page;
        }

        let (projects, users, careers, skills) = tokio::join!(
            client.list_projects(),
            client.list_users(),
            client.list_careers(),
            client.list_skills(),
        );

        if let Some(projects) = settle("projects", projects, &mut page.failed) {
            page.stats.projects = projects.len();
            page.projects = projects;
        }
        if let Some(users) = settle("users", users, &mut page.failed) {
            page.stats.users = users.len();
            page.users = users;
        }
        if let Some(careers) = settle("careers", careers, &mut page.failed) {
            page.stats.careers = careers.len();
            page.careers = careers;
        }
        if let Some(skills) = settle("skills", skills, &mut page.failed) {
            page.stats.skills = skills.len();
            page.skills = skills;
        }

        page
    }

    /// The first few projects, in backend order
    pub fn recent_projects(&self) -> &[Project] {
        let n = self.recent_limit.min(self.projects.len());
        &self.projects[..n]
    }

    pub fn stat_cards(&self) -> Vec<StatCard> {
        vec![
            StatCard {
                label: "Projects",
                value: self.stats.projects,
            },
            StatCard {
                label: "Users",
                value: self.stats.users,
            },
            StatCard {
                label: "Careers",
                value: self.stats.careers,
            },
            StatCard {
                label: "Skills",
                value: self.stats.skills,
            },
        ]
    }

    pub fn career_name(&self, career_id: &str) -> Option<&str> {
        self.careers
            .iter()
            .find(|c| c.id == career_id)
            .map(|c| c.name.as_str())
    }
}
