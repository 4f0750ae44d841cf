//! Form validation and serialization
//!
//! Forms are validated before any request is issued. A valid form turns into
//! the request body the backend expects: newline-delimited text areas become
//! arrays (blank lines dropped), an optional link joins the deliverables and
//! dates become RFC 3339 timestamps.

use crate::models::{status, Deliverables, Project, ProjectPayload, SkillPayload};
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Per-field validation messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(value)` when no error was recorded
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "Validation failed ({})", parts.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Split a text area into its non-blank lines
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// `YYYY-MM-DD` (or a full timestamp) to midnight UTC in RFC 3339 with millis
pub fn date_to_timestamp(date: &str) -> Option<String> {
    let day = date.trim().split('T').next()?;
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
    let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?);
    Some(midnight.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

fn required(errors: &mut ValidationErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

/// Create/edit project form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectForm {
    pub name: String,
    /// Problem statement
    pub description: String,
    pub summary: String,
    /// One deliverable per line
    pub deliverables: String,
    pub link: String,
    pub cycle: String,
    pub academic_period: String,
    pub start_date: String,
    pub end_date: String,
    pub career_id: String,
    /// One objective per line
    pub objectives: String,
    pub status: String,
    /// Skill ids to link to the project
    pub selected_skills: Vec<String>,
}

impl ProjectForm {
    /// Prefill the edit form from an existing project
    pub fn from_project(project: &Project, linked_skills: Vec<String>) -> Self {
        let deliverables = project.deliverables();
        let date_part = |date: &Option<String>| {
            date.as_deref()
                .and_then(|d| d.split('T').next())
                .unwrap_or_default()
                .to_string()
        };

        Self {
            name: project.name.clone(),
            description: project.description.clone(),
            summary: project.summary.clone(),
            deliverables: deliverables.notes.join("\n"),
            link: deliverables.primary_link().unwrap_or_default().to_string(),
            cycle: project.cycle.clone(),
            academic_period: project.academic_period.clone(),
            start_date: date_part(&project.start_date),
            end_date: date_part(&project.end_date),
            career_id: project.career_id.clone(),
            objectives: project.objectives.join("\n"),
            status: project.status.clone(),
            selected_skills: linked_skills,
        }
    }

    /// Add or remove a skill from the selection
    pub fn toggle_skill(&mut self, skill_id: &str) {
        if let Some(pos) = self.selected_skills.iter().position(|s| s == skill_id) {
            self.selected_skills.remove(pos);
        } else {
            self.selected_skills.push(skill_id.to_string());
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.build().map(|_| ())
    }

    /// Body for `POST /projects`: new projects always start pending
    pub fn to_create_payload(&self, created_by: &str) -> Result<ProjectPayload, ValidationErrors> {
        let mut payload = self.build()?;
        payload.status = Some(status::PENDING.to_string());
        payload.created_by = Some(created_by.to_string());
        Ok(payload)
    }

    /// Body for `PATCH /projects/:id`: keeps the form's status
    pub fn to_update_payload(&self) -> Result<ProjectPayload, ValidationErrors> {
        let mut payload = self.build()?;
        let status = self.status.trim();
        payload.status = (!status.is_empty()).then(|| status.to_string());
        Ok(payload)
    }

    fn build(&self) -> Result<ProjectPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "name", &self.name, "Name is required");
        required(&mut errors, "description", &self.description, "Problem statement is required");
        required(&mut errors, "cycle", &self.cycle, "Select a cycle");
        required(&mut errors, "academic_period", &self.academic_period, "Select an academic period");
        required(&mut errors, "career_id", &self.career_id, "Select a career");
        required(&mut errors, "objectives", &self.objectives, "Enter at least one objective");

        let start_date = self.checked_date(&mut errors, "start_date", &self.start_date, "Start date is required");
        let end_date = self.checked_date(&mut errors, "end_date", &self.end_date, "End date is required");

        let objectives = split_lines(&self.objectives);
        if objectives.is_empty() {
            errors.add("objectives", "Enter at least one objective");
        }

        let mut deliverables = Deliverables::classify(&split_lines(&self.deliverables));
        let link = self.link.trim();
        if !link.is_empty() {
            deliverables.push_link(link);
        }

        errors.into_result(ProjectPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            summary: self.summary.clone(),
            cycle: self.cycle.clone(),
            academic_period: self.academic_period.clone(),
            career_id: self.career_id.clone(),
            status: None,
            objectives,
            deliverables: deliverables.into_flat(),
            start_date: start_date.unwrap_or_default(),
            end_date: end_date.unwrap_or_default(),
            created_by: None,
        })
    }

    fn checked_date(
        &self,
        errors: &mut ValidationErrors,
        field: &'static str,
        value: &str,
        missing: &str,
    ) -> Option<String> {
        if value.trim().is_empty() {
            errors.add(field, missing);
            return None;
        }
        let timestamp = date_to_timestamp(value);
        if timestamp.is_none() {
            errors.add(field, "Invalid date, expected YYYY-MM-DD");
        }
        timestamp
    }
}

/// Create/edit skill form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillForm {
    pub name: String,
    pub description: String,
}

impl SkillForm {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Body for `POST /skills`, with placeholder details
    pub fn to_create_payload(&self) -> Result<SkillPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "name", &self.name, "Name is required");
        required(&mut errors, "description", &self.description, "Description is required");
        errors.into_result(SkillPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            details: Some(serde_json::json!({ "level": "N/A", "category": "N/A" })),
        })
    }

    /// Body for `PATCH /skills/:id`; only the name is mandatory
    pub fn to_update_payload(&self) -> Result<SkillPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "name", &self.name, "Name is required");
        errors.into_result(SkillPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            details: None,
        })
    }
}
