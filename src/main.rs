//! Capstone CLI
//!
//! Command-line front end for the capstone portal:
//! - Log in, register, log out
//! - Dashboard statistics
//! - Project and skill management
//! - Profile editing

use anyhow::{anyhow, bail, Context};
use capstone_portal::auth::{self, LoginPage, RegisterPage, RegistrationForm};
use capstone_portal::client::ApiClient;
use capstone_portal::config::{self, Config};
use capstone_portal::forms::{ProjectForm, SkillForm};
use capstone_portal::models::Project;
use capstone_portal::notice::{NoticeBoard, NoticeKind};
use capstone_portal::pages::{
    DashboardPage, OwnershipFilter, PageError, ProfilePage, ProjectsPage, StatusFilter,
};
use capstone_portal::router::{self, Route};
use capstone_portal::session::{FileStorage, SessionStore};
use capstone_portal::telemetry;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "capstone")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage academic capstone projects")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <config dir>/capstone/config.toml or ./capstone.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend URL, overrides the configuration
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session
    Login {
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Create a teacher account
    Register {
        name: String,
        email: String,
        /// Career id or name
        #[arg(long)]
        career: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Close the session
    Logout,

    /// Show the current session
    Whoami,

    /// Open a page by its URL path (e.g. /projects/42)
    Open { path: String },

    /// Show aggregate statistics
    Dashboard,

    /// Manage projects
    Projects {
        #[command(subcommand)]
        command: ProjectCommand,
    },

    /// Manage skills
    Skills {
        #[command(subcommand)]
        command: SkillCommand,
    },

    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// List visible projects
    List {
        /// Match name, description, career or skill
        #[arg(short, long)]
        search: Option<String>,
        /// Status to keep ("en progreso", "completado", ...)
        #[arg(long)]
        status: Option<String>,
        /// Only projects you own
        #[arg(long)]
        mine: bool,
    },
    /// Show one project
    Show { id: String },
    /// Create a project (starts pending)
    Create {
        #[command(flatten)]
        fields: ProjectFields,
    },
    /// Edit a project
    Edit {
        id: String,
        #[command(flatten)]
        fields: ProjectFields,
    },
    /// Approve a pending project
    Approve { id: String },
    /// Delete a project
    Delete { id: String },
}

#[derive(Args, Debug, Default)]
pub struct ProjectFields {
    #[arg(long)]
    pub name: Option<String>,
    /// Problem statement
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub summary: Option<String>,
    /// Objective (repeatable)
    #[arg(long = "objective")]
    pub objectives: Vec<String>,
    /// Deliverable (repeatable)
    #[arg(long = "deliverable")]
    pub deliverables: Vec<String>,
    /// Repository or demo link
    #[arg(long)]
    pub link: Option<String>,
    #[arg(long)]
    pub cycle: Option<String>,
    /// Academic period
    #[arg(long)]
    pub period: Option<String>,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
    /// Career id or name
    #[arg(long)]
    pub career: Option<String>,
    /// Status (edit only)
    #[arg(long)]
    pub status: Option<String>,
    /// Skill id or name to link (repeatable)
    #[arg(long = "skill")]
    pub skills: Vec<String>,
}

#[derive(Subcommand)]
pub enum SkillCommand {
    /// List skills, yours first
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a skill
    Create { name: String, description: String },
    /// Edit a skill
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a skill
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Show your profile
    Show,
    /// Change your display name
    Rename { name: String },
    /// Upload a profile picture
    Image { path: PathBuf },
}

/// Everything a command needs
struct App {
    config: Config,
    session: Arc<SessionStore>,
    client: ApiClient,
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    telemetry::init(&config.logging);

    if let Commands::Config { output } = &cli.command {
        return write_default_config(output.as_ref());
    }

    let session = Arc::new(SessionStore::open(FileStorage::new(config.session.path())));
    let client = ApiClient::new(&config.api, session.clone())?;
    let ctx = App {
        config,
        session,
        client,
        format: cli.format,
    };

    match cli.command {
        Commands::Login { email, password } => login(&ctx, &email, password).await,
        Commands::Register {
            name,
            email,
            career,
            password,
        } => register(&ctx, name, email, &career, password).await,
        Commands::Logout => logout(&ctx).await,
        Commands::Whoami => whoami(&ctx),
        Commands::Open { path } => open(&ctx, &path).await,
        Commands::Dashboard => dashboard(&ctx).await,
        Commands::Projects { command } => projects(&ctx, command).await,
        Commands::Skills { command } => skills(&ctx, command).await,
        Commands::Profile { command } => profile(&ctx, command).await,
        Commands::Config { .. } => Ok(()),
    }
}

fn write_default_config(output: Option<&PathBuf>) -> anyhow::Result<()> {
    let content = config::generate_default_config();
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &content)?;
            println!("Config written to {:?}", path);
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn read_secret(prompt: &str) -> anyhow::Result<String> {
    eprint!("{}: ", prompt);
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_notices(board: &NoticeBoard) {
    for notice in board.current() {
        match notice.kind {
            NoticeKind::Success => println!("{}", notice.message),
            NoticeKind::Error => eprintln!("{}", notice.message),
        }
    }
}

/// Turn a page error into a CLI error, pointing at the login command when
/// the session is missing or rejected
fn page_error(err: PageError) -> anyhow::Error {
    if let PageError::Validation(errors) = &err {
        for (field, message) in errors.iter() {
            eprintln!("  {}: {}", field, message);
        }
    }
    match err.redirect() {
        Some(Route::Login) => anyhow!("{} (run `capstone login <email>`)", err.user_message()),
        _ => anyhow::Error::new(err),
    }
}

// ============================================
// Auth
// ============================================

async fn login(ctx: &App, email: &str, password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => read_secret("Password")?,
    };

    let mut page = LoginPage::new(&ctx.session);
    match page.submit(&ctx.client, &ctx.session, email, &password).await {
        Ok(route) => {
            println!("Logged in as {}", email);
            println!("Next: {}", route);
            Ok(())
        }
        Err(errors) => bail!("{}", errors),
    }
}

async fn register(
    ctx: &App,
    name: String,
    email: String,
    career: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => read_secret("Password")?,
    };

    let mut page = RegisterPage::load(&ctx.client, &ctx.config.ui).await;
    let career_id = page
        .careers
        .iter()
        .find(|c| c.id == career || c.name.eq_ignore_ascii_case(career))
        .map(|c| c.id.clone())
        .unwrap_or_else(|| career.to_string());

    let form = RegistrationForm {
        name,
        email,
        password,
        career_id,
    };
    let result = page.submit(&ctx.client, &form).await;
    print_notices(&page.notices);
    let route = result.map_err(page_error)?;
    println!("Next: {}", route);
    Ok(())
}

async fn logout(ctx: &App) -> anyhow::Result<()> {
    let mut notices = NoticeBoard::new(&ctx.config.ui);
    let result = auth::logout(&ctx.session, &mut notices, &ctx.config.ui).await;
    print_notices(&notices);
    let route = result?;
    println!("Next: {}", route);
    Ok(())
}

fn whoami(ctx: &App) -> anyhow::Result<()> {
    let session = ctx.session.snapshot();
    if !session.is_logged_in {
        println!("Not logged in");
        return Ok(());
    }

    match ctx.format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "isLoggedIn": session.is_logged_in,
                "userId": session.user_id,
                "userRole": session.user_role,
                "user": session.user,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        _ => {
            println!("User id: {}", session.user_id.as_deref().unwrap_or("-"));
            println!("Role:    {}", session.user_role.as_deref().unwrap_or("-"));
            if let Some(user) = &session.user {
                println!("Name:    {}", user.name);
                println!("Email:   {}", user.email);
            }
        }
    }
    Ok(())
}

async fn open(ctx: &App, path: &str) -> anyhow::Result<()> {
    let requested = Route::parse(path);
    let route = router::guard(requested.clone(), &ctx.session.snapshot());
    if route != requested {
        println!("Redirected to {}", route);
    }

    match route {
        Route::Login => {
            println!("Log in with: capstone login <email>");
            Ok(())
        }
        Route::Register => {
            println!("Register with: capstone register <name> <email> --career <career>");
            Ok(())
        }
        Route::Dashboard => dashboard(ctx).await,
        Route::Profile => profile(ctx, ProfileCommand::Show).await,
        Route::Projects => {
            projects(
                ctx,
                ProjectCommand::List {
                    search: None,
                    status: None,
                    mine: false,
                },
            )
            .await
        }
        Route::ProjectDetail(id) => projects(ctx, ProjectCommand::Show { id }).await,
        Route::NotFound(path) => bail!("No page at {}", path),
    }
}

// ============================================
// Output
// ============================================

fn render<T: Serialize + ?Sized>(
    format: OutputFormat,
    headers: &[&str],
    rows: Vec<Vec<String>>,
    raw: &T,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(raw)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(headers)?;
            for row in &rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        OutputFormat::Table => print_table(headers, &rows),
    }
    Ok(())
}

fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("No results");
        return;
    }

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
                .min(40)
        })
        .collect();

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", truncate(cell, *w), width = *w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(headers.to_vec()));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    for row in rows {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

fn date(value: &Option<String>) -> String {
    value
        .as_deref()
        .and_then(|d| d.split('T').next())
        .unwrap_or("-")
        .to_string()
}

// ============================================
// Dashboard
// ============================================

async fn dashboard(ctx: &App) -> anyhow::Result<()> {
    if !ctx.session.is_logged_in() {
        return Err(page_error(PageError::NotLoggedIn));
    }

    let page = DashboardPage::load(&ctx.client, &ctx.session, &ctx.config.ui).await;
    for collection in &page.failed {
        eprintln!("Could not load {}", collection);
    }

    if ctx.format == OutputFormat::Json {
        let value = serde_json::json!({
            "stats": page.stat_cards().iter().map(|c| (c.label, c.value)).collect::<std::collections::BTreeMap<_, _>>(),
            "recentProjects": page.recent_projects(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let cards: Vec<Vec<String>> = page
        .stat_cards()
        .into_iter()
        .map(|c| vec![c.label.to_string(), c.value.to_string()])
        .collect();
    render(ctx.format, &["Stat", "Count"], cards, &())?;

    if ctx.format == OutputFormat::Table {
        println!();
        println!("Recent projects");
        let rows: Vec<Vec<String>> = page
            .recent_projects()
            .iter()
            .map(|p| {
                vec![
                    p.name.clone(),
                    page.career_name(&p.career_id).unwrap_or("-").to_string(),
                    p.status.clone(),
                ]
            })
            .collect();
        print_table(&["Name", "Career", "Status"], &rows);
    }
    Ok(())
}

// ============================================
// Projects & skills
// ============================================

impl ProjectFields {
    /// Overlay the given fields onto a form, resolving names to ids
    fn apply(self, form: &mut ProjectForm, page: &ProjectsPage) -> anyhow::Result<()> {
        let set = |slot: &mut String, value: Option<String>| {
            if let Some(value) = value {
                *slot = value;
            }
        };
        set(&mut form.name, self.name);
        set(&mut form.description, self.description);
        set(&mut form.summary, self.summary);
        set(&mut form.link, self.link);
        set(&mut form.cycle, self.cycle);
        set(&mut form.academic_period, self.period);
        set(&mut form.start_date, self.start);
        set(&mut form.end_date, self.end);
        set(&mut form.status, self.status);
        if !self.objectives.is_empty() {
            form.objectives = self.objectives.join("\n");
        }
        if !self.deliverables.is_empty() {
            form.deliverables = self.deliverables.join("\n");
        }
        if let Some(career) = self.career {
            form.career_id = page
                .careers
                .iter()
                .find(|c| c.id == career || c.name.eq_ignore_ascii_case(&career))
                .map(|c| c.id.clone())
                .ok_or_else(|| anyhow!("Unknown career: {}", career))?;
        }
        for wanted in self.skills {
            let skill = page
                .skills
                .iter()
                .find(|s| s.id == wanted || s.name.eq_ignore_ascii_case(&wanted))
                .ok_or_else(|| anyhow!("Unknown skill: {}", wanted))?;
            if !form.selected_skills.contains(&skill.id) {
                form.selected_skills.push(skill.id.clone());
            }
        }
        Ok(())
    }
}

async fn load_projects(ctx: &App) -> anyhow::Result<ProjectsPage> {
    if !ctx.session.is_logged_in() {
        return Err(page_error(PageError::NotLoggedIn));
    }
    ProjectsPage::load(&ctx.client, &ctx.session, &ctx.config.ui)
        .await
        .map_err(page_error)
}

fn finish<T>(page_notices: &NoticeBoard, result: Result<T, PageError>) -> anyhow::Result<T> {
    print_notices(page_notices);
    result.map_err(page_error)
}

fn show_project(ctx: &App, page: &ProjectsPage, project: &Project) -> anyhow::Result<()> {
    if ctx.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(project)?);
        return Ok(());
    }

    let deliverables = project.deliverables();
    let skills: Vec<&str> = page
        .project_skills(&project.id)
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    let perms = page.permissions(project);

    println!("{}", project.name);
    println!("{}", "=".repeat(project.name.chars().count().max(3)));
    println!("Status:   {}", project.status);
    println!("Career:   {}", page.career_name(&project.career_id).unwrap_or("-"));
    println!("Cycle:    {}  Period: {}", project.cycle, project.academic_period);
    println!("Dates:    {} → {}", date(&project.start_date), date(&project.end_date));
    println!("Skills:   {}", if skills.is_empty() { "-".to_string() } else { skills.join(", ") });
    println!();
    println!("Summary");
    println!("  {}", project.summary);
    println!("Problem statement");
    println!("  {}", project.description);
    println!("Objectives");
    for objective in &project.objectives {
        println!("  - {}", objective);
    }
    println!("Deliverables");
    for note in &deliverables.notes {
        println!("  - {}", note);
    }
    for link in &deliverables.links {
        println!("  link: {}", link);
    }

    let actions: Vec<&str> = [
        (perms.can_approve, "approve"),
        (perms.can_edit, "edit"),
        (perms.can_delete, "delete"),
    ]
    .into_iter()
    .filter_map(|(allowed, name)| allowed.then_some(name))
    .collect();
    if !actions.is_empty() {
        println!();
        println!("Actions: {}", actions.join(", "));
    }
    Ok(())
}

async fn projects(ctx: &App, command: ProjectCommand) -> anyhow::Result<()> {
    let mut page = load_projects(ctx).await?;

    match command {
        ProjectCommand::List {
            search,
            status,
            mine,
        } => {
            page.filter.search = search.unwrap_or_default();
            page.filter.status = status.as_deref().map(StatusFilter::parse).unwrap_or_default();
            page.filter.ownership = if mine {
                OwnershipFilter::Mine
            } else {
                OwnershipFilter::All
            };

            let visible = page.visible_projects();
            let rows = visible
                .iter()
                .map(|p| {
                    let skills: Vec<&str> =
                        page.project_skills(&p.id).iter().map(|s| s.name.as_str()).collect();
                    vec![
                        p.id.clone(),
                        p.name.clone(),
                        p.status.clone(),
                        page.career_name(&p.career_id).unwrap_or("-").to_string(),
                        skills.join(", "),
                        date(&p.end_date),
                    ]
                })
                .collect();
            render(
                ctx.format,
                &["ID", "Name", "Status", "Career", "Skills", "Ends"],
                rows,
                &visible,
            )
        }

        ProjectCommand::Show { id } => {
            let viewer = page.viewer();
            match page.open_detail(&id) {
                Some(project) if viewer.can_see(project) => show_project(ctx, &page, project),
                _ => Err(page_error(PageError::NotFound(format!("Project {}", id)))),
            }
        }

        ProjectCommand::Create { fields } => {
            let mut form = ProjectForm::default();
            fields.apply(&mut form, &page)?;
            let result = page.create_project(&ctx.client, &form).await;
            let created = finish(&page.notices, result)?;
            println!("Created project {} (pending approval)", created.id);
            Ok(())
        }

        ProjectCommand::Edit { id, fields } => {
            let mut form = page
                .edit_form(&id)
                .ok_or_else(|| page_error(PageError::NotFound(format!("Project {}", id))))?;
            fields.apply(&mut form, &page)?;
            let result = page.edit_project(&ctx.client, &id, &form).await;
            finish(&page.notices, result)
        }

        ProjectCommand::Approve { id } => {
            let result = page.approve_project(&ctx.client, &id).await;
            finish(&page.notices, result)
        }

        ProjectCommand::Delete { id } => {
            let result = page.delete_project(&ctx.client, &id).await;
            finish(&page.notices, result)
        }
    }
}

async fn skills(ctx: &App, command: SkillCommand) -> anyhow::Result<()> {
    let mut page = load_projects(ctx).await?;

    match command {
        SkillCommand::List { search } => {
            page.skill_search = search.unwrap_or_default();
            let mine = page.my_skills();
            let community = page.community_skills();
            let rows = mine
                .iter()
                .map(|s| (s, "mine"))
                .chain(community.iter().map(|s| (s, "community")))
                .map(|(s, group)| {
                    vec![
                        s.id.clone(),
                        s.name.clone(),
                        s.description.clone(),
                        group.to_string(),
                    ]
                })
                .collect();
            let all: Vec<_> = mine.iter().chain(community.iter()).collect();
            render(ctx.format, &["ID", "Name", "Description", "Group"], rows, &all)
        }

        SkillCommand::Create { name, description } => {
            let result = page
                .create_skill(&ctx.client, &SkillForm::new(name, description))
                .await;
            finish(&page.notices, result)
        }

        SkillCommand::Edit {
            id,
            name,
            description,
        } => {
            let existing = page
                .skills
                .iter()
                .find(|s| s.id == id)
                .ok_or_else(|| page_error(PageError::NotFound(format!("Skill {}", id))))?;
            let form = SkillForm::new(
                name.unwrap_or_else(|| existing.name.clone()),
                description.unwrap_or_else(|| existing.description.clone()),
            );
            let result = page.update_skill(&ctx.client, &id, &form).await;
            finish(&page.notices, result)
        }

        SkillCommand::Delete { id } => {
            let result = page.delete_skill(&ctx.client, &id).await;
            finish(&page.notices, result)
        }
    }
}

// ============================================
// Profile
// ============================================

async fn profile(ctx: &App, command: ProfileCommand) -> anyhow::Result<()> {
    let mut page = ProfilePage::load(&ctx.client, &ctx.session, &ctx.config.ui)
        .await
        .map_err(page_error)?;

    match command {
        ProfileCommand::Show => {}
        ProfileCommand::Rename { name } => {
            let result = page.rename(&ctx.client, &ctx.session, &name).await;
            if !finish(&page.notices, result)? {
                println!("Name unchanged");
            }
        }
        ProfileCommand::Image { path } => {
            let result = page.upload_image(&ctx.client, &ctx.session, &path).await;
            finish(&page.notices, result)?;
        }
    }

    let view = &page.view;
    if ctx.format == OutputFormat::Json {
        let value = serde_json::json!({
            "user": view.user,
            "career": view.career_name,
            "role": view.role_name,
            "imageUrl": page.image_url(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Name:   {}", view.user.name);
        println!("Email:  {}", view.user.email);
        println!("Career: {}", view.career_name);
        println!("Role:   {}", view.role_name);
        println!("Image:  {}", page.image_url().unwrap_or_else(|| "-".to_string()));
    }
    Ok(())
}
