//! CLI commands

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use unidash_core::models::{
    ChangePasswordRequest, DashboardQuery, ProfileUpdate, RecordFilter, RecordOrdering, RecordQuery,
    RecordType, UploadDataType, UploadRecord,
};
use unidash_core::format::format_date;
use unidash_core::{
    ActivityKind, IdentityProvider, InactivityMonitor, Navigator, SessionContext, SessionPhase,
    UnidashConfig, validation,
};
use unidash_http::{ApiClientBuilder, AuthenticatedGateway, SupabaseIdentity, UploadFile};

use crate::session_store::SessionStore;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and save the session
    Login {
        email: String,
        #[arg(long, env = "UNIDASH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account
    Signup {
        email: String,
        #[arg(long, env = "UNIDASH_PASSWORD", hide_env_values = true)]
        password: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Sign out and forget the saved session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Browse uploaded records
    Records {
        #[command(subcommand)]
        command: RecordCommands,
    },

    /// Show the dashboard summary
    Dashboard {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        department: Option<String>,
    },

    /// Download matching records as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output file (defaults to the server-suggested name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload an Excel spreadsheet
    Upload {
        file: PathBuf,
        /// One of department_kpi, publication, research_project, student_roster
        #[arg(long)]
        data_type: UploadDataType,
    },

    /// List past uploads
    Uploads {
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
        /// Print the raw response instead of one line per upload
        #[arg(long)]
        json: bool,
    },

    /// View or edit the account profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Change the account password
    Password {
        #[arg(long = "new", env = "UNIDASH_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
        #[arg(long = "confirm")]
        confirmation: String,
        /// Current password; when given the change goes through the data API
        #[arg(long = "current")]
        current_password: Option<String>,
    },

    /// Check that the data API is reachable
    Health,

    /// Keep the session open while input arrives on stdin
    ///
    /// Every line read counts as activity. The session is signed out after
    /// the configured inactivity timeout.
    Watch,
}

#[derive(Subcommand)]
pub enum RecordCommands {
    /// List records
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// -date, date, -amount or amount
        #[arg(long, allow_hyphen_values = true)]
        ordering: Option<RecordOrdering>,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Show one record
    Get {
        #[arg(long = "type")]
        record_type: RecordType,
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the profile
    Show,

    /// Change profile fields
    Update {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        profile_picture_url: Option<String>,
    },
}

#[derive(Args)]
pub struct FilterArgs {
    /// performance, paper, student or budget
    #[arg(long = "type")]
    record_type: Option<RecordType>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    fn into_filter(self, ordering: Option<RecordOrdering>) -> RecordFilter {
        RecordFilter {
            record_type: self.record_type,
            year: self.year,
            search: self.search,
            ordering,
        }
    }
}

/// Tells the terminal user where to sign in again
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, location: &str) {
        eprintln!("Session expired. Sign in again: {location}");
    }
}

/// Identity provider and gateway sharing the saved session
struct Client {
    config: UnidashConfig,
    store: SessionStore,
    identity: Arc<SupabaseIdentity>,
    session: Arc<SessionContext<SupabaseIdentity>>,
    gateway: AuthenticatedGateway<SupabaseIdentity>,
}

impl Client {
    async fn open(config: UnidashConfig, data_dir: &Path) -> Result<Self> {
        let identity = Arc::new(
            SupabaseIdentity::from_config(&config.identity)
                .context("failed to create identity client")?,
        );
        let store = SessionStore::new(data_dir);
        if let Some(saved) = store.load() {
            let expired = saved.is_expired_at(chrono::Utc::now().timestamp());
            identity.restore(saved);
            if expired {
                // Saves the first request a 401 round trip
                debug!("saved access token expired, refreshing");
                match identity.refresh_session().await {
                    Ok(Some(_)) => {}
                    Ok(None) => info!("saved session could not be refreshed"),
                    Err(err) => warn!(error = %err, "could not refresh saved session"),
                }
            }
        }

        let gateway = ApiClientBuilder::from_config(&config)
            .navigator(Arc::new(TerminalNavigator))
            .build_gateway(identity.clone())
            .context("failed to create API client")?;

        Ok(Self {
            config,
            store,
            session: Arc::new(SessionContext::new(identity.clone())),
            identity,
            gateway,
        })
    }

    fn require_session(&self) -> Result<()> {
        if self.identity.session().is_none() {
            bail!("not signed in, run `unidash login` first");
        }
        Ok(())
    }

    /// Write back whatever the provider now holds (refreshed or signed out)
    fn save(&self) -> Result<()> {
        self.store.sync(self.identity.session().as_ref())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl Commands {
    /// Commands that must not be cut short by the global timeout
    pub const fn is_long_running(&self) -> bool {
        matches!(self, Self::Watch)
    }

    pub async fn execute(self, config: UnidashConfig, data_dir: PathBuf) -> Result<()> {
        let client = Client::open(config, &data_dir).await?;
        let outcome = self.run(&client).await;
        client.save()?;
        outcome
    }

    async fn run(self, client: &Client) -> Result<()> {
        match self {
            Self::Login { email, password } => {
                let user = client.session.login(email.trim(), &password).await?;
                println!("Signed in as {} ({:?})", user.email, user.role);
                Ok(())
            }
            Self::Signup {
                email,
                password,
                name,
            } => {
                let user = client
                    .session
                    .signup(email.trim(), &password, name.as_deref())
                    .await?;
                match user {
                    Some(user) => println!("Account created, signed in as {}", user.email),
                    None => println!("Account created, check {email} to confirm it"),
                }
                Ok(())
            }
            Self::Logout => {
                client.session.logout().await?;
                println!("Signed out");
                Ok(())
            }
            Self::Whoami => {
                client.require_session()?;
                match client.session.load().await? {
                    Some(user) => print_json(&user),
                    None => bail!("session expired, run `unidash login` again"),
                }
            }
            Self::Records { command } => {
                client.require_session()?;
                command.run(client).await
            }
            Self::Dashboard { year, department } => {
                client.require_session()?;
                let query = DashboardQuery { year, department };
                print_json(&client.gateway.dashboard_summary(&query).await?)
            }
            Self::Export { filter, output } => {
                client.require_session()?;
                let export = client.gateway.export_csv(&filter.into_filter(None)).await?;
                let path = output.unwrap_or_else(|| PathBuf::from(&export.filename));
                tokio::fs::write(&path, &export.bytes)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Saved {} bytes to {}", export.bytes.len(), path.display());
                Ok(())
            }
            Self::Upload { file, data_type } => {
                client.require_session()?;
                upload(client, &file, data_type).await
            }
            Self::Uploads {
                page,
                page_size,
                json,
            } => {
                client.require_session()?;
                let page_size = page_size.unwrap_or(client.config.api.page_size);
                let history = client.gateway.upload_history(page, page_size).await?;
                if json {
                    return print_json(&history);
                }
                for upload in &history.results {
                    println!("{}", upload_line(upload));
                }
                eprintln!(
                    "page {page} of {} ({} uploads)",
                    history.total_pages(page_size),
                    history.count
                );
                Ok(())
            }
            Self::Profile { command } => {
                client.require_session()?;
                command.run(client).await
            }
            Self::Password {
                new_password,
                confirmation,
                current_password,
            } => {
                client.require_session()?;
                validation::validate_password_change(&new_password, &confirmation)?;
                match current_password {
                    Some(current_password) => {
                        let change = ChangePasswordRequest {
                            current_password,
                            new_password,
                        };
                        client.gateway.change_password(&change).await?;
                    }
                    None => client.identity.update_password(&new_password).await?,
                }
                println!("Password changed");
                Ok(())
            }
            Self::Health => health(&client.config).await,
            Self::Watch => watch(client).await,
        }
    }
}

impl RecordCommands {
    async fn run(self, client: &Client) -> Result<()> {
        match self {
            Self::List {
                filter,
                ordering,
                page,
                page_size,
            } => {
                let query = RecordQuery {
                    filter: filter.into_filter(ordering),
                    page,
                    page_size: page_size.unwrap_or(client.config.api.page_size),
                };
                let listing = client.gateway.list_records(&query).await?;
                print_json(&listing)?;
                eprintln!(
                    "page {page} of {} ({} records)",
                    listing.total_pages(query.page_size),
                    listing.count
                );
                Ok(())
            }
            Self::Get { record_type, id } => {
                print_json(&client.gateway.get_record(record_type, id).await?)
            }
        }
    }
}

impl ProfileCommands {
    async fn run(self, client: &Client) -> Result<()> {
        match self {
            Self::Show => print_json(&client.gateway.profile().await?),
            Self::Update {
                full_name,
                department,
                profile_picture_url,
            } => {
                let update = ProfileUpdate {
                    full_name,
                    department,
                    profile_picture_url,
                };
                if update.is_empty() {
                    bail!("nothing to update");
                }
                print_json(&client.gateway.update_profile(&update).await?)
            }
        }
    }
}

async fn health(config: &UnidashConfig) -> Result<()> {
    let client = ApiClientBuilder::from_config(config).build_public()?;
    let status = client.health().await?;
    print_json(&status)
}

/// One upload history row for the terminal
fn upload_line(upload: &UploadRecord) -> String {
    let mut line = format!(
        "#{}  {}  {}  {:?}  {} rows  {} by {}",
        upload.id,
        upload.file_name,
        upload.data_type,
        upload.status,
        upload.rows_processed,
        format_date(&upload.uploaded_at),
        upload.uploaded_by,
    );
    if let Some(error) = &upload.error_message {
        line.push_str("  ");
        line.push_str(error);
    }
    line
}

async fn upload(client: &Client, file: &Path, data_type: UploadDataType) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let result = client
        .gateway
        .upload_spreadsheet(UploadFile::new(file_name, bytes), data_type)
        .await?;
    print_json(&result)?;
    if !result.is_success() {
        bail!(
            "upload {:?}: {}",
            result.status,
            result.error_message.as_deref().unwrap_or("no details")
        );
    }
    Ok(())
}

async fn watch(client: &Client) -> Result<()> {
    client.require_session()?;

    let session = client.session.clone();
    let monitor = InactivityMonitor::start_with(&client.config.session, move || async move {
        session.logout().await
    })?;
    let mut status = monitor.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "Watching for inactivity ({} min). Press Enter to stay signed in.",
        client.config.session.inactivity_timeout().as_secs() / 60
    );

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(_) => {
                    monitor.record_activity(ActivityKind::KeyDown);
                }
                None => {
                    info!("stdin closed, leaving the session signed in");
                    break;
                }
            },
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                if current.warning_visible {
                    println!("비활성 상태로 인해 곧 로그아웃됩니다. 계속 사용하시겠습니까? (Enter)");
                }
                if current.phase == SessionPhase::Expired {
                    warn!("signed out after inactivity");
                    break;
                }
            }
        }
    }

    // Lets a running expiry sign-out finish before the session is saved
    monitor.stop().await;
    if client.identity.session().is_none() {
        println!("Signed out after inactivity");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use unidash_core::models::UploadStatus;

    fn record(status: UploadStatus, error_message: Option<&str>) -> UploadRecord {
        UploadRecord {
            id: 7,
            file_name: "kpi-2024.xlsx".to_string(),
            data_type: UploadDataType::DepartmentKpi,
            rows_processed: 120,
            status,
            error_message: error_message.map(str::to_string),
            uploaded_by: "admin@univ.ac.kr".to_string(),
            uploaded_at: "2024-11-01T09:30:00Z".to_string(),
        }
    }

    #[test]
    fn test_upload_line_shows_korean_date() {
        assert_eq!(
            upload_line(&record(UploadStatus::Success, None)),
            "#7  kpi-2024.xlsx  department_kpi  Success  120 rows  2024년 11월 1일 by admin@univ.ac.kr"
        );
    }

    #[test]
    fn test_upload_line_appends_error() {
        let line = upload_line(&record(UploadStatus::Failed, Some("missing column: year")));
        assert!(line.contains("Failed"));
        assert!(line.ends_with("  missing column: year"));
    }
}
