//! CLI command definitions and dispatch.

pub mod client;
pub mod file;
pub mod folder;
pub mod migrate;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use clientvault_core::config::AppConfig;
use clientvault_core::error::AppError;
use clientvault_core::types::id::UserId;
use clientvault_database::DatabasePool;
use clientvault_entity::user::Principal;
use clientvault_service::{
    LogAuditSink, RequestContext, WorkspaceFacade, WorkspaceService, WorkspaceSettings,
};

use crate::output::OutputFormat;

/// ClientVault workspace administration
#[derive(Debug, Parser)]
#[command(name = "clientvault", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: String,

    /// Environment overlay (loads `config/{env}.toml`)
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Staff user recorded as the actor of changes
    #[arg(long, global = true)]
    pub actor: Option<Uuid>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Seed the folder skeleton for a client
    Provision(client::ProvisionArgs),
    /// Check a client's tree for broken invariants
    Verify(client::VerifyArgs),
    /// Recompute a client's folder aggregates
    Repair(client::RepairArgs),
    /// Print a client's full tree
    Tree(folder::TreeArgs),
    /// List a folder
    Ls(folder::LsArgs),
    /// Create a folder
    Mkdir(folder::MkdirArgs),
    /// Create a year folder
    AddYear(folder::AddYearArgs),
    /// Rename a folder or file
    Rename(folder::RenameArgs),
    /// Move a folder or file
    Mv(folder::MoveArgs),
    /// Delete a folder or file
    Rm(folder::RemoveArgs),
    /// Upload a local file
    Upload(file::UploadArgs),
    /// Issue a download URL
    Url(file::UrlArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        if let Commands::Migrate(args) = &self.command {
            return migrate::execute(args, config).await;
        }

        let engine = Engine::connect(config, self.actor).await?;
        let result = match &self.command {
            Commands::Migrate(_) => Ok(()),
            Commands::Provision(args) => client::provision(args, &engine, self.format).await,
            Commands::Verify(args) => client::verify(args, &engine, self.format).await,
            Commands::Repair(args) => client::repair(args, &engine).await,
            Commands::Tree(args) => folder::tree(args, &engine, self.format).await,
            Commands::Ls(args) => folder::ls(args, &engine, self.format).await,
            Commands::Mkdir(args) => folder::mkdir(args, &engine).await,
            Commands::AddYear(args) => folder::add_year(args, &engine).await,
            Commands::Rename(args) => folder::rename(args, &engine).await,
            Commands::Mv(args) => folder::mv(args, &engine).await,
            Commands::Rm(args) => folder::rm(args, &engine).await,
            Commands::Upload(args) => file::upload(args, &engine, self.format).await,
            Commands::Url(args) => file::url(args, &engine, self.format).await,
        };
        engine.db.close().await;
        result
    }
}

/// The workspace engine wired to the configured database and store.
pub struct Engine {
    /// Connection pool, closed when the command finishes.
    pub db: DatabasePool,
    /// The engine.
    pub service: Arc<WorkspaceService>,
    /// DTO facade over the same engine.
    pub facade: WorkspaceFacade,
    /// Acting staff principal.
    pub ctx: RequestContext,
}

impl Engine {
    /// Connect to the database and object store from `config`.
    pub async fn connect(config: &AppConfig, actor: Option<Uuid>) -> Result<Self, AppError> {
        let db = DatabasePool::connect(&config.database).await?;
        let store = clientvault_storage::build_object_store(&config.storage).await?;
        let service = Arc::new(WorkspaceService::new(
            Arc::new(db.tree_repository()),
            store,
            Arc::new(LogAuditSink),
            WorkspaceSettings::from_config(config),
        ));
        let actor = UserId::from_uuid(actor.unwrap_or(Uuid::nil()));

        Ok(Self {
            db,
            facade: WorkspaceFacade::new(service.clone()),
            service,
            ctx: RequestContext::new(Principal::admin(actor)),
        })
    }
}
