//! Tree browsing and folder/file manipulation commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use clientvault_core::error::AppError;
use clientvault_core::types::id::{ClientId, FileId, FolderId};
use clientvault_service::facade::{FolderContentsDto, WorkspaceTreeDto};

use super::Engine;
use crate::output::{self, OutputFormat};

/// Arguments for `tree`
#[derive(Debug, Args)]
pub struct TreeArgs {
    /// Client ID
    pub client_id: Uuid,
    /// Hide files, show folders only
    #[arg(long)]
    pub folders_only: bool,
}

/// Arguments for `ls`
#[derive(Debug, Args)]
pub struct LsArgs {
    /// Folder ID
    pub folder_id: Uuid,
}

/// Arguments for `mkdir`
#[derive(Debug, Args)]
pub struct MkdirArgs {
    /// Parent folder ID
    pub parent_id: Uuid,
    /// Folder name
    pub name: String,
}

/// Arguments for `add-year`
#[derive(Debug, Args)]
pub struct AddYearArgs {
    /// Client ID
    pub client_id: Uuid,
    /// Four-digit year
    pub year: String,
}

/// Arguments for `rename`
#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Folder ID, or file ID with `--file`
    pub id: Uuid,
    /// New display name
    pub name: String,
    /// Treat the ID as a file
    #[arg(long)]
    pub file: bool,
}

/// Arguments for `mv`
#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Folder ID, or file ID with `--file`
    pub id: Uuid,
    /// Destination folder ID
    pub target_id: Uuid,
    /// Treat the ID as a file
    #[arg(long)]
    pub file: bool,
}

/// Arguments for `rm`
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Folder ID, or file ID with `--file`
    pub id: Uuid,
    /// Treat the ID as a file
    #[arg(long)]
    pub file: bool,
    /// Skip confirmation prompt
    #[arg(long)]
    pub force: bool,
}

/// Listing row
#[derive(Debug, Serialize, Tabled)]
struct EntryRow {
    /// Folder or file
    kind: &'static str,
    /// Entry ID
    id: String,
    /// Display name
    name: String,
    /// Files in subtree
    files: i64,
    /// Size
    size: String,
}

/// Print a client's whole tree.
pub async fn tree(args: &TreeArgs, engine: &Engine, format: OutputFormat) -> Result<(), AppError> {
    let tree = engine
        .facade
        .get_client_workspace(&engine.ctx, ClientId::from_uuid(args.client_id))
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&tree),
        OutputFormat::Table => print_node(&tree, 0, args.folders_only),
    }
    Ok(())
}

fn print_node(node: &WorkspaceTreeDto, depth: usize, folders_only: bool) {
    let indent = "  ".repeat(depth);
    println!(
        "{indent}{}/  [{}] {} file(s), {}  {}",
        node.folder.name,
        node.folder.folder_type,
        node.folder.file_count,
        output::human_size(node.folder.total_size),
        node.folder.id
    );
    for child in &node.children {
        print_node(child, depth + 1, folders_only);
    }
    if !folders_only {
        for file in &node.files {
            println!(
                "{indent}  {}  ({})  {}",
                file.name,
                output::human_size(file.size),
                file.id
            );
        }
    }
}

/// List one folder.
pub async fn ls(args: &LsArgs, engine: &Engine, format: OutputFormat) -> Result<(), AppError> {
    let contents = engine
        .facade
        .get_folder_contents(&engine.ctx, FolderId::from_uuid(args.folder_id))
        .await?;

    if format == OutputFormat::Json {
        output::print_json(&contents);
        return Ok(());
    }

    let trail: Vec<&str> = contents.breadcrumbs.iter().map(|b| b.name.as_str()).collect();
    println!("{}", trail.join(" / "));
    output::print_list(&rows(&contents), format);
    Ok(())
}

fn rows(contents: &FolderContentsDto) -> Vec<EntryRow> {
    let folders = contents.folders.iter().map(|f| EntryRow {
        kind: "folder",
        id: f.id.to_string(),
        name: format!("{}/", f.name),
        files: f.file_count,
        size: output::human_size(f.total_size),
    });
    let files = contents.files.iter().map(|f| EntryRow {
        kind: "file",
        id: f.id.to_string(),
        name: f.name.clone(),
        files: 1,
        size: output::human_size(f.size),
    });
    folders.chain(files).collect()
}

/// Create a generic folder.
pub async fn mkdir(args: &MkdirArgs, engine: &Engine) -> Result<(), AppError> {
    let folder = engine
        .facade
        .create_folder(&engine.ctx, FolderId::from_uuid(args.parent_id), &args.name)
        .await?;
    output::print_success(&format!("Folder '{}' created (id: {})", folder.name, folder.id));
    Ok(())
}

/// Create a year folder.
pub async fn add_year(args: &AddYearArgs, engine: &Engine) -> Result<(), AppError> {
    let folder = engine
        .facade
        .add_year_folder(&engine.ctx, ClientId::from_uuid(args.client_id), &args.year)
        .await?;
    output::print_success(&format!("Year {} created (id: {})", folder.name, folder.id));
    Ok(())
}

/// Rename a folder or file.
pub async fn rename(args: &RenameArgs, engine: &Engine) -> Result<(), AppError> {
    if args.file {
        let file = engine
            .facade
            .rename_file(&engine.ctx, FileId::from_uuid(args.id), &args.name)
            .await?;
        output::print_success(&format!("File renamed to '{}'", file.name));
    } else {
        let folder = engine
            .facade
            .rename_folder(&engine.ctx, FolderId::from_uuid(args.id), &args.name)
            .await?;
        output::print_success(&format!("Folder renamed to '{}'", folder.name));
    }
    Ok(())
}

/// Move a folder or file.
pub async fn mv(args: &MoveArgs, engine: &Engine) -> Result<(), AppError> {
    let target = FolderId::from_uuid(args.target_id);
    if args.file {
        let file = engine
            .facade
            .move_file(&engine.ctx, FileId::from_uuid(args.id), target)
            .await?;
        output::print_success(&format!("File '{}' moved", file.name));
    } else {
        let folder = engine
            .facade
            .move_folder(&engine.ctx, FolderId::from_uuid(args.id), target)
            .await?;
        output::print_success(&format!(
            "Folder '{}' moved ({} file(s))",
            folder.name, folder.file_count
        ));
    }
    Ok(())
}

/// Delete a folder or file after confirmation.
pub async fn rm(args: &RemoveArgs, engine: &Engine) -> Result<(), AppError> {
    if !args.force {
        let what = if args.file {
            "this file"
        } else {
            "this folder and everything in it"
        };
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!("Permanently delete {what}?"))
            .default(false)
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?;
        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let removed = if args.file {
        engine
            .facade
            .delete_file(&engine.ctx, FileId::from_uuid(args.id))
            .await?
    } else {
        engine
            .facade
            .delete_folder(&engine.ctx, FolderId::from_uuid(args.id))
            .await?
    };
    output::print_success(&format!(
        "Deleted {} folder(s), {} file(s), {}",
        removed.folders,
        removed.files,
        output::human_size(removed.bytes)
    ));
    Ok(())
}
