//! File upload and download-URL commands.

use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;
use uuid::Uuid;

use clientvault_core::error::{AppError, ErrorKind};
use clientvault_core::types::id::{FileId, FolderId};
use clientvault_service::workspace::FileUpload;

use super::Engine;
use crate::output::{self, OutputFormat};

/// Arguments for `upload`
#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Destination folder ID
    pub folder_id: Uuid,
    /// Local file to upload
    pub path: PathBuf,
    /// Display name (defaults to the local file name)
    #[arg(short, long)]
    pub name: Option<String>,
    /// MIME type (guessed from the name when omitted)
    #[arg(long)]
    pub content_type: Option<String>,
}

/// Arguments for `url`
#[derive(Debug, Args)]
pub struct UrlArgs {
    /// File ID
    pub file_id: Uuid,
    /// Ask the browser to display the file instead of saving it
    #[arg(long)]
    pub preview: bool,
}

/// Upload a local file.
pub async fn upload(args: &UploadArgs, engine: &Engine, format: OutputFormat) -> Result<(), AppError> {
    let name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::validation("Cannot derive a name from the path"))?,
    };
    let data = tokio::fs::read(&args.path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Validation,
            format!("Failed to read {}", args.path.display()),
            e,
        )
    })?;

    let upload = FileUpload {
        original_name: name,
        content_type: args.content_type.clone(),
        data: Bytes::from(data),
    };
    let file = engine
        .facade
        .upload_file(&engine.ctx, FolderId::from_uuid(args.folder_id), upload)
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&file),
        OutputFormat::Table => {
            output::print_success(&format!("Uploaded '{}'", file.name));
            output::print_kv("File ID", &file.id.to_string());
            output::print_kv("Type", &file.mime_type);
            output::print_kv("Size", &output::human_size(file.size));
        }
    }
    Ok(())
}

/// Print a signed download URL.
pub async fn url(args: &UrlArgs, engine: &Engine, format: OutputFormat) -> Result<(), AppError> {
    let link = engine
        .facade
        .get_file_download_url(&engine.ctx, FileId::from_uuid(args.file_id), args.preview)
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&link),
        OutputFormat::Table => {
            println!("{}", link.url);
            output::print_kv("File", &link.file_name);
            output::print_kv("Expires in", &format!("{}s", link.expires_in));
        }
    }
    Ok(())
}
