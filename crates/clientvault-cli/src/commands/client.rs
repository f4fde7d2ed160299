//! Client-level commands: provisioning, verification, repair.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use clientvault_core::error::AppError;
use clientvault_core::types::id::ClientId;

use super::Engine;
use crate::output::{self, OutputFormat};

/// Arguments for `provision`
#[derive(Debug, Args)]
pub struct ProvisionArgs {
    /// Client ID
    pub client_id: Uuid,
    /// Display name of the client's root folder
    #[arg(short, long)]
    pub name: String,
}

/// Arguments for `verify`
#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Client ID
    pub client_id: Uuid,
    /// Also check that every file's object exists in storage
    #[arg(long)]
    pub objects: bool,
}

/// Arguments for `repair`
#[derive(Debug, Args)]
pub struct RepairArgs {
    /// Client ID
    pub client_id: Uuid,
}

#[derive(Debug, Serialize, Tabled)]
struct ViolationRow {
    problem: String,
}

/// Seed the structural folders of a client.
pub async fn provision(
    args: &ProvisionArgs,
    engine: &Engine,
    format: OutputFormat,
) -> Result<(), AppError> {
    let root = engine
        .service
        .provision_client(&engine.ctx, ClientId::from_uuid(args.client_id), &args.name)
        .await?;

    match format {
        OutputFormat::Json => output::print_json(&root),
        OutputFormat::Table => {
            output::print_success(&format!("Client {} provisioned", args.client_id));
            output::print_kv("Root folder", &root.id.to_string());
            output::print_kv("Prefix", &root.s3_prefix);
        }
    }
    Ok(())
}

/// Report every broken invariant of a client's tree.
pub async fn verify(args: &VerifyArgs, engine: &Engine, format: OutputFormat) -> Result<(), AppError> {
    let report = engine
        .service
        .verify_client_tree(&engine.ctx, ClientId::from_uuid(args.client_id), args.objects)
        .await?;

    if format == OutputFormat::Json {
        output::print_json(&report);
        return Ok(());
    }

    output::print_kv("Folders", &report.folders.to_string());
    output::print_kv("Files", &report.files.to_string());
    if report.is_consistent() {
        output::print_success("Tree is consistent.");
    } else {
        let rows: Vec<ViolationRow> = report
            .violations
            .iter()
            .map(|v| ViolationRow {
                problem: v.to_string(),
            })
            .collect();
        output::print_list(&rows, format);
        output::print_warning(&format!(
            "{} problem(s) found; `repair` fixes aggregate mismatches",
            rows.len()
        ));
    }
    Ok(())
}

/// Rewrite aggregates from live records.
pub async fn repair(args: &RepairArgs, engine: &Engine) -> Result<(), AppError> {
    let corrected = engine
        .service
        .recompute_aggregates(&engine.ctx, ClientId::from_uuid(args.client_id))
        .await?;

    if corrected == 0 {
        output::print_success("Aggregates already correct.");
    } else {
        output::print_success(&format!("Corrected aggregates of {corrected} folder(s)."));
    }
    Ok(())
}
