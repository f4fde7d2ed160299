//! Provisioning, verification, and repair of client trees. Admin only.

use tracing::{info, warn};

use clientvault_core::error::AppError;
use clientvault_core::events::WorkspaceEvent;
use clientvault_core::result::AppResult;
use clientvault_core::types::id::{ClientId, FolderId};
use clientvault_entity::folder::{Folder, FolderType, NewFolder};

use super::WorkspaceService;
use super::consistency::{TreeReport, Violation, check_tree, expected_aggregates};
use super::path;
use crate::context::RequestContext;

impl WorkspaceService {
    /// Seed the structural skeleton `root > documents > years` for a client.
    ///
    /// Folders left out by an earlier interrupted run are filled in; a
    /// client whose skeleton is already complete gets a `Conflict`.
    pub async fn provision_client(
        &self,
        ctx: &RequestContext,
        client_id: ClientId,
        display_name: &str,
    ) -> AppResult<Folder> {
        self.gate.require_admin(&ctx.principal)?;
        let display_name = path::display_name(display_name)?;
        let _guard = self.lock(client_id).await?;

        let mut created = 0;
        let root = match self.repo.find_root(client_id).await? {
            Some(root) => root,
            None => {
                created += 1;
                let record = NewFolder {
                    id: FolderId::new(),
                    client_id,
                    parent_id: None,
                    name: display_name,
                    slug: client_id.to_string(),
                    folder_type: FolderType::Root,
                    s3_prefix: path::root_prefix(&self.settings.key_root, client_id),
                };
                self.repo.insert_folder(&record, &[]).await?
            }
        };

        let documents = match self.structural_child(&root, FolderType::Documents).await? {
            Some(documents) => documents,
            None => {
                created += 1;
                self.insert_structural(
                    &root,
                    FolderType::Documents,
                    "Documents",
                    "documents",
                    &[root.id],
                )
                .await?
            }
        };

        if self
            .structural_child(&documents, FolderType::Years)
            .await?
            .is_none()
        {
            created += 1;
            self.insert_structural(
                &documents,
                FolderType::Years,
                "Years",
                "years",
                &[root.id, documents.id],
            )
            .await?;
        }

        if created == 0 {
            return Err(AppError::conflict(format!(
                "Client {client_id} is already provisioned"
            )));
        }

        let root = self.load_folder(root.id).await?;
        info!(
            user_id = %ctx.user_id(),
            client_id = %client_id,
            root_id = %root.id,
            prefix = %root.s3_prefix,
            created,
            "Client workspace provisioned"
        );
        self.emit(ctx, client_id, WorkspaceEvent::Provisioned { root_id: root.id });
        Ok(root)
    }

    /// Check every invariant of a client's tree without changing anything.
    ///
    /// With `check_objects`, every file key is also looked up in storage.
    pub async fn verify_client_tree(
        &self,
        ctx: &RequestContext,
        client_id: ClientId,
        check_objects: bool,
    ) -> AppResult<TreeReport> {
        self.gate.require_admin(&ctx.principal)?;
        let root = self
            .repo
            .find_root(client_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Client {client_id} has no workspace")))?;

        let subtree = self.repo.load_subtree(root.id).await?;
        let root_prefix = path::root_prefix(&self.settings.key_root, client_id);
        let mut violations = check_tree(&subtree, client_id, &root_prefix);

        if check_objects {
            for file in &subtree.files {
                if !self.store.exists(&file.s3_path).await? {
                    violations.push(Violation::MissingObject {
                        file_id: file.id,
                        key: file.s3_path.clone(),
                    });
                }
            }
        }

        if !violations.is_empty() {
            warn!(
                client_id = %client_id,
                violations = violations.len(),
                "Workspace tree is inconsistent"
            );
        }
        Ok(TreeReport {
            client_id,
            folders: subtree.folders.len(),
            files: subtree.files.len(),
            violations,
        })
    }

    /// Rewrite stored aggregates from the live records. Returns how many
    /// folders were corrected.
    pub async fn recompute_aggregates(
        &self,
        ctx: &RequestContext,
        client_id: ClientId,
    ) -> AppResult<u64> {
        self.gate.require_admin(&ctx.principal)?;
        let _guard = self.lock(client_id).await?;
        let root = self
            .repo
            .find_root(client_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Client {client_id} has no workspace")))?;

        let subtree = self.repo.load_subtree(root.id).await?;
        let totals = expected_aggregates(&subtree);
        let corrections: Vec<_> = subtree
            .folders
            .iter()
            .filter_map(|folder| {
                let expected = totals.get(&folder.id).copied().unwrap_or_default();
                (expected != folder.aggregates()).then_some((folder.id, expected))
            })
            .collect();

        if corrections.is_empty() {
            return Ok(0);
        }
        let corrected = self.repo.store_aggregates(&corrections).await?;

        warn!(
            user_id = %ctx.user_id(),
            client_id = %client_id,
            corrected,
            "Workspace aggregates repaired"
        );
        self.emit(
            ctx,
            client_id,
            WorkspaceEvent::AggregatesRecomputed { corrected },
        );
        Ok(corrected)
    }

    async fn structural_child(
        &self,
        parent: &Folder,
        folder_type: FolderType,
    ) -> AppResult<Option<Folder>> {
        Ok(self
            .repo
            .list_child_folders(parent.id)
            .await?
            .into_iter()
            .find(|f| f.folder_type == folder_type))
    }

    async fn insert_structural(
        &self,
        parent: &Folder,
        folder_type: FolderType,
        name: &str,
        slug: &str,
        ancestors: &[FolderId],
    ) -> AppResult<Folder> {
        let record = NewFolder {
            id: FolderId::new(),
            client_id: parent.client_id,
            parent_id: Some(parent.id),
            name: name.to_string(),
            slug: slug.to_string(),
            folder_type,
            s3_prefix: path::child_prefix(&parent.s3_prefix, slug),
        };
        self.repo.insert_folder(&record, ancestors).await
    }
}
