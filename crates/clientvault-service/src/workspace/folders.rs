//! Folder operations: browse, create, add year, rename, move, delete.

use std::collections::HashMap;

use tracing::{info, warn};

use clientvault_auth::WorkspaceAction;
use clientvault_core::error::AppError;
use clientvault_core::events::WorkspaceEvent;
use clientvault_core::result::AppResult;
use clientvault_core::types::id::{ClientId, FolderId};
use clientvault_database::repositories::{AggregateTransfer, Relocation, Subtree};
use clientvault_entity::file::File;
use clientvault_entity::folder::{Aggregates, Breadcrumb, Folder, FolderNode, FolderType, NewFolder};

use super::WorkspaceService;
use super::migration::MigrationPlan;
use super::path;
use super::views::FolderContents;
use crate::context::RequestContext;

impl WorkspaceService {
    /// Returns the client's whole tree, folders and files, from the root.
    pub async fn get_client_workspace(
        &self,
        ctx: &RequestContext,
        client_id: ClientId,
    ) -> AppResult<FolderNode> {
        let root = self.client_root(client_id).await?;
        self.gate
            .require(&ctx.principal, &root, WorkspaceAction::View)?;

        let subtree = self.repo.load_subtree(root.id).await?;
        assemble_tree(subtree)
    }

    /// Returns a folder, its direct children, and its breadcrumb trail.
    pub async fn get_folder_contents(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<FolderContents> {
        let folder = self
            .authorized_folder(ctx, folder_id, WorkspaceAction::View)
            .await?;

        let folders = self.repo.list_child_folders(folder.id).await?;
        let files = self.repo.list_files(folder.id).await?;
        let breadcrumbs = self
            .repo
            .find_ancestors(folder.id)
            .await?
            .iter()
            .map(Breadcrumb::from)
            .collect();

        Ok(FolderContents {
            folder,
            folders,
            files,
            breadcrumbs,
        })
    }

    /// Creates a generic folder. A clashing slug gets a numeric suffix.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        parent_id: FolderId,
        name: &str,
    ) -> AppResult<Folder> {
        let parent = self
            .authorized_folder(ctx, parent_id, WorkspaceAction::Modify)
            .await?;
        let _guard = self.lock(parent.client_id).await?;
        let parent = self.load_folder(parent.id).await?;

        let name = path::display_name(name)?;
        if parent.folder_type == FolderType::Years {
            return Err(AppError::invalid_operation(
                "Only year folders can be created under years; use add-year",
            ));
        }
        if !parent.folder_type.can_host(FolderType::Folder) {
            return Err(AppError::invalid_operation(format!(
                "A {} folder cannot contain user folders",
                parent.folder_type
            )));
        }

        let base = path::slugify(&name)?;
        let taken = self.repo.sibling_slugs(parent.id).await?;
        let slug = path::unique_slug(&base, &taken);
        let ancestors = self.chain_ids(parent.id).await?;

        let record = NewFolder {
            id: FolderId::new(),
            client_id: parent.client_id,
            parent_id: Some(parent.id),
            s3_prefix: path::child_prefix(&parent.s3_prefix, &slug),
            name,
            slug,
            folder_type: FolderType::Folder,
        };
        let folder = self.repo.insert_folder(&record, &ancestors).await?;

        info!(
            user_id = %ctx.user_id(),
            client_id = %folder.client_id,
            folder_id = %folder.id,
            prefix = %folder.s3_prefix,
            "Folder created"
        );
        self.emit(
            ctx,
            folder.client_id,
            WorkspaceEvent::FolderCreated {
                folder_id: folder.id,
                parent_id: parent.id,
                name: folder.name.clone(),
            },
        );
        Ok(folder)
    }

    /// Creates the folder for `year` under the client's years folder.
    pub async fn add_year_folder(
        &self,
        ctx: &RequestContext,
        client_id: ClientId,
        year: &str,
    ) -> AppResult<Folder> {
        let years = self.years_folder(client_id).await?;
        self.gate
            .require(&ctx.principal, &years, WorkspaceAction::Modify)?;

        let year = year.trim();
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::validation(format!(
                "'{year}' is not a four-digit year"
            )));
        }
        let _guard = self.lock(client_id).await?;
        let years = self.load_folder(years.id).await?;

        let taken = self.repo.sibling_slugs(years.id).await?;
        if taken.iter().any(|slug| slug == year) {
            return Err(AppError::conflict(format!(
                "Year folder {year} already exists"
            )));
        }
        let ancestors = self.chain_ids(years.id).await?;

        let record = NewFolder {
            id: FolderId::new(),
            client_id,
            parent_id: Some(years.id),
            name: year.to_string(),
            slug: year.to_string(),
            folder_type: FolderType::Year,
            s3_prefix: path::child_prefix(&years.s3_prefix, year),
        };
        let folder = self.repo.insert_folder(&record, &ancestors).await?;

        info!(
            user_id = %ctx.user_id(),
            client_id = %client_id,
            folder_id = %folder.id,
            year,
            "Year folder created"
        );
        self.emit(
            ctx,
            client_id,
            WorkspaceEvent::FolderCreated {
                folder_id: folder.id,
                parent_id: years.id,
                name: folder.name.clone(),
            },
        );
        Ok(folder)
    }

    /// Renames a folder, relocating every object beneath it when the slug changes.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        new_name: &str,
    ) -> AppResult<Folder> {
        let folder = self
            .authorized_folder(ctx, folder_id, WorkspaceAction::Modify)
            .await?;
        let _guard = self.lock(folder.client_id).await?;
        let folder = self.load_folder(folder.id).await?;

        if folder.folder_type.is_structural() {
            return Err(AppError::invalid_operation(format!(
                "The {} folder cannot be renamed",
                folder.folder_type
            )));
        }
        let name = path::display_name(new_name)?;
        let slug = path::slugify(&name)?;
        let parent_id = structural_parent(&folder)?;
        let parent = self.load_folder(parent_id).await?;

        if slug != folder.slug {
            let taken = self.repo.sibling_slugs(parent.id).await?;
            if taken.contains(&slug) {
                return Err(AppError::conflict(format!(
                    "A folder named '{slug}' already exists here"
                )));
            }
        }

        let old_prefix = folder.s3_prefix.clone();
        let new_prefix = path::child_prefix(&parent.s3_prefix, &slug);
        if new_prefix == old_prefix && name == folder.name {
            return Ok(folder);
        }

        let (renamed, objects_moved) = if new_prefix == old_prefix {
            let relocation = Relocation {
                folder_id: folder.id,
                name,
                slug,
                parent_id,
                folder_prefixes: Vec::new(),
                file_paths: Vec::new(),
                transfer: None,
            };
            (self.repo.commit_relocation(&relocation).await?, 0)
        } else {
            self.relocate(&folder, name, slug, parent_id, &new_prefix, None)
                .await?
        };

        info!(
            user_id = %ctx.user_id(),
            client_id = %renamed.client_id,
            folder_id = %renamed.id,
            old_prefix = %old_prefix,
            new_prefix = %renamed.s3_prefix,
            objects_moved,
            "Folder renamed"
        );
        self.emit(
            ctx,
            renamed.client_id,
            WorkspaceEvent::FolderRenamed {
                folder_id: renamed.id,
                old_prefix,
                new_prefix: renamed.s3_prefix.clone(),
                objects_moved,
            },
        );
        Ok(renamed)
    }

    /// Moves a folder under a new parent, relocating every object beneath it.
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        new_parent_id: FolderId,
    ) -> AppResult<Folder> {
        let folder = self
            .authorized_folder(ctx, folder_id, WorkspaceAction::Modify)
            .await?;
        self.authorized_folder(ctx, new_parent_id, WorkspaceAction::Modify)
            .await?;
        let _guard = self.lock(folder.client_id).await?;
        let folder = self.load_folder(folder_id).await?;
        let target = self.load_folder(new_parent_id).await?;

        if folder.folder_type.is_structural() {
            return Err(AppError::invalid_operation(format!(
                "The {} folder cannot be moved",
                folder.folder_type
            )));
        }
        if target.client_id != folder.client_id {
            return Err(AppError::invalid_operation(
                "Folders cannot be moved between clients",
            ));
        }
        if target.id == folder.id {
            return Err(AppError::invalid_operation(
                "A folder cannot be moved into itself",
            ));
        }
        let target_chain = self.chain_ids(target.id).await?;
        if target_chain.contains(&folder.id) {
            return Err(AppError::invalid_operation(
                "A folder cannot be moved into its own subtree",
            ));
        }
        if !target.folder_type.can_host(folder.folder_type) {
            return Err(AppError::invalid_operation(format!(
                "A {} folder cannot contain a {} folder",
                target.folder_type, folder.folder_type
            )));
        }

        let old_parent_id = structural_parent(&folder)?;
        if old_parent_id == target.id {
            return Ok(folder);
        }
        let taken = self.repo.sibling_slugs(target.id).await?;
        if taken.contains(&folder.slug) {
            return Err(AppError::conflict(format!(
                "A folder named '{}' already exists in the destination",
                folder.slug
            )));
        }

        let old_chain = self.chain_ids(old_parent_id).await?;
        let new_prefix = path::child_prefix(&target.s3_prefix, &folder.slug);
        let (moved, objects_moved) = self
            .relocate(
                &folder,
                folder.name.clone(),
                folder.slug.clone(),
                target.id,
                &new_prefix,
                Some((old_chain, target_chain)),
            )
            .await?;

        info!(
            user_id = %ctx.user_id(),
            client_id = %moved.client_id,
            folder_id = %moved.id,
            from_parent_id = %old_parent_id,
            to_parent_id = %target.id,
            new_prefix = %moved.s3_prefix,
            objects_moved,
            "Folder moved"
        );
        self.emit(
            ctx,
            moved.client_id,
            WorkspaceEvent::FolderMoved {
                folder_id: moved.id,
                from_parent_id: old_parent_id,
                to_parent_id: target.id,
                objects_moved,
            },
        );
        Ok(moved)
    }

    /// Deletes a folder with its whole subtree. Returns what was removed.
    pub async fn delete_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<Aggregates> {
        let folder = self
            .authorized_folder(ctx, folder_id, WorkspaceAction::Modify)
            .await?;
        let _guard = self.lock(folder.client_id).await?;
        let folder = self.load_folder(folder.id).await?;

        if folder.folder_type.is_structural() {
            return Err(AppError::invalid_operation(format!(
                "The {} folder cannot be deleted",
                folder.folder_type
            )));
        }
        let parent_id = structural_parent(&folder)?;

        let subtree = self.repo.load_subtree(folder.id).await?;
        let removed = subtree.contribution();
        let ancestors = self.chain_ids(parent_id).await?;
        self.repo
            .delete_subtree(folder.id, &ancestors, removed)
            .await?;

        let mut orphaned = 0u64;
        for file in &subtree.files {
            if let Err(e) = self.store.delete(&file.s3_path).await {
                orphaned += 1;
                warn!(
                    file_id = %file.id,
                    key = %file.s3_path,
                    error = %e,
                    "Failed to delete object of removed file; leaving orphan"
                );
            }
        }

        info!(
            user_id = %ctx.user_id(),
            client_id = %folder.client_id,
            folder_id = %folder.id,
            prefix = %folder.s3_prefix,
            folders = removed.folders,
            files = removed.files,
            bytes = removed.bytes,
            orphaned,
            "Folder deleted"
        );
        self.emit(
            ctx,
            folder.client_id,
            WorkspaceEvent::FolderDeleted {
                folder_id: folder.id,
                prefix: folder.s3_prefix.clone(),
                files_removed: removed.files as u64,
            },
        );
        Ok(removed)
    }

    /// Copy phase, single metadata commit, then cleanup of the old keys.
    ///
    /// `chains` carries the old and new ancestor chains for a move; a
    /// rename passes `None` and leaves aggregates alone.
    async fn relocate(
        &self,
        folder: &Folder,
        name: String,
        slug: String,
        parent_id: FolderId,
        new_prefix: &str,
        chains: Option<(Vec<FolderId>, Vec<FolderId>)>,
    ) -> AppResult<(Folder, u64)> {
        let subtree = self.repo.load_subtree(folder.id).await?;
        let plan = MigrationPlan::build(&subtree, &folder.s3_prefix, new_prefix)?;
        plan.copy_all(self.store.as_ref()).await?;

        let relocation = Relocation {
            folder_id: folder.id,
            name,
            slug,
            parent_id,
            folder_prefixes: plan.folder_prefixes.clone(),
            file_paths: plan.file_paths(),
            transfer: chains.map(|(from, to)| AggregateTransfer {
                from,
                to,
                amount: subtree.contribution(),
            }),
        };
        let updated = self
            .repo
            .commit_relocation(&relocation)
            .await
            .inspect_err(|e| {
                warn!(
                    folder_id = %folder.id,
                    new_prefix,
                    copies = plan.object_count(),
                    error = %e,
                    "Relocation commit failed; copied objects left unreferenced"
                );
            })?;

        let leftovers = plan.remove_sources(self.store.as_ref()).await;
        if leftovers > 0 {
            warn!(
                folder_id = %folder.id,
                leftovers,
                "Some old objects could not be deleted after relocation"
            );
        }
        Ok((updated, plan.object_count()))
    }

    async fn client_root(&self, client_id: ClientId) -> AppResult<Folder> {
        self.repo
            .find_root(client_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Client {client_id} has no workspace")))
    }

    async fn years_folder(&self, client_id: ClientId) -> AppResult<Folder> {
        self.repo
            .find_by_type(client_id, FolderType::Years)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("Client {client_id} has no years folder")))
    }
}

/// The parent of a non-root folder.
fn structural_parent(folder: &Folder) -> AppResult<FolderId> {
    folder.parent_id.ok_or_else(|| {
        AppError::invalid_operation("The root folder cannot be renamed, moved, or deleted")
    })
}

/// Nest a pre-ordered subtree into folder nodes.
fn assemble_tree(subtree: Subtree) -> AppResult<FolderNode> {
    let mut folders = subtree.folders.into_iter();
    let root = folders
        .next()
        .ok_or_else(|| AppError::internal("Subtree without a root folder"))?;

    let mut children: HashMap<FolderId, Vec<Folder>> = HashMap::new();
    for folder in folders {
        if let Some(parent_id) = folder.parent_id {
            children.entry(parent_id).or_default().push(folder);
        }
    }
    let mut files: HashMap<FolderId, Vec<File>> = HashMap::new();
    for file in subtree.files {
        files.entry(file.folder_id).or_default().push(file);
    }

    Ok(build_node(root, &mut children, &mut files))
}

fn build_node(
    folder: Folder,
    children: &mut HashMap<FolderId, Vec<Folder>>,
    files: &mut HashMap<FolderId, Vec<File>>,
) -> FolderNode {
    let mut kids = children.remove(&folder.id).unwrap_or_default();
    kids.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.slug.cmp(&b.slug)));
    let mut own_files = files.remove(&folder.id).unwrap_or_default();
    own_files.sort_by(|a, b| a.original_name.cmp(&b.original_name));

    FolderNode {
        children: kids
            .into_iter()
            .map(|kid| build_node(kid, children, files))
            .collect(),
        files: own_files,
        folder,
    }
}
