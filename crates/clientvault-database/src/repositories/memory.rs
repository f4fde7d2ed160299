//! In-memory arena implementation of [`TreeRepository`].
//!
//! Folders and files live in maps keyed by ID with parent-to-children
//! indexes beside them. A single `RwLock` around the arena makes every
//! mutating method atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use clientvault_core::error::AppError;
use clientvault_core::result::AppResult;
use clientvault_core::types::id::{ClientId, FileId, FolderId};
use clientvault_entity::file::{File, NewFile};
use clientvault_entity::folder::{Aggregates, Folder, FolderType, NewFolder};

use super::tree::{FileRelocation, Relocation, Subtree, TreeRepository};

#[derive(Debug, Default)]
struct Arena {
    folders: HashMap<FolderId, Folder>,
    files: HashMap<FileId, File>,
    children: HashMap<FolderId, Vec<FolderId>>,
    folder_files: HashMap<FolderId, Vec<FileId>>,
}

impl Arena {
    fn folder(&self, id: FolderId) -> AppResult<&Folder> {
        self.folders
            .get(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
    }

    fn slug_taken(&self, parent_id: FolderId, slug: &str, except: Option<FolderId>) -> bool {
        self.children.get(&parent_id).is_some_and(|ids| {
            ids.iter()
                .filter(|id| Some(**id) != except)
                .filter_map(|id| self.folders.get(id))
                .any(|f| f.slug == slug)
        })
    }

    fn ensure_exist(&self, ids: &[FolderId]) -> AppResult<()> {
        for id in ids {
            self.folder(*id)?;
        }
        Ok(())
    }

    fn adjust(&mut self, ids: &[FolderId], delta: Aggregates) {
        let now = Utc::now();
        for id in ids {
            if let Some(folder) = self.folders.get_mut(id) {
                folder.folder_count += delta.folders;
                folder.file_count += delta.files;
                folder.total_size += delta.bytes;
                folder.updated_at = now;
            }
        }
    }

    fn preorder(&self, start: FolderId) -> Vec<FolderId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            order.push(id);
            let mut kids: Vec<&Folder> = self
                .children
                .get(&id)
                .map(|ids| ids.iter().filter_map(|c| self.folders.get(c)).collect())
                .unwrap_or_default();
            kids.sort_by(|a, b| b.slug.cmp(&a.slug));
            stack.extend(kids.into_iter().map(|f| f.id));
        }
        order
    }

    fn detach_child(&mut self, parent_id: FolderId, child: FolderId) {
        if let Some(ids) = self.children.get_mut(&parent_id) {
            ids.retain(|id| *id != child);
        }
    }

    fn detach_file(&mut self, folder_id: FolderId, file: FileId) {
        if let Some(ids) = self.folder_files.get_mut(&folder_id) {
            ids.retain(|id| *id != file);
        }
    }
}

/// Tree repository held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryTreeRepository {
    arena: RwLock<Arena>,
}

impl MemoryTreeRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of folder records across all clients.
    pub async fn folder_total(&self) -> usize {
        self.arena.read().await.folders.len()
    }

    /// Number of file records across all clients.
    pub async fn file_total(&self) -> usize {
        self.arena.read().await.files.len()
    }
}

#[async_trait]
impl TreeRepository for MemoryTreeRepository {
    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>> {
        Ok(self.arena.read().await.folders.get(&id).cloned())
    }

    async fn find_file(&self, id: FileId) -> AppResult<Option<File>> {
        Ok(self.arena.read().await.files.get(&id).cloned())
    }

    async fn find_root(&self, client_id: ClientId) -> AppResult<Option<Folder>> {
        let arena = self.arena.read().await;
        Ok(arena
            .folders
            .values()
            .find(|f| f.client_id == client_id && f.parent_id.is_none())
            .cloned())
    }

    async fn find_by_type(
        &self,
        client_id: ClientId,
        folder_type: FolderType,
    ) -> AppResult<Vec<Folder>> {
        let arena = self.arena.read().await;
        let mut found: Vec<Folder> = arena
            .folders
            .values()
            .filter(|f| f.client_id == client_id && f.folder_type == folder_type)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.s3_prefix.cmp(&b.s3_prefix));
        Ok(found)
    }

    async fn list_child_folders(&self, parent_id: FolderId) -> AppResult<Vec<Folder>> {
        let arena = self.arena.read().await;
        let mut kids: Vec<Folder> = arena
            .children
            .get(&parent_id)
            .map(|ids| ids.iter().filter_map(|id| arena.folders.get(id).cloned()).collect())
            .unwrap_or_default();
        kids.sort_by(|a, b| a.name.cmp(&b.name).then(a.slug.cmp(&b.slug)));
        Ok(kids)
    }

    async fn list_files(&self, folder_id: FolderId) -> AppResult<Vec<File>> {
        let arena = self.arena.read().await;
        let mut files: Vec<File> = arena
            .folder_files
            .get(&folder_id)
            .map(|ids| ids.iter().filter_map(|id| arena.files.get(id).cloned()).collect())
            .unwrap_or_default();
        files.sort_by(|a, b| {
            a.original_name
                .cmp(&b.original_name)
                .then(a.file_name.cmp(&b.file_name))
        });
        Ok(files)
    }

    async fn sibling_slugs(&self, parent_id: FolderId) -> AppResult<Vec<String>> {
        let arena = self.arena.read().await;
        Ok(arena
            .children
            .get(&parent_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| arena.folders.get(id).map(|f| f.slug.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_ancestors(&self, folder_id: FolderId) -> AppResult<Vec<Folder>> {
        let arena = self.arena.read().await;
        let mut chain = Vec::new();
        let mut current = Some(folder_id);
        while let Some(id) = current {
            let folder = arena.folder(id)?;
            if chain.len() > arena.folders.len() {
                return Err(AppError::internal(format!(
                    "Parent chain of folder {folder_id} does not terminate"
                )));
            }
            current = folder.parent_id;
            chain.push(folder.clone());
        }
        chain.reverse();
        Ok(chain)
    }

    async fn load_subtree(&self, folder_id: FolderId) -> AppResult<Subtree> {
        let arena = self.arena.read().await;
        arena.folder(folder_id)?;

        let mut subtree = Subtree::default();
        for id in arena.preorder(folder_id) {
            if let Some(folder) = arena.folders.get(&id) {
                subtree.folders.push(folder.clone());
            }
            if let Some(file_ids) = arena.folder_files.get(&id) {
                let mut files: Vec<File> = file_ids
                    .iter()
                    .filter_map(|f| arena.files.get(f).cloned())
                    .collect();
                files.sort_by(|a, b| a.s3_path.cmp(&b.s3_path));
                subtree.files.extend(files);
            }
        }
        Ok(subtree)
    }

    async fn insert_folder(
        &self,
        folder: &NewFolder,
        ancestors: &[FolderId],
    ) -> AppResult<Folder> {
        let mut arena = self.arena.write().await;
        if arena.folders.contains_key(&folder.id) {
            return Err(AppError::conflict(format!(
                "Folder {} already exists",
                folder.id
            )));
        }
        match folder.parent_id {
            Some(parent_id) => {
                arena.folder(parent_id)?;
                if arena.slug_taken(parent_id, &folder.slug, None) {
                    return Err(AppError::conflict(format!(
                        "A folder named '{}' already exists here",
                        folder.slug
                    )));
                }
            }
            None => {
                let has_root = arena
                    .folders
                    .values()
                    .any(|f| f.client_id == folder.client_id && f.parent_id.is_none());
                if has_root {
                    return Err(AppError::conflict(format!(
                        "Client {} already has a root folder",
                        folder.client_id
                    )));
                }
            }
        }
        arena.ensure_exist(ancestors)?;

        let record = folder.clone().into_folder(Utc::now());
        if let Some(parent_id) = record.parent_id {
            arena.children.entry(parent_id).or_default().push(record.id);
        }
        arena.folders.insert(record.id, record.clone());
        arena.adjust(ancestors, Aggregates::one_folder());
        Ok(record)
    }

    async fn insert_file(&self, file: &NewFile, ancestors: &[FolderId]) -> AppResult<File> {
        let mut arena = self.arena.write().await;
        arena.folder(file.folder_id)?;
        arena.ensure_exist(ancestors)?;
        if arena.files.values().any(|f| f.s3_path == file.s3_path) {
            return Err(AppError::conflict(format!(
                "Object key '{}' is already in use",
                file.s3_path
            )));
        }

        let record = file.clone().into_file(Utc::now());
        arena
            .folder_files
            .entry(record.folder_id)
            .or_default()
            .push(record.id);
        arena.files.insert(record.id, record.clone());
        arena.adjust(ancestors, Aggregates::one_file(record.size));
        Ok(record)
    }

    async fn rename_file(&self, id: FileId, original_name: &str) -> AppResult<File> {
        let mut arena = self.arena.write().await;
        let file = arena
            .files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        file.original_name = original_name.to_string();
        file.updated_at = Utc::now();
        Ok(file.clone())
    }

    async fn commit_relocation(&self, relocation: &Relocation) -> AppResult<Folder> {
        let mut arena = self.arena.write().await;
        let current = arena.folder(relocation.folder_id)?.clone();
        arena.folder(relocation.parent_id)?;
        if arena.slug_taken(
            relocation.parent_id,
            &relocation.slug,
            Some(relocation.folder_id),
        ) {
            return Err(AppError::conflict(format!(
                "A folder named '{}' already exists here",
                relocation.slug
            )));
        }
        for (id, _) in &relocation.folder_prefixes {
            arena.folder(*id)?;
        }
        for (id, _) in &relocation.file_paths {
            if !arena.files.contains_key(id) {
                return Err(AppError::not_found(format!("File {id} not found")));
            }
        }
        if let Some(transfer) = &relocation.transfer {
            arena.ensure_exist(&transfer.from)?;
            arena.ensure_exist(&transfer.to)?;
        }

        let now = Utc::now();
        if let Some(old_parent) = current
            .parent_id
            .filter(|parent| *parent != relocation.parent_id)
        {
            arena.detach_child(old_parent, current.id);
            arena
                .children
                .entry(relocation.parent_id)
                .or_default()
                .push(current.id);
        }
        for (id, prefix) in &relocation.folder_prefixes {
            if let Some(folder) = arena.folders.get_mut(id) {
                folder.s3_prefix = prefix.clone();
                folder.updated_at = now;
            }
        }
        for (id, path) in &relocation.file_paths {
            if let Some(file) = arena.files.get_mut(id) {
                file.s3_path = path.clone();
                file.updated_at = now;
            }
        }
        if let Some(transfer) = &relocation.transfer {
            arena.adjust(&transfer.from, -transfer.amount);
            arena.adjust(&transfer.to, transfer.amount);
        }

        let folder = arena
            .folders
            .get_mut(&relocation.folder_id)
            .ok_or_else(|| AppError::not_found("Folder vanished during relocation"))?;
        folder.name = relocation.name.clone();
        folder.slug = relocation.slug.clone();
        folder.parent_id = Some(relocation.parent_id);
        folder.updated_at = now;
        Ok(folder.clone())
    }

    async fn relocate_file(&self, relocation: &FileRelocation) -> AppResult<File> {
        let mut arena = self.arena.write().await;
        arena.folder(relocation.folder_id)?;
        arena.ensure_exist(&relocation.transfer.from)?;
        arena.ensure_exist(&relocation.transfer.to)?;
        let old_folder = arena
            .files
            .get(&relocation.file_id)
            .map(|f| f.folder_id)
            .ok_or_else(|| AppError::not_found(format!("File {} not found", relocation.file_id)))?;

        arena.detach_file(old_folder, relocation.file_id);
        arena
            .folder_files
            .entry(relocation.folder_id)
            .or_default()
            .push(relocation.file_id);
        arena.adjust(&relocation.transfer.from, -relocation.transfer.amount);
        arena.adjust(&relocation.transfer.to, relocation.transfer.amount);

        let file = arena
            .files
            .get_mut(&relocation.file_id)
            .ok_or_else(|| AppError::not_found("File vanished during relocation"))?;
        file.folder_id = relocation.folder_id;
        file.s3_path = relocation.s3_path.clone();
        file.updated_at = Utc::now();
        Ok(file.clone())
    }

    async fn delete_subtree(
        &self,
        folder_id: FolderId,
        ancestors: &[FolderId],
        removed: Aggregates,
    ) -> AppResult<()> {
        let mut arena = self.arena.write().await;
        let parent_id = arena.folder(folder_id)?.parent_id;
        arena.ensure_exist(ancestors)?;

        for id in arena.preorder(folder_id) {
            arena.folders.remove(&id);
            arena.children.remove(&id);
            for file_id in arena.folder_files.remove(&id).unwrap_or_default() {
                arena.files.remove(&file_id);
            }
        }
        if let Some(parent_id) = parent_id {
            arena.detach_child(parent_id, folder_id);
        }
        arena.adjust(ancestors, -removed);
        Ok(())
    }

    async fn delete_file(&self, file_id: FileId, ancestors: &[FolderId]) -> AppResult<()> {
        let mut arena = self.arena.write().await;
        arena.ensure_exist(ancestors)?;
        let file = arena
            .files
            .remove(&file_id)
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;
        arena.detach_file(file.folder_id, file_id);
        arena.adjust(ancestors, -Aggregates::one_file(file.size));
        Ok(())
    }

    async fn store_aggregates(&self, values: &[(FolderId, Aggregates)]) -> AppResult<u64> {
        let mut arena = self.arena.write().await;
        let now = Utc::now();
        let mut written = 0;
        for (id, aggregates) in values {
            if let Some(folder) = arena.folders.get_mut(id) {
                folder.folder_count = aggregates.folders;
                folder.file_count = aggregates.files;
                folder.total_size = aggregates.bytes;
                folder.updated_at = now;
                written += 1;
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientvault_core::types::id::UserId;

    fn new_folder(
        client_id: ClientId,
        parent: Option<&Folder>,
        slug: &str,
        folder_type: FolderType,
    ) -> NewFolder {
        let prefix = match parent {
            Some(p) => format!("{}{slug}/", p.s3_prefix),
            None => format!("clients/{slug}/"),
        };
        NewFolder {
            id: FolderId::new(),
            client_id,
            parent_id: parent.map(|p| p.id),
            name: slug.to_string(),
            slug: slug.to_string(),
            folder_type,
            s3_prefix: prefix,
        }
    }

    fn new_file(folder: &Folder, size: i64) -> NewFile {
        let file_name = format!("{}.pdf", FileId::new().into_uuid().simple());
        NewFile {
            id: FileId::new(),
            client_id: folder.client_id,
            folder_id: folder.id,
            s3_path: format!("{}{file_name}", folder.s3_prefix),
            file_name,
            original_name: "invoice.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size,
            uploaded_by: UserId::new(),
        }
    }

    async fn seed(repo: &MemoryTreeRepository) -> (Folder, Folder, Folder) {
        let client = ClientId::new();
        let root = repo
            .insert_folder(&new_folder(client, None, "c1", FolderType::Root), &[])
            .await
            .unwrap();
        let docs = repo
            .insert_folder(
                &new_folder(client, Some(&root), "documents", FolderType::Documents),
                &[root.id],
            )
            .await
            .unwrap();
        let years = repo
            .insert_folder(
                &new_folder(client, Some(&docs), "years", FolderType::Years),
                &[root.id, docs.id],
            )
            .await
            .unwrap();
        (root, docs, years)
    }

    #[tokio::test]
    async fn test_insert_updates_ancestor_aggregates() {
        let repo = MemoryTreeRepository::new();
        let (root, docs, years) = seed(&repo).await;
        let chain = [root.id, docs.id, years.id];
        repo.insert_file(&new_file(&years, 40), &chain).await.unwrap();

        let root = repo.find_folder(root.id).await.unwrap().unwrap();
        assert_eq!(root.folder_count, 2);
        assert_eq!(root.file_count, 1);
        assert_eq!(root.total_size, 40);
        let years = repo.find_folder(years.id).await.unwrap().unwrap();
        assert_eq!(years.folder_count, 0);
        assert_eq!(years.file_count, 1);
    }

    #[tokio::test]
    async fn test_sibling_slug_conflict() {
        let repo = MemoryTreeRepository::new();
        let (root, docs, years) = seed(&repo).await;
        let chain = [root.id, docs.id, years.id];
        let first = new_folder(root.client_id, Some(&years), "2023", FolderType::Year);
        repo.insert_folder(&first, &chain).await.unwrap();

        let again = new_folder(root.client_id, Some(&years), "2023", FolderType::Year);
        let err = repo.insert_folder(&again, &chain).await.unwrap_err();
        assert_eq!(err.kind, clientvault_core::error::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_second_root_is_rejected() {
        let repo = MemoryTreeRepository::new();
        let (root, _, _) = seed(&repo).await;
        let other = new_folder(root.client_id, None, "again", FolderType::Root);
        assert!(repo.insert_folder(&other, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_subtree_is_preorder_with_files() {
        let repo = MemoryTreeRepository::new();
        let (root, docs, years) = seed(&repo).await;
        let y2023 = repo
            .insert_folder(
                &new_folder(root.client_id, Some(&years), "2023", FolderType::Year),
                &[root.id, docs.id, years.id],
            )
            .await
            .unwrap();
        repo.insert_file(&new_file(&y2023, 5), &[root.id, docs.id, years.id, y2023.id])
            .await
            .unwrap();

        let subtree = repo.load_subtree(docs.id).await.unwrap();
        let slugs: Vec<&str> = subtree.folders.iter().map(|f| f.slug.as_str()).collect();
        assert_eq!(slugs, vec!["documents", "years", "2023"]);
        assert_eq!(subtree.files.len(), 1);
        assert_eq!(
            subtree.contribution(),
            Aggregates {
                folders: 3,
                files: 1,
                bytes: 5
            }
        );
    }

    #[tokio::test]
    async fn test_ancestors_are_root_first() {
        let repo = MemoryTreeRepository::new();
        let (root, docs, years) = seed(&repo).await;
        let chain = repo.find_ancestors(years.id).await.unwrap();
        let ids: Vec<FolderId> = chain.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![root.id, docs.id, years.id]);
    }

    #[tokio::test]
    async fn test_delete_subtree_removes_everything_below() {
        let repo = MemoryTreeRepository::new();
        let (root, docs, years) = seed(&repo).await;
        let chain = [root.id, docs.id, years.id];
        let y2023 = repo
            .insert_folder(
                &new_folder(root.client_id, Some(&years), "2023", FolderType::Year),
                &chain,
            )
            .await
            .unwrap();
        repo.insert_file(&new_file(&y2023, 9), &[root.id, docs.id, years.id, y2023.id])
            .await
            .unwrap();

        let subtree = repo.load_subtree(y2023.id).await.unwrap();
        repo.delete_subtree(y2023.id, &chain, subtree.contribution())
            .await
            .unwrap();

        assert!(repo.find_folder(y2023.id).await.unwrap().is_none());
        assert_eq!(repo.file_total().await, 0);
        let root = repo.find_folder(root.id).await.unwrap().unwrap();
        assert!(root.aggregates() == Aggregates { folders: 2, files: 0, bytes: 0 });
        assert!(repo.sibling_slugs(years.id).await.unwrap().is_empty());
    }
}
