//! PostgreSQL implementation of [`TreeRepository`].

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use clientvault_core::error::{AppError, ErrorKind};
use clientvault_core::result::AppResult;
use clientvault_core::types::id::{ClientId, FileId, FolderId};
use clientvault_entity::file::{File, NewFile};
use clientvault_entity::folder::{Aggregates, Folder, FolderType, NewFolder};

use super::tree::{FileRelocation, Relocation, Subtree, TreeRepository};

const FOLDER_COLUMNS: &str = "id, client_id, parent_id, name, slug, folder_type, s3_prefix, \
     file_count, folder_count, total_size, created_at, updated_at";

/// Tree repository backed by the `folders` and `files` tables.
#[derive(Debug, Clone)]
pub struct PgTreeRepository {
    pool: PgPool,
}

impl PgTreeRepository {
    /// Create a new tree repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

/// Like [`db_error`] but reports unique violations as conflicts.
fn write_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::with_source(ErrorKind::Conflict, "A sibling with that name already exists", e)
        }
        _ => AppError::with_source(ErrorKind::Database, context, e),
    }
}

fn uuids<T: Copy + Into<Uuid>>(ids: &[T]) -> Vec<Uuid> {
    ids.iter().map(|id| (*id).into()).collect()
}

async fn adjust_aggregates(
    tx: &mut Transaction<'static, Postgres>,
    ids: &[FolderId],
    delta: Aggregates,
) -> AppResult<()> {
    if ids.is_empty() || delta.is_zero() {
        return Ok(());
    }
    let result = sqlx::query(
        "UPDATE folders SET folder_count = folder_count + $2, file_count = file_count + $3, \
         total_size = total_size + $4, updated_at = NOW() WHERE id = ANY($1)",
    )
    .bind(uuids(ids))
    .bind(delta.folders)
    .bind(delta.files)
    .bind(delta.bytes)
    .execute(&mut **tx)
    .await
    .map_err(db_error("Failed to update folder aggregates"))?;

    if result.rows_affected() != ids.len() as u64 {
        return Err(AppError::not_found(
            "An ancestor folder disappeared while updating aggregates",
        ));
    }
    Ok(())
}

async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
    tx.commit()
        .await
        .map_err(db_error("Failed to commit transaction"))
}

#[async_trait]
impl TreeRepository for PgTreeRepository {
    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(&format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find folder"))
    }

    async fn find_file(&self, id: FileId) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find file"))
    }

    async fn find_root(&self, client_id: ClientId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE client_id = $1 AND parent_id IS NULL"
        ))
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find root folder"))
    }

    async fn find_by_type(
        &self,
        client_id: ClientId,
        folder_type: FolderType,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE client_id = $1 AND folder_type = $2 \
             ORDER BY s3_prefix"
        ))
        .bind(client_id)
        .bind(folder_type)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find folders by type"))
    }

    async fn list_child_folders(&self, parent_id: FolderId) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE parent_id = $1 ORDER BY name, slug"
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list child folders"))
    }

    async fn list_files(&self, folder_id: FolderId) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE folder_id = $1 ORDER BY original_name, file_name",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list files"))
    }

    async fn sibling_slugs(&self, parent_id: FolderId) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT slug FROM folders WHERE parent_id = $1")
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list sibling slugs"))
    }

    async fn find_ancestors(&self, folder_id: FolderId) -> AppResult<Vec<Folder>> {
        let chain = sqlx::query_as::<_, Folder>(&format!(
            "WITH RECURSIVE chain AS ( \
                 SELECT f.*, 0 AS depth FROM folders f WHERE f.id = $1 \
                 UNION ALL \
                 SELECT p.*, c.depth + 1 FROM folders p JOIN chain c ON p.id = c.parent_id \
             ) \
             SELECT {FOLDER_COLUMNS} FROM chain ORDER BY depth DESC"
        ))
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load ancestor chain"))?;

        if chain.is_empty() {
            return Err(AppError::not_found(format!("Folder {folder_id} not found")));
        }
        Ok(chain)
    }

    async fn load_subtree(&self, folder_id: FolderId) -> AppResult<Subtree> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "WITH RECURSIVE subtree AS ( \
                 SELECT f.*, ARRAY[f.slug] AS sort_path FROM folders f WHERE f.id = $1 \
                 UNION ALL \
                 SELECT c.*, s.sort_path || c.slug FROM folders c \
                 JOIN subtree s ON c.parent_id = s.id \
             ) \
             SELECT {FOLDER_COLUMNS} FROM subtree ORDER BY sort_path"
        ))
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load folder subtree"))?;

        if folders.is_empty() {
            return Err(AppError::not_found(format!("Folder {folder_id} not found")));
        }

        let ids: Vec<FolderId> = folders.iter().map(|f| f.id).collect();
        let files = sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE folder_id = ANY($1) ORDER BY s3_path",
        )
        .bind(uuids(&ids))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load subtree files"))?;

        Ok(Subtree { folders, files })
    }

    async fn insert_folder(
        &self,
        folder: &NewFolder,
        ancestors: &[FolderId],
    ) -> AppResult<Folder> {
        let mut tx = self.begin().await?;
        let record = sqlx::query_as::<_, Folder>(&format!(
            "INSERT INTO folders (id, client_id, parent_id, name, slug, folder_type, s3_prefix) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(folder.id)
        .bind(folder.client_id)
        .bind(folder.parent_id)
        .bind(&folder.name)
        .bind(&folder.slug)
        .bind(folder.folder_type)
        .bind(&folder.s3_prefix)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error("Failed to create folder"))?;

        adjust_aggregates(&mut tx, ancestors, Aggregates::one_folder()).await?;
        commit(tx).await?;
        Ok(record)
    }

    async fn insert_file(&self, file: &NewFile, ancestors: &[FolderId]) -> AppResult<File> {
        let mut tx = self.begin().await?;
        let record = sqlx::query_as::<_, File>(
            "INSERT INTO files (id, client_id, folder_id, file_name, original_name, mime_type, \
             size, s3_path, uploaded_by) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING *",
        )
        .bind(file.id)
        .bind(file.client_id)
        .bind(file.folder_id)
        .bind(&file.file_name)
        .bind(&file.original_name)
        .bind(&file.mime_type)
        .bind(file.size)
        .bind(&file.s3_path)
        .bind(file.uploaded_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error("Failed to create file"))?;

        adjust_aggregates(&mut tx, ancestors, Aggregates::one_file(record.size)).await?;
        commit(tx).await?;
        Ok(record)
    }

    async fn rename_file(&self, id: FileId, original_name: &str) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET original_name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(original_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to rename file"))?
        .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }

    async fn commit_relocation(&self, relocation: &Relocation) -> AppResult<Folder> {
        let mut tx = self.begin().await?;

        let folder = sqlx::query_as::<_, Folder>(&format!(
            "UPDATE folders SET name = $2, slug = $3, parent_id = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(relocation.folder_id)
        .bind(&relocation.name)
        .bind(&relocation.slug)
        .bind(relocation.parent_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(write_error("Failed to update folder"))?
        .ok_or_else(|| AppError::not_found(format!("Folder {} not found", relocation.folder_id)))?;

        let (folder_ids, prefixes): (Vec<FolderId>, Vec<String>) =
            relocation.folder_prefixes.iter().cloned().unzip();
        sqlx::query(
            "UPDATE folders AS f SET s3_prefix = v.prefix, updated_at = NOW() \
             FROM UNNEST($1::uuid[], $2::text[]) AS v(id, prefix) WHERE f.id = v.id",
        )
        .bind(uuids(&folder_ids))
        .bind(&prefixes)
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to rewrite folder prefixes"))?;

        if !relocation.file_paths.is_empty() {
            let (file_ids, paths): (Vec<FileId>, Vec<String>) =
                relocation.file_paths.iter().cloned().unzip();
            sqlx::query(
                "UPDATE files AS f SET s3_path = v.path, updated_at = NOW() \
                 FROM UNNEST($1::uuid[], $2::text[]) AS v(id, path) WHERE f.id = v.id",
            )
            .bind(uuids(&file_ids))
            .bind(&paths)
            .execute(&mut *tx)
            .await
            .map_err(write_error("Failed to rewrite file paths"))?;
        }

        if let Some(transfer) = &relocation.transfer {
            adjust_aggregates(&mut tx, &transfer.from, -transfer.amount).await?;
            adjust_aggregates(&mut tx, &transfer.to, transfer.amount).await?;
        }

        commit(tx).await?;

        let prefix = relocation
            .folder_prefixes
            .iter()
            .find(|(id, _)| *id == folder.id)
            .map(|(_, p)| p.clone())
            .unwrap_or(folder.s3_prefix.clone());
        Ok(Folder {
            s3_prefix: prefix,
            ..folder
        })
    }

    async fn relocate_file(&self, relocation: &FileRelocation) -> AppResult<File> {
        let mut tx = self.begin().await?;
        let file = sqlx::query_as::<_, File>(
            "UPDATE files SET folder_id = $2, s3_path = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(relocation.file_id)
        .bind(relocation.folder_id)
        .bind(&relocation.s3_path)
        .fetch_optional(&mut *tx)
        .await
        .map_err(write_error("Failed to move file"))?
        .ok_or_else(|| AppError::not_found(format!("File {} not found", relocation.file_id)))?;

        let transfer = &relocation.transfer;
        adjust_aggregates(&mut tx, &transfer.from, -transfer.amount).await?;
        adjust_aggregates(&mut tx, &transfer.to, transfer.amount).await?;
        commit(tx).await?;
        Ok(file)
    }

    async fn delete_subtree(
        &self,
        folder_id: FolderId,
        ancestors: &[FolderId],
        removed: Aggregates,
    ) -> AppResult<()> {
        let mut tx = self.begin().await?;
        // Child folders and files go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(folder_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to delete folder"))?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Folder {folder_id} not found")));
        }

        adjust_aggregates(&mut tx, ancestors, -removed).await?;
        commit(tx).await
    }

    async fn delete_file(&self, file_id: FileId, ancestors: &[FolderId]) -> AppResult<()> {
        let mut tx = self.begin().await?;
        let size: Option<i64> =
            sqlx::query_scalar("DELETE FROM files WHERE id = $1 RETURNING size")
                .bind(file_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("Failed to delete file"))?;
        let size = size.ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;

        adjust_aggregates(&mut tx, ancestors, -Aggregates::one_file(size)).await?;
        commit(tx).await
    }

    async fn store_aggregates(&self, values: &[(FolderId, Aggregates)]) -> AppResult<u64> {
        if values.is_empty() {
            return Ok(0);
        }
        let ids: Vec<Uuid> = values.iter().map(|(id, _)| id.into_uuid()).collect();
        let folders: Vec<i64> = values.iter().map(|(_, a)| a.folders).collect();
        let files: Vec<i64> = values.iter().map(|(_, a)| a.files).collect();
        let bytes: Vec<i64> = values.iter().map(|(_, a)| a.bytes).collect();

        let result = sqlx::query(
            "UPDATE folders AS f SET folder_count = v.folders, file_count = v.files, \
             total_size = v.bytes, updated_at = NOW() \
             FROM UNNEST($1::uuid[], $2::bigint[], $3::bigint[], $4::bigint[]) \
             AS v(id, folders, files, bytes) WHERE f.id = v.id",
        )
        .bind(ids)
        .bind(folders)
        .bind(files)
        .bind(bytes)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to store folder aggregates"))?;
        Ok(result.rows_affected())
    }
}
