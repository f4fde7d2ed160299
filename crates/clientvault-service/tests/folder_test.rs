//! Integration tests for folder operations.

mod helpers;

use clientvault_core::error::ErrorKind;
use clientvault_entity::folder::{Aggregates, FolderType};

#[tokio::test]
async fn test_provisioned_tree_layout() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme Ltd").await;

    assert_eq!(c1.root.s3_prefix, format!("clients/{}/", c1.client_id));
    assert_eq!(
        c1.years.s3_prefix,
        format!("clients/{}/documents/years/", c1.client_id)
    );
    let root = app.folder(c1.root.id).await;
    assert_eq!(root.folder_count, 2);
    assert_eq!(root.file_count, 0);
    app.assert_consistent(c1.client_id).await;
}

#[tokio::test]
async fn test_create_folder_suffixes_duplicate_slugs() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;

    let first = app.mkdir(c1.documents.id, "Receipts").await;
    let second = app.mkdir(c1.documents.id, "receipts").await;
    let third = app.mkdir(c1.documents.id, "Receipts!").await;

    assert_eq!(first.slug, "receipts");
    assert_eq!(second.slug, "receipts-2");
    assert_eq!(third.slug, "receipts-3");
    assert_eq!(
        second.s3_prefix,
        format!("clients/{}/documents/receipts-2/", c1.client_id)
    );
    assert_eq!(app.folder(c1.root.id).await.folder_count, 5);
    assert_eq!(app.store.copy_count(), 0);
    app.assert_consistent(c1.client_id).await;
}

#[tokio::test]
async fn test_create_folder_rejects_bad_parents_and_names() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;

    let err = app
        .service
        .create_folder(&app.admin, c1.years.id, "misc")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperation);

    let err = app
        .service
        .create_folder(&app.admin, c1.root.id, "misc")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperation);

    let err = app
        .service
        .create_folder(&app.admin, c1.documents.id, "   ")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_duplicate_year_is_conflict() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;

    let y2024 = app
        .service
        .add_year_folder(&c1.ctx, c1.client_id, "2024")
        .await
        .unwrap();
    assert_eq!(y2024.folder_type, FolderType::Year);
    assert_eq!(
        y2024.s3_prefix,
        format!("clients/{}/documents/years/2024/", c1.client_id)
    );

    let err = app
        .service
        .add_year_folder(&c1.ctx, c1.client_id, "2024")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(app.folder(c1.years.id).await.folder_count, 1);

    let err = app
        .service
        .add_year_folder(&c1.ctx, c1.client_id, "24")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_rename_year_rewrites_every_key() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;
    let y2023 = app
        .service
        .add_year_folder(&app.admin, c1.client_id, "2023")
        .await
        .unwrap();
    let invoice = app.upload(y2023.id, "invoice.pdf", 120).await;
    let q1 = app.mkdir(y2023.id, "Q1").await;
    let receipt = app.upload(q1.id, "receipt.png", 30).await;
    let before = app.folder(y2023.id).await;

    let renamed = app
        .service
        .rename_folder(&app.admin, y2023.id, "2023-final")
        .await
        .unwrap();

    let prefix = format!("clients/{}/documents/years/2023-final/", c1.client_id);
    assert_eq!(renamed.s3_prefix, prefix);
    assert_eq!(renamed.name, "2023-final");
    assert_eq!(renamed.aggregates(), before.aggregates());
    assert_eq!(renamed.file_count, 2);
    assert_eq!(renamed.total_size, 150);

    let contents = app
        .service
        .get_folder_contents(&app.admin, y2023.id)
        .await
        .unwrap();
    let moved = &contents.files[0];
    assert_eq!(moved.s3_path, format!("{prefix}{}", invoice.file_name));
    assert_eq!(moved.file_name, invoice.file_name);
    assert_eq!(contents.folders[0].s3_prefix, format!("{prefix}q1/"));

    assert!(!app.store.contains(&invoice.s3_path));
    assert!(!app.store.contains(&receipt.s3_path));
    assert!(app.store.contains(&format!("{prefix}{}", invoice.file_name)));
    assert!(app.store.contains(&format!("{prefix}q1/{}", receipt.file_name)));
    assert!(app.audit.names().contains(&"folder.renamed"));
    app.assert_consistent(c1.client_id).await;
}

#[tokio::test]
async fn test_rename_display_only_keeps_keys() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;
    let tax = app.mkdir(c1.documents.id, "Tax").await;
    let file = app.upload(tax.id, "return.pdf", 10).await;

    let renamed = app
        .service
        .rename_folder(&app.admin, tax.id, "TAX")
        .await
        .unwrap();

    assert_eq!(renamed.name, "TAX");
    assert_eq!(renamed.s3_prefix, tax.s3_prefix);
    assert!(app.store.contains(&file.s3_path));
    assert_eq!(app.store.copy_count(), 0);
}

#[tokio::test]
async fn test_rename_collision_is_conflict() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;
    app.mkdir(c1.documents.id, "Invoices").await;
    let other = app.mkdir(c1.documents.id, "Other").await;

    let err = app
        .service
        .rename_folder(&app.admin, other.id, "invoices")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(app.folder(other.id).await.name, "Other");
}

#[tokio::test]
async fn test_move_year_across_siblings() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;
    let y2023 = app
        .service
        .add_year_folder(&app.admin, c1.client_id, "2023")
        .await
        .unwrap();
    let q1 = app.mkdir(y2023.id, "Q1").await;
    let file = app.upload(q1.id, "ledger.xlsx", 64).await;
    let archive = app.mkdir(c1.documents.id, "Archive").await;
    let years_before = app.folder(c1.years.id).await;
    let docs_before = app.folder(c1.documents.id).await;

    let moved = app
        .service
        .move_folder(&app.admin, y2023.id, archive.id)
        .await
        .unwrap();

    let prefix = format!("clients/{}/documents/archive/2023/", c1.client_id);
    assert_eq!(moved.parent_id, Some(archive.id));
    assert_eq!(moved.s3_prefix, prefix);

    let subtree = Aggregates {
        folders: 2,
        files: 1,
        bytes: 64,
    };
    assert_eq!(
        app.folder(c1.years.id).await.aggregates(),
        years_before.aggregates() + -subtree
    );
    assert_eq!(app.folder(archive.id).await.aggregates(), subtree);
    assert_eq!(
        app.folder(c1.documents.id).await.aggregates(),
        docs_before.aggregates()
    );

    let new_key = format!("{prefix}q1/{}", file.file_name);
    assert!(app.store.contains(&new_key));
    assert!(!app.store.contains(&file.s3_path));
    app.assert_consistent(c1.client_id).await;
}

#[tokio::test]
async fn test_move_into_own_subtree_is_rejected() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;
    let a = app.mkdir(c1.documents.id, "A").await;
    let b = app.mkdir(a.id, "B").await;
    let c = app.mkdir(b.id, "C").await;

    for target in [a.id, b.id, c.id] {
        let err = app
            .service
            .move_folder(&app.admin, a.id, target)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOperation);
    }
    assert_eq!(app.folder(a.id).await.parent_id, Some(c1.documents.id));
    app.assert_consistent(c1.client_id).await;
}

#[tokio::test]
async fn test_move_checks_taxonomy_and_collisions() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;
    let y2023 = app
        .service
        .add_year_folder(&app.admin, c1.client_id, "2023")
        .await
        .unwrap();
    let y2024 = app
        .service
        .add_year_folder(&app.admin, c1.client_id, "2024")
        .await
        .unwrap();
    let q1_2023 = app.mkdir(y2023.id, "Q1").await;
    app.mkdir(y2024.id, "Q1").await;

    let err = app
        .service
        .move_folder(&app.admin, q1_2023.id, c1.years.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperation);

    let err = app
        .service
        .move_folder(&app.admin, q1_2023.id, y2024.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let same = app
        .service
        .move_folder(&app.admin, q1_2023.id, y2023.id)
        .await
        .unwrap();
    assert_eq!(same.s3_prefix, q1_2023.s3_prefix);
}

#[tokio::test]
async fn test_structural_folders_are_fixed() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;
    let other = app.mkdir(c1.documents.id, "Other").await;

    for folder in [&c1.root, &c1.documents, &c1.years] {
        let err = app
            .service
            .delete_folder(&app.admin, folder.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOperation);

        let err = app
            .service
            .rename_folder(&app.admin, folder.id, "renamed")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOperation);

        let err = app
            .service
            .move_folder(&app.admin, folder.id, other.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOperation);
    }
    app.assert_consistent(c1.client_id).await;
}

#[tokio::test]
async fn test_delete_folder_removes_subtree() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;
    let old = app.mkdir(c1.documents.id, "Old").await;
    let nested = app.mkdir(old.id, "Nested").await;
    let a = app.upload(old.id, "a.txt", 5).await;
    let b = app.upload(nested.id, "b.txt", 7).await;
    let keep = app.upload(c1.documents.id, "keep.txt", 3).await;
    app.store.fail_delete(b.s3_path.clone());

    let removed = app
        .service
        .delete_folder(&app.admin, old.id)
        .await
        .unwrap();

    assert_eq!(
        removed,
        Aggregates {
            folders: 2,
            files: 2,
            bytes: 12
        }
    );
    assert!(!app.store.contains(&a.s3_path));
    // Object cleanup is best-effort; the failed delete leaves an orphan.
    assert!(app.store.contains(&b.s3_path));
    assert!(app.store.contains(&keep.s3_path));

    let root = app.folder(c1.root.id).await;
    assert_eq!(root.folder_count, 2);
    assert_eq!(root.file_count, 1);
    assert_eq!(root.total_size, 3);
    let err = app
        .service
        .get_folder_contents(&app.admin, nested.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    app.assert_consistent(c1.client_id).await;
}

#[tokio::test]
async fn test_workspace_tree_and_breadcrumbs() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;
    let y2023 = app
        .service
        .add_year_folder(&app.admin, c1.client_id, "2023")
        .await
        .unwrap();
    let q1 = app.mkdir(y2023.id, "Q1").await;
    app.upload(q1.id, "b.pdf", 1).await;
    app.upload(q1.id, "a.pdf", 1).await;

    let tree = app
        .service
        .get_client_workspace(&c1.ctx, c1.client_id)
        .await
        .unwrap();
    assert_eq!(tree.node_count(), 5);
    let node = tree.find(q1.id).unwrap();
    let names: Vec<&str> = node.files.iter().map(|f| f.original_name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.pdf"]);

    let contents = app
        .service
        .get_folder_contents(&c1.ctx, q1.id)
        .await
        .unwrap();
    let trail: Vec<FolderType> = contents.breadcrumbs.iter().map(|b| b.folder_type).collect();
    assert_eq!(
        trail,
        vec![
            FolderType::Root,
            FolderType::Documents,
            FolderType::Years,
            FolderType::Year,
            FolderType::Folder
        ]
    );

    let dto = app
        .facade
        .get_client_workspace(&c1.ctx, c1.client_id)
        .await
        .unwrap();
    assert_eq!(dto.folder.file_count, 2);
    assert_eq!(dto.children.len(), 1);
}
