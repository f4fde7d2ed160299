//! Integration tests for client isolation.

mod helpers;

use clientvault_core::error::{AppError, ErrorKind};
use clientvault_core::types::id::{FileId, FolderId};
use clientvault_service::workspace::FileUpload;

fn assert_forbidden<T: std::fmt::Debug>(result: Result<T, AppError>) {
    assert_eq!(result.unwrap_err().kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_other_client_is_forbidden_everywhere() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;
    let c2 = app.provision("Globex").await;
    let y2023 = app
        .service
        .add_year_folder(&app.admin, c1.client_id, "2023")
        .await
        .unwrap();
    let file = app.upload(y2023.id, "secret.pdf", 5).await;
    let intruder = &c2.ctx;
    let svc = &app.service;

    assert_forbidden(svc.get_client_workspace(intruder, c1.client_id).await);
    assert_forbidden(svc.get_folder_contents(intruder, y2023.id).await);
    assert_forbidden(svc.create_folder(intruder, y2023.id, "x").await);
    assert_forbidden(svc.add_year_folder(intruder, c1.client_id, "2030").await);
    // Malformed input must not reveal anything before the access check.
    assert_forbidden(svc.add_year_folder(intruder, c1.client_id, "20x4").await);
    assert_forbidden(svc.create_folder(intruder, y2023.id, "   ").await);
    assert_forbidden(svc.rename_folder(intruder, y2023.id, "").await);
    assert_forbidden(svc.rename_folder(intruder, y2023.id, "mine").await);
    assert_forbidden(svc.move_folder(intruder, y2023.id, c1.documents.id).await);
    assert_forbidden(svc.delete_folder(intruder, y2023.id).await);
    assert_forbidden(
        svc.upload_file(intruder, y2023.id, FileUpload::new("x.txt", vec![1u8]))
            .await,
    );
    assert_forbidden(svc.rename_file(intruder, file.id, "mine.pdf").await);
    assert_forbidden(svc.move_file(intruder, file.id, c1.documents.id).await);
    assert_forbidden(svc.delete_file(intruder, file.id).await);
    assert_forbidden(svc.get_file_download_url(intruder, file.id, false).await);

    // Moving own folders into another client's tree is also refused.
    let mine = app.mkdir(c2.documents.id, "Mine").await;
    assert_forbidden(svc.move_folder(intruder, mine.id, c1.documents.id).await);

    assert_forbidden(
        app.facade
            .get_folder_contents(intruder, c1.documents.id)
            .await,
    );

    let y2023_after = app.folder(y2023.id).await;
    assert_eq!(y2023_after.name, "2023");
    assert_eq!(y2023_after.file_count, 1);
    app.assert_consistent(c1.client_id).await;
    app.assert_consistent(c2.client_id).await;
}

#[tokio::test]
async fn test_unknown_ids_are_not_found_before_forbidden() {
    let app = helpers::TestApp::new();
    let c2 = app.provision("Globex").await;

    let err = app
        .service
        .get_folder_contents(&c2.ctx, FolderId::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = app
        .service
        .delete_file(&c2.ctx, FileId::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_admin_cannot_move_between_clients() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;
    let c2 = app.provision("Globex").await;
    let folder = app.mkdir(c1.documents.id, "Shared").await;
    let file = app.upload(folder.id, "a.txt", 1).await;

    let err = app
        .service
        .move_folder(&app.admin, folder.id, c2.documents.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperation);

    let err = app
        .service
        .move_file(&app.admin, file.id, c2.documents.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperation);
}

#[tokio::test]
async fn test_maintenance_requires_admin() {
    let app = helpers::TestApp::new();
    let c1 = app.provision("Acme").await;

    assert_forbidden(
        app.service
            .verify_client_tree(&c1.ctx, c1.client_id, false)
            .await,
    );
    assert_forbidden(app.service.recompute_aggregates(&c1.ctx, c1.client_id).await);
    assert_forbidden(
        app.service
            .provision_client(&c1.ctx, c1.client_id, "Again")
            .await,
    );
}
