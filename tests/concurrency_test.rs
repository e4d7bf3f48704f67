//! Concurrency tests for pdfshelf.
//!
//! These tests verify that simultaneous uploads and deletions leave the
//! binary store and the metadata store consistent with each other.

use std::collections::HashSet;
use std::sync::Arc;

use tempfile::TempDir;

use pdfshelf::{
    BinaryStore, Database, FileRepository, FileService, FileStorage, ShelfError, UploadRequest,
};

/// File-backed setup so several pool connections are in play.
async fn setup() -> (TempDir, Database, Arc<FileStorage>, FileService) {
    let dir = TempDir::new().unwrap();
    let db = Database::open(dir.path().join("shelf.db")).await.unwrap();
    let storage = Arc::new(FileStorage::new(dir.path().join("uploads")).unwrap());
    let service = FileService::new(
        storage.clone(),
        Arc::new(FileRepository::new(db.pool().clone())),
        1024 * 1024,
    );
    (dir, db, storage, service)
}

fn pdf_upload(name: &str) -> UploadRequest {
    UploadRequest::new(b"%PDF-1.7\nconcurrent".to_vec(), name).with_mime("application/pdf")
}

/// Test concurrent uploads with the same filename.
///
/// Every upload must get its own record and its own binary.
#[tokio::test]
async fn test_concurrent_same_name_uploads() {
    let (_dir, db, storage, service) = setup().await;

    const NUM_UPLOADS: usize = 10;

    let mut handles = Vec::new();
    for _ in 0..NUM_UPLOADS {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.upload(pdf_upload("same.pdf")).await
        }));
    }

    let mut records = Vec::new();
    for handle in handles {
        records.push(handle.await.unwrap().unwrap());
    }

    let ids: HashSet<i64> = records.iter().map(|r| r.id).collect();
    let keys: HashSet<String> = records.iter().map(|r| r.storage_key.clone()).collect();
    assert_eq!(ids.len(), NUM_UPLOADS);
    assert_eq!(keys.len(), NUM_UPLOADS);

    let listed = service.list_files().await.unwrap();
    assert_eq!(listed.len(), NUM_UPLOADS);

    let stored: HashSet<String> = storage.list_keys().await.unwrap().into_iter().collect();
    assert_eq!(stored, keys);

    db.close().await;
}

/// Test concurrent deletion of the same file.
///
/// Exactly one request succeeds; the rest see the file as already gone.
#[tokio::test]
async fn test_concurrent_delete_same_file() {
    let (_dir, db, storage, service) = setup().await;
    let record = service.upload(pdf_upload("target.pdf")).await.unwrap();

    const NUM_DELETES: usize = 5;

    let mut handles = Vec::new();
    for _ in 0..NUM_DELETES {
        let service = service.clone();
        let id = record.id;
        handles.push(tokio::spawn(async move { service.delete_file(id).await }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(deleted) => {
                assert_eq!(deleted.id, record.id);
                succeeded += 1;
            }
            Err(ShelfError::NotFound(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(succeeded, 1);
    assert!(service.list_files().await.unwrap().is_empty());
    assert!(storage.list_keys().await.unwrap().is_empty());

    db.close().await;
}

/// Test uploads and deletes of unrelated files interleaving.
#[tokio::test]
async fn test_concurrent_upload_and_delete() {
    let (_dir, db, storage, service) = setup().await;

    let mut existing = Vec::new();
    for i in 0..5 {
        existing.push(service.upload(pdf_upload(&format!("old-{i}.pdf"))).await.unwrap());
    }

    let mut uploads = Vec::new();
    for i in 0..5 {
        let service = service.clone();
        uploads.push(tokio::spawn(async move {
            service.upload(pdf_upload(&format!("new-{i}.pdf"))).await
        }));
    }
    let mut deletes = Vec::new();
    for record in &existing {
        let service = service.clone();
        let id = record.id;
        deletes.push(tokio::spawn(async move { service.delete_file(id).await }));
    }

    let mut new_keys = HashSet::new();
    for handle in uploads {
        new_keys.insert(handle.await.unwrap().unwrap().storage_key);
    }
    for handle in deletes {
        handle.await.unwrap().unwrap();
    }

    let listed: HashSet<String> = service
        .list_files()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.storage_key)
        .collect();
    let stored: HashSet<String> = storage.list_keys().await.unwrap().into_iter().collect();

    assert_eq!(listed, new_keys);
    assert_eq!(stored, new_keys);

    db.close().await;
}
