use folio_storage::{ArchiveAdapter, StorageBackend, StorageError};
use folio_types::FileContent;

#[tokio::test]
async fn write_read_roundtrip_in_memory() {
    let mut backend = StorageBackend::Archive(ArchiveAdapter::new());

    backend
        .write_file("manifest.json", &FileContent::Text("{}".into()))
        .await
        .unwrap();

    match backend.read_file("manifest.json").await.unwrap() {
        FileContent::Text(s) => assert_eq!(s, "{}"),
        other => panic!("expected text, got {other:?}"),
    }
}

#[tokio::test]
async fn zip_encode_decode_roundtrip() {
    let mut backend = StorageBackend::Archive(ArchiveAdapter::new());

    backend
        .write_file("projects/p1/files/main.tex", &FileContent::Text("\\doc".into()))
        .await
        .unwrap();
    backend
        .write_file(
            "projects/p1/files/fig.png",
            &FileContent::Binary(vec![1, 2, 3, 4]),
        )
        .await
        .unwrap();

    let StorageBackend::Archive(adapter) = backend else {
        unreachable!()
    };
    let bytes = adapter.into_zip_bytes().unwrap();

    let reopened = ArchiveAdapter::from_zip_bytes(&bytes).unwrap();
    assert_eq!(reopened.entry_count(), 2);
    let backend = StorageBackend::Archive(reopened);

    match backend
        .read_file("projects/p1/files/main.tex")
        .await
        .unwrap()
    {
        FileContent::Text(s) => assert_eq!(s, "\\doc"),
        other => panic!("expected text, got {other:?}"),
    }
    match backend
        .read_file("projects/p1/files/fig.png")
        .await
        .unwrap()
    {
        FileContent::Binary(b) => assert_eq!(b, vec![1, 2, 3, 4]),
        other => panic!("expected binary, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_utf8_under_text_extension_reads_back_as_binary() {
    let mut backend = StorageBackend::Archive(ArchiveAdapter::new());
    let bytes = vec![0xff, 0xfe, b'a'];
    backend
        .write_file(
            "projects/p1/files/latin1.txt",
            &FileContent::Binary(bytes.clone()),
        )
        .await
        .unwrap();

    match backend
        .read_file("projects/p1/files/latin1.txt")
        .await
        .unwrap()
    {
        FileContent::Binary(b) => assert_eq!(b, bytes),
        other => panic!("expected binary, got {other:?}"),
    }
}

#[tokio::test]
async fn directory_exists_by_prefix() {
    let mut backend = StorageBackend::Archive(ArchiveAdapter::new());
    backend
        .write_file("projects/p1/metadata.json", &FileContent::Text("{}".into()))
        .await
        .unwrap();

    // No explicit directory entries, but the prefix makes these "exist"
    assert!(backend.exists("projects").await.unwrap());
    assert!(backend.exists("projects/p1").await.unwrap());
    assert!(!backend.exists("projects/p2").await.unwrap());
}

#[tokio::test]
async fn created_empty_directory_exists() {
    let mut backend = StorageBackend::Archive(ArchiveAdapter::new());
    backend.create_directory("empty/dir").await.unwrap();
    assert!(backend.exists("empty/dir").await.unwrap());
    assert!(backend.exists("empty").await.unwrap());
}

#[tokio::test]
async fn read_missing_entry_is_not_found() {
    let backend = StorageBackend::Archive(ArchiveAdapter::new());
    let result = backend.read_file("absent.json").await;
    assert!(matches!(result, Err(StorageError::NotFound(_))));
}

#[tokio::test]
async fn list_directory_immediate_children() {
    let mut backend = StorageBackend::Archive(ArchiveAdapter::new());
    backend
        .write_file("projects/p1/metadata.json", &FileContent::Text("{}".into()))
        .await
        .unwrap();
    backend
        .write_file("projects/p1/files/a.txt", &FileContent::Text("a".into()))
        .await
        .unwrap();
    backend
        .write_file("projects/p2/metadata.json", &FileContent::Text("{}".into()))
        .await
        .unwrap();

    let projects = backend.list_directory("projects").await.unwrap();
    assert_eq!(projects, vec!["p1".to_string(), "p2".to_string()]);

    let p1 = backend.list_directory("projects/p1").await.unwrap();
    assert_eq!(p1, vec!["files".to_string(), "metadata.json".to_string()]);
}

#[tokio::test]
async fn overwrite_replaces_entry() {
    let mut backend = StorageBackend::Archive(ArchiveAdapter::new());
    backend
        .write_file("a.txt", &FileContent::Text("one".into()))
        .await
        .unwrap();
    backend
        .write_file("a.txt", &FileContent::Text("two".into()))
        .await
        .unwrap();

    match backend.read_file("a.txt").await.unwrap() {
        FileContent::Text(s) => assert_eq!(s, "two"),
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn corrupt_zip_is_archive_error() {
    let result = ArchiveAdapter::from_zip_bytes(b"definitely not a zip");
    assert!(matches!(result, Err(StorageError::Archive(_))));
}
