//! Integration tests for the publish pipeline

mod testkit;

use std::collections::BTreeSet;

use common::linked_data::{BlockEncoded, CidKind};
use common::metadata::WebAppMetadata;
use common::publish::{PublishError, PublishOptions, Publisher};
use common::storage::MemoryStore;


#[tokio::test]
async fn test_end_to_end_publish() {
    let tree = testkit::temp_tree(&[
        ("index.html", b"hello world!" as &[u8]),
        ("css/a.css", b"body{" as &[u8]),
    ]);

    let store = MemoryStore::new();
    let publisher = Publisher::new(store.clone());
    let report = publisher
        .publish(tree.path(), &PublishOptions::default())
        .await
        .unwrap();

    let manifest = &report.manifest;
    assert_eq!(manifest.kind(), "web_app");
    assert_eq!(manifest.try_files(), &["index.html".to_string()]);
    assert_eq!(manifest.paths().len(), 2);

    let index = &manifest.paths()["index.html"];
    assert_eq!(index.content_type(), "text/html");
    assert_eq!(index.size(), 12);
    assert_eq!(index.cid().kind(), CidKind::Raw);
    assert_eq!(index.cid().size(), 12);

    let css = &manifest.paths()["css/a.css"];
    assert_eq!(css.content_type(), "text/css");
    assert_eq!(css.size(), 5);

    // The published identifier is the manifest upload, re-tagged
    assert_eq!(report.manifest_cid.kind(), CidKind::MetadataWebApp);
    let stored = store.get(&report.manifest_cid).unwrap();
    assert_eq!(report.manifest_cid.size(), stored.len() as u64);
    let decoded = WebAppMetadata::decode(&stored).unwrap();
    assert_eq!(&decoded, manifest);
}

#[tokio::test]
async fn test_manifest_paths_mirror_the_tree() {
    let tree = testkit::temp_tree(&[
        ("index.html", b"x" as &[u8]),
        ("about.html", b"x" as &[u8]),
        ("css/a.css", b"x" as &[u8]),
        ("css/b.css", b"x" as &[u8]),
        ("img/logo/deep/icon.png", b"x" as &[u8]),
    ]);
    std::fs::create_dir_all(tree.path().join("drafts")).unwrap();

    let publisher = Publisher::new(MemoryStore::new());
    let report = publisher
        .publish(tree.path(), &PublishOptions::default())
        .await
        .unwrap();

    let found: BTreeSet<&str> = report.manifest.paths().keys().map(|k| k.as_str()).collect();
    let expected: BTreeSet<&str> = [
        "index.html",
        "about.html",
        "css/a.css",
        "css/b.css",
        "img/logo/deep/icon.png",
    ]
    .into_iter()
    .collect();
    assert_eq!(found, expected);

    // Keys are relative: no root prefix, no platform separators
    let root = tree.path().to_string_lossy().to_string();
    for key in report.manifest.paths().keys() {
        assert!(!key.starts_with('/'));
        assert!(!key.contains(&root));
        assert!(!key.contains('\\'));
    }
}

#[tokio::test]
async fn test_republishing_is_deterministic() {
    let files: Vec<(String, Vec<u8>)> = (0..12)
        .map(|i| (format!("page{i}.html"), format!("<p>{i}</p>").into_bytes()))
        .collect();
    let borrowed: Vec<(&str, &[u8])> = files
        .iter()
        .map(|(p, c)| (p.as_str(), c.as_slice()))
        .collect();
    let tree = testkit::temp_tree(&borrowed);

    let first = Publisher::new(MemoryStore::new())
        .publish(tree.path(), &PublishOptions::default())
        .await
        .unwrap();
    let second = Publisher::new(MemoryStore::new())
        .publish(tree.path(), &PublishOptions::default())
        .await
        .unwrap();

    assert_eq!(
        first.manifest.encode().unwrap(),
        second.manifest.encode().unwrap()
    );
    assert_eq!(first.manifest_cid, second.manifest_cid);
}

#[tokio::test]
async fn test_upload_concurrency_stays_bounded() {
    let files: Vec<(String, Vec<u8>)> = (0..40)
        .map(|i| (format!("f{i}.txt"), vec![b'x'; 8]))
        .collect();
    let borrowed: Vec<(&str, &[u8])> = files
        .iter()
        .map(|(p, c)| (p.as_str(), c.as_slice()))
        .collect();
    let tree = testkit::temp_tree(&borrowed);

    for parallelism in [1usize, 5, 10, 100] {
        let store = testkit::GaugeStore::new();
        let publisher = Publisher::new(store.clone()).with_parallelism(parallelism);
        publisher
            .publish(tree.path(), &PublishOptions::default())
            .await
            .unwrap();

        assert!(
            store.high_water() <= parallelism,
            "parallelism {} exceeded: saw {}",
            parallelism,
            store.high_water()
        );
        if parallelism == 1 {
            assert_eq!(store.high_water(), 1);
        }
    }
}

#[tokio::test]
async fn test_first_upload_failure_fails_the_run() {
    let tree = testkit::temp_tree(&[
        ("ok-1.txt", b"fine" as &[u8]),
        ("ok-2.txt", b"also fine" as &[u8]),
        ("poison.bin", b"thirteen byte" as &[u8]),
    ]);

    let store = testkit::FailingStore::new(13);
    let publisher = Publisher::new(store.clone());
    let err = publisher
        .publish(tree.path(), &PublishOptions::default())
        .await
        .unwrap_err();

    match err {
        PublishError::Upload { path, .. } => assert_eq!(path, "poison.bin"),
        other => panic!("expected upload error, got {other}"),
    }

    // No manifest was published: every stored object is one of the two
    // good files, never a decodable manifest
    assert!(store.inner().object_count() <= 2);
}

#[tokio::test]
async fn test_empty_directory_publishes_empty_manifest() {
    let tree = testkit::temp_tree(&[]);
    let publisher = Publisher::new(MemoryStore::new());
    let report = publisher
        .publish(tree.path(), &PublishOptions::default())
        .await
        .unwrap();

    assert!(report.manifest.paths().is_empty());
    assert_eq!(report.manifest_cid.kind(), CidKind::MetadataWebApp);
}

#[tokio::test]
async fn test_rejects_non_directory_root() {
    let tree = testkit::temp_tree(&[("file.txt", b"x" as &[u8])]);
    let publisher = Publisher::new(MemoryStore::new());

    let err = publisher
        .publish(&tree.path().join("file.txt"), &PublishOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::NotADirectory(_)));

    let err = publisher
        .publish(&tree.path().join("missing"), &PublishOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::NotADirectory(_)));
}
