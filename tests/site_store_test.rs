//! Tests for listing and removing mirrored sites

use assert_fs::TempDir;
use assert_fs::prelude::*;
use kodegen_tools_sitemirror::{list_mirrored_sites, remove_mirrored_site};

#[tokio::test]
async fn test_lists_host_directories_sorted_with_sizes() {
    let root = TempDir::new().unwrap();
    root.child("example.com/index.html").write_str("<html></html>").unwrap();
    root.child("example.com/css/site.css").write_str("body{}").unwrap();
    root.child("api.example.com:8080/about").write_str("abc").unwrap();
    // Stray files at the root are not sites
    root.child("notes.txt").write_str("ignored").unwrap();

    let sites = list_mirrored_sites(root.path()).await.unwrap();

    let names: Vec<_> = sites.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["api.example.com:8080", "example.com"]);
    assert_eq!(sites[0].size, 3);
    assert_eq!(sites[1].size, ("<html></html>".len() + "body{}".len()) as u64);
    assert_eq!(sites[1].path, root.path().join("example.com"));
    assert!(sites.iter().all(|s| s.modified.is_some()));
}

#[tokio::test]
async fn test_missing_root_is_empty() {
    let root = TempDir::new().unwrap();
    let sites = list_mirrored_sites(&root.path().join("never-created"))
        .await
        .unwrap();
    assert!(sites.is_empty());
}

#[tokio::test]
async fn test_remove_site_deletes_directory() {
    let root = TempDir::new().unwrap();
    root.child("example.com/index.html").write_str("x").unwrap();
    root.child("other.org/index.html").write_str("y").unwrap();

    assert!(remove_mirrored_site(root.path(), "example.com").await.unwrap());
    assert!(!root.child("example.com").path().exists());
    assert!(root.child("other.org").path().exists());

    // Second removal finds nothing
    assert!(!remove_mirrored_site(root.path(), "example.com").await.unwrap());
}

#[tokio::test]
async fn test_remove_rejects_paths_outside_root() {
    let root = TempDir::new().unwrap();
    let mirror = root.child("mirror");
    mirror.create_dir_all().unwrap();
    root.child("keep/me.txt").write_str("precious").unwrap();

    for name in ["..", "../keep", "a/b", ""] {
        assert!(
            remove_mirrored_site(mirror.path(), name).await.is_err(),
            "{name:?} should be rejected"
        );
    }
    assert!(root.child("keep/me.txt").path().exists());
}
