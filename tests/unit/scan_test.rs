//! Tests for the directory analyzer and the stat batcher.

use std::path::Path;

use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::TempDir;
use toolbench::scan::{DirectoryAnalyzer, EntryKind, ParallelStatBatcher, ScanOptions};

fn touch(root: &Path, rel: &str, bytes: usize) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, vec![b'x'; bytes]).unwrap();
}

fn options(max_depth: usize) -> ScanOptions {
    ScanOptions {
        max_depth,
        ..ScanOptions::default()
    }
}

// ============================================================================
// ParallelStatBatcher
// ============================================================================

#[tokio::test]
async fn test_stat_all_preserves_order_and_records_failures() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "one", 1);
    touch(dir.path(), "three", 3);

    let paths: Vec<_> = ["three", "missing", "one"]
        .iter()
        .map(|n| dir.path().join(n))
        .collect();
    let records = ParallelStatBatcher::new(2).stat_all(paths.clone()).await;

    assert_eq!(records.len(), 3);
    for (record, path) in records.iter().zip(&paths) {
        assert_eq!(record.path, path.to_string_lossy());
    }
    assert_eq!(records[0].size, 3);
    assert!(!records[1].is_ok());
    assert_eq!(records[1].size, 0);
    assert_eq!(records[2].size, 1);
}

#[tokio::test]
async fn test_stat_all_more_paths_than_width() {
    let dir = TempDir::new().unwrap();
    let paths: Vec<_> = (0..25)
        .map(|i| {
            touch(dir.path(), &format!("f{i:02}"), i);
            dir.path().join(format!("f{i:02}"))
        })
        .collect();

    let records = ParallelStatBatcher::new(10).stat_all(paths).await;
    let sizes: Vec<u64> = records.iter().map(|r| r.size).collect();
    assert_eq!(sizes, (0..25).collect::<Vec<u64>>());
}

// ============================================================================
// DirectoryAnalyzer
// ============================================================================

#[tokio::test]
async fn test_totals_and_extension_breakdown() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "a.json", 10);
    touch(dir.path(), "b.JSON", 20);
    touch(dir.path(), "c.csv", 5);
    touch(dir.path(), "nested/d.json", 1);
    touch(dir.path(), ".hidden/e.json", 1000);
    touch(dir.path(), ".dotfile", 1000);

    let summary = DirectoryAnalyzer::new(options(5)).analyze(dir.path()).await.unwrap();

    assert_eq!(summary.file_count, 4);
    assert_eq!(summary.dir_count, 1);
    assert_eq!(summary.total_size, 36);
    assert_eq!(summary.by_extension[".json"].count, 3);
    assert_eq!(summary.by_extension[".json"].size, 31);
    assert_eq!(summary.by_extension[".csv"].count, 1);
    assert_eq!(summary.by_size.small, 4);
    assert_eq!(summary.largest_files[0].size, 20);
    assert!(summary.largest_files.iter().all(|f| !f.path.contains(".hidden")));
}

#[tokio::test]
async fn test_max_depth_limits_recursion() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "root.txt", 1);
    touch(dir.path(), "a/one.txt", 1);
    touch(dir.path(), "a/b/two.txt", 1);
    touch(dir.path(), "a/b/c/three.txt", 1);

    let shallow = DirectoryAnalyzer::new(options(0)).analyze(dir.path()).await.unwrap();
    assert_eq!(shallow.file_count, 1);
    assert_eq!(shallow.dir_count, 1);

    let one = DirectoryAnalyzer::new(options(1)).analyze(dir.path()).await.unwrap();
    assert_eq!(one.file_count, 2);
    assert_eq!(one.dir_count, 2);

    let deep = DirectoryAnalyzer::new(options(10)).analyze(dir.path()).await.unwrap();
    assert_eq!(deep.file_count, 4);
    assert_eq!(deep.dir_count, 3);
}

#[cfg(unix)]
#[tokio::test]
async fn test_every_file_is_counted_or_reported() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "ok1.txt", 1);
    touch(dir.path(), "sub/ok2.txt", 2);
    std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("sub/dangling2")).unwrap();

    let summary = DirectoryAnalyzer::new(options(5)).analyze(dir.path()).await.unwrap();

    assert_eq!(summary.file_count, 2);
    assert_eq!(summary.file_error_count(), 2);
    assert_eq!(summary.file_count + summary.file_error_count(), 4);
    assert!(summary.errors.iter().all(|e| e.kind == EntryKind::File));
}

#[cfg(unix)]
#[tokio::test]
async fn test_linked_directory_counts_as_directory() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "real/x.txt", 4);
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();
    std::os::unix::fs::symlink(dir.path(), dir.path().join("real/loop")).unwrap();

    let summary = DirectoryAnalyzer::new(options(10)).analyze(dir.path()).await.unwrap();

    assert_eq!(summary.file_count, 1);
    assert_eq!(summary.dir_count, 3);
    assert_eq!(summary.total_size, 4);
    assert!(summary.errors.is_empty());
    assert!(summary.files.iter().all(|f| !f.is_dir));
    assert!(summary.subdirs.iter().any(|d| d.ends_with("link")));
}

#[cfg(unix)]
#[tokio::test]
#[serial]
async fn test_unreadable_directory_is_reported_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    touch(dir.path(), "visible.txt", 3);
    touch(dir.path(), "locked/secret.txt", 3);
    let locked = dir.path().join("locked");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can read the directory regardless of mode.
    if std::fs::read_dir(&locked).is_ok() {
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let summary = DirectoryAnalyzer::new(options(5)).analyze(dir.path()).await;
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    let summary = summary.unwrap();

    assert_eq!(summary.file_count, 1);
    assert_eq!(summary.dir_count, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].kind, EntryKind::Directory);
    assert!(summary.errors[0].path.ends_with("locked"));
}

#[tokio::test]
async fn test_root_that_is_a_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "plain.txt", 1);

    let err = DirectoryAnalyzer::new(ScanOptions::default())
        .analyze(&dir.path().join("plain.txt"))
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_include_content_samples_largest_json() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("big.json"), r#"[{"Product": "Tea"}, {"Product": "Cake"}]"#).unwrap();
    std::fs::write(dir.path().join("small.json"), "[]").unwrap();
    std::fs::write(dir.path().join("broken.json"), "{{{{{{{{{{{{").unwrap();

    let opts = ScanOptions {
        include_content: true,
        json_summary_count: 2,
        ..ScanOptions::default()
    };
    let summary = DirectoryAnalyzer::new(opts).analyze(dir.path()).await.unwrap();

    // The two largest are big.json and broken.json; the broken one is omitted.
    assert_eq!(summary.json_summaries.len(), 1);
    let (path, sample) = summary.json_summaries.iter().next().unwrap();
    assert!(path.ends_with("big.json"));
    assert_eq!(sample.record_count, 2);
}

#[tokio::test]
async fn test_summary_serializes_camel_case() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "a.txt", 1);

    let summary = DirectoryAnalyzer::new(ScanOptions::default()).analyze(dir.path()).await.unwrap();
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["fileCount"], 1);
    assert_eq!(value["bySize"]["small"], 1);
    assert!(value["processingTimeMs"].is_u64());
    assert!(value["jsonSummaries"].as_object().unwrap().is_empty());
}
