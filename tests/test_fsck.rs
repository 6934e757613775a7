mod common;

use snapvcs::*;

#[test]
fn clean_repository() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, _) = common::repo_with_commit(dir.path());
    let report = repo.fsck().unwrap();
    assert!(report.is_clean(), "{:?}", report.problems);
    assert_eq!(report.blobs_checked, 2);
    assert_eq!(report.commits_checked, 1);
    assert_eq!(report.log_entries_checked, 1);
}

#[test]
fn detects_tampered_blob() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, _) = common::repo_with_commit(dir.path());
    std::fs::write(repo.blobs().path_for(&Digest::of(b"hello")), b"HELLO").unwrap();

    let report = repo.fsck().unwrap();
    assert_eq!(report.problems.len(), 1);
    assert!(report.problems[0].object.starts_with("blob "));
}

#[test]
fn detects_dangling_blob_reference() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, _) = common::repo_with_commit(dir.path());
    std::fs::remove_file(repo.blobs().path_for(&Digest::of(b"world"))).unwrap();

    let report = repo.fsck().unwrap();
    assert!(!report.is_clean());
    assert!(report.problems.iter().any(|p| p.message.contains("missing blob")));
}

#[test]
fn detects_log_entry_without_commit() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, digest) = common::repo_with_commit(dir.path());
    std::fs::remove_file(repo.commits().path_for(&digest)).unwrap();

    let report = repo.fsck().unwrap();
    assert!(report.problems.iter().any(|p| p.object == "log"));
}
