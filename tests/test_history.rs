mod common;

use snapvcs::*;

#[test]
fn log_grows_one_entry_per_commit() {
    let dir = tempfile::tempdir().unwrap();
    let repo = common::create_repo(dir.path());
    let mut digests = Vec::new();

    for (i, content) in ["v1", "v2", "v3"].iter().enumerate() {
        common::write(dir.path(), "file.txt", content.as_bytes());
        repo.add(&["file.txt"]).unwrap();
        digests.push(repo.commit(&format!("commit {}", i)).unwrap());
    }

    let log = repo.log().unwrap();
    assert_eq!(log.len(), 3);
    for (i, entry) in log.iter().enumerate() {
        assert_eq!(entry.commit, digests[i]);
        assert_eq!(entry.message, format!("commit {}", i));
    }
}

#[test]
fn duplicate_commits_still_log() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, first) = common::repo_with_commit(dir.path());

    repo.add(&["f1", "f2"]).unwrap();
    let second = repo.commit("same again").unwrap();

    common::write(dir.path(), "f1", b"changed");
    repo.add(&["f1"]).unwrap();
    let third = repo.commit("changed").unwrap();

    let log = repo.log().unwrap();
    let commits: Vec<Digest> = log.iter().map(|e| e.commit).collect();
    assert_eq!(commits, vec![first, second, third]);
    assert_eq!(first, second);
    assert_eq!(log[1].message, "same again");
}

#[test]
fn log_file_format_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, digest) = common::repo_with_commit(dir.path());
    let text = std::fs::read_to_string(repo.log_path()).unwrap();
    assert_eq!(
        text,
        format!("Commit hash: {}\nCommit message: initial\n", digest)
    );
}

#[test]
fn failed_commit_does_not_log() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, _) = common::repo_with_commit(dir.path());
    let _ = repo.commit("nothing tracked");
    assert_eq!(repo.log().unwrap().len(), 1);
}
