use std::path::Path;

use snapvcs::*;

pub fn create_repo(dir: &Path) -> Repository {
    Repository::init(dir, OpenOptions::default()).unwrap()
}

pub fn write(dir: &Path, rel: &str, data: &[u8]) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, data).unwrap();
}

#[allow(dead_code)]
pub fn read(dir: &Path, rel: &str) -> Vec<u8> {
    std::fs::read(dir.join(rel)).unwrap()
}

#[allow(dead_code)]
pub fn object_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// Repository with `f1` = "hello" and `f2` = "world" committed once.
#[allow(dead_code)]
pub fn repo_with_commit(dir: &Path) -> (Repository, Digest) {
    let repo = create_repo(dir);
    write(dir, "f1", b"hello");
    write(dir, "f2", b"world");
    repo.add(&["f1", "f2"]).unwrap();
    let digest = repo.commit("initial").unwrap();
    (repo, digest)
}
