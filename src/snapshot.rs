//! Snapshot record encoding.
//!
//! A record is the text stored for a commit: one `<path>:<digest>` line
//! per tracked file, sorted by path, each line ending in `\n`. Sorting
//! makes the encoding canonical, so identical content always yields the
//! same bytes and therefore the same commit digest.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::paths::{normalize_tracked_path, RECORD_DELIMITER};

/// One tracked file inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SnapshotEntry {
    pub path: String,
    pub digest: Digest,
}

/// The path → digest mapping captured by a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotRecord {
    entries: BTreeMap<String, Digest>,
}

impl SnapshotRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry for `path`.
    pub fn insert(&mut self, path: impl Into<String>, digest: Digest) {
        self.entries.insert(path.into(), digest);
    }

    pub fn get(&self, path: &str) -> Option<&Digest> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = SnapshotEntry> + '_ {
        self.entries.iter().map(|(path, digest)| SnapshotEntry {
            path: path.clone(),
            digest: *digest,
        })
    }

    /// Canonical text encoding.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (path, digest) in &self.entries {
            out.push_str(path);
            out.push(RECORD_DELIMITER);
            out.push_str(&digest.to_hex());
            out.push('\n');
        }
        out
    }

    /// Digest of the encoded record; this is the commit id.
    pub fn digest(&self) -> Digest {
        Digest::of(self.encode().as_bytes())
    }

    /// Parse a stored record. `object` names the record in error messages.
    ///
    /// # Errors
    /// Returns [`Error::CorruptRecord`] for a record with no entries, a blank
    /// line, a line without the delimiter, an invalid path or digest, or a
    /// path listed twice.
    pub fn decode(object: &str, text: &str) -> Result<Self> {
        let mut record = Self::new();

        for (lineno, line) in text.lines().enumerate() {
            let lineno = lineno + 1;
            if line.is_empty() {
                return Err(Error::corrupt(object, format!("line {}: blank line", lineno)));
            }
            let (path, hex) = line.rsplit_once(RECORD_DELIMITER).ok_or_else(|| {
                Error::corrupt(object, format!("line {}: missing '{}'", lineno, RECORD_DELIMITER))
            })?;

            let norm = normalize_tracked_path(path).map_err(|e| {
                Error::corrupt(object, format!("line {}: {}", lineno, e))
            })?;
            if norm != path {
                return Err(Error::corrupt(
                    object,
                    format!("line {}: path {:?} is not normalized", lineno, path),
                ));
            }

            let digest = Digest::from_hex(hex)
                .map_err(|e| Error::corrupt(object, format!("line {}: {}", lineno, e)))?;

            if record.entries.insert(norm, digest).is_some() {
                return Err(Error::corrupt(
                    object,
                    format!("line {}: duplicate path {:?}", lineno, path),
                ));
            }
        }

        if record.is_empty() {
            return Err(Error::corrupt(object, "record has no entries"));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SnapshotRecord {
        let mut r = SnapshotRecord::new();
        r.insert("b.txt", Digest::of(b"b"));
        r.insert("a.txt", Digest::of(b"a"));
        r
    }

    #[test]
    fn encode_is_sorted_line_per_entry() {
        let text = sample().encode();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("a.txt:"));
        assert!(lines[1].starts_with("b.txt:"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn insertion_order_does_not_change_digest() {
        let mut other = SnapshotRecord::new();
        other.insert("a.txt", Digest::of(b"a"));
        other.insert("b.txt", Digest::of(b"b"));
        assert_eq!(sample().digest(), other.digest());
    }

    #[test]
    fn decode_reads_back_encode() {
        let r = sample();
        let decoded = SnapshotRecord::decode("c", &r.encode()).unwrap();
        assert_eq!(decoded, r);
    }

    #[test]
    fn decode_rejects_missing_delimiter() {
        let err = SnapshotRecord::decode("c", "a.txt\n").unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { .. }));
    }

    #[test]
    fn decode_rejects_bad_digest() {
        assert!(SnapshotRecord::decode("c", "a.txt:xyz\n").is_err());
    }

    #[test]
    fn decode_rejects_blank_line_and_empty() {
        let line = format!("a.txt:{}\n", Digest::of(b"a"));
        assert!(SnapshotRecord::decode("c", &format!("{}\n{}", line, line)).is_err());
        assert!(SnapshotRecord::decode("c", "").is_err());
    }

    #[test]
    fn decode_rejects_duplicates() {
        let line = format!("a.txt:{}\n", Digest::of(b"a"));
        let err = SnapshotRecord::decode("c", &format!("{}{}", line, line)).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn decode_rejects_escaping_paths() {
        let text = format!("../evil:{}\n", Digest::of(b"x"));
        assert!(SnapshotRecord::decode("c", &text).is_err());
    }
}
