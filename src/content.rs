// src/content.rs
//! Content directory writer: collision-free names, atomic writes.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::PersistenceError;
use crate::synth::types::SynthesizedPost;

const MAX_SUFFIX: u32 = 1000;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct ContentDir {
    root: PathBuf,
}

impl ContentDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Names to try for `filename`, in order: the name itself, then `-2`,
    /// `-3`, … inserted before the extension.
    fn candidates<'a>(&'a self, filename: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        let (stem, ext) = match filename.rsplit_once('.') {
            Some((s, e)) => (s, format!(".{e}")),
            None => (filename, String::new()),
        };
        std::iter::once(self.root.join(filename)).chain(
            (2..=MAX_SUFFIX).map(move |n| self.root.join(format!("{stem}-{n}{ext}"))),
        )
    }

    /// Render the post and store it under the first free name.
    ///
    /// The content is written and synced to a hidden temp file first, then
    /// hard-linked to its final name. Linking fails if the name exists, so an
    /// existing post is never overwritten, even when another writer claims
    /// the same name concurrently, and readers never see a partial file.
    pub fn write_post(&self, post: &SynthesizedPost) -> Result<PathBuf, PersistenceError> {
        fs::create_dir_all(&self.root).map_err(|source| PersistenceError::CreateDir {
            path: self.root.clone(),
            source,
        })?;

        let content = post.post.to_markdown();
        let tmp = self.root.join(format!(
            ".{}.{}-{}.tmp",
            post.filename,
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        write_synced(&tmp, content.as_bytes())?;

        let claimed = self.claim(&tmp, &post.filename);
        let _ = fs::remove_file(&tmp);
        let path = claimed?;

        tracing::info!(
            target: "content",
            path = %path.display(),
            bytes = content.len(),
            "post written"
        );
        Ok(path)
    }

    fn claim(&self, tmp: &Path, filename: &str) -> Result<PathBuf, PersistenceError> {
        for (attempt, candidate) in self.candidates(filename).enumerate() {
            match fs::hard_link(tmp, &candidate) {
                Ok(()) => {
                    if attempt > 0 {
                        tracing::info!(
                            target: "content",
                            wanted = filename,
                            path = %candidate.display(),
                            "filename taken, using numbered suffix"
                        );
                    }
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    return Err(PersistenceError::Write {
                        path: candidate,
                        source,
                    })
                }
            }
        }
        Err(PersistenceError::Exhausted {
            path: self.root.join(filename),
        })
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let res = (|| -> std::io::Result<()> {
        let mut f = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        f.write_all(bytes)?;
        f.sync_all()
    })();
    res.map_err(|source| {
        let _ = fs::remove_file(path);
        PersistenceError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(filename: &str, body: &str) -> SynthesizedPost {
        SynthesizedPost {
            post: crate::synth::types::GeneratedPost {
                title: "t".into(),
                date: chrono::NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
                excerpt: "e".into(),
                tags: vec![],
                featured: false,
                body: body.into(),
            },
            filename: filename.into(),
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn suffix_goes_before_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentDir::new(dir.path());
        fs::write(dir.path().join("2026-02-01-a.md"), "x").unwrap();
        fs::write(dir.path().join("2026-02-01-a-2.md"), "x").unwrap();
        let p = store.write_post(&post("2026-02-01-a.md", "new")).unwrap();
        assert_eq!(p, dir.path().join("2026-02-01-a-3.md"));
        assert_eq!(fs::read_to_string(dir.path().join("2026-02-01-a.md")).unwrap(), "x");
        assert_eq!(fs::read_to_string(dir.path().join("2026-02-01-a-2.md")).unwrap(), "x");
        // No temp files left behind.
        assert_eq!(
            entries(dir.path()),
            vec!["2026-02-01-a-2.md", "2026-02-01-a-3.md", "2026-02-01-a.md"]
        );
    }

    #[test]
    fn concurrent_writers_never_share_a_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        fs::write(root.join("2026-02-01-a.md"), "original").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let root = root.clone();
                std::thread::spawn(move || {
                    ContentDir::new(root)
                        .write_post(&post("2026-02-01-a.md", &format!("writer {i}")))
                        .unwrap()
                })
            })
            .collect();
        let mut paths: Vec<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 8);

        assert_eq!(fs::read_to_string(root.join("2026-02-01-a.md")).unwrap(), "original");
        let mut bodies: Vec<String> = paths
            .iter()
            .map(|p| {
                let text = fs::read_to_string(p).unwrap();
                text.lines().last().unwrap().to_string()
            })
            .collect();
        bodies.sort();
        let mut expected: Vec<String> = (0..8).map(|i| format!("writer {i}")).collect();
        expected.sort();
        assert_eq!(bodies, expected);
        assert_eq!(entries(&root).len(), 9);
    }

    #[test]
    fn exhausted_suffixes_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentDir::new(dir.path());
        fs::write(dir.path().join("x.md"), "x").unwrap();
        for n in 2..=MAX_SUFFIX {
            fs::write(dir.path().join(format!("x-{n}.md")), "x").unwrap();
        }
        let err = store.write_post(&post("x.md", "b")).unwrap_err();
        assert!(matches!(err, PersistenceError::Exhausted { .. }));
        assert_eq!(err.path(), dir.path().join("x.md").as_path());
        assert_eq!(entries(dir.path()).len(), MAX_SUFFIX as usize);
    }

    #[test]
    fn write_failure_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the directory should be.
        let blocker = dir.path().join("blog");
        fs::write(&blocker, "not a dir").unwrap();
        let store = ContentDir::new(&blocker);
        let err = store.write_post(&post("2026-01-01-t.md", "b")).unwrap_err();
        assert_eq!(err.path(), blocker.as_path());
    }
}
