//! Filesystem-backed evidence storage.
//!
//! Files land under `root/<case_id>/<category>/<generated name>`. The
//! generated name is `<millis>-<random suffix>` plus the original extension,
//! so repeated uploads of the same file never collide.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use uuid::Uuid;

use crate::error::StorageError;

const RANDOM_SUFFIX_LEN: usize = 10;
const MAX_EXT_LEN: usize = 10;

/// Writes evidence files under a configured root directory.
#[derive(Clone)]
pub struct EvidenceStorage {
    root: PathBuf,
}

impl EvidenceStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store a file and return its path relative to the storage root.
    pub async fn store(
        &self,
        case_id: Uuid,
        category: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let category = sanitize_component(category)?;
        let file_name = generate_file_name(original_name);

        let relative = format!("{case_id}/{category}/{file_name}");
        let full_path = self.root.join(case_id.to_string()).join(category).join(&file_name);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;

        Ok(relative)
    }

    /// Absolute path for a stored relative path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Reject path components that could escape the storage root.
fn sanitize_component(component: &str) -> Result<&str, StorageError> {
    if component.is_empty()
        || component == "."
        || component == ".."
        || component.contains(['/', '\\'])
        || component.contains('\0')
    {
        return Err(StorageError::InvalidPath(component.to_string()));
    }
    Ok(component)
}

/// `<millis>-<random>` plus the original extension when it looks sane.
fn generate_file_name(original_name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(char::from)
        .collect();

    let ext = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXT_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    match ext {
        Some(ext) => format!("{}-{}.{}", Utc::now().timestamp_millis(), suffix, ext),
        None => format!("{}-{}", Utc::now().timestamp_millis(), suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_file_under_case_and_category() {
        let dir = tempfile::tempdir().unwrap();
        let storage = EvidenceStorage::new(dir.path());
        let case_id = Uuid::new_v4();

        let relative = storage
            .store(case_id, "evidence", "receipt.png", b"fake-png")
            .await
            .unwrap();

        assert!(relative.starts_with(&format!("{case_id}/evidence/")));
        assert!(relative.ends_with(".png"));
        let stored = tokio::fs::read(storage.resolve(&relative)).await.unwrap();
        assert_eq!(stored, b"fake-png");
    }

    #[tokio::test]
    async fn rejects_traversal_in_category() {
        let dir = tempfile::tempdir().unwrap();
        let storage = EvidenceStorage::new(dir.path());

        for category in ["..", "a/b", "a\\b", ""] {
            let result = storage
                .store(Uuid::new_v4(), category, "f.txt", b"x")
                .await;
            assert!(matches!(result, Err(StorageError::InvalidPath(_))), "{category:?}");
        }
    }

    #[test]
    fn file_name_keeps_simple_extensions_only() {
        assert!(generate_file_name("shot.PNG").ends_with(".PNG"));
        assert!(!generate_file_name("noext").contains('.'));
        // Extension with a path separator is dropped, not embedded.
        assert!(!generate_file_name("weird.ex/t").contains('/'));
    }
}
