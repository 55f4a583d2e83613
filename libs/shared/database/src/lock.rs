use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

static TABLE_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>> = OnceLock::new();

/// Process-wide write lock for the table stored at `path`.
///
/// Every store opened on the same file gets the same mutex, so a read-validate-write
/// sequence holding it cannot interleave with another one in this process.
pub fn table_lock(path: &Path) -> Arc<tokio::sync::Mutex<()>> {
    let key = lock_key(path);
    let locks = TABLE_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut locks = locks.lock().unwrap_or_else(PoisonError::into_inner);

    locks
        .entry(key)
        .or_insert_with_key(|key| {
            debug!("Creating table lock for {}", key.display());
            Arc::new(tokio::sync::Mutex::new(()))
        })
        .clone()
}

fn lock_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    // File not created yet: key on the canonical parent so both spellings agree later.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_file_shares_one_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.csv");
        let dotted = dir.path().join(".").join("schedule.csv");

        let first = table_lock(&path);
        let second = table_lock(&dotted);

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn different_files_get_different_locks() {
        let dir = tempfile::tempdir().unwrap();
        let a = table_lock(&dir.path().join("a.csv"));
        let b = table_lock(&dir.path().join("b.csv"));

        assert!(!Arc::ptr_eq(&a, &b));
    }
}
