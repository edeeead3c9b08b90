//! Run-scoped artifact addressing.
//!
//! Every composer stage writes its tier file at `{root}/{run_id}/{name}.json`,
//! where `root` differs per tier (bronze/silver/gold) while `run_id` and
//! `name` are shared across the whole pipeline execution. Re-running a stage
//! under the same run id overwrites the same path instead of creating a
//! second artifact, and any tier's output is discoverable from the run id and
//! tier root alone.

use crate::error::{FortellError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Addressing scope for one tier of one pipeline execution.
#[derive(Debug, Clone)]
pub struct RunScope {
    root: PathBuf,
    run_id: String,
}

impl RunScope {
    /// Create a scope for `{root}/{run_id}`. Fails fast if the run id is not
    /// filesystem-safe.
    pub fn new(root: impl Into<PathBuf>, run_id: &str) -> Result<Self> {
        validate_name(run_id)?;
        Ok(Self {
            root: root.into(),
            run_id: run_id.to_string(),
        })
    }

    /// The run id this scope addresses.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The run directory (`{root}/{run_id}`).
    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.run_id)
    }

    /// Path of the tier file for a place: `{root}/{run_id}/{name}.json`.
    /// Fails fast if `name` would escape the run directory.
    pub fn place_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir().join(format!("{}.json", name)))
    }

    /// Path of a sibling artifact (audio/subtitle file) inside the run
    /// directory.
    pub fn artifact_path(&self, file_name: &str) -> Result<PathBuf> {
        validate_name(file_name)?;
        Ok(self.dir().join(file_name))
    }

    /// Create the run directory if it does not exist yet. Idempotent.
    pub fn ensure_dir(&self) -> Result<PathBuf> {
        let dir = self.dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Serialize a fully constructed tier object and write it to
    /// `{root}/{run_id}/{name}.json`, overwriting any previous run output.
    ///
    /// The object is serialized to a string first so the file is either
    /// written whole or not at all.
    pub fn write_place<T: Serialize>(&self, name: &str, data: &T) -> Result<PathBuf> {
        let path = self.place_path(name)?;
        self.ensure_dir()?;

        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&path, json)?;

        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Read a tier file back into the requested tier type.
    pub fn read_place<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.place_path(name)?;
        read_tier(&path)
    }
}

/// Read a tier file at an explicit path.
pub fn read_tier<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        FortellError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Reject names that could address outside the run directory.
fn validate_name(name: &str) -> Result<()> {
    let safe = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains("..")
        && !name.chars().any(|c| c.is_control());

    if safe {
        Ok(())
    } else {
        Err(FortellError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        value: u32,
    }

    #[test]
    fn test_place_path_layout() {
        let scope = RunScope::new("/data/bronze", "run-1").unwrap();
        let path = scope.place_path("Bach Dinh").unwrap();
        assert_eq!(path, PathBuf::from("/data/bronze/run-1/Bach Dinh.json"));
    }

    #[test]
    fn test_unsafe_names_rejected() {
        let scope = RunScope::new("/data/bronze", "run-1").unwrap();
        for bad in ["../escape", "a/b", "a\\b", "", "..", "nul\0byte"] {
            assert!(
                matches!(scope.place_path(bad), Err(FortellError::InvalidName(_))),
                "expected rejection for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_unsafe_run_id_rejected() {
        assert!(RunScope::new("/data/bronze", "runs/../other").is_err());
    }

    #[test]
    fn test_write_is_idempotent_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let scope = RunScope::new(tmp.path(), "run-1").unwrap();

        let first = scope.write_place("place", &Doc { value: 1 }).unwrap();
        let second = scope.write_place("place", &Doc { value: 2 }).unwrap();
        assert_eq!(first, second);

        let read: Doc = scope.read_place("place").unwrap();
        assert_eq!(read, Doc { value: 2 });

        // Exactly one artifact in the run directory.
        let entries = std::fs::read_dir(scope.dir()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_distinct_names_do_not_collide() {
        let tmp = tempfile::tempdir().unwrap();
        let scope = RunScope::new(tmp.path(), "run-1").unwrap();

        scope.write_place("a", &Doc { value: 1 }).unwrap();
        scope.write_place("b", &Doc { value: 2 }).unwrap();

        assert_eq!(scope.read_place::<Doc>("a").unwrap().value, 1);
        assert_eq!(scope.read_place::<Doc>("b").unwrap().value, 2);
    }

    #[test]
    fn test_ensure_dir_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let scope = RunScope::new(tmp.path(), "run-1").unwrap();
        let a = scope.ensure_dir().unwrap();
        let b = scope.ensure_dir().unwrap();
        assert_eq!(a, b);
        assert!(a.is_dir());
    }
}
