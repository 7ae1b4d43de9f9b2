//! Persistence of the last-submitted questionnaire.
//!
//! Values live in a single JSON file named after a fixed key inside the
//! state directory, and are restored the next time the client starts.

use crate::error::{StoreError, StoreResult};
use crate::models::{FormValues, QuestionnaireInput};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key the form values are stored under.
pub const FORM_KEY: &str = "ecopackFormData";

/// File-backed store for the questionnaire form.
#[derive(Debug, Clone)]
pub struct FormStore {
    path: PathBuf,
}

impl FormStore {
    /// Create a store rooted at `state_dir`.
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(format!("{}.json", FORM_KEY)),
        }
    }

    /// Default per-user state directory.
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ecopack")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the questionnaire, replacing earlier values.
    pub fn save(&self, input: &QuestionnaireInput) -> StoreResult<()> {
        let data = serde_json::to_string_pretty(&FormValues::from(*input))?;
        write_atomic(&self.path, data.as_bytes())?;
        debug!(path = %self.path.display(), "Saved form values");
        Ok(())
    }

    /// Restore saved values.
    ///
    /// A missing file means nothing was saved. A file that cannot be read
    /// or parsed is logged and treated the same way.
    pub fn load(&self) -> Option<FormValues> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read saved form values");
                return None;
            }
        };

        match serde_json::from_str::<FormValues>(&content) {
            Ok(values) => Some(values),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Error restoring form data");
                None
            }
        }
    }

    /// Forget saved values. Succeeds when nothing was saved.
    pub fn clear(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.path, e)),
        }
    }
}

/// Write through a temp file in the same directory, then rename.
fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| io_error(parent, e))?;
    tmp.write_all(data).map_err(|e| io_error(path, e))?;
    tmp.flush().map_err(|e| io_error(path, e))?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Level, ProductCategory, ShippingType};

    fn sample_input() -> QuestionnaireInput {
        QuestionnaireInput {
            product_category: ProductCategory::Cosmetics,
            fragility: Level::Medium,
            shipping_type: ShippingType::Domestic,
            sustainability_priority: Level::High,
        }
    }

    #[test]
    fn test_file_named_after_fixed_key() {
        let store = FormStore::new(Path::new("/state"));
        assert!(store.path().ends_with("ecopackFormData.json"));
    }

    #[test]
    fn test_save_then_restore() {
        let dir = tempfile::tempdir().unwrap();
        let store = FormStore::new(&dir.path().join("nested"));

        assert!(store.load().is_none());
        store.save(&sample_input()).unwrap();

        let restored = store.load().unwrap();
        assert_eq!(restored.complete().unwrap(), sample_input());
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = FormStore::new(dir.path());
        fs::write(store.path(), "{not json").unwrap();

        assert!(store.load().is_none());
    }

    #[test]
    fn test_partial_values_restore() {
        let dir = tempfile::tempdir().unwrap();
        let store = FormStore::new(dir.path());
        fs::write(store.path(), r#"{"fragility": "low"}"#).unwrap();

        let restored = store.load().unwrap();
        assert_eq!(restored.fragility, Some(Level::Low));
        assert!(restored.product_category.is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FormStore::new(dir.path());

        store.clear().unwrap();
        store.save(&sample_input()).unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());
    }
}
