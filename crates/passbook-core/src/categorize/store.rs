//! Persisted category state: custom categories and manual overrides.
//!
//! Both live as JSON files in one data directory. Readers take a
//! [`CategorySnapshot`]; writers hold the lock while the new file is written
//! to a temporary sibling and renamed into place.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::CategoryError;
use crate::models::category::{merge_definitions, slugify, AUTO_CATEGORY};
use crate::models::CategoryDefinition;

const CUSTOM_CATEGORIES_FILE: &str = "custom_categories.json";
const OVERRIDES_FILE: &str = "category_overrides.json";

type Result<T> = std::result::Result<T, CategoryError>;

/// Category options and overrides as of one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    /// Built-in and custom categories, built-ins first.
    pub definitions: Vec<CategoryDefinition>,
    /// Group key to category slug.
    pub overrides: BTreeMap<String, String>,
}

impl CategorySnapshot {
    pub fn is_valid(&self, slug: &str) -> bool {
        self.definitions.iter().any(|d| d.value == slug)
    }

    /// The stored override for a group, if it still names a known category.
    pub fn override_for(&self, group_key: &str) -> Option<&str> {
        self.overrides
            .get(group_key)
            .map(String::as_str)
            .filter(|slug| self.is_valid(slug))
    }

    pub fn label_map(&self) -> BTreeMap<String, String> {
        self.definitions
            .iter()
            .map(|d| (d.value.clone(), d.label.clone()))
            .collect()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    custom: Vec<CategoryDefinition>,
    overrides: BTreeMap<String, String>,
}

/// Owner of the custom category list and the override map.
#[derive(Debug)]
pub struct CategoryStore {
    builtins: Vec<CategoryDefinition>,
    dir: Option<PathBuf>,
    state: RwLock<StoreState>,
}

impl CategoryStore {
    /// Open the store in `dir`, loading whatever state is already there.
    ///
    /// Missing files mean empty state. Unreadable files are logged and
    /// treated as empty.
    pub fn open(dir: impl Into<PathBuf>, builtins: Vec<CategoryDefinition>) -> Self {
        let dir = dir.into();
        let custom: Vec<CategoryDefinition> =
            load_json::<Vec<CategoryDefinition>>(&dir.join(CUSTOM_CATEGORIES_FILE))
                .unwrap_or_default()
                .into_iter()
                .filter_map(|d| {
                    let value = d.value.trim().to_lowercase();
                    let label = d.label.trim().to_string();
                    (!value.is_empty() && !label.is_empty())
                        .then(|| CategoryDefinition::new(value, label))
                })
                .collect();
        let overrides: BTreeMap<String, String> =
            load_json(&dir.join(OVERRIDES_FILE)).unwrap_or_default();
        debug!(
            "Opened category store at {}: {} custom, {} overrides",
            dir.display(),
            custom.len(),
            overrides.len()
        );

        Self {
            builtins,
            dir: Some(dir),
            state: RwLock::new(StoreState { custom, overrides }),
        }
    }

    /// A store that never touches disk.
    pub fn in_memory(builtins: Vec<CategoryDefinition>) -> Self {
        Self {
            builtins,
            dir: None,
            state: RwLock::new(StoreState::default()),
        }
    }

    pub fn snapshot(&self) -> CategorySnapshot {
        let state = self.read();
        CategorySnapshot {
            definitions: merge_definitions(&self.builtins, &state.custom),
            overrides: state.overrides.clone(),
        }
    }

    /// Selectable categories, built-ins first.
    pub fn options(&self) -> Vec<CategoryDefinition> {
        merge_definitions(&self.builtins, &self.read().custom)
    }

    pub fn label_map(&self) -> BTreeMap<String, String> {
        self.snapshot().label_map()
    }

    /// Add a custom category from a display label.
    pub fn add_custom_category(&self, label: &str) -> Result<CategoryDefinition> {
        let label = label.trim();
        if label.is_empty() {
            return Err(CategoryError::EmptyLabel);
        }
        let slug = slugify(label);
        if slug.is_empty() {
            return Err(CategoryError::InvalidLabel);
        }

        let mut state = self.write();
        if merge_definitions(&self.builtins, &state.custom)
            .iter()
            .any(|d| d.value == slug)
        {
            return Err(CategoryError::AlreadyExists(slug));
        }

        let definition = CategoryDefinition::new(slug, label);
        let mut custom = state.custom.clone();
        custom.push(definition.clone());
        self.persist(CUSTOM_CATEGORIES_FILE, &custom)?;
        state.custom = custom;

        info!("Added category {} ({})", definition.value, definition.label);
        Ok(definition)
    }

    /// Set the manual category for a duplicate group.
    ///
    /// `None`, an empty value or `auto` clears the override.
    pub fn set_override(&self, group_key: &str, category: Option<&str>) -> Result<()> {
        if group_key.trim().is_empty() {
            return Err(CategoryError::MissingGroupKey);
        }

        let mut state = self.write();
        let mut overrides = state.overrides.clone();
        match category.map(|c| c.trim().to_lowercase()) {
            None => {
                overrides.remove(group_key);
            }
            Some(slug) if slug.is_empty() || slug == AUTO_CATEGORY => {
                overrides.remove(group_key);
            }
            Some(slug) => {
                if !merge_definitions(&self.builtins, &state.custom)
                    .iter()
                    .any(|d| d.value == slug)
                {
                    return Err(CategoryError::InvalidOverride(slug));
                }
                overrides.insert(group_key.to_string(), slug);
            }
        }

        self.persist(OVERRIDES_FILE, &overrides)?;
        state.overrides = overrides;
        debug!("Override for {} set to {:?}", group_key, category);
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        write_json_atomic(&dir.join(file), value).map_err(|e| CategoryError::Persist(e.to_string()))
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unreadable {}: {}", path.display(), e);
            None
        }
    }
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let temp_file = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(&temp_file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::builtin_categories;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_add_custom_category() {
        let store = CategoryStore::in_memory(builtin_categories());
        let added = store.add_custom_category("  Travel & Stay ").unwrap();
        assert_eq!(added, CategoryDefinition::new("travel_stay", "Travel & Stay"));
        assert_eq!(store.options().last(), Some(&added));
        assert_eq!(store.label_map()["travel_stay"], "Travel & Stay");
    }

    #[test]
    fn test_add_custom_category_errors() {
        let store = CategoryStore::in_memory(builtin_categories());
        assert!(matches!(store.add_custom_category("   "), Err(CategoryError::EmptyLabel)));
        assert!(matches!(store.add_custom_category("!!"), Err(CategoryError::InvalidLabel)));
        assert!(matches!(
            store.add_custom_category("Fuel"),
            Err(CategoryError::AlreadyExists(slug)) if slug == "fuel"
        ));
    }

    #[test]
    fn test_overrides() {
        let store = CategoryStore::in_memory(builtin_categories());
        store.set_override("2024-02-01:250.00", Some(" Fuel ")).unwrap();
        assert_eq!(store.snapshot().override_for("2024-02-01:250.00"), Some("fuel"));

        store.set_override("2024-02-01:250.00", Some("auto")).unwrap();
        assert!(store.snapshot().overrides.is_empty());

        store.set_override("2024-02-01:250.00", Some("fuel")).unwrap();
        store.set_override("2024-02-01:250.00", None).unwrap();
        assert!(store.snapshot().overrides.is_empty());
    }

    #[test]
    fn test_override_errors() {
        let store = CategoryStore::in_memory(builtin_categories());
        assert!(matches!(store.set_override("", Some("fuel")), Err(CategoryError::MissingGroupKey)));
        let err = store.set_override("k", Some("travel")).unwrap_err();
        assert_eq!(err.to_string(), "invalid category: travel");
        assert!(store.snapshot().overrides.is_empty());
    }

    #[test]
    fn test_stale_override_is_ignored() {
        let mut snapshot = CategorySnapshot {
            definitions: builtin_categories(),
            ..Default::default()
        };
        snapshot.overrides.insert("k".to_string(), "deleted_category".to_string());
        assert_eq!(snapshot.override_for("k"), None);
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = CategoryStore::open(dir.path(), builtin_categories());
            store.add_custom_category("Pets").unwrap();
            store.set_override("2024-03-01:99.00", Some("pets")).unwrap();
        }

        let store = CategoryStore::open(dir.path(), builtin_categories());
        let snapshot = store.snapshot();
        assert!(snapshot.is_valid("pets"));
        assert_eq!(snapshot.override_for("2024-03-01:99.00"), Some("pets"));

        let on_disk = fs::read_to_string(dir.path().join(OVERRIDES_FILE)).unwrap();
        assert!(on_disk.contains("\"2024-03-01:99.00\": \"pets\""));
    }

    #[test]
    fn test_corrupt_files_load_as_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(OVERRIDES_FILE), "not json").unwrap();
        fs::write(
            dir.path().join(CUSTOM_CATEGORIES_FILE),
            r#"[{"value": " Gym ", "label": "Gym"}, {"value": "", "label": "Empty"}]"#,
        )
        .unwrap();

        let snapshot = CategoryStore::open(dir.path(), builtin_categories()).snapshot();
        assert!(snapshot.overrides.is_empty());
        assert_eq!(snapshot.definitions.last(), Some(&CategoryDefinition::new("gym", "Gym")));
    }
}
