use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::ForecastError;

/// Ordered set of favorite city names, persisted as a JSON array of strings.
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    cities: Vec<String>,
}

impl FavoritesStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ForecastError> {
        let path = path.into();
        let cities = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                ForecastError::Storage(format!("Failed to read favorites {}: {e}", path.display()))
            })?;
            if contents.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&contents).map_err(|e| {
                    ForecastError::Storage(format!("Failed to parse favorites {}: {e}", path.display()))
                })?
            }
        } else {
            Vec::new()
        };

        Ok(Self { path, cities })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn is_favorite(&self, city: &str) -> bool {
        self.cities.iter().any(|c| c == city)
    }

    /// Returns `true` if the city was added, `false` if already present or blank.
    pub fn add(&mut self, city: &str) -> Result<bool, ForecastError> {
        if city.trim().is_empty() || self.is_favorite(city) {
            return Ok(false);
        }

        let mut cities = self.cities.clone();
        cities.push(city.to_string());
        self.commit(cities)?;
        tracing::debug!(city, "Added favorite");
        Ok(true)
    }

    /// Returns `true` if the city was present.
    pub fn remove(&mut self, city: &str) -> Result<bool, ForecastError> {
        if !self.is_favorite(city) {
            return Ok(false);
        }

        let cities = self.cities.iter().filter(|c| *c != city).cloned().collect();
        self.commit(cities)?;
        tracing::debug!(city, "Removed favorite");
        Ok(true)
    }

    /// Flip membership and return the new state.
    pub fn toggle(&mut self, city: &str) -> Result<bool, ForecastError> {
        if self.is_favorite(city) {
            self.remove(city)?;
            Ok(false)
        } else {
            self.add(city)
        }
    }

    /// Write `cities` to disk; the in-memory list only changes once the write succeeded.
    fn commit(&mut self, cities: Vec<String>) -> Result<(), ForecastError> {
        self.persist(&cities)?;
        self.cities = cities;
        Ok(())
    }

    fn persist(&self, cities: &[String]) -> Result<(), ForecastError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ForecastError::Storage(format!(
                    "Failed to create favorites directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let json = serde_json::to_string(cities)
            .map_err(|e| ForecastError::Storage(format!("Failed to encode favorites: {e}")))?;

        fs::write(&self.path, json).map_err(|e| {
            ForecastError::Storage(format!("Failed to write favorites {}: {e}", self.path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, FavoritesStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FavoritesStore::open(dir.path().join("favorites.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn add_then_remove_restores_membership() {
        let (_dir, mut store) = temp_store();

        assert!(!store.is_favorite("Paris"));
        assert!(store.add("Paris").unwrap());
        assert!(store.is_favorite("Paris"));
        assert!(store.remove("Paris").unwrap());
        assert!(!store.is_favorite("Paris"));
    }

    #[test]
    fn adding_twice_is_idempotent() {
        let (_dir, mut store) = temp_store();

        assert!(store.add("Tokyo").unwrap());
        assert!(!store.add("Tokyo").unwrap());
        assert_eq!(store.cities(), ["Tokyo"]);
    }

    #[test]
    fn removing_missing_city_is_noop() {
        let (_dir, mut store) = temp_store();
        assert!(!store.remove("Nowhere").unwrap());
        assert!(!store.path().exists());
    }

    #[test]
    fn blank_names_are_ignored() {
        let (_dir, mut store) = temp_store();
        assert!(!store.add("  ").unwrap());
        assert!(store.cities().is_empty());
    }

    #[test]
    fn favorites_survive_reopen_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("favorites.json");

        let mut store = FavoritesStore::open(&path).unwrap();
        store.add("Rabat").unwrap();
        store.add("New York").unwrap();
        store.add("Paris").unwrap();
        store.remove("New York").unwrap();

        let reopened = FavoritesStore::open(&path).unwrap();
        assert_eq!(reopened.cities(), ["Rabat", "Paris"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"["Rabat","Paris"]"#);
    }

    #[test]
    fn toggle_flips_state() {
        let (_dir, mut store) = temp_store();
        assert!(store.toggle("Rabat").unwrap());
        assert!(!store.toggle("Rabat").unwrap());
        assert!(!store.is_favorite("Rabat"));
    }

    #[test]
    fn failed_write_leaves_membership_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let mut store = FavoritesStore::open(blocker.join("favorites.json")).unwrap();
        let err = store.add("Paris").unwrap_err();
        assert!(matches!(err, ForecastError::Storage(_)));
        assert!(!store.is_favorite("Paris"));
        assert!(store.cities().is_empty());
    }

    #[test]
    fn failed_remove_keeps_city() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        let mut store = FavoritesStore::open(&path).unwrap();
        store.add("Rabat").unwrap();

        // A directory in place of the file makes the write fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(matches!(store.remove("Rabat"), Err(ForecastError::Storage(_))));
        assert!(store.is_favorite("Rabat"));
        assert!(matches!(store.toggle("Rabat"), Err(ForecastError::Storage(_))));
        assert_eq!(store.cities(), ["Rabat"]);
    }

    #[test]
    fn corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.json");
        fs::write(&path, "{not json").unwrap();

        let err = FavoritesStore::open(&path).unwrap_err();
        assert!(matches!(err, ForecastError::Storage(_)));
    }
}
