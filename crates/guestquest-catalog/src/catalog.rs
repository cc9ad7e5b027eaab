//! The in-memory catalog and its JSON loader.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::{Attributes, CatalogError, Character, CharacterSet};

/// Sets compiled into the binary so a server always has something to
/// play with, even without a characters directory.
const BUILTIN_SETS: [(&str, &str); 2] = [
    ("classic", include_str!("../sets/classic.json")),
    ("fantasy", include_str!("../sets/fantasy.json")),
];

// ---------------------------------------------------------------------------
// On-disk shape
// ---------------------------------------------------------------------------

// Missing string fields default to empty so validation can report them
// with a readable reason instead of a serde "missing field" error.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetFile {
    #[serde(default)]
    set_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    characters: Vec<CharacterEntry>,
}

#[derive(Deserialize)]
struct CharacterEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    attributes: Option<Attributes>,
}

// ---------------------------------------------------------------------------
// CharacterCatalog
// ---------------------------------------------------------------------------

/// All character sets known to the server, keyed by set id.
#[derive(Debug, Clone, Default)]
pub struct CharacterCatalog {
    sets: BTreeMap<String, CharacterSet>,
}

impl CharacterCatalog {
    /// The set used when a room is created without a valid set id.
    pub const DEFAULT_SET: &'static str = "classic";

    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the built-in `classic` and `fantasy` sets.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (set_id, json) in BUILTIN_SETS {
            if let Err(e) = catalog.insert_json(set_id, json) {
                tracing::error!(set_id, error = %e, "built-in character set rejected");
            }
        }
        catalog
    }

    /// Parses, validates and stores one set. Replaces any set with the
    /// same id.
    pub fn insert_json(
        &mut self,
        set_id: &str,
        json: &str,
    ) -> Result<&CharacterSet, CatalogError> {
        let file: SetFile =
            serde_json::from_str(json).map_err(|source| {
                CatalogError::Parse {
                    set_id: set_id.to_owned(),
                    source,
                }
            })?;
        let set = build_set(set_id, file)?;
        tracing::info!(
            set_id,
            set_name = %set.set_name,
            characters = set.characters.len(),
            "loaded character set"
        );
        self.sets.insert(set_id.to_owned(), set);
        // Just inserted under this key.
        Ok(&self.sets[set_id])
    }

    /// Loads every `*.json` file in `dir` as a set named after the file
    /// stem. Files that fail to parse or validate are logged and skipped.
    ///
    /// Returns the number of sets loaded from the directory.
    ///
    /// # Errors
    /// Returns [`CatalogError::Io`] if the directory itself can't be read.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, CatalogError> {
        let entries =
            std::fs::read_dir(dir).map_err(|source| CatalogError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

        let mut files: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().is_some_and(|ext| ext == "json")
            })
            .collect();
        files.sort();

        if files.is_empty() {
            tracing::warn!(dir = %dir.display(), "no character set files found");
        }

        let mut loaded = 0;
        for path in files {
            let Some(set_id) = path.file_stem().and_then(|s| s.to_str())
            else {
                continue;
            };
            let result = std::fs::read_to_string(&path)
                .map_err(|source| CatalogError::Io {
                    path: path.clone(),
                    source,
                })
                .and_then(|json| self.insert_json(set_id, &json).map(|_| ()));
            match result {
                Ok(()) => loaded += 1,
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping character set");
                }
            }
        }
        Ok(loaded)
    }

    /// Ids of every loaded set, sorted.
    pub fn list_set_ids(&self) -> Vec<String> {
        self.sets.keys().cloned().collect()
    }

    /// Set id → display name.
    pub fn list_set_names(&self) -> BTreeMap<String, String> {
        self.sets
            .iter()
            .map(|(id, set)| (id.clone(), set.set_name.clone()))
            .collect()
    }

    pub fn get_set(&self, set_id: &str) -> Option<&CharacterSet> {
        self.sets.get(set_id)
    }

    /// The `classic` set, if loaded.
    pub fn default_set(&self) -> Option<&CharacterSet> {
        self.get_set(Self::DEFAULT_SET)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Validates a parsed file and resolves image paths.
fn build_set(set_id: &str, file: SetFile) -> Result<CharacterSet, CatalogError> {
    let invalid = |reason: String| CatalogError::Invalid {
        set_id: set_id.to_owned(),
        reason,
    };

    if file.set_name.trim().is_empty() {
        return Err(invalid("missing setName".into()));
    }
    if file.description.trim().is_empty() {
        return Err(invalid("missing description".into()));
    }
    if file.characters.is_empty() {
        return Err(invalid("characters must not be empty".into()));
    }

    let mut seen = HashSet::new();
    let mut characters = Vec::with_capacity(file.characters.len());
    for (index, entry) in file.characters.into_iter().enumerate() {
        if entry.id.is_empty() {
            return Err(invalid(format!("character {index} has no id")));
        }
        if entry.name.is_empty() {
            return Err(invalid(format!("character {} has no name", entry.id)));
        }
        let Some(attributes) = entry.attributes else {
            return Err(invalid(format!(
                "character {} has no attributes",
                entry.id
            )));
        };
        if !seen.insert(entry.id.clone()) {
            return Err(invalid(format!(
                "duplicate character id '{}'",
                entry.id
            )));
        }
        characters.push(Character {
            image: format!("/images/characters/{set_id}/{}.png", entry.id),
            id: entry.id,
            name: entry.name,
            attributes,
        });
    }

    Ok(CharacterSet {
        id: set_id.to_owned(),
        set_name: file.set_name,
        description: file.description,
        characters,
    })
}
