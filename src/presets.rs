//! User presets: saved songs together with the inputs that produced them.
//!
//! Stored as one pretty-printed JSON array, by default at `.songsmith/presets.json`.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::ComposerError;
use crate::generation::VocalStyle;
use crate::song::Song;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreset {
    pub id: String,
    pub name: String,
    pub song: Song,
    pub prompt: String,
    pub lyrics: String,
    #[serde(rename = "vocalStyle")]
    pub vocal_style: VocalStyle,
}

#[derive(Debug)]
pub struct PresetStore {
    path: PathBuf,
    presets: Vec<UserPreset>,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

impl PresetStore {
    /// A store with nothing loaded that will write to `path`.
    pub fn empty(path: &Path) -> Self {
        PresetStore { path: path.to_path_buf(), presets: Vec::new() }
    }

    /// Load presets from `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self, ComposerError> {
        let mut store = PresetStore::empty(path);
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(store),
            Err(e) => return Err(ComposerError::PresetError(format!("Failed to load presets: {}", e))),
        };

        store.presets = serde_json::from_str(&data)
            .map_err(|e| ComposerError::PresetError(format!("Failed to load presets: {}", e)))?;
        log::info!("Loaded {} presets from {}", store.presets.len(), path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[UserPreset] {
        &self.presets
    }

    pub fn get(&self, id: &str) -> Option<&UserPreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Add a preset and write the file. The preset stays in memory even if the write fails.
    pub fn save(
        &mut self,
        name: &str,
        song: &Song,
        prompt: &str,
        lyrics: &str,
        vocal_style: VocalStyle,
    ) -> Result<UserPreset, ComposerError> {
        let mut stamp = now_millis();
        while self.get(&stamp.to_string()).is_some() {
            stamp += 1;
        }

        let preset = UserPreset {
            id: stamp.to_string(),
            name: name.to_string(),
            song: song.clone(),
            prompt: prompt.to_string(),
            lyrics: lyrics.to_string(),
            vocal_style,
        };
        self.presets.push(preset.clone());

        self.persist().map_err(|e| {
            log::error!("Failed to save presets: {}", e);
            ComposerError::PresetError("Could not save preset. Storage might be full.".to_string())
        })?;
        Ok(preset)
    }

    /// Remove a preset. Returns whether one was removed.
    pub fn delete(&mut self, id: &str) -> Result<bool, ComposerError> {
        let before = self.presets.len();
        self.presets.retain(|p| p.id != id);
        if self.presets.len() == before {
            return Ok(false);
        }

        self.persist().map_err(|e| {
            log::error!("Failed to delete preset: {}", e);
            ComposerError::PresetError("Could not delete preset.".to_string())
        })?;
        Ok(true)
    }

    // Creates the parent directory if needed
    fn persist(&self) -> Result<(), ComposerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.presets)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::fixtures::demo_song;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("songsmith-{}-{}-{}", name, std::process::id(), now_millis()))
            .join("presets.json")
    }

    #[test]
    fn save_and_reload_round_trip() {
        let path = temp_path("roundtrip");
        let song = demo_song();

        let mut store = PresetStore::open(&path).unwrap();
        assert!(store.is_empty());
        let saved = store.save("Late night", &song, "synthwave drive", "Neon on the rain", VocalStyle::Male).unwrap();

        let reloaded = PresetStore::open(&path).unwrap();
        let preset = reloaded.get(&saved.id).unwrap();
        assert_eq!(preset.song, song);
        assert_eq!(preset.prompt, "synthwave drive");
        assert_eq!(preset.lyrics, "Neon on the rain");
        assert_eq!(preset.vocal_style, VocalStyle::Male);

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"vocalStyle\": \"Male\""));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn ids_are_unique_and_delete_persists() {
        let path = temp_path("delete");
        let mut store = PresetStore::open(&path).unwrap();
        let a = store.save("a", &demo_song(), "", "", VocalStyle::Female).unwrap();
        let b = store.save("b", &demo_song(), "", "", VocalStyle::Female).unwrap();
        assert_ne!(a.id, b.id);

        assert!(store.delete(&a.id).unwrap());
        assert!(!store.delete(&a.id).unwrap());

        let reloaded = PresetStore::open(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.list()[0].name, "b");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_is_a_preset_error() {
        let path = temp_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not a list").unwrap();

        assert!(matches!(PresetStore::open(&path), Err(ComposerError::PresetError(_))));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn failed_write_keeps_preset_in_memory() {
        let dir = temp_path("blocked");
        // the "directory" the file should live in is a plain file
        let parent = dir.parent().unwrap().to_path_buf();
        std::fs::create_dir_all(parent.parent().unwrap()).unwrap();
        std::fs::write(&parent, "").unwrap();

        let mut store = PresetStore::empty(&dir);
        let err = store.save("x", &demo_song(), "", "", VocalStyle::Female);
        assert!(matches!(err, Err(ComposerError::PresetError(_))));
        assert_eq!(store.len(), 1);
        let _ = std::fs::remove_file(&parent);
    }
}
