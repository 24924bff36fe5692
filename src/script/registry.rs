//! Dialog Script Registry
//!
//! Loads and caches dialog script definitions from TOML files under a data
//! directory. A file that fails to parse is logged and skipped so one bad
//! script never blocks the rest from loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{info, warn};

use super::definition::{DialogScript, RawScriptFile};
use crate::engine::DialogEngine;
use crate::error::DialogError;
use crate::session::DialogSession;

pub struct ScriptRegistry {
    scripts: HashMap<String, Rc<DialogScript>>,
    data_dir: PathBuf,
}

impl ScriptRegistry {
    pub fn new(data_dir: &Path) -> Self {
        Self { scripts: HashMap::new(), data_dir: data_dir.to_path_buf() }
    }

    /// Load every `*.toml` script under the data directory (recursive).
    /// Returns the number of scripts loaded; files that fail to parse or
    /// validate are logged and skipped.
    pub fn load_all(&mut self) -> Result<usize, DialogError> {
        info!("Loading dialog scripts from {:?}", self.data_dir);

        if !self.data_dir.exists() {
            warn!("Dialog script directory does not exist: {:?}", self.data_dir);
            return Ok(0);
        }

        let mut paths = Vec::new();
        collect_toml_files(&self.data_dir, &mut paths)?;

        let mut count = 0;
        for path in paths {
            match self.load_file(&path) {
                Ok(id) => {
                    info!("Loaded dialog script: {} ({:?})", id, path);
                    count += 1;
                }
                Err(e) => {
                    warn!("Failed to load dialog script {:?}: {}", path, e);
                }
            }
        }

        info!("Loaded {} dialog scripts", count);
        Ok(count)
    }

    /// Load a single script file, replacing any previously loaded script with
    /// the same id.
    fn load_file(&mut self, path: &Path) -> Result<String, DialogError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DialogError::ScriptIo { path: path.to_path_buf(), source: e })?;

        let raw: RawScriptFile = toml::from_str(&content)
            .map_err(|e| DialogError::ScriptParse { path: path.to_path_buf(), source: e })?;

        let script = DialogScript::from_raw(&raw.script)?;
        let id = script.id.clone();
        self.scripts.insert(id.clone(), Rc::new(script));
        Ok(id)
    }

    /// Get a script by id.
    pub fn get(&self, id: &str) -> Option<Rc<DialogScript>> {
        self.scripts.get(id).cloned()
    }

    /// All loaded script ids.
    pub fn ids(&self) -> Vec<String> {
        self.scripts.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.scripts.len()
    }

    /// Author a session from the named script.
    pub fn instantiate(
        &self,
        id: &str,
        engine: &DialogEngine,
    ) -> Result<DialogSession, DialogError> {
        let script = self.get(id).ok_or_else(|| DialogError::UnknownScript(id.to_string()))?;
        Ok(script.instantiate(engine))
    }
}

fn collect_toml_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), DialogError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| DialogError::ScriptIo { path: dir.to_path_buf(), source: e })?;

    for entry in entries {
        let entry = entry.map_err(|e| DialogError::ScriptIo { path: dir.to_path_buf(), source: e })?;
        let path = entry.path();

        if path.is_dir() {
            collect_toml_files(&path, paths)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_engine;
    use tempfile::TempDir;

    fn create_test_script_toml() -> &'static str {
        r#"
[script]
id = "test_greeting"
speaker = "Guard"

[[script.steps]]
type = "npc"
ticks = 20
text = "Halt!"

[[script.steps]]
type = "pause"
ticks = 10
"#
    }

    #[test]
    fn test_load_scripts_recursively() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("town");
        std::fs::create_dir_all(&nested).unwrap();

        std::fs::write(temp_dir.path().join("greeting.toml"), create_test_script_toml()).unwrap();
        std::fs::write(
            nested.join("farewell.toml"),
            r#"
[script]
id = "test_farewell"

[[script.steps]]
type = "npc"
ticks = 20
text = "Safe travels."
"#,
        )
        .unwrap();

        let mut registry = ScriptRegistry::new(temp_dir.path());
        assert_eq!(registry.load_all().unwrap(), 2);

        let script = registry.get("test_greeting").unwrap();
        assert_eq!(script.speaker.as_deref(), Some("Guard"));
        assert_eq!(script.steps.len(), 2);
        assert!(registry.get("test_farewell").is_some());
    }

    #[test]
    fn test_bad_file_is_skipped_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("good.toml"), create_test_script_toml()).unwrap();
        std::fs::write(temp_dir.path().join("bad.toml"), "this is not a script").unwrap();

        let mut registry = ScriptRegistry::new(temp_dir.path());
        assert_eq!(registry.load_all().unwrap(), 1);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_missing_directory_loads_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = ScriptRegistry::new(&temp_dir.path().join("absent"));
        assert_eq!(registry.load_all().unwrap(), 0);
    }

    #[test]
    fn test_instantiate_unknown_script_errors() {
        let temp_dir = TempDir::new().unwrap();
        let registry = ScriptRegistry::new(temp_dir.path());
        let engine = test_engine();

        let err = registry.instantiate("nope", &engine).unwrap_err();
        assert!(matches!(err, DialogError::UnknownScript(_)));
    }

    #[test]
    fn test_instantiated_script_plays_back() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("greeting.toml"), create_test_script_toml()).unwrap();

        let mut registry = ScriptRegistry::new(temp_dir.path());
        registry.load_all().unwrap();

        let engine = test_engine();
        let session = registry.instantiate("test_greeting", &engine).unwrap();
        session.start("u1");

        assert!(session.is_running());
        assert_eq!(session.remaining_actions(), 2);
    }
}
