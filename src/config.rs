use crate::input::Bindings;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub struct RuntimeConfigSnapshot {
    pub source: Option<String>,
    pub bindings: Bindings,
    pub ctl: Option<String>,
}

impl Default for RuntimeConfigSnapshot {
    fn default() -> Self {
        Self {
            source: None,
            bindings: Bindings::default(),
            ctl: None,
        }
    }
}

/// Watches the runtime config file and reloads it when its mtime
/// changes, so key bindings can be adjusted without restarting.
#[derive(Debug, Clone)]
pub struct RuntimeConfigWatcher {
    path: Option<PathBuf>,
    modified: Option<SystemTime>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct BeehiveConfigFile {
    /// Action name -> hotkey spec, e.g. `select_all: ctrl+shift+a`.
    #[serde(default)]
    bindings: BTreeMap<String, String>,
    /// Control CLI to invoke instead of the default `beekeeperman`.
    #[serde(default)]
    ctl: Option<String>,
}

impl RuntimeConfigWatcher {
    pub fn discover() -> Self {
        Self {
            path: discover_config_path(),
            modified: None,
        }
    }

    pub fn at(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            modified: None,
        }
    }

    pub fn load_current(&mut self) -> Result<RuntimeConfigSnapshot> {
        let Some(path) = self.path.clone() else {
            return Ok(RuntimeConfigSnapshot::default());
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read runtime config {}", path.display()))?;
        let parsed: BeehiveConfigFile = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse runtime config {}", path.display()))?;
        self.modified = fs::metadata(&path)
            .ok()
            .and_then(|meta| meta.modified().ok());

        let overrides: HashMap<String, String> = parsed.bindings.into_iter().collect();
        let mut bindings = Bindings::default();
        bindings
            .apply_overrides(&overrides)
            .with_context(|| format!("invalid bindings in {}", path.display()))?;

        Ok(RuntimeConfigSnapshot {
            source: Some(path.display().to_string()),
            bindings,
            ctl: parsed.ctl.filter(|ctl| !ctl.trim().is_empty()),
        })
    }

    pub fn reload_if_changed(&mut self) -> Result<Option<RuntimeConfigSnapshot>> {
        if self.path.is_none() {
            self.path = discover_config_path();
            if self.path.is_some() {
                return self.load_current().map(Some);
            }
            return Ok(None);
        }

        let current_path = self.path.clone().unwrap_or_default();
        if !current_path.exists() {
            self.path = discover_config_path();
            self.modified = None;
            if self.path.is_some() {
                return self.load_current().map(Some);
            }
            return Ok(Some(RuntimeConfigSnapshot::default()));
        }

        let modified = fs::metadata(&current_path)
            .ok()
            .and_then(|meta| meta.modified().ok());
        if modified != self.modified {
            return self.load_current().map(Some);
        }

        Ok(None)
    }
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("BEEHIVE_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("beehive.yaml"),
        PathBuf::from("beehive.yml"),
        PathBuf::from(".beehive.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/beehive/config.yaml"),
            PathBuf::from(&home).join(".config/beehive/config.yml"),
            PathBuf::from(&home).join(".beehive.yaml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}
