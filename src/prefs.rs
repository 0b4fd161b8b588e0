use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const PREFS_DIR: &str = "matchday";
const PREFS_FILE: &str = "prefs.json";
const PREFS_VERSION: u32 = 1;

/// Per-user preferences. Anything unreadable (missing file, bad JSON,
/// version mismatch) falls back to defaults rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prefs {
    version: u32,
    #[serde(default)]
    pub favorite_leagues: Vec<u32>,
    #[serde(default)]
    pub favorite_teams: Vec<String>,
    #[serde(default)]
    pub default_league: Option<u32>,
    #[serde(default)]
    pub default_season: Option<u16>,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            version: PREFS_VERSION,
            favorite_leagues: Vec::new(),
            favorite_teams: Vec::new(),
            default_league: None,
            default_season: None,
        }
    }
}

pub fn load() -> Prefs {
    let Some(path) = prefs_path() else {
        return Prefs::default();
    };
    load_from(&path)
}

pub fn save(prefs: &Prefs) -> Result<()> {
    let Some(path) = prefs_path() else {
        return Ok(());
    };
    save_to(&path, prefs)
}

pub fn load_from(path: &Path) -> Prefs {
    let Ok(raw) = fs::read_to_string(path) else {
        return Prefs::default();
    };
    let Ok(prefs) = serde_json::from_str::<Prefs>(&raw) else {
        return Prefs::default();
    };
    if prefs.version != PREFS_VERSION {
        return Prefs::default();
    }
    prefs
}

pub fn save_to(path: &Path, prefs: &Prefs) -> Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let mut prefs = prefs.clone();
    prefs.version = PREFS_VERSION;
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(&prefs).context("serialize prefs")?;
    fs::write(&tmp, json).context("write prefs")?;
    fs::rename(&tmp, path).context("swap prefs")?;
    Ok(())
}

fn prefs_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CONFIG_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(PREFS_DIR).join(PREFS_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(PREFS_DIR)
            .join(PREFS_FILE),
    )
}
