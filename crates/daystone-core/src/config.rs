use crate::error::Result;
use crate::store::atomic_write;
use crate::types::MediaKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Recording limits in seconds: a milestone plan pitch gets a longer window
/// than a quick progress update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_plan_limit")]
    pub plan_limit_seconds: u32,
    #[serde(default = "default_update_limit")]
    pub update_limit_seconds: u32,
}

fn default_plan_limit() -> u32 {
    20
}

fn default_update_limit() -> u32 {
    10
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            plan_limit_seconds: default_plan_limit(),
            update_limit_seconds: default_update_limit(),
        }
    }
}

impl CaptureConfig {
    pub fn limit_for(&self, kind: MediaKind) -> u32 {
        match kind {
            MediaKind::Plan => self.plan_limit_seconds,
            MediaKind::Update => self.update_limit_seconds,
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl Config {
    /// Load from a YAML file; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_yaml::to_string(self)?;
        atomic_write(path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_app_limits() {
        let cfg = Config::default();
        assert_eq!(cfg.capture.limit_for(MediaKind::Plan), 20);
        assert_eq!(cfg.capture.limit_for(MediaKind::Update), 10);
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn yaml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daystone/config.yaml");
        let cfg = Config {
            capture: CaptureConfig {
                plan_limit_seconds: 30,
                update_limit_seconds: 15,
            },
        };
        cfg.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "capture:\n  plan_limit_seconds: 45\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.capture.plan_limit_seconds, 45);
        assert_eq!(cfg.capture.update_limit_seconds, 10);
    }
}
