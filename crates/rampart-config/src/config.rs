//! Engine configuration: streaming distances, worker pools, debug knobs.
//!
//! Stored as RON. Every section and field has a default, so a partial file
//! only overrides what it names.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Chunk streaming configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Horizontal neighborhood width, in chunks.
    pub render_distance: i32,
    /// Vertical chunk layers above world layer 0.
    pub y_render_distance: i32,
    /// Coordinates promoted into generation per scheduler tick.
    pub max_activations_per_tick: usize,
    /// Milliseconds between neighborhood scans.
    pub scan_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            render_distance: 8,
            y_render_distance: 1,
            max_activations_per_tick: 6,
            scan_interval_ms: 300,
        }
    }
}

/// Worker pool sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Generation worker threads; 0 means derive from the CPU count.
    pub generation_threads: usize,
    /// Meshing worker threads; 0 means derive from the CPU count.
    pub meshing_threads: usize,
    /// In-flight task budget per pool.
    pub queue_budget: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            generation_threads: 0,
            meshing_threads: 0,
            queue_budget: 64,
        }
    }
}

/// Debug and observability knobs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Tracing filter directive (e.g. "info" or "rampart_world=debug");
    /// empty uses the built-in default.
    pub log_level: String,
}

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub world: WorldConfig,
    pub workers: WorkerConfig,
    pub debug: DebugConfig,
}

impl EngineConfig {
    /// Loads configuration from a RON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        let config: Self = ron::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        tracing::info!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    /// Loads from a RON file, falling back to defaults when the file does
    /// not exist. Parse errors still fail: a present-but-broken file should
    /// never be silently ignored.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves configuration as pretty-printed RON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default();
        let content = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Rejects values the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.render_distance < 1 {
            return Err(ConfigError::Invalid(format!(
                "render_distance must be >= 1, got {}",
                self.world.render_distance
            )));
        }
        if self.world.y_render_distance < 1 {
            return Err(ConfigError::Invalid(format!(
                "y_render_distance must be >= 1, got {}",
                self.world.y_render_distance
            )));
        }
        if self.world.max_activations_per_tick == 0 {
            return Err(ConfigError::Invalid(
                "max_activations_per_tick must be >= 1".to_string(),
            ));
        }
        if self.workers.queue_budget == 0 {
            return Err(ConfigError::Invalid("queue_budget must be >= 1".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        EngineConfig::default().validate().expect("defaults are valid");
    }

    #[test]
    fn test_ron_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rampart.ron");

        let mut config = EngineConfig::default();
        config.world.render_distance = 12;
        config.workers.meshing_threads = 3;
        config.debug.log_level = "rampart_mesh=debug".to_string();

        config.save(&path).expect("save");
        let loaded = EngineConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("partial.ron");
        std::fs::write(&path, "(world: (render_distance: 4))").expect("write");

        let loaded = EngineConfig::load(&path).expect("load");
        assert_eq!(loaded.world.render_distance, 4);
        assert_eq!(
            loaded.world.scan_interval_ms,
            WorldConfig::default().scan_interval_ms
        );
        assert_eq!(loaded.workers, WorkerConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded =
            EngineConfig::load_or_default(&dir.path().join("nope.ron")).expect("fallback");
        assert_eq!(loaded, EngineConfig::default());
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.ron");
        std::fs::write(&path, "(world: (render_distance: \"four\"))").expect("write");
        assert!(matches!(
            EngineConfig::load_or_default(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("invalid.ron");
        std::fs::write(&path, "(world: (render_distance: 0))").expect("write");
        assert!(matches!(
            EngineConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));
    }
}
