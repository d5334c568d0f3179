//! Cutscene configuration resource.
//!
//! Settings loaded from an INI file. Missing files or keys keep the defaults,
//! so the engine always starts.
//!
//! # Configuration File Format
//!
//! ```ini
//! [cutscene]
//! base_priority = 0
//! active_priority = 20
//! play_on_start = true
//! start_index = 0
//! verbose_logs = false
//!
//! [assets]
//! playlist = assets/playlist.json
//! scenes_dir = assets/scenes
//!
//! [runner]
//! tick_rate = 60
//! threaded_loader = true
//! max_seconds = 600
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Default safe values for startup
const DEFAULT_BASE_PRIORITY: i32 = 0;
const DEFAULT_ACTIVE_PRIORITY: i32 = 20;
const DEFAULT_PLAY_ON_START: bool = true;
const DEFAULT_START_INDEX: usize = 0;
const DEFAULT_VERBOSE_LOGS: bool = false;
const DEFAULT_PLAYLIST: &str = "assets/playlist.json";
const DEFAULT_SCENES_DIR: &str = "assets/scenes";
const DEFAULT_TICK_RATE: u32 = 60;
const DEFAULT_THREADED_LOADER: bool = true;
const DEFAULT_MAX_SECONDS: u32 = 600;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct CutsceneConfig {
    /// Priority of every registered camera that is not live.
    pub base_priority: i32,
    /// Priority of the live camera unless a shot overrides it.
    pub active_priority: i32,
    /// Start the playlist as soon as the runner is up.
    pub play_on_start: bool,
    pub start_index: usize,
    /// Raise this crate's log level to debug.
    pub verbose_logs: bool,
    pub playlist_path: PathBuf,
    pub scenes_dir: PathBuf,
    /// Fixed ticks per second of the runner.
    pub tick_rate: u32,
    /// Fetch scenes on a worker thread instead of inline.
    pub threaded_loader: bool,
    /// Runner gives up after this many simulated seconds.
    pub max_seconds: u32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for CutsceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CutsceneConfig {
    pub fn new() -> Self {
        Self {
            base_priority: DEFAULT_BASE_PRIORITY,
            active_priority: DEFAULT_ACTIVE_PRIORITY,
            play_on_start: DEFAULT_PLAY_ON_START,
            start_index: DEFAULT_START_INDEX,
            verbose_logs: DEFAULT_VERBOSE_LOGS,
            playlist_path: PathBuf::from(DEFAULT_PLAYLIST),
            scenes_dir: PathBuf::from(DEFAULT_SCENES_DIR),
            tick_rate: DEFAULT_TICK_RATE,
            threaded_loader: DEFAULT_THREADED_LOADER,
            max_seconds: DEFAULT_MAX_SECONDS,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file at `config_path`.
    ///
    /// Missing values retain their current values.
    pub fn load_from_file(&mut self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(ConfigError::Load)?;
        self.apply(&config);
        info!(
            "Loaded config {:?}: priorities {}/{}, playlist {:?}, tick_rate={}, threaded_loader={}",
            self.config_path,
            self.base_priority,
            self.active_priority,
            self.playlist_path,
            self.tick_rate,
            self.threaded_loader
        );
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config.read(text.to_string()).map_err(ConfigError::Load)?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [cutscene] section
        if let Some(v) = config.getint("cutscene", "base_priority").ok().flatten() {
            self.base_priority = v as i32;
        }
        if let Some(v) = config.getint("cutscene", "active_priority").ok().flatten() {
            self.active_priority = v as i32;
        }
        if let Some(v) = config.getbool("cutscene", "play_on_start").ok().flatten() {
            self.play_on_start = v;
        }
        if let Some(v) = config.getuint("cutscene", "start_index").ok().flatten() {
            self.start_index = v as usize;
        }
        if let Some(v) = config.getbool("cutscene", "verbose_logs").ok().flatten() {
            self.verbose_logs = v;
        }

        // [assets] section
        if let Some(v) = config.get("assets", "playlist") {
            self.playlist_path = PathBuf::from(v);
        }
        if let Some(v) = config.get("assets", "scenes_dir") {
            self.scenes_dir = PathBuf::from(v);
        }

        // [runner] section
        if let Some(v) = config.getuint("runner", "tick_rate").ok().flatten() {
            self.tick_rate = (v as u32).max(1);
        }
        if let Some(v) = config.getbool("runner", "threaded_loader").ok().flatten() {
            self.threaded_loader = v;
        }
        if let Some(v) = config.getuint("runner", "max_seconds").ok().flatten() {
            self.max_seconds = v as u32;
        }
    }

    /// Save configuration to the INI file at `config_path`.
    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let mut config = Ini::new();

        // [cutscene] section
        config.set("cutscene", "base_priority", Some(self.base_priority.to_string()));
        config.set("cutscene", "active_priority", Some(self.active_priority.to_string()));
        config.set("cutscene", "play_on_start", Some(self.play_on_start.to_string()));
        config.set("cutscene", "start_index", Some(self.start_index.to_string()));
        config.set("cutscene", "verbose_logs", Some(self.verbose_logs.to_string()));

        // [assets] section
        config.set("assets", "playlist", Some(self.playlist_path.display().to_string()));
        config.set("assets", "scenes_dir", Some(self.scenes_dir.display().to_string()));

        // [runner] section
        config.set("runner", "tick_rate", Some(self.tick_rate.to_string()));
        config.set("runner", "threaded_loader", Some(self.threaded_loader.to_string()));
        config.set("runner", "max_seconds", Some(self.max_seconds.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| ConfigError::Save(e.to_string()))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Seconds per runner tick.
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}
