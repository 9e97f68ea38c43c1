use crate::game::gesture::DEFAULT_DEADZONE_SQUARED;
use crate::game::judgment::TimingWindows;
use crate::game::timing::{Micros, interval_for_bpm};
use configparser::ini::Ini;
use log::{info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "beatheist.ini";
pub const WINDOW_TITLE: &str = "BeatHeist";
/// Slower tempos give intervals too long for the clock's deadline math.
pub const MIN_BPM: f64 = 1.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not parse '{path}': {message}")]
    Parse { path: PathBuf, message: String },
    #[error("bpm must be a number of at least 1, got {0}")]
    InvalidTempo(f64),
    #[error("judgment windows must satisfy miss > poor > ok > perfect > 0, got {0:?}")]
    InvalidWindows(TimingWindows),
    #[error("gesture deadzone must be zero or positive, got {0}")]
    InvalidDeadzone(f32),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bpm: f64,
    pub windows: TimingWindows,
    /// Linear deadzone; the classifier compares against its square.
    pub deadzone: f32,
    pub level_path: PathBuf,
    pub input_window_moves: bool,
    pub rng_seed: Option<u64>,
    pub log_dir: PathBuf,
    pub log_enabled: bool,
    pub display_width: u32,
    pub display_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bpm: 70.0,
            windows: TimingWindows::default(),
            deadzone: DEFAULT_DEADZONE_SQUARED.sqrt(),
            level_path: PathBuf::from("assets/level.json"),
            input_window_moves: true,
            rng_seed: None,
            log_dir: PathBuf::from("logs"),
            log_enabled: false,
            display_width: 1280,
            display_height: 720,
        }
    }
}

impl Config {
    #[inline(always)]
    pub fn beat_interval(&self) -> Micros {
        interval_for_bpm(self.bpm)
    }

    #[inline(always)]
    pub fn deadzone_squared(&self) -> f32 {
        self.deadzone * self.deadzone
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.bpm.is_finite() && self.bpm >= MIN_BPM) || self.beat_interval() <= 0 {
            return Err(ConfigError::InvalidTempo(self.bpm));
        }
        if !self.windows.is_monotonic() {
            return Err(ConfigError::InvalidWindows(self.windows));
        }
        if !(self.deadzone.is_finite() && self.deadzone >= 0.0) {
            return Err(ConfigError::InvalidDeadzone(self.deadzone));
        }
        Ok(())
    }

    /// Reads every known key, keeping the default for anything missing or unreadable.
    pub fn from_ini(conf: &Ini) -> Result<Self, ConfigError> {
        let d = Config::default();
        let float = |section: &str, key: &str, default: f64| -> f64 {
            match conf.getfloat(section, key) {
                Ok(Some(v)) => v,
                Ok(None) => default,
                Err(e) => {
                    warn!("[{}] {}: {}; using {}", section, key, e, default);
                    default
                }
            }
        };
        let boolean = |section: &str, key: &str, default: bool| -> bool {
            match conf.getbool(section, key) {
                Ok(Some(v)) => v,
                Ok(None) => default,
                Err(e) => {
                    warn!("[{}] {}: {}; using {}", section, key, e, default);
                    default
                }
            }
        };
        let uint = |section: &str, key: &str| -> Option<u64> {
            let raw = conf.get(section, key)?;
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            match raw.parse::<u64>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("[{}] {}: {}; ignoring", section, key, e);
                    None
                }
            }
        };
        let path = |section: &str, key: &str, default: PathBuf| -> PathBuf {
            conf.get(section, key)
                .filter(|s| !s.trim().is_empty())
                .map(|s| PathBuf::from(s.trim()))
                .unwrap_or(default)
        };

        let config = Self {
            bpm: float("timing", "bpm", d.bpm),
            windows: TimingWindows {
                miss: float("judgment", "miss_window", d.windows.miss),
                poor: float("judgment", "poor_window", d.windows.poor),
                ok: float("judgment", "ok_window", d.windows.ok),
                perfect: float("judgment", "perfect_window", d.windows.perfect),
            },
            deadzone: float("gesture", "deadzone", d.deadzone as f64) as f32,
            level_path: path("gameplay", "level", d.level_path),
            input_window_moves: boolean("gameplay", "input_window_moves", d.input_window_moves),
            rng_seed: uint("gameplay", "rng_seed"),
            log_dir: path("diagnostics", "log_dir", d.log_dir),
            log_enabled: boolean("diagnostics", "enabled", d.log_enabled),
            display_width: uint("display", "width")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(d.display_width),
            display_height: uint("display", "height")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(d.display_height),
        };
        config.validate()?;
        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut conf = Ini::new();
        conf.set("timing", "bpm", Some(self.bpm.to_string()));
        conf.set("judgment", "miss_window", Some(self.windows.miss.to_string()));
        conf.set("judgment", "poor_window", Some(self.windows.poor.to_string()));
        conf.set("judgment", "ok_window", Some(self.windows.ok.to_string()));
        conf.set("judgment", "perfect_window", Some(self.windows.perfect.to_string()));
        conf.set("gesture", "deadzone", Some(self.deadzone.to_string()));
        conf.set("gameplay", "level", Some(self.level_path.display().to_string()));
        conf.set(
            "gameplay",
            "input_window_moves",
            Some(self.input_window_moves.to_string()),
        );
        conf.set("diagnostics", "log_dir", Some(self.log_dir.display().to_string()));
        conf.set("diagnostics", "enabled", Some(self.log_enabled.to_string()));
        conf.set("display", "width", Some(self.display_width.to_string()));
        conf.set("display", "height", Some(self.display_height.to_string()));
        conf
    }
}

/// Loads the config, writing a default file first if none exists.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        info!("Config '{}' not found, creating defaults.", path.display());
        let defaults = Config::default();
        if let Err(e) = defaults.to_ini().write(path) {
            warn!("Failed to write default config '{}': {}", path.display(), e);
        }
        return Ok(defaults);
    }

    let mut conf = Ini::new();
    conf.load(path).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    let config = Config::from_ini(&conf)?;
    info!(
        "Loaded config '{}': {} BPM, level '{}'",
        path.display(),
        config.bpm,
        config.level_path.display()
    );
    Ok(config)
}
