//! Provides a ConfigManager to read and refresh settings from files.
//!

use color_eyre::Result;
use config;
use log::*;
use notify::{RecommendedWatcher, Watcher};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use tokio::sync::mpsc::UnboundedSender;

use crate::event::{AppEvent, Event};

pub const DEFAULT_FILE: &str = "shelltop.toml";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    /// Interpreter and fixed arguments, e.g. `"zsh -c"`. Probed when absent.
    pub interpreter: Option<String>,
    /// Working directory for every command. Defaults to the home directory.
    pub directory: Option<PathBuf>,
    /// Deadline for a single command. No deadline when absent.
    pub timeout_secs: Option<u64>,
}

impl ShellSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    pub limit: usize,
    pub command_width: usize,
    pub user_width: usize,
    pub sample_ms: u64,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            limit: 100,
            command_width: 100,
            user_width: 8,
            sample_ms: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub refresh_secs: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self { refresh_secs: 3 }
    }
}

impl DashboardSettings {
    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub shell: ShellSettings,
    #[serde(default)]
    pub snapshot: SnapshotSettings,
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(default = "default_log_buffer_size")]
    pub log_buffer_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shell: ShellSettings::default(),
            snapshot: SnapshotSettings::default(),
            dashboard: DashboardSettings::default(),
            log_buffer_size: default_log_buffer_size(),
        }
    }
}

fn default_log_buffer_size() -> usize {
    10_000
}

/// Load settings from the file (if present) layered under `SHELLTOP_` environment variables.
pub fn load(file_path: &PathBuf) -> Result<Settings> {
    let raw = config::Config::builder()
        .add_source(config::File::from(file_path.clone()).required(false))
        .add_source(
            config::Environment::with_prefix("SHELLTOP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(raw.try_deserialize()?)
}

#[derive(Debug)]
pub struct ConfigManager {
    pub file_path: PathBuf,
    settings: Settings,
    _watcher: Option<RecommendedWatcher>,
}

impl ConfigManager {
    pub fn new(file_path: PathBuf, sender: UnboundedSender<Event>) -> Result<ConfigManager> {
        let settings = load(&file_path)?;
        let watcher = if file_path.exists() {
            let captured = sender.clone();
            let mut watcher = notify::recommended_watcher(move |_| {
                let _ = captured.send(Event::App(AppEvent::Reload));
            })?;
            info!(target: "Config", "Watching file {:?}", file_path);
            watcher.watch(&file_path, notify::RecursiveMode::NonRecursive)?;
            Some(watcher)
        } else {
            info!(target: "Config", "No file at {:?}, using defaults", file_path);
            None
        };
        Ok(ConfigManager {
            file_path,
            settings,
            _watcher: watcher,
        })
    }

    pub fn current(&self) -> Settings {
        self.settings.clone()
    }

    /// Re-read the file. On error the previous settings stay in effect.
    pub fn reload(&mut self) -> Result<Settings> {
        self.settings = load(&self.file_path)?;
        Ok(self.current())
    }
}
