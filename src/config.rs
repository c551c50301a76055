//! Application-level configuration loading for session and realtime tunables.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GALAXY_QUIZ_BACK_CONFIG_PATH";

/// Hard cap on teams per session unless the config says otherwise.
const DEFAULT_MAX_TEAMS: usize = 8;
/// Number of sessions returned by the recent-sessions listing.
const DEFAULT_RECENT_SESSIONS_LIMIT: usize = 10;
/// Length of generated session codes.
const DEFAULT_SESSION_CODE_LENGTH: usize = 6;
/// Capacity of the per-client recent-updates buffer.
const DEFAULT_RECENT_UPDATES_CAPACITY: usize = 10;
/// How many buffered updates a client actually displays.
const DEFAULT_VISIBLE_UPDATES: usize = 3;
/// Delay before the fast-follow resynchronization after a team write.
const DEFAULT_RESYNC_DELAY_MS: u64 = 100;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Maximum number of teams allowed in one session.
    pub max_teams: usize,
    /// Cap on the recent-sessions listing.
    pub recent_sessions_limit: usize,
    /// Length of generated session codes.
    pub session_code_length: usize,
    /// Capacity of the realtime recent-updates buffer.
    pub recent_updates_capacity: usize,
    /// Size of the visible slice of the recent-updates buffer.
    pub visible_updates: usize,
    /// Delay between a team write and its confirming re-fetch.
    pub resync_delay: Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in
    /// defaults when the file is missing or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_teams: DEFAULT_MAX_TEAMS,
            recent_sessions_limit: DEFAULT_RECENT_SESSIONS_LIMIT,
            session_code_length: DEFAULT_SESSION_CODE_LENGTH,
            recent_updates_capacity: DEFAULT_RECENT_UPDATES_CAPACITY,
            visible_updates: DEFAULT_VISIBLE_UPDATES,
            resync_delay: Duration::from_millis(DEFAULT_RESYNC_DELAY_MS),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    max_teams: Option<usize>,
    recent_sessions_limit: Option<usize>,
    session_code_length: Option<usize>,
    recent_updates_capacity: Option<usize>,
    visible_updates: Option<usize>,
    resync_delay_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_teams: raw.max_teams.unwrap_or(defaults.max_teams),
            recent_sessions_limit: raw
                .recent_sessions_limit
                .unwrap_or(defaults.recent_sessions_limit),
            session_code_length: raw
                .session_code_length
                .unwrap_or(defaults.session_code_length),
            recent_updates_capacity: raw
                .recent_updates_capacity
                .unwrap_or(defaults.recent_updates_capacity),
            visible_updates: raw.visible_updates.unwrap_or(defaults.visible_updates),
            resync_delay: raw
                .resync_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.resync_delay),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
