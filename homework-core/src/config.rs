//! Process-wide configuration, loaded once at startup.
//!
//! The file is JSON:
//!
//! ```json
//! {
//!   "calendar": { "db_path": "homeworks.json", "file_path": "homeworks.ics" },
//!   "server": { "host": "127.0.0.1", "port": 8000 }
//! }
//! ```
//!
//! Any key can be overridden from the environment with the `HOMEWORK` prefix
//! and `__` as separator, e.g. `HOMEWORK__CALENDAR__DB_PATH`.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HomeworkError, HomeworkResult};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

const ENV_PREFIX: &str = "HOMEWORK";

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Top-level keys this crate does not interpret, kept so `/config`
    /// echoes the file back whole.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where the homework database lives and where the calendar is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub db_path: String,
    pub file_path: String,

    /// Emitted as X-WR-CALNAME when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// IANA zone the due times are expressed in. UTC when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load the JSON file at `path`, layered with `HOMEWORK__*` environment
    /// variables.
    pub fn load(path: &Path) -> HomeworkResult<Self> {
        Self::load_with_env(path, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
    }

    fn load_with_env(path: &Path, env: Environment) -> HomeworkResult<Self> {
        if !path.exists() {
            return Err(HomeworkError::Config(format!(
                "config file not found at {}",
                path.display()
            )));
        }

        let config: Config = config::Config::builder()
            .add_source(File::from(path.to_path_buf()).format(FileFormat::Json))
            .add_source(env)
            .build()
            .map_err(|e| HomeworkError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| HomeworkError::Config(e.to_string()))?;

        // Reject a bad zone now rather than on the first export
        config.calendar.timezone()?;

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

impl CalendarConfig {
    pub fn db_path(&self) -> PathBuf {
        expand_path(&self.db_path)
    }

    pub fn file_path(&self) -> PathBuf {
        expand_path(&self.file_path)
    }

    pub fn timezone(&self) -> HomeworkResult<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>().map_err(|_| {
                    HomeworkError::Config(format!("unknown timezone '{}'", name))
                })
            })
            .transpose()
    }
}

/// Expand a leading `~` to the home directory
fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
