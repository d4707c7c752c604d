use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use zonetally_core::error::{Result, ZoneTallyError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub persistence: PersistenceSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            persistence: PersistenceSection::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ZoneTallyError::UnsupportedVersion);
        }
        self.server.validate()?;
        self.persistence.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            ZoneTallyError::Config(format!("server.listen must be a valid SocketAddr: {e}"))
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistenceSection {
    #[serde(default = "default_path")]
    pub path: PathBuf,

    #[serde(default = "default_save_interval_ms")]
    pub save_interval_ms: u64,
}

impl Default for PersistenceSection {
    fn default() -> Self {
        Self {
            path: default_path(),
            save_interval_ms: default_save_interval_ms(),
        }
    }
}

impl PersistenceSection {
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(ZoneTallyError::Config("persistence.path must not be empty".into()));
        }
        if self.path.file_name().is_none() {
            return Err(ZoneTallyError::Config(
                "persistence.path must name a file".into(),
            ));
        }
        if !(100..=3_600_000).contains(&self.save_interval_ms) {
            return Err(ZoneTallyError::Config(
                "persistence.save_interval_ms must be between 100 and 3600000".into(),
            ));
        }
        Ok(())
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_millis(self.save_interval_ms)
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".into()
}
fn default_path() -> PathBuf {
    PathBuf::from("counters.json")
}
fn default_save_interval_ms() -> u64 {
    5000
}
