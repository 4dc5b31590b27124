//! Controller configuration file.

use std::{collections::HashSet, fs::File, io::BufReader, path::Path, time::Duration};

use serde::Deserialize;

use crate::error::ConfigError;

/// Configuration of a controller session.
#[derive(Clone, Debug, Deserialize)]
pub struct ControllerConfiguration {
    /// Computation servers, in worker index order.
    pub servers: Vec<ServerConfiguration>,
    /// Upper bound on establishing each server connection. Unbounded if absent.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

/// Details about one computation server.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfiguration {
    pub name: String,
    /// `host:port` the server listens on.
    pub address: String,
}

impl ControllerConfiguration {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ControllerConfiguration = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.servers.is_empty() {
            return Err(ConfigError::NoServers {
                path: path.to_path_buf(),
            });
        }
        let mut seen = HashSet::new();
        for server in &self.servers {
            if !seen.insert(server.name.as_str()) {
                return Err(ConfigError::DuplicateServer {
                    path: path.to_path_buf(),
                    name: server.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}
