use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_derive::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "config.json";

/// Connection settings for the Porkbun API.
///
/// Everything apart from `endpoint` is treated as an opaque credential
/// (`apikey`, `secretapikey`, ...) and sent along with every request.
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub endpoint: Box<str>,

    #[serde(flatten)]
    pub credentials: BTreeMap<Box<str>, Box<str>>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration found, looked at: {0}")]
    NotFound(Box<str>),

    #[error("unable to read {0}: {1}")]
    Read(PathBuf, io::Error),

    #[error("unable to parse {0}: {1}")]
    Parse(PathBuf, Box<str>),
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = self
            .credentials
            .keys()
            .map(|key| (key, "<redacted>"))
            .collect::<BTreeMap<_, _>>();

        f.debug_struct("ApiConfig")
            .field("endpoint", &self.endpoint)
            .field("credentials", &redacted)
            .finish()
    }
}

impl ApiConfig {
    /// Parses a config file. Files ending in `.toml` are read as TOML,
    /// everything else as JSON.
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let is_toml = path.extension().is_some_and(|ext| ext == "toml");

        let parsed = if is_toml {
            toml::from_str::<ApiConfig>(text).map_err(|e| e.to_string())
        } else {
            serde_json::from_str::<ApiConfig>(text).map_err(|e| e.to_string())
        };

        parsed.map_err(|e| ConfigError::Parse(path.to_owned(), e.into()))
    }

    /// Loads the first config file that exists among `candidates`.
    pub fn load(candidates: &[PathBuf]) -> Result<(PathBuf, Self), ConfigError> {
        for path in candidates {
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(ConfigError::Read(path.clone(), e)),
            };

            let config = Self::parse(path, &text)?;
            return Ok((path.clone(), config));
        }

        let looked_at = candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");

        Err(ConfigError::NotFound(looked_at.into()))
    }

    /// Builds a request body: this config merged with the call-specific
    /// `fields`. Call-specific fields win on conflicts.
    pub fn merged_with(&self, fields: Value) -> Value {
        let mut body = Map::new();
        body.insert("endpoint".into(), Value::from(&*self.endpoint));

        for (key, value) in &self.credentials {
            body.insert(key.to_string(), Value::from(&**value));
        }

        if let Value::Object(fields) = fields {
            body.extend(fields);
        }

        Value::Object(body)
    }
}

/// Where to look for the config file when `--config` isn't given: next to
/// the executable first, then the working directory.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(2);

    if let Some(dir) = install_dir() {
        paths.push(dir.join(CONFIG_FILE_NAME));
    }

    paths.push(PathBuf::from(".").join(CONFIG_FILE_NAME));
    paths
}

/// The directory holding the running executable, if it can be determined.
pub fn install_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
