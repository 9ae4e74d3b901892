//! On-disk deployment configuration (spec §10): one TOML file describing
//! where a `holomush serve` process binds, where it keeps its mTLS
//! identity, and where it finds a credentials table.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_bind() -> String {
    "127.0.0.1:7890".to_string()
}

fn default_identity_dir() -> PathBuf {
    PathBuf::from("./holomush-identity")
}

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Address the RPC listener binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Deployment identifier stamped into generated certificates' SANs.
    pub game_id: String,

    /// Directory holding the CA and server leaf persisted by `gen-ca`/`gen-cert`.
    #[serde(default = "default_identity_dir")]
    pub identity_dir: PathBuf,

    /// Name of the server leaf under `identity_dir` (as `<name>.crt`/`.key`).
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Path to a [`StaticCredentialVerifier`] TOML table. Omit to run
    /// without authentication configured (every `Authenticate` call fails).
    ///
    /// [`StaticCredentialVerifier`]: holomush_store::StaticCredentialVerifier
    pub credentials_file: Option<PathBuf>,

    /// Require mutual TLS. `false` is for local development only.
    #[serde(default = "default_true")]
    pub tls: bool,
}

fn default_server_name() -> String {
    "server".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| Error::config(format!("reading {}: {err}", path.display())))?;
        toml::from_str(&contents).map_err(|err| Error::config(format!("parsing {}: {err}", path.display())))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn minimal_table_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"game_id = "westmarch""#).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.bind, "127.0.0.1:7890");
        assert_eq!(config.server_name, "server");
        assert!(config.tls);
        assert!(config.credentials_file.is_none());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        assert!(Config::load(Path::new("/nonexistent/holomush.toml")).is_err());
    }
}
