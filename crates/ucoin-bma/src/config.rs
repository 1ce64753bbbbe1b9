use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::endpoint::BmaEndpoint;
use crate::error::{BmaError, BmaResult};

/// Client settings, usually read from a TOML file.
///
/// ```toml
/// endpoint = "BASIC_MERKLED_API cgeek.fr 9330"
/// timeout_secs = 30
/// credentials_file = "/home/me/.ucoin/credentials"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Node endpoint in peer-document form.
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Salt on the first line, password on the second.
    pub credentials_file: Option<PathBuf>,
    /// Ask the node for signed (`multipart/signed`) responses.
    pub signed_responses: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "BASIC_MERKLED_API localhost 8081".into(),
            timeout_secs: 30,
            credentials_file: None,
            signed_responses: false,
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> BmaResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| BmaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|reason| BmaError::Config {
            path: path.to_path_buf(),
            reason,
        })?;
        debug!(path = %path.display(), endpoint = %config.endpoint, "client config loaded");
        Ok(config)
    }

    fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    pub fn endpoint(&self) -> BmaResult<BmaEndpoint> {
        BmaEndpoint::from_inline(&self.endpoint)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ClientConfig::default();
        assert_eq!(c.timeout(), Duration::from_secs(30));
        assert!(c.credentials_file.is_none());
        assert!(!c.signed_responses);
        let endpoint = c.endpoint().unwrap();
        assert_eq!(endpoint.server.as_deref(), Some("localhost"));
        assert_eq!(endpoint.port, 8081);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let c = ClientConfig::from_toml("endpoint = \"BASIC_MERKLED_API cgeek.fr 9330\"\n").unwrap();
        assert_eq!(c.endpoint().unwrap().port, 9330);
        assert_eq!(c.timeout_secs, 30);
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ucoin.toml");
        std::fs::write(
            &path,
            "timeout_secs = 5\ncredentials_file = \"/tmp/creds\"\nsigned_responses = true\n",
        )
        .unwrap();
        let c = ClientConfig::load(&path).unwrap();
        assert_eq!(c.timeout_secs, 5);
        assert_eq!(c.credentials_file, Some(PathBuf::from("/tmp/creds")));
        assert!(c.signed_responses);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ucoin.toml");
        std::fs::write(&path, "timeout_secs = \"soon\"\n").unwrap();
        assert!(matches!(ClientConfig::load(&path), Err(BmaError::Config { .. })));
    }

    #[test]
    fn missing_file_is_io() {
        assert!(matches!(
            ClientConfig::load(Path::new("/nonexistent/ucoin.toml")),
            Err(BmaError::Io { .. })
        ));
    }
}
