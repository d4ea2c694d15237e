use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Deserialize;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::net::Ipv4Addr;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/pfx2cer/pfx2cer.toml";

/// The content of `pfx2cer.toml`
///
/// ```toml
/// [http]
/// bind_address = "127.0.0.1"
/// port = 8000
/// max_upload_size = 1048576
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Pfx2CerConfig {
    pub http: HttpSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSettings {
    /// The address the HTTP endpoint listens on
    pub bind_address: IpAddr,

    /// The port the HTTP endpoint listens on
    pub port: u16,

    /// The maximum size in bytes of an upload request, PFX file and password included
    pub max_upload_size: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            max_upload_size: 1024 * 1024,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read the configuration file {path}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse the configuration file {path}")]
    Parse {
        path: Utf8PathBuf,
        source: toml::de::Error,
    },
}

impl Pfx2CerConfig {
    /// Load the configuration
    ///
    /// - from `config_file` when given, this file being then mandatory,
    /// - or from [DEFAULT_CONFIG_PATH], falling back to the default settings when there is no such file.
    pub fn load(config_file: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        match config_file {
            Some(path) => Self::load_file(path),
            None => {
                let path = Utf8Path::new(DEFAULT_CONFIG_PATH);
                match Self::load_file(path) {
                    Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                        Ok(Self::default())
                    }
                    result => result,
                }
            }
        }
    }

    pub fn load_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn utf8_path(file: &NamedTempFile) -> &Utf8Path {
        Utf8Path::from_path(file.path()).unwrap()
    }

    #[test]
    fn an_empty_file_gives_the_default_settings() {
        let file = config_file("");

        let config = Pfx2CerConfig::load(Some(utf8_path(&file))).unwrap();

        assert_eq!(config, Pfx2CerConfig::default());
        assert_eq!(config.http.port, 8000);
        assert_eq!(config.http.bind_address.to_string(), "127.0.0.1");
        assert_eq!(config.http.max_upload_size, 1048576);
    }

    #[test]
    fn unset_keys_keep_their_default_value() {
        let file = config_file(
            r#"
            [http]
            port = 8443
            "#,
        );

        let config = Pfx2CerConfig::load(Some(utf8_path(&file))).unwrap();

        assert_eq!(config.http.port, 8443);
        assert_eq!(config.http.bind_address.to_string(), "127.0.0.1");
    }

    #[test]
    fn all_http_settings_can_be_set() {
        let file = config_file(
            r#"
            [http]
            bind_address = "0.0.0.0"
            port = 9000
            max_upload_size = 4096
            "#,
        );

        let config = Pfx2CerConfig::load(Some(utf8_path(&file))).unwrap();

        assert_eq!(
            config.http,
            HttpSettings {
                bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                port: 9000,
                max_upload_size: 4096,
            }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = config_file(
            r#"
            [http]
            prot = 9000
            "#,
        );

        let err = Pfx2CerConfig::load(Some(utf8_path(&file))).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn an_explicit_config_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("missing.toml")).unwrap();

        let err = Pfx2CerConfig::load(Some(&path)).unwrap_err();

        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
