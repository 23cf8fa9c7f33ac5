use serde::Deserialize;
use snafu::{ResultExt, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

pub const CLIENT_NAME: &str = "LumiSysex";
pub const PORT_PREFIX: &str = "LUMI";
pub const LISTEN_MILLIS: u64 = 500;

type Result<T> = ::std::result::Result<T, ConfigError>;

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("Could not read config {}: {}", path.display(), source))]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Bad config {}: {}", path.display(), source))]
    ParseConfig {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Runtime settings of the MIDI side. Codec behavior is not configurable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name under which the MIDI clients register.
    pub client_name: String,
    /// Ports whose name starts with this are considered LUMI blocks.
    pub port_prefix: String,
    /// How long to collect replies after a request.
    pub listen_millis: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            client_name: CLIENT_NAME.to_owned(),
            port_prefix: PORT_PREFIX.to_owned(),
            listen_millis: LISTEN_MILLIS,
        }
    }
}

impl Config {
    /// Defaults, or the YAML file at `path` layered over them.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        match path {
            None => Ok(Config::default()),
            Some(path) => {
                let body = fs::read_to_string(path).context(ReadConfig { path })?;
                Config::parse(&body).context(ParseConfig { path })
            }
        }
    }

    pub fn parse(body: &str) -> ::std::result::Result<Config, serde_yaml::Error> {
        serde_yaml::from_str(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_keys_take_defaults() {
        let config = Config::parse("port_prefix: LUMI Keys BLOCK\n").unwrap();
        assert_eq!(config.port_prefix, "LUMI Keys BLOCK");
        assert_eq!(config.client_name, CLIENT_NAME);
        assert_eq!(config.listen_millis, LISTEN_MILLIS);
    }

    #[test]
    fn no_file_means_defaults() {
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "client_name: Tester\nlisten_millis: 1200").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.client_name, "Tester");
        assert_eq!(config.listen_millis, 1200);
        assert_eq!(config.port_prefix, PORT_PREFIX);
    }

    #[test]
    fn bad_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen_millis: [1, 2]").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        match err {
            ConfigError::ParseConfig { ref path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::load(Some(Path::new("/nonexistent/lumi.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadConfig { .. }));
    }
}
