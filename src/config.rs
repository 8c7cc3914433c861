use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that points at an alternative settings file.
pub const CONFIG_PATH_ENV_VAR: &str = "SENSU_CLI_CONFIG";

pub const SYSTEM_CONFIG_PATH: &str = "/etc/sensu/sensu-cli/settings.toml";

const DEFAULT_SETTINGS: &str = r#"# sensu-cli settings
host = "127.0.0.1"
port = 4567
ssl = false

# With ssl enabled the server certificate is NOT verified unless this is true.
verify_tls = false

# Basic authentication is used only when both are set.
# user = "admin"
# password = "secret"
"#;

/// Connection settings for the Sensu API.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub ssl: bool,
    pub verify_tls: bool,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: String::from("127.0.0.1"),
            port: 4567,
            ssl: false,
            verify_tls: false,
            user: None,
            password: None,
        }
    }
}

impl Config {
    /// Resolves the settings file and parses it.
    ///
    /// An explicit path wins over `SENSU_CLI_CONFIG`, which wins over
    /// `~/.sensu/settings.toml` and then the system-wide file. When none of
    /// them exists a default file is written to the user location and
    /// `Error::ConfigCreated` is returned.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Config::from_path(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV_VAR) {
            return Config::from_path(Path::new(&path));
        }

        let user_path = user_config_path();
        match locate(user_path.as_deref(), Path::new(SYSTEM_CONFIG_PATH)) {
            Some(path) => Config::from_path(&path),
            None => {
                let target = user_path.ok_or_else(|| Error::Config {
                    message: "could not determine home directory".to_owned(),
                })?;
                write_default(&target)?;
                Err(Error::ConfigCreated(target))
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading settings");
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
        })?;
        config.validated()
    }

    fn validated(self) -> Result<Self> {
        if self.host.trim().is_empty() {
            return Err(Error::Config {
                message: "host must not be empty".to_owned(),
            });
        }
        Ok(self)
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }

    pub fn accepts_invalid_certs(&self) -> bool {
        self.ssl && !self.verify_tls
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".sensu").join("settings.toml"))
}

fn locate(user: Option<&Path>, system: &Path) -> Option<PathBuf> {
    user.filter(|path| path.is_file())
        .or_else(|| Some(system).filter(|path| path.is_file()))
        .map(Path::to_path_buf)
}

fn write_default(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Config {
            message: format!("failed to create {}: {}", parent.display(), e),
        })?;
    }
    fs::write(path, DEFAULT_SETTINGS).map_err(|e| Error::Config {
        message: format!("failed to write {}: {}", path.display(), e),
    })
}
