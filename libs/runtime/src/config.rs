use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main application configuration with strongly-typed global sections
/// and a flexible per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Core server configuration.
    pub server: ServerConfig,
    /// Basic-auth credentials guarding the API.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Per-module configuration bag: module_name → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub home_dir: String, // will be normalized to absolute path
    pub host: String,
    pub port: u16,
    /// Per-request timeout in seconds, 0 = ingress default.
    #[serde(default)]
    pub timeout_sec: u64,
}

/// The single credential pair accepted by the API.
#[derive(Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Realm advertised in the `WWW-Authenticate` challenge.
    #[serde(default)]
    pub realm: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .field("realm", &self.realm)
            .finish()
    }
}

const REDACTED: &str = "***";

impl AuthConfig {
    /// Both halves of the credential pair must be configured.
    pub fn ensure_configured(&self) -> Result<()> {
        if self.username.is_empty() {
            bail!("auth.username is not configured (set it in the config file or APP__AUTH__USERNAME)");
        }
        if self.password.is_empty() {
            bail!("auth.password is not configured (set it in the config file or APP__AUTH__PASSWORD)");
        }
        Ok(())
    }
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    #[serde(default)]
    pub file: String, // "logs/api.log", empty = no file
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>, // How many rotated files to keep
    #[serde(default)]
    pub max_size_mb: Option<u64>, // Max size of the file in MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Empty => $HOME/.users-server
            home_dir: String::new(),
            host: "127.0.0.1".to_string(),
            port: 8087,
            timeout_sec: 0,
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/users-server.log".to_string(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            logging: Some(default_logging_config()),
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    /// Also normalizes `server.home_dir` into an absolute path and creates the directory.
    pub fn load_layered(config_path: Option<&Path>) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        // Start from a minimal base where logging is None, so it stays None
        // unless explicitly provided by YAML/ENV.
        let base = AppConfig {
            logging: None,
            ..AppConfig::default()
        };

        let mut figment = Figment::new().merge(Serialized::defaults(base));
        if let Some(path) = config_path {
            if !path.is_file() {
                bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        // Example: APP__SERVER__PORT=8087 maps to server.port
        figment = figment.merge(
            Env::prefixed("APP__")
                .filter(|key| !is_raw_env_key(key.as_str()))
                .split("__"),
        );
        // Credentials are taken verbatim; figment would parse "007123" as a number.
        for (var, path) in RAW_ENV_KEYS {
            if let Ok(value) = std::env::var(var) {
                figment = figment.merge(Serialized::default(path, value));
            }
        }

        let mut config: AppConfig = figment
            .extract()
            .with_context(|| "Failed to extract config from figment".to_string())?;

        normalize_home_dir_inplace(&mut config.server)
            .context("Failed to resolve server.home_dir")?;

        Ok(config)
    }

    /// Serialize configuration to YAML with the password redacted.
    pub fn to_yaml(&self) -> Result<String> {
        let mut redacted = self.clone();
        if !redacted.auth.password.is_empty() {
            redacted.auth.password = REDACTED.to_string();
        }
        serde_yaml::to_string(&redacted).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        // Set logging level based on verbose flags for "default" section.
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                0 => default_section.console_level.clone(), // keep
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }

    /// Typed view of one entry in the `modules` bag; a missing entry yields defaults.
    pub fn module_config<T>(&self, module_name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.modules.get(module_name) {
            None => Ok(T::default()),
            Some(raw) => serde_json::from_value(raw.clone())
                .with_context(|| format!("Invalid configuration for module '{module_name}'")),
        }
    }
}

/// Command line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub port: Option<u16>,
    pub verbose: u8,
}

/// Environment variables merged as plain strings, with their config paths.
const RAW_ENV_KEYS: [(&str, &str); 2] = [
    ("APP__AUTH__USERNAME", "auth.username"),
    ("APP__AUTH__PASSWORD", "auth.password"),
];

/// `key` has the `APP__` prefix already stripped.
fn is_raw_env_key(key: &str) -> bool {
    RAW_ENV_KEYS
        .iter()
        .any(|(var, _)| var["APP__".len()..].eq_ignore_ascii_case(key))
}

const DEFAULT_HOME_SUBDIR: &str = ".users-server";

fn user_home() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// Resolve `server.home_dir` to an absolute path (expanding `~`), create it and store it back.
fn normalize_home_dir_inplace(server: &mut ServerConfig) -> Result<()> {
    let raw = server.home_dir.trim();
    let resolved: PathBuf = if raw.is_empty() {
        user_home()
            .context("cannot determine the user home directory")?
            .join(DEFAULT_HOME_SUBDIR)
    } else if let Some(rest) = raw.strip_prefix('~') {
        let home = user_home().context("cannot expand '~' in home_dir")?;
        home.join(rest.trim_start_matches(['/', '\\']))
    } else {
        let p = PathBuf::from(raw);
        if p.is_absolute() {
            p
        } else {
            std::env::current_dir()?.join(p)
        }
    };

    std::fs::create_dir_all(&resolved)
        .with_context(|| format!("cannot create home_dir {}", resolved.display()))?;

    server.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}
