// LobbyScout - platform/config.rs
//
// Config file discovery, config.toml loading, and startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.
//
// Search order for config.toml:
//   1. the path given with --config
//   2. the current working directory
//   3. the platform config directory
//
// The three identity fields are required and a missing one is fatal. Tuning
// values that are out of range produce warnings and fall back to defaults.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved platform paths for LobbyScout configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/lobbyscout/ or %APPDATA%\LobbyScout\config\)
    pub config_dir: Option<PathBuf>,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Runs before logging is initialised, so nothing is logged here; the
    /// caller reports a missing `config_dir` once logging is up.
    pub fn resolve() -> Self {
        Self {
            config_dir: ProjectDirs::from("", "", constants::APP_ID)
                .map(|dirs| dirs.config_dir().to_path_buf()),
        }
    }
}

// =============================================================================
// config.toml shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// Name shown as the title of every notification.
    pub player_name: Option<String>,
    /// Game install directory; session logs live in its `Logs` subdirectory.
    #[serde(alias = "eft_install_dir")]
    pub install_dir: Option<String>,
    /// Webhook that receives live lobby notifications.
    pub webhook_url: Option<String>,
    /// `[tail]` section.
    pub tail: TailSection,
    /// `[network]` section.
    pub network: NetworkSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[tail]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct TailSection {
    /// Wait between read attempts once the file is drained (ms).
    pub poll_interval_ms: Option<u64>,
    /// Empty reads tolerated before checking for a newer session log.
    pub rotation_check_threshold: Option<u32>,
}

/// `[network]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    /// Per-request timeout for the lookup and webhook calls (seconds).
    pub request_timeout_secs: Option<u64>,
    /// Base URL of the IP-to-country service.
    pub geolocation_base_url: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated, immutable application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub player_name: String,
    pub install_dir: PathBuf,
    pub webhook_url: String,

    // -- Tail --
    pub poll_interval: Duration,
    pub rotation_check_threshold: u32,

    // -- Network --
    pub request_timeout: Duration,
    pub geolocation_base_url: String,

    // -- Logging --
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Directory holding one subdirectory per game session.
    pub fn logs_root(&self) -> PathBuf {
        self.install_dir.join(constants::LOGS_DIR_NAME)
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Locate config.toml using the documented search order.
pub fn find_config_file(
    cli_path: Option<&Path>,
    paths: &PlatformPaths,
) -> Result<PathBuf, ConfigError> {
    let candidates: Vec<PathBuf> = match cli_path {
        Some(p) => vec![p.to_path_buf()],
        None => {
            let mut c = vec![PathBuf::from(constants::CONFIG_FILE_NAME)];
            if let Some(dir) = &paths.config_dir {
                c.push(dir.join(constants::CONFIG_FILE_NAME));
            }
            c
        }
    };

    match candidates.iter().find(|p| p.is_file()) {
        Some(found) => Ok(found.clone()),
        None => Err(ConfigError::NotFound {
            searched: candidates,
        }),
    }
}

/// A validated config and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: AppConfig,
    /// Non-fatal problems, e.g. out-of-range values replaced by defaults.
    pub warnings: Vec<String>,
}

/// Read and validate the config file at `path`.
///
/// Nothing is logged: the log level comes from this file, so the caller
/// reports the result after logging is initialised.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let raw: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;

    let (config, warnings) = validate(raw)?;
    Ok(LoadedConfig {
        path: path.to_path_buf(),
        config,
        warnings,
    })
}

/// Validate a parsed config against named constants.
pub fn validate(raw: RawConfig) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let player_name = required(raw.player_name, "player_name")?;
    let install_dir = PathBuf::from(required(raw.install_dir, "install_dir")?);
    let webhook_url = required(raw.webhook_url, "webhook_url")?;
    if !is_http_url(&webhook_url) {
        return Err(ConfigError::InvalidValue {
            field: "webhook_url",
            reason: "must start with http:// or https://".to_string(),
        });
    }

    let mut warnings: Vec<String> = Vec::new();

    // -- Tail: poll_interval_ms --
    let mut poll_interval_ms = constants::DEFAULT_TAIL_POLL_INTERVAL_MS;
    if let Some(ms) = raw.tail.poll_interval_ms {
        if (constants::MIN_TAIL_POLL_INTERVAL_MS..=constants::MAX_TAIL_POLL_INTERVAL_MS)
            .contains(&ms)
        {
            poll_interval_ms = ms;
        } else {
            warnings.push(format!(
                "[tail] poll_interval_ms = {ms} is out of range ({}-{}). Using default ({}).",
                constants::MIN_TAIL_POLL_INTERVAL_MS,
                constants::MAX_TAIL_POLL_INTERVAL_MS,
                constants::DEFAULT_TAIL_POLL_INTERVAL_MS,
            ));
        }
    }

    // -- Tail: rotation_check_threshold --
    let mut rotation_check_threshold = constants::DEFAULT_ROTATION_CHECK_THRESHOLD;
    if let Some(n) = raw.tail.rotation_check_threshold {
        if (constants::MIN_ROTATION_CHECK_THRESHOLD..=constants::MAX_ROTATION_CHECK_THRESHOLD)
            .contains(&n)
        {
            rotation_check_threshold = n;
        } else {
            warnings.push(format!(
                "[tail] rotation_check_threshold = {n} is out of range ({}-{}). Using default ({}).",
                constants::MIN_ROTATION_CHECK_THRESHOLD,
                constants::MAX_ROTATION_CHECK_THRESHOLD,
                constants::DEFAULT_ROTATION_CHECK_THRESHOLD,
            ));
        }
    }

    // -- Network: request_timeout_secs --
    let mut request_timeout_secs = constants::DEFAULT_REQUEST_TIMEOUT_SECS;
    if let Some(secs) = raw.network.request_timeout_secs {
        if (constants::MIN_REQUEST_TIMEOUT_SECS..=constants::MAX_REQUEST_TIMEOUT_SECS)
            .contains(&secs)
        {
            request_timeout_secs = secs;
        } else {
            warnings.push(format!(
                "[network] request_timeout_secs = {secs} is out of range ({}-{}). Using default ({}).",
                constants::MIN_REQUEST_TIMEOUT_SECS,
                constants::MAX_REQUEST_TIMEOUT_SECS,
                constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            ));
        }
    }

    // -- Network: geolocation_base_url --
    let mut geolocation_base_url = constants::DEFAULT_GEOLOCATION_BASE_URL.to_string();
    if let Some(url) = raw.network.geolocation_base_url {
        if is_http_url(&url) {
            geolocation_base_url = url.trim_end_matches('/').to_string();
        } else {
            warnings.push(format!(
                "[network] geolocation_base_url = \"{url}\" is not an http(s) URL. Using default ({}).",
                constants::DEFAULT_GEOLOCATION_BASE_URL,
            ));
        }
    }

    // -- Logging: level --
    let mut log_level = None;
    if let Some(level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    let config = AppConfig {
        player_name,
        install_dir,
        webhook_url,
        poll_interval: Duration::from_millis(poll_interval_ms),
        rotation_check_threshold,
        request_timeout: Duration::from_secs(request_timeout_secs),
        geolocation_base_url,
        log_level,
    };

    Ok((config, warnings))
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::MissingField { field }),
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
