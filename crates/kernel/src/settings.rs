use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "LIBADMIN_ENV";
const CONFIG_DIR_ENV: &str = "LIBADMIN_CONFIG_DIR";
const ENV_PREFIX: &str = "LIBADMIN";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub launcher: LauncherSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load `base.toml` and `{environment}.toml` from `config_dir`, then
    /// `LIBADMIN_*` variables (`__` separates nested keys).
    pub fn load_from(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        let parsed_environment: Environment = environment.parse()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let cfg = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parsed_environment;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "TelemetrySettings::default_level")]
    pub level: String,
}

impl TelemetrySettings {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Lending rules and console behavior of the inventory ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerSettings {
    /// Days until a loan is due when the borrower gives no date
    #[serde(default = "LedgerSettings::default_loan_period_days")]
    pub loan_period_days: u32,
    /// Late fee charged per overdue day, in whole currency units
    #[serde(default = "LedgerSettings::default_daily_fine")]
    pub daily_fine: u64,
    /// How long a status notice stays visible
    #[serde(default = "LedgerSettings::default_notice_ttl_ms")]
    pub notice_ttl_ms: u64,
    #[serde(default = "LedgerSettings::default_seed_demo_data")]
    pub seed_demo_data: bool,
}

impl LedgerSettings {
    fn default_loan_period_days() -> u32 {
        14
    }

    fn default_daily_fine() -> u64 {
        5
    }

    fn default_notice_ttl_ms() -> u64 {
        5000
    }

    fn default_seed_demo_data() -> bool {
        true
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            loan_period_days: Self::default_loan_period_days(),
            daily_fine: Self::default_daily_fine(),
            notice_ttl_ms: Self::default_notice_ttl_ms(),
            seed_demo_data: Self::default_seed_demo_data(),
        }
    }
}

/// Commands run by the `api` and `dev` launchers.
#[derive(Debug, Clone, Deserialize)]
pub struct LauncherSettings {
    /// Build tool the `api` launcher forwards its arguments to
    #[serde(default = "LauncherSettings::default_build_tool")]
    pub build_tool: String,
    /// Working directory of the build tool
    #[serde(default = "LauncherSettings::default_api_dir")]
    pub api_dir: PathBuf,
    /// Arguments the `dev` launcher passes to `api` for the backend
    #[serde(default = "LauncherSettings::default_backend_args")]
    pub backend_args: Vec<String>,
    /// Package manager that runs the web project (`npm`, `npm.cmd` on Windows)
    #[serde(default = "LauncherSettings::default_web_tool")]
    pub web_tool: String,
    /// Web project started by `<web_tool> --prefix <dir> run <script>`
    #[serde(default = "LauncherSettings::default_web_dir")]
    pub web_dir: PathBuf,
    #[serde(default = "LauncherSettings::default_web_script")]
    pub web_script: String,
    /// How long a child may take to exit after SIGTERM before it is killed
    #[serde(default = "LauncherSettings::default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

impl LauncherSettings {
    fn default_build_tool() -> String {
        "cargo".to_string()
    }

    fn default_api_dir() -> PathBuf {
        PathBuf::from(".")
    }

    fn default_backend_args() -> Vec<String> {
        vec![
            "run".to_string(),
            "--bin".to_string(),
            "libadmin-app".to_string(),
        ]
    }

    fn default_web_tool() -> String {
        if cfg!(windows) { "npm.cmd" } else { "npm" }.to_string()
    }

    fn default_web_dir() -> PathBuf {
        PathBuf::from("apps/web/library-mini-admin-web")
    }

    fn default_web_script() -> String {
        "dev".to_string()
    }

    fn default_stop_grace_ms() -> u64 {
        5000
    }
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            build_tool: Self::default_build_tool(),
            api_dir: Self::default_api_dir(),
            backend_args: Self::default_backend_args(),
            web_tool: Self::default_web_tool(),
            web_dir: Self::default_web_dir(),
            web_script: Self::default_web_script(),
            stop_grace_ms: Self::default_stop_grace_ms(),
        }
    }
}
