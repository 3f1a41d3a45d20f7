//! Application configuration management.
//!
//! There are two layers of configuration:
//!
//! 1. **Server configuration** ([`Config`]): loaded once at startup from a YAML file with
//!    environment variable overrides. The file path defaults to `config.yaml` but can be
//!    specified via `-f` flag or `HUBRELAY_CONFIG` environment variable.
//! 2. **Account directory** ([`Directory`]): the webhook secret and the mention -> Slack
//!    account mapping. It is re-read from disk for every inbound hook, so edits take effect
//!    without a restart and each request works from its own snapshot.
//!
//! ## Loading Priority
//!
//! Server configuration sources are merged in the following order (later sources override
//! earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `HUBRELAY_` override YAML values
//! 3. **PORT** - Special case: overrides `port` if set, for platforms that inject it
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `HUBRELAY_SLACK__TIMEOUT=5s` sets the `slack.timeout` field.
//!
//! ## Account directory format
//!
//! TOML when the file extension is `.toml`, YAML otherwise:
//!
//! ```toml
//! secret = "webhook-secret"
//!
//! [accounts."@octocat"]
//! id = "@U024BE7LH"
//! channel = "/services/T000/B000/XXXX"
//! ```
//!
//! `GITHUB_WEBHOOK_SECRET`, when set, overrides `secret`.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use url::Url;

use crate::errors::Error;
use crate::slack::mentions::is_mention_token;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "HUBRELAY_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Where the per-request account directory is read from
    pub directory: DirectoryConfig,
    /// Outbound Slack delivery settings
    pub slack: SlackConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_otel_export: false,
            enable_metrics: false,
            directory: DirectoryConfig::default(),
            slack: SlackConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Path to the account directory file (default: `accounts.yaml`)
    pub path: PathBuf,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("accounts.yaml"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlackConfig {
    /// Base URL that account channels are resolved against (default: `https://hooks.slack.com`)
    pub base_url: Url,
    /// Timeout for a single delivery (default: 10s)
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Maximum deliveries in flight for one hook (default: 8)
    pub max_concurrent_sends: usize,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://hooks.slack.com").expect("default Slack URL is valid"),
            timeout: Duration::from_secs(10),
            max_concurrent_sends: 8,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.slack.max_concurrent_sends == 0 {
            return Err(Error::Internal {
                operation: "Config validation: slack.max_concurrent_sends must be at least 1".to_string(),
            });
        }
        if self.slack.base_url.cannot_be_a_base() {
            return Err(Error::Internal {
                operation: format!("Config validation: slack.base_url ({}) cannot be used as a base URL", self.slack.base_url),
            });
        }
        if self.slack.timeout.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: slack.timeout must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("HUBRELAY_").ignore(&["config"]).split("__"))
            // Common PORT pattern
            .merge(Env::raw().only(&["PORT"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A Slack account that a GitHub mention resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Account {
    /// Rendered inside `<...>` in place of the mention, e.g. `@U024BE7LH`
    pub id: String,
    /// Incoming-webhook path (or full URL) the notification is posted to
    pub channel: String,
}

/// Overrides [`Directory::secret`] when set and non-empty.
pub const SECRET_ENV: &str = "GITHUB_WEBHOOK_SECRET";

/// Webhook secret and mention -> account mapping for one request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Directory {
    /// May be left out of the file when `GITHUB_WEBHOOK_SECRET` provides it
    #[serde(default)]
    pub secret: String,
    /// Keyed by mention token, e.g. `@octocat`
    #[serde(default)]
    pub accounts: HashMap<String, Account>,
}

impl Directory {
    #[allow(clippy::result_large_err)]
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        let mut directory: Self = Self::figment(path).extract()?;

        // Read as raw text: the figment Env provider would turn `12345` into an integer
        if let Ok(secret) = std::env::var(SECRET_ENV)
            && !secret.is_empty()
        {
            directory.secret = secret;
        }

        directory.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(directory)
    }

    pub fn figment(path: &Path) -> Figment {
        let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Figment::new().merge(Toml::file(path))
        } else {
            Figment::new().merge(Yaml::file(path))
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.secret.is_empty() {
            return Err(Error::Internal {
                operation: "Directory validation: secret must not be empty".to_string(),
            });
        }

        for (mention, account) in &self.accounts {
            if !is_mention_token(mention) {
                return Err(Error::Internal {
                    operation: format!("Directory validation: account key '{mention}' is not a mention like '@name'"),
                });
            }
            if account.id.is_empty() || account.channel.is_empty() {
                return Err(Error::Internal {
                    operation: format!("Directory validation: account '{mention}' needs both id and channel"),
                });
            }
        }

        Ok(())
    }

    pub fn account(&self, mention: &str) -> Option<&Account> {
        self.accounts.get(mention)
    }
}

/// Where each request gets its [`Directory`] snapshot from.
#[derive(Debug, Clone)]
pub enum DirectorySource {
    /// Re-read the file on every request
    File(PathBuf),
    /// A fixed in-memory directory
    Static(Arc<Directory>),
}

impl DirectorySource {
    pub async fn snapshot(&self) -> Result<Arc<Directory>, Error> {
        match self {
            DirectorySource::File(path) => {
                let path = path.clone();
                let directory = tokio::task::spawn_blocking(move || Directory::load(&path))
                    .await
                    .map_err(|e| Error::Internal {
                        operation: format!("join directory loader: {e}"),
                    })??;
                Ok(Arc::new(directory))
            }
            DirectorySource::Static(directory) => Ok(directory.clone()),
        }
    }
}

impl From<&DirectoryConfig> for DirectorySource {
    fn from(config: &DirectoryConfig) -> Self {
        DirectorySource::File(config.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.bind_address(), "0.0.0.0:8080");
            assert_eq!(config.slack.base_url.as_str(), "https://hooks.slack.com/");
            assert_eq!(config.slack.timeout, Duration::from_secs(10));
            assert_eq!(config.directory.path, PathBuf::from("accounts.yaml"));
            assert!(!config.enable_metrics);
            Ok(())
        });
    }

    #[test]
    fn test_yaml_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
host: 127.0.0.1
port: 3000
enable_metrics: true
directory:
  path: /etc/hubrelay/accounts.toml
slack:
  base_url: http://slack.internal:8081
  timeout: 2s
  max_concurrent_sends: 2
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.bind_address(), "127.0.0.1:3000");
            assert!(config.enable_metrics);
            assert_eq!(config.directory.path, PathBuf::from("/etc/hubrelay/accounts.toml"));
            assert_eq!(config.slack.base_url.as_str(), "http://slack.internal:8081/");
            assert_eq!(config.slack.timeout, Duration::from_secs(2));
            assert_eq!(config.slack.max_concurrent_sends, 2);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 3000\nslack:\n  timeout: 2s\n")?;
            jail.set_env("HUBRELAY_SLACK__TIMEOUT", "500ms");
            jail.set_env("HUBRELAY_CONFIG", "test.yaml");

            let config = Config::load(&args("test.yaml"))?;
            assert_eq!(config.port, 3000);
            assert_eq!(config.slack.timeout, Duration::from_millis(500));

            jail.set_env("PORT", "9000");
            let config = Config::load(&args("test.yaml"))?;
            assert_eq!(config.port, 9000);
            Ok(())
        });
    }

    #[test]
    fn test_unknown_fields_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "hots: 127.0.0.1\n")?;
            assert!(Config::load(&args("test.yaml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "slack:\n  max_concurrent_sends: 0\n")?;
            let err = Config::load(&args("test.yaml")).unwrap_err();
            assert!(err.to_string().contains("max_concurrent_sends"));

            jail.create_file("test.yaml", "slack:\n  base_url: \"mailto:ops@example.com\"\n")?;
            assert!(Config::load(&args("test.yaml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_toml_directory() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "accounts.toml",
                r#"
secret = "aaa"

[accounts."@bbb"]
id = "ccc"
channel = "ddd"
"#,
            )?;

            let directory = Directory::load(Path::new("accounts.toml"))?;
            assert_eq!(directory.secret, "aaa");
            assert_eq!(
                directory.account("@bbb"),
                Some(&Account {
                    id: "ccc".to_string(),
                    channel: "ddd".to_string(),
                })
            );
            assert!(directory.account("@ccc").is_none());
            Ok(())
        });
    }

    #[test]
    fn test_yaml_directory_with_env_secret() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "accounts.yaml",
                r#"
secret: from-file
accounts:
  "@octocat":
    id: "@U024BE7LH"
    channel: /services/T000/B000/XXXX
"#,
            )?;

            let directory = Directory::load(Path::new("accounts.yaml"))?;
            assert_eq!(directory.secret, "from-file");
            assert_eq!(directory.accounts.len(), 1);

            jail.set_env("GITHUB_WEBHOOK_SECRET", "from-env");
            let directory = Directory::load(Path::new("accounts.yaml"))?;
            assert_eq!(directory.secret, "from-env");
            Ok(())
        });
    }

    #[test]
    fn test_env_secret_is_kept_as_text() {
        Jail::expect_with(|jail| {
            jail.create_file("accounts.yaml", "accounts: {}\n")?;

            for secret in ["12345", "0042", "true", "1.5"] {
                jail.set_env("GITHUB_WEBHOOK_SECRET", secret);
                let directory = Directory::load(Path::new("accounts.yaml"))?;
                assert_eq!(directory.secret, secret);
            }
            Ok(())
        });
    }

    #[test]
    fn test_directory_validation() {
        Jail::expect_with(|jail| {
            jail.create_file("empty-secret.yaml", "secret: \"\"\n")?;
            assert!(Directory::load(Path::new("empty-secret.yaml")).is_err());

            jail.create_file("no-secret.yaml", "accounts: {}\n")?;
            assert!(Directory::load(Path::new("no-secret.yaml")).is_err());

            jail.create_file(
                "bad-key.yaml",
                "secret: s\naccounts:\n  octocat:\n    id: U1\n    channel: /services/x\n",
            )?;
            let err = Directory::load(Path::new("bad-key.yaml")).unwrap_err();
            assert!(err.to_string().contains("octocat"));

            jail.create_file(
                "no-channel.yaml",
                "secret: s\naccounts:\n  \"@octocat\":\n    id: U1\n    channel: \"\"\n",
            )?;
            assert!(Directory::load(Path::new("no-channel.yaml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_file_source_rereads_each_snapshot() {
        // Inside the jail so GITHUB_WEBHOOK_SECRET set by other tests cannot leak in
        Jail::expect_with(|jail| {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let source = DirectorySource::File(jail.directory().join("accounts.yaml"));

            jail.create_file("accounts.yaml", "secret: first\n")?;
            assert_eq!(runtime.block_on(source.snapshot()).unwrap().secret, "first");

            jail.create_file("accounts.yaml", "secret: second\n")?;
            assert_eq!(runtime.block_on(source.snapshot()).unwrap().secret, "second");

            jail.create_file("accounts.yaml", "secret: [unterminated\n")?;
            assert!(matches!(runtime.block_on(source.snapshot()), Err(Error::Directory(_))));
            Ok(())
        });
    }
}
