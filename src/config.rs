//! Runtime configuration for the relay
//!
//! All settings are read once at startup into an immutable [`AppConfig`] and
//! passed to components at construction. There is no process-wide mutable
//! provider state; tests build configs directly with mock credentials.
//!
//! Secrets (the FedaPay API key and the webhook endpoint secret) are held as
//! [`SecretString`] so they are redacted from debug output.
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `FEDAPAY_SECRET_KEY` | required | FedaPay API secret key (`sk_...`) |
//! | `FEDAPAY_ENVIRONMENT` | `sandbox` | `sandbox` or `live` |
//! | `FEDAPAY_API_BASE` | per environment | API base URL override |
//! | `FEDAPAY_CURRENCY` | `XOF` | ISO currency code for new transactions |
//! | `FEDAPAY_TIMEOUT_SECS` | `30` | Outbound request timeout |
//! | `FEDAPAY_WEBHOOK_SECRET` | required | Webhook endpoint secret (`wh_...`) |
//! | `WEBHOOK_TOLERANCE_SECS` | `300` | Max age of a signed webhook timestamp |
//! | `FRONTEND_SUCCESS_URL` | required | Redirect target for approved payments |
//! | `FRONTEND_FAILURE_URL` | required | Redirect target for canceled/declined |
//! | `FRONTEND_PENDING_URL` | required | Redirect target for anything else |
//! | `PORT` | `3000` | Listening port |
//! | `ALLOWED_ORIGINS` | empty | CSV of CORS origins; empty allows any |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::{Error, Result};
use crate::fedapay::types::DEFAULT_CURRENCY_ISO;

/// Default listening port
pub const DEFAULT_PORT: u16 = 3000;

/// Default timeout for outbound FedaPay calls, in seconds
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Default webhook signature timestamp tolerance, in seconds
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: u64 = 300;

/// FedaPay deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment with test API keys
    Sandbox,
    /// Production environment with real money movement
    Live,
}

impl Environment {
    /// Base URL of the FedaPay API for this environment
    pub fn api_base(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://sandbox-api.fedapay.com",
            Environment::Live => "https://api.fedapay.com",
        }
    }

    /// String form as accepted by `FEDAPAY_ENVIRONMENT`
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Live => "live",
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Environment::Sandbox),
            "live" | "production" => Ok(Environment::Live),
            other => Err(Error::config(format!(
                "FEDAPAY_ENVIRONMENT must be 'sandbox' or 'live', got '{other}'"
            ))),
        }
    }
}

/// Settings for the outbound FedaPay API client
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API secret key, sent as a bearer token
    pub secret_key: SecretString,
    /// Sandbox or live deployment
    pub environment: Environment,
    /// Explicit API base URL; overrides the environment default when set
    pub api_base: Option<String>,
    /// Timeout applied to every outbound request
    pub request_timeout: Duration,
    /// ISO code used when creating transactions
    pub currency_iso: String,
}

impl ProviderConfig {
    /// Effective API base URL (override wins over the environment default)
    pub fn base_url(&self) -> &str {
        self.api_base
            .as_deref()
            .unwrap_or_else(|| self.environment.api_base())
    }
}

/// Settings for inbound webhook verification
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Shared endpoint secret the signatures are keyed on
    pub endpoint_secret: SecretString,
    /// Maximum accepted age of the signed timestamp
    pub tolerance: Duration,
}

/// Frontend destinations for the redirect reconciliation handler
#[derive(Debug, Clone)]
pub struct RedirectTargets {
    /// Destination for `approved` transactions
    pub success_url: Url,
    /// Destination for `canceled` and `declined` transactions
    pub failure_url: Url,
    /// Destination for every other status
    pub pending_url: Url,
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port (`PORT`, overridable by `--port`)
    pub port: u16,
    /// CORS origin allow-list; empty means any origin
    pub allowed_origins: Vec<String>,
}

/// Complete immutable relay configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Outbound FedaPay client settings
    pub provider: ProviderConfig,
    /// Webhook verification settings
    pub webhook: WebhookConfig,
    /// Redirect destinations
    pub redirects: RedirectTargets,
    /// Server settings
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load the full configuration from the environment
    ///
    /// Fails with [`Error::Config`] naming the offending variable, so startup
    /// errors are actionable without reading source.
    pub fn from_env() -> Result<Self> {
        let environment = match optional("FEDAPAY_ENVIRONMENT") {
            Some(raw) => raw.parse()?,
            None => Environment::Sandbox,
        };

        let provider = ProviderConfig {
            secret_key: SecretString::from(require("FEDAPAY_SECRET_KEY")?),
            environment,
            api_base: optional("FEDAPAY_API_BASE"),
            request_timeout: Duration::from_secs(parse_or(
                "FEDAPAY_TIMEOUT_SECS",
                DEFAULT_PROVIDER_TIMEOUT_SECS,
            )?),
            currency_iso: optional("FEDAPAY_CURRENCY")
                .unwrap_or_else(|| DEFAULT_CURRENCY_ISO.to_string()),
        };

        let webhook = WebhookConfig {
            endpoint_secret: SecretString::from(require("FEDAPAY_WEBHOOK_SECRET")?),
            tolerance: Duration::from_secs(parse_or(
                "WEBHOOK_TOLERANCE_SECS",
                DEFAULT_WEBHOOK_TOLERANCE_SECS,
            )?),
        };

        let redirects = RedirectTargets {
            success_url: frontend_url("FRONTEND_SUCCESS_URL")?,
            failure_url: frontend_url("FRONTEND_FAILURE_URL")?,
            pending_url: frontend_url("FRONTEND_PENDING_URL")?,
        };

        let server = ServerConfig {
            port: parse_or("PORT", DEFAULT_PORT)?,
            allowed_origins: optional("ALLOWED_ORIGINS")
                .map(|csv| {
                    csv.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        };

        Ok(AppConfig {
            provider,
            webhook,
            redirects,
            server,
        })
    }
}

/// Read a required variable, treating blank values as missing
fn require(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| Error::config(format!("{name} must be set")))
}

/// Read an optional variable, treating blank values as missing
fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a variable into `T`, falling back to `default` when unset
fn parse_or<T: FromStr>(name: &str, default: T) -> Result<T> {
    match optional(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::config(format!("{name} is not a valid value: '{raw}'"))),
    }
}

/// Read and parse a required frontend URL
fn frontend_url(name: &str) -> Result<Url> {
    let raw = require(name)?;
    Url::parse(&raw).map_err(|e| Error::config(format!("{name} is not a valid URL: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("sandbox".parse::<Environment>().unwrap(), Environment::Sandbox);
        assert_eq!("Live".parse::<Environment>().unwrap(), Environment::Live);
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Live
        );
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_environment_api_bases() {
        assert_eq!(
            Environment::Sandbox.api_base(),
            "https://sandbox-api.fedapay.com"
        );
        assert_eq!(Environment::Live.api_base(), "https://api.fedapay.com");
    }

    #[test]
    fn test_base_url_override_wins() {
        let config = ProviderConfig {
            secret_key: SecretString::from("sk_sandbox_test"),
            environment: Environment::Sandbox,
            api_base: Some("http://127.0.0.1:9999".to_string()),
            request_timeout: Duration::from_secs(5),
            currency_iso: DEFAULT_CURRENCY_ISO.to_string(),
        };
        assert_eq!(config.base_url(), "http://127.0.0.1:9999");

        let config = ProviderConfig {
            api_base: None,
            ..config
        };
        assert_eq!(config.base_url(), "https://sandbox-api.fedapay.com");
    }

    #[test]
    fn test_require_rejects_blank_values() {
        // Unique variable names keep parallel tests from interfering.
        env::set_var("FEDAPAY_RELAY_TEST_BLANK", "   ");
        assert!(require("FEDAPAY_RELAY_TEST_BLANK").is_err());
        assert!(optional("FEDAPAY_RELAY_TEST_BLANK").is_none());

        env::set_var("FEDAPAY_RELAY_TEST_SET", " sk_sandbox_abc ");
        assert_eq!(
            require("FEDAPAY_RELAY_TEST_SET").unwrap(),
            "sk_sandbox_abc"
        );
    }

    #[test]
    fn test_parse_or_defaults_and_errors() {
        assert_eq!(
            parse_or("FEDAPAY_RELAY_TEST_UNSET_PORT", DEFAULT_PORT).unwrap(),
            3000
        );

        env::set_var("FEDAPAY_RELAY_TEST_BAD_PORT", "not-a-port");
        assert!(parse_or("FEDAPAY_RELAY_TEST_BAD_PORT", DEFAULT_PORT).is_err());

        env::set_var("FEDAPAY_RELAY_TEST_GOOD_PORT", "8080");
        assert_eq!(
            parse_or("FEDAPAY_RELAY_TEST_GOOD_PORT", DEFAULT_PORT).unwrap(),
            8080u16
        );
    }

    #[test]
    fn test_frontend_url_must_parse() {
        env::set_var("FEDAPAY_RELAY_TEST_URL", "https://shop.example/success.html");
        let url = frontend_url("FEDAPAY_RELAY_TEST_URL").unwrap();
        assert_eq!(url.host_str(), Some("shop.example"));

        env::set_var("FEDAPAY_RELAY_TEST_BAD_URL", "not a url");
        assert!(frontend_url("FEDAPAY_RELAY_TEST_BAD_URL").is_err());
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let config = WebhookConfig {
            endpoint_secret: SecretString::from("wh_sandbox_secret"),
            tolerance: Duration::from_secs(DEFAULT_WEBHOOK_TOLERANCE_SECS),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("wh_sandbox_secret"));
    }
}
