//! Service configuration.
//!
//! Everything is read from the environment exactly once at startup and
//! carried in an [`AppConfig`] that handlers receive through shared state.
//! Business logic never reads env vars directly.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default public origin used when no non-local candidate is configured.
const DEFAULT_PUBLIC_BASE: &str = "https://guidebuoyai.sg";

/// Default Gemini endpoint root.
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Gemini model (JSON output mode is available on v1beta).
const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";

/// Service configuration, built once at process start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// LLM provider settings.
    pub llm: LlmSettings,
    /// HTTP bind port.
    pub port: u16,
    /// Path to the local libSQL database file.
    pub db_path: PathBuf,
    /// Root directory for uploaded evidence files.
    pub storage_root: PathBuf,
    /// Public origin used for building verification/redirect links.
    pub public_base: String,
    /// SMTP settings for verification emails (None disables sending).
    pub smtp: Option<SmtpSettings>,
    /// Per-route rate limit settings.
    pub rate_limits: RateLimitSettings,
    /// Bypass the pre-verify-email rate limit (test environments only).
    pub disable_email_rate_limit: bool,
}

/// LLM provider settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
}

/// SMTP settings for the verification mailer.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

/// A request ceiling over a fixed window.
#[derive(Debug, Clone, Copy)]
pub struct RouteLimit {
    pub limit: u32,
    pub window: Duration,
}

/// Per-route rate limit settings.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    /// classify / questions / assess share the same ceiling.
    pub router: RouteLimit,
    /// pre-verify-email is looser but windowed over 5 minutes.
    pub pre_verify: RouteLimit,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            router: RouteLimit {
                limit: 20,
                window: Duration::from_secs(60),
            },
            pre_verify: RouteLimit {
                limit: 50,
                window: Duration::from_secs(300),
            },
        }
    }
}

impl AppConfig {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GOOGLE_GENERATIVE_AI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GOOGLE_GENERATIVE_AI_API_KEY".into()))?;

        let model = std::env::var("GUIDEBUOY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let port: u16 = match std::env::var("GUIDEBUOY_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "GUIDEBUOY_PORT".into(),
                message: format!("'{raw}' is not a valid port"),
            })?,
            Err(_) => 8080,
        };

        let db_path = std::env::var("GUIDEBUOY_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/guidebuoy.db"));

        let storage_root = std::env::var("GUIDEBUOY_STORAGE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/evidence"));

        let candidates = [
            std::env::var("GUIDEBUOY_SITE_URL").ok(),
            std::env::var("GUIDEBUOY_APP_URL").ok(),
            std::env::var("GUIDEBUOY_DEV_REDIRECT_URL").ok(),
        ];
        let public_base = select_public_base(&candidates);

        let smtp = SmtpSettings::from_env();

        let disable_email_rate_limit = std::env::var("GUIDEBUOY_DISABLE_EMAIL_RATE_LIMIT")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            llm: LlmSettings {
                api_key: SecretString::from(api_key),
                model,
                base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            },
            port,
            db_path,
            storage_root,
            public_base,
            smtp,
            rate_limits: RateLimitSettings::default(),
            disable_email_rate_limit,
        })
    }
}

impl SmtpSettings {
    /// Read SMTP settings from the environment; None if the host is unset.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("GUIDEBUOY_SMTP_HOST").ok()?;
        let port = std::env::var("GUIDEBUOY_SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);
        let username = std::env::var("GUIDEBUOY_SMTP_USERNAME").unwrap_or_default();
        let password = std::env::var("GUIDEBUOY_SMTP_PASSWORD").unwrap_or_default();
        let from_address = std::env::var("GUIDEBUOY_SMTP_FROM")
            .unwrap_or_else(|_| "no-reply@guidebuoyai.sg".to_string());
        Some(Self {
            host,
            port,
            username,
            password,
            from_address,
        })
    }
}

/// Pick the first candidate origin that is public (non-local), falling back
/// to the fixed production origin.
///
/// Verification emails must link back to an origin the recipient can reach,
/// so localhost and bare-host values from dev environments are skipped.
pub fn select_public_base(candidates: &[Option<String>]) -> String {
    for candidate in candidates.iter().flatten() {
        if let Some(origin) = public_origin(candidate) {
            return origin;
        }
    }
    DEFAULT_PUBLIC_BASE.to_string()
}

/// Normalize a configured value into an `https://host[:port]` origin,
/// returning None for local or malformed values.
fn public_origin(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (scheme, rest) = if let Some(rest) = trimmed.strip_prefix("https://") {
        ("https", rest)
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        ("http", rest)
    } else {
        ("https", trimmed)
    };

    let authority = rest.split('/').next().unwrap_or_default();
    if authority.is_empty() {
        return None;
    }

    let host = authority.split(':').next().unwrap_or_default().to_lowercase();
    if host.is_empty() || host == "localhost" || host == "127.0.0.1" || !host.contains('.') {
        return None;
    }

    Some(format!("{scheme}://{authority}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_base_skips_localhost() {
        let candidates = [
            Some("http://localhost:3000".to_string()),
            Some("https://guidebuoyaisg.onrender.com".to_string()),
        ];
        assert_eq!(
            select_public_base(&candidates),
            "https://guidebuoyaisg.onrender.com"
        );
    }

    #[test]
    fn select_base_skips_bare_hosts() {
        let candidates = [Some("http://devbox".to_string()), None, None];
        assert_eq!(select_public_base(&candidates), DEFAULT_PUBLIC_BASE);
    }

    #[test]
    fn select_base_adds_scheme() {
        let candidates = [Some("app.guidebuoyai.sg".to_string())];
        assert_eq!(select_public_base(&candidates), "https://app.guidebuoyai.sg");
    }

    #[test]
    fn select_base_defaults_when_empty() {
        assert_eq!(select_public_base(&[None, None, None]), DEFAULT_PUBLIC_BASE);
    }

    #[test]
    fn select_base_preserves_port() {
        let candidates = [Some("https://staging.guidebuoyai.sg:8443".to_string())];
        assert_eq!(
            select_public_base(&candidates),
            "https://staging.guidebuoyai.sg:8443"
        );
    }

    #[test]
    fn select_base_first_public_wins() {
        let candidates = [
            Some("https://guidebuoyai.sg".to_string()),
            Some("https://guidebuoyaisg.onrender.com".to_string()),
        ];
        assert_eq!(select_public_base(&candidates), "https://guidebuoyai.sg");
    }
}
