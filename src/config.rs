use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::warn;
use rand::RngCore;
use std::env;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmailBackend {
    Console,
    Memory,
    Http,
}

impl FromStr for EmailBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "memory" | "locmem" => Ok(Self::Memory),
            "http" => Ok(Self::Http),
            other => Err(format!("unknown email backend: {}", other)),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub sqlite_path: String,
    pub database_url: Option<String>,
    pub secret_key: String,
    pub session_cookie_name: String,
    pub session_age_days: i64,
    pub account_activation_days: i64,
    pub registration_open: bool,
    pub site_domain: String,
    pub allowed_hosts: Vec<String>,
    pub bcrypt_cost: u32,
    pub email_backend: EmailBackend,
    pub default_from_email: String,
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 8000,
            sqlite_path: "./imager.sqlite".to_string(),
            database_url: None,
            secret_key: random_secret(),
            session_cookie_name: "sessionid".to_string(),
            session_age_days: 14,
            account_activation_days: 7,
            registration_open: true,
            site_domain: "localhost:8000".to_string(),
            allowed_hosts: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            bcrypt_cost: bcrypt::DEFAULT_COST,
            email_backend: EmailBackend::Console,
            default_from_email: "webmaster@localhost".to_string(),
            mail_api_url: None,
            mail_api_key: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let secret_key = match env::var("SECRET_KEY") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => {
                warn!("SECRET_KEY not set, sessions and activation links will not survive a restart");
                defaults.secret_key
            }
        };

        let email_backend = env::var("EMAIL_BACKEND")
            .ok()
            .and_then(|v| match v.parse::<EmailBackend>() {
                Ok(backend) => Some(backend),
                Err(e) => {
                    warn!("{}, falling back to console", e);
                    None
                }
            })
            .unwrap_or(defaults.email_backend);

        Self {
            server_port: env_parse("SERVER_PORT", defaults.server_port),
            sqlite_path: env::var("SQLITE_PATH").unwrap_or(defaults.sqlite_path),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()),
            secret_key,
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.session_cookie_name),
            session_age_days: env_parse("SESSION_AGE_DAYS", defaults.session_age_days),
            account_activation_days: env_parse(
                "ACCOUNT_ACTIVATION_DAYS",
                defaults.account_activation_days,
            ),
            registration_open: env_bool("REGISTRATION_OPEN", defaults.registration_open),
            site_domain: env::var("SITE_DOMAIN")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.site_domain),
            allowed_hosts: env::var("ALLOWED_HOSTS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.allowed_hosts),
            bcrypt_cost: env_parse("BCRYPT_COST", defaults.bcrypt_cost),
            email_backend,
            default_from_email: env::var("DEFAULT_FROM_EMAIL")
                .unwrap_or(defaults.default_from_email),
            mail_api_url: env::var("MAIL_API_URL").ok().filter(|v| !v.trim().is_empty()),
            mail_api_key: env::var("MAIL_API_KEY").ok().filter(|v| !v.trim().is_empty()),
        }
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }

        let path = self.sqlite_path.trim();
        if path.starts_with("sqlite:") || path.starts_with("file:") {
            return path.to_string();
        }
        format!("sqlite://{}", path)
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        Err(_) => default,
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_path_becomes_url() {
        let config = AppConfig {
            sqlite_path: "/tmp/imager.sqlite".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.database_url(), "sqlite:///tmp/imager.sqlite");
    }

    #[test]
    fn explicit_database_url_wins() {
        let config = AppConfig {
            database_url: Some("sqlite::memory:".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.database_url(), "sqlite::memory:");
    }

    #[test]
    fn default_secrets_differ() {
        assert_ne!(AppConfig::default().secret_key, AppConfig::default().secret_key);
    }

    #[test]
    fn allowed_hosts_are_comma_separated() {
        assert_eq!(
            split_list(" imager.test, .imager.test ,,localhost"),
            vec!["imager.test", ".imager.test", "localhost"]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn parses_email_backend() {
        assert_eq!("locmem".parse::<EmailBackend>(), Ok(EmailBackend::Memory));
        assert_eq!(" HTTP ".parse::<EmailBackend>(), Ok(EmailBackend::Http));
        assert!("smtp".parse::<EmailBackend>().is_err());
    }
}
