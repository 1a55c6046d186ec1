use std::env;

use actix_web::cookie::Key;

use crate::errors::AppError;

/// Signing keys for the cookie session must be at least this long.
const MIN_SECRET_KEY_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: Option<String>,
    pub host: String,
    pub port: u16,
    pub templates_dir: String,
    pub static_dir: String,
    pub secure_cookies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://cashmeister.db".to_string(),
            secret_key: None,
            host: "127.0.0.1".to_string(),
            port: 8080,
            templates_dir: "templates".to_string(),
            static_dir: "static".to_string(),
            secure_cookies: false,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, falling back to
    /// the defaults for anything missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| AppError::ConfigError(format!("PORT={raw:?}: {e}")))?,
            None => defaults.port,
        };

        let secure_cookies = match lookup("SECURE_COOKIES") {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| AppError::ConfigError(format!("SECURE_COOKIES={raw:?}")))?,
            None => defaults.secure_cookies,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            secret_key: lookup("SECRET_KEY").filter(|k| !k.is_empty()),
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            templates_dir: lookup("TEMPLATES_DIR").unwrap_or(defaults.templates_dir),
            static_dir: lookup("STATIC_DIR").unwrap_or(defaults.static_dir),
            secure_cookies,
        })
    }

    pub fn session_key(&self) -> Result<Key, AppError> {
        match &self.secret_key {
            Some(secret) if secret.len() < MIN_SECRET_KEY_LEN => Err(AppError::ConfigError(
                format!("SECRET_KEY must be at least {MIN_SECRET_KEY_LEN} bytes"),
            )),
            Some(secret) => Ok(Key::from(secret.as_bytes())),
            None => {
                log::warn!("SECRET_KEY not set, sessions will not survive a restart");
                Ok(Key::generate())
            }
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.database_url, "sqlite://cashmeister.db");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.templates_dir, "templates");
        assert!(cfg.secret_key.is_none());
        assert!(!cfg.secure_cookies);
    }

    #[test]
    fn environment_overrides_defaults() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite://books.db"),
            ("PORT", "9000"),
            ("HOST", "0.0.0.0"),
            ("SECURE_COOKIES", "true"),
        ]))
        .unwrap();
        assert_eq!(cfg.database_url, "sqlite://books.db");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert!(cfg.secure_cookies);
    }

    #[test]
    fn malformed_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn malformed_flag_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SECURE_COOKIES", "maybe")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn short_secret_key_is_rejected() {
        let cfg = Config::from_lookup(lookup_from(&[("SECRET_KEY", "you-will-never-guess")]))
            .unwrap();
        assert!(cfg.session_key().is_err());
    }

    #[test]
    fn long_secret_key_is_accepted() {
        let secret = "k".repeat(64);
        let cfg = Config::from_lookup(lookup_from(&[("SECRET_KEY", secret.as_str())])).unwrap();
        assert!(cfg.session_key().is_ok());
    }

    #[test]
    fn missing_secret_key_generates_one() {
        let cfg = Config::default();
        assert!(cfg.session_key().is_ok());
    }
}
