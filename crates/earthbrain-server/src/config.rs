use std::ops::RangeInclusive;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Accepted token lifetimes, in days.
const TOKEN_DAYS_RANGE: RangeInclusive<i64> = 1..=365;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_days: i64,
    pub admin: Option<AdminSeed>,
    pub webhook_url: Option<String>,
    pub max_upload_bytes: usize,
    pub cors_origin: Option<String>,
}

#[derive(Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = var("EARTHBRAIN_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("EARTHBRAIN_JWT_SECRET is unset or still a placeholder");
        }

        let port: u16 = var("EARTHBRAIN_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("EARTHBRAIN_PORT must be a port number")?;
        let token_days: i64 = var("EARTHBRAIN_TOKEN_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("EARTHBRAIN_TOKEN_DAYS must be a number of days")?;
        if !TOKEN_DAYS_RANGE.contains(&token_days) {
            bail!(
                "EARTHBRAIN_TOKEN_DAYS must be between {} and {}",
                TOKEN_DAYS_RANGE.start(),
                TOKEN_DAYS_RANGE.end()
            );
        }
        let max_upload_bytes: usize = var("EARTHBRAIN_MAX_UPLOAD_BYTES")
            .unwrap_or_else(|| (10 * 1024 * 1024).to_string())
            .parse()
            .context("EARTHBRAIN_MAX_UPLOAD_BYTES must be a byte count")?;

        let admin = match (var("EARTHBRAIN_ADMIN_EMAIL"), var("EARTHBRAIN_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) if !email.is_empty() => {
                if password.len() < 8 {
                    bail!("EARTHBRAIN_ADMIN_PASSWORD must be at least 8 characters");
                }
                Some(AdminSeed { email, password })
            }
            (Some(_), None) => bail!("EARTHBRAIN_ADMIN_EMAIL is set without EARTHBRAIN_ADMIN_PASSWORD"),
            _ => None,
        };

        Ok(Self {
            host: var("EARTHBRAIN_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: var("EARTHBRAIN_DB_PATH")
                .unwrap_or_else(|| "earthbrain.db".into())
                .into(),
            jwt_secret,
            token_days,
            admin,
            webhook_url: var("EARTHBRAIN_WEBHOOK_URL").filter(|u| !u.is_empty()),
            max_upload_bytes,
            cors_origin: var("EARTHBRAIN_CORS_ORIGIN").filter(|o| !o.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[("EARTHBRAIN_JWT_SECRET", "s3cret-value")]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_path, PathBuf::from("earthbrain.db"));
        assert_eq!(cfg.token_days, 30);
        assert_eq!(cfg.max_upload_bytes, 10 * 1024 * 1024);
        assert!(cfg.admin.is_none());
        assert!(cfg.webhook_url.is_none());
    }

    #[test]
    fn placeholder_secret_rejected() {
        assert!(config(&[]).is_err());
        assert!(config(&[("EARTHBRAIN_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn admin_needs_password() {
        let err = config(&[
            ("EARTHBRAIN_JWT_SECRET", "s3cret-value"),
            ("EARTHBRAIN_ADMIN_EMAIL", "org@example.org"),
        ]);
        assert!(err.is_err());

        let cfg = config(&[
            ("EARTHBRAIN_JWT_SECRET", "s3cret-value"),
            ("EARTHBRAIN_ADMIN_EMAIL", "org@example.org"),
            ("EARTHBRAIN_ADMIN_PASSWORD", "long enough"),
        ])
        .unwrap();
        assert_eq!(cfg.admin.unwrap().email, "org@example.org");
    }

    #[test]
    fn token_days_must_be_in_range() {
        for days in ["0", "-3", "366", "9223372036854775807"] {
            assert!(
                config(&[
                    ("EARTHBRAIN_JWT_SECRET", "s3cret-value"),
                    ("EARTHBRAIN_TOKEN_DAYS", days),
                ])
                .is_err(),
                "{days} days accepted"
            );
        }

        let cfg = config(&[
            ("EARTHBRAIN_JWT_SECRET", "s3cret-value"),
            ("EARTHBRAIN_TOKEN_DAYS", "365"),
        ])
        .unwrap();
        assert_eq!(cfg.token_days, 365);
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(config(&[
            ("EARTHBRAIN_JWT_SECRET", "s3cret-value"),
            ("EARTHBRAIN_PORT", "eighty"),
        ])
        .is_err());
    }
}
