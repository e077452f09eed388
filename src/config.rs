use std::env;

use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub nonce_secret: String,
    pub host: String,
    pub port: u16,
    /// Base URL for permalinks, edit links and the settings link.
    pub site_url: String,
    /// Zone in which editors enter expiry times and in which they are shown.
    pub site_timezone: Tz,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = required("JWT_SECRET")?;
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            nonce_secret: env::var("NONCE_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| jwt_secret.clone()),
            jwt_secret,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            site_url: env::var("SITE_URL").unwrap_or_else(|_| "http://localhost".into()),
            site_timezone: env::var("SITE_TIMEZONE")
                .unwrap_or_else(|_| "UTC".into())
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("Invalid SITE_TIMEZONE: {e}"))?,
        })
    }

    pub fn settings_url(&self) -> String {
        format!("{}/admin/settings", self.site_url.trim_end_matches('/'))
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
