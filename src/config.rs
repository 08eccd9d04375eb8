use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AviapagesConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Max upstream calls started per window.
    pub max_requests: usize,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub interval_hours: u64,
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp: Option<SmtpConfig>,
    pub from: String,
    pub contact_inbox: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub environment: String,
    pub frontend_url: String,
    pub aircraft_stale_hours: i64,
    pub jwt: JwtConfig,
    pub aviapages: AviapagesConfig,
    pub scheduler: SchedulerConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: env_or("JWT_ISSUER", "aerocharter"),
            audience: env_or("JWT_AUDIENCE", "aerocharter-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let aviapages = AviapagesConfig {
            base_url: env_or("AVIAPAGES_API_URL", "https://dir.aviapages.com/api"),
            api_key: std::env::var("AVIAPAGES_API_KEY").ok().filter(|k| !k.is_empty()),
            max_requests: env_parse("AVIAPAGES_MAX_REQUESTS", 10),
            window_secs: env_parse("AVIAPAGES_WINDOW_SECS", 60),
        };
        let scheduler = SchedulerConfig {
            enabled: env_parse("PRICE_REFRESH_ENABLED", true),
            interval_hours: env_parse("PRICE_REFRESH_INTERVAL_HOURS", 6),
            run_on_startup: env_parse("PRICE_REFRESH_ON_STARTUP", false),
        };
        let smtp = std::env::var("SMTP_HOST")
            .ok()
            .filter(|h| !h.is_empty())
            .map(|host| SmtpConfig {
                host,
                port: env_parse("SMTP_PORT", 587),
                username: std::env::var("SMTP_USERNAME").ok(),
                password: std::env::var("SMTP_PASSWORD").ok(),
            });
        let mail = MailConfig {
            smtp,
            from: env_or("MAIL_FROM", "AeroCharter <no-reply@aerocharter.local>"),
            contact_inbox: env_or("CONTACT_INBOX", "charter@aerocharter.local"),
        };
        Ok(Self {
            database_url,
            environment: env_or("APP_ENV", "development"),
            frontend_url: env_or("FRONTEND_URL", "http://localhost:3000"),
            aircraft_stale_hours: env_parse("AIRCRAFT_STALE_HOURS", 24),
            jwt,
            aviapages,
            scheduler,
            mail,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("AEROCHARTER_TEST_PARSE", "not-a-number");
        assert_eq!(env_parse("AEROCHARTER_TEST_PARSE", 7u64), 7);
        std::env::set_var("AEROCHARTER_TEST_PARSE", "12");
        assert_eq!(env_parse("AEROCHARTER_TEST_PARSE", 7u64), 12);
    }

    #[test]
    fn env_parse_reads_bools() {
        std::env::set_var("AEROCHARTER_TEST_BOOL", "false");
        assert!(!env_parse("AEROCHARTER_TEST_BOOL", true));
    }
}
