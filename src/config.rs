use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// Load configuration from the environment. A missing `JWT_SECRET` is
    /// fatal; everything else has a default.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "authd".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authd-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);
        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            host,
            port,
            cors_origins,
            jwt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test because the env vars are process-wide.
    #[test]
    fn from_env_requires_secret_and_parses_the_rest() {
        std::env::remove_var("JWT_SECRET");
        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        std::env::set_var("JWT_SECRET", "s3cret");
        std::env::set_var(
            "CORS_ORIGINS",
            "http://localhost:3000, https://app.example.com,",
        );
        let config = AppConfig::from_env().expect("config");
        assert_eq!(config.jwt.secret, "s3cret");
        assert_eq!(config.jwt.ttl_minutes, 30);
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000", "https://app.example.com"]
        );

        std::env::remove_var("JWT_SECRET");
        std::env::remove_var("CORS_ORIGINS");
    }
}
