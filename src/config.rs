use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub gateway_url: String,
    pub gateway_username: String,
    pub gateway_password: String,
    pub gateway_return_url: String,
    pub auth_token_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        let config = Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
            gateway_url: env::var("GATEWAY_URL").context("GATEWAY_URL is required")?,
            gateway_username: env::var("GATEWAY_USERNAME").context("GATEWAY_USERNAME is required")?,
            gateway_password: env::var("GATEWAY_PASSWORD").context("GATEWAY_PASSWORD is required")?,
            gateway_return_url: env::var("GATEWAY_RETURN_URL")
                .context("GATEWAY_RETURN_URL is required")?,
            auth_token_secret: env::var("AUTH_TOKEN_SECRET")
                .context("AUTH_TOKEN_SECRET is required")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            anyhow::bail!("SERVER_PORT must be greater than 0");
        }
        if self.auth_token_secret.is_empty() {
            anyhow::bail!("AUTH_TOKEN_SECRET is empty");
        }

        url::Url::parse(&self.gateway_url).context("GATEWAY_URL is not a valid URL")?;
        url::Url::parse(&self.gateway_return_url)
            .context("GATEWAY_RETURN_URL is not a valid URL")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 3000,
            database_url: "postgres://localhost:5432/wheelhouse".to_string(),
            gateway_url: "https://sandbox.gateway.example.com".to_string(),
            gateway_username: "merchant".to_string(),
            gateway_password: "secret".to_string(),
            gateway_return_url: "https://shop.example.com/orders/verify".to_string(),
            auth_token_secret: "token-secret".to_string(),
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_invalid_gateway_url() {
        let mut config = base_config();
        config.gateway_url = "not-a-url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_token_secret() {
        let mut config = base_config();
        config.auth_token_secret = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_port() {
        let mut config = base_config();
        config.server_port = 0;
        assert!(config.validate().is_err());
    }
}
