use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context};

/// Default access-token validity: two hours.
const TOKEN_VALIDITY_SECONDS_DEFAULT: &str = "7200";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub port: u16,

    pub private_key_path: String,
    pub public_key_path: String,

    pub token_validity_seconds: i64,
    /// Mail verification is not wired up yet; login never requires a
    /// verified address while this is false.
    pub mail_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(anyhow!("unknown environment '{other}'")),
        }
    }
}

impl AuthConfig {
    /// Load from the environment. Dev gets workable defaults; prod requires
    /// every variable to be set explicitly.
    pub fn from_env() -> anyhow::Result<Self> {
        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()?;
        let is_prod = environment == Environment::Prod;

        Ok(Self {
            environment,
            service_name: get_env("SERVICE_NAME", Some("vaultguard"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: get_env("PORT", Some("8000"), is_prod)?
                .parse()
                .context("parsing PORT")?,
            private_key_path: get_env(
                "RSA_PRIVATE_KEY_PATH",
                Some("data/private_key.pem"),
                is_prod,
            )?,
            public_key_path: get_env(
                "RSA_PUBLIC_KEY_PATH",
                Some("data/public_key.pem"),
                is_prod,
            )?,
            token_validity_seconds: get_env(
                "TOKEN_VALIDITY_SECONDS",
                Some(TOKEN_VALIDITY_SECONDS_DEFAULT),
                is_prod,
            )?
            .parse()
            .context("parsing TOKEN_VALIDITY_SECONDS")?,
            mail_enabled: false,
        })
    }
}

fn get_env(name: &str, default: Option<&str>, is_prod: bool) -> anyhow::Result<String> {
    match env::var(name) {
        Ok(value) => Ok(value),
        Err(_) => match default {
            Some(value) if !is_prod => Ok(value.to_string()),
            _ => Err(anyhow!("missing required environment variable {name}")),
        },
    }
}
