use crate::services::code_generator::{
    CodeGenerator, CodeSettings, DEFAULT_CODE_LENGTH, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_PERSIST_ATTEMPTS, MAX_CODE_LENGTH,
};
use anyhow::{Context, Result, ensure};
use clap::Parser;
use std::{env, str::FromStr};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub code_length: i64,
    pub code_attempts: u32,
    pub persist_attempts: u32,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Image link collections API")]
pub struct Args {
    /// Host to bind to (overrides IMAGE_LINK_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides IMAGE_LINK_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides IMAGE_LINK_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Length of generated codes (overrides IMAGE_LINK_CODE_LENGTH)
    #[arg(long, allow_negative_numbers = true)]
    pub code_length: Option<i64>,

    /// Candidate codes drawn per generation (overrides IMAGE_LINK_CODE_ATTEMPTS)
    #[arg(long)]
    pub code_attempts: Option<u32>,

    /// Inserts retried after a code conflict (overrides IMAGE_LINK_PERSIST_ATTEMPTS)
    #[arg(long)]
    pub persist_attempts: Option<u32>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let cfg = Self::resolve(&args, |key| env::var(key).ok())?;
        Ok((cfg, args.migrate))
    }

    /// CLI values win over environment values, which win over defaults.
    pub fn resolve<F>(args: &Args, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cfg = Self {
            host: match &args.host {
                Some(host) => host.clone(),
                None => env("IMAGE_LINK_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            },
            port: flag_or_env(args.port, &env, "IMAGE_LINK_PORT", 8080)?,
            database_url: match &args.database_url {
                Some(url) => url.clone(),
                None => env("IMAGE_LINK_DATABASE_URL")
                    .unwrap_or_else(|| "sqlite://./data/image_link.db".into()),
            },
            code_length: flag_or_env(
                args.code_length,
                &env,
                "IMAGE_LINK_CODE_LENGTH",
                DEFAULT_CODE_LENGTH,
            )?,
            code_attempts: flag_or_env(
                args.code_attempts,
                &env,
                "IMAGE_LINK_CODE_ATTEMPTS",
                DEFAULT_MAX_ATTEMPTS,
            )?,
            persist_attempts: flag_or_env(
                args.persist_attempts,
                &env,
                "IMAGE_LINK_PERSIST_ATTEMPTS",
                DEFAULT_PERSIST_ATTEMPTS,
            )?,
        };

        ensure!(
            (0..=MAX_CODE_LENGTH).contains(&cfg.code_length),
            "code length must be between 0 and {}, got {}",
            MAX_CODE_LENGTH,
            cfg.code_length
        );
        ensure!(cfg.code_attempts >= 1, "code attempts must be at least 1");
        ensure!(
            cfg.persist_attempts >= 1,
            "persist attempts must be at least 1"
        );

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn code_settings(&self) -> CodeSettings {
        CodeSettings {
            length: self.code_length,
            generator: CodeGenerator::new(self.code_attempts),
            persist_attempts: self.persist_attempts,
        }
    }
}

/// The CLI value if given, else the parsed env value, else `default`.
fn flag_or_env<T, F>(flag: Option<T>, env: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match flag {
        Some(value) => Ok(value),
        None => Ok(env_parsed(env, key)?.unwrap_or(default)),
    }
}

fn env_parsed<T, F>(env: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("parsing {} value `{}`", key, value))
        })
        .transpose()
}
