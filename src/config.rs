use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use std::{env, path::PathBuf};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 1024;
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

/// Which storage backend `connect` talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// A real S3-compatible server through the AWS SDK.
    S3,
    /// An in-process store, for trying the console without a server.
    Memory,
}

/// Centralized server configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub backend: BackendKind,
}

/// Command-line arguments of `serve`.
#[derive(Args, Debug, Default, Clone)]
pub struct ServeArgs {
    /// Host to bind to (overrides S3_CONSOLE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides S3_CONSOLE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory holding the built web UI (overrides S3_CONSOLE_STATIC_DIR)
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Largest accepted upload in MiB (overrides S3_CONSOLE_MAX_UPLOAD_MB)
    #[arg(long)]
    pub max_upload_mb: Option<usize>,

    /// Storage backend (overrides S3_CONSOLE_BACKEND)
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args(args: ServeArgs) -> Result<Self> {
        Self::from_sources(args, |name| env::var(name).ok())
    }

    /// Merge `args` over variables found through `lookup`.
    pub fn from_sources(args: ServeArgs, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = lookup("S3_CONSOLE_HOST").unwrap_or_else(|| DEFAULT_HOST.into());
        let env_port = match lookup("S3_CONSOLE_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing S3_CONSOLE_PORT value `{}`", value))?,
            None => DEFAULT_PORT,
        };
        let env_static = lookup("S3_CONSOLE_STATIC_DIR").map(PathBuf::from);
        let env_upload = match lookup("S3_CONSOLE_MAX_UPLOAD_MB") {
            Some(value) => value
                .parse::<usize>()
                .with_context(|| format!("parsing S3_CONSOLE_MAX_UPLOAD_MB value `{}`", value))?,
            None => DEFAULT_MAX_UPLOAD_MB,
        };
        let env_backend = match lookup("S3_CONSOLE_BACKEND") {
            Some(value) => BackendKind::from_str(&value, true).map_err(|_| {
                anyhow::anyhow!("S3_CONSOLE_BACKEND must be `s3` or `memory`, got `{value}`")
            })?,
            None => BackendKind::S3,
        };

        // --- Merge ---
        let max_upload_mb = args.max_upload_mb.unwrap_or(env_upload);
        if max_upload_mb == 0 {
            bail!("maximum upload size must be at least 1 MiB");
        }

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            static_dir: args.static_dir.or(env_static),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            backend: args.backend.unwrap_or(env_backend),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Base URL of the REST API used by the console commands:
/// `--api-url`, then S3_CONSOLE_API_URL, then the local default.
pub fn api_url(flag: Option<String>) -> String {
    flag.or_else(|| env::var("S3_CONSOLE_API_URL").ok())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_without_env_or_flags() {
        let cfg = AppConfig::from_sources(ServeArgs::default(), lookup(&[])).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:3001");
        assert_eq!(cfg.backend, BackendKind::S3);
        assert_eq!(cfg.max_upload_bytes, 1024 * 1024 * 1024);
        assert!(cfg.static_dir.is_none());
    }

    #[test]
    fn flags_override_environment() {
        let args = ServeArgs {
            port: Some(8080),
            backend: Some(BackendKind::S3),
            ..ServeArgs::default()
        };
        let cfg = AppConfig::from_sources(
            args,
            lookup(&[
                ("S3_CONSOLE_PORT", "9999"),
                ("S3_CONSOLE_HOST", "127.0.0.1"),
                ("S3_CONSOLE_BACKEND", "memory"),
                ("S3_CONSOLE_MAX_UPLOAD_MB", "8"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:8080");
        assert_eq!(cfg.backend, BackendKind::S3);
        assert_eq!(cfg.max_upload_bytes, 8 * 1024 * 1024);
    }

    #[test]
    fn malformed_environment_is_an_error() {
        assert!(AppConfig::from_sources(ServeArgs::default(), lookup(&[("S3_CONSOLE_PORT", "x")])).is_err());
        assert!(
            AppConfig::from_sources(ServeArgs::default(), lookup(&[("S3_CONSOLE_BACKEND", "gcs")]))
                .is_err()
        );
        assert!(
            AppConfig::from_sources(ServeArgs::default(), lookup(&[("S3_CONSOLE_MAX_UPLOAD_MB", "0")]))
                .is_err()
        );
    }
}
