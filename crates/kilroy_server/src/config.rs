//! Configuration for the kilroy server.
//!
//! Plain settings come from command-line arguments or `KILROY_*` environment
//! variables via clap. Secrets never do; see [`SecretStore`].
//!
//! - `KILROY_HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 3000)
//! - `KILROY_DBDIR` - Root of the resource hierarchy (default: ../db)
//! - `KILROY_ENV` - `development` or `production` (default: development)
//! - `KILROY_SESSION_TTL_SECS` - Session lifetime (default: 30 days)

use crate::secrets::SecretStore;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DBDIR: &str = "../db";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 30;

/// Which kind of deployment the server runs in.
///
/// Development shows failure detail to clients and logs it; production
/// shows neither and logs a fixed summary line instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Deployment {
    #[default]
    Development,
    Production,
}

impl Deployment {
    pub fn is_development(self) -> bool {
        self == Deployment::Development
    }
}

/// Kilroy - a scene sharing server.
#[derive(Parser, Debug, Clone)]
#[command(name = "kilroy")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "KILROY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// Directory holding the `mutable/` and `immutable/` resource trees.
    #[arg(long, default_value = DEFAULT_DBDIR, env = "KILROY_DBDIR")]
    pub dbdir: PathBuf,

    /// Deployment kind.
    #[arg(long = "env", value_enum, default_value_t = Deployment::Development, env = "KILROY_ENV")]
    pub deployment: Deployment,

    /// How long a session stays valid, in seconds.
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL_SECS, env = "KILROY_SESSION_TTL_SECS")]
    pub session_ttl_secs: u64,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    pub fn validate(&self) -> Result<(), String> {
        if self.session_ttl_secs == 0 {
            return Err("session_ttl_secs must be greater than 0".to_string());
        }
        if self.dbdir.as_os_str().is_empty() {
            return Err("dbdir must not be empty. Set --dbdir or KILROY_DBDIR".to_string());
        }
        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn server_config(&self, secrets: SecretStore) -> ServerConfig {
        ServerConfig {
            deployment: self.deployment,
            session_ttl: Duration::from_secs(self.session_ttl_secs),
            secrets,
        }
    }
}

/// Everything the HTTP layer needs, fixed at startup.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub deployment: Deployment,
    pub session_ttl: Duration,
    pub secrets: SecretStore,
}

impl ServerConfig {
    pub fn new(secrets: SecretStore) -> Self {
        Self {
            deployment: Deployment::default(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            secrets,
        }
    }

    pub fn with_deployment(mut self, deployment: Deployment) -> Self {
        self.deployment = deployment;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}
