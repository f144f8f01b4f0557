//! Service configuration
//!
//! Every option can come from a flag or from the environment (including a
//! `.env` file loaded before parsing).

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{AuthService, JwtHandler, MemoryUserStore, SqliteUserStore, UserStore};

const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "graph-auth")]
#[command(about = "User registration and login service issuing signed tokens")]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "GRAPH_AUTH_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// User store backend
    #[arg(long, env = "AUTH_STORE", value_enum, default_value = "sqlite")]
    pub store: StoreKind,

    /// SQLite database path (sqlite store only)
    #[arg(long, env = "AUTH_DB_PATH", default_value = "graph_auth.db")]
    pub db_path: String,

    /// Secret used to sign and verify tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Token lifetime in hours
    #[arg(long, env = "JWT_EXPIRATION_HOURS", default_value = "24")]
    pub jwt_expiration_hours: i64,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.jwt_expiration()?;
        // bcrypt rejects costs outside 4..=31
        if !(4..=31).contains(&self.bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31");
        }
        Ok(())
    }

    /// Token lifetime; must be positive and keep `now + lifetime` representable
    pub fn jwt_expiration(&self) -> Result<Duration> {
        if self.jwt_expiration_hours <= 0 {
            bail!("JWT_EXPIRATION_HOURS must be positive");
        }
        let expiration = Duration::try_hours(self.jwt_expiration_hours)
            .context("JWT_EXPIRATION_HOURS is out of range")?;
        if Utc::now().checked_add_signed(expiration).is_none() {
            bail!("JWT_EXPIRATION_HOURS is out of range");
        }
        Ok(expiration)
    }

    pub fn jwt_secret(&self) -> String {
        match &self.jwt_secret {
            Some(secret) if !secret.is_empty() => secret.clone(),
            _ => {
                warn!("JWT_SECRET not set, using development secret. Set it in production!");
                DEV_JWT_SECRET.to_string()
            }
        }
    }

    pub fn build_store(&self) -> Result<Arc<dyn UserStore>> {
        let store: Arc<dyn UserStore> = match self.store {
            StoreKind::Sqlite => Arc::new(
                SqliteUserStore::new(&self.db_path).context("Failed to open SQLite user store")?,
            ),
            StoreKind::Memory => {
                info!("Using in-memory user store; users are lost on restart");
                Arc::new(MemoryUserStore::new())
            }
        };
        Ok(store)
    }

    /// Assemble the auth service from this configuration
    pub fn build_service(&self) -> Result<AuthService> {
        self.validate()?;
        let jwt = JwtHandler::new(self.jwt_secret()).with_expiration(self.jwt_expiration()?);
        Ok(AuthService::new(self.build_store()?, jwt).with_bcrypt_cost(self.bcrypt_cost))
    }
}
