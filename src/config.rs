//! Process configuration, read from the environment (after `.env`).
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | `DATABASE_URL` | unset | Postgres DSN; in-memory store when unset |
//! | `DB_MAX_CONNECTIONS` | 10 | pool size |
//! | `PORT` | 8083 | HTTP listen port |
//! | `SUPER_ADMIN_EMAIL` | unset | the permanent super admin |
//! | `NATS_URL` | unset | event publishing |

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub port: u16,
    pub super_admin_email: Option<String>,
    pub nats_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: non_empty("DATABASE_URL"),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            port: std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8083),
            super_admin_email: non_empty("SUPER_ADMIN_EMAIL"),
            nats_url: non_empty("NATS_URL"),
        }
    }

    /// Configuration with only a super admin set; used by tests and tools.
    pub fn with_super_admin(email: impl Into<String>) -> Self {
        Self { db_max_connections: 10, port: 8083, super_admin_email: Some(email.into()), ..Self::default() }
    }

    pub fn is_super_admin(&self, email: &str) -> bool {
        self.super_admin_email.as_deref().is_some_and(|sa| sa == email)
    }
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_admin_match() {
        let config = Config::with_super_admin("owner@shop.in");
        assert!(config.is_super_admin("owner@shop.in"));
        assert!(!config.is_super_admin("staff@shop.in"));
        assert!(!Config::default().is_super_admin(""));
    }
}
