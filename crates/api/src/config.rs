//! Runtime configuration read from the environment (and an optional `.env`).

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://catalog.db?mode=rwc";
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{set} is set but {missing} is not")]
    Incomplete {
        set: &'static str,
        missing: &'static str,
    },
}

/// Which catalog backend to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    Sqlite { url: String, max_connections: u32 },
}

#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
    pub api_token: Option<String>,
    pub admin: Option<AdminSeed>,
    pub cors_allowed_origins: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("storage", &self.storage)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("admin", &self.admin)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            storage: StorageConfig::Sqlite {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_MAX_CONNECTIONS,
            },
            api_token: None,
            admin: None,
            cors_allowed_origins: vec![DEFAULT_CORS_ORIGINS.to_string()],
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = get("CATALOG_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "CATALOG_BIND_ADDR",
                reason: e.to_string(),
            })?;

        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.parse::<u32>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: "DATABASE_MAX_CONNECTIONS",
                        reason: "must be at least 1".to_string(),
                    });
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "DATABASE_MAX_CONNECTIONS",
                        reason: e.to_string(),
                    });
                }
            },
        };

        let storage = match get("DATABASE_URL") {
            Some(url) if url.eq_ignore_ascii_case("memory") => StorageConfig::InMemory,
            Some(url) if !url.starts_with("sqlite:") => {
                return Err(ConfigError::Invalid {
                    var: "DATABASE_URL",
                    reason: format!("expected `memory` or a sqlite: URL, got `{url}`"),
                });
            }
            url => StorageConfig::Sqlite {
                url: url.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
                max_connections,
            },
        };

        let admin = match (get("CATALOG_ADMIN_USERNAME"), get("CATALOG_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminSeed { username, password }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    set: "CATALOG_ADMIN_USERNAME",
                    missing: "CATALOG_ADMIN_PASSWORD",
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    set: "CATALOG_ADMIN_PASSWORD",
                    missing: "CATALOG_ADMIN_USERNAME",
                });
            }
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            bind_addr,
            storage,
            api_token: get("CATALOG_API_TOKEN"),
            admin,
            cors_allowed_origins,
        })
    }

    /// Whether any authenticator will be installed for mutating routes.
    pub fn auth_enabled(&self) -> bool {
        self.api_token.is_some() || self.admin.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(!cfg.auth_enabled());
    }

    #[test]
    fn memory_url_selects_in_memory_store() {
        let cfg = load(&[("DATABASE_URL", "memory")]).unwrap();
        assert_eq!(cfg.storage, StorageConfig::InMemory);
    }

    #[test]
    fn sqlite_url_carries_pool_size() {
        let cfg = load(&[
            ("DATABASE_URL", "sqlite:///var/lib/catalog.db"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();
        assert_eq!(
            cfg.storage,
            StorageConfig::Sqlite {
                url: "sqlite:///var/lib/catalog.db".to_string(),
                max_connections: 12,
            }
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("CATALOG_BIND_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { var: "CATALOG_BIND_ADDR", .. })
        ));
        assert!(matches!(
            load(&[("DATABASE_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::Invalid { var: "DATABASE_MAX_CONNECTIONS", .. })
        ));
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://db/catalog")]),
            Err(ConfigError::Invalid { var: "DATABASE_URL", .. })
        ));
    }

    #[test]
    fn admin_seed_needs_both_halves() {
        assert_eq!(
            load(&[("CATALOG_ADMIN_USERNAME", "root")]),
            Err(ConfigError::Incomplete {
                set: "CATALOG_ADMIN_USERNAME",
                missing: "CATALOG_ADMIN_PASSWORD",
            })
        );

        let cfg = load(&[
            ("CATALOG_ADMIN_USERNAME", "root"),
            ("CATALOG_ADMIN_PASSWORD", "hunter2"),
        ])
        .unwrap();
        assert!(cfg.auth_enabled());
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let cfg = load(&[(
            "CORS_ALLOWED_ORIGINS",
            "https://shop.example, http://localhost:3000,,",
        )])
        .unwrap();
        assert_eq!(
            cfg.cors_allowed_origins,
            vec!["https://shop.example", "http://localhost:3000"]
        );
    }

    #[test]
    fn blank_token_counts_as_unset() {
        let cfg = load(&[("CATALOG_API_TOKEN", "   ")]).unwrap();
        assert_eq!(cfg.api_token, None);
    }
}
