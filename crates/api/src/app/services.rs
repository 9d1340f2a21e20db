//! Store and authenticator wiring for the HTTP layer.

use std::sync::Arc;

use anyhow::Context;

use catalog_auth::{AuthChain, StaticTokenAuthenticator, UserCredentialAuthenticator, hash_password};
use catalog_infra::{
    CatalogStore, DbSettings, InMemoryCatalogStore, InMemoryUserStore, SqliteCatalogStore,
    SqliteUserStore, StoreError, UserStore, db,
};

use crate::config::{AdminSeed, AppConfig, StorageConfig};

#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn CatalogStore>,
    pub auth: Arc<AuthChain>,
}

impl AppServices {
    pub fn new(store: Arc<dyn CatalogStore>, auth: AuthChain) -> Self {
        Self {
            store,
            auth: Arc::new(auth),
        }
    }

    /// In-memory catalog with no authenticators (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCatalogStore::new()), AuthChain::new())
    }

    /// Connect the configured backend, seed the admin user and build the auth chain.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let services = match &config.storage {
            StorageConfig::InMemory => {
                tracing::warn!("using in-memory catalog store; data is lost on exit");
                let users = Arc::new(InMemoryUserStore::new());
                let auth = build_auth_chain(config, users).await?;
                Self::new(Arc::new(InMemoryCatalogStore::new()), auth)
            }
            StorageConfig::Sqlite { url, max_connections } => {
                let settings = DbSettings::new(url.clone()).with_max_connections(*max_connections);
                let pool = db::connect(&settings)
                    .await
                    .with_context(|| format!("connecting to {url}"))?;
                let users = Arc::new(SqliteUserStore::new(pool.clone()));
                let auth = build_auth_chain(config, users).await?;
                Self::new(Arc::new(SqliteCatalogStore::new(pool)), auth)
            }
        };

        if services.auth.is_empty() {
            tracing::warn!("no authenticator configured; mutating routes are open");
        } else {
            tracing::info!(authenticators = services.auth.len(), "authentication enabled");
        }
        Ok(services)
    }
}

async fn build_auth_chain<U>(config: &AppConfig, users: Arc<U>) -> anyhow::Result<AuthChain>
where
    U: UserStore + 'static,
{
    let mut chain = AuthChain::new();
    if let Some(token) = &config.api_token {
        chain = chain.with(Arc::new(StaticTokenAuthenticator::new(token.clone())));
    }
    if let Some(admin) = &config.admin {
        seed_admin(users.as_ref(), admin).await?;
        chain = chain.with(Arc::new(UserCredentialAuthenticator::new(users)));
    }
    Ok(chain)
}

/// Create the admin user unless it already exists. An existing password is left untouched.
pub async fn seed_admin<U>(users: &U, admin: &AdminSeed) -> anyhow::Result<()>
where
    U: UserStore + ?Sized,
{
    if users
        .find_by_username(&admin.username)
        .await
        .context("looking up admin user")?
        .is_some()
    {
        tracing::debug!(username = %admin.username, "admin user already present");
        return Ok(());
    }

    let hash = hash_password(&admin.password).context("hashing admin password")?;
    match users.create_user(&admin.username, &hash).await {
        Ok(record) => {
            tracing::info!(username = %record.username, user_id = %record.id, "seeded admin user");
            Ok(())
        }
        // Another instance won the race.
        Err(StoreError::Conflict(_)) => Ok(()),
        Err(e) => Err(e).context("creating admin user"),
    }
}
