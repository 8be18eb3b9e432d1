use std::sync::Arc;

use tracing::info;

use crate::{
    auth::AuthService,
    config::{Config, StoreKind},
    credentials::{PasswordHasher, TokenSigner},
    membership::TripService,
    store::{memory::MemoryStore, mongo::MongoStore, Store, StoreError},
};

pub struct AppState {
    pub auth: AuthService,
    pub trips: TripService,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, signer: TokenSigner, hasher: PasswordHasher) -> Self {
        AppState {
            auth: AuthService::new(store.clone(), signer, hasher),
            trips: TripService::new(store.clone()),
            store,
        }
    }

    /// Opens the configured store. The connection is ready to serve once this returns.
    pub async fn open(config: &Config) -> Result<Self, StoreError> {
        let store: Arc<dyn Store> = match &config.store {
            StoreKind::Mongo { uri, database } => Arc::new(MongoStore::connect(uri, database).await?),
            StoreKind::Memory => {
                info!("using in-memory store, data is lost on shutdown");
                Arc::new(MemoryStore::new())
            }
        };
        let signer = TokenSigner::new(config.token_secret.as_bytes(), config.token_ttl);
        let hasher = PasswordHasher::new(config.password_rounds);
        Ok(AppState::new(store, signer, hasher))
    }

    pub async fn close(&self) {
        self.store.close().await;
    }
}
