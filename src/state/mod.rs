//! Shared application state and the match lifecycle model.

pub mod lifecycle;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{mongodb::MongoManager, store::LeagueStore},
    error::ServiceError,
};

/// Cheaply clonable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state holding the database handle and configuration.
pub struct AppState {
    mongo: RwLock<Option<MongoManager>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a Mongo connection is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            mongo: RwLock::new(None),
            degraded: degraded_tx,
            config,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain the current Mongo manager, if one is installed.
    pub async fn mongo(&self) -> Option<MongoManager> {
        let guard = self.mongo.read().await;
        guard.clone()
    }

    /// Install a connected Mongo manager and leave degraded mode.
    pub async fn install_mongo(&self, manager: MongoManager) {
        {
            let mut guard = self.mongo.write().await;
            *guard = Some(manager);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current Mongo manager and enter degraded mode.
    pub async fn clear_mongo(&self) {
        {
            let mut guard = self.mongo.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.mongo.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Typed store over the live database, or [`ServiceError::Degraded`] when
    /// no connection is installed.
    pub async fn store(&self) -> Result<LeagueStore, ServiceError> {
        let manager = self.mongo().await.ok_or(ServiceError::Degraded)?;
        Ok(LeagueStore::new(manager.database().await))
    }

    /// Update and broadcast the degraded flag when the value changes.
    async fn update_degraded(&self, value: bool) {
        if self.is_degraded().await == value {
            return;
        }

        let _ = self.degraded.send(value);
    }
}
