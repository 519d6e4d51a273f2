//! Central application state.

pub mod registry;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::{config::AppConfig, directory::RoomDirectory, games::GameEngine};

pub use registry::{ConnectionRegistry, PeerHandle};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state storing live connections, the game engine and
/// the room directory handle.
pub struct AppState {
    config: Arc<AppConfig>,
    registry: ConnectionRegistry,
    games: Mutex<GameEngine>,
    directory: RwLock<Option<Arc<dyn RoomDirectory>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a room directory is
    /// installed.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            config: Arc::new(config),
            registry: ConnectionRegistry::new(),
            games: Mutex::new(GameEngine::new()),
            directory: RwLock::new(None),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Registry of live sockets keyed by room and participant.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Shared game engine; every transition serializes through this lock.
    pub fn games(&self) -> &Mutex<GameEngine> {
        &self.games
    }

    /// Obtain a handle to the current room directory, if one is installed.
    pub async fn directory(&self) -> Option<Arc<dyn RoomDirectory>> {
        let guard = self.directory.read().await;
        guard.as_ref().cloned()
    }

    /// Install a room directory implementation and leave degraded mode.
    pub async fn install_directory(&self, directory: Arc<dyn RoomDirectory>) {
        let mut guard = self.directory.write().await;
        *guard = Some(directory);
    }

    /// Remove the current room directory and enter degraded mode.
    pub async fn clear_directory(&self) {
        let mut guard = self.directory.write().await;
        guard.take();
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.directory.read().await;
        guard.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MemoryDirectory;

    #[tokio::test]
    async fn degraded_follows_directory_installation() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);
        assert!(state.directory().await.is_none());

        state
            .install_directory(Arc::new(MemoryDirectory::new()))
            .await;
        assert!(!state.is_degraded().await);
        assert!(state.directory().await.is_some());

        state.clear_directory().await;
        assert!(state.is_degraded().await);
    }
}
