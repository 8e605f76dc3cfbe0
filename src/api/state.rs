// src/api/state.rs

//! # Application State
//!
//! Defines the shared state that will be accessible by all route handlers.

use std::sync::Arc;

use crate::{
    config::RelayConfig,
    services::{
        connection_manager::ConnectionManager, online_counter::OnlineCounter,
        room_registry::RoomRegistry,
    },
};

/// The core application state, wrapped in an Arc for thread-safe sharing.
#[derive(Clone)]
pub struct AppState {
    // The central service for connection lifecycles and room broadcasts.
    pub connection_manager: Arc<ConnectionManager>,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    /// Builds the registry and counter once and wires them into a fresh manager.
    pub fn new(config: RelayConfig) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let counter = Arc::new(OnlineCounter::new());
        let connection_manager = ConnectionManager::new(registry, counter, &config);

        AppState {
            connection_manager: Arc::new(connection_manager),
            config: Arc::new(config),
        }
    }
}
