// src/services/mod.rs

//! # Services Module
//!
//! The relay core: connection handles, room membership, the online counter,
//! fan-out, and the lifecycle controller tying them together.

pub mod connection;
pub mod connection_manager;
pub mod dispatcher;
pub mod online_counter;
// Optional Redis Pub/Sub source for server-initiated pushes
pub mod redis_service;
pub mod room_registry;
