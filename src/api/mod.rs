// src/api/mod.rs

pub mod rooms;
pub mod state;
