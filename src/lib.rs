//! Library crate for lofi-lounge-back, exposing modules for the server binary,
//! embedding clients, and integration tests.

pub mod config;
pub mod directory;
pub mod dto;
mod error;
pub mod games;
pub mod routes;
pub mod services;
pub mod state;
pub mod sync;
